//! Starknet field elements.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::U256;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};

use crate::constants::DEFAULT_ENTRYPOINT_NAMES;
use crate::error::{GaslessError, Result};
use crate::types::amount::parse_u256;

/// Starknet field prime, `2^251 + 17 * 2^192 + 1`.
pub const FIELD_PRIME: U256 = U256::from_limbs([1, 0, 0, 0x0800_0000_0000_0011]);

/// A Starknet field element.
///
/// Parsed from `0x` hex or decimal text, always written as lowercase `0x` hex,
/// which is the encoding the sponsorship backend expects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Felt(U256);

impl Felt {
    /// The zero element.
    pub const ZERO: Felt = Felt(U256::ZERO);

    /// The one element.
    pub const ONE: Felt = Felt(U256::from_limbs([1, 0, 0, 0]));

    /// Wraps a `U256`, rejecting values outside the field.
    pub fn from_u256(value: U256) -> Result<Self> {
        if value >= FIELD_PRIME {
            return Err(GaslessError::InvalidFelt(format!(
                "{value:#x} is not below the field prime"
            )));
        }
        Ok(Self(value))
    }

    /// Returns the underlying integer.
    pub fn to_u256(self) -> U256 {
        self.0
    }

    /// Lowercase `0x` hex text.
    pub fn to_hex_string(&self) -> String {
        format!("{:#x}", self.0)
    }

    /// Decimal text.
    pub fn to_dec_string(&self) -> String {
        self.0.to_string()
    }
}

impl From<u64> for Felt {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl From<u128> for Felt {
    fn from(value: u128) -> Self {
        Self(U256::from(value))
    }
}

impl FromStr for Felt {
    type Err = GaslessError;

    fn from_str(s: &str) -> Result<Self> {
        let value = parse_u256(s).map_err(GaslessError::InvalidFelt)?;
        Self::from_u256(value)
    }
}

impl fmt::Display for Felt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl Serialize for Felt {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex_string())
    }
}

impl<'de> Deserialize<'de> for Felt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = crate::types::amount::deserialize(deserializer)?;
        Felt::from_u256(value).map_err(de::Error::custom)
    }
}

/// Computes the entrypoint selector for a function name.
///
/// The selector is the Keccak-256 of the name truncated to its low 250 bits.
/// Names that are already felts are passed through unchanged.
pub fn selector_from_name(name: &str) -> Felt {
    if DEFAULT_ENTRYPOINT_NAMES.contains(&name) {
        return Felt::ZERO;
    }
    if name.starts_with("0x") {
        if let Ok(felt) = name.parse() {
            return felt;
        }
    }

    let digest = Keccak256::digest(name.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    bytes[0] &= 0x03;
    Felt(U256::from_be_bytes(bytes))
}
