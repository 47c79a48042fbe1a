//! Serde helpers for 256-bit amounts.
//!
//! The backend and the node send amounts either as `0x` hex strings, decimal
//! strings or plain JSON numbers. Amounts are always written back as hex.

use std::str::FromStr;

use alloy_primitives::U256;
use serde::{de, Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Text(String),
    Number(u64),
}

/// Parses an amount from `0x` hex or decimal text.
pub fn parse_u256(text: &str) -> Result<U256, String> {
    let text = text.trim();
    if let Some(digits) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        if digits.is_empty() {
            return Err(format!("empty hex amount '{text}'"));
        }
        U256::from_str_radix(digits, 16).map_err(|e| format!("'{text}': {e}"))
    } else {
        if text.is_empty() {
            return Err("empty amount".into());
        }
        U256::from_str(text).map_err(|e| format!("'{text}': {e}"))
    }
}

fn from_raw<E: de::Error>(raw: RawAmount) -> Result<U256, E> {
    match raw {
        RawAmount::Text(text) => parse_u256(&text).map_err(E::custom),
        RawAmount::Number(n) => Ok(U256::from(n)),
    }
}

/// Serializes a `U256` as `0x` hex.
pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{value:#x}"))
}

/// Deserializes a `U256` from hex text, decimal text or a JSON number.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
    from_raw(RawAmount::deserialize(deserializer)?)
}

/// Same encoding for optional amounts.
pub mod option {
    use super::*;

    /// Serializes `Some` as hex and `None` as null.
    pub fn serialize<S: Serializer>(
        value: &Option<U256>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => super::serialize(v, serializer),
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes null or a missing field as `None`.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<U256>, D::Error> {
        Option::<RawAmount>::deserialize(deserializer)?
            .map(from_raw)
            .transpose()
    }
}
