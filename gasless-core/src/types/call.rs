//! Contract calls.

use serde::{Deserialize, Serialize};

use super::Felt;

/// One contract invocation inside a call batch.
///
/// Serialized with the field names wallets and the sponsorship backend use
/// (`contractAddress`, `entrypoint`, `calldata`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    /// Target contract
    pub contract_address: Felt,
    /// Entrypoint name, or its selector as a felt
    pub entrypoint: String,
    /// Raw calldata
    #[serde(default)]
    pub calldata: Vec<Felt>,
}

impl Call {
    /// Creates a call.
    pub fn new(contract_address: Felt, entrypoint: impl Into<String>, calldata: Vec<Felt>) -> Self {
        Self {
            contract_address,
            entrypoint: entrypoint.into(),
            calldata,
        }
    }
}
