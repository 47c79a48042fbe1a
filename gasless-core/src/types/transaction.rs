//! Fee simulation, deployment and sponsored submission payloads.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use super::{amount, Call, Felt};
use crate::constants::{
    DEFAULT_DATA_GAS_PRICE, INVALID_SIGNATURE_MARKER, INVALID_SIGNATURE_SHORT, TX_ERROR_SHORT,
};
use crate::error::{GaslessError, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// ACCOUNT DEPLOYMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Data needed to deploy an account contract together with its first
/// transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentData {
    /// Account class hash
    pub class_hash: Felt,
    /// Address salt
    pub salt: Felt,
    /// Unique-deployment flag
    pub unique: Felt,
    /// Constructor calldata
    #[serde(default)]
    pub calldata: Vec<Felt>,
    /// Optional signer data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sigdata: Option<Vec<Felt>>,
    /// Deployment payload version
    #[serde(default = "default_deployment_version")]
    pub version: u8,
}

fn default_deployment_version() -> u8 {
    1
}

/// Deployment status of the connected account.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountDeployment {
    /// Contract exists on chain
    pub deployed: bool,
    /// Deployment data reported by the wallet, when not deployed
    pub deployment_data: Option<DeploymentData>,
}

impl AccountDeployment {
    /// A deployed account.
    pub fn deployed() -> Self {
        Self {
            deployed: true,
            deployment_data: None,
        }
    }

    /// An account that still has to be deployed.
    pub fn pending(deployment_data: Option<DeploymentData>) -> Self {
        Self {
            deployed: false,
            deployment_data,
        }
    }

    /// Deployment data to bundle with the next sponsored transaction.
    pub fn bundled_deployment(&self) -> Option<&DeploymentData> {
        if self.deployed {
            None
        } else {
            self.deployment_data.as_ref()
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FEE SIMULATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Cairo version of an account contract; selects the execute calldata layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CairoVersion {
    /// Legacy Cairo 0 account
    #[serde(rename = "0")]
    Zero,
    /// Sierra (Cairo 1+) account
    #[serde(rename = "1")]
    One,
}

/// A version-3 invoke transaction to simulate for fee estimation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvokeSimulation {
    /// Account sending the transaction
    pub sender_address: Felt,
    /// `__execute__` calldata for the call batch
    pub calldata: Vec<Felt>,
    /// Signature (empty when validation is skipped)
    pub signature: Vec<Felt>,
    /// Account nonce
    pub nonce: Felt,
    /// Ask the node to skip `__validate__`
    pub skip_validate: bool,
}

/// Fee estimate returned by the node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEstimate {
    /// Total fee in the native token
    #[serde(with = "amount")]
    pub overall_fee: U256,
    /// L1 gas price
    #[serde(with = "amount")]
    pub gas_price: U256,
    /// L1 data gas price, when reported
    #[serde(default, with = "amount::option", skip_serializing_if = "Option::is_none")]
    pub data_gas_price: Option<U256>,
}

impl FeeEstimate {
    /// Data-gas price, defaulting to 1 when the node did not report one.
    pub fn data_gas_price_or_default(&self) -> U256 {
        self.data_gas_price
            .unwrap_or_else(|| U256::from(DEFAULT_DATA_GAS_PRICE))
    }
}

/// Short/long description of a failed fee estimation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    /// Short label shown to the user
    pub short: String,
    /// Full error text (empty for signature failures)
    pub message: String,
}

impl ErrorMessage {
    /// Classifies a simulation error by its text.
    pub fn from_simulation_error(error: &str) -> Self {
        if error.contains(INVALID_SIGNATURE_MARKER) {
            Self {
                short: INVALID_SIGNATURE_SHORT.into(),
                message: String::new(),
            }
        } else {
            Self {
                short: TX_ERROR_SHORT.into(),
                message: error.to_string(),
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SPONSORED SUBMISSION
// ═══════════════════════════════════════════════════════════════════════════════

/// Signable typed data produced by the sponsorship backend.
///
/// Opaque to this crate; it is handed to the wallet for signing and echoed
/// back to the backend as JSON text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypedData(serde_json::Value);

impl TypedData {
    /// Wraps a JSON object.
    pub fn new(value: serde_json::Value) -> Result<Self> {
        if !value.is_object() {
            return Err(GaslessError::UnexpectedResponse(
                "typed data must be a JSON object".into(),
            ));
        }
        Ok(Self(value))
    }

    /// The raw JSON value.
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    /// JSON text, as sent to the execute endpoint.
    pub fn to_json_string(&self) -> String {
        self.0.to_string()
    }
}

/// Outcome of a build-typed-data request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypedDataResponse {
    /// Typed data ready to be signed
    Ready(TypedData),
    /// Backend answered with `error` or `messages`; the gasless path is not available yet
    NotReady(String),
}

impl TypedDataResponse {
    /// Interprets a backend response body.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        if let Some(error) = value.get("error") {
            return Ok(Self::NotReady(json_text(error)));
        }
        if let Some(messages) = value.get("messages") {
            return Ok(Self::NotReady(json_text(messages)));
        }
        TypedData::new(value).map(Self::Ready)
    }

    /// The typed data, if ready.
    pub fn into_typed_data(self) -> Option<TypedData> {
        match self {
            Self::Ready(typed_data) => Some(typed_data),
            Self::NotReady(_) => None,
        }
    }
}

fn json_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Body of `POST /gasless/v1/build-typed-data`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildTypedDataRequest {
    /// Account that will sign
    pub user_address: Felt,
    /// Call batch to sponsor
    pub calls: Vec<Call>,
    /// Class hash of the account to deploy alongside, if undeployed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_class_hash: Option<Felt>,
}

/// Body of `POST /gasless/v1/execute`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    /// Account that signed
    pub user_address: Felt,
    /// Typed data as JSON text
    pub typed_data: String,
    /// Signature, each element as `0x` hex text
    pub signature: Vec<String>,
    /// Deployment to bundle, if the account is undeployed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_data: Option<DeploymentData>,
}

/// Response of `POST /gasless/v1/execute`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    /// Hash of the relayed transaction
    pub transaction_hash: Felt,
}

/// Converts wallet signature elements (decimal or hex text) into the
/// backend's `0x` hex encoding.
pub fn signature_to_hex(signature: &[String]) -> Result<Vec<String>> {
    signature
        .iter()
        .map(|element| element.parse::<Felt>().map(|felt| felt.to_hex_string()))
        .collect()
}
