//! Starknet JSON-RPC chain provider.
//!
//! Implements just enough of the node API for fee estimation: class lookup
//! (Cairo version and deployment check), nonce, and `starknet_estimateFee`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use gasless_core::constants::ESTIMATE_BLOCK_TAG;
use gasless_core::error::{GaslessError, Result};
use gasless_core::traits::ChainProvider;
use gasless_core::types::{CairoVersion, FeeEstimate, Felt, InvokeSimulation};

use crate::config::StarknetRpcConfig;

/// Version field of a v3 invoke sent for simulation only (`2^128 + 3`).
const QUERY_VERSION_V3: &str = "0x100000000000000000000000000000003";

/// Node error code for an address with no deployed contract.
const CONTRACT_NOT_FOUND: i64 = 20;

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl JsonRpcError {
    /// Full error text, including node-provided data such as revert reasons.
    fn describe(&self) -> String {
        match &self.data {
            Some(Value::String(data)) => format!("{} ({}): {}", self.message, self.code, data),
            Some(data) => format!("{} ({}): {}", self.message, self.code, data),
            None => format!("{} ({})", self.message, self.code),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

/// Starknet node client.
pub struct StarknetRpcClient {
    config: StarknetRpcConfig,
    http_client: reqwest::Client,
}

impl StarknetRpcClient {
    /// Creates a client with custom configuration.
    pub fn with_config(config: StarknetRpcConfig) -> Result<Self> {
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| GaslessError::HttpError(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Sends one JSON-RPC request and returns either its result or its error.
    async fn rpc_request(
        &self,
        method: &str,
        params: Value,
    ) -> Result<std::result::Result<Value, JsonRpcError>> {
        let request = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let response = self
            .http_client
            .post(&self.config.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| GaslessError::HttpError(e.to_string()))?;

        let body: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| GaslessError::HttpError(e.to_string()))?;

        if let Some(error) = body.error {
            debug!(method, code = error.code, error = %error.message, "Starknet RPC error");
            return Ok(Err(error));
        }

        body.result.map(Ok).ok_or_else(|| {
            GaslessError::UnexpectedResponse(format!(
                "{method}: response has neither result nor error"
            ))
        })
    }

    async fn rpc_call(&self, method: &str, params: Value) -> Result<Value> {
        self.rpc_request(method, params)
            .await?
            .map_err(|e| GaslessError::RpcError(e.describe()))
    }

    fn invoke_json(invocation: &InvokeSimulation) -> Value {
        let zero_bounds = json!({ "max_amount": "0x0", "max_price_per_unit": "0x0" });
        json!({
            "type": "INVOKE",
            "version": QUERY_VERSION_V3,
            "sender_address": invocation.sender_address,
            "calldata": invocation.calldata,
            "signature": invocation.signature,
            "nonce": invocation.nonce,
            "resource_bounds": { "l1_gas": zero_bounds, "l2_gas": zero_bounds },
            "tip": "0x0",
            "paymaster_data": [],
            "account_deployment_data": [],
            "nonce_data_availability_mode": "L1",
            "fee_data_availability_mode": "L1"
        })
    }
}

#[async_trait]
impl ChainProvider for StarknetRpcClient {
    #[instrument(skip(self, address), fields(address = %address))]
    async fn contract_version(&self, address: &Felt) -> Result<CairoVersion> {
        let class = self
            .rpc_call(
                "starknet_getClassAt",
                json!({ "block_id": ESTIMATE_BLOCK_TAG, "contract_address": address }),
            )
            .await?;

        // Sierra classes (Cairo 1+) carry a `sierra_program`, legacy ones do not.
        let version = if class.get("sierra_program").is_some() {
            CairoVersion::One
        } else {
            CairoVersion::Zero
        };
        debug!(?version, "Resolved account Cairo version");
        Ok(version)
    }

    #[instrument(skip(self, address), fields(address = %address))]
    async fn nonce(&self, address: &Felt) -> Result<Felt> {
        let nonce = self
            .rpc_call(
                "starknet_getNonce",
                json!({ "block_id": ESTIMATE_BLOCK_TAG, "contract_address": address }),
            )
            .await?;
        Ok(serde_json::from_value(nonce)?)
    }

    #[instrument(skip(self, address), fields(address = %address))]
    async fn is_deployed(&self, address: &Felt) -> Result<bool> {
        let outcome = self
            .rpc_request(
                "starknet_getClassHashAt",
                json!({ "block_id": "latest", "contract_address": address }),
            )
            .await?;

        match outcome {
            Ok(_) => Ok(true),
            Err(error) if error.code == CONTRACT_NOT_FOUND => Ok(false),
            Err(error) => Err(GaslessError::RpcError(error.describe())),
        }
    }

    #[instrument(skip(self, invocation), fields(sender = %invocation.sender_address))]
    async fn estimate_invoke_fee(&self, invocation: &InvokeSimulation) -> Result<FeeEstimate> {
        let flags: Vec<&str> = if invocation.skip_validate {
            vec!["SKIP_VALIDATE"]
        } else {
            vec![]
        };

        let result = self
            .rpc_call(
                "starknet_estimateFee",
                json!({
                    "request": [Self::invoke_json(invocation)],
                    "simulation_flags": flags,
                    "block_id": ESTIMATE_BLOCK_TAG
                }),
            )
            .await?;

        let mut estimates: Vec<FeeEstimate> = serde_json::from_value(result)?;
        if estimates.is_empty() {
            return Err(GaslessError::UnexpectedResponse(
                "starknet_estimateFee returned no estimate".into(),
            ));
        }
        let estimate = estimates.swap_remove(0);
        debug!(overall_fee = %estimate.overall_fee, "Estimated invoke fee");
        Ok(estimate)
    }
}
