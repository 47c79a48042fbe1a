//! HTTP client for the sponsorship backend.
//!
//! Read endpoints (compatibility, rewards, prices) are plain GETs; typed-data
//! building and execution are JSON POSTs. Every request carries the API key
//! header when one is configured.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use gasless_core::constants::{API_KEY_HEADER, GASLESS_API_PREFIX};
use gasless_core::error::{GaslessError, Result};
use gasless_core::traits::GaslessApi;
use gasless_core::types::{
    BuildTypedDataRequest, ExecuteRequest, ExecuteResponse, Felt, GasTokenPrice,
    GaslessCompatibility, PaymasterReward, TypedDataResponse,
};

use crate::config::GaslessConfig;

/// Sponsorship backend client.
pub struct GaslessClient {
    config: GaslessConfig,
    http_client: reqwest::Client,
}

impl GaslessClient {
    /// Creates a client with custom configuration.
    pub fn with_config(config: GaslessConfig) -> Result<Self> {
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

    /// Returns the active configuration.
    pub fn config(&self) -> &GaslessConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}{}{}",
            self.config.base_url.trim_end_matches('/'),
            GASLESS_API_PREFIX,
            path
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        self.authorize(request).send().await.map_err(|e| {
            if e.is_timeout() {
                GaslessError::ConnectionTimeout(e.to_string())
            } else {
                GaslessError::HttpError(e.to_string())
            }
        })
    }

    /// Decodes a success body, or turns the status and body into an error.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GaslessError::BackendError {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GaslessError::HttpError(e.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let request = self.http_client.get(self.endpoint(path)).query(query);
        let response = self.send(request).await?;
        Self::decode(response).await
    }
}

#[async_trait]
impl GaslessApi for GaslessClient {
    #[instrument(skip(self, address), fields(address = %address))]
    async fn account_compatibility(&self, address: &Felt) -> Result<GaslessCompatibility> {
        let compatibility: GaslessCompatibility = self
            .get_json(&format!("/accounts/{address}/compatibility"), &[])
            .await?;
        debug!(is_compatible = compatibility.is_compatible, "Fetched gasless compatibility");
        Ok(compatibility)
    }

    #[instrument(skip(self, address), fields(address = %address))]
    async fn account_rewards(&self, address: &Felt) -> Result<Vec<PaymasterReward>> {
        let rewards: Vec<PaymasterReward> = self
            .get_json(
                &format!("/accounts/{address}/rewards"),
                &[("protocol", self.config.rewards_protocol.as_str())],
            )
            .await?;
        debug!(count = rewards.len(), "Fetched paymaster rewards");
        Ok(rewards)
    }

    #[instrument(skip(self))]
    async fn gas_token_prices(&self) -> Result<Vec<GasTokenPrice>> {
        let prices: Vec<GasTokenPrice> = self.get_json("/gas-token-prices", &[]).await?;
        debug!(count = prices.len(), "Fetched gas token prices");
        Ok(prices)
    }

    #[instrument(
        skip(self, request),
        fields(user = %request.user_address, calls = request.calls.len())
    )]
    async fn build_typed_data(&self, request: &BuildTypedDataRequest) -> Result<TypedDataResponse> {
        let http_request = self
            .http_client
            .post(self.endpoint("/build-typed-data"))
            .json(request);
        let response = self.send(http_request).await?;

        // Refusals come back as `{ error }` / `{ messages }`, often with a 4xx
        // status; the body decides, not the status.
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GaslessError::HttpError(e.to_string()))?;
        let value: serde_json::Value = match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(_) if !status.is_success() => {
                return Err(GaslessError::BackendError {
                    status: status.as_u16(),
                    body,
                })
            }
            Err(e) => return Err(e.into()),
        };

        let outcome = TypedDataResponse::from_value(value)?;
        if let TypedDataResponse::NotReady(reason) = &outcome {
            warn!(%reason, "Typed data not available");
        }
        Ok(outcome)
    }

    #[instrument(skip(self, request), fields(user = %request.user_address))]
    async fn execute(&self, request: &ExecuteRequest) -> Result<Felt> {
        let http_request = self.http_client.post(self.endpoint("/execute")).json(request);
        let response = self.send(http_request).await?;
        let executed: ExecuteResponse = Self::decode(response).await?;
        debug!(tx_hash = %executed.transaction_hash, "Sponsored transaction relayed");
        Ok(executed.transaction_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gasless_core::types::{Call, DeploymentData};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GaslessClient {
        GaslessClient::with_config(GaslessConfig::new(server.uri())).unwrap()
    }

    fn user() -> Felt {
        Felt::from(0xabcu64)
    }

    #[tokio::test]
    async fn test_fetch_compatibility() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gasless/v1/accounts/0xabc/compatibility"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "isCompatible": true,
                "gasConsumedOverhead": "0xa",
                "dataGasConsumedOverhead": "0x5"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let compat = client_for(&server).account_compatibility(&user()).await.unwrap();
        assert!(compat.is_compatible);
        assert_eq!(compat.gas_consumed_overhead, gasless_core::U256::from(10u64));
    }

    #[tokio::test]
    async fn test_fetch_rewards_sends_protocol_and_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gasless/v1/accounts/0xabc/rewards"))
            .and(query_param("protocol", "STARKNETID"))
            .and(header("api-key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "date": "2024-05-01T00:00:00Z",
                "address": "0xabc",
                "partner": "starknet.id",
                "campaign": "free-domain",
                "freeTx": 1,
                "remainingTx": 1,
                "whitelistedCalls": [{ "contractAddress": "*", "entrypoint": "*" }]
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let config = GaslessConfig::new(server.uri()).with_api_key("secret");
        let client = GaslessClient::with_config(config).unwrap();
        let rewards = client.account_rewards(&user()).await.unwrap();
        assert_eq!(rewards.len(), 1);
        assert_eq!(rewards[0].remaining_tx, 1);
    }

    #[tokio::test]
    async fn test_fetch_prices() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gasless/v1/gas-token-prices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "tokenAddress": "0x1",
                    "priceInETH": "0xde0b6b3a7640000",
                    "priceInUSD": 3000.0,
                    "decimals": 18
                },
                {
                    "tokenAddress": "0x2",
                    "priceInETH": "0x1c6bf52634000",
                    "priceInUSD": 1.0,
                    "decimals": 6
                }
            ])))
            .mount(&server)
            .await;

        let prices = client_for(&server).gas_token_prices().await.unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(prices[1].decimals, 6);
    }

    #[tokio::test]
    async fn test_backend_status_surfaces_as_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gasless/v1/gas-token-prices"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client_for(&server).gas_token_prices().await.unwrap_err();
        assert!(matches!(err, GaslessError::BackendError { status: 503, .. }));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_build_typed_data_with_class_hash() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/gasless/v1/build-typed-data"))
            .and(body_partial_json(json!({
                "userAddress": "0xabc",
                "accountClassHash": "0x7",
                "calls": [{ "contractAddress": "0x10", "entrypoint": "buy", "calldata": ["0x1"] }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "types": {}, "primaryType": "OutsideExecution", "domain": {}, "message": {}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = BuildTypedDataRequest {
            user_address: user(),
            calls: vec![Call::new(Felt::from(0x10u64), "buy", vec![Felt::ONE])],
            account_class_hash: Some(Felt::from(7u64)),
        };
        let response = client_for(&server).build_typed_data(&request).await.unwrap();
        assert!(matches!(response, TypedDataResponse::Ready(_)));
    }

    #[tokio::test]
    async fn test_build_typed_data_refusal_is_not_ready() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/gasless/v1/build-typed-data"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({ "messages": ["Account not compatible"] })),
            )
            .mount(&server)
            .await;

        let request = BuildTypedDataRequest {
            user_address: user(),
            calls: vec![],
            account_class_hash: None,
        };
        let response = client_for(&server).build_typed_data(&request).await.unwrap();
        assert!(matches!(response, TypedDataResponse::NotReady(_)));
    }

    #[tokio::test]
    async fn test_build_typed_data_garbage_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/gasless/v1/build-typed-data"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;

        let request = BuildTypedDataRequest {
            user_address: user(),
            calls: vec![],
            account_class_hash: None,
        };
        let err = client_for(&server).build_typed_data(&request).await.unwrap_err();
        assert!(matches!(err, GaslessError::BackendError { status: 502, .. }));
    }

    #[tokio::test]
    async fn test_execute_returns_transaction_hash() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/gasless/v1/execute"))
            .and(body_partial_json(json!({
                "userAddress": "0xabc",
                "signature": ["0x7b", "0x1c8"],
                "deploymentData": { "class_hash": "0x7" }
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "transactionHash": "0xfeed" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let request = ExecuteRequest {
            user_address: user(),
            typed_data: "{}".into(),
            signature: vec!["0x7b".into(), "0x1c8".into()],
            deployment_data: Some(DeploymentData {
                class_hash: Felt::from(7u64),
                salt: Felt::ONE,
                unique: Felt::ZERO,
                calldata: vec![],
                sigdata: None,
                version: 1,
            }),
        };
        let hash = client_for(&server).execute(&request).await.unwrap();
        assert_eq!(hash, Felt::from(0xfeedu64));
    }
}
