//! Collaborator traits for the gasless flow.
//!
//! The flow never talks to a wallet, a node or the sponsorship backend
//! directly; it goes through these interfaces so each side can be swapped
//! or faked in tests.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    BuildTypedDataRequest, CairoVersion, Call, DeploymentData, ExecuteRequest, FeeEstimate,
    Felt, GasTokenPrice, GaslessCompatibility, InvokeSimulation, PaymasterReward, TypedData,
    TypedDataResponse,
};

// ═══════════════════════════════════════════════════════════════════════════════
// SPONSORSHIP BACKEND
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface to the sponsorship (paymaster) backend.
#[async_trait]
pub trait GaslessApi: Send + Sync {
    /// Fetches gasless eligibility and fee overheads for an account.
    async fn account_compatibility(&self, address: &Felt) -> Result<GaslessCompatibility>;

    /// Fetches pending sponsorship rewards for an account.
    async fn account_rewards(&self, address: &Felt) -> Result<Vec<PaymasterReward>>;

    /// Fetches prices of every accepted gas token.
    async fn gas_token_prices(&self) -> Result<Vec<GasTokenPrice>>;

    /// Requests signable typed data for a sponsored call batch.
    ///
    /// A backend-side refusal (`error` / `messages` in the body) is
    /// [`TypedDataResponse::NotReady`], not an `Err`.
    async fn build_typed_data(&self, request: &BuildTypedDataRequest) -> Result<TypedDataResponse>;

    /// Relays signed typed data. Returns the transaction hash.
    async fn execute(&self, request: &ExecuteRequest) -> Result<Felt>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// CHAIN PROVIDER
// ═══════════════════════════════════════════════════════════════════════════════

/// Read-only access to a Starknet node.
#[async_trait]
pub trait ChainProvider: Send + Sync {
    /// Cairo version of the contract deployed at `address`.
    async fn contract_version(&self, address: &Felt) -> Result<CairoVersion>;

    /// Current nonce of an account.
    async fn nonce(&self, address: &Felt) -> Result<Felt>;

    /// Whether a contract is deployed at `address`.
    async fn is_deployed(&self, address: &Felt) -> Result<bool>;

    /// Simulates a version-3 invoke and returns its fee estimate.
    async fn estimate_invoke_fee(&self, invocation: &InvokeSimulation) -> Result<FeeEstimate>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// WALLET
// ═══════════════════════════════════════════════════════════════════════════════

/// The connected wallet account.
#[async_trait]
pub trait WalletAccount: Send + Sync {
    /// Account address.
    fn address(&self) -> Felt;

    /// Whether the wallet can bundle its own deployment into a sponsored
    /// transaction.
    fn supports_deployment_bundling(&self) -> bool;

    /// Deployment data for an undeployed account, if the wallet exposes it.
    async fn deployment_data(&self) -> Result<Option<DeploymentData>>;

    /// Asks the user to sign typed data.
    ///
    /// Returns the raw signature elements (decimal or hex text). A user
    /// cancelling inside the wallet is an `Err`.
    async fn sign_typed_data(&self, typed_data: &TypedData) -> Result<Vec<String>>;

    /// Sends the call batch through the account's own invoke path.
    /// Returns the transaction hash.
    async fn send_calls(&self, calls: &[Call]) -> Result<Felt>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// CALLER HOOKS
// ═══════════════════════════════════════════════════════════════════════════════

/// Optional analytics sink.
pub trait AnalyticsSink: Send + Sync {
    /// Records one event.
    fn capture(&self, event: &str, properties: serde_json::Value);
}

/// Called with the transaction hash once a submission succeeds.
pub type CompletionCallback = Arc<dyn Fn(Felt) + Send + Sync>;
