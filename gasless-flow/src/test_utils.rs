//! Fixtures and in-memory collaborators for flow tests.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::Notify;

use gasless_core::error::{GaslessError, Result};
use gasless_core::traits::{AnalyticsSink, ChainProvider, GaslessApi, WalletAccount};
use gasless_core::types::{
    BuildTypedDataRequest, CairoVersion, Call, DeploymentData, ExecuteRequest, FeeEstimate, Felt,
    GasTokenPrice, GaslessCompatibility, InvokeSimulation, PaymasterReward, TypedData,
    TypedDataResponse, WhitelistedCall,
};
use gasless_core::U256;

use crate::flow::{FlowOptions, PaymasterFlow};

// ═══════════════════════════════════════════════════════════════════════════════
// FIXTURES
// ═══════════════════════════════════════════════════════════════════════════════

/// A gas token distinguished by `n` (token address and price).
pub fn price(n: u64) -> GasTokenPrice {
    GasTokenPrice {
        token_address: Felt::from(0x1000 + n),
        price_in_eth: U256::from(500_000_000_000_000_000u64 * n),
        price_in_usd: 1.0,
        decimals: 18,
    }
}

pub fn compatibility() -> GaslessCompatibility {
    GaslessCompatibility {
        is_compatible: true,
        gas_consumed_overhead: U256::from(10u64),
        data_gas_consumed_overhead: U256::from(5u64),
    }
}

pub fn deployment_data() -> DeploymentData {
    DeploymentData {
        class_hash: Felt::from(0xc1a55u64),
        salt: Felt::from(0x5a17u64),
        unique: Felt::ZERO,
        calldata: vec![Felt::ONE, Felt::from(2u64)],
        sigdata: None,
        version: 1,
    }
}

pub fn call() -> Call {
    Call::new(Felt::from(0x1234u64), "buy", vec![Felt::ONE])
}

fn reward() -> PaymasterReward {
    PaymasterReward {
        date: "2024-05-01".into(),
        address: Felt::from(0xabcu64),
        partner: "starknet.id".into(),
        protocol: Some("STARKNETID".into()),
        campaign: "free-domain".into(),
        free_tx: 1,
        remaining_tx: 1,
        expiration_date: None,
        whitelisted_calls: vec![WhitelistedCall {
            contract_address: "*".into(),
            entrypoint: "buy".into(),
        }],
    }
}

fn typed_data_body() -> Value {
    json!({
        "types": { "StarknetDomain": [] },
        "primaryType": "OutsideExecution",
        "domain": { "name": "Account.execute_from_outside" },
        "message": { "Caller": "0x414e595f43414c4c4552" }
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// SPONSORSHIP BACKEND
// ═══════════════════════════════════════════════════════════════════════════════

pub struct FakeApi {
    compatibility_calls: AtomicUsize,
    price_calls: AtomicUsize,
    fail_compatibility: AtomicBool,
    fail_rewards: AtomicBool,
    fail_prices: AtomicBool,
    fail_typed_data: AtomicBool,
    fail_execute: AtomicBool,
    compatibility_gate: Mutex<Option<Arc<Notify>>>,
    typed_data_body: Mutex<Value>,
    build_requests: Mutex<Vec<BuildTypedDataRequest>>,
    executed: Mutex<Vec<ExecuteRequest>>,
}

impl FakeApi {
    fn new() -> Self {
        Self {
            compatibility_calls: AtomicUsize::new(0),
            price_calls: AtomicUsize::new(0),
            fail_compatibility: AtomicBool::new(false),
            fail_rewards: AtomicBool::new(false),
            fail_prices: AtomicBool::new(false),
            fail_typed_data: AtomicBool::new(false),
            fail_execute: AtomicBool::new(false),
            compatibility_gate: Mutex::new(None),
            typed_data_body: Mutex::new(typed_data_body()),
            build_requests: Mutex::new(Vec::new()),
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn compatibility_calls(&self) -> usize {
        self.compatibility_calls.load(Ordering::SeqCst)
    }

    pub fn price_calls(&self) -> usize {
        self.price_calls.load(Ordering::SeqCst)
    }

    pub fn fail_compatibility(&self, fail: bool) {
        self.fail_compatibility.store(fail, Ordering::SeqCst);
    }

    pub fn fail_rewards(&self, fail: bool) {
        self.fail_rewards.store(fail, Ordering::SeqCst);
    }

    pub fn fail_prices(&self, fail: bool) {
        self.fail_prices.store(fail, Ordering::SeqCst);
    }

    pub fn fail_typed_data(&self, fail: bool) {
        self.fail_typed_data.store(fail, Ordering::SeqCst);
    }

    pub fn fail_execute(&self, fail: bool) {
        self.fail_execute.store(fail, Ordering::SeqCst);
    }

    /// Holds compatibility fetches until the returned handle is notified.
    pub fn hold_compatibility(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.compatibility_gate.lock() = Some(gate.clone());
        gate
    }

    /// Body the backend answers build-typed-data requests with.
    pub fn set_typed_data_body(&self, body: Value) {
        *self.typed_data_body.lock() = body;
    }

    pub fn expected_typed_data(&self) -> TypedData {
        TypedData::new(typed_data_body()).unwrap()
    }

    pub fn build_requests(&self) -> Vec<BuildTypedDataRequest> {
        self.build_requests.lock().clone()
    }

    pub fn executed(&self) -> Vec<ExecuteRequest> {
        self.executed.lock().clone()
    }
}

#[async_trait]
impl GaslessApi for FakeApi {
    async fn account_compatibility(&self, _address: &Felt) -> Result<GaslessCompatibility> {
        self.compatibility_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.compatibility_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_compatibility.load(Ordering::SeqCst) {
            return Err(GaslessError::HttpError("connection refused".into()));
        }
        Ok(compatibility())
    }

    async fn account_rewards(&self, _address: &Felt) -> Result<Vec<PaymasterReward>> {
        if self.fail_rewards.load(Ordering::SeqCst) {
            return Err(GaslessError::BackendError {
                status: 503,
                body: "unavailable".into(),
            });
        }
        Ok(vec![reward()])
    }

    async fn gas_token_prices(&self) -> Result<Vec<GasTokenPrice>> {
        self.price_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_prices.load(Ordering::SeqCst) {
            return Err(GaslessError::ConnectionTimeout("gas-token-prices".into()));
        }
        Ok(vec![price(1), price(2)])
    }

    async fn build_typed_data(
        &self,
        request: &BuildTypedDataRequest,
    ) -> Result<TypedDataResponse> {
        self.build_requests.lock().push(request.clone());
        if self.fail_typed_data.load(Ordering::SeqCst) {
            return Err(GaslessError::HttpError("connection reset".into()));
        }
        let body = self.typed_data_body.lock().clone();
        TypedDataResponse::from_value(body)
    }

    async fn execute(&self, request: &ExecuteRequest) -> Result<Felt> {
        self.executed.lock().push(request.clone());
        if self.fail_execute.load(Ordering::SeqCst) {
            return Err(GaslessError::BackendError {
                status: 400,
                body: r#"{"messages":["Invalid signature"]}"#.into(),
            });
        }
        Ok(Felt::from(0x9a5u64))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CHAIN
// ═══════════════════════════════════════════════════════════════════════════════

pub struct FakeChain {
    deployed: bool,
    overall_fee: AtomicU64,
    estimate_calls: AtomicUsize,
    failure: Mutex<Option<String>>,
    gate: Mutex<Option<Arc<Notify>>>,
    simulations: Mutex<Vec<InvokeSimulation>>,
}

impl FakeChain {
    fn new(deployed: bool) -> Self {
        Self {
            deployed,
            overall_fee: AtomicU64::new(1000),
            estimate_calls: AtomicUsize::new(0),
            failure: Mutex::new(None),
            gate: Mutex::new(None),
            simulations: Mutex::new(Vec::new()),
        }
    }

    pub fn estimate_calls(&self) -> usize {
        self.estimate_calls.load(Ordering::SeqCst)
    }

    pub fn set_overall_fee(&self, fee: u64) {
        self.overall_fee.store(fee, Ordering::SeqCst);
    }

    /// Makes every estimation fail with `message` (or succeed again on `None`).
    pub fn set_failure(&self, message: Option<&str>) {
        *self.failure.lock() = message.map(str::to_string);
    }

    /// Holds estimations until the returned handle is notified.
    pub fn hold_estimates(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock() = Some(gate.clone());
        gate
    }

    pub fn last_simulation(&self) -> Option<InvokeSimulation> {
        self.simulations.lock().last().cloned()
    }
}

#[async_trait]
impl ChainProvider for FakeChain {
    async fn contract_version(&self, _address: &Felt) -> Result<CairoVersion> {
        Ok(CairoVersion::One)
    }

    async fn nonce(&self, _address: &Felt) -> Result<Felt> {
        Ok(Felt::from(3u64))
    }

    async fn is_deployed(&self, _address: &Felt) -> Result<bool> {
        Ok(self.deployed)
    }

    async fn estimate_invoke_fee(&self, invocation: &InvokeSimulation) -> Result<FeeEstimate> {
        self.estimate_calls.fetch_add(1, Ordering::SeqCst);
        self.simulations.lock().push(invocation.clone());

        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if let Some(message) = self.failure.lock().clone() {
            return Err(GaslessError::RpcError(message));
        }
        Ok(FeeEstimate {
            overall_fee: U256::from(self.overall_fee.load(Ordering::SeqCst)),
            gas_price: U256::from(2u64),
            data_gas_price: Some(U256::from(1u64)),
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WALLET
// ═══════════════════════════════════════════════════════════════════════════════

pub struct FakeWallet {
    bundling: bool,
    deployment_data: Option<DeploymentData>,
    reject_signature: AtomicBool,
    sent: Mutex<Vec<Vec<Call>>>,
}

impl FakeWallet {
    pub fn reject_signature(&self, reject: bool) {
        self.reject_signature.store(reject, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Vec<Call>> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl WalletAccount for FakeWallet {
    fn address(&self) -> Felt {
        Felt::from(0xabcu64)
    }

    fn supports_deployment_bundling(&self) -> bool {
        self.bundling
    }

    async fn deployment_data(&self) -> Result<Option<DeploymentData>> {
        Ok(self.deployment_data.clone())
    }

    async fn sign_typed_data(&self, _typed_data: &TypedData) -> Result<Vec<String>> {
        if self.reject_signature.load(Ordering::SeqCst) {
            return Err(GaslessError::WalletRejected("User abort".into()));
        }
        Ok(vec!["123".into(), "456".into()])
    }

    async fn send_calls(&self, calls: &[Call]) -> Result<Felt> {
        self.sent.lock().push(calls.to_vec());
        Ok(Felt::from(0xdeadu64))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CALLER HOOKS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Default)]
pub struct RecordingAnalytics {
    events: Mutex<Vec<(String, Value)>>,
}

impl RecordingAnalytics {
    pub fn events(&self) -> Vec<(String, Value)> {
        self.events.lock().clone()
    }
}

impl AnalyticsSink for RecordingAnalytics {
    fn capture(&self, event: &str, properties: Value) {
        self.events.lock().push((event.to_string(), properties));
    }
}

/// A flow wired to in-memory collaborators.
pub struct Fixture {
    pub flow: PaymasterFlow,
    pub api: Arc<FakeApi>,
    pub chain: Arc<FakeChain>,
    pub wallet: Arc<FakeWallet>,
    pub analytics: Arc<RecordingAnalytics>,
    pub completed: Arc<Mutex<Vec<Felt>>>,
}

impl Fixture {
    /// Deployed account, no deployment bundling.
    pub fn new() -> Self {
        Self::build(true, None, false)
    }

    /// Undeployed account.
    pub fn undeployed(deployment_data: Option<DeploymentData>, bundling: bool) -> Self {
        Self::build(false, deployment_data, bundling)
    }

    fn build(deployed: bool, deployment_data: Option<DeploymentData>, bundling: bool) -> Self {
        let api = Arc::new(FakeApi::new());
        let chain = Arc::new(FakeChain::new(deployed));
        let wallet = Arc::new(FakeWallet {
            bundling,
            deployment_data,
            reject_signature: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
        });
        let analytics = Arc::new(RecordingAnalytics::default());
        let completed = Arc::new(Mutex::new(Vec::new()));

        let sink = completed.clone();
        let options = FlowOptions::default().with_analytics(analytics.clone());
        let flow = PaymasterFlow::with_options(
            api.clone(),
            chain.clone(),
            Arc::new(move |hash| sink.lock().push(hash)),
            options,
        );

        Self {
            flow,
            api,
            chain,
            wallet,
            analytics,
            completed,
        }
    }

    pub fn account(&self) -> Option<Arc<dyn WalletAccount>> {
        Some(self.wallet.clone())
    }

    /// Selects `price(1)`, sets one call and connects the wallet.
    pub async fn ready(&self) {
        self.flow.select_gas_token_price(price(1)).await;
        self.flow.set_calls(vec![call()], false).await;
        self.flow.set_account(self.account()).await;
    }

    pub fn completed(&self) -> Vec<Felt> {
        self.completed.lock().clone()
    }
}
