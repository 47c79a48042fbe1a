//! The paymaster flow: inputs, state and the reactions between them.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use gasless_client::{GaslessClient, GaslessConfig, StarknetRpcClient, StarknetRpcConfig};
use gasless_core::constants::DEFAULT_PRICE_POLL_INTERVAL_SECS;
use gasless_core::error::Result;
use gasless_core::traits::{
    AnalyticsSink, ChainProvider, CompletionCallback, GaslessApi, WalletAccount,
};
use gasless_core::types::{AccountDeployment, Call, Felt, GasTokenPrice};

use crate::state::{loading_deployment_data, PaymasterState};

/// Optional knobs for a [`PaymasterFlow`].
#[derive(Clone)]
pub struct FlowOptions {
    /// Interval between gas-token price fetches
    pub price_poll_interval: Duration,
    /// Sink receiving one event per successful submission
    pub analytics: Option<Arc<dyn AnalyticsSink>>,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            price_poll_interval: Duration::from_secs(DEFAULT_PRICE_POLL_INTERVAL_SECS),
            analytics: None,
        }
    }
}

impl FlowOptions {
    /// Adds an analytics sink.
    pub fn with_analytics(mut self, analytics: Arc<dyn AnalyticsSink>) -> Self {
        self.analytics = Some(analytics);
        self
    }
}

/// Caller-controlled inputs. `generation` changes whenever an input that
/// invalidates in-flight estimates or typed data changes; `account_generation`
/// changes only with the account and guards account-derived fetches.
#[derive(Default)]
pub(crate) struct FlowInputs {
    pub(crate) account: Option<Arc<dyn WalletAccount>>,
    pub(crate) calls: Vec<Call>,
    pub(crate) generation: u64,
    pub(crate) account_generation: u64,
}

pub(crate) struct FlowInner {
    pub(crate) api: Arc<dyn GaslessApi>,
    pub(crate) chain: Arc<dyn ChainProvider>,
    pub(crate) on_complete: CompletionCallback,
    pub(crate) options: FlowOptions,
    pub(crate) inputs: Mutex<FlowInputs>,
    pub(crate) state: watch::Sender<PaymasterState>,
    pub(crate) poller: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for FlowInner {
    fn drop(&mut self) {
        if let Some(handle) = self.poller.get_mut().take() {
            handle.abort();
        }
    }
}

/// Sponsored-transaction flow for one registration or renewal attempt.
///
/// Cheap to clone; clones share inputs and state. Dropping the last clone
/// stops the price poller.
#[derive(Clone)]
pub struct PaymasterFlow {
    pub(crate) inner: Arc<FlowInner>,
}

impl PaymasterFlow {
    /// Creates a flow with default options.
    pub fn new(
        api: Arc<dyn GaslessApi>,
        chain: Arc<dyn ChainProvider>,
        on_complete: CompletionCallback,
    ) -> Self {
        Self::with_options(api, chain, on_complete, FlowOptions::default())
    }

    /// Creates a flow with custom options.
    pub fn with_options(
        api: Arc<dyn GaslessApi>,
        chain: Arc<dyn ChainProvider>,
        on_complete: CompletionCallback,
        options: FlowOptions,
    ) -> Self {
        let (state, _) = watch::channel(PaymasterState::default());
        Self {
            inner: Arc::new(FlowInner {
                api,
                chain,
                on_complete,
                options,
                inputs: Mutex::new(FlowInputs::default()),
                state,
                poller: Mutex::new(None),
            }),
        }
    }

    /// Creates a flow backed by the HTTP sponsorship client and a JSON-RPC node.
    pub fn connect(
        gasless: GaslessConfig,
        rpc: StarknetRpcConfig,
        on_complete: CompletionCallback,
    ) -> Result<Self> {
        let options = FlowOptions {
            price_poll_interval: Duration::from_secs(gasless.price_poll_interval_seconds),
            ..Default::default()
        };
        let api = Arc::new(GaslessClient::with_config(gasless)?);
        let chain = Arc::new(StarknetRpcClient::with_config(rpc)?);
        Ok(Self::with_options(api, chain, on_complete, options))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // STATE ACCESS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Snapshot of the current state.
    pub fn state(&self) -> PaymasterState {
        self.inner.state.borrow().clone()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<PaymasterState> {
        self.inner.state.subscribe()
    }

    /// Current call batch.
    pub fn calls(&self) -> Vec<Call> {
        self.inner.inputs.lock().calls.clone()
    }

    pub(crate) fn update(&self, mutate: impl FnOnce(&mut PaymasterState)) {
        self.inner.state.send_modify(mutate);
    }

    pub(crate) fn snapshot(&self) -> (Option<Arc<dyn WalletAccount>>, Vec<Call>, u64) {
        let inputs = self.inner.inputs.lock();
        (inputs.account.clone(), inputs.calls.clone(), inputs.generation)
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.inner.inputs.lock().generation == generation
    }

    pub(crate) fn bump_generation(&self) {
        self.inner.inputs.lock().generation += 1;
    }

    fn is_current_account(&self, account_generation: u64) -> bool {
        self.inner.inputs.lock().account_generation == account_generation
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INPUTS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Connects (or disconnects) a wallet account.
    ///
    /// Clears every account-derived value, then fetches compatibility,
    /// rewards and deployment status before re-running estimation and
    /// typed-data building.
    pub async fn set_account(&self, account: Option<Arc<dyn WalletAccount>>) {
        let account_generation = {
            let mut inputs = self.inner.inputs.lock();
            inputs.account = account.clone();
            inputs.generation += 1;
            inputs.account_generation += 1;
            inputs.account_generation
        };

        let bundling = account
            .as_ref()
            .map(|a| a.supports_deployment_bundling())
            .unwrap_or(false);
        self.update(|s| {
            s.gasless_compatibility = None;
            s.paymaster_rewards.clear();
            s.fee_estimate = None;
            s.max_gas_token_amount = None;
            s.loading_gas = false;
            s.typed_data = None;
            s.invalid_tx = false;
            s.tx_error = None;
            s.deployment = None;
            s.loading_deployment_data = loading_deployment_data(bundling, None);
        });

        let Some(account) = account else {
            debug!("Account disconnected");
            return;
        };
        info!(address = %account.address(), "Account connected");

        tokio::join!(
            self.refresh_compatibility(account.address(), account_generation),
            self.refresh_rewards(),
            self.refresh_deployment(account.as_ref(), account_generation),
        );

        self.reconcile().await;
    }

    /// Replaces the call batch.
    ///
    /// The previous typed data no longer describes the batch and is dropped.
    pub async fn set_calls(&self, calls: Vec<Call>, loading_call_data: bool) {
        {
            let mut inputs = self.inner.inputs.lock();
            inputs.calls = calls;
            inputs.generation += 1;
        }
        self.update(|s| {
            s.loading_call_data = loading_call_data;
            s.typed_data = None;
        });
        self.reconcile().await;
    }

    /// Updates the call-data loading flag without touching the batch.
    pub async fn set_loading_call_data(&self, loading: bool) {
        let changed = self.inner.state.send_if_modified(|s| {
            let changed = s.loading_call_data != loading;
            s.loading_call_data = loading;
            changed
        });
        if changed {
            self.bump_generation();
            self.reconcile().await;
        }
    }

    /// Overrides the selected gas token.
    pub async fn select_gas_token_price(&self, price: GasTokenPrice) {
        self.bump_generation();
        debug!(token = %price.token_address, "Gas token selected");
        self.update(|s| s.gas_token_price = Some(price));
        self.reconcile().await;
    }

    /// Re-runs fee estimation and typed-data building on the current inputs.
    pub async fn reconcile(&self) {
        self.estimate_fees().await;
        self.build_typed_data().await;
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ACCOUNT-DERIVED DATA
    // ═══════════════════════════════════════════════════════════════════════════

    #[instrument(skip(self, address), fields(address = %address))]
    async fn refresh_compatibility(&self, address: Felt, account_generation: u64) {
        let result = self.inner.api.account_compatibility(&address).await;
        if !self.is_current_account(account_generation) {
            debug!("Discarding stale compatibility result");
            return;
        }

        match result {
            Ok(compatibility) => self.update(|s| s.gasless_compatibility = Some(compatibility)),
            Err(e) => {
                error!(error = %e, "Failed to fetch gasless compatibility");
                self.update(|s| s.gasless_compatibility = None);
            }
        }
    }

    /// Re-fetches sponsorship rewards for the current account.
    ///
    /// A failed fetch leaves an empty reward list.
    pub async fn refresh_rewards(&self) {
        let (account, account_generation) = {
            let inputs = self.inner.inputs.lock();
            (inputs.account.clone(), inputs.account_generation)
        };
        let Some(account) = account else {
            return;
        };

        let rewards = match self.inner.api.account_rewards(&account.address()).await {
            Ok(rewards) => rewards,
            Err(e) => {
                warn!(error = %e, "Failed to fetch paymaster rewards");
                Vec::new()
            }
        };
        if self.is_current_account(account_generation) {
            self.update(|s| s.paymaster_rewards = rewards);
        }
    }

    async fn refresh_deployment(&self, account: &dyn WalletAccount, account_generation: u64) {
        let address = account.address();
        let deployed = match self.inner.chain.is_deployed(&address).await {
            Ok(deployed) => deployed,
            Err(e) => {
                error!(%address, error = %e, "Failed to check account deployment");
                return;
            }
        };

        let deployment_data = if deployed {
            None
        } else {
            match account.deployment_data().await {
                Ok(data) => data,
                Err(e) => {
                    warn!(%address, error = %e, "Wallet did not provide deployment data");
                    None
                }
            }
        };

        if !self.is_current_account(account_generation) {
            return;
        }
        let deployment = AccountDeployment {
            deployed,
            deployment_data,
        };
        let bundling = account.supports_deployment_bundling();
        debug!(%address, deployed, "Resolved account deployment");
        self.update(|s| {
            s.loading_deployment_data = loading_deployment_data(bundling, Some(&deployment));
            s.deployment = Some(deployment);
        });
    }
}
