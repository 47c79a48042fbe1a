//! Observable flow state and the pure decisions taken on it.

use gasless_core::types::{
    AccountDeployment, BuildTypedDataRequest, Call, ErrorMessage, FeeEstimate, Felt, GasTokenPrice,
    GaslessCompatibility, PaymasterReward, TypedData,
};
use gasless_core::U256;

/// Everything a caller needs to render the sponsored-transaction step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PaymasterState {
    /// Gasless eligibility of the account; `None` while unknown or after a failed fetch
    pub gasless_compatibility: Option<GaslessCompatibility>,
    /// Latest accepted gas-token prices
    pub gas_token_prices: Vec<GasTokenPrice>,
    /// Selected gas token
    pub gas_token_price: Option<GasTokenPrice>,
    /// Last successful native fee estimate
    pub fee_estimate: Option<FeeEstimate>,
    /// Maximum gas-token amount the user may be charged
    pub max_gas_token_amount: Option<U256>,
    /// Pending sponsorship rewards
    pub paymaster_rewards: Vec<PaymasterReward>,
    /// A fee estimation is in flight (stays set after a failed attempt)
    pub loading_gas: bool,
    /// The caller is still assembling the call batch
    pub loading_call_data: bool,
    /// Deployment status of the account, once known
    pub deployment: Option<AccountDeployment>,
    /// The wallet is expected to report deployment data but has not yet
    pub loading_deployment_data: bool,
    /// Typed data ready to be signed
    pub typed_data: Option<TypedData>,
    /// The last estimation failed
    pub invalid_tx: bool,
    /// Classification of the last estimation failure
    pub tx_error: Option<ErrorMessage>,
    /// Hash of the last successful submission
    pub last_transaction_hash: Option<Felt>,
}

impl PaymasterState {
    /// True while no typed data is available (the gasless path is not ready).
    pub fn loading_typed_data(&self) -> bool {
        self.typed_data.is_none()
    }

    /// Rewards that can sponsor the given call batch.
    pub fn applicable_rewards<'a>(
        &'a self,
        calls: &'a [Call],
    ) -> impl Iterator<Item = &'a PaymasterReward> + 'a {
        self.paymaster_rewards.iter().filter(move |r| r.covers(calls))
    }
}

/// Whether a fee estimation may start.
///
/// Requires an account, a selected price and known compatibility, and never
/// runs while the call batch is loading.
pub fn should_estimate(has_account: bool, state: &PaymasterState) -> bool {
    has_account
        && !state.loading_call_data
        && state.gas_token_price.is_some()
        && state.gasless_compatibility.is_some()
}

/// The price to select after a poll: the current selection wins, otherwise
/// the first entry of the latest list.
pub fn select_default_price(
    current: Option<&GasTokenPrice>,
    latest: &[GasTokenPrice],
) -> Option<GasTokenPrice> {
    current.or_else(|| latest.first()).cloned()
}

/// Whether the wallet is expected to report deployment data it has not
/// reported yet.
pub fn loading_deployment_data(
    supports_bundling: bool,
    deployment: Option<&AccountDeployment>,
) -> bool {
    match deployment {
        None => supports_bundling,
        Some(d) => supports_bundling && !d.deployed && d.deployment_data.is_none(),
    }
}

/// Builds the typed-data request for the current inputs, or `None` when the
/// gasless path cannot be prepared.
///
/// An undeployed account needs deployment data and a wallet able to bundle
/// the deployment; its class hash is then sent along.
pub fn typed_data_request(
    user_address: Felt,
    calls: &[Call],
    deployment: &AccountDeployment,
    supports_bundling: bool,
) -> Option<BuildTypedDataRequest> {
    if !deployment.deployed && (deployment.deployment_data.is_none() || !supports_bundling) {
        return None;
    }

    Some(BuildTypedDataRequest {
        user_address,
        calls: calls.to_vec(),
        account_class_hash: deployment.bundled_deployment().map(|d| d.class_hash),
    })
}
