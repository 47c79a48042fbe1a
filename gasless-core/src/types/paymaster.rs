//! Read models served by the sponsorship backend.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use super::{amount, Felt};

/// Whether an account can use gasless execution, plus the overheads used
/// when converting a native fee into a gas-token amount.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GaslessCompatibility {
    /// Account contract supports sponsored execution
    pub is_compatible: bool,
    /// Extra L1 gas consumed by the sponsored execution path
    #[serde(with = "amount")]
    pub gas_consumed_overhead: U256,
    /// Extra data gas consumed by the sponsored execution path
    #[serde(with = "amount")]
    pub data_gas_consumed_overhead: U256,
}

/// Price of one accepted gas token.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasTokenPrice {
    /// ERC-20 contract of the token
    pub token_address: Felt,
    /// Price of one whole token, in wei
    #[serde(rename = "priceInETH", with = "amount")]
    pub price_in_eth: U256,
    /// Indicative USD price
    #[serde(rename = "priceInUSD", default)]
    pub price_in_usd: f64,
    /// Token decimals
    pub decimals: u32,
}

/// A call pattern covered by a sponsorship reward.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhitelistedCall {
    /// Contract address, or `*` for any
    pub contract_address: String,
    /// Entrypoint name, or `*` for any
    pub entrypoint: String,
}

impl WhitelistedCall {
    /// Returns true if this pattern covers the call.
    pub fn matches(&self, call: &super::Call) -> bool {
        let contract_ok = self.contract_address == "*"
            || self
                .contract_address
                .parse::<Felt>()
                .map(|felt| felt == call.contract_address)
                .unwrap_or(false);
        let entrypoint_ok = self.entrypoint == "*" || self.entrypoint == call.entrypoint;
        contract_ok && entrypoint_ok
    }
}

/// A pending sponsorship reward for an account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymasterReward {
    /// Date the reward was granted
    pub date: String,
    /// Rewarded account
    pub address: Felt,
    /// Sponsoring partner
    pub partner: String,
    /// Protocol tag the reward belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Campaign name
    pub campaign: String,
    /// Sponsored transactions granted
    pub free_tx: u32,
    /// Sponsored transactions left
    pub remaining_tx: u32,
    /// Expiry date, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    /// Calls the reward can pay for
    #[serde(default)]
    pub whitelisted_calls: Vec<WhitelistedCall>,
}

impl PaymasterReward {
    /// Returns true if the reward still has sponsored transactions and
    /// covers every call of the batch.
    pub fn covers(&self, calls: &[super::Call]) -> bool {
        self.remaining_tx > 0
            && calls
                .iter()
                .all(|call| self.whitelisted_calls.iter().any(|w| w.matches(call)))
    }
}
