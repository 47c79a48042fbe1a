//! Fee estimation for the current call batch.

use tracing::{debug, instrument, warn};

use gasless_client::get_execute_calldata;
use gasless_core::error::Result;
use gasless_core::fees::max_gas_token_amount;
use gasless_core::types::{Call, ErrorMessage, FeeEstimate, Felt, InvokeSimulation};

use crate::flow::PaymasterFlow;
use crate::state::should_estimate;

impl PaymasterFlow {
    /// Simulates the call batch and stores the maximum gas-token amount.
    ///
    /// A failure marks the transaction invalid and keeps `loading_gas` set.
    #[instrument(skip(self))]
    pub(crate) async fn estimate_fees(&self) {
        let (account, calls, generation) = self.snapshot();
        let state = self.state();
        if !should_estimate(account.is_some(), &state) {
            debug!(
                loading_call_data = state.loading_call_data,
                "Skipping fee estimation"
            );
            return;
        }
        let (Some(account), Some(price), Some(compatibility)) =
            (account, state.gas_token_price, state.gasless_compatibility)
        else {
            return;
        };

        self.update(|s| s.loading_gas = true);

        let result = self
            .simulate(account.address(), &calls)
            .await
            .and_then(|fee| {
                max_gas_token_amount(&fee, &price, &compatibility).map(|amount| (fee, amount))
            });

        if !self.is_current(generation) {
            debug!(generation, "Discarding stale fee estimate");
            return;
        }

        match result {
            Ok((fee, amount)) => {
                debug!(
                    overall_fee = %fee.overall_fee,
                    max_gas_token_amount = %amount,
                    token = %price.token_address,
                    "Fee estimated"
                );
                self.update(|s| {
                    s.fee_estimate = Some(fee);
                    s.max_gas_token_amount = Some(amount);
                    s.loading_gas = false;
                    s.invalid_tx = false;
                    s.tx_error = None;
                });
            }
            Err(e) => {
                warn!(error = %e, "Fee estimation failed");
                let message = ErrorMessage::from_simulation_error(&e.to_string());
                self.update(|s| {
                    s.invalid_tx = true;
                    s.tx_error = Some(message);
                });
            }
        }
    }

    async fn simulate(&self, address: Felt, calls: &[Call]) -> Result<FeeEstimate> {
        let chain = &self.inner.chain;
        let (version, nonce) =
            tokio::try_join!(chain.contract_version(&address), chain.nonce(&address))?;

        let invocation = InvokeSimulation {
            sender_address: address,
            calldata: get_execute_calldata(calls, version),
            signature: Vec::new(),
            nonce,
            skip_validate: true,
        };
        chain.estimate_invoke_fee(&invocation).await
    }
}
