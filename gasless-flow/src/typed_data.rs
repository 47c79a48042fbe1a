//! Typed-data building for the sponsored path.

use tracing::{debug, error, info, instrument};

use gasless_core::types::TypedDataResponse;

use crate::flow::PaymasterFlow;
use crate::state::typed_data_request;

impl PaymasterFlow {
    /// Requests typed data for the current call batch.
    ///
    /// A backend refusal clears the typed data so `register` falls back to a
    /// direct send; a failed request leaves the previous value in place.
    #[instrument(skip(self))]
    pub(crate) async fn build_typed_data(&self) {
        let (account, calls, generation) = self.snapshot();
        let state = self.state();
        let Some(account) = account else {
            return;
        };
        if state.loading_call_data || state.loading_deployment_data || calls.is_empty() {
            debug!("Call batch or deployment data not settled");
            return;
        }
        let Some(deployment) = state.deployment.as_ref() else {
            debug!("Deployment status unknown");
            return;
        };
        let Some(request) = typed_data_request(
            account.address(),
            &calls,
            deployment,
            account.supports_deployment_bundling(),
        ) else {
            debug!("Undeployed account cannot bundle its deployment");
            return;
        };

        let result = self.inner.api.build_typed_data(&request).await;
        if !self.is_current(generation) {
            debug!(generation, "Discarding stale typed data");
            return;
        }

        match result {
            Ok(TypedDataResponse::Ready(typed_data)) => {
                debug!("Typed data ready");
                self.update(|s| s.typed_data = Some(typed_data));
            }
            Ok(TypedDataResponse::NotReady(reason)) => {
                info!(%reason, "Gasless execution not available for this batch");
                self.update(|s| s.typed_data = None);
            }
            Err(e) => error!(error = %e, "Failed to build typed data"),
        }
    }
}
