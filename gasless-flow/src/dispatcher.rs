//! Submission of the call batch, sponsored or direct.

use serde_json::json;
use tracing::{debug, info, instrument};

use gasless_core::error::Result;
use gasless_core::traits::WalletAccount;
use gasless_core::types::{signature_to_hex, AccountDeployment, ExecuteRequest, Felt, TypedData};

use crate::flow::PaymasterFlow;

/// Analytics event emitted after each successful submission.
const REGISTER_EVENT: &str = "paymaster_register";

/// How a call batch reached the chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmissionPath {
    /// Signed typed data relayed by the sponsorship backend
    Gasless,
    /// Sent through the account's own invoke path
    Direct,
}

impl SubmissionPath {
    /// Lowercase label, as reported to analytics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gasless => "gasless",
            Self::Direct => "direct",
        }
    }
}

/// A successful submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    /// Hash of the submitted transaction
    pub transaction_hash: Felt,
    /// Path taken
    pub path: SubmissionPath,
}

impl PaymasterFlow {
    /// Submits the current call batch.
    ///
    /// Uses the gasless path when typed data is available, otherwise sends the
    /// batch directly from the account. Returns `Ok(None)` when there is no
    /// account, or no typed data and no calls to fall back on.
    ///
    /// Wallet rejections and submission failures are returned as errors.
    #[instrument(skip(self))]
    pub async fn register(&self) -> Result<Option<Submission>> {
        let (account, calls, _) = self.snapshot();
        let Some(account) = account else {
            debug!("No account connected; nothing to submit");
            return Ok(None);
        };
        let state = self.state();

        let submission = match state.typed_data {
            Some(typed_data) => Submission {
                transaction_hash: self
                    .execute_gasless(account.as_ref(), &typed_data, state.deployment.as_ref())
                    .await?,
                path: SubmissionPath::Gasless,
            },
            None if calls.is_empty() => {
                debug!("No typed data and no calls; nothing to submit");
                return Ok(None);
            }
            None => Submission {
                transaction_hash: account.send_calls(&calls).await?,
                path: SubmissionPath::Direct,
            },
        };

        let hash = submission.transaction_hash;
        info!(
            transaction_hash = %hash,
            path = submission.path.as_str(),
            "Transaction submitted"
        );
        self.update(|s| s.last_transaction_hash = Some(hash));

        if let Some(analytics) = &self.inner.options.analytics {
            analytics.capture(
                REGISTER_EVENT,
                json!({
                    "path": submission.path.as_str(),
                    "transaction_hash": hash,
                    "user_address": account.address(),
                }),
            );
        }
        (self.inner.on_complete)(hash);

        Ok(Some(submission))
    }

    async fn execute_gasless(
        &self,
        account: &dyn WalletAccount,
        typed_data: &TypedData,
        deployment: Option<&AccountDeployment>,
    ) -> Result<Felt> {
        let signature = account.sign_typed_data(typed_data).await?;
        let request = ExecuteRequest {
            user_address: account.address(),
            typed_data: typed_data.to_json_string(),
            signature: signature_to_hex(&signature)?,
            deployment_data: deployment.and_then(|d| d.bundled_deployment()).cloned(),
        };
        self.inner.api.execute(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{call, deployment_data, Fixture};
    use gasless_core::error::GaslessError;

    #[tokio::test]
    async fn test_gasless_submission_converts_signature() {
        let fx = Fixture::new();
        fx.ready().await;

        let submission = fx.flow.register().await.unwrap().unwrap();
        assert_eq!(submission.path, SubmissionPath::Gasless);
        assert_eq!(submission.transaction_hash, Felt::from(0x9a5u64));

        let executed = fx.api.executed();
        assert_eq!(executed.len(), 1);
        assert_eq!(executed[0].signature, vec!["0x7b", "0x1c8"]);
        assert_eq!(executed[0].user_address, Felt::from(0xabcu64));
        assert_eq!(
            executed[0].typed_data,
            fx.api.expected_typed_data().to_json_string()
        );
        assert!(executed[0].deployment_data.is_none());

        assert_eq!(fx.completed(), vec![Felt::from(0x9a5u64)]);
        assert_eq!(fx.flow.state().last_transaction_hash, Some(Felt::from(0x9a5u64)));
    }

    #[tokio::test]
    async fn test_direct_send_without_typed_data() {
        let fx = Fixture::new();
        fx.api.set_typed_data_body(serde_json::json!({ "error": "x" }));
        fx.ready().await;

        let submission = fx.flow.register().await.unwrap().unwrap();
        assert_eq!(submission.path, SubmissionPath::Direct);
        assert_eq!(fx.wallet.sent(), vec![vec![call()]]);
        assert!(fx.api.executed().is_empty());
        assert_eq!(fx.completed(), vec![Felt::from(0xdeadu64)]);
    }

    #[tokio::test]
    async fn test_register_without_account_is_noop() {
        let fx = Fixture::new();
        fx.flow.set_calls(vec![call()], false).await;

        assert_eq!(fx.flow.register().await.unwrap(), None);
        assert!(fx.completed().is_empty());
        assert!(fx.analytics.events().is_empty());
    }

    #[tokio::test]
    async fn test_register_without_calls_is_noop() {
        let fx = Fixture::new();
        fx.flow.set_account(fx.account()).await;

        assert_eq!(fx.flow.register().await.unwrap(), None);
        assert!(fx.wallet.sent().is_empty());
    }

    #[tokio::test]
    async fn test_signature_rejection_propagates() {
        let fx = Fixture::new();
        fx.ready().await;
        fx.wallet.reject_signature(true);

        let err = fx.flow.register().await.unwrap_err();
        assert!(matches!(err, GaslessError::WalletRejected(_)));
        assert!(fx.api.executed().is_empty());
        assert!(fx.completed().is_empty());
    }

    #[tokio::test]
    async fn test_undeployed_account_bundles_deployment() {
        let fx = Fixture::undeployed(Some(deployment_data()), true);
        fx.ready().await;

        fx.flow.register().await.unwrap();
        let executed = fx.api.executed();
        assert_eq!(executed[0].deployment_data, Some(deployment_data()));
    }

    #[tokio::test]
    async fn test_analytics_records_path() {
        let fx = Fixture::new();
        fx.ready().await;
        fx.flow.register().await.unwrap();

        let events = fx.analytics.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, "paymaster_register");
        assert_eq!(events[0].1["path"], "gasless");
        assert_eq!(events[0].1["user_address"], "0xabc");
    }

    #[tokio::test]
    async fn test_execute_failure_propagates() {
        let fx = Fixture::new();
        fx.ready().await;
        fx.api.fail_execute(true);

        let err = fx.flow.register().await.unwrap_err();
        assert!(matches!(err, GaslessError::BackendError { status: 400, .. }));
        assert_eq!(fx.api.executed().len(), 1);
        assert!(fx.completed().is_empty());
        assert!(fx.analytics.events().is_empty());
        assert!(fx.flow.state().last_transaction_hash.is_none());
    }
}
