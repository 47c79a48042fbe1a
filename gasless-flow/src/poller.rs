//! Periodic gas-token price refresh.

use std::sync::Arc;

use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::flow::PaymasterFlow;
use crate::state::select_default_price;

impl PaymasterFlow {
    /// Starts fetching gas-token prices now and on every poll interval.
    ///
    /// The task only holds a weak reference to the flow and ends with it.
    /// Estimation triggered by a new default price runs on its own task so
    /// a slow simulation never delays the next fetch. Calling this while
    /// polling is already running does nothing.
    pub fn start_price_polling(&self) {
        let mut poller = self.inner.poller.lock();
        if poller.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let flow = Arc::downgrade(&self.inner);
        let period = self.inner.options.price_poll_interval;
        debug!(period_secs = period.as_secs(), "Starting price polling");

        *poller = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = flow.upgrade() else {
                    break;
                };
                let flow = PaymasterFlow { inner };
                if flow.fetch_prices().await {
                    tokio::spawn(async move { flow.reconcile().await });
                }
            }
        }));
    }

    /// Stops price polling.
    pub fn shutdown(&self) {
        if let Some(handle) = self.inner.poller.lock().take() {
            handle.abort();
            debug!("Price polling stopped");
        }
    }

    /// Fetches gas-token prices once.
    ///
    /// Selects the first token when none is selected yet and then re-runs
    /// estimation. A failed fetch keeps the previous list.
    pub async fn refresh_prices(&self) {
        if self.fetch_prices().await {
            self.reconcile().await;
        }
    }

    /// Stores the latest prices. Returns true when a default token was
    /// selected.
    async fn fetch_prices(&self) -> bool {
        let prices = match self.inner.api.gas_token_prices().await {
            Ok(prices) => prices,
            Err(e) => {
                warn!(error = %e, "Failed to fetch gas token prices");
                return false;
            }
        };

        let mut selected = false;
        self.update(|s| {
            if s.gas_token_price.is_none() {
                s.gas_token_price = select_default_price(None, &prices);
                selected = s.gas_token_price.is_some();
            }
            s.gas_token_prices = prices;
        });

        if selected {
            debug!("Selected default gas token");
            self.bump_generation();
        }
        selected
    }
}
