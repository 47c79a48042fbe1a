//! # Gasless Flow
//!
//! Client-side orchestration of sponsored Starknet transactions.
//!
//! A [`PaymasterFlow`] tracks the connected account and the caller's call
//! batch, and keeps a [`PaymasterState`] up to date:
//!
//! 1. fetches gasless compatibility, rewards and deployment status when the
//!    account changes
//! 2. polls gas-token prices on an interval
//! 3. simulates the call batch and converts the fee into the gas token
//! 4. requests typed data for the sponsored transaction
//! 5. on [`PaymasterFlow::register`], signs and relays the typed data, or
//!    falls back to a direct send
//!
//! Every input mutation re-runs the dependent steps explicitly; observers
//! receive each new state through [`PaymasterFlow::subscribe`].

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod dispatcher;
mod estimator;
mod flow;
mod poller;
mod state;
mod typed_data;

#[cfg(test)]
mod test_utils;

pub use dispatcher::{Submission, SubmissionPath};
pub use flow::{FlowOptions, PaymasterFlow};
pub use state::{
    loading_deployment_data, select_default_price, should_estimate, typed_data_request,
    PaymasterState,
};
