//! # Gasless Core
//!
//! Core types, errors, and traits for sponsored (gasless) Starknet transactions.
//!
//! This crate provides the building blocks shared by the backend client, the
//! paymaster flow and the CLI:
//!
//! - **Types**: felts, calls, gas token prices, compatibility, rewards, typed data
//! - **Fees**: conversion of a native fee estimate into a gas-token amount
//! - **Errors**: a single error enum with classification helpers
//! - **Traits**: the wallet, chain and sponsorship-backend collaborators
//!
//! ## Example
//!
//! ```rust
//! use gasless_core::{Call, Felt};
//!
//! let call = Call::new(Felt::from(0xabcu64), "approve", vec![Felt::ONE]);
//! let json = serde_json::to_value(&call).unwrap();
//! assert_eq!(json["contractAddress"], "0xabc");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod fees;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use alloy_primitives::U256;
pub use constants::*;
pub use error::{GaslessError, Result};
pub use fees::{gas_fees_in_gas_token, max_gas_token_amount};
pub use traits::*;
pub use types::*;
