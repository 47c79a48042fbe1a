//! Domain types for the gasless flow.
//!
//! - [`Felt`]: Starknet field element with hex text encoding
//! - [`Call`]: one contract invocation of a call batch
//! - [`GaslessCompatibility`], [`GasTokenPrice`], [`PaymasterReward`]: backend read models
//! - [`TypedData`], [`BuildTypedDataRequest`], [`ExecuteRequest`]: sponsored submission payloads
//! - [`FeeEstimate`], [`InvokeSimulation`]: fee simulation input and output

pub mod amount;
mod call;
mod felt;
mod paymaster;
mod transaction;

pub use call::*;
pub use felt::*;
pub use paymaster::*;
pub use transaction::*;
