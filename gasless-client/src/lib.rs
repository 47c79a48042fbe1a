//! # Gasless Client
//!
//! Network-facing implementations of the gasless collaborator traits:
//!
//! - [`GaslessClient`]: HTTP/JSON client for the sponsorship backend
//! - [`StarknetRpcClient`]: Starknet JSON-RPC chain provider
//! - [`get_execute_calldata`]: `__execute__` calldata encoding for a call batch

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod backend;
mod calldata;
mod config;
mod rpc;

pub use backend::GaslessClient;
pub use calldata::get_execute_calldata;
pub use config::{GaslessConfig, StarknetRpcConfig};
pub use rpc::StarknetRpcClient;
