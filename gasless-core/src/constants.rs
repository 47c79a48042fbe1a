//! Constants for the sponsorship backend and the Starknet network.

// ═══════════════════════════════════════════════════════════════════════════════
// SPONSORSHIP BACKEND
// ═══════════════════════════════════════════════════════════════════════════════

/// Sponsorship backend base URL on Starknet mainnet.
pub const GASLESS_MAINNET_BASE_URL: &str = "https://starknet.api.avnu.fi";

/// Sponsorship backend base URL on Starknet Sepolia.
pub const GASLESS_SEPOLIA_BASE_URL: &str = "https://sepolia.api.avnu.fi";

/// Path prefix shared by every gasless endpoint.
pub const GASLESS_API_PREFIX: &str = "/gasless/v1";

/// Header carrying the optional backend API key.
pub const API_KEY_HEADER: &str = "api-key";

/// Protocol tag used when querying sponsorship rewards.
pub const DEFAULT_REWARDS_PROTOCOL: &str = "STARKNETID";

// ═══════════════════════════════════════════════════════════════════════════════
// STARKNET RPC
// ═══════════════════════════════════════════════════════════════════════════════

/// Public Starknet mainnet JSON-RPC endpoint.
pub const STARKNET_MAINNET_RPC_URL: &str = "https://starknet-mainnet.public.blastapi.io/rpc/v0_7";

/// Public Starknet Sepolia JSON-RPC endpoint.
pub const STARKNET_SEPOLIA_RPC_URL: &str = "https://starknet-sepolia.public.blastapi.io/rpc/v0_7";

/// Block tag used for fee simulation.
pub const ESTIMATE_BLOCK_TAG: &str = "pending";

/// Entrypoints that map to the zero selector instead of a keccak hash.
pub const DEFAULT_ENTRYPOINT_NAMES: [&str; 2] = ["__default__", "__l1_default__"];

// ═══════════════════════════════════════════════════════════════════════════════
// FLOW TUNING
// ═══════════════════════════════════════════════════════════════════════════════

/// Interval between two gas-token price fetches.
pub const DEFAULT_PRICE_POLL_INTERVAL_SECS: u64 = 20;

/// Data-gas price assumed when the node does not report one.
pub const DEFAULT_DATA_GAS_PRICE: u64 = 1;

/// Safety factor applied to the converted fee before it is exposed.
pub const FEE_SAFETY_MULTIPLIER: u64 = 2;

/// Default HTTP timeout for backend and RPC requests.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Substring identifying a signature failure in a simulation error.
pub const INVALID_SIGNATURE_MARKER: &str = "Invalid signature";

/// Short label for signature failures.
pub const INVALID_SIGNATURE_SHORT: &str = "Invalid signature";

/// Short label for every other simulation failure.
pub const TX_ERROR_SHORT: &str = "TX error";
