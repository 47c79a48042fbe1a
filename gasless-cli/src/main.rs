//! Gasless CLI
//!
//! Command-line interface for inspecting sponsored (gasless) Starknet
//! transactions: account compatibility, rewards, gas-token prices, typed data
//! and fee estimates.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use colored::*;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gasless_client::{GaslessClient, GaslessConfig, StarknetRpcConfig};
use gasless_core::{
    selector_from_name, BuildTypedDataRequest, Call, DeploymentData, Felt, GaslessApi,
    GaslessError, TypedData, TypedDataResponse, WalletAccount, U256,
};
use gasless_flow::PaymasterFlow;

/// Gasless - sponsored Starknet transactions
#[derive(Parser)]
#[command(name = "gasless")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use the Sepolia backend and node
    #[arg(long, global = true, env = "GASLESS_TESTNET")]
    testnet: bool,

    /// Sponsorship backend base URL
    #[arg(long, global = true, env = "GASLESS_BASE_URL")]
    base_url: Option<String>,

    /// Sponsorship backend API key
    #[arg(long, global = true, env = "GASLESS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Starknet JSON-RPC URL
    #[arg(long, global = true, env = "STARKNET_RPC_URL")]
    rpc_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether an account can use gasless execution
    Compatibility {
        /// Account address
        address: String,
    },

    /// List pending sponsorship rewards of an account
    Rewards {
        /// Account address
        address: String,
    },

    /// List accepted gas tokens and their prices
    Prices,

    /// Request typed data for a call batch
    TypedData {
        /// Account address
        address: String,
        /// JSON file holding the call batch
        #[arg(long)]
        calls: PathBuf,
        /// Class hash of an account still to be deployed
        #[arg(long)]
        class_hash: Option<String>,
    },

    /// Estimate the gas-token amount for a call batch
    Estimate {
        /// Account address
        address: String,
        /// JSON file holding the call batch
        #[arg(long)]
        calls: PathBuf,
        /// Gas token address (defaults to the first accepted token)
        #[arg(long)]
        token: Option<String>,
    },

    /// Compute the entrypoint selector of a function name
    Selector {
        /// Entrypoint name
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "gasless=debug,info"
    } else {
        "gasless=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &cli.command {
        Commands::Compatibility { address } => cmd_compatibility(&cli, address).await,
        Commands::Rewards { address } => cmd_rewards(&cli, address).await,
        Commands::Prices => cmd_prices(&cli).await,
        Commands::TypedData {
            address,
            calls,
            class_hash,
        } => cmd_typed_data(&cli, address, calls, class_hash.as_deref()).await,
        Commands::Estimate {
            address,
            calls,
            token,
        } => cmd_estimate(&cli, address, calls, token.as_deref()).await,
        Commands::Selector { name } => cmd_selector(name),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

fn gasless_config(cli: &Cli) -> GaslessConfig {
    let mut config = if cli.testnet {
        GaslessConfig::sepolia()
    } else {
        GaslessConfig::mainnet()
    };
    if let Some(url) = &cli.base_url {
        config.base_url = url.clone();
    }
    if let Some(key) = cli.api_key.as_ref().filter(|k| !k.is_empty()) {
        config = config.with_api_key(key.clone());
    }
    config
}

fn rpc_config(cli: &Cli) -> StarknetRpcConfig {
    match &cli.rpc_url {
        Some(url) => StarknetRpcConfig::new(url.clone()),
        None if cli.testnet => StarknetRpcConfig::sepolia(),
        None => StarknetRpcConfig::default(),
    }
}

fn backend(cli: &Cli) -> Result<GaslessClient> {
    let config = gasless_config(cli);
    debug!(
        base_url = %config.base_url,
        api_key = config.api_key.is_some(),
        "Using sponsorship backend"
    );
    GaslessClient::with_config(config).context("Invalid backend configuration")
}

fn parse_felt(value: &str, what: &str) -> Result<Felt> {
    value
        .parse()
        .with_context(|| format!("Invalid {what}: {value}"))
}

/// Reads a JSON array of `{ contractAddress, entrypoint, calldata }` calls.
fn load_calls(path: &Path) -> Result<Vec<Call>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open calls file {}", path.display()))?;
    let calls: Vec<Call> =
        serde_json::from_reader(file).context("Calls file is not a JSON array of calls")?;
    if calls.is_empty() {
        bail!("Calls file {} holds no calls", path.display());
    }
    debug!(path = %path.display(), calls = calls.len(), "Loaded call batch");
    Ok(calls)
}

/// Renders a base-unit amount with the token's decimals.
fn format_units(amount: U256, decimals: u32) -> String {
    let digits = amount.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    let padded = format!("{digits:0>width$}", width = decimals + 1);
    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{fraction}")
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMMANDS
// ═══════════════════════════════════════════════════════════════════════════════

/// Check gasless compatibility
async fn cmd_compatibility(cli: &Cli, address: &str) -> Result<()> {
    let address = parse_felt(address, "account address")?;
    println!("{} {}", "🔍 Checking compatibility of:".cyan().bold(), address);

    let compatibility = backend(cli)?
        .account_compatibility(&address)
        .await
        .context("Failed to fetch compatibility")?;

    if compatibility.is_compatible {
        println!("\n{}", "✅ Account supports gasless execution".green().bold());
    } else {
        println!("\n{}", "❌ Account does not support gasless execution".red().bold());
    }
    println!(
        "   {} {}",
        "Gas overhead:".dimmed(),
        compatibility.gas_consumed_overhead
    );
    println!(
        "   {} {}",
        "Data gas overhead:".dimmed(),
        compatibility.data_gas_consumed_overhead
    );

    Ok(())
}

/// List sponsorship rewards
async fn cmd_rewards(cli: &Cli, address: &str) -> Result<()> {
    let address = parse_felt(address, "account address")?;
    let client = backend(cli)?;
    println!(
        "{} {} ({})",
        "🎁 Rewards of:".cyan().bold(),
        address,
        client.config().rewards_protocol
    );

    let rewards = client
        .account_rewards(&address)
        .await
        .context("Failed to fetch rewards")?;

    if rewards.is_empty() {
        println!("\n{}", "No pending rewards.".yellow());
        return Ok(());
    }

    println!("\n{} {} reward(s):", "✅".green(), rewards.len());
    for reward in &rewards {
        println!(
            "   {} {} / {}",
            "Campaign:".green(),
            reward.partner,
            reward.campaign
        );
        println!(
            "      {}/{} sponsored transactions left",
            reward.remaining_tx, reward.free_tx
        );
        if let Some(expiration) = &reward.expiration_date {
            println!("      Expires {expiration}");
        }
        for call in &reward.whitelisted_calls {
            println!("      {} {}", call.contract_address.dimmed(), call.entrypoint);
        }
    }

    Ok(())
}

/// List gas-token prices
async fn cmd_prices(cli: &Cli) -> Result<()> {
    println!("{}", "💱 Fetching gas token prices...".cyan().bold());

    let prices = backend(cli)?
        .gas_token_prices()
        .await
        .context("Failed to fetch gas token prices")?;

    if prices.is_empty() {
        println!("\n{}", "⚠️  No gas tokens accepted.".yellow());
        return Ok(());
    }

    println!();
    for price in &prices {
        println!("   {} {}", "Token:".yellow(), price.token_address);
        println!(
            "      {} {} ETH",
            "Price:".dimmed(),
            format_units(price.price_in_eth, 18)
        );
        println!("      {} ${:.4}", "USD:".dimmed(), price.price_in_usd);
        println!("      {} {}", "Decimals:".dimmed(), price.decimals);
    }

    Ok(())
}

/// Request typed data
async fn cmd_typed_data(
    cli: &Cli,
    address: &str,
    calls_path: &Path,
    class_hash: Option<&str>,
) -> Result<()> {
    let request = BuildTypedDataRequest {
        user_address: parse_felt(address, "account address")?,
        calls: load_calls(calls_path)?,
        account_class_hash: class_hash
            .map(|hash| parse_felt(hash, "class hash"))
            .transpose()?,
    };
    println!(
        "{} {} call(s)",
        "📝 Building typed data for".cyan().bold(),
        request.calls.len()
    );

    let response = backend(cli)?
        .build_typed_data(&request)
        .await
        .context("Failed to build typed data")?;

    match response {
        TypedDataResponse::Ready(typed_data) => {
            println!("\n{}", "✅ Typed data:".green().bold());
            println!("{}", serde_json::to_string_pretty(typed_data.as_value())?);
        }
        TypedDataResponse::NotReady(reason) => {
            println!("\n{} {}", "⚠️  Gasless execution not available:".yellow(), reason);
            println!("   The batch would be sent directly from the account.");
        }
    }

    Ok(())
}

/// Estimate fees through the paymaster flow
async fn cmd_estimate(
    cli: &Cli,
    address: &str,
    calls_path: &Path,
    token: Option<&str>,
) -> Result<()> {
    let address = parse_felt(address, "account address")?;
    let calls = load_calls(calls_path)?;
    println!(
        "{} {} call(s) from {}",
        "⛽ Estimating".cyan().bold(),
        calls.len(),
        address
    );

    let rpc = rpc_config(cli);
    debug!(rpc_url = %rpc.rpc_url, testnet = cli.testnet, "Connecting paymaster flow");
    let flow = PaymasterFlow::connect(gasless_config(cli), rpc, Arc::new(|_| {}))
        .context("Invalid configuration")?;

    flow.refresh_prices().await;
    if let Some(token) = token {
        let token = parse_felt(token, "token address")?;
        let price = flow
            .state()
            .gas_token_prices
            .into_iter()
            .find(|p| p.token_address == token)
            .with_context(|| format!("Token {token} is not an accepted gas token"))?;
        debug!(token = %price.token_address, "Selected gas token");
        flow.select_gas_token_price(price).await;
    }
    flow.set_calls(calls, false).await;
    flow.set_account(Some(Arc::new(WatchOnlyAccount { address })))
        .await;

    let state = flow.state();
    let Some(compatibility) = &state.gasless_compatibility else {
        bail!("Could not fetch gasless compatibility for {address}");
    };
    let Some(price) = &state.gas_token_price else {
        bail!("No gas token price available");
    };
    if let Some(tx_error) = &state.tx_error {
        println!("\n{} {}", "❌ Simulation failed:".red().bold(), tx_error.short);
        if !tx_error.message.is_empty() {
            println!("   {}", tx_error.message.dimmed());
        }
        return Ok(());
    }
    let (Some(fee), Some(amount)) = (&state.fee_estimate, state.max_gas_token_amount) else {
        bail!("Fee estimation did not complete");
    };
    info!(
        overall_fee = %fee.overall_fee,
        max_gas_token_amount = %amount,
        "Fee estimate ready"
    );

    println!("\n{}", "✅ Estimate:".green().bold());
    println!("   {} {} wei", "Native fee:".dimmed(), fee.overall_fee);
    println!("   {} {}", "Gas token:".dimmed(), price.token_address);
    println!(
        "   {} {} ({} base units)",
        "Max amount:".yellow(),
        format_units(amount, price.decimals),
        amount
    );
    if !compatibility.is_compatible {
        println!("\n{}", "⚠️  Account is not gasless-compatible.".yellow());
    }

    let sponsored = state.applicable_rewards(&flow.calls()).count();
    if sponsored > 0 {
        println!("   {} {} reward(s) cover this batch", "🎁".green(), sponsored);
    }

    Ok(())
}

/// Compute an entrypoint selector
fn cmd_selector(name: &str) -> Result<()> {
    let selector = selector_from_name(name);
    println!("{} {}", "Selector of".cyan().bold(), name);
    println!("   {} {}", "Hex:".dimmed(), selector);
    println!("   {} {}", "Decimal:".dimmed(), selector.to_dec_string());
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// WATCH-ONLY ACCOUNT
// ═══════════════════════════════════════════════════════════════════════════════

/// An account known only by its address. Enough for estimation; it cannot
/// sign or send.
struct WatchOnlyAccount {
    address: Felt,
}

#[async_trait]
impl WalletAccount for WatchOnlyAccount {
    fn address(&self) -> Felt {
        self.address
    }

    fn supports_deployment_bundling(&self) -> bool {
        false
    }

    async fn deployment_data(&self) -> gasless_core::Result<Option<DeploymentData>> {
        Ok(None)
    }

    async fn sign_typed_data(&self, _typed_data: &TypedData) -> gasless_core::Result<Vec<String>> {
        Err(GaslessError::WalletError("watch-only account cannot sign".into()))
    }

    async fn send_calls(&self, _calls: &[Call]) -> gasless_core::Result<Felt> {
        Err(GaslessError::WalletError("watch-only account cannot send".into()))
    }
}
