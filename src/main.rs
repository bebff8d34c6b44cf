//! Omni Strike Governor CLI
//!
//! Command-line interface for running the multi-network strike loop.

use alloy::primitives::utils::{format_ether, format_units, parse_ether, parse_units};
use alloy::primitives::U256;
use clap::{Parser, Subcommand};
use omni_strike_governor::alerts::AlertSink;
use omni_strike_governor::chain::FeeEstimate;
use omni_strike_governor::governor::{drain, shutdown_grace};
use omni_strike_governor::strike::StrikeMetricsCalculator;
use omni_strike_governor::{
    connect_networks, health, Config, Credentials, Error, Network, NetworkRegistry, OmniGovernor,
    Result, RpcConfig, StrikeExecutor,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "omni-governor")]
#[command(about = "Multi-network flash-loan strike governor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the strike loop
    Run {
        /// Simulate every strike but never broadcast
        #[arg(long)]
        dry_run: bool,

        /// Stop after this many passes (runs forever when omitted)
        #[arg(long)]
        passes: Option<u64>,

        /// Restrict to these networks (repeatable)
        #[arg(short, long = "network")]
        networks: Vec<Network>,
    },

    /// Show current configuration
    Config,

    /// Size a strike offline from a balance and base fee
    Size {
        /// Network (ethereum, arbitrum, optimism, base, polygon)
        #[arg(short, long, default_value = "ethereum")]
        network: Network,

        /// Native balance in ether units, e.g. 5.5
        #[arg(long)]
        balance: String,

        /// Latest base fee in gwei
        #[arg(long, default_value = "20")]
        base_fee_gwei: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let fmt_layer = if cli.json_logs {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .init();

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            dry_run,
            passes,
            networks,
        } => {
            if let Err(e) = run_governor(config, dry_run, passes, networks).await {
                tracing::error!(
                    error = %e,
                    precondition = e.is_startup_fatal(),
                    "Governor failed to start"
                );
                return Err(e);
            }
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Size {
            network,
            balance,
            base_fee_gwei,
        } => {
            run_size(network, &balance, &base_fee_gwei)?;
        }
    }

    Ok(())
}

async fn run_governor(
    config: Config,
    dry_run: bool,
    passes: Option<u64>,
    networks: Vec<Network>,
) -> Result<()> {
    let credentials = Credentials::from_env()?;

    let enabled = if networks.is_empty() {
        config.networks.clone()
    } else {
        networks
    };
    let registry = NetworkRegistry::mainnet().filtered(&enabled);
    if registry.is_empty() {
        return Err(Error::Config("No networks enabled".to_string()));
    }
    let rpc = RpcConfig::from_env(&registry);

    let executor =
        StrikeExecutor::new(credentials.executor()).with_dry_run(dry_run || config.dry_run);

    tracing::info!(
        networks = registry.len(),
        executor = %executor.contract(),
        recipient = %executor.recipient(),
        dry_run = dry_run || config.dry_run,
        submission = ?config.submission,
        "Starting governor"
    );

    if let Some(port) = config.health_port {
        health::spawn_health_server(port, executor.recipient()).await;
    }

    let slots = connect_networks(&registry, &rpc, &credentials, &config).await?;

    let alerts = if config.alerts {
        AlertSink::from_env()
    } else {
        None
    };
    if alerts.is_some() {
        tracing::info!("Alerts enabled");
    }

    let governor = Arc::new(OmniGovernor::new(slots, executor, config.pacing).with_alerts(alerts));
    let shutdown = governor.shutdown_handle();
    let schedule = config.schedule;
    let mut runner = tokio::spawn(async move { governor.run(schedule, passes).await });

    tokio::select! {
        joined = &mut runner => match joined {
            Ok(attempts) => tracing::info!(attempts, "Governor finished"),
            Err(e) => tracing::warn!(error = %e, "Governor task ended abnormally"),
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown requested, waiting for in-flight attempts");
            let grace = shutdown_grace(config.io_timeout());
            if let Some(attempts) = drain(&shutdown, runner, grace).await {
                tracing::info!(attempts, "Governor stopped");
            }
        }
    }

    Ok(())
}

fn run_size(network: Network, balance: &str, base_fee_gwei: &str) -> Result<()> {
    let registry = NetworkRegistry::mainnet();
    let config = registry
        .get(network)
        .ok_or_else(|| Error::InvalidArgument(format!("Unknown network: {}", network)))?;

    let balance = parse_ether(balance)
        .map_err(|e| Error::InvalidArgument(format!("Invalid balance: {}", e)))?;
    let base_fee = parse_units(base_fee_gwei, "gwei")
        .map_err(|e| Error::InvalidArgument(format!("Invalid base fee: {}", e)))?
        .get_absolute();
    let base_fee_per_gas = u128::try_from(base_fee)
        .map_err(|_| Error::InvalidArgument("Base fee out of range".to_string()))?;

    match StrikeMetricsCalculator::evaluate(balance, FeeEstimate { base_fee_per_gas }, config) {
        Ok(metrics) => {
            println!("Strike VIABLE on {}", network);
            println!("  Premium (value):   {} native", format_ether(metrics.premium));
            println!("  Trade amount:      {}", format_ether(metrics.trade_amount));
            println!(
                "  Max fee per gas:   {} gwei",
                format_units(U256::from(metrics.max_fee_per_gas), "gwei").unwrap_or_default()
            );
            println!(
                "  Priority fee:      {} gwei",
                format_units(U256::from(metrics.max_priority_fee_per_gas), "gwei").unwrap_or_default()
            );
        }
        Err(reason) => {
            println!("Strike SKIPPED on {}", network);
            println!("  Reason: {}", reason);
        }
    }

    Ok(())
}
