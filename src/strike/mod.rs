//! Strike pipeline: sizing, target resolution, gated execution
//!
//! A strike is one call to the executor contract, sized from the operating
//! account's idle balance and only ever broadcast after a clean `eth_call`.

mod executor;
mod metrics;

pub use executor::StrikeExecutor;
pub use metrics::{FeeSnapshot, SkipReason, StrikeMetrics, StrikeMetricsCalculator};

use crate::chain::ChainGateway;
use crate::config::{parse_address, Network};
use crate::networks::NetworkConfig;
use crate::wallet::SecureWallet;
use alloy::primitives::{address, Address, B256, U256};
use alloy::sol;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Gas limit attached to every strike
pub const FIXED_GAS_LIMIT: u64 = 1_800_000;

/// Floor applied to the node's base fee before scaling (0.1 gwei)
pub const MIN_BASE_FEE: u128 = 100_000_000;

/// Base-fee safety multiplier, 1.30
pub const BASE_FEE_MULTIPLIER_NUMERATOR: u128 = 13;
pub const BASE_FEE_MULTIPLIER_DENOMINATOR: u128 = 10;

/// Buffer that must remain available above overhead (0.005 native)
pub const FIXED_RESERVE: U256 = U256::from_limbs([5_000_000_000_000_000, 0, 0, 0]);

/// Leverage ratio: `tradeAmount = premium * 10000 / 9`
pub const LEVERAGE_NUMERATOR: U256 = U256::from_limbs([10_000, 0, 0, 0]);
pub const LEVERAGE_DENOMINATOR: U256 = U256::from_limbs([9, 0, 0, 0]);

/// Smallest trade worth sending (5.0 native-equivalent units)
pub const MIN_LOAN_THRESHOLD: U256 = U256::from_limbs([5_000_000_000_000_000_000, 0, 0, 0]);

/// Every strike routes its proceeds here
pub const PROFIT_RECIPIENT: Address = address!("7e1a2f9c3b5d4e6f8091a2b3c4d5e6f708192a3b");

/// Target hint meaning "use the network's discovery token"
pub const DISCOVERY_SENTINEL: &str = "discovery";

sol! {
    /// Executor contract entry point
    interface IStrikeExecutor {
        function strike(
            address router,
            address token,
            address stable,
            uint256 amountIn,
            address recipient
        ) external payable;
    }
}

/// Resolve a target hint to a token address
///
/// The sentinel and anything that is not a well-formed address both fall back
/// to the discovery token; malformed hints never fail an attempt.
pub fn resolve_target(hint: &str, config: &NetworkConfig) -> Address {
    let hint = hint.trim();
    if hint == DISCOVERY_SENTINEL {
        return config.discovery_token;
    }
    parse_address(hint).unwrap_or(config.discovery_token)
}

/// Everything one network needs to run strikes
///
/// Built once at startup and owned by that network's loop; nothing in here is
/// shared with another network.
#[derive(Clone)]
pub struct NetworkContext {
    pub config: NetworkConfig,
    pub gateway: Arc<dyn ChainGateway>,
    pub wallet: Arc<SecureWallet>,
}

impl NetworkContext {
    pub fn network(&self) -> Network {
        self.config.network
    }
}

/// Terminal state of one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrikeOutcome {
    /// No transaction was built
    Skipped(SkipReason),
    /// `eth_call` reverted or errored; nothing was broadcast
    SimulationFailed { reason: String },
    /// Simulation passed in dry-run mode; nothing was broadcast
    Simulated,
    Broadcast { tx_hash: B256 },
    /// Signing or submission failed after a clean simulation
    BroadcastFailed { error: String },
}

impl StrikeOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            StrikeOutcome::Skipped(_) => "skipped",
            StrikeOutcome::SimulationFailed { .. } => "simulation_failed",
            StrikeOutcome::Simulated => "simulated",
            StrikeOutcome::Broadcast { .. } => "broadcast",
            StrikeOutcome::BroadcastFailed { .. } => "broadcast_failed",
        }
    }
}

/// One network's unit of work in one pass
#[derive(Debug, Clone)]
pub struct StrikeAttempt {
    pub id: Uuid,
    pub network: Network,
    pub started_at: DateTime<Utc>,
    pub target: Address,
    pub metrics: Option<StrikeMetrics>,
    pub outcome: StrikeOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::networks::NetworkRegistry;
    use std::str::FromStr;

    #[test]
    fn constants_hold_expected_values() {
        assert_eq!(FIXED_RESERVE, U256::from(5_000_000_000_000_000u64));
        assert_eq!(MIN_LOAN_THRESHOLD, U256::from(5_000_000_000_000_000_000u64));
        assert_eq!(LEVERAGE_NUMERATOR, U256::from(10_000u64));
        assert_eq!(LEVERAGE_DENOMINATOR, U256::from(9u64));
    }

    #[test]
    fn sentinel_resolves_to_discovery_token() {
        let registry = NetworkRegistry::mainnet();
        let config = registry.get(Network::Arbitrum).unwrap();
        assert_eq!(resolve_target("discovery", config), config.discovery_token);
    }

    #[test]
    fn valid_address_hint_is_used_verbatim() {
        let registry = NetworkRegistry::mainnet();
        let config = registry.get(Network::Base).unwrap();
        let hint = "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913";
        assert_eq!(
            resolve_target(hint, config),
            Address::from_str(hint).unwrap()
        );
    }

    #[test]
    fn malformed_hints_fall_back_to_discovery_token() {
        let registry = NetworkRegistry::mainnet();
        let config = registry.get(Network::Ethereum).unwrap();

        for hint in [
            "",
            "weth",
            "0x1234",
            "833589fcd6edb6e08f4c7c32d4f71b54bda02913",
            "0xg33589fcd6edb6e08f4c7c32d4f71b54bda02913",
            "0x833589fcd6edb6e08f4c7c32d4f71b54bda0291300",
        ] {
            assert_eq!(
                resolve_target(hint, config),
                config.discovery_token,
                "hint {hint:?}"
            );
        }
    }

    #[test]
    fn recipient_is_not_zero() {
        assert_ne!(PROFIT_RECIPIENT, Address::ZERO);
    }
}
