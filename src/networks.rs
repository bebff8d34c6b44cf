//! Static network registry
//!
//! Per-network strike parameters: chain id, default endpoint, moat, priority-fee
//! hint, reference stable token, discovery token and router. The table is built
//! once and only ever read.

use crate::config::Network;
use alloy::primitives::{address, Address, U256};

const GWEI: u128 = 1_000_000_000;
const MILLI_ETHER: u64 = 1_000_000_000_000_000;

/// Well-known addresses per chain
pub mod addresses {
    use super::*;

    // === Ethereum Mainnet ===
    pub const USDC_ETH: Address = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
    pub const WETH_ETH: Address = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");

    // === Arbitrum ===
    pub const USDC_ARB: Address = address!("af88d065e77c8cc2239327c5edb3a432268e5831");
    pub const WETH_ARB: Address = address!("82af49447d8a07e3bd95bd0d56f35241523fbab1");

    // === Optimism ===
    pub const USDC_OPT: Address = address!("0b2c639c533813f4aa9d7837caf62653d097ff85");
    pub const WETH_OPT: Address = address!("4200000000000000000000000000000000000006");

    // === Base ===
    pub const USDC_BASE: Address = address!("833589fcd6edb6e08f4c7c32d4f71b54bda02913");
    pub const WETH_BASE: Address = address!("4200000000000000000000000000000000000006");

    // === Polygon ===
    pub const USDC_POLYGON: Address = address!("3c499c542cef5e3811e1192ce70d8cc03d5c3359");
    pub const WETH_POLYGON: Address = address!("7ceb23fd6bc0add59e62ac25578270cff1b9f619");

    // === Routers ===
    /// Uniswap SwapRouter02 (Ethereum, Arbitrum, Optimism, Polygon)
    pub const SWAP_ROUTER_02: Address = address!("68b3465833fb72a70ecdf485e0e4c7bd8665fc45");
    /// Uniswap SwapRouter02 on Base
    pub const SWAP_ROUTER_02_BASE: Address = address!("2626664c2603336e57b271c5c0b26f421741e481");
}

/// Flashbots bundle relay (Ethereum mainnet)
pub const FLASHBOTS_RELAY_URL: &str = "https://relay.flashbots.net";

/// Immutable parameters for one network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub network: Network,
    pub chain_id: u64,
    /// Public endpoint used when no override is configured
    pub default_rpc_url: &'static str,
    /// Native value held back from every strike (wei)
    pub moat: U256,
    /// Priority fee added on top of the scaled base fee (wei per gas)
    pub priority_fee_hint: u128,
    /// Stable-value reference token (swap output)
    pub stable_token: Address,
    /// Default target when no explicit target is supplied
    pub discovery_token: Address,
    pub router: Address,
    /// Private bundle relay, where one exists
    pub relay_url: Option<&'static str>,
}

impl NetworkConfig {
    pub fn name(&self) -> &'static str {
        self.network.name()
    }
}

/// Network registry in fixed iteration order
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    networks: Vec<NetworkConfig>,
}

impl NetworkRegistry {
    /// Mainnet deployments of every supported network
    pub fn mainnet() -> Self {
        use addresses::*;

        let networks = vec![
            NetworkConfig {
                network: Network::Ethereum,
                chain_id: Network::Ethereum.chain_id(),
                default_rpc_url: "https://eth.llamarpc.com",
                moat: U256::from(8 * MILLI_ETHER),
                priority_fee_hint: 2 * GWEI,
                stable_token: USDC_ETH,
                discovery_token: WETH_ETH,
                router: SWAP_ROUTER_02,
                relay_url: Some(FLASHBOTS_RELAY_URL),
            },
            NetworkConfig {
                network: Network::Arbitrum,
                chain_id: Network::Arbitrum.chain_id(),
                default_rpc_url: "https://arb1.arbitrum.io/rpc",
                moat: U256::from(2 * MILLI_ETHER),
                priority_fee_hint: GWEI / 100,
                stable_token: USDC_ARB,
                discovery_token: WETH_ARB,
                router: SWAP_ROUTER_02,
                relay_url: None,
            },
            NetworkConfig {
                network: Network::Optimism,
                chain_id: Network::Optimism.chain_id(),
                default_rpc_url: "https://mainnet.optimism.io",
                moat: U256::from(2 * MILLI_ETHER),
                priority_fee_hint: GWEI / 1_000,
                stable_token: USDC_OPT,
                discovery_token: WETH_OPT,
                router: SWAP_ROUTER_02,
                relay_url: None,
            },
            NetworkConfig {
                network: Network::Base,
                chain_id: Network::Base.chain_id(),
                default_rpc_url: "https://mainnet.base.org",
                moat: U256::from(2 * MILLI_ETHER),
                priority_fee_hint: GWEI / 1_000,
                stable_token: USDC_BASE,
                discovery_token: WETH_BASE,
                router: SWAP_ROUTER_02_BASE,
                relay_url: None,
            },
            NetworkConfig {
                network: Network::Polygon,
                chain_id: Network::Polygon.chain_id(),
                default_rpc_url: "https://polygon-rpc.com",
                // POL is cheap; hold back a full unit
                moat: U256::from(1_000 * MILLI_ETHER),
                priority_fee_hint: 30 * GWEI,
                stable_token: USDC_POLYGON,
                discovery_token: WETH_POLYGON,
                router: SWAP_ROUTER_02,
                relay_url: None,
            },
        ];

        Self { networks }
    }

    /// Registry restricted to `enabled`, registry order preserved
    pub fn filtered(&self, enabled: &[Network]) -> Self {
        Self {
            networks: self
                .networks
                .iter()
                .filter(|c| enabled.contains(&c.network))
                .cloned()
                .collect(),
        }
    }

    pub fn get(&self, network: Network) -> Option<&NetworkConfig> {
        self.networks.iter().find(|c| c.network == network)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NetworkConfig> {
        self.networks.iter()
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::mainnet()
    }
}
