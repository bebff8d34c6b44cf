//! RPC endpoint configuration
//!
//! Endpoints are resolved per network in priority order:
//! 1. Per-chain env vars (ETH_RPC_URL, ARBITRUM_RPC_URL, etc.)
//! 2. ALCHEMY_API_KEY - builds URLs for every network Alchemy serves
//! 3. The registry's default public endpoint
//!
//! # Examples
//!
//! ```bash
//! export ETH_RPC_URL="https://eth-mainnet.g.alchemy.com/v2/YOUR_KEY"
//! export BASE_RPC_URL="https://base-mainnet.g.alchemy.com/v2/YOUR_KEY"
//! ```

use crate::config::Network;
use crate::networks::NetworkRegistry;
use std::collections::HashMap;

/// Environment variable names
mod env_vars {
    pub const ETH_RPC_URL: &str = "ETH_RPC_URL";
    pub const ARBITRUM_RPC_URL: &str = "ARBITRUM_RPC_URL";
    pub const OPTIMISM_RPC_URL: &str = "OPTIMISM_RPC_URL";
    pub const BASE_RPC_URL: &str = "BASE_RPC_URL";
    pub const POLYGON_RPC_URL: &str = "POLYGON_RPC_URL";

    pub const ALCHEMY_API_KEY: &str = "ALCHEMY_API_KEY";
}

/// Per-chain override variable for a network
pub fn override_var(network: Network) -> &'static str {
    match network {
        Network::Ethereum => env_vars::ETH_RPC_URL,
        Network::Arbitrum => env_vars::ARBITRUM_RPC_URL,
        Network::Optimism => env_vars::OPTIMISM_RPC_URL,
        Network::Base => env_vars::BASE_RPC_URL,
        Network::Polygon => env_vars::POLYGON_RPC_URL,
    }
}

fn alchemy_url(network: Network, key: &str) -> String {
    let host = match network {
        Network::Ethereum => "eth-mainnet",
        Network::Arbitrum => "arb-mainnet",
        Network::Optimism => "opt-mainnet",
        Network::Base => "base-mainnet",
        Network::Polygon => "polygon-mainnet",
    };
    format!("https://{}.g.alchemy.com/v2/{}", host, key)
}

/// Resolved RPC endpoint per network
#[derive(Debug, Clone)]
pub struct RpcConfig {
    urls: HashMap<Network, String>,
}

impl RpcConfig {
    /// Resolve every registry network against the process environment
    pub fn from_env(registry: &NetworkRegistry) -> Self {
        Self::resolve(registry, |name| std::env::var(name).ok())
    }

    /// Resolve with an explicit variable lookup
    pub fn resolve(registry: &NetworkRegistry, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let alchemy_key = lookup(env_vars::ALCHEMY_API_KEY);
        let mut urls = HashMap::new();

        for config in registry.iter() {
            let network = config.network;
            let url = if let Some(url) = lookup(override_var(network)) {
                tracing::debug!(network = %network, "Using {} override", override_var(network));
                url
            } else if let Some(key) = alchemy_key.as_deref() {
                alchemy_url(network, key)
            } else {
                tracing::warn!(
                    network = %network,
                    "No RPC configured, using public endpoint (rate limited)"
                );
                config.default_rpc_url.to_string()
            };
            urls.insert(network, url);
        }

        Self { urls }
    }

    /// Create with explicit RPC URLs
    pub fn with_urls(urls: HashMap<Network, String>) -> Self {
        Self { urls }
    }

    /// Get RPC URL for a network
    pub fn get(&self, network: Network) -> Option<&str> {
        self.urls.get(&network).map(|s| s.as_str())
    }
}
