//! Configuration for the strike governor

pub mod rpc;

use crate::{Error, Result};
use alloy::primitives::Address;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

// Re-export RPC config
pub use rpc::RpcConfig;

/// Environment variable holding the operating wallet's hex private key
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

/// Environment variable holding the deployed executor contract address
pub const EXECUTOR_ADDRESS_ENV: &str = "EXECUTOR_ADDRESS";

/// Optional key that signs relay requests; defaults to the operating key
pub const RELAY_AUTH_KEY_ENV: &str = "FLASHBOTS_AUTH_KEY";

/// Supported blockchain networks, in registry order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Ethereum,
    Arbitrum,
    Optimism,
    Base,
    Polygon,
}

impl Network {
    pub const ALL: [Network; 5] = [
        Network::Ethereum,
        Network::Arbitrum,
        Network::Optimism,
        Network::Base,
        Network::Polygon,
    ];

    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Ethereum => 1,
            Network::Arbitrum => 42161,
            Network::Optimism => 10,
            Network::Base => 8453,
            Network::Polygon => 137,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Network::Ethereum => "ethereum",
            Network::Arbitrum => "arbitrum",
            Network::Optimism => "optimism",
            Network::Base => "base",
            Network::Polygon => "polygon",
        }
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ethereum" | "mainnet" => Ok(Network::Ethereum),
            "arbitrum" => Ok(Network::Arbitrum),
            "optimism" => Ok(Network::Optimism),
            "base" => Ok(Network::Base),
            "polygon" => Ok(Network::Polygon),
            other => Err(Error::InvalidArgument(format!("Unknown network: {}", other))),
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How network attempts are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Schedule {
    /// One task per network sharing the pacing policy
    #[default]
    Concurrent,
    /// A single loop walking the networks in registry order
    Sequential,
}

/// Where signed strikes are sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Submission {
    /// `eth_sendRawTransaction` to the network's node
    #[default]
    Public,
    /// `eth_sendBundle` to the network's private relay; networks without one
    /// fall back to public
    Relay,
}

/// Delays between attempts
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Pause after each per-network attempt (milliseconds)
    pub network_interval_ms: u64,
    /// Pause after a full pass over all networks (milliseconds)
    pub pass_interval_ms: u64,
}

impl PacingConfig {
    pub fn network_interval(&self) -> Duration {
        Duration::from_millis(self.network_interval_ms)
    }

    pub fn pass_interval(&self) -> Duration {
        Duration::from_millis(self.pass_interval_ms)
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            network_interval_ms: 1_000,
            pass_interval_ms: 12_000,
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Networks to drive; registry order is kept regardless of list order
    pub networks: Vec<Network>,
    /// Pacing policy shared by every network
    #[serde(default)]
    pub pacing: PacingConfig,
    /// Cap on every node call (milliseconds)
    pub io_timeout_ms: u64,
    /// Scheduling model
    #[serde(default)]
    pub schedule: Schedule,
    /// Simulate but never broadcast
    #[serde(default)]
    pub dry_run: bool,
    /// Liveness endpoint port (disabled when absent)
    pub health_port: Option<u16>,
    /// Submission path for signed strikes
    #[serde(default)]
    pub submission: Submission,
    /// Replaces the registry relay endpoint for networks that have one
    #[serde(default)]
    pub relay_url: Option<String>,
    /// Send best-effort alerts when a webhook is configured
    #[serde(default = "default_alerts")]
    pub alerts: bool,
}

fn default_alerts() -> bool {
    true
}

impl Config {
    /// Load from a JSON file, or fall back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                serde_json::from_str(&content).map_err(|e| Error::Config(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            networks: Network::ALL.to_vec(),
            pacing: PacingConfig::default(),
            io_timeout_ms: 5_000,
            schedule: Schedule::Concurrent,
            dry_run: false,
            health_port: Some(8080),
            submission: Submission::Public,
            relay_url: None,
            alerts: true,
        }
    }
}

/// Startup secrets: the signing credential and the executor contract
///
/// Both are required; their absence is the only fatal condition of the run loop.
pub struct Credentials {
    private_key: SecretString,
    executor: Address,
    relay_auth: Option<SecretString>,
}

impl Credentials {
    /// Read `PRIVATE_KEY` and `EXECUTOR_ADDRESS` from the environment
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_values(
            std::env::var(PRIVATE_KEY_ENV).ok(),
            std::env::var(EXECUTOR_ADDRESS_ENV).ok(),
        )?
        .with_relay_auth(std::env::var(RELAY_AUTH_KEY_ENV).ok()))
    }

    pub fn from_values(private_key: Option<String>, executor: Option<String>) -> Result<Self> {
        let private_key = private_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                Error::MissingCredential(format!("{} is not set", PRIVATE_KEY_ENV))
            })?;

        let executor = executor
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| Error::MissingContract(format!("{} is not set", EXECUTOR_ADDRESS_ENV)))?;

        let executor = parse_address(&executor).ok_or_else(|| {
            Error::MissingContract(format!(
                "{} is not a valid address: {}",
                EXECUTOR_ADDRESS_ENV, executor
            ))
        })?;

        Ok(Self {
            private_key: SecretString::from(private_key),
            executor,
            relay_auth: None,
        })
    }

    /// Use a separate identity for relay requests; blank values are ignored
    pub fn with_relay_auth(mut self, key: Option<String>) -> Self {
        self.relay_auth = key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .map(SecretString::from);
        self
    }

    pub fn executor(&self) -> Address {
        self.executor
    }

    pub(crate) fn expose_key(&self) -> &str {
        self.private_key.expose_secret()
    }

    pub(crate) fn relay_auth_key(&self) -> &str {
        self.relay_auth
            .as_ref()
            .map(|k| k.expose_secret())
            .unwrap_or_else(|| self.expose_key())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("private_key", &"[REDACTED]")
            .field("executor", &self.executor)
            .field(
                "relay_auth",
                &self.relay_auth.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Parse a `0x`-prefixed, 20-byte hex address
pub fn parse_address(raw: &str) -> Option<Address> {
    let hex = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X"))?;
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Address::from_str(raw).ok()
}
