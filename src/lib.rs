//! Omni Strike Governor
//!
//! Cycles a fixed set of EVM networks and, on each, sizes a flash-loan strike
//! from the wallet's native balance, proves it with `eth_call`, and only then
//! signs and broadcasts it.
//!
//! # Safety Model
//!
//! - No transaction is broadcast without a successful simulation
//! - Per-attempt failures stay inside the attempt that hit them
//! - The private key never leaves the wallet module

pub mod alerts;
pub mod chain;
pub mod config;
pub mod governor;
pub mod health;
pub mod networks;
pub mod strike;
pub mod wallet;

mod error;

// Re-export commonly used types
pub use config::{Config, Credentials, Network, RpcConfig, Schedule, Submission};
pub use error::{Error, Result};
pub use governor::{connect_networks, NetworkSlot, OmniGovernor, ShutdownHandle};
pub use networks::{NetworkConfig, NetworkRegistry};
pub use strike::{StrikeExecutor, StrikeMetricsCalculator, StrikeOutcome};
