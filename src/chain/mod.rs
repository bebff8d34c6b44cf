//! Chain gateway abstraction
//!
//! One gateway per network owns a node connection and the operating address.
//! The strike pipeline only talks to the chain through [`ChainGateway`], so
//! tests can intercept every call and assert on ordering.

mod relay;
mod rpc;

#[cfg(test)]
pub(crate) mod mock;

pub use relay::RelayGateway;
pub use rpc::RpcGateway;

use crate::wallet::{SimulationResult, StrikeTransaction};
use alloy::network::Ethereum;
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::RootProvider;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

pub type HttpProvider = RootProvider<Ethereum>;

/// Fee conditions read from the latest block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeEstimate {
    pub base_fee_per_gas: u128,
}

/// Error type for gateway operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    #[error("Invalid RPC URL: {0}")]
    InvalidUrl(String),

    #[error("Chain id mismatch: expected {expected}, node reports {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    #[error("RPC {op} failed: {message}")]
    Rpc { op: &'static str, message: String },

    #[error("RPC {op} timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },
}

impl GatewayError {
    pub fn rpc(op: &'static str, err: impl std::fmt::Display) -> Self {
        GatewayError::Rpc {
            op,
            message: err.to_string(),
        }
    }
}

/// Trait for per-network chain access
///
/// Implementations never share state across networks. Every method is a single
/// round trip with no retry.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Chain id verified at construction
    fn chain_id(&self) -> u64;

    /// Native balance of `address` in wei
    async fn balance(&self, address: Address) -> Result<U256, GatewayError>;

    /// Latest block number
    async fn block_number(&self) -> Result<u64, GatewayError>;

    /// Current base fee
    async fn fee_estimate(&self) -> Result<FeeEstimate, GatewayError>;

    /// Pending nonce of `address`
    async fn pending_nonce(&self, address: Address) -> Result<u64, GatewayError>;

    /// Non-mutating replay of `tx` against current state
    async fn simulate(&self, tx: &StrikeTransaction) -> Result<SimulationResult, GatewayError>;

    /// Submit a signed, encoded transaction
    async fn broadcast(&self, raw: Bytes) -> Result<B256, GatewayError>;
}

/// Cap a node call with `timeout`
pub async fn with_timeout<T, F>(op: &'static str, timeout: Duration, fut: F) -> Result<T, GatewayError>
where
    F: Future<Output = Result<T, GatewayError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(GatewayError::Timeout { op, after: timeout }),
    }
}
