//! Transaction simulation before signing
//!
//! Uses `eth_call` to replay a strike against current chain state:
//! - Catch reverts before anything is signed or broadcast
//! - Surface the decoded revert reason for the logs
//!
//! SECURITY NOTE:
//! - This module is read-only - it never signs or submits transactions
//! - Simulation uses the wallet's public address only

use crate::chain::{with_timeout, GatewayError, HttpProvider};
use crate::wallet::StrikeTransaction;
use alloy::hex;
use alloy::primitives::Bytes;
use alloy::providers::Provider;
use std::time::Duration;

/// Result of simulating a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationResult {
    /// Whether the simulation succeeded
    pub success: bool,
    /// Revert reason (if failed)
    pub revert_reason: Option<String>,
    /// Raw return data from eth_call
    pub return_data: Option<Bytes>,
}

impl SimulationResult {
    /// Create a successful simulation result
    pub fn success(return_data: Option<Bytes>) -> Self {
        Self {
            success: true,
            revert_reason: None,
            return_data,
        }
    }

    /// Create a failed simulation result
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            revert_reason: Some(reason.into()),
            return_data: None,
        }
    }
}

/// Transaction simulator using eth_call
#[derive(Clone)]
pub struct TransactionSimulator {
    provider: HttpProvider,
    timeout: Duration,
}

impl TransactionSimulator {
    pub fn new(provider: HttpProvider, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Simulate a strike transaction using eth_call
    ///
    /// A revert is a successful *simulation* with `success = false`; only a
    /// timeout is reported as an error.
    pub async fn simulate(&self, tx: &StrikeTransaction) -> Result<SimulationResult, GatewayError> {
        let request = tx.to_request();
        let outcome = with_timeout("eth_call", self.timeout, async {
            Ok(self.provider.call(request).await)
        })
        .await?;

        match outcome {
            Ok(data) => Ok(SimulationResult::success(Some(data))),
            Err(e) => Ok(SimulationResult::failed(Self::parse_revert_reason(
                &e.to_string(),
            ))),
        }
    }

    /// Parse revert reason from RPC error message
    pub(crate) fn parse_revert_reason(error: &str) -> String {
        if error.contains("execution reverted") {
            if let Some(start) = error.find("revert: ") {
                let reason = &error[start + 8..];
                if let Some(end) = reason.find('"') {
                    return reason[..end].to_string();
                }
                return reason.to_string();
            }
            if let Some(start) = error.find("0x") {
                let hex_data = &error[start..];
                let end = hex_data
                    .find(|c: char| !c.is_ascii_hexdigit() && c != 'x')
                    .unwrap_or(hex_data.len());
                let hex = &hex_data[..end];
                // Error(string) selector
                if hex.starts_with("0x08c379a0") && hex.len() > 138 {
                    if let Ok(decoded) = hex::decode(&hex[138..]) {
                        let filtered: Vec<u8> = decoded.into_iter().filter(|&b| b != 0).collect();
                        if let Ok(s) = String::from_utf8(filtered) {
                            return s;
                        }
                    }
                }
                return format!("Reverted with data: {}", hex);
            }
            return "execution reverted".to_string();
        }

        error.to_string()
    }
}
