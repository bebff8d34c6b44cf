//! Secure wallet management
//!
//! Private key storage, transaction signing, and the read-only `eth_call`
//! simulation gate. The private key never leaves the signer module.

mod signer;
mod simulator;

pub use signer::{SecureWallet, SignedStrike, StrikeTransaction};
pub use simulator::{SimulationResult, TransactionSimulator};
