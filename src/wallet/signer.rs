//! Secure wallet implementation
//!
//! SECURITY: This is the ONLY place where private keys exist.
//! - Keys are held in alloy's PrivateKeySigner which handles crypto securely
//! - Keys are never serialized
//! - Keys are never logged
//!
//! Each wallet is bound to one chain id; it refuses to sign for any other.

use crate::{Error, Result};
use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy::eips::eip2718::Encodable2718;
use alloy::hex;
use alloy::network::TxSignerSync;
use alloy::primitives::{keccak256, Address, Bytes, TxKind, B256, U256};
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;

/// A fully specified EIP-1559 call, ready for simulation and signing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrikeTransaction {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub gas_limit: u64,
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
    pub nonce: u64,
    pub chain_id: u64,
}

impl StrikeTransaction {
    /// RPC request form, used for `eth_call`
    pub fn to_request(&self) -> TransactionRequest {
        TransactionRequest {
            from: Some(self.from),
            to: Some(TxKind::Call(self.to)),
            max_fee_per_gas: Some(self.max_fee_per_gas),
            max_priority_fee_per_gas: Some(self.max_priority_fee_per_gas),
            gas: Some(self.gas_limit),
            value: Some(self.value),
            input: TransactionInput::new(self.data.clone()),
            nonce: Some(self.nonce),
            chain_id: Some(self.chain_id),
            ..Default::default()
        }
    }
}

/// A signed, EIP-2718 encoded transaction
#[derive(Debug, Clone)]
pub struct SignedStrike {
    pub raw: Bytes,
    pub tx_hash: B256,
}

/// Secure wallet that protects private keys
///
/// The private key is:
/// - Stored in alloy's PrivateKeySigner (handles crypto securely)
/// - Never serialized (no Serialize impl)
/// - Only accessible via signing operations
pub struct SecureWallet {
    signer: PrivateKeySigner,
    /// Public address (safe to expose)
    address: Address,
    chain_id: u64,
}

impl SecureWallet {
    /// Create a wallet from a hex-encoded private key, bound to `chain_id`
    pub fn from_hex(key_hex: &str, chain_id: u64) -> Result<Self> {
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| Error::Wallet(format!("Invalid private key: {}", e)))?;

        let address = signer.address();

        Ok(Self {
            signer,
            address,
            chain_id,
        })
    }

    /// Get the public address (safe to share)
    pub fn address(&self) -> Address {
        self.address
    }

    /// Get the address as a checksummed string
    pub fn address_string(&self) -> String {
        self.address.to_checksum(None)
    }

    /// Sign a strike transaction into its raw broadcast form
    pub fn sign(&self, tx: &StrikeTransaction) -> Result<SignedStrike> {
        if tx.chain_id != self.chain_id {
            return Err(Error::Wallet(format!(
                "Wallet bound to chain {} refused to sign for chain {}",
                self.chain_id, tx.chain_id
            )));
        }
        if tx.from != self.address {
            return Err(Error::Wallet(format!(
                "Transaction sender {} is not the wallet address",
                tx.from
            )));
        }

        let mut unsigned = TxEip1559 {
            chain_id: tx.chain_id,
            nonce: tx.nonce,
            gas_limit: tx.gas_limit,
            max_fee_per_gas: tx.max_fee_per_gas,
            max_priority_fee_per_gas: tx.max_priority_fee_per_gas,
            to: TxKind::Call(tx.to),
            value: tx.value,
            access_list: Default::default(),
            input: tx.data.clone(),
        };

        let signature = TxSignerSync::sign_transaction_sync(&self.signer, &mut unsigned)
            .map_err(|e| Error::Wallet(format!("Signing failed: {}", e)))?;
        let envelope: TxEnvelope = unsigned.into_signed(signature).into();

        Ok(SignedStrike {
            tx_hash: *envelope.tx_hash(),
            raw: Bytes::from(envelope.encoded_2718()),
        })
    }

    /// Relay authentication header value for a JSON-RPC body
    ///
    /// `address:signature`, where the signature is an EIP-191 personal
    /// signature over the hex string of `keccak256(body)`.
    pub fn sign_relay_payload(&self, body: &[u8]) -> Result<String> {
        let digest = format!("{:#x}", keccak256(body));
        let signature = self
            .signer
            .sign_message_sync(digest.as_bytes())
            .map_err(|e| Error::Wallet(format!("Relay signing failed: {}", e)))?;
        Ok(format!(
            "{:#x}:{}",
            self.address,
            hex::encode_prefixed(signature.as_bytes())
        ))
    }
}

// Implement Debug manually to avoid exposing the signer
impl std::fmt::Debug for SecureWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureWallet")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .field("signer", &"[REDACTED]")
            .finish()
    }
}
