//! Recording gateway for tests

use super::{ChainGateway, FeeEstimate, GatewayError};
use crate::wallet::{SimulationResult, StrikeTransaction};
use alloy::primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Balance(Address),
    BlockNumber,
    FeeEstimate,
    PendingNonce(Address),
    Simulate(StrikeTransaction),
    Broadcast(Bytes),
}

pub(crate) struct MockGateway {
    pub chain_id: u64,
    pub balance: U256,
    pub base_fee_per_gas: u128,
    pub nonce: u64,
    pub block_number: u64,
    pub simulation: Result<SimulationResult, GatewayError>,
    pub broadcast: Result<B256, GatewayError>,
    /// Every call fails with an RPC error
    pub failing: bool,
    /// Delay applied before every call
    pub stall: Option<Duration>,
    calls: Mutex<Vec<Call>>,
}

impl MockGateway {
    pub fn new(chain_id: u64, balance: U256, base_fee_per_gas: u128) -> Self {
        Self {
            chain_id,
            balance,
            base_fee_per_gas,
            nonce: 0,
            block_number: 100,
            simulation: Ok(SimulationResult::success(None)),
            broadcast: Ok(B256::repeat_byte(0xab)),
            failing: false,
            stall: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(chain_id: u64) -> Self {
        Self {
            failing: true,
            ..Self::new(chain_id, U256::ZERO, 0)
        }
    }

    pub fn with_simulation(mut self, result: Result<SimulationResult, GatewayError>) -> Self {
        self.simulation = result;
        self
    }

    pub fn with_broadcast(mut self, result: Result<B256, GatewayError>) -> Self {
        self.broadcast = result;
        self
    }

    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn with_stall(mut self, stall: Duration) -> Self {
        self.stall = Some(stall);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn simulated(&self) -> Vec<StrikeTransaction> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Simulate(tx) => Some(tx),
                _ => None,
            })
            .collect()
    }

    pub fn broadcasts(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Broadcast(_)))
            .count()
    }

    async fn pause(&self) {
        if let Some(stall) = self.stall {
            tokio::time::sleep(stall).await;
        }
    }

    fn record(&self, call: Call, op: &'static str) -> Result<(), GatewayError> {
        self.calls.lock().unwrap().push(call);
        if self.failing {
            return Err(GatewayError::rpc(op, "connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainGateway for MockGateway {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn balance(&self, address: Address) -> Result<U256, GatewayError> {
        self.pause().await;
        self.record(Call::Balance(address), "eth_getBalance")?;
        Ok(self.balance)
    }

    async fn block_number(&self) -> Result<u64, GatewayError> {
        self.pause().await;
        self.record(Call::BlockNumber, "eth_blockNumber")?;
        Ok(self.block_number)
    }

    async fn fee_estimate(&self) -> Result<FeeEstimate, GatewayError> {
        self.pause().await;
        self.record(Call::FeeEstimate, "eth_getBlockByNumber")?;
        Ok(FeeEstimate {
            base_fee_per_gas: self.base_fee_per_gas,
        })
    }

    async fn pending_nonce(&self, address: Address) -> Result<u64, GatewayError> {
        self.pause().await;
        self.record(Call::PendingNonce(address), "eth_getTransactionCount")?;
        Ok(self.nonce)
    }

    async fn simulate(&self, tx: &StrikeTransaction) -> Result<SimulationResult, GatewayError> {
        self.pause().await;
        self.record(Call::Simulate(tx.clone()), "eth_call")?;
        self.simulation.clone()
    }

    async fn broadcast(&self, raw: Bytes) -> Result<B256, GatewayError> {
        self.pause().await;
        self.record(Call::Broadcast(raw), "eth_sendRawTransaction")?;
        self.broadcast.clone()
    }
}
