//! HTTP JSON-RPC gateway over alloy's root provider

use super::{with_timeout, ChainGateway, FeeEstimate, GatewayError, HttpProvider};
use crate::networks::NetworkConfig;
use crate::wallet::{SimulationResult, StrikeTransaction, TransactionSimulator};
use alloy::eips::BlockNumberOrTag;
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{Provider, RootProvider};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Gateway bound to one node and one chain id
pub struct RpcGateway {
    chain_id: u64,
    provider: HttpProvider,
    simulator: TransactionSimulator,
    timeout: Duration,
}

impl RpcGateway {
    /// Connect to `rpc_url` and verify it serves `config.chain_id`
    ///
    /// Any failure here leaves the network offline for the rest of the run.
    pub async fn connect(
        config: &NetworkConfig,
        rpc_url: &str,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let url = Url::parse(rpc_url)
            .map_err(|e| GatewayError::InvalidUrl(format!("{}: {}", config.name(), e)))?;
        let provider: HttpProvider = RootProvider::new_http(url);

        let actual = with_timeout("eth_chainId", timeout, async {
            provider
                .get_chain_id()
                .await
                .map_err(|e| GatewayError::rpc("eth_chainId", e))
        })
        .await?;

        if actual != config.chain_id {
            return Err(GatewayError::ChainMismatch {
                expected: config.chain_id,
                actual,
            });
        }

        tracing::debug!(network = config.name(), chain_id = actual, "Gateway connected");

        Ok(Self {
            chain_id: actual,
            simulator: TransactionSimulator::new(provider.clone(), timeout),
            provider,
            timeout,
        })
    }
}

#[async_trait]
impl ChainGateway for RpcGateway {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn balance(&self, address: Address) -> Result<U256, GatewayError> {
        with_timeout("eth_getBalance", self.timeout, async {
            self.provider
                .get_balance(address)
                .await
                .map_err(|e| GatewayError::rpc("eth_getBalance", e))
        })
        .await
    }

    async fn block_number(&self) -> Result<u64, GatewayError> {
        with_timeout("eth_blockNumber", self.timeout, async {
            self.provider
                .get_block_number()
                .await
                .map_err(|e| GatewayError::rpc("eth_blockNumber", e))
        })
        .await
    }

    async fn fee_estimate(&self) -> Result<FeeEstimate, GatewayError> {
        let block = with_timeout("eth_getBlockByNumber", self.timeout, async {
            self.provider
                .get_block_by_number(BlockNumberOrTag::Latest)
                .await
                .map_err(|e| GatewayError::rpc("eth_getBlockByNumber", e))
        })
        .await?;

        if let Some(base) = block.as_ref().and_then(|b| b.header.base_fee_per_gas) {
            return Ok(FeeEstimate {
                base_fee_per_gas: base as u128,
            });
        }

        // Pre-London style chains: legacy gas price stands in for the base fee.
        let gas_price = with_timeout("eth_gasPrice", self.timeout, async {
            self.provider
                .get_gas_price()
                .await
                .map_err(|e| GatewayError::rpc("eth_gasPrice", e))
        })
        .await?;

        Ok(FeeEstimate {
            base_fee_per_gas: gas_price,
        })
    }

    async fn pending_nonce(&self, address: Address) -> Result<u64, GatewayError> {
        with_timeout("eth_getTransactionCount", self.timeout, async {
            self.provider
                .get_transaction_count(address)
                .pending()
                .await
                .map_err(|e| GatewayError::rpc("eth_getTransactionCount", e))
        })
        .await
    }

    async fn simulate(&self, tx: &StrikeTransaction) -> Result<SimulationResult, GatewayError> {
        self.simulator.simulate(tx).await
    }

    async fn broadcast(&self, raw: Bytes) -> Result<B256, GatewayError> {
        with_timeout("eth_sendRawTransaction", self.timeout, async {
            let pending = self
                .provider
                .send_raw_transaction(&raw)
                .await
                .map_err(|e| GatewayError::rpc("eth_sendRawTransaction", e))?;
            Ok(*pending.tx_hash())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Network;
    use crate::networks::NetworkRegistry;

    #[tokio::test]
    async fn connect_rejects_malformed_url() {
        let registry = NetworkRegistry::mainnet();
        let config = registry.get(Network::Base).unwrap();

        let result = RpcGateway::connect(config, "not a url", Duration::from_millis(50)).await;
        assert!(matches!(result, Err(GatewayError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn connect_fails_when_node_unreachable() {
        let registry = NetworkRegistry::mainnet();
        let config = registry.get(Network::Optimism).unwrap();

        // Port 9 (discard) on loopback: refused or timed out, never a chain id.
        let result =
            RpcGateway::connect(config, "http://127.0.0.1:9", Duration::from_millis(500)).await;
        assert!(matches!(
            result,
            Err(GatewayError::Rpc { .. }) | Err(GatewayError::Timeout { .. })
        ));
    }
}
