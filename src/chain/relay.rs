//! Private relay submission
//!
//! Wraps a node gateway and replaces its broadcast with a signed
//! `eth_sendBundle` pinned to the next block. Reads and simulation still go to
//! the node, so the `eth_call` gate stays in front of every bundle.

use super::{with_timeout, ChainGateway, FeeEstimate, GatewayError};
use crate::wallet::{SecureWallet, SimulationResult, StrikeTransaction};
use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const SEND_BUNDLE: &str = "eth_sendBundle";
const SIGNATURE_HEADER: &str = "X-Flashbots-Signature";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BundleParams {
    txs: Vec<String>,
    block_number: String,
}

/// Gateway that submits through a private relay instead of the public mempool
pub struct RelayGateway {
    node: Arc<dyn ChainGateway>,
    client: reqwest::Client,
    relay_url: String,
    auth: Arc<SecureWallet>,
    timeout: Duration,
}

impl RelayGateway {
    pub fn new(
        node: Arc<dyn ChainGateway>,
        relay_url: impl Into<String>,
        auth: Arc<SecureWallet>,
        timeout: Duration,
    ) -> Self {
        Self {
            node,
            client: reqwest::Client::new(),
            relay_url: relay_url.into(),
            auth,
            timeout,
        }
    }

    async fn send_bundle(&self, raw: &Bytes, target_block: u64) -> Result<(), GatewayError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": SEND_BUNDLE,
            "params": [BundleParams {
                txs: vec![raw.to_string()],
                block_number: format!("0x{:x}", target_block),
            }],
        });
        let body = serde_json::to_vec(&body).map_err(|e| GatewayError::rpc(SEND_BUNDLE, e))?;
        let signature = self
            .auth
            .sign_relay_payload(&body)
            .map_err(|e| GatewayError::rpc(SEND_BUNDLE, e))?;

        let (status, text) = with_timeout(SEND_BUNDLE, self.timeout, async {
            let response = self
                .client
                .post(&self.relay_url)
                .header(CONTENT_TYPE, "application/json")
                .header(SIGNATURE_HEADER, signature)
                .body(body)
                .send()
                .await
                .map_err(|e| GatewayError::rpc(SEND_BUNDLE, e))?;
            let status = response.status();
            let text = response
                .text()
                .await
                .map_err(|e| GatewayError::rpc(SEND_BUNDLE, e))?;
            Ok((status, text))
        })
        .await?;

        if !status.is_success() {
            return Err(GatewayError::rpc(
                SEND_BUNDLE,
                format!("relay returned {}: {}", status, text),
            ));
        }

        let reply: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| GatewayError::rpc(SEND_BUNDLE, e))?;
        if let Some(error) = reply.get("error") {
            return Err(GatewayError::rpc(SEND_BUNDLE, error));
        }

        tracing::debug!(relay = %self.relay_url, target_block, "Bundle accepted");
        Ok(())
    }
}

#[async_trait]
impl ChainGateway for RelayGateway {
    fn chain_id(&self) -> u64 {
        self.node.chain_id()
    }

    async fn balance(&self, address: Address) -> Result<U256, GatewayError> {
        self.node.balance(address).await
    }

    async fn block_number(&self) -> Result<u64, GatewayError> {
        self.node.block_number().await
    }

    async fn fee_estimate(&self) -> Result<FeeEstimate, GatewayError> {
        self.node.fee_estimate().await
    }

    async fn pending_nonce(&self, address: Address) -> Result<u64, GatewayError> {
        self.node.pending_nonce(address).await
    }

    async fn simulate(&self, tx: &StrikeTransaction) -> Result<SimulationResult, GatewayError> {
        self.node.simulate(tx).await
    }

    /// Submit as a single-transaction bundle for the next block
    ///
    /// The returned hash is the transaction's own hash; inclusion is not
    /// awaited.
    async fn broadcast(&self, raw: Bytes) -> Result<B256, GatewayError> {
        let latest = self.node.block_number().await?;
        self.send_bundle(&raw, latest + 1).await?;
        Ok(keccak256(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::mock::{Call, MockGateway};
    use crate::config::Network;
    use crate::networks::NetworkRegistry;
    use crate::strike::{NetworkContext, StrikeExecutor, StrikeOutcome};
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const GWEI: u128 = 1_000_000_000;

    type Captured = Arc<Mutex<Vec<String>>>;

    /// Local HTTP endpoint that records each request and answers with a fixed reply
    async fn spawn_relay(status: &'static str, reply: &'static str) -> (String, Captured) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let captured: Captured = Arc::default();
        let sink = Arc::clone(&captured);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let request = read_request(&mut socket).await;
                sink.lock().unwrap().push(request);
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    reply.len(),
                    reply
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (url, captured)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut data = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&data).to_string();
            if let Some(head_end) = text.find("\r\n\r\n") {
                let length = text[..head_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if data.len() >= head_end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&data).to_string()
    }

    fn relay(node: Arc<MockGateway>, url: &str) -> RelayGateway {
        let auth = SecureWallet::from_hex(TEST_KEY, 1).unwrap();
        RelayGateway::new(node, url, Arc::new(auth), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn broadcast_sends_signed_bundle_for_next_block() {
        let (url, captured) = spawn_relay(
            "200 OK",
            r#"{"jsonrpc":"2.0","id":1,"result":{"bundleHash":"0x01"}}"#,
        )
        .await;
        let node = Arc::new(MockGateway::new(1, U256::ZERO, 0));
        let gateway = relay(node.clone(), &url);
        let raw = Bytes::from(vec![0x02, 0xaa, 0xbb]);

        let hash = gateway.broadcast(raw.clone()).await.unwrap();

        assert_eq!(hash, keccak256(&raw));
        let requests = captured.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        let request = requests[0].to_lowercase();
        assert!(request.contains(r#""method":"eth_sendbundle""#));
        // latest 100 -> target 101
        assert!(request.contains(r#""blocknumber":"0x65""#));
        assert!(request.contains(r#""txs":["0x02aabb"]"#));
        assert!(request
            .contains("x-flashbots-signature: 0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266:0x"));
        assert_eq!(node.calls(), vec![Call::BlockNumber]);
    }

    #[tokio::test]
    async fn relay_error_reply_is_a_gateway_error() {
        let (url, _) = spawn_relay(
            "200 OK",
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"bundle rejected"}}"#,
        )
        .await;
        let gateway = relay(Arc::new(MockGateway::new(1, U256::ZERO, 0)), &url);

        let err = gateway.broadcast(Bytes::from(vec![0x02])).await.unwrap_err();
        match err {
            GatewayError::Rpc { op, message } => {
                assert_eq!(op, "eth_sendBundle");
                assert!(message.contains("bundle rejected"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn http_failure_status_is_a_gateway_error() {
        let (url, _) = spawn_relay("500 Internal Server Error", "{}").await;
        let gateway = relay(Arc::new(MockGateway::new(1, U256::ZERO, 0)), &url);

        assert!(matches!(
            gateway.broadcast(Bytes::from(vec![0x02])).await,
            Err(GatewayError::Rpc { op: "eth_sendBundle", .. })
        ));
    }

    #[tokio::test]
    async fn reads_stay_on_the_node() {
        let node = Arc::new(MockGateway::new(1, U256::from(7u8), 3));
        let gateway = relay(node.clone(), "http://127.0.0.1:9");
        let owner = Address::repeat_byte(0x11);

        assert_eq!(gateway.chain_id(), 1);
        assert_eq!(gateway.balance(owner).await.unwrap(), U256::from(7u8));
        assert_eq!(gateway.fee_estimate().await.unwrap().base_fee_per_gas, 3);
        assert_eq!(
            node.calls(),
            vec![Call::Balance(owner), Call::FeeEstimate]
        );
    }

    fn strike_context(gateway: RelayGateway) -> NetworkContext {
        let config = NetworkRegistry::mainnet()
            .get(Network::Ethereum)
            .unwrap()
            .clone();
        NetworkContext {
            wallet: Arc::new(SecureWallet::from_hex(TEST_KEY, config.chain_id).unwrap()),
            config,
            gateway: Arc::new(gateway),
        }
    }

    fn funded_node() -> MockGateway {
        MockGateway::new(1, U256::from(5_500_000_000_000_000_000u128), 20 * GWEI)
    }

    #[tokio::test]
    async fn rejected_simulation_never_reaches_the_relay() {
        let (url, captured) = spawn_relay("200 OK", r#"{"result":{}}"#).await;
        let node = Arc::new(
            funded_node().with_simulation(Ok(SimulationResult::failed("NO_PROFIT"))),
        );
        let ctx = strike_context(relay(node.clone(), &url));

        let attempt = StrikeExecutor::new(Address::repeat_byte(0xc0))
            .attempt(&ctx, "discovery")
            .await;

        assert_eq!(
            attempt.outcome,
            StrikeOutcome::SimulationFailed {
                reason: "NO_PROFIT".into()
            }
        );
        assert!(captured.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn clean_strike_goes_to_relay_not_mempool() {
        let (url, captured) = spawn_relay("200 OK", r#"{"result":{}}"#).await;
        let node = Arc::new(funded_node());
        let ctx = strike_context(relay(node.clone(), &url));

        let attempt = StrikeExecutor::new(Address::repeat_byte(0xc0))
            .attempt(&ctx, "discovery")
            .await;

        assert!(matches!(attempt.outcome, StrikeOutcome::Broadcast { .. }));
        assert_eq!(captured.lock().unwrap().len(), 1);
        assert_eq!(node.broadcasts(), 0);
        let calls = node.calls();
        let simulated = calls
            .iter()
            .position(|c| matches!(c, Call::Simulate(_)))
            .unwrap();
        let block = calls
            .iter()
            .position(|c| matches!(c, Call::BlockNumber))
            .unwrap();
        assert!(simulated < block);
    }
}
