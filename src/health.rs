//! Liveness endpoint
//!
//! Answers every request with `200 OK` and a fixed JSON status. It reads no
//! governor state.

use alloy::primitives::Address;
use serde_json::json;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub const ENGINE_NAME: &str = "OMNI-STRIKE";
pub const STATUS_TOKEN: &str = "HUNTING";

/// Fixed status payload
pub fn status_body(recipient: Address) -> String {
    json!({
        "engine": ENGINE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "status": STATUS_TOKEN,
        "recipient": recipient.to_checksum(None),
    })
    .to_string()
}

/// Bind `port` on all interfaces and serve the status payload
///
/// Returns the bound address, or `None` if binding failed; a failed bind is
/// logged and otherwise ignored.
pub async fn spawn_health_server(port: u16, recipient: Address) -> Option<SocketAddr> {
    serve(SocketAddr::from(([0, 0, 0, 0], port)), recipient).await
}

async fn serve(addr: SocketAddr, recipient: Address) -> Option<SocketAddr> {
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::warn!("Health server failed to bind {}: {}", addr, e);
            return None;
        }
    };

    let local = listener.local_addr().ok();
    if let Some(addr) = local {
        tracing::info!("Health server listening on {}", addr);
    }

    let body = status_body(recipient);
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let response = response.clone();
                    tokio::spawn(async move {
                        // Drain the request line; the answer never depends on it.
                        let mut buf = [0u8; 1024];
                        let _ = socket.read(&mut buf).await;
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(e) => {
                    tracing::warn!("Health accept error: {}", e);
                    continue;
                }
            }
        }
    });

    local
}
