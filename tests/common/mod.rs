//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use swapi_gateway::{GatewayConfig, HttpServer, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Request targets (`/path?query`) seen by a mock upstream.
pub type Seen = Arc<Mutex<Vec<String>>>;

/// Start a mock upstream answering every request with `status` and `body`.
#[allow(dead_code)]
pub async fn start_mock_upstream(status: &'static str, body: &'static str) -> (SocketAddr, Seen) {
    start_mock_upstream_with(status, &[], body).await
}

/// Like [`start_mock_upstream`], with extra response headers.
#[allow(dead_code)]
pub async fn start_mock_upstream_with(
    status: &'static str,
    headers: &'static [(&'static str, &'static str)],
    body: &'static str,
) -> (SocketAddr, Seen) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let recorded = seen.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let recorded = recorded.clone();
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 8192];
                        let n = socket.read(&mut buf).await.unwrap_or(0);
                        let head = String::from_utf8_lossy(&buf[..n]);
                        if let Some(target) = head.split_whitespace().nth(1) {
                            recorded.lock().unwrap().push(target.to_string());
                        }

                        let extra: String = headers
                            .iter()
                            .map(|(name, value)| format!("{name}: {value}\r\n"))
                            .collect();
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: text/plain\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            extra,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, seen)
}

/// Start an upstream that accepts connections and never answers.
#[allow(dead_code)]
pub async fn start_silent_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    addr
}

/// An address nothing is listening on.
#[allow(dead_code)]
pub fn unused_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// A running gateway.
pub struct Gateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl Gateway {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Test config writing logs under `log_root` and forwarding to `upstream`.
pub fn gateway_config(upstream: &str, log_root: &Path) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.upstream.base_url = upstream.to_string();
    config.upstream.connect_timeout_secs = 2;
    config.logs.root_dir = log_root.display().to_string();
    config
}

/// Start a gateway writing logs under `log_root` and forwarding to `upstream`.
pub async fn start_gateway(upstream: &str, log_root: &Path) -> Gateway {
    start_gateway_with_config(gateway_config(upstream, log_root)).await
}

/// Start a gateway from a full config.
pub async fn start_gateway_with_config(config: GatewayConfig) -> Gateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    Gateway { addr, shutdown }
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
