//! Shared utilities for the integration suites.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use cotacao_relay::config::RelayConfig;
use cotacao_relay::http::HttpServer;
use cotacao_relay::persistence::BidStore;

/// A well-formed upstream payload, byte-for-byte what the assertions expect.
#[allow(dead_code)]
pub const SAMPLE_PAYLOAD: &str = r#"{"USDBRL":{"code":"USD","codein":"BRL","name":"Dolar Americano/Real Brasileiro","high":"5.4587","low":"5.4102","varBid":"0.0173","pctChange":"0.32","bid":"5.4312","ask":"5.4318","timestamp":"1712245496","create_date":"2024-04-04 11:04:56"}}"#;

/// Start a programmable mock HTTP endpoint on an ephemeral port.
///
/// The closure decides status and body per request; injecting latency is a
/// `sleep` inside the closure. Returns the bound address.
pub async fn start_mock_endpoint<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        // Drain the request head before answering so the
                        // peer never sees a reset with bytes still in flight.
                        let mut buf = [0u8; 1024];
                        let _ = socket.read(&mut buf).await;

                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            400 => "400 Bad Request",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
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

    addr
}

/// Spawn a relay server over `store` on an ephemeral port.
#[allow(dead_code)]
pub async fn start_relay(config: RelayConfig, store: BidStore) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config, store);
    tokio::spawn(async move {
        let _ = server
            .run_with_shutdown(listener, std::future::pending())
            .await;
    });

    addr
}

/// A default config pointed at a mock upstream.
#[allow(dead_code)]
pub fn relay_config(upstream: SocketAddr) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.upstream.url = format!("http://{upstream}/json/last/USD-BRL");
    config
}
