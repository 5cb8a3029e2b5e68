//! Shared helpers for the WireMock-backed tests.

#![allow(dead_code, clippy::expect_used)]

use fraudscan_client::{ScanClient, ScanClientBuilder, ScanConfig};
use std::time::Duration;
use wiremock::MockServer;

/// API prefix the client is configured with.
pub const API_PREFIX: &str = "/api/v1";

/// Starts a mock backend.
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Builds a client against `server` with a short backoff unit.
pub fn client_for(server: &MockServer, max_retries: u32) -> ScanClient {
    let config = ScanConfig::builder()
        .base_url(format!("{}{}", server.uri(), API_PREFIX))
        .timeout(Duration::from_secs(5))
        .max_retries(max_retries)
        .retry_base_delay(Duration::from_millis(10))
        .result_settle_delay(Duration::from_millis(10))
        .build()
        .expect("valid config");

    ScanClientBuilder::from_config(config)
        .build()
        .expect("client builds")
}

/// Builds a client against a local port nothing listens on.
pub fn client_for_closed_port(max_retries: u32) -> ScanClient {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .expect("ephemeral port")
        .port();

    ScanClient::builder()
        .base_url(format!("http://127.0.0.1:{}{}", port, API_PREFIX))
        .max_retries(max_retries)
        .retry_base_delay(Duration::from_millis(10))
        .build()
        .expect("client builds")
}

/// Full path of an API endpoint.
pub fn api(endpoint: &str) -> String {
    format!("{}{}", API_PREFIX, endpoint)
}
