//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use edge_gateway::config::{GatewayConfig, ServiceConfig, Services};
use edge_gateway::{HttpServer, Shutdown};
use serde_json::json;
use tokio::net::TcpListener;

/// A mock backend that echoes what it received as JSON.
pub struct MockBackend {
    pub addr: SocketAddr,
    calls: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Base URL for `service` on this backend.
    pub fn base_url(&self, service: &str) -> String {
        format!("http://{}/api/{}", self.addr, service)
    }
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

/// Start a backend answering every request with `status` after `delay`.
pub async fn start_mock_backend(status: StatusCode, delay: Duration) -> MockBackend {
    let calls = Arc::new(AtomicUsize::new(0));
    let state = MockState {
        status,
        delay,
        calls: calls.clone(),
    };
    let app = Router::new()
        .route("/{*path}", any(echo))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockBackend { addr, calls }
}

async fn echo(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let call = state.calls.fetch_add(1, Ordering::SeqCst) + 1;
    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    let payload = json!({
        "call": call,
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "body": String::from_utf8_lossy(&body),
        "x_custom": headers.get("x-custom").and_then(|v| v.to_str().ok()),
    });
    (state.status, [("x-backend", "mock")], Json(payload)).into_response()
}

/// An address nothing listens on.
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Default config with the given services and a generous rate limit.
pub fn config_with(services: Vec<(&str, String)>) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.services = Services(
        services
            .into_iter()
            .map(|(name, url)| ServiceConfig::new(name, url))
            .collect(),
    );
    config.cache.cacheable_services.retain(|name| {
        config.services.iter().any(|service| &service.name == name)
    });
    config.rate_limit.limit = 10_000;
    config
}

/// A running gateway on an ephemeral port.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: tokio::task::JoinHandle<()>,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub async fn start_gateway(config: GatewayConfig) -> TestGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let rx = shutdown.subscribe();
    let handle = tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    TestGateway {
        addr,
        shutdown,
        handle,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
