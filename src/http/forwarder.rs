//! Upstream forwarding.
//!
//! # Responsibilities
//! - Send a buffered request to its resolved backend URL
//! - Enforce one deadline over connect, send and response body
//! - Relay status, headers and body without reinterpretation
//!
//! # Design Decisions
//! - One pooled client per gateway; connections are reused across requests
//! - No retries: a non-idempotent call must never be sent twice
//! - Backend error statuses are data, not failures; only transport problems
//!   become `BackendError`

use std::error::Error as StdError;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::HOST;
use axum::http::Request;
use hyper::body::Incoming;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use thiserror::Error;

use crate::config::UpstreamConfig;
use crate::http::request::ProxyRequest;
use crate::http::response::ProxyResponse;
use crate::security::headers::strip_hop_by_hop;

/// Transport failure while calling a backend.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("Backend at {target} did not respond within {after:?}")]
    Timeout { target: String, after: Duration },

    #[error("Backend at {target} is unreachable: {reason}")]
    Unreachable { target: String, reason: String },

    #[error("Backend at {target} sent an unusable response: {reason}")]
    BadResponse { target: String, reason: String },
}

impl BackendError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            BackendError::Timeout { .. } => "timeout",
            BackendError::Unreachable { .. } => "unreachable",
            BackendError::BadResponse { .. } => "bad_response",
        }
    }
}

/// Pooled HTTP client for backend calls.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
    max_response_bytes: usize,
}

impl Forwarder {
    pub fn new(timeout: Duration, max_response_bytes: usize, pool_idle_timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_nodelay(true);
        connector.enforce_http(true);

        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(pool_idle_timeout)
            .build(connector);

        Self {
            client,
            timeout,
            max_response_bytes,
        }
    }

    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self::new(
            Duration::from_millis(config.timeout_ms),
            config.max_response_bytes,
            Duration::from_secs(config.pool_idle_timeout_secs),
        )
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send `request` and buffer the backend's full response.
    ///
    /// Any status the backend returns, including 4xx and 5xx, is a successful
    /// forward.
    pub async fn forward(&self, request: ProxyRequest) -> Result<ProxyResponse, BackendError> {
        let target = request.target.clone();

        match tokio::time::timeout(self.timeout, self.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout {
                target,
                after: self.timeout,
            }),
        }
    }

    async fn send(&self, request: ProxyRequest) -> Result<ProxyResponse, BackendError> {
        let ProxyRequest {
            method,
            target,
            headers,
            body,
        } = request;

        let mut headers = strip_hop_by_hop(headers);
        // Set by the client from the target URI.
        headers.remove(HOST);

        let mut outbound = Request::builder()
            .method(method)
            .uri(target.as_str())
            .body(Body::from(body))
            .map_err(|e| BackendError::Unreachable {
                target: target.clone(),
                reason: e.to_string(),
            })?;
        *outbound.headers_mut() = headers;

        let response: hyper::Response<Incoming> = self
            .client
            .request(outbound)
            .await
            .map_err(|e| BackendError::Unreachable {
                target: target.clone(),
                reason: error_chain(&e),
            })?;

        let (parts, incoming) = response.into_parts();
        let body = axum::body::to_bytes(Body::new(incoming), self.max_response_bytes)
            .await
            .map_err(|e| BackendError::BadResponse {
                target: target.clone(),
                reason: error_chain(&e),
            })?;

        Ok(ProxyResponse::new(
            parts.status,
            strip_hop_by_hop(parts.headers),
            body,
        ))
    }
}

/// Flatten an error and its sources into one line.
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
