//! Response handling.
//!
//! # Responsibilities
//! - Hold a buffered backend response (status, headers, body)
//! - Convert it into the response returned to the client
//! - Tag cacheable responses with their cache outcome
//!
//! # Design Decisions
//! - Hop-by-hop headers are stripped before a `ProxyResponse` is built, so
//!   conversion here is a verbatim copy

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

/// Header reporting whether a cacheable response came from the cache.
pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// A buffered response from a backend or from the response cache.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ProxyResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Outcome of the cache lookup, reported in the `x-cache` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

/// Add the `x-cache` header to an outgoing response.
pub fn tag_cache_status(response: &mut Response, status: CacheStatus) {
    response
        .headers_mut()
        .insert(X_CACHE, HeaderValue::from_static(status.as_str()));
}
