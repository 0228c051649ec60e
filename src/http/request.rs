//! Request values flowing through the gateway.
//!
//! # Responsibilities
//! - Capture the buffered inbound request (method, URI, headers, body, peer)
//! - Carry the outbound call handed to the forwarder
//! - Read the request ID assigned by the request-id layer
//!
//! # Design Decisions
//! - Bodies are buffered once into `Bytes`; clones are reference-counted
//! - Inbound headers stay untouched on the request; hop-by-hop stripping
//!   happens on the copy handed to the backend

use std::net::SocketAddr;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, Uri};
use uuid::Uuid;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// A fully buffered request received from a client.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub request_id: String,
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub peer: SocketAddr,
}

/// An outbound call to a resolved backend.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    /// Absolute backend URL including the query string.
    pub target: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Read the request ID set by `SetRequestIdLayer`, minting one if absent.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_reads_existing_id() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("abc-123"));
        assert_eq!(request_id(&headers), "abc-123");
    }

    #[test]
    fn test_mints_uuid_when_missing() {
        let id = request_id(&HeaderMap::new());
        assert!(Uuid::parse_str(&id).is_ok());
    }
}
