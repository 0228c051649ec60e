//! Client identity used to partition rate limits.

use std::fmt;
use std::net::SocketAddr;

use axum::http::HeaderMap;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Rate-limit partition key for one client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey(String);

impl ClientKey {
    /// Derive the key from the first `X-Forwarded-For` entry, falling back to
    /// the connection's IP address.
    pub fn from_request(headers: &HeaderMap, peer: SocketAddr) -> Self {
        let forwarded = headers
            .get(X_FORWARDED_FOR)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split(',').map(str::trim).find(|ip| !ip.is_empty()));

        match forwarded {
            Some(ip) => Self(ip.to_string()),
            None => Self(peer.ip().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClientKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
