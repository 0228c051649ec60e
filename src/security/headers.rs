//! Hop-by-hop header handling.
//!
//! # Responsibilities
//! - Strip connection-management headers from forwarded requests
//! - Strip the same set from backend responses before relaying them
//! - Honour headers nominated by the `Connection` header itself
//!
//! # Design Decisions
//! - `Host` is dropped outbound; the HTTP client derives it from the target
//! - Every other header is passed through untouched and in order

use axum::http::{header, HeaderMap, HeaderName};

/// Headers that only describe a single transport hop.
const HOP_BY_HOP: [HeaderName; 9] = [
    header::CONNECTION,
    header::HOST,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    HeaderName::from_static("keep-alive"),
];

const PROXY_CONNECTION: HeaderName = HeaderName::from_static("proxy-connection");

/// Remove hop-by-hop headers, returning the remaining headers.
pub fn strip_hop_by_hop(mut headers: HeaderMap) -> HeaderMap {
    let nominated: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in HOP_BY_HOP.iter().chain(nominated.iter()) {
        headers.remove(name);
    }
    headers.remove(PROXY_CONNECTION);
    headers
}
