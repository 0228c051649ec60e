//! Service path extraction.
//!
//! Splits `/api/{service}/{path...}` into the service name and the remaining
//! path. The remaining path is kept exactly as received (still
//! percent-encoded, no dot-segment handling).

/// Prefix every proxied route lives under.
pub const API_PREFIX: &str = "/api";

/// The parts of an inbound path relevant to routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePath<'a> {
    pub service: &'a str,
    pub remaining: &'a str,
}

impl<'a> ServicePath<'a> {
    /// Parse a request path. Returns `None` when the path is not under
    /// [`API_PREFIX`].
    pub fn parse(path: &'a str) -> Option<Self> {
        let rest = path.strip_prefix(API_PREFIX)?;
        let rest = match rest.strip_prefix('/') {
            Some(rest) => rest,
            None if rest.is_empty() => rest,
            None => return None,
        };

        let (service, remaining) = rest.split_once('/').unwrap_or((rest, ""));
        Some(Self { service, remaining })
    }
}
