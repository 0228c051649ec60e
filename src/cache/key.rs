//! Cache key derivation.

use std::fmt;

use axum::http::{HeaderMap, HeaderName, Method};

/// Deterministic identity of a cacheable request.
///
/// Built from the method, the inbound path, the raw query string and the
/// values of the configured vary headers. Identical inputs always produce
/// the same key. Separator bytes inside a component are percent-encoded,
/// so one request's query or header value cannot spell out another's key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn derive(
        method: &Method,
        path: &str,
        query: Option<&str>,
        headers: &HeaderMap,
        vary: &[HeaderName],
    ) -> Self {
        let mut key = String::with_capacity(path.len() + 16);
        key.push_str(method.as_str());
        key.push(' ');
        escape_into(&mut key, path.as_bytes());
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            key.push('?');
            escape_into(&mut key, query.as_bytes());
        }

        for name in vary {
            key.push('|');
            key.push_str(name.as_str());

            // An absent header has no `=`; a present but empty one does.
            let mut values = headers.get_all(name).iter().peekable();
            if values.peek().is_none() {
                continue;
            }
            key.push('=');
            for (i, value) in values.enumerate() {
                if i > 0 {
                    key.push(',');
                }
                escape_into(&mut key, value.as_bytes());
            }
        }

        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Append `raw` with separator, `%`, control and non-ASCII bytes
/// percent-encoded.
fn escape_into(key: &mut String, raw: &[u8]) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    for &byte in raw {
        match byte {
            b'%' | b'|' | b'?' | b',' => {}
            0x21..=0x7E => {
                key.push(byte as char);
                continue;
            }
            _ => {}
        }
        key.push('%');
        key.push(HEX[(byte >> 4) as usize] as char);
        key.push(HEX[(byte & 0x0F) as usize] as char);
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::ACCEPT;
    use axum::http::HeaderValue;

    fn accept(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_same_inputs_same_key() {
        let vary = [ACCEPT];
        let a = CacheKey::derive(&Method::GET, "/api/persons", Some("x=1"), &accept("application/json"), &vary);
        let b = CacheKey::derive(&Method::GET, "/api/persons", Some("x=1"), &accept("application/json"), &vary);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "GET /api/persons?x=1|accept=application/json");
    }

    #[test]
    fn test_every_input_participates() {
        let vary = [ACCEPT];
        let base = CacheKey::derive(&Method::GET, "/api/persons", Some("x=1"), &accept("a"), &vary);

        let other_query = CacheKey::derive(&Method::GET, "/api/persons", Some("x=2"), &accept("a"), &vary);
        let other_path = CacheKey::derive(&Method::GET, "/api/habits", Some("x=1"), &accept("a"), &vary);
        let other_method = CacheKey::derive(&Method::HEAD, "/api/persons", Some("x=1"), &accept("a"), &vary);
        let other_accept = CacheKey::derive(&Method::GET, "/api/persons", Some("x=1"), &accept("b"), &vary);

        for other in [other_query, other_path, other_method, other_accept] {
            assert_ne!(base, other);
        }
    }

    #[test]
    fn test_unlisted_headers_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", HeaderValue::from_static("1"));
        let a = CacheKey::derive(&Method::GET, "/api/persons", None, &headers, &[]);
        headers.insert("x-request-id", HeaderValue::from_static("2"));
        let b = CacheKey::derive(&Method::GET, "/api/persons", None, &headers, &[]);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "GET /api/persons");
    }

    #[test]
    fn test_separators_in_values_cannot_forge_another_key() {
        let vary = [ACCEPT];
        let smuggled = CacheKey::derive(&Method::GET, "/api/persons", Some("a=1"), &accept("x|accept="), &vary);
        let in_query = CacheKey::derive(&Method::GET, "/api/persons", Some("a=1|accept=x"), &HeaderMap::new(), &vary);

        assert_ne!(smuggled, in_query);
        assert_eq!(smuggled.as_str(), "GET /api/persons?a=1|accept=x%7Caccept=");
        assert_eq!(in_query.as_str(), "GET /api/persons?a=1%7Caccept=x|accept");
    }

    #[test]
    fn test_escape_character_is_itself_escaped() {
        let vary = [ACCEPT];
        let literal = CacheKey::derive(&Method::GET, "/api/persons", Some("q=%7C"), &HeaderMap::new(), &vary);
        let pipe = CacheKey::derive(&Method::GET, "/api/persons", Some("q=|"), &HeaderMap::new(), &vary);
        assert_ne!(literal, pipe);
    }

    #[test]
    fn test_opaque_vary_value_is_kept() {
        let vary = [ACCEPT];
        let mut opaque = HeaderMap::new();
        opaque.insert(ACCEPT, HeaderValue::from_bytes(b"\xE9").unwrap());

        let with_opaque = CacheKey::derive(&Method::GET, "/api/persons", None, &opaque, &vary);
        let without = CacheKey::derive(&Method::GET, "/api/persons", None, &HeaderMap::new(), &vary);

        assert_ne!(with_opaque, without);
        assert_eq!(with_opaque.as_str(), "GET /api/persons|accept=%E9");
    }

    #[test]
    fn test_empty_header_differs_from_absent_header() {
        let vary = [ACCEPT];
        let empty = CacheKey::derive(&Method::GET, "/api/persons", None, &accept(""), &vary);
        let absent = CacheKey::derive(&Method::GET, "/api/persons", None, &HeaderMap::new(), &vary);
        assert_ne!(empty, absent);
    }

    #[test]
    fn test_repeated_header_values_stay_distinct() {
        let vary = [ACCEPT];
        let mut two = HeaderMap::new();
        two.append(ACCEPT, HeaderValue::from_static("a"));
        two.append(ACCEPT, HeaderValue::from_static("b"));

        let split = CacheKey::derive(&Method::GET, "/api/persons", None, &two, &vary);
        let joined = CacheKey::derive(&Method::GET, "/api/persons", None, &accept("a,b"), &vary);
        assert_ne!(split, joined);
    }

    #[test]
    fn test_empty_query_matches_no_query() {
        let a = CacheKey::derive(&Method::GET, "/api/persons", Some(""), &HeaderMap::new(), &[]);
        let b = CacheKey::derive(&Method::GET, "/api/persons", None, &HeaderMap::new(), &[]);
        assert_eq!(a, b);
    }
}
