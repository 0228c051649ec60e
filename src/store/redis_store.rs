//! Redis-backed store shared by every gateway instance.
//!
//! # Responsibilities
//! - Atomic fixed-window counters via a Lua `INCR` / `PEXPIRE` script
//! - Cache entries as hashes (`status`, `headers`, `body`) with `PEXPIRE`
//! - Bound every round trip with a deadline so callers never hang on a
//!   dead store
//!
//! # Design Decisions
//! - One multiplexed connection is shared and re-established lazily after a
//!   failure
//! - Headers are stored in HTTP/1 wire form (`name: value\r\n`), which keeps
//!   opaque byte values and repeated headers intact
//! - Expiry is enforced by Redis itself; expired keys are never returned

use std::future::Future;
use std::time::Duration;

use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use futures_util::future::BoxFuture;
use redis::aio::MultiplexedConnection;
use redis::{Client, Script};
use tokio::sync::Mutex;

use crate::http::response::ProxyResponse;
use crate::store::{CacheStore, CounterStore, StoreError};

const INCREMENT_SCRIPT: &str = r#"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
return count
"#;

/// `HMGET status headers body` reply.
type RawEntry = (Option<u16>, Option<Vec<u8>>, Option<Vec<u8>>);

/// Counters and cache entries kept in Redis.
pub struct RedisStore {
    client: Client,
    connection: Mutex<Option<MultiplexedConnection>>,
    prefix: String,
    op_timeout: Duration,
    increment_script: Script,
}

impl RedisStore {
    /// Create a store for `url`. No connection is made until first use.
    pub fn open(
        url: &str,
        prefix: impl Into<String>,
        op_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = Client::open(url)?;
        Ok(Self {
            client,
            connection: Mutex::new(None),
            prefix: prefix.into(),
            op_timeout,
            increment_script: Script::new(INCREMENT_SCRIPT),
        })
    }

    fn counter_key(&self, key: &str) -> String {
        format!("{}:ratelimit:{}", self.prefix, key)
    }

    fn cache_key(&self, key: &str) -> String {
        format!("{}:cache:{}", self.prefix, key)
    }

    async fn connection(&self) -> Result<MultiplexedConnection, StoreError> {
        let mut slot = self.connection.lock().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }
        let conn = self.client.get_multiplexed_async_connection().await?;
        tracing::info!(prefix = %self.prefix, "Connected to Redis store");
        *slot = Some(conn.clone());
        Ok(conn)
    }

    /// Run one operation under the store deadline.
    async fn run<T, F, Fut>(&self, op: F) -> Result<T, StoreError>
    where
        F: FnOnce(MultiplexedConnection) -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let attempt = async {
            let conn = self.connection().await?;
            op(conn).await
        };

        let result = match tokio::time::timeout(self.op_timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Unavailable(format!(
                "operation timed out after {:?}",
                self.op_timeout
            ))),
        };

        if matches!(result, Err(StoreError::Unavailable(_))) {
            *self.connection.lock().await = None;
        }
        result
    }
}

impl CounterStore for RedisStore {
    fn increment<'a>(
        &'a self,
        key: &'a str,
        window: Duration,
    ) -> BoxFuture<'a, Result<u64, StoreError>> {
        Box::pin(async move {
            let key = self.counter_key(key);
            let window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
            self.run(|mut conn| async move {
                let count: u64 = self
                    .increment_script
                    .key(&key)
                    .arg(window_ms)
                    .invoke_async(&mut conn)
                    .await?;
                Ok::<_, StoreError>(count)
            })
            .await
        })
    }
}

impl CacheStore for RedisStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<ProxyResponse>, StoreError>> {
        Box::pin(async move {
            let key = self.cache_key(key);
            let fields = self
                .run(|mut conn| async move {
                    let fields: RawEntry = redis::cmd("HMGET")
                        .arg(&key)
                        .arg("status")
                        .arg("headers")
                        .arg("body")
                        .query_async(&mut conn)
                        .await?;
                    Ok::<_, StoreError>(fields)
                })
                .await?;

            match fields {
                (Some(status), Some(headers), Some(body)) => {
                    let status = StatusCode::from_u16(status)
                        .map_err(|e| StoreError::Corrupt(e.to_string()))?;
                    let headers = decode_headers(&headers)?;
                    Ok(Some(ProxyResponse::new(status, headers, body)))
                }
                (None, None, None) => Ok(None),
                _ => Err(StoreError::Corrupt("partial cache entry".to_string())),
            }
        })
    }

    fn put<'a>(
        &'a self,
        key: &'a str,
        response: &'a ProxyResponse,
        ttl: Duration,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            let key = self.cache_key(key);
            let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
            let headers = encode_headers(&response.headers);

            let mut pipe = redis::pipe();
            pipe.atomic()
                .cmd("DEL")
                .arg(&key)
                .ignore()
                .cmd("HSET")
                .arg(&key)
                .arg("status")
                .arg(response.status.as_u16())
                .arg("headers")
                .arg(headers)
                .arg("body")
                .arg(&response.body[..])
                .ignore()
                .cmd("PEXPIRE")
                .arg(&key)
                .arg(ttl_ms)
                .ignore();

            self.run(|mut conn| async move {
                let _: () = pipe.query_async(&mut conn).await?;
                Ok::<_, StoreError>(())
            })
            .await
        })
    }
}

fn encode_headers(headers: &HeaderMap) -> Vec<u8> {
    let mut out = Vec::new();
    for (name, value) in headers {
        out.extend_from_slice(name.as_str().as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(value.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    out
}

fn decode_headers(raw: &[u8]) -> Result<HeaderMap, StoreError> {
    let mut headers = HeaderMap::new();
    for line in raw.split(|b| *b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.is_empty() {
            continue;
        }
        let colon = line
            .iter()
            .position(|b| *b == b':')
            .ok_or_else(|| StoreError::Corrupt("header line without ':'".to_string()))?;
        let (name, rest) = line.split_at(colon);
        let value = &rest[1..];
        let value = value.strip_prefix(b" ").unwrap_or(value);

        let name =
            HeaderName::from_bytes(name).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let value =
            HeaderValue::from_bytes(value).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        headers.append(name, value);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_codec_keeps_order_and_repeats() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        headers.append("set-cookie", HeaderValue::from_static("a=1; Path=/"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));
        headers.insert("x-empty", HeaderValue::from_static(""));
        headers.insert("x-opaque", HeaderValue::from_bytes(&[0xe9, b'x']).unwrap());

        let decoded = decode_headers(&encode_headers(&headers)).unwrap();

        assert_eq!(decoded, headers);
        let cookies: Vec<&[u8]> = decoded
            .get_all("set-cookie")
            .iter()
            .map(|v| v.as_bytes())
            .collect();
        assert_eq!(cookies, [&b"a=1; Path=/"[..], &b"b=2"[..]]);
    }

    #[test]
    fn test_value_with_colon_survives() {
        let mut headers = HeaderMap::new();
        headers.insert("location", HeaderValue::from_static("http://a:5000/x"));
        let decoded = decode_headers(&encode_headers(&headers)).unwrap();
        assert_eq!(decoded["location"], "http://a:5000/x");
    }

    #[test]
    fn test_garbage_is_corrupt() {
        assert!(matches!(
            decode_headers(b"no colon here\r\n"),
            Err(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn test_keys_are_prefixed() {
        let store =
            RedisStore::open("redis://127.0.0.1:6379", "gw", Duration::from_millis(50)).unwrap();
        assert_eq!(store.counter_key("10.0.0.1"), "gw:ratelimit:10.0.0.1");
        assert_eq!(store.cache_key("GET /api/persons"), "gw:cache:GET /api/persons");
    }

    #[tokio::test]
    async fn test_unreachable_server_reports_unavailable() {
        let store =
            RedisStore::open("redis://127.0.0.1:1", "gw", Duration::from_millis(500)).unwrap();

        let err = store
            .increment("client", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));

        let err = store.get("key").await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
