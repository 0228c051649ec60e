//! Edge API gateway library.
//!
//! Routes `/api/{service}/...` to configured backend services, with per-client
//! rate limiting and TTL caching of idempotent reads in front of them.

pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;
pub mod store;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use gateway::Dispatcher;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
