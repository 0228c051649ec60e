//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, CORS, body limit)
//!     → request.rs (buffered InboundRequest)
//!     → [gateway dispatcher: route, admit, cache]
//!     → forwarder.rs (pooled upstream call, hop-by-hop stripped)
//!     → response.rs (ProxyResponse → client, x-cache tag)
//! ```

pub mod forwarder;
pub mod request;
pub mod response;
pub mod server;

pub use forwarder::{BackendError, Forwarder};
pub use request::{InboundRequest, ProxyRequest, X_REQUEST_ID};
pub use response::{CacheStatus, ProxyResponse, X_CACHE};
pub use server::HttpServer;
