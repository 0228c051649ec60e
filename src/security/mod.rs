//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → client_key.rs (X-Forwarded-For or peer IP)
//!     → rate_limit.rs (fixed-window admission per client)
//!     → headers.rs (strip hop-by-hop before forwarding and relaying)
//! ```
//!
//! # Design Decisions
//! - Admission is the sole backpressure mechanism, no queuing
//! - Fail open on counter-store outages: backend availability beats
//!   strict fairness

pub mod client_key;
pub mod headers;
pub mod rate_limit;

pub use client_key::ClientKey;
pub use headers::strip_hop_by_hop;
pub use rate_limit::{Admission, RateLimiter};
