//! Response caching subsystem.
//!
//! # Data Flow
//! ```text
//! Cacheable request (GET to a whitelisted service):
//!     → key.rs (method + path + query + vary headers)
//!     → response_cache.rs get → Hit: reply without backend contact
//!                             → Miss: forward, then put on 2xx
//! ```

pub mod key;
pub mod response_cache;

pub use key::CacheKey;
pub use response_cache::{Lookup, ResponseCache};
