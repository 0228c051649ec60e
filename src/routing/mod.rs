//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path + query
//!     → path.rs (split /api/{service}/{rest})
//!     → table.rs (service lookup, target URL assembly)
//!     → Return: target URL or UnknownService
//!
//! Route construction (at startup):
//!     ServiceConfig[]
//!     → RoutingTable (immutable HashMap)
//! ```
//!
//! # Design Decisions
//! - Routes built at startup, immutable at runtime
//! - Exact service-name match only, no regex or prefix tries
//! - Deterministic: same input always resolves to the same target

pub mod path;
pub mod table;

pub use path::{ServicePath, API_PREFIX};
pub use table::{Route, RoutingError, RoutingTable};
