//! Request handling core.
//!
//! # Data Flow
//! ```text
//! InboundRequest
//!     → dispatcher.rs (resolve service, build RequestContext)
//!     → pipeline.rs
//!         → stages.rs AdmissionStage  (429 on Denied)
//!         → stages.rs CacheStage      (reply on Hit)
//!         → stages.rs ForwardStage    (backend reply, 502/504 on failure)
//!         ← CacheStage::on_reply      (store 2xx backend replies)
//!     → Response (+ x-cache)
//! ```

pub mod context;
pub mod dispatcher;
pub mod pipeline;
pub mod stages;

pub use context::{Phase, RequestContext};
pub use dispatcher::Dispatcher;
pub use pipeline::{Flow, Pipeline, PipelineBuilder, Reply, Stage};
pub use stages::{AdmissionStage, CacheStage, ForwardStage};
