//! Per-request state carried through the pipeline.

use axum::http::HeaderMap;

use crate::cache::CacheKey;
use crate::http::request::ProxyRequest;
use crate::http::response::CacheStatus;
use crate::security::ClientKey;

/// Lifecycle of one request through the gateway.
///
/// ```text
/// Received → RouteResolved → AdmissionChecked → CacheChecked → Forwarded → Completed
///     └──────────────┴─────────────┴───────────────┴─────────────┴──→ Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Received,
    RouteResolved,
    AdmissionChecked,
    CacheChecked,
    Forwarded,
    Completed,
    Failed,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Completed | Phase::Failed)
    }
}

/// Everything a stage needs to know about the request it is handling.
#[derive(Debug)]
pub struct RequestContext {
    pub request_id: String,
    pub service: String,
    pub client: ClientKey,
    /// Inbound path, used for cache keys.
    pub path: String,
    pub query: Option<String>,
    /// The call that will be made to the backend, headers still inbound.
    pub request: ProxyRequest,
    pub cache_key: Option<CacheKey>,
    pub cache_status: Option<CacheStatus>,
    phase: Phase,
}

impl RequestContext {
    pub fn new(
        request_id: String,
        service: String,
        client: ClientKey,
        path: String,
        query: Option<String>,
        request: ProxyRequest,
    ) -> Self {
        Self {
            request_id,
            service,
            client,
            path,
            query,
            request,
            cache_key: None,
            cache_status: None,
            phase: Phase::Received,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Move to `next`. Terminal phases are final.
    pub fn advance(&mut self, next: Phase) {
        if self.phase.is_terminal() {
            return;
        }
        tracing::trace!(request_id = %self.request_id, from = ?self.phase, to = ?next, "Phase transition");
        self.phase = next;
    }

    pub fn fail(&mut self) {
        self.advance(Phase::Failed);
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.request.headers
    }
}
