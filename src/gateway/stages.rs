//! The gateway's request stages: admission, cache and forward.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::cache::{Lookup, ResponseCache};
use crate::error::GatewayError;
use crate::gateway::context::{Phase, RequestContext};
use crate::gateway::pipeline::{Flow, Reply, Stage};
use crate::http::forwarder::{BackendError, Forwarder};
use crate::http::request::X_REQUEST_ID;
use crate::http::response::CacheStatus;
use crate::observability::metrics;
use crate::security::{Admission, RateLimiter};

/// Rejects clients over their rate limit.
pub struct AdmissionStage {
    limiter: Arc<RateLimiter>,
}

impl AdmissionStage {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }
}

impl Stage for AdmissionStage {
    fn name(&self) -> &'static str {
        "admission"
    }

    fn on_request<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, Flow> {
        Box::pin(async move {
            match self.limiter.admit(&ctx.client).await {
                Admission::Allowed => {
                    ctx.advance(Phase::AdmissionChecked);
                    Flow::Continue
                }
                Admission::Denied => {
                    ctx.fail();
                    Flow::Respond(Reply::Failure(GatewayError::AdmissionDenied))
                }
            }
        })
    }
}

/// Serves cacheable reads from the response cache and fills it from
/// successful backend replies.
pub struct CacheStage {
    cache: Arc<ResponseCache>,
}

impl CacheStage {
    pub fn new(cache: Arc<ResponseCache>) -> Self {
        Self { cache }
    }
}

impl Stage for CacheStage {
    fn name(&self) -> &'static str {
        "cache"
    }

    fn on_request<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, Flow> {
        Box::pin(async move {
            if !self.cache.is_cacheable(&ctx.request.method, &ctx.service) {
                ctx.advance(Phase::CacheChecked);
                return Flow::Continue;
            }

            let key = self.cache.key_for(
                &ctx.request.method,
                &ctx.path,
                ctx.query.as_deref(),
                ctx.headers(),
            );
            ctx.advance(Phase::CacheChecked);

            match self.cache.get(&key).await {
                Lookup::Hit(response) => {
                    tracing::debug!(request_id = %ctx.request_id, key = %key, "Cache hit");
                    ctx.cache_status = Some(CacheStatus::Hit);
                    Flow::Respond(Reply::Cached(response))
                }
                Lookup::Miss => {
                    ctx.cache_status = Some(CacheStatus::Miss);
                    ctx.cache_key = Some(key);
                    Flow::Continue
                }
            }
        })
    }

    fn on_reply<'a>(&'a self, ctx: &'a RequestContext, reply: &'a Reply) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            if let (Some(key), Reply::Backend(response)) = (&ctx.cache_key, reply) {
                // The request id belongs to this request, not to later hits.
                let mut stored = response.clone();
                stored.headers.remove(X_REQUEST_ID);
                self.cache.put(key, &stored, self.cache.ttl()).await;
            }
        })
    }
}

/// Sends the request to its backend. Always responds.
pub struct ForwardStage {
    forwarder: Forwarder,
}

impl ForwardStage {
    pub fn new(forwarder: Forwarder) -> Self {
        Self { forwarder }
    }
}

impl Stage for ForwardStage {
    fn name(&self) -> &'static str {
        "forward"
    }

    fn on_request<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, Flow> {
        Box::pin(async move {
            match self.forwarder.forward(ctx.request.clone()).await {
                Ok(response) => {
                    ctx.advance(Phase::Forwarded);
                    Flow::Respond(Reply::Backend(response))
                }
                Err(e) => {
                    match &e {
                        BackendError::Timeout { .. } => tracing::warn!(
                            request_id = %ctx.request_id,
                            service = %ctx.service,
                            error = %e,
                            "Backend timed out"
                        ),
                        _ => tracing::error!(
                            request_id = %ctx.request_id,
                            service = %ctx.service,
                            error = %e,
                            "Backend call failed"
                        ),
                    }
                    metrics::record_backend_error(e.kind());
                    ctx.fail();
                    Flow::Respond(Reply::Failure(e.into()))
                }
            }
        })
    }
}
