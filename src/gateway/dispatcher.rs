//! Gateway request dispatch.
//!
//! # Responsibilities
//! - Resolve the service named in the path to its backend URL
//! - Run the request through the admission → cache → forward pipeline
//! - Turn the pipeline's reply into the client response
//! - Record one log line and one set of metrics per request
//!
//! # Design Decisions
//! - Routing happens before the pipeline: an unknown service never consumes
//!   rate-limit budget
//! - Every failure becomes a response here; nothing escapes to the server

use std::sync::Arc;
use std::time::Instant;

use axum::response::{IntoResponse, Response};

use crate::cache::ResponseCache;
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::gateway::context::{Phase, RequestContext};
use crate::gateway::pipeline::{Pipeline, Reply};
use crate::gateway::stages::{AdmissionStage, CacheStage, ForwardStage};
use crate::http::forwarder::Forwarder;
use crate::http::request::{InboundRequest, ProxyRequest};
use crate::http::response::tag_cache_status;
use crate::lifecycle::Stores;
use crate::observability::metrics;
use crate::routing::{RoutingError, RoutingTable, ServicePath};
use crate::security::{ClientKey, RateLimiter};

/// Label used for requests that matched no service.
const UNKNOWN_SERVICE: &str = "unknown";

pub struct Dispatcher {
    routes: RoutingTable,
    pipeline: Pipeline,
}

impl Dispatcher {
    pub fn new(routes: RoutingTable, pipeline: Pipeline) -> Self {
        Self { routes, pipeline }
    }

    /// Compose the routing table and stage pipeline described by `config`.
    ///
    /// Disabled features leave their stage out entirely.
    pub fn from_config(config: &GatewayConfig, stores: &Stores) -> Self {
        let routes = RoutingTable::from_config(&config.services);

        let mut pipeline = Pipeline::builder();
        if config.rate_limit.enabled {
            let limiter = RateLimiter::from_config(stores.counters.clone(), &config.rate_limit);
            tracing::info!(
                limit = limiter.limit(),
                window = ?limiter.window(),
                "Rate limiting enabled"
            );
            pipeline = pipeline.stage(AdmissionStage::new(Arc::new(limiter)));
        }
        if config.cache.enabled {
            let cache = ResponseCache::from_config(stores.cache.clone(), &config.cache);
            pipeline = pipeline.stage(CacheStage::new(Arc::new(cache)));
        }
        let pipeline = pipeline
            .stage(ForwardStage::new(Forwarder::from_config(&config.upstream)))
            .build();

        for route in routes.routes() {
            tracing::debug!(service = %route.service, base_url = %route.base_url, "Route registered");
        }
        tracing::info!(
            services = routes.len(),
            stages = ?pipeline.stage_names(),
            "Gateway pipeline ready"
        );
        Self::new(routes, pipeline)
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Handle one inbound request from start to finish.
    pub async fn dispatch(&self, inbound: InboundRequest) -> Response {
        let started = Instant::now();
        let InboundRequest {
            request_id,
            method,
            uri,
            headers,
            body,
            peer,
        } = inbound;

        let path = uri.path();
        let (service, target) = match ServicePath::parse(path) {
            Some(parsed) => (
                parsed.service,
                self.routes.resolve(parsed.service, parsed.remaining, uri.query()),
            ),
            None => (path, Err(RoutingError::UnknownService(path.to_string()))),
        };

        let target = match target {
            Ok(target) => target,
            Err(e) => {
                tracing::debug!(request_id = %request_id, method = %method, path = %path, "No such service");
                let response = GatewayError::from(e).into_response();
                metrics::record_request(UNKNOWN_SERVICE, response.status().as_u16(), started);
                return response;
            }
        };

        let client = ClientKey::from_request(&headers, peer);
        let mut ctx = RequestContext::new(
            request_id,
            service.to_string(),
            client,
            path.to_string(),
            uri.query().map(str::to_string),
            ProxyRequest {
                method,
                target,
                headers,
                body,
            },
        );
        ctx.advance(Phase::RouteResolved);

        let reply = self.pipeline.run(&mut ctx).await;
        let response = match reply {
            Reply::Backend(response) | Reply::Cached(response) => {
                ctx.advance(Phase::Completed);
                let mut response = response.into_response();
                if let Some(status) = ctx.cache_status {
                    tag_cache_status(&mut response, status);
                }
                response
            }
            Reply::Failure(e) => {
                ctx.fail();
                e.into_response()
            }
        };

        let status = response.status();
        tracing::info!(
            request_id = %ctx.request_id,
            service = %ctx.service,
            client = %ctx.client,
            method = %ctx.request.method,
            target = %ctx.request.target,
            status = status.as_u16(),
            cache = ctx.cache_status.map(|s| s.as_str()).unwrap_or("-"),
            phase = ?ctx.phase(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Request completed"
        );
        metrics::record_request(&ctx.service, status.as_u16(), started);

        response
    }
}
