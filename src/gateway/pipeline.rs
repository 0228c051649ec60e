//! Ordered stage pipeline.
//!
//! # Responsibilities
//! - Run stages in order until one produces a reply
//! - Give the stages that ran before the responder a look at the reply
//!
//! # Design Decisions
//! - Composed once at startup and shared read-only by every request
//! - A stage either continues or responds; there is no partial reply
//! - Reply hooks run in reverse order, like unwinding middleware

use futures_util::future::BoxFuture;

use crate::error::GatewayError;
use crate::gateway::context::RequestContext;
use crate::http::response::ProxyResponse;

/// What a stage decided about the request.
pub enum Flow {
    /// Hand the request to the next stage.
    Continue,
    /// Stop here and answer with this reply.
    Respond(Reply),
}

/// Final answer produced by the pipeline.
#[derive(Debug)]
pub enum Reply {
    /// Relayed from a backend.
    Backend(ProxyResponse),
    /// Served from the response cache.
    Cached(ProxyResponse),
    /// Produced by the gateway itself.
    Failure(GatewayError),
}

/// One step of request handling.
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    fn on_request<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, Flow>;

    /// Observe the reply produced by a later stage.
    fn on_reply<'a>(&'a self, _ctx: &'a RequestContext, _reply: &'a Reply) -> BoxFuture<'a, ()> {
        Box::pin(async {})
    }
}

pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder { stages: Vec::new() }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run the request through every stage until one responds.
    pub async fn run(&self, ctx: &mut RequestContext) -> Reply {
        for (index, stage) in self.stages.iter().enumerate() {
            let reply = match stage.on_request(ctx).await {
                Flow::Continue => continue,
                Flow::Respond(reply) => reply,
            };

            tracing::debug!(request_id = %ctx.request_id, stage = stage.name(), "Stage responded");
            for earlier in self.stages[..index].iter().rev() {
                earlier.on_reply(ctx, &reply).await;
            }
            return reply;
        }

        tracing::error!(request_id = %ctx.request_id, "Pipeline ended without a reply");
        ctx.fail();
        Reply::Failure(GatewayError::Unhandled)
    }
}

pub struct PipelineBuilder {
    stages: Vec<Box<dyn Stage>>,
}

impl PipelineBuilder {
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::body::Bytes;
    use axum::http::{HeaderMap, Method, StatusCode};

    use crate::http::request::ProxyRequest;
    use crate::security::ClientKey;

    type Log = Arc<Mutex<Vec<String>>>;

    struct Recording {
        name: &'static str,
        respond: bool,
        log: Log,
    }

    impl Stage for Recording {
        fn name(&self) -> &'static str {
            self.name
        }

        fn on_request<'a>(&'a self, _ctx: &'a mut RequestContext) -> BoxFuture<'a, Flow> {
            Box::pin(async move {
                self.log.lock().unwrap().push(format!("request:{}", self.name));
                if self.respond {
                    let ok = ProxyResponse::new(StatusCode::OK, HeaderMap::new(), self.name);
                    Flow::Respond(Reply::Backend(ok))
                } else {
                    Flow::Continue
                }
            })
        }

        fn on_reply<'a>(&'a self, _ctx: &'a RequestContext, _reply: &'a Reply) -> BoxFuture<'a, ()> {
            Box::pin(async move {
                self.log.lock().unwrap().push(format!("reply:{}", self.name));
            })
        }
    }

    fn stage(name: &'static str, respond: bool, log: &Log) -> Recording {
        Recording {
            name,
            respond,
            log: log.clone(),
        }
    }

    fn context() -> RequestContext {
        RequestContext::new(
            "req-1".into(),
            "persons".into(),
            ClientKey::from("10.0.0.1"),
            "/api/persons".into(),
            None,
            ProxyRequest {
                method: Method::GET,
                target: "http://backend/api/persons".into(),
                headers: HeaderMap::new(),
                body: Bytes::new(),
            },
        )
    }

    #[tokio::test]
    async fn test_stages_run_in_order_and_unwind() {
        let log = Log::default();
        let pipeline = Pipeline::builder()
            .stage(stage("a", false, &log))
            .stage(stage("b", false, &log))
            .stage(stage("c", true, &log))
            .build();

        let reply = pipeline.run(&mut context()).await;
        assert!(matches!(reply, Reply::Backend(r) if &r.body[..] == b"c"));
        assert_eq!(
            *log.lock().unwrap(),
            ["request:a", "request:b", "request:c", "reply:b", "reply:a"]
        );
    }

    #[tokio::test]
    async fn test_short_circuit_skips_later_stages() {
        let log = Log::default();
        let pipeline = Pipeline::builder()
            .stage(stage("a", false, &log))
            .stage(stage("b", true, &log))
            .stage(stage("c", true, &log))
            .build();

        pipeline.run(&mut context()).await;
        assert_eq!(*log.lock().unwrap(), ["request:a", "request:b", "reply:a"]);
    }

    #[tokio::test]
    async fn test_no_responder_is_unhandled() {
        let log = Log::default();
        let pipeline = Pipeline::builder().stage(stage("a", false, &log)).build();

        let mut ctx = context();
        let reply = pipeline.run(&mut ctx).await;
        assert!(matches!(reply, Reply::Failure(GatewayError::Unhandled)));
        assert_eq!(ctx.phase(), crate::gateway::context::Phase::Failed);
    }

    #[test]
    fn test_stage_names() {
        let log = Log::default();
        let pipeline = Pipeline::builder()
            .stage(stage("admission", false, &log))
            .stage(stage("forward", true, &log))
            .build();
        assert_eq!(pipeline.stage_names(), ["admission", "forward"]);
    }
}
