//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: `/health` and the `/api/...` proxy surface
//! - Wire up middleware (request ID, tracing, CORS, body limit)
//! - Buffer inbound requests and hand them to the dispatcher
//! - Serve until shutdown, then drain in-flight requests

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, ConnectInfo, DefaultBodyLimit, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, Uri},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{CorsConfig, GatewayConfig};
use crate::error::GatewayError;
use crate::gateway::Dispatcher;
use crate::http::request::{request_id, InboundRequest, X_REQUEST_ID};
use crate::lifecycle::shutdown::recv as shutdown_signal;
use crate::lifecycle::{build_stores, StartupError, Stores};
use crate::store::MemoryStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

/// HTTP front end of the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    memory: Option<Arc<MemoryStore>>,
}

impl HttpServer {
    /// Build the server and the stores selected by `config.store`.
    pub fn new(config: GatewayConfig) -> Result<Self, StartupError> {
        let stores = build_stores(&config.store)?;
        Ok(Self::with_stores(config, stores))
    }

    /// Build the server around already constructed stores.
    pub fn with_stores(config: GatewayConfig, stores: Stores) -> Self {
        let dispatcher = Arc::new(Dispatcher::from_config(&config, &stores));
        let router = Self::build_router(&config, AppState { dispatcher });
        Self {
            router,
            config,
            memory: stores.memory,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let request_id = HeaderName::from_static(X_REQUEST_ID);

        let router = Router::new()
            .route("/health", get(health_handler))
            .route("/api", any(proxy_handler))
            .route("/api/", any(proxy_handler))
            .route("/api/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.listener.max_body_bytes));

        let router = if config.cors.enabled {
            router.layer(cors_layer(&config.cors))
        } else {
            router
        };

        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id)),
        )
    }

    /// Serve on `listener` until `shutdown_rx` fires, then drain.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let Self {
            router,
            config,
            memory,
        } = self;

        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Gateway listening");

        let sweeper = memory.map(|store| {
            let every = Duration::from_secs(config.store.sweep_interval_secs.max(1));
            store.spawn_sweeper(every, shutdown_rx.resubscribe())
        });

        let app = router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(shutdown_rx))
            .await?;

        if let Some(sweeper) = sweeper {
            sweeper.abort();
        }

        tracing::info!("Gateway stopped");
        Ok(())
    }
}

/// Allow the configured browser origins with credentials and any method or
/// header.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Buffer the request and hand it to the dispatcher.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let request_id = request_id(&headers);

    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!(
                request_id = %request_id,
                path = %uri.path(),
                status = %rejection.status(),
                "Rejected request body"
            );
            return GatewayError::InvalidBody {
                status: rejection.status(),
                message: rejection.body_text(),
            }
            .into_response();
        }
    };

    state
        .dispatcher
        .dispatch(InboundRequest {
            request_id,
            method,
            uri,
            headers,
            body,
            peer,
        })
        .await
}
