//! Per-request failures and their client-facing responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::http::forwarder::BackendError;
use crate::routing::RoutingError;

/// Why the gateway answered a request itself instead of relaying a backend.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error("Too many requests")]
    AdmissionDenied,

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("{message}")]
    InvalidBody { status: StatusCode, message: String },

    #[error("No stage produced a response")]
    Unhandled,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Routing(_) => StatusCode::NOT_FOUND,
            GatewayError::AdmissionDenied => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Backend(BackendError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Backend(_) => StatusCode::BAD_GATEWAY,
            GatewayError::InvalidBody { status, .. } => *status,
            GatewayError::Unhandled => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            GatewayError::Routing(e) => {
                (status, Json(json!({ "detail": e.to_string() }))).into_response()
            }
            GatewayError::AdmissionDenied => (status, "Too many requests").into_response(),
            other => (status, Json(json!({ "error": other.to_string() }))).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn body_of(error: GatewayError) -> (StatusCode, String) {
        let response = error.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_unknown_service_is_404_detail() {
        let (status, body) =
            body_of(RoutingError::UnknownService("nosuchservice".into()).into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["detail"], "Unknown service 'nosuchservice'");
    }

    #[tokio::test]
    async fn test_denied_is_plain_429() {
        let (status, body) = body_of(GatewayError::AdmissionDenied).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body, "Too many requests");
    }

    #[tokio::test]
    async fn test_backend_failures_map_to_502_and_504() {
        let timeout = BackendError::Timeout {
            target: "http://b/x".into(),
            after: Duration::from_millis(10),
        };
        let (status, body) = body_of(timeout.into()).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(json["error"].as_str().unwrap().contains("http://b/x"));

        let refused = BackendError::Unreachable {
            target: "http://b/x".into(),
            reason: "connection refused".into(),
        };
        let (status, body) = body_of(refused.into()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_invalid_body_keeps_its_status() {
        let error = GatewayError::InvalidBody {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: "length limit exceeded".into(),
        };
        let (status, body) = body_of(error).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(body.contains("length limit exceeded"));
    }
}
