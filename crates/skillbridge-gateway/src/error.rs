//! Problem-details responses for failed requests.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use skillbridge_core::{BridgeError, ErrorKind};
use tracing::{error, warn};

/// A [`BridgeError`] rendered as an `application/problem+json` response.
#[derive(Debug)]
pub struct ApiError(pub BridgeError);

impl From<BridgeError> for ApiError {
    fn from(err: BridgeError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match (&self.0, self.0.kind()) {
            (BridgeError::Http(_), _) => StatusCode::SERVICE_UNAVAILABLE,
            (_, ErrorKind::Discovery | ErrorKind::RemoteInvocation | ErrorKind::Cancelled) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            (_, ErrorKind::Binding | ErrorKind::Orchestration | ErrorKind::Internal) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn title(&self) -> &'static str {
        match (&self.0, self.0.kind()) {
            (BridgeError::Http(_), _) => "Backend service unavailable",
            (_, ErrorKind::Discovery) => "Remote agent discovery failed",
            (_, ErrorKind::RemoteInvocation) => "Remote agent invocation failed",
            (_, ErrorKind::Cancelled) => "Request cancelled",
            (_, ErrorKind::Binding) => "Remote agent misconfigured",
            (_, ErrorKind::Orchestration) => "Orchestration failed",
            (_, ErrorKind::Internal) => "Internal error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            error!(error = %self.0, "Request failed");
        } else {
            warn!(error = %self.0, "Request failed");
        }
        let body = serde_json::json!({
            "type": "about:blank",
            "title": self.title(),
            "status": status.as_u16(),
            "detail": self.0.to_string(),
        });
        (
            status,
            [(header::CONTENT_TYPE, "application/problem+json")],
            Json(body),
        )
            .into_response()
    }
}
