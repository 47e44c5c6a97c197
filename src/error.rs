//! HTTP-facing error mapping.
//!
//! Every failure is converted here at the request boundary into the status
//! and JSON body the browser client expects.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::logstore::{ReportError, StoreError};
use crate::proxy::ProxyError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Writing a report failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The detached writer task panicked or was cancelled.
    #[error("log writer task failed: {0}")]
    Writer(#[from] tokio::task::JoinError),

    #[error("Failed to read logs")]
    Snapshot(#[source] StoreError),

    #[error("Proxy server error")]
    Upstream(#[from] ProxyError),

    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            GatewayError::Report(ReportError::MissingFields) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "message": "Missing required fields" }),
            ),
            GatewayError::Report(ReportError::InvalidFormat) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "success": false, "message": "Invalid request format" }),
            ),
            GatewayError::Store(_) | GatewayError::Writer(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "success": false,
                    "error": self.to_string(),
                    "message": "Failed to log error",
                }),
            ),
            GatewayError::Snapshot(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to read logs" }),
            ),
            GatewayError::Upstream(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Proxy server error", "message": e.to_string() }),
            ),
            GatewayError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                json!({ "error": "Method not allowed" }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
