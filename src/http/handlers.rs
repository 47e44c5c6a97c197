//! Route handlers.

use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderValue, Method, Uri},
    response::Response,
    Json,
};
use serde::Serialize;

use crate::error::GatewayError;
use crate::http::middleware::cors::ALLOW_ORIGIN;
use crate::http::server::AppState;
use crate::logstore::{ErrorReport, LogSnapshot};
use crate::observability::metrics;

/// Success body of `POST /log-error`.
#[derive(Debug, Serialize)]
pub struct LogErrorResponse {
    pub success: bool,
    pub file: String,
    pub path: String,
    pub message: &'static str,
}

/// `POST /log-error`: validate and append one report.
pub async fn log_error(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<LogErrorResponse>, GatewayError> {
    let report = match ErrorReport::from_json(&body) {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!(reason = %e, "Rejected error report");
            metrics::record_report("rejected");
            return Err(e.into());
        }
    };

    // Detached so that a dropped connection cannot cut a write short.
    let store = state.store.clone();
    let written = tokio::spawn(async move { store.append(&report).await }).await;

    let entry = match written {
        Ok(Ok(entry)) => entry,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Failed to write log file");
            metrics::record_report("failed");
            return Err(e.into());
        }
        Err(e) => {
            tracing::error!(error = %e, "Log writer task failed");
            metrics::record_report("failed");
            return Err(e.into());
        }
    };

    tracing::info!(file = %entry.file, path = %entry.path.display(), "Error logged");
    metrics::record_report("stored");

    Ok(Json(LogErrorResponse {
        success: true,
        file: entry.file,
        path: entry.path.display().to_string(),
        message: "Error logged successfully",
    }))
}

/// `GET /get-logs`: every log file's content keyed by file name.
pub async fn get_logs(State(state): State<AppState>) -> Result<Json<LogSnapshot>, GatewayError> {
    let logs = state.store.snapshot().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to read logs");
        GatewayError::Snapshot(e)
    })?;

    tracing::debug!(files = logs.len(), "Serving log snapshot");
    Ok(Json(logs))
}

/// Everything else: GETs go upstream, other methods are refused.
pub async fn forward(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> Result<Response, GatewayError> {
    if method != Method::GET {
        tracing::debug!(method = %method, path = %uri.path(), "Method not allowed");
        return Err(GatewayError::MethodNotAllowed);
    }

    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let started = Instant::now();

    let upstream = match state.upstream.forward(path_and_query).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Proxy error");
            metrics::record_upstream(started, false);
            return Err(e.into());
        }
    };
    metrics::record_upstream(started, true);

    let status = upstream.status();
    tracing::debug!(status = %status, path = %path_and_query, "Upstream responded");

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(ALLOW_ORIGIN),
    );
    Ok(response)
}
