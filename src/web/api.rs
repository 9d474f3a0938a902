use crate::generator::{Generator, GeneratorError};
use crate::ingest::{ingest_body, BodyFormat, IngestError};
use crate::sink::AppendSink;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, warn};

/// Shared state for the HTTP API
#[derive(Clone)]
pub struct AppState {
    /// Destination for records posted to `/ingest`.
    pub received: Arc<dyn AppendSink>,
    pub generator: Arc<Generator>,
}

// API response types
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub status: &'static str,
    pub records_ingested: usize,
}

#[derive(Debug, Serialize)]
pub struct TestLogsResponse {
    pub status: &'static str,
    pub message: String,
    pub logs_generated: usize,
}

#[derive(Debug, Serialize)]
pub struct AuditLogsResponse {
    pub status: &'static str,
    pub message: String,
    pub audit_logs: usize,
    pub non_audit_logs: usize,
}

/// GET /
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// POST /ingest
///
/// Accepts one JSON object, an array of objects, or (by content type)
/// newline-delimited objects.
pub async fn ingest(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<IngestResponse>, ApiError> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    })?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let format = BodyFormat::from_content_type(content_type);

    let outcome = ingest_body(state.received.as_ref(), format, &body).await?;

    Ok(Json(IngestResponse {
        status: "success",
        records_ingested: outcome.records,
    }))
}

/// GET /test-logs
pub async fn test_logs(State(state): State<AppState>) -> Result<Json<TestLogsResponse>, ApiError> {
    let report = state.generator.burst().await?;

    Ok(Json(TestLogsResponse {
        status: "success",
        message: format!(
            "Generated {} logs for request {}",
            report.generated, report.request_id
        ),
        logs_generated: report.generated,
    }))
}

/// GET /audit-logs
pub async fn audit_logs(
    State(state): State<AppState>,
) -> Result<Json<AuditLogsResponse>, ApiError> {
    let report = state.generator.audit().await?;

    Ok(Json(AuditLogsResponse {
        status: "success",
        message: "Emitted [audit] and non-audit logs".to_string(),
        audit_logs: report.audit,
        non_audit_logs: report.non_audit,
    }))
}

// Error handling
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    PayloadTooLarge(String),
    InternalError(String),
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::MalformedPayload(e) => {
                warn!(error = %e, "Rejected ingest payload");
                ApiError::BadRequest(e.to_string())
            }
            other => {
                error!(error = %other, "Ingest failed");
                ApiError::InternalError(other.to_string())
            }
        }
    }
}

impl From<GeneratorError> for ApiError {
    fn from(err: GeneratorError) -> Self {
        error!(error = %err, "Log generation failed");
        ApiError::InternalError(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (
            status,
            Json(serde_json::json!({ "status": "error", "detail": detail })),
        )
            .into_response()
    }
}
