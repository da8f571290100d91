//! The upload-analysis endpoint.
//!
//! Contract with the client: every request that reaches this service gets a
//! `200 application/json` response carrying one of the three report shapes.
//! No error code, status, or message ever distinguishes the failure cause;
//! that detail goes to the server log only.

use crate::state::ServerState;
use axum::body::Body;
use axum::extract::{Path, Request, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use retouch::{AnalysisReport, Filename};
use std::sync::Arc;

/// Serialized fallback used when report serialization itself fails, which
/// a struct-to-string serialize cannot do in practice.
const MINIMAL_INVALID: &str = "{\n  \"is_valid\": false\n}";

fn report_response(report: &AnalysisReport) -> Response {
    metrics::counter!(
        "analysis_reports_total",
        "outcome" => if report.is_valid { "valid" } else { "invalid" }
    )
    .increment(1);

    let body = report
        .to_json_pretty()
        .unwrap_or_else(|_| MINIMAL_INVALID.to_string());
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Analyze an uploaded image.
///
/// The path's single segment is the claimed filename; the body is the raw
/// image bytes. Validation happens before any body byte is read, in the
/// order: filename shape, declared length, content type.
pub async fn analyze_upload(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
    request: Request,
) -> Response {
    let filename = match Filename::parse(&name) {
        Ok(filename) => filename,
        Err(err) => {
            tracing::info!(error = %err, "rejected upload filename");
            return report_response(&AnalysisReport::invalid());
        }
    };

    let declared = declared_length(request.headers());
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if let Err(err) = state.policy.check_request(declared, &content_type) {
        tracing::info!(name = %filename, error = %err, "rejected upload request shape");
        return report_response(&AnalysisReport::invalid());
    }

    // Validation passed; from here on every failure keeps the name in the
    // report. The read is bounded by the policy maximum even if the
    // declared length lied.
    let limit = state.policy.max_upload_bytes as usize;
    let body = match axum::body::to_bytes(request.into_body(), limit).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(name = %filename, error = %err, "failed to read upload body");
            return report_response(&AnalysisReport::invalid_named(filename));
        }
    };

    let report = retouch::analyze_upload(filename, &body);
    report_response(&report)
}

/// Fallback for every unmatched path: zero segments, nested segments, or
/// anything else outside the route table. The original service answered
/// every URI with a report, so the fallback does too.
pub async fn invalid_report() -> Response {
    report_response(&AnalysisReport::invalid())
}

/// Panic containment at the request boundary: a fatal error in handling
/// converts to the minimal failure report instead of propagating to the
/// transport layer.
pub fn report_panic(err: Box<dyn std::any::Any + Send + 'static>) -> axum::http::Response<Body> {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    tracing::error!(panic = detail, "request handler panicked");

    (
        StatusCode::OK,
        [(CONTENT_TYPE, "application/json")],
        MINIMAL_INVALID.to_string(),
    )
        .into_response()
}
