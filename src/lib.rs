//! Core analysis pipeline for the retouch service.
//!
//! This crate stitches together upload validation, XMP metadata extraction,
//! and the heuristic battery so callers can go from an untrusted byte
//! buffer to an [`AnalysisReport`] with a single call. The HTTP surface
//! lives in `retouch-server`; nothing in this crate touches the network or
//! the filesystem.
//!
//! Control flow per request:
//!
//! ```text
//! bytes ── validate (upload) ── extract (xmp) ── evaluate (heuristics)
//!                                        └──────────── report ──────────┘
//! ```
//!
//! Every failure is terminal for its request and collapses to a minimal
//! report; the typed errors exist so the caller can log which stage failed.

pub mod heuristics;
pub mod report;
pub mod upload;

pub use heuristics::{run_battery, BATTERY, PHOTOSHOP_PREFIX};
pub use report::{AnalysisReport, HeuristicVerdict, VerdictSet};
pub use upload::{
    Filename, UploadPolicy, ValidationError, ACCEPTED_CONTENT_TYPE, MAX_FILENAME_LEN,
    MAX_UPLOAD_BYTES,
};
pub use xmp::{ContainerType, XmpError, XmpMeta};

use thiserror::Error;

/// Errors that can occur while driving a request through the pipeline.
///
/// The wire contract never exposes these; they are logged server-side and
/// then collapsed to the minimal report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("request validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("metadata extraction failed: {0}")]
    Extraction(#[from] XmpError),
}

/// Extract metadata and run the full battery over a buffer.
///
/// This is the fallible core used by tests and the demo binary; servers
/// usually want [`analyze_upload`], which folds errors into the report.
pub fn analyze_bytes(data: &[u8]) -> Result<Vec<HeuristicVerdict>, PipelineError> {
    let meta = xmp::extract(data)?;
    Ok(run_battery(&meta))
}

/// Run the pipeline for a validated upload and build the report.
///
/// Extraction failures produce the `{is_valid: false, name}` shape; they
/// are logged here with the failing stage, at `info` for format-level
/// rejections (routine client garbage) and `error` for resource failures.
pub fn analyze_upload(name: Filename, data: &[u8]) -> AnalysisReport {
    match xmp::extract(data) {
        Ok(meta) => {
            let verdicts = run_battery(&meta);
            AnalysisReport::success(name, verdicts)
        }
        Err(err) => {
            if err.is_format_error() {
                tracing::info!(name = %name, error = %err, "upload rejected by extractor");
            } else {
                tracing::error!(name = %name, error = %err, "extractor resource failure");
            }
            AnalysisReport::invalid_named(name)
        }
    }
}
