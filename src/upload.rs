//! Upload admission: filename and request-shape validation.
//!
//! Everything here runs before any byte of the body is interpreted. The
//! checks are deliberately strict and the rejection carries no detail back
//! to the client; the typed [`ValidationError`] exists for server-side
//! logging only.

use std::fmt;
use thiserror::Error;

/// Hard ceiling on accepted upload size: 128 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 128 * 1024 * 1024;

/// Maximum accepted filename length in characters.
pub const MAX_FILENAME_LEN: usize = 64;

/// The single accepted request encoding. Multipart uploads are out of
/// scope; the body is the raw image bytes.
pub const ACCEPTED_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Admission failures. Each variant is logged server-side; the wire
/// response is the same minimal report for all of them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    /// The URI path did not decompose into exactly one segment.
    #[error("path must contain exactly one segment, found {0}")]
    PathShape(usize),

    /// Empty filename segment.
    #[error("filename is empty")]
    EmptyFilename,

    /// Filename contains a character outside `[A-Za-z0-9_.-]`.
    #[error("filename contains disallowed character {0:?}")]
    DisallowedCharacter(char),

    /// Filename longer than [`MAX_FILENAME_LEN`].
    #[error("filename length {0} exceeds maximum of {MAX_FILENAME_LEN}")]
    FilenameTooLong(usize),

    /// Content length absent or chunked-unknown.
    #[error("content length is unknown")]
    UnknownLength,

    /// Declared content length above the policy maximum.
    #[error("declared length {declared} exceeds maximum of {limit}")]
    TooLarge { declared: u64, limit: u64 },

    /// Content type other than the single accepted encoding.
    #[error("unsupported content type {0:?}")]
    ContentType(String),
}

/// A validated upload filename.
///
/// Advisory and display-only: it is echoed in the report but never
/// interpreted as a filesystem path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filename(String);

impl Filename {
    /// Validate a raw path segment against the filename rules.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if raw.is_empty() {
            return Err(ValidationError::EmptyFilename);
        }
        if raw.chars().count() > MAX_FILENAME_LEN {
            return Err(ValidationError::FilenameTooLong(raw.chars().count()));
        }
        for c in raw.chars() {
            if !c.is_ascii_alphanumeric() && c != '_' && c != '-' && c != '.' {
                return Err(ValidationError::DisallowedCharacter(c));
            }
        }
        Ok(Filename(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Filename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Filename {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Request admission policy: size, naming, and content-type constraints.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    /// Maximum declared (and read) body size in bytes.
    pub max_upload_bytes: u64,
    /// Exact content type required on the request.
    pub accepted_content_type: String,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_upload_bytes: MAX_UPLOAD_BYTES,
            accepted_content_type: ACCEPTED_CONTENT_TYPE.to_string(),
        }
    }
}

impl UploadPolicy {
    /// Decompose a URI path into its single filename segment.
    ///
    /// Empty segments are ignored (so `/photo.jpg` and `/photo.jpg/` both
    /// carry one segment); anything other than exactly one non-empty
    /// segment is rejected.
    pub fn filename_from_path(&self, path: &str) -> Result<Filename, ValidationError> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let first = segments.next();
        let extra = segments.count();
        match (first, extra) {
            (Some(segment), 0) => Filename::parse(segment),
            (None, _) => Err(ValidationError::PathShape(0)),
            (Some(_), n) => Err(ValidationError::PathShape(n + 1)),
        }
    }

    /// Check the declared length and content type of the request.
    ///
    /// `declared_len` is `None` for chunked/unknown lengths, which the
    /// policy rejects outright: the declared size is what bounds the read.
    pub fn check_request(
        &self,
        declared_len: Option<u64>,
        content_type: &str,
    ) -> Result<(), ValidationError> {
        let declared = declared_len.ok_or(ValidationError::UnknownLength)?;
        if declared > self.max_upload_bytes {
            return Err(ValidationError::TooLarge {
                declared,
                limit: self.max_upload_bytes,
            });
        }
        if content_type != self.accepted_content_type {
            return Err(ValidationError::ContentType(content_type.to_string()));
        }
        Ok(())
    }
}
