//! Error types produced by the extraction crate.
//!
//! The wire contract collapses every extraction failure to the same minimal
//! report, but the variants here stay distinct so the server can log which
//! stage rejected the upload. In particular `Resource` is kept separate from
//! the format-level variants: "could not open" for lack of memory and "could
//! not open" for a garbage blob are different operational signals.

use crate::ContainerType;
use thiserror::Error;

/// Errors that can occur while classifying a container or extracting its
/// XMP metadata.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum XmpError {
    /// Resource-level failure (allocation, I/O on a caller-provided source).
    #[error("resource failure: {0}")]
    Resource(String),

    /// The bytes do not start with any recognized container magic.
    #[error("input is not a recognized image container")]
    NotAContainer,

    /// The container was recognized but is not the accepted type.
    #[error("unsupported container type: {0}")]
    UnsupportedContainer(ContainerType),

    /// The container ended mid-structure (segment length past end of input).
    #[error("container truncated at byte {offset}")]
    Truncated {
        /// Offset of the read that ran past the end of the input.
        offset: usize,
    },

    /// Structurally invalid container or XMP packet.
    #[error("malformed container: {0}")]
    Malformed(String),

    /// The container parsed but carries no XMP packet.
    #[error("no XMP metadata packet present")]
    NoXmpPacket,
}

impl XmpError {
    /// True for failures caused by the input bytes rather than the host.
    /// Used by callers to pick a log level: client-shaped garbage is routine,
    /// resource exhaustion is not.
    pub fn is_format_error(&self) -> bool {
        !matches!(self, XmpError::Resource(_))
    }
}
