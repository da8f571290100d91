//! Container classification and XMP metadata extraction.
//!
//! This crate turns an untrusted in-memory byte buffer into a read-only
//! metadata model:
//!
//! 1. [`classify`] inspects magic bytes and names the container format.
//! 2. The JPEG marker walker in [`jpeg`] locates the APP1 XMP packet
//!    without touching entropy-coded data.
//! 3. The packet reader in [`packet`] produces an [`XmpMeta`] property map
//!    with namespace-qualified, tri-state lookups.
//!
//! The whole path operates on slices; nothing is written to disk. Callers
//! that stream uploads are expected to buffer them first, bounded by their
//! own admission policy.
//!
//! # Example
//!
//! ```no_run
//! use xmp::{extract, PropertyLookup, NS_XAP};
//!
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! let meta = extract(&bytes).unwrap();
//! if let PropertyLookup::Found(tool) = meta.get(NS_XAP, "CreatorTool") {
//!     println!("created by {tool}");
//! }
//! ```

mod error;
pub mod jpeg;
mod model;
pub mod packet;

pub use error::XmpError;
pub use model::{PropertyLookup, XmpDateTime, XmpMeta, NS_RDF, NS_XAP, NS_XAP_MM};

use std::fmt;

/// Classification of the uploaded container's format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerType {
    Jpeg,
    Png,
    Tiff,
    Gif,
    Unknown,
}

impl ContainerType {
    /// Short label for display and logging.
    pub fn label(self) -> &'static str {
        match self {
            ContainerType::Jpeg => "JPEG",
            ContainerType::Png => "PNG",
            ContainerType::Tiff => "TIFF",
            ContainerType::Gif => "GIF",
            ContainerType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a buffer by magic bytes. Never fails; unrecognized input is
/// [`ContainerType::Unknown`].
pub fn classify(data: &[u8]) -> ContainerType {
    if data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8 {
        return ContainerType::Jpeg;
    }
    if data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return ContainerType::Png;
    }
    if data.len() >= 4
        && ((data[0] == 0x49 && data[1] == 0x49 && data[2] == 0x2A && data[3] == 0x00)
            || (data[0] == 0x4D && data[1] == 0x4D && data[2] == 0x00 && data[3] == 0x2A))
    {
        return ContainerType::Tiff;
    }
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return ContainerType::Gif;
    }
    ContainerType::Unknown
}

/// Extract the XMP metadata model from a buffer holding the single
/// accepted container type (JPEG).
///
/// Failure modes, all distinct for logging, all terminal for the caller:
///
/// - [`XmpError::NotAContainer`]: no recognized image magic.
/// - [`XmpError::UnsupportedContainer`]: recognized, but not JPEG.
/// - [`XmpError::Truncated`] / [`XmpError::Malformed`]: structural damage
///   in the segment stream or the packet itself.
/// - [`XmpError::NoXmpPacket`]: valid JPEG without an XMP packet.
pub fn extract(data: &[u8]) -> Result<XmpMeta, XmpError> {
    let container = classify(data);
    match container {
        ContainerType::Jpeg => {}
        ContainerType::Unknown => {
            tracing::debug!(len = data.len(), "rejecting unrecognized container");
            return Err(XmpError::NotAContainer);
        }
        other => {
            tracing::debug!(container = other.label(), "rejecting unsupported container");
            return Err(XmpError::UnsupportedContainer(other));
        }
    }

    let raw_packet = jpeg::find_xmp_packet(data)?;
    let meta = packet::parse_packet(raw_packet)?;
    tracing::debug!(properties = meta.len(), "extracted XMP metadata");
    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_magics() {
        assert_eq!(classify(&[0xFF, 0xD8, 0xFF, 0xE0]), ContainerType::Jpeg);
        assert_eq!(
            classify(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0]),
            ContainerType::Png
        );
        assert_eq!(classify(&[0x49, 0x49, 0x2A, 0x00]), ContainerType::Tiff);
        assert_eq!(classify(b"GIF89a..."), ContainerType::Gif);
        assert_eq!(classify(b"plain text"), ContainerType::Unknown);
        assert_eq!(classify(&[]), ContainerType::Unknown);
    }

    #[test]
    fn extract_rejects_non_jpeg_containers() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
        assert_eq!(
            extract(&png),
            Err(XmpError::UnsupportedContainer(ContainerType::Png))
        );
        assert_eq!(extract(b"hello"), Err(XmpError::NotAContainer));
    }
}
