//! Minimal JPEG marker-segment walker for locating the XMP packet.
//! Operates on slices; the scan path does not allocate.

use crate::error::XmpError;
use memchr::memmem;

/// Start Of Image.
pub const MARKER_SOI: u8 = 0xD8;
/// End Of Image.
pub const MARKER_EOI: u8 = 0xD9;
/// Start Of Scan; entropy-coded data follows, metadata segments do not.
pub const MARKER_SOS: u8 = 0xDA;
/// APP1, used by both Exif and XMP.
pub const MARKER_APP1: u8 = 0xE1;
/// Temporary marker, standalone.
pub const MARKER_TEM: u8 = 0x01;

/// Signature prefixing the XMP payload inside an APP1 segment, including
/// the terminating NUL.
pub const XMP_APP1_HEADER: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";

/// True for markers that carry no length/payload.
#[inline]
fn is_standalone(marker: u8) -> bool {
    // RST0..RST7, TEM, SOI, EOI
    matches!(marker, 0xD0..=0xD7 | MARKER_TEM | MARKER_SOI | MARKER_EOI)
}

/// One marker segment: the marker byte and its payload (without the
/// two length bytes).
#[derive(Debug, Clone, Copy)]
pub struct Segment<'a> {
    pub marker: u8,
    pub payload: &'a [u8],
}

/// Walk the metadata segments of a JPEG stream, stopping at SOS or EOI.
///
/// The walker is strict about structure up to the first scan: a length that
/// runs past the end of the input is reported as [`XmpError::Truncated`],
/// and a byte where a `0xFF` marker introducer was expected is
/// [`XmpError::Malformed`]. Entropy-coded data is never scanned.
pub struct SegmentWalker<'a> {
    data: &'a [u8],
    pos: usize,
    finished: bool,
}

impl<'a> SegmentWalker<'a> {
    /// Start walking. Fails unless the input begins with SOI.
    pub fn new(data: &'a [u8]) -> Result<Self, XmpError> {
        if data.len() < 2 || data[0] != 0xFF || data[1] != MARKER_SOI {
            return Err(XmpError::Malformed("missing SOI marker".into()));
        }
        Ok(Self {
            data,
            pos: 2,
            finished: false,
        })
    }

    fn read_segment(&mut self) -> Result<Option<Segment<'a>>, XmpError> {
        loop {
            if self.pos >= self.data.len() {
                // Ran off the end before SOS/EOI; treat as end of metadata.
                self.finished = true;
                return Ok(None);
            }
            if self.data[self.pos] != 0xFF {
                return Err(XmpError::Malformed(format!(
                    "expected marker introducer at byte {}",
                    self.pos
                )));
            }
            // Skip fill bytes (runs of 0xFF before the marker code).
            let mut marker_pos = self.pos + 1;
            while marker_pos < self.data.len() && self.data[marker_pos] == 0xFF {
                marker_pos += 1;
            }
            let marker = match self.data.get(marker_pos) {
                Some(&m) => m,
                None => return Err(XmpError::Truncated { offset: marker_pos }),
            };
            self.pos = marker_pos + 1;

            if marker == MARKER_SOS || marker == MARKER_EOI {
                self.finished = true;
                return Ok(None);
            }
            if is_standalone(marker) {
                continue;
            }

            let len_end = self.pos + 2;
            if len_end > self.data.len() {
                return Err(XmpError::Truncated { offset: self.pos });
            }
            let declared = u16::from_be_bytes([self.data[self.pos], self.data[self.pos + 1]]);
            if declared < 2 {
                return Err(XmpError::Malformed(format!(
                    "segment length {declared} below minimum at byte {}",
                    self.pos
                )));
            }
            let payload_len = usize::from(declared) - 2;
            let payload_end = len_end + payload_len;
            if payload_end > self.data.len() {
                return Err(XmpError::Truncated { offset: len_end });
            }
            let payload = &self.data[len_end..payload_end];
            self.pos = payload_end;
            return Ok(Some(Segment { marker, payload }));
        }
    }
}

impl<'a> Iterator for SegmentWalker<'a> {
    type Item = Result<Segment<'a>, XmpError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_segment() {
            Ok(Some(segment)) => Some(Ok(segment)),
            Ok(None) => None,
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

/// Locate the raw XMP packet (the RDF/XML text after the APP1 signature)
/// inside a JPEG stream.
///
/// Returns [`XmpError::NoXmpPacket`] when the stream is structurally valid
/// JPEG but carries no XMP APP1 segment before the first scan.
pub fn find_xmp_packet(data: &[u8]) -> Result<&[u8], XmpError> {
    let finder = memmem::Finder::new(XMP_APP1_HEADER);
    for segment in SegmentWalker::new(data)? {
        let segment = segment?;
        if segment.marker != MARKER_APP1 {
            continue;
        }
        // The signature must be at the start of the payload; memmem is used
        // for the comparison so short payloads fall out naturally.
        if finder.find(segment.payload) == Some(0) {
            return Ok(&segment.payload[XMP_APP1_HEADER.len()..]);
        }
    }
    Err(XmpError::NoXmpPacket)
}
