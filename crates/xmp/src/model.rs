//! The extracted metadata model: namespace-qualified properties with
//! tri-state lookup, and the XMP date/time record.
//!
//! Absence of a property is representable distinctly from presence with an
//! empty value: `get` answers [`PropertyLookup::NotFound`] for the former and
//! `Found("")` for the latter. Array and struct properties (for example
//! `xmpMM:History`) are recorded as present with an empty value so that
//! presence checks work without modeling the full RDF shape.

use std::collections::HashMap;

/// Namespace URI for the basic XMP schema (`xmp:` prefix by convention).
pub const NS_XAP: &str = "http://ns.adobe.com/xap/1.0/";
/// Namespace URI for the XMP Media Management schema (`xmpMM:`).
pub const NS_XAP_MM: &str = "http://ns.adobe.com/xap/1.0/mm/";
/// Namespace URI for RDF syntax elements.
pub const NS_RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

/// Outcome of one property lookup against the metadata model.
///
/// String lookups only produce `Found` or `NotFound`; date lookups
/// additionally produce `Unparseable` when the raw text does not follow the
/// XMP date profile. Heuristic predicates document how they map each state
/// to their boolean verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyLookup<T> {
    /// Property present with a usable value.
    Found(T),
    /// Property present but its value could not be interpreted.
    Unparseable,
    /// Property absent from the model.
    NotFound,
}

impl<T> PropertyLookup<T> {
    /// The found value, discarding the reason when there is none.
    pub fn found(self) -> Option<T> {
        match self {
            PropertyLookup::Found(value) => Some(value),
            PropertyLookup::Unparseable | PropertyLookup::NotFound => None,
        }
    }

    /// True only for `Found`.
    pub fn is_found(&self) -> bool {
        matches!(self, PropertyLookup::Found(_))
    }
}

/// Read-only property map extracted from one XMP packet.
///
/// Keys are `(namespace URI, local name)` pairs; values are the raw
/// property text with XML entities resolved. The model is owned by the
/// extractor for the duration of one request and read-only to evaluators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmpMeta {
    properties: HashMap<(String, String), String>,
}

impl XmpMeta {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record a property. First write wins; XMP packets that repeat a
    /// property keep the earliest occurrence, matching reader behavior of
    /// taking the first rdf:Description entry.
    pub(crate) fn insert(&mut self, ns: &str, name: &str, value: String) {
        self.properties
            .entry((ns.to_string(), name.to_string()))
            .or_insert(value);
    }

    /// Number of properties captured.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// True when no properties were captured.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Look up a string property by namespace URI and local name.
    pub fn get(&self, ns: &str, name: &str) -> PropertyLookup<&str> {
        match self.properties.get(&(ns.to_string(), name.to_string())) {
            Some(value) => PropertyLookup::Found(value.as_str()),
            None => PropertyLookup::NotFound,
        }
    }

    /// Look up a date-valued property, decomposing it into [`XmpDateTime`].
    pub fn get_date(&self, ns: &str, name: &str) -> PropertyLookup<XmpDateTime> {
        match self.get(ns, name) {
            PropertyLookup::Found(raw) => match XmpDateTime::parse(raw) {
                Some(date) => PropertyLookup::Found(date),
                None => PropertyLookup::Unparseable,
            },
            PropertyLookup::Unparseable => PropertyLookup::Unparseable,
            PropertyLookup::NotFound => PropertyLookup::NotFound,
        }
    }
}

/// Structured XMP date/time record.
///
/// XMP dates follow a reduced ISO 8601 profile where trailing fields may be
/// omitted: `YYYY`, `YYYY-MM`, `YYYY-MM-DD`, `...THH:MM`, `...THH:MM:SS`,
/// optionally with fractional seconds and a `Z`/`±hh:mm` offset. Omitted
/// fields are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XmpDateTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub nanosecond: u32,
    /// -1, 0 (no offset present or UTC), or +1.
    pub tz_sign: i8,
    pub tz_hour: u32,
    pub tz_minute: u32,
}

impl XmpDateTime {
    /// The `(year, month, day, hour, minute, second)` tuple used for
    /// wall-clock comparison. Timezone offset and sub-second precision are
    /// deliberately excluded, matching the comparison the heuristics need.
    pub fn wall_clock(&self) -> (i32, u32, u32, u32, u32, u32) {
        (
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
        )
    }

    /// Parse an XMP date string. Returns `None` for anything outside the
    /// profile, including trailing garbage and out-of-range components.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut out = XmpDateTime::default();
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }

        let mut cursor = Cursor { s, pos: 0 };
        out.year = cursor.digits(4)? as i32;
        if cursor.done() {
            return Some(out);
        }

        cursor.expect('-')?;
        out.month = cursor.digits(2)?;
        if !(1..=12).contains(&out.month) {
            return None;
        }
        if cursor.done() {
            return Some(out);
        }

        cursor.expect('-')?;
        out.day = cursor.digits(2)?;
        if !(1..=31).contains(&out.day) {
            return None;
        }
        if cursor.done() {
            return Some(out);
        }

        cursor.expect('T')?;
        out.hour = cursor.digits(2)?;
        cursor.expect(':')?;
        out.minute = cursor.digits(2)?;
        if out.hour > 23 || out.minute > 59 {
            return None;
        }
        if cursor.done() {
            return Some(out);
        }

        if cursor.peek() == Some(':') {
            cursor.expect(':')?;
            out.second = cursor.digits(2)?;
            if out.second > 59 {
                return None;
            }
            if cursor.peek() == Some('.') {
                cursor.expect('.')?;
                out.nanosecond = cursor.fraction_nanos()?;
            }
        }
        if cursor.done() {
            return Some(out);
        }

        match cursor.peek() {
            Some('Z') => {
                cursor.expect('Z')?;
                out.tz_sign = 0;
            }
            Some('+') | Some('-') => {
                let sign = if cursor.peek() == Some('+') { 1 } else { -1 };
                cursor.advance();
                out.tz_sign = sign;
                out.tz_hour = cursor.digits(2)?;
                cursor.expect(':')?;
                out.tz_minute = cursor.digits(2)?;
                if out.tz_hour > 23 || out.tz_minute > 59 {
                    return None;
                }
            }
            _ => return None,
        }

        if cursor.done() {
            Some(out)
        } else {
            None
        }
    }
}

struct Cursor<'a> {
    s: &'a str,
    pos: usize,
}

impl Cursor<'_> {
    fn done(&self) -> bool {
        self.pos >= self.s.len()
    }

    fn peek(&self) -> Option<char> {
        self.s[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn expect(&mut self, c: char) -> Option<()> {
        if self.peek() == Some(c) {
            self.advance();
            Some(())
        } else {
            None
        }
    }

    fn digits(&mut self, count: usize) -> Option<u32> {
        let slice = self.s.get(self.pos..self.pos + count)?;
        if !slice.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        self.pos += count;
        slice.parse().ok()
    }

    /// Fractional seconds of any length, normalized to nanoseconds.
    fn fraction_nanos(&mut self) -> Option<u32> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        let digits = &self.s[start..self.pos];
        if digits.is_empty() {
            return None;
        }
        let mut nanos: u64 = 0;
        for (i, b) in digits.bytes().enumerate() {
            if i >= 9 {
                break;
            }
            nanos = nanos * 10 + u64::from(b - b'0');
        }
        let seen = digits.len().min(9);
        for _ in seen..9 {
            nanos *= 10;
        }
        Some(nanos as u32)
    }
}
