//! The analysis report: the single structured result object.
//!
//! Exactly one of three terminal shapes is ever produced:
//!
//! - validation failed: `{"is_valid": false}`
//! - extraction or classification failed: `{"is_valid": false, "name": N}`
//! - full success: `{"is_valid": true, "name": N, "tests": {...}}`
//!
//! Field order (`is_valid`, `name`, `tests`) and the order of entries in
//! `tests` are stable across runs on identical input.

use crate::upload::Filename;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// The boolean outcome of one heuristic, paired with its stable identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeuristicVerdict {
    pub id: &'static str,
    pub passed: bool,
}

/// Ordered verdict sequence, serialized as a JSON object whose keys appear
/// in battery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerdictSet(pub Vec<HeuristicVerdict>);

impl Serialize for VerdictSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for verdict in &self.0 {
            map.serialize_entry(verdict.id, &verdict.passed)?;
        }
        map.end()
    }
}

/// Top-level result handed back to the transport layer.
///
/// Immutable once built; construct via [`AnalysisReport::invalid`],
/// [`AnalysisReport::invalid_named`], or [`AnalysisReport::success`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AnalysisReport {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tests: Option<VerdictSet>,
}

impl AnalysisReport {
    /// Validation failed; the client learns nothing else.
    pub fn invalid() -> Self {
        Self {
            is_valid: false,
            name: None,
            tests: None,
        }
    }

    /// Validation passed but extraction or classification did not.
    pub fn invalid_named(name: Filename) -> Self {
        Self {
            is_valid: false,
            name: Some(name.into_inner()),
            tests: None,
        }
    }

    /// Full success with the battery's verdicts in evaluation order.
    pub fn success(name: Filename, verdicts: Vec<HeuristicVerdict>) -> Self {
        Self {
            is_valid: true,
            name: Some(name.into_inner()),
            tests: Some(VerdictSet(verdicts)),
        }
    }

    /// Serialize as UTF-8 JSON with 2-space indentation, the shape the
    /// transport layer sends verbatim.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
