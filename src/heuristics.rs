//! The heuristic battery: independent predicates over the metadata model.
//!
//! Each predicate is a pure function of [`XmpMeta`] paired with a stable
//! identifier. Identifiers and their order are wire contract: the report's
//! `tests` object lists verdicts in exactly the order of [`BATTERY`].
//!
//! Predicates never fail. A lookup that comes back `NotFound` or
//! `Unparseable` resolves that predicate to `false`, merging "absent" and
//! "present but negative" on purpose; the tri-state distinction is kept
//! internal (see each predicate's documentation for its mapping).

use crate::report::HeuristicVerdict;
use xmp::{PropertyLookup, XmpMeta, NS_XAP, NS_XAP_MM};

/// Signature string prefix identifying Photoshop in `xmp:CreatorTool`.
pub const PHOTOSHOP_PREFIX: &str = "Adobe Photoshop ";

/// One registered heuristic: stable identifier plus predicate.
pub struct Heuristic {
    /// Stable identifier, fixed at build time.
    pub id: &'static str,
    /// Pure predicate over the metadata model.
    pub check: fn(&XmpMeta) -> bool,
}

/// The fixed, ordered battery. Extend by appending entries; existing order
/// must not change, reports preserve it verbatim.
pub const BATTERY: &[Heuristic] = &[
    Heuristic {
        id: "creator_tool_is_photoshop",
        check: creator_tool_is_photoshop,
    },
    Heuristic {
        id: "create_modify_mismatch",
        check: create_modify_mismatch,
    },
    Heuristic {
        id: "has_edit_history",
        check: has_edit_history,
    },
];

/// Run every predicate in battery order and collect the verdicts.
/// Predicates are independent; no outcome short-circuits another.
pub fn run_battery(meta: &XmpMeta) -> Vec<HeuristicVerdict> {
    BATTERY
        .iter()
        .map(|heuristic| {
            let passed = (heuristic.check)(meta);
            tracing::debug!(heuristic = heuristic.id, passed, "evaluated heuristic");
            HeuristicVerdict {
                id: heuristic.id,
                passed,
            }
        })
        .collect()
}

/// True iff `xmp:CreatorTool` is present and starts with the Photoshop
/// signature prefix. `NotFound` maps to `false`.
fn creator_tool_is_photoshop(meta: &XmpMeta) -> bool {
    match meta.get(NS_XAP, "CreatorTool") {
        PropertyLookup::Found(tool) => tool.starts_with(PHOTOSHOP_PREFIX),
        PropertyLookup::Unparseable | PropertyLookup::NotFound => false,
    }
}

/// True iff both `xmp:CreateDate` and `xmp:ModifyDate` parse and their
/// (year, month, day, hour, minute, second) tuples differ in any component.
/// Timezone offset and sub-second precision are excluded from the
/// comparison, so the same instant written in two zones counts as a
/// mismatch; a known limitation. `NotFound` and `Unparseable` on either
/// side map to `false`, not "unknown".
fn create_modify_mismatch(meta: &XmpMeta) -> bool {
    let created = match meta.get_date(NS_XAP, "CreateDate") {
        PropertyLookup::Found(date) => date,
        PropertyLookup::Unparseable | PropertyLookup::NotFound => return false,
    };
    let modified = match meta.get_date(NS_XAP, "ModifyDate") {
        PropertyLookup::Found(date) => date,
        PropertyLookup::Unparseable | PropertyLookup::NotFound => return false,
    };
    created.wall_clock() != modified.wall_clock()
}

/// True iff `xmpMM:History` is present, indicating the file records one or
/// more editing stages. Presence alone counts; the array contents are not
/// inspected. `NotFound` maps to `false`.
fn has_edit_history(meta: &XmpMeta) -> bool {
    meta.get(NS_XAP_MM, "History").is_found()
}
