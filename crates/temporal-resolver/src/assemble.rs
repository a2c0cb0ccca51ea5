//! Payload assembler: turns decomposed fragment groups into a payload.

use log::debug;

use crate::builder::build_components;
use crate::fragment::FragmentGroups;
use crate::model::{TimeInputPayload, TimeRange};

/// Wrap built groups into a single-point or range payload.
///
/// - start and end present → range
/// - only start → single point
/// - anything else → empty payload, later rejected by the validator
pub fn assemble(groups: &FragmentGroups) -> TimeInputPayload {
    let payload = match (groups.start.is_empty(), groups.end.is_empty()) {
        (false, false) => TimeInputPayload::range(TimeRange {
            start_date: build_components(&groups.start).into_point(),
            end_date: build_components(&groups.end).into_point(),
        }),
        (false, true) => TimeInputPayload::single(build_components(&groups.start).into_point()),
        (true, _) => TimeInputPayload::empty(),
    };
    debug!(
        "assembled payload: single={} range={}",
        payload.time_single().is_some(),
        payload.time_range().is_some()
    );
    payload
}

// ── Tests ───────────────────────────────────────────────────────────────────
