//! Parsability checks run before any arithmetic.

use crate::model::{TimeInputPayload, TimePoint};

pub const REASON_NO_INFORMATION: &str = "No datetime information provided in the input";
pub const REASON_SINGLE_EMPTY: &str = "time_single is empty or contains no datetime data";
pub const REASON_RANGE_EMPTY: &str =
    "Both start_date and end_date are empty or contain no datetime data";

/// True when `point` is absent or carries nothing to resolve.
///
/// `now = true` is never empty. Otherwise a point needs at least one set
/// absolute or relative field, or a weekday.
pub fn is_empty(point: Option<&TimePoint>) -> bool {
    let Some(point) = point else {
        return true;
    };
    if point.is_now() {
        return false;
    }
    let has_absolute = point.absolute.is_some_and(|a| !a.is_unset());
    let has_relative = point.relative.is_some_and(|r| !r.is_unset());
    !(has_absolute || has_relative || point.weekday.is_some())
}

/// The rejection reason for `payload`, or `None` when it can be resolved.
///
/// A range with exactly one empty endpoint passes: the empty side resolves
/// to the current day's boundary.
pub fn rejection_reason(payload: &TimeInputPayload) -> Option<&'static str> {
    match (payload.time_single(), payload.time_range()) {
        (None, None) => Some(REASON_NO_INFORMATION),
        (Some(single), _) if is_empty(Some(single)) => Some(REASON_SINGLE_EMPTY),
        (None, Some(range))
            if is_empty(Some(&range.start_date)) && is_empty(Some(&range.end_date)) =>
        {
            Some(REASON_RANGE_EMPTY)
        }
        _ => None,
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
