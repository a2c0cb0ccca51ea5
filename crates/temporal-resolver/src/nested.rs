//! Nested-object front door.
//!
//! The second extractor shape describes each endpoint as one object with a
//! `mode` and calendar fields, optionally chaining an `extended_time` object
//! of the same shape: "one month ago at 3 PM" becomes
//!
//! ```json
//! {"start": {"mode": "relative", "month": -1,
//!            "extended_time": {"mode": "absolute", "hour": 15}}}
//! ```
//!
//! The chain is flattened iteratively into one [`TimePoint`]; its length is
//! capped by [`ResolveOptions::max_nesting_depth`].

use chrono::NaiveDateTime;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{ResolverError, Result};
use crate::fragment::FragmentMode;
use crate::model::{
    field_accessors, AbsoluteTime, RelativeTime, TimeConvertedPayload, TimeField,
    TimeInputPayload, TimePoint, TimeRange,
};
use crate::resolve::{convert_payload, ResolveOptions};

/// One level of a nested time description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<FragmentMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minute: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_time: Option<Box<NestedTime>>,
}

field_accessors!(NestedTime);

impl NestedTime {
    /// No mode, no fields, no extension: the `{}` an extractor sends for
    /// "nothing on this side".
    pub fn is_blank(&self) -> bool {
        self.mode.is_none() && self.is_unset() && self.extended_time.is_none()
    }
}

/// Tool arguments for the nested front door.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolArguments {
    #[serde(default)]
    pub reasoning: String,
    #[serde(default = "default_parsable")]
    pub parsable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<NestedTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<NestedTime>,
}

fn default_parsable() -> bool {
    true
}

/// Flatten a nested chain into one point. Deeper levels override fields
/// set by shallower levels of the same mode.
///
/// # Errors
///
/// Returns [`ResolverError::NestingTooDeep`] when the chain has more than
/// `max_depth` `extended_time` links. A level that sets fields without a
/// mode contributes nothing.
pub fn flatten(time: &NestedTime, max_depth: usize) -> Result<TimePoint> {
    let mut point = TimePoint::default();
    let mut level = Some(time);
    let mut depth = 0usize;

    while let Some(current) = level {
        if depth > max_depth {
            return Err(ResolverError::NestingTooDeep(format!(
                "extended_time nested more than {max_depth} level(s)"
            )));
        }
        apply_level(current, depth, &mut point);
        level = current.extended_time.as_deref();
        depth += 1;
    }

    Ok(point)
}

fn apply_level(level: &NestedTime, depth: usize, point: &mut TimePoint) {
    match level.mode {
        Some(FragmentMode::Now) => point.now = Some(true),
        Some(FragmentMode::Absolute) => {
            let absolute = point.absolute.get_or_insert_with(AbsoluteTime::default);
            for field in TimeField::ALL {
                if let Some(value) = level.get(field) {
                    absolute.set(field, value);
                }
            }
        }
        Some(FragmentMode::Relative) => {
            let relative = point.relative.get_or_insert_with(RelativeTime::default);
            for field in TimeField::ALL {
                if let Some(value) = level.get(field) {
                    relative.set(field, value);
                }
            }
        }
        None if !level.is_unset() => {
            warn!("ignoring fields of nested time at depth {depth}: no mode");
        }
        None => {}
    }
}

/// Build the canonical payload from tool arguments.
///
/// Non-blank `start` and `end` make a range and `start` alone a single
/// point. Anything else, `end` alone included, yields the empty payload.
///
/// # Errors
///
/// See [`flatten`].
pub fn payload_from_arguments(
    args: &ToolArguments,
    options: &ResolveOptions,
) -> Result<TimeInputPayload> {
    let side = |t: &Option<NestedTime>| -> Result<Option<TimePoint>> {
        match t {
            Some(t) if !t.is_blank() => flatten(t, options.max_nesting_depth).map(Some),
            _ => Ok(None),
        }
    };

    let payload = match (side(&args.start)?, side(&args.end)?) {
        (Some(start_date), Some(end_date)) => TimeInputPayload::range(TimeRange {
            start_date,
            end_date,
        }),
        (Some(start), None) => TimeInputPayload::single(start),
        (None, _) => TimeInputPayload::empty(),
    };
    debug!("nested arguments flattened to {payload:?}");
    Ok(payload)
}

/// Run the nested pipeline: flatten, validate, resolve.
///
/// # Errors
///
/// See [`payload_from_arguments`] and [`convert_payload`].
pub fn convert_tool_arguments(
    args: &ToolArguments,
    reference: NaiveDateTime,
    options: &ResolveOptions,
) -> Result<TimeConvertedPayload> {
    if !args.parsable {
        warn!("tool arguments marked unparsable: {}", args.reasoning);
        let reason = if args.reasoning.trim().is_empty() {
            crate::validate::REASON_NO_INFORMATION.to_string()
        } else {
            args.reasoning.clone()
        };
        return Ok(TimeConvertedPayload::rejected(reason));
    }
    let payload = payload_from_arguments(args, options)?;
    convert_payload(&payload, reference, options)
}

// ── Tests ───────────────────────────────────────────────────────────────────
