//! Flat fragment front door and the element decomposer.
//!
//! An upstream extractor can describe a time reference as an ordered list of
//! atomic fragments ("absolute month 7", "relative day -1", "friday +1"),
//! each tagged with the range side it belongs to. [`decompose`] partitions
//! them into start and end groups and copies date context from start to end
//! when the end carries none, so "from 2 AM to 5 AM on July 31st" gives the
//! 5 AM endpoint its own date.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, Weekday};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::assemble::assemble;
use crate::error::{ResolverError, Result};
use crate::model::{TimeConvertedPayload, TimeField};
use crate::resolve::{convert_payload, ResolveOptions};
use crate::validate::REASON_NO_INFORMATION;
use crate::weekday::{parse_weekday, weekday_name};

/// How a fragment's value is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentMode {
    Absolute,
    Relative,
    Now,
}

/// Which side of a range a fragment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeTag {
    #[default]
    Start,
    End,
}

/// A calendar field, or a weekday name carrying an occurrence offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FragmentUnit {
    Field(TimeField),
    Weekday(Weekday),
}

impl FragmentUnit {
    /// Year, month, day and weekdays are date-level.
    pub fn is_date_level(self) -> bool {
        match self {
            FragmentUnit::Field(field) => field.is_date_level(),
            FragmentUnit::Weekday(_) => true,
        }
    }
}

impl FromStr for FragmentUnit {
    type Err = ResolverError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase();
        if let Some(weekday) = parse_weekday(&normalized) {
            return Ok(FragmentUnit::Weekday(weekday));
        }
        let singular = normalized.strip_suffix('s').unwrap_or(&normalized);
        let field = match singular {
            "year" => TimeField::Year,
            "month" => TimeField::Month,
            "day" => TimeField::Day,
            "hour" => TimeField::Hour,
            "minute" => TimeField::Minute,
            "second" => TimeField::Second,
            _ => {
                return Err(ResolverError::InvalidFragment(format!(
                    "unknown offset unit '{}'",
                    s.trim()
                )))
            }
        };
        Ok(FragmentUnit::Field(field))
    }
}

impl TryFrom<String> for FragmentUnit {
    type Error = ResolverError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for FragmentUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FragmentUnit::Field(field) => f.write_str(field.as_str()),
            FragmentUnit::Weekday(weekday) => f.write_str(weekday_name(*weekday)),
        }
    }
}

impl From<FragmentUnit> for String {
    fn from(unit: FragmentUnit) -> Self {
        unit.to_string()
    }
}

/// One atomic piece of a time reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeFragment {
    /// Absent for weekday fragments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<FragmentMode>,
    /// Missing means `start`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<RangeTag>,
    pub offset_unit: FragmentUnit,
    #[serde(default)]
    pub offset_value: i64,
}

impl TimeFragment {
    pub fn absolute(field: TimeField, value: i64) -> Self {
        Self {
            mode: Some(FragmentMode::Absolute),
            time_range: None,
            offset_unit: FragmentUnit::Field(field),
            offset_value: value,
        }
    }

    pub fn relative(field: TimeField, value: i64) -> Self {
        Self {
            mode: Some(FragmentMode::Relative),
            time_range: None,
            offset_unit: FragmentUnit::Field(field),
            offset_value: value,
        }
    }

    pub fn weekday(weekday: Weekday, offset: i64) -> Self {
        Self {
            mode: None,
            time_range: None,
            offset_unit: FragmentUnit::Weekday(weekday),
            offset_value: offset,
        }
    }

    /// Tag this fragment with a range side.
    pub fn tagged(mut self, tag: RangeTag) -> Self {
        self.time_range = Some(tag);
        self
    }

    pub fn tag(&self) -> RangeTag {
        self.time_range.unwrap_or_default()
    }
}

/// Extractor output for the fragment front door.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentRequest {
    /// Free-text explanation from the extractor; relayed as the rejection
    /// reason when the request is not parsable.
    #[serde(default)]
    pub reasoning: String,
    #[serde(default = "default_parsable")]
    pub parsable: bool,
    #[serde(default)]
    pub elements: Vec<TimeFragment>,
}

fn default_parsable() -> bool {
    true
}

/// Fragments split by range side, after date inheritance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentGroups {
    pub start: Vec<TimeFragment>,
    pub end: Vec<TimeFragment>,
}

/// Partition fragments into start/end groups and apply date inheritance.
///
/// Fragments tagged `end` go to the end group, everything else to the start
/// group, preserving order. When the end group is non-empty but carries no
/// date-level unit, every date-level fragment of the start group is appended
/// to it, re-tagged `end`. Nothing is ever copied from end to start.
pub fn decompose(fragments: &[TimeFragment]) -> FragmentGroups {
    let (mut end, start): (Vec<TimeFragment>, Vec<TimeFragment>) = fragments
        .iter()
        .copied()
        .partition(|f| f.tag() == RangeTag::End);

    let end_has_date = end.iter().any(|f| f.offset_unit.is_date_level());
    if !end.is_empty() && !end_has_date {
        let inherited: Vec<TimeFragment> = start
            .iter()
            .filter(|f| f.offset_unit.is_date_level())
            .map(|f| f.tagged(RangeTag::End))
            .collect();
        debug!(
            "end group has no date-level unit, inheriting {} fragment(s) from start",
            inherited.len()
        );
        end.extend(inherited);
    }

    FragmentGroups { start, end }
}

/// Run the full fragment pipeline: decompose, build, assemble, resolve.
///
/// An empty element list or an upstream `parsable = false` short-circuits to
/// a rejection carrying the extractor's reasoning.
///
/// # Errors
///
/// Propagates [`convert_payload`] errors. A calendar-field fragment without
/// a mode is ignored, not an error.
pub fn convert_fragments(
    request: &FragmentRequest,
    reference: NaiveDateTime,
    options: &ResolveOptions,
) -> Result<TimeConvertedPayload> {
    if !request.parsable || request.elements.is_empty() {
        let reason = if request.reasoning.trim().is_empty() {
            REASON_NO_INFORMATION.to_string()
        } else {
            request.reasoning.clone()
        };
        warn!("fragment request rejected upstream: {reason}");
        return Ok(TimeConvertedPayload::rejected(reason));
    }

    let groups = decompose(&request.elements);
    debug!(
        "decomposed {} fragment(s) into start={} end={}",
        request.elements.len(),
        groups.start.len(),
        groups.end.len()
    );
    let payload = assemble(&groups);
    convert_payload(&payload, reference, options)
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_untagged_fragments_go_to_start() {
        let groups = decompose(&[
            TimeFragment::absolute(TimeField::Month, 7),
            TimeFragment::absolute(TimeField::Day, 30),
        ]);
        assert_eq!(groups.start.len(), 2);
        assert!(groups.end.is_empty());
    }

    #[test]
    fn test_end_inherits_date_units_from_start() {
        let groups = decompose(&[
            TimeFragment::absolute(TimeField::Month, 7).tagged(RangeTag::Start),
            TimeFragment::absolute(TimeField::Day, 30).tagged(RangeTag::Start),
            TimeFragment::absolute(TimeField::Hour, 2).tagged(RangeTag::Start),
            TimeFragment::absolute(TimeField::Hour, 5).tagged(RangeTag::End),
        ]);
        assert_eq!(groups.start.len(), 3);
        assert_eq!(
            groups.end,
            vec![
                TimeFragment::absolute(TimeField::Hour, 5).tagged(RangeTag::End),
                TimeFragment::absolute(TimeField::Month, 7).tagged(RangeTag::End),
                TimeFragment::absolute(TimeField::Day, 30).tagged(RangeTag::End),
            ]
        );
    }

    #[test]
    fn test_end_with_own_date_inherits_nothing() {
        let groups = decompose(&[
            TimeFragment::absolute(TimeField::Month, 7),
            TimeFragment::absolute(TimeField::Day, 30),
            TimeFragment::absolute(TimeField::Day, 31).tagged(RangeTag::End),
        ]);
        assert_eq!(groups.end.len(), 1);
    }

    #[test]
    fn test_weekday_counts_as_date_level_for_inheritance() {
        let groups = decompose(&[
            TimeFragment::weekday(Weekday::Fri, 1),
            TimeFragment::absolute(TimeField::Hour, 9),
            TimeFragment::absolute(TimeField::Hour, 17).tagged(RangeTag::End),
        ]);
        assert!(groups
            .end
            .contains(&TimeFragment::weekday(Weekday::Fri, 1).tagged(RangeTag::End)));
        // start's hour is not a date unit
        assert_eq!(groups.end.len(), 2);
    }

    #[test]
    fn test_start_never_inherits_from_end() {
        let groups = decompose(&[
            TimeFragment::absolute(TimeField::Hour, 2),
            TimeFragment::absolute(TimeField::Day, 31).tagged(RangeTag::End),
            TimeFragment::absolute(TimeField::Hour, 5).tagged(RangeTag::End),
        ]);
        assert_eq!(groups.start, vec![TimeFragment::absolute(TimeField::Hour, 2)]);
    }

    #[test]
    fn test_unit_parsing() {
        assert_eq!(
            "Days".parse::<FragmentUnit>().unwrap(),
            FragmentUnit::Field(TimeField::Day)
        );
        assert_eq!(
            "tuesday".parse::<FragmentUnit>().unwrap(),
            FragmentUnit::Weekday(Weekday::Tue)
        );
        let err = "fortnight".parse::<FragmentUnit>().unwrap_err().to_string();
        assert!(err.contains("Invalid fragment"), "got: {err}");
    }

    #[test]
    fn test_request_wire_shape() {
        let request: FragmentRequest = serde_json::from_value(json!({
            "reasoning": "next friday at 9",
            "parsable": true,
            "elements": [
                {"offset_unit": "friday", "offset_value": 1},
                {"mode": "absolute", "time_range": "start", "offset_unit": "hour", "offset_value": 9}
            ]
        }))
        .unwrap();
        assert_eq!(request.elements.len(), 2);
        assert_eq!(request.elements[0], TimeFragment::weekday(Weekday::Fri, 1));
        assert_eq!(
            request.elements[1],
            TimeFragment::absolute(TimeField::Hour, 9).tagged(RangeTag::Start)
        );
    }

    #[test]
    fn test_parsable_defaults_to_true() {
        let request: FragmentRequest = serde_json::from_value(json!({"elements": []})).unwrap();
        assert!(request.parsable);
    }

    #[test]
    fn test_empty_request_is_rejected_with_reasoning() {
        let request = FragmentRequest {
            reasoning: "the message mentions no time".to_string(),
            parsable: false,
            elements: vec![],
        };
        let reference = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let result = convert_fragments(&request, reference, &ResolveOptions::default()).unwrap();
        assert!(!result.parsable);
        assert_eq!(result.reason.as_deref(), Some("the message mentions no time"));
        assert!(result.time_single.is_none());
        assert!(result.time_range.is_none());
    }

    #[test]
    fn test_blank_reasoning_falls_back_to_default_reason() {
        let request = FragmentRequest {
            reasoning: "  ".to_string(),
            parsable: true,
            elements: vec![],
        };
        let reference = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let result = convert_fragments(&request, reference, &ResolveOptions::default()).unwrap();
        assert_eq!(result.reason.as_deref(), Some(REASON_NO_INFORMATION));
    }
}
