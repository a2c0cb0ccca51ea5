//! Time reference model.
//!
//! Plain data describing a partially-specified time reference, the payload
//! that wraps one or two of them, and the resolved output. Everything here is
//! transient: built per request, consumed once by the resolver.
//!
//! Field names match the JSON wire shape (`time_single`, `start_date`, ...).
//! Absent optional fields are omitted when serializing.

use chrono::{NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{ResolverError, Result};
use crate::weekday::serde_weekday;

/// Output format for resolved instants: local wall-clock time, no offset.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ── Point components ────────────────────────────────────────────────────────

/// Calendar fields to set verbatim. `None` leaves the field untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsoluteTime {
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
}

/// Signed offsets added to the reference instant.
///
/// `year`/`month` are calendar offsets (month overflow carries into the
/// year); `day`/`hour`/`minute`/`second` are elapsed durations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelativeTime {
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
}

/// Calendar field addressed by a fragment or a nested time object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeField {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl TimeField {
    /// Every field, coarsest first.
    pub const ALL: [TimeField; 6] = [
        TimeField::Year,
        TimeField::Month,
        TimeField::Day,
        TimeField::Hour,
        TimeField::Minute,
        TimeField::Second,
    ];

    /// Year, month and day are date-level; the rest are time-of-day.
    pub fn is_date_level(self) -> bool {
        matches!(self, TimeField::Year | TimeField::Month | TimeField::Day)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeField::Year => "year",
            TimeField::Month => "month",
            TimeField::Day => "day",
            TimeField::Hour => "hour",
            TimeField::Minute => "minute",
            TimeField::Second => "second",
        }
    }
}

macro_rules! field_accessors {
    ($ty:ty) => {
        impl $ty {
            /// True when no field is set.
            pub fn is_unset(&self) -> bool {
                $crate::model::TimeField::ALL
                    .iter()
                    .all(|field| self.get(*field).is_none())
            }

            /// True when hour, minute or second is set.
            pub fn has_time_units(&self) -> bool {
                self.hour.is_some() || self.minute.is_some() || self.second.is_some()
            }

            pub fn get(&self, field: $crate::model::TimeField) -> Option<i64> {
                match field {
                    $crate::model::TimeField::Year => self.year,
                    $crate::model::TimeField::Month => self.month,
                    $crate::model::TimeField::Day => self.day,
                    $crate::model::TimeField::Hour => self.hour,
                    $crate::model::TimeField::Minute => self.minute,
                    $crate::model::TimeField::Second => self.second,
                }
            }

            pub fn set(&mut self, field: $crate::model::TimeField, value: i64) {
                let slot = match field {
                    $crate::model::TimeField::Year => &mut self.year,
                    $crate::model::TimeField::Month => &mut self.month,
                    $crate::model::TimeField::Day => &mut self.day,
                    $crate::model::TimeField::Hour => &mut self.hour,
                    $crate::model::TimeField::Minute => &mut self.minute,
                    $crate::model::TimeField::Second => &mut self.second,
                };
                *slot = Some(value);
            }
        }
    };
}

field_accessors!(AbsoluteTime);
field_accessors!(RelativeTime);

pub(crate) use field_accessors;

/// "The Nth <weekday> from the reference date."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayOffset {
    #[serde(with = "serde_weekday")]
    pub weekday: Weekday,
    #[serde(default)]
    pub offset: i64,
}

/// One time reference: a single point, or one endpoint of a range.
///
/// Relative offsets apply first, then the weekday occurrence, then absolute
/// overrides. `now = Some(true)` short-circuits all of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absolute: Option<AbsoluteTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative: Option<RelativeTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday: Option<WeekdayOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub now: Option<bool>,
}

/// A single-point reference.
pub type TimeSingle = TimePoint;

/// One endpoint of a [`TimeRange`].
pub type TimeRangeDate = TimePoint;

impl TimePoint {
    pub fn now() -> Self {
        Self {
            now: Some(true),
            ..Self::default()
        }
    }

    pub fn is_now(&self) -> bool {
        self.now == Some(true)
    }

    fn absolute_or_default(&self) -> AbsoluteTime {
        self.absolute.unwrap_or_default()
    }

    fn relative_or_default(&self) -> RelativeTime {
        self.relative.unwrap_or_default()
    }

    /// Hour, minute or second appears in either component.
    pub fn has_time_units(&self) -> bool {
        self.absolute_or_default().has_time_units() || self.relative_or_default().has_time_units()
    }

    /// Day-level information: an absolute or relative day, or a weekday.
    pub fn has_day(&self) -> bool {
        self.absolute_or_default().day.is_some()
            || self.relative_or_default().day.is_some()
            || self.weekday.is_some()
    }

    pub fn has_month(&self) -> bool {
        self.absolute_or_default().month.is_some() || self.relative_or_default().month.is_some()
    }

    pub fn has_year(&self) -> bool {
        self.absolute_or_default().year.is_some() || self.relative_or_default().year.is_some()
    }
}

/// Start and end endpoints of a range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(default)]
    pub start_date: TimeRangeDate,
    #[serde(default)]
    pub end_date: TimeRangeDate,
}

// ── Input payload ───────────────────────────────────────────────────────────

/// What the resolver is asked to compute: a single point, a range, or
/// nothing at all. Never both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeInputPayload")]
pub struct TimeInputPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    time_single: Option<TimeSingle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_range: Option<TimeRange>,
}

#[derive(Deserialize)]
struct RawTimeInputPayload {
    #[serde(default)]
    time_single: Option<TimeSingle>,
    #[serde(default)]
    time_range: Option<TimeRange>,
}

impl TryFrom<RawTimeInputPayload> for TimeInputPayload {
    type Error = ResolverError;

    fn try_from(raw: RawTimeInputPayload) -> Result<Self> {
        Self::new(raw.time_single, raw.time_range)
    }
}

impl TimeInputPayload {
    /// Build a payload, rejecting one that carries both a single point and
    /// a range.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::ConflictingPayload`] when both are `Some`.
    pub fn new(time_single: Option<TimeSingle>, time_range: Option<TimeRange>) -> Result<Self> {
        if time_single.is_some() && time_range.is_some() {
            return Err(ResolverError::ConflictingPayload(
                "only one of 'time_single' or 'time_range' can be set, not both".to_string(),
            ));
        }
        Ok(Self {
            time_single,
            time_range,
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(point: TimeSingle) -> Self {
        Self {
            time_single: Some(point),
            time_range: None,
        }
    }

    pub fn range(range: TimeRange) -> Self {
        Self {
            time_single: None,
            time_range: Some(range),
        }
    }

    pub fn time_single(&self) -> Option<&TimeSingle> {
        self.time_single.as_ref()
    }

    pub fn time_range(&self) -> Option<&TimeRange> {
        self.time_range.as_ref()
    }
}

// ── Output payload ──────────────────────────────────────────────────────────

/// A resolved endpoint: either the "now" marker or a local timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedDateTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub now: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,
}

impl ComputedDateTime {
    /// The "now" marker; no timestamp is computed.
    pub fn now() -> Self {
        Self {
            now: Some(true),
            datetime: None,
        }
    }

    /// A timestamp formatted with [`DATETIME_FORMAT`] (sub-seconds dropped).
    pub fn at(dt: NaiveDateTime) -> Self {
        Self {
            now: None,
            datetime: Some(dt.format(DATETIME_FORMAT).to_string()),
        }
    }
}

/// Resolved start and end of a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedRange {
    pub start_date: ComputedDateTime,
    pub end_date: ComputedDateTime,
}

/// Final result handed back to the caller.
///
/// `parsable = false` is a first-class outcome carrying a human-readable
/// `reason`; in that case neither `time_single` nor `time_range` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeConvertedPayload {
    pub parsable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_single: Option<ComputedDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<ConvertedRange>,
}

impl TimeConvertedPayload {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            parsable: false,
            reason: Some(reason.into()),
            time_single: None,
            time_range: None,
        }
    }

    pub fn single(computed: ComputedDateTime) -> Self {
        Self {
            parsable: true,
            reason: None,
            time_single: Some(computed),
            time_range: None,
        }
    }

    pub fn range(start_date: ComputedDateTime, end_date: ComputedDateTime) -> Self {
        Self {
            parsable: true,
            reason: None,
            time_single: None,
            time_range: Some(ConvertedRange {
                start_date,
                end_date,
            }),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
