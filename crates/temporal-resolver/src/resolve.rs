//! Deterministic resolution of time references against a reference instant.
//!
//! Every function takes the reference instant explicitly (no system clock
//! access), so results depend only on their inputs.
//!
//! # Order of operations
//!
//! 1. `now = true` short-circuits to the "now" marker.
//! 2. The reference instant is truncated to whole seconds.
//! 3. Relative offsets: year/month as calendar offsets with carry, then
//!    day/hour/minute/second as elapsed time.
//! 4. Weekday occurrence, if any.
//! 5. Absolute overrides.
//!
//! Reversing steps 3 and 5 changes results for combined points, so the order
//! is fixed.
//!
//! # Moment or span
//!
//! A point mentioning hour, minute or second resolves to the computed
//! instant. A range endpoint without them expands to the natural span
//! boundary (day, then month, then year, then the current day). Single points
//! never expand.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{ResolverError, Result};
use crate::model::{
    AbsoluteTime, ComputedDateTime, RelativeTime, TimeConvertedPayload, TimeInputPayload,
    TimePoint, TimeRange,
};
use crate::validate::rejection_reason;
use crate::weekday::{shift_to_weekday, WeekStartDay};

/// Default cap on nested `extended_time` depth.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 8;

// ── Options ─────────────────────────────────────────────────────────────────

/// Options for resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveOptions {
    /// Which day starts the week for `offset = 0` weekday offsets.
    pub week_start: WeekStartDay,
    /// Maximum depth of nested `extended_time` objects.
    pub max_nesting_depth: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            week_start: WeekStartDay::default(),
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

/// Side of a range an endpoint sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Start,
    End,
}

// ── Reference instant ───────────────────────────────────────────────────────

/// Parse a reference instant into naive local time, truncated to seconds.
///
/// Accepts RFC 3339 (`Z` or an explicit offset; the offset is dropped and
/// the wall-clock fields kept), offset-less `YYYY-MM-DDTHH:MM[:SS[.fff]]`
/// with `T` or a space, an offset-less value with a trailing `Z`, and a bare
/// `YYYY-MM-DD` (midnight).
///
/// # Errors
///
/// Returns [`ResolverError::InvalidReference`] when no form matches.
pub fn parse_reference(s: &str) -> Result<NaiveDateTime> {
    let trimmed = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(truncate_to_seconds(dt.naive_local()));
    }

    let naive = trimmed
        .strip_suffix('Z')
        .or_else(|| trimmed.strip_suffix('z'))
        .unwrap_or(trimmed);

    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    if let Some(dt) = FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(naive, fmt).ok())
    {
        return Ok(truncate_to_seconds(dt));
    }

    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|e| ResolverError::InvalidReference(format!("'{trimmed}': {e}")))
}

fn truncate_to_seconds(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_nanosecond(0).unwrap_or(dt)
}

// ── Payload conversion ──────────────────────────────────────────────────────

/// Validate and resolve a payload against `reference`.
///
/// Unparsable payloads are not errors: they come back with
/// `parsable = false` and a reason.
///
/// # Errors
///
/// Returns [`ResolverError::InvalidDatetime`] when arithmetic produces an
/// impossible calendar value (day 32, February 30, out-of-range year).
pub fn convert_payload(
    payload: &TimeInputPayload,
    reference: NaiveDateTime,
    options: &ResolveOptions,
) -> Result<TimeConvertedPayload> {
    if let Some(reason) = rejection_reason(payload) {
        warn!("payload not parsable: {reason}");
        return Ok(TimeConvertedPayload::rejected(reason));
    }

    match (payload.time_single(), payload.time_range()) {
        (Some(single), _) => {
            let computed = resolve_single(single, reference, options)?;
            debug!("resolved single point: {computed:?}");
            Ok(TimeConvertedPayload::single(computed))
        }
        (None, Some(range)) => {
            let (start, end) = resolve_range(range, reference, options)?;
            debug!("resolved range: {start:?} .. {end:?}");
            Ok(TimeConvertedPayload::range(start, end))
        }
        (None, None) => Ok(TimeConvertedPayload::rejected(
            crate::validate::REASON_NO_INFORMATION,
        )),
    }
}

/// Resolve a single point. Never expands to a span.
///
/// # Errors
///
/// See [`compute_instant`].
pub fn resolve_single(
    point: &TimePoint,
    reference: NaiveDateTime,
    options: &ResolveOptions,
) -> Result<ComputedDateTime> {
    if point.is_now() {
        return Ok(ComputedDateTime::now());
    }
    compute_instant(point, reference, options).map(ComputedDateTime::at)
}

/// Resolve both endpoints of a range.
///
/// When both endpoints are a bare `relative day = 0` ("today" as the whole
/// range), they expand to the current day's boundaries; a bare "today" on one
/// side only anchors that side at the computed moment. Anchoring both sides
/// instead would collapse the range to the reference instant.
///
/// # Errors
///
/// See [`compute_instant`].
pub fn resolve_range(
    range: &TimeRange,
    reference: NaiveDateTime,
    options: &ResolveOptions,
) -> Result<(ComputedDateTime, ComputedDateTime)> {
    let today_span = is_moment_anchor(&range.start_date) && is_moment_anchor(&range.end_date);
    let start = expand_endpoint(
        &range.start_date,
        reference,
        Endpoint::Start,
        !today_span,
        options,
    )?;
    let end = expand_endpoint(
        &range.end_date,
        reference,
        Endpoint::End,
        !today_span,
        options,
    )?;
    Ok((start, end))
}

/// Resolve one range endpoint on its own.
///
/// With hour, minute or second present this is the computed instant;
/// otherwise the start or end boundary of the natural span. A bare
/// `relative day = 0` is treated as a moment anchor and not expanded.
///
/// # Errors
///
/// See [`compute_instant`].
pub fn resolve_endpoint(
    point: &TimePoint,
    reference: NaiveDateTime,
    endpoint: Endpoint,
    options: &ResolveOptions,
) -> Result<ComputedDateTime> {
    expand_endpoint(point, reference, endpoint, true, options)
}

fn expand_endpoint(
    point: &TimePoint,
    reference: NaiveDateTime,
    endpoint: Endpoint,
    anchor_today: bool,
    options: &ResolveOptions,
) -> Result<ComputedDateTime> {
    if point.is_now() {
        return Ok(ComputedDateTime::now());
    }

    let computed = compute_instant(point, reference, options)?;
    if point.has_time_units() || (anchor_today && is_moment_anchor(point)) {
        return Ok(ComputedDateTime::at(computed));
    }

    let (start, end) = span_bounds(point, computed)?;
    Ok(ComputedDateTime::at(match endpoint {
        Endpoint::Start => start,
        Endpoint::End => end,
    }))
}

/// A relative day of exactly 0 with no other date-level information.
fn is_moment_anchor(point: &TimePoint) -> bool {
    let relative = point.relative.unwrap_or_default();
    relative.day == Some(0)
        && point.absolute.is_none_or(|a| a.day.is_none())
        && !point.has_month()
        && !point.has_year()
        && point.weekday.is_none()
}

// ── Arithmetic ──────────────────────────────────────────────────────────────

/// Apply relative offsets, the weekday occurrence, then absolute overrides to
/// `reference` (truncated to seconds). Ignores `now`.
///
/// # Errors
///
/// Returns [`ResolverError::InvalidDatetime`] for impossible calendar values
/// or arithmetic overflow.
pub fn compute_instant(
    point: &TimePoint,
    reference: NaiveDateTime,
    options: &ResolveOptions,
) -> Result<NaiveDateTime> {
    let mut dt = truncate_to_seconds(reference);

    if let Some(relative) = &point.relative {
        dt = apply_relative(dt, relative)?;
    }
    if let Some(weekday) = &point.weekday {
        let date = shift_to_weekday(dt.date(), weekday.weekday, weekday.offset, options.week_start)?;
        dt = date.and_time(dt.time());
    }
    if let Some(absolute) = &point.absolute {
        dt = apply_absolute(dt, absolute)?;
    }

    Ok(dt)
}

fn apply_relative(dt: NaiveDateTime, relative: &RelativeTime) -> Result<NaiveDateTime> {
    let mut dt = dt;

    if relative.year.is_some() || relative.month.is_some() {
        dt = shift_calendar(
            dt,
            relative.year.unwrap_or(0),
            relative.month.unwrap_or(0),
        )?;
    }

    let elapsed: [(Option<i64>, fn(i64) -> Option<Duration>, &str); 4] = [
        (relative.day, Duration::try_days, "day"),
        (relative.hour, Duration::try_hours, "hour"),
        (relative.minute, Duration::try_minutes, "minute"),
        (relative.second, Duration::try_seconds, "second"),
    ];
    for (value, to_duration, unit) in elapsed {
        let Some(value) = value else { continue };
        dt = to_duration(value)
            .and_then(|d| dt.checked_add_signed(d))
            .ok_or_else(|| {
                ResolverError::InvalidDatetime(format!("{dt} {value:+} {unit}(s) is out of range"))
            })?;
    }

    Ok(dt)
}

/// Shift by whole years and months. Month overflow carries into the year;
/// the day is clamped to the target month's length.
fn shift_calendar(dt: NaiveDateTime, years: i64, months: i64) -> Result<NaiveDateTime> {
    let out_of_range = || {
        ResolverError::InvalidDatetime(format!(
            "{dt} shifted by {years:+} year(s) {months:+} month(s) is out of range"
        ))
    };

    let index = (dt.year() as i64)
        .checked_add(years)
        .and_then(|y| y.checked_mul(12))
        .and_then(|i| i.checked_add(dt.month0() as i64))
        .and_then(|i| i.checked_add(months))
        .ok_or_else(out_of_range)?;
    let year = i32::try_from(index.div_euclid(12)).map_err(|_| out_of_range())?;
    let month = index.rem_euclid(12) as u32 + 1;

    let day = dt.day().min(days_in_month(year, month).ok_or_else(out_of_range)?);
    NaiveDate::from_ymd_opt(year, month, day)
        .map(|date| date.and_time(dt.time()))
        .ok_or_else(out_of_range)
}

fn apply_absolute(dt: NaiveDateTime, absolute: &AbsoluteTime) -> Result<NaiveDateTime> {
    let mut date = dt.date();
    if absolute.year.is_some() || absolute.month.is_some() || absolute.day.is_some() {
        let year = match absolute.year {
            Some(y) => to_field::<i32>(y, "year")?,
            None => date.year(),
        };
        let month = match absolute.month {
            Some(m) => to_field::<u32>(m, "month")?,
            None => date.month(),
        };
        let day = match absolute.day {
            Some(d) => to_field::<u32>(d, "day")?,
            None => date.day(),
        };
        date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            ResolverError::InvalidDatetime(format!(
                "year={year} month={month} day={day} is not a calendar date"
            ))
        })?;
    }

    let mut time = dt.time();
    if absolute.hour.is_some() || absolute.minute.is_some() || absolute.second.is_some() {
        let (hour, minute, second) = if absolute.hour.is_some() || absolute.minute.is_some() {
            let hour = match absolute.hour {
                Some(h) => to_field::<u32>(h, "hour")?,
                None => time.hour(),
            };
            let minute = match (absolute.minute, absolute.hour) {
                (Some(m), _) => to_field::<u32>(m, "minute")?,
                (None, Some(_)) => 0,
                (None, None) => time.minute(),
            };
            let second = match absolute.second {
                Some(s) => to_field::<u32>(s, "second")?,
                None => 0,
            };
            (hour, minute, second)
        } else {
            let second = to_field::<u32>(absolute.second.unwrap_or(0), "second")?;
            (time.hour(), time.minute(), second)
        };
        time = NaiveTime::from_hms_opt(hour, minute, second).ok_or_else(|| {
            ResolverError::InvalidDatetime(format!(
                "hour={hour} minute={minute} second={second} is not a time of day"
            ))
        })?;
    }

    Ok(date.and_time(time))
}

fn to_field<T: TryFrom<i64>>(value: i64, name: &str) -> Result<T> {
    T::try_from(value)
        .map_err(|_| ResolverError::InvalidDatetime(format!("{name}={value} is out of range")))
}

// ── Span boundaries ─────────────────────────────────────────────────────────

/// Start and end of the natural span around `dt` for a date-only point.
fn span_bounds(point: &TimePoint, dt: NaiveDateTime) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let date = dt.date();
    let (first, last) = if point.has_day() {
        (date, date)
    } else if point.has_month() {
        let first = date.with_day(1).ok_or_else(|| bound_error(dt))?;
        let last = last_day_of_month(date.year(), date.month()).ok_or_else(|| bound_error(dt))?;
        (first, last)
    } else if point.has_year() {
        let first = NaiveDate::from_ymd_opt(date.year(), 1, 1).ok_or_else(|| bound_error(dt))?;
        let last = NaiveDate::from_ymd_opt(date.year(), 12, 31).ok_or_else(|| bound_error(dt))?;
        (first, last)
    } else {
        (date, date)
    };
    Ok((start_of_day(first), end_of_day(last).ok_or_else(|| bound_error(dt))?))
}

fn bound_error(dt: NaiveDateTime) -> ResolverError {
    ResolverError::InvalidDatetime(format!("no span boundary around {dt}"))
}

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn end_of_day(date: NaiveDate) -> Option<NaiveDateTime> {
    date.and_hms_milli_opt(23, 59, 59, 999)
}

/// First of the following month minus one day.
fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (y, m) = if month == 12 {
        (year.checked_add(1)?, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1)?.pred_opt()
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    last_day_of_month(year, month).map(|d| d.day())
}

// ── Tests ───────────────────────────────────────────────────────────────────
