//! Weekday occurrence arithmetic.
//!
//! A [`WeekdayOffset`](crate::model::WeekdayOffset) names a weekday and an
//! occurrence offset. Offset `0` is "this <weekday>" (same week, past or
//! future), a positive offset `n` is the n-th occurrence strictly after the
//! date, a negative offset `-n` the n-th occurrence strictly before it.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{ResolverError, Result};

/// Which day begins a week for `offset = 0` ("this Friday").
///
/// Does **not** affect non-zero offsets, which always count occurrences
/// strictly after or before the date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStartDay {
    /// ISO 8601 standard (Monday = day 0 of the week).
    #[default]
    Monday,
    /// US/Canada convention (Sunday = day 0 of the week).
    Sunday,
}

/// How many days `weekday` is from the week-start day.
fn days_from_week_start(weekday: Weekday, week_start: WeekStartDay) -> i64 {
    match week_start {
        WeekStartDay::Monday => weekday.num_days_from_monday() as i64,
        WeekStartDay::Sunday => weekday.num_days_from_sunday() as i64,
    }
}

/// Move `date` to the `offset`-th occurrence of `weekday`.
///
/// # Errors
///
/// Returns [`ResolverError::InvalidDatetime`] if the result falls outside the
/// representable calendar range.
pub fn shift_to_weekday(
    date: NaiveDate,
    weekday: Weekday,
    offset: i64,
    week_start: WeekStartDay,
) -> Result<NaiveDate> {
    let current = date.weekday();

    // Day shift from `date`; `None` on overflow.
    let days = if offset == 0 {
        let target = days_from_week_start(weekday, week_start);
        Some(target - days_from_week_start(current, week_start))
    } else if offset > 0 {
        let ahead = (weekday.num_days_from_monday() as i64
            - current.num_days_from_monday() as i64
            + 7)
            % 7;
        let ahead = if ahead == 0 { 7 } else { ahead };
        (offset - 1).checked_mul(7).and_then(|w| w.checked_add(ahead))
    } else {
        let back = (current.num_days_from_monday() as i64
            - weekday.num_days_from_monday() as i64
            + 7)
            % 7;
        let back = if back == 0 { 7 } else { back };
        (offset + 1).checked_mul(7).and_then(|w| w.checked_sub(back))
    };

    days
        .and_then(Duration::try_days)
        .and_then(|d| date.checked_add_signed(d))
        .ok_or_else(|| {
            ResolverError::InvalidDatetime(format!(
                "{} occurrence {offset} from {date} is out of range",
                weekday_name(weekday)
            ))
        })
}

/// Parse a weekday name or common abbreviation, case-insensitively.
pub fn parse_weekday(s: &str) -> Option<Weekday> {
    match s.trim().to_lowercase().as_str() {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" | "thurs" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Lowercase English name used on the wire.
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// Serde adapter for [`Weekday`] as a lowercase full name.
pub(crate) mod serde_weekday {
    use chrono::Weekday;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(weekday: &Weekday, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(super::weekday_name(*weekday))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Weekday, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_weekday(&raw)
            .ok_or_else(|| de::Error::custom(format!("unknown weekday '{raw}'")))
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn wednesday() -> NaiveDate {
        // Wednesday, February 18, 2026
        NaiveDate::from_ymd_opt(2026, 2, 18).unwrap()
    }

    fn shift(weekday: Weekday, offset: i64) -> NaiveDate {
        shift_to_weekday(wednesday(), weekday, offset, WeekStartDay::Monday).unwrap()
    }

    #[test]
    fn test_next_monday_from_wednesday() {
        assert_eq!(shift(Weekday::Mon, 1), NaiveDate::from_ymd_opt(2026, 2, 23).unwrap());
    }

    #[test]
    fn test_next_same_weekday_skips_a_week() {
        assert_eq!(shift(Weekday::Wed, 1), NaiveDate::from_ymd_opt(2026, 2, 25).unwrap());
    }

    #[test]
    fn test_monday_after_next() {
        assert_eq!(shift(Weekday::Mon, 2), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
    }

    #[test]
    fn test_last_tuesday_from_wednesday() {
        assert_eq!(shift(Weekday::Tue, -1), NaiveDate::from_ymd_opt(2026, 2, 17).unwrap());
    }

    #[test]
    fn test_last_same_weekday_goes_back_a_week() {
        assert_eq!(shift(Weekday::Wed, -1), NaiveDate::from_ymd_opt(2026, 2, 11).unwrap());
    }

    #[test]
    fn test_two_fridays_ago() {
        assert_eq!(shift(Weekday::Fri, -2), NaiveDate::from_ymd_opt(2026, 2, 6).unwrap());
    }

    #[test]
    fn test_this_weekday_same_week_monday_start() {
        assert_eq!(shift(Weekday::Mon, 0), NaiveDate::from_ymd_opt(2026, 2, 16).unwrap());
        assert_eq!(shift(Weekday::Sun, 0), NaiveDate::from_ymd_opt(2026, 2, 22).unwrap());
        assert_eq!(shift(Weekday::Wed, 0), wednesday());
    }

    #[test]
    fn test_this_sunday_with_sunday_week_start() {
        let date = shift_to_weekday(wednesday(), Weekday::Sun, 0, WeekStartDay::Sunday).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 2, 15).unwrap());
    }

    #[test]
    fn test_parse_weekday_names() {
        assert_eq!(parse_weekday("Monday"), Some(Weekday::Mon));
        assert_eq!(parse_weekday(" thurs "), Some(Weekday::Thu));
        assert_eq!(parse_weekday("SUN"), Some(Weekday::Sun));
        assert_eq!(parse_weekday("someday"), None);
    }

    #[test]
    fn test_weekday_name_is_parseable() {
        for wd in [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ] {
            assert_eq!(parse_weekday(weekday_name(wd)), Some(wd));
        }
    }

    #[test]
    fn test_huge_offset_is_error() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 18).unwrap();
        for offset in [i64::MAX, i64::MIN, i64::MAX / 7, i64::MIN / 7] {
            let result = shift_to_weekday(date, Weekday::Fri, offset, WeekStartDay::Monday);
            let err = result.unwrap_err().to_string();
            assert!(err.contains("Invalid datetime"), "offset {offset}, got: {err}");
        }
    }

    #[test]
    fn test_out_of_range_is_error() {
        let result = shift_to_weekday(NaiveDate::MAX, Weekday::Mon, 1, WeekStartDay::Monday);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Invalid datetime"), "got: {err}");
    }
}
