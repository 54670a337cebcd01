//! Calendar-only dates and the symbolic ranges used to filter lists.
//!
//! Dates are kept free of any time zone: they are stored and compared as
//! `YYYY-MM-DD` strings, so string order equals calendar order. Every range is
//! half-open (`start <= date < end`).

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::TypeConstraintError;

/// Keyword selecting caller-supplied bounds instead of a symbolic range.
pub const CUSTOM_RANGE: &str = "custom";

/// Number of trailing days counted as "recent" by the stats query.
pub const RECENT_WINDOW_DAYS: i64 = 30;

const ISO_FORMAT: &str = "%Y-%m-%d";

/// A day on the proleptic Gregorian calendar with a four digit year.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    /// Parses `YYYY-MM-DD`, an RFC 3339 timestamp (its UTC day) or `DD-MM-YYYY`.
    pub fn parse(value: &str, field: &'static str) -> Result<Self, TypeConstraintError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(TypeConstraintError::EmptyString(field));
        }

        let date = NaiveDate::parse_from_str(value, ISO_FORMAT)
            .ok()
            .or_else(|| {
                DateTime::parse_from_rfc3339(value)
                    .ok()
                    .map(|instant| instant.with_timezone(&Utc).date_naive())
            })
            .or_else(|| {
                NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|instant| instant.date())
            })
            .or_else(|| NaiveDate::parse_from_str(value, "%d-%m-%Y").ok())
            .ok_or(TypeConstraintError::InvalidDate(field))?;

        Self::from_naive(date).ok_or(TypeConstraintError::InvalidDate(field))
    }

    /// Wraps a [`NaiveDate`], rejecting years that do not have four digits.
    pub fn from_naive(date: NaiveDate) -> Option<Self> {
        (1000..=9999).contains(&date.year()).then_some(Self(date))
    }

    /// The current UTC calendar day.
    pub fn today() -> Self {
        Self(Utc::now().date_naive())
    }

    /// Adds (or, when negative, subtracts) whole calendar days.
    ///
    /// Saturates at the edges of the representable range.
    pub fn add_days(self, days: i64) -> Self {
        self.0
            .checked_add_signed(TimeDelta::days(days))
            .map(Self)
            .unwrap_or(self)
    }

    pub fn start_of_month(self) -> Self {
        self.add_days(-i64::from(self.0.day0()))
    }

    pub fn start_of_next_month(self) -> Self {
        // The 1st plus 32 days always lands in the following month.
        self.start_of_month().add_days(32).start_of_month()
    }

    pub fn start_of_previous_month(self) -> Self {
        self.start_of_month().add_days(-1).start_of_month()
    }
}

impl Display for CalendarDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(ISO_FORMAT))
    }
}

impl TryFrom<String> for CalendarDate {
    type Error = TypeConstraintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value, "date")
    }
}

impl From<CalendarDate> for String {
    fn from(value: CalendarDate) -> Self {
        value.to_string()
    }
}

/// Half-open interval `[start, end)` of calendar days.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DateInterval {
    pub start: CalendarDate,
    pub end: CalendarDate,
}

impl DateInterval {
    pub fn new(start: CalendarDate, end: CalendarDate) -> Self {
        Self { start, end }
    }

    /// The trailing `days` days up to and including `today`.
    pub fn trailing(today: CalendarDate, days: i64) -> Self {
        Self::new(today.add_days(-days), today.add_days(1))
    }

    pub fn contains(&self, date: CalendarDate) -> bool {
        self.start <= date && date < self.end
    }
}

/// Symbolic date ranges understood by list filters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateRange {
    Today,
    Yesterday,
    Last7Days,
    Last30Days,
    ThisMonth,
    LastMonth,
}

impl DateRange {
    /// Recognizes a range keyword; unknown keywords yield `None`.
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword.trim().to_ascii_lowercase().as_str() {
            "today" => Some(Self::Today),
            "yesterday" => Some(Self::Yesterday),
            "last7days" => Some(Self::Last7Days),
            "last30days" => Some(Self::Last30Days),
            "thismonth" => Some(Self::ThisMonth),
            "lastmonth" => Some(Self::LastMonth),
            _ => None,
        }
    }

    /// Resolves the range relative to `today`.
    ///
    /// The `last*days` ranges stop before `today`.
    pub fn interval(self, today: CalendarDate) -> DateInterval {
        match self {
            Self::Today => DateInterval::new(today, today.add_days(1)),
            Self::Yesterday => DateInterval::new(today.add_days(-1), today),
            Self::Last7Days => DateInterval::new(today.add_days(-7), today),
            Self::Last30Days => DateInterval::new(today.add_days(-30), today),
            Self::ThisMonth => {
                DateInterval::new(today.start_of_month(), today.start_of_next_month())
            }
            Self::LastMonth => {
                DateInterval::new(today.start_of_previous_month(), today.start_of_month())
            }
        }
    }
}

/// Maps a keyword to its interval, or `None` when no date filter applies.
pub fn normalize(keyword: &str, today: CalendarDate) -> Option<DateInterval> {
    DateRange::parse(keyword).map(|range| range.interval(today))
}

/// Resolves a list filter: a symbolic keyword, or `custom` with both bounds.
///
/// Anything else (including `custom` with a missing bound) disables the date
/// filter. Explicit bounds must be valid dates.
pub fn resolve_filter(
    keyword: Option<&str>,
    start: Option<&str>,
    end: Option<&str>,
    today: CalendarDate,
) -> Result<Option<DateInterval>, TypeConstraintError> {
    let Some(keyword) = keyword else {
        return Ok(None);
    };

    if keyword.trim().eq_ignore_ascii_case(CUSTOM_RANGE) {
        let start = start.map(str::trim).filter(|value| !value.is_empty());
        let end = end.map(str::trim).filter(|value| !value.is_empty());
        return match (start, end) {
            (Some(start), Some(end)) => Ok(Some(DateInterval::new(
                CalendarDate::parse(start, "start")?,
                CalendarDate::parse(end, "end")?,
            ))),
            _ => Ok(None),
        };
    }

    Ok(normalize(keyword, today))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(value: &str) -> CalendarDate {
        CalendarDate::parse(value, "date").unwrap()
    }

    fn interval(keyword: &str, today: &str) -> (String, String) {
        let range = normalize(keyword, date(today)).unwrap();
        (range.start.to_string(), range.end.to_string())
    }

    #[test]
    fn offset_timestamps_resolve_to_their_utc_day() {
        assert_eq!(date("2025-09-15T00:00:00+05:30").to_string(), "2025-09-14");
        assert_eq!(date("2025-09-15T23:30:00-02:00").to_string(), "2025-09-16");
        assert_eq!(date("2025-09-15T12:00:00Z").to_string(), "2025-09-15");
    }

    #[test]
    fn last7days_excludes_today() {
        assert_eq!(
            interval("last7days", "2025-09-15"),
            ("2025-09-08".to_string(), "2025-09-15".to_string())
        );
    }

    #[test]
    fn thismonth_spans_the_calendar_month() {
        assert_eq!(
            interval("thismonth", "2025-09-15"),
            ("2025-09-01".to_string(), "2025-10-01".to_string())
        );
    }

    #[test]
    fn today_and_yesterday_are_single_days() {
        assert_eq!(
            interval("today", "2025-09-15"),
            ("2025-09-15".to_string(), "2025-09-16".to_string())
        );
        assert_eq!(
            interval("yesterday", "2025-09-15"),
            ("2025-09-14".to_string(), "2025-09-15".to_string())
        );
    }

    #[test]
    fn last30days_starts_thirty_days_back() {
        assert_eq!(
            interval("last30days", "2025-03-01"),
            ("2025-01-30".to_string(), "2025-03-01".to_string())
        );
    }

    #[test]
    fn lastmonth_crosses_year_boundary() {
        assert_eq!(
            interval("lastmonth", "2025-01-20"),
            ("2024-12-01".to_string(), "2025-01-01".to_string())
        );
    }

    #[test]
    fn thismonth_handles_december_and_leap_february() {
        assert_eq!(
            interval("thismonth", "2025-12-31"),
            ("2025-12-01".to_string(), "2026-01-01".to_string())
        );
        assert_eq!(
            interval("thismonth", "2024-02-29"),
            ("2024-02-01".to_string(), "2024-03-01".to_string())
        );
    }

    #[test]
    fn every_keyword_yields_non_empty_interval() {
        let today = date("2024-03-31");
        for keyword in [
            "today",
            "yesterday",
            "last7days",
            "last30days",
            "thismonth",
            "lastmonth",
        ] {
            let range = normalize(keyword, today).unwrap();
            assert!(range.start < range.end, "{keyword} produced an empty range");
            assert_eq!(range.start.to_string().len(), 10);
            assert_eq!(range.end.to_string().len(), 10);
        }
    }

    #[test]
    fn unknown_keyword_disables_filter() {
        assert_eq!(normalize("alltime", date("2025-09-15")), None);
        assert_eq!(normalize("", date("2025-09-15")), None);
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(DateRange::parse(" ThisMonth "), Some(DateRange::ThisMonth));
    }

    #[test]
    fn parses_supported_input_formats() {
        assert_eq!(date("2025-09-15").to_string(), "2025-09-15");
        assert_eq!(date("15-09-2025").to_string(), "2025-09-15");
        assert_eq!(date("2025-09-15T23:30:00-02:00").to_string(), "2025-09-16");
        assert_eq!(date("2025-09-15T08:00:00.000Z").to_string(), "2025-09-15");
    }

    #[test]
    fn rejects_invalid_dates() {
        assert_eq!(
            CalendarDate::parse("2025-02-30", "notice date").unwrap_err(),
            TypeConstraintError::InvalidDate("notice date")
        );
        assert_eq!(
            CalendarDate::parse("", "notice date").unwrap_err(),
            TypeConstraintError::EmptyString("notice date")
        );
    }

    #[test]
    fn trailing_window_includes_today() {
        let today = date("2025-09-15");
        let window = DateInterval::trailing(today, RECENT_WINDOW_DAYS);
        assert!(window.contains(today));
        assert!(window.contains(date("2025-08-16")));
        assert!(!window.contains(date("2025-08-15")));
        assert!(!window.contains(date("2025-09-16")));
    }

    #[test]
    fn custom_filter_requires_both_bounds() {
        let today = date("2025-09-15");
        assert_eq!(
            resolve_filter(Some("custom"), Some("2025-01-01"), None, today).unwrap(),
            None
        );
        let range = resolve_filter(Some("custom"), Some("2025-01-01"), Some("2025-02-01"), today)
            .unwrap()
            .unwrap();
        assert_eq!(range.start.to_string(), "2025-01-01");
        assert_eq!(range.end.to_string(), "2025-02-01");
    }

    #[test]
    fn custom_filter_reports_bad_bound() {
        let today = date("2025-09-15");
        assert_eq!(
            resolve_filter(Some("custom"), Some("soon"), Some("2025-02-01"), today).unwrap_err(),
            TypeConstraintError::InvalidDate("start")
        );
    }

    #[test]
    fn absent_keyword_disables_filter() {
        assert_eq!(
            resolve_filter(None, Some("2025-01-01"), Some("2025-02-01"), date("2025-09-15"))
                .unwrap(),
            None
        );
    }
}
