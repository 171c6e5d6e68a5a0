//! Date normalization and time bucket keys.
//!
//! All arithmetic runs on [`NaiveDate`], so bucket keys never drift with the
//! local timezone of the machine producing the report.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Strips a time-of-day component (`T...` or a space-separated suffix).
///
/// Does not validate the remaining text; an empty input yields an empty string.
pub fn normalize_date(raw: &str) -> &str {
    let date = raw.split('T').next().unwrap_or(raw);
    date.split(' ').next().unwrap_or(date)
}

/// Parses a normalized `YYYY-MM-DD` date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let date = normalize_date(raw);
    if date.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(date, DATE_FORMAT).ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_monday();
    date.checked_sub_days(Days::new(u64::from(offset)))
        .unwrap_or(date)
}

/// Week start key for a raw date string, `None` when it does not parse.
pub fn week_start_key(raw: &str) -> Option<String> {
    parse_date(raw).map(|date| format_date(week_start(date)))
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Last day of the calendar month containing `date`.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };

    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// Time grouping used for chronological aggregates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    #[default]
    Week,
    Month,
}

impl Granularity {
    /// Bucket start date for `date` at this granularity.
    pub fn bucket(self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Day => date,
            Granularity::Week => week_start(date),
            Granularity::Month => month_start(date),
        }
    }

    /// Bucket key for a raw date string, `None` when the date does not parse.
    pub fn bucket_key(self, raw: &str) -> Option<String> {
        parse_date(raw).map(|date| format_date(self.bucket(date)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_time_suffixes() {
        assert_eq!(normalize_date("2024-11-05T18:30:00Z"), "2024-11-05");
        assert_eq!(normalize_date("2024-11-05 18:30:00"), "2024-11-05");
        assert_eq!(normalize_date("2024-11-05"), "2024-11-05");
        assert_eq!(normalize_date(""), "");
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date("2024-02-30"), None);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("2024-02-29T10:00:00"), Some(ymd(2024, 2, 29)));
    }

    #[test]
    fn test_week_start_is_monday() {
        // 2024-11-07 is a Thursday
        assert_eq!(week_start(ymd(2024, 11, 7)), ymd(2024, 11, 4));
        // Sunday belongs to the week that started six days earlier
        assert_eq!(week_start(ymd(2024, 11, 10)), ymd(2024, 11, 4));
        assert_eq!(week_start(ymd(2024, 11, 4)), ymd(2024, 11, 4));
        // Crosses a year boundary
        assert_eq!(week_start(ymd(2025, 1, 1)), ymd(2024, 12, 30));
    }

    #[test]
    fn test_week_start_is_idempotent() {
        let mut date = ymd(2023, 12, 20);
        for _ in 0..60 {
            let once = week_start(date);
            assert_eq!(week_start(once), once);
            date = date.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_week_start_key() {
        assert_eq!(week_start_key("2024-11-07 09:00"), Some("2024-11-04".to_string()));
        assert_eq!(week_start_key("garbage"), None);
    }

    #[test]
    fn test_month_bounds() {
        assert_eq!(month_start(ymd(2024, 2, 17)), ymd(2024, 2, 1));
        assert_eq!(month_end(ymd(2024, 2, 17)), ymd(2024, 2, 29));
        assert_eq!(month_end(ymd(2023, 2, 1)), ymd(2023, 2, 28));
        assert_eq!(month_end(ymd(2024, 12, 5)), ymd(2024, 12, 31));
    }

    #[test]
    fn test_bucket_keys_by_granularity() {
        let raw = "2024-11-07T12:00:00";
        assert_eq!(Granularity::Day.bucket_key(raw).as_deref(), Some("2024-11-07"));
        assert_eq!(Granularity::Week.bucket_key(raw).as_deref(), Some("2024-11-04"));
        assert_eq!(Granularity::Month.bucket_key(raw).as_deref(), Some("2024-11-01"));
        assert_eq!(Granularity::Month.bucket_key(""), None);
    }

    // Helper functions for tests
    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }
}
