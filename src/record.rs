//! Attendance records and the loaded dataset.
//!
//! Source payloads come from spreadsheets and warehouse exports, so numeric
//! columns may arrive as numbers, numeric strings, floats, empty strings or
//! nulls. Deserialization is lenient: anything that does not yield an integer
//! is treated as absent and counts as zero.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::analyzers::dates::parse_date;

/// Facility identifier used for online / virtual classes.
///
/// Records carry an empty `facility` string for sessions that do not take
/// place at a physical location. Compare against this constant (or use
/// [`Record::is_virtual`]) instead of testing for an empty string.
pub const VIRTUAL_FACILITY: &str = "";

/// One class/session occurrence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub class_date: String,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub facility: String,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub instructor_name: String,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub class_name: String,
    #[serde(default, deserialize_with = "de::optional_string")]
    pub session_guid: Option<String>,
    /// Customer identifier attached to the row by the warehouse export.
    #[serde(default, deserialize_with = "de::optional_string")]
    pub guid: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_count")]
    pub total_attendees: Option<u64>,
    #[serde(default, deserialize_with = "de::lenient_count")]
    pub total_bookings: Option<u64>,
    #[serde(default, deserialize_with = "de::optional_string")]
    pub greatgrandparent_category: Option<String>,
    #[serde(default, deserialize_with = "de::optional_string")]
    pub grandparent_category: Option<String>,
    #[serde(default, deserialize_with = "de::optional_string")]
    pub parent_category: Option<String>,
}

impl Record {
    pub fn attendees(&self) -> u64 {
        self.total_attendees.unwrap_or(0)
    }

    pub fn bookings(&self) -> u64 {
        self.total_bookings.unwrap_or(0)
    }

    /// Calendar date of the session, if `class_date` parses.
    pub fn date(&self) -> Option<NaiveDate> {
        parse_date(&self.class_date)
    }

    pub fn is_virtual(&self) -> bool {
        self.facility == VIRTUAL_FACILITY
    }

    /// Instructor name when it contains anything besides whitespace.
    pub fn instructor(&self) -> Option<&str> {
        non_blank(&self.instructor_name)
    }

    /// Class name when it contains anything besides whitespace.
    pub fn class(&self) -> Option<&str> {
        non_blank(&self.class_name)
    }

    pub fn great_grandparent(&self) -> Option<&str> {
        self.greatgrandparent_category.as_deref()
    }
}

fn non_blank(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// The full record collection for a session, read-only after load.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    /// Builds a dataset, dropping repeated `session_guid` rows.
    pub fn from_records(records: Vec<Record>) -> Self {
        let before = records.len();
        let records = dedupe_sessions(records);
        debug!(
            loaded = before,
            kept = records.len(),
            dropped = before - records.len(),
            "Deduplicated records by session_guid"
        );
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Borrowed view over every record, in load order.
    pub fn view(&self) -> Vec<&Record> {
        self.records.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Keeps the first record for each `session_guid`.
///
/// Warehouse exports repeat a session once per joined row, which inflates
/// attendance when summed. Records without a guid cannot be matched and are
/// all kept.
pub fn dedupe_sessions(records: Vec<Record>) -> Vec<Record> {
    let mut seen: HashSet<String> = HashSet::new();

    records
        .into_iter()
        .filter(|record| match &record.session_guid {
            Some(guid) => seen.insert(guid.clone()),
            None => true,
        })
        .collect()
}

mod de {
    use serde::Deserializer;
    use serde::de::{self, Visitor};
    use std::fmt;

    /// Deserializes a count the way a spreadsheet user expects it to read.
    pub fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(CountVisitor)
    }

    pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(TextVisitor)
    }

    /// Like [`lenient_string`] but blank values become `None`.
    pub fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = deserializer.deserialize_any(TextVisitor)?;
        if value.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(value))
        }
    }

    /// Reads the leading integer of `s`, skipping leading whitespace.
    /// `"12"`, `"12.7"` and `"12 people"` all read as 12.
    pub(super) fn leading_count(s: &str) -> Option<u64> {
        let s = s.trim_start();
        let (negative, digits) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };

        let end = digits
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(digits.len());
        if end == 0 {
            return None;
        }
        if negative {
            return Some(0);
        }

        digits[..end].parse().ok()
    }

    struct CountVisitor;

    impl<'de> Visitor<'de> for CountVisitor {
        type Value = Option<u64>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a count as a number or numeric string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.max(0) as u64))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            if v.is_finite() {
                Ok(Some(v.trunc().max(0.0) as u64))
            } else {
                Ok(None)
            }
        }

        fn visit_bool<E: de::Error>(self, _v: bool) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(leading_count(v))
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(CountVisitor)
        }
    }

    struct TextVisitor;

    impl<'de> Visitor<'de> for TextVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string or scalar value")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.to_owned())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
            Ok(v.to_string())
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(String::new())
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(String::new())
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(TextVisitor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_counts_from_json() {
        let json = r#"[
            {"class_date": "2024-11-01", "total_attendees": 7, "total_bookings": "9"},
            {"class_date": "2024-11-02", "total_attendees": "12.0", "total_bookings": 4.9},
            {"class_date": "2024-11-03", "total_attendees": "", "total_bookings": null},
            {"class_date": "2024-11-04", "total_attendees": "-2"}
        ]"#;
        let records: Vec<Record> = serde_json::from_str(json).unwrap();

        assert_eq!(records[0].total_attendees, Some(7));
        assert_eq!(records[0].total_bookings, Some(9));
        assert_eq!(records[1].total_attendees, Some(12));
        assert_eq!(records[1].total_bookings, Some(4));
        assert_eq!(records[2].total_attendees, None);
        assert_eq!(records[2].bookings(), 0);
        assert_eq!(records[3].attendees(), 0);
        assert_eq!(records[3].total_bookings, None);
    }

    #[test]
    fn test_missing_fields_default() {
        let records: Vec<Record> = serde_json::from_str(r#"[{}]"#).unwrap();
        let record = &records[0];

        assert_eq!(record.class_date, "");
        assert!(record.is_virtual());
        assert_eq!(record.session_guid, None);
        assert_eq!(record.attendees(), 0);
        assert_eq!(record.date(), None);
    }

    #[test]
    fn test_blank_categories_are_absent() {
        let json = r#"[{"greatgrandparent_category": "", "parent_category": "  ", "grandparent_category": "Climbing"}]"#;
        let records: Vec<Record> = serde_json::from_str(json).unwrap();

        assert_eq!(records[0].greatgrandparent_category, None);
        assert_eq!(records[0].parent_category, None);
        assert_eq!(records[0].grandparent_category.as_deref(), Some("Climbing"));
    }

    #[test]
    fn test_numeric_text_fields_become_strings() {
        let json = r#"[{"facility": 12, "session_guid": 991}]"#;
        let records: Vec<Record> = serde_json::from_str(json).unwrap();

        assert_eq!(records[0].facility, "12");
        assert_eq!(records[0].session_guid.as_deref(), Some("991"));
    }

    #[test]
    fn test_leading_count() {
        assert_eq!(de::leading_count("42"), Some(42));
        assert_eq!(de::leading_count("  8 people"), Some(8));
        assert_eq!(de::leading_count("3.9"), Some(3));
        assert_eq!(de::leading_count("-5"), Some(0));
        assert_eq!(de::leading_count("abc"), None);
        assert_eq!(de::leading_count(""), None);
    }

    #[test]
    fn test_dedupe_keeps_first_session_and_guidless_rows() {
        let records = vec![
            session("s1", 5),
            session("s1", 9),
            Record {
                total_attendees: Some(2),
                ..Default::default()
            },
            Record {
                total_attendees: Some(3),
                ..Default::default()
            },
            session("s2", 4),
        ];

        let dataset = Dataset::from_records(records);

        assert_eq!(dataset.len(), 4);
        let attendees: Vec<u64> = dataset.records().iter().map(Record::attendees).collect();
        assert_eq!(attendees, vec![5, 2, 3, 4]);
    }

    #[test]
    fn test_blank_instructor_is_none() {
        let record = Record {
            instructor_name: "   ".to_string(),
            class_name: "Yoga Flow".to_string(),
            ..Default::default()
        };

        assert_eq!(record.instructor(), None);
        assert_eq!(record.class(), Some("Yoga Flow"));
    }

    // Helper functions for tests
    fn session(guid: &str, attendees: u64) -> Record {
        Record {
            session_guid: Some(guid.to_string()),
            total_attendees: Some(attendees),
            ..Default::default()
        }
    }
}
