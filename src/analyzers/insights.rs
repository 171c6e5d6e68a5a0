//! Short plain-language statements about a filtered view.

use serde::Serialize;
use std::collections::HashSet;

use crate::analyzers::categories::top_category;
use crate::analyzers::rank::low_performing_instructors;
use crate::analyzers::types::CategoryShare;
use crate::analyzers::utility::{format_count, pct, saturating_total};
use crate::config::EngineSettings;
use crate::record::Record;

/// Counts the insight lines are phrased from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InsightStats {
    pub total_classes: usize,
    pub category_count: usize,
    /// Distinct non-empty `guid` values; rows without a guid are not counted.
    pub unique_customers: usize,
    /// Distinct facilities, the virtual one included.
    pub active_facilities: usize,
    pub total_attendees: u64,
    pub total_bookings: u64,
    pub show_rate: f64,
    pub top_category: Option<CategoryShare>,
    pub low_instructor_count: usize,
    /// Records with a non-zero attendance value and a non-empty date.
    pub complete_records: usize,
}

impl InsightStats {
    pub fn from_records(records: &[&Record], low_instructor_threshold: f64) -> Self {
        let total_attendees = saturating_total(records.iter().map(|r| r.attendees()));
        let total_bookings = saturating_total(records.iter().map(|r| r.bookings()));

        let category_count = records
            .iter()
            .filter_map(|r| r.great_grandparent())
            .collect::<HashSet<_>>()
            .len();
        let unique_customers = records
            .iter()
            .filter_map(|r| r.guid.as_deref())
            .collect::<HashSet<_>>()
            .len();
        let active_facilities = records
            .iter()
            .map(|r| r.facility.as_str())
            .collect::<HashSet<_>>()
            .len();
        let complete_records = records
            .iter()
            .filter(|r| {
                r.total_attendees.is_some_and(|n| n > 0) && !r.class_date.trim().is_empty()
            })
            .count();

        Self {
            total_classes: records.len(),
            category_count,
            unique_customers,
            active_facilities,
            total_attendees,
            total_bookings,
            show_rate: pct(total_attendees as f64, total_bookings as f64),
            top_category: top_category(records),
            low_instructor_count: low_performing_instructors(records, low_instructor_threshold)
                .len(),
            complete_records,
        }
    }
}

/// Insight lines in display order. The top category line is left out when
/// no record carries a category.
pub fn summarize_insights(records: &[&Record], settings: &EngineSettings) -> Vec<String> {
    let threshold = settings.low_instructor_threshold;
    let stats = InsightStats::from_records(records, threshold);

    let mut lines = vec![
        format!(
            "Analyzing {} classes across {} great grandparent categories",
            format_count(stats.total_classes as u64),
            stats.category_count
        ),
        format!(
            "{} unique customers participated",
            format_count(stats.unique_customers as u64)
        ),
        format!("{} facilities are active", stats.active_facilities),
        format!(
            "Show rate: {:.1}% ({} attended vs {} booked)",
            stats.show_rate,
            format_count(stats.total_attendees),
            format_count(stats.total_bookings)
        ),
    ];

    if let Some(top) = &stats.top_category {
        lines.push(format!(
            "Top category: {} with {} total attendees",
            top.category,
            format_count(top.participants)
        ));
    }

    lines.push(match stats.low_instructor_count {
        0 => format!("No instructors averaging ≤{threshold} attendees per class"),
        n => format!("{n} instructors averaging ≤{threshold} attendees per class"),
    });

    lines.push(format!(
        "Data completeness: {}/{} records have complete data",
        stats.complete_records, stats.total_classes
    ));

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insight_stats() {
        let records = sample_records();
        let view: Vec<&Record> = records.iter().collect();

        let stats = InsightStats::from_records(&view, 4.0);

        assert_eq!(stats.total_classes, 5);
        assert_eq!(stats.category_count, 2);
        assert_eq!(stats.unique_customers, 3);
        assert_eq!(stats.active_facilities, 3);
        assert_eq!(stats.total_attendees, 2450);
        assert_eq!(stats.total_bookings, 2500);
        assert!((stats.show_rate - 98.0).abs() < 1e-9);
        assert_eq!(stats.low_instructor_count, 1);
        assert_eq!(stats.complete_records, 3);
    }

    #[test]
    fn test_summary_lines_in_order() {
        let records = sample_records();
        let view: Vec<&Record> = records.iter().collect();

        let lines = summarize_insights(&view, &EngineSettings::default());

        assert_eq!(
            lines,
            vec![
                "Analyzing 5 classes across 2 great grandparent categories",
                "3 unique customers participated",
                "3 facilities are active",
                "Show rate: 98.0% (2,450 attended vs 2,500 booked)",
                "Top category: Climbing with 2,446 total attendees",
                "1 instructors averaging ≤4 attendees per class",
                "Data completeness: 3/5 records have complete data",
            ]
        );
    }

    #[test]
    fn test_zero_attendance_is_incomplete() {
        let records = vec![
            record("2024-11-01", "SLC", "Ana", Some("c1"), None, Some(0), 2),
            record("2024-11-02", "SLC", "Ana", None, None, Some(3), 3),
            record("2024-11-03", "SLC", "Ana", None, None, None, 1),
            record("", "SLC", "Ana", Some("c1"), None, Some(5), 5),
        ];
        let view: Vec<&Record> = records.iter().collect();

        let stats = InsightStats::from_records(&view, 4.0);

        assert_eq!(stats.complete_records, 1);
        assert_eq!(stats.unique_customers, 1);
    }

    #[test]
    fn test_summary_on_empty_view() {
        let lines = summarize_insights(&[], &EngineSettings::default());

        assert_eq!(lines.len(), 6);
        assert_eq!(lines[3], "Show rate: 0.0% (0 attended vs 0 booked)");
        assert_eq!(lines[4], "No instructors averaging ≤4 attendees per class");
        assert_eq!(lines[5], "Data completeness: 0/0 records have complete data");
    }

    #[test]
    fn test_threshold_follows_settings() {
        let records = sample_records();
        let view: Vec<&Record> = records.iter().collect();
        let settings = EngineSettings {
            low_instructor_threshold: 2.5,
            ..Default::default()
        };

        let lines = summarize_insights(&view, &settings);
        assert!(lines.contains(&"No instructors averaging ≤2.5 attendees per class".to_string()));
    }

    // Helper functions for tests
    fn record(
        date: &str,
        facility: &str,
        instructor: &str,
        guid: Option<&str>,
        category: Option<&str>,
        attendees: Option<u64>,
        bookings: u64,
    ) -> Record {
        Record {
            class_date: date.to_string(),
            facility: facility.to_string(),
            instructor_name: instructor.to_string(),
            guid: guid.map(str::to_string),
            greatgrandparent_category: category.map(str::to_string),
            total_attendees: attendees,
            total_bookings: Some(bookings),
            ..Default::default()
        }
    }

    fn sample_records() -> Vec<Record> {
        vec![
            record("2024-11-01", "SLC", "Ana", Some("c1"), Some("Climbing"), Some(3), 4),
            record("2024-11-02", "SLC", "Ana", Some("c2"), Some("Climbing"), Some(3), 4),
            record("2024-11-03", "", "Ana", Some("c1"), Some("Fitness"), Some(4), 4),
            record("", "OGDEN", "Ben", Some("c3"), Some("Climbing"), Some(2440), 2480),
            record("2024-11-05", "OGDEN", "Ben", None, None, None, 8),
        ]
    }
}
