//! Threshold classifiers for instructors and classes.
//!
//! These work directly over a record subset with no time bucketing. Every
//! classifier applies the same minimum sample size as the leaderboards.

use std::collections::HashMap;

use crate::analyzers::aggregate::{MIN_SAMPLE_SIZE, Tally};
use crate::analyzers::types::{ClassPerformance, InstructorPerformance};
use crate::analyzers::utility::round_tenth;
use crate::record::Record;

pub const DEFAULT_LOW_INSTRUCTOR_THRESHOLD: f64 = 4.0;
pub const DEFAULT_TOP_CLASS_LIMIT: usize = 10;
pub const DEFAULT_LOW_CLASS_THRESHOLD: f64 = 3.0;

/// Instructors averaging at most `threshold` attendees per class, worst first.
pub fn low_performing_instructors(records: &[&Record], threshold: f64) -> Vec<InstructorPerformance> {
    let mut groups: HashMap<&str, Tally> = HashMap::new();
    for record in records {
        if let Some(name) = record.instructor() {
            groups.entry(name).or_default().add(record);
        }
    }

    let mut flagged: Vec<InstructorPerformance> = groups
        .into_iter()
        .filter(|(_, tally)| tally.count >= MIN_SAMPLE_SIZE && tally.mean() <= threshold)
        .map(|(name, tally)| InstructorPerformance {
            instructor: name.to_string(),
            average_attendance: round_tenth(tally.mean()),
            total_classes: tally.count,
            total_attendance: tally.attendance,
        })
        .collect();

    flagged.sort_by(|a, b| {
        a.average_attendance
            .total_cmp(&b.average_attendance)
            .then_with(|| a.instructor.cmp(&b.instructor))
    });
    flagged
}

/// Best attended `(class, facility)` pairs, at most `limit` of them.
pub fn top_performing_classes(records: &[&Record], limit: usize) -> Vec<ClassPerformance> {
    let mut ranked = class_performance(records);

    ranked.sort_by(|a, b| {
        b.average_attendance
            .total_cmp(&a.average_attendance)
            .then_with(|| a.class_name.cmp(&b.class_name))
            .then_with(|| a.facility.cmp(&b.facility))
    });
    ranked.truncate(limit);
    ranked
}

/// `(class, facility)` pairs whose rounded average is strictly below
/// `threshold`, worst first.
pub fn low_performing_classes(records: &[&Record], threshold: f64) -> Vec<ClassPerformance> {
    let mut flagged: Vec<ClassPerformance> = class_performance(records)
        .into_iter()
        .filter(|class| class.average_attendance < threshold)
        .collect();

    flagged.sort_by(|a, b| {
        a.average_attendance
            .total_cmp(&b.average_attendance)
            .then_with(|| a.class_name.cmp(&b.class_name))
            .then_with(|| a.facility.cmp(&b.facility))
    });
    flagged
}

/// Per `(class_name, facility)` statistics for pairs with enough classes.
fn class_performance(records: &[&Record]) -> Vec<ClassPerformance> {
    let mut groups: HashMap<(&str, &str), Tally> = HashMap::new();
    for record in records {
        if let Some(name) = record.class() {
            groups
                .entry((name, record.facility.as_str()))
                .or_default()
                .add(record);
        }
    }

    groups
        .into_iter()
        .filter(|(_, tally)| tally.count >= MIN_SAMPLE_SIZE)
        .map(|((class_name, facility), tally)| ClassPerformance {
            class_name: class_name.to_string(),
            facility: facility.to_string(),
            average_attendance: round_tenth(tally.mean()),
            class_count: tally.count,
            total_attendance: tally.attendance,
        })
        .collect()
}
