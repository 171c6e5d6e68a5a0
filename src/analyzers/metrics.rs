//! Headline KPIs for a period and their classification against targets.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::analyzers::utility::{pct, ratio, saturating_total};
use crate::record::Record;

/// Default share of total attendance assumed to be distinct people.
///
/// A fixed repeat-customer heuristic: the estimate is an approximation, not a
/// measured count.
pub const DEFAULT_PARTICIPANT_RATIO: f64 = 0.7;

/// KPI block for one filtered view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodMetrics {
    pub total_attendees: u64,
    pub total_bookings: u64,
    pub class_count: usize,
    pub average_attendance: f64,
    /// Attendees as a percentage of bookings, 0 without bookings.
    pub show_rate: f64,
    /// Distinct `session_guid` values.
    pub unique_sessions: usize,
    /// `round(total_attendees * participant_ratio)`.
    pub estimated_participants: u64,
}

impl PeriodMetrics {
    pub fn from_records(records: &[&Record], participant_ratio: f64) -> Self {
        let total_attendees = saturating_total(records.iter().map(|r| r.attendees()));
        let total_bookings = saturating_total(records.iter().map(|r| r.bookings()));
        let class_count = records.len();

        let unique_sessions = records
            .iter()
            .filter_map(|r| r.session_guid.as_deref())
            .collect::<HashSet<_>>()
            .len();

        Self {
            total_attendees,
            total_bookings,
            class_count,
            average_attendance: ratio(total_attendees as f64, class_count as f64),
            show_rate: pct(total_attendees as f64, total_bookings as f64),
            unique_sessions,
            estimated_participants: estimate_participants(total_attendees, participant_ratio),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.class_count == 0
    }
}

pub fn estimate_participants(total_attendees: u64, participant_ratio: f64) -> u64 {
    (total_attendees as f64 * participant_ratio).round().max(0.0) as u64
}

/// Direction of a KPI relative to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Neutral,
    Down,
}

impl Trend {
    /// `Up` at or above 110% of target, `Down` at or below 90%.
    pub fn against_target(value: f64, target: f64) -> Self {
        match value {
            v if v >= target * 1.1 => Trend::Up,
            v if v <= target * 0.9 => Trend::Down,
            _ => Trend::Neutral,
        }
    }
}

/// Benchmarks the headline KPIs are compared against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KpiTargets {
    pub attendees: f64,
    pub bookings: f64,
    pub average_attendance: f64,
    pub show_rate: f64,
}

impl Default for KpiTargets {
    fn default() -> Self {
        Self {
            attendees: 1000.0,
            bookings: 1200.0,
            average_attendance: 8.0,
            show_rate: 85.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KpiTrends {
    pub attendees: Trend,
    pub bookings: Trend,
    pub average_attendance: Trend,
    pub show_rate: Trend,
}

impl KpiTrends {
    pub fn classify(metrics: &PeriodMetrics, targets: &KpiTargets) -> Self {
        Self {
            attendees: Trend::against_target(metrics.total_attendees as f64, targets.attendees),
            bookings: Trend::against_target(metrics.total_bookings as f64, targets.bookings),
            average_attendance: Trend::against_target(
                metrics.average_attendance,
                targets.average_attendance,
            ),
            show_rate: Trend::against_target(metrics.show_rate, targets.show_rate),
        }
    }
}
