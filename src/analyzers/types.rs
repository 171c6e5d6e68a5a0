//! Data types produced by the aggregation pipeline.
//!
//! Everything here is a plain value: recomputed from a filtered view on every
//! request and serialized as-is for the presentation layer.

use serde::Serialize;

use crate::analyzers::dates::Granularity;

/// Ranked instructor or class by mean attendance per class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub total_attendance: u64,
    pub class_count: usize,
    /// Mean attendance per class, rounded to one decimal.
    pub average_attendance: f64,
}

/// Facility ranked by total attendance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilityEntry {
    /// Facility identifier; empty for virtual classes.
    pub facility: String,
    pub total_attendance: u64,
    pub class_count: usize,
    pub average_attendance: f64,
}

/// Chronological series plus leaderboards for one filtered view.
///
/// `dates`, `totals`, `booking_totals`, `class_counts` and
/// `average_attendance` are parallel arrays aligned on `dates`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub granularity: Granularity,
    pub dates: Vec<String>,
    pub totals: Vec<u64>,
    pub booking_totals: Vec<u64>,
    pub class_counts: Vec<usize>,
    pub average_attendance: Vec<f64>,
    pub instructor_leaderboard: Vec<LeaderboardEntry>,
    pub class_leaderboard: Vec<LeaderboardEntry>,
    pub facility_leaderboard: Vec<FacilityEntry>,
}

impl AggregateResult {
    pub fn empty(granularity: Granularity) -> Self {
        Self {
            granularity,
            dates: Vec::new(),
            totals: Vec::new(),
            booking_totals: Vec::new(),
            class_counts: Vec::new(),
            average_attendance: Vec::new(),
            instructor_leaderboard: Vec::new(),
            class_leaderboard: Vec::new(),
            facility_leaderboard: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
            && self.instructor_leaderboard.is_empty()
            && self.class_leaderboard.is_empty()
            && self.facility_leaderboard.is_empty()
    }

    /// Total attendance for bucket `key`, if present.
    pub fn total_for(&self, key: &str) -> Option<u64> {
        let idx = self.dates.iter().position(|d| d == key)?;
        self.totals.get(idx).copied()
    }
}

/// Instructor flagged by the low-attendance classifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstructorPerformance {
    pub instructor: String,
    pub average_attendance: f64,
    pub total_classes: usize,
    pub total_attendance: u64,
}

/// A class at one facility; the same class name at two facilities ranks twice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassPerformance {
    pub class_name: String,
    pub facility: String,
    pub average_attendance: f64,
    pub class_count: usize,
    pub total_attendance: u64,
}

/// Attendance series for a single facility.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilitySeries {
    pub facility: String,
    pub dates: Vec<String>,
    pub totals: Vec<u64>,
}

/// Side-by-side totals for one selected facility.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilitySummary {
    pub facility: String,
    pub total_attendance: u64,
    pub total_classes: usize,
    pub average_attendance: f64,
}

/// Attendance attributed to one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub participants: u64,
}
