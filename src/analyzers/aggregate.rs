use crate::analyzers::dates::{Granularity, format_date};
use crate::analyzers::types::{AggregateResult, FacilityEntry, LeaderboardEntry};
use crate::analyzers::utility::{ratio, round_tenth};
use crate::record::Record;
use std::collections::{BTreeMap, HashMap};

/// Fewest classes an instructor or class needs before it is ranked.
/// Averages over one or two sessions are dominated by outliers.
pub const MIN_SAMPLE_SIZE: usize = 3;

/// Maximum entries kept in each leaderboard.
pub const LEADERBOARD_LIMIT: usize = 20;

/// Running attendance/booking sums for one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Tally {
    pub(crate) attendance: u64,
    pub(crate) bookings: u64,
    pub(crate) count: usize,
}

impl Tally {
    pub(crate) fn add(&mut self, record: &Record) {
        self.attendance = self.attendance.saturating_add(record.attendees());
        self.bookings = self.bookings.saturating_add(record.bookings());
        self.count += 1;
    }

    pub(crate) fn mean(&self) -> f64 {
        ratio(self.attendance as f64, self.count as f64)
    }
}

/// Groups `records` by time bucket, instructor, class and facility.
///
/// Only records whose date parses land in a time bucket; undated records still
/// count towards the instructor, class and facility groupings. Bucket keys are
/// ISO dates, so sorting them lexicographically is also chronological.
pub fn aggregate(records: &[&Record], granularity: Granularity) -> AggregateResult {
    let mut buckets: BTreeMap<String, Tally> = BTreeMap::new();
    let mut instructors: HashMap<&str, Tally> = HashMap::new();
    let mut classes: HashMap<&str, Tally> = HashMap::new();
    let mut facilities: HashMap<&str, Tally> = HashMap::new();

    for record in records {
        if let Some(date) = record.date() {
            let key = format_date(granularity.bucket(date));
            buckets.entry(key).or_default().add(record);
        }

        if let Some(name) = record.instructor() {
            instructors.entry(name).or_default().add(record);
        }

        if let Some(name) = record.class() {
            classes.entry(name).or_default().add(record);
        }

        facilities
            .entry(record.facility.as_str())
            .or_default()
            .add(record);
    }

    let mut result = AggregateResult::empty(granularity);

    for (key, tally) in buckets {
        result.dates.push(key);
        result.totals.push(tally.attendance);
        result.booking_totals.push(tally.bookings);
        result.class_counts.push(tally.count);
        result.average_attendance.push(tally.mean());
    }

    result.instructor_leaderboard = leaderboard(instructors);
    result.class_leaderboard = leaderboard(classes);
    result.facility_leaderboard = facility_leaderboard(facilities);

    result
}

/// Ranks groups with at least [`MIN_SAMPLE_SIZE`] classes by mean attendance.
fn leaderboard(groups: HashMap<&str, Tally>) -> Vec<LeaderboardEntry> {
    let mut ranked: Vec<(&str, Tally)> = groups
        .into_iter()
        .filter(|(_, tally)| tally.count >= MIN_SAMPLE_SIZE)
        .collect();

    ranked.sort_by(|a, b| {
        b.1.mean()
            .total_cmp(&a.1.mean())
            .then_with(|| a.0.cmp(b.0))
    });
    ranked.truncate(LEADERBOARD_LIMIT);

    ranked
        .into_iter()
        .map(|(name, tally)| LeaderboardEntry {
            name: name.to_string(),
            total_attendance: tally.attendance,
            class_count: tally.count,
            average_attendance: round_tenth(tally.mean()),
        })
        .collect()
}

/// Ranks every facility by total attendance; no sample-size filter.
fn facility_leaderboard(groups: HashMap<&str, Tally>) -> Vec<FacilityEntry> {
    let mut ranked: Vec<(&str, Tally)> = groups.into_iter().collect();

    ranked.sort_by(|a, b| {
        b.1.attendance
            .cmp(&a.1.attendance)
            .then_with(|| a.0.cmp(b.0))
    });
    ranked.truncate(LEADERBOARD_LIMIT);

    ranked
        .into_iter()
        .map(|(facility, tally)| FacilityEntry {
            facility: facility.to_string(),
            total_attendance: tally.attendance,
            class_count: tally.count,
            average_attendance: tally.mean(),
        })
        .collect()
}
