//! Period-over-period comparison.
//!
//! The comparison subset is always produced by the regular record filter with
//! shifted date bounds, so facility, instructor and category selections apply
//! to both periods identically.

use chrono::{Days, Duration, Months};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analyzers::aggregate::aggregate;
use crate::analyzers::dates::Granularity;
use crate::analyzers::filter::{DateWindow, FilterCriteria, filter};
use crate::analyzers::metrics::{DEFAULT_PARTICIPANT_RATIO, PeriodMetrics};
use crate::analyzers::types::AggregateResult;
use crate::analyzers::utility::percent_change;
use crate::record::Dataset;

/// How the comparison window is derived from the current one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComparisonMode {
    /// The window of identical length immediately before the current one.
    #[default]
    PriorPeriod,
    /// Same month/day range one year earlier.
    YearOverYear,
    /// Same month/day range two years earlier.
    TwoYearsPrior,
}

impl ComparisonMode {
    /// Comparison window for `current`, `None` only on calendar overflow.
    pub fn comparison_window(self, current: DateWindow) -> Option<DateWindow> {
        match self {
            ComparisonMode::PriorPeriod => prior_period_window(current),
            ComparisonMode::YearOverYear => shift_years(current, 1),
            ComparisonMode::TwoYearsPrior => shift_years(current, 2),
        }
    }
}

/// `[start - D - 1, start - 1]` where `D = end - start` in days.
pub fn prior_period_window(current: DateWindow) -> Option<DateWindow> {
    let end = current.start.checked_sub_days(Days::new(1))?;
    let start = end.checked_sub_signed(Duration::days(current.span_days()))?;
    Some(DateWindow::new(start, end))
}

/// Moves both bounds back by whole calendar years, keeping month and day.
/// February 29 lands on February 28 in a non-leap target year.
pub fn shift_years(current: DateWindow, years: u32) -> Option<DateWindow> {
    let months = Months::new(12 * years);
    Some(DateWindow::new(
        current.start.checked_sub_months(months)?,
        current.end.checked_sub_months(months)?,
    ))
}

/// Percentage change of every compared KPI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricDeltas {
    pub attendees: f64,
    pub bookings: f64,
    pub average_attendance: f64,
    pub unique_sessions: f64,
    pub estimated_participants: f64,
}

impl MetricDeltas {
    pub fn between(current: &PeriodMetrics, previous: &PeriodMetrics) -> Self {
        Self {
            attendees: percent_change(
                current.total_attendees as f64,
                previous.total_attendees as f64,
            ),
            bookings: percent_change(
                current.total_bookings as f64,
                previous.total_bookings as f64,
            ),
            average_attendance: percent_change(
                current.average_attendance,
                previous.average_attendance,
            ),
            unique_sessions: percent_change(
                current.unique_sessions as f64,
                previous.unique_sessions as f64,
            ),
            estimated_participants: percent_change(
                current.estimated_participants as f64,
                previous.estimated_participants as f64,
            ),
        }
    }
}

/// Current period next to its comparison period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodComparison {
    pub mode: ComparisonMode,
    pub current_window: DateWindow,
    pub comparison_window: DateWindow,
    pub current: PeriodMetrics,
    pub previous: PeriodMetrics,
    pub deltas: MetricDeltas,
    /// `false` when the comparison window holds no records; deltas are then
    /// computed against zeros and should be presented as "no comparison data".
    pub has_comparison_data: bool,
    pub current_aggregate: AggregateResult,
    pub comparison_aggregate: AggregateResult,
}

/// Outcome of a comparison request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Comparison {
    /// The current criteria do not bound both ends of the date range.
    NoSelection,
    Compared(Box<PeriodComparison>),
}

impl Comparison {
    pub fn is_selected(&self) -> bool {
        matches!(self, Comparison::Compared(_))
    }

    pub fn period(&self) -> Option<&PeriodComparison> {
        match self {
            Comparison::Compared(period) => Some(period.as_ref()),
            Comparison::NoSelection => None,
        }
    }
}

/// Comparison settings bundled so one request computes both periods alike.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparator {
    pub mode: ComparisonMode,
    pub granularity: Granularity,
    pub participant_ratio: f64,
}

impl Comparator {
    pub fn new(mode: ComparisonMode, granularity: Granularity) -> Self {
        Self {
            mode,
            granularity,
            participant_ratio: DEFAULT_PARTICIPANT_RATIO,
        }
    }

    pub fn with_participant_ratio(mut self, participant_ratio: f64) -> Self {
        self.participant_ratio = participant_ratio;
        self
    }

    pub fn compare(&self, dataset: &Dataset, criteria: &FilterCriteria) -> Comparison {
        let Some(current_window) = criteria.selected_window() else {
            debug!("No date range selected, skipping comparison");
            return Comparison::NoSelection;
        };

        let Some(comparison_window) = self.mode.comparison_window(current_window) else {
            warn!(
                start = %current_window.start,
                end = %current_window.end,
                mode = ?self.mode,
                "Comparison window falls outside the supported calendar"
            );
            return Comparison::NoSelection;
        };

        let current_view = filter(dataset, criteria);
        let comparison_criteria = criteria.with_window(comparison_window);
        let comparison_view = filter(dataset, &comparison_criteria);

        debug!(
            current_start = %current_window.start,
            current_end = %current_window.end,
            comparison_start = %comparison_window.start,
            comparison_end = %comparison_window.end,
            current_records = current_view.len(),
            comparison_records = comparison_view.len(),
            "Computed comparison subsets"
        );

        let current = PeriodMetrics::from_records(&current_view, self.participant_ratio);
        let previous = PeriodMetrics::from_records(&comparison_view, self.participant_ratio);
        let deltas = MetricDeltas::between(&current, &previous);

        Comparison::Compared(Box::new(PeriodComparison {
            mode: self.mode,
            current_window,
            comparison_window,
            has_comparison_data: !comparison_view.is_empty(),
            current,
            previous,
            deltas,
            current_aggregate: aggregate(&current_view, self.granularity),
            comparison_aggregate: aggregate(&comparison_view, self.granularity),
        }))
    }
}

/// Compares the current criteria against the window derived by `mode`.
pub fn compare(
    dataset: &Dataset,
    criteria: &FilterCriteria,
    mode: ComparisonMode,
    granularity: Granularity,
) -> Comparison {
    Comparator::new(mode, granularity).compare(dataset, criteria)
}
