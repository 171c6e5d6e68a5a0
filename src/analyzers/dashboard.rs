use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::analyzers::aggregate::aggregate;
use crate::analyzers::categories::{CategoryBreakdown, category_breakdown};
use crate::analyzers::compare::{Comparator, Comparison, ComparisonMode};
use crate::analyzers::dates::Granularity;
use crate::analyzers::facilities::{facility_comparison, facility_series};
use crate::analyzers::filter::{FilterCriteria, FilterOptions, filter};
use crate::analyzers::insights::summarize_insights;
use crate::analyzers::metrics::{KpiTrends, PeriodMetrics};
use crate::analyzers::rank::{
    low_performing_classes, low_performing_instructors, top_performing_classes,
};
use crate::analyzers::types::{
    AggregateResult, ClassPerformance, FacilitySeries, FacilitySummary, InstructorPerformance,
};
use crate::config::EngineSettings;
use crate::record::{Dataset, Record};

/// Everything the presentation layer needs for one render.
///
/// Built in a single pass by [`DashboardState::report`]; consumers never see a
/// report with some sections computed from older criteria.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub generated_at: DateTime<Utc>,
    pub criteria: FilterCriteria,
    pub granularity: Granularity,
    pub comparison_mode: ComparisonMode,
    pub total_records: usize,
    pub filtered_records: usize,
    pub metrics: PeriodMetrics,
    pub trends: KpiTrends,
    pub comparison: Comparison,
    pub aggregate: AggregateResult,
    pub low_performing_instructors: Vec<InstructorPerformance>,
    pub top_performing_classes: Vec<ClassPerformance>,
    pub low_performing_classes: Vec<ClassPerformance>,
    pub category_breakdown: CategoryBreakdown,
    /// Only populated when more than one facility is selected.
    pub facility_series: Vec<FacilitySeries>,
    pub facility_comparison: Vec<FacilitySummary>,
    /// Display names for every facility appearing in the leaderboard.
    pub facility_names: BTreeMap<String, String>,
    pub insights: Vec<String>,
}

/// The loaded dataset plus the current selection.
pub struct DashboardState {
    dataset: Dataset,
    criteria: FilterCriteria,
    granularity: Granularity,
    comparison_mode: ComparisonMode,
    settings: EngineSettings,
}

impl DashboardState {
    pub fn new(dataset: Dataset, settings: EngineSettings) -> Self {
        Self {
            dataset,
            criteria: FilterCriteria::default(),
            granularity: Granularity::default(),
            comparison_mode: ComparisonMode::default(),
            settings,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn apply(&mut self, criteria: FilterCriteria) {
        debug!(?criteria, "Applying filter criteria");
        self.criteria = criteria;
    }

    /// Clears every filter; granularity and comparison mode are kept.
    pub fn reset(&mut self) {
        self.criteria = FilterCriteria::default();
    }

    /// Restricts the date range to the month holding the newest record.
    /// Returns `false` and leaves the criteria alone when no record has a
    /// usable date.
    pub fn select_latest_month(&mut self) -> bool {
        match FilterCriteria::latest_month(&self.dataset) {
            Some(window) => {
                self.criteria = self.criteria.with_window(window);
                true
            }
            None => false,
        }
    }

    pub fn set_granularity(&mut self, granularity: Granularity) {
        self.granularity = granularity;
    }

    pub fn set_comparison_mode(&mut self, mode: ComparisonMode) {
        self.comparison_mode = mode;
    }

    /// Records matching the current criteria.
    pub fn view(&self) -> Vec<&Record> {
        filter(&self.dataset, &self.criteria)
    }

    pub fn options(&self) -> FilterOptions {
        FilterOptions::from_dataset(&self.dataset)
    }

    #[tracing::instrument(skip(self), fields(records = self.dataset.len()))]
    pub fn report(&self) -> DashboardReport {
        let view = self.view();
        let settings = &self.settings;

        let metrics = PeriodMetrics::from_records(&view, settings.participant_ratio);
        let trends = KpiTrends::classify(&metrics, &settings.targets);
        let aggregate = aggregate(&view, self.granularity);

        let comparison = Comparator::new(self.comparison_mode, self.granularity)
            .with_participant_ratio(settings.participant_ratio)
            .compare(&self.dataset, &self.criteria);

        let (facility_series, facility_comparison) = if self.criteria.facilities.len() > 1 {
            let selected: Vec<String> = self.criteria.facilities.iter().cloned().collect();
            (
                facility_series(&view, &selected, self.granularity),
                facility_comparison(&view, &selected),
            )
        } else {
            (Vec::new(), Vec::new())
        };

        let facility_names = aggregate
            .facility_leaderboard
            .iter()
            .map(|entry| {
                (
                    entry.facility.clone(),
                    settings.facility_names.display_name(&entry.facility),
                )
            })
            .collect();

        let report = DashboardReport {
            generated_at: Utc::now(),
            criteria: self.criteria.clone(),
            granularity: self.granularity,
            comparison_mode: self.comparison_mode,
            total_records: self.dataset.len(),
            filtered_records: view.len(),
            low_performing_instructors: low_performing_instructors(
                &view,
                settings.low_instructor_threshold,
            ),
            top_performing_classes: top_performing_classes(&view, settings.top_class_limit),
            low_performing_classes: low_performing_classes(&view, settings.low_class_threshold),
            category_breakdown: category_breakdown(&view, &self.criteria),
            insights: summarize_insights(&view, settings),
            metrics,
            trends,
            comparison,
            aggregate,
            facility_series,
            facility_comparison,
            facility_names,
        };

        info!(
            filtered = report.filtered_records,
            buckets = report.aggregate.dates.len(),
            compared = report.comparison.is_selected(),
            "Dashboard report computed"
        );

        report
    }
}
