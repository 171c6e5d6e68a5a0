//! Record selection by date range, facility, instructor and category.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::analyzers::dates::{month_end, month_start};
use crate::record::{Dataset, Record};

/// Records selected from a [`Dataset`], borrowed rather than copied.
pub type FilteredView<'a> = Vec<&'a Record>;

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// `end - start` in days; a single-day window spans 0.
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Conjunction of record predicates. Unset fields and empty sets do not
/// restrict anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub facilities: BTreeSet<String>,
    pub instructor: Option<String>,
    /// Great-grandparent categories.
    pub categories: BTreeSet<String>,
}

impl FilterCriteria {
    pub fn matches(&self, record: &Record) -> bool {
        if self.date_from.is_some() || self.date_to.is_some() {
            let Some(date) = record.date() else {
                return false;
            };
            if self.date_from.is_some_and(|from| date < from) {
                return false;
            }
            if self.date_to.is_some_and(|to| date > to) {
                return false;
            }
        }

        if !self.facilities.is_empty() && !self.facilities.contains(&record.facility) {
            return false;
        }

        if let Some(instructor) = &self.instructor {
            if record.instructor_name != *instructor {
                return false;
            }
        }

        if !self.categories.is_empty() {
            match record.great_grandparent() {
                Some(category) if self.categories.contains(category) => {}
                _ => return false,
            }
        }

        true
    }

    /// The current period, only when both bounds are set.
    pub fn selected_window(&self) -> Option<DateWindow> {
        match (self.date_from, self.date_to) {
            (Some(start), Some(end)) => Some(DateWindow::new(start, end)),
            _ => None,
        }
    }

    /// Same non-date predicates over a different date range.
    pub fn with_window(&self, window: DateWindow) -> Self {
        Self {
            date_from: Some(window.start),
            date_to: Some(window.end),
            ..self.clone()
        }
    }

    /// The single selected great-grandparent category, if exactly one is set.
    pub fn single_category(&self) -> Option<&str> {
        if self.categories.len() == 1 {
            self.categories.iter().next().map(String::as_str)
        } else {
            None
        }
    }

    /// Default window: the whole calendar month of the latest dated record.
    pub fn latest_month(dataset: &Dataset) -> Option<DateWindow> {
        let latest = dataset.records().iter().filter_map(Record::date).max()?;
        Some(DateWindow::new(month_start(latest), month_end(latest)))
    }
}

/// Applies `criteria` to every record of `dataset`, preserving load order.
pub fn filter<'a>(dataset: &'a Dataset, criteria: &FilterCriteria) -> FilteredView<'a> {
    filter_records(dataset.records(), criteria)
}

pub fn filter_records<'a>(records: &'a [Record], criteria: &FilterCriteria) -> FilteredView<'a> {
    records.iter().filter(|r| criteria.matches(r)).collect()
}

/// Distinct values available for each filter control.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterOptions {
    pub instructors: Vec<String>,
    pub facilities: Vec<String>,
    pub categories: Vec<String>,
}

impl FilterOptions {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let mut instructors = BTreeSet::new();
        let mut facilities = BTreeSet::new();
        let mut categories = BTreeSet::new();

        for record in dataset.records() {
            if !record.instructor_name.is_empty() {
                instructors.insert(record.instructor_name.clone());
            }
            if !record.is_virtual() {
                facilities.insert(record.facility.clone());
            }
            if let Some(category) = record.great_grandparent() {
                categories.insert(category.to_string());
            }
        }

        Self {
            instructors: instructors.into_iter().collect(),
            facilities: facilities.into_iter().collect(),
            categories: categories.into_iter().collect(),
        }
    }
}
