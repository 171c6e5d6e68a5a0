//! Multi-facility views and facility display names.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::analyzers::aggregate::{Tally, aggregate};
use crate::analyzers::dates::Granularity;
use crate::analyzers::types::{FacilitySeries, FacilitySummary};
use crate::analyzers::utility::round_tenth;
use crate::record::{Record, VIRTUAL_FACILITY};

const VIRTUAL_LABEL: &str = "Online/Virtual";

/// Maps facility identifiers to human readable names.
///
/// Stored as a plain JSON object in the settings file:
/// ```json
/// { "SLC": "Salt Lake City", "OGDEN": "Ogden" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacilityDirectory {
    names: HashMap<String, String>,
}

impl Default for FacilityDirectory {
    fn default() -> Self {
        let names = [
            ("OGDEN", "Ogden"),
            ("SOMA", "SOMA"),
            ("SLC", "Salt Lake City"),
            ("SLP", "Pottery"),
        ]
        .into_iter()
        .map(|(id, name)| (id.to_string(), name.to_string()))
        .collect();

        Self { names }
    }
}

impl FacilityDirectory {
    pub fn new(names: HashMap<String, String>) -> Self {
        Self { names }
    }

    /// Display name for `facility`; unknown identifiers fall back to
    /// `"Facility {id}"` and the virtual sentinel to "Online/Virtual" unless
    /// the directory overrides it.
    pub fn display_name(&self, facility: &str) -> String {
        if let Some(name) = self.names.get(facility) {
            return name.clone();
        }
        if facility == VIRTUAL_FACILITY {
            return VIRTUAL_LABEL.to_string();
        }
        format!("Facility {facility}")
    }
}

/// One attendance series per selected facility, skipping facilities with no
/// records in `records`.
pub fn facility_series(
    records: &[&Record],
    facilities: &[String],
    granularity: Granularity,
) -> Vec<FacilitySeries> {
    facilities
        .iter()
        .filter_map(|facility| {
            let subset: Vec<&Record> = records
                .iter()
                .copied()
                .filter(|r| r.facility == *facility)
                .collect();
            if subset.is_empty() {
                return None;
            }

            let aggregated = aggregate(&subset, granularity);
            Some(FacilitySeries {
                facility: facility.clone(),
                dates: aggregated.dates,
                totals: aggregated.totals,
            })
        })
        .collect()
}

/// Totals for each selected facility, in selection order.
pub fn facility_comparison(records: &[&Record], facilities: &[String]) -> Vec<FacilitySummary> {
    facilities
        .iter()
        .map(|facility| {
            let mut tally = Tally::default();
            for record in records.iter().filter(|r| r.facility == *facility) {
                tally.add(record);
            }

            FacilitySummary {
                facility: facility.clone(),
                total_attendance: tally.attendance,
                total_classes: tally.count,
                average_attendance: round_tenth(tally.mean()),
            }
        })
        .collect()
}
