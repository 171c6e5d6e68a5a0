//! Engine settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::info;

use crate::analyzers::facilities::FacilityDirectory;
use crate::analyzers::metrics::{DEFAULT_PARTICIPANT_RATIO, KpiTargets};
use crate::analyzers::rank::{
    DEFAULT_LOW_CLASS_THRESHOLD, DEFAULT_LOW_INSTRUCTOR_THRESHOLD, DEFAULT_TOP_CLASS_LIMIT,
};

/// Environment variable naming the settings file.
pub const CONFIG_ENV: &str = "SCOREBOARD_CONFIG";

/// Tunable thresholds, targets and display names.
///
/// Stored as a JSON object on disk; every field is optional:
/// ```json
/// {
///   "low_instructor_threshold": 4.0,
///   "top_class_limit": 10,
///   "participant_ratio": 0.7,
///   "targets": { "attendees": 1000, "show_rate": 85 },
///   "facility_names": { "SLC": "Salt Lake City" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub low_instructor_threshold: f64,
    pub top_class_limit: usize,
    pub low_class_threshold: f64,
    pub participant_ratio: f64,
    pub targets: KpiTargets,
    pub facility_names: FacilityDirectory,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            low_instructor_threshold: DEFAULT_LOW_INSTRUCTOR_THRESHOLD,
            top_class_limit: DEFAULT_TOP_CLASS_LIMIT,
            low_class_threshold: DEFAULT_LOW_CLASS_THRESHOLD,
            participant_ratio: DEFAULT_PARTICIPANT_RATIO,
            targets: KpiTargets::default(),
            facility_names: FacilityDirectory::default(),
        }
    }
}

impl EngineSettings {
    /// Loads settings from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {path}"))?;
        let settings: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {path}"))?;
        Ok(settings)
    }

    /// Settings from `path` if given, else from `SCOREBOARD_CONFIG`, else
    /// the defaults.
    pub fn resolve(path: Option<&str>) -> Result<Self> {
        let from_env = env::var(CONFIG_ENV).ok();
        match path.or(from_env.as_deref()) {
            Some(path) => {
                info!(path, "Loading engine settings");
                Self::load(path)
            }
            None => Ok(Self::default()),
        }
    }
}
