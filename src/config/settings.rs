//! Settings sections of the engine configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How per-mode mastery is blended
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterySettings {
    /// Weight of accuracy in the blend (0.0 - 1.0)
    #[serde(default = "default_accuracy_weight")]
    pub accuracy_weight: f64,

    /// Weight of level-reached ratio in the blend (0.0 - 1.0)
    #[serde(default = "default_level_weight")]
    pub level_weight: f64,

    /// Number of most recent sessions averaged for a mode's accuracy
    #[serde(default = "default_accuracy_window")]
    pub accuracy_window: usize,
}

fn default_accuracy_weight() -> f64 {
    0.6
}

fn default_level_weight() -> f64 {
    0.4
}

fn default_accuracy_window() -> usize {
    5
}

impl Default for MasterySettings {
    fn default() -> Self {
        Self {
            accuracy_weight: default_accuracy_weight(),
            level_weight: default_level_weight(),
            accuracy_window: default_accuracy_window(),
        }
    }
}

impl MasterySettings {
    /// Weights normalized so they sum to 1.0.
    /// Falls back to the defaults when both are zero or negative.
    pub fn normalized_weights(&self) -> (f64, f64) {
        let a = self.accuracy_weight.max(0.0);
        let l = self.level_weight.max(0.0);
        let total = a + l;
        if total <= f64::EPSILON || !total.is_finite() {
            return (default_accuracy_weight(), default_level_weight());
        }
        (a / total, l / total)
    }
}

/// Readiness floor for requesting graduation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraduationSettings {
    /// Overall mastery (0-100) needed before approval can be requested
    #[serde(default = "default_readiness_threshold")]
    pub readiness_threshold: f64,

    /// Minimum sessions within the age-year
    #[serde(default = "default_min_sessions")]
    pub min_sessions: usize,

    /// Minimum days since the age-year started
    #[serde(default = "default_min_days")]
    pub min_days: i64,
}

fn default_readiness_threshold() -> f64 {
    80.0
}

fn default_min_sessions() -> usize {
    10
}

fn default_min_days() -> i64 {
    14
}

impl Default for GraduationSettings {
    fn default() -> Self {
        Self {
            readiness_threshold: default_readiness_threshold(),
            min_sessions: default_min_sessions(),
            min_days: default_min_days(),
        }
    }
}

/// Session log retention
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySettings {
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_max_sessions() -> usize {
    500
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
        }
    }
}

/// Optional catalog overrides. Built-in catalogs are used when unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogPaths {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badges: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curriculum: Option<PathBuf>,
}
