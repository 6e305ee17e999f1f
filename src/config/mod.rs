//! Configuration loading and management

mod io;
mod settings;

pub use settings::{CatalogPaths, GraduationSettings, HistorySettings, MasterySettings};

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Mastery blend settings
    #[serde(default)]
    pub mastery: MasterySettings,

    /// Graduation readiness floor
    #[serde(default)]
    pub graduation: GraduationSettings,

    /// Session log retention
    #[serde(default)]
    pub history: HistorySettings,

    /// Catalog file overrides
    #[serde(default)]
    pub catalogs: CatalogPaths,
}
