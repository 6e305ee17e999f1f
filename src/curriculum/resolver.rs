//! Age-variant resolution
//!
//! `resolve` is an exact lookup and surfaces misses as `ConfigNotFound`.
//! `resolve_or_nearest` is the fallback callers use when selecting a mode:
//! nearest band at or below the requested age, else the lowest band above it.

use tracing::{debug, warn};

use super::variants::{AgeVariantConfig, CountingAgeConfig, CurriculumTable, PuzzleAgeConfig};
use crate::error::{EngineError, Result};

/// Minimum Jaro-Winkler similarity for a "did you mean" suggestion
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Read-only resolver over a curriculum table
#[derive(Debug, Clone, Copy)]
pub struct AgeVariantResolver<'a> {
    table: &'a CurriculumTable,
}

impl<'a> AgeVariantResolver<'a> {
    pub fn new(table: &'a CurriculumTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &'a CurriculumTable {
        self.table
    }

    /// Exact (mode, age) lookup
    pub fn resolve(&self, mode: &str, age: u8) -> Result<&'a AgeVariantConfig> {
        self.table
            .bands(mode)
            .and_then(|bands| bands.get(&age))
            .ok_or_else(|| self.not_found(mode, age))
    }

    /// Lookup with age-band fallback.
    ///
    /// Only fails when the mode is unknown at every age.
    pub fn resolve_or_nearest(&self, mode: &str, age: u8) -> Result<&'a AgeVariantConfig> {
        let bands = self
            .table
            .bands(mode)
            .ok_or_else(|| self.not_found(mode, age))?;

        if let Some(exact) = bands.get(&age) {
            return Ok(exact);
        }

        let fallback = bands
            .range(..=age)
            .next_back()
            .or_else(|| bands.range(age..).next())
            .map(|(_, variant)| variant)
            .ok_or_else(|| self.not_found(mode, age))?;

        warn!(
            "No '{}' config for age {}, falling back to age {}",
            mode, age, fallback.age
        );
        Ok(fallback)
    }

    /// Counting sub-config for a counting mode (with fallback)
    pub fn counting(&self, mode: &str, age: u8) -> Result<&'a CountingAgeConfig> {
        let variant = self.resolve_or_nearest(mode, age)?;
        variant
            .counting
            .as_ref()
            .ok_or_else(|| EngineError::ConfigNotFound {
                mode: mode.to_string(),
                age,
                suggestion: None,
            })
    }

    /// Puzzle sub-config for a puzzle mode (with fallback)
    pub fn puzzle(&self, mode: &str, age: u8) -> Result<&'a PuzzleAgeConfig> {
        let variant = self.resolve_or_nearest(mode, age)?;
        variant
            .puzzle
            .as_ref()
            .ok_or_else(|| EngineError::ConfigNotFound {
                mode: mode.to_string(),
                age,
                suggestion: None,
            })
    }

    /// Modes that are part of the curriculum by `age`: those with a band at or
    /// below it. A mode introduced at a later age is not tracked yet.
    pub fn tracked_modes(&self, age: u8) -> Vec<&'a str> {
        self.table
            .modes()
            .filter(|mode| {
                self.table
                    .bands(mode)
                    .is_some_and(|bands| bands.range(..=age).next().is_some())
            })
            .collect()
    }

    /// Maximum reachable level for a mode at an age (with fallback)
    pub fn max_level(&self, mode: &str, age: u8) -> Option<u32> {
        self.resolve_or_nearest(mode, age).ok().map(|v| v.max_level)
    }

    fn not_found(&self, mode: &str, age: u8) -> EngineError {
        let suggestion = if self.table.bands(mode).is_some() {
            None
        } else {
            self.suggest(mode)
        };
        debug!("Age-variant miss for '{}' at age {}", mode, age);
        EngineError::ConfigNotFound {
            mode: mode.to_string(),
            age,
            suggestion,
        }
    }

    fn suggest(&self, mode: &str) -> Option<String> {
        self.table
            .modes()
            .map(|known| (known, strsim::jaro_winkler(mode, known)))
            .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(known, _)| known.to_string())
    }
}
