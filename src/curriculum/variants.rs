//! Age-variant configuration table
//!
//! Maps (mode, age) to the difficulty settings a screen should use. The table
//! is static configuration: parsed and validated once, never mutated.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use once_cell::sync::OnceCell;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::catalog_version::check_catalog_version;
use crate::error::{EngineError, Result};

/// Embedded built-in curriculum (compile-time)
pub const BUILTIN_CURRICULUM_TOML: &str = include_str!("../../assets/curriculum.toml");

/// Lowest and highest value of the normalized difficulty scale
pub const DIFFICULTY_MIN: u8 = 1;
pub const DIFFICULTY_MAX: u8 = 10;

/// Counting screen settings for one age band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountingAgeConfig {
    pub max_number: u32,
    #[serde(default = "default_step")]
    pub step: u32,
    #[serde(default)]
    pub show_number_line: bool,
}

fn default_step() -> u32 {
    1
}

/// Puzzle screen settings for one age band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuzzleAgeConfig {
    pub pieces: u32,
    pub grid_columns: u32,
    pub grid_rows: u32,
    #[serde(default)]
    pub allow_rotation: bool,
}

/// Math screen settings for one age band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MathAgeConfig {
    pub operand_max: u32,
    pub operations: Vec<String>,
}

/// Difficulty configuration for a mode at an age
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeVariantConfig {
    pub mode: String,
    pub age: u8,
    /// Normalized 1-10 scale, non-decreasing with age for a fixed mode
    pub difficulty_level: u8,
    /// Highest level a learner can reach at this age
    pub max_level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counting: Option<CountingAgeConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub puzzle: Option<PuzzleAgeConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub math: Option<MathAgeConfig>,
}

#[derive(Debug, Deserialize)]
struct CurriculumFile {
    version: String,
    #[serde(default)]
    variant: Vec<AgeVariantConfig>,
}

/// Indexed (mode -> age -> config) lookup table
#[derive(Debug, Clone)]
pub struct CurriculumTable {
    version: Version,
    modes: BTreeMap<String, BTreeMap<u8, AgeVariantConfig>>,
    duplicates: Vec<(String, u8)>,
}

static BUILTIN: OnceCell<CurriculumTable> = OnceCell::new();

impl CurriculumTable {
    /// Parse a table without validating its invariants
    pub fn parse(content: &str) -> Result<Self> {
        let file: CurriculumFile = toml::from_str(content)?;
        let version = check_catalog_version(&file.version)?;

        let mut modes: BTreeMap<String, BTreeMap<u8, AgeVariantConfig>> = BTreeMap::new();
        let mut duplicates = Vec::new();
        for variant in file.variant {
            let bands = modes.entry(variant.mode.clone()).or_default();
            if bands.contains_key(&variant.age) {
                duplicates.push((variant.mode.clone(), variant.age));
                continue;
            }
            bands.insert(variant.age, variant);
        }

        Ok(Self {
            version,
            modes,
            duplicates,
        })
    }

    /// Parse and validate. Invariant violations are fatal here.
    pub fn load_str(content: &str) -> Result<Self> {
        let table = Self::parse(content)?;
        table.validate()?;
        Ok(table)
    }

    /// Load and validate a table from disk
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read curriculum file: {}", path.display()))?;
        Self::load_str(&content)
            .with_context(|| format!("Invalid curriculum file: {}", path.display()))
    }

    /// The embedded table, parsed and validated on first use
    pub fn builtin() -> Result<&'static CurriculumTable> {
        BUILTIN.get_or_try_init(|| Self::load_str(BUILTIN_CURRICULUM_TOML))
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// All known mode IDs, sorted
    pub fn modes(&self) -> impl Iterator<Item = &str> {
        self.modes.keys().map(|m| m.as_str())
    }

    /// Age bands defined for a mode, ascending
    pub fn bands(&self, mode: &str) -> Option<&BTreeMap<u8, AgeVariantConfig>> {
        self.modes.get(mode)
    }

    /// Every invariant violation in the table
    pub fn violations(&self) -> Vec<EngineError> {
        let mut violations = Vec::new();

        for (mode, age) in &self.duplicates {
            violations.push(EngineError::ConfigInvariantViolation {
                mode: mode.clone(),
                detail: format!("age {} is defined more than once", age),
            });
        }

        for (mode, bands) in &self.modes {
            let mut previous: Option<&AgeVariantConfig> = None;
            for variant in bands.values() {
                if !(DIFFICULTY_MIN..=DIFFICULTY_MAX).contains(&variant.difficulty_level) {
                    violations.push(EngineError::ConfigInvariantViolation {
                        mode: mode.clone(),
                        detail: format!(
                            "difficulty {} at age {} is outside {}-{}",
                            variant.difficulty_level, variant.age, DIFFICULTY_MIN, DIFFICULTY_MAX
                        ),
                    });
                }
                if variant.max_level == 0 {
                    violations.push(EngineError::ConfigInvariantViolation {
                        mode: mode.clone(),
                        detail: format!("max_level at age {} must be at least 1", variant.age),
                    });
                }
                if let Some(prev) = previous {
                    if variant.difficulty_level < prev.difficulty_level {
                        violations.push(EngineError::ConfigInvariantViolation {
                            mode: mode.clone(),
                            detail: format!(
                                "difficulty drops from {} at age {} to {} at age {}",
                                prev.difficulty_level,
                                prev.age,
                                variant.difficulty_level,
                                variant.age
                            ),
                        });
                    }
                }
                previous = Some(variant);
            }
        }

        violations
    }

    /// Fail on the first invariant violation
    pub fn validate(&self) -> Result<()> {
        match self.violations().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
