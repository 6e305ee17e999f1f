//! Error types for the progression engine
//!
//! Every engine function is pure, so these are data-validity failures only.
//! Catalog-level errors (cycles, invariant violations, parse failures) are
//! fatal at load time; the rest are recoverable by re-supplying input.

/// Errors raised by the progression engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("No age-variant config for mode '{mode}' at age {age}{}", suggestion_suffix(.suggestion))]
    ConfigNotFound {
        mode: String,
        age: u8,
        suggestion: Option<String>,
    },

    #[error("Age-variant table invariant violated for mode '{mode}': {detail}")]
    ConfigInvariantViolation { mode: String, detail: String },

    #[error("Age-year {age} is already graduated")]
    AlreadyGraduated { age: u8 },

    #[error("Badge criteria cycle detected: {}", .path.join(" -> "))]
    InvalidCriteriaCycle { path: Vec<String> },

    #[error("Cannot {action} a year that is {from}")]
    InvalidTransition { from: String, action: String },

    #[error("Learner has no active age-year")]
    NoActiveYear,

    #[error("No year record for age {age}")]
    UnknownYear { age: u8 },

    #[error("Inconsistent year records: {0}")]
    InconsistentLedger(String),

    #[error("Badge '{badge}' references unknown badge '{missing}'")]
    UnknownBadgeReference { badge: String, missing: String },

    #[error("Duplicate badge id in catalog: {0}")]
    DuplicateBadge(String),

    #[error("Unsupported catalog version {found} (supported: {supported})")]
    UnsupportedCatalogVersion { found: String, supported: String },

    #[error("Failed to parse catalog: {0}")]
    CatalogParse(#[from] toml::de::Error),

    #[error("Invalid catalog version: {0}")]
    CatalogVersion(#[from] semver::Error),

    #[error("Invalid session: {0}")]
    InvalidSession(String),
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{}'?)", s),
        None => String::new(),
    }
}

impl EngineError {
    /// Whether this error must block startup of the surrounding application
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigInvariantViolation { .. }
                | Self::InvalidCriteriaCycle { .. }
                | Self::UnknownBadgeReference { .. }
                | Self::DuplicateBadge(_)
                | Self::UnsupportedCatalogVersion { .. }
                | Self::CatalogParse(_)
                | Self::CatalogVersion(_)
        )
    }
}

/// Result alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
