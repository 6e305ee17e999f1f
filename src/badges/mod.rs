//! Badge system: catalog, criteria and evaluation
//!
//! The catalog is static configuration loaded once at startup. Evaluation
//! never writes anything; `award` turns evaluation results into `UserBadge`
//! records without duplicating existing ones.

mod catalog;
mod definitions;
mod evaluator;

pub use catalog::{BadgeCatalog, BUILTIN_BADGES_TOML};
pub use definitions::{Badge, BadgeCategory, BadgeCriteria};
pub use evaluator::{award, evaluate, BadgeEvaluator};
