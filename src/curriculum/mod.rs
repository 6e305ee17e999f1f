//! Age-based curriculum gating
//!
//! Static age-variant table plus the resolver screens consult when a mode is
//! selected.

mod resolver;
mod variants;

pub use resolver::AgeVariantResolver;
pub use variants::{
    AgeVariantConfig, CountingAgeConfig, CurriculumTable, MathAgeConfig, PuzzleAgeConfig,
    BUILTIN_CURRICULUM_TOML, DIFFICULTY_MAX, DIFFICULTY_MIN,
};
