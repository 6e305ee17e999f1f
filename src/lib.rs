//! Tinysteps - progression engine for early-learning activities
//!
//! Turns completed activity sessions into durable learner progress:
//!
//! - **Sessions**: normalized into an append-only log with streaks and
//!   per-age completion snapshots
//! - **Mastery**: a weighted blend of recent accuracy and level progress,
//!   per mode and overall for the current age-year
//! - **Badges**: declarative criteria trees evaluated after every session
//! - **Curriculum**: age-banded difficulty settings with nearest-band fallback
//! - **Graduation**: readiness detection plus an explicit approval step
//!   before moving to the next age-year
//!
//! The engine itself does no I/O; `store` persists learner snapshots.

pub mod badges;
pub mod catalog_version;
pub mod config;
pub mod curriculum;
pub mod engine;
pub mod error;
pub mod graduation;
pub mod progress;
pub mod store;

pub use engine::{LearnerState, ProgressEngine, ProgressEvent};
pub use error::{EngineError, Result};
