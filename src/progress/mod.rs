//! Learner progress: session recording, streaks and mastery
//!
//! ```text
//! ActivityEvent ──► SessionRecorder ──► SessionRecord ──► SessionHistory
//!                         │                                    │
//!                         ▼                                    ▼
//!                  Progress / streak                 MasteryCalculator
//!                  AgeVariantCompletion              (YearlyProgress)
//! ```

mod mastery;
mod models;
mod recorder;
mod streaks;

pub use mastery::{blend_mastery, MasteryCalculator};
pub use models::{
    ActivityEvent, AgeVariantCompletion, GraduationHistory, GraduationStatus, GraduationSummary,
    ModeMastery, Progress, SessionHistory, SessionRecord, UserBadge, YearlyProgress,
};
pub use recorder::SessionRecorder;
pub use streaks::{StreakChange, StreakInfo};
