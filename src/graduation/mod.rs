//! Graduation between age-years
//!
//! ```text
//!   in_progress ──(readiness)──► pending_approval ──(approve)──► graduated
//!        ▲                              │
//!        └──────────(reject)────────────┘
//! ```
//!
//! Approval is always an explicit outside action. A graduation writes exactly
//! one `GraduationHistory` record and opens the next age-year.

mod ledger;

pub use ledger::YearLedger;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::config::GraduationSettings;
use crate::error::{EngineError, Result};
use crate::progress::{
    GraduationHistory, GraduationStatus, GraduationSummary, SessionHistory, YearlyProgress,
};

/// Requirement IDs reported in graduation summaries
pub const REQ_OVERALL_MASTERY: &str = "overall_mastery";
pub const REQ_MIN_SESSIONS: &str = "min_sessions";
pub const REQ_MIN_DAYS: &str = "min_days";

/// One readiness requirement and whether it currently holds
#[derive(Debug, Clone, PartialEq)]
pub struct Requirement {
    pub id: &'static str,
    pub met: bool,
    pub detail: String,
}

/// Drives yearly records through the graduation states
#[derive(Debug, Clone, Copy)]
pub struct GraduationStateMachine<'a> {
    settings: &'a GraduationSettings,
}

impl<'a> GraduationStateMachine<'a> {
    pub fn new(settings: &'a GraduationSettings) -> Self {
        Self { settings }
    }

    /// Evaluate the readiness floor for a yearly record
    pub fn requirements(
        &self,
        yearly: &YearlyProgress,
        history: &SessionHistory,
        now: DateTime<Utc>,
    ) -> Vec<Requirement> {
        // Mode entries keep counting after the log is pruned
        let logged = history.for_age_year(yearly.age_year).count();
        let folded: usize = yearly
            .modes_mastered
            .values()
            .map(|m| m.sessions as usize)
            .sum();
        let sessions = logged.max(folded);
        let days = (now - yearly.started_at).num_days();

        vec![
            Requirement {
                id: REQ_OVERALL_MASTERY,
                met: yearly.overall_mastery_percentage >= self.settings.readiness_threshold,
                detail: format!(
                    "{:.1}% of {:.1}%",
                    yearly.overall_mastery_percentage, self.settings.readiness_threshold
                ),
            },
            Requirement {
                id: REQ_MIN_SESSIONS,
                met: sessions >= self.settings.min_sessions,
                detail: format!("{} of {} sessions", sessions, self.settings.min_sessions),
            },
            Requirement {
                id: REQ_MIN_DAYS,
                met: days >= self.settings.min_days,
                detail: format!("{} of {} days", days, self.settings.min_days),
            },
        ]
    }

    /// Move the active year to `pending_approval` once every requirement holds.
    ///
    /// Returns `true` when the transition happened on this call.
    pub fn check_readiness(
        &self,
        ledger: &mut YearLedger,
        history: &SessionHistory,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let active = ledger.active().ok_or(EngineError::NoActiveYear)?;
        if active.graduation_status != GraduationStatus::InProgress {
            return Ok(false);
        }

        let ready = self
            .requirements(active, history, now)
            .iter()
            .all(|r| r.met);
        if !ready {
            return Ok(false);
        }

        let active = ledger.active_mut().ok_or(EngineError::NoActiveYear)?;
        active.graduation_status = GraduationStatus::PendingApproval;
        info!(
            "Age-year {} ready for graduation ({:.1}% mastery)",
            active.age_year, active.overall_mastery_percentage
        );
        Ok(true)
    }

    /// Approve a pending graduation for `age_year`.
    ///
    /// Writes the history record, marks the year graduated and opens
    /// `age_year + 1`. Approving a year that is already graduated is a no-op
    /// reported as `AlreadyGraduated`.
    pub fn approve(
        &self,
        ledger: &mut YearLedger,
        age_year: u8,
        approved_by: &str,
        total_stars: u32,
        history: &SessionHistory,
        now: DateTime<Utc>,
    ) -> Result<GraduationHistory> {
        let yearly = ledger
            .year(age_year)
            .ok_or(EngineError::UnknownYear { age: age_year })?;

        match yearly.graduation_status {
            GraduationStatus::Graduated => {
                return Err(EngineError::AlreadyGraduated { age: age_year });
            }
            GraduationStatus::InProgress => {
                return Err(EngineError::InvalidTransition {
                    from: GraduationStatus::InProgress.as_str().to_string(),
                    action: "approve".to_string(),
                });
            }
            GraduationStatus::PendingApproval => {}
        }

        let to_age = age_year.checked_add(1).ok_or_else(|| {
            EngineError::InconsistentLedger(format!("age {} has no next year", age_year))
        })?;

        let met_requirements = self
            .requirements(yearly, history, now)
            .into_iter()
            .filter(|r| r.met)
            .map(|r| r.id.to_string())
            .collect();
        let modes: BTreeMap<String, f64> = yearly
            .modes_mastered
            .iter()
            .map(|(mode, m)| (mode.clone(), m.mastery))
            .collect();

        let record = GraduationHistory {
            id: Uuid::new_v4(),
            from_age: age_year,
            to_age,
            graduated_at: now,
            approved_by: approved_by.to_string(),
            summary: GraduationSummary {
                overall_mastery_percentage: yearly.overall_mastery_percentage,
                met_requirements,
                total_stars,
                modes,
            },
        };

        ledger.graduate(age_year, record.clone(), YearlyProgress::start(to_age, now))?;
        info!(
            "Graduated age-year {} -> {} (approved by {})",
            age_year, to_age, approved_by
        );
        Ok(record)
    }

    /// Decline a pending graduation; the year returns to `in_progress` and no
    /// history is written.
    pub fn reject(&self, ledger: &mut YearLedger, age_year: u8) -> Result<()> {
        let yearly = ledger
            .year_mut(age_year)
            .ok_or(EngineError::UnknownYear { age: age_year })?;

        match yearly.graduation_status {
            GraduationStatus::PendingApproval => {
                yearly.graduation_status = GraduationStatus::InProgress;
                info!("Graduation for age-year {} declined", age_year);
                Ok(())
            }
            GraduationStatus::Graduated => Err(EngineError::AlreadyGraduated { age: age_year }),
            GraduationStatus::InProgress => Err(EngineError::InvalidTransition {
                from: GraduationStatus::InProgress.as_str().to_string(),
                action: "reject".to_string(),
            }),
        }
    }
}
