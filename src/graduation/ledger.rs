//! Ordered yearly records plus the graduation audit trail for one learner

use chrono::{DateTime, Utc};

use crate::error::{EngineError, Result};
use crate::progress::{GraduationHistory, GraduationStatus, YearlyProgress};

/// All age-years a learner has been through, oldest first.
///
/// Only the last record may be non-graduated, and ages strictly increase.
#[derive(Debug, Clone, PartialEq)]
pub struct YearLedger {
    years: Vec<YearlyProgress>,
    history: Vec<GraduationHistory>,
}

impl YearLedger {
    /// Open a ledger for a learner starting at `age`
    pub fn enroll(age: u8, now: DateTime<Utc>) -> Self {
        Self {
            years: vec![YearlyProgress::start(age, now)],
            history: Vec::new(),
        }
    }

    /// Rebuild a ledger from stored records, checking ordering
    pub fn from_parts(
        mut years: Vec<YearlyProgress>,
        history: Vec<GraduationHistory>,
    ) -> Result<Self> {
        years.sort_by_key(|y| y.age_year);

        for pair in years.windows(2) {
            if pair[0].age_year == pair[1].age_year {
                return Err(EngineError::InconsistentLedger(format!(
                    "duplicate record for age {}",
                    pair[0].age_year
                )));
            }
            if !pair[0].graduation_status.is_terminal() {
                return Err(EngineError::InconsistentLedger(format!(
                    "age {} is {} but age {} exists",
                    pair[0].age_year,
                    pair[0].graduation_status.as_str(),
                    pair[1].age_year
                )));
            }
        }

        for record in &history {
            let graduated = years
                .iter()
                .any(|y| y.age_year == record.from_age && y.graduation_status.is_terminal());
            if !graduated {
                return Err(EngineError::InconsistentLedger(format!(
                    "history for age {} without a graduated year",
                    record.from_age
                )));
            }
        }

        Ok(Self { years, history })
    }

    /// The year currently being played, if any
    pub fn active(&self) -> Option<&YearlyProgress> {
        self.years
            .last()
            .filter(|y| !y.graduation_status.is_terminal())
    }

    pub fn active_mut(&mut self) -> Option<&mut YearlyProgress> {
        self.years
            .last_mut()
            .filter(|y| !y.graduation_status.is_terminal())
    }

    pub fn years(&self) -> &[YearlyProgress] {
        &self.years
    }

    pub fn history(&self) -> &[GraduationHistory] {
        &self.history
    }

    pub fn year(&self, age: u8) -> Option<&YearlyProgress> {
        self.years.iter().find(|y| y.age_year == age)
    }

    pub(super) fn year_mut(&mut self, age: u8) -> Option<&mut YearlyProgress> {
        self.years.iter_mut().find(|y| y.age_year == age)
    }

    /// Apply an approved graduation: close `age`, record history, open `next`
    pub(super) fn graduate(
        &mut self,
        age: u8,
        record: GraduationHistory,
        next: YearlyProgress,
    ) -> Result<()> {
        let year = self
            .year_mut(age)
            .ok_or(EngineError::UnknownYear { age })?;
        if year.graduation_status != GraduationStatus::PendingApproval {
            return Err(EngineError::InvalidTransition {
                from: year.graduation_status.as_str().to_string(),
                action: "graduate".to_string(),
            });
        }
        year.graduation_status = GraduationStatus::Graduated;
        self.history.push(record);
        self.years.push(next);
        Ok(())
    }
}
