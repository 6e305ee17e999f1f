//! Progression engine - runs the full per-session pipeline
//!
//! ```text
//! ActivityEvent
//!   └─► record session ─► progress / streak / completion
//!         └─► recompute mastery (active age-year)
//!               └─► evaluate + award badges
//!                     └─► check graduation readiness
//! ```
//!
//! The engine works on an in-memory `LearnerState` snapshot. Loading and
//! saving that snapshot is the store's job.

use std::borrow::Cow;
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::badges::{award, BadgeCatalog, BadgeEvaluator};
use crate::config::Config;
use crate::curriculum::{AgeVariantConfig, AgeVariantResolver, CurriculumTable};
use crate::error::{EngineError, Result};
use crate::graduation::{GraduationStateMachine, Requirement, YearLedger};
use crate::progress::{
    ActivityEvent, AgeVariantCompletion, GraduationHistory, MasteryCalculator, Progress,
    SessionHistory, SessionRecord, SessionRecorder, StreakChange, UserBadge,
};

/// Everything the engine knows about one learner
#[derive(Debug, Clone)]
pub struct LearnerState {
    pub user_id: String,
    pub progress: Progress,
    pub sessions: SessionHistory,
    pub years: YearLedger,
    pub completions: Vec<AgeVariantCompletion>,
    pub badges: Vec<UserBadge>,
}

impl LearnerState {
    /// Fresh learner starting at `age`
    pub fn enroll(user_id: &str, age: u8, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            progress: Progress::default(),
            sessions: SessionHistory::new(),
            years: YearLedger::enroll(age, now),
            completions: Vec::new(),
            badges: Vec::new(),
        }
    }

    /// Age-year currently being played
    pub fn current_age(&self) -> Option<u8> {
        self.years.active().map(|y| y.age_year)
    }

    fn earned_ids(&self) -> BTreeSet<String> {
        let mut earned = self.progress.badges_earned.clone();
        earned.extend(self.badges.iter().map(|b| b.badge_id.clone()));
        earned
    }
}

/// Events emitted while processing a session, in celebration order
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    SessionRecorded { session_id: Uuid, mode: String },
    StreakExtended { days: u32 },
    MasteryUpdated { mode: String, previous: f64, current: f64 },
    BadgeEarned(UserBadge),
    ReadyForGraduation { age_year: u8, overall_mastery: f64 },
}

/// Runs sessions through recording, mastery, badges and graduation
#[derive(Debug, Clone)]
pub struct ProgressEngine {
    config: Config,
    badges: Cow<'static, BadgeCatalog>,
    curriculum: Cow<'static, CurriculumTable>,
}

impl ProgressEngine {
    pub fn new(
        config: Config,
        badges: Cow<'static, BadgeCatalog>,
        curriculum: Cow<'static, CurriculumTable>,
    ) -> Self {
        Self {
            config,
            badges,
            curriculum,
        }
    }

    /// Build an engine using catalog overrides from `config`, falling back to
    /// the embedded catalogs
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let badges = match &config.catalogs.badges {
            Some(path) => Cow::Owned(BadgeCatalog::from_file(path)?),
            None => Cow::Borrowed(BadgeCatalog::builtin()?),
        };
        let curriculum = match &config.catalogs.curriculum {
            Some(path) => Cow::Owned(CurriculumTable::from_file(path)?),
            None => Cow::Borrowed(CurriculumTable::builtin()?),
        };
        Ok(Self::new(config, badges, curriculum))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn badge_catalog(&self) -> &BadgeCatalog {
        &self.badges
    }

    pub fn resolver(&self) -> AgeVariantResolver<'_> {
        AgeVariantResolver::new(&self.curriculum)
    }

    /// Apply one completed activity to the learner.
    ///
    /// Validation happens before any mutation, so an error leaves `state`
    /// untouched.
    pub fn process_session(
        &self,
        state: &mut LearnerState,
        event: &ActivityEvent,
        now: DateTime<Utc>,
    ) -> Result<Vec<ProgressEvent>> {
        let age = state.current_age().ok_or(EngineError::NoActiveYear)?;
        let recorder = SessionRecorder::new();
        let record = recorder.normalize(event, age)?;

        if self.resolver().max_level(&record.mode, age).is_none() {
            debug!("Mode '{}' has no curriculum band at age {}", record.mode, age);
        }

        let mut events = vec![ProgressEvent::SessionRecorded {
            session_id: record.id,
            mode: record.mode.clone(),
        }];

        state.sessions.push(record.clone());
        let pruned = state.sessions.prune(self.config.history.max_sessions);
        if pruned > 0 {
            debug!("Pruned {} old sessions for {}", pruned, state.user_id);
        }

        if let StreakChange::Extended(days) = recorder.apply(&mut state.progress, &record) {
            if days > 1 {
                events.push(ProgressEvent::StreakExtended { days });
            }
        }

        let slot = state
            .completions
            .iter()
            .position(|c| c.mode == record.mode && c.age_year == record.age_year);
        let existing = slot.map(|i| &state.completions[i]);
        if let Some(updated) = recorder.update_completion(existing, &record) {
            match slot {
                Some(i) => state.completions[i] = updated,
                None => state.completions.push(updated),
            }
        }

        events.extend(self.refresh_mastery(state, &record)?);

        let earned = self.evaluate_badges(state, now);
        events.extend(earned.into_iter().map(ProgressEvent::BadgeEarned));

        let machine = GraduationStateMachine::new(&self.config.graduation);
        if machine.check_readiness(&mut state.years, &state.sessions, now)? {
            if let Some(active) = state.years.active() {
                events.push(ProgressEvent::ReadyForGraduation {
                    age_year: active.age_year,
                    overall_mastery: active.overall_mastery_percentage,
                });
            }
        }

        Ok(events)
    }

    fn refresh_mastery(
        &self,
        state: &mut LearnerState,
        record: &SessionRecord,
    ) -> Result<Vec<ProgressEvent>> {
        let calculator = MasteryCalculator::new(self.resolver(), &self.config.mastery);
        let active = state.years.active_mut().ok_or(EngineError::NoActiveYear)?;
        let next = calculator.compute(&state.sessions, active, &[record]);

        let events = next
            .modes_mastered
            .iter()
            .filter_map(|(mode, entry)| {
                let previous = active.mode(mode).map(|m| m.mastery).unwrap_or(0.0);
                (entry.mastery != previous).then(|| ProgressEvent::MasteryUpdated {
                    mode: mode.clone(),
                    previous,
                    current: entry.mastery,
                })
            })
            .collect();

        *active = next;
        Ok(events)
    }

    /// Evaluate the catalog and record any new badges on the learner
    fn evaluate_badges(&self, state: &mut LearnerState, now: DateTime<Utc>) -> Vec<UserBadge> {
        let earned = state.earned_ids();
        let ids =
            BadgeEvaluator::new(&self.badges).evaluate(&state.progress, &state.sessions, &earned);
        let awarded = award(&state.user_id, &ids, &state.badges, now);

        for badge in &awarded {
            state.progress.badges_earned.insert(badge.badge_id.clone());
            state.badges.push(badge.clone());
        }
        awarded
    }

    /// Readiness requirements for the active year, for status displays
    pub fn requirements(&self, state: &LearnerState, now: DateTime<Utc>) -> Result<Vec<Requirement>> {
        let active = state.years.active().ok_or(EngineError::NoActiveYear)?;
        Ok(GraduationStateMachine::new(&self.config.graduation).requirements(
            active,
            &state.sessions,
            now,
        ))
    }

    /// Approve the pending graduation of `age_year`
    pub fn approve(
        &self,
        state: &mut LearnerState,
        age_year: u8,
        approved_by: &str,
        now: DateTime<Utc>,
    ) -> Result<GraduationHistory> {
        GraduationStateMachine::new(&self.config.graduation).approve(
            &mut state.years,
            age_year,
            approved_by,
            state.progress.stars,
            &state.sessions,
            now,
        )
    }

    /// Decline the pending graduation of `age_year`
    pub fn reject(&self, state: &mut LearnerState, age_year: u8) -> Result<()> {
        GraduationStateMachine::new(&self.config.graduation).reject(&mut state.years, age_year)
    }

    /// Variant config a screen should use for `mode` at the learner's age
    pub fn select_mode(&self, state: &LearnerState, mode: &str) -> Result<&AgeVariantConfig> {
        let age = state.current_age().ok_or(EngineError::NoActiveYear)?;
        self.resolver().resolve_or_nearest(mode, age)
    }
}
