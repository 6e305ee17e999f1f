//! Data models for learner progress
//!
//! These are the plain records exchanged with the persistence collaborator.
//! The engine receives them, returns updated copies, and never performs I/O.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::streaks::StreakInfo;

/// Raw completed-activity event as reported by an activity screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub mode: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(default)]
    pub score: u32,
    /// Correct answers (None when the activity has no right/wrong notion)
    #[serde(default)]
    pub correct: Option<u32>,
    #[serde(default)]
    pub attempts: Option<u32>,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub stars: u32,
    /// Counting modes only
    #[serde(default)]
    pub highest_number: Option<u32>,
}

fn default_level() -> u32 {
    1
}

/// A completed session. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub duration_seconds: u32,
    pub mode: String,
    pub score: u32,
    /// 0.0 - 1.0
    pub accuracy: Option<f64>,
    pub level: u32,
    pub stars: u32,
    pub highest_number: Option<u32>,
    pub age_year: u8,
}

/// Ordered, append-only session log with a retention policy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionHistory {
    records: Vec<SessionRecord>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<SessionRecord>) -> Self {
        Self { records }
    }

    /// Append a session, preserving insertion order
    pub fn push(&mut self, record: SessionRecord) {
        self.records.push(record);
    }

    /// Drop the oldest entries so that at most `max` remain.
    /// Returns the number of pruned entries.
    pub fn prune(&mut self, max: usize) -> usize {
        if self.records.len() <= max {
            return 0;
        }
        let excess = self.records.len() - max;
        self.records.drain(..excess);
        excess
    }

    pub fn records(&self) -> &[SessionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&SessionRecord> {
        self.records.last()
    }

    /// Sessions for one mode, oldest first
    pub fn for_mode<'a>(&'a self, mode: &'a str) -> impl DoubleEndedIterator<Item = &'a SessionRecord> + 'a {
        self.records.iter().filter(move |r| r.mode == mode)
    }

    /// Sessions recorded while the learner was in `age_year`
    pub fn for_age_year(&self, age_year: u8) -> impl Iterator<Item = &SessionRecord> {
        self.records.iter().filter(move |r| r.age_year == age_year)
    }
}

/// Per-learner running aggregate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub highest_number_reached: u32,
    pub total_sessions: u64,
    pub total_time_minutes: f64,
    pub current_level: u32,
    pub stars: u32,
    pub streak_days: u32,
    pub best_streak_days: u32,
    pub last_session_date: Option<NaiveDate>,
    pub badges_earned: BTreeSet<String>,
    /// Highest level ever played per mode, kept past log pruning
    #[serde(default)]
    pub mode_levels: BTreeMap<String, u32>,
}

impl Progress {
    /// Merge another snapshot of the same learner into this one.
    ///
    /// Monotonic fields take the maximum, badge sets are unioned, and the
    /// remaining fields follow whichever snapshot saw the latest session.
    pub fn merge(&mut self, other: &Progress) {
        let other_is_newer = other.last_session_date > self.last_session_date;

        self.highest_number_reached = self.highest_number_reached.max(other.highest_number_reached);
        self.total_sessions = self.total_sessions.max(other.total_sessions);
        self.total_time_minutes = self.total_time_minutes.max(other.total_time_minutes);
        self.stars = self.stars.max(other.stars);
        self.best_streak_days = self.best_streak_days.max(other.best_streak_days);
        self.badges_earned.extend(other.badges_earned.iter().cloned());
        for (mode, level) in &other.mode_levels {
            let entry = self.mode_levels.entry(mode.clone()).or_default();
            *entry = (*entry).max(*level);
        }

        if other_is_newer {
            self.current_level = other.current_level;
            self.streak_days = other.streak_days;
            self.last_session_date = other.last_session_date;
        }
    }

    /// Streak fields as a `StreakInfo`
    pub fn streak(&self) -> StreakInfo {
        StreakInfo {
            current: self.streak_days,
            best: self.best_streak_days,
            last_activity_day: self.last_session_date,
        }
    }
}

/// Graduation state of a yearly record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraduationStatus {
    InProgress,
    PendingApproval,
    Graduated,
}

impl GraduationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::PendingApproval => "pending_approval",
            Self::Graduated => "graduated",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::InProgress => "In progress",
            Self::PendingApproval => "Waiting for approval",
            Self::Graduated => "Graduated",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Graduated)
    }
}

/// Mastery snapshot for one mode within an age-year
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModeMastery {
    pub level: u32,
    pub accuracy: f64,
    pub stars: u32,
    /// 0 - 100
    pub mastery: f64,
    pub sessions: u32,
    pub last_session_at: Option<DateTime<Utc>>,
}

/// One record per (learner, age-year)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyProgress {
    pub age_year: u8,
    pub modes_mastered: BTreeMap<String, ModeMastery>,
    pub overall_mastery_percentage: f64,
    pub graduation_status: GraduationStatus,
    pub started_at: DateTime<Utc>,
}

impl YearlyProgress {
    /// Fresh record for a learner entering an age-year
    pub fn start(age_year: u8, started_at: DateTime<Utc>) -> Self {
        Self {
            age_year,
            modes_mastered: BTreeMap::new(),
            overall_mastery_percentage: 0.0,
            graduation_status: GraduationStatus::InProgress,
            started_at,
        }
    }

    pub fn mode(&self, mode: &str) -> Option<&ModeMastery> {
        self.modes_mastered.get(mode)
    }
}

/// Best performance for a mode as measured within one age-year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeVariantCompletion {
    pub mode: String,
    pub age_year: u8,
    pub highest_level_at_age: u32,
    pub accuracy_at_age: f64,
    pub stars_earned_at_age: u32,
    pub completed_at: DateTime<Utc>,
}

/// Snapshot attached to a graduation record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraduationSummary {
    pub overall_mastery_percentage: f64,
    pub met_requirements: Vec<String>,
    pub total_stars: u32,
    pub modes: BTreeMap<String, f64>,
}

/// Immutable audit record written once per graduation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraduationHistory {
    pub id: Uuid,
    pub from_age: u8,
    pub to_age: u8,
    pub graduated_at: DateTime<Utc>,
    pub approved_by: String,
    pub summary: GraduationSummary,
}

/// A badge held by a learner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBadge {
    pub user_id: String,
    pub badge_id: String,
    pub earned_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn session(mode: &str, minute: u32) -> SessionRecord {
        SessionRecord {
            id: Uuid::new_v4(),
            date: Utc.with_ymd_and_hms(2026, 3, 1, 9, minute, 0).unwrap(),
            duration_seconds: 60,
            mode: mode.to_string(),
            score: 5,
            accuracy: Some(0.8),
            level: 2,
            stars: 1,
            highest_number: None,
            age_year: 5,
        }
    }

    #[test]
    fn test_history_prune_keeps_most_recent() {
        let mut history = SessionHistory::new();
        for minute in 0..5 {
            history.push(session("puzzle", minute));
        }

        assert_eq!(history.prune(3), 2);
        assert_eq!(history.len(), 3);
        let minutes: Vec<u32> = history
            .records()
            .iter()
            .map(|r| chrono::Timelike::minute(&r.date))
            .collect();
        assert_eq!(minutes, vec![2, 3, 4]);

        assert_eq!(history.prune(10), 0);
    }

    #[test]
    fn test_progress_merge_never_regresses() {
        let mut stored = Progress {
            highest_number_reached: 20,
            total_sessions: 12,
            stars: 30,
            last_session_date: NaiveDate::from_ymd_opt(2026, 3, 2),
            ..Default::default()
        };
        let stale = Progress {
            highest_number_reached: 15,
            total_sessions: 10,
            stars: 25,
            current_level: 9,
            last_session_date: NaiveDate::from_ymd_opt(2026, 3, 1),
            badges_earned: BTreeSet::from(["first_steps".to_string()]),
            ..Default::default()
        };

        stored.merge(&stale);

        assert_eq!(stored.highest_number_reached, 20);
        assert_eq!(stored.total_sessions, 12);
        assert_eq!(stored.stars, 30);
        assert_eq!(stored.current_level, 0);
        assert!(stored.badges_earned.contains("first_steps"));
    }

    #[test]
    fn test_merge_keeps_highest_mode_level() {
        let mut stored = Progress {
            mode_levels: BTreeMap::from([("puzzle".to_string(), 8), ("drawing".to_string(), 2)]),
            ..Default::default()
        };
        let other = Progress {
            mode_levels: BTreeMap::from([("puzzle".to_string(), 3), ("drawing".to_string(), 5)]),
            ..Default::default()
        };

        stored.merge(&other);
        assert_eq!(stored.mode_levels["puzzle"], 8);
        assert_eq!(stored.mode_levels["drawing"], 5);
    }

    #[test]
    fn test_streak_view_matches_fields() {
        let progress = Progress {
            streak_days: 3,
            best_streak_days: 5,
            last_session_date: NaiveDate::from_ymd_opt(2026, 3, 2),
            ..Default::default()
        };
        let streak = progress.streak();
        assert_eq!((streak.current, streak.best), (3, 5));
        assert!(streak.is_active(NaiveDate::from_ymd_opt(2026, 3, 3).unwrap()));
        assert!(GraduationStatus::Graduated.is_terminal());
    }
}
