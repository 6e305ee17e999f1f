//! Session recorder
//!
//! Normalizes completed-activity events into `SessionRecord`s and folds them
//! into the running `Progress` and per-age completion snapshots.

use tracing::debug;
use uuid::Uuid;

use super::models::{ActivityEvent, AgeVariantCompletion, Progress, SessionRecord};
use super::streaks::StreakChange;
use crate::error::{EngineError, Result};

/// Turns activity events into immutable session records
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionRecorder;

impl SessionRecorder {
    pub fn new() -> Self {
        Self
    }

    /// Normalize a raw event recorded while the learner was in `age_year`.
    ///
    /// Duration is clamped at zero for clocks that went backwards. Accuracy is
    /// only set when the event reports attempts.
    pub fn normalize(&self, event: &ActivityEvent, age_year: u8) -> Result<SessionRecord> {
        let mode = event.mode.trim();
        if mode.is_empty() {
            return Err(EngineError::InvalidSession("mode is empty".to_string()));
        }

        let accuracy = match (event.correct, event.attempts) {
            (Some(correct), Some(attempts)) if correct > attempts => {
                return Err(EngineError::InvalidSession(format!(
                    "{} correct answers out of {} attempts",
                    correct, attempts
                )));
            }
            (Some(_), Some(0)) | (None, _) | (_, None) => None,
            (Some(correct), Some(attempts)) => Some(correct as f64 / attempts as f64),
        };

        let duration_seconds = (event.finished_at - event.started_at)
            .num_seconds()
            .clamp(0, u32::MAX as i64) as u32;

        Ok(SessionRecord {
            id: Uuid::new_v4(),
            date: event.finished_at,
            duration_seconds,
            mode: mode.to_string(),
            score: event.score,
            accuracy,
            level: event.level,
            stars: event.stars,
            highest_number: event.highest_number,
            age_year,
        })
    }

    /// Fold a session into the running progress aggregate.
    ///
    /// Monotonic fields only ever grow: counts and stars saturate instead of
    /// wrapping and `highest_number_reached` takes the max.
    pub fn apply(&self, progress: &mut Progress, record: &SessionRecord) -> StreakChange {
        progress.total_sessions = progress.total_sessions.saturating_add(1);
        progress.total_time_minutes += record.duration_seconds as f64 / 60.0;
        progress.stars = progress.stars.saturating_add(record.stars);
        if let Some(n) = record.highest_number {
            progress.highest_number_reached = progress.highest_number_reached.max(n);
        }

        let level = progress.mode_levels.entry(record.mode.clone()).or_default();
        *level = (*level).max(record.level);

        let mut streak = progress.streak();
        let change = streak.record_day(record.date.date_naive());

        // Out-of-order sessions don't move the "latest" fields
        if progress.last_session_date.is_none_or(|last| record.date.date_naive() >= last) {
            progress.current_level = record.level;
        }

        progress.streak_days = streak.current;
        progress.best_streak_days = streak.best;
        progress.last_session_date = streak.last_activity_day;

        debug!(
            "Recorded '{}' session: total={} stars={} streak={}",
            record.mode, progress.total_sessions, progress.stars, progress.streak_days
        );
        change
    }

    /// Update the (mode, age) completion snapshot with a session.
    ///
    /// Returns `None` when the session belongs to a different mode or
    /// age-year. Each field only moves to a better value and `completed_at`
    /// keeps the time the snapshot was first written.
    pub fn update_completion(
        &self,
        existing: Option<&AgeVariantCompletion>,
        record: &SessionRecord,
    ) -> Option<AgeVariantCompletion> {
        let accuracy = record.accuracy.filter(|a| a.is_finite()).unwrap_or(0.0);

        match existing {
            Some(current) if current.mode != record.mode || current.age_year != record.age_year => {
                None
            }
            Some(current) => Some(AgeVariantCompletion {
                mode: current.mode.clone(),
                age_year: current.age_year,
                highest_level_at_age: current.highest_level_at_age.max(record.level),
                accuracy_at_age: current.accuracy_at_age.max(accuracy),
                stars_earned_at_age: current.stars_earned_at_age.max(record.stars),
                completed_at: current.completed_at,
            }),
            None => Some(AgeVariantCompletion {
                mode: record.mode.clone(),
                age_year: record.age_year,
                highest_level_at_age: record.level,
                accuracy_at_age: accuracy,
                stars_earned_at_age: record.stars,
                completed_at: record.date,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, day, hour, 0, 0).unwrap()
    }

    fn event(day: u32, correct: u32, attempts: u32) -> ActivityEvent {
        ActivityEvent {
            mode: "counting-order".to_string(),
            started_at: at(day, 10) - Duration::seconds(90),
            finished_at: at(day, 10),
            score: correct,
            correct: Some(correct),
            attempts: Some(attempts),
            level: 3,
            stars: 2,
            highest_number: Some(12),
        }
    }

    #[test]
    fn test_normalize_computes_accuracy_and_duration() {
        let record = SessionRecorder::new().normalize(&event(1, 8, 10), 5).unwrap();
        assert_eq!(record.duration_seconds, 90);
        assert_eq!(record.accuracy, Some(0.8));
        assert_eq!(record.age_year, 5);
        assert_eq!(record.date, at(1, 10));
    }

    #[test]
    fn test_normalize_edge_cases() {
        let recorder = SessionRecorder::new();

        let zero_attempts = recorder.normalize(&event(1, 0, 0), 5).unwrap();
        assert_eq!(zero_attempts.accuracy, None);

        let mut backwards = event(1, 1, 1);
        backwards.started_at = backwards.finished_at + Duration::minutes(5);
        assert_eq!(recorder.normalize(&backwards, 5).unwrap().duration_seconds, 0);

        assert!(matches!(
            recorder.normalize(&event(1, 11, 10), 5),
            Err(EngineError::InvalidSession(_))
        ));

        let mut blank = event(1, 1, 1);
        blank.mode = "  ".to_string();
        assert!(recorder.normalize(&blank, 5).is_err());
    }

    #[test]
    fn test_apply_is_monotonic() {
        let recorder = SessionRecorder::new();
        let mut progress = Progress::default();

        let mut previous = progress.clone();
        for (day, highest) in [(1, 12), (2, 4), (2, 30), (6, 0)] {
            let mut e = event(day, 5, 5);
            e.highest_number = Some(highest);
            let record = recorder.normalize(&e, 5).unwrap();
            recorder.apply(&mut progress, &record);

            assert!(progress.total_sessions > previous.total_sessions);
            assert!(progress.stars >= previous.stars);
            assert!(progress.highest_number_reached >= previous.highest_number_reached);
            previous = progress.clone();
        }

        assert_eq!(progress.total_sessions, 4);
        assert_eq!(progress.highest_number_reached, 30);
        assert_eq!(progress.stars, 8);
        assert_eq!(progress.streak_days, 1);
        assert_eq!(progress.best_streak_days, 2);
        assert_eq!(progress.last_session_date, NaiveDate::from_ymd_opt(2026, 4, 6));
        assert!((progress.total_time_minutes - 6.0).abs() < 1e-9);
        assert_eq!(progress.mode_levels["counting-order"], 3);
    }

    #[test]
    fn test_completion_never_gets_worse() {
        let recorder = SessionRecorder::new();
        let good = recorder.normalize(&event(1, 10, 10), 5).unwrap();
        let first = recorder.update_completion(None, &good).unwrap();
        assert_eq!(first.accuracy_at_age, 1.0);

        let mut worse_event = event(2, 2, 10);
        worse_event.level = 1;
        worse_event.stars = 0;
        let worse = recorder.normalize(&worse_event, 5).unwrap();
        let second = recorder.update_completion(Some(&first), &worse).unwrap();

        assert_eq!(second.accuracy_at_age, 1.0);
        assert_eq!(second.highest_level_at_age, 3);
        assert_eq!(second.stars_earned_at_age, 2);
        assert_eq!(second.completed_at, first.completed_at);
    }

    #[test]
    fn test_completion_ignores_other_age_year() {
        let recorder = SessionRecorder::new();
        let at_five = recorder.normalize(&event(1, 10, 10), 5).unwrap();
        let completion = recorder.update_completion(None, &at_five).unwrap();

        let at_six = recorder.normalize(&event(2, 10, 10), 6).unwrap();
        assert!(recorder.update_completion(Some(&completion), &at_six).is_none());
    }
}
