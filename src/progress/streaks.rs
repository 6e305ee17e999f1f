//! Daily streak tracking
//!
//! A streak counts consecutive calendar days with at least one session.

use chrono::NaiveDate;

/// Result of applying a session day to a streak
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakChange {
    /// Already counted today
    Unchanged,
    /// Continued from yesterday (or started fresh)
    Extended(u32),
    /// Gap detected, restarted at 1
    Reset,
}

/// Streak state as stored on `Progress`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreakInfo {
    pub current: u32,
    pub best: u32,
    pub last_activity_day: Option<NaiveDate>,
}

impl StreakInfo {
    /// Check if the streak is still alive on `today` (activity today or yesterday)
    pub fn is_active(&self, today: NaiveDate) -> bool {
        let Some(last) = self.last_activity_day else {
            return false;
        };
        (today - last).num_days() <= 1
    }

    /// Apply a session that happened on `day`.
    ///
    /// Sessions reported out of order (before the last counted day) leave the
    /// streak alone.
    pub fn record_day(&mut self, day: NaiveDate) -> StreakChange {
        let change = match self.last_activity_day {
            Some(last) if day <= last => return StreakChange::Unchanged,
            Some(last) if (day - last).num_days() == 1 => {
                self.current += 1;
                StreakChange::Extended(self.current)
            }
            Some(_) => {
                self.current = 1;
                StreakChange::Reset
            }
            None => {
                self.current = 1;
                StreakChange::Extended(1)
            }
        };

        self.best = self.best.max(self.current);
        self.last_activity_day = Some(day);
        change
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    #[test]
    fn test_streak_extends_on_consecutive_days() {
        let mut streak = StreakInfo::default();
        assert_eq!(streak.record_day(day(1)), StreakChange::Extended(1));
        assert_eq!(streak.record_day(day(1)), StreakChange::Unchanged);
        assert_eq!(streak.record_day(day(2)), StreakChange::Extended(2));
        assert_eq!(streak.record_day(day(3)), StreakChange::Extended(3));
        assert_eq!(streak.best, 3);
    }

    #[test]
    fn test_streak_resets_after_gap() {
        let mut streak = StreakInfo::default();
        streak.record_day(day(1));
        streak.record_day(day(2));
        assert_eq!(streak.record_day(day(5)), StreakChange::Reset);
        assert_eq!(streak.current, 1);
        assert_eq!(streak.best, 2);
    }

    #[test]
    fn test_is_active() {
        let mut streak = StreakInfo::default();
        assert!(!streak.is_active(day(1)));
        streak.record_day(day(1));
        assert!(streak.is_active(day(2)));
        assert!(!streak.is_active(day(3)));
    }
}
