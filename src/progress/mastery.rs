//! Mastery calculation
//!
//! Folds the session log into per-mode mastery (0-100) for the active
//! age-year and an overall score. Pure: the caller persists the result.
//!
//! Per mode: `100 * (wa * accuracy + wl * level / max_level_for_age)`, where
//! accuracy is the mean over the most recent `accuracy_window` retained
//! sessions that report one. Modes that never report accuracy (e.g. free-form
//! puzzles) use the level ratio alone.
//!
//! Entries are folded incrementally: only the sessions added by the current
//! call move a mode, and level, stars and session counts build on the stored
//! entry so retention pruning never lowers them.

use std::collections::BTreeSet;

use tracing::debug;

use super::models::{ModeMastery, SessionHistory, SessionRecord, YearlyProgress};
use crate::config::MasterySettings;
use crate::curriculum::AgeVariantResolver;

/// Blend accuracy and level progress into a 0-100 score
pub fn blend_mastery(
    accuracy: Option<f64>,
    level: u32,
    max_level: u32,
    weights: (f64, f64),
) -> f64 {
    let ratio = if max_level == 0 {
        0.0
    } else {
        (level as f64 / max_level as f64).min(1.0)
    };

    let raw = match accuracy {
        Some(acc) if acc.is_finite() => {
            let (wa, wl) = weights;
            wa * acc.clamp(0.0, 1.0) + wl * ratio
        }
        _ => ratio,
    };

    clamp_percentage(raw * 100.0)
}

/// Clamp to 0-100, rounded to hundredths
fn clamp_percentage(value: f64) -> f64 {
    if value.is_finite() {
        ((value * 100.0).round() / 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Computes `YearlyProgress` mastery from session history
pub struct MasteryCalculator<'a> {
    resolver: AgeVariantResolver<'a>,
    settings: &'a MasterySettings,
}

impl<'a> MasteryCalculator<'a> {
    pub fn new(resolver: AgeVariantResolver<'a>, settings: &'a MasterySettings) -> Self {
        Self { resolver, settings }
    }

    /// Fold the sessions `added` by this call into the year of `current`.
    ///
    /// `history` must already contain `added` (minus anything pruned). Modes
    /// without an added session keep their stored entry unchanged. Sessions
    /// are matched to the year by their `age_year` tag only.
    pub fn compute(
        &self,
        history: &SessionHistory,
        current: &YearlyProgress,
        added: &[&SessionRecord],
    ) -> YearlyProgress {
        let age = current.age_year;
        let added: Vec<&SessionRecord> = added
            .iter()
            .copied()
            .filter(|s| s.age_year == age)
            .collect();

        let mut next = current.clone();
        for mode in self.resolver.tracked_modes(age) {
            next.modes_mastered.entry(mode.to_string()).or_default();
        }

        let touched: BTreeSet<&str> = added.iter().map(|s| s.mode.as_str()).collect();
        for mode in touched {
            let Some(max_level) = self.resolver.max_level(mode, age) else {
                continue;
            };
            let new: Vec<&SessionRecord> =
                added.iter().copied().filter(|s| s.mode == mode).collect();
            let previous = current.modes_mastered.get(mode);
            let entry = self.fold_entry(mode, previous, &new, history, age, max_level);

            if previous.map(|p| p.mastery) != Some(entry.mastery) {
                debug!("Mastery for '{}' at age {}: {:.1}", mode, age, entry.mastery);
            }
            next.modes_mastered.insert(mode.to_string(), entry);
        }

        next.overall_mastery_percentage = overall(&next);
        next
    }

    fn fold_entry(
        &self,
        mode: &str,
        previous: Option<&ModeMastery>,
        new: &[&SessionRecord],
        history: &SessionHistory,
        age: u8,
        max_level: u32,
    ) -> ModeMastery {
        let base = previous.cloned().unwrap_or_default();

        let level = new.iter().map(|s| s.level).fold(base.level, u32::max);
        let stars = new
            .iter()
            .fold(base.stars, |total, s| total.saturating_add(s.stars));
        let added = u32::try_from(new.len()).unwrap_or(u32::MAX);
        let last_session_at = new.iter().map(|s| s.date).chain(base.last_session_at).max();

        let window = self.settings.accuracy_window.max(1);
        let retained = history
            .for_mode(mode)
            .rev()
            .filter(|s| s.age_year == age)
            .filter_map(|s| s.accuracy)
            .filter(|a| a.is_finite());
        // Added sessions may already be pruned when retention is tiny
        let accuracy = mean(retained.take(window)).or_else(|| {
            let fresh = new.iter().rev().filter_map(|s| s.accuracy);
            mean(fresh.filter(|a| a.is_finite()).take(window))
        });

        let mastery = blend_mastery(accuracy, level, max_level, self.settings.normalized_weights());

        ModeMastery {
            level,
            accuracy: accuracy.unwrap_or(0.0),
            stars,
            mastery,
            sessions: base.sessions.saturating_add(added),
            last_session_at,
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Arithmetic mean over every tracked mode; unattempted modes count as 0
fn overall(yearly: &YearlyProgress) -> f64 {
    if yearly.modes_mastered.is_empty() {
        return 0.0;
    }
    let total: f64 = yearly.modes_mastered.values().map(|m| m.mastery).sum();
    clamp_percentage(total / yearly.modes_mastered.len() as f64)
}
