//! Badge evaluation
//!
//! Walks each catalog entry's criteria tree against the learner's progress
//! and session log. Evaluation is deterministic and side-effect free; the
//! caller writes the resulting `UserBadge`s.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::catalog::BadgeCatalog;
use super::definitions::BadgeCriteria;
use crate::progress::{Progress, SessionHistory, SessionRecord, UserBadge};

/// Evaluates a badge catalog against learner state
#[derive(Debug, Clone, Copy)]
pub struct BadgeEvaluator<'a> {
    catalog: &'a BadgeCatalog,
}

impl<'a> BadgeEvaluator<'a> {
    pub fn new(catalog: &'a BadgeCatalog) -> Self {
        Self { catalog }
    }

    /// IDs of badges whose criteria now hold and that are not in
    /// `already_earned`, in catalog order.
    pub fn evaluate(
        &self,
        progress: &Progress,
        history: &SessionHistory,
        already_earned: &BTreeSet<String>,
    ) -> Vec<String> {
        let mut newly_earned = Vec::new();

        for badge in self.catalog.badges() {
            if already_earned.contains(&badge.id) {
                continue;
            }
            if self.holds(&badge.criteria, progress, history, already_earned) {
                debug!("Badge '{}' criteria met ({})", badge.id, badge.criteria.kind());
                newly_earned.push(badge.id.clone());
            }
        }

        newly_earned
    }

    /// Evaluate one criteria tree
    pub fn holds(
        &self,
        criteria: &BadgeCriteria,
        progress: &Progress,
        history: &SessionHistory,
        already_earned: &BTreeSet<String>,
    ) -> bool {
        match criteria {
            BadgeCriteria::ModeComplete {
                mode_id,
                completion_level,
            } => highest_level(progress, history, mode_id) >= *completion_level,

            BadgeCriteria::AccuracyThreshold {
                mode_id,
                accuracy_target,
                window,
            } => match mean_accuracy(history, mode_id.as_deref(), *window) {
                Some(accuracy) => accuracy >= *accuracy_target,
                None => false,
            },

            BadgeCriteria::Streak { streak_target } => progress.streak_days >= *streak_target,

            BadgeCriteria::Speed {
                mode_id,
                speed_target,
                min_accuracy,
            } => sessions_for(history, mode_id.as_deref()).any(|s| {
                s.duration_seconds <= *speed_target
                    && s.accuracy.is_some_and(|a| a >= *min_accuracy)
            }),

            BadgeCriteria::TotalStars { star_target } => progress.stars >= *star_target,

            BadgeCriteria::MultiCondition { conditions } => conditions
                .iter()
                .all(|c| self.holds(c, progress, history, already_earned)),

            // An already-earned reference stays satisfied even if its raw
            // condition no longer holds (e.g. a broken streak)
            BadgeCriteria::BadgeRef { badge_id } => {
                already_earned.contains(badge_id)
                    || self.catalog.get(badge_id).is_some_and(|b| {
                        self.holds(&b.criteria, progress, history, already_earned)
                    })
            }
        }
    }
}

/// Catalog-order evaluation without constructing an evaluator
pub fn evaluate(
    catalog: &BadgeCatalog,
    progress: &Progress,
    history: &SessionHistory,
    already_earned: &BTreeSet<String>,
) -> Vec<String> {
    BadgeEvaluator::new(catalog).evaluate(progress, history, already_earned)
}

/// Create `UserBadge` records for newly earned IDs.
///
/// IDs the user already holds are skipped, as are repeats within `ids`, so
/// awarding the same evaluation result twice never duplicates a badge.
pub fn award(
    user_id: &str,
    ids: &[String],
    existing: &[UserBadge],
    earned_at: DateTime<Utc>,
) -> Vec<UserBadge> {
    let mut held: BTreeSet<&str> = existing
        .iter()
        .filter(|b| b.user_id == user_id)
        .map(|b| b.badge_id.as_str())
        .collect();

    let mut awarded = Vec::new();
    for id in ids {
        if !held.insert(id.as_str()) {
            continue;
        }
        info!("Badge '{}' awarded to {}", id, user_id);
        awarded.push(UserBadge {
            user_id: user_id.to_string(),
            badge_id: id.clone(),
            earned_at,
        });
    }
    awarded
}

fn sessions_for<'h>(
    history: &'h SessionHistory,
    mode_id: Option<&'h str>,
) -> impl DoubleEndedIterator<Item = &'h SessionRecord> + 'h {
    history
        .records()
        .iter()
        .filter(move |s| mode_id.is_none_or(|m| s.mode == m))
}

/// Levels from pruned sessions live on in `Progress::mode_levels`
fn highest_level(progress: &Progress, history: &SessionHistory, mode_id: &str) -> u32 {
    let stored = progress.mode_levels.get(mode_id).copied().unwrap_or(0);
    history.for_mode(mode_id).map(|s| s.level).fold(stored, u32::max)
}

/// Mean accuracy over the last `window` sessions that report one (lifetime
/// when `window` is `None`). `None` if there are not enough sessions.
fn mean_accuracy(history: &SessionHistory, mode_id: Option<&str>, window: Option<usize>) -> Option<f64> {
    let scored = sessions_for(history, mode_id)
        .rev()
        .filter_map(|s| s.accuracy)
        .filter(|a| a.is_finite());

    let values: Vec<f64> = match window {
        Some(0) => return None,
        Some(n) => {
            let recent: Vec<f64> = scored.take(n).collect();
            if recent.len() < n {
                return None;
            }
            recent
        }
        None => scored.collect(),
    };

    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
