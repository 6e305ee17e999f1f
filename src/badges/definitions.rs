//! Badge definitions and unlock criteria
//!
//! Badges are configuration data: each catalog entry carries a tagged
//! `BadgeCriteria` tree that the evaluator walks depth-first.

use serde::{Deserialize, Serialize};

/// Badge category for grouping in UI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeCategory {
    Counting,
    Puzzle,
    Math,
    Streak,
    Stars,
    #[default]
    Special,
}

impl BadgeCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Counting => "Counting",
            Self::Puzzle => "Puzzles",
            Self::Math => "Math",
            Self::Streak => "Streaks",
            Self::Stars => "Stars",
            Self::Special => "Special",
        }
    }
}

/// Unlock condition for a badge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BadgeCriteria {
    /// Highest level reached in a mode is at least `completion_level`
    ModeComplete { mode_id: String, completion_level: u32 },

    /// Mean accuracy reaches `accuracy_target` (0.0 - 1.0).
    ///
    /// With a `window`, only the most recent `window` sessions count and at
    /// least that many must exist. Without one, lifetime accuracy is used.
    /// `mode_id` of `None` means all modes.
    AccuracyThreshold {
        #[serde(default)]
        mode_id: Option<String>,
        accuracy_target: f64,
        #[serde(default)]
        window: Option<usize>,
    },

    /// Daily streak reaches `streak_target` days
    Streak { streak_target: u32 },

    /// Some session finished within `speed_target` seconds with at least
    /// `min_accuracy` correctness
    Speed {
        #[serde(default)]
        mode_id: Option<String>,
        speed_target: u32,
        #[serde(default = "default_min_accuracy")]
        min_accuracy: f64,
    },

    /// Lifetime stars reach `star_target`
    TotalStars { star_target: u32 },

    /// Every nested condition holds
    MultiCondition { conditions: Vec<BadgeCriteria> },

    /// The criteria of another catalog badge hold
    BadgeRef { badge_id: String },
}

fn default_min_accuracy() -> f64 {
    1.0
}

impl BadgeCriteria {
    /// Short tag, matching the serialized `type`
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ModeComplete { .. } => "mode_complete",
            Self::AccuracyThreshold { .. } => "accuracy_threshold",
            Self::Streak { .. } => "streak",
            Self::Speed { .. } => "speed",
            Self::TotalStars { .. } => "total_stars",
            Self::MultiCondition { .. } => "multi_condition",
            Self::BadgeRef { .. } => "badge_ref",
        }
    }

    /// IDs of badges referenced anywhere in this criteria tree
    pub fn referenced_badges(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        self.collect_refs(&mut refs);
        refs
    }

    fn collect_refs<'a>(&'a self, refs: &mut Vec<&'a str>) {
        match self {
            Self::BadgeRef { badge_id } => refs.push(badge_id.as_str()),
            Self::MultiCondition { conditions } => {
                for condition in conditions {
                    condition.collect_refs(refs);
                }
            }
            _ => {}
        }
    }
}

/// Badge catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub category: BadgeCategory,
    /// Hidden badges are evaluated like any other; only the UI hides them
    #[serde(default)]
    pub is_hidden: bool,
    pub criteria: BadgeCriteria,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criteria_parse_from_toml() {
        let badge: Badge = toml::from_str(
            r#"
            id = "counting_star"
            name = "Counting Star"

            [criteria]
            type = "multi_condition"

            [[criteria.conditions]]
            type = "badge_ref"
            badge_id = "count_to_20"

            [[criteria.conditions]]
            type = "speed"
            speed_target = 60
            "#,
        )
        .unwrap();

        assert_eq!(badge.category, BadgeCategory::Special);
        assert!(!badge.is_hidden);
        assert_eq!(badge.criteria.kind(), "multi_condition");
        assert_eq!(badge.criteria.referenced_badges(), vec!["count_to_20"]);

        let BadgeCriteria::MultiCondition { conditions } = &badge.criteria else {
            panic!("expected multi_condition");
        };
        assert_eq!(
            conditions[1],
            BadgeCriteria::Speed {
                mode_id: None,
                speed_target: 60,
                min_accuracy: 1.0
            }
        );
    }
}
