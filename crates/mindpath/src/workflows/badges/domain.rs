use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::criteria::BadgeCriteria;

/// Identifier wrapper for learner accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LearnerId(pub String);

/// Identifier wrapper for badge definitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BadgeId(pub String);

impl fmt::Display for LearnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for BadgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Streak state reported by the progress source.
///
/// Activity streaks are not computed yet, so every production provider reports
/// `NotTracked` and `daily_streak` criteria stay unmet until they are.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "days")]
pub enum StreakStatus {
    #[default]
    NotTracked,
    Days(u32),
}

impl StreakStatus {
    pub const fn days(self) -> Option<u32> {
        match self {
            StreakStatus::NotTracked => None,
            StreakStatus::Days(days) => Some(days),
        }
    }
}

/// Read-only aggregate of the learner activity that badge criteria inspect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnerProgressSnapshot {
    pub completed_course_count: u32,
    pub completed_mental_health_course_count: u32,
    pub perfect_quiz_count: u32,
    pub current_streak: StreakStatus,
    pub account_created_at: DateTime<Utc>,
}

/// Catalog entry for an awardable badge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeDefinition {
    pub id: BadgeId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub is_active: bool,
    #[serde(default)]
    pub criteria: Option<BadgeCriteria>,
}

/// Persisted fact that a learner earned a badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardRecord {
    pub learner_id: LearnerId,
    pub badge_id: BadgeId,
    pub achieved_at: DateTime<Utc>,
}
