use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{AwardRecord, BadgeDefinition, BadgeId, LearnerId, StreakStatus};
use super::evaluation::CriterionCheck;

/// Read side of learner activity. Each call is an atomic unit of work.
pub trait ProgressRepository: Send + Sync {
    fn count_completed_courses(&self, learner: &LearnerId) -> Result<u32, RepositoryError>;
    fn count_completed_courses_in_category(
        &self,
        learner: &LearnerId,
        category: &str,
    ) -> Result<u32, RepositoryError>;
    fn count_perfect_quiz_attempts(&self, learner: &LearnerId) -> Result<u32, RepositoryError>;
    fn account_created_at(&self, learner: &LearnerId) -> Result<DateTime<Utc>, RepositoryError>;

    /// Activity streaks are not computed by any store yet.
    fn current_streak(&self, _learner: &LearnerId) -> Result<StreakStatus, RepositoryError> {
        Ok(StreakStatus::NotTracked)
    }
}

/// Badge catalog and award storage.
///
/// `create_award` must enforce uniqueness of the (learner, badge) pair and
/// report a duplicate as [`RepositoryError::Conflict`].
pub trait BadgeRepository: Send + Sync {
    fn list_active_badges(&self) -> Result<Vec<BadgeDefinition>, RepositoryError>;
    fn find_award(
        &self,
        learner: &LearnerId,
        badge: &BadgeId,
    ) -> Result<Option<AwardRecord>, RepositoryError>;
    fn create_award(
        &self,
        learner: &LearnerId,
        badge: &BadgeId,
        achieved_at: DateTime<Utc>,
    ) -> Result<AwardRecord, RepositoryError>;

    fn has_award(&self, learner: &LearnerId, badge: &BadgeId) -> Result<bool, RepositoryError> {
        Ok(self.find_award(learner, badge)?.is_some())
    }
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Per-badge progress exposed to learners.
#[derive(Debug, Clone, Serialize)]
pub struct BadgeProgressView {
    pub badge: BadgeDefinition,
    pub achieved: bool,
    pub progress: u8,
    pub achieved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<CriterionCheck>,
}

impl BadgeProgressView {
    pub fn summary(&self) -> String {
        match self.achieved_at {
            Some(at) => format!("{} earned on {}", self.badge.name, at.date_naive()),
            None => format!("{} {}% complete", self.badge.name, self.progress),
        }
    }
}
