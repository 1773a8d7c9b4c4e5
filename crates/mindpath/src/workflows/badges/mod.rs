//! Badge catalog evaluation and award orchestration.
//!
//! [`EvaluationEngine`] decides whether a learner's progress snapshot satisfies a
//! badge's criteria and how far along they are; [`BadgeAwardService`] walks the
//! active catalog, skips held badges, and persists new awards through the
//! repository traits so storage stays swappable.

pub mod criteria;
pub mod domain;
pub(crate) mod evaluation;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use criteria::{BadgeCriteria, Criterion, CriterionKind};
pub use domain::{
    AwardRecord, BadgeDefinition, BadgeId, LearnerId, LearnerProgressSnapshot, StreakStatus,
};
pub use evaluation::{
    CriteriaAssessment, CriterionCheck, EvaluationConfig, EvaluationEngine,
    DEFAULT_EARLY_USER_WINDOW_MONTHS, DEFAULT_MENTAL_HEALTH_CATEGORY,
};
pub use repository::{BadgeProgressView, BadgeRepository, ProgressRepository, RepositoryError};
pub use router::badge_router;
pub use service::{BadgeAwardService, BadgeServiceError, Clock, SystemClock};
