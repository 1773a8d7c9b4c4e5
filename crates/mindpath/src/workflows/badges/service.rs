use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use super::domain::{BadgeDefinition, LearnerId, LearnerProgressSnapshot};
use super::evaluation::{EvaluationConfig, EvaluationEngine};
use super::repository::{BadgeProgressView, BadgeRepository, ProgressRepository, RepositoryError};

/// Source of award timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time in UTC.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Service composing the progress source, badge store, and criteria evaluator.
pub struct BadgeAwardService<P, B> {
    progress: Arc<P>,
    badges: Arc<B>,
    engine: Arc<EvaluationEngine>,
    clock: Arc<dyn Clock>,
}

impl<P, B> BadgeAwardService<P, B>
where
    P: ProgressRepository + 'static,
    B: BadgeRepository + 'static,
{
    pub fn new(progress: Arc<P>, badges: Arc<B>, config: EvaluationConfig) -> Self {
        Self::with_clock(progress, badges, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        progress: Arc<P>,
        badges: Arc<B>,
        config: EvaluationConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            progress,
            badges,
            engine: Arc::new(EvaluationEngine::new(config)),
            clock,
        }
    }

    /// Fails with `UnknownLearner` when the progress source has no such account.
    fn ensure_learner(&self, learner: &LearnerId) -> Result<(), BadgeServiceError> {
        self.progress
            .account_created_at(learner)
            .map(|_| ())
            .map_err(|err| BadgeServiceError::from_progress(learner, err))
    }

    /// Aggregate the learner's activity. Any failing query fails the whole snapshot.
    pub fn snapshot(
        &self,
        learner: &LearnerId,
    ) -> Result<LearnerProgressSnapshot, BadgeServiceError> {
        let category = &self.engine.config().mental_health_category;
        let progress_error = |err| BadgeServiceError::from_progress(learner, err);

        Ok(LearnerProgressSnapshot {
            completed_course_count: self
                .progress
                .count_completed_courses(learner)
                .map_err(progress_error)?,
            completed_mental_health_course_count: self
                .progress
                .count_completed_courses_in_category(learner, category)
                .map_err(progress_error)?,
            perfect_quiz_count: self
                .progress
                .count_perfect_quiz_attempts(learner)
                .map_err(progress_error)?,
            current_streak: self
                .progress
                .current_streak(learner)
                .map_err(progress_error)?,
            account_created_at: self
                .progress
                .account_created_at(learner)
                .map_err(progress_error)?,
        })
    }

    /// Award every active badge the learner now qualifies for and does not hold yet.
    ///
    /// Returns only the badges persisted by this call. A duplicate reported by the
    /// store means a concurrent check won the race and is not an error; any other
    /// write failure is logged and the remaining badges are still evaluated.
    pub fn check_and_award_badges(
        &self,
        learner: &LearnerId,
    ) -> Result<Vec<BadgeDefinition>, BadgeServiceError> {
        let catalog: Vec<BadgeDefinition> = self
            .badges
            .list_active_badges()
            .map_err(BadgeServiceError::Badges)?
            .into_iter()
            .filter(|badge| badge.is_active)
            .collect();
        if catalog.is_empty() {
            self.ensure_learner(learner)?;
            return Ok(Vec::new());
        }

        let mut pending = Vec::new();
        for badge in catalog {
            if self
                .badges
                .has_award(learner, &badge.id)
                .map_err(BadgeServiceError::Badges)?
            {
                continue;
            }
            pending.push(badge);
        }

        if pending.is_empty() {
            return Ok(Vec::new());
        }

        let snapshot = self.snapshot(learner)?;
        let mut awarded = Vec::new();

        for badge in pending {
            if !self
                .engine
                .is_satisfied(&snapshot, badge.criteria.as_ref())
            {
                continue;
            }

            match self
                .badges
                .create_award(learner, &badge.id, self.clock.now())
            {
                Ok(record) => {
                    info!(
                        learner = %learner,
                        badge = %badge.id,
                        achieved_at = %record.achieved_at,
                        "badge awarded"
                    );
                    awarded.push(badge);
                }
                Err(RepositoryError::Conflict) => {
                    debug!(learner = %learner, badge = %badge.id, "badge already awarded");
                }
                Err(err) => {
                    warn!(
                        learner = %learner,
                        badge = %badge.id,
                        error = %err,
                        "failed to persist badge award"
                    );
                }
            }
        }

        Ok(awarded)
    }

    /// Run a badge check on behalf of another action without letting it fail that action.
    pub fn award_badges_best_effort(&self, learner: &LearnerId) -> Vec<BadgeDefinition> {
        match self.check_and_award_badges(learner) {
            Ok(awarded) => awarded,
            Err(err) => {
                error!(learner = %learner, error = %err, "badge check failed");
                Vec::new()
            }
        }
    }

    /// Read-only progress for every active badge.
    pub fn badge_progress(
        &self,
        learner: &LearnerId,
    ) -> Result<Vec<BadgeProgressView>, BadgeServiceError> {
        let badges: Vec<BadgeDefinition> = self
            .badges
            .list_active_badges()
            .map_err(BadgeServiceError::Badges)?
            .into_iter()
            .filter(|badge| badge.is_active)
            .collect();

        if badges.is_empty() {
            self.ensure_learner(learner)?;
            return Ok(Vec::new());
        }

        let snapshot = self.snapshot(learner)?;
        let mut views = Vec::with_capacity(badges.len());

        for badge in badges {
            let award = self
                .badges
                .find_award(learner, &badge.id)
                .map_err(BadgeServiceError::Badges)?;

            let view = match award {
                Some(record) => BadgeProgressView {
                    badge,
                    achieved: true,
                    progress: 100,
                    achieved_at: Some(record.achieved_at),
                    checks: Vec::new(),
                },
                None => {
                    let assessment = self.engine.assess(&snapshot, badge.criteria.as_ref());
                    BadgeProgressView {
                        badge,
                        achieved: false,
                        progress: assessment.progress,
                        achieved_at: None,
                        checks: assessment.checks,
                    }
                }
            };
            views.push(view);
        }

        Ok(views)
    }
}

/// Error raised by the badge award service.
#[derive(Debug, thiserror::Error)]
pub enum BadgeServiceError {
    #[error("learner {0} not found")]
    UnknownLearner(LearnerId),
    #[error("progress data unavailable: {0}")]
    Progress(RepositoryError),
    #[error("badge store unavailable: {0}")]
    Badges(RepositoryError),
}

impl BadgeServiceError {
    fn from_progress(learner: &LearnerId, err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::UnknownLearner(learner.clone()),
            other => Self::Progress(other),
        }
    }
}
