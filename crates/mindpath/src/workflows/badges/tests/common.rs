use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::workflows::badges::{
    badge_router, AwardRecord, BadgeAwardService, BadgeCriteria, BadgeDefinition, BadgeId,
    BadgeRepository, Clock, EvaluationConfig, EvaluationEngine, LearnerId,
    LearnerProgressSnapshot, ProgressRepository, RepositoryError, StreakStatus,
    DEFAULT_MENTAL_HEALTH_CATEGORY,
};

pub(super) fn launch_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date")
}

pub(super) fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .expect("valid date")
        .and_hms_opt(9, 30, 0)
        .expect("valid time")
        .and_utc()
}

pub(super) fn evaluation_config() -> EvaluationConfig {
    EvaluationConfig::new(launch_date())
}

pub(super) fn evaluation_engine() -> EvaluationEngine {
    EvaluationEngine::new(evaluation_config())
}

pub(super) fn learner() -> LearnerId {
    LearnerId("learner-ada".to_string())
}

pub(super) fn snapshot(
    courses: u32,
    mental_health: u32,
    perfect_quizzes: u32,
) -> LearnerProgressSnapshot {
    LearnerProgressSnapshot {
        completed_course_count: courses,
        completed_mental_health_course_count: mental_health,
        perfect_quiz_count: perfect_quizzes,
        current_streak: StreakStatus::NotTracked,
        account_created_at: at(2025, 6, 1),
    }
}

pub(super) fn badge(id: &str, criteria: Option<BadgeCriteria>) -> BadgeDefinition {
    BadgeDefinition {
        id: BadgeId(id.to_string()),
        name: id.replace('-', " "),
        description: String::new(),
        is_active: true,
        criteria,
    }
}

pub(super) fn catalog() -> Vec<BadgeDefinition> {
    vec![
        badge("first-steps", Some(BadgeCriteria::new().courses_completed(1))),
        badge(
            "mind-explorer",
            Some(BadgeCriteria::new().mental_health_courses(2)),
        ),
        badge(
            "sharp-scholar",
            Some(BadgeCriteria::new().courses_completed(3).perfect_quizzes(2)),
        ),
        badge("pioneer", Some(BadgeCriteria::new().early_user())),
        badge("unconfigured", None),
    ]
}

/// Activity figures backing [`MemoryProgress`].
#[derive(Debug, Clone)]
pub(super) struct LearnerActivity {
    pub(super) created_at: DateTime<Utc>,
    pub(super) completed_courses: u32,
    pub(super) category_courses: HashMap<String, u32>,
    pub(super) perfect_quizzes: u32,
    pub(super) streak: StreakStatus,
}

impl LearnerActivity {
    pub(super) fn joined(created_at: DateTime<Utc>) -> Self {
        Self {
            created_at,
            completed_courses: 0,
            category_courses: HashMap::new(),
            perfect_quizzes: 0,
            streak: StreakStatus::NotTracked,
        }
    }

    pub(super) fn with_courses(mut self, total: u32, mental_health: u32) -> Self {
        self.completed_courses = total;
        self.category_courses
            .insert(DEFAULT_MENTAL_HEALTH_CATEGORY.to_string(), mental_health);
        self
    }

    pub(super) fn with_perfect_quizzes(mut self, count: u32) -> Self {
        self.perfect_quizzes = count;
        self
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryProgress {
    learners: Arc<Mutex<HashMap<LearnerId, LearnerActivity>>>,
}

impl MemoryProgress {
    pub(super) fn register(&self, learner: &LearnerId, activity: LearnerActivity) {
        self.learners
            .lock()
            .expect("progress mutex poisoned")
            .insert(learner.clone(), activity);
    }

    pub(super) fn update(&self, learner: &LearnerId, change: impl FnOnce(&mut LearnerActivity)) {
        let mut guard = self.learners.lock().expect("progress mutex poisoned");
        change(guard.get_mut(learner).expect("learner registered"));
    }

    fn read<T>(
        &self,
        learner: &LearnerId,
        pick: impl FnOnce(&LearnerActivity) -> T,
    ) -> Result<T, RepositoryError> {
        let guard = self.learners.lock().expect("progress mutex poisoned");
        guard.get(learner).map(pick).ok_or(RepositoryError::NotFound)
    }
}

impl ProgressRepository for MemoryProgress {
    fn count_completed_courses(&self, learner: &LearnerId) -> Result<u32, RepositoryError> {
        self.read(learner, |activity| activity.completed_courses)
    }

    fn count_completed_courses_in_category(
        &self,
        learner: &LearnerId,
        category: &str,
    ) -> Result<u32, RepositoryError> {
        self.read(learner, |activity| {
            activity
                .category_courses
                .get(category)
                .copied()
                .unwrap_or(0)
        })
    }

    fn count_perfect_quiz_attempts(&self, learner: &LearnerId) -> Result<u32, RepositoryError> {
        self.read(learner, |activity| activity.perfect_quizzes)
    }

    fn account_created_at(&self, learner: &LearnerId) -> Result<DateTime<Utc>, RepositoryError> {
        self.read(learner, |activity| activity.created_at)
    }

    fn current_streak(&self, learner: &LearnerId) -> Result<StreakStatus, RepositoryError> {
        self.read(learner, |activity| activity.streak)
    }
}

pub(super) struct UnavailableProgress;

impl ProgressRepository for UnavailableProgress {
    fn count_completed_courses(&self, _learner: &LearnerId) -> Result<u32, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn count_completed_courses_in_category(
        &self,
        _learner: &LearnerId,
        _category: &str,
    ) -> Result<u32, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn count_perfect_quiz_attempts(&self, _learner: &LearnerId) -> Result<u32, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn account_created_at(&self, _learner: &LearnerId) -> Result<DateTime<Utc>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryBadges {
    catalog: Arc<Mutex<Vec<BadgeDefinition>>>,
    awards: Arc<Mutex<HashMap<(LearnerId, BadgeId), AwardRecord>>>,
    failing: Arc<Mutex<HashSet<BadgeId>>>,
}

impl MemoryBadges {
    pub(super) fn with_catalog(catalog: Vec<BadgeDefinition>) -> Self {
        let badges = Self::default();
        *badges.catalog.lock().expect("catalog mutex poisoned") = catalog;
        badges
    }

    pub(super) fn fail_writes_for(&self, badge: &str) {
        self.failing
            .lock()
            .expect("failing mutex poisoned")
            .insert(BadgeId(badge.to_string()));
    }

    pub(super) fn awards(&self) -> Vec<AwardRecord> {
        self.awards
            .lock()
            .expect("award mutex poisoned")
            .values()
            .cloned()
            .collect()
    }

    pub(super) fn awarded_ids(&self, learner: &LearnerId) -> Vec<String> {
        let mut ids: Vec<String> = self
            .awards()
            .into_iter()
            .filter(|record| &record.learner_id == learner)
            .map(|record| record.badge_id.0)
            .collect();
        ids.sort();
        ids
    }
}

impl BadgeRepository for MemoryBadges {
    fn list_active_badges(&self) -> Result<Vec<BadgeDefinition>, RepositoryError> {
        let guard = self.catalog.lock().expect("catalog mutex poisoned");
        Ok(guard.iter().filter(|badge| badge.is_active).cloned().collect())
    }

    fn find_award(
        &self,
        learner: &LearnerId,
        badge: &BadgeId,
    ) -> Result<Option<AwardRecord>, RepositoryError> {
        let guard = self.awards.lock().expect("award mutex poisoned");
        Ok(guard.get(&(learner.clone(), badge.clone())).cloned())
    }

    fn create_award(
        &self,
        learner: &LearnerId,
        badge: &BadgeId,
        achieved_at: DateTime<Utc>,
    ) -> Result<AwardRecord, RepositoryError> {
        if self
            .failing
            .lock()
            .expect("failing mutex poisoned")
            .contains(badge)
        {
            return Err(RepositoryError::Unavailable("write rejected".to_string()));
        }

        let mut guard = self.awards.lock().expect("award mutex poisoned");
        let key = (learner.clone(), badge.clone());
        if guard.contains_key(&key) {
            return Err(RepositoryError::Conflict);
        }

        let record = AwardRecord {
            learner_id: learner.clone(),
            badge_id: badge.clone(),
            achieved_at,
        };
        guard.insert(key, record.clone());
        Ok(record)
    }
}

/// Store whose possession reads always miss, forcing concurrent checks to race on the write.
#[derive(Default, Clone)]
pub(super) struct StaleReadBadges {
    pub(super) inner: MemoryBadges,
}

impl BadgeRepository for StaleReadBadges {
    fn list_active_badges(&self) -> Result<Vec<BadgeDefinition>, RepositoryError> {
        self.inner.list_active_badges()
    }

    fn find_award(
        &self,
        _learner: &LearnerId,
        _badge: &BadgeId,
    ) -> Result<Option<AwardRecord>, RepositoryError> {
        Ok(None)
    }

    fn create_award(
        &self,
        learner: &LearnerId,
        badge: &BadgeId,
        achieved_at: DateTime<Utc>,
    ) -> Result<AwardRecord, RepositoryError> {
        self.inner.create_award(learner, badge, achieved_at)
    }
}

pub(super) struct UnavailableBadges;

impl BadgeRepository for UnavailableBadges {
    fn list_active_badges(&self) -> Result<Vec<BadgeDefinition>, RepositoryError> {
        Err(RepositoryError::Unavailable("catalog offline".to_string()))
    }

    fn find_award(
        &self,
        _learner: &LearnerId,
        _badge: &BadgeId,
    ) -> Result<Option<AwardRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("catalog offline".to_string()))
    }

    fn create_award(
        &self,
        _learner: &LearnerId,
        _badge: &BadgeId,
        _achieved_at: DateTime<Utc>,
    ) -> Result<AwardRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("catalog offline".to_string()))
    }
}

pub(super) struct FixedClock(pub(super) DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub(super) fn award_time() -> DateTime<Utc> {
    at(2025, 9, 14)
}

pub(super) fn service_with<P, B>(progress: Arc<P>, badges: Arc<B>) -> BadgeAwardService<P, B>
where
    P: ProgressRepository + 'static,
    B: BadgeRepository + 'static,
{
    BadgeAwardService::with_clock(
        progress,
        badges,
        evaluation_config(),
        Arc::new(FixedClock(award_time())),
    )
}

pub(super) fn build_service() -> (
    BadgeAwardService<MemoryProgress, MemoryBadges>,
    Arc<MemoryProgress>,
    Arc<MemoryBadges>,
) {
    let progress = Arc::new(MemoryProgress::default());
    progress.register(&learner(), LearnerActivity::joined(at(2025, 6, 1)));
    let badges = Arc::new(MemoryBadges::with_catalog(catalog()));
    let service = service_with(progress.clone(), badges.clone());
    (service, progress, badges)
}

pub(super) fn badge_router_with_service(
    service: BadgeAwardService<MemoryProgress, MemoryBadges>,
) -> axum::Router {
    badge_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
