use chrono::{DateTime, NaiveDate, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use mindpath::workflows::badges::{
    AwardRecord, BadgeAwardService, BadgeCriteria, BadgeDefinition, BadgeId, BadgeRepository,
    LearnerId, ProgressRepository, RepositoryError, DEFAULT_MENTAL_HEALTH_CATEGORY,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

pub(crate) type LearningBadgeService = BadgeAwardService<InMemoryLearningStore, InMemoryLearningStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Shared handles for endpoints that record learner activity and then re-check badges.
#[derive(Clone)]
pub(crate) struct ActivityState {
    pub(crate) store: Arc<InMemoryLearningStore>,
    pub(crate) badges: Arc<LearningBadgeService>,
}

#[derive(Debug, Clone)]
pub(crate) struct CourseInfo {
    pub(crate) title: String,
    pub(crate) category: String,
}

#[derive(Debug, Clone)]
struct LearnerAccount {
    created_at: DateTime<Utc>,
    completed_courses: BTreeSet<String>,
    quiz_scores: Vec<(String, u8)>,
}

#[derive(Default)]
struct StoreState {
    courses: BTreeMap<String, CourseInfo>,
    learners: HashMap<LearnerId, LearnerAccount>,
    badges: Vec<BadgeDefinition>,
    awards: HashMap<(LearnerId, BadgeId), AwardRecord>,
}

/// Process-local stand-in for the platform database.
#[derive(Default, Clone)]
pub(crate) struct InMemoryLearningStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryLearningStore {
    pub(crate) fn seeded() -> Self {
        let store = Self::default();
        if let Ok(mut state) = store.state.lock() {
            state.courses = default_courses();
            state.badges = default_badges();
        }
        store
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("learning store lock poisoned".to_string()))
    }

    fn with_learner<T>(
        &self,
        learner: &LearnerId,
        read: impl FnOnce(&StoreState, &LearnerAccount) -> T,
    ) -> Result<T, RepositoryError> {
        let state = self.lock()?;
        let account = state.learners.get(learner).ok_or(RepositoryError::NotFound)?;
        Ok(read(&state, account))
    }

    pub(crate) fn register_learner(
        &self,
        learner: &LearnerId,
        created_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        if state.learners.contains_key(learner) {
            return Err(RepositoryError::Conflict);
        }
        state.learners.insert(
            learner.clone(),
            LearnerAccount {
                created_at,
                completed_courses: BTreeSet::new(),
                quiz_scores: Vec::new(),
            },
        );
        Ok(())
    }

    /// Returns false when the course was already completed.
    pub(crate) fn record_course_completion(
        &self,
        learner: &LearnerId,
        course_id: &str,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.lock()?;
        if !state.courses.contains_key(course_id) {
            return Err(RepositoryError::NotFound);
        }
        let account = state
            .learners
            .get_mut(learner)
            .ok_or(RepositoryError::NotFound)?;
        Ok(account.completed_courses.insert(course_id.to_string()))
    }

    pub(crate) fn record_quiz_attempt(
        &self,
        learner: &LearnerId,
        quiz_id: &str,
        score: u8,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        let account = state
            .learners
            .get_mut(learner)
            .ok_or(RepositoryError::NotFound)?;
        account.quiz_scores.push((quiz_id.to_string(), score));
        Ok(())
    }

    pub(crate) fn courses(&self) -> Result<Vec<(String, CourseInfo)>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .courses
            .iter()
            .map(|(id, info)| (id.clone(), info.clone()))
            .collect())
    }
}

impl ProgressRepository for InMemoryLearningStore {
    fn count_completed_courses(&self, learner: &LearnerId) -> Result<u32, RepositoryError> {
        self.with_learner(learner, |_, account| account.completed_courses.len() as u32)
    }

    fn count_completed_courses_in_category(
        &self,
        learner: &LearnerId,
        category: &str,
    ) -> Result<u32, RepositoryError> {
        self.with_learner(learner, |state, account| {
            account
                .completed_courses
                .iter()
                .filter_map(|course_id| state.courses.get(course_id))
                .filter(|course| course.category == category)
                .count() as u32
        })
    }

    fn count_perfect_quiz_attempts(&self, learner: &LearnerId) -> Result<u32, RepositoryError> {
        self.with_learner(learner, |_, account| {
            account
                .quiz_scores
                .iter()
                .filter(|(_, score)| *score == 100)
                .count() as u32
        })
    }

    fn account_created_at(&self, learner: &LearnerId) -> Result<DateTime<Utc>, RepositoryError> {
        self.with_learner(learner, |_, account| account.created_at)
    }
}

impl BadgeRepository for InMemoryLearningStore {
    fn list_active_badges(&self) -> Result<Vec<BadgeDefinition>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .badges
            .iter()
            .filter(|badge| badge.is_active)
            .cloned()
            .collect())
    }

    fn find_award(
        &self,
        learner: &LearnerId,
        badge: &BadgeId,
    ) -> Result<Option<AwardRecord>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .awards
            .get(&(learner.clone(), badge.clone()))
            .cloned())
    }

    fn create_award(
        &self,
        learner: &LearnerId,
        badge: &BadgeId,
        achieved_at: DateTime<Utc>,
    ) -> Result<AwardRecord, RepositoryError> {
        let mut state = self.lock()?;
        let key = (learner.clone(), badge.clone());
        if state.awards.contains_key(&key) {
            return Err(RepositoryError::Conflict);
        }
        let record = AwardRecord {
            learner_id: learner.clone(),
            badge_id: badge.clone(),
            achieved_at,
        };
        state.awards.insert(key, record.clone());
        Ok(record)
    }
}

fn course(title: &str, category: &str) -> CourseInfo {
    CourseInfo {
        title: title.to_string(),
        category: category.to_string(),
    }
}

pub(crate) fn default_courses() -> BTreeMap<String, CourseInfo> {
    let mut courses = BTreeMap::new();
    courses.insert(
        "anxiety-101".to_string(),
        course("Understanding Anxiety", DEFAULT_MENTAL_HEALTH_CATEGORY),
    );
    courses.insert(
        "mindful-breathing".to_string(),
        course("Mindful Breathing", DEFAULT_MENTAL_HEALTH_CATEGORY),
    );
    courses.insert(
        "sleep-hygiene".to_string(),
        course("Sleep Hygiene Basics", DEFAULT_MENTAL_HEALTH_CATEGORY),
    );
    courses.insert(
        "habit-design".to_string(),
        course("Designing Lasting Habits", "self_improvement"),
    );
    courses.insert(
        "focus-sprints".to_string(),
        course("Focus Sprints", "productivity"),
    );
    courses.insert(
        "kind-communication".to_string(),
        course("Kind Communication", "relationships"),
    );
    courses
}

fn badge(id: &str, name: &str, description: &str, criteria: Option<BadgeCriteria>) -> BadgeDefinition {
    BadgeDefinition {
        id: BadgeId(id.to_string()),
        name: name.to_string(),
        description: description.to_string(),
        is_active: true,
        criteria,
    }
}

pub(crate) fn default_badges() -> Vec<BadgeDefinition> {
    vec![
        badge(
            "first-course",
            "First Steps",
            "Complete your first course",
            Some(BadgeCriteria::new().courses_completed(1)),
        ),
        badge(
            "dedicated-learner",
            "Dedicated Learner",
            "Complete five courses",
            Some(BadgeCriteria::new().courses_completed(5)),
        ),
        badge(
            "mind-matters",
            "Mind Matters",
            "Complete three mental health courses",
            Some(BadgeCriteria::new().mental_health_courses(3)),
        ),
        badge(
            "quiz-ace",
            "Quiz Ace",
            "Score 100% on three quizzes after finishing two courses",
            Some(BadgeCriteria::new().courses_completed(2).perfect_quizzes(3)),
        ),
        badge(
            "week-streak",
            "Seven Day Streak",
            "Learn seven days in a row",
            Some(BadgeCriteria::new().daily_streak(7)),
        ),
        badge(
            "early-adopter",
            "Early Adopter",
            "Joined during the first month after launch",
            Some(BadgeCriteria::new().early_user()),
        ),
    ]
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
