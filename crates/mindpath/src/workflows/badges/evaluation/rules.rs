use super::super::criteria::{Criterion, CriterionKind};
use super::super::domain::LearnerProgressSnapshot;
use super::config::EvaluationConfig;
use super::CriterionCheck;

/// Counter value a threshold criterion compares against. `None` means the
/// snapshot has no figure for it (untracked streaks, or the early-user flag).
fn achieved_count(kind: CriterionKind, snapshot: &LearnerProgressSnapshot) -> Option<u32> {
    match kind {
        CriterionKind::CoursesCompleted => Some(snapshot.completed_course_count),
        CriterionKind::MentalHealthCourses => Some(snapshot.completed_mental_health_course_count),
        CriterionKind::PerfectQuizzes => Some(snapshot.perfect_quiz_count),
        CriterionKind::DailyStreak => snapshot.current_streak.days(),
        CriterionKind::EarlyUser => None,
    }
}

fn is_early_user(snapshot: &LearnerProgressSnapshot, config: &EvaluationConfig) -> bool {
    snapshot.account_created_at.date_naive() <= config.early_user_cutoff()
}

pub(crate) fn criterion_met(
    criterion: &Criterion,
    snapshot: &LearnerProgressSnapshot,
    config: &EvaluationConfig,
) -> bool {
    match criterion {
        Criterion::AtLeast { kind, threshold } => achieved_count(*kind, snapshot)
            .map(|achieved| achieved >= *threshold)
            .unwrap_or(false),
        Criterion::EarlyUser => is_early_user(snapshot, config),
        Criterion::Malformed { .. } => false,
    }
}

pub(crate) fn check_criterion(
    criterion: &Criterion,
    snapshot: &LearnerProgressSnapshot,
    config: &EvaluationConfig,
) -> CriterionCheck {
    let kind = criterion.kind();
    let met = criterion_met(criterion, snapshot, config);

    let (ratio, notes) = match criterion {
        Criterion::AtLeast { kind, threshold } => match achieved_count(*kind, snapshot) {
            Some(_) if *threshold == 0 => (1.0, format!("{} requires nothing", kind.key())),
            Some(achieved) => (
                (f64::from(achieved) / f64::from(*threshold)).min(1.0),
                format!("{achieved} of {threshold} {}", kind.key()),
            ),
            None if *kind == CriterionKind::DailyStreak => (
                0.0,
                "daily streaks are not tracked yet".to_string(),
            ),
            None => (0.0, format!("no data for {}", kind.key())),
        },
        Criterion::EarlyUser => {
            let cutoff = config.early_user_cutoff();
            let created = snapshot.account_created_at.date_naive();
            if met {
                (1.0, format!("joined {created}, on or before {cutoff}"))
            } else {
                (0.0, format!("joined {created}, after {cutoff}"))
            }
        }
        Criterion::Malformed { raw, .. } => (0.0, format!("unreadable threshold {raw}")),
    };

    CriterionCheck {
        kind,
        met,
        ratio,
        notes,
    }
}
