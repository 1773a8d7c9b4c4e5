use crate::infra::{InMemoryLearningStore, LearningBadgeService};
use chrono::{Local, NaiveDate};
use clap::Args;
use mindpath::error::AppError;
use mindpath::workflows::badges::{
    BadgeProgressView, EvaluationConfig, LearnerId, DEFAULT_MENTAL_HEALTH_CATEGORY,
};
use std::sync::Arc;

const DEMO_LEARNER: &str = "demo-learner";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Platform launch date (YYYY-MM-DD). Defaults to 2025-01-01.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) launch_date: Option<NaiveDate>,
    /// Account creation date for the simulated learner. Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) created_on: Option<NaiveDate>,
    /// Courses outside the mental health category to complete.
    #[arg(long, default_value_t = 1)]
    pub(crate) courses: usize,
    /// Mental health courses to complete.
    #[arg(long, default_value_t = 1)]
    pub(crate) mental_health: usize,
    /// Quizzes to pass with a perfect score.
    #[arg(long, default_value_t = 0)]
    pub(crate) perfect_quizzes: usize,
}

/// One simulated learner action and the badges it unlocked.
#[derive(Debug)]
pub(crate) struct DemoStep {
    pub(crate) action: String,
    pub(crate) awarded: Vec<String>,
}

#[derive(Debug)]
pub(crate) struct DemoOutcome {
    pub(crate) steps: Vec<DemoStep>,
    pub(crate) progress: Vec<BadgeProgressView>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let launch_date = args
        .launch_date
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or(NaiveDate::MIN));
    let created_on = args
        .created_on
        .unwrap_or_else(|| Local::now().date_naive());

    println!("MindPath badge demo");
    println!(
        "- launch {} | learner joined {} | early-user cutoff {}",
        launch_date,
        created_on,
        EvaluationConfig::new(launch_date).early_user_cutoff()
    );

    let outcome = simulate(&args, launch_date, created_on)?;

    println!("\nActivity timeline");
    for step in &outcome.steps {
        if step.awarded.is_empty() {
            println!("- {}", step.action);
        } else {
            println!("- {} -> earned {}", step.action, step.awarded.join(", "));
        }
    }

    println!("\nBadge progress");
    for view in &outcome.progress {
        println!("- {}", view.summary());
        for check in &view.checks {
            let marker = if check.met { "x" } else { " " };
            println!("    [{}] {}", marker, check.notes);
        }
    }

    Ok(())
}

pub(crate) fn simulate(
    args: &DemoArgs,
    launch_date: NaiveDate,
    created_on: NaiveDate,
) -> Result<DemoOutcome, AppError> {
    let store = Arc::new(InMemoryLearningStore::seeded());
    let service = LearningBadgeService::new(
        store.clone(),
        store.clone(),
        EvaluationConfig::new(launch_date),
    );

    let learner = LearnerId(DEMO_LEARNER.to_string());
    let created_at = created_on
        .and_hms_opt(12, 0, 0)
        .ok_or_else(|| AppError::InvalidInput(format!("invalid creation date {created_on}")))?
        .and_utc();
    store.register_learner(&learner, created_at)?;

    let mut steps = Vec::new();
    let awarded = service.check_and_award_badges(&learner)?;
    steps.push(DemoStep {
        action: "Account created".to_string(),
        awarded: awarded.into_iter().map(|badge| badge.name).collect(),
    });

    let courses = store.courses()?;
    let mental_health = courses
        .iter()
        .filter(|(_, info)| info.category == DEFAULT_MENTAL_HEALTH_CATEGORY)
        .take(args.mental_health);
    let other = courses
        .iter()
        .filter(|(_, info)| info.category != DEFAULT_MENTAL_HEALTH_CATEGORY)
        .take(args.courses);

    for (course_id, info) in mental_health.chain(other) {
        store.record_course_completion(&learner, course_id)?;
        let awarded = service.check_and_award_badges(&learner)?;
        steps.push(DemoStep {
            action: format!("Completed '{}' ({})", info.title, info.category),
            awarded: awarded.into_iter().map(|badge| badge.name).collect(),
        });
    }

    for attempt in 1..=args.perfect_quizzes {
        let quiz_id = format!("quiz-{attempt}");
        store.record_quiz_attempt(&learner, &quiz_id, 100)?;
        let awarded = service.check_and_award_badges(&learner)?;
        steps.push(DemoStep {
            action: format!("Scored 100% on {}", quiz_id),
            awarded: awarded.into_iter().map(|badge| badge.name).collect(),
        });
    }

    let progress = service.badge_progress(&learner)?;
    Ok(DemoOutcome { steps, progress })
}
