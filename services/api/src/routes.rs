use crate::infra::{ActivityState, AppState};
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use chrono::{DateTime, Utc};
use mindpath::error::AppError;
use mindpath::workflows::badges::{
    badge_router, BadgeAwardService, BadgeDefinition, BadgeRepository, LearnerId,
    ProgressRepository,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterLearnerRequest {
    pub(crate) learner_id: String,
    #[serde(default)]
    pub(crate) created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisteredLearner {
    pub(crate) learner_id: LearnerId,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) awarded: Vec<BadgeDefinition>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuizAttemptRequest {
    pub(crate) score: u32,
}

/// Result of a recorded learner action, including any badges it unlocked.
#[derive(Debug, Serialize)]
pub(crate) struct ActivityResponse {
    pub(crate) learner_id: LearnerId,
    pub(crate) recorded: bool,
    pub(crate) awarded: Vec<BadgeDefinition>,
}

/// Full application router over the in-memory store, as served by `serve`.
pub(crate) fn build_app(activity: ActivityState, app_state: AppState) -> axum::Router {
    with_badge_routes(activity.badges.clone())
        .layer(Extension(activity))
        .layer(Extension(app_state))
}

pub(crate) fn with_badge_routes<P, B>(service: Arc<BadgeAwardService<P, B>>) -> axum::Router
where
    P: ProgressRepository + 'static,
    B: BadgeRepository + 'static,
{
    badge_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/learners",
            axum::routing::post(register_learner_endpoint),
        )
        .route(
            "/api/v1/learners/:learner_id/courses/:course_id/complete",
            axum::routing::post(course_completed_endpoint),
        )
        .route(
            "/api/v1/learners/:learner_id/quizzes/:quiz_id/attempts",
            axum::routing::post(quiz_attempt_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn register_learner_endpoint(
    Extension(state): Extension<ActivityState>,
    Json(payload): Json<RegisterLearnerRequest>,
) -> Result<(StatusCode, Json<RegisteredLearner>), AppError> {
    let learner_id = payload.learner_id.trim();
    if learner_id.is_empty() {
        return Err(AppError::InvalidInput(
            "learner_id must not be empty".to_string(),
        ));
    }

    let learner = LearnerId(learner_id.to_string());
    let created_at = payload.created_at.unwrap_or_else(Utc::now);
    state.store.register_learner(&learner, created_at)?;
    info!(learner = %learner, %created_at, "learner registered");

    let awarded = state.badges.award_badges_best_effort(&learner);
    Ok((
        StatusCode::CREATED,
        Json(RegisteredLearner {
            learner_id: learner,
            created_at,
            awarded,
        }),
    ))
}

pub(crate) async fn course_completed_endpoint(
    Extension(state): Extension<ActivityState>,
    Path((learner_id, course_id)): Path<(String, String)>,
) -> Result<Json<ActivityResponse>, AppError> {
    let learner = LearnerId(learner_id);
    let recorded = state.store.record_course_completion(&learner, &course_id)?;
    info!(learner = %learner, course = %course_id, recorded, "course completion recorded");

    let awarded = state.badges.award_badges_best_effort(&learner);
    Ok(Json(ActivityResponse {
        learner_id: learner,
        recorded,
        awarded,
    }))
}

pub(crate) async fn quiz_attempt_endpoint(
    Extension(state): Extension<ActivityState>,
    Path((learner_id, quiz_id)): Path<(String, String)>,
    Json(payload): Json<QuizAttemptRequest>,
) -> Result<Json<ActivityResponse>, AppError> {
    let score = u8::try_from(payload.score)
        .ok()
        .filter(|score| *score <= 100)
        .ok_or_else(|| {
            AppError::InvalidInput(format!(
                "score must be between 0 and 100, got {}",
                payload.score
            ))
        })?;

    let learner = LearnerId(learner_id);
    state.store.record_quiz_attempt(&learner, &quiz_id, score)?;
    info!(learner = %learner, quiz = %quiz_id, score, "quiz attempt recorded");

    let awarded = state.badges.award_badges_best_effort(&learner);
    Ok(Json(ActivityResponse {
        learner_id: learner,
        recorded: true,
        awarded,
    }))
}
