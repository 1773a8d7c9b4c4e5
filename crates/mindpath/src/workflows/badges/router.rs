use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::domain::LearnerId;
use super::repository::{BadgeRepository, ProgressRepository};
use super::service::{BadgeAwardService, BadgeServiceError};

/// Router builder exposing badge checks and progress over HTTP.
pub fn badge_router<P, B>(service: Arc<BadgeAwardService<P, B>>) -> Router
where
    P: ProgressRepository + 'static,
    B: BadgeRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/learners/:learner_id/badges",
            get(progress_handler::<P, B>),
        )
        .route(
            "/api/v1/learners/:learner_id/badges/check",
            post(check_handler::<P, B>),
        )
        .with_state(service)
}

pub(crate) async fn check_handler<P, B>(
    State(service): State<Arc<BadgeAwardService<P, B>>>,
    Path(learner_id): Path<String>,
) -> Response
where
    P: ProgressRepository + 'static,
    B: BadgeRepository + 'static,
{
    let learner = LearnerId(learner_id);
    match service.check_and_award_badges(&learner) {
        Ok(awarded) => {
            let payload = json!({
                "learner_id": learner,
                "awarded": awarded,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn progress_handler<P, B>(
    State(service): State<Arc<BadgeAwardService<P, B>>>,
    Path(learner_id): Path<String>,
) -> Response
where
    P: ProgressRepository + 'static,
    B: BadgeRepository + 'static,
{
    let learner = LearnerId(learner_id);
    match service.badge_progress(&learner) {
        Ok(badges) => {
            let payload = json!({
                "learner_id": learner,
                "badges": badges,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) fn error_status(err: &BadgeServiceError) -> StatusCode {
    match err {
        BadgeServiceError::UnknownLearner(_) => StatusCode::NOT_FOUND,
        BadgeServiceError::Progress(_) | BadgeServiceError::Badges(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

fn error_response(err: BadgeServiceError) -> Response {
    let payload = json!({
        "error": err.to_string(),
    });
    (error_status(&err), axum::Json(payload)).into_response()
}
