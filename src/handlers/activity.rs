// src/handlers/activity.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::{
        activity::ActivityDetail,
        submission::{AnswerRecord, AttemptStatus, GradeOutcome, SubmitActivityRequest},
    },
    services::grading,
    store::LearningStore,
    utils::jwt::Claims,
};

/// Returns the activity and its questions without answer keys.
#[utoipa::path(
    get,
    path = "/api/activities/{id}",
    params(("id" = i64, Path, description = "Activity id")),
    responses(
        (status = 200, body = ActivityDetail),
        (status = 404, description = "Unknown activity")
    ),
    tag = "activities"
)]
pub async fn get_activity(
    State(store): State<Arc<dyn LearningStore>>,
    Path(activity_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let detail = grading::activity_detail(store.as_ref(), activity_id).await?;
    Ok(Json(detail))
}

/// Reports whether the current student already completed the activity.
#[utoipa::path(
    get,
    path = "/api/activities/{id}/status",
    params(("id" = i64, Path, description = "Activity id")),
    responses((status = 200, body = AttemptStatus)),
    tag = "activities"
)]
pub async fn get_attempt_status(
    State(store): State<Arc<dyn LearningStore>>,
    Extension(claims): Extension<Claims>,
    Path(activity_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.student_id()?;
    let status = grading::attempt_status(store.as_ref(), student_id, activity_id).await?;
    Ok(Json(status))
}

/// Grades the submitted answers and stores the result.
///
/// * Rejects malformed answer values before grading.
/// * Blocks a resubmission when the policy forbids it.
/// * Every question must be answered; nothing is stored otherwise.
#[utoipa::path(
    post,
    path = "/api/activities/{id}/submit",
    params(("id" = i64, Path, description = "Activity id")),
    request_body = SubmitActivityRequest,
    responses(
        (status = 200, body = GradeOutcome),
        (status = 400, description = "No questions, unanswered questions or invalid values"),
        (status = 409, description = "Activity already completed")
    ),
    tag = "activities"
)]
pub async fn submit_activity(
    State(store): State<Arc<dyn LearningStore>>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    Path(activity_id): Path<i64>,
    Json(req): Json<SubmitActivityRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let student_id = claims.student_id()?;

    if !config.allow_resubmission {
        let status = grading::attempt_status(store.as_ref(), student_id, activity_id).await?;
        if status.is_completed() {
            return Err(AppError::Conflict("Activity already completed".to_string()));
        }
    }

    let answers = req.answered();
    let outcome = grading::submit(store.as_ref(), activity_id, student_id, &answers).await?;
    Ok(Json(outcome))
}

/// Lists the stored per-question results of the current student's last attempt.
#[utoipa::path(
    get,
    path = "/api/activities/{id}/answers",
    params(("id" = i64, Path, description = "Activity id")),
    responses((status = 200, body = [AnswerRecord])),
    tag = "activities"
)]
pub async fn list_answers(
    State(store): State<Arc<dyn LearningStore>>,
    Extension(claims): Extension<Claims>,
    Path(activity_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.student_id()?;
    let answers = grading::review_answers(store.as_ref(), student_id, activity_id).await?;
    Ok(Json(answers))
}
