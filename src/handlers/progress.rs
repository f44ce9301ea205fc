// src/handlers/progress.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::progress::{DisciplineProgress, SummaryProgress, VideoProgress, VideoProgressRequest},
    services::progress,
    store::LearningStore,
    utils::jwt::Claims,
};

/// Completion percentages and coin totals of the current student in a discipline.
#[utoipa::path(
    get,
    path = "/api/disciplines/{id}/progress",
    params(("id" = i64, Path, description = "Discipline id")),
    responses(
        (status = 200, body = DisciplineProgress),
        (status = 503, description = "Progress could not be loaded")
    ),
    tag = "progress"
)]
pub async fn get_discipline_progress(
    State(store): State<Arc<dyn LearningStore>>,
    Extension(claims): Extension<Claims>,
    Path(discipline_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.student_id()?;
    let metrics = progress::aggregate(store.as_ref(), student_id, discipline_id).await?;
    Ok(Json(metrics))
}

/// Records how much of a video the current student watched.
#[utoipa::path(
    put,
    path = "/api/videos/{id}/progress",
    params(("id" = i64, Path, description = "Video id")),
    request_body = VideoProgressRequest,
    responses(
        (status = 200, body = VideoProgress),
        (status = 404, description = "Unknown video")
    ),
    tag = "progress"
)]
pub async fn put_video_progress(
    State(store): State<Arc<dyn LearningStore>>,
    Extension(claims): Extension<Claims>,
    Path(video_id): Path<i64>,
    Json(req): Json<VideoProgressRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let student_id = claims.student_id()?;

    let record = progress::record_video_progress(
        store.as_ref(),
        student_id,
        video_id,
        req.percentage,
        req.watched,
    )
    .await?;
    Ok(Json(record))
}

/// Marks a summary as read by the current student.
#[utoipa::path(
    put,
    path = "/api/summaries/{id}/read",
    params(("id" = i64, Path, description = "Summary id")),
    responses(
        (status = 200, body = SummaryProgress),
        (status = 404, description = "Unknown summary")
    ),
    tag = "progress"
)]
pub async fn put_summary_read(
    State(store): State<Arc<dyn LearningStore>>,
    Extension(claims): Extension<Claims>,
    Path(summary_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.student_id()?;
    let record = progress::mark_summary_read(store.as_ref(), student_id, summary_id).await?;
    Ok(Json(record))
}
