// src/handlers/docs.rs

use axum::Json;
use utoipa::OpenApi;

use crate::handlers::{activity, progress};

#[derive(OpenApi)]
#[openapi(
    info(title = "Coins for Study", description = "Activity grading and discipline progress"),
    paths(
        activity::get_activity,
        activity::get_attempt_status,
        activity::submit_activity,
        activity::list_answers,
        progress::get_discipline_progress,
        progress::put_video_progress,
        progress::put_summary_read,
    ),
    tags(
        (name = "activities", description = "Activities and grading"),
        (name = "progress", description = "Discipline progress and coins")
    )
)]
pub struct ApiDoc;

/// Serves the OpenAPI document.
pub async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
