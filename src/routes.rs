// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{activity, docs, progress},
    state::AppState,
    utils::jwt::{auth_middleware, student_middleware},
};

/// Assembles the main application router.
///
/// * Student routes (activities, disciplines, videos, summaries) sit behind
///   authentication and the student role check.
/// * The OpenAPI document is public.
/// * Trace and CORS layers wrap everything.
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let activity_routes = Router::new()
        .route("/{id}", get(activity::get_activity))
        .route("/{id}/status", get(activity::get_attempt_status))
        .route("/{id}/submit", post(activity::submit_activity))
        .route("/{id}/answers", get(activity::list_answers));

    let student_routes = Router::new()
        .nest("/activities", activity_routes)
        .route(
            "/disciplines/{id}/progress",
            get(progress::get_discipline_progress),
        )
        .route("/videos/{id}/progress", put(progress::put_video_progress))
        .route("/summaries/{id}/read", put(progress::put_summary_read))
        // Auth first, then the role check
        .layer(middleware::from_fn(student_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api", student_routes)
        .route("/api-docs/openapi.json", get(docs::openapi))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
