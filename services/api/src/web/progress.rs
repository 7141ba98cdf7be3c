//! services/api/src/web/progress.rs
//!
//! Quiz result recording and the progress summary.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use std::sync::Arc;

use crate::error::{ApiError, ErrorBody};
use crate::web::middleware::AuthUser;
use crate::web::rest::{ProgressResponse, QuizResultRequest, QuizResultResponse};
use crate::web::state::AppState;

/// Record the outcome of a quiz on a subtopic.
#[utoipa::path(
    post,
    path = "/quiz-results",
    request_body = QuizResultRequest,
    responses(
        (status = 201, description = "Result stored", body = QuizResultResponse),
        (status = 400, description = "Score out of range", body = ErrorBody),
        (status = 404, description = "Subtopic not found", body = ErrorBody)
    ),
    tag = "progress"
)]
pub async fn record_quiz_result_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<QuizResultRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .planner
        .record_quiz_result(auth.user_id, req.subtopic_id, req.score, req.max_score)
        .await?;
    Ok((StatusCode::CREATED, Json(QuizResultResponse::from(result))))
}

/// Completion and quiz summary for the caller's active plan.
#[utoipa::path(
    get,
    path = "/progress",
    responses(
        (status = 200, description = "Progress summary", body = ProgressResponse),
        (status = 404, description = "No active configuration", body = ErrorBody)
    ),
    tag = "progress"
)]
pub async fn progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let summary = state.planner.progress(auth.user_id).await?;
    Ok(Json(summary.into()))
}
