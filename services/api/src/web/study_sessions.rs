//! services/api/src/web/study_sessions.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use study_planner_core::SessionUpdate;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::middleware::AuthUser;
use crate::web::rest::{StudySessionResponse, UpdateSessionRequest};
use crate::web::state::AppState;

/// Mark a session complete or incomplete, and/or replace its notes.
#[utoipa::path(
    patch,
    path = "/study-sessions/{id}",
    params(("id" = Uuid, Path, description = "Study session id")),
    request_body = UpdateSessionRequest,
    responses(
        (status = 200, description = "The updated session", body = StudySessionResponse),
        (status = 404, description = "Session not found", body = ErrorBody)
    ),
    tag = "study planner"
)]
pub async fn update_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateSessionRequest>,
) -> Result<Json<StudySessionResponse>, ApiError> {
    let update = SessionUpdate {
        is_completed: req.is_completed,
        notes: req.notes,
    };
    let session = state.planner.update_session(auth.user_id, id, update).await?;
    Ok(Json(session.into()))
}

#[utoipa::path(
    delete,
    path = "/study-sessions/{id}",
    params(("id" = Uuid, Path, description = "Study session id")),
    responses(
        (status = 204, description = "Session deleted"),
        (status = 404, description = "Session not found", body = ErrorBody)
    ),
    tag = "study planner"
)]
pub async fn delete_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.planner.delete_session(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
