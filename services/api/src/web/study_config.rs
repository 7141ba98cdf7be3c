//! services/api/src/web/study_config.rs
//!
//! Handlers for creating, regenerating, inspecting and resetting a user's study plan.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;
use study_planner_core::StudyConfigRequest;
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::middleware::AuthUser;
use crate::web::rest::{
    parse_study_days, session_responses, CreateStudyConfigRequest, CreateStudyConfigResponse,
    StudyConfigResponse, StudySessionResponse,
};
use crate::web::state::AppState;

/// Create a study configuration and generate its schedule.
///
/// The new configuration becomes the caller's only active one.
#[utoipa::path(
    post,
    path = "/study-config",
    request_body = CreateStudyConfigRequest,
    responses(
        (status = 201, description = "Configuration created and schedule generated", body = CreateStudyConfigResponse),
        (status = 400, description = "Invalid availability or technology selection", body = ErrorBody),
        (status = 401, description = "Not logged in", body = ErrorBody),
        (status = 422, description = "Schedule exceeds the allowed horizon", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tag = "study planner"
)]
pub async fn create_study_config_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateStudyConfigRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request = StudyConfigRequest {
        start_date: req.start_date,
        study_days: parse_study_days(&req.study_days)?,
        technology_ids: req.technology_ids,
    };

    let (configuration, sessions) = state
        .planner
        .create_configuration(auth.user_id, request)
        .await?;
    info!(
        user_id = %auth.user_id,
        configuration_id = %configuration.id,
        sessions = sessions.len(),
        "study configuration created"
    );

    let response = CreateStudyConfigResponse {
        configuration: configuration.into(),
        sessions: session_responses(sessions),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Fetch the caller's active study configuration.
#[utoipa::path(
    get,
    path = "/study-config/active",
    responses(
        (status = 200, description = "The active configuration", body = StudyConfigResponse),
        (status = 404, description = "No active configuration", body = ErrorBody)
    ),
    tag = "study planner"
)]
pub async fn active_study_config_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<StudyConfigResponse>, ApiError> {
    let configuration = state.planner.active_configuration(auth.user_id).await?;
    Ok(Json(configuration.into()))
}

/// Regenerate the schedule of an active configuration, replacing all of its sessions.
#[utoipa::path(
    post,
    path = "/study-config/{id}/generate-schedule",
    params(("id" = Uuid, Path, description = "Study configuration id")),
    responses(
        (status = 200, description = "The regenerated sessions", body = [StudySessionResponse]),
        (status = 400, description = "Configuration is inactive or invalid", body = ErrorBody),
        (status = 404, description = "Configuration not found", body = ErrorBody),
        (status = 409, description = "Configuration was reset while regenerating", body = ErrorBody),
        (status = 422, description = "Schedule exceeds the allowed horizon", body = ErrorBody)
    ),
    tag = "study planner"
)]
pub async fn generate_schedule_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<StudySessionResponse>>, ApiError> {
    let sessions = state.planner.generate_schedule(auth.user_id, id).await?;
    Ok(Json(session_responses(sessions)))
}

/// List the sessions of one of the caller's configurations.
#[utoipa::path(
    get,
    path = "/study-config/{id}/sessions",
    params(("id" = Uuid, Path, description = "Study configuration id")),
    responses(
        (status = 200, description = "Sessions ordered by date", body = [StudySessionResponse]),
        (status = 404, description = "Configuration not found", body = ErrorBody)
    ),
    tag = "study planner"
)]
pub async fn list_config_sessions_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<StudySessionResponse>>, ApiError> {
    let sessions = state.planner.list_sessions(auth.user_id, id).await?;
    Ok(Json(session_responses(sessions)))
}

/// Deactivate the caller's plan and delete its sessions.
#[utoipa::path(
    post,
    path = "/study-config/reset",
    responses(
        (status = 204, description = "Plan reset"),
        (status = 404, description = "No active configuration", body = ErrorBody)
    ),
    tag = "study planner"
)]
pub async fn reset_study_config_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<StatusCode, ApiError> {
    state.planner.reset(auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
