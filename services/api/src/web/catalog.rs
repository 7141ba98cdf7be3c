//! services/api/src/web/catalog.rs
//!
//! Read-only access to the technology and subtopic catalog.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::error::{ApiError, ErrorBody};
use crate::web::rest::TechnologyResponse;
use crate::web::state::AppState;

/// List every technology with its subtopics, in study order.
#[utoipa::path(
    get,
    path = "/technologies",
    responses(
        (status = 200, description = "The catalog", body = [TechnologyResponse]),
        (status = 401, description = "Not logged in", body = ErrorBody)
    ),
    tag = "study planner"
)]
pub async fn list_technologies_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TechnologyResponse>>, ApiError> {
    let catalog = state.planner.catalog().await?;
    Ok(Json(catalog.into_iter().map(Into::into).collect()))
}
