//! services/api/src/web/router.rs
//!
//! Assembles the axum router: public auth routes, cookie-protected study routes,
//! CORS, request tracing and the Swagger UI.

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiError;
use crate::web::{
    auth::{login_handler, logout_handler, signup_handler},
    catalog::list_technologies_handler,
    middleware::require_auth,
    progress::{progress_handler, record_quiz_result_handler},
    rest::ApiDoc,
    state::AppState,
    study_config::{
        active_study_config_handler, create_study_config_handler, generate_schedule_handler,
        list_config_sessions_handler, reset_study_config_handler,
    },
    study_sessions::{delete_session_handler, update_session_handler},
};

/// Builds the complete application router for the given state.
pub fn build_router(app_state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = app_state
        .config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN: {}", e)))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/technologies", get(list_technologies_handler))
        .route("/study-config", post(create_study_config_handler))
        .route("/study-config/active", get(active_study_config_handler))
        .route("/study-config/reset", post(reset_study_config_handler))
        .route(
            "/study-config/{id}/generate-schedule",
            post(generate_schedule_handler),
        )
        .route(
            "/study-config/{id}/sessions",
            get(list_config_sessions_handler),
        )
        .route(
            "/study-sessions/{id}",
            patch(update_session_handler).delete(delete_session_handler),
        )
        .route("/quiz-results", post(record_quiz_result_handler))
        .route("/progress", get(progress_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Ok(Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())))
}
