// Drives the full router against the in-memory store.

use api_lib::config::Config;
use api_lib::web::{build_router, AppState};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;
use study_planner_core::memory::InMemoryDatabase;
use study_planner_core::{DifficultyLevel, Subtopic, Technology};
use tower::ServiceExt;
use uuid::Uuid;

struct TestApp {
    router: Router,
    html: Uuid,
    css: Uuid,
    first_subtopic: Uuid,
}

fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: "postgres://unused".to_string(),
        database_max_connections: 1,
        log_level: tracing::Level::INFO,
        cors_origin: "http://localhost:3000".to_string(),
        schedule_horizon_days: 365,
        auth_session_days: 30,
    }
}

fn test_app() -> TestApp {
    let html = Technology {
        id: Uuid::new_v4(),
        name: "HTML".to_string(),
        complexity_rank: 1,
    };
    let css = Technology {
        id: Uuid::new_v4(),
        name: "CSS".to_string(),
        complexity_rank: 2,
    };
    let a = Subtopic {
        id: Uuid::new_v4(),
        technology_id: html.id,
        name: "Document structure".to_string(),
        hours_required: Decimal::from(3),
        difficulty_level: DifficultyLevel::Beginner,
        order_index: 1,
    };
    let b = Subtopic {
        id: Uuid::new_v4(),
        technology_id: css.id,
        name: "Selectors".to_string(),
        hours_required: Decimal::from(1),
        difficulty_level: DifficultyLevel::Beginner,
        order_index: 1,
    };
    let db = Arc::new(InMemoryDatabase::with_catalog(
        vec![html.clone(), css.clone()],
        vec![a.clone(), b],
    ));
    let state = Arc::new(AppState::new(db, Arc::new(test_config())));

    TestApp {
        router: build_router(state).unwrap(),
        html: html.id,
        css: css.id,
        first_subtopic: a.id,
    }
}

async fn send(
    app: &TestApp,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Option<String>, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, set_cookie, json)
}

async fn signup(app: &TestApp, email: &str) -> String {
    let (status, cookie, body) = send(
        app,
        "POST",
        "/auth/signup",
        None,
        Some(json!({ "email": email, "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], email);
    cookie.expect("signup sets a session cookie")
}

fn reference_config(app: &TestApp) -> Value {
    json!({
        "start_date": "2024-01-01",
        "study_days": { "monday": 2, "wednesday": 1 },
        "technology_ids": [app.css, app.html],
    })
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let app = test_app();
    let (status, _, body) = send(&app, "GET", "/technologies", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _, _) = send(&app, "GET", "/progress", Some("session=bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_login_and_logout() {
    let app = test_app();
    signup(&app, "learner@example.com").await;

    let (status, _, _) = send(
        &app,
        "POST",
        "/auth/signup",
        None,
        Some(json!({ "email": "learner@example.com", "password": "another-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "learner@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, cookie, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "learner@example.com", "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let cookie = cookie.unwrap();

    let (status, _, _) = send(&app, "GET", "/technologies", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(&app, "POST", "/auth/logout", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(&app, "GET", "/technologies", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn catalog_lists_technologies_in_rank_order() {
    let app = test_app();
    let cookie = signup(&app, "catalog@example.com").await;

    let (status, _, body) = send(&app, "GET", "/technologies", Some(&cookie), None).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["HTML", "CSS"]);
    assert_eq!(body[0]["subtopics"][0]["difficulty_level"], "beginner");
}

#[tokio::test]
async fn creating_a_config_returns_the_generated_schedule() {
    let app = test_app();
    let cookie = signup(&app, "planner@example.com").await;

    let (status, _, body) = send(
        &app,
        "POST",
        "/study-config",
        Some(&cookie),
        Some(reference_config(&app)),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["configuration"]["is_active"], true);
    assert_eq!(body["configuration"]["study_days"]["monday"].as_f64(), Some(2.0));

    let sessions = body["sessions"].as_array().unwrap();
    let got: Vec<(String, f64)> = sessions
        .iter()
        .map(|s| {
            (
                s["scheduled_date"].as_str().unwrap().to_string(),
                s["scheduled_hours"].as_f64().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        got,
        vec![
            ("2024-01-01".to_string(), 2.0),
            ("2024-01-03".to_string(), 1.0),
            ("2024-01-08".to_string(), 1.0),
        ]
    );
    assert_eq!(sessions[0]["subtopic_id"], app.first_subtopic.to_string());
    assert_eq!(sessions[0]["is_completed"], false);

    let config_id = body["configuration"]["id"].as_str().unwrap().to_string();
    let (status, _, active) = send(&app, "GET", "/study-config/active", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(active["id"], config_id);

    let (status, _, regenerated) = send(
        &app,
        "POST",
        &format!("/study-config/{}/generate-schedule", config_id),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(regenerated.as_array().unwrap().len(), 3);

    let (status, _, listed) = send(
        &app,
        "GET",
        &format!("/study-config/{}/sessions", config_id),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn invalid_availability_is_rejected() {
    let app = test_app();
    let cookie = signup(&app, "invalid@example.com").await;

    let (status, _, _) = send(
        &app,
        "POST",
        "/study-config",
        Some(&cookie),
        Some(json!({
            "start_date": "2024-01-01",
            "study_days": {},
            "technology_ids": [app.html],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(
        &app,
        "POST",
        "/study-config",
        Some(&cookie),
        Some(json!({
            "start_date": "2024-01-01",
            "study_days": { "caturday": 2 },
            "technology_ids": [app.html],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Nothing was stored, so there is no active plan.
    let (status, _, _) = send(&app, "GET", "/study-config/active", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn session_updates_feed_progress_and_reset_clears_plan() {
    let app = test_app();
    let cookie = signup(&app, "progress@example.com").await;
    let (_, _, created) = send(
        &app,
        "POST",
        "/study-config",
        Some(&cookie),
        Some(reference_config(&app)),
    )
    .await;
    let first_session = created["sessions"][0]["id"].as_str().unwrap().to_string();
    let last_session = created["sessions"][2]["id"].as_str().unwrap().to_string();

    let (status, _, updated) = send(
        &app,
        "PATCH",
        &format!("/study-sessions/{}", first_session),
        Some(&cookie),
        Some(json!({ "is_completed": true, "notes": "done" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["is_completed"], true);
    assert_eq!(updated["notes"], "done");
    assert!(updated["completed_at"].is_string());

    let (status, _, _) = send(
        &app,
        "DELETE",
        &format!("/study-sessions/{}", last_session),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, quiz) = send(
        &app,
        "POST",
        "/quiz-results",
        Some(&cookie),
        Some(json!({ "subtopic_id": app.first_subtopic, "score": 3, "max_score": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(quiz["score"], 3);

    let (status, _, progress) = send(&app, "GET", "/progress", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["total_hours"].as_f64(), Some(3.0));
    assert_eq!(progress["completed_hours"].as_f64(), Some(2.0));
    assert_eq!(progress["total_sessions"], 2);
    assert_eq!(
        progress["subtopics"][0]["average_quiz_percentage"].as_f64(),
        Some(75.0)
    );

    let (status, _, _) = send(&app, "POST", "/study-config/reset", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _, _) = send(&app, "GET", "/progress", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn users_cannot_see_each_others_sessions() {
    let app = test_app();
    let owner = signup(&app, "owner@example.com").await;
    let other = signup(&app, "other@example.com").await;
    let (_, _, created) = send(
        &app,
        "POST",
        "/study-config",
        Some(&owner),
        Some(reference_config(&app)),
    )
    .await;
    let config_id = created["configuration"]["id"].as_str().unwrap().to_string();
    let session_id = created["sessions"][0]["id"].as_str().unwrap().to_string();

    let (status, _, _) = send(
        &app,
        "GET",
        &format!("/study-config/{}/sessions", config_id),
        Some(&other),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(
        &app,
        "PATCH",
        &format!("/study-sessions/{}", session_id),
        Some(&other),
        Some(json!({ "is_completed": true })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn far_future_start_date_is_unprocessable() {
    let app = test_app();
    let cookie = signup(&app, "far-future@example.com").await;

    let (status, _, body) = send(
        &app,
        "POST",
        "/study-config",
        Some(&cookie),
        Some(json!({
            "start_date": "+262140-01-01",
            "study_days": { "monday": 1 },
            "technology_ids": [app.html],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());

    let (status, _, _) = send(&app, "GET", "/study-config/active", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
