// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use mileage_tracker::config::Config;
use mileage_tracker::db::{users, Db, DbOptions};
use mileage_tracker::models::{Km, NewRun, NewShoe, Run, Shoe};
use mileage_tracker::routes::create_router;
use mileage_tracker::time_utils::parse_ymd_hm;
use mileage_tracker::AppState;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// Create a test app backed by a fresh database file.
/// Returns the router, the shared state, and the directory holding the
/// database, which must stay alive for the duration of the test.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, TempDir) {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("mileage.db");
    let db = Db::open(
        path.to_str().expect("temp path is UTF-8"),
        &DbOptions {
            pool_size: config.db_pool_size,
            busy_timeout_ms: config.db_busy_timeout_ms,
        },
    )
    .expect("Failed to open test database");

    let state = Arc::new(AppState::new(config, db));
    (create_router(state.clone()), state, dir)
}

/// Create a session token for `user_id`.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, signing_key: &[u8]) -> String {
    mileage_tracker::middleware::auth::create_jwt(user_id, signing_key)
        .expect("Failed to create JWT")
}

#[allow(dead_code)]
pub async fn seed_user(state: &AppState, email: &str) -> String {
    let email = email.to_string();
    state
        .db
        .write(move |tx| Ok(users::insert_user(tx, &email, "runner")?.id))
        .await
        .expect("Failed to create user")
}

/// Create a run at a Seoul wall-clock time (`YYYY-MM-DD HH:mm`).
#[allow(dead_code)]
pub async fn seed_run(state: &AppState, user_id: &str, local: &str, hundredths: i64) -> Run {
    state
        .runs
        .create(NewRun {
            user_id: user_id.to_string(),
            run_at: parse_ymd_hm("runAt", local, chrono_tz::Asia::Seoul).expect("valid time"),
            distance: Km::from_hundredths(hundredths),
            duration_sec: 1800,
            note: None,
        })
        .await
        .expect("Failed to create run")
}

#[allow(dead_code)]
pub async fn seed_shoe(state: &AppState, user_id: &str, model: &str) -> Shoe {
    state
        .shoes
        .create(NewShoe {
            user_id: user_id.to_string(),
            brand: "Mizuno".to_string(),
            model: model.to_string(),
            nickname: None,
        })
        .await
        .expect("Failed to create shoe")
}

/// Send a request with a bearer token and return the status and JSON body
/// (`Value::Null` when the body is empty).
#[allow(dead_code)]
pub async fn send(
    app: &axum::Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}
