// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Current user profile and account deletion.

use crate::db::users;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::User;
use crate::routes::auth::clear_session;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// User routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/me", get(get_me).delete(delete_account))
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<User>> {
    let user_id = user.user_id;
    let profile = state
        .db
        .read(move |conn| {
            users::get_user(conn, &user_id)?
                .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
        })
        .await?;
    Ok(Json(profile))
}

/// Delete the account with all runs, shoes and links, and end the session.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode)> {
    let user_id = user.user_id.clone();
    let deleted = state
        .db
        .write(move |tx| users::delete_user(tx, &user_id))
        .await?;
    if !deleted {
        return Err(AppError::NotFound(format!("User {} not found", user.user_id)));
    }

    tracing::info!(user_id = %user.user_id, "Account deleted");
    Ok((
        clear_session(jar, state.config.production),
        StatusCode::NO_CONTENT,
    ))
}
