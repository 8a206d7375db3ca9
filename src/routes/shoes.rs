// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shoe routes, including linking runs to shoes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{NewShoe, Shoe, ShoeChanges};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Shoe routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/shoes", get(list_shoes).post(create_shoe))
        .route("/api/shoes/{id}", patch(update_shoe).delete(delete_shoe))
        .route("/api/shoes/{id}/mileages", post(link_run))
        .route("/api/shoes/mileages/{mileage_id}", delete(unlink_run))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateShoeRequest {
    brand: String,
    model: String,
    nickname: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateShoeRequest {
    brand: Option<String>,
    model: Option<String>,
    /// `null` or blank clears the nickname
    #[serde(default, deserialize_with = "super::double_option")]
    nickname: Option<Option<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkRequest {
    run_id: String,
}

/// Result of a link or unlink.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct MileageResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "unknown"))]
    pub shoe: Shoe,
    pub mileage_id: String,
    /// The run was moved here from another shoe
    pub moved: bool,
}

async fn list_shoes(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Shoe>>> {
    Ok(Json(state.shoes.list(&user.user_id).await?))
}

async fn create_shoe(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateShoeRequest>,
) -> Result<(StatusCode, Json<Shoe>)> {
    let shoe = state
        .shoes
        .create(NewShoe {
            user_id: user.user_id,
            brand: body.brand,
            model: body.model,
            nickname: body.nickname.filter(|n| !n.trim().is_empty()),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(shoe)))
}

async fn update_shoe(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdateShoeRequest>,
) -> Result<Json<Shoe>> {
    let changes = ShoeChanges {
        brand: body.brand,
        model: body.model,
        nickname: body
            .nickname
            .map(|n| n.filter(|n| !n.trim().is_empty())),
    };
    Ok(Json(state.shoes.update(&user.user_id, &id, changes).await?))
}

async fn delete_shoe(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.shoes.delete(&user.user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Link a run to a shoe, moving it off any other shoe.
async fn link_run(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(shoe_id): Path<String>,
    Json(body): Json<LinkRequest>,
) -> Result<Json<MileageResponse>> {
    let outcome = state
        .ledger
        .link(&user.user_id, &shoe_id, &body.run_id)
        .await?;
    Ok(Json(MileageResponse {
        shoe: outcome.shoe,
        mileage_id: outcome.mileage.id,
        moved: outcome.moved,
    }))
}

async fn unlink_run(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(mileage_id): Path<String>,
) -> Result<Json<MileageResponse>> {
    let outcome = state.ledger.unlink(&user.user_id, &mileage_id).await?;
    Ok(Json(MileageResponse {
        shoe: outcome.shoe,
        mileage_id: outcome.removed_id,
        moved: false,
    }))
}
