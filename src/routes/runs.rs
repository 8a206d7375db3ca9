// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run feed, run CRUD and stats routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Km, NewRun, Run, RunChanges, Shoe, StatsReport};
use crate::services::feed::{RunFeedPage, DEFAULT_PAGE_SIZE};
use crate::time_utils::{parse_hms, parse_reference_date, parse_time_zone, parse_ymd_hm};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use chrono::Utc;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Run routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/runs", get(list_runs).post(create_run))
        .route(
            "/api/runs/{id}",
            get(get_run).patch(update_run).delete(delete_run),
        )
        .route("/api/runs/stats/weekly", get(weekly_stats))
        .route("/api/runs/stats/monthly", get(monthly_stats))
        .route("/api/runs/stats/yearly", get(yearly_stats))
        .route("/api/runs/stats/overall", get(overall_stats))
}

// ─── Input Helpers ───────────────────────────────────────────

/// `?tz=` if given, else the configured default zone.
fn resolve_tz(raw: Option<&str>, default: Tz) -> Result<Tz> {
    match raw {
        Some(raw) if !raw.trim().is_empty() => Ok(parse_time_zone("tz", raw)?),
        _ => Ok(default),
    }
}

fn parse_distance(value: f64) -> Result<Km> {
    Km::from_f64(value).ok_or_else(|| {
        AppError::malformed_input("distance", "distance must have at most two decimal places")
    })
}

fn parse_number<T: std::str::FromStr>(field: &'static str, raw: Option<&str>) -> Result<Option<T>> {
    match raw {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AppError::malformed_input(field, format!("{} must be an integer", field))),
    }
}

/// Blank notes are stored as no note.
fn normalize_note(note: Option<String>) -> Option<String> {
    note.filter(|n| !n.trim().is_empty())
}

#[derive(Deserialize)]
struct TzQuery {
    tz: Option<String>,
}

// ─── Feed ────────────────────────────────────────────────────

#[derive(Deserialize)]
struct FeedQuery {
    /// Opaque token from a previous page
    cursor: Option<String>,
    take: Option<String>,
}

/// List the user's runs, newest first.
async fn list_runs(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<RunFeedPage>> {
    let take = parse_number("take", query.take.as_deref())?.unwrap_or(DEFAULT_PAGE_SIZE);
    let cursor = query.cursor.as_deref().filter(|c| !c.is_empty());
    Ok(Json(state.feed.page(&user.user_id, cursor, take).await?))
}

// ─── Run CRUD ────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRunRequest {
    /// `YYYY-MM-DD HH:mm` local time
    run_at: String,
    /// `HH:mm:ss`
    duration: String,
    distance: f64,
    note: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRunRequest {
    run_at: Option<String>,
    duration: Option<String>,
    distance: Option<f64>,
    #[serde(default, deserialize_with = "super::double_option")]
    note: Option<Option<String>>,
}

async fn create_run(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<TzQuery>,
    Json(body): Json<CreateRunRequest>,
) -> Result<(StatusCode, Json<Run>)> {
    let tz = resolve_tz(query.tz.as_deref(), state.config.default_time_zone)?;
    let new_run = NewRun {
        user_id: user.user_id,
        run_at: parse_ymd_hm("runAt", &body.run_at, tz)?,
        distance: parse_distance(body.distance)?,
        duration_sec: parse_hms("duration", &body.duration)?,
        note: normalize_note(body.note),
    };

    let run = state.runs.create(new_run).await?;
    Ok((StatusCode::CREATED, Json(run)))
}

async fn get_run(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Run>> {
    Ok(Json(state.runs.get(&user.user_id, &id).await?))
}

async fn update_run(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Query(query): Query<TzQuery>,
    Json(body): Json<UpdateRunRequest>,
) -> Result<Json<Run>> {
    let tz = resolve_tz(query.tz.as_deref(), state.config.default_time_zone)?;
    let changes = RunChanges {
        run_at: body
            .run_at
            .map(|raw| parse_ymd_hm("runAt", &raw, tz))
            .transpose()?,
        distance: body.distance.map(parse_distance).transpose()?,
        duration_sec: body
            .duration
            .map(|raw| parse_hms("duration", &raw))
            .transpose()?,
        note: body.note.map(normalize_note),
    };

    Ok(Json(state.runs.update(&user.user_id, &id, changes).await?))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteRunResponse {
    id: String,
    /// The shoe the run was linked to, with its reduced mileage
    shoe: Option<Shoe>,
}

async fn delete_run(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<DeleteRunResponse>> {
    let deletion = state.runs.delete(&user.user_id, &id).await?;
    Ok(Json(DeleteRunResponse {
        id: deletion.run_id,
        shoe: deletion.shoe,
    }))
}

// ─── Stats ───────────────────────────────────────────────────

#[derive(Deserialize)]
struct WeeklyQuery {
    /// Any day of the week, `YYYY-MM-DD` or RFC 3339
    date: Option<String>,
    tz: Option<String>,
}

#[derive(Deserialize)]
struct MonthlyQuery {
    year: Option<String>,
    month: Option<String>,
    tz: Option<String>,
}

#[derive(Deserialize)]
struct YearlyQuery {
    year: Option<String>,
    tz: Option<String>,
}

async fn weekly_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<WeeklyQuery>,
) -> Result<Json<StatsReport>> {
    let tz = resolve_tz(query.tz.as_deref(), state.config.default_time_zone)?;
    let reference = query
        .date
        .as_deref()
        .map(|raw| parse_reference_date("date", raw, tz))
        .transpose()?;

    let report = state
        .stats
        .weekly(&user.user_id, reference, tz, Utc::now())
        .await?;
    Ok(Json(report))
}

async fn monthly_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<MonthlyQuery>,
) -> Result<Json<StatsReport>> {
    let tz = resolve_tz(query.tz.as_deref(), state.config.default_time_zone)?;
    let year = parse_number("year", query.year.as_deref())?;
    let month = parse_number("month", query.month.as_deref())?;

    let report = state
        .stats
        .monthly(&user.user_id, year, month, tz, Utc::now())
        .await?;
    Ok(Json(report))
}

async fn yearly_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<YearlyQuery>,
) -> Result<Json<StatsReport>> {
    let tz = resolve_tz(query.tz.as_deref(), state.config.default_time_zone)?;
    let year = parse_number("year", query.year.as_deref())?;

    let report = state
        .stats
        .yearly(&user.user_id, year, tz, Utc::now())
        .await?;
    Ok(Json(report))
}

async fn overall_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<TzQuery>,
) -> Result<Json<StatsReport>> {
    let tz = resolve_tz(query.tz.as_deref(), state.config.default_time_zone)?;
    Ok(Json(state.stats.overall(&user.user_id, tz).await?))
}
