// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run rows: point lookups, keyset range queries, and aggregates.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::functions::BucketUnit;
use crate::db::{from_millis, to_millis};
use crate::error::Result;
use crate::models::{new_id, Km, NewRun, Run};

const RUN_COLUMNS: &str =
    "id, user_id, run_at, distance, duration_sec, note, created_at, updated_at";

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<Run> {
    Ok(Run {
        id: row.get(0)?,
        user_id: row.get(1)?,
        run_at: from_millis(row.get(2)?)?,
        distance: row.get(3)?,
        duration_sec: row.get(4)?,
        note: row.get(5)?,
        created_at: from_millis(row.get(6)?)?,
        updated_at: from_millis(row.get(7)?)?,
    })
}

/// Per-bucket totals as returned by [`bucket_totals`].
#[derive(Debug, Clone, PartialEq)]
pub struct BucketTotals {
    /// `YYYY-MM-DD`, `YYYY-MM` or `YYYY` in the requested zone
    pub key: String,
    pub km: Km,
    pub duration_sec: i64,
    pub count: i64,
}

pub fn insert_run(conn: &Connection, new_run: &NewRun) -> Result<Run> {
    let now = Utc::now();
    let run = Run {
        id: new_id(),
        user_id: new_run.user_id.clone(),
        // Stored with millisecond precision.
        run_at: from_millis(to_millis(new_run.run_at))?,
        distance: new_run.distance,
        duration_sec: new_run.duration_sec,
        note: new_run.note.clone(),
        created_at: from_millis(to_millis(now))?,
        updated_at: from_millis(to_millis(now))?,
    };
    conn.execute(
        "INSERT INTO runs (id, user_id, run_at, distance, duration_sec, note, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            run.id,
            run.user_id,
            to_millis(run.run_at),
            run.distance,
            run.duration_sec,
            run.note,
            to_millis(run.created_at),
            to_millis(run.updated_at),
        ],
    )?;
    Ok(run)
}

pub fn get_run(conn: &Connection, id: &str) -> Result<Option<Run>> {
    Ok(conn
        .query_row(
            &format!("SELECT {RUN_COLUMNS} FROM runs WHERE id = ?1"),
            [id],
            run_from_row,
        )
        .optional()?)
}

/// Persist the mutable fields of `run`. Returns the stored row.
pub fn update_run(conn: &Connection, run: &Run) -> Result<Run> {
    let updated_at = from_millis(to_millis(Utc::now()))?;
    conn.execute(
        "UPDATE runs SET run_at = ?1, distance = ?2, duration_sec = ?3, note = ?4, updated_at = ?5
         WHERE id = ?6",
        params![
            to_millis(run.run_at),
            run.distance,
            run.duration_sec,
            run.note,
            to_millis(updated_at),
            run.id,
        ],
    )?;
    Ok(Run {
        run_at: from_millis(to_millis(run.run_at))?,
        updated_at,
        ..run.clone()
    })
}

pub fn delete_run(conn: &Connection, id: &str) -> Result<bool> {
    Ok(conn.execute("DELETE FROM runs WHERE id = ?1", [id])? > 0)
}

/// Up to `limit` runs of `user_id` in `(run_at DESC, id DESC)` order,
/// strictly after the `(run_at, id)` position when one is given.
pub fn runs_page(
    conn: &Connection,
    user_id: &str,
    after: Option<(DateTime<Utc>, &str)>,
    limit: u32,
) -> Result<Vec<Run>> {
    let runs = match after {
        None => {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {RUN_COLUMNS} FROM runs WHERE user_id = ?1
                 ORDER BY run_at DESC, id DESC LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![user_id, limit], run_from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        }
        Some((run_at, id)) => {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {RUN_COLUMNS} FROM runs
                 WHERE user_id = ?1 AND (run_at < ?2 OR (run_at = ?2 AND id < ?3))
                 ORDER BY run_at DESC, id DESC LIMIT ?4"
            ))?;
            let rows = stmt.query_map(
                params![user_id, to_millis(run_at), id, limit],
                run_from_row,
            )?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        }
    };
    Ok(runs)
}

/// Sum of distance over every run of `user_id`.
pub fn total_distance(conn: &Connection, user_id: &str) -> Result<Km> {
    Ok(conn.query_row(
        "SELECT COALESCE(SUM(distance), 0) FROM runs WHERE user_id = ?1",
        [user_id],
        |row| row.get(0),
    )?)
}

/// Earliest and latest run instants of `user_id`, if any runs exist.
pub fn run_span(conn: &Connection, user_id: &str) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>> {
    let span: (Option<i64>, Option<i64>) = conn.query_row(
        "SELECT MIN(run_at), MAX(run_at) FROM runs WHERE user_id = ?1",
        [user_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    match span {
        (Some(first), Some(last)) => Ok(Some((from_millis(first)?, from_millis(last)?))),
        _ => Ok(None),
    }
}

/// Distance, duration and count per local calendar bucket.
///
/// `window` is a half-open `[start, end)` range of instants; `None` covers
/// all runs. Buckets without runs are absent from the result.
pub fn bucket_totals(
    conn: &Connection,
    user_id: &str,
    window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    tz: Tz,
    unit: BucketUnit,
) -> Result<Vec<BucketTotals>> {
    let (start, end) = match window {
        Some((start, end)) => (to_millis(start), to_millis(end)),
        None => (i64::MIN, i64::MAX),
    };
    let mut stmt = conn.prepare_cached(
        "SELECT local_bucket(run_at, ?2, ?3) AS bucket,
                SUM(distance), SUM(duration_sec), COUNT(*)
         FROM runs
         WHERE user_id = ?1 AND run_at >= ?4 AND run_at < ?5
         GROUP BY bucket
         ORDER BY bucket",
    )?;
    let rows = stmt.query_map(
        params![user_id, tz.name(), unit.as_str(), start, end],
        |row| {
            Ok(BucketTotals {
                key: row.get(0)?,
                km: row.get(1)?,
                duration_sec: row.get(2)?,
                count: row.get(3)?,
            })
        },
    )?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}
