// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQL scalar functions registered on every pooled connection.
//!
//! `local_bucket(run_at_ms, tz, unit)` maps an instant to the calendar
//! bucket it falls in when viewed from `tz`, so GROUP BY keys and window
//! boundaries are both computed in the same zone.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

/// Calendar granularity of a stats bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketUnit {
    Day,
    Month,
    Year,
}

impl BucketUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            BucketUnit::Day => "day",
            BucketUnit::Month => "month",
            BucketUnit::Year => "year",
        }
    }

    fn format(self) -> &'static str {
        match self {
            BucketUnit::Day => "%Y-%m-%d",
            BucketUnit::Month => "%Y-%m",
            BucketUnit::Year => "%Y",
        }
    }

    /// Bucket key of a local calendar date, matching [`local_bucket_key`].
    pub fn date_key(self, date: NaiveDate) -> String {
        date.format(self.format()).to_string()
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "day" => Some(BucketUnit::Day),
            "month" => Some(BucketUnit::Month),
            "year" => Some(BucketUnit::Year),
            _ => None,
        }
    }
}

/// Bucket key (`YYYY-MM-DD`, `YYYY-MM` or `YYYY`) of an instant in `tz`.
pub fn local_bucket_key(instant: DateTime<Utc>, tz: Tz, unit: BucketUnit) -> String {
    instant.with_timezone(&tz).format(unit.format()).to_string()
}

#[derive(Debug, thiserror::Error)]
enum LocalBucketError {
    #[error("invalid timestamp: {0}")]
    Timestamp(i64),
    #[error("unknown time zone: {0}")]
    TimeZone(String),
    #[error("unknown bucket unit: {0}")]
    Unit(String),
}

fn local_bucket_sql(ms: i64, tz: &str, unit: &str) -> Result<String, LocalBucketError> {
    let instant = DateTime::from_timestamp_millis(ms).ok_or(LocalBucketError::Timestamp(ms))?;
    let tz: Tz = tz
        .parse()
        .map_err(|_| LocalBucketError::TimeZone(tz.to_string()))?;
    let unit = BucketUnit::parse(unit).ok_or_else(|| LocalBucketError::Unit(unit.to_string()))?;
    Ok(local_bucket_key(instant, tz, unit))
}

pub fn register(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "local_bucket",
        3,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let ms: i64 = ctx.get(0)?;
            let tz: String = ctx.get(1)?;
            let unit: String = ctx.get(2)?;
            local_bucket_sql(ms, &tz, &unit)
                .map_err(|e| rusqlite::Error::UserFunctionError(Box::new(e)))
        },
    )
}
