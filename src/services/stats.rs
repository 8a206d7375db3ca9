// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weekly, monthly, yearly and overall run statistics.
//!
//! Every report works in one caller-supplied zone: the window is the local
//! calendar range converted to instants with [`start_of_local_day`], and
//! rows are grouped by `local_bucket` in the same zone. Buckets without runs
//! are zero-filled.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::db::runs::{self, BucketTotals};
use crate::db::{BucketUnit, Db};
use crate::error::{AppError, Result};
use crate::models::{StatsBucket, StatsRange, StatsReport, StatsSummary};
use crate::time_utils::{start_of_local_day, today_in};

pub const MIN_YEAR: i32 = 1970;
pub const MAX_YEAR: i32 = 9999;

const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// A bucket slot of a report: the store key it collects and its label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSlot {
    pub key: String,
    pub label: String,
}

/// Monday-to-Sunday week containing `date`.
pub fn week_range(date: NaiveDate) -> StatsRange {
    let offset = u64::from(date.weekday().num_days_from_monday());
    let start = date - Days::new(offset);
    StatsRange {
        start,
        end: start + Days::new(6),
    }
}

/// First to last day of a calendar month.
pub fn month_range(year: i32, month: u32) -> Result<StatsRange> {
    let year = validate_year(year)?;
    if !(1..=12).contains(&month) {
        return Err(AppError::malformed_input(
            "month",
            "month must be between 1 and 12",
        ));
    }
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::malformed_input("month", "no such month"))?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let end = next
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| AppError::malformed_input("month", "no such month"))?;
    Ok(StatsRange { start, end })
}

/// January 1st to December 31st.
pub fn year_range(year: i32) -> Result<StatsRange> {
    let year = validate_year(year)?;
    match (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) {
        (Some(start), Some(end)) => Ok(StatsRange { start, end }),
        _ => Err(AppError::malformed_input("year", "no such year")),
    }
}

fn validate_year(year: i32) -> Result<i32> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(year)
    } else {
        Err(AppError::malformed_input(
            "year",
            format!("year must be between {} and {}", MIN_YEAR, MAX_YEAR),
        ))
    }
}

/// Half-open `[start, end)` instants covering the local dates of `range`.
pub fn local_window(range: StatsRange, tz: Tz) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let after_end = range
        .end
        .checked_add_days(Days::new(1))
        .ok_or_else(|| AppError::BadRequest("date out of range".to_string()))?;
    Ok((
        start_of_local_day(range.start, tz),
        start_of_local_day(after_end, tz),
    ))
}

/// Day slots for every date of `range`, labeled by `label`.
fn day_slots(range: StatsRange, label: impl Fn(NaiveDate) -> String) -> Vec<BucketSlot> {
    range
        .start
        .iter_days()
        .take_while(|d| *d <= range.end)
        .map(|d| BucketSlot {
            key: BucketUnit::Day.date_key(d),
            label: label(d),
        })
        .collect()
}

fn month_slots(year: i32) -> Vec<BucketSlot> {
    (1..=12)
        .filter_map(|m| NaiveDate::from_ymd_opt(year, m, 1))
        .map(|d| BucketSlot {
            key: BucketUnit::Month.date_key(d),
            label: d.month().to_string(),
        })
        .collect()
}

fn year_slots(first: i32, last: i32) -> Vec<BucketSlot> {
    (first..=last)
        .filter_map(|y| NaiveDate::from_ymd_opt(y, 1, 1))
        .map(|d| BucketSlot {
            key: BucketUnit::Year.date_key(d),
            label: d.year().to_string(),
        })
        .collect()
}

/// Lay `totals` onto `slots`, zero-filling slots that have no runs.
///
/// Totals whose key matches no slot are dropped.
pub fn fill_buckets(slots: &[BucketSlot], totals: &[BucketTotals]) -> Vec<StatsBucket> {
    let by_key: HashMap<&str, &BucketTotals> =
        totals.iter().map(|t| (t.key.as_str(), t)).collect();

    slots
        .iter()
        .map(|slot| match by_key.get(slot.key.as_str()) {
            Some(t) => StatsBucket {
                label: slot.label.clone(),
                km: t.km,
                duration_sec: t.duration_sec,
                count: t.count,
            },
            None => StatsBucket::empty(slot.label.clone()),
        })
        .collect()
}

#[derive(Clone)]
pub struct StatsAggregator {
    db: Db,
}

impl StatsAggregator {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// The Monday-based week containing `reference` (default: today in `tz`).
    pub async fn weekly(
        &self,
        user_id: &str,
        reference: Option<NaiveDate>,
        tz: Tz,
        now: DateTime<Utc>,
    ) -> Result<StatsReport> {
        let range = week_range(reference.unwrap_or_else(|| today_in(tz, now)));
        let slots = day_slots(range, |d| {
            WEEKDAY_LABELS[d.weekday().num_days_from_monday() as usize].to_string()
        });
        self.windowed(user_id, range, tz, BucketUnit::Day, slots).await
    }

    /// One calendar month, one bucket per day. Missing parts default to the
    /// current local year/month.
    pub async fn monthly(
        &self,
        user_id: &str,
        year: Option<i32>,
        month: Option<u32>,
        tz: Tz,
        now: DateTime<Utc>,
    ) -> Result<StatsReport> {
        let today = today_in(tz, now);
        let range = month_range(
            year.unwrap_or_else(|| today.year()),
            month.unwrap_or_else(|| today.month()),
        )?;
        let slots = day_slots(range, |d| d.day().to_string());
        self.windowed(user_id, range, tz, BucketUnit::Day, slots).await
    }

    /// One calendar year, one bucket per month.
    pub async fn yearly(
        &self,
        user_id: &str,
        year: Option<i32>,
        tz: Tz,
        now: DateTime<Utc>,
    ) -> Result<StatsReport> {
        let year = year.unwrap_or_else(|| today_in(tz, now).year());
        let range = year_range(year)?;
        self.windowed(user_id, range, tz, BucketUnit::Month, month_slots(year))
            .await
    }

    /// Every year from the user's first run to the last, one bucket each.
    pub async fn overall(&self, user_id: &str, tz: Tz) -> Result<StatsReport> {
        let user_id = user_id.to_string();
        let (span, totals) = self
            .db
            .read(move |conn| {
                let span = runs::run_span(conn, &user_id)?;
                let totals = match span {
                    Some(_) => runs::bucket_totals(conn, &user_id, None, tz, BucketUnit::Year)?,
                    None => Vec::new(),
                };
                Ok((span, totals))
            })
            .await?;

        let Some((first, last)) = span else {
            return Ok(StatsReport {
                range: None,
                buckets: Vec::new(),
                summary: StatsSummary::from_buckets(&[]),
            });
        };

        let range = StatsRange {
            start: first.with_timezone(&tz).date_naive(),
            end: last.with_timezone(&tz).date_naive(),
        };
        let buckets = fill_buckets(&year_slots(range.start.year(), range.end.year()), &totals);
        Ok(StatsReport {
            range: Some(range),
            summary: StatsSummary::from_buckets(&buckets),
            buckets,
        })
    }

    async fn windowed(
        &self,
        user_id: &str,
        range: StatsRange,
        tz: Tz,
        unit: BucketUnit,
        slots: Vec<BucketSlot>,
    ) -> Result<StatsReport> {
        let window = local_window(range, tz)?;
        let user_id = user_id.to_string();
        let totals = self
            .db
            .read(move |conn| runs::bucket_totals(conn, &user_id, Some(window), tz, unit))
            .await?;

        tracing::debug!(
            start = %range.start,
            end = %range.end,
            tz = tz.name(),
            unit = unit.as_str(),
            "Stats window aggregated"
        );

        let buckets = fill_buckets(&slots, &totals);
        Ok(StatsReport {
            range: Some(range),
            summary: StatsSummary::from_buckets(&buckets),
            buckets,
        })
    }
}
