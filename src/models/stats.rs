// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Distance/duration statistics for charting.

use chrono::NaiveDate;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::Km;
use crate::time_utils::{format_sec_hms, format_sec_ms};

/// Aggregated totals for one calendar bucket (day, month, or year).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct StatsBucket {
    /// `Mon`..`Sun`, day of month, month number, or year
    pub label: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub km: Km,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub duration_sec: i64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub count: i64,
}

impl StatsBucket {
    pub fn empty(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            km: Km::ZERO,
            duration_sec: 0,
            count: 0,
        }
    }
}

/// Window-level summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_km: Km,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_duration_sec: i64,
    /// `HH:mm:ss`
    pub total_duration: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub run_count: i64,
    /// Seconds per km, rounded; `None` when no distance was run
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub avg_pace_sec_per_km: Option<i64>,
    /// `mm:ss` per km
    pub avg_pace: Option<String>,
}

impl StatsSummary {
    pub fn new(total_km: Km, total_duration_sec: i64, run_count: i64) -> Self {
        let avg_pace_sec_per_km = average_pace(total_km, total_duration_sec);
        Self {
            total_km,
            total_duration_sec,
            total_duration: format_sec_hms(total_duration_sec),
            run_count,
            avg_pace_sec_per_km,
            avg_pace: avg_pace_sec_per_km.map(format_sec_ms),
        }
    }

    pub fn from_buckets(buckets: &[StatsBucket]) -> Self {
        Self::new(
            buckets.iter().map(|b| b.km).sum(),
            buckets.iter().map(|b| b.duration_sec).sum(),
            buckets.iter().map(|b| b.count).sum(),
        )
    }
}

/// `round(duration / km)` in seconds per km, half away from zero.
pub fn average_pace(total_km: Km, total_duration_sec: i64) -> Option<i64> {
    let hundredths = total_km.hundredths();
    if hundredths <= 0 {
        return None;
    }
    let numerator = i128::from(total_duration_sec.max(0)) * 100;
    let denominator = i128::from(hundredths);
    Some(((2 * numerator + denominator) / (2 * denominator)) as i64)
}

/// Inclusive local-date range a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StatsRange {
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub start: NaiveDate,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub end: NaiveDate,
}

/// A full stats response: zero-filled buckets plus a summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StatsReport {
    /// `None` only for an overall report of a user without runs
    pub range: Option<StatsRange>,
    pub buckets: Vec<StatsBucket>,
    pub summary: StatsSummary,
}
