// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time parsing and formatting.
//!
//! Every parser checks the exact textual shape first and then validates the
//! calendar value, returning a [`TimeInputError`] naming the offending field.

use chrono::{
    DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc,
};
use chrono_tz::Tz;

/// A time-related input did not match its required format.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field} must be {expected}")]
pub struct TimeInputError {
    pub field: &'static str,
    pub expected: &'static str,
}

impl TimeInputError {
    fn new(field: &'static str, expected: &'static str) -> Self {
        Self { field, expected }
    }
}

const YMD_HM: &str = "dddd-dd-dd dd:dd";
const YMD: &str = "dddd-dd-dd";
const HMS: &str = "dd:dd:dd";

/// Check `raw` against a shape where `d` is an ASCII digit and every other
/// character must match literally.
fn matches_shape(raw: &str, shape: &str) -> bool {
    raw.len() == shape.len()
        && raw.bytes().zip(shape.bytes()).all(|(c, s)| match s {
            b'd' => c.is_ascii_digit(),
            _ => c == s,
        })
}

/// Parse `"YYYY-MM-DD HH:mm"` as wall-clock time in `tz`.
///
/// Ambiguous local times (DST fall-back) resolve to the earlier instant;
/// times skipped by a DST jump are rejected.
pub fn parse_ymd_hm(
    field: &'static str,
    raw: &str,
    tz: Tz,
) -> Result<DateTime<Utc>, TimeInputError> {
    const EXPECTED: &str = "a \"YYYY-MM-DD HH:mm\" local time";
    if !matches_shape(raw, YMD_HM) {
        return Err(TimeInputError::new(field, EXPECTED));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M")
        .map_err(|_| TimeInputError::new(field, EXPECTED))?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| TimeInputError::new(field, "a local time that exists in the time zone"))
}

/// Parse `"HH:mm:ss"` into whole seconds.
pub fn parse_hms(field: &'static str, raw: &str) -> Result<i64, TimeInputError> {
    const EXPECTED: &str = "a \"HH:mm:ss\" duration";
    if !matches_shape(raw, HMS) {
        return Err(TimeInputError::new(field, EXPECTED));
    }
    let part = |i: usize| raw[i..i + 2].parse::<i64>().unwrap_or(i64::MAX);
    let (h, m, s) = (part(0), part(3), part(6));
    if h > 23 || m > 59 || s > 59 {
        return Err(TimeInputError::new(field, EXPECTED));
    }
    Ok(h * 3600 + m * 60 + s)
}

/// Parse a `"YYYY-MM-DD"` calendar date.
pub fn parse_ymd(field: &'static str, raw: &str) -> Result<NaiveDate, TimeInputError> {
    const EXPECTED: &str = "a \"YYYY-MM-DD\" date";
    if !matches_shape(raw, YMD) {
        return Err(TimeInputError::new(field, EXPECTED));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| TimeInputError::new(field, EXPECTED))
}

/// Parse a reference date given either as `"YYYY-MM-DD"` or as an RFC 3339
/// instant, which is converted to its calendar date in `tz`.
pub fn parse_reference_date(
    field: &'static str,
    raw: &str,
    tz: Tz,
) -> Result<NaiveDate, TimeInputError> {
    if matches_shape(raw, YMD) {
        return parse_ymd(field, raw);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&tz).date_naive())
        .map_err(|_| TimeInputError::new(field, "a \"YYYY-MM-DD\" date or an RFC 3339 instant"))
}

/// Parse an IANA time zone name such as `Asia/Seoul`.
pub fn parse_time_zone(field: &'static str, raw: &str) -> Result<Tz, TimeInputError> {
    raw.trim()
        .parse::<Tz>()
        .map_err(|_| TimeInputError::new(field, "an IANA time zone name"))
}

/// Today's calendar date in `tz`.
pub fn today_in(tz: Tz, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// The first instant of `date` in `tz`.
///
/// Zones that skip midnight on a DST change start the day at the first
/// existing hour.
pub fn start_of_local_day(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    (0..24)
        .filter_map(|h| NaiveTime::from_hms_opt(h, 0, 0))
        .find_map(|t| tz.from_local_datetime(&date.and_time(t)).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}

/// Format seconds as `HH:mm:ss`; hours are not capped at 24.
pub fn format_sec_hms(sec: i64) -> String {
    let t = sec.max(0);
    format!("{:02}:{:02}:{:02}", t / 3600, (t % 3600) / 60, t % 60)
}

/// Format seconds as `mm:ss`; minutes are not capped at 60.
pub fn format_sec_ms(sec: i64) -> String {
    let t = sec.max(0);
    format!("{:02}:{:02}", t / 60, t % 60)
}

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}
