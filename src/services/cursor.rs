// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Opaque keyset pagination cursor for the run feed.
//!
//! Wire format: base64url of `"<RFC 3339 instant>|<run id>"`. Clients must
//! only round-trip it.

use base64::{
    alphabet,
    engine::{general_purpose::URL_SAFE_NO_PAD, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{AppError, Result};

const SEPARATOR: char = '|';

/// Accepts tokens with or without `=` padding.
const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Position in the `(run_at DESC, id DESC)` feed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunCursor {
    pub run_at: DateTime<Utc>,
    pub id: String,
}

impl RunCursor {
    pub fn new(run_at: DateTime<Utc>, id: impl Into<String>) -> Self {
        Self {
            run_at,
            id: id.into(),
        }
    }
}

/// Encode a feed position as an opaque URL-safe token.
pub fn encode_cursor(cursor: &RunCursor) -> String {
    let payload = format!(
        "{}{}{}",
        cursor.run_at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        SEPARATOR,
        cursor.id
    );
    URL_SAFE_NO_PAD.encode(payload)
}

/// Decode a token produced by [`encode_cursor`].
pub fn decode_cursor(token: &str) -> Result<RunCursor> {
    let decoded = LENIENT_URL_SAFE
        .decode(token)
        .map_err(|_| AppError::MalformedCursor)?;
    let decoded = std::str::from_utf8(&decoded).map_err(|_| AppError::MalformedCursor)?;

    let (run_at, id) = decoded
        .split_once(SEPARATOR)
        .ok_or(AppError::MalformedCursor)?;
    if id.is_empty() || id.contains(SEPARATOR) {
        return Err(AppError::MalformedCursor);
    }
    let run_at = DateTime::parse_from_rfc3339(run_at)
        .map_err(|_| AppError::MalformedCursor)?
        .with_timezone(&Utc);

    Ok(RunCursor::new(run_at, id))
}
