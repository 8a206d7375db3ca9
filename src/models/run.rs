// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Km;

/// Maximum note length in characters.
pub const MAX_NOTE_CHARS: usize = 500;

/// Stored run record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    /// UUIDv7, also the feed tie-breaker
    pub id: String,
    /// Owner
    pub user_id: String,
    /// When the run happened
    pub run_at: DateTime<Utc>,
    pub distance: Km,
    pub duration_sec: i64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated run ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewRun {
    pub user_id: String,
    pub run_at: DateTime<Utc>,
    pub distance: Km,
    pub duration_sec: i64,
    pub note: Option<String>,
}

/// Validated partial update of a run. `note: Some(None)` clears the note.
#[derive(Debug, Clone, Default)]
pub struct RunChanges {
    pub run_at: Option<DateTime<Utc>>,
    pub distance: Option<Km>,
    pub duration_sec: Option<i64>,
    pub note: Option<Option<String>>,
}

impl RunChanges {
    pub fn is_empty(&self) -> bool {
        self.run_at.is_none()
            && self.distance.is_none()
            && self.duration_sec.is_none()
            && self.note.is_none()
    }

    /// Apply the changes to a copy of `run`.
    pub fn apply_to(&self, run: &Run) -> Run {
        let mut updated = run.clone();
        if let Some(run_at) = self.run_at {
            updated.run_at = run_at;
        }
        if let Some(distance) = self.distance {
            updated.distance = distance;
        }
        if let Some(duration_sec) = self.duration_sec {
            updated.duration_sec = duration_sec;
        }
        if let Some(note) = &self.note {
            updated.note = note.clone();
        }
        updated
    }
}

/// Whether a note has an acceptable length (1 to 500 characters).
pub fn is_valid_note(note: &str) -> bool {
    let len = note.chars().count();
    (1..=MAX_NOTE_CHARS).contains(&len)
}
