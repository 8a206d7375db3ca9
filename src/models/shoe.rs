// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shoe and shoe-mileage (run link) models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Km;

/// Stored shoe record.
///
/// `total_mileage` always equals the summed distance of the runs linked to
/// this shoe; only the mileage ledger changes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shoe {
    pub id: String,
    pub user_id: String,
    pub brand: String,
    pub model: String,
    pub nickname: Option<String>,
    pub total_mileage: Km,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A new shoe. Mileage always starts at zero.
#[derive(Debug, Clone)]
pub struct NewShoe {
    pub user_id: String,
    pub brand: String,
    pub model: String,
    pub nickname: Option<String>,
}

/// Descriptive fields of a shoe that may be edited.
#[derive(Debug, Clone, Default)]
pub struct ShoeChanges {
    pub brand: Option<String>,
    pub model: Option<String>,
    /// `Some(None)` clears the nickname
    pub nickname: Option<Option<String>>,
}

impl ShoeChanges {
    pub fn is_empty(&self) -> bool {
        self.brand.is_none() && self.model.is_none() && self.nickname.is_none()
    }
}

/// Link between a run and the shoe it was run in. At most one per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoeMileage {
    pub id: String,
    pub shoe_id: String,
    pub run_id: String,
    pub created_at: DateTime<Utc>,
}
