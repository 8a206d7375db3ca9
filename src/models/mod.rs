// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod distance;
pub mod run;
pub mod shoe;
pub mod stats;
pub mod user;

pub use distance::Km;
pub use run::{NewRun, Run, RunChanges};
pub use shoe::{NewShoe, Shoe, ShoeChanges, ShoeMileage};
pub use stats::{StatsBucket, StatsRange, StatsReport, StatsSummary};
pub use user::User;

/// Generate a new time-ordered identifier.
pub fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}
