// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod cursor;
pub mod feed;
pub mod ledger;
pub mod runs;
pub mod shoes;
pub mod stats;

pub use cursor::{decode_cursor, encode_cursor, RunCursor};
pub use feed::{RunFeedPage, RunFeedPager};
pub use ledger::{LinkOutcome, MileageLedger, RunDeletion, UnlinkOutcome};
pub use runs::RunService;
pub use shoes::ShoeService;
pub use stats::StatsAggregator;

use crate::db::users;
use crate::error::{AppError, Result};

/// Fail with `NotFound` once the account behind a still-valid session is gone.
pub(crate) fn require_account(conn: &rusqlite::Connection, user_id: &str) -> Result<()> {
    if users::user_exists(conn, user_id)? {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("User {} not found", user_id)))
    }
}
