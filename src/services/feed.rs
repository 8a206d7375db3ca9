// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Most-recent-first run feed with keyset pagination.

use serde::Serialize;

use crate::db::{runs, Db};
use crate::error::{AppError, Result};
use crate::models::{Km, Run};
use crate::services::cursor::{decode_cursor, encode_cursor, RunCursor};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// One page of the run feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunFeedPage {
    pub items: Vec<Run>,
    /// Token for the next page; `None` on the last page
    pub next_cursor: Option<String>,
    pub has_next_page: bool,
    /// Distance over all of the user's runs, not just this page
    pub total_distance_km: Km,
}

#[derive(Clone)]
pub struct RunFeedPager {
    db: Db,
}

impl RunFeedPager {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Fetch up to `take` runs of `user_id` after `cursor`.
    ///
    /// The cursor is decoded before touching the store, so a bad token is
    /// always rejected and never treated as "first page".
    pub async fn page(&self, user_id: &str, cursor: Option<&str>, take: u32) -> Result<RunFeedPage> {
        if !(1..=MAX_PAGE_SIZE).contains(&take) {
            return Err(AppError::malformed_input(
                "take",
                format!("take must be between 1 and {}", MAX_PAGE_SIZE),
            ));
        }
        let after = cursor.map(decode_cursor).transpose()?;
        let user_id = user_id.to_string();

        let (mut items, total_distance_km) = self
            .db
            .read(move |conn| {
                let position = after.as_ref().map(|c| (c.run_at, c.id.as_str()));
                let items = runs::runs_page(conn, &user_id, position, take + 1)?;
                let total = runs::total_distance(conn, &user_id)?;
                Ok((items, total))
            })
            .await?;

        let has_next_page = items.len() > take as usize;
        items.truncate(take as usize);
        let next_cursor = match items.last() {
            Some(last) if has_next_page => {
                Some(encode_cursor(&RunCursor::new(last.run_at, last.id.clone())))
            }
            _ => None,
        };

        tracing::debug!(
            items = items.len(),
            has_next_page,
            "Run feed page served"
        );

        Ok(RunFeedPage {
            items,
            next_cursor,
            has_next_page,
            total_distance_km,
        })
    }
}
