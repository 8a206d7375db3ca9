// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Mileage tracker: running log with per-shoe mileage and charted stats.
//!
//! This crate provides the backend API: a paginated run feed, calendar
//! statistics bucketed in the caller's time zone, and a mileage ledger that
//! keeps every shoe's total equal to the distance of the runs linked to it.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Db;
use services::{MileageLedger, RunFeedPager, RunService, ShoeService, StatsAggregator};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub ledger: MileageLedger,
    pub feed: RunFeedPager,
    pub stats: StatsAggregator,
    pub runs: RunService,
    pub shoes: ShoeService,
}

impl AppState {
    pub fn new(config: Config, db: Db) -> Self {
        Self {
            ledger: MileageLedger::new(db.clone()),
            feed: RunFeedPager::new(db.clone()),
            stats: StatsAggregator::new(db.clone()),
            runs: RunService::new(db.clone()),
            shoes: ShoeService::new(db.clone()),
            config,
            db,
        }
    }
}
