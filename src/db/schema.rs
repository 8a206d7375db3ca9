// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQL DDL. Instants are epoch milliseconds, distances are hundredths of a km.

pub const SCHEMA_VERSION: u32 = 1;

pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    nickname TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS runs (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    run_at INTEGER NOT NULL,
    distance INTEGER NOT NULL CHECK (distance BETWEEN 1 AND 99999),
    duration_sec INTEGER NOT NULL DEFAULT 0 CHECK (duration_sec >= 0),
    note TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS shoes (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    brand TEXT NOT NULL,
    model TEXT NOT NULL,
    nickname TEXT,
    total_mileage INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS shoe_mileages (
    id TEXT PRIMARY KEY,
    shoe_id TEXT NOT NULL REFERENCES shoes(id) ON DELETE CASCADE,
    run_id TEXT NOT NULL UNIQUE REFERENCES runs(id) ON DELETE CASCADE,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_runs_feed ON runs(user_id, run_at DESC, id DESC);
CREATE INDEX IF NOT EXISTS idx_shoes_user ON shoes(user_id);
CREATE INDEX IF NOT EXISTS idx_shoe_mileages_shoe ON shoe_mileages(shoe_id);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);
"#;
