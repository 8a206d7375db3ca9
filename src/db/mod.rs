// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (SQLite via an r2d2 pool).
//!
//! The row-level modules (`runs`, `shoes`, `users`) take a plain
//! `&Connection` so callers can compose them inside one transaction. [`Db`]
//! hands out such connections on the blocking thread pool:
//! - [`Db::read`] runs a closure in a deferred transaction (one snapshot)
//! - [`Db::write`] runs a closure in a `BEGIN IMMEDIATE` transaction that
//!   commits only if the closure returns `Ok`

pub mod functions;
pub mod runs;
pub mod schema;
pub mod shoes;
pub mod users;

pub use functions::BucketUnit;

use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::time::Duration;

/// Connection pool settings.
#[derive(Debug, Clone)]
pub struct DbOptions {
    pub pool_size: u32,
    pub busy_timeout_ms: u32,
}

impl Default for DbOptions {
    fn default() -> Self {
        Self {
            pool_size: 8,
            busy_timeout_ms: 5000,
        }
    }
}

/// Pragmas and SQL functions applied to every new pooled connection.
#[derive(Debug)]
struct ConnectionSetup {
    busy_timeout_ms: u32,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for ConnectionSetup {
    fn on_acquire(&self, conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = WAL;\
             PRAGMA busy_timeout = {};\
             PRAGMA foreign_keys = ON;\
             PRAGMA synchronous = NORMAL;",
            self.busy_timeout_ms
        ))?;
        functions::register(conn)
    }
}

/// SQLite database handle.
#[derive(Clone)]
pub struct Db {
    pool: Pool<SqliteConnectionManager>,
}

impl Db {
    /// Open (or create) a file-backed database and apply the schema.
    pub fn open(path: &str, options: &DbOptions) -> Result<Self> {
        if options.pool_size == 0 {
            return Err(AppError::Internal(anyhow::anyhow!(
                "database pool size must be at least 1"
            )));
        }
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(options.pool_size)
            .connection_timeout(Duration::from_secs(5))
            .connection_customizer(Box::new(ConnectionSetup {
                busy_timeout_ms: options.busy_timeout_ms,
            }))
            .build(manager)?;

        let db = Self { pool };
        db.init_schema()?;
        tracing::info!(path, pool_size = options.pool_size, "Database opened");
        Ok(db)
    }

    /// Open a private in-memory database.
    ///
    /// Every SQLite in-memory connection is its own database, so the pool
    /// holds exactly one connection that never expires.
    pub fn open_in_memory() -> Result<Self> {
        let pool = Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connection_timeout(Duration::from_secs(30))
            .connection_customizer(Box::new(ConnectionSetup {
                busy_timeout_ms: DbOptions::default().busy_timeout_ms,
            }))
            .build(SqliteConnectionManager::memory())?;

        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute_batch(schema::CREATE_TABLES)?;
        conn.execute(
            "INSERT INTO schema_version (version)
             SELECT ?1 WHERE NOT EXISTS (SELECT 1 FROM schema_version)",
            [schema::SCHEMA_VERSION],
        )?;
        Ok(())
    }

    /// Run read-only work against a consistent snapshot.
    pub async fn read<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        run_blocking(move || {
            let mut conn = pool.get()?;
            let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
            let value = f(&*tx)?;
            tx.finish()?;
            Ok(value)
        })
        .await
    }

    /// Run work inside a single write transaction.
    ///
    /// Any error returned by `f` rolls the whole transaction back.
    pub async fn write<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        run_blocking(move || {
            let mut conn = pool.get()?;
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let value = f(&tx)?;
            tx.commit()?;
            Ok(value)
        })
        .await
    }
}

async fn run_blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Blocking database task failed: {}", e)))?
}

// ─── Column Helpers ──────────────────────────────────────────

pub(crate) fn to_millis(instant: DateTime<Utc>) -> i64 {
    instant.timestamp_millis()
}

/// Convert a stored epoch-millisecond column back to an instant.
pub(crate) fn from_millis(ms: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Integer,
            format!("timestamp out of range: {ms}").into(),
        )
    })
}
