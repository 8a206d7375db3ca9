// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Values are read once at startup and passed around explicitly. The default
//! time zone and production flag are plain fields so handlers never consult
//! process state on their own.

use chrono_tz::Tz;
use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file
    pub database_path: String,
    /// Server port
    pub port: u16,
    /// Origins allowed by CORS
    pub cors_origins: Vec<String>,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Zone used for stats and run input when the request names none
    pub default_time_zone: Tz,
    /// Production mode (secure cookies)
    pub production: bool,
    /// Maximum pooled connections
    pub db_pool_size: u32,
    /// SQLite busy timeout; bounds how long a write waits on a locked store
    pub db_busy_timeout_ms: u32,
}

pub const DEFAULT_TIME_ZONE: Tz = chrono_tz::Asia::Seoul;

const DEFAULT_POOL_SIZE: u32 = 8;

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let default_time_zone = match env::var("DEFAULT_TIME_ZONE") {
            Ok(raw) => raw
                .trim()
                .parse::<Tz>()
                .map_err(|_| ConfigError::Invalid("DEFAULT_TIME_ZONE", raw))?,
            Err(_) => DEFAULT_TIME_ZONE,
        };

        Ok(Self {
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "mileage.db".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .unwrap_or(4000),
            cors_origins: parse_origins(
                &env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".to_string()),
            ),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            default_time_zone,
            production: env::var("APP_ENV")
                .map(|v| v.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
            db_pool_size: parse_pool_size(env::var("DB_POOL_SIZE").ok())?,
            db_busy_timeout_ms: env::var("DB_BUSY_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
        })
    }

    /// Deterministic config for tests.
    pub fn test_default() -> Self {
        Self {
            database_path: ":memory:".to_string(),
            port: 4000,
            cors_origins: vec!["http://localhost:5173".to_string()],
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            default_time_zone: DEFAULT_TIME_ZONE,
            production: false,
            db_pool_size: 4,
            db_busy_timeout_ms: 5000,
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Pool size from `DB_POOL_SIZE`; must be at least 1.
fn parse_pool_size(raw: Option<String>) -> Result<u32, ConfigError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_POOL_SIZE);
    };
    match raw.trim().parse::<u32>() {
        Ok(size) if size >= 1 => Ok(size),
        _ => Err(ConfigError::Invalid("DB_POOL_SIZE", raw)),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
