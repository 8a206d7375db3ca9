// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fixed-point kilometre values with two fractional digits.
//!
//! Stored and summed as integer hundredths so totals stay exact; rendered
//! as a JSON number.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Neg, Sub};

/// Distance in kilometres, held as hundredths of a kilometre.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Km(i64);

/// Smallest distance a single run may have (0.01 km).
pub const MIN_RUN_DISTANCE: Km = Km(1);
/// Largest distance a single run may have (999.99 km).
pub const MAX_RUN_DISTANCE: Km = Km(99_999);

impl Km {
    pub const ZERO: Km = Km(0);

    pub const fn from_hundredths(hundredths: i64) -> Self {
        Km(hundredths)
    }

    pub const fn hundredths(self) -> i64 {
        self.0
    }

    /// Convert a decimal value, rejecting more than two fractional digits.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let scaled = value * 100.0;
        let rounded = scaled.round();
        if (scaled - rounded).abs() > 1e-6 || rounded.abs() > i64::MAX as f64 {
            return None;
        }
        Some(Km(rounded as i64))
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Whether this is an acceptable distance for a single run.
    pub fn is_valid_run_distance(self) -> bool {
        (MIN_RUN_DISTANCE..=MAX_RUN_DISTANCE).contains(&self)
    }
}

impl Add for Km {
    type Output = Km;
    fn add(self, rhs: Km) -> Km {
        Km(self.0 + rhs.0)
    }
}

impl Sub for Km {
    type Output = Km;
    fn sub(self, rhs: Km) -> Km {
        Km(self.0 - rhs.0)
    }
}

impl Neg for Km {
    type Output = Km;
    fn neg(self) -> Km {
        Km(-self.0)
    }
}

impl std::iter::Sum for Km {
    fn sum<I: Iterator<Item = Km>>(iter: I) -> Km {
        Km(iter.map(|k| k.0).sum())
    }
}

impl fmt::Display for Km {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Serialize for Km {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Km {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Km::from_f64(value).ok_or_else(|| {
            serde::de::Error::custom("distance must have at most two decimal places")
        })
    }
}

impl rusqlite::ToSql for Km {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(rusqlite::types::ToSqlOutput::from(self.0))
    }
}

impl rusqlite::types::FromSql for Km {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        i64::column_result(value).map(Km)
    }
}
