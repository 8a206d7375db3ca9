// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shoe rows, the mileage counter primitive, and run links.
//!
//! The counter is only ever changed by [`add_mileage`], a single
//! `UPDATE ... SET total_mileage = total_mileage + ?` statement.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{from_millis, to_millis};
use crate::error::{AppError, Result};
use crate::models::{new_id, Km, NewShoe, Shoe, ShoeChanges, ShoeMileage};

const SHOE_COLUMNS: &str =
    "id, user_id, brand, model, nickname, total_mileage, created_at, updated_at";

fn shoe_from_row(row: &Row<'_>) -> rusqlite::Result<Shoe> {
    Ok(Shoe {
        id: row.get(0)?,
        user_id: row.get(1)?,
        brand: row.get(2)?,
        model: row.get(3)?,
        nickname: row.get(4)?,
        total_mileage: row.get(5)?,
        created_at: from_millis(row.get(6)?)?,
        updated_at: from_millis(row.get(7)?)?,
    })
}

fn link_from_row(row: &Row<'_>) -> rusqlite::Result<ShoeMileage> {
    Ok(ShoeMileage {
        id: row.get(0)?,
        shoe_id: row.get(1)?,
        run_id: row.get(2)?,
        created_at: from_millis(row.get(3)?)?,
    })
}

// ─── Shoe Operations ─────────────────────────────────────────

pub fn insert_shoe(conn: &Connection, new_shoe: &NewShoe) -> Result<Shoe> {
    let now = from_millis(to_millis(Utc::now()))?;
    let shoe = Shoe {
        id: new_id(),
        user_id: new_shoe.user_id.clone(),
        brand: new_shoe.brand.clone(),
        model: new_shoe.model.clone(),
        nickname: new_shoe.nickname.clone(),
        total_mileage: Km::ZERO,
        created_at: now,
        updated_at: now,
    };
    conn.execute(
        "INSERT INTO shoes (id, user_id, brand, model, nickname, total_mileage, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?6)",
        params![
            shoe.id,
            shoe.user_id,
            shoe.brand,
            shoe.model,
            shoe.nickname,
            to_millis(now),
        ],
    )?;
    Ok(shoe)
}

pub fn get_shoe(conn: &Connection, id: &str) -> Result<Option<Shoe>> {
    Ok(conn
        .query_row(
            &format!("SELECT {SHOE_COLUMNS} FROM shoes WHERE id = ?1"),
            [id],
            shoe_from_row,
        )
        .optional()?)
}

/// All shoes of a user, oldest first.
pub fn list_shoes(conn: &Connection, user_id: &str) -> Result<Vec<Shoe>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {SHOE_COLUMNS} FROM shoes WHERE user_id = ?1 ORDER BY created_at, id"
    ))?;
    let rows = stmt.query_map([user_id], shoe_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Update descriptive fields only; the counter is left alone.
pub fn update_shoe_details(conn: &Connection, id: &str, changes: &ShoeChanges) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE shoes SET
            brand = COALESCE(?1, brand),
            model = COALESCE(?2, model),
            nickname = CASE WHEN ?3 THEN ?4 ELSE nickname END,
            updated_at = ?5
         WHERE id = ?6",
        params![
            changes.brand,
            changes.model,
            changes.nickname.is_some(),
            changes.nickname.clone().flatten(),
            to_millis(Utc::now()),
            id,
        ],
    )?;
    Ok(updated > 0)
}

/// Delete a shoe; its links go with it.
pub fn delete_shoe(conn: &Connection, id: &str) -> Result<bool> {
    Ok(conn.execute("DELETE FROM shoes WHERE id = ?1", [id])? > 0)
}

/// Atomically add `delta` (possibly negative) to a shoe's counter.
pub fn add_mileage(conn: &Connection, shoe_id: &str, delta: Km) -> Result<()> {
    let updated = conn.execute(
        "UPDATE shoes SET total_mileage = total_mileage + ?1, updated_at = ?2 WHERE id = ?3",
        params![delta, to_millis(Utc::now()), shoe_id],
    )?;
    if updated == 0 {
        return Err(AppError::NotFound(format!("Shoe {} not found", shoe_id)));
    }
    Ok(())
}

// ─── Link Operations ─────────────────────────────────────────

pub fn get_link(conn: &Connection, id: &str) -> Result<Option<ShoeMileage>> {
    Ok(conn
        .query_row(
            "SELECT id, shoe_id, run_id, created_at FROM shoe_mileages WHERE id = ?1",
            [id],
            link_from_row,
        )
        .optional()?)
}

/// The link for a run, if it is linked to any shoe.
pub fn get_link_for_run(conn: &Connection, run_id: &str) -> Result<Option<ShoeMileage>> {
    Ok(conn
        .query_row(
            "SELECT id, shoe_id, run_id, created_at FROM shoe_mileages WHERE run_id = ?1",
            [run_id],
            link_from_row,
        )
        .optional()?)
}

pub fn insert_link(conn: &Connection, shoe_id: &str, run_id: &str) -> Result<ShoeMileage> {
    let link = ShoeMileage {
        id: new_id(),
        shoe_id: shoe_id.to_string(),
        run_id: run_id.to_string(),
        created_at: from_millis(to_millis(Utc::now()))?,
    };
    conn.execute(
        "INSERT INTO shoe_mileages (id, shoe_id, run_id, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![link.id, link.shoe_id, link.run_id, to_millis(link.created_at)],
    )?;
    Ok(link)
}

/// Point an existing link at another shoe.
pub fn repoint_link(conn: &Connection, link_id: &str, shoe_id: &str) -> Result<()> {
    conn.execute(
        "UPDATE shoe_mileages SET shoe_id = ?1 WHERE id = ?2",
        params![shoe_id, link_id],
    )?;
    Ok(())
}

pub fn delete_link(conn: &Connection, id: &str) -> Result<bool> {
    Ok(conn.execute("DELETE FROM shoe_mileages WHERE id = ?1", [id])? > 0)
}

// ─── Consistency Audit ───────────────────────────────────────

/// A shoe whose counter disagrees with the runs linked to it.
#[derive(Debug, Clone, PartialEq)]
pub struct MileageDrift {
    pub shoe_id: String,
    pub recorded: Km,
    pub linked: Km,
}

/// Shoes of `user_id` whose counter differs from the summed distance of
/// their linked runs. Empty when the ledger invariant holds.
pub fn find_mileage_drift(conn: &Connection, user_id: &str) -> Result<Vec<MileageDrift>> {
    let mut stmt = conn.prepare_cached(
        "SELECT s.id, s.total_mileage, COALESCE(SUM(r.distance), 0) AS linked
         FROM shoes s
         LEFT JOIN shoe_mileages m ON m.shoe_id = s.id
         LEFT JOIN runs r ON r.id = m.run_id
         WHERE s.user_id = ?1
         GROUP BY s.id
         HAVING s.total_mileage <> linked",
    )?;
    let rows = stmt.query_map([user_id], |row| {
        Ok(MileageDrift {
            shoe_id: row.get(0)?,
            recorded: row.get(1)?,
            linked: row.get(2)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{users, Db};

    #[tokio::test]
    async fn test_add_mileage_is_relative() {
        let db = Db::open_in_memory().unwrap();
        let shoe = db
            .write(|tx| {
                let user = users::insert_user(tx, "a@example.com", "a")?;
                let shoe = insert_shoe(
                    tx,
                    &NewShoe {
                        user_id: user.id,
                        brand: "Asics".to_string(),
                        model: "Novablast 5".to_string(),
                        nickname: None,
                    },
                )?;
                add_mileage(tx, &shoe.id, Km::from_hundredths(1000))?;
                add_mileage(tx, &shoe.id, Km::from_hundredths(-250))?;
                get_shoe(tx, &shoe.id)
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(shoe.total_mileage, Km::from_hundredths(750));
    }

    #[tokio::test]
    async fn test_add_mileage_unknown_shoe() {
        let db = Db::open_in_memory().unwrap();
        let err = db
            .write(|tx| add_mileage(tx, "missing", Km::from_hundredths(100)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_details_keeps_unset_fields() {
        let db = Db::open_in_memory().unwrap();
        let shoe = db
            .write(|tx| {
                let user = users::insert_user(tx, "b@example.com", "b")?;
                let shoe = insert_shoe(
                    tx,
                    &NewShoe {
                        user_id: user.id,
                        brand: "Nike".to_string(),
                        model: "Pegasus".to_string(),
                        nickname: Some("daily".to_string()),
                    },
                )?;
                update_shoe_details(
                    tx,
                    &shoe.id,
                    &ShoeChanges {
                        model: Some("Pegasus 41".to_string()),
                        ..Default::default()
                    },
                )?;
                get_shoe(tx, &shoe.id)
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(shoe.brand, "Nike");
        assert_eq!(shoe.model, "Pegasus 41");
        assert_eq!(shoe.nickname.as_deref(), Some("daily"));
    }
}
