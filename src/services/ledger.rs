// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Mileage ledger: the only code that changes `shoes.total_mileage`.
//!
//! Invariant: every shoe's counter equals the summed distance of the runs
//! linked to it. Each operation below takes a connection that is already
//! inside a write transaction, so run updates and deletes can adjust the
//! ledger in the same transaction as their own writes. Counter changes are
//! always relative (`add_mileage`), never a value computed from a read.

use crate::db::{runs, shoes, Db};
use crate::error::{AppError, Result};
use crate::models::{Km, Run, Shoe, ShoeMileage};
use rusqlite::Connection;

/// Result of linking a run to a shoe.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkOutcome {
    /// The target shoe after the counter change
    pub shoe: Shoe,
    pub mileage: ShoeMileage,
    /// The run was previously linked to a different shoe
    pub moved: bool,
}

/// Result of removing a link.
#[derive(Debug, Clone, PartialEq)]
pub struct UnlinkOutcome {
    pub shoe: Shoe,
    pub removed_id: String,
}

/// Result of deleting a run through the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct RunDeletion {
    pub run_id: String,
    /// Shoe the run was linked to, after its counter was decremented
    pub shoe: Option<Shoe>,
}

fn require_shoe(conn: &Connection, shoe_id: &str) -> Result<Shoe> {
    shoes::get_shoe(conn, shoe_id)?
        .ok_or_else(|| AppError::NotFound(format!("Shoe {} not found", shoe_id)))
}

fn require_run(conn: &Connection, run_id: &str) -> Result<Run> {
    runs::get_run(conn, run_id)?
        .ok_or_else(|| AppError::NotFound(format!("Run {} not found", run_id)))
}

/// Link `run_id` to `shoe_id`, moving it off any other shoe.
pub fn link(conn: &Connection, shoe_id: &str, run_id: &str) -> Result<LinkOutcome> {
    let shoe = require_shoe(conn, shoe_id)?;
    let run = require_run(conn, run_id)?;

    if shoe.user_id != run.user_id {
        return Err(AppError::OwnershipViolation(
            "Run and shoe must belong to the same user".to_string(),
        ));
    }

    match shoes::get_link_for_run(conn, &run.id)? {
        Some(existing) if existing.shoe_id == shoe.id => Ok(LinkOutcome {
            shoe,
            mileage: existing,
            moved: false,
        }),
        Some(mut existing) => {
            shoes::add_mileage(conn, &existing.shoe_id, -run.distance)?;
            shoes::repoint_link(conn, &existing.id, &shoe.id)?;
            shoes::add_mileage(conn, &shoe.id, run.distance)?;
            existing.shoe_id = shoe.id.clone();
            Ok(LinkOutcome {
                shoe: require_shoe(conn, &shoe.id)?,
                mileage: existing,
                moved: true,
            })
        }
        None => {
            let mileage = shoes::insert_link(conn, &shoe.id, &run.id)?;
            shoes::add_mileage(conn, &shoe.id, run.distance)?;
            Ok(LinkOutcome {
                shoe: require_shoe(conn, &shoe.id)?,
                mileage,
                moved: false,
            })
        }
    }
}

/// Remove a link and take its run's distance off the shoe.
pub fn unlink(conn: &Connection, link_id: &str) -> Result<UnlinkOutcome> {
    let link = shoes::get_link(conn, link_id)?
        .ok_or_else(|| AppError::NotFound(format!("Shoe mileage {} not found", link_id)))?;
    let run = require_run(conn, &link.run_id)?;

    shoes::delete_link(conn, &link.id)?;
    shoes::add_mileage(conn, &link.shoe_id, -run.distance)?;

    Ok(UnlinkOutcome {
        shoe: require_shoe(conn, &link.shoe_id)?,
        removed_id: link.id,
    })
}

/// Apply a run's distance change to the shoe it is linked to, if any.
///
/// Returns the id of the adjusted shoe.
pub fn adjust_on_run_distance_change(
    conn: &Connection,
    run_id: &str,
    old_distance: Km,
    new_distance: Km,
) -> Result<Option<String>> {
    let delta = new_distance - old_distance;
    if delta.is_zero() {
        return Ok(None);
    }
    match shoes::get_link_for_run(conn, run_id)? {
        Some(link) => {
            shoes::add_mileage(conn, &link.shoe_id, delta)?;
            Ok(Some(link.shoe_id))
        }
        None => Ok(None),
    }
}

/// Delete a run, first taking its distance off the linked shoe.
///
/// Order: decrement counter, delete link, delete run.
pub fn adjust_on_run_delete(conn: &Connection, run_id: &str) -> Result<RunDeletion> {
    let run = require_run(conn, run_id)?;

    let shoe = match shoes::get_link_for_run(conn, &run.id)? {
        Some(link) => {
            shoes::add_mileage(conn, &link.shoe_id, -run.distance)?;
            shoes::delete_link(conn, &link.id)?;
            Some(require_shoe(conn, &link.shoe_id)?)
        }
        None => None,
    };
    runs::delete_run(conn, &run.id)?;

    Ok(RunDeletion {
        run_id: run.id,
        shoe,
    })
}

/// Ledger entry points for request handlers, scoped to the acting user.
///
/// Shoes and links of other users are reported as not found.
#[derive(Clone)]
pub struct MileageLedger {
    db: Db,
}

impl MileageLedger {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Link a run to one of `user_id`'s shoes.
    pub async fn link(&self, user_id: &str, shoe_id: &str, run_id: &str) -> Result<LinkOutcome> {
        let (user_id, shoe_id, run_id) =
            (user_id.to_string(), shoe_id.to_string(), run_id.to_string());

        let outcome = self
            .db
            .write(move |tx| {
                ensure_shoe_owner(tx, &user_id, &shoe_id)?;
                link(tx, &shoe_id, &run_id)
            })
            .await?;

        tracing::info!(
            shoe_id = %outcome.shoe.id,
            run_id = %outcome.mileage.run_id,
            mileage_id = %outcome.mileage.id,
            moved = outcome.moved,
            total_mileage = %outcome.shoe.total_mileage,
            "Run linked to shoe"
        );
        Ok(outcome)
    }

    /// Remove one of `user_id`'s links.
    pub async fn unlink(&self, user_id: &str, link_id: &str) -> Result<UnlinkOutcome> {
        let (user_id, link_id) = (user_id.to_string(), link_id.to_string());

        let outcome = self
            .db
            .write(move |tx| {
                let link = shoes::get_link(tx, &link_id)?.ok_or_else(|| {
                    AppError::NotFound(format!("Shoe mileage {} not found", link_id))
                })?;
                ensure_shoe_owner(tx, &user_id, &link.shoe_id)?;
                unlink(tx, &link_id)
            })
            .await?;

        tracing::info!(
            shoe_id = %outcome.shoe.id,
            mileage_id = %outcome.removed_id,
            total_mileage = %outcome.shoe.total_mileage,
            "Run unlinked from shoe"
        );
        Ok(outcome)
    }
}

fn ensure_shoe_owner(conn: &Connection, user_id: &str, shoe_id: &str) -> Result<Shoe> {
    match shoes::get_shoe(conn, shoe_id)? {
        Some(shoe) if shoe.user_id == user_id => Ok(shoe),
        _ => Err(AppError::NotFound(format!("Shoe {} not found", shoe_id))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::users;
    use crate::models::{NewRun, NewShoe};
    use chrono::{DateTime, Utc};

    struct Fixture {
        user: String,
        shoe_a: String,
        shoe_b: String,
        run: String,
    }

    fn seed(conn: &Connection, distance: i64) -> Result<Fixture> {
        let user = users::insert_user(conn, "runner@example.com", "runner")?;
        let shoe = |model: &str| {
            shoes::insert_shoe(
                conn,
                &NewShoe {
                    user_id: user.id.clone(),
                    brand: "Saucony".to_string(),
                    model: model.to_string(),
                    nickname: None,
                },
            )
        };
        let shoe_a = shoe("Endorphin Speed")?;
        let shoe_b = shoe("Ride")?;
        let run = runs::insert_run(
            conn,
            &NewRun {
                user_id: user.id.clone(),
                run_at: DateTime::parse_from_rfc3339("2025-07-14T06:00:00Z")
                    .unwrap()
                    .with_timezone(&Utc),
                distance: Km::from_hundredths(distance),
                duration_sec: 1800,
                note: None,
            },
        )?;
        Ok(Fixture {
            user: user.id,
            shoe_a: shoe_a.id,
            shoe_b: shoe_b.id,
            run: run.id,
        })
    }

    fn mileage(conn: &Connection, shoe_id: &str) -> Km {
        shoes::get_shoe(conn, shoe_id).unwrap().unwrap().total_mileage
    }

    #[tokio::test]
    async fn test_link_increments_counter() {
        let db = Db::open_in_memory().unwrap();
        db.write(|tx| {
            let f = seed(tx, 1025)?;
            let outcome = link(tx, &f.shoe_a, &f.run)?;
            assert!(!outcome.moved);
            assert_eq!(outcome.shoe.total_mileage, Km::from_hundredths(1025));
            assert_eq!(outcome.mileage.run_id, f.run);
            assert!(shoes::find_mileage_drift(tx, &f.user)?.is_empty());
            Ok(())
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_relink_same_shoe_is_noop() {
        let db = Db::open_in_memory().unwrap();
        db.write(|tx| {
            let f = seed(tx, 500)?;
            let first = link(tx, &f.shoe_a, &f.run)?;
            let second = link(tx, &f.shoe_a, &f.run)?;
            assert!(!second.moved);
            assert_eq!(second.mileage.id, first.mileage.id);
            assert_eq!(mileage(tx, &f.shoe_a), Km::from_hundredths(500));
            Ok(())
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_link_moves_between_shoes() {
        let db = Db::open_in_memory().unwrap();
        db.write(|tx| {
            let f = seed(tx, 800)?;
            let first = link(tx, &f.shoe_a, &f.run)?;
            let moved = link(tx, &f.shoe_b, &f.run)?;

            assert!(moved.moved);
            assert_eq!(moved.mileage.id, first.mileage.id);
            assert_eq!(moved.mileage.shoe_id, f.shoe_b);
            assert_eq!(mileage(tx, &f.shoe_a), Km::ZERO);
            assert_eq!(mileage(tx, &f.shoe_b), Km::from_hundredths(800));

            let links: i64 = tx.query_row(
                "SELECT COUNT(*) FROM shoe_mileages WHERE run_id = ?1",
                [&f.run],
                |row| row.get(0),
            )?;
            assert_eq!(links, 1);
            Ok(())
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_link_rejects_foreign_run() {
        let db = Db::open_in_memory().unwrap();
        let err = db
            .write(|tx| {
                let f = seed(tx, 800)?;
                let other = users::insert_user(tx, "other@example.com", "other")?;
                let foreign_shoe = shoes::insert_shoe(
                    tx,
                    &NewShoe {
                        user_id: other.id,
                        brand: "Hoka".to_string(),
                        model: "Clifton".to_string(),
                        nickname: None,
                    },
                )?;
                link(tx, &foreign_shoe.id, &f.run)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::OwnershipViolation(_)));
    }

    #[tokio::test]
    async fn test_link_missing_entities() {
        let db = Db::open_in_memory().unwrap();
        let err = db
            .write(|tx| {
                let f = seed(tx, 800)?;
                link(tx, &f.shoe_a, "missing-run")
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unlink_twice_fails_without_double_decrement() {
        let db = Db::open_in_memory().unwrap();
        let f = db.write(|tx| seed(tx, 1200)).await.unwrap();
        let shoe_a = f.shoe_a.clone();
        let run = f.run.clone();
        let outcome = db.write(move |tx| link(tx, &shoe_a, &run)).await.unwrap();

        let link_id = outcome.mileage.id.clone();
        let removed = db
            .write(move |tx| unlink(tx, &link_id))
            .await
            .unwrap();
        assert_eq!(removed.removed_id, outcome.mileage.id);
        assert_eq!(removed.shoe.total_mileage, Km::ZERO);

        let link_id = outcome.mileage.id.clone();
        let err = db.write(move |tx| unlink(tx, &link_id)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let shoe_a = f.shoe_a.clone();
        let total = db.read(move |conn| Ok(mileage(conn, &shoe_a))).await.unwrap();
        assert_eq!(total, Km::ZERO);
    }

    #[tokio::test]
    async fn test_distance_change_applies_delta() {
        let db = Db::open_in_memory().unwrap();
        db.write(|tx| {
            let f = seed(tx, 1000)?;
            link(tx, &f.shoe_a, &f.run)?;

            let adjusted = adjust_on_run_distance_change(
                tx,
                &f.run,
                Km::from_hundredths(1000),
                Km::from_hundredths(1250),
            )?;
            assert_eq!(adjusted.as_deref(), Some(f.shoe_a.as_str()));
            assert_eq!(mileage(tx, &f.shoe_a), Km::from_hundredths(1250));

            let unchanged = adjust_on_run_distance_change(
                tx,
                &f.run,
                Km::from_hundredths(1250),
                Km::from_hundredths(1250),
            )?;
            assert!(unchanged.is_none());
            Ok(())
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_distance_change_without_link_is_noop() {
        let db = Db::open_in_memory().unwrap();
        db.write(|tx| {
            let f = seed(tx, 1000)?;
            let adjusted = adjust_on_run_distance_change(
                tx,
                &f.run,
                Km::from_hundredths(1000),
                Km::from_hundredths(2000),
            )?;
            assert!(adjusted.is_none());
            assert_eq!(mileage(tx, &f.shoe_a), Km::ZERO);
            Ok(())
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_run_delete_decrements_and_removes_link() {
        let db = Db::open_in_memory().unwrap();
        db.write(|tx| {
            let f = seed(tx, 640)?;
            let outcome = link(tx, &f.shoe_b, &f.run)?;

            let deletion = adjust_on_run_delete(tx, &f.run)?;
            assert_eq!(deletion.run_id, f.run);
            assert_eq!(deletion.shoe.unwrap().total_mileage, Km::ZERO);
            assert!(shoes::get_link(tx, &outcome.mileage.id)?.is_none());
            assert!(runs::get_run(tx, &f.run)?.is_none());
            Ok(())
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_scoped_link_hides_other_users_shoes() {
        let db = Db::open_in_memory().unwrap();
        let f = db.write(|tx| seed(tx, 500)).await.unwrap();
        let ledger = MileageLedger::new(db.clone());

        let err = ledger
            .link("someone-else", &f.shoe_a, &f.run)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let outcome = ledger.link(&f.user, &f.shoe_a, &f.run).await.unwrap();
        let err = ledger
            .unlink("someone-else", &outcome.mileage.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let removed = ledger.unlink(&f.user, &outcome.mileage.id).await.unwrap();
        assert_eq!(removed.shoe.total_mileage, Km::ZERO);
    }
}
