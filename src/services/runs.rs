// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run create/update/delete, keeping shoe mileage in step.

use crate::db::{runs, Db};
use crate::error::{AppError, Result};
use crate::models::distance::{MAX_RUN_DISTANCE, MIN_RUN_DISTANCE};
use crate::models::run::is_valid_note;
use crate::models::{Km, NewRun, Run, RunChanges};
use crate::services::ledger::{self, RunDeletion};
use crate::services::require_account;
use crate::services::stats::{MAX_YEAR, MIN_YEAR};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

fn validate_distance(distance: Km) -> Result<()> {
    if distance.is_valid_run_distance() {
        Ok(())
    } else {
        Err(AppError::malformed_input(
            "distance",
            format!(
                "distance must be between {} and {} km",
                MIN_RUN_DISTANCE, MAX_RUN_DISTANCE
            ),
        ))
    }
}

/// Runs must stay inside the years the stats reports accept, in every zone.
/// A day of slack on each side covers the widest UTC offsets.
fn validate_run_at(run_at: DateTime<Utc>) -> Result<()> {
    let midnight = |y, m, d| {
        NaiveDate::from_ymd_opt(y, m, d).map(|d| Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN)))
    };
    let (earliest, latest) = (midnight(MIN_YEAR, 1, 2), midnight(MAX_YEAR, 12, 31));
    match (earliest, latest) {
        (Some(earliest), Some(latest)) if run_at >= earliest && run_at < latest => Ok(()),
        _ => Err(AppError::malformed_input(
            "runAt",
            format!("runAt must fall between {} and {}", MIN_YEAR, MAX_YEAR),
        )),
    }
}

fn validate_duration(duration_sec: i64) -> Result<()> {
    if duration_sec >= 0 {
        Ok(())
    } else {
        Err(AppError::malformed_input("duration", "duration must not be negative"))
    }
}

fn validate_note(note: Option<&str>) -> Result<()> {
    match note {
        Some(note) if !is_valid_note(note) => Err(AppError::malformed_input(
            "note",
            "note must be 1 to 500 characters",
        )),
        _ => Ok(()),
    }
}

#[derive(Clone)]
pub struct RunService {
    db: Db,
}

impl RunService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create(&self, new_run: NewRun) -> Result<Run> {
        validate_run_at(new_run.run_at)?;
        validate_distance(new_run.distance)?;
        validate_duration(new_run.duration_sec)?;
        validate_note(new_run.note.as_deref())?;

        let run = self
            .db
            .write(move |tx| {
                require_account(tx, &new_run.user_id)?;
                runs::insert_run(tx, &new_run)
            })
            .await?;
        tracing::info!(run_id = %run.id, distance = %run.distance, "Run created");
        Ok(run)
    }

    /// A run of `user_id`; other users' runs are reported as not found.
    pub async fn get(&self, user_id: &str, run_id: &str) -> Result<Run> {
        let (user_id, run_id) = (user_id.to_string(), run_id.to_string());
        self.db
            .read(move |conn| owned_run(conn, &user_id, &run_id))
            .await
    }

    /// Apply `changes` to one of `user_id`'s runs.
    ///
    /// A distance change moves the linked shoe's counter by the difference
    /// in the same transaction.
    pub async fn update(&self, user_id: &str, run_id: &str, changes: RunChanges) -> Result<Run> {
        if changes.is_empty() {
            return Err(AppError::BadRequest("No fields to update".to_string()));
        }
        if let Some(run_at) = changes.run_at {
            validate_run_at(run_at)?;
        }
        if let Some(distance) = changes.distance {
            validate_distance(distance)?;
        }
        if let Some(duration_sec) = changes.duration_sec {
            validate_duration(duration_sec)?;
        }
        if let Some(note) = &changes.note {
            validate_note(note.as_deref())?;
        }

        let (user_id, run_id) = (user_id.to_string(), run_id.to_string());
        let (run, delta, shoe_id) = self
            .db
            .write(move |tx| {
                let current = owned_run(tx, &user_id, &run_id)?;
                let updated = runs::update_run(tx, &changes.apply_to(&current))?;
                let shoe_id = ledger::adjust_on_run_distance_change(
                    tx,
                    &updated.id,
                    current.distance,
                    updated.distance,
                )?;
                Ok((updated.clone(), updated.distance - current.distance, shoe_id))
            })
            .await?;

        match shoe_id {
            Some(shoe_id) => tracing::info!(
                run_id = %run.id,
                shoe_id = %shoe_id,
                delta = %delta,
                "Run updated, shoe mileage adjusted"
            ),
            None => tracing::info!(run_id = %run.id, "Run updated"),
        }
        Ok(run)
    }

    /// Delete one of `user_id`'s runs, taking its distance off any linked shoe.
    pub async fn delete(&self, user_id: &str, run_id: &str) -> Result<RunDeletion> {
        let (user_id, run_id) = (user_id.to_string(), run_id.to_string());
        let deletion = self
            .db
            .write(move |tx| {
                owned_run(tx, &user_id, &run_id)?;
                ledger::adjust_on_run_delete(tx, &run_id)
            })
            .await?;

        tracing::info!(
            run_id = %deletion.run_id,
            shoe_id = deletion.shoe.as_ref().map(|s| s.id.as_str()),
            "Run deleted"
        );
        Ok(deletion)
    }
}

fn owned_run(conn: &rusqlite::Connection, user_id: &str, run_id: &str) -> Result<Run> {
    match runs::get_run(conn, run_id)? {
        Some(run) if run.user_id == user_id => Ok(run),
        _ => Err(AppError::NotFound(format!("Run {} not found", run_id))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{shoes, users};
    use crate::models::NewShoe;

    struct Seeded {
        user: String,
        shoe: String,
        run: Run,
    }

    async fn seed_linked(db: &Db) -> Seeded {
        let service = RunService::new(db.clone());
        let (user, shoe) = db
            .write(|tx| {
                let user = users::insert_user(tx, "runs@example.com", "runs")?;
                let shoe = shoes::insert_shoe(
                    tx,
                    &NewShoe {
                        user_id: user.id.clone(),
                        brand: "Adidas".to_string(),
                        model: "Adizero SL".to_string(),
                        nickname: None,
                    },
                )?;
                Ok((user.id, shoe.id))
            })
            .await
            .unwrap();

        let run = service
            .create(NewRun {
                user_id: user.clone(),
                run_at: Utc.with_ymd_and_hms(2025, 7, 14, 6, 0, 0).unwrap(),
                distance: Km::from_hundredths(1000),
                duration_sec: 3000,
                note: Some("tempo".to_string()),
            })
            .await
            .unwrap();

        let (shoe_id, run_id) = (shoe.clone(), run.id.clone());
        db.write(move |tx| ledger::link(tx, &shoe_id, &run_id))
            .await
            .unwrap();

        Seeded { user, shoe, run }
    }

    async fn shoe_mileage(db: &Db, shoe_id: &str) -> Km {
        let shoe_id = shoe_id.to_string();
        db.read(move |conn| Ok(shoes::get_shoe(conn, &shoe_id)?.map(|s| s.total_mileage)))
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_validates_input() {
        let db = Db::open_in_memory().unwrap();
        let service = RunService::new(db);
        let base = NewRun {
            user_id: "u".to_string(),
            run_at: Utc::now(),
            distance: Km::ZERO,
            duration_sec: 60,
            note: None,
        };

        let err = service.create(base.clone()).await.unwrap_err();
        assert!(matches!(err, AppError::MalformedInput { ref field, .. } if field == "distance"));

        let err = service
            .create(NewRun {
                distance: Km::from_hundredths(100),
                note: Some(String::new()),
                ..base.clone()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedInput { ref field, .. } if field == "note"));

        let err = service
            .create(NewRun {
                distance: Km::from_hundredths(100),
                ..base.clone()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        for run_at in [
            Utc.with_ymd_and_hms(1969, 12, 31, 23, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(9999, 12, 31, 12, 0, 0).unwrap(),
        ] {
            let err = service
                .create(NewRun {
                    run_at,
                    distance: Km::from_hundredths(100),
                    ..base.clone()
                })
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::MalformedInput { ref field, .. } if field == "runAt"));
        }
    }

    #[tokio::test]
    async fn test_distance_update_moves_shoe_mileage() {
        let db = Db::open_in_memory().unwrap();
        let seeded = seed_linked(&db).await;
        let service = RunService::new(db.clone());

        let run = service
            .update(
                &seeded.user,
                &seeded.run.id,
                RunChanges {
                    distance: Some(Km::from_hundredths(1210)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(run.distance, Km::from_hundredths(1210));
        assert_eq!(run.note.as_deref(), Some("tempo"));
        assert_eq!(shoe_mileage(&db, &seeded.shoe).await, Km::from_hundredths(1210));
    }

    #[tokio::test]
    async fn test_duration_update_leaves_mileage() {
        let db = Db::open_in_memory().unwrap();
        let seeded = seed_linked(&db).await;
        let service = RunService::new(db.clone());

        service
            .update(
                &seeded.user,
                &seeded.run.id,
                RunChanges {
                    duration_sec: Some(2800),
                    note: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(shoe_mileage(&db, &seeded.shoe).await, Km::from_hundredths(1000));

        let run = service.get(&seeded.user, &seeded.run.id).await.unwrap();
        assert_eq!(run.duration_sec, 2800);
        assert!(run.note.is_none());
    }

    #[tokio::test]
    async fn test_other_users_runs_are_hidden() {
        let db = Db::open_in_memory().unwrap();
        let seeded = seed_linked(&db).await;
        let service = RunService::new(db.clone());

        let err = service
            .update(
                "intruder",
                &seeded.run.id,
                RunChanges {
                    distance: Some(Km::from_hundredths(100)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = service.delete("intruder", &seeded.run.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(shoe_mileage(&db, &seeded.shoe).await, Km::from_hundredths(1000));
    }

    #[tokio::test]
    async fn test_delete_decrements_linked_shoe() {
        let db = Db::open_in_memory().unwrap();
        let seeded = seed_linked(&db).await;
        let service = RunService::new(db.clone());

        let deletion = service.delete(&seeded.user, &seeded.run.id).await.unwrap();
        assert_eq!(deletion.shoe.map(|s| s.total_mileage), Some(Km::ZERO));

        let err = service.get(&seeded.user, &seeded.run.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_update_is_rejected() {
        let db = Db::open_in_memory().unwrap();
        let err = RunService::new(db)
            .update("u", "r", RunChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
