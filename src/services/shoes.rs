// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shoe CRUD. Mileage is read-only here; see [`crate::services::ledger`].

use crate::db::{shoes, Db};
use crate::error::{AppError, Result};
use crate::models::{NewShoe, Shoe, ShoeChanges};
use crate::services::require_account;

const MAX_LABEL_CHARS: usize = 100;

fn clean_label(field: &'static str, raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_LABEL_CHARS {
        return Err(AppError::malformed_input(
            field,
            format!("{} must be 1 to {} characters", field, MAX_LABEL_CHARS),
        ));
    }
    Ok(trimmed.to_string())
}

#[derive(Clone)]
pub struct ShoeService {
    db: Db,
}

impl ShoeService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<Shoe>> {
        let user_id = user_id.to_string();
        self.db
            .read(move |conn| shoes::list_shoes(conn, &user_id))
            .await
    }

    pub async fn create(&self, new_shoe: NewShoe) -> Result<Shoe> {
        let new_shoe = NewShoe {
            brand: clean_label("brand", &new_shoe.brand)?,
            model: clean_label("model", &new_shoe.model)?,
            nickname: new_shoe
                .nickname
                .as_deref()
                .map(|n| clean_label("nickname", n))
                .transpose()?,
            user_id: new_shoe.user_id,
        };

        let shoe = self
            .db
            .write(move |tx| {
                require_account(tx, &new_shoe.user_id)?;
                shoes::insert_shoe(tx, &new_shoe)
            })
            .await?;
        tracing::info!(shoe_id = %shoe.id, "Shoe created");
        Ok(shoe)
    }

    pub async fn update(&self, user_id: &str, shoe_id: &str, changes: ShoeChanges) -> Result<Shoe> {
        let changes = ShoeChanges {
            brand: changes.brand.as_deref().map(|b| clean_label("brand", b)).transpose()?,
            model: changes.model.as_deref().map(|m| clean_label("model", m)).transpose()?,
            nickname: changes
                .nickname
                .map(|n| n.as_deref().map(|n| clean_label("nickname", n)).transpose())
                .transpose()?,
        };
        if changes.is_empty() {
            return Err(AppError::BadRequest("No fields to update".to_string()));
        }

        let (user_id, shoe_id) = (user_id.to_string(), shoe_id.to_string());
        self.db
            .write(move |tx| {
                owned_shoe(tx, &user_id, &shoe_id)?;
                shoes::update_shoe_details(tx, &shoe_id, &changes)?;
                owned_shoe(tx, &user_id, &shoe_id)
            })
            .await
    }

    /// Delete a shoe together with its links. The linked runs stay.
    pub async fn delete(&self, user_id: &str, shoe_id: &str) -> Result<()> {
        let (user_id, shoe_id) = (user_id.to_string(), shoe_id.to_string());
        let id = shoe_id.clone();
        self.db
            .write(move |tx| {
                owned_shoe(tx, &user_id, &shoe_id)?;
                shoes::delete_shoe(tx, &shoe_id)
            })
            .await?;
        tracing::info!(shoe_id = %id, "Shoe deleted");
        Ok(())
    }
}

fn owned_shoe(conn: &rusqlite::Connection, user_id: &str, shoe_id: &str) -> Result<Shoe> {
    match shoes::get_shoe(conn, shoe_id)? {
        Some(shoe) if shoe.user_id == user_id => Ok(shoe),
        _ => Err(AppError::NotFound(format!("Shoe {} not found", shoe_id))),
    }
}
