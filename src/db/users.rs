// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User rows. Deleting a user cascades to runs, shoes and their links.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::{from_millis, to_millis};
use crate::error::Result;
use crate::models::{new_id, User};

pub fn insert_user(conn: &Connection, email: &str, nickname: &str) -> Result<User> {
    let user = User {
        id: new_id(),
        email: email.to_string(),
        nickname: nickname.to_string(),
        created_at: from_millis(to_millis(Utc::now()))?,
    };
    conn.execute(
        "INSERT INTO users (id, email, nickname, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![user.id, user.email, user.nickname, to_millis(user.created_at)],
    )?;
    Ok(user)
}

pub fn get_user(conn: &Connection, id: &str) -> Result<Option<User>> {
    Ok(conn
        .query_row(
            "SELECT id, email, nickname, created_at FROM users WHERE id = ?1",
            [id],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    nickname: row.get(2)?,
                    created_at: from_millis(row.get(3)?)?,
                })
            },
        )
        .optional()?)
}

pub fn user_exists(conn: &Connection, id: &str) -> Result<bool> {
    Ok(conn
        .query_row("SELECT 1 FROM users WHERE id = ?1", [id], |_| Ok(()))
        .optional()?
        .is_some())
}

/// Delete a user and, through foreign-key cascades, everything they own.
pub fn delete_user(conn: &Connection, id: &str) -> Result<bool> {
    Ok(conn.execute("DELETE FROM users WHERE id = ?1", [id])? > 0)
}
