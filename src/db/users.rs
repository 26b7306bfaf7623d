use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::User;

use super::connection::new_document_id;

/// Look up a local profile by display name (case-insensitive), creating it on
/// first sign-in so the same name always maps to the same user id.
pub fn find_or_create_user(conn: &Connection, display_name: &str) -> Result<User> {
    let existing = conn
        .query_row(
            "SELECT id, display_name FROM users WHERE display_name = ?1",
            [display_name],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    display_name: row.get(1)?,
                })
            },
        )
        .optional()
        .context("failed to look up profile")?;

    if let Some(user) = existing {
        return Ok(user);
    }

    let user = User {
        id: new_document_id(),
        display_name: display_name.to_string(),
    };
    conn.execute(
        "INSERT INTO users (id, display_name, created_at) VALUES (?1, ?2, ?3)",
        params![user.id, user.display_name, Utc::now()],
    )
    .context("failed to create profile")?;

    Ok(user)
}
