use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Connection handle shared between the list store and the identity adapter.
/// Worker threads take the lock for the duration of one operation.
pub type SharedConnection = Arc<Mutex<Connection>>;

/// Open (creating if needed) the database at `path` and run the lazy
/// migrations.
pub fn open_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create data directory")?;
    }

    let conn = Connection::open(path)
        .with_context(|| format!("failed to open SQLite database at {}", path.display()))?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Private database used by tests and throwaway sessions.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    ensure_schema(&conn)?;
    Ok(conn)
}

pub fn share(conn: Connection) -> SharedConnection {
    Arc::new(Mutex::new(conn))
}

/// Create the tables mirroring the document hierarchy `lists/{id}` and
/// `lists/{id}/birds/{entry}`. `list_birds.list_id` deliberately carries no
/// foreign key: deleting a list removes only its header row.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            display_name TEXT NOT NULL UNIQUE COLLATE NOCASE,
            created_at TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create users table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS lists (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            created_by TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create lists table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS lists_created_by ON lists (created_by)",
        [],
    )
    .context("failed to index lists by owner")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS list_birds (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            list_id TEXT NOT NULL,
            bird TEXT NOT NULL,
            added_at TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create list_birds table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS list_birds_list_id ON list_birds (list_id)",
        [],
    )
    .context("failed to index list entries")?;

    Ok(())
}

/// Fresh document identifier.
pub(crate) fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_creation_is_idempotent_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("aviary.sqlite");

        let conn = open_database(&path).unwrap();
        ensure_schema(&conn).unwrap();
        drop(conn);

        let conn = open_database(&path).unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master
                 WHERE type = 'table' AND name IN ('users', 'lists', 'list_birds')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 3);
    }
}
