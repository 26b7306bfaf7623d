use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::AppError;
use crate::models::BirdList;

use super::connection::new_document_id;
use super::entries::fetch_entries_for_list;

/// Every list owned by `user_id`, oldest first, each hydrated with its
/// entries.
pub fn fetch_lists_for_user(conn: &Connection, user_id: &str) -> Result<Vec<BirdList>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, name, description, created_by, created_at
             FROM lists
             WHERE created_by = ?1
             ORDER BY seq",
        )
        .context("failed to prepare lists query")?;

    let headers = stmt
        .query_map([user_id], |row| {
            Ok(BirdList {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                owner_id: row.get(3)?,
                created_at: row.get::<_, DateTime<Utc>>(4)?,
                entries: Vec::new(),
            })
        })
        .context("failed to load lists")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect lists")?;

    headers
        .into_iter()
        .map(|mut list| -> Result<BirdList> {
            list.entries = fetch_entries_for_list(conn, &list.id)?;
            Ok(list)
        })
        .collect()
}

/// Insert a list header. The caller is responsible for validating the name.
pub fn create_list(
    conn: &Connection,
    user_id: &str,
    name: &str,
    description: &str,
) -> Result<BirdList> {
    let list = BirdList {
        id: new_document_id(),
        name: name.to_string(),
        description: description.to_string(),
        owner_id: user_id.to_string(),
        created_at: Utc::now(),
        entries: Vec::new(),
    };

    conn.execute(
        "INSERT INTO lists (id, name, description, created_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            list.id,
            list.name,
            list.description,
            list.owner_id,
            list.created_at
        ],
    )
    .context("failed to insert list")?;

    Ok(list)
}

pub fn update_list(conn: &Connection, id: &str, name: &str, description: &str) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE lists SET name = ?1, description = ?2 WHERE id = ?3",
            params![name, description, id],
        )
        .context("failed to update list")?;

    if updated == 0 {
        Err(AppError::NotFound(format!("list {id}")).into())
    } else {
        Ok(())
    }
}

/// Remove the list header. Entries stored under the list are left behind.
pub fn delete_list(conn: &Connection, id: &str) -> Result<()> {
    let deleted = conn
        .execute("DELETE FROM lists WHERE id = ?1", params![id])
        .context("failed to delete list")?;

    if deleted == 0 {
        Err(AppError::NotFound(format!("list {id}")).into())
    } else {
        Ok(())
    }
}

pub fn list_exists(conn: &Connection, id: &str) -> Result<bool> {
    let found = conn
        .query_row("SELECT 1 FROM lists WHERE id = ?1", [id], |_| Ok(()))
        .optional()
        .context("failed to look up list")?;
    Ok(found.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::open_in_memory;
    use crate::db::entries::{add_entry, count_entries_for_list};
    use crate::models::BirdRecord;

    #[test]
    fn lists_are_scoped_to_their_owner() {
        let conn = open_in_memory().unwrap();
        create_list(&conn, "alice", "Backyard", "").unwrap();
        create_list(&conn, "bob", "Coast", "gulls mostly").unwrap();
        create_list(&conn, "alice", "Trip", "spring").unwrap();

        let names: Vec<_> = fetch_lists_for_user(&conn, "alice")
            .unwrap()
            .into_iter()
            .map(|list| list.name)
            .collect();
        assert_eq!(names, ["Backyard", "Trip"]);
    }

    #[test]
    fn deleting_a_list_leaves_its_entries_behind() {
        let conn = open_in_memory().unwrap();
        let list = create_list(&conn, "alice", "Backyard", "").unwrap();
        let bird = BirdRecord {
            name: "Blue Jay".into(),
            ..BirdRecord::default()
        };
        add_entry(&conn, &list.id, &bird).unwrap();

        delete_list(&conn, &list.id).unwrap();

        assert!(!list_exists(&conn, &list.id).unwrap());
        assert_eq!(count_entries_for_list(&conn, &list.id).unwrap(), 1);
    }

    #[test]
    fn updating_missing_list_reports_not_found() {
        let conn = open_in_memory().unwrap();
        let err = update_list(&conn, "nope", "Name", "").unwrap_err();
        assert!(matches!(
            AppError::from_storage(err),
            AppError::NotFound(_)
        ));
    }
}
