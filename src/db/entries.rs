use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::error::AppError;
use crate::models::{BirdRecord, ListEntry};

use super::connection::new_document_id;
use super::lists::list_exists;

/// Entries stored under `list_id`, in the order they were added.
pub fn fetch_entries_for_list(conn: &Connection, list_id: &str) -> Result<Vec<ListEntry>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, bird, added_at
             FROM list_birds
             WHERE list_id = ?1
             ORDER BY seq",
        )
        .context("failed to prepare list entries query")?;

    let rows = stmt
        .query_map([list_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, DateTime<Utc>>(2)?,
            ))
        })
        .context("failed to iterate list entries")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect list entries")?;

    rows.into_iter()
        .map(|(id, bird, added_at)| -> Result<ListEntry> {
            let bird: BirdRecord = serde_json::from_str(&bird)
                .with_context(|| format!("entry {id} holds an unreadable bird snapshot"))?;
            Ok(ListEntry { id, bird, added_at })
        })
        .collect()
}

/// Store a snapshot of `bird` under the list. Adding the same bird twice
/// yields two entries.
pub fn add_entry(conn: &Connection, list_id: &str, bird: &BirdRecord) -> Result<ListEntry> {
    if !list_exists(conn, list_id)? {
        return Err(AppError::NotFound(format!("list {list_id}")).into());
    }

    let entry = ListEntry {
        id: new_document_id(),
        bird: bird.clone(),
        added_at: Utc::now(),
    };
    let snapshot = serde_json::to_string(&entry.bird).context("failed to encode bird snapshot")?;

    conn.execute(
        "INSERT INTO list_birds (id, list_id, bird, added_at) VALUES (?1, ?2, ?3, ?4)",
        params![entry.id, list_id, snapshot, entry.added_at],
    )
    .context("failed to add bird to list")?;

    Ok(entry)
}

pub fn remove_entry(conn: &Connection, list_id: &str, entry_id: &str) -> Result<()> {
    let deleted = conn
        .execute(
            "DELETE FROM list_birds WHERE list_id = ?1 AND id = ?2",
            params![list_id, entry_id],
        )
        .context("failed to remove bird from list")?;

    if deleted == 0 {
        Err(AppError::NotFound(format!("entry {entry_id} in list {list_id}")).into())
    } else {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn count_entries_for_list(conn: &Connection, list_id: &str) -> Result<usize> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM list_birds WHERE list_id = ?1",
            [list_id],
            |row| row.get(0),
        )
        .context("failed to count list entries")?;
    Ok(usize::try_from(count).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::open_in_memory;
    use crate::db::lists::create_list;

    fn jay() -> BirdRecord {
        BirdRecord {
            name: "Blue Jay".into(),
            status: "Low Concern".into(),
            images: vec!["https://img.example/jay.jpg".into()],
            ..BirdRecord::default()
        }
    }

    #[test]
    fn entries_keep_snapshot_and_order() {
        let conn = open_in_memory().unwrap();
        let list = create_list(&conn, "alice", "Backyard", "").unwrap();
        let first = add_entry(&conn, &list.id, &jay()).unwrap();
        let robin = BirdRecord {
            name: "American Robin".into(),
            ..BirdRecord::default()
        };
        let second = add_entry(&conn, &list.id, &robin).unwrap();

        let entries = fetch_entries_for_list(&conn, &list.id).unwrap();
        let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, [first.id.as_str(), second.id.as_str()]);
        assert_eq!(entries[0].bird, jay());
    }

    #[test]
    fn adding_to_missing_list_is_rejected() {
        let conn = open_in_memory().unwrap();
        let err = add_entry(&conn, "ghost", &jay()).unwrap_err();
        assert!(matches!(AppError::from_storage(err), AppError::NotFound(_)));
    }

    #[test]
    fn removing_checks_the_owning_list() {
        let conn = open_in_memory().unwrap();
        let home = create_list(&conn, "alice", "Home", "").unwrap();
        let away = create_list(&conn, "alice", "Away", "").unwrap();
        let entry = add_entry(&conn, &home.id, &jay()).unwrap();

        assert!(remove_entry(&conn, &away.id, &entry.id).is_err());
        remove_entry(&conn, &home.id, &entry.id).unwrap();
        assert_eq!(count_entries_for_list(&conn, &home.id).unwrap(), 0);
    }
}
