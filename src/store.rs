//! The list store port and its SQLite adapter. The trait mirrors the handful
//! of document operations the app needs against `lists/{id}` and
//! `lists/{id}/birds/{entry}`; client-side rules such as name validation live
//! in [`crate::services::ListService`], not here.

use std::sync::MutexGuard;

use rusqlite::Connection;

use crate::db::{self, SharedConnection};
use crate::error::{AppError, AppResult};
use crate::models::{BirdList, BirdRecord, ListEntry};

/// Persistence port for lists and their bird entries.
pub trait ListStore: Send + Sync {
    /// Every list created by `user_id`, each with its entries.
    fn lists_owned_by(&self, user_id: &str) -> AppResult<Vec<BirdList>>;

    /// Store a new, empty list owned by `user_id`.
    fn insert_list(&self, user_id: &str, name: &str, description: &str) -> AppResult<BirdList>;

    /// Replace a list's name and description.
    fn update_list(&self, list_id: &str, name: &str, description: &str) -> AppResult<()>;

    /// Deletes the list header only.
    fn delete_list(&self, list_id: &str) -> AppResult<()>;

    /// Snapshot `bird` into the list as a new entry.
    fn insert_entry(&self, list_id: &str, bird: &BirdRecord) -> AppResult<ListEntry>;

    /// Remove one entry; `NotFound` when the list does not hold it.
    fn delete_entry(&self, list_id: &str, entry_id: &str) -> AppResult<()>;
}

/// [`ListStore`] backed by the embedded SQLite database.
pub struct SqliteListStore {
    conn: SharedConnection,
}

impl SqliteListStore {
    /// Wrap a shared connection opened with [`db::open_database`].
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn conn(&self) -> AppResult<MutexGuard<'_, Connection>> {
        lock(&self.conn)
    }
}

/// Take the connection, mapping a poisoned mutex to a storage error.
pub(crate) fn lock(conn: &SharedConnection) -> AppResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| AppError::Storage("database lock poisoned".to_string()))
}

impl ListStore for SqliteListStore {
    fn lists_owned_by(&self, user_id: &str) -> AppResult<Vec<BirdList>> {
        db::fetch_lists_for_user(&*self.conn()?, user_id).map_err(AppError::from_storage)
    }

    fn insert_list(&self, user_id: &str, name: &str, description: &str) -> AppResult<BirdList> {
        db::create_list(&*self.conn()?, user_id, name, description).map_err(AppError::from_storage)
    }

    fn update_list(&self, list_id: &str, name: &str, description: &str) -> AppResult<()> {
        db::update_list(&*self.conn()?, list_id, name, description).map_err(AppError::from_storage)
    }

    fn delete_list(&self, list_id: &str) -> AppResult<()> {
        db::delete_list(&*self.conn()?, list_id).map_err(AppError::from_storage)
    }

    fn insert_entry(&self, list_id: &str, bird: &BirdRecord) -> AppResult<ListEntry> {
        db::add_entry(&*self.conn()?, list_id, bird).map_err(AppError::from_storage)
    }

    fn delete_entry(&self, list_id: &str, entry_id: &str) -> AppResult<()> {
        db::remove_entry(&*self.conn()?, list_id, entry_id).map_err(AppError::from_storage)
    }
}
