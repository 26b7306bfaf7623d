//! Core library surface for the Aviary bird-list TUI.
//!
//! The ports (`store`, `directory`, `identity`) are plain traits so the
//! binary wires in SQLite and the Nuthatch HTTP client while tests substitute
//! their own. `views` and `worker` keep the Lists and Search screens in step
//! after mutations.
pub mod config;
pub mod context;
pub mod db;
pub mod directory;
pub mod error;
pub mod events;
pub mod identity;
pub mod logging;
pub mod models;
pub mod services;
pub mod store;
pub mod ui;
pub mod views;
pub mod worker;

pub use config::Config;
pub use context::{AppContext, Session};
pub use error::{AppError, AppResult};

/// The primary domain types that other layers manipulate.
pub use models::{BirdList, BirdRecord, ListEntry, SearchPage, SearchQuery, User};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
