//! Persistence module split across logical submodules.

mod connection;
mod entries;
mod lists;
mod users;

pub use connection::{ensure_schema, open_database, open_in_memory, share, SharedConnection};
pub use entries::{add_entry, fetch_entries_for_list, remove_entry};
pub use lists::{create_list, delete_list, fetch_lists_for_user, list_exists, update_list};
pub use users::find_or_create_user;
