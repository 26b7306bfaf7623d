//! Client-side rules layered over the [`ListStore`] port: authentication and
//! name checks happen here before any write, and every successful mutation is
//! announced on the [`EventBus`].

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::events::{EventBus, ListEvent};
use crate::models::{BirdList, BirdRecord, User};
use crate::store::ListStore;

#[derive(Clone)]
pub struct ListService {
    store: Arc<dyn ListStore>,
    events: EventBus,
}

/// Trimmed list name, or a validation error when nothing is left.
pub fn validate_list_name(name: &str) -> AppResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        Err(AppError::validation("List name is required."))
    } else {
        Ok(name)
    }
}

fn require_user(user: Option<&User>) -> AppResult<&User> {
    user.ok_or(AppError::NotAuthenticated)
}

/// Log a failed mutation once and hand the error back.
fn logged<T>(action: &str, result: AppResult<T>) -> AppResult<T> {
    if let Err(err) = &result {
        warn!(action, error = %err, "list store call failed");
    }
    result
}

impl ListService {
    pub fn new(store: Arc<dyn ListStore>, events: EventBus) -> Self {
        Self { store, events }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn list_owned_lists(&self, user: Option<&User>) -> AppResult<Vec<BirdList>> {
        let user = require_user(user)?;
        logged("list_owned_lists", self.store.lists_owned_by(&user.id))
    }

    /// Returns the new list id.
    pub fn create_list(
        &self,
        user: Option<&User>,
        name: &str,
        description: &str,
    ) -> AppResult<String> {
        let user = require_user(user)?;
        let name = validate_list_name(name)?;
        let list = logged(
            "create_list",
            self.store.insert_list(&user.id, name, description.trim()),
        )?;
        info!(list_id = %list.id, owner = %user.id, "list created");
        self.events.publish(ListEvent::Created {
            list_id: list.id.clone(),
        });
        Ok(list.id)
    }

    pub fn rename_list(&self, list_id: &str, name: &str, description: &str) -> AppResult<()> {
        let name = validate_list_name(name)?;
        logged(
            "rename_list",
            self.store.update_list(list_id, name, description.trim()),
        )?;
        info!(list_id, "list updated");
        self.events.publish(ListEvent::Updated {
            list_id: list_id.to_string(),
        });
        Ok(())
    }

    pub fn delete_list(&self, list_id: &str) -> AppResult<()> {
        logged("delete_list", self.store.delete_list(list_id))?;
        info!(list_id, "list deleted");
        self.events.publish(ListEvent::Deleted {
            list_id: list_id.to_string(),
        });
        Ok(())
    }

    /// Snapshot `bird` into the list. Returns the new entry id.
    pub fn add_bird_to_list(&self, list_id: &str, bird: &BirdRecord) -> AppResult<String> {
        let entry = logged("add_bird_to_list", self.store.insert_entry(list_id, bird))?;
        info!(list_id, entry_id = %entry.id, bird = %bird.name, "bird added to list");
        self.events.publish(ListEvent::EntryAdded {
            list_id: list_id.to_string(),
            entry_id: entry.id.clone(),
        });
        Ok(entry.id)
    }

    pub fn remove_bird_from_list(&self, list_id: &str, entry_id: &str) -> AppResult<()> {
        logged(
            "remove_bird_from_list",
            self.store.delete_entry(list_id, entry_id),
        )?;
        info!(list_id, entry_id, "bird removed from list");
        self.events.publish(ListEvent::EntryRemoved {
            list_id: list_id.to_string(),
            entry_id: entry_id.to_string(),
        });
        Ok(())
    }

    /// Create a list and put `bird` in it straight away. Returns
    /// `(list_id, entry_id)`. If the add fails the new list stays behind,
    /// empty.
    pub fn create_list_and_add_bird(
        &self,
        user: Option<&User>,
        name: &str,
        description: &str,
        bird: &BirdRecord,
    ) -> AppResult<(String, String)> {
        let list_id = self.create_list(user, name, description)?;
        let entry_id = self.add_bird_to_list(&list_id, bird)?;
        Ok((list_id, entry_id))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::broadcast::Receiver;

    use super::*;
    use crate::db;
    use crate::store::SqliteListStore;

    /// Counts writes that reach the store.
    struct CountingStore {
        inner: SqliteListStore,
        writes: AtomicUsize,
    }

    impl CountingStore {
        fn new() -> Self {
            Self {
                inner: SqliteListStore::new(db::share(db::open_in_memory().unwrap())),
                writes: AtomicUsize::new(0),
            }
        }

        fn bump(&self) {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl ListStore for CountingStore {
        fn lists_owned_by(&self, user_id: &str) -> AppResult<Vec<BirdList>> {
            self.inner.lists_owned_by(user_id)
        }

        fn insert_list(&self, user_id: &str, name: &str, description: &str) -> AppResult<BirdList> {
            self.bump();
            self.inner.insert_list(user_id, name, description)
        }

        fn update_list(&self, list_id: &str, name: &str, description: &str) -> AppResult<()> {
            self.bump();
            self.inner.update_list(list_id, name, description)
        }

        fn delete_list(&self, list_id: &str) -> AppResult<()> {
            self.bump();
            self.inner.delete_list(list_id)
        }

        fn insert_entry(&self, list_id: &str, bird: &BirdRecord) -> AppResult<crate::models::ListEntry> {
            self.bump();
            self.inner.insert_entry(list_id, bird)
        }

        fn delete_entry(&self, list_id: &str, entry_id: &str) -> AppResult<()> {
            self.bump();
            self.inner.delete_entry(list_id, entry_id)
        }
    }

    fn user() -> User {
        User {
            id: "u1".into(),
            display_name: "Ada".into(),
        }
    }

    fn drain(rx: &mut Receiver<ListEvent>) -> Vec<ListEvent> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[test]
    fn blank_names_never_reach_the_store() {
        let store = Arc::new(CountingStore::new());
        let service = ListService::new(store.clone(), EventBus::new());

        for name in ["", "   ", "\t\n"] {
            let err = service.create_list(Some(&user()), name, "desc").unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert!(matches!(
            service.rename_list("l1", " ", ""),
            Err(AppError::Validation(_))
        ));
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn signed_out_callers_are_turned_away() {
        let store = Arc::new(CountingStore::new());
        let service = ListService::new(store.clone(), EventBus::new());

        assert!(matches!(
            service.list_owned_lists(None),
            Err(AppError::NotAuthenticated)
        ));
        assert!(matches!(
            service.create_list(None, "Backyard", ""),
            Err(AppError::NotAuthenticated)
        ));
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn mutations_are_announced() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let service = ListService::new(Arc::new(CountingStore::new()), bus);
        let bird = BirdRecord {
            name: "Blue Jay".into(),
            ..BirdRecord::default()
        };

        let (list_id, entry_id) = service
            .create_list_and_add_bird(Some(&user()), " Feeder ", "", &bird)
            .unwrap();
        service.remove_bird_from_list(&list_id, &entry_id).unwrap();
        service.delete_list(&list_id).unwrap();

        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![
                ListEvent::Created {
                    list_id: list_id.clone()
                },
                ListEvent::EntryAdded {
                    list_id: list_id.clone(),
                    entry_id: entry_id.clone()
                },
                ListEvent::EntryRemoved {
                    list_id: list_id.clone(),
                    entry_id
                },
                ListEvent::Deleted { list_id },
            ]
        );
    }

    #[test]
    fn rename_trims_and_announces() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let service = ListService::new(Arc::new(CountingStore::new()), bus);
        let list_id = service.create_list(Some(&user()), "Feeder", "").unwrap();

        service
            .rename_list(&list_id, "  Window feeder ", " sunflower seed ")
            .unwrap();

        let lists = service.list_owned_lists(Some(&user())).unwrap();
        assert_eq!(lists[0].name, "Window feeder");
        assert_eq!(lists[0].description, "sunflower seed");
        assert_eq!(
            drain(&mut rx).pop(),
            Some(ListEvent::Updated { list_id })
        );
    }

    #[test]
    fn failed_mutations_publish_nothing() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let service = ListService::new(Arc::new(CountingStore::new()), bus);

        assert!(service.remove_bird_from_list("ghost", "entry").is_err());
        assert!(service.delete_list("ghost").is_err());
        assert!(rx.try_recv().is_err());
    }
}
