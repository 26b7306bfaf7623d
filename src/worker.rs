//! Runs port calls off the UI thread. Each job gets a short-lived thread and
//! reports back over a channel the UI drains between frames.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use tracing::{debug, error};

use crate::directory::BirdDirectory;
use crate::error::{AppError, AppResult};
use crate::models::{BirdRecord, User};
use crate::services::ListService;
use crate::views::{FetchRequest, FetchResult};

/// A user-initiated change to the list store.
#[derive(Debug, Clone)]
pub enum Mutation {
    CreateList {
        name: String,
        description: String,
    },
    RenameList {
        list_id: String,
        name: String,
        description: String,
    },
    DeleteList {
        list_id: String,
    },
    AddBird {
        list_id: String,
        list_name: String,
        bird: BirdRecord,
    },
    CreateListWithBird {
        name: String,
        description: String,
        bird: BirdRecord,
    },
    RemoveBird {
        list_id: String,
        entry_id: String,
    },
}

#[derive(Debug)]
pub enum WorkerMessage {
    Fetched(FetchResult),
    /// `Ok` carries the notification text for the status line.
    Mutated(AppResult<String>),
}

pub struct Dispatcher {
    lists: ListService,
    directory: Arc<dyn BirdDirectory>,
    user: User,
    tx: Sender<WorkerMessage>,
}

impl Dispatcher {
    pub fn new(
        lists: ListService,
        directory: Arc<dyn BirdDirectory>,
        user: User,
    ) -> (Self, Receiver<WorkerMessage>) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                lists,
                directory,
                user,
                tx,
            },
            rx,
        )
    }

    pub fn fetch(&self, request: FetchRequest) {
        let lists = self.lists.clone();
        let directory = Arc::clone(&self.directory);
        let user = self.user.clone();
        let pending = request.clone();
        self.spawn(
            "fetch",
            move || {
                let result = match request {
                    FetchRequest::Lists(ticket) => {
                        FetchResult::Lists(ticket, lists.list_owned_lists(Some(&user)))
                    }
                    FetchRequest::Search(ticket, query) => {
                        FetchResult::Search(ticket, directory.search(&query))
                    }
                };
                WorkerMessage::Fetched(result)
            },
            move |err| WorkerMessage::Fetched(pending.failed(err)),
        );
    }

    pub fn mutate(&self, mutation: Mutation) {
        let lists = self.lists.clone();
        let user = self.user.clone();
        self.spawn(
            "mutation",
            move || WorkerMessage::Mutated(apply_mutation(&lists, &user, mutation)),
            |err| WorkerMessage::Mutated(Err(err)),
        );
    }

    /// Run `job` on its own thread. Whenever the job cannot produce its
    /// message (the thread fails to start or the job panics) `on_failure`
    /// reports instead, so every dispatched fetch settles its ticket.
    fn spawn<F, E>(&self, kind: &'static str, job: F, on_failure: E)
    where
        F: FnOnce() -> WorkerMessage + Send + 'static,
        E: Fn(AppError) -> WorkerMessage + Clone + Send + 'static,
    {
        let tx = self.tx.clone();
        let report_panic = on_failure.clone();
        let spawned = thread::Builder::new()
            .name(format!("aviary-{kind}"))
            .spawn(move || {
                let message = panic::catch_unwind(AssertUnwindSafe(job)).unwrap_or_else(|_| {
                    error!(kind, "worker panicked");
                    report_panic(AppError::Storage(format!("the {kind} worker crashed")))
                });
                // The receiver is gone once the session ends; nothing to do.
                if tx.send(message).is_err() {
                    debug!(kind, "worker result dropped after sign-out");
                }
            });
        if let Err(err) = spawned {
            error!(kind, error = %err, "failed to spawn worker thread");
            let message = on_failure(AppError::Storage(format!(
                "could not start the {kind} worker: {err}"
            )));
            if self.tx.send(message).is_err() {
                debug!(kind, "worker result dropped after sign-out");
            }
        }
    }
}

/// Run one mutation and phrase the notification for it.
pub fn apply_mutation(lists: &ListService, user: &User, mutation: Mutation) -> AppResult<String> {
    match mutation {
        Mutation::CreateList { name, description } => {
            lists.create_list(Some(user), &name, &description)?;
            Ok("List created successfully.".to_string())
        }
        Mutation::RenameList {
            list_id,
            name,
            description,
        } => {
            lists.rename_list(&list_id, &name, &description)?;
            Ok("List updated.".to_string())
        }
        Mutation::DeleteList { list_id } => {
            lists.delete_list(&list_id)?;
            Ok("List deleted successfully.".to_string())
        }
        Mutation::AddBird {
            list_id,
            list_name,
            bird,
        } => {
            lists.add_bird_to_list(&list_id, &bird)?;
            Ok(format!("{} has been added to \"{list_name}\".", bird.name))
        }
        Mutation::CreateListWithBird {
            name,
            description,
            bird,
        } => {
            lists.create_list_and_add_bird(Some(user), &name, &description, &bird)?;
            Ok(format!(
                "{} has been added to the new list \"{}\".",
                bird.name,
                name.trim()
            ))
        }
        Mutation::RemoveBird { list_id, entry_id } => {
            lists.remove_bird_from_list(&list_id, &entry_id)?;
            Ok("Bird removed from the list.".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::db;
    use crate::error::AppError;
    use crate::events::EventBus;
    use crate::models::{SearchPage, SearchQuery};
    use crate::store::SqliteListStore;
    use crate::views::{Coordinator, Phase};

    struct OfflineDirectory;

    impl BirdDirectory for OfflineDirectory {
        fn search(&self, _query: &SearchQuery) -> AppResult<SearchPage> {
            Err(AppError::Network("offline".into()))
        }
    }

    struct BrokenDirectory;

    impl BirdDirectory for BrokenDirectory {
        fn search(&self, _query: &SearchQuery) -> AppResult<SearchPage> {
            panic!("directory blew up");
        }
    }

    fn user() -> User {
        User {
            id: "u1".into(),
            display_name: "Ada".into(),
        }
    }

    fn recv(rx: &Receiver<WorkerMessage>) -> WorkerMessage {
        rx.recv_timeout(Duration::from_secs(5))
            .expect("worker did not report back")
    }

    #[test]
    fn mutation_then_event_driven_refresh_reaches_the_lists_view() {
        let bus = EventBus::new();
        let mut coordinator = Coordinator::new(bus.subscribe(), 24);
        let store = Arc::new(SqliteListStore::new(db::share(db::open_in_memory().unwrap())));
        let service = ListService::new(store, bus);
        let (dispatcher, rx) = Dispatcher::new(service, Arc::new(OfflineDirectory), user());

        dispatcher.mutate(Mutation::CreateList {
            name: "Backyard Birds".into(),
            description: String::new(),
        });
        let WorkerMessage::Mutated(Ok(note)) = recv(&rx) else {
            panic!("expected a successful mutation");
        };
        assert_eq!(note, "List created successfully.");

        let request = coordinator.drain_events().expect("create should trigger a refresh");
        dispatcher.fetch(request);
        let WorkerMessage::Fetched(result) = recv(&rx) else {
            panic!("expected a fetch result");
        };
        assert_eq!(coordinator.apply(result), None);

        let selected = coordinator.lists.selected_list().unwrap();
        assert_eq!(selected.name, "Backyard Birds");
        assert_eq!(selected.entry_count(), 0);
    }

    #[test]
    fn failed_search_reports_back_instead_of_hanging() {
        let bus = EventBus::new();
        let mut coordinator = Coordinator::new(bus.subscribe(), 24);
        let store = Arc::new(SqliteListStore::new(db::share(db::open_in_memory().unwrap())));
        let (dispatcher, rx) =
            Dispatcher::new(ListService::new(store, bus), Arc::new(OfflineDirectory), user());

        dispatcher.fetch(coordinator.search.submit("jay", None));
        let WorkerMessage::Fetched(result) = recv(&rx) else {
            panic!("expected a fetch result");
        };
        coordinator.apply(result);
        assert!(matches!(coordinator.search.state.phase(), Phase::Failed(_)));
    }

    #[test]
    fn crashed_fetch_still_settles_its_ticket() {
        let bus = EventBus::new();
        let mut coordinator = Coordinator::new(bus.subscribe(), 24);
        let store = Arc::new(SqliteListStore::new(db::share(db::open_in_memory().unwrap())));
        let (dispatcher, rx) =
            Dispatcher::new(ListService::new(store, bus), Arc::new(BrokenDirectory), user());

        dispatcher.fetch(coordinator.search.submit("jay", None));
        let WorkerMessage::Fetched(result) = recv(&rx) else {
            panic!("expected a fetch result");
        };
        coordinator.apply(result);

        let state = &coordinator.search.state;
        assert!(matches!(state.phase(), Phase::Failed(_)));
        assert_eq!(state.in_flight(), 0);
    }

    #[test]
    fn validation_failures_come_back_as_errors() {
        let store = Arc::new(SqliteListStore::new(db::share(db::open_in_memory().unwrap())));
        let service = ListService::new(store, EventBus::new());
        let result = apply_mutation(
            &service,
            &user(),
            Mutation::CreateList {
                name: "  ".into(),
                description: "x".into(),
            },
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
