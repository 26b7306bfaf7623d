//! Application wiring. An [`AppContext`] is built once at startup and owns the
//! ports; signing in produces a [`Session`] that owns the view coordinator and
//! the worker dispatcher for that user. Signing out consumes the session.

use std::sync::mpsc::Receiver;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::directory::{BirdDirectory, NuthatchClient};
use crate::error::AppResult;
use crate::events::EventBus;
use crate::identity::{IdentityProvider, LocalIdentity};
use crate::models::User;
use crate::services::ListService;
use crate::store::{ListStore, SqliteListStore};
use crate::views::Coordinator;
use crate::worker::{Dispatcher, Mutation, WorkerMessage};

pub struct AppContext {
    lists: ListService,
    directory: Arc<dyn BirdDirectory>,
    identity: Arc<dyn IdentityProvider>,
    page_size: u32,
}

impl AppContext {
    pub fn new(
        store: Arc<dyn ListStore>,
        directory: Arc<dyn BirdDirectory>,
        identity: Arc<dyn IdentityProvider>,
        page_size: u32,
    ) -> Self {
        Self {
            lists: ListService::new(store, EventBus::new()),
            directory,
            identity,
            page_size,
        }
    }

    /// Open the database under the data directory and build the Nuthatch
    /// client.
    pub fn from_config(config: &Config) -> Result<Self> {
        let conn = db::share(db::open_database(&config.database_path())?);
        let directory =
            NuthatchClient::from_config(config).context("failed to build bird directory client")?;
        info!(
            data_dir = %config.data_dir.display(),
            api = %config.api_base_url,
            "application context ready"
        );
        Ok(Self::new(
            Arc::new(SqliteListStore::new(conn.clone())),
            Arc::new(directory),
            Arc::new(LocalIdentity::new(conn)),
            config.page_size,
        ))
    }

    /// Authenticate and open a session. The first lists fetch is already
    /// dispatched when this returns.
    pub fn sign_in(&self, display_name: &str) -> AppResult<Session> {
        let user = self.identity.sign_in(display_name)?;
        let coordinator = Coordinator::new(self.lists.events().subscribe(), self.page_size);
        let (dispatcher, results) =
            Dispatcher::new(self.lists.clone(), Arc::clone(&self.directory), user.clone());
        let mut session = Session {
            user,
            coordinator,
            dispatcher,
            results,
            identity: Arc::clone(&self.identity),
        };
        session.refresh_lists();
        Ok(session)
    }
}

pub struct Session {
    user: User,
    pub coordinator: Coordinator,
    dispatcher: Dispatcher,
    results: Receiver<WorkerMessage>,
    identity: Arc<dyn IdentityProvider>,
}

impl Session {
    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn refresh_lists(&mut self) {
        if let Some(request) = self.coordinator.refresh_lists() {
            self.dispatcher.fetch(request);
        }
    }

    pub fn search(&mut self, name: &str, region: Option<String>) {
        let request = self.coordinator.search.submit(name, region);
        self.dispatcher.fetch(request);
    }

    pub fn change_page(&mut self, delta: i64) -> bool {
        match self.coordinator.search.change_page(delta) {
            Some(request) => {
                self.dispatcher.fetch(request);
                true
            }
            None => false,
        }
    }

    pub fn retry_search(&mut self) -> bool {
        match self.coordinator.search.retry() {
            Some(request) => {
                self.dispatcher.fetch(request);
                true
            }
            None => false,
        }
    }

    pub fn mutate(&self, mutation: Mutation) {
        self.dispatcher.mutate(mutation);
    }

    /// Drain finished work and pending list events, dispatching any follow-up
    /// fetches. Returns the mutation outcomes for the status line.
    pub fn pump(&mut self) -> Vec<AppResult<String>> {
        let mut notices = Vec::new();
        while let Ok(message) = self.results.try_recv() {
            match message {
                WorkerMessage::Fetched(result) => {
                    if let Some(request) = self.coordinator.apply(result) {
                        self.dispatcher.fetch(request);
                    }
                }
                WorkerMessage::Mutated(outcome) => notices.push(outcome),
            }
        }
        if let Some(request) = self.coordinator.drain_events() {
            self.dispatcher.fetch(request);
        }
        notices
    }

    /// End the session. In-flight results are discarded with it.
    pub fn sign_out(self) {
        self.identity.sign_out(&self.user);
    }
}
