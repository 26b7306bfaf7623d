//! View-state coordination for the Lists and Search screens.
//!
//! Each screen owns a [`ViewState`] that walks `Idle -> Fetching ->
//! (Populated | Failed)`. Fetches are tagged with a [`Ticket`]; only the newest
//! ticket may change the state, so a slow response can never overwrite the
//! result of a later request. Refresh requests that arrive while a fetch is in
//! flight are folded into a single follow-up fetch.

use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::Receiver;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::events::ListEvent;
use crate::models::{BirdList, BirdRecord, ListEntry, SearchPage, SearchQuery};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Fetching,
    Populated,
    /// Holds the message shown to the user. The previous data stays visible.
    Failed(String),
}

/// Identifies one fetch. Hand it back to [`ViewState::complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// A newer fetch was started after this one; the result was dropped.
    Stale,
}

#[derive(Debug)]
pub struct ViewState<T> {
    data: T,
    phase: Phase,
    generation: u64,
    in_flight: usize,
    dirty: bool,
}

impl<T: Default> Default for ViewState<T> {
    fn default() -> Self {
        Self {
            data: T::default(),
            phase: Phase::Idle,
            generation: 0,
            in_flight: 0,
            dirty: false,
        }
    }
}

impl<T> ViewState<T> {
    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_fetching(&self) -> bool {
        self.phase == Phase::Fetching
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn begin_fetch(&mut self) -> Ticket {
        self.generation += 1;
        self.in_flight += 1;
        self.dirty = false;
        self.phase = Phase::Fetching;
        Ticket(self.generation)
    }

    pub fn complete(&mut self, ticket: Ticket, result: AppResult<T>) -> Outcome {
        self.in_flight = self.in_flight.saturating_sub(1);
        if ticket.0 != self.generation {
            debug!(ticket = ticket.0, current = self.generation, "dropping stale fetch result");
            return Outcome::Stale;
        }
        match result {
            Ok(data) => {
                self.data = data;
                self.phase = Phase::Populated;
            }
            Err(err) => {
                warn!(error = %err, "fetch failed; keeping previous data");
                self.phase = Phase::Failed(err.to_string());
            }
        }
        Outcome::Applied
    }

    /// Ask for fresh data. Returns a ticket when a fetch should start now, or
    /// `None` when one is already running; in that case exactly one more fetch
    /// is handed out by [`ViewState::take_pending`] once it settles.
    pub fn request_refresh(&mut self) -> Option<Ticket> {
        if self.is_fetching() {
            self.dirty = true;
            None
        } else {
            Some(self.begin_fetch())
        }
    }

    pub fn take_pending(&mut self) -> Option<Ticket> {
        if self.dirty && !self.is_fetching() {
            Some(self.begin_fetch())
        } else {
            None
        }
    }
}

/// A fetch the caller has to run and report back through
/// [`Coordinator::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum FetchRequest {
    Lists(Ticket),
    Search(Ticket, SearchQuery),
}

impl FetchRequest {
    /// The result to report when the fetch could not run at all, so its
    /// ticket still settles.
    pub fn failed(&self, err: AppError) -> FetchResult {
        match self {
            FetchRequest::Lists(ticket) => FetchResult::Lists(*ticket, Err(err)),
            FetchRequest::Search(ticket, _) => FetchResult::Search(*ticket, Err(err)),
        }
    }
}

/// Results coming back from a worker.
#[derive(Debug)]
pub enum FetchResult {
    Lists(Ticket, AppResult<Vec<BirdList>>),
    Search(Ticket, AppResult<SearchPage>),
}

#[derive(Debug, Default)]
pub struct ListsView {
    pub state: ViewState<Vec<BirdList>>,
    selected: Option<String>,
    pending_select: Option<String>,
    entry_index: usize,
}

impl ListsView {
    pub fn lists(&self) -> &[BirdList] {
        self.state.data()
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_list(&self) -> Option<&BirdList> {
        let id = self.selected.as_deref()?;
        self.lists().iter().find(|list| list.id == id)
    }

    pub fn selected_index(&self) -> Option<usize> {
        let id = self.selected.as_deref()?;
        self.lists().iter().position(|list| list.id == id)
    }

    pub fn entry_index(&self) -> usize {
        self.entry_index
    }

    pub fn selected_entry(&self) -> Option<&ListEntry> {
        self.selected_list()?.entries.get(self.entry_index)
    }

    pub fn select(&mut self, list_id: &str) {
        if self.lists().iter().any(|list| list.id == list_id) {
            self.selected = Some(list_id.to_string());
            self.entry_index = 0;
        } else {
            self.pending_select = Some(list_id.to_string());
        }
    }

    /// Step through the lists, wrapping at both ends.
    pub fn cycle(&mut self, offset: isize) {
        let len = self.lists().len();
        if len == 0 {
            return;
        }
        let current = self.selected_index().unwrap_or(0) as isize;
        let next = (current + offset).rem_euclid(len as isize) as usize;
        self.selected = Some(self.lists()[next].id.clone());
        self.entry_index = 0;
    }

    pub fn move_entry(&mut self, offset: isize) {
        let len = self.selected_list().map(BirdList::entry_count).unwrap_or(0);
        if len == 0 {
            self.entry_index = 0;
            return;
        }
        let next = (self.entry_index as isize + offset).clamp(0, len as isize - 1);
        self.entry_index = next as usize;
    }

    fn on_event(&mut self, event: &ListEvent) {
        if let ListEvent::Created { list_id } = event {
            self.pending_select = Some(list_id.clone());
        }
    }

    /// Re-establish the selection after the data changed: a list that was
    /// just created wins, then the previous selection if it still exists,
    /// then the first list.
    fn reconcile(&mut self) {
        let exists = |id: &str, lists: &[BirdList]| lists.iter().any(|list| list.id == id);

        if let Some(id) = self.pending_select.take() {
            if exists(&id, self.lists()) {
                self.selected = Some(id);
                self.entry_index = 0;
            } else if self.state.is_fetching() {
                self.pending_select = Some(id);
            }
        }

        let keep = self
            .selected
            .as_deref()
            .is_some_and(|id| exists(id, self.lists()));
        if !keep {
            self.selected = self.lists().first().map(|list| list.id.clone());
            self.entry_index = 0;
        }
        self.move_entry(0);
    }
}

#[derive(Debug)]
pub struct SearchView {
    pub state: ViewState<SearchPage>,
    page_size: u32,
    query: Option<SearchQuery>,
    selected: usize,
}

impl SearchView {
    pub fn new(page_size: u32) -> Self {
        Self {
            state: ViewState::default(),
            page_size,
            query: None,
            selected: 0,
        }
    }

    pub fn query(&self) -> Option<&SearchQuery> {
        self.query.as_ref()
    }

    pub fn results(&self) -> &[BirdRecord] {
        &self.state.data().birds
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_bird(&self) -> Option<&BirdRecord> {
        self.results().get(self.selected)
    }

    pub fn move_selection(&mut self, offset: isize) {
        let len = self.results().len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected as isize + offset).clamp(0, len as isize - 1) as usize;
    }

    fn fetch(&mut self, query: SearchQuery) -> FetchRequest {
        let ticket = self.state.begin_fetch();
        self.query = Some(query.clone());
        FetchRequest::Search(ticket, query)
    }

    /// Start a new search from page 1.
    pub fn submit(&mut self, name: &str, region: Option<String>) -> FetchRequest {
        let query = SearchQuery::new(name.trim(), self.page_size).with_region(region);
        self.fetch(query)
    }

    pub fn change_page(&mut self, delta: i64) -> Option<FetchRequest> {
        let query = self.query.clone()?;
        let total = i64::from(self.state.data().total_pages.max(1));
        let target = (i64::from(query.page) + delta).clamp(1, total);
        if target == i64::from(query.page) {
            return None;
        }
        Some(self.fetch(query.at_page(u32::try_from(target).ok()?)))
    }

    /// Re-run the current query, e.g. after a failure.
    pub fn retry(&mut self) -> Option<FetchRequest> {
        let query = self.query.clone()?;
        Some(self.fetch(query))
    }
}

/// Owns both views plus the event subscription that keeps the Lists view in
/// step with mutations made anywhere else.
pub struct Coordinator {
    pub lists: ListsView,
    pub search: SearchView,
    events: Receiver<ListEvent>,
}

impl Coordinator {
    pub fn new(events: Receiver<ListEvent>, page_size: u32) -> Self {
        Self {
            lists: ListsView::default(),
            search: SearchView::new(page_size),
            events,
        }
    }

    pub fn refresh_lists(&mut self) -> Option<FetchRequest> {
        self.lists.state.request_refresh().map(FetchRequest::Lists)
    }

    /// Consume every pending event; any number of them results in at most one
    /// lists fetch.
    pub fn drain_events(&mut self) -> Option<FetchRequest> {
        let mut changed = false;
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    debug!(list_id = event.list_id(), ?event, "list event received");
                    self.lists.on_event(&event);
                    changed = true;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "missed list events; refreshing anyway");
                    changed = true;
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        if changed {
            self.refresh_lists()
        } else {
            None
        }
    }

    /// Apply a worker result. May hand back a follow-up fetch for a refresh
    /// that was requested while this one was running.
    pub fn apply(&mut self, result: FetchResult) -> Option<FetchRequest> {
        match result {
            FetchResult::Lists(ticket, result) => {
                if self.lists.state.complete(ticket, result) == Outcome::Applied {
                    self.lists.reconcile();
                }
                self.lists.state.take_pending().map(FetchRequest::Lists)
            }
            FetchResult::Search(ticket, result) => {
                if self.search.state.complete(ticket, result) == Outcome::Applied {
                    if let Some(query) = &mut self.search.query {
                        query.page = self.search.state.data().page;
                    }
                    self.search.move_selection(0);
                }
                None
            }
        }
    }
}
