use std::mem;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use crossterm::event::KeyCode;
use open::that as open_link;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use tracing::{info, warn};

use crate::context::{AppContext, Session};
use crate::models::{or_no_data, BirdRecord};
use crate::views::Phase;
use crate::worker::Mutation;

use super::forms::{
    ConfirmBirdRemove, ConfirmListDelete, ListField, ListForm, ListPicker, PickerOption,
    SearchField, SearchForm, SignInForm,
};
use super::helpers::{bird_line, centered_rect, image_search_url, status_tag, surface_error};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
const HEADER_HEIGHT: u16 = 3;
const PAGE_STEP: isize = 5;

#[derive(Copy, Clone, PartialEq, Eq)]
enum Tab {
    Lists,
    Search,
}

/// Fine-grained modes scoped to the current tab.
enum Mode {
    Normal,
    Searching(SearchForm),
    CreatingList(ListForm),
    EditingList {
        id: String,
        form: ListForm,
    },
    ConfirmListDelete(ConfirmListDelete),
    ConfirmBirdRemove(ConfirmBirdRemove),
    PickingList(ListPicker),
    Details {
        bird: BirdRecord,
        added_at: Option<DateTime<Utc>>,
        from_search: bool,
    },
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    context: AppContext,
    session: Option<Session>,
    sign_in: SignInForm,
    tab: Tab,
    mode: Mode,
    status: Option<StatusMessage>,
    last_search: SearchForm,
}

impl App {
    pub fn new(context: AppContext) -> Self {
        Self {
            context,
            session: None,
            sign_in: SignInForm::default(),
            tab: Tab::Lists,
            mode: Mode::Normal,
            status: None,
            last_search: SearchForm::default(),
        }
    }

    /// Apply whatever the workers finished since the last frame.
    pub fn tick(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        for notice in session.pump() {
            match notice {
                Ok(text) => self.set_status(text, StatusKind::Info),
                Err(err) => self.set_status(err.to_string(), StatusKind::Error),
            }
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        if self.session.is_none() {
            return Ok(self.handle_sign_in_key(code));
        }

        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::Searching(form) => self.handle_search_form(code, form),
            Mode::CreatingList(form) => self.handle_create_list(code, form),
            Mode::EditingList { id, form } => self.handle_edit_list(code, id, form),
            Mode::ConfirmListDelete(confirm) => self.handle_confirm_list_delete(code, confirm),
            Mode::ConfirmBirdRemove(confirm) => self.handle_confirm_bird_remove(code, confirm),
            Mode::PickingList(picker) => self.handle_pick_list(code, picker),
            Mode::Details {
                bird,
                added_at,
                from_search,
            } => self.handle_details(code, bird, added_at, from_search),
        };

        Ok(exit)
    }

    fn handle_sign_in_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Esc => return true,
            KeyCode::Enter => match self.context.sign_in(&self.sign_in.name) {
                Ok(session) => {
                    let name = session.user().display_name.clone();
                    self.session = Some(session);
                    self.sign_in = SignInForm::default();
                    self.tab = Tab::Lists;
                    self.set_status(format!("Welcome, {name}!"), StatusKind::Info);
                }
                Err(err) => self.sign_in.error = Some(err.to_string()),
            },
            KeyCode::Backspace => self.sign_in.backspace(),
            KeyCode::Char(ch) => self.sign_in.push_char(ch),
            _ => {}
        }
        false
    }

    fn sign_out(&mut self) {
        if let Some(session) = self.session.take() {
            session.sign_out();
        }
        self.mode = Mode::Normal;
        self.last_search = SearchForm::default();
        self.set_status("Signed out.", StatusKind::Info);
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Char('q') => {
                *exit = true;
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.clear_status();
                self.tab = match self.tab {
                    Tab::Lists => Tab::Search,
                    Tab::Search => Tab::Lists,
                };
                return Mode::Normal;
            }
            KeyCode::Char('o') | KeyCode::Char('O') => {
                self.sign_out();
                return Mode::Normal;
            }
            _ => {}
        }

        match self.tab {
            Tab::Lists => self.handle_lists_key(code),
            Tab::Search => self.handle_results_key(code),
        }
    }

    fn handle_lists_key(&mut self, code: KeyCode) -> Mode {
        let Some(session) = self.session.as_mut() else {
            return Mode::Normal;
        };
        let view = &mut session.coordinator.lists;

        match code {
            KeyCode::Left => view.cycle(-1),
            KeyCode::Right => view.cycle(1),
            KeyCode::Up => view.move_entry(-1),
            KeyCode::Down => view.move_entry(1),
            KeyCode::PageUp => view.move_entry(-PAGE_STEP),
            KeyCode::PageDown => view.move_entry(PAGE_STEP),
            KeyCode::Char('r') | KeyCode::Char('R') => {
                session.refresh_lists();
                self.set_status("Refreshing lists...", StatusKind::Info);
            }
            KeyCode::Char('+') | KeyCode::Char('n') => {
                self.clear_status();
                return Mode::CreatingList(ListForm::default());
            }
            KeyCode::Char('e') | KeyCode::Char('E') => match view.selected_list() {
                Some(list) => {
                    let id = list.id.clone();
                    let form = ListForm::from_list(list);
                    self.clear_status();
                    return Mode::EditingList { id, form };
                }
                None => self.set_status("No list selected to edit.", StatusKind::Error),
            },
            KeyCode::Char('-') => match view.selected_list() {
                Some(list) => return Mode::ConfirmListDelete(ConfirmListDelete::from(list)),
                None => self.set_status("No list selected to delete.", StatusKind::Error),
            },
            KeyCode::Char('x') | KeyCode::Delete => {
                let confirm = view.selected_list().and_then(|list| {
                    view.selected_entry()
                        .map(|entry| ConfirmBirdRemove::from(&list.id, entry))
                });
                match confirm {
                    Some(confirm) => return Mode::ConfirmBirdRemove(confirm),
                    None => self.set_status("No bird selected to remove.", StatusKind::Error),
                }
            }
            KeyCode::Enter => {
                if let Some(entry) = view.selected_entry() {
                    return Mode::Details {
                        bird: entry.bird.clone(),
                        added_at: Some(entry.added_at),
                        from_search: false,
                    };
                }
            }
            KeyCode::Char('i') | KeyCode::Char('I') => {
                if let Some(bird) = view.selected_entry().map(|entry| entry.bird.clone()) {
                    self.open_image(&bird);
                }
            }
            _ => {}
        }
        Mode::Normal
    }

    fn handle_results_key(&mut self, code: KeyCode) -> Mode {
        let Some(session) = self.session.as_mut() else {
            return Mode::Normal;
        };

        match code {
            KeyCode::Char('/') | KeyCode::Char('f') => {
                self.clear_status();
                return Mode::Searching(self.last_search.clone());
            }
            KeyCode::Up => session.coordinator.search.move_selection(-1),
            KeyCode::Down => session.coordinator.search.move_selection(1),
            KeyCode::PageDown | KeyCode::Char('n') => {
                if !session.change_page(1) {
                    self.set_status("Already on the last page.", StatusKind::Info);
                }
            }
            KeyCode::PageUp | KeyCode::Char('p') => {
                if !session.change_page(-1) {
                    self.set_status("Already on the first page.", StatusKind::Info);
                }
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                if !session.retry_search() {
                    self.set_status("Nothing to search again yet.", StatusKind::Info);
                }
            }
            KeyCode::Char('a') | KeyCode::Char('A') => {
                if let Some(bird) = session.coordinator.search.selected_bird().cloned() {
                    return self.open_picker(bird);
                }
                self.set_status("No bird selected to add.", StatusKind::Error);
            }
            KeyCode::Enter => {
                if let Some(bird) = session.coordinator.search.selected_bird().cloned() {
                    return Mode::Details {
                        bird,
                        added_at: None,
                        from_search: true,
                    };
                }
            }
            KeyCode::Char('i') | KeyCode::Char('I') => {
                if let Some(bird) = session.coordinator.search.selected_bird().cloned() {
                    self.open_image(&bird);
                }
            }
            _ => {}
        }
        Mode::Normal
    }

    fn handle_search_form(&mut self, code: KeyCode, mut form: SearchForm) -> Mode {
        match code {
            KeyCode::Esc => return Mode::Normal,
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => {
                if let Some(session) = self.session.as_mut() {
                    session.search(&form.name, form.region());
                    info!(name = %form.name.trim(), "search submitted");
                }
                self.last_search = form;
                return Mode::Normal;
            }
            KeyCode::Char(ch) => form.push_char(ch),
            _ => {}
        }
        Mode::Searching(form)
    }

    fn handle_create_list(&mut self, code: KeyCode, mut form: ListForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Creation cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match form.parse_inputs() {
                Ok((name, description)) => {
                    let mutation = match form.bird.take() {
                        Some(bird) => Mutation::CreateListWithBird {
                            name,
                            description,
                            bird,
                        },
                        None => Mutation::CreateList { name, description },
                    };
                    self.mutate(mutation);
                    return Mode::Normal;
                }
                Err(err) => form.error = Some(err.to_string()),
            },
            KeyCode::Char(ch) => form.push_char(ch),
            _ => {}
        }
        Mode::CreatingList(form)
    }

    fn handle_edit_list(&mut self, code: KeyCode, id: String, mut form: ListForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match form.parse_inputs() {
                Ok((name, description)) => {
                    self.mutate(Mutation::RenameList {
                        list_id: id,
                        name,
                        description,
                    });
                    return Mode::Normal;
                }
                Err(err) => form.error = Some(err.to_string()),
            },
            KeyCode::Char(ch) => form.push_char(ch),
            _ => {}
        }
        Mode::EditingList { id, form }
    }

    fn handle_confirm_list_delete(&mut self, code: KeyCode, confirm: ConfirmListDelete) -> Mode {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                self.mutate(Mutation::DeleteList {
                    list_id: confirm.id,
                });
                Mode::Normal
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.set_status("Delete cancelled.", StatusKind::Info);
                Mode::Normal
            }
            _ => Mode::ConfirmListDelete(confirm),
        }
    }

    fn handle_confirm_bird_remove(&mut self, code: KeyCode, confirm: ConfirmBirdRemove) -> Mode {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                self.mutate(Mutation::RemoveBird {
                    list_id: confirm.list_id,
                    entry_id: confirm.entry_id,
                });
                Mode::Normal
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.set_status("Removal cancelled.", StatusKind::Info);
                Mode::Normal
            }
            _ => Mode::ConfirmBirdRemove(confirm),
        }
    }

    fn handle_pick_list(&mut self, code: KeyCode, mut picker: ListPicker) -> Mode {
        match code {
            KeyCode::Esc => return Mode::Normal,
            KeyCode::Up => picker.move_selection(-1),
            KeyCode::Down => picker.move_selection(1),
            KeyCode::Enter => match picker.current().cloned() {
                Some(PickerOption::Existing { id, name }) => {
                    self.mutate(Mutation::AddBird {
                        list_id: id,
                        list_name: name,
                        bird: picker.bird,
                    });
                    return Mode::Normal;
                }
                Some(PickerOption::NewList) => {
                    return Mode::CreatingList(ListForm::for_bird(picker.bird));
                }
                None => {}
            },
            _ => {}
        }
        Mode::PickingList(picker)
    }

    fn handle_details(
        &mut self,
        code: KeyCode,
        bird: BirdRecord,
        added_at: Option<DateTime<Utc>>,
        from_search: bool,
    ) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Enter => Mode::Normal,
            KeyCode::Char('a') | KeyCode::Char('A') if from_search => self.open_picker(bird),
            KeyCode::Char('i') | KeyCode::Char('I') => {
                self.open_image(&bird);
                Mode::Details {
                    bird,
                    added_at,
                    from_search,
                }
            }
            KeyCode::Char('g') | KeyCode::Char('G') => {
                self.search_images(&bird);
                Mode::Details {
                    bird,
                    added_at,
                    from_search,
                }
            }
            _ => Mode::Details {
                bird,
                added_at,
                from_search,
            },
        }
    }

    fn open_picker(&mut self, bird: BirdRecord) -> Mode {
        let Some(session) = self.session.as_ref() else {
            return Mode::Normal;
        };
        let lists = &session.coordinator.lists;
        Mode::PickingList(ListPicker::new(bird, lists.lists(), lists.selected_id()))
    }

    fn mutate(&mut self, mutation: Mutation) {
        if let Some(session) = self.session.as_ref() {
            session.mutate(mutation);
            self.set_status("Saving...", StatusKind::Info);
        }
    }

    fn open_image(&mut self, bird: &BirdRecord) {
        let Some(url) = bird.primary_image().map(str::to_string) else {
            self.set_status("This bird does not have an image.", StatusKind::Error);
            return;
        };
        self.open_in_browser(&url, format!("Opened image of {}.", bird.name));
    }

    /// Look the bird up on Google Images.
    fn search_images(&mut self, bird: &BirdRecord) {
        match image_search_url(&bird.name) {
            Ok(url) => self.open_in_browser(
                url.as_str(),
                format!("Searching images of {}.", bird.name),
            ),
            Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
        }
    }

    fn open_in_browser(&mut self, url: &str, done: String) {
        match open_link(url).context("failed to launch the system browser") {
            Ok(()) => self.set_status(done, StatusKind::Info),
            Err(err) => {
                warn!(url, error = %format!("{err:#}"), "could not open link");
                self.set_status(
                    format!("Failed to open link: {}", surface_error(&err)),
                    StatusKind::Error,
                );
            }
        }
    }

    fn set_status(&mut self, text: impl Into<String>, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub fn draw(&self, frame: &mut Frame) {
        let Some(session) = self.session.as_ref() else {
            self.draw_sign_in(frame);
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT),
                Constraint::Min(3),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(frame.area());

        self.draw_header(frame, chunks[0], session);
        match self.tab {
            Tab::Lists => self.draw_lists(frame, chunks[1], session),
            Tab::Search => self.draw_search(frame, chunks[1], session),
        }
        self.draw_footer(frame, chunks[2]);

        match &self.mode {
            Mode::Normal => {}
            Mode::Searching(form) => self.draw_search_form(frame, form),
            Mode::CreatingList(form) => {
                let title = if form.bird.is_some() {
                    "New List (adds the bird)"
                } else {
                    "New List"
                };
                self.draw_list_form(frame, title, form);
            }
            Mode::EditingList { form, .. } => self.draw_list_form(frame, "Edit List", form),
            Mode::ConfirmListDelete(confirm) => self.draw_confirm(
                frame,
                "Delete List",
                format!(
                    "Delete \"{}\"? This action cannot be undone.",
                    confirm.name
                ),
            ),
            Mode::ConfirmBirdRemove(confirm) => self.draw_confirm(
                frame,
                "Remove Bird",
                format!(
                    "Remove {} from this list? This action cannot be undone.",
                    confirm.bird_name
                ),
            ),
            Mode::PickingList(picker) => self.draw_picker(frame, picker),
            Mode::Details {
                bird,
                added_at,
                from_search,
            } => self.draw_details(frame, bird, *added_at, *from_search),
        }
    }

    fn draw_sign_in(&self, frame: &mut Frame) {
        let area = centered_rect(50, 40, frame.area());
        let mut lines = vec![
            Line::from(Span::styled(
                "Welcome to Aviary",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from("Sign in to search for birds and keep your lists."),
            Line::from(""),
            Line::from(vec![
                Span::raw("Display name: "),
                Span::styled(self.sign_in.name.clone(), Style::default().fg(Color::Yellow)),
            ]),
        ];
        if let Some(error) = &self.sign_in.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        }
        if let Some(status) = &self.status {
            lines.push(Line::from(Span::styled(
                status.text.clone(),
                status.kind.style(),
            )));
        }
        lines.push(Line::from(""));
        lines.push(Line::from("Enter: sign in  Esc: quit"));

        let block = Block::default().title("Sign In").borders(Borders::ALL);
        let paragraph = Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(Clear, area);
        frame.render_widget(paragraph, area);
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect, session: &Session) {
        let tab_style = |tab: Tab| {
            if self.tab == tab {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            }
        };
        let line = Line::from(vec![
            Span::styled(" Lists ", tab_style(Tab::Lists)),
            Span::raw("|"),
            Span::styled(" Search ", tab_style(Tab::Search)),
            Span::raw("   "),
            Span::styled(
                format!("Signed in as {}", session.user().display_name),
                Style::default().fg(Color::Gray),
            ),
        ]);
        let block = Block::default().title("Aviary").borders(Borders::ALL);
        frame.render_widget(Paragraph::new(line).block(block), area);
    }

    fn draw_lists(&self, frame: &mut Frame, area: Rect, session: &Session) {
        let view = &session.coordinator.lists;
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
            .split(area);

        let title = phase_title("My Lists", view.state.phase());
        if view.lists().is_empty() {
            let text = match view.state.phase() {
                Phase::Fetching | Phase::Idle => "Loading lists...",
                _ => "You have no lists yet. Press + to create one.",
            };
            let paragraph = Paragraph::new(text)
                .block(Block::default().title(title).borders(Borders::ALL))
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
            return;
        }

        let items: Vec<ListItem> = view
            .lists()
            .iter()
            .map(|list| ListItem::new(format!("{} ({})", list.name, list.entry_count())))
            .collect();
        let mut state = ListState::default().with_selected(view.selected_index());
        let lists = List::new(items)
            .block(Block::default().title(title).borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            .highlight_symbol("> ");
        frame.render_stateful_widget(lists, columns[0], &mut state);

        let Some(selected) = view.selected_list() else {
            return;
        };

        let detail = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(3)])
            .split(columns[1]);

        let mut header = vec![Line::from(Span::styled(
            selected.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        if !selected.description.trim().is_empty() {
            header.push(Line::from(selected.description.clone()));
        }
        header.push(Line::from(Span::styled(
            format!("Created on {}", selected.created_on()),
            Style::default().fg(Color::DarkGray),
        )));
        frame.render_widget(
            Paragraph::new(header)
                .block(Block::default().borders(Borders::ALL))
                .wrap(Wrap { trim: true }),
            detail[0],
        );

        let birds_title = format!("Birds ({})", selected.entry_count());
        if selected.entries.is_empty() {
            frame.render_widget(
                Paragraph::new("No birds yet. Find some on the Search tab.")
                    .block(Block::default().title(birds_title).borders(Borders::ALL)),
                detail[1],
            );
            return;
        }

        let items: Vec<ListItem> = selected
            .entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| ListItem::new(bird_line(&entry.bird, idx == view.entry_index())))
            .collect();
        let mut state = ListState::default().with_selected(Some(view.entry_index()));
        let entries = List::new(items)
            .block(Block::default().title(birds_title).borders(Borders::ALL))
            .highlight_symbol("> ");
        frame.render_stateful_widget(entries, detail[1], &mut state);
    }

    fn draw_search(&self, frame: &mut Frame, area: Rect, session: &Session) {
        let view = &session.coordinator.search;
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(area);

        let summary = match view.query() {
            Some(query) => {
                let page = view.state.data();
                let region = query.region.as_deref().unwrap_or("any");
                format!(
                    "Name: \"{}\"  Region: {region}  Page {} of {}",
                    query.name, page.page, page.total_pages
                )
            }
            None => "Press / to search the bird directory.".to_string(),
        };
        frame.render_widget(
            Paragraph::new(summary).block(Block::default().title("Search").borders(Borders::ALL)),
            rows[0],
        );

        let title = phase_title("Results", view.state.phase());
        if view.results().is_empty() {
            let text = match view.state.phase() {
                Phase::Fetching => "Searching...",
                Phase::Idle => "",
                _ => "No birds matched.",
            };
            frame.render_widget(
                Paragraph::new(text).block(Block::default().title(title).borders(Borders::ALL)),
                rows[1],
            );
            return;
        }

        let items: Vec<ListItem> = view
            .results()
            .iter()
            .enumerate()
            .map(|(idx, bird)| {
                let mut line = bird_line(bird, idx == view.selected_index());
                if !bird.sci_name.trim().is_empty() {
                    line.spans.push(Span::styled(
                        format!("  {}", bird.sci_name),
                        Style::default()
                            .fg(Color::DarkGray)
                            .add_modifier(Modifier::ITALIC),
                    ));
                }
                ListItem::new(line)
            })
            .collect();
        let mut state = ListState::default().with_selected(Some(view.selected_index()));
        let list = List::new(items)
            .block(Block::default().title(title).borders(Borders::ALL))
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, rows[1], &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let hints = match (&self.mode, self.tab) {
            (Mode::Normal, Tab::Lists) => {
                "Tab: search  <-/->: list  Up/Down: bird  Enter: details  +: new  e: edit  -: delete list  x: remove bird  i: image  r: refresh  o: sign out  q: quit"
            }
            (Mode::Normal, Tab::Search) => {
                "Tab: lists  /: search  Up/Down: select  Enter: details  a: add to list  n/p: page  i: image  r: retry  o: sign out  q: quit"
            }
            (Mode::Searching(_), _) | (Mode::CreatingList(_), _) | (Mode::EditingList { .. }, _) => {
                "Tab: next field  Enter: confirm  Esc: cancel"
            }
            (Mode::ConfirmListDelete(_), _) | (Mode::ConfirmBirdRemove(_), _) => "y: confirm  n: cancel",
            (Mode::PickingList(_), _) => "Up/Down: choose  Enter: add  Esc: cancel",
            (Mode::Details { .. }, _) => "i: image  g: image search  a: add (search)  Esc: close",
        };

        let mut lines = Vec::with_capacity(2);
        if let Some(status) = &self.status {
            lines.push(Line::from(Span::styled(
                status.text.clone(),
                status.kind.style(),
            )));
        }
        lines.push(Line::from(Span::styled(
            hints,
            Style::default().fg(Color::DarkGray),
        )));

        frame.render_widget(
            Paragraph::new(lines)
                .block(Block::default().borders(Borders::TOP))
                .wrap(Wrap { trim: true }),
            area,
        );
    }

    fn draw_search_form(&self, frame: &mut Frame, form: &SearchForm) {
        let area = centered_rect(60, 30, frame.area());
        let field = |label: &str, value: &str, active: bool| {
            let style = if active {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::raw(format!("{label}: ")),
                Span::styled(value.to_string(), style),
            ])
        };
        let lines = vec![
            field("Bird name", &form.name, form.active == SearchField::Name),
            field("Region", &form.region, form.active == SearchField::Region),
        ];
        render_modal(frame, area, "Search Birds", lines);
    }

    fn draw_list_form(&self, frame: &mut Frame, title: &str, form: &ListForm) {
        let area = centered_rect(60, 35, frame.area());
        let mut lines = vec![
            form.build_line("Name", ListField::Name),
            form.build_line("Description", ListField::Description),
        ];
        if let Some(bird) = &form.bird {
            lines.push(Line::from(""));
            lines.push(Line::from(format!("{} will be added to the new list.", bird.name)));
        }
        if let Some(error) = &form.error {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        }
        render_modal(frame, area, title, lines);
    }

    fn draw_confirm(&self, frame: &mut Frame, title: &str, message: String) {
        let area = centered_rect(50, 25, frame.area());
        render_modal(
            frame,
            area,
            title,
            vec![Line::from(message), Line::from(""), Line::from("y / n")],
        );
    }

    fn draw_picker(&self, frame: &mut Frame, picker: &ListPicker) {
        let area = centered_rect(50, 50, frame.area());
        let items: Vec<ListItem> = picker
            .options
            .iter()
            .map(|option| match option {
                PickerOption::Existing { name, .. } => ListItem::new(name.clone()),
                PickerOption::NewList => ListItem::new(Span::styled(
                    "+ Create a new list",
                    Style::default().fg(Color::Cyan),
                )),
            })
            .collect();
        let mut state = ListState::default().with_selected(Some(picker.selected));
        let list = List::new(items)
            .block(
                Block::default()
                    .title(format!("Add {} to...", picker.bird.name))
                    .borders(Borders::ALL),
            )
            .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            .highlight_symbol("> ");
        frame.render_widget(Clear, area);
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_details(
        &self,
        frame: &mut Frame,
        bird: &BirdRecord,
        added_at: Option<DateTime<Utc>>,
        from_search: bool,
    ) {
        let area = centered_rect(70, 70, frame.area());
        let row = |label: &str, value: String| {
            Line::from(vec![
                Span::styled(
                    format!("{label}: "),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(value),
            ])
        };

        let mut lines = vec![
            Line::from(vec![
                Span::styled(
                    bird.name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(" "),
                status_tag(bird),
            ]),
            Line::from(""),
            row("Scientific Name", or_no_data(&bird.sci_name).to_string()),
            row("Order", or_no_data(&bird.order).to_string()),
            row("Family", or_no_data(&bird.family).to_string()),
            row("Region", bird.region_summary()),
            row("Wingspan", bird.wingspan_summary()),
            row("Length", bird.length_summary()),
            row(
                "Image",
                bird.primary_image().unwrap_or("No Data Available").to_string(),
            ),
        ];
        if let Some(added_at) = added_at {
            lines.push(row("Added", added_at.format("%B %-d, %Y").to_string()));
        }
        if from_search {
            lines.push(Line::from(""));
            lines.push(Line::from("Press a to add this bird to a list."));
        }
        render_modal(frame, area, "Bird Details", lines);
    }
}

fn phase_title(base: &str, phase: &Phase) -> String {
    match phase {
        Phase::Fetching => format!("{base} (loading...)"),
        Phase::Failed(message) => format!("{base} (failed: {message})"),
        Phase::Idle | Phase::Populated => base.to_string(),
    }
}

fn render_modal(frame: &mut Frame, area: Rect, title: &str, lines: Vec<Line<'static>>) {
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}
