use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::error::AppResult;
use crate::models::{BirdList, BirdRecord, ListEntry};
use crate::services::validate_list_name;

/// Display-name prompt shown before anyone is signed in.
#[derive(Default, Clone)]
pub(crate) struct SignInForm {
    pub(crate) name: String,
    pub(crate) error: Option<String>,
}

impl SignInForm {
    /// Append a printable character to the name.
    pub(crate) fn push_char(&mut self, ch: char) {
        if !ch.is_control() {
            self.name.push(ch);
        }
    }

    /// Remove the last character of the name.
    pub(crate) fn backspace(&mut self) {
        self.name.pop();
    }
}

/// Fields available within the list form.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum ListField {
    #[default]
    Name,
    Description,
}

/// Name/description form used for creating and editing lists. When `bird` is
/// set the new list is created with that bird already in it.
#[derive(Default, Clone)]
pub(crate) struct ListForm {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) active: ListField,
    pub(crate) error: Option<String>,
    pub(crate) bird: Option<BirdRecord>,
}

impl ListForm {
    /// Empty form for a new list that will receive `bird`.
    pub(crate) fn for_bird(bird: BirdRecord) -> Self {
        Self {
            bird: Some(bird),
            ..Self::default()
        }
    }

    /// Form prefilled with an existing list, for editing.
    pub(crate) fn from_list(list: &BirdList) -> Self {
        Self {
            name: list.name.clone(),
            description: list.description.clone(),
            ..Self::default()
        }
    }

    /// Move focus to the other field.
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            ListField::Name => ListField::Description,
            ListField::Description => ListField::Name,
        };
    }

    /// Append a character to whichever field has focus.
    pub(crate) fn push_char(&mut self, ch: char) {
        if ch.is_control() {
            return;
        }
        match self.active {
            ListField::Name => self.name.push(ch),
            ListField::Description => self.description.push(ch),
        }
    }

    /// Delete the last character of the focused field.
    pub(crate) fn backspace(&mut self) {
        match self.active {
            ListField::Name => self.name.pop(),
            ListField::Description => self.description.pop(),
        };
    }

    /// Validate the inputs and return trimmed values ready for the store.
    pub(crate) fn parse_inputs(&self) -> AppResult<(String, String)> {
        let name = validate_list_name(&self.name)?;
        Ok((name.to_string(), self.description.trim().to_string()))
    }

    /// Render one labelled field, highlighting it when focused and showing a
    /// placeholder while it is empty.
    pub(crate) fn build_line(&self, field_name: &str, field: ListField) -> Line<'static> {
        let (value, placeholder) = match field {
            ListField::Name => (&self.name, "<required>"),
            ListField::Description => (&self.description, "<optional>"),
        };
        let is_active = self.active == field;

        let display = if value.is_empty() {
            placeholder.to_string()
        } else {
            value.clone()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{field_name}: ")),
            Span::styled(display, style),
        ])
    }
}

/// Fields of the directory search form.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum SearchField {
    #[default]
    Name,
    Region,
}

/// Name and optional region filter for a directory search.
#[derive(Default, Clone)]
pub(crate) struct SearchForm {
    pub(crate) name: String,
    pub(crate) region: String,
    pub(crate) active: SearchField,
}

impl SearchForm {
    /// Switch between the name and region inputs.
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            SearchField::Name => SearchField::Region,
            SearchField::Region => SearchField::Name,
        };
    }

    /// Append a character to the focused input.
    pub(crate) fn push_char(&mut self, ch: char) {
        if ch.is_control() {
            return;
        }
        match self.active {
            SearchField::Name => self.name.push(ch),
            SearchField::Region => self.region.push(ch),
        }
    }

    /// Delete the last character of the focused input.
    pub(crate) fn backspace(&mut self) {
        match self.active {
            SearchField::Name => self.name.pop(),
            SearchField::Region => self.region.pop(),
        };
    }

    /// The region filter, or `None` when left blank.
    pub(crate) fn region(&self) -> Option<String> {
        Some(self.region.trim().to_string()).filter(|r| !r.is_empty())
    }
}

/// Confirmation state for deleting a list.
#[derive(Clone)]
pub(crate) struct ConfirmListDelete {
    pub(crate) id: String,
    pub(crate) name: String,
}

impl ConfirmListDelete {
    /// Capture the list being deleted.
    pub(crate) fn from(list: &BirdList) -> Self {
        Self {
            id: list.id.clone(),
            name: list.name.clone(),
        }
    }
}

/// Confirmation state for removing one entry from a list.
#[derive(Clone)]
pub(crate) struct ConfirmBirdRemove {
    pub(crate) list_id: String,
    pub(crate) entry_id: String,
    pub(crate) bird_name: String,
}

impl ConfirmBirdRemove {
    /// Capture the entry being removed and the list that holds it.
    pub(crate) fn from(list_id: &str, entry: &ListEntry) -> Self {
        Self {
            list_id: list_id.to_string(),
            entry_id: entry.id.clone(),
            bird_name: entry.bird.name.clone(),
        }
    }
}

/// One row of the "add to list" picker.
#[derive(Clone, PartialEq, Eq, Debug)]
pub(crate) enum PickerOption {
    Existing { id: String, name: String },
    NewList,
}

/// Chooser shown when adding a search result to a list. The last option
/// always creates a new list.
#[derive(Clone)]
pub(crate) struct ListPicker {
    pub(crate) bird: BirdRecord,
    pub(crate) options: Vec<PickerOption>,
    pub(crate) selected: usize,
}

impl ListPicker {
    /// Offer every list plus "new list", starting on `preselect` when it is
    /// one of them.
    pub(crate) fn new(bird: BirdRecord, lists: &[BirdList], preselect: Option<&str>) -> Self {
        let mut options: Vec<PickerOption> = lists
            .iter()
            .map(|list| PickerOption::Existing {
                id: list.id.clone(),
                name: list.name.clone(),
            })
            .collect();
        options.push(PickerOption::NewList);

        let selected = preselect
            .and_then(|id| lists.iter().position(|list| list.id == id))
            .unwrap_or(0);

        Self {
            bird,
            options,
            selected,
        }
    }

    /// Move the highlight, clamped to the available options.
    pub(crate) fn move_selection(&mut self, offset: isize) {
        let last = self.options.len().saturating_sub(1) as isize;
        self.selected = (self.selected as isize + offset).clamp(0, last) as usize;
    }

    /// The highlighted option.
    pub(crate) fn current(&self) -> Option<&PickerOption> {
        self.options.get(self.selected)
    }
}
