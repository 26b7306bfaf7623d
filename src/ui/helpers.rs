use anyhow::{Context, Error, Result};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use reqwest::Url;

use crate::models::{BirdRecord, ConservationStatus};

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

/// Foreground colour for a conservation status bucket.
pub(crate) fn status_color(status: ConservationStatus) -> Color {
    match status {
        ConservationStatus::LowConcern => Color::Green,
        ConservationStatus::SteepDecline => Color::LightRed,
        ConservationStatus::Declining => Color::Yellow,
        ConservationStatus::RedWatchList => Color::Red,
        ConservationStatus::Unknown => Color::Gray,
    }
}

/// The coloured `[status]` tag shown next to a bird's name.
pub(crate) fn status_tag(bird: &BirdRecord) -> Span<'static> {
    let label = if bird.status.trim().is_empty() {
        "Conservation Status Unknown".to_string()
    } else {
        bird.status.trim().to_string()
    };
    Span::styled(
        format!("[{label}]"),
        Style::default().fg(status_color(bird.conservation())),
    )
}

/// Name plus status tag, bold when selected.
pub(crate) fn bird_line(bird: &BirdRecord, selected: bool) -> Line<'static> {
    let name_style = if selected {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::styled(bird.name.clone(), name_style),
        Span::raw(" "),
        status_tag(bird),
    ])
}

const IMAGE_SEARCH_BASE: &str = "https://www.google.com/search";

/// Google Images query for a bird's common name.
pub(crate) fn image_search_url(name: &str) -> Result<Url> {
    Url::parse_with_params(IMAGE_SEARCH_BASE, &[("tbm", "isch"), ("q", name.trim())])
        .context("failed to build image search link")
}
