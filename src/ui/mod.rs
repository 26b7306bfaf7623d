//! Ratatui front-end: a sign-in prompt, then a Lists tab and a Search tab
//! with modal forms on top.

mod app;
mod forms;
mod helpers;
mod terminal;

pub use app::App;
pub use terminal::run_app;
