// Terminal UI implementation using ratatui
// Routes, key handling and drawing for the explorer

pub mod app;
pub mod help_ui;
pub mod runner;
pub mod sparkline;
pub mod ui;

pub use app::{Action, App, FeedView, InputMode, Route, StatsState};
pub use runner::{run_tui, AppEvent};
