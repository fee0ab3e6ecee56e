//! Terminal user interface using Ratatui.

mod app;
mod compose;
mod debug_log;
mod help;
mod messages;
mod sidebar;
mod ui;

pub use app::run;
pub use debug_log::LogBuffer;
