//! UI rendering for the TUI

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
    Frame,
};

use super::app::{App, Pane};
use super::compose;
use super::debug_log;
use super::help;
use super::messages;
use super::sidebar;
use crate::api::ChatApi;
use crate::sync::SyncState;

/// Width of the conversation list column.
const SIDEBAR_WIDTH: u16 = 34;

/// Height of the debug log pane when open.
const DEBUG_LOG_HEIGHT: u16 = 10;

/// Returns status indicator symbol and color based on the last fetch outcome
fn status_indicator(sync: &SyncState) -> (&'static str, Color) {
    if sync.error().is_some() {
        ("o", Color::Red)
    } else if sync.is_loading() {
        ("~", Color::Yellow)
    } else {
        ("*", Color::Green)
    }
}

/// Main render function
pub fn render<A: ChatApi>(frame: &mut Frame, app: &App<A>) {
    let area = frame.area();
    let sync = app.engine.state();

    // Layout: header (1 line) + main content + status bar (1 line)
    let [header_area, main_area, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(header_area, frame.buffer_mut(), app);

    // Split main area: conversation list + thread
    let [sidebar_area, content_area] =
        Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Fill(1)])
            .areas(main_area);

    // Split content area: messages (fill) + compose box
    let [messages_area, compose_area] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(compose::COMPOSE_HEIGHT),
    ])
    .areas(content_area);

    messages::render(
        messages_area,
        frame.buffer_mut(),
        &app.messages,
        sync,
        app.active_pane == Pane::Messages,
    );

    // Cursor goes to whichever input has focus, so the other one draws first.
    let searching = app.sidebar.searching;
    let compose_focused = app.active_pane == Pane::Compose && !searching;
    let sidebar_focused = app.active_pane == Pane::Sidebar || searching;
    compose::render(
        compose_area,
        frame,
        &app.compose,
        sync.is_sending(),
        compose_focused,
    );
    sidebar::render(sidebar_area, frame, &app.sidebar, sync, sidebar_focused);

    render_status(status_area, frame.buffer_mut(), app);

    // Debug log slides over the bottom of the main area.
    if app.debug_log.visible {
        let height = DEBUG_LOG_HEIGHT.min(main_area.height);
        let log_area = Rect::new(
            main_area.x,
            main_area.bottom().saturating_sub(height),
            main_area.width,
            height,
        );
        debug_log::render(log_area, frame.buffer_mut(), &app.debug_log);
    }

    // Render help popup overlay (on top of everything else)
    if app.show_help {
        help::render_help_popup(frame);
    }
}

/// Render the header bar
fn render_header<A: ChatApi>(area: Rect, buf: &mut Buffer, app: &App<A>) {
    let sync = app.engine.state();

    let title_text = " WhatsApp Chat";
    let title = Span::styled(
        title_text,
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let help_text = " [?] Help ";
    let help_indicator = Span::styled(help_text, Style::default().fg(Color::Gray));

    let (status_symbol, status_color) = status_indicator(sync);
    let status_text = format!(" {} {} ", status_symbol, app.api_url);
    let backend = Span::styled(status_text.clone(), Style::default().fg(status_color));

    // Calculate spacing to right-align the right-side elements
    let left_width = title_text.len();
    let right_width = help_text.len() + status_text.chars().count();
    let padding_width = area.width.saturating_sub((left_width + right_width) as u16) as usize;
    let padding = Span::raw(" ".repeat(padding_width));

    let header_line = Line::from(vec![title, padding, help_indicator, backend]);

    let header = Paragraph::new(header_line).style(Style::default().bg(Color::DarkGray));

    header.render(area, buf);
}

/// Render the status bar
fn render_status<A: ChatApi>(area: Rect, buf: &mut Buffer, app: &App<A>) {
    let sync = app.engine.state();

    // A failed fetch replaces the hints until the next successful one.
    if let Some(error) = sync.error() {
        let style = Style::default().fg(Color::Red).bg(Color::DarkGray);
        let line = Line::from(Span::styled(format!(" {} ", error), style));
        Paragraph::new(line)
            .style(Style::default().bg(Color::DarkGray))
            .render(area, buf);
        return;
    }

    let sep_style = Style::default().fg(Color::DarkGray);

    let activity = if sync.is_sending() {
        Span::styled(" Sending... ", Style::default().fg(Color::Yellow))
    } else if sync.is_loading() {
        Span::styled(" Loading... ", Style::default().fg(Color::Yellow))
    } else {
        let count = sync.conversations.items().len();
        Span::styled(
            format!(" {} chats ", count),
            Style::default().fg(Color::Green),
        )
    };

    let conversation = match sync.conversations.active() {
        Some(conv) => Span::styled(conv.display_name(), Style::default().fg(Color::Yellow)),
        None => Span::styled("(none)", Style::default().fg(Color::Gray)),
    };

    let pane_name = if app.sidebar.searching {
        "search"
    } else {
        app.active_pane.as_str()
    };
    let pane = Span::styled(
        format!("Tab: {} ", pane_name),
        Style::default().fg(Color::Cyan),
    );

    let hints = Span::styled(
        "/: search  Enter: open/send  ?: help  q: quit",
        Style::default().fg(Color::Gray),
    );

    let status_line = Line::from(vec![
        activity,
        Span::styled(" | ", sep_style),
        conversation,
        Span::styled(" | ", sep_style),
        pane,
        Span::styled(" | ", sep_style),
        hints,
    ]);

    let status = Paragraph::new(status_line).style(Style::default().bg(Color::DarkGray));

    status.render(area, buf);
}
