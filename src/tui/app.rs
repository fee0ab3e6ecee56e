//! TUI application state and main event loop

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::{FutureExt, StreamExt};
use ratatui::DefaultTerminal;

use super::compose::InputState;
use super::debug_log::{DebugLogState, LogBuffer};
use super::messages::MessagesState;
use super::sidebar::SidebarState;
use super::ui;
use crate::api::{ChatApi, ChatClient};
use crate::config::Config;
use crate::sync::{SyncEngine, SyncEvent, SyncUpdate};

/// Target frame rate for UI updates (~30 fps)
const FRAME_DURATION_MS: u64 = 33;

/// Lines moved per PageUp/PageDown.
const PAGE_LINES: usize = 10;

/// Active pane in the TUI
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    #[default]
    Sidebar,
    Messages,
    Compose,
}

impl Pane {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pane::Sidebar => "chats",
            Pane::Messages => "thread",
            Pane::Compose => "compose",
        }
    }

    fn next(self) -> Self {
        match self {
            Pane::Sidebar => Pane::Messages,
            Pane::Messages => Pane::Compose,
            Pane::Compose => Pane::Sidebar,
        }
    }

    fn prev(self) -> Self {
        match self {
            Pane::Sidebar => Pane::Compose,
            Pane::Messages => Pane::Sidebar,
            Pane::Compose => Pane::Messages,
        }
    }
}

/// Application state
pub struct App<A: ChatApi> {
    /// Whether the app should exit
    pub should_exit: bool,
    /// Backend shown in the header
    pub api_url: String,
    /// Active pane
    pub active_pane: Pane,
    pub engine: SyncEngine<A>,
    pub sidebar: SidebarState,
    pub messages: MessagesState,
    pub compose: InputState,
    pub show_help: bool,
    pub debug_log: DebugLogState,
}

impl<A: ChatApi> App<A> {
    pub fn new(engine: SyncEngine<A>, config: &Config, logs: LogBuffer) -> Self {
        Self {
            should_exit: false,
            api_url: config.api_url.clone(),
            active_pane: Pane::default(),
            engine,
            sidebar: SidebarState::new(config.show_no_contacts_banner),
            messages: MessagesState::default(),
            compose: InputState::default(),
            show_help: false,
            debug_log: DebugLogState::new(logs),
        }
    }

    /// Stop polling and leave the event loop.
    pub fn quit(&mut self) {
        self.engine.shutdown();
        self.should_exit = true;
    }

    /// Apply a background result and update the view around it.
    pub fn handle_sync(&mut self, event: SyncEvent) {
        match self.engine.apply(event) {
            SyncUpdate::ConversationsRefreshed => {
                let count = self.sidebar.visible(&self.engine.state().conversations).len();
                self.sidebar.clamp_selection(count);
            }
            SyncUpdate::MessageSent => self.compose.clear(),
            SyncUpdate::MessagesRefreshed | SyncUpdate::SendFailed | SyncUpdate::Unchanged => {}
        }
    }

    /// Handle a key press.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit();
            return;
        }

        // Any key closes the help popup.
        if self.show_help {
            self.show_help = false;
            return;
        }

        match key.code {
            KeyCode::F(12) => {
                self.debug_log.toggle();
                return;
            }
            KeyCode::Tab => {
                self.sidebar.searching = false;
                self.active_pane = self.active_pane.next();
                return;
            }
            KeyCode::BackTab => {
                self.sidebar.searching = false;
                self.active_pane = self.active_pane.prev();
                return;
            }
            KeyCode::PageUp if self.debug_log.visible => {
                self.debug_log.scroll_up(PAGE_LINES);
                return;
            }
            KeyCode::PageDown if self.debug_log.visible => {
                self.debug_log.scroll_down(PAGE_LINES);
                return;
            }
            _ => {}
        }

        if self.sidebar.searching {
            self.handle_search_key(key);
        } else if self.active_pane == Pane::Compose {
            self.handle_compose_key(key);
        } else {
            self.handle_browse_key(key);
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.sidebar.searching = false,
            KeyCode::Enter => {
                self.sidebar.searching = false;
                self.open_selected();
            }
            KeyCode::Up => self.sidebar.move_up(),
            KeyCode::Down => self.sidebar.move_down(self.visible_count()),
            KeyCode::Left => self.sidebar.search.move_left(),
            KeyCode::Right => self.sidebar.search.move_right(),
            KeyCode::Home => self.sidebar.search.move_home(),
            KeyCode::End => self.sidebar.search.move_end(),
            KeyCode::Backspace => {
                self.sidebar.search.backspace();
                self.sidebar.selected = 0;
            }
            KeyCode::Delete => {
                self.sidebar.search.delete();
                self.sidebar.selected = 0;
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.sidebar.search.insert_char(c);
                self.sidebar.selected = 0;
            }
            _ => {}
        }
    }

    fn handle_compose_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.active_pane = Pane::Sidebar,
            KeyCode::Enter => self.send(),
            KeyCode::Char('u') if ctrl => self.compose.clear(),
            KeyCode::Char(c) if !ctrl => self.compose.insert_char(c),
            KeyCode::Backspace => self.compose.backspace(),
            KeyCode::Delete => self.compose.delete(),
            KeyCode::Left => self.compose.move_left(),
            KeyCode::Right => self.compose.move_right(),
            KeyCode::Home => self.compose.move_home(),
            KeyCode::End => self.compose.move_end(),
            _ => {}
        }
    }

    /// Keys for the list and thread panes.
    fn handle_browse_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.quit(),
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Char('/') => {
                self.active_pane = Pane::Sidebar;
                self.sidebar.searching = true;
            }
            KeyCode::Char('x') => self.sidebar.dismiss_banner(),
            KeyCode::Esc if !self.sidebar.search.text().is_empty() => {
                self.sidebar.search.clear();
                self.sidebar.selected = 0;
            }
            KeyCode::Up | KeyCode::Char('k') => match self.active_pane {
                Pane::Sidebar => self.sidebar.move_up(),
                _ => self.messages.scroll_up(1),
            },
            KeyCode::Down | KeyCode::Char('j') => match self.active_pane {
                Pane::Sidebar => self.sidebar.move_down(self.visible_count()),
                _ => self.messages.scroll_down(1),
            },
            KeyCode::PageUp => self.messages.scroll_up(PAGE_LINES),
            KeyCode::PageDown => self.messages.scroll_down(PAGE_LINES),
            KeyCode::Enter => match self.active_pane {
                Pane::Sidebar => self.open_selected(),
                _ => self.active_pane = Pane::Compose,
            },
            _ => {}
        }
    }

    fn visible_count(&self) -> usize {
        self.sidebar.visible(&self.engine.state().conversations).len()
    }

    /// Make the highlighted conversation active and move to the compose box.
    fn open_selected(&mut self) {
        let Some(id) = self.sidebar.selected_id(&self.engine.state().conversations) else {
            return;
        };
        if self.engine.select(&id) {
            self.messages.reset();
        }
        self.active_pane = Pane::Compose;
    }

    /// Send the compose text. The input is cleared once the backend accepts it.
    fn send(&mut self) {
        if !self.engine.submit(self.compose.text()) {
            tracing::debug!("Nothing to send");
        }
    }

    /// Render the UI
    pub fn render(&self, frame: &mut ratatui::Frame) {
        ui::render(frame, self);
    }
}

/// Run the TUI application with panic-safe terminal restore
pub async fn run(config: &Config, logs: LogBuffer) -> Result<()> {
    let client = ChatClient::new(config)?;

    let mut terminal = ratatui::init();
    let result = AssertUnwindSafe(run_app(&mut terminal, client, config, logs))
        .catch_unwind()
        .await;
    ratatui::restore();

    match result {
        Ok(r) => r,
        Err(e) => std::panic::resume_unwind(e),
    }
}

async fn run_app(
    terminal: &mut DefaultTerminal,
    client: ChatClient,
    config: &Config,
    logs: LogBuffer,
) -> Result<()> {
    let (mut engine, mut events) = SyncEngine::new(Arc::new(client), config.poll_interval());
    engine.start();

    let mut app = App::new(engine, config, logs);
    let mut input = EventStream::new();
    let mut frame_tick = tokio::time::interval(Duration::from_millis(FRAME_DURATION_MS));

    tracing::info!("Polling {} every {:?}", config.api_url, config.poll_interval());

    while !app.should_exit {
        app.debug_log.refresh();
        terminal.draw(|frame| app.render(frame))?;

        tokio::select! {
            maybe_event = input.next() => match maybe_event {
                Some(Ok(Event::Key(key))) => app.handle_key(key),
                Some(Ok(_)) => {
                    // Resize and the rest are picked up by the next draw.
                }
                Some(Err(e)) => {
                    app.quit();
                    return Err(e.into());
                }
                None => app.quit(),
            },
            Some(event) = events.recv() => app.handle_sync(event),
            _ = frame_tick.tick() => {}
        }
    }

    Ok(())
}
