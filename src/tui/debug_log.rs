//! In-TUI log capture and the F12 debug pane.
//!
//! While the alternate screen is up, tracing output goes into a shared ring
//! of lines instead of stderr. The pane drains that ring on every frame.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, Mutex};

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};
use tracing_subscriber::fmt::MakeWriter;

/// Lines held between two drains. Older lines are dropped first.
const CAPTURE_CAPACITY: usize = 500;

/// Lines the pane keeps for scrolling back.
const HISTORY_LIMIT: usize = 1000;

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

/// Shared, bounded queue of formatted log lines.
#[derive(Clone, Default)]
pub struct LogBuffer {
    lines: Arc<Mutex<VecDeque<String>>>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, line: String) {
        // A poisoned lock still holds usable lines.
        let mut lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        while lines.len() >= CAPTURE_CAPACITY {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    /// Take every captured line, oldest first.
    pub fn drain(&self) -> Vec<String> {
        let mut lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        lines.drain(..).collect()
    }
}

/// Per-event writer handed out to tracing. Splits output on newlines.
pub struct LineWriter {
    target: LogBuffer,
    partial: Vec<u8>,
}

impl LineWriter {
    fn emit_complete_lines(&mut self) {
        while let Some(end) = self.partial.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.partial.drain(..=end).collect();
            let text = String::from_utf8_lossy(&raw[..end]);
            self.target.push(text.trim_end_matches('\r').to_string());
        }
    }
}

impl Write for LineWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.partial.extend_from_slice(buf);
        self.emit_complete_lines();
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if !self.partial.is_empty() {
            let text = String::from_utf8_lossy(&self.partial).into_owned();
            self.target.push(text);
            self.partial.clear();
        }
        Ok(())
    }
}

impl Drop for LineWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LineWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LineWriter {
            target: self.clone(),
            partial: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Pane
// ---------------------------------------------------------------------------

pub struct DebugLogState {
    source: LogBuffer,
    history: Vec<String>,
    pub visible: bool,
    /// Lines scrolled back from the newest (0 = follow the tail).
    offset: usize,
}

impl DebugLogState {
    pub fn new(source: LogBuffer) -> Self {
        Self {
            source,
            history: Vec::new(),
            visible: false,
            offset: 0,
        }
    }

    /// Pull newly captured lines into the scroll history.
    pub fn refresh(&mut self) {
        self.history.extend(self.source.drain());
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
            self.offset = self.offset.min(self.history.len().saturating_sub(1));
        }
    }

    /// Show or hide the pane. Opening jumps back to the tail.
    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        if self.visible {
            self.offset = 0;
        }
    }

    pub fn scroll_up(&mut self, n: usize) {
        let max = self.history.len().saturating_sub(1);
        self.offset = (self.offset + n).min(max);
    }

    pub fn scroll_down(&mut self, n: usize) {
        self.offset = self.offset.saturating_sub(n);
    }
}

/// Draw the pane over whatever is below it.
pub fn render(area: Rect, buf: &mut Buffer, state: &DebugLogState) {
    Clear.render(area, buf);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Debug Log (F12) ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    block.render(area, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let end = state.history.len().saturating_sub(state.offset);
    let start = end.saturating_sub(inner.height as usize);

    let lines: Vec<Line> = state.history[start..end]
        .iter()
        .map(|line| Line::from(Span::styled(line.clone(), level_style(line))))
        .collect();

    Paragraph::new(lines).render(inner, buf);
}

/// Colour a formatted tracing line by its level column.
fn level_style(line: &str) -> Style {
    let color = ["ERROR", "WARN", "INFO", "DEBUG", "TRACE"]
        .iter()
        .find(|level| line.split_whitespace().take(3).any(|word| word == **level))
        .map(|level| match *level {
            "ERROR" => Color::Red,
            "WARN" => Color::Yellow,
            "INFO" => Color::Green,
            _ => Color::DarkGray,
        })
        .unwrap_or(Color::White);
    Style::default().fg(color)
}
