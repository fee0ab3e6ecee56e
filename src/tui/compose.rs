//! Compose box: single-line message input with attach and send icons.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
    Frame,
};
use unicode_width::UnicodeWidthChar;

/// Editable line of text with a cursor. Backs both the compose box and the
/// conversation search box.
#[derive(Default)]
pub struct InputState {
    /// Current input text.
    pub input: String,
    /// Cursor position (character offset into `input`).
    pub cursor_pos: usize,
}

impl InputState {
    /// Insert a character at the current cursor position.
    pub fn insert_char(&mut self, c: char) {
        let byte_pos = self.char_to_byte(self.cursor_pos);
        self.input.insert(byte_pos, c);
        self.cursor_pos += 1;
    }

    /// Delete the character before the cursor (backspace).
    pub fn backspace(&mut self) {
        if self.cursor_pos > 0 {
            let byte_pos = self.char_to_byte(self.cursor_pos);
            let prev_byte_pos = self.char_to_byte(self.cursor_pos - 1);
            self.input.drain(prev_byte_pos..byte_pos);
            self.cursor_pos -= 1;
        }
    }

    /// Delete the character at the cursor (delete key).
    pub fn delete(&mut self) {
        let char_count = self.input.chars().count();
        if self.cursor_pos < char_count {
            let byte_pos = self.char_to_byte(self.cursor_pos);
            let next_byte_pos = self.char_to_byte(self.cursor_pos + 1);
            self.input.drain(byte_pos..next_byte_pos);
        }
    }

    /// Move cursor left by one character.
    pub fn move_left(&mut self) {
        if self.cursor_pos > 0 {
            self.cursor_pos -= 1;
        }
    }

    /// Move cursor right by one character.
    pub fn move_right(&mut self) {
        let char_count = self.input.chars().count();
        if self.cursor_pos < char_count {
            self.cursor_pos += 1;
        }
    }

    /// Move cursor to the beginning of the input.
    pub fn move_home(&mut self) {
        self.cursor_pos = 0;
    }

    /// Move cursor to the end of the input.
    pub fn move_end(&mut self) {
        self.cursor_pos = self.input.chars().count();
    }

    /// Clear all input text (Ctrl+U).
    pub fn clear(&mut self) {
        self.input.clear();
        self.cursor_pos = 0;
    }

    /// Current text, exactly as typed.
    pub fn text(&self) -> &str {
        &self.input
    }

    /// Whether there is anything worth sending.
    pub fn is_blank(&self) -> bool {
        self.input.trim().is_empty()
    }

    /// Convert a char-based cursor position to a byte offset.
    fn char_to_byte(&self, char_pos: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Height of the compose box: 1 border + 1 input + 1 border = 3 lines.
pub const COMPOSE_HEIGHT: u16 = 3;

const PLACEHOLDER: &str = "Type a message here...";

/// Icons drawn left and right of the input.
const ATTACH_ICON: &str = "\u{1F4CE} ";
const SEND_ICON: &str = " \u{27A4} ";

/// Render the compose box into the given area.
///
/// Uses `Frame` directly so we can both write to the buffer and set cursor.
pub fn render(area: Rect, frame: &mut Frame, state: &InputState, sending: bool, focused: bool) {
    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let border_type = if focused {
        BorderType::Double
    } else {
        BorderType::Plain
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(border_style);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let attach_w = unicode_width::UnicodeWidthStr::width(ATTACH_ICON) as u16;
    let send_w = unicode_width::UnicodeWidthStr::width(SEND_ICON) as u16;
    if inner.width <= attach_w + send_w {
        return;
    }

    let line_area = Rect::new(inner.x, inner.y, inner.width, 1);
    let input_area = Rect::new(
        inner.x + attach_w,
        inner.y,
        inner.width - attach_w - send_w,
        1,
    );

    // Compute cursor position before rendering (need immutable state access).
    let cursor = compute_cursor_position(input_area, state, focused);

    render_icons(line_area, frame.buffer_mut(), state, sending, focused);
    render_input(input_area, frame.buffer_mut(), state, sending);

    if let Some((cx, cy)) = cursor {
        frame.set_cursor_position((cx, cy));
    }
}

/// Compute the cursor position if the compose box is focused.
/// Returns Some((x, y)) or None if not focused.
fn compute_cursor_position(
    input_area: Rect,
    state: &InputState,
    focused: bool,
) -> Option<(u16, u16)> {
    if !focused {
        return None;
    }

    if state.input.is_empty() {
        // Cursor at the start of the input area (after leading space).
        Some((input_area.x + 1, input_area.y))
    } else {
        let w = input_area.width as usize;
        let display = compose_display_text(&state.input, state.cursor_pos, w);
        let cursor_x = input_area.x + 1 + display.cursor_offset as u16;
        Some((cursor_x, input_area.y))
    }
}

/// Attach icon on the left, send arrow on the right. The arrow is dimmed
/// while there is nothing to send or a send is in flight.
fn render_icons(area: Rect, buf: &mut Buffer, state: &InputState, sending: bool, focused: bool) {
    let w = area.width as usize;
    let can_send = !state.is_blank() && !sending;

    let attach_style = Style::default().fg(Color::DarkGray);
    let send_style = if can_send && focused {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let left_w = unicode_width::UnicodeWidthStr::width(ATTACH_ICON);
    let right_w = unicode_width::UnicodeWidthStr::width(SEND_ICON);
    let padding = w.saturating_sub(left_w + right_w);

    let line = Line::from(vec![
        Span::styled(ATTACH_ICON, attach_style),
        Span::raw(" ".repeat(padding)),
        Span::styled(SEND_ICON, send_style),
    ]);

    Paragraph::new(line).render(area, buf);
}

/// Render the input line (with placeholder or text).
///
/// Cursor positioning is handled separately to avoid borrow conflicts.
fn render_input(area: Rect, buf: &mut Buffer, state: &InputState, sending: bool) {
    let w = area.width as usize;

    if state.input.is_empty() {
        let placeholder = format!(" {}", PLACEHOLDER);
        let style = Style::default().fg(Color::DarkGray);
        let truncated: String = placeholder.chars().take(w).collect();
        let line = Line::from(Span::styled(truncated, style));
        Paragraph::new(line).render(area, buf);
    } else {
        // Show input text with horizontal scrolling.
        let display = compose_display_text(&state.input, state.cursor_pos, w);
        let style = if sending {
            Style::default().fg(Color::Gray).add_modifier(Modifier::DIM)
        } else {
            Style::default().fg(Color::White)
        };
        let line = Line::from(Span::styled(format!(" {}", display.visible), style));
        Paragraph::new(line).render(area, buf);
    }
}

/// The slice of input that fits in the box, and where the cursor sits in it.
struct DisplayText {
    visible: String,
    /// Columns from the start of `visible` to the cursor.
    cursor_offset: usize,
}

/// Scroll the input horizontally so the cursor stays on screen.
///
/// One column is reserved for the leading space; widths are display columns,
/// so wide characters count double.
fn compose_display_text(input: &str, cursor_pos: usize, width: usize) -> DisplayText {
    let avail = width.saturating_sub(1);
    let chars: Vec<(char, usize)> = input
        .chars()
        .map(|c| (c, UnicodeWidthChar::width(c).unwrap_or(0)))
        .collect();
    let cursor_pos = cursor_pos.min(chars.len());

    // Walk back from the cursor until the window is full (the cursor cell
    // itself needs one column).
    let mut start = cursor_pos;
    let mut used = 1;
    while start > 0 && used + chars[start - 1].1 <= avail {
        start -= 1;
        used += chars[start].1;
    }

    let mut visible = String::new();
    let mut taken = 0;
    for &(c, w) in &chars[start..] {
        if taken + w > avail {
            break;
        }
        visible.push(c);
        taken += w;
    }

    let cursor_offset = chars[start..cursor_pos].iter().map(|&(_, w)| w).sum();
    DisplayText {
        visible,
        cursor_offset,
    }
}
