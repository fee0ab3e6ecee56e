//! Thread view: the active conversation's messages as chat bubbles under
//! day separators.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget, Wrap},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::models::{Message, MessageType};
use crate::sync::grouping::{group_by_day, local_time, DayGroup};
use crate::sync::SyncState;

const ENCRYPTION_NOTICE: &str = "\u{1F512} Messages are end-to-end encrypted. No one outside of \
     this chat can read or listen to them.";

/// Marker after the time on the operator's own messages.
const READ_TICKS: &str = "\u{2713}\u{2713}";

/// Fraction of the pane a bubble may use.
const BUBBLE_MAX_PERCENT: usize = 75;

/// Scroll position of the thread, in rendered lines above the newest one.
/// Zero keeps the view pinned to the latest message.
#[derive(Default)]
pub struct MessagesState {
    pub scroll_from_bottom: usize,
}

impl MessagesState {
    /// Scroll towards older messages.
    pub fn scroll_up(&mut self, n: usize) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_add(n);
    }

    /// Scroll towards newer messages.
    pub fn scroll_down(&mut self, n: usize) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(n);
    }

    /// Jump back to the newest message (used when the selection changes).
    pub fn reset(&mut self) {
        self.scroll_from_bottom = 0;
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render the thread view into the given area.
pub fn render(
    area: Rect,
    buf: &mut Buffer,
    state: &MessagesState,
    sync: &SyncState,
    focused: bool,
) {
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
    block.render(area, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let Some(active) = sync.conversations.active() else {
        let line = Line::from(Span::styled(
            " Select a conversation to start chatting",
            Style::default().fg(Color::DarkGray),
        ));
        Paragraph::new(line).render(Rect::new(inner.x, inner.y, inner.width, 1), buf);
        return;
    };

    // First line: who we are talking to.
    let header_area = Rect::new(inner.x, inner.y, inner.width, 1);
    render_person_header(header_area, buf, &active.display_name());

    let notice = Paragraph::new(Line::from(Span::styled(
        ENCRYPTION_NOTICE,
        Style::default().fg(Color::Yellow).add_modifier(Modifier::DIM),
    )))
    .centered()
    .wrap(Wrap { trim: true });
    let notice_height = if ENCRYPTION_NOTICE.width() <= inner.width as usize {
        1
    } else {
        2
    };
    let notice_area = Rect::new(
        inner.x,
        inner.y + 1,
        inner.width,
        notice_height.min(inner.height.saturating_sub(1)),
    );
    notice.render(notice_area, buf);

    let used = 1 + notice_area.height;
    let messages_area = Rect::new(
        inner.x,
        inner.y + used,
        inner.width,
        inner.height.saturating_sub(used),
    );

    if messages_area.height == 0 {
        return;
    }

    let messages = sync.messages.items();
    if messages.is_empty() {
        // Nothing fetched for this conversation yet.
        let (hint, color) = if sync.messages.conversation_id() == Some(active.id.as_str()) {
            ("No messages yet", Color::DarkGray)
        } else if sync.messages.failed() {
            ("Failed to load messages", Color::Red)
        } else {
            ("Loading messages...", Color::DarkGray)
        };
        let line = Line::from(Span::styled(hint, Style::default().fg(color)));
        let hint_area = Rect::new(messages_area.x, messages_area.y, messages_area.width, 1);
        Paragraph::new(line).centered().render(hint_area, buf);
        return;
    }

    let groups = group_by_day(messages);
    let all_lines = build_thread_lines(&groups, messages_area.width as usize);
    let total_lines = all_lines.len();
    let visible_height = messages_area.height as usize;

    let scroll = compute_scroll(state.scroll_from_bottom, visible_height, total_lines);

    // Render visible lines.
    for (row, line_idx) in (scroll..total_lines).take(visible_height).enumerate() {
        let y = messages_area.y + row as u16;
        let line_area = Rect::new(messages_area.x, y, messages_area.width, 1);
        Paragraph::new(all_lines[line_idx].clone()).render(line_area, buf);
    }

    // Render scroll indicators.
    if total_lines > visible_height {
        let indicator_x = messages_area.x + messages_area.width.saturating_sub(1);
        if scroll > 0 {
            let cell = &mut buf[(indicator_x, messages_area.y)];
            cell.set_char('^');
            cell.set_style(Style::default().fg(Color::DarkGray));
        }
        if scroll + visible_height < total_lines {
            let bottom_y = messages_area.y + messages_area.height.saturating_sub(1);
            let cell = &mut buf[(indicator_x, bottom_y)];
            cell.set_char('v');
            cell.set_style(Style::default().fg(Color::DarkGray));
        }
    }
}

/// Render the person header line.
fn render_person_header(area: Rect, buf: &mut Buffer, name: &str) {
    let line = Line::from(vec![Span::styled(
        format!(" {} ", name),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    )]);
    Paragraph::new(line)
        .style(Style::default().bg(Color::DarkGray))
        .render(area, buf);
}

/// Flatten day groups into display lines: a centred separator per day and
/// a bubble per message.
fn build_thread_lines(groups: &[DayGroup<'_>], width: usize) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for group in groups {
        let label = format!(" {} ", group.label);
        let pad = width.saturating_sub(label.width()) / 2;
        lines.push(Line::from(vec![
            Span::raw(" ".repeat(pad)),
            Span::styled(
                label,
                Style::default()
                    .fg(Color::Gray)
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            ),
        ]));
        lines.push(Line::from(""));

        for msg in &group.messages {
            render_bubble(&mut lines, msg, width);
            lines.push(Line::from(""));
        }
    }

    lines
}

/// Render one message as a padded block, right-aligned for the operator.
fn render_bubble(lines: &mut Vec<Line<'static>>, msg: &Message, width: usize) {
    let own = msg.sender.is_operator();
    let max_bubble = (width * BUBBLE_MAX_PERCENT / 100).max(12).min(width);
    // One column of padding each side.
    let text_width = max_bubble.saturating_sub(2);
    if text_width == 0 {
        return;
    }

    let meta = if own {
        format!("{} {}", local_time(&msg.timestamp), READ_TICKS)
    } else {
        local_time(&msg.timestamp)
    };

    let body = wrap_text(&msg.display_text(), text_width);
    let inner_width = body
        .iter()
        .map(|l| l.width())
        .chain(std::iter::once(meta.width()))
        .max()
        .unwrap_or(0)
        .min(text_width);
    let bubble_width = inner_width + 2;
    let indent = if own {
        width.saturating_sub(bubble_width)
    } else {
        0
    };

    let bubble_style = if own {
        Style::default().fg(Color::White).bg(Color::Rgb(0, 92, 75))
    } else {
        Style::default().fg(Color::White).bg(Color::Rgb(32, 44, 51))
    };
    let body_style = if msg.kind == MessageType::Text {
        bubble_style
    } else {
        bubble_style.add_modifier(Modifier::ITALIC)
    };
    let meta_style = if own {
        bubble_style.fg(Color::LightBlue)
    } else {
        bubble_style.fg(Color::Gray)
    };

    for text in body {
        let pad = inner_width.saturating_sub(text.width());
        lines.push(Line::from(vec![
            Span::raw(" ".repeat(indent)),
            Span::styled(format!(" {}{} ", text, " ".repeat(pad)), body_style),
        ]));
    }

    let meta_pad = inner_width.saturating_sub(meta.width());
    lines.push(Line::from(vec![
        Span::raw(" ".repeat(indent)),
        Span::styled(format!(" {}", " ".repeat(meta_pad)), bubble_style),
        Span::styled(format!("{} ", meta), meta_style),
    ]));
}

/// Word-wrapping by display width: split on newlines first, then wrap long
/// lines at spaces. Words wider than the line are broken mid-word.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 {
        return vec![];
    }
    let mut result = Vec::new();
    for line in text.lines() {
        if line.width() <= max_width {
            result.push(line.to_string());
            continue;
        }
        let mut current = String::new();
        for word in line.split_whitespace() {
            for piece in split_word(word, max_width) {
                if current.is_empty() {
                    current = piece;
                } else if current.width() + 1 + piece.width() <= max_width {
                    current.push(' ');
                    current.push_str(&piece);
                } else {
                    result.push(std::mem::take(&mut current));
                    current = piece;
                }
            }
        }
        if !current.is_empty() {
            result.push(current);
        }
    }
    result
}

/// Break a single word into chunks no wider than `max_width`.
fn split_word(word: &str, max_width: usize) -> Vec<String> {
    if word.width() <= max_width {
        return vec![word.to_string()];
    }
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut used = 0;
    for c in word.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max_width && !current.is_empty() {
            pieces.push(std::mem::take(&mut current));
            used = 0;
        }
        current.push(c);
        used += w;
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// First visible line given how far the user scrolled up from the bottom.
fn compute_scroll(from_bottom: usize, visible_height: usize, total_lines: usize) -> usize {
    let max_scroll = total_lines.saturating_sub(visible_height);
    max_scroll.saturating_sub(from_bottom)
}
