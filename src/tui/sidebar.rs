//! Conversation list: search box, "No Contacts" banner and one two-line row
//! per conversation.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use super::compose::InputState;
use crate::models::Conversation;
use crate::sync::grouping::local_time;
use crate::sync::{ConversationStore, SyncState};

const SEARCH_PLACEHOLDER: &str = "Search or start a new chat";
const NO_MESSAGES: &str = "No messages yet";

/// Each conversation takes a name line and a preview line.
const ROW_HEIGHT: u16 = 2;

/// Banner: title, hint, dismiss line.
const BANNER_HEIGHT: u16 = 3;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// List navigation and the search query. Conversation data lives in the
/// sync state; this only tracks what the user is doing with it.
pub struct SidebarState {
    pub search: InputState,
    /// Keystrokes go to the search box.
    pub searching: bool,
    /// Index into the filtered list.
    pub selected: usize,
    pub show_banner: bool,
}

impl SidebarState {
    pub fn new(show_banner: bool) -> Self {
        Self {
            search: InputState::default(),
            searching: false,
            selected: 0,
            show_banner,
        }
    }

    /// Conversations that pass the current search query, in stored order.
    pub fn visible<'a>(&self, store: &'a ConversationStore) -> Vec<&'a Conversation> {
        store.filtered(self.search.text())
    }

    /// Id of the highlighted conversation, if any.
    pub fn selected_id(&self, store: &ConversationStore) -> Option<String> {
        self.visible(store).get(self.selected).map(|c| c.id.clone())
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self, count: usize) {
        if self.selected + 1 < count {
            self.selected += 1;
        }
    }

    /// Keep the highlight inside the list after it shrinks.
    pub fn clamp_selection(&mut self, count: usize) {
        if count == 0 {
            self.selected = 0;
        } else if self.selected >= count {
            self.selected = count - 1;
        }
    }

    pub fn dismiss_banner(&mut self) {
        self.show_banner = false;
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render the conversation list into the given area.
pub fn render(
    area: Rect,
    frame: &mut Frame,
    state: &SidebarState,
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
        .title(" Chats ")
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(border_style);

    let mut inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let search_area = Rect::new(inner.x, inner.y, inner.width, 1);
    if let Some(cursor) = render_search(search_area, frame.buffer_mut(), state) {
        frame.set_cursor_position(cursor);
    }
    inner = shrink_top(inner, 1);

    if state.show_banner && inner.height >= BANNER_HEIGHT {
        let banner_area = Rect::new(inner.x, inner.y, inner.width, BANNER_HEIGHT);
        render_banner(banner_area, frame.buffer_mut());
        inner = shrink_top(inner, BANNER_HEIGHT);
    }

    let buf = frame.buffer_mut();

    // Show loading indicator if data hasn't arrived yet.
    if sync.is_loading() && sync.conversations.items().is_empty() {
        render_hint(inner, buf, " Loading...");
        return;
    }

    let items = state.visible(&sync.conversations);
    if items.is_empty() {
        let hint = if sync.conversations.items().is_empty() {
            " No conversations"
        } else {
            " No matching chats"
        };
        render_hint(inner, buf, hint);
        return;
    }

    let rows_fit = (inner.height / ROW_HEIGHT) as usize;
    if rows_fit == 0 {
        return;
    }

    // Compute scroll offset so selected item is visible.
    let scroll_offset = compute_scroll_offset(state.selected, rows_fit, items.len());

    for (row_idx, item_idx) in (scroll_offset..items.len()).take(rows_fit).enumerate() {
        let conv = items[item_idx];
        let ctx = RowCtx {
            area: Rect::new(
                inner.x,
                inner.y + row_idx as u16 * ROW_HEIGHT,
                inner.width,
                ROW_HEIGHT,
            ),
            selected: item_idx == state.selected,
            active: sync.conversations.is_active(&conv.id),
            pane_focused: focused,
        };

        render_item(buf, &ctx, conv);
    }
}

fn shrink_top(area: Rect, by: u16) -> Rect {
    let by = by.min(area.height);
    Rect::new(area.x, area.y + by, area.width, area.height - by)
}

fn render_hint(area: Rect, buf: &mut Buffer, text: &str) {
    if area.height == 0 {
        return;
    }
    let line = Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)));
    Paragraph::new(line).render(Rect::new(area.x, area.y, area.width, 1), buf);
}

/// Draw the search line; returns where the cursor belongs while searching.
fn render_search(area: Rect, buf: &mut Buffer, state: &SidebarState) -> Option<(u16, u16)> {
    let icon = Span::styled(" / ", Style::default().fg(Color::Gray));
    let query = state.search.text();

    let text = if query.is_empty() && !state.searching {
        Span::styled(SEARCH_PLACEHOLDER, Style::default().fg(Color::DarkGray))
    } else {
        Span::styled(query.to_string(), Style::default().fg(Color::White))
    };

    Paragraph::new(Line::from(vec![icon, text]))
        .style(Style::default().bg(Color::Black))
        .render(area, buf);

    if !state.searching {
        return None;
    }
    let before: String = query.chars().take(state.search.cursor_pos).collect();
    let x = area.x + 3 + before.width() as u16;
    Some((x.min(area.right().saturating_sub(1)), area.y))
}

fn render_banner(area: Rect, buf: &mut Buffer) {
    let bg = Style::default().bg(Color::Cyan).fg(Color::Black);
    let lines = vec![
        Line::from(Span::styled(
            " No Contacts",
            bg.add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(" You can import Contacts from Google", bg)),
        Line::from(Span::styled(" x: dismiss", bg.fg(Color::DarkGray))),
    ];
    Paragraph::new(lines).style(bg).render(area, buf);
}

/// Simple scroll offset: keep selected item visible.
fn compute_scroll_offset(selected: usize, height: usize, total: usize) -> usize {
    if total <= height {
        return 0;
    }
    if selected < height {
        return 0;
    }
    let max_offset = total.saturating_sub(height);
    let offset = selected.saturating_sub(height - 1);
    offset.min(max_offset)
}

/// Rendering context for a single conversation row.
struct RowCtx {
    area: Rect,
    selected: bool,
    active: bool,
    pane_focused: bool,
}

/// Style for a row based on selection, active and unread state.
fn item_style(ctx: &RowCtx, has_unread: bool) -> Style {
    let base = if ctx.selected && ctx.pane_focused {
        Style::default()
            .fg(Color::White)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    } else if ctx.active {
        Style::default().fg(Color::White).bg(Color::Rgb(40, 44, 52))
    } else {
        Style::default().fg(Color::Gray)
    };
    if has_unread {
        base.add_modifier(Modifier::BOLD)
    } else {
        base
    }
}

/// Style for the unread badge.
fn badge_style(ctx: &RowCtx) -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::Green)
        .add_modifier(if ctx.selected {
            Modifier::BOLD
        } else {
            Modifier::empty()
        })
}

/// Render one conversation: name and time, then preview and unread badge.
fn render_item(buf: &mut Buffer, ctx: &RowCtx, conv: &Conversation) {
    let has_unread = conv.unread_count > 0;
    let style = item_style(ctx, has_unread);
    let cursor = if ctx.selected { "\u{25BA}" } else { " " };

    let name = format!("{}{}", cursor, conv.display_name());
    let time = conv
        .last_message_timestamp
        .as_ref()
        .map(local_time)
        .unwrap_or_default();
    let time_style = if has_unread {
        style.fg(Color::Green)
    } else {
        style.remove_modifier(Modifier::BOLD)
    };
    let top = Rect::new(ctx.area.x, ctx.area.y, ctx.area.width, 1);
    render_row(buf, top, &name, &time, style, time_style);

    let preview = match conv.last_message.as_deref() {
        Some(text) if !text.trim().is_empty() => text.replace('\n', " "),
        _ => NO_MESSAGES.to_string(),
    };
    let preview = format!("  {}", preview);
    let badge = if has_unread {
        format!(" {} ", conv.unread_count)
    } else {
        String::new()
    };
    let preview_style = style
        .fg(Color::DarkGray)
        .remove_modifier(Modifier::BOLD);
    let bottom = Rect::new(ctx.area.x, ctx.area.y + 1, ctx.area.width, 1);
    render_row(buf, bottom, &preview, &badge, preview_style, badge_style(ctx));
}

/// Render a row with left-aligned text and an optional right-aligned badge.
fn render_row(
    buf: &mut Buffer,
    area: Rect,
    left: &str,
    badge: &str,
    text_style: Style,
    badge_style: Style,
) {
    let width = area.width as usize;
    if width == 0 {
        return;
    }

    // Truncate left text if needed, leaving room for badge + 1 space
    let badge_len = badge.width();
    let max_left = if badge_len > 0 {
        width.saturating_sub(badge_len + 1)
    } else {
        width
    };

    let left_truncated = truncate_to_width(left, max_left);
    let left_len = left_truncated.width();

    // Padding between left text and badge
    let pad = width.saturating_sub(left_len + badge_len);

    let line = Line::from(vec![
        Span::styled(left_truncated, text_style),
        Span::styled(" ".repeat(pad), text_style),
        Span::styled(badge.to_string(), badge_style),
    ]);

    let row_area = Rect::new(area.x, area.y, area.width, 1);
    Paragraph::new(line).render(row_area, buf);
}

/// Cut `text` to at most `max` display columns, marking the cut with "...".
fn truncate_to_width(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let budget = max.saturating_sub(3);
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    if max >= 3 {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::fake;
    use ratatui::{backend::TestBackend, Terminal};

    fn state_with(names: &[(&str, &str)]) -> SyncState {
        let mut sync = SyncState::default();
        let conversations = names
            .iter()
            .map(|(id, name)| fake::conversation(id, name))
            .collect();
        sync.apply_conversations(Ok(conversations));
        sync
    }

    fn screen(sidebar: &SidebarState, sync: &SyncState, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|frame| render(frame.area(), frame, sidebar, sync, true))
            .unwrap();
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..height {
            for x in 0..width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_navigation_stays_in_bounds() {
        let mut sidebar = SidebarState::new(false);
        sidebar.move_up();
        assert_eq!(sidebar.selected, 0);
        sidebar.move_down(2);
        sidebar.move_down(2);
        assert_eq!(sidebar.selected, 1);
        sidebar.clamp_selection(1);
        assert_eq!(sidebar.selected, 0);
        sidebar.clamp_selection(0);
        assert_eq!(sidebar.selected, 0);
    }

    #[test]
    fn test_selected_id_follows_filter() {
        let sync = state_with(&[("c1", "Alice"), ("c2", "Bob"), ("c3", "Alicia")]);
        let mut sidebar = SidebarState::new(false);
        for c in "ali".chars() {
            sidebar.search.insert_char(c);
        }
        sidebar.move_down(2);
        assert_eq!(sidebar.selected_id(&sync.conversations).as_deref(), Some("c3"));
    }

    #[test]
    fn test_render_rows_and_banner() {
        let mut sync = state_with(&[("c1", "Alice")]);
        let mut conv = fake::conversation("c2", "Bob");
        conv.last_message = Some("See you".to_string());
        conv.unread_count = 3;
        let mut list = sync.conversations.items().to_vec();
        list.push(conv);
        sync.apply_conversations(Ok(list));

        let mut sidebar = SidebarState::new(true);
        let text = screen(&sidebar, &sync, 40, 14);
        assert!(text.contains("No Contacts"));
        assert!(text.contains("Alice"));
        assert!(text.contains("No messages yet"));
        assert!(text.contains("See you"));
        assert!(text.contains(" 3 "));

        sidebar.dismiss_banner();
        let text = screen(&sidebar, &sync, 40, 14);
        assert!(!text.contains("No Contacts"));
    }

    #[test]
    fn test_render_loading_and_no_match() {
        let sidebar = SidebarState::new(false);
        let text = screen(&sidebar, &SyncState::default(), 30, 8);
        assert!(text.contains("Loading..."));

        let sync = state_with(&[("c1", "Alice")]);
        let mut sidebar = SidebarState::new(false);
        sidebar.search.insert_char('z');
        let text = screen(&sidebar, &sync, 30, 8);
        assert!(text.contains("No matching chats"));
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("a long name here", 8), "a lon...");
    }
}
