//! Conversation history display component

use crate::commands::{SUGGESTIONS, first_command, has_code_block, is_command_line};
use crate::events::{ConversationRole, Message};
use crate::timefmt::relative_label;
use chrono::{DateTime, Utc};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Scrollable view over the transcript.
///
/// Holds only the scroll position; messages are passed in on every render so
/// timestamps are always computed against the current time.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    /// Lines scrolled up from the bottom
    scroll_offset: usize,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }

    pub fn render(
        &self,
        messages: &[Message],
        now: DateTime<Utc>,
        show_suggestions: bool,
        area: Rect,
        buf: &mut Buffer,
    ) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("☸ Docker & Kubernetes Assistant");

        let inner_area = block.inner(area);
        block.render(area, buf);

        let width = inner_area.width.saturating_sub(2) as usize;
        let mut all_lines: Vec<Line<'static>> = Vec::new();
        for message in messages {
            all_lines.extend(message_lines(message, now, width));
            all_lines.push(Line::from(""));
        }

        // Only the seeded welcome message so far
        if show_suggestions && messages.len() == 1 && !messages[0].from_user() {
            all_lines.extend(suggestion_lines());
        }

        let height = inner_area.height as usize;
        let total = all_lines.len();
        let max_offset = total.saturating_sub(height);
        let offset = self.scroll_offset.min(max_offset);
        let start = total.saturating_sub(height + offset);
        let end = (start + height).min(total);

        for (i, line) in all_lines[start..end].iter().enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}

/// Render a single message into lines
pub fn message_lines(message: &Message, now: DateTime<Utc>, width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let role = message.role();

    let role_icon = match role {
        ConversationRole::User => "👤",
        ConversationRole::Assistant => "🤖",
    };
    let timestamp = relative_label(message.created_at(), now);

    lines.push(Line::from(vec![
        Span::styled(
            format!("{} {}", role_icon, role.display_name()),
            content_style(role).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" · {}", timestamp), Style::default().fg(Color::DarkGray)),
    ]));

    let fenced = has_code_block(message.content());
    let mut in_fence = false;
    for raw_line in message.content().split('\n') {
        let raw_line = raw_line.trim_end_matches('\r');
        let is_fence = raw_line.trim_start().starts_with("```");

        let style = if fenced && (is_fence || in_fence) {
            Style::default().fg(Color::Cyan)
        } else if is_command_line(raw_line.trim()) {
            Style::default().fg(Color::Magenta)
        } else {
            content_style(role)
        };

        let wrapped = if in_fence {
            hard_wrap(raw_line, width)
        } else {
            wrap_text(raw_line, width)
        };
        for segment in wrapped {
            lines.push(Line::from(vec![Span::raw("  "), Span::styled(segment, style)]));
        }

        if is_fence {
            in_fence = !in_fence;
        }
    }

    if role == ConversationRole::Assistant {
        if let Some(command) = first_command(message.content()) {
            lines.push(Line::from(vec![
                Span::styled("  ⧉ copy: ", Style::default().fg(Color::DarkGray)),
                Span::styled(command, Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)),
            ]));
        }
    }

    lines
}

fn suggestion_lines() -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        "Suggestions (/suggest <n>):",
        Style::default().fg(Color::Gray),
    ))];
    for (i, suggestion) in SUGGESTIONS.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!("  {}. ", i + 1), Style::default().fg(Color::DarkGray)),
            Span::styled(*suggestion, Style::default().fg(Color::Blue)),
        ]));
    }
    lines
}

/// Get content style based on role
fn content_style(role: ConversationRole) -> Style {
    match role {
        ConversationRole::User => Style::default().fg(Color::Blue),
        ConversationRole::Assistant => Style::default().fg(Color::Green),
    }
}

/// Word-wrap one line, keeping its indentation
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 || text.width() <= width {
        return vec![text.to_string()];
    }

    let indent: String = text.chars().take_while(|c| c.is_whitespace()).collect();
    let mut lines = Vec::new();
    let mut current_line = indent.clone();

    for word in text.split_whitespace() {
        let current_len = current_line.width();
        let word_len = word.width();
        let at_line_start = current_line.trim().is_empty();

        if at_line_start {
            if current_len + word_len <= width {
                current_line.push_str(word);
                continue;
            }
        } else if current_len + 1 + word_len <= width {
            current_line.push(' ');
            current_line.push_str(word);
            continue;
        }

        if !at_line_start {
            lines.push(std::mem::take(&mut current_line));
        }
        // A single word longer than the width is split hard
        let mut pieces = hard_wrap(word, width);
        let last = pieces.pop().unwrap_or_default();
        lines.extend(pieces);
        current_line = last;
    }

    if !current_line.trim().is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

/// Split on display width, for code where whitespace matters
pub fn hard_wrap(text: &str, width: usize) -> Vec<String> {
    if width == 0 || text.is_empty() {
        return vec![text.to_string()];
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;
    for c in text.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > width && !current.is_empty() {
            pieces.push(std::mem::take(&mut current));
            current_width = 0;
        }
        current.push(c);
        current_width += char_width;
    }
    pieces.push(current);
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn header_shows_role_and_relative_time() {
        let now = Utc::now();
        let message = Message::restore("hello", true, now - Duration::seconds(125));
        let lines = message_lines(&message, now, 80);
        assert_eq!(line_text(&lines[0]), "👤 You · 2m ago");
        assert_eq!(line_text(&lines[1]), "  hello");
    }

    #[test]
    fn assistant_messages_offer_first_command() {
        let now = Utc::now();
        let message = Message::restore("Try:\n  kubectl get pods -A\ndocker ps", false, now);
        let lines = message_lines(&message, now, 80);
        let last = line_text(lines.last().unwrap());
        assert_eq!(last, "  ⧉ copy: kubectl get pods -A");
    }

    #[test]
    fn user_messages_have_no_copy_line() {
        let now = Utc::now();
        let message = Message::restore("kubectl get pods", true, now);
        let lines = message_lines(&message, now, 80);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn newlines_are_preserved() {
        let now = Utc::now();
        let message = Message::restore("one\n\nthree", false, now);
        let lines = message_lines(&message, now, 80);
        assert_eq!(lines.len(), 4);
        assert_eq!(line_text(&lines[2]), "  ");
    }

    #[test]
    fn wrap_text_breaks_on_words() {
        assert_eq!(wrap_text("alpha beta gamma", 10), vec!["alpha beta", "gamma"]);
        assert_eq!(wrap_text("short", 10), vec!["short"]);
        assert_eq!(wrap_text("abcdefghijkl", 5), vec!["abcde", "fghij", "kl"]);
    }

    #[test]
    fn hard_wrap_keeps_spaces() {
        assert_eq!(hard_wrap("  a b c", 3), vec!["  a", " b ", "c"]);
        assert_eq!(hard_wrap("", 3), vec![""]);
    }

    #[test]
    fn wide_glyphs_wrap_by_display_width() {
        assert_eq!(wrap_text("日本語 テキスト", 6), vec!["日本語", "テキス", "ト"]);
        assert_eq!(hard_wrap("ab日本", 3), vec!["ab", "日", "本"]);

        for line in wrap_text(crate::session::WELCOME_MESSAGE, 12) {
            assert!(line.width() <= 12, "{line:?} overflows");
        }
    }

    #[test]
    fn render_shows_latest_lines() {
        let now = Utc::now();
        let messages: Vec<Message> = (0..20)
            .map(|i| Message::restore(format!("message {i}"), i % 2 == 0, now))
            .collect();
        let area = Rect::new(0, 0, 40, 8);
        let mut buf = Buffer::empty(area);

        ConversationHistory::new().render(&messages, now, true, area, &mut buf);

        let rendered: String = (0..area.height)
            .map(|y| (0..area.width).map(|x| buf.get(x, y).symbol().to_string()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n");
        assert!(rendered.contains("message 19"));
        assert!(!rendered.contains("message 0 "));
    }
}
