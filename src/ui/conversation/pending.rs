use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
};
use std::time::{SystemTime, UNIX_EPOCH};

/// "Assistant is typing" line shown while a reply is pending
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingIndicator;

impl PendingIndicator {
    /// Dots cycle every 300ms
    pub fn dots(millis: u128) -> &'static str {
        match (millis / 300) % 4 {
            0 => ".",
            1 => "..",
            2 => "...",
            _ => "   ",
        }
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }

        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();

        let indicator = Line::from(vec![
            Span::styled("🤖 ", Style::default().fg(Color::Green)),
            Span::styled("Assistant is typing", Style::default().fg(Color::Green)),
            Span::styled(Self::dots(millis), Style::default().fg(Color::Yellow)),
        ]);
        buf.set_line(area.x, area.y, &indicator, area.width);
    }
}
