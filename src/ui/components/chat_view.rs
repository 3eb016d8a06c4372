//! Conversation pane: message bubbles for the open thread.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, StatefulWidget, Widget, Wrap},
};

use crate::util::sanitize_display_text;

use super::chat_message::{ChatMessage, MessageRole};

/// Scroll state for the conversation pane
#[derive(Debug, Default)]
pub struct ChatViewState {
    /// Lines scrolled up from the bottom (0 = following the tail)
    pub scroll_from_bottom: u16,
}

impl ChatViewState {
    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(lines);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_from_bottom = 0;
    }
}

/// Widget rendering a thread's messages oldest-first
pub struct ChatView<'a> {
    messages: &'a [ChatMessage],
    title: &'a str,
    /// A reply is pending for the shown thread
    waiting: bool,
}

impl<'a> ChatView<'a> {
    pub fn new(messages: &'a [ChatMessage]) -> Self {
        Self {
            messages,
            title: "Conversation",
            waiting: false,
        }
    }

    pub fn title(mut self, title: &'a str) -> Self {
        self.title = title;
        self
    }

    pub fn waiting(mut self, waiting: bool) -> Self {
        self.waiting = waiting;
        self
    }

    fn role_header(role: MessageRole) -> Line<'static> {
        match role {
            MessageRole::User => Line::from(Span::styled(
                "You",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )),
            MessageRole::Assistant => Line::from(Span::styled(
                "Assistant",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )),
            MessageRole::Error => Line::from(Span::styled(
                "Error",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
        }
    }

    fn body_style(role: MessageRole) -> Style {
        match role {
            MessageRole::Error => Style::default().fg(Color::Red),
            _ => Style::default(),
        }
    }

    /// Build the display lines for all messages. Untrusted content is
    /// sanitized before it reaches the buffer.
    fn lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for message in self.messages {
            lines.push(Self::role_header(message.role));
            let body = sanitize_display_text(&message.content);
            for text_line in body.lines() {
                lines.push(Line::from(Span::styled(
                    text_line.to_string(),
                    Self::body_style(message.role),
                )));
            }
            lines.push(Line::default());
        }
        if self.waiting {
            lines.push(Line::from(Span::styled(
                "Assistant is thinking...",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )));
        }
        lines
    }
}

impl StatefulWidget for ChatView<'_> {
    type State = ChatViewState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", self.title));
        let inner = block.inner(area);
        block.render(area, buf);

        // Empty state: shown exactly when the open thread has no
        // messages (and nothing is pending)
        if self.messages.is_empty() && !self.waiting {
            Paragraph::new(Line::from(Span::styled(
                "No messages yet. Type below to start the conversation.",
                Style::default().fg(Color::DarkGray),
            )))
            .wrap(Wrap { trim: false })
            .render(inner, buf);
            return;
        }

        let lines = self.lines();

        // Estimate wrapped height to anchor the view at the bottom
        let width = inner.width.max(1) as usize;
        let total_rows: usize = lines
            .iter()
            .map(|l| {
                let w = l.width();
                if w == 0 {
                    1
                } else {
                    w.div_ceil(width)
                }
            })
            .sum();

        let visible = inner.height as usize;
        let max_scroll = total_rows.saturating_sub(visible) as u16;
        state.scroll_from_bottom = state.scroll_from_bottom.min(max_scroll);
        let offset = max_scroll - state.scroll_from_bottom;

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((offset, 0))
            .render(inner, buf);
    }
}
