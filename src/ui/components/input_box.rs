//! Message composer with cursor editing.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

/// Text input for the chat composer
#[derive(Debug, Default)]
pub struct InputBox {
    /// Current input text
    input: String,
    /// Cursor position (byte offset)
    cursor_pos: usize,
}

impl InputBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_empty(&self) -> bool {
        self.input.trim().is_empty()
    }

    /// Take the input, resetting the composer
    pub fn take(&mut self) -> String {
        self.cursor_pos = 0;
        std::mem::take(&mut self.input)
    }

    pub fn insert_char(&mut self, c: char) {
        self.input.insert(self.cursor_pos, c);
        self.cursor_pos += c.len_utf8();
    }

    pub fn backspace(&mut self) {
        if self.cursor_pos == 0 {
            return;
        }
        let prev = self.input[..self.cursor_pos]
            .char_indices()
            .last()
            .map(|(i, _)| i)
            .unwrap_or(0);
        self.input.remove(prev);
        self.cursor_pos = prev;
    }

    pub fn move_left(&mut self) {
        if let Some((i, _)) = self.input[..self.cursor_pos].char_indices().last() {
            self.cursor_pos = i;
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor_pos < self.input.len() {
            let c = self.input[self.cursor_pos..]
                .chars()
                .next()
                .map(|c| c.len_utf8())
                .unwrap_or(0);
            self.cursor_pos += c;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor_pos = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor_pos = self.input.len();
    }

    /// Render the composer. When `enabled` is false the border dims
    /// and a waiting hint replaces the cursor; input is ignored while
    /// a send is in flight for the shown thread.
    pub fn render(&self, area: Rect, buf: &mut Buffer, focused: bool, enabled: bool) {
        let border_style = if !enabled {
            Style::default().fg(Color::DarkGray)
        } else if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::Gray)
        };
        let title = if enabled {
            " Message "
        } else {
            " Waiting for reply... "
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title);
        let inner = block.inner(area);
        block.render(area, buf);

        let style = if enabled {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let before = &self.input[..self.cursor_pos];
        let after = &self.input[self.cursor_pos..];
        let mut spans = vec![Span::styled(before.to_string(), style)];
        if focused && enabled {
            spans.push(Span::styled("▏", Style::default().fg(Color::Cyan)));
        }
        spans.push(Span::styled(after.to_string(), style));

        // Keep the cursor in view when the line outgrows the box
        let used = before.width() as u16;
        let scroll = used.saturating_sub(inner.width.saturating_sub(2));
        Paragraph::new(Line::from(spans))
            .scroll((0, scroll))
            .render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_take() {
        let mut input = InputBox::new();
        for c in "hello".chars() {
            input.insert_char(c);
        }
        assert_eq!(input.input(), "hello");
        assert_eq!(input.take(), "hello");
        assert!(input.is_empty());
    }

    #[test]
    fn backspace_handles_multibyte() {
        let mut input = InputBox::new();
        input.insert_char('é');
        input.insert_char('x');
        input.backspace();
        input.backspace();
        assert_eq!(input.input(), "");
        input.backspace(); // no-op at start
        assert_eq!(input.input(), "");
    }

    #[test]
    fn cursor_moves_by_char() {
        let mut input = InputBox::new();
        input.insert_char('a');
        input.insert_char('é');
        input.move_left();
        input.insert_char('b');
        assert_eq!(input.input(), "abé");
    }
}
