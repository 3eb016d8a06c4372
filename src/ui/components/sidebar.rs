//! Sidebar: search line plus the project/folder/chat tree.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, StatefulWidget, Widget},
};

use super::tree_view::{TreeRow, TreeView, TreeViewState};

/// Sidebar widget for chat navigation
pub struct Sidebar<'a> {
    rows: &'a [TreeRow],
    search_query: &'a str,
    searching: bool,
    active_thread: Option<&'a str>,
    focused: bool,
}

impl<'a> Sidebar<'a> {
    pub fn new(rows: &'a [TreeRow]) -> Self {
        Self {
            rows,
            search_query: "",
            searching: false,
            active_thread: None,
            focused: false,
        }
    }

    pub fn search_query(mut self, query: &'a str, searching: bool) -> Self {
        self.search_query = query;
        self.searching = searching;
        self
    }

    pub fn active_thread(mut self, thread_id: Option<&'a str>) -> Self {
        self.active_thread = thread_id;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

impl StatefulWidget for Sidebar<'_> {
    type State = TreeViewState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(" Projects ");
        let inner = block.inner(area);
        block.render(area, buf);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(inner);

        // Search line: dimmed hint when idle, live query otherwise
        let search_line = if self.searching || !self.search_query.is_empty() {
            Line::from(vec![
                Span::styled("/ ", Style::default().fg(Color::Yellow)),
                Span::raw(self.search_query.to_string()),
                if self.searching {
                    Span::styled("▏", Style::default().add_modifier(Modifier::SLOW_BLINK))
                } else {
                    Span::raw("")
                },
            ])
        } else {
            Line::from(Span::styled(
                "/ to search",
                Style::default().fg(Color::DarkGray),
            ))
        };
        Paragraph::new(search_line).render(chunks[0], buf);

        TreeView::new(self.rows)
            .active_thread(self.active_thread)
            .focused(self.focused)
            .render(chunks[1], buf, state);
    }
}
