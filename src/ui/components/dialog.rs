//! Prompt/confirm/select overlay for organizer actions.
//!
//! One dialog is active at a time; while it is up, keys route to it
//! and the action it carries is performed only on confirmation, so
//! every organizer mutation stays behind an explicit user gesture.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use uuid::Uuid;

/// The organizer action a dialog resolves into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    NewProject,
    NewFolder { project_id: Uuid },
    RenameProject { project_id: Uuid },
    RenameFolder { folder_id: Uuid },
    RenameChat { thread_id: String },
    DeleteProject { project_id: Uuid },
    DeleteFolder { folder_id: Uuid },
    DeleteChat { thread_id: String },
    MoveChat { thread_id: String },
}

/// How the dialog collects its answer
#[derive(Debug, Clone)]
pub enum DialogKind {
    /// Free-text prompt with a pre-filled buffer
    Prompt { buffer: String },
    /// Yes/no confirmation
    Confirm,
    /// Pick one target from a list (label, folder id; None = uncategorized)
    Select {
        options: Vec<(String, Option<Uuid>)>,
        selected: usize,
    },
}

/// An open dialog
#[derive(Debug, Clone)]
pub struct Dialog {
    pub action: PendingAction,
    pub kind: DialogKind,
    pub title: String,
}

impl Dialog {
    pub fn prompt(action: PendingAction, title: impl Into<String>, initial: &str) -> Self {
        Self {
            action,
            kind: DialogKind::Prompt {
                buffer: initial.to_string(),
            },
            title: title.into(),
        }
    }

    pub fn confirm(action: PendingAction, title: impl Into<String>) -> Self {
        Self {
            action,
            kind: DialogKind::Confirm,
            title: title.into(),
        }
    }

    pub fn select(
        action: PendingAction,
        title: impl Into<String>,
        options: Vec<(String, Option<Uuid>)>,
    ) -> Self {
        Self {
            action,
            kind: DialogKind::Select {
                options,
                selected: 0,
            },
            title: title.into(),
        }
    }

    pub fn push_char(&mut self, c: char) {
        if let DialogKind::Prompt { buffer } = &mut self.kind {
            buffer.push(c);
        }
    }

    pub fn pop_char(&mut self) {
        if let DialogKind::Prompt { buffer } = &mut self.kind {
            buffer.pop();
        }
    }

    pub fn select_next(&mut self) {
        if let DialogKind::Select { options, selected } = &mut self.kind {
            if !options.is_empty() {
                *selected = (*selected + 1) % options.len();
            }
        }
    }

    pub fn select_prev(&mut self) {
        if let DialogKind::Select { options, selected } = &mut self.kind {
            if !options.is_empty() {
                *selected = selected.checked_sub(1).unwrap_or(options.len() - 1);
            }
        }
    }

    /// Centered overlay rect
    fn overlay_area(area: Rect) -> Rect {
        let width = (area.width.saturating_sub(4)).min(56).max(20);
        let height = 7;
        let x = area.x + (area.width.saturating_sub(width)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;
        Rect::new(x, y, width, height.min(area.height))
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let overlay = Self::overlay_area(area);
        Clear.render(overlay, buf);

        let danger = matches!(
            self.action,
            PendingAction::DeleteProject { .. }
                | PendingAction::DeleteFolder { .. }
                | PendingAction::DeleteChat { .. }
        );
        let border = if danger { Color::Red } else { Color::Cyan };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(format!(" {} ", self.title));
        let inner = block.inner(overlay);
        block.render(overlay, buf);

        let mut lines = Vec::new();
        match &self.kind {
            DialogKind::Prompt { buffer } => {
                lines.push(Line::from(vec![
                    Span::raw(buffer.clone()),
                    Span::styled("▏", Style::default().fg(Color::Cyan)),
                ]));
                lines.push(Line::default());
                lines.push(Line::from(Span::styled(
                    "Enter confirm · Esc cancel",
                    Style::default().fg(Color::DarkGray),
                )));
            }
            DialogKind::Confirm => {
                lines.push(Line::from("This cannot be undone locally."));
                lines.push(Line::default());
                lines.push(Line::from(Span::styled(
                    "y/Enter confirm · n/Esc cancel",
                    Style::default().fg(Color::DarkGray),
                )));
            }
            DialogKind::Select { options, selected } => {
                for (i, (label, _)) in options.iter().enumerate() {
                    let style = if i == *selected {
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default()
                    };
                    lines.push(Line::from(Span::styled(format!("  {}", label), style)));
                }
                lines.push(Line::from(Span::styled(
                    "↑/↓ choose · Enter confirm · Esc cancel",
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(inner, buf);
    }
}
