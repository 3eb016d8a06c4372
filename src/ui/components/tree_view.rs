//! Tree view for project/folder/chat navigation.
//!
//! Works on the filtered `OrganizerView` projection; the draw path
//! never mutates the organizer itself.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{StatefulWidget, Widget},
};
use uuid::Uuid;

use crate::data::OrganizerView;

/// What a visible row refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKind {
    Project { id: Uuid },
    Folder { id: Uuid, project_id: Uuid, open: bool },
    Chat { thread_id: String },
    /// Header above the uncategorized chat list
    Uncategorized,
}

/// One selectable row in the flattened tree
#[derive(Debug, Clone)]
pub struct TreeRow {
    pub kind: RowKind,
    pub label: String,
    pub depth: usize,
}

/// Flatten the filtered tree into display rows. Chats of a closed
/// folder are skipped; the uncategorized section always trails.
pub fn flatten(view: &OrganizerView) -> Vec<TreeRow> {
    let mut rows = Vec::new();

    for project in &view.projects {
        rows.push(TreeRow {
            kind: RowKind::Project { id: project.id },
            label: project.name.clone(),
            depth: 0,
        });
        for folder in &project.folders {
            rows.push(TreeRow {
                kind: RowKind::Folder {
                    id: folder.id,
                    project_id: project.id,
                    open: folder.open,
                },
                label: folder.name.clone(),
                depth: 1,
            });
            if folder.open {
                for chat in &folder.chats {
                    rows.push(TreeRow {
                        kind: RowKind::Chat {
                            thread_id: chat.id.clone(),
                        },
                        label: chat.title.clone(),
                        depth: 2,
                    });
                }
            }
        }
    }

    rows.push(TreeRow {
        kind: RowKind::Uncategorized,
        label: "Uncategorized".to_string(),
        depth: 0,
    });
    for chat in &view.uncategorized {
        rows.push(TreeRow {
            kind: RowKind::Chat {
                thread_id: chat.id.clone(),
            },
            label: chat.title.clone(),
            depth: 1,
        });
    }

    rows
}

/// Selection and scroll state for the tree
#[derive(Debug, Default)]
pub struct TreeViewState {
    pub selected: usize,
    pub scroll_offset: usize,
}

impl TreeViewState {
    pub fn select_next(&mut self, row_count: usize) {
        if row_count > 0 && self.selected + 1 < row_count {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn clamp(&mut self, row_count: usize) {
        if row_count == 0 {
            self.selected = 0;
        } else if self.selected >= row_count {
            self.selected = row_count - 1;
        }
    }
}

/// Widget rendering the flattened rows
pub struct TreeView<'a> {
    rows: &'a [TreeRow],
    /// Thread id to highlight as the active chat
    active_thread: Option<&'a str>,
    focused: bool,
}

impl<'a> TreeView<'a> {
    pub fn new(rows: &'a [TreeRow]) -> Self {
        Self {
            rows,
            active_thread: None,
            focused: false,
        }
    }

    pub fn active_thread(mut self, thread_id: Option<&'a str>) -> Self {
        self.active_thread = thread_id;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    fn row_line(&self, row: &TreeRow, selected: bool) -> Line<'static> {
        let indent = "  ".repeat(row.depth);
        let (marker, base_style) = match &row.kind {
            RowKind::Project { .. } => (
                "▪ ".to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            RowKind::Folder { open, .. } => (
                if *open { "▾ " } else { "▸ " }.to_string(),
                Style::default().fg(Color::Yellow),
            ),
            RowKind::Chat { thread_id } => {
                let active = self.active_thread == Some(thread_id.as_str());
                (
                    if active { "● " } else { "  " }.to_string(),
                    if active {
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default()
                    },
                )
            }
            RowKind::Uncategorized => (
                "▪ ".to_string(),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            ),
        };

        let style = if selected && self.focused {
            base_style.bg(Color::Rgb(45, 50, 60))
        } else {
            base_style
        };

        Line::from(Span::styled(
            format!("{}{}{}", indent, marker, row.label),
            style,
        ))
    }
}

impl StatefulWidget for TreeView<'_> {
    type State = TreeViewState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        state.clamp(self.rows.len());

        // Keep the selection visible
        let visible = area.height as usize;
        if visible == 0 {
            return;
        }
        if state.selected < state.scroll_offset {
            state.scroll_offset = state.selected;
        } else if state.selected >= state.scroll_offset + visible {
            state.scroll_offset = state.selected + 1 - visible;
        }

        for (i, row) in self
            .rows
            .iter()
            .enumerate()
            .skip(state.scroll_offset)
            .take(visible)
        {
            let y = area.y + (i - state.scroll_offset) as u16;
            let line = self.row_line(row, i == state.selected);
            Widget::render(
                ratatui::widgets::Paragraph::new(line),
                Rect::new(area.x, y, area.width, 1),
                buf,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Organizer, OrganizerState, StateStore};
    use tempfile::tempdir;

    fn organizer() -> (tempfile::TempDir, Organizer) {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        store.save(&OrganizerState::default()).unwrap();
        (dir, Organizer::load(store))
    }

    #[test]
    fn flatten_orders_projects_then_uncategorized() {
        let (_dir, mut org) = organizer();
        let project = org.create_project("Acme").unwrap();
        let folder = org.create_folder(project, "Leads").unwrap();
        org.register_or_update_chat("t1", "Filed", Some(folder)).unwrap();
        org.register_or_update_chat("t2", "Loose", None).unwrap();

        let rows = flatten(&org.filter(""));
        let labels: Vec<_> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Acme", "Leads", "Filed", "Uncategorized", "Loose"]);
    }

    #[test]
    fn flatten_hides_chats_of_closed_folders() {
        let (_dir, mut org) = organizer();
        let project = org.create_project("Acme").unwrap();
        let folder = org.create_folder(project, "Leads").unwrap();
        org.register_or_update_chat("t1", "Filed", Some(folder)).unwrap();
        org.set_folder_open(folder, false).unwrap();

        let rows = flatten(&org.filter(""));
        assert!(rows.iter().all(|r| r.label != "Filed"));
        // The folder row itself stays
        assert!(rows
            .iter()
            .any(|r| matches!(r.kind, RowKind::Folder { open: false, .. })));
    }

    #[test]
    fn selection_stays_in_bounds() {
        let mut state = TreeViewState::default();
        state.select_next(2);
        state.select_next(2);
        state.select_next(2);
        assert_eq!(state.selected, 1);
        state.select_prev();
        state.select_prev();
        assert_eq!(state.selected, 0);
    }
}
