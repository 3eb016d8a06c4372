use std::collections::HashSet;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::Config;
use crate::data::{Organizer, StateStore};
use crate::gateway::{Gateway, HttpGateway};
use crate::session::{BridgeError, SessionBridge, SharedOrganizer};
use crate::ui::components::{
    flatten, ChatMessage, ChatView, ChatViewState, Dialog, DialogKind, InputBox, PendingAction,
    RowKind, Sidebar, TreeRow, TreeViewState,
};
use crate::ui::events::{AppEvent, InputMode};

/// Main application state
pub struct App {
    config: Config,
    /// Shared with the session bridge
    organizer: SharedOrganizer,
    bridge: Arc<SessionBridge>,
    should_quit: bool,
    input_mode: InputMode,
    /// Thread shown in the conversation pane
    view_thread: Option<String>,
    /// Messages of the shown thread (transient; authoritative copy is remote)
    messages: Vec<ChatMessage>,
    /// Thread ids with a send in flight
    sending: HashSet<String>,
    search_query: String,
    input_box: InputBox,
    tree_state: TreeViewState,
    chat_state: ChatViewState,
    dialog: Option<Dialog>,
    /// Transient status line, cleared on the next keypress
    status: Option<String>,
    event_tx: mpsc::UnboundedSender<AppEvent>,
    event_rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
    pub fn new(config: Config) -> Self {
        let gateway = Arc::new(HttpGateway::new(config.gateway_url.clone()));
        Self::with_gateway(config, gateway)
    }

    /// Seam for tests: any gateway implementation works
    pub fn with_gateway(config: Config, gateway: Arc<dyn Gateway>) -> Self {
        let store = StateStore::at_default_path();
        let organizer = Arc::new(parking_lot::Mutex::new(Organizer::load(store)));
        let bridge = Arc::new(SessionBridge::new(gateway, Arc::clone(&organizer)));
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Self {
            config,
            organizer,
            bridge,
            should_quit: false,
            input_mode: InputMode::Chat,
            view_thread: None,
            messages: Vec::new(),
            sending: HashSet::new(),
            search_query: String::new(),
            input_box: InputBox::new(),
            tree_state: TreeViewState::default(),
            chat_state: ChatViewState::default(),
            dialog: None,
            status: None,
            event_tx,
            event_rx,
        }
    }

    /// Run the application main loop
    pub async fn run(&mut self) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        self.open_initial_thread();

        let result = self.event_loop(&mut terminal).await;

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;

            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(16)) => {
                    if event::poll(Duration::from_millis(0))? {
                        if let Event::Key(key) = event::read()? {
                            self.handle_key_event(key);
                        }
                    }
                }

                Some(event) = self.event_rx.recv() => {
                    self.handle_app_event(event);
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    // ----- startup -----

    /// Resolve the thread to show on startup: the persisted active
    /// thread when the gateway still knows it, else whatever the
    /// gateway considers current (creating one if none exists).
    fn open_initial_thread(&self) {
        let saved = self.organizer.lock().active_thread_id().map(String::from);
        let bridge = Arc::clone(&self.bridge);
        let tx = self.event_tx.clone();

        tokio::spawn(async move {
            let first_try = match &saved {
                Some(id) => bridge.open_thread(Some(id)).await,
                None => bridge.open_thread(None).await,
            };
            let opened = match first_try {
                Ok(opened) => Ok(opened),
                Err(BridgeError::UnknownThread(_)) => {
                    // Stale pointer: fall back to a fresh thread
                    bridge.open_thread(None).await
                }
                Err(e) => Err(e),
            };
            let event = match opened {
                Ok(opened) => AppEvent::ThreadOpened {
                    thread_id: opened.thread_id,
                    messages: opened.messages,
                },
                Err(e) => AppEvent::OpenFailed { notice: e.notice() },
            };
            let _ = tx.send(event);
        });
    }

    // ----- app events -----

    fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ThreadOpened {
                thread_id,
                messages,
            } => {
                self.view_thread = Some(thread_id);
                self.messages = messages.into_iter().map(ChatMessage::from).collect();
                self.chat_state.scroll_to_bottom();
            }
            AppEvent::OpenFailed { notice } => {
                self.status = Some(notice);
            }
            AppEvent::SwitchRejected { thread_id, notice } => {
                tracing::debug!(thread_id = %thread_id, "Switch rejected");
                self.status = Some(notice);
            }
            AppEvent::SendResolved { thread_id, outcome } => {
                self.sending.remove(&thread_id);
                // A result for a thread the user has navigated away
                // from is dropped, never applied to the current view
                if self.view_thread.as_deref() != Some(thread_id.as_str()) {
                    tracing::debug!(thread_id = %thread_id, "Discarding stale send result");
                    return;
                }
                match outcome {
                    Ok(reply) => self.messages.push(ChatMessage::assistant(reply)),
                    Err(notice) => self.messages.push(ChatMessage::error(notice)),
                }
                self.chat_state.scroll_to_bottom();
            }
            AppEvent::ThreadDeleted { thread_id } => {
                if self.view_thread.as_deref() == Some(thread_id.as_str()) {
                    self.view_thread = None;
                    self.messages.clear();
                    self.status = Some("Conversation removed".to_string());
                }
            }
        }
    }

    // ----- key routing -----

    fn handle_key_event(&mut self, key: KeyEvent) {
        self.status = None;

        // Global shortcuts
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('q') | KeyCode::Char('c') => {
                    self.should_quit = true;
                    return;
                }
                KeyCode::Char('n') => {
                    self.start_new_thread();
                    return;
                }
                _ => {}
            }
        }

        match self.input_mode {
            InputMode::Dialog => self.handle_dialog_key(key),
            InputMode::Search => self.handle_search_key(key),
            InputMode::Sidebar => self.handle_sidebar_key(key),
            InputMode::Chat => self.handle_chat_key(key),
        }
    }

    fn handle_chat_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Tab => self.input_mode = InputMode::Sidebar,
            KeyCode::Enter => self.submit_message(),
            KeyCode::Char(c) => self.input_box.insert_char(c),
            KeyCode::Backspace => self.input_box.backspace(),
            KeyCode::Left => self.input_box.move_left(),
            KeyCode::Right => self.input_box.move_right(),
            KeyCode::Home => self.input_box.move_home(),
            KeyCode::End => self.input_box.move_end(),
            KeyCode::PageUp => self.chat_state.scroll_up(5),
            KeyCode::PageDown => self.chat_state.scroll_down(5),
            _ => {}
        }
    }

    fn handle_sidebar_key(&mut self, key: KeyEvent) {
        let rows = self.visible_rows();
        match key.code {
            KeyCode::Tab | KeyCode::Esc => self.input_mode = InputMode::Chat,
            KeyCode::Up | KeyCode::Char('k') => self.tree_state.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => self.tree_state.select_next(rows.len()),
            KeyCode::Enter => self.activate_selected_row(&rows),
            KeyCode::Char('/') => self.input_mode = InputMode::Search,
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('n') => self.start_new_thread(),
            KeyCode::Char('N') => {
                self.open_dialog(Dialog::prompt(PendingAction::NewProject, "New project", ""));
            }
            KeyCode::Char('f') => self.prompt_new_folder(&rows),
            KeyCode::Char('r') => self.prompt_rename(&rows),
            KeyCode::Char('d') => self.prompt_delete(&rows),
            KeyCode::Char('m') => self.prompt_move(&rows),
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.search_query.clear();
                self.input_mode = InputMode::Sidebar;
            }
            KeyCode::Enter => self.input_mode = InputMode::Sidebar,
            KeyCode::Backspace => {
                self.search_query.pop();
            }
            KeyCode::Char(c) => self.search_query.push(c),
            _ => {}
        }
        self.tree_state.clamp(self.visible_rows().len());
    }

    fn handle_dialog_key(&mut self, key: KeyEvent) {
        let Some(mut dialog) = self.dialog.take() else {
            self.input_mode = InputMode::Sidebar;
            return;
        };

        match (&dialog.kind, key.code) {
            (_, KeyCode::Esc) => {
                self.input_mode = InputMode::Sidebar;
                return;
            }
            (DialogKind::Confirm, KeyCode::Char('n')) => {
                self.input_mode = InputMode::Sidebar;
                return;
            }
            (DialogKind::Confirm, KeyCode::Char('y') | KeyCode::Enter) => {
                self.commit_dialog(dialog);
                return;
            }
            (DialogKind::Prompt { .. }, KeyCode::Enter) => {
                self.commit_dialog(dialog);
                return;
            }
            (DialogKind::Prompt { .. }, KeyCode::Char(c)) => dialog.push_char(c),
            (DialogKind::Prompt { .. }, KeyCode::Backspace) => dialog.pop_char(),
            (DialogKind::Select { .. }, KeyCode::Up) => dialog.select_prev(),
            (DialogKind::Select { .. }, KeyCode::Down) => dialog.select_next(),
            (DialogKind::Select { .. }, KeyCode::Enter) => {
                self.commit_dialog(dialog);
                return;
            }
            _ => {}
        }

        self.dialog = Some(dialog);
    }

    // ----- sidebar actions -----

    fn visible_rows(&self) -> Vec<TreeRow> {
        let organizer = self.organizer.lock();
        flatten(&organizer.filter(&self.search_query))
    }

    fn selected_row<'a>(&self, rows: &'a [TreeRow]) -> Option<&'a TreeRow> {
        rows.get(self.tree_state.selected)
    }

    fn activate_selected_row(&mut self, rows: &[TreeRow]) {
        match self.selected_row(rows).map(|r| r.kind.clone()) {
            Some(RowKind::Folder { id, open, .. }) => {
                if let Err(e) = self.organizer.lock().set_folder_open(id, !open) {
                    self.status = Some(e.to_string());
                }
            }
            Some(RowKind::Chat { thread_id }) => self.start_switch(thread_id),
            _ => {}
        }
    }

    fn start_switch(&mut self, thread_id: String) {
        if self.view_thread.as_deref() == Some(thread_id.as_str()) {
            self.input_mode = InputMode::Chat;
            return;
        }
        let bridge = Arc::clone(&self.bridge);
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let event = match bridge.switch_thread(&thread_id).await {
                Ok(opened) => AppEvent::ThreadOpened {
                    thread_id: opened.thread_id,
                    messages: opened.messages,
                },
                Err(e) => AppEvent::SwitchRejected {
                    thread_id,
                    notice: e.notice(),
                },
            };
            let _ = tx.send(event);
        });
        self.input_mode = InputMode::Chat;
    }

    fn start_new_thread(&mut self) {
        let bridge = Arc::clone(&self.bridge);
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            // The message view is only cleared by the ThreadOpened
            // event, so a failed creation leaves the old thread up
            let event = match bridge.new_thread().await {
                Ok(thread_id) => AppEvent::ThreadOpened {
                    thread_id,
                    messages: Vec::new(),
                },
                Err(e) => AppEvent::OpenFailed { notice: e.notice() },
            };
            let _ = tx.send(event);
        });
        self.input_mode = InputMode::Chat;
    }

    /// Project context of a row, for creating folders
    fn project_of_row(&self, row: &TreeRow) -> Option<Uuid> {
        match &row.kind {
            RowKind::Project { id } => Some(*id),
            RowKind::Folder { project_id, .. } => Some(*project_id),
            _ => None,
        }
    }

    fn prompt_new_folder(&mut self, rows: &[TreeRow]) {
        let Some(project_id) = self.selected_row(rows).and_then(|r| self.project_of_row(r))
        else {
            self.status = Some("Select a project first".to_string());
            return;
        };
        self.open_dialog(Dialog::prompt(
            PendingAction::NewFolder { project_id },
            "New folder",
            "",
        ));
    }

    fn prompt_rename(&mut self, rows: &[TreeRow]) {
        let Some(row) = self.selected_row(rows) else {
            return;
        };
        let dialog = match &row.kind {
            RowKind::Project { id } => Dialog::prompt(
                PendingAction::RenameProject { project_id: *id },
                "Rename project",
                &row.label,
            ),
            RowKind::Folder { id, .. } => Dialog::prompt(
                PendingAction::RenameFolder { folder_id: *id },
                "Rename folder",
                &row.label,
            ),
            RowKind::Chat { thread_id } => Dialog::prompt(
                PendingAction::RenameChat {
                    thread_id: thread_id.clone(),
                },
                "Rename chat",
                &row.label,
            ),
            RowKind::Uncategorized => return,
        };
        self.open_dialog(dialog);
    }

    fn prompt_delete(&mut self, rows: &[TreeRow]) {
        let Some(row) = self.selected_row(rows) else {
            return;
        };
        let dialog = match &row.kind {
            RowKind::Project { id } => Dialog::confirm(
                PendingAction::DeleteProject { project_id: *id },
                format!("Delete project \"{}\"?", row.label),
            ),
            RowKind::Folder { id, .. } => Dialog::confirm(
                PendingAction::DeleteFolder { folder_id: *id },
                format!("Delete folder \"{}\"?", row.label),
            ),
            RowKind::Chat { thread_id } => Dialog::confirm(
                PendingAction::DeleteChat {
                    thread_id: thread_id.clone(),
                },
                format!("Delete chat \"{}\"?", row.label),
            ),
            RowKind::Uncategorized => return,
        };
        self.open_dialog(dialog);
    }

    fn prompt_move(&mut self, rows: &[TreeRow]) {
        let Some(RowKind::Chat { thread_id }) = self.selected_row(rows).map(|r| r.kind.clone())
        else {
            self.status = Some("Select a chat to move".to_string());
            return;
        };

        let mut options: Vec<(String, Option<Uuid>)> =
            vec![("Uncategorized".to_string(), None)];
        {
            let organizer = self.organizer.lock();
            for project in &organizer.state().projects {
                for folder in &project.folders {
                    options.push((
                        format!("{} / {}", project.name, folder.name),
                        Some(folder.id),
                    ));
                }
            }
        }

        self.open_dialog(Dialog::select(
            PendingAction::MoveChat { thread_id },
            "Move chat to",
            options,
        ));
    }

    fn open_dialog(&mut self, dialog: Dialog) {
        self.dialog = Some(dialog);
        self.input_mode = InputMode::Dialog;
    }

    /// Apply a confirmed dialog. Organizer errors become a status
    /// line; the tree is unchanged when one occurs.
    fn commit_dialog(&mut self, dialog: Dialog) {
        self.input_mode = InputMode::Sidebar;

        let text = match &dialog.kind {
            DialogKind::Prompt { buffer } => buffer.clone(),
            _ => String::new(),
        };
        let selection = match &dialog.kind {
            DialogKind::Select { options, selected } => {
                options.get(*selected).map(|(_, target)| *target)
            }
            _ => None,
        };

        let result = {
            let mut organizer = self.organizer.lock();
            match dialog.action {
                PendingAction::NewProject => organizer.create_project(&text).map(|_| ()),
                PendingAction::NewFolder { project_id } => {
                    organizer.create_folder(project_id, &text).map(|_| ())
                }
                PendingAction::RenameProject { project_id } => {
                    organizer.rename_project(project_id, &text)
                }
                PendingAction::RenameFolder { folder_id } => {
                    organizer.rename_folder(folder_id, &text)
                }
                PendingAction::RenameChat { thread_id } => {
                    organizer.rename_chat(&thread_id, &text)
                }
                PendingAction::DeleteProject { project_id } => {
                    organizer.delete_project(project_id)
                }
                PendingAction::DeleteFolder { folder_id } => organizer.delete_folder(folder_id),
                PendingAction::DeleteChat { thread_id } => {
                    drop(organizer);
                    self.start_delete_thread(thread_id);
                    Ok(())
                }
                PendingAction::MoveChat { thread_id } => match selection {
                    Some(target) => organizer.move_chat(&thread_id, target),
                    None => Ok(()),
                },
            }
        };

        if let Err(e) = result {
            self.status = Some(e.to_string());
        }
    }

    fn start_delete_thread(&mut self, thread_id: String) {
        let bridge = Arc::clone(&self.bridge);
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            bridge.delete_thread(&thread_id).await;
            let _ = tx.send(AppEvent::ThreadDeleted { thread_id });
        });
    }

    // ----- sending -----

    fn submit_message(&mut self) {
        let Some(thread_id) = self.view_thread.clone() else {
            self.status = Some("No open conversation; press Ctrl+N for a new chat".to_string());
            return;
        };
        // Composer is guarded while this thread has a send in flight
        if self.sending.contains(&thread_id) {
            return;
        }
        if self.input_box.is_empty() {
            return;
        }

        let text = self.input_box.take();
        // Optimistic bubble; the authoritative copy lands remotely
        self.messages.push(ChatMessage::user(text.clone()));
        self.chat_state.scroll_to_bottom();
        self.sending.insert(thread_id.clone());

        let bridge = Arc::clone(&self.bridge);
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let outcome = bridge
                .send(&thread_id, &text)
                .await
                .map_err(|e| e.notice());
            let _ = tx.send(AppEvent::SendResolved { thread_id, outcome });
        });
    }

    // ----- drawing -----

    fn draw(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(self.config.sidebar_width),
                Constraint::Min(20),
            ])
            .split(f.area());

        let rows = self.visible_rows();
        self.tree_state.clamp(rows.len());

        let active = self.organizer.lock().active_thread_id().map(String::from);
        let sidebar = Sidebar::new(&rows)
            .search_query(&self.search_query, self.input_mode == InputMode::Search)
            .active_thread(active.as_deref())
            .focused(matches!(
                self.input_mode,
                InputMode::Sidebar | InputMode::Search
            ));
        f.render_stateful_widget(sidebar, chunks[0], &mut self.tree_state);

        let main = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(chunks[1]);

        let title = self
            .view_thread
            .as_deref()
            .and_then(|id| self.organizer.lock().chat(id).map(|c| c.title.clone()))
            .unwrap_or_else(|| "Conversation".to_string());
        let waiting = self
            .view_thread
            .as_deref()
            .is_some_and(|id| self.sending.contains(id));
        let chat_view = ChatView::new(&self.messages).title(&title).waiting(waiting);
        f.render_stateful_widget(chat_view, main[0], &mut self.chat_state);

        self.input_box.render(
            main[1],
            f.buffer_mut(),
            self.input_mode == InputMode::Chat,
            !waiting,
        );

        let status_line = match &self.status {
            Some(status) => Line::from(Span::styled(
                status.clone(),
                Style::default().fg(Color::Yellow),
            )),
            None => Line::from(Span::styled(
                "Tab sidebar · Ctrl+N new chat · / search · Ctrl+Q quit",
                Style::default().fg(Color::DarkGray),
            )),
        };
        f.render_widget(Paragraph::new(status_line), main[2]);

        if let Some(dialog) = &self.dialog {
            dialog.render(f.area(), f.buffer_mut());
        }
    }
}
