//! Root application component
//!
//! The App struct implements the Component trait, acting as the root component
//! that delegates event handling and rendering to child components.
//! It owns the session, the history snapshot and the current view, and is the
//! only place where finished background requests are applied.

use crate::action::Action;
use crate::component::Component;
use crate::components::login::LOGIN_FAILED;
use crate::components::register::{REGISTERED, REGISTER_FAILED};
use crate::components::{
    calculate_main_layout, help_bar, AlertDialog, ConfirmDeleteDialog, DashboardComponent,
    HelpDialog, LoginComponent, QuitDialog, RegisterComponent, SidebarComponent, UploadComponent,
};
use crate::config::Config;
use crate::model::dashboard::DashboardState;
use crate::model::modal::{Modal, ModalStack};
use crate::model::session::validate_registration;
use crate::model::{AuthScreen, AuthSession, DatasetHistory, DatasetId, View};
use crate::services::report::{ReportJob, EXPORT_FAILED};
use crate::services::{ApiError, Dispatcher, HistoryPoller, Request, Response};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub const DELETE_FAILED: &str = "Failed to delete dataset";
const SESSION_EXPIRED: &str = "Your session has expired. Please login again.";

// ═══════════════════════════════════════════════════════════════════════════════
// App Struct
// ═══════════════════════════════════════════════════════════════════════════════

/// Main application state - coordinates between components
pub struct App {
    pub config: Config,

    /// Credentials and the authenticated flag
    pub auth: AuthSession,

    /// Screen on display; carries the selected dataset
    pub view: View,

    /// Newest-first dataset list
    pub history: DatasetHistory,

    /// Summary of the selected dataset
    pub summary: Option<DashboardState>,

    /// Modal overlay stack
    pub modals: ModalStack,

    /// Background request runner
    dispatcher: Dispatcher,

    /// Periodic history refresh; present exactly while authenticated
    poller: Option<HistoryPoller>,

    /// A report export is running
    report_in_flight: bool,

    /// Flag to indicate the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Child Components
    // ─────────────────────────────────────────────────────────────────────────
    pub login: LoginComponent,
    pub register: RegisterComponent,
    pub upload: UploadComponent,
    pub dashboard: DashboardComponent,
    pub sidebar: SidebarComponent,
    pub quit_dialog: QuitDialog,
    pub confirm_delete_dialog: ConfirmDeleteDialog,
    pub alert_dialog: AlertDialog,
    pub help_dialog: HelpDialog,
}

// ═══════════════════════════════════════════════════════════════════════════════
// App Lifecycle
// ═══════════════════════════════════════════════════════════════════════════════

impl App {
    pub fn new(config: Config, auth: AuthSession, dispatcher: Dispatcher) -> App {
        let view = View::initial(auth.is_authenticated());
        let dashboard = DashboardComponent::new(config.trend_rows, config.preview_rows);
        App {
            config,
            auth,
            view,
            history: DatasetHistory::new(),
            summary: None,
            modals: ModalStack::new(),
            dispatcher,
            poller: None,
            report_in_flight: false,
            should_quit: false,
            status_message: None,
            login: LoginComponent::new(),
            register: RegisterComponent::new(),
            upload: UploadComponent::new(),
            dashboard,
            sidebar: SidebarComponent::new(),
            quit_dialog: QuitDialog,
            confirm_delete_dialog: ConfirmDeleteDialog,
            alert_dialog: AlertDialog,
            help_dialog: HelpDialog::default(),
        }
    }

    /// Start polling for the current epoch and fetch history right away
    fn start_session(&mut self) {
        self.poller = Some(HistoryPoller::start(
            self.dispatcher.api(),
            self.dispatcher.sender(),
            self.dispatcher.tickets(),
            self.auth.epoch(),
            self.config.poll_interval(),
        ));
        self.refresh_history();
    }

    fn refresh_history(&mut self) {
        if !self.auth.is_authenticated() {
            return;
        }
        let ticket = self.dispatcher.next_ticket();
        self.dispatcher.submit(Request::ListHistory {
            epoch: self.auth.epoch(),
            ticket,
        });
    }

    /// Single path out of the authenticated state, for explicit logout and
    /// for any request the server rejects as unauthorized
    pub fn logout_cascade(&mut self, reason: &str) {
        let was_authenticated = self.auth.clear();
        self.poller = None;
        self.history.clear();
        self.summary = None;
        self.dashboard.clear();
        self.upload.reset();
        self.sidebar.reset();
        self.modals.clear();
        self.status_message = None;
        self.login.reset();
        self.register.reset();
        self.view = View::LoggedOut(AuthScreen::Login);
        if was_authenticated {
            tracing::info!("logged out: {}", reason);
        }
    }

    /// Responses only count for the session that sent the request
    fn is_current(&self, epoch: u64) -> bool {
        self.auth.is_authenticated() && epoch == self.auth.epoch()
    }

    fn handle_unauthorized(&mut self) {
        if self.auth.is_authenticated() {
            self.logout_cascade("server rejected the access token");
            self.login.error = Some(SESSION_EXPIRED.to_string());
        }
    }

    fn select_dataset(&mut self, dataset_id: DatasetId) {
        if !self.auth.is_authenticated() {
            return;
        }
        let ticket = self.dispatcher.next_ticket();
        let state = DashboardState::loading(dataset_id, ticket);
        self.dashboard.show(state.summary());
        self.summary = Some(state);
        self.view = View::Dashboard { dataset_id };
        self.sidebar.highlight(&self.history, dataset_id);
        self.dispatcher.submit(Request::FetchSummary {
            epoch: self.auth.epoch(),
            dataset_id,
            ticket,
        });
    }

    fn show_upload(&mut self) {
        if !self.auth.is_authenticated() {
            return;
        }
        self.view = View::Upload;
        self.summary = None;
        self.dashboard.clear();
    }

    fn request_delete(&mut self) {
        if let Some(dataset_id) = self.sidebar.highlighted(&self.history) {
            self.modals.push(Modal::ConfirmDelete {
                dataset_id,
                label: format!("Dataset #{}", self.history.display_label(dataset_id)),
            });
        }
    }

    /// A delete prompt for a dataset that is no longer listed has nothing to act on
    fn dismiss_vanished_prompts(&mut self) {
        if let Some(Modal::ConfirmDelete { dataset_id, .. }) = self.modals.top() {
            if !self.history.contains(*dataset_id) {
                self.modals.dismiss_dataset_prompts();
            }
        }
    }

    fn export_pdf(&mut self) {
        if self.report_in_flight {
            tracing::debug!("export already running");
            return;
        }
        let Some(state) = self.summary.as_ref() else {
            return;
        };
        let Some(detail) = state.detail() else {
            return;
        };
        let job = ReportJob {
            detail: detail.clone(),
            dataset_label: self.history.display_label(state.dataset_id()),
            output_dir: self.config.report_dir(),
            table_rows: self.config.report_rows,
            trend_rows: self.config.trend_rows,
        };
        self.report_in_flight = true;
        self.status_message = Some("Generating PDF...".to_string());
        self.dispatcher.submit(Request::ExportReport(Box::new(job)));
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Background Responses
    // ═══════════════════════════════════════════════════════════════════════════

    fn apply_response(&mut self, response: Response) {
        match response {
            Response::LoggedIn(result) => {
                if !self.view.is_logged_out() || !self.login.is_busy() {
                    return;
                }
                match result {
                    Ok(session) => match self.auth.establish(&session) {
                        Ok(()) => {
                            tracing::info!("logged in");
                            self.login.reset();
                            self.view = View::Upload;
                            self.start_session();
                        }
                        Err(e) => {
                            tracing::error!("could not store session: {:#}", e);
                            self.login.fail(format!("Could not store session: {}", e));
                        }
                    },
                    Err(e) => {
                        tracing::warn!("login failed: {}", e);
                        self.login.fail(e.user_message(LOGIN_FAILED));
                    }
                }
            }
            Response::Registered(result) => {
                if !self.register.is_busy() {
                    return;
                }
                match result {
                    Ok(()) => {
                        self.register.reset();
                        if self.view.is_logged_out() {
                            self.view = View::LoggedOut(AuthScreen::Login);
                            self.modals.push(Modal::alert("Success", REGISTERED));
                        }
                    }
                    Err(e) => {
                        tracing::warn!("registration failed: {}", e);
                        self.register.fail(e.user_message(REGISTER_FAILED));
                    }
                }
            }
            Response::Uploaded { epoch, result } => {
                if !self.is_current(epoch) || !self.upload.form.is_uploading() {
                    return;
                }
                match result {
                    Ok(record) => {
                        tracing::info!("uploaded dataset {}", record.id);
                        self.upload.form.finish_success();
                        self.select_dataset(record.id);
                        self.refresh_history();
                    }
                    Err(ApiError::Unauthorized) => self.handle_unauthorized(),
                    Err(e) => {
                        tracing::warn!("upload failed: {}", e);
                        self.upload.form.finish_failure();
                    }
                }
            }
            Response::HistoryLoaded {
                epoch,
                ticket,
                result,
            } => {
                if !self.is_current(epoch) {
                    tracing::debug!("discarding history from epoch {}", epoch);
                    return;
                }
                match result {
                    Ok(records) => {
                        if self.history.apply(ticket, records) {
                            self.sidebar.sync(self.history.len());
                            self.dismiss_vanished_prompts();
                        }
                    }
                    Err(ApiError::Unauthorized) => self.handle_unauthorized(),
                    Err(e) => tracing::warn!("history refresh failed: {}", e),
                }
            }
            Response::SummaryLoaded {
                epoch,
                dataset_id,
                ticket,
                result,
            } => {
                if !self.is_current(epoch) {
                    tracing::debug!("discarding summary from epoch {}", epoch);
                    return;
                }
                if matches!(result, Err(ApiError::Unauthorized)) {
                    self.handle_unauthorized();
                    return;
                }
                if let Err(ref e) = result {
                    tracing::warn!("summary for dataset {} failed: {}", dataset_id, e);
                }
                if let Some(state) = self.summary.as_mut() {
                    if state.apply(dataset_id, ticket, result) {
                        self.dashboard.show(state.summary());
                    }
                }
            }
            Response::Deleted {
                epoch,
                dataset_id,
                result,
            } => {
                if !self.is_current(epoch) {
                    tracing::debug!("discarding delete result from epoch {}", epoch);
                    return;
                }
                match result {
                    Ok(()) => {
                        tracing::info!("deleted dataset {}", dataset_id);
                        if self.view.selected_dataset() == Some(dataset_id) {
                            self.show_upload();
                        }
                        self.refresh_history();
                    }
                    Err(ApiError::Unauthorized) => self.handle_unauthorized(),
                    Err(e) => {
                        tracing::warn!("delete of dataset {} failed: {}", dataset_id, e);
                        self.modals.push(Modal::alert("Error", DELETE_FAILED));
                    }
                }
            }
            Response::ReportFinished(result) => {
                self.report_in_flight = false;
                self.status_message = None;
                match result {
                    Ok(outcome) => {
                        tracing::info!(
                            "report written to {} ({} pages)",
                            outcome.path.display(),
                            outcome.pages
                        );
                        let mut message = format!("Report saved to {}", outcome.path.display());
                        for skipped in &outcome.skipped_captures {
                            message.push_str(&format!(" ({} skipped)", skipped.chart));
                        }
                        if self.auth.is_authenticated() {
                            self.status_message = Some(message.clone());
                            self.modals.push(Modal::alert("Report saved", message));
                        }
                    }
                    Err(e) => {
                        tracing::error!("report export failed: {}", e);
                        if self.auth.is_authenticated() {
                            self.modals
                                .push(Modal::alert("Error", format!("{} {}", EXPORT_FAILED, e)));
                        }
                    }
                }
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Component Implementation
// ═══════════════════════════════════════════════════════════════════════════════

impl Component for App {
    fn init(&mut self) -> Result<()> {
        if self.auth.is_authenticated() {
            self.start_session();
        }
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::ForceQuit));
        }

        if let Some(modal) = self.modals.top().cloned() {
            return self.handle_modal_key_event(&modal, key);
        }

        match self.view {
            View::LoggedOut(AuthScreen::Login) => self.login.handle_key_event(key),
            View::LoggedOut(AuthScreen::Register) => self.register.handle_key_event(key),
            View::Upload if self.upload.path_mode => self.upload.handle_key_event(key),
            View::Upload => match Self::shell_key(key) {
                Some(action) => Ok(Some(action)),
                None => self.upload.handle_key_event(key),
            },
            View::Dashboard { .. } => match Self::shell_key(key) {
                Some(action) => Ok(Some(action)),
                None => self.dashboard.handle_key_event(key),
            },
        }
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        if self.view.is_logged_out() || !self.modals.is_empty() {
            return Ok(None);
        }
        let action = match mouse.kind {
            MouseEventKind::ScrollDown => Some(Action::NextItem),
            MouseEventKind::ScrollUp => Some(Action::PrevItem),
            _ => None,
        };
        Ok(action)
    }

    fn handle_paste_event(&mut self, text: &str) -> Result<Option<Action>> {
        if !self.modals.is_empty() {
            return Ok(None);
        }
        match self.view {
            View::LoggedOut(AuthScreen::Login) => self.login.handle_paste_event(text),
            View::LoggedOut(AuthScreen::Register) => self.register.handle_paste_event(text),
            View::Upload => self.upload.handle_paste_event(text),
            View::Dashboard { .. } => Ok(None),
        }
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            // ─────────────────────────────────────────────────────────────────
            // App Lifecycle
            // ─────────────────────────────────────────────────────────────────
            Action::Tick => {
                for response in self.dispatcher.drain() {
                    self.apply_response(response);
                }
            }
            Action::ForceQuit => {
                self.should_quit = true;
            }
            Action::Resize(_, _) => {}

            // ─────────────────────────────────────────────────────────────────
            // Navigation (delegate to SidebarComponent)
            // ─────────────────────────────────────────────────────────────────
            Action::NextItem | Action::PrevItem | Action::FirstItem | Action::LastItem => {
                return self.sidebar.update(action);
            }

            // ─────────────────────────────────────────────────────────────────
            // Scrolling (delegate to DashboardComponent)
            // ─────────────────────────────────────────────────────────────────
            Action::ScrollUp | Action::ScrollDown | Action::PageUp | Action::PageDown => {
                return self.dashboard.update(action);
            }

            // ─────────────────────────────────────────────────────────────────
            // Modals
            // ─────────────────────────────────────────────────────────────────
            Action::OpenQuitDialog => {
                self.modals.push(Modal::QuitConfirm);
            }
            Action::OpenHelp => {
                self.help_dialog.scroll_offset = 0;
                self.modals.push(Modal::Help);
            }
            Action::CloseModal => {
                self.modals.pop();
            }
            Action::ConfirmModal => {
                if let Some(Modal::ConfirmDelete { dataset_id, .. }) = self.modals.pop() {
                    if self.auth.is_authenticated() {
                        self.dispatcher.submit(Request::DeleteDataset {
                            epoch: self.auth.epoch(),
                            dataset_id,
                        });
                    }
                }
            }

            // ─────────────────────────────────────────────────────────────────
            // Authentication
            // ─────────────────────────────────────────────────────────────────
            Action::SubmitLogin { username, password } => {
                if self.view == View::LoggedOut(AuthScreen::Login) && !self.login.is_busy() {
                    self.login.begin();
                    self.dispatcher
                        .submit(Request::Login { username, password });
                }
            }
            Action::SubmitRegister {
                username,
                password,
                confirm,
            } => {
                if self.view != View::LoggedOut(AuthScreen::Register) || self.register.is_busy() {
                    return Ok(None);
                }
                match validate_registration(&username, &password, &confirm) {
                    Ok(()) => {
                        self.register.begin();
                        self.dispatcher
                            .submit(Request::Register { username, password });
                    }
                    Err(e) => self.register.fail(e.to_string()),
                }
            }
            Action::ShowLogin => {
                if self.view.is_logged_out() {
                    self.register.error = None;
                    self.view = View::LoggedOut(AuthScreen::Login);
                }
            }
            Action::ShowRegister => {
                if self.view.is_logged_out() {
                    self.login.error = None;
                    self.view = View::LoggedOut(AuthScreen::Register);
                }
            }
            Action::Logout => {
                if self.auth.is_authenticated() {
                    self.logout_cascade("user logged out");
                }
            }

            // ─────────────────────────────────────────────────────────────────
            // Datasets
            // ─────────────────────────────────────────────────────────────────
            Action::SelectDataset(dataset_id) => self.select_dataset(dataset_id),
            Action::SelectHighlighted => {
                return Ok(self
                    .sidebar
                    .highlighted(&self.history)
                    .map(Action::SelectDataset));
            }
            Action::RequestDelete => self.request_delete(),
            Action::NewUpload => self.show_upload(),
            Action::RefreshHistory => self.refresh_history(),

            // ─────────────────────────────────────────────────────────────────
            // Upload
            // ─────────────────────────────────────────────────────────────────
            Action::EnterPathMode | Action::ExitPathMode | Action::OfferFile(_) => {
                if self.view == View::Upload {
                    return self.upload.update(action);
                }
            }
            Action::SubmitUpload => {
                if self.view == View::Upload {
                    if let Some(path) = self.upload.form.begin_submit() {
                        self.dispatcher.submit(Request::Upload {
                            epoch: self.auth.epoch(),
                            path,
                        });
                    }
                }
            }

            // ─────────────────────────────────────────────────────────────────
            // Report
            // ─────────────────────────────────────────────────────────────────
            Action::ExportPdf => self.export_pdf(),
        }

        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        match self.view {
            View::LoggedOut(AuthScreen::Login) => self.login.draw(frame, area)?,
            View::LoggedOut(AuthScreen::Register) => self.register.draw(frame, area)?,
            View::Upload | View::Dashboard { .. } => self.draw_main(frame, area)?,
        }

        // Draw modal overlay if active
        if let Some(modal) = self.modals.top().cloned() {
            self.draw_modal(frame, area, &modal)?;
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Helper Methods
// ═══════════════════════════════════════════════════════════════════════════════

impl App {
    /// Keys shared by every authenticated view
    fn shell_key(key: KeyEvent) -> Option<Action> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return None;
        }
        match key.code {
            KeyCode::Char('q') => Some(Action::OpenQuitDialog),
            KeyCode::Char('?') => Some(Action::OpenHelp),
            KeyCode::Char('j') | KeyCode::Down => Some(Action::NextItem),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::PrevItem),
            KeyCode::Char('g') => Some(Action::FirstItem),
            KeyCode::Char('G') => Some(Action::LastItem),
            KeyCode::Enter => Some(Action::SelectHighlighted),
            KeyCode::Char('d') => Some(Action::RequestDelete),
            KeyCode::Char('n') => Some(Action::NewUpload),
            KeyCode::Char('r') => Some(Action::RefreshHistory),
            KeyCode::Char('L') => Some(Action::Logout),
            _ => None,
        }
    }

    fn handle_modal_key_event(&mut self, modal: &Modal, key: KeyEvent) -> Result<Option<Action>> {
        match modal {
            Modal::QuitConfirm => self.quit_dialog.handle_key_event(key),
            Modal::ConfirmDelete { .. } => self.confirm_delete_dialog.handle_key_event(key),
            Modal::Alert { .. } => self.alert_dialog.handle_key_event(key),
            Modal::Help => self.help_dialog.handle_key_event(key),
        }
    }

    fn draw_modal(&mut self, frame: &mut Frame, area: Rect, modal: &Modal) -> Result<()> {
        match modal {
            Modal::QuitConfirm => self.quit_dialog.draw(frame, area)?,
            Modal::ConfirmDelete { label, .. } => {
                self.confirm_delete_dialog
                    .draw_with_label(frame, area, label);
            }
            Modal::Alert { title, message } => {
                self.alert_dialog
                    .draw_with_message(frame, area, title, message);
            }
            Modal::Help => self.help_dialog.draw(frame, area)?,
        }
        Ok(())
    }

    fn draw_main(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let has_status = self.status_message.is_some();
        let layout = calculate_main_layout(area, has_status);

        self.sidebar.draw_with_history(
            frame,
            layout.sidebar,
            &self.history,
            self.view.selected_dataset(),
            !self.upload.path_mode,
        );

        self.draw_header(frame, layout.header);

        match self.view {
            View::Dashboard { .. } => self.dashboard.draw(frame, layout.content)?,
            _ => self.upload.draw(frame, layout.content)?,
        }

        if let (Some(area), Some(status)) = (layout.status, self.status_message.as_ref()) {
            let paragraph = Paragraph::new(Line::from(Span::styled(
                format!(" {} ", status),
                Style::default().fg(Color::Yellow),
            )));
            frame.render_widget(paragraph, area);
        }

        frame.render_widget(help_bar(self.help_hints()), layout.help);
        Ok(())
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::styled(
            format!(" {} ", self.view.title()),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )];
        if let Some(dataset_id) = self.view.selected_dataset() {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(
                format!("Dataset #{}", self.history.display_label(dataset_id)),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ));
            if let Some(detail) = self.summary.as_ref().and_then(|s| s.detail()) {
                spans.push(Span::styled(
                    format!("  imported {}", detail.imported_date()),
                    Style::default().fg(Color::DarkGray),
                ));
            }
        }
        if self.report_in_flight {
            spans.push(Span::styled(
                "  Exporting PDF...",
                Style::default().fg(Color::Yellow),
            ));
        }

        let paragraph = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        frame.render_widget(paragraph, area);
    }

    fn help_hints(&self) -> &'static [(&'static str, &'static str)] {
        match self.view {
            View::Upload if self.upload.path_mode => &[("Enter", "Use file"), ("Esc", "Cancel")],
            View::Dashboard { .. } => &[
                ("e", "Export PDF"),
                ("n", "New Upload"),
                ("Enter", "Open"),
                ("d", "Delete"),
                ("L", "Logout"),
                ("?", "Help"),
                ("q", "Quit"),
            ],
            _ => &[
                ("o", "Pick file"),
                ("u", "Upload"),
                ("Enter", "Open"),
                ("d", "Delete"),
                ("L", "Logout"),
                ("?", "Help"),
                ("q", "Quit"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::dashboard::{SummaryState, LOAD_FAILED};
    use crate::model::history::MISSING_NUMBER;
    use crate::model::session::Session;
    use crate::model::upload::UPLOAD_FAILED;
    use crate::services::fake_api::{detail, history, record, ScriptedApi};
    use crate::services::TokenStore;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Harness {
        app: App,
        api: Arc<ScriptedApi>,
        dir: TempDir,
    }

    impl Harness {
        fn new(logged_in: bool) -> Self {
            Self::with_api(logged_in, ScriptedApi::default())
        }

        fn with_api(logged_in: bool, api: ScriptedApi) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let store = TokenStore::at(dir.path().join("session.json"));
            if logged_in {
                store
                    .save(&Session {
                        access: "stored".to_string(),
                        refresh: "stored-refresh".to_string(),
                    })
                    .unwrap();
            }
            let config = Config {
                poll_interval_secs: 3600,
                report_dir: dir.path().join("reports").display().to_string(),
                ..Config::default()
            };
            let api = Arc::new(api);
            let mut app = App::new(
                config,
                AuthSession::restore(store),
                Dispatcher::inline(api.clone()),
            );
            app.init().unwrap();
            let mut harness = Self { app, api, dir };
            harness.settle();
            harness
        }

        /// Deliver responses until no follow-up requests remain
        fn settle(&mut self) {
            for _ in 0..4 {
                self.app.update(Action::Tick).unwrap();
            }
        }

        fn act(&mut self, action: Action) {
            let mut next = Some(action);
            while let Some(a) = next {
                next = self.app.update(a).unwrap();
            }
        }

        fn key(&mut self, code: KeyCode) {
            if let Some(action) = self.app.handle_key_event(KeyEvent::from(code)).unwrap() {
                self.act(action);
            }
        }

        fn csv_file(&self, name: &str) -> String {
            let path = self.dir.path().join(name);
            fs::write(&path, "Equipment Name,Type,Flowrate,Pressure,Temperature\n").unwrap();
            path.display().to_string()
        }

        fn assert_logged_out(&self) {
            assert_eq!(self.app.view, View::LoggedOut(AuthScreen::Login));
            assert!(!self.app.auth.is_authenticated());
            assert!(self.app.auth.store().load().is_none());
            assert!(self.app.history.is_empty());
            assert!(self.app.summary.is_none());
            assert!(self.app.poller.is_none());
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Startup and authentication
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_start_without_token_shows_login() {
        let h = Harness::new(false);
        assert_eq!(h.app.view, View::LoggedOut(AuthScreen::Login));
        assert!(!h.app.poller.is_some());
        assert!(h.api.calls().is_empty());
    }

    #[test]
    fn test_start_with_token_shows_upload_and_refreshes() {
        let api = ScriptedApi::default();
        api.set_history(Ok(history(&[3, 2, 1])));
        let h = Harness::with_api(true, api);
        assert_eq!(h.app.view, View::Upload);
        assert!(h.app.poller.is_some());
        assert_eq!(h.api.call_count("list_history"), 1);
        assert_eq!(h.app.history.len(), 3);
    }

    #[test]
    fn test_login_success_moves_to_upload_and_polls() {
        let mut h = Harness::new(false);
        h.api.set_history(Ok(history(&[1])));
        h.act(Action::SubmitLogin {
            username: "alice".to_string(),
            password: "pw".to_string(),
        });
        h.settle();

        assert_eq!(h.app.view, View::Upload);
        assert!(h.app.auth.is_authenticated());
        assert_eq!(
            h.app.auth.store().load().map(|s| s.access).as_deref(),
            Some("access-1")
        );
        assert!(h.app.poller.is_some());
        assert_eq!(h.app.history.len(), 1);
    }

    #[test]
    fn test_login_failure_surfaces_server_detail() {
        let mut h = Harness::new(false);
        h.api.set_login(Err(ApiError::RequestFailed {
            status: 400,
            body: r#"{"detail": "No active account found"}"#.to_string(),
        }));
        h.act(Action::SubmitLogin {
            username: "alice".to_string(),
            password: "bad".to_string(),
        });
        h.settle();
        assert_eq!(h.app.login.error.as_deref(), Some("No active account found"));
        assert!(!h.app.auth.is_authenticated());

        h.api.set_login(Err(ApiError::Unauthorized));
        h.act(Action::SubmitLogin {
            username: "alice".to_string(),
            password: "bad".to_string(),
        });
        h.settle();
        assert_eq!(h.app.login.error.as_deref(), Some(LOGIN_FAILED));
        assert_eq!(h.app.view, View::LoggedOut(AuthScreen::Login));
    }

    #[test]
    fn test_register_mismatch_is_rejected_without_network() {
        let mut h = Harness::new(false);
        h.act(Action::ShowRegister);
        h.act(Action::SubmitRegister {
            username: "bob".to_string(),
            password: "one".to_string(),
            confirm: "two".to_string(),
        });
        h.settle();
        assert_eq!(h.app.register.error.as_deref(), Some("Passwords don't match"));
        assert_eq!(h.app.view, View::LoggedOut(AuthScreen::Register));
        assert!(h.api.calls().is_empty());
    }

    #[test]
    fn test_register_success_returns_to_login_with_notice() {
        let mut h = Harness::new(false);
        h.act(Action::ShowRegister);
        h.act(Action::SubmitRegister {
            username: "bob".to_string(),
            password: "pw".to_string(),
            confirm: "pw".to_string(),
        });
        h.settle();
        assert_eq!(h.app.view, View::LoggedOut(AuthScreen::Login));
        assert!(!h.app.auth.is_authenticated());
        assert_eq!(h.app.modals.top(), Some(&Modal::alert("Success", REGISTERED)));
    }

    #[test]
    fn test_register_failure_shows_server_error() {
        let mut h = Harness::new(false);
        h.api.set_register(Err(ApiError::RequestFailed {
            status: 400,
            body: r#"{"error": "Username already exists"}"#.to_string(),
        }));
        h.act(Action::ShowRegister);
        h.act(Action::SubmitRegister {
            username: "bob".to_string(),
            password: "pw".to_string(),
            confirm: "pw".to_string(),
        });
        h.settle();
        assert_eq!(h.app.register.error.as_deref(), Some("Username already exists"));
        assert_eq!(h.app.view, View::LoggedOut(AuthScreen::Register));
    }

    #[test]
    fn test_logout_resets_everything() {
        let api = ScriptedApi::default();
        api.set_history(Ok(history(&[2, 1])));
        let mut h = Harness::with_api(true, api);
        h.act(Action::SelectDataset(2));
        h.settle();
        assert!(h.app.summary.is_some());

        h.key(KeyCode::Char('L'));
        h.assert_logged_out();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Unauthorized convergence
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_unauthorized_summary_converges_to_logout() {
        let api = ScriptedApi::default();
        api.set_history(Ok(history(&[7])));
        api.set_summary(7, Err(ApiError::Unauthorized));
        let mut h = Harness::with_api(true, api);
        h.act(Action::SelectDataset(7));
        h.settle();
        h.assert_logged_out();
        assert!(h.app.login.error.is_some());
    }

    #[test]
    fn test_unauthorized_history_converges_to_logout() {
        let api = ScriptedApi::default();
        api.set_history(Err(ApiError::Unauthorized));
        let h = Harness::with_api(true, api);
        h.assert_logged_out();
    }

    #[test]
    fn test_unauthorized_delete_converges_to_logout() {
        let api = ScriptedApi::default();
        api.set_history(Ok(history(&[1])));
        api.set_delete(Err(ApiError::Unauthorized));
        let mut h = Harness::with_api(true, api);
        h.act(Action::RequestDelete);
        h.act(Action::ConfirmModal);
        h.settle();
        h.assert_logged_out();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // History
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_display_numbers_count_from_oldest() {
        let api = ScriptedApi::default();
        api.set_history(Ok(history(&[5, 4, 3])));
        let h = Harness::with_api(true, api);
        assert_eq!(h.app.history.display_number(5), Some(3));
        assert_eq!(h.app.history.display_number(4), Some(2));
        assert_eq!(h.app.history.display_number(3), Some(1));
        assert_eq!(h.app.history.display_label(9), MISSING_NUMBER);
    }

    #[test]
    fn test_repeated_refresh_is_idempotent() {
        let api = ScriptedApi::default();
        api.set_history(Ok(history(&[5, 4, 3])));
        let mut h = Harness::with_api(true, api);
        let before = h.app.history.records().to_vec();
        h.key(KeyCode::Char('r'));
        h.settle();
        h.key(KeyCode::Char('r'));
        h.settle();
        assert_eq!(h.app.history.records(), before.as_slice());
        assert_eq!(h.api.call_count("list_history"), 3);
    }

    #[test]
    fn test_failed_refresh_keeps_stale_snapshot() {
        let api = ScriptedApi::default();
        api.set_history(Ok(history(&[2, 1])));
        let mut h = Harness::with_api(true, api);
        h.api.set_history(Err(ApiError::Network("timeout".to_string())));
        h.act(Action::RefreshHistory);
        h.settle();
        assert!(h.app.auth.is_authenticated());
        assert_eq!(h.app.history.len(), 2);
    }

    #[test]
    fn test_history_from_previous_session_is_discarded() {
        let mut h = Harness::new(true);
        let old_epoch = h.app.auth.epoch();
        h.act(Action::Logout);
        h.act(Action::SubmitLogin {
            username: "alice".to_string(),
            password: "pw".to_string(),
        });
        h.settle();
        assert!(h.app.auth.epoch() > old_epoch);

        h.app
            .dispatcher
            .sender()
            .send(Response::HistoryLoaded {
                epoch: old_epoch,
                ticket: u64::MAX,
                result: Ok(history(&[9, 8])),
            })
            .unwrap();
        h.settle();
        assert!(h.app.history.is_empty());
    }

    #[test]
    fn test_unauthorized_from_previous_session_keeps_new_login() {
        let mut h = Harness::new(true);
        let old_epoch = h.app.auth.epoch();
        h.act(Action::Logout);
        h.act(Action::SubmitLogin {
            username: "alice".to_string(),
            password: "pw".to_string(),
        });
        h.settle();

        let sender = h.app.dispatcher.sender();
        sender
            .send(Response::Deleted {
                epoch: old_epoch,
                dataset_id: 42,
                result: Err(ApiError::Unauthorized),
            })
            .unwrap();
        sender
            .send(Response::SummaryLoaded {
                epoch: old_epoch,
                dataset_id: 42,
                ticket: u64::MAX,
                result: Err(ApiError::Unauthorized),
            })
            .unwrap();
        sender
            .send(Response::Uploaded {
                epoch: old_epoch,
                result: Err(ApiError::Unauthorized),
            })
            .unwrap();
        h.settle();

        assert!(h.app.auth.is_authenticated());
        assert_eq!(h.app.view, View::Upload);
        assert!(h.app.poller.is_some());
        assert!(h.app.modals.is_empty());
    }

    #[test]
    fn test_summary_from_previous_session_is_not_shown() {
        let api = ScriptedApi::default();
        api.set_history(Ok(history(&[3])));
        let mut h = Harness::with_api(true, api);
        let old_epoch = h.app.auth.epoch();
        h.act(Action::Logout);
        h.act(Action::SubmitLogin {
            username: "alice".to_string(),
            password: "pw".to_string(),
        });
        h.settle();
        h.act(Action::SelectDataset(3));
        // the selection took the most recent ticket
        let ticket = h.app.dispatcher.next_ticket() - 1;

        // same dataset and ticket, but sent by the old session
        h.app
            .dispatcher
            .sender()
            .send(Response::SummaryLoaded {
                epoch: old_epoch,
                dataset_id: 3,
                ticket,
                result: Err(ApiError::Network("late".to_string())),
            })
            .unwrap();
        h.settle();

        assert!(h.app.summary.as_ref().and_then(|s| s.detail()).is_some());
    }

    #[test]
    fn test_older_ticket_does_not_overwrite_newer_snapshot() {
        let api = ScriptedApi::default();
        api.set_history(Ok(history(&[3, 2, 1])));
        let mut h = Harness::with_api(true, api);
        let epoch = h.app.auth.epoch();
        h.app
            .dispatcher
            .sender()
            .send(Response::HistoryLoaded {
                epoch,
                ticket: 0,
                result: Ok(history(&[1])),
            })
            .unwrap();
        h.settle();
        assert_eq!(h.app.history.len(), 3);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Selection and deletion
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_select_from_sidebar_loads_dashboard() {
        let api = ScriptedApi::default();
        api.set_history(Ok(history(&[3, 2, 1])));
        let mut h = Harness::with_api(true, api);
        h.key(KeyCode::Char('j'));
        h.key(KeyCode::Enter);
        assert_eq!(h.app.view, View::Dashboard { dataset_id: 2 });
        assert_eq!(
            h.app.summary.as_ref().map(|s| s.summary().clone()),
            Some(SummaryState::Loading)
        );
        h.settle();
        assert!(h.app.summary.as_ref().and_then(|s| s.detail()).is_some());
    }

    #[test]
    fn test_summary_failure_shows_message() {
        let api = ScriptedApi::default();
        api.set_history(Ok(history(&[1])));
        api.set_summary(1, Err(ApiError::Network("timeout".to_string())));
        let mut h = Harness::with_api(true, api);
        h.act(Action::SelectDataset(1));
        h.settle();
        assert_eq!(
            h.app.summary.as_ref().map(|s| s.summary().clone()),
            Some(SummaryState::Failed(LOAD_FAILED.to_string()))
        );
        assert!(h.app.auth.is_authenticated());
    }

    #[test]
    fn test_late_summary_for_previous_selection_is_dropped() {
        let api = ScriptedApi::default();
        api.set_history(Ok(history(&[2, 1])));
        let mut first = detail(4);
        first.dataset_id = Some(1);
        let mut second = detail(6);
        second.dataset_id = Some(2);
        api.set_summary(1, Ok(first));
        api.set_summary(2, Ok(second));
        let mut h = Harness::with_api(true, api);

        // both responses are queued before either is applied
        h.act(Action::SelectDataset(1));
        h.act(Action::SelectDataset(2));
        h.settle();

        let state = h.app.summary.as_ref().unwrap();
        assert_eq!(state.dataset_id(), 2);
        assert_eq!(state.detail().unwrap().data.len(), 6);
    }

    #[test]
    fn test_delete_selected_returns_to_upload() {
        let api = ScriptedApi::default();
        api.set_history(Ok(history(&[5, 4, 3])));
        let mut h = Harness::with_api(true, api);
        h.act(Action::SelectDataset(4));
        h.settle();

        h.key(KeyCode::Char('d'));
        assert!(matches!(
            h.app.modals.top(),
            Some(Modal::ConfirmDelete { dataset_id: 4, .. })
        ));
        h.api.set_history(Ok(history(&[5, 3])));
        h.key(KeyCode::Char('y'));
        h.settle();

        assert_eq!(h.app.view, View::Upload);
        assert!(h.app.summary.is_none());
        assert_eq!(h.api.call_count("delete_dataset"), 1);
        assert_eq!(h.app.history.display_number(5), Some(2));
        assert_eq!(h.app.history.display_number(3), Some(1));
    }

    #[test]
    fn test_delete_other_dataset_keeps_dashboard() {
        let api = ScriptedApi::default();
        api.set_history(Ok(history(&[5, 4, 3])));
        let mut h = Harness::with_api(true, api);
        h.act(Action::SelectDataset(5));
        h.settle();

        h.key(KeyCode::Char('G'));
        h.key(KeyCode::Char('d'));
        h.api.set_history(Ok(history(&[5, 4])));
        h.key(KeyCode::Char('y'));
        h.settle();

        assert_eq!(h.app.view, View::Dashboard { dataset_id: 5 });
        assert!(h.app.summary.as_ref().and_then(|s| s.detail()).is_some());
        assert_eq!(h.app.history.len(), 2);
        assert_eq!(h.api.call_count("list_history"), 2);
    }

    #[test]
    fn test_delete_failure_leaves_state_unchanged() {
        let api = ScriptedApi::default();
        api.set_history(Ok(history(&[2, 1])));
        api.set_delete(Err(ApiError::RequestFailed {
            status: 404,
            body: r#"{"error": "Dataset not found"}"#.to_string(),
        }));
        let mut h = Harness::with_api(true, api);
        h.act(Action::SelectDataset(2));
        h.settle();
        h.act(Action::RequestDelete);
        h.act(Action::ConfirmModal);
        h.settle();

        assert_eq!(h.app.view, View::Dashboard { dataset_id: 2 });
        assert_eq!(h.app.history.len(), 2);
        assert_eq!(h.app.modals.top(), Some(&Modal::alert("Error", DELETE_FAILED)));
    }

    #[test]
    fn test_declining_delete_sends_nothing() {
        let api = ScriptedApi::default();
        api.set_history(Ok(history(&[1])));
        let mut h = Harness::with_api(true, api);
        h.key(KeyCode::Char('d'));
        h.key(KeyCode::Char('n'));
        assert!(h.app.modals.is_empty());
        assert_eq!(h.api.call_count("delete_dataset"), 0);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Upload
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_upload_success_opens_dashboard() {
        let api = ScriptedApi::default();
        api.set_upload(Ok(record(8)));
        let mut h = Harness::with_api(true, api);
        let path = h.csv_file("plant.csv");

        if let Some(action) = h.app.handle_paste_event(&path).unwrap() {
            h.act(action);
        }
        assert_eq!(h.app.upload.form.pending_name().as_deref(), Some("plant.csv"));

        h.api.set_history(Ok(history(&[8])));
        h.key(KeyCode::Char('u'));
        h.settle();

        assert_eq!(h.app.view, View::Dashboard { dataset_id: 8 });
        assert!(h.app.upload.form.pending().is_none());
        assert_eq!(h.app.history.display_number(8), Some(1));
        assert_eq!(h.api.call_count("fetch_summary"), 1);
    }

    #[test]
    fn test_non_csv_is_rejected_without_network() {
        let mut h = Harness::new(true);
        let calls_before = h.api.calls().len();
        h.act(Action::OfferFile("data.txt".to_string()));
        h.act(Action::SubmitUpload);
        h.settle();

        assert_eq!(
            h.app.upload.form.error(),
            Some("Only CSV files are allowed.")
        );
        assert_eq!(h.api.call_count("upload"), 0);
        assert_eq!(h.api.calls().len(), calls_before);
    }

    #[test]
    fn test_upload_failure_keeps_pending_file() {
        let api = ScriptedApi::default();
        api.set_upload(Err(ApiError::RequestFailed {
            status: 400,
            body: "{}".to_string(),
        }));
        let mut h = Harness::with_api(true, api);
        let path = h.csv_file("bad.csv");
        h.act(Action::EnterPathMode);
        h.act(Action::OfferFile(path));
        h.act(Action::SubmitUpload);
        h.settle();

        assert_eq!(h.app.view, View::Upload);
        assert_eq!(h.app.upload.form.error(), Some(UPLOAD_FAILED));
        assert_eq!(h.app.upload.form.pending_name().as_deref(), Some("bad.csv"));
    }

    #[test]
    fn test_typing_path_does_not_trigger_shortcuts() {
        let mut h = Harness::new(true);
        h.key(KeyCode::Char('o'));
        assert!(h.app.upload.path_mode);
        h.key(KeyCode::Char('q'));
        h.key(KeyCode::Char('L'));
        assert!(h.app.modals.is_empty());
        assert!(h.app.auth.is_authenticated());
        assert_eq!(h.app.upload.form.input, "qL");
        h.key(KeyCode::Esc);
        assert!(!h.app.upload.path_mode);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Export
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_export_writes_report_and_blocks_reentry() {
        let api = ScriptedApi::default();
        api.set_history(Ok(history(&[6, 5])));
        let mut h = Harness::with_api(true, api);
        h.act(Action::SelectDataset(5));
        h.settle();

        h.key(KeyCode::Char('e'));
        assert!(h.app.report_in_flight);
        h.key(KeyCode::Char('e'));
        h.settle();

        assert!(!h.app.report_in_flight);
        let expected = h.dir.path().join("reports").join("Report_Dataset_1.pdf");
        assert!(expected.exists());
        assert!(matches!(h.app.modals.pop(), Some(Modal::Alert { ref title, .. }) if title == "Report saved"));
        // the second request was a no-op, so only one notice was raised
        assert!(h.app.modals.pop().is_none());
    }

    #[test]
    fn test_export_failure_raises_one_alert_and_releases_busy_flag() {
        let api = ScriptedApi::default();
        api.set_history(Ok(history(&[1])));
        let mut h = Harness::with_api(true, api);
        let blocker = h.dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        h.app.config.report_dir = blocker.join("out").display().to_string();

        h.act(Action::SelectDataset(1));
        h.settle();
        h.act(Action::ExportPdf);
        h.settle();

        assert!(!h.app.report_in_flight);
        match h.app.modals.pop() {
            Some(Modal::Alert { title, message }) => {
                assert_eq!(title, "Error");
                assert!(message.starts_with(EXPORT_FAILED));
            }
            other => panic!("expected an alert, got {:?}", other),
        }
        assert!(h.app.modals.is_empty());
    }

    #[test]
    fn test_export_needs_loaded_summary() {
        let mut h = Harness::new(true);
        h.act(Action::ExportPdf);
        assert!(!h.app.report_in_flight);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Shell
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_quit_flow() {
        let mut h = Harness::new(true);
        h.key(KeyCode::Char('q'));
        assert_eq!(h.app.modals.top(), Some(&Modal::QuitConfirm));
        h.key(KeyCode::Char('n'));
        assert!(!h.app.should_quit);
        h.key(KeyCode::Char('q'));
        h.key(KeyCode::Char('y'));
        assert!(h.app.should_quit);
    }

    #[test]
    fn test_new_upload_leaves_dashboard() {
        let api = ScriptedApi::default();
        api.set_history(Ok(history(&[1])));
        let mut h = Harness::with_api(true, api);
        h.act(Action::SelectDataset(1));
        h.settle();
        h.key(KeyCode::Char('n'));
        assert_eq!(h.app.view, View::Upload);
        assert!(h.app.summary.is_none());
    }

    #[test]
    fn test_selection_unreachable_while_logged_out() {
        let mut h = Harness::new(false);
        h.act(Action::SelectDataset(3));
        assert_eq!(h.app.view, View::LoggedOut(AuthScreen::Login));
        assert!(h.api.calls().is_empty());
    }
}
