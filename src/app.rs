//! Application state for the triplog TUI
//!
//! `App` wraps the [`Tracker`] with everything that only matters on screen:
//! the input mode, selection, form buffers and notifications. Key handling is
//! synchronous; the weather lookup is flagged here and awaited by the main
//! loop.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent};
use tracing::debug;

use crate::data::{Fetched, Note, Route, WeatherClient, WeatherReport};
use crate::debounce::Debouncer;
use crate::error::AppError;
use crate::tracker::{NoteDraft, RouteDraft, Tracker};

/// How long a notification stays on screen
pub const NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Current input mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Navigating the route and note lists
    Browse,
    /// Typing into the search box
    Search,
    /// Filling in the add/edit route form
    RouteForm,
    /// Filling in the note form
    NoteForm,
    /// Typing a city for the weather panel
    WeatherInput,
    /// Waiting for y/n before deleting
    ConfirmDelete(DeleteTarget),
}

/// Record awaiting delete confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    Route(String),
    Note(String),
}

/// Which list receives navigation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Routes,
    Notes,
}

/// Fields of the route form, in tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteField {
    #[default]
    Name,
    Destination,
    StartDate,
    EndDate,
    Description,
    Transport,
    Completed,
}

impl RouteField {
    pub const ALL: [RouteField; 7] = [
        RouteField::Name,
        RouteField::Destination,
        RouteField::StartDate,
        RouteField::EndDate,
        RouteField::Description,
        RouteField::Transport,
        RouteField::Completed,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RouteField::Name => "Name",
            RouteField::Destination => "Destination",
            RouteField::StartDate => "Start date",
            RouteField::EndDate => "End date",
            RouteField::Description => "Description",
            RouteField::Transport => "Transport",
            RouteField::Completed => "Completed",
        }
    }

    fn next(self) -> Self {
        let i = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        let i = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Route form buffer; `editing` holds the id when editing an existing route
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteForm {
    pub editing: Option<String>,
    pub draft: RouteDraft,
    pub field: RouteField,
}

impl RouteForm {
    fn text_mut(&mut self) -> Option<&mut String> {
        match self.field {
            RouteField::Name => Some(&mut self.draft.name),
            RouteField::Destination => Some(&mut self.draft.destination),
            RouteField::StartDate => Some(&mut self.draft.start_date),
            RouteField::EndDate => Some(&mut self.draft.end_date),
            RouteField::Description => Some(&mut self.draft.description),
            RouteField::Transport | RouteField::Completed => None,
        }
    }
}

/// Fields of the note form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoteField {
    #[default]
    Title,
    Content,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteForm {
    pub draft: NoteDraft,
    pub field: NoteField,
}

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A transient message in the footer
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
    pub shown_at: Instant,
}

/// Main application struct
pub struct App {
    pub mode: Mode,
    pub tracker: Tracker,
    pub focus: Focus,
    /// Index of the selected route on the current page
    pub route_cursor: usize,
    pub note_cursor: usize,
    /// Search box contents; applied to the tracker after the debounce
    pub search_input: String,
    pub route_form: RouteForm,
    pub note_form: NoteForm,
    pub weather_input: String,
    /// Last weather result shown in the weather panel
    pub weather: Option<Fetched<WeatherReport>>,
    /// Set when a weather lookup should run on the next loop iteration
    pub weather_requested: bool,
    pub notification: Option<Notification>,
    pub show_help: bool,
    pub should_quit: bool,
    search_debounce: Debouncer,
    weather_client: WeatherClient,
}

impl App {
    pub fn new(tracker: Tracker, weather_client: WeatherClient) -> Self {
        Self {
            mode: Mode::Browse,
            tracker,
            focus: Focus::Routes,
            route_cursor: 0,
            note_cursor: 0,
            search_input: String::new(),
            route_form: RouteForm::default(),
            note_form: NoteForm::default(),
            weather_input: String::new(),
            weather: None,
            weather_requested: false,
            notification: None,
            show_help: false,
            should_quit: false,
            search_debounce: Debouncer::default(),
            weather_client,
        }
    }

    /// The route under the cursor on the current page
    pub fn selected_route(&self) -> Option<&Route> {
        self.tracker
            .visible_routes()
            .items
            .get(self.route_cursor)
            .map(|(_, route)| *route)
    }

    pub fn selected_note(&self) -> Option<&Note> {
        self.tracker.notes().get(self.note_cursor)
    }

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        let message = message.into();
        debug!(?level, %message, "notification");
        self.notification = Some(Notification {
            message,
            level,
            shown_at: Instant::now(),
        });
    }

    /// Periodic housekeeping: applies a debounced search and expires notifications
    pub fn tick(&mut self, now: Instant) {
        if self.search_debounce.ready(now) {
            self.apply_search();
        }
        if let Some(n) = &self.notification {
            if now.duration_since(n.shown_at) >= NOTIFICATION_TIMEOUT {
                self.notification = None;
            }
        }
    }

    /// Handles keyboard input
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        // Help overlay intercepts all keys when shown
        if self.show_help {
            if matches!(
                key_event.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')
            ) {
                self.show_help = false;
            }
            return;
        }

        match self.mode.clone() {
            Mode::Browse => self.handle_browse_key(key_event),
            Mode::Search => self.handle_search_key(key_event),
            Mode::RouteForm => self.handle_route_form_key(key_event),
            Mode::NoteForm => self.handle_note_form_key(key_event),
            Mode::WeatherInput => self.handle_weather_key(key_event),
            Mode::ConfirmDelete(target) => self.handle_confirm_key(key_event, target),
        }
    }

    fn handle_browse_key(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Routes => Focus::Notes,
                    Focus::Notes => Focus::Routes,
                };
            }
            KeyCode::Up | KeyCode::Char('k') => self.move_selection_up(),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection_down(),
            KeyCode::Left | KeyCode::Char('h') => {
                if self.tracker.prev_page() {
                    self.route_cursor = 0;
                }
            }
            KeyCode::Right | KeyCode::Char('l') => {
                if self.tracker.next_page() {
                    self.route_cursor = 0;
                }
            }
            KeyCode::Char(c @ '1'..='9') => {
                let page = c.to_digit(10).unwrap_or(1) as usize;
                if self.tracker.change_page(page) {
                    self.route_cursor = 0;
                }
            }
            KeyCode::Char('/') => {
                self.search_input = self.tracker.search().to_string();
                self.mode = Mode::Search;
            }
            KeyCode::Char('c') => {
                let completed_only = self.tracker.toggle_completed_filter();
                self.route_cursor = 0;
                let message = if completed_only {
                    "Showing completed routes"
                } else {
                    "Showing all routes"
                };
                self.notify(NotificationLevel::Info, message);
            }
            KeyCode::Char('a') => {
                self.route_form = RouteForm::default();
                self.mode = Mode::RouteForm;
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(route) = self.selected_route() {
                    self.route_form = RouteForm {
                        editing: Some(route.id.clone()),
                        draft: RouteDraft::from_route(route),
                        field: RouteField::Name,
                    };
                    self.mode = Mode::RouteForm;
                }
            }
            KeyCode::Char('n') => {
                self.note_form = NoteForm::default();
                self.mode = Mode::NoteForm;
            }
            KeyCode::Char('d') => {
                let target = match self.focus {
                    Focus::Routes => self
                        .selected_route()
                        .map(|r| DeleteTarget::Route(r.id.clone())),
                    Focus::Notes => self
                        .selected_note()
                        .map(|n| DeleteTarget::Note(n.id.clone())),
                };
                if let Some(target) = target {
                    self.mode = Mode::ConfirmDelete(target);
                }
            }
            KeyCode::Char('w') => {
                self.mode = Mode::WeatherInput;
            }
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Esc => {
                self.search_input.clear();
                self.search_debounce.cancel();
                self.apply_search();
                self.mode = Mode::Browse;
            }
            KeyCode::Enter => {
                self.search_debounce.cancel();
                self.apply_search();
                self.mode = Mode::Browse;
            }
            KeyCode::Backspace => {
                self.search_input.pop();
                self.search_debounce.touch(Instant::now());
            }
            KeyCode::Char(c) => {
                self.search_input.push(c);
                self.search_debounce.touch(Instant::now());
            }
            _ => {}
        }
    }

    fn apply_search(&mut self) {
        if self.search_input != self.tracker.search() {
            self.tracker.set_search(&self.search_input);
            self.route_cursor = 0;
        }
    }

    fn handle_route_form_key(&mut self, key_event: KeyEvent) {
        let form = &mut self.route_form;
        match key_event.code {
            KeyCode::Esc => {
                self.mode = Mode::Browse;
            }
            KeyCode::Enter => self.submit_route_form(),
            KeyCode::Tab | KeyCode::Down => form.field = form.field.next(),
            KeyCode::BackTab | KeyCode::Up => form.field = form.field.prev(),
            KeyCode::Left if form.field == RouteField::Transport => {
                form.draft.transport = form.draft.transport.prev();
            }
            KeyCode::Right if form.field == RouteField::Transport => {
                form.draft.transport = form.draft.transport.next();
            }
            KeyCode::Char(' ') if form.field == RouteField::Completed => {
                form.draft.completed = !form.draft.completed;
            }
            KeyCode::Backspace => {
                if let Some(text) = form.text_mut() {
                    text.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(text) = form.text_mut() {
                    text.push(c);
                }
            }
            _ => {}
        }
    }

    fn submit_route_form(&mut self) {
        let form = self.route_form.clone();
        let result = match &form.editing {
            Some(id) => self
                .tracker
                .update_route(id, &form.draft)
                .map(|saved| (saved, "Route updated")),
            None => self
                .tracker
                .add_route(&form.draft)
                .map(|saved| (saved, "Route added")),
        };

        match result {
            Ok((saved, message)) => {
                self.mode = Mode::Browse;
                self.clamp_selection();
                self.report_saved(saved.persisted, message);
            }
            // Stay in the form so the input can be corrected
            Err(e) => self.notify(NotificationLevel::Error, e.to_string()),
        }
    }

    fn handle_note_form_key(&mut self, key_event: KeyEvent) {
        let form = &mut self.note_form;
        match key_event.code {
            KeyCode::Esc => {
                self.mode = Mode::Browse;
            }
            KeyCode::Enter => {
                let draft = form.draft.clone();
                match self.tracker.add_note(&draft) {
                    Ok(saved) => {
                        self.mode = Mode::Browse;
                        self.report_saved(saved.persisted, "Note added");
                    }
                    Err(e) => self.notify(NotificationLevel::Error, e.to_string()),
                }
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                form.field = match form.field {
                    NoteField::Title => NoteField::Content,
                    NoteField::Content => NoteField::Title,
                };
            }
            KeyCode::Backspace => {
                match form.field {
                    NoteField::Title => form.draft.title.pop(),
                    NoteField::Content => form.draft.content.pop(),
                };
            }
            KeyCode::Char(c) => match form.field {
                NoteField::Title => form.draft.title.push(c),
                NoteField::Content => form.draft.content.push(c),
            },
            _ => {}
        }
    }

    fn handle_weather_key(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Esc => {
                self.mode = Mode::Browse;
            }
            KeyCode::Enter => {
                self.weather_requested = true;
                self.mode = Mode::Browse;
            }
            KeyCode::Backspace => {
                self.weather_input.pop();
            }
            KeyCode::Char(c) => {
                self.weather_input.push(c);
            }
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, key_event: KeyEvent, target: DeleteTarget) {
        match key_event.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                let result = match &target {
                    DeleteTarget::Route(id) => self
                        .tracker
                        .delete_route(id)
                        .map(|saved| (saved.persisted, "Route deleted")),
                    DeleteTarget::Note(id) => self
                        .tracker
                        .delete_note(id)
                        .map(|saved| (saved.persisted, "Note deleted")),
                };
                self.mode = Mode::Browse;
                match result {
                    Ok((persisted, message)) => {
                        self.clamp_selection();
                        self.report_saved(persisted, message);
                    }
                    Err(e) => self.notify(NotificationLevel::Error, e.to_string()),
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.mode = Mode::Browse;
            }
            _ => {}
        }
    }

    /// Runs a pending weather lookup, if one was requested
    pub async fn fetch_weather(&mut self) {
        if !self.weather_requested {
            return;
        }
        self.weather_requested = false;

        match self
            .tracker
            .lookup_weather(&self.weather_client, &self.weather_input)
            .await
        {
            Ok(result) => {
                match result.reason() {
                    Some(reason) => self.notify(
                        NotificationLevel::Warning,
                        format!("Weather unavailable, showing demo data ({})", reason),
                    ),
                    None => self.notify(NotificationLevel::Success, "Weather updated"),
                }
                self.weather = Some(result);
            }
            Err(e @ AppError::EmptyCity) => self.notify(NotificationLevel::Warning, e.to_string()),
            Err(e) => self.notify(NotificationLevel::Error, e.to_string()),
        }
    }

    fn report_saved(&mut self, persisted: bool, message: &str) {
        if persisted {
            self.notify(NotificationLevel::Success, message);
        } else {
            self.notify(
                NotificationLevel::Warning,
                format!("{}, but it could not be saved to disk", message),
            );
        }
    }

    fn move_selection_up(&mut self) {
        match self.focus {
            Focus::Routes => self.route_cursor = self.route_cursor.saturating_sub(1),
            Focus::Notes => self.note_cursor = self.note_cursor.saturating_sub(1),
        }
    }

    fn move_selection_down(&mut self) {
        match self.focus {
            Focus::Routes => {
                let len = self.tracker.visible_routes().items.len();
                if self.route_cursor + 1 < len {
                    self.route_cursor += 1;
                }
            }
            Focus::Notes => {
                if self.note_cursor + 1 < self.tracker.notes().len() {
                    self.note_cursor += 1;
                }
            }
        }
    }

    /// Keeps the cursors inside their lists after a mutation
    fn clamp_selection(&mut self) {
        let routes = self.tracker.visible_routes().items.len();
        self.route_cursor = self.route_cursor.min(routes.saturating_sub(1));
        let notes = self.tracker.notes().len();
        self.note_cursor = self.note_cursor.min(notes.saturating_sub(1));
    }
}
