//! Application state.

use crate::config::ConsoleConfig;
use crate::events::TuiEvent;
use crate::keys::{map_key, Action};
use crate::nav::ScreenKind;
use crate::notifications::{Notification, NotificationAction, NotificationLevel};
use crate::persistence::PersistedState;
use crate::screen::{ResourceScreen, Screen, ScreenCommand};
use crate::theme::ConsoleTheme;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use marketdesk_client::adapters::{
    BookingsAdapter, NotificationsAdapter, PlansAdapter, ProvidersAdapter, ReviewsAdapter,
    SubscriptionsAdapter, UsersAdapter,
};
use marketdesk_client::{AuthSession, AuthState, RemoteResource, ResourceAdapter, Transport};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Notifications kept for the footer; older ones are dropped.
const NOTIFICATION_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoginField {
    #[default]
    Email,
    Password,
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub focus: LoginField,
    pub submitting: bool,
}

impl LoginForm {
    fn input(&mut self) -> &mut String {
        match self.focus {
            LoginField::Email => &mut self.email,
            LoginField::Password => &mut self.password,
        }
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            LoginField::Email => LoginField::Password,
            LoginField::Password => LoginField::Email,
        };
    }
}

#[derive(Debug, Clone)]
pub enum InputMode {
    Normal,
    Search(String),
    Login(LoginForm),
}

pub struct App {
    pub config: ConsoleConfig,
    pub theme: ConsoleTheme,
    pub auth: AuthSession,
    pub active: ScreenKind,
    pub notifications: Vec<Notification>,
    pub mode: InputMode,
    screens: Vec<Box<dyn Screen>>,
    transport: Arc<dyn Transport>,
    wake: mpsc::Sender<TuiEvent>,
}

impl App {
    pub fn new(
        config: ConsoleConfig,
        auth: AuthSession,
        transport: Arc<dyn Transport>,
        wake: mpsc::Sender<TuiEvent>,
        persisted: Option<PersistedState>,
    ) -> Self {
        let mut active = ScreenKind::Users;
        let mut page_size = config.default_page_size;
        if let Some(state) = persisted {
            active = state.active_screen;
            if (1..=crate::config::MAX_PAGE_SIZE).contains(&state.page_size) {
                page_size = state.page_size;
            }
        }
        let screens = build_screens(&transport, page_size, &wake);
        let mode = if auth.is_signed_in() {
            InputMode::Normal
        } else {
            InputMode::Login(LoginForm::default())
        };
        Self {
            config,
            theme: ConsoleTheme::standard(),
            auth,
            active,
            notifications: Vec::new(),
            mode,
            screens,
            transport,
            wake,
        }
    }

    pub fn screen(&self) -> &dyn Screen {
        self.screens[self.active.index()].as_ref()
    }

    fn screen_mut(&mut self) -> &mut dyn Screen {
        self.screens[self.active.index()].as_mut()
    }

    pub fn screens(&self) -> impl Iterator<Item = &dyn Screen> {
        self.screens.iter().map(|screen| screen.as_ref())
    }

    /// Load the visible screen. Does nothing until signed in.
    pub fn start(&mut self) {
        if self.auth.is_signed_in() {
            self.screen_mut().activate();
        }
    }

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.push(Notification::new(level, message));
    }

    pub fn push(&mut self, notification: Notification) {
        if notification.action == Some(NotificationAction::SignIn) && self.auth.is_signed_in() {
            tracing::warn!("request rejected as unauthorized; ending session");
            if let Err(err) = self.auth.sign_out() {
                tracing::warn!(error = %err, "could not clear stored token");
            }
        }
        self.notifications.push(notification);
        if self.notifications.len() > NOTIFICATION_LIMIT {
            let excess = self.notifications.len() - NOTIFICATION_LIMIT;
            self.notifications.drain(..excess);
        }
    }

    pub fn latest_notification(&self) -> Option<&Notification> {
        self.notifications.last()
    }

    pub fn persisted_state(&self) -> PersistedState {
        PersistedState {
            active_screen: self.active,
            page_size: self.screen().page_size(),
        }
    }

    /// Apply outcomes from every screen's background requests.
    pub fn drain_screens(&mut self) {
        let mut notes = Vec::new();
        for screen in &mut self.screens {
            notes.extend(screen.drain());
        }
        for note in notes {
            self.push(note);
        }
    }

    pub fn on_auth_changed(&mut self, state: AuthState) {
        match state {
            AuthState::SignedIn(_) => {
                if matches!(self.mode, InputMode::Login(_)) {
                    self.mode = InputMode::Normal;
                }
                self.notify(NotificationLevel::Success, "Signed in");
                self.start();
            }
            AuthState::SignedOut => {
                self.mode = InputMode::Login(LoginForm::default());
                self.notify(NotificationLevel::Warning, "Signed out");
            }
        }
    }

    pub fn on_login_finished(&mut self, result: Result<(), String>) {
        if let InputMode::Login(form) = &mut self.mode {
            form.submitting = false;
            form.password.clear();
        }
        if let Err(message) = result {
            self.notify(NotificationLevel::Error, format!("Sign in failed: {}", message));
        }
    }

    /// Route a key press. Returns `true` when the console should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }
        match &mut self.mode {
            InputMode::Normal => match map_key(key) {
                Some(action) => self.handle_action(action),
                None => false,
            },
            InputMode::Search(query) => {
                match key.code {
                    KeyCode::Enter => {
                        let query = std::mem::take(query);
                        self.mode = InputMode::Normal;
                        self.command(ScreenCommand::Search(query));
                    }
                    KeyCode::Esc => self.mode = InputMode::Normal,
                    KeyCode::Backspace => {
                        query.pop();
                    }
                    KeyCode::Char(c) => query.push(c),
                    _ => {}
                }
                false
            }
            InputMode::Login(form) => {
                if form.submitting {
                    return false;
                }
                match key.code {
                    KeyCode::Esc => return true,
                    KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                        form.toggle_focus()
                    }
                    KeyCode::Enter => {
                        if form.focus == LoginField::Email {
                            form.toggle_focus();
                        } else {
                            form.submitting = true;
                            let email = form.email.clone();
                            let password = form.password.clone();
                            self.spawn_login(email, password);
                        }
                    }
                    KeyCode::Backspace => {
                        form.input().pop();
                    }
                    KeyCode::Char(c) => form.input().push(c),
                    _ => {}
                }
                false
            }
        }
    }

    pub fn handle_action(&mut self, action: Action) -> bool {
        match action {
            Action::Quit => return true,
            Action::NextScreen => self.switch_to(self.active.next()),
            Action::PrevScreen => self.switch_to(self.active.previous()),
            Action::SwitchScreen(index) => {
                if let Some(kind) = ScreenKind::from_index(index) {
                    self.switch_to(kind);
                }
            }
            Action::OpenSearch => self.mode = InputMode::Search(self.screen().search_text()),
            Action::SignOut => {
                if let Err(err) = self.auth.sign_out() {
                    self.notify(NotificationLevel::Error, format!("Sign out failed: {}", err));
                }
            }
            Action::MoveUp => self.command(ScreenCommand::MoveUp),
            Action::MoveDown => self.command(ScreenCommand::MoveDown),
            Action::PrevPage => self.command(ScreenCommand::PrevPage),
            Action::NextPage => self.command(ScreenCommand::NextPage),
            Action::GrowPageSize => self.command(ScreenCommand::GrowPageSize),
            Action::ShrinkPageSize => self.command(ScreenCommand::ShrinkPageSize),
            Action::ToggleSort => self.command(ScreenCommand::ToggleSort),
            Action::CycleStatus => self.command(ScreenCommand::CycleStatus),
            Action::ClearFilters => self.command(ScreenCommand::ClearFilters),
            Action::Refresh => self.command(ScreenCommand::Refresh),
            Action::Open => self.command(ScreenCommand::Open),
            Action::Close => self.command(ScreenCommand::Close),
            Action::Primary => self.command(ScreenCommand::Primary),
            Action::Delete => self.command(ScreenCommand::RequestDelete),
            Action::Confirm => self.command(ScreenCommand::ConfirmDelete),
        }
        false
    }

    fn switch_to(&mut self, kind: ScreenKind) {
        self.active = kind;
        self.start();
    }

    fn command(&mut self, command: ScreenCommand) {
        if !self.auth.is_signed_in() {
            return;
        }
        if let Some(note) = self.screen_mut().handle(command) {
            self.push(note);
        }
    }

    fn spawn_login(&self, email: String, password: String) {
        let auth = self.auth.clone();
        let transport = Arc::clone(&self.transport);
        let wake = self.wake.clone();
        tokio::spawn(async move {
            let result = auth
                .login(transport.as_ref(), &email, &password)
                .await
                .map_err(|err| match err {
                    marketdesk_client::AuthError::Rejected(err) => err.user_message(),
                    other => other.to_string(),
                });
            let _ = wake.send(TuiEvent::LoginFinished(result)).await;
        });
    }
}

fn build_screens(
    transport: &Arc<dyn Transport>,
    page_size: u32,
    wake: &mpsc::Sender<TuiEvent>,
) -> Vec<Box<dyn Screen>> {
    ScreenKind::all()
        .iter()
        .map(|kind| match kind {
            ScreenKind::Users => boxed(*kind, UsersAdapter, transport, page_size, wake),
            ScreenKind::Providers => boxed(*kind, ProvidersAdapter, transport, page_size, wake),
            ScreenKind::Bookings => boxed(*kind, BookingsAdapter, transport, page_size, wake),
            ScreenKind::Subscriptions => {
                boxed(*kind, SubscriptionsAdapter, transport, page_size, wake)
            }
            ScreenKind::Reviews => boxed(*kind, ReviewsAdapter, transport, page_size, wake),
            ScreenKind::Notifications => {
                boxed(*kind, NotificationsAdapter, transport, page_size, wake)
            }
            ScreenKind::Plans => boxed(*kind, PlansAdapter, transport, page_size, wake),
        })
        .collect()
}

fn boxed<A: ResourceAdapter>(
    kind: ScreenKind,
    adapter: A,
    transport: &Arc<dyn Transport>,
    page_size: u32,
    wake: &mpsc::Sender<TuiEvent>,
) -> Box<dyn Screen> {
    let resource = RemoteResource::new(adapter, Arc::clone(transport));
    Box::new(ResourceScreen::new(kind, resource, page_size, wake.clone()))
}
