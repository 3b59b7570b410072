//! Notification system for the console.

use chrono::{DateTime, Utc};
use marketdesk_core::ConsoleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
    Success,
}

impl NotificationLevel {
    pub fn label(&self) -> &'static str {
        match self {
            NotificationLevel::Info => "INFO",
            NotificationLevel::Warning => "WARN",
            NotificationLevel::Error => "ERROR",
            NotificationLevel::Success => "OK",
        }
    }
}

/// Follow-up the user can take on a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAction {
    /// Press Enter to reopen the drawer.
    Retry,
    /// The session is no longer valid; the console asks for credentials.
    SignIn,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub action: Option<NotificationAction>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            action: None,
            created_at: Utc::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message)
    }

    /// Error notification for a failed operation. A 401 asks for sign-in.
    pub fn failure(context: &str, error: &ConsoleError) -> Self {
        let note = Self::new(
            NotificationLevel::Error,
            format!("{}: {}", context, error.user_message()),
        );
        if error.is_unauthorized() {
            note.with_action(NotificationAction::SignIn)
        } else {
            note
        }
    }

    pub fn with_action(mut self, action: NotificationAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Footer line: level, local time and message.
    pub fn render_line(&self) -> String {
        let hint = match self.action {
            Some(NotificationAction::Retry) => " (Enter to retry)",
            Some(NotificationAction::SignIn) => " (sign in again)",
            None => "",
        };
        format!(
            "{} {} {}{}",
            self.level.label(),
            self.created_at
                .with_timezone(&chrono::Local)
                .format("%H:%M:%S"),
            self.message,
            hint
        )
    }
}
