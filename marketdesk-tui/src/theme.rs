//! Console theme and color utilities.

use crate::notifications::NotificationLevel;
use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct ConsoleTheme {
    pub bg: Color,
    pub bg_highlight: Color,
    pub primary: Color,
    pub primary_dim: Color,
    pub secondary: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub text: Color,
    pub text_dim: Color,
    pub border: Color,
    pub border_focus: Color,
}

impl ConsoleTheme {
    pub fn standard() -> Self {
        Self {
            bg: Color::Rgb(10, 10, 10),
            bg_highlight: Color::Rgb(42, 42, 42),
            primary: Color::Rgb(0, 255, 255),
            primary_dim: Color::Rgb(0, 136, 136),
            secondary: Color::Rgb(255, 0, 255),
            success: Color::Rgb(0, 255, 0),
            warning: Color::Rgb(255, 255, 0),
            error: Color::Rgb(255, 0, 0),
            info: Color::Rgb(0, 255, 255),
            text: Color::Rgb(255, 255, 255),
            text_dim: Color::Rgb(136, 136, 136),
            border: Color::Rgb(68, 68, 68),
            border_focus: Color::Rgb(0, 255, 255),
        }
    }
}

impl Default for ConsoleTheme {
    fn default() -> Self {
        Self::standard()
    }
}

/// Row color for a record status label, shared by every screen.
pub fn status_color(status: &str, theme: &ConsoleTheme) -> Color {
    match status.trim().to_ascii_lowercase().as_str() {
        "active" | "verified" | "completed" | "visible" | "read" => theme.success,
        "confirmed" | "in-progress" => theme.primary,
        "pending" | "unverified" | "unread" => theme.warning,
        "cancelled" | "expired" | "inactive" | "hidden" => theme.error,
        _ => theme.text_dim,
    }
}

pub fn level_color(level: NotificationLevel, theme: &ConsoleTheme) -> Color {
    match level {
        NotificationLevel::Info => theme.info,
        NotificationLevel::Warning => theme.warning,
        NotificationLevel::Error => theme.error,
        NotificationLevel::Success => theme.success,
    }
}
