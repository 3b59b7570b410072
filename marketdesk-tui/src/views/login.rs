//! Sign-in form.

use crate::state::{LoginField, LoginForm};
use crate::theme::ConsoleTheme;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame<'_>, area: Rect, form: &LoginForm, theme: &ConsoleTheme) {
    let area = centered(area, 50, 8);

    let field_style = |field: LoginField| {
        if form.focus == field {
            Style::default().fg(theme.primary)
        } else {
            Style::default().fg(theme.text_dim)
        }
    };
    let masked = "*".repeat(form.password.chars().count());
    let status = if form.submitting {
        Span::styled("Signing in...", Style::default().fg(theme.info))
    } else {
        Span::styled(
            "Tab switch field, Enter submit, Esc quit",
            Style::default().fg(theme.text_dim),
        )
    };

    let lines = vec![
        Line::from(vec![
            Span::styled("Email:    ", field_style(LoginField::Email)),
            Span::raw(form.email.clone()),
        ]),
        Line::from(vec![
            Span::styled("Password: ", field_style(LoginField::Password)),
            Span::raw(masked),
        ]),
        Line::default(),
        Line::from(status),
    ];

    let widget = Paragraph::new(lines).block(
        Block::default()
            .title("Sign in")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border_focus)),
    );
    f.render_widget(widget, area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(width),
            Constraint::Min(0),
        ])
        .split(vertical[1])[1]
}
