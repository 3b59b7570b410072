//! View rendering.

pub mod login;
pub mod resource;

use crate::nav::ScreenKind;
use crate::state::{App, InputMode};
use crate::theme::level_color;
use crate::widgets::StatusIndicator;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const HELP: &str = "Tab/1-7 screens  j/k select  h/l page  +/- size  s sort  f status  c clear  / search  Enter open  a action  d delete  r refresh  L sign out  q quit";

pub fn render_view(f: &mut Frame<'_>, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(2)])
        .split(f.size());

    render_header(f, app, chunks[0]);

    match &app.mode {
        InputMode::Login(form) => login::render(f, chunks[1], form, &app.theme),
        InputMode::Normal | InputMode::Search(_) => app.screen().render(f, chunks[1], &app.theme),
    }

    render_footer(f, app, chunks[2]);
}

fn render_header(f: &mut Frame<'_>, app: &App, area: ratatui::layout::Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(16)])
        .split(area);

    let mut spans = Vec::new();
    for (idx, kind) in ScreenKind::all().iter().enumerate() {
        let style = if *kind == app.active {
            Style::default()
                .fg(app.theme.primary)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.text_dim)
        };
        spans.push(Span::styled(format!(" {} {} ", idx + 1, kind.title()), style));
    }
    let tabs = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .title("Marketdesk Admin")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(tabs, columns[0]);

    let (status, color) = if app.auth.is_signed_in() {
        ("signed in", app.theme.success)
    } else {
        ("signed out", app.theme.warning)
    };
    let session = StatusIndicator {
        title: "Session".to_string(),
        status: status.to_string(),
        style: Style::default().fg(color),
    };
    session.render(f, columns[1]);
}

fn render_footer(f: &mut Frame<'_>, app: &App, area: ratatui::layout::Rect) {
    let line = match &app.mode {
        InputMode::Search(query) => Line::from(vec![
            Span::styled("Search: ", Style::default().fg(app.theme.primary)),
            Span::raw(format!("{}_", query)),
            Span::styled(
                "  (Enter apply, Esc cancel)",
                Style::default().fg(app.theme.text_dim),
            ),
        ]),
        _ => match app.latest_notification() {
            Some(note) => Line::from(Span::styled(
                note.render_line(),
                Style::default().fg(level_color(note.level, &app.theme)),
            )),
            None => Line::from(Span::styled(HELP, Style::default().fg(app.theme.text_dim))),
        },
    };
    f.render_widget(Paragraph::new(line), area);
}
