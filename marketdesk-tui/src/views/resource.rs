//! Table, status line and detail drawer for one resource screen.

use crate::screen::{ResourceScreen, SEARCH_FILTER, STATUS_FILTER};
use crate::theme::{status_color, ConsoleTheme};
use crate::widgets::{DetailPanel, FilterBar, FilterOption, StatusIndicator};
use marketdesk_client::ResourceAdapter;
use marketdesk_core::{CollectionStatus, Describe, DrawerState, RemoteCollectionController, Tabular};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

pub fn render<A: ResourceAdapter>(
    f: &mut Frame<'_>,
    area: Rect,
    screen: &ResourceScreen<A>,
    theme: &ConsoleTheme,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    render_status_line(f, rows[0], screen, theme);

    if screen.drawer().is_open() {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(rows[1]);
        render_table(f, columns[0], screen, theme);
        render_drawer(f, columns[1], screen, theme);
    } else {
        render_table(f, rows[1], screen, theme);
    }
}

/// Labels shown in the status line, in display order.
pub fn status_options<T>(collection: &RemoteCollectionController<T>) -> Vec<FilterOption> {
    let request = collection.request();
    let mut options = vec![
        FilterOption::new(
            format!(
                "page {} / {}",
                request.page_number,
                collection.total_pages().max(1)
            ),
            true,
        ),
        FilterOption::new(format!("{} total", collection.total_items()), false),
        FilterOption::new(format!("{} per page", request.page_size), false),
        FilterOption::new(
            format!("sort {} {}", request.sort_field, request.sort_direction),
            false,
        ),
    ];
    match request.filter(STATUS_FILTER) {
        Some(status) if !status.is_empty() => {
            options.push(FilterOption::new(format!("status: {}", status), true))
        }
        _ => options.push(FilterOption::new("status: all", false)),
    }
    if let Some(search) = request.filter(SEARCH_FILTER).filter(|s| !s.is_empty()) {
        options.push(FilterOption::new(format!("search: {}", search), true));
    }
    options
}

fn render_status_line<A: ResourceAdapter>(
    f: &mut Frame<'_>,
    area: Rect,
    screen: &ResourceScreen<A>,
    theme: &ConsoleTheme,
) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(14)])
        .split(area);

    let options = status_options(screen.collection());
    let bar = FilterBar {
        title: screen.adapter().name(),
        filters: &options,
        active_style: Style::default().fg(theme.primary),
        inactive_style: Style::default().fg(theme.text_dim),
    };
    bar.render(f, columns[0]);

    let (label, color) = match screen.collection().status() {
        CollectionStatus::Idle => ("idle", theme.text_dim),
        CollectionStatus::Loading => ("loading", theme.info),
        CollectionStatus::Loaded => ("ready", theme.success),
        CollectionStatus::Error(_) => ("error", theme.error),
    };
    let indicator = StatusIndicator {
        title: "State".to_string(),
        status: label.to_string(),
        style: Style::default().fg(color),
    };
    indicator.render(f, columns[1]);
}

fn render_table<A: ResourceAdapter>(
    f: &mut Frame<'_>,
    area: Rect,
    screen: &ResourceScreen<A>,
    theme: &ConsoleTheme,
) {
    let collection = screen.collection();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border));

    if collection.items().is_empty() {
        let message = match collection.status() {
            CollectionStatus::Loading | CollectionStatus::Idle => "Loading...".to_string(),
            CollectionStatus::Error(err) => err.user_message(),
            CollectionStatus::Loaded => "No records match".to_string(),
        };
        let paragraph = Paragraph::new(message)
            .style(Style::default().fg(theme.text_dim))
            .block(block);
        f.render_widget(paragraph, area);
        return;
    }

    let headers = <A::Summary as Tabular>::headers();
    let header = Row::new(headers.iter().map(|h| Cell::from(*h))).style(
        Style::default()
            .fg(theme.secondary)
            .add_modifier(Modifier::BOLD),
    );
    let rows = collection.items().iter().map(|item| {
        let style = Style::default().fg(status_color(item.status_label(), theme));
        Row::new(item.cells().into_iter().map(Cell::from)).style(style)
    });
    let column_count = headers.len().max(1) as u32;
    let widths: Vec<Constraint> = headers
        .iter()
        .map(|_| Constraint::Ratio(1, column_count))
        .collect();

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .highlight_style(Style::default().bg(theme.bg_highlight).fg(theme.text))
        .highlight_symbol("> ");

    let mut state = TableState::default();
    state.select(Some(screen.selected()));
    f.render_stateful_widget(table, area, &mut state);
}

fn render_drawer<A: ResourceAdapter>(
    f: &mut Frame<'_>,
    area: Rect,
    screen: &ResourceScreen<A>,
    theme: &ConsoleTheme,
) {
    let drawer = screen.drawer();
    let style = Style::default().fg(theme.secondary);
    let border_style = Style::default().fg(theme.border_focus);

    match drawer.state() {
        DrawerState::Closed => {}
        DrawerState::Loading { id, .. } => {
            let panel = DetailPanel {
                title: "Loading...",
                fields: vec![("ID", id.clone())],
                sections: Vec::new(),
                style,
                border_style,
            };
            panel.render(f, area);
        }
        DrawerState::Error { id, error } => {
            let panel = DetailPanel {
                title: "Could not load record",
                fields: vec![
                    ("ID", id.clone()),
                    ("Error", error.user_message()),
                    ("Retry", "press Enter".to_string()),
                ],
                sections: Vec::new(),
                style: Style::default().fg(theme.error),
                border_style,
            };
            panel.render(f, area);
        }
        DrawerState::Loaded { detail, .. } => {
            let title = detail.title();
            let mut fields = detail.fields();
            if drawer.pending_count() > 0 {
                fields.push(("Saving", format!("{} change(s)", drawer.pending_count())));
            }
            if let Some(id) = screen.pending_delete() {
                fields.push(("Delete", format!("{} (y to confirm, Esc to cancel)", id)));
            }
            let panel = DetailPanel {
                title: &title,
                fields,
                sections: detail.sections(),
                style,
                border_style,
            };
            panel.render(f, area);
        }
    }
}
