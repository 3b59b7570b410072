//! Detail panel widget for showing field/value pairs and related sections.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub struct DetailPanel<'a> {
    pub title: &'a str,
    pub fields: Vec<(&'a str, String)>,
    pub sections: Vec<(&'a str, Vec<String>)>,
    pub style: Style,
    pub border_style: Style,
}

impl<'a> DetailPanel<'a> {
    pub fn lines(&self) -> Vec<Line<'_>> {
        let mut lines: Vec<Line> = self
            .fields
            .iter()
            .map(|(label, value)| {
                Line::from(vec![
                    Span::styled(format!("{}: ", label), self.style),
                    Span::raw(value.clone()),
                ])
            })
            .collect();

        for (heading, entries) in &self.sections {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                format!("{} ({})", heading, entries.len()),
                self.style.add_modifier(Modifier::BOLD),
            )));
            if entries.is_empty() {
                lines.push(Line::from("  none"));
            }
            for entry in entries {
                lines.push(Line::from(format!("  {}", entry)));
            }
        }
        lines
    }

    pub fn render(&self, f: &mut Frame<'_>, area: Rect) {
        let text = Text::from(self.lines());
        let widget = Paragraph::new(text)
            .block(
                Block::default()
                    .title(self.title)
                    .borders(Borders::ALL)
                    .border_style(self.border_style),
            )
            .wrap(Wrap { trim: true });

        f.render_widget(widget, area);
    }
}
