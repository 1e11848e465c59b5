//! Title bar component - page tabs plus the product name

use crate::theme::Theme;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Render the page tabs; the active page is highlighted
pub fn render(f: &mut Frame, area: Rect, titles: &[&str], active: usize, theme: &Theme) {
    let mut spans: Vec<Span> = vec![Span::styled(
        " gwcon ",
        Style::default()
            .fg(theme.title)
            .add_modifier(Modifier::BOLD),
    )];

    for (i, title) in titles.iter().enumerate() {
        spans.push(Span::raw("│"));
        let style = if i == active {
            Style::default()
                .fg(theme.highlight)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.foreground)
        };
        spans.push(Span::styled(format!(" {} ", title), style));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(theme.status_bar));
    f.render_widget(paragraph, area);
}
