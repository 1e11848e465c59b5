//! Chooser modal - a centered pick list
//!
//! Serves every selection dialog: page size, sort column, operations menu,
//! column visibility, and page-provided choosers (queues, log levels).

use super::centered_rect;
use crate::theme::Theme;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, List, ListItem, ListState},
    Frame,
};

/// Chooser state held by the app while the modal is open
pub struct Chooser {
    pub kind: String,
    pub title: String,
    pub items: Vec<String>,
    /// Values dispatched on selection; parallel to `items`
    pub values: Vec<String>,
    pub selected: usize,
    /// Multi-toggle choosers (column picker) stay open on selection
    pub multi: bool,
}

impl Chooser {
    pub fn new(kind: impl Into<String>, title: impl Into<String>, items: Vec<String>) -> Self {
        let values = items.clone();
        Self {
            kind: kind.into(),
            title: title.into(),
            items,
            values,
            selected: 0,
            multi: false,
        }
    }

    pub fn with_values(mut self, values: Vec<String>) -> Self {
        self.values = values;
        self
    }

    pub fn multi(mut self) -> Self {
        self.multi = true;
        self
    }

    pub fn up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn down(&mut self) {
        if self.selected + 1 < self.items.len() {
            self.selected += 1;
        }
    }

    pub fn selected_value(&self) -> Option<&str> {
        self.values.get(self.selected).map(String::as_str)
    }
}

pub fn render(f: &mut Frame, area: Rect, chooser: &Chooser, theme: &Theme) {
    let width = chooser
        .items
        .iter()
        .map(|i| i.len())
        .chain([chooser.title.len()])
        .max()
        .unwrap_or(20) as u16
        + 6;
    let height = chooser.items.len() as u16 + 2;
    let modal = centered_rect(width.max(30), height.min(area.height), area);

    let items: Vec<ListItem> = chooser
        .items
        .iter()
        .map(|i| ListItem::new(Line::from(format!(" {} ", i))))
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.highlight))
                .title(format!(" {} ", chooser.title))
                .style(Style::default().bg(theme.background)),
        )
        .highlight_style(
            Style::default()
                .bg(theme.selection)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    state.select(Some(chooser.selected));

    f.render_widget(Clear, modal);
    f.render_stateful_widget(list, modal, &mut state);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_is_bounded() {
        let mut c = Chooser::new("page-size", "Page size", vec!["10".into(), "25".into()]);
        c.up();
        assert_eq!(c.selected, 0);
        c.down();
        c.down();
        assert_eq!(c.selected, 1);
        assert_eq!(c.selected_value(), Some("25"));
    }

    #[test]
    fn test_values_default_to_items() {
        let c = Chooser::new("op", "Operations", vec!["save".into()]);
        assert_eq!(c.selected_value(), Some("save"));
        let c = c.with_values(vec!["0".into()]);
        assert_eq!(c.selected_value(), Some("0"));
    }
}
