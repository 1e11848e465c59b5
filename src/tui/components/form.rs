//! Form editor modal - line-based editing of filter criteria and add/edit
//! dialogs
//!
//! One field is focused at a time; Enter opens it for editing, Esc abandons
//! the keystrokes, Enter commits them back into the field.

use super::centered_rect;
use crate::pages::Field;
use crate::theme::Theme;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// Editor state shared by the filter form and the add/edit forms
pub struct Editor {
    pub fields: Vec<Field>,
    pub selected: usize,
    pub editing: bool,
    pub buffer: String,
}

impl Editor {
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            fields,
            selected: 0,
            editing: false,
            buffer: String::new(),
        }
    }

    pub fn up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn down(&mut self) {
        if self.selected + 1 < self.fields.len() {
            self.selected += 1;
        }
    }

    pub fn begin_edit(&mut self) {
        if let Some(field) = self.fields.get(self.selected) {
            self.buffer = field.value.clone();
            self.editing = true;
        }
    }

    /// Commit the buffer into the focused field; returns its key
    pub fn commit_edit(&mut self) -> Option<(&'static str, String)> {
        self.editing = false;
        let field = self.fields.get_mut(self.selected)?;
        field.value = self.buffer.clone();
        Some((field.key, field.value.clone()))
    }

    pub fn abandon_edit(&mut self) {
        self.editing = false;
        self.buffer.clear();
    }

    pub fn push_char(&mut self, c: char) {
        self.buffer.push(c);
    }

    pub fn pop_char(&mut self) {
        self.buffer.pop();
    }
}

pub fn render(
    f: &mut Frame,
    area: Rect,
    title: &str,
    editor: &Editor,
    hints: &[String],
    footer: &str,
    theme: &Theme,
) {
    let label_width = editor
        .fields
        .iter()
        .map(|f| f.label.len())
        .max()
        .unwrap_or(10);

    let mut lines: Vec<Line> = editor
        .fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let focused = i == editor.selected;
            let marker = if focused { "▸" } else { " " };
            let value = if focused && editor.editing {
                format!("{}▏", editor.buffer)
            } else {
                field.value.clone()
            };
            let label_style = if focused {
                Style::default()
                    .fg(theme.highlight)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.header)
            };
            Line::from(vec![
                Span::raw(format!(" {} ", marker)),
                Span::styled(format!("{:label_width$} ", field.label), label_style),
                Span::styled(value, Style::default().fg(theme.foreground)),
            ])
        })
        .collect();

    if !hints.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" known: {}", hints.join(", ")),
            Style::default().fg(theme.border),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!(" {}", footer),
        Style::default().fg(theme.border),
    )));

    let height = lines.len() as u16 + 2;
    let modal = centered_rect(64, height.min(area.height), area);

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.highlight))
            .title(format!(" {} ", title))
            .style(Style::default().bg(theme.background)),
    );

    f.render_widget(Clear, modal);
    f.render_widget(paragraph, modal);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_cycle_commits_into_the_field() {
        let mut editor = Editor::new(vec![Field::new("user", "User", "admin")]);
        editor.begin_edit();
        assert!(editor.editing);
        editor.pop_char();
        editor.pop_char();
        editor.push_char('x');
        let (key, value) = editor.commit_edit().unwrap();
        assert_eq!(key, "user");
        assert_eq!(value, "admx");
        assert_eq!(editor.fields[0].value, "admx");
    }

    #[test]
    fn test_abandon_keeps_the_original_value() {
        let mut editor = Editor::new(vec![Field::new("user", "User", "admin")]);
        editor.begin_edit();
        editor.push_char('!');
        editor.abandon_edit();
        assert_eq!(editor.fields[0].value, "admin");
        assert!(!editor.editing);
    }
}
