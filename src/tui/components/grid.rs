//! Data grid component - renders a page's grid snapshot as a table

use crate::pages::Grid;
use crate::theme::Theme;
use crate::util;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

/// Render the grid with the cursor row highlighted and selected rows marked
pub fn render(
    f: &mut Frame,
    area: Rect,
    grid: &Grid,
    cursor: usize,
    title: &str,
    busy: bool,
    theme: &Theme,
) {
    let header = {
        let mut cells = vec![Cell::from(" ")];
        cells.extend(
            grid.columns
                .iter()
                .map(|c| Cell::from(c.name).style(Style::default().fg(theme.header))),
        );
        Row::new(cells).style(Style::default().add_modifier(Modifier::BOLD))
    };

    let rows = grid.rows.iter().enumerate().map(|(i, cells)| {
        let absolute = grid.row_offset + i;
        let selected = grid.selected.contains(&absolute);
        let marker = if selected { "*" } else { " " };

        let mut row_cells = vec![Cell::from(marker)];
        row_cells.extend(cells.iter().zip(grid.columns.iter()).map(|(value, col)| {
            Cell::from(util::fit_cell(value, col.width as usize))
        }));

        let style = if selected {
            Style::default().fg(theme.selection).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.foreground)
        };
        Row::new(row_cells).style(style)
    });

    let mut widths = vec![Constraint::Length(1)];
    widths.extend(grid.columns.iter().map(|c| Constraint::Length(c.width)));

    let block_title = if busy {
        format!(" {} (loading…) ", title)
    } else {
        format!(" {} ", title)
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border))
                .title(block_title),
        )
        .row_highlight_style(
            Style::default()
                .bg(theme.selection)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = TableState::default();
    if !grid.rows.is_empty() {
        state.select(Some(cursor.min(grid.rows.len() - 1)));
    }

    f.render_stateful_widget(table, area, &mut state);
}
