//! Frame rendering - layout and overlay dispatch

use super::app::{App, Mode};
use super::components::{self, centered_rect, chooser, form, grid, logs_panel, status_bar, title_bar};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const HELP_TEXT: &str = "\
 Navigation        Data
 ─────────────     ─────────────
 ]/[  next/prev    r  refresh
 j/k  move cursor  f  filter editor
 spc  select row   x  reset filters
 ent  row detail   n/p next/prev page
                   P  page size
 Editing           o  sort column
 ─────────────     c  columns
 a  add            O  operations menu
 e  edit           y  copy row
 d  delete         Y  copy export URL
 s  save
 u  cancel edits   L  logs  t theme
 m  move (JMS)     q  quit";

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    let logs_height = if app.show_logs { 10 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(logs_height),
            Constraint::Length(1),
        ])
        .split(area);

    let titles: Vec<&str> = app.pages.iter().map(|p| p.title()).collect();
    title_bar::render(f, chunks[0], &titles, app.active, &app.theme);

    let page = app.page();
    let page_grid = page.grid();
    let info = page.page_info();
    let busy = page.is_working();
    grid::render(
        f,
        chunks[1],
        &page_grid,
        app.cursor,
        page.title(),
        busy,
        &app.theme,
    );

    if app.show_logs {
        logs_panel::render(f, chunks[2], &app.log_buffer, &app.theme);
    }

    status_bar::render(f, chunks[3], &page.status_line(), info, busy, &app.theme);

    match &app.mode {
        Mode::Normal => {}
        Mode::Help => draw_help(f, area, app),
        Mode::Detail { title, body } => draw_detail(f, area, app, title, body),
        Mode::Filter(editor) => {
            let hints = editor
                .fields
                .get(editor.selected)
                .map(|field| page.filter_hints(field.key))
                .unwrap_or_default();
            form::render(
                f,
                area,
                "Filter",
                editor,
                &hints,
                "enter edit · s search · r reset · esc close",
                &app.theme,
            );
        }
        Mode::Form { spec, editor } => {
            form::render(
                f,
                area,
                &spec.title,
                editor,
                &[],
                "enter edit · s submit · esc cancel",
                &app.theme,
            );
        }
        Mode::Chooser(c) => chooser::render(f, area, c, &app.theme),
    }

    if let Some(toast) = &app.toast {
        toast.render(f, area, &app.theme);
    }
}

fn draw_help(f: &mut Frame, area: Rect, app: &App) {
    let modal = centered_rect(46, 20, area);
    let paragraph = Paragraph::new(HELP_TEXT)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.highlight))
                .title(" Help ")
                .style(Style::default().bg(app.theme.background)),
        )
        .style(Style::default().fg(app.theme.foreground));
    f.render_widget(Clear, modal);
    f.render_widget(paragraph, modal);
}

fn draw_detail(f: &mut Frame, area: Rect, app: &App, title: &str, body: &str) {
    let height = (body.lines().count() as u16 + 4).min(area.height);
    let modal = components::centered_rect(70, height, area);
    let paragraph = Paragraph::new(body)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.highlight))
                .title(format!(" {} ", title))
                .style(Style::default().bg(app.theme.background)),
        )
        .style(Style::default().fg(app.theme.foreground));
    f.render_widget(Clear, modal);
    f.render_widget(paragraph, modal);
}
