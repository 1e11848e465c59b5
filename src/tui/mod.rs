// TUI module - Terminal User Interface
//
// Manages the terminal with ratatui: initialization and cleanup, the async
// event loop (keyboard input plus timer ticks), rendering, and the layered
// key dispatch: overlay mode first, then global keys, then page actions.
// Page actions that hit the REST API are awaited inline on this task, so a
// page never has more than one fetch in flight.

pub mod app;
pub mod clipboard;
pub mod components;
pub mod ui;

use crate::list::CapabilitySet;
use crate::list::row_limiter::PAGE_SIZES;
use anyhow::{Context, Result};
use app::{App, Mode};
use components::chooser::Chooser;
use components::form::Editor;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;

/// Run the console until the operator quits
pub async fn run_tui(mut app: App) -> Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to setup terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let result = run_event_loop(&mut terminal, &mut app).await;

    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("Failed to restore terminal")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    result
}

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    // First page loads before the first frame
    app.ensure_activated().await?;

    let mut tick_interval = tokio::time::interval(Duration::from_millis(200));

    loop {
        app.tick();
        app.clamp_cursor();

        terminal
            .draw(|f| ui::draw(f, app))
            .context("Failed to draw terminal")?;

        // Keyboard input is polled with a short timeout so the tick keeps
        // toasts and spinners moving even when the operator is idle
        let key = tokio::task::block_in_place(|| -> Result<Option<KeyEvent>> {
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    return Ok(Some(key));
                }
            }
            Ok(None)
        })?;

        if let Some(key) = key {
            handle_key_event(app, key).await?;
        } else {
            tick_interval.tick().await;
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Layered dispatch: overlay mode first, then global keys, then page keys
async fn handle_key_event(app: &mut App, key: KeyEvent) -> Result<()> {
    if key.kind != KeyEventKind::Press {
        return Ok(());
    }

    let mode = std::mem::replace(&mut app.mode, Mode::Normal);
    match mode {
        Mode::Normal => handle_normal_key(app, key).await?,
        Mode::Help => {
            if !matches!(key.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?')) {
                app.mode = Mode::Help;
            }
        }
        Mode::Detail { title, body } => {
            if !matches!(key.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter) {
                app.mode = Mode::Detail { title, body };
            }
        }
        Mode::Filter(editor) => handle_filter_key(app, editor, key).await?,
        Mode::Form { spec, editor } => handle_form_key(app, spec, editor, key).await?,
        Mode::Chooser(chooser) => handle_chooser_key(app, chooser, key).await?,
    }
    Ok(())
}

async fn handle_normal_key(app: &mut App, key: KeyEvent) -> Result<()> {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('?') => app.mode = Mode::Help,
        KeyCode::Char('L') => app.show_logs = !app.show_logs,
        KeyCode::Char('t') => app.theme = app.theme.next(),

        // Page switching
        KeyCode::Char(']') | KeyCode::Tab => app.next_page().await?,
        KeyCode::Char('[') | KeyCode::BackTab => app.prev_page().await?,

        // Cursor and selection
        KeyCode::Char('j') | KeyCode::Down => app.cursor_down(),
        KeyCode::Char('k') | KeyCode::Up => app.cursor_up(),
        KeyCode::Char(' ') => {
            if let Some(index) = app.cursor_absolute() {
                app.page_mut().toggle_select(index);
            }
        }
        KeyCode::Enter => {
            if let Some(index) = app.cursor_absolute() {
                let title = app.page().title().to_string();
                if let Some(body) = app.page().row_detail(index) {
                    app.mode = Mode::Detail { title, body };
                }
            }
        }

        // Data
        KeyCode::Char('r') => {
            app.page_mut().invoke("refresh").await?;
            app.drain_page_requests();
        }
        KeyCode::Char('f') => {
            let fields = app.page().filter_fields();
            if !fields.is_empty() {
                app.mode = Mode::Filter(Editor::new(fields));
            }
        }
        KeyCode::Char('x') => {
            if app.page().supports("reset-filters") {
                app.page_mut().invoke("reset-filters").await?;
                app.page_mut().invoke("filter").await?;
                app.drain_page_requests();
            }
        }

        // Paging
        KeyCode::Char('n') | KeyCode::Right => {
            let info = app.page().page_info();
            let next = info.offset + 1;
            if info.pageable && (!info.client_paged || next <= info.last_page) {
                app.page_mut().goto_page(next).await?;
            }
        }
        KeyCode::Char('p') | KeyCode::Left => {
            let info = app.page().page_info();
            if info.pageable && info.offset > 0 {
                app.page_mut().goto_page(info.offset - 1).await?;
            }
        }
        KeyCode::Char('<') => {
            if app.page().page_info().pageable {
                app.page_mut().goto_page(0).await?;
            }
        }
        KeyCode::Char('>') => {
            let info = app.page().page_info();
            if info.pageable {
                app.page_mut().goto_page(info.last_page).await?;
            }
        }
        KeyCode::Char('P') => {
            if app.page().page_info().pageable {
                let items: Vec<String> = PAGE_SIZES.iter().map(|s| s.to_string()).collect();
                app.mode = Mode::Chooser(Chooser::new("page-size", "Rows per page", items));
            }
        }

        // Sorting
        KeyCode::Char('o') => {
            let sortable = app.page().sortable_columns();
            if !sortable.is_empty() {
                let items: Vec<String> = sortable.iter().map(|(_, name)| name.to_string()).collect();
                let values: Vec<String> = sortable.iter().map(|(prop, _)| prop.to_string()).collect();
                app.mode = Mode::Chooser(
                    Chooser::new("sort-column", "Sort by", items).with_values(values),
                );
            }
        }

        // Columns
        KeyCode::Char('c') => {
            let picker = app.page().columns();
            let items: Vec<String> = picker
                .all()
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    format!("[{}] {}", if picker.is_visible(i) { "x" } else { " " }, c.name)
                })
                .collect();
            let values: Vec<String> = (0..picker.all().len()).map(|i| i.to_string()).collect();
            app.mode = Mode::Chooser(
                Chooser::new("columns", "Columns", items)
                    .with_values(values)
                    .multi(),
            );
        }

        // Editing
        KeyCode::Char('a') => {
            if app.page().capabilities().contains(CapabilitySet::MODIFIABLE) {
                if let Some(spec) = app.page_mut().begin_add() {
                    let editor = Editor::new(spec.fields.clone());
                    app.mode = Mode::Form { spec, editor };
                }
            }
        }
        KeyCode::Char('e') => {
            if let Some(spec) = app.page_mut().begin_edit() {
                let editor = Editor::new(spec.fields.clone());
                app.mode = Mode::Form { spec, editor };
            }
        }
        KeyCode::Char('d') => {
            app.page_mut().delete_selected().await?;
            app.clamp_cursor();
        }
        KeyCode::Char('s') => {
            if app.page().supports("save") {
                app.page_mut().invoke("save").await?;
            }
        }
        KeyCode::Char('u') => {
            if app.page().supports("cancel") {
                app.page_mut().invoke("cancel").await?;
            }
        }
        KeyCode::Char('m') => {
            if app.page().supports("move") {
                app.page_mut().invoke("move").await?;
                app.drain_page_requests();
            }
        }

        // Operations menu: everything the page composed
        KeyCode::Char('O') => {
            let ops = app.page().operations();
            if !ops.is_empty() {
                let items: Vec<String> = ops.iter().map(|o| o.to_string()).collect();
                app.mode = Mode::Chooser(Chooser::new("operation", "Operations", items));
            }
        }

        // Clipboard
        KeyCode::Char('y') => {
            if let Some(text) = app.page().copy_selected() {
                match clipboard::copy_to_clipboard(&text) {
                    Ok(()) => app.show_toast("Copied to clipboard"),
                    Err(_) => app.show_toast("Failed to copy"),
                }
            }
        }
        KeyCode::Char('Y') => {
            if let Some(url) = app.page().export_url() {
                match clipboard::copy_to_clipboard(&url) {
                    Ok(()) => app.show_toast("Export URL copied to clipboard"),
                    Err(_) => app.show_toast("Failed to copy"),
                }
            }
        }

        _ => {}
    }
    Ok(())
}

async fn handle_filter_key(app: &mut App, mut editor: Editor, key: KeyEvent) -> Result<()> {
    if editor.editing {
        match key.code {
            KeyCode::Enter => {
                if let Some((field, value)) = editor.commit_edit() {
                    app.page_mut().set_filter_field(field, &value);
                }
            }
            KeyCode::Esc => editor.abandon_edit(),
            KeyCode::Backspace => editor.pop_char(),
            KeyCode::Char(c) => editor.push_char(c),
            _ => {}
        }
        app.mode = Mode::Filter(editor);
        return Ok(());
    }

    match key.code {
        KeyCode::Esc => return Ok(()),
        KeyCode::Char('j') | KeyCode::Down => editor.down(),
        KeyCode::Char('k') | KeyCode::Up => editor.up(),
        KeyCode::Enter => editor.begin_edit(),
        KeyCode::Char('s') => {
            app.page_mut().invoke("filter").await?;
            app.drain_page_requests();
            app.cursor = 0;
            return Ok(());
        }
        KeyCode::Char('r') => {
            app.page_mut().invoke("reset-filters").await?;
            editor = Editor::new(app.page().filter_fields());
        }
        _ => {}
    }
    app.mode = Mode::Filter(editor);
    Ok(())
}

async fn handle_form_key(
    app: &mut App,
    spec: crate::pages::FormSpec,
    mut editor: Editor,
    key: KeyEvent,
) -> Result<()> {
    if editor.editing {
        match key.code {
            KeyCode::Enter => {
                editor.commit_edit();
            }
            KeyCode::Esc => editor.abandon_edit(),
            KeyCode::Backspace => editor.pop_char(),
            KeyCode::Char(c) => editor.push_char(c),
            _ => {}
        }
        app.mode = Mode::Form { spec, editor };
        return Ok(());
    }

    match key.code {
        KeyCode::Esc => {
            app.page_mut().cancel_form(spec).await?;
            app.clamp_cursor();
            return Ok(());
        }
        KeyCode::Char('j') | KeyCode::Down => editor.down(),
        KeyCode::Char('k') | KeyCode::Up => editor.up(),
        KeyCode::Enter => editor.begin_edit(),
        KeyCode::Char('s') => {
            let mut committed = spec;
            committed.fields = editor.fields.clone();
            app.page_mut().commit_form(committed).await?;
            app.drain_page_requests();
            app.clamp_cursor();
            return Ok(());
        }
        _ => {}
    }
    app.mode = Mode::Form { spec, editor };
    Ok(())
}

async fn handle_chooser_key(app: &mut App, mut chooser: Chooser, key: KeyEvent) -> Result<()> {
    match key.code {
        KeyCode::Esc => return Ok(()),
        KeyCode::Char('j') | KeyCode::Down => chooser.down(),
        KeyCode::Char('k') | KeyCode::Up => chooser.up(),
        KeyCode::Char(' ') if chooser.multi => {
            apply_chooser(app, &chooser).await?;
            // Rebuild the item labels to reflect the toggled state
            if chooser.kind == "columns" {
                let picker = app.page().columns();
                chooser.items = picker
                    .all()
                    .iter()
                    .enumerate()
                    .map(|(i, c)| {
                        format!("[{}] {}", if picker.is_visible(i) { "x" } else { " " }, c.name)
                    })
                    .collect();
            }
        }
        KeyCode::Enter => {
            if chooser.multi {
                return Ok(());
            }
            apply_chooser(app, &chooser).await?;
            // The applied choice may itself queue a follow-up dialog
            if !app.drain_page_requests() {
                app.clamp_cursor();
            }
            return Ok(());
        }
        _ => {}
    }
    app.mode = Mode::Chooser(chooser);
    Ok(())
}

/// Dispatch a chooser selection: app-level kinds first, page kinds last
async fn apply_chooser(app: &mut App, chooser: &Chooser) -> Result<()> {
    let Some(value) = chooser.selected_value().map(str::to_string) else {
        return Ok(());
    };

    match chooser.kind.as_str() {
        "page-size" => {
            if let Ok(size) = value.parse::<usize>() {
                app.page_mut().change_page_size(size).await?;
                app.cursor = 0;
            }
        }
        "sort-column" => {
            app.page_mut().sort_on(&value).await?;
        }
        "columns" => {
            if let Ok(index) = value.parse::<usize>() {
                app.page_mut().toggle_column(index);
            }
        }
        "operation" => {
            app.page_mut().invoke(&value).await?;
        }
        kind => {
            let kind = kind.to_string();
            app.page_mut().choose(&kind, &value).await?;
        }
    }
    Ok(())
}
