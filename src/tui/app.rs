//! TUI application state
//!
//! Holds the page registry, the active page and cursor, the current input
//! mode (normal, editor, chooser, overlay), and the transient toast fed
//! from the alert bus.

use super::components::chooser::Chooser;
use super::components::form::Editor;
use super::components::toast::Toast;
use crate::alert::AlertBus;
use crate::logging::LogBuffer;
use crate::pages::{ChooserRequest, FormSpec, PageView};
use crate::theme::Theme;

/// What the keyboard is currently driving
pub enum Mode {
    Normal,
    Help,
    /// Full-row detail overlay
    Detail { title: String, body: String },
    /// Filter criteria editor
    Filter(Editor),
    /// Add/edit/upload form
    Form { spec: FormSpec, editor: Editor },
    Chooser(Chooser),
}

pub struct App {
    pub pages: Vec<Box<dyn PageView>>,
    activated: Vec<bool>,
    pub active: usize,

    /// Cursor within the visible grid rows
    pub cursor: usize,

    pub mode: Mode,
    pub theme: Theme,
    pub alerts: AlertBus,
    pub log_buffer: LogBuffer,
    pub show_logs: bool,
    pub toast: Option<Toast>,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        pages: Vec<Box<dyn PageView>>,
        alerts: AlertBus,
        log_buffer: LogBuffer,
        theme: Theme,
    ) -> Self {
        let activated = vec![false; pages.len()];
        Self {
            pages,
            activated,
            active: 0,
            cursor: 0,
            mode: Mode::Normal,
            theme,
            alerts,
            log_buffer,
            show_logs: false,
            toast: None,
            should_quit: false,
        }
    }

    pub fn page(&self) -> &dyn PageView {
        self.pages[self.active].as_ref()
    }

    pub fn page_mut(&mut self) -> &mut dyn PageView {
        self.pages[self.active].as_mut()
    }

    /// Run the page's initial fetch on first visit
    pub async fn ensure_activated(&mut self) -> anyhow::Result<()> {
        if !self.activated[self.active] {
            self.activated[self.active] = true;
            let page = self.pages[self.active].as_mut();
            page.activate().await?;
        }
        Ok(())
    }

    pub async fn next_page(&mut self) -> anyhow::Result<()> {
        self.active = (self.active + 1) % self.pages.len();
        self.cursor = 0;
        self.ensure_activated().await
    }

    pub async fn prev_page(&mut self) -> anyhow::Result<()> {
        self.active = (self.active + self.pages.len() - 1) % self.pages.len();
        self.cursor = 0;
        self.ensure_activated().await
    }

    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_down(&mut self) {
        let rows = self.page().grid().rows.len();
        if self.cursor + 1 < rows {
            self.cursor += 1;
        }
    }

    /// Keep the cursor inside the visible rows after a data change
    pub fn clamp_cursor(&mut self) {
        let rows = self.page().grid().rows.len();
        if rows == 0 {
            self.cursor = 0;
        } else if self.cursor >= rows {
            self.cursor = rows - 1;
        }
    }

    /// Absolute row index under the cursor
    pub fn cursor_absolute(&self) -> Option<usize> {
        let grid = self.page().grid();
        if grid.rows.is_empty() {
            None
        } else {
            Some(grid.row_offset + self.cursor.min(grid.rows.len() - 1))
        }
    }

    /// Per-frame housekeeping: expire the toast, then promote the next
    /// queued alert into one
    pub fn tick(&mut self) {
        if self.toast.as_ref().map(|t| t.is_expired()).unwrap_or(false) {
            self.toast = None;
        }
        if self.toast.is_none() {
            if let Some(alert) = self.alerts.pop() {
                self.toast = Some(Toast::new(alert.message, alert.level));
            }
        }
    }

    pub fn show_toast(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast::new(message, crate::alert::AlertLevel::Info));
    }

    /// Open a chooser or form the page queued during its last call.
    /// Returns whether one was opened.
    pub fn drain_page_requests(&mut self) -> bool {
        let page = self.pages[self.active].as_mut();
        if let Some(request) = page.take_chooser() {
            self.mode = Mode::Chooser(chooser_from(request));
            return true;
        }
        if let Some(spec) = page.take_form() {
            let editor = Editor::new(spec.fields.clone());
            self.mode = Mode::Form { spec, editor };
            return true;
        }
        false
    }
}

fn chooser_from(request: ChooserRequest) -> Chooser {
    Chooser::new(request.kind, request.title, request.items)
}
