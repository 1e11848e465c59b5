//! Base list state and behavior
//!
//! Every page owns exactly one [`ListState`]: the rows on display, the
//! authoritative total, the selection, and the busy/loading flags that gate
//! duplicate fetch triggers. Only the owning page mutates it.

use crate::alert::AlertBus;
use crate::rest::error::RestError;

/// Shared state of a list page
#[derive(Debug)]
pub struct ListState<R> {
    pub rows: Vec<R>,

    /// Authoritative total: server-reported when server-paged, `rows.len()`
    /// when client-paged. Never the size of the displayed slice.
    pub count: usize,

    /// Indices into `rows` of the selected subset
    pub selected: Vec<usize>,

    /// A fetch is in flight
    pub loading: bool,

    /// A save is in flight
    pub saving: bool,
}

impl<R> ListState<R> {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            count: 0,
            selected: Vec::new(),
            loading: false,
            saving: false,
        }
    }

    /// Replace rows with a server-counted result
    pub fn set_results(&mut self, rows: Vec<R>, count: usize) {
        self.rows = rows;
        self.count = count;
        self.selected.clear();
    }

    /// Replace rows for a client-paged list; the count is the row total
    pub fn set_client_rows(&mut self, rows: Vec<R>) {
        let count = rows.len();
        self.set_results(rows, count);
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn toggle_selected(&mut self, index: usize) {
        if index >= self.rows.len() {
            return;
        }
        if let Some(pos) = self.selected.iter().position(|&i| i == index) {
            self.selected.remove(pos);
        } else {
            self.selected.push(index);
        }
    }

    /// The selected rows, in selection order
    pub fn selected_rows(&self) -> Vec<&R> {
        self.selected
            .iter()
            .filter_map(|&i| self.rows.get(i))
            .collect()
    }
}

impl<R> Default for ListState<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Common contract of every list page: state access plus the page-specific
/// data fetch. The provided `reload` wraps the fetch with the loading-flag
/// gate and failure surfacing, so row state is never left half-updated.
pub trait BaseList {
    type Row;

    fn page_name(&self) -> &'static str;

    fn list(&self) -> &ListState<Self::Row>;

    fn list_mut(&mut self) -> &mut ListState<Self::Row>;

    fn alerts(&self) -> &AlertBus;

    /// Fetch rows (using whatever criteria/paging/sorting state the page
    /// carries) and replace row state on success
    async fn load_data(&mut self) -> Result<(), RestError>;

    /// Whether navigation away from the current edits would lose work
    fn has_unsaved_changes(&self) -> bool {
        false
    }

    fn is_busy(&self) -> bool {
        self.list().loading || self.list().saving
    }

    /// Guarded fetch: a trigger while loading is a no-op, a failure is
    /// surfaced and leaves the previous rows in place
    async fn reload(&mut self) -> anyhow::Result<()> {
        if self.list().loading {
            tracing::debug!("{}: fetch already in flight, ignoring", self.page_name());
            return Ok(());
        }

        self.list_mut().loading = true;
        let result = self.load_data().await;
        self.list_mut().loading = false;

        if let Err(err) = result {
            let context = format!("Error loading {}", self.page_name());
            self.alerts().exception(&context, &err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_results_clears_selection() {
        let mut state: ListState<u32> = ListState::new();
        state.rows = vec![1, 2, 3];
        state.selected = vec![0, 2];
        state.set_results(vec![7], 42);
        assert_eq!(state.rows, vec![7]);
        assert_eq!(state.count, 42);
        assert!(state.selected.is_empty());
    }

    #[test]
    fn test_client_rows_count_follows_len() {
        let mut state: ListState<u32> = ListState::new();
        state.set_client_rows(vec![1, 2, 3, 4]);
        assert_eq!(state.count, 4);
    }

    #[test]
    fn test_toggle_selection_bounds_checked() {
        let mut state: ListState<u32> = ListState::new();
        state.set_client_rows(vec![10, 20]);
        state.toggle_selected(1);
        state.toggle_selected(5);
        assert_eq!(state.selected, vec![1]);
        state.toggle_selected(1);
        assert!(state.selected.is_empty());
    }

    #[test]
    fn test_selected_rows_in_selection_order() {
        let mut state: ListState<&'static str> = ListState::new();
        state.set_client_rows(vec!["a", "b", "c"]);
        state.toggle_selected(2);
        state.toggle_selected(0);
        assert_eq!(state.selected_rows(), vec![&"c", &"a"]);
    }
}
