//! Filterable behavior
//!
//! Pages hold their criteria twice: `edited` is what the filter form is
//! changing, `active` is what the last search actually used. A search
//! copies edited over active, so an abandoned form edit never leaks into a
//! refetch triggered by paging or sorting.

use super::state::BaseList;

/// Edited and active copies of a page's filter criteria
#[derive(Debug, Clone, Default)]
pub struct FilterState<F> {
    pub edited: F,
    pub active: F,
}

impl<F: Default> FilterState<F> {
    pub fn new() -> Self {
        Self {
            edited: F::default(),
            active: F::default(),
        }
    }

    /// Restore the form to default criteria
    pub fn reset_edited(&mut self) {
        self.edited = F::default();
    }
}

impl<F: Clone> FilterState<F> {
    /// Make the edited criteria the active ones (a search is running)
    pub fn activate(&mut self) {
        self.active = self.edited.clone();
    }
}

impl<F: Default + PartialEq> FilterState<F> {
    /// Whether the last search used anything beyond the defaults
    pub fn is_filtered(&self) -> bool {
        self.active != F::default()
    }
}

/// Filtering capability over the base list
pub trait Filterable: BaseList {
    type Criteria: Clone + Default;

    fn filter(&self) -> &FilterState<Self::Criteria>;

    fn filter_mut(&mut self) -> &mut FilterState<Self::Criteria>;

    /// Apply the edited criteria and fetch matching rows. On failure the
    /// alert surfaces through `reload` and row state stays untouched.
    async fn filter_data(&mut self) -> anyhow::Result<()> {
        self.filter_mut().activate();
        self.reload().await
    }

    /// Restore default criteria (the form only; the next search applies it)
    fn reset_filters(&mut self) {
        self.filter_mut().reset_edited();
    }

    /// Guarded search: a user-initiated search while edits are unsaved is
    /// refused, so filtering never silently discards work. Returns whether
    /// the search ran.
    async fn try_filter(&mut self, user_initiated: bool) -> anyhow::Result<bool> {
        if user_initiated && self.has_unsaved_changes() {
            self.alerts()
                .info("There are unsaved changes: save or cancel them before searching");
            return Ok(false);
        }
        self.filter_data().await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Criteria {
        user: Option<String>,
    }

    #[test]
    fn test_activate_copies_edited_over_active() {
        let mut state: FilterState<Criteria> = FilterState::new();
        state.edited.user = Some("admin".to_string());
        assert!(!state.is_filtered());
        state.activate();
        assert!(state.is_filtered());
        assert_eq!(state.active.user.as_deref(), Some("admin"));
    }

    #[test]
    fn test_reset_touches_only_the_form() {
        let mut state: FilterState<Criteria> = FilterState::new();
        state.edited.user = Some("admin".to_string());
        state.activate();
        state.reset_edited();
        assert_eq!(state.edited, Criteria::default());
        // The active criteria change only on the next search
        assert!(state.is_filtered());
        state.activate();
        assert!(!state.is_filtered());
    }
}
