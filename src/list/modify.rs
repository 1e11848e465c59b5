//! Modifiable behavior - dirty tracking and the generic save flow
//!
//! The dirty state tracks three disjoint key sets: rows added since the
//! last save, rows updated in place, and rows marked for removal. A key is
//! in at most one set. Removing a never-saved row discards it entirely -
//! the change-set sent on save is minimal.

use super::state::BaseList;
use crate::rest::error::RestError;
use crate::rest::models::RowStatus;

/// The new/updated/removed subsets of a modifiable page
#[derive(Debug, Clone)]
pub struct DirtyState<K: PartialEq> {
    added: Vec<K>,
    updated: Vec<K>,
    removed: Vec<K>,

    /// Set by pages that track structural changes (reordering) without
    /// per-row bookkeeping
    touched: bool,
}

impl<K: PartialEq> DirtyState<K> {
    pub fn new() -> Self {
        Self {
            added: Vec::new(),
            updated: Vec::new(),
            removed: Vec::new(),
            touched: false,
        }
    }

    pub fn mark_added(&mut self, key: K) {
        if !self.contains(&key) {
            self.added.push(key);
        }
    }

    /// An added row stays "new" no matter how often it is edited
    pub fn mark_updated(&mut self, key: K) {
        if !self.contains(&key) {
            self.updated.push(key);
        }
    }

    /// Returns true when the row was never saved: the caller should drop
    /// the row entirely instead of recording a deletion (net zero)
    pub fn mark_removed(&mut self, key: K) -> bool {
        if let Some(pos) = self.added.iter().position(|k| *k == key) {
            self.added.remove(pos);
            return true;
        }
        self.updated.retain(|k| *k != key);
        if !self.removed.contains(&key) {
            self.removed.push(key);
        }
        false
    }

    pub fn touch(&mut self) {
        self.touched = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.touched
            || !self.added.is_empty()
            || !self.updated.is_empty()
            || !self.removed.is_empty()
    }

    pub fn clear(&mut self) {
        self.added.clear();
        self.updated.clear();
        self.removed.clear();
        self.touched = false;
    }

    pub fn added(&self) -> &[K] {
        &self.added
    }

    pub fn updated(&self) -> &[K] {
        &self.updated
    }

    pub fn removed(&self) -> &[K] {
        &self.removed
    }

    /// The lifecycle status a key carries in the save payload
    pub fn status_of(&self, key: &K) -> RowStatus {
        if self.added.contains(key) {
            RowStatus::New
        } else if self.updated.contains(key) {
            RowStatus::Updated
        } else if self.removed.contains(key) {
            RowStatus::Removed
        } else {
            RowStatus::Persisted
        }
    }

    fn contains(&self, key: &K) -> bool {
        self.added.contains(key) || self.updated.contains(key) || self.removed.contains(key)
    }
}

impl<K: PartialEq> Default for DirtyState<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Dirty-tracking capability over the base list
pub trait Modifiable: BaseList {
    type Key: PartialEq;

    fn dirty(&self) -> &DirtyState<Self::Key>;

    fn dirty_mut(&mut self) -> &mut DirtyState<Self::Key>;

    fn is_dirty(&self) -> bool {
        self.dirty().is_dirty()
    }

    /// Page-specific persistence of the current change-set
    async fn do_save(&mut self) -> Result<(), RestError>;

    /// Generic save flow: on success dirty state clears and the page
    /// re-loads; on failure the error surfaces and dirty state stays
    /// intact so the operator can retry.
    async fn save(&mut self) -> anyhow::Result<()> {
        if self.is_busy() || !self.is_dirty() {
            return Ok(());
        }

        self.list_mut().saving = true;
        let result = self.do_save().await;
        self.list_mut().saving = false;

        match result {
            Ok(()) => {
                self.dirty_mut().clear();
                self.alerts()
                    .success("The operation 'update' completed successfully.");
                self.reload().await
            }
            Err(err) => {
                self.alerts()
                    .exception("The operation 'update' could not be completed", &err);
                Ok(())
            }
        }
    }

    /// Discard the change-set and restore the server's state
    async fn cancel_changes(&mut self) -> anyhow::Result<()> {
        if !self.is_dirty() {
            return Ok(());
        }
        self.dirty_mut().clear();
        self.reload().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertBus;
    use crate::list::state::ListState;

    #[test]
    fn test_add_then_remove_nets_to_zero() {
        let mut dirty: DirtyState<String> = DirtyState::new();
        dirty.mark_added("fresh".to_string());
        assert!(dirty.is_dirty());

        let was_new = dirty.mark_removed("fresh".to_string());
        assert!(was_new);
        assert!(dirty.added().is_empty());
        assert!(dirty.updated().is_empty());
        assert!(dirty.removed().is_empty());
        assert!(!dirty.is_dirty());
    }

    #[test]
    fn test_subsets_stay_disjoint() {
        let mut dirty: DirtyState<&'static str> = DirtyState::new();
        dirty.mark_updated("row");
        assert_eq!(dirty.status_of(&"row"), RowStatus::Updated);

        let was_new = dirty.mark_removed("row");
        assert!(!was_new);
        assert!(dirty.updated().is_empty());
        assert_eq!(dirty.removed(), &["row"]);
        assert_eq!(dirty.status_of(&"row"), RowStatus::Removed);
    }

    #[test]
    fn test_editing_an_added_row_keeps_it_new() {
        let mut dirty: DirtyState<&'static str> = DirtyState::new();
        dirty.mark_added("row");
        dirty.mark_updated("row");
        assert_eq!(dirty.status_of(&"row"), RowStatus::New);
        assert!(dirty.updated().is_empty());
    }

    #[test]
    fn test_touch_marks_dirty_without_row_bookkeeping() {
        let mut dirty: DirtyState<i64> = DirtyState::new();
        assert!(!dirty.is_dirty());
        dirty.touch();
        assert!(dirty.is_dirty());
        dirty.clear();
        assert!(!dirty.is_dirty());
    }

    struct Saver {
        list: ListState<u32>,
        dirty: DirtyState<u32>,
        alerts: AlertBus,
        save_attempts: usize,
        fail_save: bool,
        loads: usize,
    }

    impl Saver {
        fn dirty_one(fail_save: bool) -> Self {
            let mut dirty = DirtyState::new();
            dirty.mark_updated(1);
            Self {
                list: ListState::new(),
                dirty,
                alerts: AlertBus::new(),
                save_attempts: 0,
                fail_save,
                loads: 0,
            }
        }
    }

    impl BaseList for Saver {
        type Row = u32;

        fn page_name(&self) -> &'static str {
            "saver"
        }

        fn list(&self) -> &ListState<u32> {
            &self.list
        }

        fn list_mut(&mut self) -> &mut ListState<u32> {
            &mut self.list
        }

        fn alerts(&self) -> &AlertBus {
            &self.alerts
        }

        fn has_unsaved_changes(&self) -> bool {
            self.dirty.is_dirty()
        }

        async fn load_data(&mut self) -> Result<(), crate::rest::error::RestError> {
            self.loads += 1;
            Ok(())
        }
    }

    impl Modifiable for Saver {
        type Key = u32;

        fn dirty(&self) -> &DirtyState<u32> {
            &self.dirty
        }

        fn dirty_mut(&mut self) -> &mut DirtyState<u32> {
            &mut self.dirty
        }

        async fn do_save(&mut self) -> Result<(), crate::rest::error::RestError> {
            self.save_attempts += 1;
            if self.fail_save {
                Err(crate::rest::error::RestError::Business(
                    "duplicate entry".to_string(),
                ))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_successful_save_clears_dirty_and_reloads() {
        let mut page = Saver::dirty_one(false);
        page.save().await.unwrap();
        assert_eq!(page.save_attempts, 1);
        assert!(!page.is_dirty());
        assert_eq!(page.loads, 1);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_dirty_for_retry() {
        let mut page = Saver::dirty_one(true);
        page.save().await.unwrap();
        assert_eq!(page.save_attempts, 1);
        assert!(page.is_dirty());
        assert_eq!(page.loads, 0);
        assert!(!page.alerts.is_empty());
    }

    #[tokio::test]
    async fn test_save_with_nothing_dirty_is_a_no_op() {
        let mut page = Saver::dirty_one(false);
        page.dirty.clear();
        page.save().await.unwrap();
        assert_eq!(page.save_attempts, 0);
    }

    #[tokio::test]
    async fn test_cancel_discards_and_reloads() {
        let mut page = Saver::dirty_one(false);
        page.cancel_changes().await.unwrap();
        assert!(!page.is_dirty());
        assert_eq!(page.loads, 1);
    }
}
