//! List-page behaviors
//!
//! The building blocks every page composes: shared list state, the
//! filter/page/sort/modify capabilities as traits with provided method
//! bodies, and the composition mechanism that assembles a page's named
//! operation table from an ordered sequence of augmentations.

pub mod column_picker;
pub mod compose;
pub mod filter;
pub mod modify;
pub mod pager;
pub mod row_limiter;
pub mod sort;
pub mod state;

pub use column_picker::{ColumnDef, ColumnPicker};
pub use compose::{Augmentation, Composer, Op, OpTable, Parent};
pub use filter::{FilterState, Filterable};
pub use modify::{DirtyState, Modifiable};
pub use pager::{PageState, Pageable, PaginationKind};
pub use row_limiter::RowLimiter;
pub use sort::{SortKind, SortState, Sortable};
pub use state::{BaseList, ListState};

use std::ops::BitOr;

/// Statically declared capabilities of a page, checked at construction
/// and by the UI - never inferred from the shape of the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    pub const NONE: CapabilitySet = CapabilitySet(0);
    pub const FILTERABLE: CapabilitySet = CapabilitySet(1);
    pub const PAGEABLE: CapabilitySet = CapabilitySet(1 << 1);
    pub const SORTABLE: CapabilitySet = CapabilitySet(1 << 2);
    pub const MODIFIABLE: CapabilitySet = CapabilitySet(1 << 3);

    pub const fn contains(self, other: CapabilitySet) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for CapabilitySet {
    type Output = CapabilitySet;

    fn bitor(self, rhs: CapabilitySet) -> CapabilitySet {
        CapabilitySet(self.0 | rhs.0)
    }
}

/// Standard augmentations wiring the capability traits into op tables.
///
/// Pages compose these in order and append their own augmentation for
/// page-specific operations and overrides.
pub mod behaviors {
    use super::compose::{Augmentation, Op, OpFuture, Parent};
    use super::{Filterable, Modifiable, Pageable, Sortable};
    use crate::list::state::BaseList;

    /// Base behavior: clean list state plus the refresh operation
    pub fn base<P: BaseList>() -> Augmentation<P> {
        Augmentation::new("base", |p: &mut P| {
            let list = p.list_mut();
            list.rows.clear();
            list.count = 0;
            list.selected.clear();
            list.loading = false;
            list.saving = false;
        })
        .op(Op::new("refresh", refresh::<P>))
    }

    fn refresh<P: BaseList>(p: &mut P, _parent: Parent<P>) -> OpFuture<'_> {
        Box::pin(async move { p.reload().await })
    }

    /// Filtering: the filter/reset operations over default criteria
    pub fn filterable<P: Filterable>() -> Augmentation<P> {
        Augmentation::new("filterable", |p: &mut P| {
            p.filter_mut().reset_edited();
            p.filter_mut().activate();
        })
        .op(Op::new("filter", filter::<P>))
        .op(Op::new("reset-filters", reset_filters::<P>))
    }

    fn filter<P: Filterable>(p: &mut P, _parent: Parent<P>) -> OpFuture<'_> {
        Box::pin(async move { p.try_filter(true).await.map(|_| ()) })
    }

    fn reset_filters<P: Filterable>(p: &mut P, _parent: Parent<P>) -> OpFuture<'_> {
        Box::pin(async move {
            p.reset_filters();
            Ok(())
        })
    }

    /// Client paging: pure slicing, no extra operations
    pub fn client_pageable<P: Pageable>() -> Augmentation<P> {
        Augmentation::new("client-pageable", |p: &mut P| {
            p.pager_mut().offset = 0;
        })
    }

    /// Server paging: navigation re-fetches, and a new search starts from
    /// the first page - declared as an override of the filterable chain's
    /// "filter", delegating up after resetting the offset.
    pub fn server_pageable<P: Filterable + Pageable>() -> Augmentation<P> {
        Augmentation::new("server-pageable", |p: &mut P| {
            p.pager_mut().offset = 0;
        })
        .op(Op::overriding("filter", filter_from_first_page::<P>))
    }

    fn filter_from_first_page<P: Filterable + Pageable>(
        p: &mut P,
        parent: Parent<P>,
    ) -> OpFuture<'_> {
        Box::pin(async move {
            p.pager_mut().offset = 0;
            parent.invoke(p).await
        })
    }

    /// Sorting: state only; the UI drives `sort_by` with a column
    pub fn sortable<P: Sortable>() -> Augmentation<P> {
        Augmentation::new("sortable", |p: &mut P| {
            p.sort_state_mut().column = None;
            p.sort_state_mut().ascending = true;
        })
    }

    /// Dirty tracking: the save/cancel operations
    pub fn modifiable<P: Modifiable>() -> Augmentation<P> {
        Augmentation::new("modifiable", |p: &mut P| p.dirty_mut().clear())
            .op(Op::new("save", save::<P>))
            .op(Op::new("cancel", cancel::<P>))
    }

    fn save<P: Modifiable>(p: &mut P, _parent: Parent<P>) -> OpFuture<'_> {
        Box::pin(async move { p.save().await })
    }

    fn cancel<P: Modifiable>(p: &mut P, _parent: Parent<P>) -> OpFuture<'_> {
        Box::pin(async move { p.cancel_changes().await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_set_union_and_contains() {
        let caps = CapabilitySet::FILTERABLE | CapabilitySet::PAGEABLE;
        assert!(caps.contains(CapabilitySet::FILTERABLE));
        assert!(caps.contains(CapabilitySet::PAGEABLE));
        assert!(!caps.contains(CapabilitySet::MODIFIABLE));
        assert!(caps.contains(CapabilitySet::NONE));
    }
}
