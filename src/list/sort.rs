//! Sortable behavior - client and server variants
//!
//! Client variant: a stable in-memory sort on every request, no round-trip.
//! Server variant: the sort column and direction become request parameters
//! and the page re-fetches. Both track the current column and direction.

use super::state::BaseList;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKind {
    Client,
    Server,
}

#[derive(Debug, Clone)]
pub struct SortState {
    pub kind: SortKind,

    /// Row-field key of the sorted column
    pub column: Option<String>,

    pub ascending: bool,
}

impl SortState {
    pub fn client() -> Self {
        Self {
            kind: SortKind::Client,
            column: None,
            ascending: true,
        }
    }

    pub fn server() -> Self {
        Self {
            kind: SortKind::Server,
            column: None,
            ascending: true,
        }
    }

    /// Re-sorting the current column flips direction; a new column starts
    /// ascending
    pub fn toggle(&mut self, column: &str) {
        if self.column.as_deref() == Some(column) {
            self.ascending = !self.ascending;
        } else {
            self.column = Some(column.to_string());
            self.ascending = true;
        }
    }
}

/// Sorting capability over the base list
pub trait Sortable: BaseList {
    fn sort_state(&self) -> &SortState;

    fn sort_state_mut(&mut self) -> &mut SortState;

    /// Column comparator for client-sorted pages
    fn compare_rows(&self, _a: &Self::Row, _b: &Self::Row, _column: &str) -> Ordering {
        Ordering::Equal
    }

    async fn sort_by(&mut self, column: &str) -> anyhow::Result<()> {
        self.sort_state_mut().toggle(column);

        match self.sort_state().kind {
            SortKind::Client => {
                let column = column.to_string();
                let ascending = self.sort_state().ascending;
                let mut rows = std::mem::take(&mut self.list_mut().rows);
                // Vec::sort_by is stable: equal rows keep their order
                rows.sort_by(|a, b| {
                    let ord = self.compare_rows(a, b, &column);
                    if ascending {
                        ord
                    } else {
                        ord.reverse()
                    }
                });
                self.list_mut().rows = rows;
                self.list_mut().clear_selection();
                Ok(())
            }
            SortKind::Server => self.reload().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertBus;
    use crate::list::state::ListState;
    use crate::rest::error::RestError;

    struct Names {
        list: ListState<(&'static str, u32)>,
        sort: SortState,
        alerts: AlertBus,
        fetches: usize,
    }

    impl BaseList for Names {
        type Row = (&'static str, u32);

        fn page_name(&self) -> &'static str {
            "names"
        }

        fn list(&self) -> &ListState<Self::Row> {
            &self.list
        }

        fn list_mut(&mut self) -> &mut ListState<Self::Row> {
            &mut self.list
        }

        fn alerts(&self) -> &AlertBus {
            &self.alerts
        }

        async fn load_data(&mut self) -> Result<(), RestError> {
            self.fetches += 1;
            Ok(())
        }
    }

    impl Sortable for Names {
        fn sort_state(&self) -> &SortState {
            &self.sort
        }

        fn sort_state_mut(&mut self) -> &mut SortState {
            &mut self.sort
        }

        fn compare_rows(&self, a: &Self::Row, b: &Self::Row, column: &str) -> Ordering {
            match column {
                "name" => a.0.cmp(b.0),
                "size" => a.1.cmp(&b.1),
                _ => Ordering::Equal,
            }
        }
    }

    fn names(kind: SortKind) -> Names {
        let mut list = ListState::new();
        list.set_client_rows(vec![("b", 2), ("a", 3), ("c", 1)]);
        Names {
            list,
            sort: SortState {
                kind,
                column: None,
                ascending: true,
            },
            alerts: AlertBus::new(),
            fetches: 0,
        }
    }

    #[tokio::test]
    async fn test_client_sort_is_in_memory_and_toggles_direction() {
        let mut page = names(SortKind::Client);
        page.sort_by("name").await.unwrap();
        assert_eq!(page.fetches, 0);
        assert_eq!(
            page.list.rows.iter().map(|r| r.0).collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );

        page.sort_by("name").await.unwrap();
        assert!(!page.sort.ascending);
        assert_eq!(
            page.list.rows.iter().map(|r| r.0).collect::<Vec<_>>(),
            vec!["c", "b", "a"]
        );
    }

    #[tokio::test]
    async fn test_new_column_starts_ascending() {
        let mut page = names(SortKind::Client);
        page.sort_by("name").await.unwrap();
        page.sort_by("name").await.unwrap();
        page.sort_by("size").await.unwrap();
        assert!(page.sort.ascending);
        assert_eq!(
            page.list.rows.iter().map(|r| r.1).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[tokio::test]
    async fn test_server_sort_refetches() {
        let mut page = names(SortKind::Server);
        page.sort_by("name").await.unwrap();
        assert_eq!(page.fetches, 1);
        assert_eq!(page.sort.column.as_deref(), Some("name"));
    }
}
