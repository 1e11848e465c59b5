//! Pageable behavior - client and server variants
//!
//! Both variants share the state shape (page-index offset plus the row
//! limiter); they differ in where pagination happens. The server variant
//! re-fetches on every navigation and trusts the server's count; the client
//! variant slices the in-memory rows and its count is the row total.

use super::row_limiter::RowLimiter;
use super::state::BaseList;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationKind {
    Client,
    Server,
}

#[derive(Debug, Clone)]
pub struct PageState {
    pub kind: PaginationKind,

    /// Page index, zero-based
    pub offset: usize,
}

impl PageState {
    pub fn client() -> Self {
        Self {
            kind: PaginationKind::Client,
            offset: 0,
        }
    }

    pub fn server() -> Self {
        Self {
            kind: PaginationKind::Server,
            offset: 0,
        }
    }
}

/// Paging capability over the base list
pub trait Pageable: BaseList {
    fn pager(&self) -> &PageState;

    fn pager_mut(&mut self) -> &mut PageState;

    fn row_limiter(&self) -> &RowLimiter;

    fn row_limiter_mut(&mut self) -> &mut RowLimiter;

    /// Index of the last page a client-paged list can show
    fn last_page(&self) -> usize {
        let size = self.row_limiter().page_size;
        if size == 0 {
            return 0;
        }
        self.list().rows.len() / size
    }

    /// Bounds of the displayed slice within `rows`.
    ///
    /// Server-paged rows are already one page; client-paged rows are sliced
    /// here. A slice never exceeds the page size and consecutive offsets
    /// tile the backing set without gaps.
    fn page_bounds(&self) -> (usize, usize) {
        let len = self.list().rows.len();
        match self.pager().kind {
            PaginationKind::Server => (0, len),
            PaginationKind::Client => {
                let size = self.row_limiter().page_size;
                let start = (self.pager().offset * size).min(len);
                let end = (start + size).min(len);
                (start, end)
            }
        }
    }

    /// Client-paged navigation loses nothing; server-paged navigation asks
    /// the unsaved-changes guard
    fn can_change_page(&self) -> bool {
        self.pager().kind == PaginationKind::Client || !self.has_unsaved_changes()
    }

    /// Navigate to a page. A trigger while loading is a no-op. Returns
    /// whether the navigation happened.
    async fn load_page(&mut self, offset: usize) -> anyhow::Result<bool> {
        if self.list().loading {
            tracing::debug!("{}: ignoring page change while loading", self.page_name());
            return Ok(false);
        }

        self.alerts().clear();

        if !self.can_change_page() {
            self.alerts()
                .info("There are unsaved changes: save or cancel them before changing the page");
            return Ok(false);
        }

        self.list_mut().clear_selection();
        self.pager_mut().offset = offset;

        if self.pager().kind == PaginationKind::Server {
            self.reload().await?;
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertBus;
    use crate::list::state::ListState;
    use crate::rest::error::RestError;

    struct Numbers {
        list: ListState<u32>,
        pager: PageState,
        limiter: RowLimiter,
        alerts: AlertBus,
        fetches: usize,
    }

    impl Numbers {
        fn with_rows(n: u32, kind: PaginationKind) -> Self {
            let mut list = ListState::new();
            list.set_client_rows((0..n).collect());
            Self {
                list,
                pager: PageState {
                    kind,
                    offset: 0,
                },
                limiter: RowLimiter::default(),
                alerts: AlertBus::new(),
                fetches: 0,
            }
        }
    }

    impl BaseList for Numbers {
        type Row = u32;

        fn page_name(&self) -> &'static str {
            "numbers"
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

        async fn load_data(&mut self) -> Result<(), RestError> {
            self.fetches += 1;
            Ok(())
        }
    }

    impl Pageable for Numbers {
        fn pager(&self) -> &PageState {
            &self.pager
        }

        fn pager_mut(&mut self) -> &mut PageState {
            &mut self.pager
        }

        fn row_limiter(&self) -> &RowLimiter {
            &self.limiter
        }

        fn row_limiter_mut(&mut self) -> &mut RowLimiter {
            &mut self.limiter
        }
    }

    #[test]
    fn test_last_page_is_floor_of_len_over_size() {
        let page = Numbers::with_rows(35, PaginationKind::Client);
        assert_eq!(page.last_page(), 3);

        let exact = Numbers::with_rows(30, PaginationKind::Client);
        assert_eq!(exact.last_page(), 3);

        let empty = Numbers::with_rows(0, PaginationKind::Client);
        assert_eq!(empty.last_page(), 0);
    }

    #[test]
    fn test_client_slices_tile_the_backing_set() {
        let mut page = Numbers::with_rows(35, PaginationKind::Client);
        let size = page.row_limiter().page_size;
        let mut seen = Vec::new();
        for offset in 0..=page.last_page() {
            page.pager.offset = offset;
            let (start, end) = page.page_bounds();
            assert!(end - start <= size);
            seen.extend_from_slice(&page.list.rows[start..end]);
        }
        // Every backing row appears exactly once, in order
        assert_eq!(seen, (0..35).collect::<Vec<u32>>());
    }

    #[test]
    fn test_out_of_range_offset_yields_empty_slice() {
        let mut page = Numbers::with_rows(5, PaginationKind::Client);
        page.pager.offset = 7;
        assert_eq!(page.page_bounds(), (5, 5));
    }

    #[tokio::test]
    async fn test_server_page_change_refetches_client_does_not() {
        let mut server = Numbers::with_rows(10, PaginationKind::Server);
        assert!(server.load_page(2).await.unwrap());
        assert_eq!(server.fetches, 1);
        assert_eq!(server.pager.offset, 2);

        let mut client = Numbers::with_rows(10, PaginationKind::Client);
        assert!(client.load_page(1).await.unwrap());
        assert_eq!(client.fetches, 0);
        assert_eq!(client.pager.offset, 1);
    }

    #[tokio::test]
    async fn test_page_change_while_loading_is_a_no_op() {
        let mut page = Numbers::with_rows(10, PaginationKind::Server);
        page.list.loading = true;
        assert!(!page.load_page(3).await.unwrap());
        assert_eq!(page.pager.offset, 0);
        assert_eq!(page.fetches, 0);
    }
}
