//! Page components
//!
//! Each page is a thin combination of the list behaviors plus its REST
//! paths, grid columns, and dialog wiring. The TUI drives pages through the
//! dyn [`PageView`] seam: a grid snapshot to render, named operations to
//! invoke, filter/form fields to edit, and chooser requests to present.

pub mod audit;
pub mod domains;
pub mod error_log;
pub mod jms;
pub mod log_levels;
pub mod message_filter;
pub mod parties;
pub mod plugin_users;
pub mod pmode;
pub mod truststore;
pub mod users;

use crate::alert::AlertBus;
use crate::config::Config;
use crate::context::AppContext;
use crate::list::{
    CapabilitySet, ColumnDef, ColumnPicker, OpTable, Pageable, PaginationKind,
};
use crate::rest::RestClient;
use async_trait::async_trait;
use std::sync::Arc;

/// A renderable snapshot of a page's grid
#[derive(Debug, Clone)]
pub struct Grid {
    pub columns: Vec<ColumnDef>,

    /// Visible rows as display cells, aligned with `columns`
    pub rows: Vec<Vec<String>>,

    /// Absolute index of the first visible row in the backing set
    pub row_offset: usize,

    /// Absolute indices of the selected rows
    pub selected: Vec<usize>,
}

/// Paging numbers for the status bar and navigation keys
#[derive(Debug, Clone, Copy, Default)]
pub struct PageInfo {
    pub pageable: bool,
    pub client_paged: bool,
    pub offset: usize,
    pub page_size: usize,
    pub count: usize,
    pub last_page: usize,
}

/// One editable field of a filter form or an add/edit form
#[derive(Debug, Clone)]
pub struct Field {
    pub key: &'static str,
    pub label: &'static str,
    pub value: String,
}

impl Field {
    pub fn new(key: &'static str, label: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            label,
            value: value.into(),
        }
    }
}

/// An add/edit form in flight
#[derive(Debug, Clone)]
pub struct FormSpec {
    /// What the page does with the committed form
    pub kind: &'static str,

    pub title: String,

    /// Absolute index of the row being edited; None for an add
    pub row: Option<usize>,

    pub fields: Vec<Field>,
}

impl FormSpec {
    pub fn value_of(&self, key: &str) -> &str {
        self.fields
            .iter()
            .find(|f| f.key == key)
            .map(|f| f.value.as_str())
            .unwrap_or("")
    }
}

/// A chooser the page wants the TUI to present
#[derive(Debug, Clone)]
pub struct ChooserRequest {
    pub kind: &'static str,
    pub title: String,
    pub items: Vec<String>,
}

/// The surface the TUI consumes. Default bodies make every capability
/// optional; pages only implement what they composed.
#[async_trait(?Send)]
pub trait PageView {
    fn title(&self) -> &'static str;

    fn capabilities(&self) -> CapabilitySet;

    fn columns(&self) -> &ColumnPicker;

    fn toggle_column(&mut self, index: usize);

    fn grid(&self) -> Grid;

    fn page_info(&self) -> PageInfo;

    /// Dirty markers, current source queue, store name - page flavored
    fn status_line(&self) -> String {
        String::new()
    }

    /// A fetch or save is in flight
    fn is_working(&self) -> bool {
        false
    }

    fn operations(&self) -> Vec<&'static str>;

    fn supports(&self, op: &str) -> bool;

    async fn invoke(&mut self, op: &str) -> anyhow::Result<()>;

    /// First visit: initial data fetch
    async fn activate(&mut self) -> anyhow::Result<()>;

    fn toggle_select(&mut self, index: usize);

    async fn goto_page(&mut self, _offset: usize) -> anyhow::Result<()> {
        Ok(())
    }

    async fn change_page_size(&mut self, _size: usize) -> anyhow::Result<()> {
        Ok(())
    }

    /// (prop, display name) of the columns the page can sort on
    fn sortable_columns(&self) -> Vec<(&'static str, &'static str)> {
        Vec::new()
    }

    async fn sort_on(&mut self, _prop: &str) -> anyhow::Result<()> {
        Ok(())
    }

    fn filter_fields(&self) -> Vec<Field> {
        Vec::new()
    }

    fn set_filter_field(&mut self, _key: &str, _value: &str) {}

    /// Known values for a filter field (roles, actions, levels, queues),
    /// shown by the filter editor as completion hints
    fn filter_hints(&self, _key: &str) -> Vec<String> {
        Vec::new()
    }

    fn begin_add(&mut self) -> Option<FormSpec> {
        None
    }

    fn begin_edit(&mut self) -> Option<FormSpec> {
        None
    }

    async fn commit_form(&mut self, _form: FormSpec) -> anyhow::Result<()> {
        Ok(())
    }

    /// The operator dismissed the form without confirming
    async fn cancel_form(&mut self, _form: FormSpec) -> anyhow::Result<()> {
        Ok(())
    }

    async fn delete_selected(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Chooser the page queued during its last operation, if any
    fn take_chooser(&mut self) -> Option<ChooserRequest> {
        None
    }

    /// Form the page queued during its last operation (uploads), if any
    fn take_form(&mut self) -> Option<FormSpec> {
        None
    }

    async fn choose(&mut self, _kind: &str, _value: &str) -> anyhow::Result<()> {
        Ok(())
    }

    /// CSV export URL carrying the live query's parameters
    fn export_url(&self) -> Option<String> {
        None
    }

    /// Clipboard text for the selected row(s)
    fn copy_selected(&self) -> Option<String> {
        None
    }

    /// Full detail text of one row (all columns, including hidden ones)
    fn row_detail(&self, _index: usize) -> Option<String> {
        None
    }
}

/// Access to a page's composed operation table
pub trait Composed: Sized {
    fn ops(&self) -> Arc<OpTable<Self>>;
}

/// Build a grid snapshot from the visible columns and a cell renderer
pub fn build_grid<R>(
    picker: &ColumnPicker,
    rows: &[R],
    bounds: (usize, usize),
    selected: &[usize],
    cell: impl Fn(&R, &str) -> String,
) -> Grid {
    let columns: Vec<ColumnDef> = picker.visible_columns().into_iter().cloned().collect();
    let (start, end) = bounds;
    let visible = &rows[start.min(rows.len())..end.min(rows.len())];

    let grid_rows = visible
        .iter()
        .map(|row| columns.iter().map(|c| cell(row, c.prop)).collect())
        .collect();

    Grid {
        columns,
        rows: grid_rows,
        row_offset: start,
        selected: selected.to_vec(),
    }
}

/// Paging numbers for a pageable page
pub fn page_info_of<P: Pageable>(page: &P) -> PageInfo {
    PageInfo {
        pageable: true,
        client_paged: page.pager().kind == PaginationKind::Client,
        offset: page.pager().offset,
        page_size: page.row_limiter().page_size,
        count: page.list().count,
        last_page: page.last_page(),
    }
}

/// Page-size change: clear the alert, reset to the first page, reset the
/// filter criteria when the page filters, then re-trigger the data source.
/// Client-paged pages re-slice without a fetch.
pub async fn change_page_size<P: Pageable + Composed>(
    page: &mut P,
    new_size: usize,
) -> anyhow::Result<()> {
    page.alerts().clear();

    if !page.can_change_page() {
        page.alerts()
            .info("There are unsaved changes: save or cancel them before changing the page size");
        return Ok(());
    }

    page.pager_mut().offset = 0;
    page.row_limiter_mut().page_size = new_size;

    let ops = page.ops();
    if ops.supports("reset-filters") {
        ops.invoke(page, "reset-filters").await?;
    }

    if page.pager().kind == PaginationKind::Server {
        if ops.supports("filter") {
            ops.invoke(page, "filter").await?;
        } else {
            ops.invoke(page, "refresh").await?;
        }
    }
    Ok(())
}

/// Navigate a pageable page, clamping client-paged offsets to the last page
pub async fn goto_page<P: Pageable>(page: &mut P, offset: usize) -> anyhow::Result<()> {
    let offset = if page.pager().kind == PaginationKind::Client {
        offset.min(page.last_page())
    } else {
        offset
    };
    page.load_page(offset).await.map(|_| ())
}

/// Construct every console page in display order
pub fn build_pages(
    client: &RestClient,
    alerts: &AlertBus,
    ctx: &AppContext,
    config: &Config,
) -> anyhow::Result<Vec<Box<dyn PageView>>> {
    Ok(vec![
        Box::new(pmode::PmodePage::new(client.clone(), alerts.clone(), config)?),
        Box::new(message_filter::MessageFilterPage::new(
            client.clone(),
            alerts.clone(),
        )?),
        Box::new(error_log::ErrorLogPage::new(client.clone(), alerts.clone())?),
        Box::new(jms::JmsPage::new(client.clone(), alerts.clone())?),
        Box::new(truststore::TrustStorePage::new(
            client.clone(),
            alerts.clone(),
            truststore::StoreKind::Keystore,
            config,
        )?),
        Box::new(truststore::TrustStorePage::new(
            client.clone(),
            alerts.clone(),
            truststore::StoreKind::TlsTrustStore,
            config,
        )?),
        Box::new(parties::PartiesPage::new(client.clone(), alerts.clone())?),
        Box::new(users::UsersPage::new(
            client.clone(),
            alerts.clone(),
            ctx.clone(),
        )?),
        Box::new(plugin_users::PluginUsersPage::new(
            client.clone(),
            alerts.clone(),
        )?),
        Box::new(audit::AuditPage::new(
            client.clone(),
            alerts.clone(),
            ctx.clone(),
        )?),
        Box::new(log_levels::LogLevelsPage::new(client.clone(), alerts.clone())?),
        Box::new(domains::DomainsPage::new(
            client.clone(),
            alerts.clone(),
            ctx.clone(),
        )?),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::behaviors;
    use crate::list::{
        BaseList, Composer, FilterState, Filterable, ListState, PageState, RowLimiter,
    };
    use crate::rest::error::RestError;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Criteria {
        user: Option<String>,
    }

    struct ServerList {
        list: ListState<u32>,
        filter: FilterState<Criteria>,
        pager: PageState,
        limiter: RowLimiter,
        alerts: AlertBus,
        ops: Arc<OpTable<Self>>,
        fetches: Vec<Criteria>,
    }

    impl ServerList {
        fn new() -> Self {
            let mut page = Self {
                list: ListState::new(),
                filter: FilterState::new(),
                pager: PageState::server(),
                limiter: RowLimiter::default(),
                alerts: AlertBus::new(),
                ops: Arc::new(OpTable::empty()),
                fetches: Vec::new(),
            };
            let table = Composer::new()
                .with(behaviors::base())
                .with(behaviors::filterable())
                .with(behaviors::server_pageable())
                .apply(&mut page)
                .unwrap();
            page.ops = Arc::new(table);
            page
        }
    }

    impl BaseList for ServerList {
        type Row = u32;

        fn page_name(&self) -> &'static str {
            "server-list"
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
            self.fetches.push(self.filter.active.clone());
            Ok(())
        }
    }

    impl Filterable for ServerList {
        type Criteria = Criteria;

        fn filter(&self) -> &FilterState<Criteria> {
            &self.filter
        }

        fn filter_mut(&mut self) -> &mut FilterState<Criteria> {
            &mut self.filter
        }
    }

    impl Pageable for ServerList {
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

    impl Composed for ServerList {
        fn ops(&self) -> Arc<OpTable<Self>> {
            self.ops.clone()
        }
    }

    #[tokio::test]
    async fn test_page_size_change_resets_offset_and_filter_before_refetch() {
        let mut page = ServerList::new();

        // An active filter on page 3, size 10
        page.filter.edited.user = Some("admin".to_string());
        let ops = page.ops();
        ops.invoke(&mut page, "filter").await.unwrap();
        page.pager.offset = 3;
        assert_eq!(page.fetches.last().unwrap().user.as_deref(), Some("admin"));

        change_page_size(&mut page, 25).await.unwrap();

        assert_eq!(page.pager.offset, 0);
        assert_eq!(page.limiter.page_size, 25);
        // The refetch used default criteria, not the last-used ones
        assert_eq!(page.fetches.last().unwrap(), &Criteria::default());
    }

    #[tokio::test]
    async fn test_search_starts_from_the_first_page() {
        let mut page = ServerList::new();
        page.pager.offset = 5;
        let ops = page.ops();
        ops.invoke(&mut page, "filter").await.unwrap();
        // server_pageable's override reset the offset before delegating
        assert_eq!(page.pager.offset, 0);
        assert_eq!(page.fetches.len(), 1);
    }

    #[test]
    fn test_build_grid_respects_bounds_and_columns() {
        let picker = ColumnPicker::new(
            vec![
                ColumnDef::new("Name", "name", 10),
                ColumnDef::new("Size", "size", 6),
            ],
            &["Name"],
        );
        let rows = vec![1u32, 2, 3, 4, 5];
        let grid = build_grid(&picker, &rows, (2, 4), &[3], |r, prop| match prop {
            "name" => format!("row-{}", r),
            _ => String::new(),
        });
        assert_eq!(grid.columns.len(), 1);
        assert_eq!(grid.rows, vec![vec!["row-3".to_string()], vec!["row-4".to_string()]]);
        assert_eq!(grid.row_offset, 2);
        assert_eq!(grid.selected, vec![3]);
    }
}
