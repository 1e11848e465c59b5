//! Error log page - message errors reported by the gateway
//!
//! Server-paged and server-sorted: paging, sorting, and criteria all travel
//! as request parameters and every change re-fetches.

use super::{
    build_grid, change_page_size, goto_page, page_info_of, Composed, Field, Grid, PageInfo,
    PageView,
};
use crate::alert::AlertBus;
use crate::list::behaviors;
use crate::list::{
    BaseList, CapabilitySet, ColumnDef, ColumnPicker, Composer, FilterState, Filterable,
    ListState, OpTable, PageState, Pageable, RowLimiter, SortState, Sortable,
};
use crate::rest::error::RestError;
use crate::rest::models::{ErrorLogEntry, ErrorLogResult};
use crate::rest::params::QueryParams;
use crate::rest::RestClient;
use crate::util;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

const ERROR_LOG_URL: &str = "rest/errorlogs";
const CSV_URL: &str = "rest/errorlogs/csv";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorLogCriteria {
    pub signal_message_id: Option<String>,
    pub message_in_error_id: Option<String>,
    pub error_code: Option<String>,
    pub msh_role: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

pub struct ErrorLogPage {
    client: RestClient,
    alerts: AlertBus,
    list: ListState<ErrorLogEntry>,
    filter: FilterState<ErrorLogCriteria>,
    pager: PageState,
    limiter: RowLimiter,
    sort: SortState,
    columns: ColumnPicker,
    ops: Arc<OpTable<Self>>,

    // Dropdown sources echoed by the list response
    msh_roles: Vec<String>,
    error_codes: Vec<String>,
}

impl ErrorLogPage {
    pub fn new(client: RestClient, alerts: AlertBus) -> anyhow::Result<Self> {
        let columns = ColumnPicker::new(
            vec![
                ColumnDef::new("Signal Message Id", "errorSignalMessageId", 30),
                ColumnDef::new("Msh Role", "mshRole", 12),
                ColumnDef::new("Message Id", "messageInErrorId", 30),
                ColumnDef::new("Error Code", "errorCode", 14),
                ColumnDef::new("Error Detail", "errorDetail", 40),
                ColumnDef::new("Timestamp", "timestamp", 20),
                ColumnDef::new("Notified", "notified", 20),
            ],
            &["Message Id", "Error Code", "Error Detail", "Timestamp"],
        );

        let mut page = Self {
            client,
            alerts,
            list: ListState::new(),
            filter: FilterState::new(),
            pager: PageState::server(),
            limiter: RowLimiter::default(),
            sort: SortState::server(),
            columns,
            ops: Arc::new(OpTable::empty()),
            msh_roles: Vec::new(),
            error_codes: Vec::new(),
        };

        let table = Composer::new()
            .with(behaviors::base())
            .with(behaviors::filterable())
            .with(behaviors::sortable())
            .with(behaviors::server_pageable())
            .apply(&mut page)?;
        page.ops = Arc::new(table);
        Ok(page)
    }

    fn params(&self) -> QueryParams {
        let f = &self.filter.active;
        let mut params = QueryParams::new();
        params
            .append_opt("errorSignalMessageId", f.signal_message_id.clone())
            .append_opt("messageInErrorId", f.message_in_error_id.clone())
            .append_opt("errorCode", f.error_code.clone())
            .append_opt("mshRole", f.msh_role.clone())
            .append_opt("from", f.from.map(|t| t.to_rfc3339()))
            .append_opt("to", f.to.map(|t| t.to_rfc3339()))
            .append_opt("orderBy", self.sort.column.clone())
            .append_opt(
                "asc",
                self.sort.column.as_ref().map(|_| self.sort.ascending),
            )
            .append("page", self.pager.offset)
            .append("pageSize", self.limiter.page_size);
        params
    }

    fn cell(row: &ErrorLogEntry, prop: &str) -> String {
        match prop {
            "errorSignalMessageId" => row.error_signal_message_id.clone().unwrap_or_default(),
            "mshRole" => row.msh_role.clone(),
            "messageInErrorId" => row.message_in_error_id.clone().unwrap_or_default(),
            "errorCode" => row.error_code.clone(),
            "errorDetail" => row.error_detail.clone().unwrap_or_default(),
            "timestamp" => util::fmt_ts(Some(row.timestamp)),
            "notified" => util::fmt_ts(row.notified),
            _ => String::new(),
        }
    }
}

impl BaseList for ErrorLogPage {
    type Row = ErrorLogEntry;

    fn page_name(&self) -> &'static str {
        "error log"
    }

    fn list(&self) -> &ListState<ErrorLogEntry> {
        &self.list
    }

    fn list_mut(&mut self) -> &mut ListState<ErrorLogEntry> {
        &mut self.list
    }

    fn alerts(&self) -> &AlertBus {
        &self.alerts
    }

    async fn load_data(&mut self) -> Result<(), RestError> {
        let result: ErrorLogResult = self.client.get_json(ERROR_LOG_URL, &self.params()).await?;
        self.msh_roles = result.msh_roles;
        self.error_codes = result.error_codes;
        self.list.set_results(result.error_log_entries, result.count);
        Ok(())
    }
}

impl Filterable for ErrorLogPage {
    type Criteria = ErrorLogCriteria;

    fn filter(&self) -> &FilterState<ErrorLogCriteria> {
        &self.filter
    }

    fn filter_mut(&mut self) -> &mut FilterState<ErrorLogCriteria> {
        &mut self.filter
    }
}

impl Pageable for ErrorLogPage {
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

impl Sortable for ErrorLogPage {
    fn sort_state(&self) -> &SortState {
        &self.sort
    }

    fn sort_state_mut(&mut self) -> &mut SortState {
        &mut self.sort
    }
}

impl Composed for ErrorLogPage {
    fn ops(&self) -> Arc<OpTable<Self>> {
        self.ops.clone()
    }
}

#[async_trait(?Send)]
impl PageView for ErrorLogPage {
    fn title(&self) -> &'static str {
        "Error Log"
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::FILTERABLE | CapabilitySet::PAGEABLE | CapabilitySet::SORTABLE
    }

    fn columns(&self) -> &ColumnPicker {
        &self.columns
    }

    fn toggle_column(&mut self, index: usize) {
        self.columns.toggle(index);
    }

    fn is_working(&self) -> bool {
        self.is_busy()
    }

    fn grid(&self) -> Grid {
        build_grid(
            &self.columns,
            &self.list.rows,
            self.page_bounds(),
            &self.list.selected,
            Self::cell,
        )
    }

    fn page_info(&self) -> PageInfo {
        page_info_of(self)
    }

    fn status_line(&self) -> String {
        match &self.sort.column {
            Some(col) => format!(
                "{} errors, sorted by {} {}",
                self.list.count,
                col,
                if self.sort.ascending { "asc" } else { "desc" }
            ),
            None => format!("{} errors", self.list.count),
        }
    }

    fn operations(&self) -> Vec<&'static str> {
        self.ops.operations()
    }

    fn supports(&self, op: &str) -> bool {
        self.ops.supports(op)
    }

    async fn invoke(&mut self, op: &str) -> anyhow::Result<()> {
        let ops = self.ops.clone();
        ops.invoke(self, op).await
    }

    async fn activate(&mut self) -> anyhow::Result<()> {
        self.try_filter(false).await.map(|_| ())
    }

    fn toggle_select(&mut self, index: usize) {
        self.list.toggle_selected(index);
    }

    async fn goto_page(&mut self, offset: usize) -> anyhow::Result<()> {
        goto_page(self, offset).await
    }

    async fn change_page_size(&mut self, size: usize) -> anyhow::Result<()> {
        change_page_size(self, size).await
    }

    fn sortable_columns(&self) -> Vec<(&'static str, &'static str)> {
        self.columns
            .all()
            .iter()
            .filter(|c| c.sortable)
            .map(|c| (c.prop, c.name))
            .collect()
    }

    async fn sort_on(&mut self, prop: &str) -> anyhow::Result<()> {
        self.sort_by(prop).await
    }

    fn filter_fields(&self) -> Vec<Field> {
        let f = &self.filter.edited;
        vec![
            Field::new(
                "signalMessageId",
                "Signal Message Id",
                f.signal_message_id.clone().unwrap_or_default(),
            ),
            Field::new(
                "messageInErrorId",
                "Message Id",
                f.message_in_error_id.clone().unwrap_or_default(),
            ),
            Field::new("errorCode", "Error Code", f.error_code.clone().unwrap_or_default()),
            Field::new("mshRole", "Msh Role", f.msh_role.clone().unwrap_or_default()),
            Field::new("from", "From (YYYY-MM-DD)", util::fmt_ts(f.from)),
            Field::new("to", "To (YYYY-MM-DD)", util::fmt_ts(f.to)),
        ]
    }

    fn set_filter_field(&mut self, key: &str, value: &str) {
        let f = &mut self.filter.edited;
        let value = value.trim();
        let opt = (!value.is_empty()).then(|| value.to_string());
        match key {
            "signalMessageId" => f.signal_message_id = opt,
            "messageInErrorId" => f.message_in_error_id = opt,
            "errorCode" => f.error_code = opt,
            "mshRole" => f.msh_role = opt,
            "from" => f.from = util::parse_user_date(value),
            "to" => f.to = util::parse_user_date(value),
            _ => {}
        }
    }

    fn filter_hints(&self, key: &str) -> Vec<String> {
        match key {
            "mshRole" => self.msh_roles.clone(),
            "errorCode" => self.error_codes.clone(),
            _ => Vec::new(),
        }
    }

    fn export_url(&self) -> Option<String> {
        Some(self.client.export_url(CSV_URL, &self.params()))
    }

    fn copy_selected(&self) -> Option<String> {
        let rows = self.list.selected_rows();
        if rows.is_empty() {
            return None;
        }
        Some(
            rows.iter()
                .map(|r| {
                    format!(
                        "{}\t{}\t{}",
                        r.message_in_error_id.as_deref().unwrap_or("-"),
                        r.error_code,
                        r.error_detail.as_deref().unwrap_or("-")
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    fn row_detail(&self, index: usize) -> Option<String> {
        let row = self.list.rows.get(index)?;
        Some(format!(
            "Signal Message Id: {}\nMsh Role:          {}\nMessage Id:        {}\nError Code:        {}\nTimestamp:         {}\nNotified:          {}\n\n{}",
            row.error_signal_message_id.as_deref().unwrap_or("-"),
            row.msh_role,
            row.message_in_error_id.as_deref().unwrap_or("-"),
            row.error_code,
            util::fmt_ts(Some(row.timestamp)),
            util::fmt_ts(row.notified),
            row.error_detail.as_deref().unwrap_or(""),
        ))
    }
}
