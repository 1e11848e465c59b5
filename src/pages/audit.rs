//! Audit page - who changed what, server-paged
//!
//! Retrieves audit records from the gateway. The row query and the record
//! count are separate endpoints sharing the same criteria; dropdown sources
//! (targets, actions, users) are fetched once on activation.

use super::{
    build_grid, change_page_size, goto_page, page_info_of, Composed, Field, Grid, PageInfo,
    PageView,
};
use crate::alert::AlertBus;
use crate::context::AppContext;
use crate::list::behaviors;
use crate::list::{
    BaseList, CapabilitySet, ColumnDef, ColumnPicker, Composer, FilterState, Filterable,
    ListState, OpTable, PageState, Pageable, RowLimiter,
};
use crate::rest::error::RestError;
use crate::rest::models::AuditEntry;
use crate::rest::params::QueryParams;
use crate::rest::RestClient;
use crate::util;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

const LIST_URL: &str = "rest/audit/list";
const COUNT_URL: &str = "rest/audit/count";
const CSV_URL: &str = "rest/audit/csv";
const TARGETS_URL: &str = "rest/audit/targets";
const ACTIONS_URL: &str = "rest/audit/actions";
const USERNAMES_URL: &str = "rest/user/usernames";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditCriteria {
    pub target: Option<String>,
    pub user: Option<String>,
    pub action: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub domain: bool,
}

pub struct AuditPage {
    client: RestClient,
    alerts: AlertBus,
    ctx: AppContext,
    list: ListState<AuditEntry>,
    filter: FilterState<AuditCriteria>,
    pager: PageState,
    limiter: RowLimiter,
    columns: ColumnPicker,
    ops: Arc<OpTable<Self>>,

    // Dropdown sources, fetched once on activation
    targets: Vec<String>,
    users: Vec<String>,
    actions: Vec<String>,
    aux_loaded: bool,
}

impl AuditPage {
    pub fn new(client: RestClient, alerts: AlertBus, ctx: AppContext) -> anyhow::Result<Self> {
        let columns = ColumnPicker::all_visible(vec![
            ColumnDef::unsortable("Table", "auditTargetName", 24),
            ColumnDef::unsortable("User", "user", 16),
            ColumnDef::unsortable("Action", "action", 12),
            ColumnDef::unsortable("Changed", "changed", 20),
            ColumnDef::unsortable("Id", "id", 12),
        ]);

        let mut page = Self {
            client,
            alerts,
            ctx,
            list: ListState::new(),
            filter: FilterState::new(),
            pager: PageState::server(),
            limiter: RowLimiter::default(),
            columns,
            ops: Arc::new(OpTable::empty()),
            targets: Vec::new(),
            users: Vec::new(),
            actions: Vec::new(),
            aux_loaded: false,
        };

        let table = Composer::new()
            .with(behaviors::base())
            .with(behaviors::filterable())
            .with(behaviors::server_pageable())
            .apply(&mut page)?;
        page.ops = Arc::new(table);
        Ok(page)
    }

    /// Criteria parameters shared by the row query, the count query, and
    /// the CSV export
    fn criteria_params(&self) -> QueryParams {
        let f = &self.filter.active;
        let mut params = QueryParams::new();
        params
            .append_opt("auditTargetName", f.target.clone())
            .append_opt("user", f.user.clone())
            .append_opt("action", f.action.clone())
            .append_opt("from", f.from.map(|t| t.to_rfc3339()))
            .append_opt("to", f.to.map(|t| t.to_rfc3339()));
        if self.ctx.super_admin && f.domain {
            params.append("domain", true);
        }
        params
    }

    fn paged_params(&self) -> QueryParams {
        let mut params = self.criteria_params();
        params
            .append("page", self.pager.offset)
            .append("pageSize", self.limiter.page_size);
        params
    }

    async fn load_dropdown_sources(&mut self) {
        match self.client.get_json::<Vec<String>>(TARGETS_URL, &QueryParams::new()).await {
            Ok(targets) => self.targets = targets,
            Err(err) => tracing::warn!("Could not load audit targets: {}", err),
        }
        match self.client.get_json::<Vec<String>>(ACTIONS_URL, &QueryParams::new()).await {
            Ok(actions) => self.actions = actions,
            Err(err) => tracing::warn!("Could not load audit actions: {}", err),
        }
        match self.client.get_json::<Vec<String>>(USERNAMES_URL, &QueryParams::new()).await {
            Ok(users) => self.users = users,
            Err(err) => tracing::warn!("Could not load user names: {}", err),
        }
        self.aux_loaded = true;
    }

    fn cell(row: &AuditEntry, prop: &str) -> String {
        match prop {
            "auditTargetName" => row.audit_target_name.clone(),
            "user" => row.user.clone(),
            "action" => row.action.clone(),
            "changed" => util::fmt_ts(Some(row.changed)),
            "id" => row.id.clone().unwrap_or_default(),
            _ => String::new(),
        }
    }
}

impl BaseList for AuditPage {
    type Row = AuditEntry;

    fn page_name(&self) -> &'static str {
        "audit"
    }

    fn list(&self) -> &ListState<AuditEntry> {
        &self.list
    }

    fn list_mut(&mut self) -> &mut ListState<AuditEntry> {
        &mut self.list
    }

    fn alerts(&self) -> &AlertBus {
        &self.alerts
    }

    async fn load_data(&mut self) -> Result<(), RestError> {
        if !self.aux_loaded {
            self.load_dropdown_sources().await;
        }

        // Fetch both before touching state, so a count failure cannot leave
        // rows and count out of step
        let rows: Vec<AuditEntry> = self.client.get_json(LIST_URL, &self.paged_params()).await?;
        let count: usize = self.client.get_json(COUNT_URL, &self.criteria_params()).await?;

        self.list.set_results(rows, count);
        Ok(())
    }
}

impl Filterable for AuditPage {
    type Criteria = AuditCriteria;

    fn filter(&self) -> &FilterState<AuditCriteria> {
        &self.filter
    }

    fn filter_mut(&mut self) -> &mut FilterState<AuditCriteria> {
        &mut self.filter
    }
}

impl Pageable for AuditPage {
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

impl Composed for AuditPage {
    fn ops(&self) -> Arc<OpTable<Self>> {
        self.ops.clone()
    }
}

#[async_trait(?Send)]
impl PageView for AuditPage {
    fn title(&self) -> &'static str {
        "Audit"
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::FILTERABLE | CapabilitySet::PAGEABLE
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
        format!("{} audit records", self.list.count)
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

    fn filter_fields(&self) -> Vec<Field> {
        let f = &self.filter.edited;
        let mut fields = vec![
            Field::new("target", "Table", f.target.clone().unwrap_or_default()),
            Field::new("user", "User", f.user.clone().unwrap_or_default()),
            Field::new("action", "Action", f.action.clone().unwrap_or_default()),
            Field::new("from", "From (YYYY-MM-DD)", util::fmt_ts(f.from)),
            Field::new("to", "To (YYYY-MM-DD)", util::fmt_ts(f.to)),
        ];
        if self.ctx.super_admin {
            fields.push(Field::new("domain", "Current domain only", f.domain.to_string()));
        }
        fields
    }

    fn set_filter_field(&mut self, key: &str, value: &str) {
        let f = &mut self.filter.edited;
        let value = value.trim();
        let opt = (!value.is_empty()).then(|| value.to_string());
        match key {
            "target" => f.target = opt,
            "user" => f.user = opt,
            "action" => f.action = opt,
            "from" => f.from = util::parse_user_date(value),
            "to" => f.to = util::parse_user_date(value),
            "domain" => f.domain = value.eq_ignore_ascii_case("true"),
            _ => {}
        }
    }

    fn filter_hints(&self, key: &str) -> Vec<String> {
        match key {
            "target" => self.targets.clone(),
            "user" => self.users.clone(),
            "action" => self.actions.clone(),
            _ => Vec::new(),
        }
    }

    fn export_url(&self) -> Option<String> {
        Some(self.client.export_url(CSV_URL, &self.paged_params()))
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
                        "{}\t{}\t{}\t{}",
                        r.audit_target_name,
                        r.user,
                        r.action,
                        util::fmt_ts(Some(r.changed))
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    fn row_detail(&self, index: usize) -> Option<String> {
        let row = self.list.rows.get(index)?;
        Some(format!(
            "Table:   {}\nUser:    {}\nAction:  {}\nChanged: {}\nId:      {}\nRevision: {}",
            row.audit_target_name,
            row.user,
            row.action,
            util::fmt_ts(Some(row.changed)),
            row.id.as_deref().unwrap_or("-"),
            row.revision_id.as_deref().unwrap_or("-"),
        ))
    }
}
