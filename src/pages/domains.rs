//! Domains page - multi-tenancy administration
//!
//! Lists every configured domain and toggles their active state. Two rules
//! are enforced before anything reaches the wire: the domain the console is
//! working in cannot be disabled, and neither can the domain of the
//! logged-in operator.

use super::{
    build_grid, change_page_size, goto_page, page_info_of, Composed, Grid, PageInfo, PageView,
};
use crate::alert::AlertBus;
use crate::context::AppContext;
use crate::list::behaviors;
use crate::list::{
    Augmentation, BaseList, CapabilitySet, ColumnDef, ColumnPicker, Composer, ListState, Op,
    OpTable, PageState, Pageable, Parent, RowLimiter,
};
use crate::rest::error::RestError;
use crate::rest::models::DomainRow;
use crate::rest::params::QueryParams;
use crate::rest::RestClient;
use crate::util;
use async_trait::async_trait;
use std::sync::Arc;

const DOMAINS_URL: &str = "rest/domains";

pub struct DomainsPage {
    client: RestClient,
    alerts: AlertBus,
    ctx: AppContext,
    list: ListState<DomainRow>,
    pager: PageState,
    limiter: RowLimiter,
    columns: ColumnPicker,
    ops: Arc<OpTable<Self>>,
}

impl DomainsPage {
    pub fn new(client: RestClient, alerts: AlertBus, ctx: AppContext) -> anyhow::Result<Self> {
        let columns = ColumnPicker::all_visible(vec![
            ColumnDef::unsortable("Domain Code", "code", 20),
            ColumnDef::unsortable("Domain Name", "name", 30),
            ColumnDef::unsortable("Active", "active", 8),
        ]);

        let mut page = Self {
            client,
            alerts,
            ctx,
            list: ListState::new(),
            pager: PageState::client(),
            limiter: RowLimiter::default(),
            columns,
            ops: Arc::new(OpTable::empty()),
        };

        let table = Composer::new()
            .with(behaviors::base())
            .with(behaviors::client_pageable())
            .with(domains_behavior())
            .apply(&mut page)?;
        page.ops = Arc::new(table);
        Ok(page)
    }

    /// The client-side business guard; the server enforces it again
    fn can_disable(&self, code: &str) -> Result<(), String> {
        if self.ctx.is_current_domain(code) {
            return Err("Cannot disable the current domain".to_string());
        }
        Ok(())
    }

    async fn toggle_active(&mut self) {
        let Some((code, active)) = self
            .list
            .selected_rows()
            .first()
            .map(|d| (d.code.clone(), d.active))
        else {
            self.alerts.info("Select a domain first");
            return;
        };

        let target = !active;
        if !target {
            if let Err(msg) = self.can_disable(&code) {
                self.alerts.error(msg);
                return;
            }
        }

        self.list.saving = true;
        let url = format!("{}/{}/active", DOMAINS_URL, code);
        let result = self.client.put_json(&url, &target).await;
        self.list.saving = false;

        match result {
            Ok(()) => {
                if let Some(row) = self.list.rows.iter_mut().find(|d| d.code == code) {
                    row.active = target;
                }
                self.alerts.success(format!(
                    "Domain [{}] was successfully {}.",
                    code,
                    if target { "enabled" } else { "disabled" }
                ));
            }
            Err(err) => {
                // Row state stays in sync with the server
                self.alerts.exception("Error updating the domain", &err);
                let _ = self.reload().await;
            }
        }
    }

    fn cell(row: &DomainRow, prop: &str) -> String {
        match prop {
            "code" => row.code.clone(),
            "name" => row.name.clone(),
            "active" => util::fmt_bool(row.active).to_string(),
            _ => String::new(),
        }
    }
}

fn domains_behavior() -> Augmentation<DomainsPage> {
    Augmentation::new("domains", |_p: &mut DomainsPage| {})
        .op(Op::new("toggle-active", toggle_active))
}

fn toggle_active(
    p: &mut DomainsPage,
    _parent: Parent<DomainsPage>,
) -> crate::list::compose::OpFuture<'_> {
    Box::pin(async move {
        if p.is_busy() {
            return Ok(());
        }
        p.toggle_active().await;
        Ok(())
    })
}

impl BaseList for DomainsPage {
    type Row = DomainRow;

    fn page_name(&self) -> &'static str {
        "domains"
    }

    fn list(&self) -> &ListState<DomainRow> {
        &self.list
    }

    fn list_mut(&mut self) -> &mut ListState<DomainRow> {
        &mut self.list
    }

    fn alerts(&self) -> &AlertBus {
        &self.alerts
    }

    async fn load_data(&mut self) -> Result<(), RestError> {
        let mut params = QueryParams::new();
        params.append("active", "all");
        let domains: Vec<DomainRow> = self.client.get_json(DOMAINS_URL, &params).await?;
        self.list.set_client_rows(domains);
        Ok(())
    }
}

impl Pageable for DomainsPage {
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

impl Composed for DomainsPage {
    fn ops(&self) -> Arc<OpTable<Self>> {
        self.ops.clone()
    }
}

#[async_trait(?Send)]
impl PageView for DomainsPage {
    fn title(&self) -> &'static str {
        "Domains"
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::PAGEABLE
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
        let active = self.list.rows.iter().filter(|d| d.active).count();
        format!("{} domains, {} active", self.list.count, active)
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
        self.reload().await
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

    fn row_detail(&self, index: usize) -> Option<String> {
        let row = self.list.rows.get(index)?;
        Some(format!(
            "Code:   {}\nName:   {}\nActive: {}",
            row.code,
            row.name,
            util::fmt_bool(row.active),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> DomainsPage {
        let client = RestClient::new("http://gateway.local:8080", "admin", "secret").unwrap();
        let mut ctx = AppContext::new("admin");
        ctx.current_domain = Some("default".to_string());
        DomainsPage::new(client, AlertBus::new(), ctx).unwrap()
    }

    fn domain(code: &str, active: bool) -> DomainRow {
        DomainRow {
            code: code.to_string(),
            name: code.to_string(),
            active,
        }
    }

    #[tokio::test]
    async fn test_disabling_the_current_domain_is_refused() {
        let mut p = page();
        p.list.set_client_rows(vec![domain("default", true), domain("red", true)]);
        p.list.toggle_selected(0);

        p.invoke("toggle-active").await.unwrap();

        // Refused client-side: the row is untouched, the alert names the rule
        assert!(p.list.rows[0].active);
        let alert = p.alerts.pop().unwrap();
        assert!(alert.message.contains("Cannot disable the current domain"));
    }

    #[test]
    fn test_other_domains_pass_the_guard() {
        let p = page();
        assert!(p.can_disable("red").is_ok());
        assert!(p.can_disable("default").is_err());
    }
}
