//! Logging page - backend logger levels
//!
//! Server-paged logger listing; changing a level posts immediately and
//! re-runs the active search, and the reset operation restores the
//! gateway's configured logging.

use super::{
    build_grid, change_page_size, goto_page, page_info_of, ChooserRequest, Composed, Field, Grid,
    PageInfo, PageView,
};
use crate::alert::AlertBus;
use crate::list::behaviors;
use crate::list::{
    Augmentation, BaseList, CapabilitySet, ColumnDef, ColumnPicker, Composer, FilterState,
    Filterable, ListState, Op, OpTable, PageState, Pageable, Parent, RowLimiter,
};
use crate::rest::error::RestError;
use crate::rest::models::{LoggerEntry, LoggingResult};
use crate::rest::params::QueryParams;
use crate::rest::RestClient;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

const LOGGING_URL: &str = "rest/logging/loglevel";
const RESET_LOGGING_URL: &str = "rest/logging/reset";

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingCriteria {
    pub logger_name: Option<String>,
    pub show_classes: bool,
}

impl Default for LoggingCriteria {
    fn default() -> Self {
        Self {
            logger_name: None,
            show_classes: false,
        }
    }
}

pub struct LogLevelsPage {
    client: RestClient,
    alerts: AlertBus,
    list: ListState<LoggerEntry>,
    filter: FilterState<LoggingCriteria>,
    pager: PageState,
    limiter: RowLimiter,
    columns: ColumnPicker,
    ops: Arc<OpTable<Self>>,
    levels: Vec<String>,
    chooser: Option<ChooserRequest>,
}

impl LogLevelsPage {
    pub fn new(client: RestClient, alerts: AlertBus) -> anyhow::Result<Self> {
        let columns = ColumnPicker::all_visible(vec![
            ColumnDef::unsortable("Logger Name", "name", 60),
            ColumnDef::unsortable("Logger Level", "level", 12),
        ]);

        let mut page = Self {
            client,
            alerts,
            list: ListState::new(),
            filter: FilterState::new(),
            pager: PageState::server(),
            limiter: RowLimiter::default(),
            columns,
            ops: Arc::new(OpTable::empty()),
            levels: Vec::new(),
            chooser: None,
        };

        let table = Composer::new()
            .with(behaviors::base())
            .with(behaviors::filterable())
            .with(behaviors::server_pageable())
            .with(logging_behavior())
            .apply(&mut page)?;
        page.ops = Arc::new(table);
        Ok(page)
    }

    fn params(&self) -> QueryParams {
        let f = &self.filter.active;
        let mut params = QueryParams::new();
        params
            .append_opt("loggerName", f.logger_name.clone())
            .append("showClasses", f.show_classes)
            .append("page", self.pager.offset)
            .append("pageSize", self.limiter.page_size);
        params
    }

    async fn set_level(&mut self, name: String, level: String) {
        let current = self
            .list
            .rows
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.level.clone());
        if current.as_deref() == Some(level.as_str()) {
            return;
        }

        self.alerts.clear();
        let body = json!({ "name": name, "level": level });
        match self.client.post_no_content(LOGGING_URL, &body).await {
            Ok(()) => {
                let _ = self.try_filter(false).await;
            }
            Err(err) => {
                self.alerts
                    .exception("An error occurred while setting logging level", &err);
                self.list.loading = false;
            }
        }
    }

    fn cell(row: &LoggerEntry, prop: &str) -> String {
        match prop {
            "name" => row.name.clone(),
            "level" => row.level.clone(),
            _ => String::new(),
        }
    }
}

/// Level editing and the reset operation
fn logging_behavior() -> Augmentation<LogLevelsPage> {
    Augmentation::new("logging", |_p: &mut LogLevelsPage| {})
        .op(Op::new("set-level", request_level))
        .op(Op::new("reset-logging", reset_logging))
}

fn request_level(
    p: &mut LogLevelsPage,
    _parent: Parent<LogLevelsPage>,
) -> crate::list::compose::OpFuture<'_> {
    Box::pin(async move {
        let Some(row) = p.list.selected_rows().first().map(|r| r.name.clone()) else {
            p.alerts.info("Select a logger first");
            return Ok(());
        };
        p.chooser = Some(ChooserRequest {
            kind: "log-level",
            title: format!("Level for {}", row),
            items: p.levels.clone(),
        });
        Ok(())
    })
}

fn reset_logging(
    p: &mut LogLevelsPage,
    _parent: Parent<LogLevelsPage>,
) -> crate::list::compose::OpFuture<'_> {
    Box::pin(async move {
        match p.client.post_no_content(RESET_LOGGING_URL, &json!({})).await {
            Ok(()) => {
                p.alerts
                    .success("Logging configuration was successfully reset.");
                p.reload().await?;
            }
            Err(err) => {
                p.alerts
                    .exception("An error occurred while resetting logging", &err);
                p.list.loading = false;
            }
        }
        Ok(())
    })
}

impl BaseList for LogLevelsPage {
    type Row = LoggerEntry;

    fn page_name(&self) -> &'static str {
        "logging"
    }

    fn list(&self) -> &ListState<LoggerEntry> {
        &self.list
    }

    fn list_mut(&mut self) -> &mut ListState<LoggerEntry> {
        &mut self.list
    }

    fn alerts(&self) -> &AlertBus {
        &self.alerts
    }

    async fn load_data(&mut self) -> Result<(), RestError> {
        let result: LoggingResult = self.client.get_json(LOGGING_URL, &self.params()).await?;
        self.levels = result.levels;
        self.list.set_results(result.logging_entries, result.count);
        Ok(())
    }
}

impl Filterable for LogLevelsPage {
    type Criteria = LoggingCriteria;

    fn filter(&self) -> &FilterState<LoggingCriteria> {
        &self.filter
    }

    fn filter_mut(&mut self) -> &mut FilterState<LoggingCriteria> {
        &mut self.filter
    }
}

impl Pageable for LogLevelsPage {
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

impl Composed for LogLevelsPage {
    fn ops(&self) -> Arc<OpTable<Self>> {
        self.ops.clone()
    }
}

#[async_trait(?Send)]
impl PageView for LogLevelsPage {
    fn title(&self) -> &'static str {
        "Logging"
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
        format!("{} loggers", self.list.count)
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
        vec![
            Field::new("loggerName", "Logger Name", f.logger_name.clone().unwrap_or_default()),
            Field::new(
                "showClasses",
                "Show classes (true/false)",
                f.show_classes.to_string(),
            ),
        ]
    }

    fn set_filter_field(&mut self, key: &str, value: &str) {
        let f = &mut self.filter.edited;
        let value = value.trim();
        match key {
            "loggerName" => f.logger_name = (!value.is_empty()).then(|| value.to_string()),
            "showClasses" => f.show_classes = value.eq_ignore_ascii_case("true"),
            _ => {}
        }
    }

    fn take_chooser(&mut self) -> Option<ChooserRequest> {
        self.chooser.take()
    }

    async fn choose(&mut self, kind: &str, value: &str) -> anyhow::Result<()> {
        if kind == "log-level" {
            let Some(name) = self.list.selected_rows().first().map(|r| r.name.clone()) else {
                return Ok(());
            };
            self.set_level(name, value.to_string()).await;
        }
        Ok(())
    }

    fn row_detail(&self, index: usize) -> Option<String> {
        let row = self.list.rows.get(index)?;
        Some(format!("Logger: {}\nLevel:  {}", row.name, row.level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> LogLevelsPage {
        let client = RestClient::new("http://gateway.local:8080", "admin", "secret").unwrap();
        LogLevelsPage::new(client, AlertBus::new()).unwrap()
    }

    #[tokio::test]
    async fn test_set_level_requires_a_selection() {
        let mut p = page();
        p.levels = vec!["INFO".to_string(), "DEBUG".to_string()];
        p.invoke("set-level").await.unwrap();
        assert!(p.chooser.is_none());
        assert!(!p.alerts.is_empty());
    }

    #[tokio::test]
    async fn test_set_level_offers_the_known_levels() {
        let mut p = page();
        p.levels = vec!["INFO".to_string(), "DEBUG".to_string()];
        p.list.set_client_rows(vec![LoggerEntry {
            name: "org.gateway".to_string(),
            level: "INFO".to_string(),
        }]);
        p.list.toggle_selected(0);

        p.invoke("set-level").await.unwrap();

        let chooser = p.take_chooser().unwrap();
        assert_eq!(chooser.kind, "log-level");
        assert_eq!(chooser.items, vec!["INFO".to_string(), "DEBUG".to_string()]);
    }

    #[tokio::test]
    async fn test_choosing_the_current_level_posts_nothing() {
        let mut p = page();
        p.list.set_client_rows(vec![LoggerEntry {
            name: "org.gateway".to_string(),
            level: "INFO".to_string(),
        }]);
        p.list.toggle_selected(0);

        // Same level: no request goes out (a request would hit an unreachable
        // host and surface an alert)
        p.choose("log-level", "INFO").await.unwrap();
        assert!(p.alerts.is_empty());
    }
}
