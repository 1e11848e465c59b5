//! Message filter page - plugin routing table
//!
//! An ordered list: the first matching filter wins, so reordering is an
//! edit like any other. The whole list is sent back on save. Duplicate
//! entries (same backend, same routing criteria) are rejected locally.

use super::{build_grid, Composed, Field, FormSpec, Grid, PageInfo, PageView};
use crate::alert::AlertBus;
use crate::list::behaviors;
use crate::list::{
    Augmentation, BaseList, CapabilitySet, ColumnDef, ColumnPicker, Composer, DirtyState,
    ListState, Modifiable, Op, OpTable, Parent,
};
use crate::rest::error::RestError;
use crate::rest::models::{MessageFilterEntry, MessageFilterResult, RoutingCriteria};
use crate::rest::params::QueryParams;
use crate::rest::RestClient;
use crate::util;
use async_trait::async_trait;
use std::sync::Arc;

const MESSAGE_FILTER_URL: &str = "rest/messagefilters";
const CSV_URL: &str = "rest/messagefilters/csv";

/// Routing criteria the edit form exposes, in the order the backend knows
const CRITERIA_NAMES: [&str; 4] = ["from", "to", "action", "service"];

pub struct MessageFilterPage {
    client: RestClient,
    alerts: AlertBus,
    list: ListState<MessageFilterEntry>,
    dirty: DirtyState<i64>,
    columns: ColumnPicker,
    ops: Arc<OpTable<Self>>,

    /// Known plugin connectors, derived from the fetched entries
    backend_connectors: Vec<(String, bool)>,
    are_filters_persisted: bool,
}

impl MessageFilterPage {
    pub fn new(client: RestClient, alerts: AlertBus) -> anyhow::Result<Self> {
        let columns = ColumnPicker::all_visible(vec![
            ColumnDef::unsortable("Backend", "backendName", 18),
            ColumnDef::unsortable("From", "from", 20),
            ColumnDef::unsortable("To", "to", 20),
            ColumnDef::unsortable("Action", "action", 18),
            ColumnDef::unsortable("Service", "service", 18),
            ColumnDef::unsortable("Persisted", "persisted", 10),
        ]);

        let mut page = Self {
            client,
            alerts,
            list: ListState::new(),
            dirty: DirtyState::new(),
            columns,
            ops: Arc::new(OpTable::empty()),
            backend_connectors: Vec::new(),
            are_filters_persisted: true,
        };

        let table = Composer::new()
            .with(behaviors::base())
            .with(behaviors::modifiable())
            .with(reorder_behavior())
            .apply(&mut page)?;
        page.ops = Arc::new(table);
        Ok(page)
    }

    fn criterion<'a>(entry: &'a MessageFilterEntry, name: &str) -> &'a str {
        entry
            .routing_criterias
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.expression.as_str())
            .unwrap_or("")
    }

    fn find_duplicate(&self, entry: &MessageFilterEntry, skip_index: Option<usize>) -> Option<usize> {
        self.list
            .rows
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != skip_index)
            .find(|(_, row)| row.is_like(entry))
            .map(|(i, _)| i)
    }

    fn reindex(&mut self) {
        for (i, row) in self.list.rows.iter_mut().enumerate() {
            row.index = i;
        }
    }

    fn move_selected(&mut self, step: isize) {
        let Some(&index) = self.list.selected.first() else {
            return;
        };
        if !self.list.rows.get(index).map(|r| r.active).unwrap_or(false) {
            return;
        }

        let target = index as isize + step;
        if target < 0 || target as usize >= self.list.rows.len() {
            return;
        }
        let target = target as usize;

        self.list.rows.swap(index, target);
        self.reindex();
        self.list.selected = vec![target];
        self.dirty.touch();
    }

    fn cell(row: &MessageFilterEntry, prop: &str) -> String {
        match prop {
            "backendName" => row.backend_name.clone(),
            "from" | "to" | "action" | "service" => Self::criterion(row, prop).to_string(),
            "persisted" => util::fmt_bool(row.persisted).to_string(),
            _ => String::new(),
        }
    }

    fn form_for(&self, title: &str, row: Option<usize>, entry: &MessageFilterEntry) -> FormSpec {
        let mut fields = vec![Field::new("backendName", "Backend", entry.backend_name.clone())];
        for name in CRITERIA_NAMES {
            let label = match name {
                "from" => "From",
                "to" => "To",
                "action" => "Action",
                _ => "Service",
            };
            fields.push(Field::new(name, label, Self::criterion(entry, name)));
        }
        FormSpec {
            kind: "message-filter",
            title: title.to_string(),
            row,
            fields,
        }
    }

    fn entry_from_form(&self, form: &FormSpec, base: MessageFilterEntry) -> MessageFilterEntry {
        let mut entry = base;
        entry.backend_name = form.value_of("backendName").trim().to_string();
        entry.routing_criterias = CRITERIA_NAMES
            .iter()
            .filter_map(|&name| {
                let expression = form.value_of(name).trim();
                (!expression.is_empty()).then(|| RoutingCriteria {
                    name: name.to_string(),
                    expression: expression.to_string(),
                })
            })
            .collect();
        entry
    }
}

/// Reordering operations on top of the modifiable behavior
fn reorder_behavior() -> Augmentation<MessageFilterPage> {
    Augmentation::new("reorder", |_p: &mut MessageFilterPage| {})
        .op(Op::new("move-up", move_up))
        .op(Op::new("move-down", move_down))
}

fn move_up(
    p: &mut MessageFilterPage,
    _parent: Parent<MessageFilterPage>,
) -> crate::list::compose::OpFuture<'_> {
    Box::pin(async move {
        p.move_selected(-1);
        Ok(())
    })
}

fn move_down(
    p: &mut MessageFilterPage,
    _parent: Parent<MessageFilterPage>,
) -> crate::list::compose::OpFuture<'_> {
    Box::pin(async move {
        p.move_selected(1);
        Ok(())
    })
}

impl BaseList for MessageFilterPage {
    type Row = MessageFilterEntry;

    fn page_name(&self) -> &'static str {
        "message filters"
    }

    fn list(&self) -> &ListState<MessageFilterEntry> {
        &self.list
    }

    fn list_mut(&mut self) -> &mut ListState<MessageFilterEntry> {
        &mut self.list
    }

    fn alerts(&self) -> &AlertBus {
        &self.alerts
    }

    fn has_unsaved_changes(&self) -> bool {
        self.dirty.is_dirty()
    }

    async fn load_data(&mut self) -> Result<(), RestError> {
        let result: MessageFilterResult = self
            .client
            .get_json(MESSAGE_FILTER_URL, &QueryParams::new())
            .await?;

        let mut rows = result.message_filter_entries;
        for (i, row) in rows.iter_mut().enumerate() {
            row.index = i;
        }

        self.backend_connectors.clear();
        for row in &rows {
            if !self
                .backend_connectors
                .iter()
                .any(|(name, _)| name == &row.backend_name)
            {
                self.backend_connectors
                    .push((row.backend_name.clone(), row.active));
            }
        }
        self.are_filters_persisted = result.are_filters_persisted;

        self.list.set_client_rows(rows);
        self.dirty.clear();

        if !self.are_filters_persisted && self.backend_connectors.len() > 1 {
            self.alerts.error(
                "One or several filters in the table were not configured yet (Persisted flag \
                 is not checked). It is strongly recommended to double check the filters \
                 configuration and afterwards save it.",
            );
        }
        Ok(())
    }
}

impl Modifiable for MessageFilterPage {
    type Key = i64;

    fn dirty(&self) -> &DirtyState<i64> {
        &self.dirty
    }

    fn dirty_mut(&mut self) -> &mut DirtyState<i64> {
        &mut self.dirty
    }

    async fn do_save(&mut self) -> Result<(), RestError> {
        self.reindex();
        self.client.put_json(MESSAGE_FILTER_URL, &self.list.rows).await
    }
}

impl Composed for MessageFilterPage {
    fn ops(&self) -> Arc<OpTable<Self>> {
        self.ops.clone()
    }
}

#[async_trait(?Send)]
impl PageView for MessageFilterPage {
    fn title(&self) -> &'static str {
        "Message Filter"
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::MODIFIABLE
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
            (0, self.list.rows.len()),
            &self.list.selected,
            Self::cell,
        )
    }

    fn page_info(&self) -> PageInfo {
        PageInfo {
            count: self.list.count,
            ..PageInfo::default()
        }
    }

    fn status_line(&self) -> String {
        if self.dirty.is_dirty() {
            format!("{} filters (unsaved changes)", self.list.count)
        } else {
            format!("{} filters", self.list.count)
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
        self.reload().await
    }

    fn toggle_select(&mut self, index: usize) {
        self.list.toggle_selected(index);
    }

    fn begin_add(&mut self) -> Option<FormSpec> {
        if self.is_busy() {
            return None;
        }
        let connector = self
            .backend_connectors
            .iter()
            .find(|(_, active)| *active)
            .map(|(name, _)| name.clone())
            .unwrap_or_default();
        let template = MessageFilterEntry {
            entity_id: 0,
            index: self.list.rows.len(),
            backend_name: connector,
            routing_criterias: Vec::new(),
            persisted: false,
            active: true,
            enabled_property_name: None,
        };
        Some(self.form_for("New message filter", None, &template))
    }

    fn begin_edit(&mut self) -> Option<FormSpec> {
        let &index = self.list.selected.first()?;
        let row = self.list.rows.get(index)?;
        if !row.active {
            self.alerts
                .error("Cannot edit a backend filter of a disabled backend connector.");
            return None;
        }
        Some(self.form_for("Edit message filter", Some(index), &row.clone()))
    }

    async fn commit_form(&mut self, form: FormSpec) -> anyhow::Result<()> {
        match form.row {
            None => {
                let template = MessageFilterEntry {
                    entity_id: 0,
                    index: self.list.rows.len(),
                    backend_name: String::new(),
                    routing_criterias: Vec::new(),
                    persisted: false,
                    active: true,
                    enabled_property_name: None,
                };
                let entry = self.entry_from_form(&form, template);
                if entry.backend_name.is_empty() {
                    self.alerts.error("The backend name is required");
                    return Ok(());
                }
                if self.find_duplicate(&entry, None).is_some() {
                    self.alerts.error("Impossible to insert a duplicate entry");
                    return Ok(());
                }
                self.list.rows.push(entry);
                self.list.count = self.list.rows.len();
                self.dirty.touch();
            }
            Some(index) => {
                let Some(base) = self.list.rows.get(index).cloned() else {
                    return Ok(());
                };
                let entry = self.entry_from_form(&form, base);
                if let Some(at) = self.find_duplicate(&entry, Some(index)) {
                    if at != index {
                        self.alerts.error("Impossible to insert a duplicate entry");
                        return Ok(());
                    }
                }
                if !self.list.rows[index].is_like(&entry) {
                    self.list.rows[index] = entry;
                    self.dirty.touch();
                }
            }
        }
        Ok(())
    }

    async fn delete_selected(&mut self) -> anyhow::Result<()> {
        if self.list.selected.is_empty() || self.is_busy() {
            return Ok(());
        }
        let mut indices = self.list.selected.clone();
        indices.sort_unstable();
        for &index in indices.iter().rev() {
            if index < self.list.rows.len() {
                self.list.rows.remove(index);
            }
        }
        self.reindex();
        self.list.count = self.list.rows.len();
        self.list.clear_selection();
        self.dirty.touch();
        Ok(())
    }

    fn export_url(&self) -> Option<String> {
        Some(self.client.export_url(CSV_URL, &QueryParams::new()))
    }

    fn row_detail(&self, index: usize) -> Option<String> {
        let row = self.list.rows.get(index)?;
        let criteria = row
            .routing_criterias
            .iter()
            .map(|c| format!("  {} = {}", c.name, c.expression))
            .collect::<Vec<_>>()
            .join("\n");
        Some(format!(
            "Backend:   {}\nPersisted: {}\nActive:    {}\nRouting criteria:\n{}",
            row.backend_name,
            util::fmt_bool(row.persisted),
            util::fmt_bool(row.active),
            if criteria.is_empty() { "  (none)".to_string() } else { criteria },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> MessageFilterPage {
        let client = RestClient::new("http://gateway.local:8080", "admin", "secret").unwrap();
        MessageFilterPage::new(client, AlertBus::new()).unwrap()
    }

    fn entry(id: i64, backend: &str, action: &str) -> MessageFilterEntry {
        MessageFilterEntry {
            entity_id: id,
            index: 0,
            backend_name: backend.to_string(),
            routing_criterias: vec![RoutingCriteria {
                name: "action".to_string(),
                expression: action.to_string(),
            }],
            persisted: true,
            active: true,
            enabled_property_name: None,
        }
    }

    #[tokio::test]
    async fn test_move_up_swaps_and_marks_dirty() {
        let mut p = page();
        p.list
            .set_client_rows(vec![entry(1, "ws", "submit"), entry(2, "jms", "notify")]);
        p.list.toggle_selected(1);

        p.invoke("move-up").await.unwrap();

        assert_eq!(p.list.rows[0].entity_id, 2);
        assert_eq!(p.list.rows[0].index, 0);
        assert_eq!(p.list.selected, vec![0]);
        assert!(p.dirty.is_dirty());
    }

    #[tokio::test]
    async fn test_move_up_at_the_top_is_a_no_op() {
        let mut p = page();
        p.list
            .set_client_rows(vec![entry(1, "ws", "submit"), entry(2, "jms", "notify")]);
        p.list.toggle_selected(0);

        p.invoke("move-up").await.unwrap();

        assert_eq!(p.list.rows[0].entity_id, 1);
        assert!(!p.dirty.is_dirty());
    }

    #[tokio::test]
    async fn test_duplicate_add_is_rejected() {
        let mut p = page();
        p.backend_connectors = vec![("ws".to_string(), true)];
        p.list.set_client_rows(vec![entry(1, "ws", "submit")]);

        let mut form = p.begin_add().unwrap();
        for field in form.fields.iter_mut() {
            if field.key == "action" {
                field.value = "submit".to_string();
            }
        }
        p.commit_form(form).await.unwrap();

        assert_eq!(p.list.rows.len(), 1);
        assert!(p.alerts.pop().unwrap().message.contains("duplicate"));
        assert!(!p.dirty.is_dirty());
    }

    #[tokio::test]
    async fn test_editing_a_disabled_connector_row_is_refused() {
        let mut p = page();
        let mut row = entry(1, "ws", "submit");
        row.active = false;
        p.list.set_client_rows(vec![row]);
        p.list.toggle_selected(0);

        assert!(p.begin_edit().is_none());
        assert!(p.alerts.pop().unwrap().message.contains("disabled backend"));
    }

    #[tokio::test]
    async fn test_delete_reindexes_remaining_rows() {
        let mut p = page();
        p.list.set_client_rows(vec![
            entry(1, "ws", "a"),
            entry(2, "ws", "b"),
            entry(3, "ws", "c"),
        ]);
        p.list.toggle_selected(1);

        p.delete_selected().await.unwrap();

        assert_eq!(p.list.rows.len(), 2);
        assert_eq!(p.list.rows[1].entity_id, 3);
        assert_eq!(p.list.rows[1].index, 1);
        assert!(p.dirty.is_dirty());
    }
}
