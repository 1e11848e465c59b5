//! Parties page - PMode participants
//!
//! The party list only exists once a PMode is configured, so activation
//! probes for one first. All rows are fetched in one request, filtered and
//! paged on the client, and edits accumulate in the three dirty subsets
//! until the whole list is validated and sent back.

use super::{
    build_grid, change_page_size, goto_page, page_info_of, Composed, Field, FormSpec, Grid,
    PageInfo, PageView,
};
use crate::alert::AlertBus;
use crate::list::behaviors;
use crate::list::{
    BaseList, CapabilitySet, ColumnDef, ColumnPicker, Composer, DirtyState, FilterState,
    Filterable, ListState, Modifiable, OpTable, PageState, Pageable, RowLimiter,
};
use crate::rest::error::RestError;
use crate::rest::models::{PartyIdentifier, PartyRow, PmodeInfo, ProcessRef};
use crate::rest::params::QueryParams;
use crate::rest::RestClient;
use async_trait::async_trait;
use std::sync::Arc;

const PARTY_LIST_URL: &str = "rest/party/list";
const PARTY_UPDATE_URL: &str = "rest/party/update";
const PROCESSES_URL: &str = "rest/party/processes";
const PMODE_CURRENT_URL: &str = "rest/pmode/current";
const CSV_URL: &str = "rest/party/csv";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartyCriteria {
    pub name: Option<String>,
    pub end_point: Option<String>,
    pub party_id: Option<String>,
    pub process: Option<String>,
}

impl PartyCriteria {
    fn matches(&self, party: &PartyRow) -> bool {
        let contains = |field: &str, needle: &Option<String>| match needle {
            Some(n) => field.to_lowercase().contains(&n.to_lowercase()),
            None => true,
        };
        contains(&party.name, &self.name)
            && contains(party.end_point.as_deref().unwrap_or(""), &self.end_point)
            && contains(&party.joined_identifiers(), &self.party_id)
            && contains(&party.joined_processes(), &self.process)
    }
}

pub struct PartiesPage {
    client: RestClient,
    alerts: AlertBus,
    list: ListState<PartyRow>,
    /// Unfiltered backing set; the save payload is this whole list
    all_rows: Vec<PartyRow>,
    filter: FilterState<PartyCriteria>,
    pager: PageState,
    limiter: RowLimiter,
    /// Keyed by entity id; locally-added rows get negative ids until saved
    dirty: DirtyState<i64>,
    columns: ColumnPicker,
    ops: Arc<OpTable<Self>>,
    processes: Vec<String>,
    pmode_exists: bool,
    next_local_id: i64,
}

impl PartiesPage {
    pub fn new(client: RestClient, alerts: AlertBus) -> anyhow::Result<Self> {
        let columns = ColumnPicker::all_visible(vec![
            ColumnDef::new("Party Name", "name", 20),
            ColumnDef::new("End Point", "endpoint", 40),
            ColumnDef::new("Party Id", "joinedIdentifiers", 24),
            ColumnDef::new("Process (I=Initiator, R=Responder)", "joinedProcesses", 34),
        ]);

        let mut page = Self {
            client,
            alerts,
            list: ListState::new(),
            all_rows: Vec::new(),
            filter: FilterState::new(),
            pager: PageState::client(),
            limiter: RowLimiter::default(),
            dirty: DirtyState::new(),
            columns,
            ops: Arc::new(OpTable::empty()),
            processes: Vec::new(),
            pmode_exists: false,
            next_local_id: -1,
        };

        let table = Composer::new()
            .with(behaviors::base())
            .with(behaviors::filterable())
            .with(behaviors::modifiable())
            .with(behaviors::client_pageable())
            .apply(&mut page)?;
        page.ops = Arc::new(table);
        Ok(page)
    }

    fn allocate_local_id(&mut self) -> i64 {
        let id = self.next_local_id;
        self.next_local_id -= 1;
        id
    }

    fn rebuild_visible_rows(&mut self) {
        let criteria = self.filter.active.clone();
        let rows: Vec<PartyRow> = self
            .all_rows
            .iter()
            .filter(|p| criteria.matches(p))
            .cloned()
            .collect();
        self.list.set_client_rows(rows);
    }

    fn remove_row(&mut self, entity_id: i64) {
        self.all_rows.retain(|p| p.entity_id != entity_id);
        self.list.rows.retain(|p| p.entity_id != entity_id);
        self.list.count = self.list.rows.len();
        self.list.clear_selection();
        self.dirty.mark_removed(entity_id);
    }

    /// Every party needs a name and at least one identifier before the list
    /// can be sent back
    fn validate_parties(&self) -> Result<(), RestError> {
        for party in &self.all_rows {
            if party.name.trim().is_empty() {
                return Err(RestError::Validation(
                    "Party validation error: a party has no name".to_string(),
                ));
            }
            if party.identifiers.is_empty()
                || party.identifiers.iter().all(|i| i.party_id.trim().is_empty())
            {
                return Err(RestError::Validation(format!(
                    "Party validation error: party [{}] has no identifier",
                    party.name
                )));
            }
        }
        Ok(())
    }

    fn cell(row: &PartyRow, prop: &str) -> String {
        match prop {
            "name" => row.name.clone(),
            "endpoint" => row.end_point.clone().unwrap_or_default(),
            "joinedIdentifiers" => row.joined_identifiers(),
            "joinedProcesses" => row.joined_processes(),
            _ => String::new(),
        }
    }

    fn form_for(&self, title: &str, row: Option<usize>, party: &PartyRow) -> FormSpec {
        let initiators: Vec<&str> = party
            .processes_with_party_as_initiator
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        let responders: Vec<&str> = party
            .processes_with_party_as_responder
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        FormSpec {
            kind: "party",
            title: title.to_string(),
            row,
            fields: vec![
                Field::new("name", "Party Name", party.name.clone()),
                Field::new("endpoint", "End Point", party.end_point.clone().unwrap_or_default()),
                Field::new("partyId", "Party Id", party.joined_identifiers()),
                Field::new("initiator", "Initiator of (csv)", initiators.join(", ")),
                Field::new("responder", "Responder of (csv)", responders.join(", ")),
            ],
        }
    }

    fn parse_process_list(&self, value: &str) -> Vec<ProcessRef> {
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|name| ProcessRef {
                entity_id: 0,
                name: name.to_string(),
            })
            .collect()
    }

    fn apply_form(&self, party: &mut PartyRow, form: &FormSpec) {
        party.name = form.value_of("name").trim().to_string();
        party.end_point = Some(form.value_of("endpoint").trim().to_string())
            .filter(|s| !s.is_empty());
        party.identifiers = form
            .value_of("partyId")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|id| PartyIdentifier {
                party_id: id.to_string(),
                party_id_type: None,
            })
            .collect();
        party.processes_with_party_as_initiator =
            self.parse_process_list(form.value_of("initiator"));
        party.processes_with_party_as_responder =
            self.parse_process_list(form.value_of("responder"));
    }
}

impl BaseList for PartiesPage {
    type Row = PartyRow;

    fn page_name(&self) -> &'static str {
        "parties"
    }

    fn list(&self) -> &ListState<PartyRow> {
        &self.list
    }

    fn list_mut(&mut self) -> &mut ListState<PartyRow> {
        &mut self.list
    }

    fn alerts(&self) -> &AlertBus {
        &self.alerts
    }

    fn has_unsaved_changes(&self) -> bool {
        self.dirty.is_dirty()
    }

    async fn load_data(&mut self) -> Result<(), RestError> {
        let mut params = QueryParams::new();
        params.append("pageSize", 0);
        let parties: Vec<PartyRow> = self.client.get_json(PARTY_LIST_URL, &params).await?;

        match self
            .client
            .get_json::<Vec<ProcessRef>>(PROCESSES_URL, &QueryParams::new())
            .await
        {
            Ok(processes) => self.processes = processes.into_iter().map(|p| p.name).collect(),
            Err(err) => tracing::warn!("Could not load processes: {}", err),
        }

        self.all_rows = parties;
        self.dirty.clear();
        self.rebuild_visible_rows();
        Ok(())
    }
}

impl Filterable for PartiesPage {
    type Criteria = PartyCriteria;

    fn filter(&self) -> &FilterState<PartyCriteria> {
        &self.filter
    }

    fn filter_mut(&mut self) -> &mut FilterState<PartyCriteria> {
        &mut self.filter
    }
}

impl Pageable for PartiesPage {
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

impl Modifiable for PartiesPage {
    type Key = i64;

    fn dirty(&self) -> &DirtyState<i64> {
        &self.dirty
    }

    fn dirty_mut(&mut self) -> &mut DirtyState<i64> {
        &mut self.dirty
    }

    async fn do_save(&mut self) -> Result<(), RestError> {
        self.validate_parties()?;

        // Locally-assigned ids must not reach the backend
        let payload: Vec<PartyRow> = self
            .all_rows
            .iter()
            .cloned()
            .map(|mut p| {
                if p.entity_id < 0 {
                    p.entity_id = 0;
                }
                p
            })
            .collect();

        self.client.put_json(PARTY_UPDATE_URL, &payload).await
    }
}

impl Composed for PartiesPage {
    fn ops(&self) -> Arc<OpTable<Self>> {
        self.ops.clone()
    }
}

#[async_trait(?Send)]
impl PageView for PartiesPage {
    fn title(&self) -> &'static str {
        "Parties"
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::FILTERABLE | CapabilitySet::PAGEABLE | CapabilitySet::MODIFIABLE
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
        if !self.pmode_exists {
            return "no PMode configured - upload one first".to_string();
        }
        if self.dirty.is_dirty() {
            format!(
                "{} parties | {} new, {} updated, {} removed (unsaved)",
                self.list.count,
                self.dirty.added().len(),
                self.dirty.updated().len(),
                self.dirty.removed().len()
            )
        } else {
            format!("{} parties", self.list.count)
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
        match self
            .client
            .get_json::<Option<PmodeInfo>>(PMODE_CURRENT_URL, &QueryParams::new())
            .await
        {
            Ok(Some(_)) => {
                self.pmode_exists = true;
                self.try_filter(false).await?;
            }
            Ok(None) => self.pmode_exists = false,
            Err(err) => {
                self.pmode_exists = false;
                self.alerts.exception("Could not check the current PMode", &err);
            }
        }
        Ok(())
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
            Field::new("name", "Party Name", f.name.clone().unwrap_or_default()),
            Field::new("endpoint", "End Point", f.end_point.clone().unwrap_or_default()),
            Field::new("partyId", "Party Id", f.party_id.clone().unwrap_or_default()),
            Field::new("process", "Process", f.process.clone().unwrap_or_default()),
        ]
    }

    fn set_filter_field(&mut self, key: &str, value: &str) {
        let f = &mut self.filter.edited;
        let value = value.trim();
        let opt = (!value.is_empty()).then(|| value.to_string());
        match key {
            "name" => f.name = opt,
            "endpoint" => f.end_point = opt,
            "partyId" => f.party_id = opt,
            "process" => f.process = opt,
            _ => {}
        }
    }

    fn filter_hints(&self, key: &str) -> Vec<String> {
        match key {
            "process" => self.processes.clone(),
            _ => Vec::new(),
        }
    }

    fn begin_add(&mut self) -> Option<FormSpec> {
        if self.is_busy() || !self.pmode_exists {
            return None;
        }

        self.pager.offset = self.last_page();

        let party = PartyRow {
            entity_id: self.allocate_local_id(),
            name: String::new(),
            end_point: None,
            identifiers: Vec::new(),
            processes_with_party_as_initiator: Vec::new(),
            processes_with_party_as_responder: Vec::new(),
        };
        let key = party.entity_id;

        self.all_rows.push(party.clone());
        self.list.rows.push(party.clone());
        self.list.count = self.list.rows.len();
        self.dirty.mark_added(key);

        let index = self.list.rows.len() - 1;
        let mut form = self.form_for("New party", Some(index), &party);
        form.kind = "party-add";
        Some(form)
    }

    fn begin_edit(&mut self) -> Option<FormSpec> {
        if !self.pmode_exists {
            return None;
        }
        let &index = self.list.selected.first()?;
        let party = self.list.rows.get(index)?.clone();
        Some(self.form_for("Edit party", Some(index), &party))
    }

    async fn commit_form(&mut self, form: FormSpec) -> anyhow::Result<()> {
        let Some(index) = form.row else {
            return Ok(());
        };
        let Some(row) = self.list.rows.get(index) else {
            return Ok(());
        };
        let key = row.entity_id;

        if form.value_of("name").trim().is_empty() {
            self.alerts.error("The party name is required");
            if form.kind == "party-add" {
                self.remove_row(key);
            }
            return Ok(());
        }

        let mut updated = row.clone();
        self.apply_form(&mut updated, &form);

        let changed = {
            let before = &self.list.rows[index];
            serde_json::to_string(before).ok() != serde_json::to_string(&updated).ok()
        };
        if !changed {
            return Ok(());
        }

        if let Some(p) = self.all_rows.iter_mut().find(|p| p.entity_id == key) {
            *p = updated.clone();
        }
        self.list.rows[index] = updated;

        self.dirty.mark_updated(key);
        Ok(())
    }

    async fn cancel_form(&mut self, form: FormSpec) -> anyhow::Result<()> {
        // An aborted add removes the provisional row again
        if form.kind == "party-add" {
            if let Some(index) = form.row {
                if let Some(row) = self.list.rows.get(index) {
                    let key = row.entity_id;
                    self.remove_row(key);
                }
            }
        }
        Ok(())
    }

    async fn delete_selected(&mut self) -> anyhow::Result<()> {
        if self.list.saving || self.list.selected.is_empty() {
            return Ok(());
        }
        let keys: Vec<i64> = self
            .list
            .selected_rows()
            .iter()
            .map(|p| p.entity_id)
            .collect();
        for key in keys {
            self.remove_row(key);
        }
        Ok(())
    }

    fn export_url(&self) -> Option<String> {
        let f = &self.filter.active;
        let mut params = QueryParams::new();
        params
            .append_opt("name", f.name.clone())
            .append_opt("endPoint", f.end_point.clone())
            .append_opt("partyId", f.party_id.clone())
            .append_opt("process", f.process.clone());
        Some(self.client.export_url(CSV_URL, &params))
    }

    fn row_detail(&self, index: usize) -> Option<String> {
        let row = self.list.rows.get(index)?;
        Some(format!(
            "Party Name: {}\nEnd Point:  {}\nParty Id:   {}\nProcesses:  {}",
            row.name,
            row.end_point.as_deref().unwrap_or("-"),
            row.joined_identifiers(),
            row.joined_processes(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> PartiesPage {
        let client = RestClient::new("http://gateway.local:8080", "admin", "secret").unwrap();
        let mut p = PartiesPage::new(client, AlertBus::new()).unwrap();
        p.pmode_exists = true;
        p
    }

    fn party(id: i64, name: &str) -> PartyRow {
        PartyRow {
            entity_id: id,
            name: name.to_string(),
            end_point: Some(format!("http://{}.example.com/msh", name)),
            identifiers: vec![PartyIdentifier {
                party_id: format!("{}-id", name),
                party_id_type: None,
            }],
            processes_with_party_as_initiator: Vec::new(),
            processes_with_party_as_responder: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_aborted_add_removes_the_provisional_row() {
        let mut p = page();
        p.all_rows = vec![party(1, "blue")];
        p.rebuild_visible_rows();

        let form = p.begin_add().unwrap();
        assert_eq!(p.list.rows.len(), 2);
        assert!(p.dirty.is_dirty());

        p.cancel_form(form).await.unwrap();

        assert_eq!(p.list.rows.len(), 1);
        assert_eq!(p.all_rows.len(), 1);
        assert!(!p.dirty.is_dirty());
    }

    #[tokio::test]
    async fn test_deleting_a_persisted_party_records_a_removal() {
        let mut p = page();
        p.all_rows = vec![party(7, "blue")];
        p.rebuild_visible_rows();
        p.list.toggle_selected(0);

        p.delete_selected().await.unwrap();

        assert!(p.all_rows.is_empty());
        assert_eq!(p.dirty.removed(), &[7]);
    }

    #[tokio::test]
    async fn test_editing_marks_updated_once() {
        let mut p = page();
        p.all_rows = vec![party(7, "blue")];
        p.rebuild_visible_rows();
        p.list.toggle_selected(0);

        let mut form = p.begin_edit().unwrap();
        for field in form.fields.iter_mut() {
            if field.key == "endpoint" {
                field.value = "http://elsewhere/msh".to_string();
            }
        }
        p.commit_form(form.clone()).await.unwrap();
        p.commit_form(form).await.unwrap();

        assert_eq!(p.dirty.updated(), &[7]);
        assert_eq!(
            p.all_rows[0].end_point.as_deref(),
            Some("http://elsewhere/msh")
        );
    }

    #[test]
    fn test_validation_requires_an_identifier() {
        let mut p = page();
        let mut bad = party(1, "blue");
        bad.identifiers.clear();
        p.all_rows = vec![bad];
        assert!(p.validate_parties().is_err());

        p.all_rows = vec![party(1, "blue")];
        assert!(p.validate_parties().is_ok());
    }

    #[test]
    fn test_client_filter_matches_substrings() {
        let criteria = PartyCriteria {
            name: Some("blu".to_string()),
            ..PartyCriteria::default()
        };
        assert!(criteria.matches(&party(1, "blue")));
        assert!(!criteria.matches(&party(2, "red")));
    }
}
