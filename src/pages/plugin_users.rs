//! Plugin users page - credentials the plugins authenticate with
//!
//! Same row lifecycle as the Users page, with one twist: rows marked for
//! removal disappear from the grid instead of showing a deleted flag, so
//! the backing set and the displayed set differ while edits are pending.

use super::{
    build_grid, change_page_size, goto_page, page_info_of, Composed, Field, FormSpec, Grid,
    PageInfo, PageView,
};
use crate::alert::AlertBus;
use crate::list::behaviors;
use crate::list::{
    BaseList, CapabilitySet, ColumnDef, ColumnPicker, Composer, DirtyState, FilterState,
    Filterable, ListState, Modifiable, OpTable, PageState, Pageable, RowLimiter, SortState,
    Sortable,
};
use crate::rest::error::RestError;
use crate::rest::models::{PluginUserResult, PluginUserRow, RowStatus};
use crate::rest::params::QueryParams;
use crate::rest::RestClient;
use crate::util;
use async_trait::async_trait;
use std::cmp::Ordering;
use std::sync::Arc;

const PLUGIN_USERS_URL: &str = "rest/plugin/users";
const CSV_URL: &str = "rest/plugin/csv";

const AUTH_TYPES: [&str; 2] = ["BASIC", "CERTIFICATE"];
const AUTH_ROLES: [&str; 2] = ["ROLE_USER", "ROLE_ADMIN"];

#[derive(Debug, Clone, PartialEq)]
pub struct PluginUserCriteria {
    pub auth_type: String,
    pub auth_role: Option<String>,
    pub user_name: Option<String>,
    pub original_user: Option<String>,
}

impl Default for PluginUserCriteria {
    fn default() -> Self {
        Self {
            auth_type: "BASIC".to_string(),
            auth_role: None,
            user_name: None,
            original_user: None,
        }
    }
}

pub struct PluginUsersPage {
    client: RestClient,
    alerts: AlertBus,
    list: ListState<PluginUserRow>,
    /// Includes rows marked for removal, which the grid hides
    all_entries: Vec<PluginUserRow>,
    filter: FilterState<PluginUserCriteria>,
    pager: PageState,
    limiter: RowLimiter,
    sort: SortState,
    dirty: DirtyState<String>,
    columns: ColumnPicker,
    ops: Arc<OpTable<Self>>,
}

impl PluginUsersPage {
    pub fn new(client: RestClient, alerts: AlertBus) -> anyhow::Result<Self> {
        let columns = ColumnPicker::new(
            vec![
                ColumnDef::new("User Name", "userName", 20),
                ColumnDef::new("Certificate Id", "certificateId", 30),
                ColumnDef::new("Original User", "originalUser", 30),
                ColumnDef::new("Role", "authRoles", 14),
                ColumnDef::new("Auth Type", "authType", 12),
                ColumnDef::new("Active", "active", 8),
            ],
            &["User Name", "Role", "Auth Type", "Active"],
        );

        let mut page = Self {
            client,
            alerts,
            list: ListState::new(),
            all_entries: Vec::new(),
            filter: FilterState::new(),
            pager: PageState::client(),
            limiter: RowLimiter::default(),
            sort: SortState::client(),
            dirty: DirtyState::new(),
            columns,
            ops: Arc::new(OpTable::empty()),
        };

        let table = Composer::new()
            .with(behaviors::base())
            .with(behaviors::filterable())
            .with(behaviors::client_pageable())
            .with(behaviors::modifiable())
            .with(behaviors::sortable())
            .apply(&mut page)?;
        page.ops = Arc::new(table);
        Ok(page)
    }

    /// Stable identity across basic and certificate users
    fn key_of(row: &PluginUserRow) -> String {
        row.user_name
            .clone()
            .or_else(|| row.certificate_id.clone())
            .unwrap_or_default()
    }

    fn rebuild_visible_rows(&mut self) {
        let dirty = &self.dirty;
        let rows: Vec<PluginUserRow> = self
            .all_entries
            .iter()
            .filter(|r| dirty.status_of(&Self::key_of(r)) != RowStatus::Removed)
            .cloned()
            .collect();
        self.list.set_client_rows(rows);
    }

    fn params(&self) -> QueryParams {
        let f = &self.filter.active;
        let mut params = QueryParams::new();
        params
            .append("authType", f.auth_type.clone())
            .append_opt("authRole", f.auth_role.clone())
            .append_opt("userName", f.user_name.clone())
            .append_opt("originalUser", f.original_user.clone())
            .append("page", 0)
            .append("pageSize", 10000);
        params
    }

    fn cell(row: &PluginUserRow, prop: &str) -> String {
        match prop {
            "userName" => row.user_name.clone().unwrap_or_default(),
            "certificateId" => row.certificate_id.clone().unwrap_or_default(),
            "originalUser" => row.original_user.clone().unwrap_or_default(),
            "authRoles" => row.auth_roles.clone(),
            "authType" => row.auth_type.clone(),
            "active" => util::fmt_bool(row.active).to_string(),
            _ => String::new(),
        }
    }
}

impl BaseList for PluginUsersPage {
    type Row = PluginUserRow;

    fn page_name(&self) -> &'static str {
        "plugin users"
    }

    fn list(&self) -> &ListState<PluginUserRow> {
        &self.list
    }

    fn list_mut(&mut self) -> &mut ListState<PluginUserRow> {
        &mut self.list
    }

    fn alerts(&self) -> &AlertBus {
        &self.alerts
    }

    fn has_unsaved_changes(&self) -> bool {
        self.dirty.is_dirty()
    }

    async fn load_data(&mut self) -> Result<(), RestError> {
        let result: PluginUserResult = self.client.get_json(PLUGIN_USERS_URL, &self.params()).await?;
        self.all_entries = result.entries;
        self.dirty.clear();
        self.rebuild_visible_rows();
        Ok(())
    }
}

impl Filterable for PluginUsersPage {
    type Criteria = PluginUserCriteria;

    fn filter(&self) -> &FilterState<PluginUserCriteria> {
        &self.filter
    }

    fn filter_mut(&mut self) -> &mut FilterState<PluginUserCriteria> {
        &mut self.filter
    }
}

impl Pageable for PluginUsersPage {
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

impl Sortable for PluginUsersPage {
    fn sort_state(&self) -> &SortState {
        &self.sort
    }

    fn sort_state_mut(&mut self) -> &mut SortState {
        &mut self.sort
    }

    fn compare_rows(&self, a: &PluginUserRow, b: &PluginUserRow, column: &str) -> Ordering {
        match column {
            "userName" => a.user_name.cmp(&b.user_name),
            "authRoles" => a.auth_roles.cmp(&b.auth_roles),
            "authType" => a.auth_type.cmp(&b.auth_type),
            _ => Ordering::Equal,
        }
    }
}

impl Modifiable for PluginUsersPage {
    type Key = String;

    fn dirty(&self) -> &DirtyState<String> {
        &self.dirty
    }

    fn dirty_mut(&mut self) -> &mut DirtyState<String> {
        &mut self.dirty
    }

    async fn do_save(&mut self) -> Result<(), RestError> {
        let modified: Vec<PluginUserRow> = self
            .all_entries
            .iter()
            .filter_map(|r| {
                let status = self.dirty.status_of(&Self::key_of(r));
                if status == RowStatus::Persisted {
                    return None;
                }
                let mut row = r.clone();
                row.status = status;
                Some(row)
            })
            .collect();

        self.client.put_json(PLUGIN_USERS_URL, &modified).await
    }
}

impl Composed for PluginUsersPage {
    fn ops(&self) -> Arc<OpTable<Self>> {
        self.ops.clone()
    }
}

#[async_trait(?Send)]
impl PageView for PluginUsersPage {
    fn title(&self) -> &'static str {
        "Plugin Users"
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::FILTERABLE
            | CapabilitySet::PAGEABLE
            | CapabilitySet::SORTABLE
            | CapabilitySet::MODIFIABLE
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
        if self.dirty.is_dirty() {
            format!("{} plugin users (unsaved changes)", self.list.count)
        } else {
            format!("{} plugin users", self.list.count)
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
        vec![
            ("userName", "User Name"),
            ("authRoles", "Role"),
            ("authType", "Auth Type"),
        ]
    }

    async fn sort_on(&mut self, prop: &str) -> anyhow::Result<()> {
        self.sort_by(prop).await
    }

    fn filter_fields(&self) -> Vec<Field> {
        let f = &self.filter.edited;
        vec![
            Field::new("authType", "Auth Type", f.auth_type.clone()),
            Field::new("role", "Role", f.auth_role.clone().unwrap_or_default()),
            Field::new("userName", "User Name", f.user_name.clone().unwrap_or_default()),
            Field::new(
                "originalUser",
                "Original User",
                f.original_user.clone().unwrap_or_default(),
            ),
        ]
    }

    fn set_filter_field(&mut self, key: &str, value: &str) {
        let f = &mut self.filter.edited;
        let value = value.trim();
        let opt = (!value.is_empty()).then(|| value.to_string());
        match key {
            "authType" => {
                if AUTH_TYPES.contains(&value.to_ascii_uppercase().as_str()) {
                    f.auth_type = value.to_ascii_uppercase();
                }
            }
            "role" => f.auth_role = opt,
            "userName" => f.user_name = opt,
            "originalUser" => f.original_user = opt,
            _ => {}
        }
    }

    fn filter_hints(&self, key: &str) -> Vec<String> {
        match key {
            "authType" => AUTH_TYPES.iter().map(|s| s.to_string()).collect(),
            "role" => AUTH_ROLES.iter().map(|s| s.to_string()).collect(),
            _ => Vec::new(),
        }
    }

    fn begin_add(&mut self) -> Option<FormSpec> {
        if self.is_busy() {
            return None;
        }
        self.pager.offset = self.last_page();
        Some(FormSpec {
            kind: "plugin-user",
            title: "New plugin user".to_string(),
            row: None,
            fields: vec![
                Field::new("userName", "User Name", ""),
                Field::new("authRoles", "Role", AUTH_ROLES[0]),
                Field::new("active", "Active (true/false)", "true"),
            ],
        })
    }

    fn begin_edit(&mut self) -> Option<FormSpec> {
        let &index = self.list.selected.first()?;
        let row = self.list.rows.get(index)?;
        Some(FormSpec {
            kind: "plugin-user",
            title: "Edit plugin user".to_string(),
            row: Some(index),
            fields: vec![
                Field::new("userName", "User Name", row.user_name.clone().unwrap_or_default()),
                Field::new("authRoles", "Role", row.auth_roles.clone()),
                Field::new("active", "Active (true/false)", row.active.to_string()),
            ],
        })
    }

    async fn commit_form(&mut self, form: FormSpec) -> anyhow::Result<()> {
        let name = form.value_of("userName").trim().to_string();
        if name.is_empty() {
            self.alerts.error("The user name is required");
            return Ok(());
        }

        match form.row {
            None => {
                if self.all_entries.iter().any(|r| Self::key_of(r) == name) {
                    self.alerts.error("Impossible to insert a duplicate entry");
                    return Ok(());
                }
                let row = PluginUserRow {
                    entity_id: 0,
                    user_name: Some(name.clone()),
                    certificate_id: None,
                    original_user: None,
                    auth_roles: form.value_of("authRoles").to_string(),
                    auth_type: self.filter.active.auth_type.clone(),
                    active: form.value_of("active").eq_ignore_ascii_case("true"),
                    status: RowStatus::New,
                };
                self.all_entries.push(row);
                self.dirty.mark_added(name);
                self.rebuild_visible_rows();
                self.pager.offset = self.last_page();
            }
            Some(index) => {
                let Some(row) = self.list.rows.get(index) else {
                    return Ok(());
                };
                let key = Self::key_of(row);
                let roles = form.value_of("authRoles").to_string();
                let active = form.value_of("active").eq_ignore_ascii_case("true");

                let changed = row.auth_roles != roles || row.active != active;
                if !changed {
                    return Ok(());
                }

                for entry in self
                    .all_entries
                    .iter_mut()
                    .filter(|r| Self::key_of(r) == key)
                {
                    entry.auth_roles = roles.clone();
                    entry.active = active;
                }
                self.dirty.mark_updated(key);
                self.rebuild_visible_rows();
            }
        }
        Ok(())
    }

    async fn delete_selected(&mut self) -> anyhow::Result<()> {
        if self.list.selected.is_empty() || self.is_busy() {
            return Ok(());
        }

        let keys: Vec<String> = self
            .list
            .selected_rows()
            .iter()
            .map(|r| Self::key_of(r))
            .collect();

        for key in keys {
            let never_saved = self.dirty.mark_removed(key.clone());
            if never_saved {
                self.all_entries.retain(|r| Self::key_of(r) != key);
            }
        }
        self.rebuild_visible_rows();
        Ok(())
    }

    fn export_url(&self) -> Option<String> {
        Some(self.client.export_url(CSV_URL, &self.params()))
    }

    fn row_detail(&self, index: usize) -> Option<String> {
        let row = self.list.rows.get(index)?;
        Some(format!(
            "User Name:      {}\nCertificate Id: {}\nOriginal User:  {}\nRole:           {}\nAuth Type:      {}\nActive:         {}",
            row.user_name.as_deref().unwrap_or("-"),
            row.certificate_id.as_deref().unwrap_or("-"),
            row.original_user.as_deref().unwrap_or("-"),
            row.auth_roles,
            row.auth_type,
            util::fmt_bool(row.active),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> PluginUsersPage {
        let client = RestClient::new("http://gateway.local:8080", "admin", "secret").unwrap();
        PluginUsersPage::new(client, AlertBus::new()).unwrap()
    }

    fn entry(name: &str) -> PluginUserRow {
        PluginUserRow {
            entity_id: 1,
            user_name: Some(name.to_string()),
            certificate_id: None,
            original_user: None,
            auth_roles: "ROLE_USER".to_string(),
            auth_type: "BASIC".to_string(),
            active: true,
            status: RowStatus::Persisted,
        }
    }

    #[tokio::test]
    async fn test_removed_rows_are_hidden_but_kept_for_save() {
        let mut p = page();
        p.all_entries = vec![entry("one"), entry("two")];
        p.rebuild_visible_rows();
        p.list.toggle_selected(0);

        p.delete_selected().await.unwrap();

        // Hidden from the grid, still in the backing set with REMOVED status
        assert_eq!(p.list.rows.len(), 1);
        assert_eq!(p.all_entries.len(), 2);
        assert_eq!(p.dirty.status_of(&"one".to_string()), RowStatus::Removed);
        assert_eq!(p.list.count, 1);
    }

    #[tokio::test]
    async fn test_add_then_delete_nets_to_zero() {
        let mut p = page();
        let mut form = p.begin_add().unwrap();
        for field in form.fields.iter_mut() {
            if field.key == "userName" {
                field.value = "fresh".to_string();
            }
        }
        p.commit_form(form).await.unwrap();
        assert_eq!(p.all_entries.len(), 1);

        p.list.toggle_selected(0);
        p.delete_selected().await.unwrap();

        assert!(p.all_entries.is_empty());
        assert!(p.list.rows.is_empty());
        assert!(!p.dirty.is_dirty());
    }

    #[test]
    fn test_auth_type_filter_only_accepts_known_values() {
        let mut p = page();
        p.set_filter_field("authType", "certificate");
        assert_eq!(p.filter.edited.auth_type, "CERTIFICATE");
        p.set_filter_field("authType", "bogus");
        assert_eq!(p.filter.edited.auth_type, "CERTIFICATE");
    }
}
