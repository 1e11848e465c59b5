//! Users page - console user administration
//!
//! The full user list is fetched in one go and paged/filtered on the
//! client. Edits accumulate locally with row lifecycle statuses; saving
//! sends only the non-persisted rows. The logged-in operator can never
//! delete themselves, and deleted users are read-only.

use super::{
    build_grid, change_page_size, goto_page, page_info_of, Composed, Field, FormSpec, Grid,
    PageInfo, PageView,
};
use crate::alert::AlertBus;
use crate::context::AppContext;
use crate::list::behaviors;
use crate::list::{
    BaseList, CapabilitySet, ColumnDef, ColumnPicker, Composer, DirtyState, FilterState,
    Filterable, ListState, Modifiable, OpTable, PageState, Pageable, RowLimiter,
};
use crate::rest::error::RestError;
use crate::rest::models::{RowStatus, UserRow};
use crate::rest::params::QueryParams;
use crate::rest::RestClient;
use crate::util;
use async_trait::async_trait;
use std::sync::Arc;

const USERS_URL: &str = "rest/user/users";
const USER_ROLES_URL: &str = "rest/user/userroles";
const CSV_URL: &str = "rest/user/csv";

/// Tri-state deleted filter: by default deleted users are hidden
#[derive(Debug, Clone, PartialEq)]
pub struct UserCriteria {
    pub user_name: Option<String>,
    pub auth_role: Option<String>,
    pub deleted: Option<bool>,
}

impl Default for UserCriteria {
    fn default() -> Self {
        Self {
            user_name: None,
            auth_role: None,
            deleted: Some(false),
        }
    }
}

impl UserCriteria {
    fn matches(&self, user: &UserRow) -> bool {
        if let Some(name) = &self.user_name {
            if &user.user_name != name {
                return false;
            }
        }
        if let Some(deleted) = self.deleted {
            if user.deleted != deleted {
                return false;
            }
        }
        if let Some(role) = &self.auth_role {
            if &user.roles != role {
                return false;
            }
        }
        true
    }
}

pub struct UsersPage {
    client: RestClient,
    alerts: AlertBus,
    ctx: AppContext,
    list: ListState<UserRow>,
    /// Unfiltered backing set; the save payload derives from this
    all_users: Vec<UserRow>,
    filter: FilterState<UserCriteria>,
    pager: PageState,
    limiter: RowLimiter,
    dirty: DirtyState<String>,
    columns: ColumnPicker,
    ops: Arc<OpTable<Self>>,
    user_roles: Vec<String>,
    aux_loaded: bool,
}

impl UsersPage {
    pub fn new(client: RestClient, alerts: AlertBus, ctx: AppContext) -> anyhow::Result<Self> {
        let mut all_columns = vec![
            ColumnDef::new("User Name", "userName", 20),
            ColumnDef::new("Role", "roles", 16),
            ColumnDef::new("Email", "email", 24),
            ColumnDef::new("Active", "active", 8),
            ColumnDef::new("Deleted", "deleted", 8),
            ColumnDef::new("Expiration Date", "expirationDate", 20),
        ];
        let mut initially = vec!["User Name", "Role", "Active", "Expiration Date"];
        if ctx.super_admin {
            all_columns.insert(2, ColumnDef::new("Domain", "domain", 14));
            initially.push("Domain");
        }
        let columns = ColumnPicker::new(all_columns, &initially);

        let mut page = Self {
            client,
            alerts,
            ctx,
            list: ListState::new(),
            all_users: Vec::new(),
            filter: FilterState::new(),
            pager: PageState::client(),
            limiter: RowLimiter::default(),
            dirty: DirtyState::new(),
            columns,
            ops: Arc::new(OpTable::empty()),
            user_roles: Vec::new(),
            aux_loaded: false,
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

    fn username_exists(&self, name: &str) -> bool {
        self.all_users.iter().any(|u| u.user_name == name)
    }

    /// Reject save payloads the backend would bounce anyway
    fn validate_users(&self) -> Result<(), RestError> {
        for user in &self.all_users {
            if user.user_name.trim().is_empty() {
                return Err(RestError::Validation(
                    "Cannot save users: a user name is empty".to_string(),
                ));
            }
        }
        let mut names: Vec<&str> = self.all_users.iter().map(|u| u.user_name.as_str()).collect();
        names.sort_unstable();
        if names.windows(2).any(|w| w[0] == w[1]) {
            return Err(RestError::Validation(
                "Cannot save users: duplicate user names".to_string(),
            ));
        }
        Ok(())
    }

    fn cell(row: &UserRow, prop: &str) -> String {
        match prop {
            "userName" => row.user_name.clone(),
            "roles" => row.roles.clone(),
            "email" => row.email.clone().unwrap_or_default(),
            "domain" => row.domain.clone().unwrap_or_default(),
            "active" => util::fmt_bool(row.active).to_string(),
            "deleted" => util::fmt_bool(row.deleted).to_string(),
            "expirationDate" => util::fmt_ts(row.expiration_date),
            _ => String::new(),
        }
    }

    fn form_for(&self, title: &str, row: Option<usize>, user: &UserRow) -> FormSpec {
        FormSpec {
            kind: "user",
            title: title.to_string(),
            row,
            fields: vec![
                Field::new("userName", "User Name", user.user_name.clone()),
                Field::new("roles", "Role", user.roles.clone()),
                Field::new("email", "Email", user.email.clone().unwrap_or_default()),
                Field::new("active", "Active (true/false)", user.active.to_string()),
            ],
        }
    }
}

impl BaseList for UsersPage {
    type Row = UserRow;

    fn page_name(&self) -> &'static str {
        "users"
    }

    fn list(&self) -> &ListState<UserRow> {
        &self.list
    }

    fn list_mut(&mut self) -> &mut ListState<UserRow> {
        &mut self.list
    }

    fn alerts(&self) -> &AlertBus {
        &self.alerts
    }

    fn has_unsaved_changes(&self) -> bool {
        self.dirty.is_dirty()
    }

    async fn load_data(&mut self) -> Result<(), RestError> {
        if !self.aux_loaded {
            match self
                .client
                .get_json::<Vec<String>>(USER_ROLES_URL, &QueryParams::new())
                .await
            {
                Ok(roles) => self.user_roles = roles,
                Err(err) => tracing::warn!("Could not load user roles: {}", err),
            }
            self.aux_loaded = true;
        }

        let all: Vec<UserRow> = self.client.get_json(USERS_URL, &QueryParams::new()).await?;
        let criteria = self.filter.active.clone();
        let rows: Vec<UserRow> = all.iter().filter(|u| criteria.matches(u)).cloned().collect();

        self.all_users = all;
        self.list.set_client_rows(rows);
        self.dirty.clear();
        Ok(())
    }
}

impl Filterable for UsersPage {
    type Criteria = UserCriteria;

    fn filter(&self) -> &FilterState<UserCriteria> {
        &self.filter
    }

    fn filter_mut(&mut self) -> &mut FilterState<UserCriteria> {
        &mut self.filter
    }
}

impl Pageable for UsersPage {
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

impl Modifiable for UsersPage {
    type Key = String;

    fn dirty(&self) -> &DirtyState<String> {
        &self.dirty
    }

    fn dirty_mut(&mut self) -> &mut DirtyState<String> {
        &mut self.dirty
    }

    async fn do_save(&mut self) -> Result<(), RestError> {
        self.validate_users()?;

        let modified: Vec<UserRow> = self
            .all_users
            .iter()
            .filter_map(|u| {
                let status = self.dirty.status_of(&u.user_name);
                if status == RowStatus::Persisted {
                    return None;
                }
                let mut row = u.clone();
                row.status = status;
                Some(row)
            })
            .collect();

        self.client.put_json(USERS_URL, &modified).await
    }
}

impl Composed for UsersPage {
    fn ops(&self) -> Arc<OpTable<Self>> {
        self.ops.clone()
    }
}

#[async_trait(?Send)]
impl PageView for UsersPage {
    fn title(&self) -> &'static str {
        "Users"
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
        if self.dirty.is_dirty() {
            format!(
                "{} users | {} new, {} updated, {} removed (unsaved)",
                self.list.count,
                self.dirty.added().len(),
                self.dirty.updated().len(),
                self.dirty.removed().len()
            )
        } else {
            format!("{} users", self.list.count)
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

    fn filter_fields(&self) -> Vec<Field> {
        let f = &self.filter.edited;
        vec![
            Field::new("userName", "User Name", f.user_name.clone().unwrap_or_default()),
            Field::new("role", "Role", f.auth_role.clone().unwrap_or_default()),
            Field::new(
                "deleted",
                "Deleted (true/false/all)",
                match f.deleted {
                    Some(v) => v.to_string(),
                    None => "all".to_string(),
                },
            ),
        ]
    }

    fn set_filter_field(&mut self, key: &str, value: &str) {
        let f = &mut self.filter.edited;
        let value = value.trim();
        let opt = (!value.is_empty()).then(|| value.to_string());
        match key {
            "userName" => f.user_name = opt,
            "role" => f.auth_role = opt,
            "deleted" => {
                f.deleted = match value.to_ascii_lowercase().as_str() {
                    "all" | "" => None,
                    "true" | "yes" => Some(true),
                    _ => Some(false),
                }
            }
            _ => {}
        }
    }

    fn filter_hints(&self, key: &str) -> Vec<String> {
        match key {
            "role" => self.user_roles.clone(),
            _ => Vec::new(),
        }
    }

    fn begin_add(&mut self) -> Option<FormSpec> {
        if self.is_busy() {
            return None;
        }
        // New rows land on the last page, where they will be appended
        self.pager.offset = self.last_page();
        let template = UserRow {
            user_name: String::new(),
            email: None,
            roles: self.user_roles.first().cloned().unwrap_or_default(),
            domain: self.ctx.current_domain.clone(),
            active: true,
            deleted: false,
            status: RowStatus::New,
            expiration_date: None,
        };
        Some(self.form_for("New user", None, &template))
    }

    fn begin_edit(&mut self) -> Option<FormSpec> {
        let &index = self.list.selected.first()?;
        let user = self.list.rows.get(index)?;
        if user.deleted {
            self.alerts.error("You cannot edit a deleted user.");
            return None;
        }
        Some(self.form_for("Edit user", Some(index), &user.clone()))
    }

    async fn commit_form(&mut self, form: FormSpec) -> anyhow::Result<()> {
        let name = form.value_of("userName").trim().to_string();
        if name.is_empty() {
            self.alerts.error("The user name is required");
            return Ok(());
        }

        match form.row {
            None => {
                if self.username_exists(&name) {
                    self.alerts.error("Impossible to insert a duplicate entry");
                    return Ok(());
                }
                let user = UserRow {
                    user_name: name.clone(),
                    email: Some(form.value_of("email").to_string()).filter(|e| !e.is_empty()),
                    roles: form.value_of("roles").to_string(),
                    domain: self.ctx.current_domain.clone(),
                    active: form.value_of("active").eq_ignore_ascii_case("true"),
                    deleted: false,
                    status: RowStatus::New,
                    expiration_date: None,
                };
                self.all_users.push(user.clone());
                self.list.rows.push(user);
                self.list.count = self.list.rows.len();
                self.dirty.mark_added(name);
            }
            Some(index) => {
                let Some(row) = self.list.rows.get(index) else {
                    return Ok(());
                };
                let key = row.user_name.clone();
                let email =
                    Some(form.value_of("email").to_string()).filter(|e| !e.is_empty());
                let roles = form.value_of("roles").to_string();
                let active = form.value_of("active").eq_ignore_ascii_case("true");

                let changed = {
                    let row = &self.list.rows[index];
                    row.email != email || row.roles != roles || row.active != active
                };
                if !changed {
                    return Ok(());
                }

                for user in self.all_users.iter_mut().filter(|u| u.user_name == key) {
                    user.email = email.clone();
                    user.roles = roles.clone();
                    user.active = active;
                }
                let row = &mut self.list.rows[index];
                row.email = email;
                row.roles = roles;
                row.active = active;

                self.dirty.mark_updated(key);
            }
        }
        Ok(())
    }

    async fn delete_selected(&mut self) -> anyhow::Result<()> {
        if self.list.selected.is_empty() || self.is_busy() {
            return Ok(());
        }

        let selected_names: Vec<String> = self
            .list
            .selected_rows()
            .iter()
            .map(|u| u.user_name.clone())
            .collect();

        if selected_names.iter().any(|n| self.ctx.is_current_user(n)) {
            self.alerts.error(format!(
                "You cannot delete the logged in user: {}",
                self.ctx.username
            ));
            return Ok(());
        }

        for name in selected_names {
            let never_saved = self.dirty.mark_removed(name.clone());
            if never_saved {
                self.list.rows.retain(|u| u.user_name != name);
                self.all_users.retain(|u| u.user_name != name);
            } else {
                for user in self.list.rows.iter_mut().filter(|u| u.user_name == name) {
                    user.deleted = true;
                }
                for user in self.all_users.iter_mut().filter(|u| u.user_name == name) {
                    user.deleted = true;
                }
            }
        }

        self.list.count = self.list.rows.len();
        self.list.clear_selection();
        Ok(())
    }

    fn export_url(&self) -> Option<String> {
        let mut params = QueryParams::new();
        if self.filter.active.deleted.is_none() {
            params.set("deleted", "all");
        }
        params.append("page", 0).append("pageSize", 10000);
        Some(self.client.export_url(CSV_URL, &params))
    }

    fn copy_selected(&self) -> Option<String> {
        let rows = self.list.selected_rows();
        if rows.is_empty() {
            return None;
        }
        Some(
            rows.iter()
                .map(|u| format!("{}\t{}\t{}", u.user_name, u.roles, util::fmt_bool(u.active)))
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    fn row_detail(&self, index: usize) -> Option<String> {
        let row = self.list.rows.get(index)?;
        Some(format!(
            "User Name: {}\nRole:      {}\nEmail:     {}\nDomain:    {}\nActive:    {}\nDeleted:   {}\nExpires:   {}\nStatus:    {:?}",
            row.user_name,
            row.roles,
            row.email.as_deref().unwrap_or("-"),
            row.domain.as_deref().unwrap_or("-"),
            util::fmt_bool(row.active),
            util::fmt_bool(row.deleted),
            util::fmt_ts(row.expiration_date),
            self.dirty.status_of(&row.user_name),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> UsersPage {
        let client = RestClient::new("http://gateway.local:8080", "admin", "secret").unwrap();
        let mut ctx = AppContext::new("admin");
        ctx.current_domain = Some("default".to_string());
        UsersPage::new(client, AlertBus::new(), ctx).unwrap()
    }

    fn user(name: &str, deleted: bool) -> UserRow {
        UserRow {
            user_name: name.to_string(),
            email: None,
            roles: "ROLE_ADMIN".to_string(),
            domain: None,
            active: true,
            deleted,
            status: RowStatus::Persisted,
            expiration_date: None,
        }
    }

    #[test]
    fn test_default_criteria_hide_deleted_users() {
        let criteria = UserCriteria::default();
        assert!(criteria.matches(&user("alice", false)));
        assert!(!criteria.matches(&user("bob", true)));

        let all = UserCriteria {
            deleted: None,
            ..UserCriteria::default()
        };
        assert!(all.matches(&user("bob", true)));
    }

    #[tokio::test]
    async fn test_deleting_the_logged_in_user_is_refused() {
        let mut p = page();
        p.all_users = vec![user("admin", false), user("alice", false)];
        p.list.set_client_rows(p.all_users.clone());
        p.list.toggle_selected(0);

        p.delete_selected().await.unwrap();

        assert_eq!(p.list.rows.len(), 2);
        assert!(!p.dirty.is_dirty());
        assert!(p.alerts.pop().unwrap().message.contains("logged in user"));
    }

    #[tokio::test]
    async fn test_deleting_a_persisted_user_flags_instead_of_removing() {
        let mut p = page();
        p.all_users = vec![user("alice", false)];
        p.list.set_client_rows(p.all_users.clone());
        p.list.toggle_selected(0);

        p.delete_selected().await.unwrap();

        assert_eq!(p.list.rows.len(), 1);
        assert!(p.list.rows[0].deleted);
        assert_eq!(p.dirty.status_of(&"alice".to_string()), RowStatus::Removed);
    }

    #[tokio::test]
    async fn test_add_then_delete_discards_the_row_entirely() {
        let mut p = page();
        let form = p.begin_add().unwrap();
        let mut form = form;
        for field in form.fields.iter_mut() {
            if field.key == "userName" {
                field.value = "newbie".to_string();
            }
        }
        p.commit_form(form).await.unwrap();
        assert_eq!(p.list.rows.len(), 1);
        assert!(p.dirty.is_dirty());

        p.list.toggle_selected(0);
        p.delete_selected().await.unwrap();

        assert!(p.list.rows.is_empty());
        assert!(p.all_users.is_empty());
        assert!(!p.dirty.is_dirty());
    }

    #[tokio::test]
    async fn test_editing_a_deleted_user_is_refused() {
        let mut p = page();
        p.list.set_client_rows(vec![user("ghost", true)]);
        p.list.toggle_selected(0);
        assert!(p.begin_edit().is_none());
        assert!(!p.alerts.is_empty());
    }

    #[tokio::test]
    async fn test_editing_marks_updated_only_on_change() {
        let mut p = page();
        p.all_users = vec![user("alice", false)];
        p.list.set_client_rows(p.all_users.clone());
        p.list.toggle_selected(0);

        let form = p.begin_edit().unwrap();
        // Commit without changes: stays clean
        p.commit_form(form.clone()).await.unwrap();
        assert!(!p.dirty.is_dirty());

        let mut changed = form;
        for field in changed.fields.iter_mut() {
            if field.key == "email" {
                field.value = "alice@gateway.local".to_string();
            }
        }
        p.commit_form(changed).await.unwrap();
        assert_eq!(p.dirty.status_of(&"alice".to_string()), RowStatus::Updated);
    }

    #[test]
    fn test_duplicate_user_names_fail_validation() {
        let mut p = page();
        p.all_users = vec![user("alice", false), user("alice", false)];
        assert!(p.validate_users().is_err());
    }
}
