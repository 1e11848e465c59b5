//! Trust store pages - certificate stores, parameterized per store type
//!
//! One page type serves both the key store and the TLS trust store; the
//! endpoints and the certificate operations are selected by store kind at
//! construction. Entries are decorated with expiry state at fetch time.

use super::{
    build_grid, change_page_size, goto_page, page_info_of, Composed, Field, FormSpec, Grid,
    PageInfo, PageView,
};
use crate::alert::AlertBus;
use crate::config::Config;
use crate::list::behaviors;
use crate::list::{
    Augmentation, BaseList, CapabilitySet, ColumnDef, ColumnPicker, Composer, ListState, Op,
    OpTable, PageState, Pageable, Parent, RowLimiter,
};
use crate::rest::error::RestError;
use crate::rest::models::TrustStoreEntry;
use crate::rest::params::QueryParams;
use crate::rest::upload;
use crate::rest::RestClient;
use crate::util;
use async_trait::async_trait;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Keystore,
    TlsTrustStore,
}

impl StoreKind {
    fn base_url(self) -> &'static str {
        match self {
            StoreKind::Keystore => "rest/keystore",
            StoreKind::TlsTrustStore => "rest/tlstruststore",
        }
    }

    fn title(self) -> &'static str {
        match self {
            StoreKind::Keystore => "Key Store",
            StoreKind::TlsTrustStore => "TLS Trust Store",
        }
    }

    /// Only the TLS store manages individual certificates
    fn handles_certificates(self) -> bool {
        matches!(self, StoreKind::TlsTrustStore)
    }
}

pub struct TrustStorePage {
    client: RestClient,
    alerts: AlertBus,
    kind: StoreKind,
    list: ListState<TrustStoreEntry>,
    pager: PageState,
    limiter: RowLimiter,
    columns: ColumnPicker,
    ops: Arc<OpTable<Self>>,
    max_upload_bytes: u64,
    store_exists: bool,
    pending_form: Option<FormSpec>,
}

impl TrustStorePage {
    pub fn new(
        client: RestClient,
        alerts: AlertBus,
        kind: StoreKind,
        config: &Config,
    ) -> anyhow::Result<Self> {
        let columns = ColumnPicker::all_visible(vec![
            ColumnDef::unsortable("Name", "name", 20),
            ColumnDef::unsortable("Subject", "subject", 36),
            ColumnDef::unsortable("Issuer", "issuer", 36),
            ColumnDef::unsortable("Valid from", "validFrom", 20),
            ColumnDef::unsortable("Valid until", "validUntil", 20),
        ]);

        let mut page = Self {
            client,
            alerts,
            kind,
            list: ListState::new(),
            pager: PageState::client(),
            limiter: RowLimiter::default(),
            columns,
            ops: Arc::new(OpTable::empty()),
            max_upload_bytes: config.max_upload_bytes,
            store_exists: false,
            pending_form: None,
        };

        let mut composer = Composer::new()
            .with(behaviors::base())
            .with(behaviors::client_pageable())
            .with(store_behavior());
        if kind.handles_certificates() {
            composer = composer.with(certificate_behavior());
        }
        let table = composer.apply(&mut page)?;
        page.ops = Arc::new(table);
        Ok(page)
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}/{}", self.kind.base_url(), suffix)
    }

    async fn upload_store(&mut self, path: &str, password: &str) {
        self.list.loading = true;
        let result = self.do_upload(self.url("save"), path, password).await;
        self.list.loading = false;

        match result {
            Ok(message) => {
                let message = if message.is_empty() {
                    format!("The {} was successfully updated.", self.kind.title())
                } else {
                    message
                };
                self.alerts.success(message);
                let _ = self.reload().await;
            }
            Err(err) => {
                let context = format!("Error updating the {} file", self.kind.title());
                self.alerts.exception(&context, &err);
            }
        }
    }

    async fn do_upload(
        &self,
        url: String,
        path: &str,
        password: &str,
    ) -> Result<String, RestError> {
        let file = upload::read_validated(Path::new(path), self.max_upload_bytes)?;
        let fields: Vec<(&str, &str)> = if password.is_empty() {
            Vec::new()
        } else {
            vec![("password", password)]
        };
        self.client.upload(&url, "file", file, &fields).await
    }

    fn cell(row: &TrustStoreEntry, prop: &str) -> String {
        let now = Utc::now();
        match prop {
            "name" => {
                if row.is_expired(now) {
                    format!("{} [expired]", row.name)
                } else if row.is_about_to_expire(now) {
                    format!("{} [expiring]", row.name)
                } else {
                    row.name.clone()
                }
            }
            "subject" => row.subject.clone(),
            "issuer" => row.issuer.clone(),
            "validFrom" => util::fmt_ts(Some(row.valid_from)),
            "validUntil" => util::fmt_ts(Some(row.valid_until)),
            _ => String::new(),
        }
    }
}

/// Operations every store offers
fn store_behavior() -> Augmentation<TrustStorePage> {
    Augmentation::new("store", |_p: &mut TrustStorePage| {})
        .op(Op::new("download", download))
        .op(Op::new("upload", request_upload))
        .op(Op::new("reset", reset_store))
}

/// Certificate management, TLS store only
fn certificate_behavior() -> Augmentation<TrustStorePage> {
    Augmentation::new("certificates", |_p: &mut TrustStorePage| {})
        .op(Op::new("add-certificate", request_add_certificate))
        .op(Op::new("remove-certificate", remove_certificate))
}

fn download(
    p: &mut TrustStorePage,
    _parent: Parent<TrustStorePage>,
) -> crate::list::compose::OpFuture<'_> {
    Box::pin(async move {
        if p.list.rows.is_empty() || p.is_busy() {
            return Ok(());
        }
        p.list.loading = true;
        let result = p.client.download(&p.url("download")).await;
        p.list.loading = false;

        match result {
            Ok((file_name, bytes)) => match std::fs::write(&file_name, &bytes) {
                Ok(()) => p
                    .alerts
                    .success(format!("Downloaded {} ({} bytes)", file_name, bytes.len())),
                Err(e) => p.alerts.error(format!("Cannot write {}: {}", file_name, e)),
            },
            Err(err) => {
                let context = format!("Error downloading the {}", p.kind.title());
                p.alerts.exception(&context, &err);
            }
        }
        Ok(())
    })
}

fn request_upload(
    p: &mut TrustStorePage,
    _parent: Parent<TrustStorePage>,
) -> crate::list::compose::OpFuture<'_> {
    Box::pin(async move {
        if p.is_busy() {
            return Ok(());
        }
        p.pending_form = Some(FormSpec {
            kind: "store-upload",
            title: format!("Upload {}", p.kind.title()),
            row: None,
            fields: vec![
                Field::new("path", "File path", ""),
                Field::new("password", "Store password", ""),
            ],
        });
        Ok(())
    })
}

fn reset_store(
    p: &mut TrustStorePage,
    _parent: Parent<TrustStorePage>,
) -> crate::list::compose::OpFuture<'_> {
    Box::pin(async move {
        p.list.loading = true;
        let result = p.client.post_no_content(&p.url("reset"), &()).await;
        p.list.loading = false;

        match result {
            Ok(()) => {
                let message = format!("The [{}] was successfully reset.", p.kind.title());
                p.alerts.success(message);
                p.reload().await?;
            }
            Err(err) => {
                let context = format!("Error resetting the {}", p.kind.title());
                p.alerts.exception(&context, &err);
            }
        }
        Ok(())
    })
}

fn request_add_certificate(
    p: &mut TrustStorePage,
    _parent: Parent<TrustStorePage>,
) -> crate::list::compose::OpFuture<'_> {
    Box::pin(async move {
        if !p.store_exists || p.is_busy() {
            return Ok(());
        }
        p.pending_form = Some(FormSpec {
            kind: "certificate-upload",
            title: "Add certificate".to_string(),
            row: None,
            fields: vec![
                Field::new("path", "Certificate file", ""),
                Field::new("alias", "Alias", ""),
            ],
        });
        Ok(())
    })
}

fn remove_certificate(
    p: &mut TrustStorePage,
    _parent: Parent<TrustStorePage>,
) -> crate::list::compose::OpFuture<'_> {
    Box::pin(async move {
        if p.is_busy() {
            return Ok(());
        }
        let Some(cert) = p.list.selected_rows().first().map(|c| c.name.clone()) else {
            p.alerts.info("Select the certificate to remove first");
            return Ok(());
        };

        p.list.loading = true;
        let url = p.url(&format!("entries/{}", cert));
        let result = p.client.delete(&url).await;
        p.list.loading = false;

        match result {
            Ok(()) => p
                .alerts
                .success(format!("Certificate [{}] removed from the store.", cert)),
            Err(err) => {
                let context = format!("Error removing the certificate [{}] from the store", cert);
                p.alerts.exception(&context, &err);
            }
        }
        p.reload().await
    })
}

impl BaseList for TrustStorePage {
    type Row = TrustStoreEntry;

    fn page_name(&self) -> &'static str {
        match self.kind {
            StoreKind::Keystore => "key store",
            StoreKind::TlsTrustStore => "TLS trust store",
        }
    }

    fn list(&self) -> &ListState<TrustStoreEntry> {
        &self.list
    }

    fn list_mut(&mut self) -> &mut ListState<TrustStoreEntry> {
        &mut self.list
    }

    fn alerts(&self) -> &AlertBus {
        &self.alerts
    }

    async fn load_data(&mut self) -> Result<(), RestError> {
        let entries: Vec<TrustStoreEntry> = self
            .client
            .get_json(&self.url("list"), &QueryParams::new())
            .await?;
        self.store_exists = true;
        self.list.set_client_rows(entries);
        Ok(())
    }
}

impl Pageable for TrustStorePage {
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

impl Composed for TrustStorePage {
    fn ops(&self) -> Arc<OpTable<Self>> {
        self.ops.clone()
    }
}

#[async_trait(?Send)]
impl PageView for TrustStorePage {
    fn title(&self) -> &'static str {
        self.kind.title()
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
        let now = Utc::now();
        let expired = self.list.rows.iter().filter(|e| e.is_expired(now)).count();
        let expiring = self
            .list
            .rows
            .iter()
            .filter(|e| e.is_about_to_expire(now))
            .count();
        if expired + expiring > 0 {
            format!(
                "{} certificates | {} expired, {} about to expire",
                self.list.count, expired, expiring
            )
        } else {
            format!("{} certificates", self.list.count)
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

    async fn goto_page(&mut self, offset: usize) -> anyhow::Result<()> {
        goto_page(self, offset).await
    }

    async fn change_page_size(&mut self, size: usize) -> anyhow::Result<()> {
        change_page_size(self, size).await
    }

    fn take_form(&mut self) -> Option<FormSpec> {
        self.pending_form.take()
    }

    async fn commit_form(&mut self, form: FormSpec) -> anyhow::Result<()> {
        match form.kind {
            "store-upload" => {
                let path = form.value_of("path").trim().to_string();
                if path.is_empty() {
                    self.alerts.error("A file path is required");
                    return Ok(());
                }
                let password = form.value_of("password").to_string();
                self.upload_store(&path, &password).await;
            }
            "certificate-upload" => {
                let path = form.value_of("path").trim().to_string();
                if path.is_empty() {
                    self.alerts.error("A certificate file path is required");
                    return Ok(());
                }
                let alias = form.value_of("alias").trim().to_string();

                self.list.loading = true;
                let result = async {
                    let file =
                        upload::read_validated(Path::new(&path), self.max_upload_bytes)?;
                    let fields: Vec<(&str, &str)> = if alias.is_empty() {
                        Vec::new()
                    } else {
                        vec![("alias", alias.as_str())]
                    };
                    self.client
                        .upload(&self.url("entries"), "file", file, &fields)
                        .await
                }
                .await;
                self.list.loading = false;

                match result {
                    Ok(message) => {
                        self.alerts.success(if message.is_empty() {
                            "Certificate added to the store.".to_string()
                        } else {
                            message
                        });
                        self.reload().await?;
                    }
                    Err(err) => self
                        .alerts
                        .exception("Error adding the certificate to the store", &err),
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn export_url(&self) -> Option<String> {
        Some(self.client.export_url(&self.url("csv"), &QueryParams::new()))
    }

    fn row_detail(&self, index: usize) -> Option<String> {
        let row = self.list.rows.get(index)?;
        let now = Utc::now();
        Some(format!(
            "Name:        {}\nSubject:     {}\nIssuer:      {}\nValid from:  {}\nValid until: {}\nFingerprint: {}\nExpired:     {}\nExpiring:    {}",
            row.name,
            row.subject,
            row.issuer,
            util::fmt_ts(Some(row.valid_from)),
            util::fmt_ts(Some(row.valid_until)),
            row.fingerprints.as_deref().unwrap_or("-"),
            util::fmt_bool(row.is_expired(now)),
            util::fmt_bool(row.is_about_to_expire(now)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(kind: StoreKind) -> TrustStorePage {
        let client = RestClient::new("http://gateway.local:8080", "admin", "secret").unwrap();
        let config = Config::default();
        TrustStorePage::new(client, AlertBus::new(), kind, &config).unwrap()
    }

    #[test]
    fn test_certificate_operations_only_on_the_tls_store() {
        let keystore = page(StoreKind::Keystore);
        assert!(keystore.supports("download"));
        assert!(keystore.supports("reset"));
        assert!(!keystore.supports("add-certificate"));
        assert!(!keystore.supports("remove-certificate"));

        let tls = page(StoreKind::TlsTrustStore);
        assert!(tls.supports("add-certificate"));
        assert!(tls.supports("remove-certificate"));
    }

    #[test]
    fn test_store_urls_follow_the_kind() {
        let keystore = page(StoreKind::Keystore);
        assert_eq!(keystore.url("list"), "rest/keystore/list");
        let tls = page(StoreKind::TlsTrustStore);
        assert_eq!(tls.url("save"), "rest/tlstruststore/save");
    }

    #[tokio::test]
    async fn test_upload_op_queues_a_form() {
        let mut p = page(StoreKind::Keystore);
        p.invoke("upload").await.unwrap();
        let form = p.take_form().unwrap();
        assert_eq!(form.kind, "store-upload");
        assert!(p.take_form().is_none());
    }

    #[tokio::test]
    async fn test_upload_with_missing_file_surfaces_validation_error() {
        let mut p = page(StoreKind::Keystore);
        let form = FormSpec {
            kind: "store-upload",
            title: String::new(),
            row: None,
            fields: vec![
                Field::new("path", "File path", "/nonexistent/store.jks"),
                Field::new("password", "Store password", ""),
            ],
        };
        p.commit_form(form).await.unwrap();
        let alert = p.alerts.pop().unwrap();
        assert!(alert.message.contains("Cannot read"));
    }
}
