//! PMode page - the gateway's processing-mode configuration
//!
//! Shows the currently active PMode document and uploads a replacement as
//! a multipart submission, with the file-size precheck running before any
//! bytes leave the machine.

use super::{build_grid, Composed, Field, FormSpec, Grid, PageInfo, PageView};
use crate::alert::AlertBus;
use crate::config::Config;
use crate::list::behaviors;
use crate::list::{
    Augmentation, BaseList, CapabilitySet, ColumnDef, ColumnPicker, Composer, ListState, Op,
    OpTable, Parent,
};
use crate::rest::error::RestError;
use crate::rest::models::PmodeInfo;
use crate::rest::params::QueryParams;
use crate::rest::upload;
use crate::rest::RestClient;
use crate::util;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

const PMODE_URL: &str = "rest/pmode";
const PMODE_CURRENT_URL: &str = "rest/pmode/current";

pub struct PmodePage {
    client: RestClient,
    alerts: AlertBus,
    list: ListState<PmodeInfo>,
    columns: ColumnPicker,
    ops: Arc<OpTable<Self>>,
    max_upload_bytes: u64,
    pending_form: Option<FormSpec>,
}

impl PmodePage {
    pub fn new(client: RestClient, alerts: AlertBus, config: &Config) -> anyhow::Result<Self> {
        let columns = ColumnPicker::all_visible(vec![
            ColumnDef::unsortable("Id", "id", 8),
            ColumnDef::unsortable("Description", "description", 50),
            ColumnDef::unsortable("Configured", "configurationDate", 20),
            ColumnDef::unsortable("By", "username", 16),
        ]);

        let mut page = Self {
            client,
            alerts,
            list: ListState::new(),
            columns,
            ops: Arc::new(OpTable::empty()),
            max_upload_bytes: config.max_upload_bytes,
            pending_form: None,
        };

        let table = Composer::new()
            .with(behaviors::base())
            .with(pmode_behavior())
            .apply(&mut page)?;
        page.ops = Arc::new(table);
        Ok(page)
    }

    async fn upload_pmode(&mut self, path: &str, description: &str) {
        self.list.loading = true;
        let result = async {
            let file = upload::read_validated(Path::new(path), self.max_upload_bytes)?;
            if !file.file_name.to_lowercase().ends_with(".xml") {
                return Err(RestError::Validation(
                    "The PMode must be an XML document".to_string(),
                ));
            }
            self.client
                .upload(PMODE_URL, "file", file, &[("description", description)])
                .await
        }
        .await;
        self.list.loading = false;

        match result {
            Ok(message) => {
                self.alerts.success(if message.is_empty() {
                    "PMode file has been successfully uploaded.".to_string()
                } else {
                    message
                });
                let _ = self.reload().await;
            }
            Err(err) => self.alerts.exception("Error uploading the PMode", &err),
        }
    }

    fn cell(row: &PmodeInfo, prop: &str) -> String {
        match prop {
            "id" => row.id.to_string(),
            "description" => row.description.clone().unwrap_or_default(),
            "configurationDate" => util::fmt_ts(row.configuration_date),
            "username" => row.username.clone().unwrap_or_default(),
            _ => String::new(),
        }
    }
}

fn pmode_behavior() -> Augmentation<PmodePage> {
    Augmentation::new("pmode", |_p: &mut PmodePage| {})
        .op(Op::new("upload", request_upload))
        .op(Op::new("download", download_current))
}

fn request_upload(
    p: &mut PmodePage,
    _parent: Parent<PmodePage>,
) -> crate::list::compose::OpFuture<'_> {
    Box::pin(async move {
        if p.is_busy() {
            return Ok(());
        }
        p.pending_form = Some(FormSpec {
            kind: "pmode-upload",
            title: "Upload PMode".to_string(),
            row: None,
            fields: vec![
                Field::new("path", "PMode XML path", ""),
                Field::new("description", "Description", ""),
            ],
        });
        Ok(())
    })
}

fn download_current(
    p: &mut PmodePage,
    _parent: Parent<PmodePage>,
) -> crate::list::compose::OpFuture<'_> {
    Box::pin(async move {
        let Some(id) = p.list.rows.first().map(|r| r.id) else {
            p.alerts.info("No PMode is configured yet");
            return Ok(());
        };

        p.list.loading = true;
        let url = format!("{}/{}/download", PMODE_URL, id);
        let result = p.client.download(&url).await;
        p.list.loading = false;

        match result {
            Ok((file_name, bytes)) => match std::fs::write(&file_name, &bytes) {
                Ok(()) => p
                    .alerts
                    .success(format!("Downloaded {} ({} bytes)", file_name, bytes.len())),
                Err(e) => p.alerts.error(format!("Cannot write {}: {}", file_name, e)),
            },
            Err(err) => p.alerts.exception("Error downloading the PMode", &err),
        }
        Ok(())
    })
}

impl BaseList for PmodePage {
    type Row = PmodeInfo;

    fn page_name(&self) -> &'static str {
        "PMode"
    }

    fn list(&self) -> &ListState<PmodeInfo> {
        &self.list
    }

    fn list_mut(&mut self) -> &mut ListState<PmodeInfo> {
        &mut self.list
    }

    fn alerts(&self) -> &AlertBus {
        &self.alerts
    }

    async fn load_data(&mut self) -> Result<(), RestError> {
        let current: Option<PmodeInfo> = self
            .client
            .get_json(PMODE_CURRENT_URL, &QueryParams::new())
            .await?;
        self.list.set_client_rows(current.into_iter().collect());
        Ok(())
    }
}

impl Composed for PmodePage {
    fn ops(&self) -> Arc<OpTable<Self>> {
        self.ops.clone()
    }
}

#[async_trait(?Send)]
impl PageView for PmodePage {
    fn title(&self) -> &'static str {
        "PMode"
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::NONE
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
        if self.list.rows.is_empty() {
            "no PMode configured".to_string()
        } else {
            "current PMode".to_string()
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

    fn take_form(&mut self) -> Option<FormSpec> {
        self.pending_form.take()
    }

    async fn commit_form(&mut self, form: FormSpec) -> anyhow::Result<()> {
        if form.kind != "pmode-upload" {
            return Ok(());
        }
        let path = form.value_of("path").trim().to_string();
        if path.is_empty() {
            self.alerts.error("A file path is required");
            return Ok(());
        }
        let description = form.value_of("description").to_string();
        self.upload_pmode(&path, &description).await;
        Ok(())
    }

    fn row_detail(&self, index: usize) -> Option<String> {
        let row = self.list.rows.get(index)?;
        Some(format!(
            "Id:          {}\nDescription: {}\nConfigured:  {}\nBy:          {}",
            row.id,
            row.description.as_deref().unwrap_or("-"),
            util::fmt_ts(row.configuration_date),
            row.username.as_deref().unwrap_or("-"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> PmodePage {
        let client = RestClient::new("http://gateway.local:8080", "admin", "secret").unwrap();
        let config = Config::default();
        PmodePage::new(client, AlertBus::new(), &config).unwrap()
    }

    #[tokio::test]
    async fn test_upload_op_queues_the_form() {
        let mut p = page();
        p.invoke("upload").await.unwrap();
        let form = p.take_form().unwrap();
        assert_eq!(form.kind, "pmode-upload");
    }

    #[tokio::test]
    async fn test_upload_requires_a_path() {
        let mut p = page();
        let form = FormSpec {
            kind: "pmode-upload",
            title: String::new(),
            row: None,
            fields: vec![
                Field::new("path", "PMode XML path", "  "),
                Field::new("description", "Description", "release 4"),
            ],
        };
        p.commit_form(form).await.unwrap();
        assert!(p.alerts.pop().unwrap().message.contains("file path"));
    }

    #[tokio::test]
    async fn test_download_without_a_pmode_is_refused() {
        let mut p = page();
        p.invoke("download").await.unwrap();
        assert!(p.alerts.pop().unwrap().message.contains("No PMode"));
    }
}
