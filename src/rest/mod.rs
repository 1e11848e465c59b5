//! REST client for the gateway's administrative API
//!
//! One `reqwest::Client` behind a thin wrapper that owns the base URL and
//! the configured credentials, encodes query parameters, and maps response
//! statuses onto the error taxonomy. Pages never touch reqwest directly.

pub mod error;
pub mod models;
pub mod params;
pub mod upload;

use error::{classify_status, RestError};
use params::QueryParams;
use serde::de::DeserializeOwned;
use serde::Serialize;
use upload::UploadFile;
use url::Url;

/// Shared REST client; cheap to clone (reqwest::Client is an Arc internally)
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base: Url,
    username: String,
    password: String,
}

impl RestClient {
    pub fn new(base_url: &str, username: &str, password: &str) -> Result<Self, RestError> {
        // A trailing slash makes Url::join treat the last segment as a
        // directory, which is what the relative `rest/...` paths expect.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base = Url::parse(&normalized)
            .map_err(|e| RestError::Validation(format!("Invalid gateway URL {}: {}", base_url, e)))?;

        let http = reqwest::Client::builder()
            .build()
            .map_err(RestError::Transport)?;

        Ok(Self {
            http,
            base,
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    fn url(&self, path: &str, params: &QueryParams) -> Result<Url, RestError> {
        params::build_url(&self.base, path, params).map_err(RestError::Validation)
    }

    /// Build the export URL for a CSV endpoint, carrying the same parameters
    /// as the live query; the operator's browser does the download.
    pub fn export_url(&self, path: &str, params: &QueryParams) -> String {
        self.url(path, params)
            .map(|u| u.to_string())
            .unwrap_or_default()
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password))
    }

    async fn read_ok(response: reqwest::Response) -> Result<reqwest::Response, RestError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status.as_u16(), &body))
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &QueryParams,
    ) -> Result<T, RestError> {
        let url = self.url(path, params)?;
        tracing::debug!("GET {}", url);
        let response = self.request(reqwest::Method::GET, url).send().await?;
        let response = Self::read_ok(response).await?;
        Ok(response.json().await?)
    }

    /// POST whose success body is irrelevant (or empty)
    pub async fn post_no_content<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), RestError> {
        let url = self.url(path, &QueryParams::new())?;
        tracing::debug!("POST {}", url);
        let response = self
            .request(reqwest::Method::POST, url)
            .json(body)
            .send()
            .await?;
        Self::read_ok(response).await?;
        Ok(())
    }

    pub async fn put_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), RestError> {
        let url = self.url(path, &QueryParams::new())?;
        tracing::debug!("PUT {}", url);
        let response = self
            .request(reqwest::Method::PUT, url)
            .json(body)
            .send()
            .await?;
        Self::read_ok(response).await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> Result<(), RestError> {
        let url = self.url(path, &QueryParams::new())?;
        tracing::debug!("DELETE {}", url);
        let response = self.request(reqwest::Method::DELETE, url).send().await?;
        Self::read_ok(response).await?;
        Ok(())
    }

    /// Multipart upload; `fields` are plain text parts (description,
    /// password, ...) added alongside the file part. Returns the server's
    /// confirmation message.
    pub async fn upload(
        &self,
        path: &str,
        file_field: &str,
        file: UploadFile,
        fields: &[(&str, &str)],
    ) -> Result<String, RestError> {
        let url = self.url(path, &QueryParams::new())?;
        tracing::debug!("POST {} (multipart, {} bytes)", url, file.bytes.len());

        let part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.file_name);
        let mut form = reqwest::multipart::Form::new().part(file_field.to_string(), part);
        for (name, value) in fields {
            form = form.text(name.to_string(), value.to_string());
        }

        let response = self
            .request(reqwest::Method::POST, url)
            .multipart(form)
            .send()
            .await?;
        let response = Self::read_ok(response).await?;
        Ok(response.text().await.unwrap_or_default())
    }

    /// Binary download; the filename comes from Content-Disposition when the
    /// server provides one.
    pub async fn download(&self, path: &str) -> Result<(String, Vec<u8>), RestError> {
        let url = self.url(path, &QueryParams::new())?;
        tracing::debug!("GET {} (download)", url);
        let response = self.request(reqwest::Method::GET, url).send().await?;
        let response = Self::read_ok(response).await?;

        let file_name = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_disposition_filename)
            .unwrap_or_else(|| "download.bin".to_string());

        let bytes = response.bytes().await?;
        Ok((file_name, bytes.to_vec()))
    }
}

/// Extract the filename from a Content-Disposition header value
fn parse_content_disposition_filename(value: &str) -> Option<String> {
    let marker = "filename=";
    let idx = value.find(marker)?;
    let name = value[idx + marker.len()..].trim().trim_matches('"');
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_url_carries_parameters() {
        let client = RestClient::new("http://gateway.local:8080", "admin", "secret").unwrap();
        let mut params = QueryParams::new();
        params.append("user", "admin").append("page", 0);
        let url = client.export_url("rest/audit/csv", &params);
        assert_eq!(
            url,
            "http://gateway.local:8080/rest/audit/csv?user=admin&page=0"
        );
    }

    #[test]
    fn test_base_url_without_trailing_slash_is_normalized() {
        let client = RestClient::new("http://gw:8080/gateway", "a", "b").unwrap();
        let url = client.export_url("rest/jms/csv", &QueryParams::new());
        assert_eq!(url, "http://gw:8080/gateway/rest/jms/csv");
    }

    #[test]
    fn test_content_disposition_parsing() {
        assert_eq!(
            parse_content_disposition_filename("attachment; filename=keystore.jks"),
            Some("keystore.jks".to_string())
        );
        assert_eq!(
            parse_content_disposition_filename("attachment; filename=\"tls.p12\""),
            Some("tls.p12".to_string())
        );
        assert_eq!(parse_content_disposition_filename("attachment"), None);
    }
}
