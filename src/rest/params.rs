//! Query parameter builder
//!
//! Mirrors the way every list page assembles its request: filter criteria
//! first, then paging, then sorting, each appended in a stable order so the
//! live query and its CSV export URL carry identical parameters.

use url::form_urlencoded::Serializer;
use url::Url;

/// An ordered set of query parameters
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter; empty values are skipped
    pub fn append(&mut self, key: &str, value: impl ToString) -> &mut Self {
        let value = value.to_string();
        if !value.is_empty() {
            self.pairs.push((key.to_string(), value));
        }
        self
    }

    /// Append only when the value is present
    pub fn append_opt(&mut self, key: &str, value: Option<impl ToString>) -> &mut Self {
        if let Some(v) = value {
            self.append(key, v);
        }
        self
    }

    /// Replace every occurrence of `key` with a single value
    pub fn set(&mut self, key: &str, value: impl ToString) -> &mut Self {
        self.pairs.retain(|(k, _)| k != key);
        self.append(key, value)
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Render as a query string (without the leading `?`)
    pub fn to_query_string(&self) -> String {
        let mut serializer = Serializer::new(String::new());
        for (k, v) in &self.pairs {
            serializer.append_pair(k, v);
        }
        serializer.finish()
    }
}

/// Join a base URL and a relative path, attaching query parameters
pub fn build_url(base: &Url, path: &str, params: &QueryParams) -> Result<Url, String> {
    let mut url = base
        .join(path)
        .map_err(|e| format!("invalid path {}: {}", path, e))?;
    if !params.is_empty() {
        url.set_query(Some(&params.to_query_string()));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values_are_skipped() {
        let mut p = QueryParams::new();
        p.append("user", "").append("action", "Deleted");
        assert_eq!(p.to_query_string(), "action=Deleted");
    }

    #[test]
    fn test_set_replaces_earlier_appends() {
        let mut p = QueryParams::new();
        p.append("page", 3).set("page", 0);
        assert_eq!(p.to_query_string(), "page=0");
    }

    #[test]
    fn test_values_are_percent_encoded() {
        let mut p = QueryParams::new();
        p.append("selector", "JMSType = 'retry'");
        assert_eq!(p.to_query_string(), "selector=JMSType+%3D+%27retry%27");
    }

    #[test]
    fn test_append_opt_skips_none() {
        let mut p = QueryParams::new();
        p.append_opt("orderBy", None::<String>);
        p.append_opt("asc", Some(true));
        assert_eq!(p.to_query_string(), "asc=true");
    }

    #[test]
    fn test_build_url_joins_relative_path() {
        let base = Url::parse("http://gateway.local:8080/").unwrap();
        let mut p = QueryParams::new();
        p.append("page", 0).append("pageSize", 10);
        let url = build_url(&base, "rest/audit/list", &p).unwrap();
        assert_eq!(
            url.as_str(),
            "http://gateway.local:8080/rest/audit/list?page=0&pageSize=10"
        );
    }
}
