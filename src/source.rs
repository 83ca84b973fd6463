//! Fetch boundary for the catalog and per-event resources.
//!
//! Resources are the static files `event_ids.json` and `event{id}.json`,
//! served over HTTP or laid out in a local directory.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::catalog::RawCatalogRecord;
use crate::config::Config;
use crate::error::DataError;
use crate::logging::{log_fetch, v_str, Domain, ProfileScope};
use crate::model::{EventId, EventRow};

pub const CATALOG_RESOURCE: &str = "event_ids.json";

pub fn event_resource(id: &EventId) -> String {
    format!("event{}.json", id)
}

#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch_catalog(&self) -> Result<Vec<RawCatalogRecord>, DataError>;
    async fn fetch_event(&self, id: &EventId) -> Result<Vec<EventRow>, DataError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Http,
    Dir,
}

impl SourceKind {
    pub fn from_config(cfg: &Config) -> Self {
        if cfg.data_dir.is_some() {
            SourceKind::Dir
        } else {
            SourceKind::Http
        }
    }

    pub fn build(self, cfg: &Config) -> Result<Arc<dyn DataSource>, DataError> {
        match self {
            SourceKind::Http => Ok(Arc::new(HttpSource::new(
                &cfg.data_base_url,
                Duration::from_secs(cfg.http_timeout_secs),
            )?)),
            SourceKind::Dir => {
                let dir = cfg.data_dir.clone().unwrap_or_else(|| PathBuf::from("."));
                Ok(Arc::new(DirSource::new(dir)))
            }
        }
    }
}

fn decode<T: DeserializeOwned>(resource: &str, body: &[u8]) -> Result<T, DataError> {
    serde_json::from_slice(body).map_err(|e| DataError::parse(resource, e))
}

/// Fetches resources relative to a base URL.
pub struct HttpSource {
    client: Client,
    base: Url,
}

impl HttpSource {
    pub fn new(base: &str, timeout: Duration) -> Result<Self, DataError> {
        // Url::join drops the last path segment unless the base ends in '/'.
        let normalised = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{}/", base)
        };
        let base = Url::parse(&normalised).map_err(|e| DataError::network(base, e))?;
        Ok(Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base,
        })
    }

    pub fn resource_url(&self, resource: &str) -> Result<Url, DataError> {
        self.base
            .join(resource)
            .map_err(|e| DataError::network(resource, e))
    }

    async fn get_json<T: DeserializeOwned>(&self, resource: &str) -> Result<T, DataError> {
        let url = self.resource_url(resource)?;
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DataError::network(resource, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::network(
                resource,
                format!("HTTP {}", status),
            ));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| DataError::network(resource, e))?;
        decode(resource, &body)
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn fetch_catalog(&self) -> Result<Vec<RawCatalogRecord>, DataError> {
        let scope = ProfileScope::new(Domain::Catalog, "http_fetch", &[("resource", v_str(CATALOG_RESOURCE))]);
        let records: Vec<RawCatalogRecord> = self.get_json(CATALOG_RESOURCE).await?;
        log_fetch(CATALOG_RESOURCE, records.len(), scope.elapsed_ms());
        Ok(records)
    }

    async fn fetch_event(&self, id: &EventId) -> Result<Vec<EventRow>, DataError> {
        let resource = event_resource(id);
        let scope = ProfileScope::new(Domain::Cache, "http_fetch", &[("resource", v_str(&resource))]);
        let rows: Vec<EventRow> = self.get_json(&resource).await?;
        log_fetch(&resource, rows.len(), scope.elapsed_ms());
        Ok(rows)
    }
}

/// Reads resources from a directory holding the same files.
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn read_json<T: DeserializeOwned>(&self, resource: &str) -> Result<T, DataError> {
        let path = self.root.join(resource);
        let body = tokio::fs::read(&path)
            .await
            .map_err(|e| DataError::network(resource, e))?;
        decode(resource, &body)
    }
}

#[async_trait]
impl DataSource for DirSource {
    async fn fetch_catalog(&self) -> Result<Vec<RawCatalogRecord>, DataError> {
        let scope = ProfileScope::new(Domain::Catalog, "dir_read", &[("resource", v_str(CATALOG_RESOURCE))]);
        let records: Vec<RawCatalogRecord> = self.read_json(CATALOG_RESOURCE).await?;
        log_fetch(CATALOG_RESOURCE, records.len(), scope.elapsed_ms());
        Ok(records)
    }

    async fn fetch_event(&self, id: &EventId) -> Result<Vec<EventRow>, DataError> {
        let resource = event_resource(id);
        let scope = ProfileScope::new(Domain::Cache, "dir_read", &[("resource", v_str(&resource))]);
        let rows: Vec<EventRow> = self.read_json(&resource).await?;
        log_fetch(&resource, rows.len(), scope.elapsed_ms());
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_event_resource_name() {
        assert_eq!(event_resource(&EventId::from("12")), "event12.json");
    }

    #[test]
    fn test_http_resource_url_keeps_base_path() {
        let src = HttpSource::new("http://host/json_data", Duration::from_secs(1)).unwrap();
        assert_eq!(
            src.resource_url("event3.json").unwrap().as_str(),
            "http://host/json_data/event3.json"
        );
    }

    #[test]
    fn test_http_rejects_bad_base() {
        let err = HttpSource::new("not a url", Duration::from_secs(1)).err().unwrap();
        assert_eq!(err.kind(), "network");
    }

    #[test]
    fn test_source_kind_from_config() {
        let mut cfg = Config::default();
        assert_eq!(SourceKind::from_config(&cfg), SourceKind::Http);
        cfg.data_dir = Some(PathBuf::from("/tmp"));
        assert_eq!(SourceKind::from_config(&cfg), SourceKind::Dir);
    }

    #[tokio::test]
    async fn test_dir_source_reads_rows() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("event5.json"),
            r#"[{"PrimarySector":"Tech","state":"CA","dist":1,"cret30_median":0.2}]"#,
        )
        .unwrap();
        let src = DirSource::new(dir.path());
        let rows = src.fetch_event(&EventId::from("5")).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cret30_median, Some(0.2));
    }

    #[tokio::test]
    async fn test_dir_source_missing_file_is_network_error() {
        let dir = TempDir::new().unwrap();
        let src = DirSource::new(dir.path());
        let err = src.fetch_event(&EventId::from("9")).await.unwrap_err();
        assert_eq!(err.kind(), "network");
        assert_eq!(err.resource(), "event9.json");
    }

    #[tokio::test]
    async fn test_dir_source_bad_shape_is_parse_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CATALOG_RESOURCE), r#"{"not":"a list"}"#).unwrap();
        let src = DirSource::new(dir.path());
        let err = src.fetch_catalog().await.unwrap_err();
        assert_eq!(err.kind(), "parse");
    }
}
