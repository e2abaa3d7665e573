//! Supabase database access through its PostgREST API.

use crate::error::{MetadataError, MetadataResult};
use crate::models::{NewSnapshot, SnapshotRow};
use crate::repos::{ProcedureRepo, SnapshotRepo, TableRepo};
use crate::store::Database;
use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Url;
use reqwest::header::CONTENT_RANGE;
use serde::Deserialize;
use tracing::instrument;

const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const SNAPSHOT_COLUMNS: &str = "id,created_at,status,latency_ms,modules";

/// Database client for a Supabase project's REST endpoint.
///
/// Uses the service-role key, so row-level security does not apply.
#[derive(Clone)]
pub struct PostgrestStore {
    http: reqwest::Client,
    base_url: Url,
    service_key: String,
    snapshot_table: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

impl PostgrestStore {
    pub fn new(base_url: &str, service_key: &str) -> MetadataResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| MetadataError::Config(format!("invalid backend URL: {e}")))?;
        if service_key.trim().is_empty() {
            return Err(MetadataError::Config("service key is empty".to_string()));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            service_key: service_key.to_string(),
            snapshot_table: "system_metrics".to_string(),
        })
    }

    /// Use a different table for health snapshots.
    pub fn with_snapshot_table(mut self, table: impl Into<String>) -> Self {
        self.snapshot_table = table.into();
        self
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut path = format!("{}/rest/v1", self.base_url.path().trim_end_matches('/'));
        for segment in segments {
            path.push('/');
            path.extend(utf8_percent_encode(segment, SEGMENT));
        }
        let mut url = self.base_url.clone();
        url.set_path(&path);
        url
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> MetadataResult<reqwest::Response> {
        let response = self.authorize(req).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(MetadataError::Api {
            status: status.as_u16(),
            message: error_message(&body, status),
        })
    }
}

fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.details))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("database API returned {status}")
            } else {
                body.trim().to_string()
            }
        })
}

/// Total from a `Content-Range` value such as `0-24/25` or `*/0`.
///
/// An unknown total (`*`) counts as zero.
pub fn parse_content_range_total(value: &str) -> MetadataResult<u64> {
    let total = value
        .rsplit_once('/')
        .map(|(_, total)| total.trim())
        .ok_or_else(|| MetadataError::InvalidResponse(format!("bad Content-Range: {value}")))?;
    if total == "*" {
        return Ok(0);
    }
    total
        .parse()
        .map_err(|_| MetadataError::InvalidResponse(format!("bad Content-Range: {value}")))
}

#[async_trait]
impl TableRepo for PostgrestStore {
    #[instrument(skip(self))]
    async fn count_rows(&self, table: &str) -> MetadataResult<u64> {
        let url = self.url(&[table]);
        let response = self
            .send(
                self.http
                    .head(url)
                    .query(&[("select", "*")])
                    .header("Prefer", "count=exact"),
            )
            .await?;
        match response.headers().get(CONTENT_RANGE) {
            Some(value) => {
                let value = value
                    .to_str()
                    .map_err(|e| MetadataError::InvalidResponse(e.to_string()))?;
                parse_content_range_total(value)
            }
            None => Ok(0),
        }
    }
}

#[async_trait]
impl ProcedureRepo for PostgrestStore {
    #[instrument(skip(self))]
    async fn call_procedure(&self, name: &str) -> MetadataResult<()> {
        let url = self.url(&["rpc", name]);
        self.send(self.http.post(url).json(&serde_json::json!({})))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Database for PostgrestStore {
    async fn health_check(&self) -> MetadataResult<()> {
        let mut url = self.base_url.clone();
        let path = format!("{}/rest/v1/", self.base_url.path().trim_end_matches('/'));
        url.set_path(&path);
        self.send(self.http.head(url)).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgrest"
    }
}

#[async_trait]
impl SnapshotRepo for PostgrestStore {
    async fn latest_snapshot(&self) -> MetadataResult<Option<SnapshotRow>> {
        let url = self.url(&[&self.snapshot_table]);
        let response = self
            .send(self.http.get(url).query(&[
                ("select", SNAPSHOT_COLUMNS),
                ("order", "created_at.desc"),
                ("limit", "1"),
            ]))
            .await?;
        let rows: Vec<SnapshotRow> = response.json().await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_snapshot(&self, snapshot: &NewSnapshot) -> MetadataResult<SnapshotRow> {
        let url = self.url(&[&self.snapshot_table]);
        let response = self
            .send(
                self.http
                    .post(url)
                    .query(&[("select", SNAPSHOT_COLUMNS)])
                    .header("Prefer", "return=representation")
                    .json(snapshot),
            )
            .await?;
        let rows: Vec<SnapshotRow> = response.json().await?;
        rows.into_iter().next().ok_or_else(|| {
            MetadataError::InvalidResponse("Failed to write system metrics.".to_string())
        })
    }

    fn store_name(&self) -> &'static str {
        "postgrest"
    }

    async fn check_store(&self) -> MetadataResult<()> {
        let url = self.url(&[&self.snapshot_table]);
        self.send(self.http.head(url).query(&[("select", "id"), ("limit", "1")]))
            .await?;
        Ok(())
    }
}
