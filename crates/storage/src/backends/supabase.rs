//! Supabase Storage backend over its REST API.

use crate::error::{StorageError, StorageResult};
use crate::traits::{ListOptions, ObjectEntry, ObjectStore, SortBy};
use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Characters left unescaped in a bucket path segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Object store backed by a Supabase project's storage service.
///
/// Authenticates with the service-role key, which bypasses row-level policies.
#[derive(Clone)]
pub struct SupabaseStorage {
    http: reqwest::Client,
    base_url: Url,
    service_key: String,
}

#[derive(Serialize)]
struct ListRequest<'a> {
    prefix: &'a str,
    limit: usize,
    offset: usize,
    #[serde(rename = "sortBy")]
    sort_by: &'a SortBy,
}

#[derive(Serialize)]
struct RemoveRequest<'a> {
    prefixes: &'a [String],
}

#[derive(Deserialize)]
struct RemovedObject {
    name: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl SupabaseStorage {
    pub fn new(base_url: &str, service_key: &str) -> StorageResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StorageError::Config(format!("invalid backend URL: {e}")))?;
        if service_key.trim().is_empty() {
            return Err(StorageError::Config("service key is empty".to_string()));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            service_key: service_key.to_string(),
        })
    }

    fn url(&self, action: &str, bucket: &str) -> Url {
        let bucket = utf8_percent_encode(bucket, SEGMENT);
        let path = format!(
            "{}/storage/v1/{action}/{bucket}",
            self.base_url.path().trim_end_matches('/')
        );
        let mut url = self.base_url.clone();
        url.set_path(&path);
        url
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> StorageResult<String> {
        let response = self.authorize(req).send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(StorageError::Api {
                status: status.as_u16(),
                message: error_message(&body, status),
            });
        }
        Ok(body)
    }
}

/// Pull the human-readable message out of an error body.
fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("storage API returned {status}")
            } else {
                body.trim().to_string()
            }
        })
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    #[instrument(skip(self, options), fields(offset = options.offset, limit = options.limit))]
    async fn list(
        &self,
        bucket: &str,
        prefix: &str,
        options: &ListOptions,
    ) -> StorageResult<Vec<ObjectEntry>> {
        let url = self.url("object/list", bucket);
        let body = ListRequest {
            prefix,
            limit: options.limit,
            offset: options.offset,
            sort_by: &options.sort_by,
        };
        let text = self.send(self.http.post(url).json(&body)).await?;
        serde_json::from_str(&text)
            .map_err(|e| StorageError::InvalidResponse(format!("object listing: {e}")))
    }

    #[instrument(skip(self, paths), fields(count = paths.len()))]
    async fn remove(&self, bucket: &str, paths: &[String]) -> StorageResult<Option<Vec<String>>> {
        if paths.is_empty() {
            return Ok(Some(Vec::new()));
        }
        let url = self.url("object", bucket);
        let text = self
            .send(self.http.delete(url).json(&RemoveRequest { prefixes: paths }))
            .await?;
        match serde_json::from_str::<Vec<RemovedObject>>(&text) {
            Ok(removed) => Ok(Some(removed.into_iter().map(|o| o.name).collect())),
            Err(_) => Ok(None),
        }
    }

    fn backend_name(&self) -> &'static str {
        "supabase"
    }

    async fn health_check(&self) -> StorageResult<()> {
        let mut url = self.base_url.clone();
        let path = format!("{}/storage/v1/bucket", self.base_url.path().trim_end_matches('/'));
        url.set_path(&path);
        self.send(self.http.get(url)).await.map(|_| ())
    }
}
