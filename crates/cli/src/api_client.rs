use anyhow::{Context, Result};
use bastion_core::HealthSnapshot;
use bastion_traffic::TrafficReport;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";
const METRICS_TOKEN_HEADER: &str = "x-metrics-token";

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url).context("invalid server URL")?;
        // Paths are joined relative to the base, so it must end in a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).context("failed to build API URL")
    }

    async fn send_json<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<T> {
        let response = req.send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("API error ({}): {}", status, body);
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Wipe the bucket and truncate the database.
    ///
    /// A partial run (storage emptied, truncation failed) comes back as a
    /// 500 with a full report, so the body is decoded either way.
    pub async fn wipe(&self, admin_token: &str) -> Result<WipeResponse> {
        let url = self.url("api/admin/wipe")?;
        let response = self
            .http
            .post(url)
            .header(ADMIN_TOKEN_HEADER, admin_token)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if (status.is_success() || status == StatusCode::INTERNAL_SERVER_ERROR)
            && let Ok(report) = serde_json::from_str::<WipeResponse>(&body)
        {
            return Ok(report);
        }
        anyhow::bail!("API error ({}): {}", status, body);
    }

    pub async fn system_health(&self) -> Result<HealthSnapshot> {
        let url = self.url("api/system/health")?;
        self.send_json(self.http.get(url)).await
    }

    pub async fn refresh_metrics(&self, metrics_token: Option<&str>) -> Result<HealthSnapshot> {
        let url = self.url("api/system/metrics/refresh")?;
        let mut req = self.http.post(url);
        if let Some(token) = metrics_token {
            req = req.header(METRICS_TOKEN_HEADER, token);
        }
        self.send_json(req).await
    }

    /// Latest stored snapshot; `None` before the first refresh.
    pub async fn latest_metrics(&self) -> Result<Option<HealthSnapshot>> {
        let url = self.url("api/system/metrics")?;
        let response = self.http.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            if body["status"] == "empty" {
                return Ok(None);
            }
            anyhow::bail!("API error ({}): {}", StatusCode::NOT_FOUND, body);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("API error ({}): {}", status, body);
        }
        Ok(Some(serde_json::from_str(&body)?))
    }

    pub async fn traffic(&self) -> Result<TrafficReport> {
        let url = self.url("api/monitor/traffic")?;
        self.send_json(self.http.get(url)).await
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageSummary {
    pub bucket: String,
    pub listed_files: u64,
    pub deleted_files: u64,
}

#[derive(Debug, Deserialize)]
pub struct DbSummary {
    pub truncated: bool,
}

#[derive(Debug, Deserialize)]
pub struct WipeResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    pub storage: StorageSummary,
    pub db: DbSummary,
}
