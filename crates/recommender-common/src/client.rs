use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::model::{
    AnalyticsSnapshot, GenerateDescriptionRequest, GenerateDescriptionResponse, HealthStatus,
    RecommendRequest, RecommendResponse,
};

const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub base_url: String,
    /// Per-request timeout. `None` leaves the HTTP client defaults in charge.
    pub timeout: Option<Duration>,
    pub max_error_body_bytes: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            max_error_body_bytes: 8 * 1024,
        }
    }
}

impl BackendConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let base_url =
            std::env::var("RECOMMENDER_API_URL").unwrap_or_else(|_| defaults.base_url.clone());

        let timeout = std::env::var("RECOMMENDER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs);

        let max_error_body_bytes = std::env::var("RECOMMENDER_MAX_ERROR_BODY_BYTES")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(defaults.max_error_body_bytes);

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            max_error_body_bytes,
        }
    }
}

/// The three calls the console depends on.
///
/// `BackendClient` is the HTTP implementation; tests drive the event loop
/// with an in-memory one.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn recommend(&self, request: RecommendRequest) -> Result<RecommendResponse, ClientError>;

    async fn generate_description(
        &self,
        request: GenerateDescriptionRequest,
    ) -> Result<GenerateDescriptionResponse, ClientError>;

    async fn analytics(&self) -> Result<AnalyticsSnapshot, ClientError>;
}

#[derive(Clone)]
pub struct BackendClient {
    config: BackendConfig,
    http: reqwest::Client,
}

impl BackendClient {
    pub fn new(config: BackendConfig) -> Result<Self, ClientError> {
        let parsed = Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidBaseUrl(format!("{}: {e}", config.base_url)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidBaseUrl(format!(
                "{}: scheme must be http or https",
                config.base_url
            )));
        }

        let http = reqwest::Client::builder()
            .user_agent("product-recommender/console")
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Probe `GET /test`. Used at startup only; nothing depends on the answer.
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let req = self.http.get(self.url("/test"));
        self.send_json(req).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let req = match self.config.timeout {
            Some(timeout) => req.timeout(timeout),
            None => req,
        };
        let resp = req.send().await?;
        Self::parse_json_response(resp, self.config.max_error_body_bytes).await
    }

    async fn parse_json_response<T: DeserializeOwned>(
        resp: reqwest::Response,
        max_error_body_bytes: usize,
    ) -> Result<T, ClientError> {
        if resp.status().is_success() {
            let bytes = resp.bytes().await?;
            return Ok(serde_json::from_slice::<T>(&bytes)?);
        }
        Err(Self::to_upstream_error(resp, max_error_body_bytes).await)
    }

    async fn to_upstream_error(resp: reqwest::Response, max_error_body_bytes: usize) -> ClientError {
        let status = resp.status();
        let body = read_limited_text(resp, max_error_body_bytes).await;
        if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(&body) {
            let message = match parsed.detail {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            return ClientError::Upstream { status, message };
        }
        ClientError::UpstreamBody { status, body }
    }
}

#[async_trait]
impl Backend for BackendClient {
    async fn recommend(&self, request: RecommendRequest) -> Result<RecommendResponse, ClientError> {
        debug!(query = %request.query, top_k = request.top_k, "POST /recommend");
        let req = self.http.post(self.url("/recommend")).json(&request);
        self.send_json(req).await
    }

    async fn generate_description(
        &self,
        request: GenerateDescriptionRequest,
    ) -> Result<GenerateDescriptionResponse, ClientError> {
        debug!(uniq_id = %request.uniq_id, "POST /generate-description");
        let req = self.http.post(self.url("/generate-description")).json(&request);
        self.send_json(req).await
    }

    async fn analytics(&self) -> Result<AnalyticsSnapshot, ClientError> {
        debug!("GET /analytics");
        let req = self.http.get(self.url("/analytics"));
        self.send_json(req).await
    }
}

async fn read_limited_text(resp: reqwest::Response, max_bytes: usize) -> String {
    match resp.bytes().await {
        Ok(mut b) => {
            if b.len() > max_bytes {
                b.truncate(max_bytes);
            }
            String::from_utf8_lossy(&b).to_string()
        }
        Err(e) => {
            warn!(error = %e, "failed to read backend error body");
            "<failed to read error body>".to_string()
        }
    }
}

/// FastAPI-style error body: `{"detail": "..."}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    detail: serde_json::Value,
}
