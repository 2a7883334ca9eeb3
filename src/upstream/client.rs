//! Shared HTTP client for upstream JSON APIs.

use std::time::Duration;

use reqwest::RequestBuilder;
use serde_json::Value;
use url::Url;

use crate::config::UpstreamConfig;
use crate::upstream::error::ApiError;

/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(concat!("genai-broker/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }

    pub async fn get_json(&self, url: Url) -> Result<Value, ApiError> {
        let endpoint = redacted(&url);
        self.send(&endpoint, self.http.get(url)).await
    }

    pub async fn post_json(&self, url: Url, body: &Value) -> Result<Value, ApiError> {
        let endpoint = redacted(&url);
        self.send(&endpoint, self.http.post(url).json(body)).await
    }

    async fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<Value, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::debug!(endpoint = %endpoint, status = status.as_u16(), "Upstream rejected request");
            return Err(ApiError::status(status.as_u16(), &text));
        }

        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Host and path only; query strings carry API keys.
fn redacted(url: &Url) -> String {
    format!("{}{}", url.host_str().unwrap_or_default(), url.path())
}
