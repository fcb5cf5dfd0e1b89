//! Outbound HTTP client for downstream services.
//!
//! # Responsibilities
//! - Own the pooled `reqwest::Client` shared by every outbound call
//! - Issue GET requests and decode JSON bodies
//! - Classify failures into [`DownstreamError`]
//!
//! # Design Decisions
//! - The client is injected; its lifecycle belongs to the process
//! - Non-2xx responses are errors, never decoded
//! - Timeouts are enforced by the client, per call

use std::time::Duration;
use axum::http::HeaderMap;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::DownstreamConfig;
use crate::error::DownstreamError;

/// Pooled client for downstream calls. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DownstreamClient {
    http: reqwest::Client,
}

impl DownstreamClient {
    /// Wrap an existing client.
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Build a pooled client with the configured timeouts.
    pub fn from_config(config: &DownstreamConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;
        Ok(Self::new(http))
    }

    /// GET `{base}{path}` with the given headers and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        base: &Url,
        path: &str,
        headers: HeaderMap,
    ) -> Result<T, DownstreamError> {
        let url = endpoint(base, path);
        let response = self
            .http
            .get(&url)
            .headers(headers)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<T>().await?)
    }
}

/// Join a base URL and an absolute path, keeping any base path prefix.
pub fn endpoint(base: &Url, path: &str) -> String {
    format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
