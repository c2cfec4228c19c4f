//! AILab skin-analysis HTTP client

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::UpstreamConfig;
use crate::service::AnalysisError;

use super::traits::SkinAnalyzer;

const API_KEY_HEADER: &str = "ailabapi-api-key";

/// Client for the skin-analysis-pro endpoint
pub struct AilabClient {
    http: Client,
    url: String,
    api_key: Option<String>,
    api_key_env: String,
}

impl AilabClient {
    /// Create a client; `api_key` may be absent, analyses then fail with a
    /// configuration error instead of the service refusing to start.
    pub fn new(config: &UpstreamConfig, api_key: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            url: config.url.clone(),
            api_key,
            api_key_env: config.api_key_env.clone(),
        })
    }
}

#[async_trait]
impl SkinAnalyzer for AilabClient {
    async fn analyze(&self, jpeg: Vec<u8>) -> Result<Value, AnalysisError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AnalysisError::Configuration(format!("{} not configured", self.api_key_env))
        })?;

        let size = jpeg.len();
        let part = Part::bytes(jpeg)
            .file_name("image.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| AnalysisError::UpstreamUnavailable(e.to_string()))?;
        let form = Form::new().part("image", part);

        debug!("POST {} ({} bytes)", self.url, size);
        let response = self
            .http
            .post(&self.url)
            .header(API_KEY_HEADER, api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AnalysisError::UpstreamUnavailable(e.to_string()))?;

        let status = response.status();
        let body: Value = response.json().await.map_err(|e| {
            AnalysisError::UpstreamUnavailable(format!("Invalid upstream response ({}): {}", status, e))
        })?;
        info!("Upstream responded with status {}", status);

        Ok(body)
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
