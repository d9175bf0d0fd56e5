//! Webhook sink.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use ecoledirecte_core::{EcoleDirecteEvent, EventMetadata};

use super::{EventSink, Notification};
use crate::{Error, Result};

const TIMEOUT_SECS: u64 = 30;

/// POSTs every event as JSON.
#[derive(Debug, Clone)]
pub struct WebhookSink {
    name: String,
    enabled: bool,
    url: reqwest::Url,
    headers: HashMap<String, String>,
    client: reqwest::Client,
}

impl WebhookSink {
    pub fn new(name: impl Into<String>, url: &str) -> Result<Self> {
        let url = reqwest::Url::parse(url)
            .map_err(|e| Error::InvalidConfiguration(format!("webhook url {}: {}", url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidConfiguration(format!(
                "webhook url must be http(s): {}",
                url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::InvalidConfiguration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            name: name.into(),
            enabled: true,
            url,
            headers: HashMap::new(),
            client,
        })
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }
}

#[async_trait]
impl EventSink for WebhookSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn sink_type(&self) -> &str {
        "webhook"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn send(&self, event: &EcoleDirecteEvent, metadata: &EventMetadata) -> Result<()> {
        if !self.enabled {
            return Err(Error::SinkDisabled(self.name.clone()));
        }

        let mut request = self.client.post(self.url.clone());
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        let response = request
            .json(&Notification::new(event, metadata))
            .send()
            .await
            .map_err(|e| Error::SendFailed(format!("Webhook request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::SendFailed(format!(
                "Webhook returned error: {}",
                response.status()
            )));
        }

        Ok(())
    }

    fn get_config(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "url": self.url.as_str(),
            "headers": self.headers.keys().collect::<Vec<_>>(),
        }))
    }
}
