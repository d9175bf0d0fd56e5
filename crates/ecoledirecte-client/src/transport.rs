//! HTTP transport.
//!
//! Every Ecole Directe call is a form-encoded POST whose single field `data`
//! holds a JSON document. The transport only moves bytes; envelope checks
//! happen in [`crate::envelope`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

use ecoledirecte_core::{ApiConfig, Error, Result};

/// Header carrying the session token.
pub const TOKEN_HEADER: &str = "X-Token";

/// Headers the web front-end sends. Host, Connection and Accept-Encoding are
/// left to reqwest.
const BROWSER_HEADERS: &[(&str, &str)] = &[
    ("accept", "application/json, text/plain, */*"),
    ("accept-language", "fr,fr-FR;q=0.8,en-US;q=0.5,en;q=0.3"),
    ("content-type", "application/x-www-form-urlencoded"),
    ("dnt", "1"),
    ("origin", "https://www.ecoledirecte.com"),
    ("referer", "https://www.ecoledirecte.com/"),
    ("sec-fetch-dest", "empty"),
    ("sec-fetch-mode", "cors"),
    ("sec-fetch-site", "same-site"),
    ("sec-gpc", "1"),
    (
        "user-agent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:124.0) Gecko/20100101 Firefox/124.0",
    ),
];

/// One outgoing API call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiRequest {
    pub url: String,
    /// JSON document sent in the `data` form field.
    pub payload: serde_json::Value,
    #[serde(skip_serializing)]
    pub token: Option<String>,
}

impl ApiRequest {
    pub fn new(url: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            url: url.into(),
            payload,
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// `data=<urlencoded JSON>`.
    pub fn form_body(&self) -> String {
        format!("data={}", urlencoding::encode(&self.payload.to_string()))
    }
}

/// Sends requests and returns the raw response body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<String>;
}

/// Transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(api: &ApiConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in BROWSER_HEADERS {
            headers.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(api.timeout_secs))
            .build()
            .map_err(|e| Error::Transport(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<String> {
        let mut builder = self.client.post(&request.url).body(request.form_body());
        if let Some(token) = &request.token {
            builder = builder.header(TOKEN_HEADER, token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Transport(format!("{}: {}", request.url, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(format!("{}: {}", request.url, e)))?;

        tracing::debug!(
            category = "http",
            url = %request.url,
            status = status.as_u16(),
            bytes = body.len(),
            "Response received"
        );
        Ok(body)
    }
}
