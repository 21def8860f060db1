//! HTTP transport for a real charge controller

use super::Transport;
use crate::config::ClientConfig;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use solarcfg_core::{ChangeSet, TransportError};
use std::time::Duration;

/// JSON-over-HTTP client for the controller's configuration API
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// # Errors
    ///
    /// `TransportError::Network` when the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// # Errors
    ///
    /// `TransportError::Network` when the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        Self::new(&config.base_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn handle_response(response: Response) -> Result<Value, TransportError> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::network(e.to_string()))?;

        if status.is_success() {
            return serde_json::from_str(&text)
                .map_err(|e| TransportError::invalid_body(e.to_string()));
        }

        let err = TransportError::http(status.as_u16(), status.canonical_reason().unwrap_or(""));
        let server_message = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|body| body.get("error").and_then(Value::as_str).map(str::to_string));
        Err(match server_message {
            Some(message) => err.with_server_message(message),
            None => err,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, path: &str) -> Result<Value, TransportError> {
        let url = self.url(path);
        tracing::debug!(method = "GET", url = %url, "controller request");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TransportError::network(e.to_string()))?;
        Self::handle_response(response).await
    }

    async fn submit(&self, path: &str, change_set: &ChangeSet) -> Result<Value, TransportError> {
        let url = self.url(path);
        tracing::debug!(
            method = "PATCH",
            url = %url,
            changed_fields = change_set.len(),
            "controller request"
        );
        let response = self
            .client
            .patch(&url)
            .json(&change_set.to_payload())
            .send()
            .await
            .map_err(|e| TransportError::network(e.to_string()))?;
        Self::handle_response(response).await
    }
}
