//! A client for an EmailJS-compatible transactional send API.

use crate::core::{NotificationClient, SendRequest};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{error, info, instrument};

/// Sends messages by POSTing the send request as JSON to the configured
/// endpoint. Any 2xx response counts as accepted.
pub struct EmailJsClient {
    endpoint: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl EmailJsClient {
    /// Creates a new `EmailJsClient` against the given endpoint.
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[async_trait]
impl NotificationClient for EmailJsClient {
    #[instrument(skip(self, request))]
    async fn send(&self, request: &SendRequest) -> anyhow::Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .timeout(self.timeout)
            .send()
            .await?;

        if response.status().is_success() {
            info!("Successfully sent visitor notification.");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(
                status = %status,
                body = %body,
                "Failed to send visitor notification"
            );
            anyhow::bail!(
                "Failed to send visitor notification: status {}, body: {}",
                status,
                body
            );
        }
    }
}
