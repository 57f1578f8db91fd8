//! Shared fakes for the integration tests.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use visitwatch::core::{NotificationClient, SendRequest};

/// Records every send request instead of performing network calls.
#[derive(Clone, Debug, Default)]
pub struct RecordingNotificationClient {
    pub sent: Arc<Mutex<Vec<SendRequest>>>,
}

impl RecordingNotificationClient {
    pub fn sent_requests(&self) -> Vec<SendRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationClient for RecordingNotificationClient {
    async fn send(&self, request: &SendRequest) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(request.clone());
        Ok(())
    }
}
