//! Renders a visitor record and delivers it to the notification
//! collaborator, without ever surfacing a failure to the caller.

use crate::config::{Credentials, NotificationConfig};
use crate::core::{NotificationClient, SendRequest, TemplateParams, VisitorRecord};
use crate::formatting::ReportFormatter;
use std::sync::Arc;
use tracing::{debug, warn};

/// Sender identity and subject, fixed for every report.
pub const FROM_NAME: &str = "Portfolio Visitor Tracker";
pub const FROM_EMAIL: &str = "visitor@portfolio.example";
pub const TO_EMAIL: &str = "owner@portfolio.example";
pub const SUBJECT: &str = "New Portfolio Visitor";

/// Formats visitor records and performs the one notification send per
/// pipeline run.
pub struct Dispatcher {
    config: NotificationConfig,
    client: Arc<dyn NotificationClient>,
    formatter: Box<dyn ReportFormatter>,
}

impl Dispatcher {
    /// Creates a new `Dispatcher`.
    pub fn new(
        config: NotificationConfig,
        client: Arc<dyn NotificationClient>,
        formatter: Box<dyn ReportFormatter>,
    ) -> Self {
        Self {
            config,
            client,
            formatter,
        }
    }

    /// Attempts one notification send for the record.
    ///
    /// If the credential set is incomplete, no network call is made.
    /// A failed send is logged and dropped; there is no retry and no
    /// error reaches the caller either way.
    pub async fn dispatch(&self, record: &VisitorRecord) {
        let Some(credentials) = self.config.credentials() else {
            warn!("notification credentials incomplete, skipping visitor report");
            return;
        };

        let request = self.build_request(credentials, record);
        match self.client.send(&request).await {
            Ok(()) => {
                metrics::counter!("notifications_sent").increment(1);
                debug!(ip = %record.ip_address, "visitor report delivered");
            }
            Err(err) => {
                metrics::counter!("notifications_failed").increment(1);
                warn!(error = %err, "failed to deliver visitor report");
            }
        }
    }

    fn build_request(&self, credentials: Credentials, record: &VisitorRecord) -> SendRequest {
        SendRequest {
            service_id: credentials.service_id,
            template_id: credentials.template_id,
            user_id: credentials.public_key,
            template_params: TemplateParams {
                from_name: FROM_NAME.to_string(),
                from_email: FROM_EMAIL.to_string(),
                to_email: TO_EMAIL.to_string(),
                subject: SUBJECT.to_string(),
                message: self.formatter.format_report(record),
                visitor_ip: record.ip_address.clone(),
                visitor_location: record.location_summary.clone(),
                visiting_time: record.visit_timestamp.clone(),
            },
        }
    }
}
