//! Per-page-instance orchestration of the tracking pipeline.
//!
//! One `VisitorTracker` exists per page instance. Scheduling a visit
//! claims the session gate, waits out a short delay so the page settles,
//! then resolves the visitor and dispatches the report. The returned
//! handle cancels the pending task on page teardown; once the delay has
//! elapsed the run always finishes (or swallows its own failure).

use crate::config::Config;
use crate::core::{GeoLookup, IpLookup, NotificationClient, VisitContext};
use crate::formatting::EmailReportFormatter;
use crate::gate::SessionGate;
use crate::lookup::{IpapiLookup, IpifyLookup};
use crate::notification::{Dispatcher, EmailJsClient};
use crate::resolver::VisitorResolver;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// The one-shot visitor tracking pipeline for a single page instance.
pub struct VisitorTracker {
    gate: SessionGate,
    resolver: Arc<VisitorResolver>,
    dispatcher: Arc<Dispatcher>,
    delay: Duration,
}

impl VisitorTracker {
    /// Creates a new `TrackerBuilder` to construct a `VisitorTracker`.
    pub fn builder(config: Config) -> TrackerBuilder {
        TrackerBuilder::new(config)
    }

    /// Schedules the tracking pipeline for this page instance.
    ///
    /// The session gate is claimed synchronously before anything is
    /// spawned, so repeated calls (e.g. on re-render) return an inert
    /// handle and run nothing. The winning call defers the pipeline by
    /// the configured delay; cancellation is only possible within that
    /// window.
    pub fn schedule(&self, ctx: VisitContext) -> TrackerHandle {
        if !self.gate.try_acquire() {
            debug!("visit already tracked for this page instance, ignoring");
            return TrackerHandle::inert();
        }

        let resolver = self.resolver.clone();
        let dispatcher = self.dispatcher.clone();
        let delay = self.delay;
        let (cancel_tx, mut cancel_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancel_rx.changed() => {
                    debug!("page instance torn down before the tracking delay elapsed");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }
            run_pipeline(resolver, dispatcher, ctx).await;
        });

        TrackerHandle {
            cancel_tx: Some(cancel_tx),
            task: Some(task),
        }
    }
}

/// The pipeline body. Infallible end to end: the resolver degrades to
/// placeholders and the dispatcher logs and drops its own failures, so
/// nothing ever reaches the hosting page.
async fn run_pipeline(
    resolver: Arc<VisitorResolver>,
    dispatcher: Arc<Dispatcher>,
    ctx: VisitContext,
) {
    let record = resolver.resolve(&ctx).await;
    dispatcher.dispatch(&record).await;
    metrics::counter!("visits_tracked").increment(1);
    info!(ip = %record.ip_address, "visitor tracking pipeline completed");
}

/// Handle to a scheduled tracking run.
///
/// Dropping the handle is the page-teardown path: it cancels the run if
/// the delay has not yet elapsed and leaves a running pipeline alone.
pub struct TrackerHandle {
    cancel_tx: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl TrackerHandle {
    fn inert() -> Self {
        Self {
            cancel_tx: None,
            task: None,
        }
    }

    /// Cancels the pending run if its delay has not elapsed. A run
    /// already past the delay is unaffected.
    pub fn cancel(&self) {
        if let Some(tx) = &self.cancel_tx {
            let _ = tx.send(true);
        }
    }

    /// Waits for the scheduled task to finish, whether it completed the
    /// pipeline or was cancelled. Inert handles return immediately.
    pub async fn completed(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TrackerHandle {
    fn drop(&mut self) {
        if let Some(tx) = &self.cancel_tx {
            let _ = tx.send(true);
        }
    }
}

/// Builder for the tracker.
///
/// This pattern allows for a clean separation of concerns between
/// constructing the pipeline's collaborators and running the pipeline.
/// It also provides a convenient way to override collaborators for
/// testing purposes.
pub struct TrackerBuilder {
    config: Config,
    geo_lookup_override: Option<Arc<dyn GeoLookup>>,
    ip_lookup_override: Option<Arc<dyn IpLookup>>,
    notification_client_override: Option<Arc<dyn NotificationClient>>,
}

impl TrackerBuilder {
    /// Creates a new `TrackerBuilder` with the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            geo_lookup_override: None,
            ip_lookup_override: None,
            notification_client_override: None,
        }
    }

    /// Overrides the primary geolocation lookup for testing.
    pub fn geo_lookup_override(mut self, lookup: Arc<dyn GeoLookup>) -> Self {
        self.geo_lookup_override = Some(lookup);
        self
    }

    /// Overrides the fallback IP lookup for testing.
    pub fn ip_lookup_override(mut self, lookup: Arc<dyn IpLookup>) -> Self {
        self.ip_lookup_override = Some(lookup);
        self
    }

    /// Overrides the notification client for testing.
    pub fn notification_client_override(mut self, client: Arc<dyn NotificationClient>) -> Self {
        self.notification_client_override = Some(client);
        self
    }

    /// Builds the tracker with real HTTP collaborators for anything not
    /// overridden.
    pub fn build(self) -> VisitorTracker {
        let config = self.config;

        let primary = self.geo_lookup_override.unwrap_or_else(|| {
            Arc::new(IpapiLookup::new(config.lookup.primary_url.clone()))
        });
        let fallback = self.ip_lookup_override.unwrap_or_else(|| {
            Arc::new(IpifyLookup::new(config.lookup.fallback_url.clone()))
        });
        let client = self.notification_client_override.unwrap_or_else(|| {
            Arc::new(EmailJsClient::new(config.notification.endpoint.clone()))
        });

        let resolver = Arc::new(VisitorResolver::new(primary, fallback));
        let dispatcher = Arc::new(Dispatcher::new(
            config.notification.clone(),
            client,
            Box::new(EmailReportFormatter),
        ));

        VisitorTracker {
            gate: SessionGate::new(),
            resolver,
            dispatcher,
            delay: Duration::from_millis(config.tracker.delay_ms),
        }
    }
}
