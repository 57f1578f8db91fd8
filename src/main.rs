//! Visitwatch - portfolio visitor notification pipeline
//!
//! A one-shot binary that runs the tracking pipeline for a single
//! visit: resolve the visitor, format the report, dispatch it. Useful
//! for verifying credentials and endpoints end to end.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use visitwatch::{
    cli::Cli,
    config::Config,
    core::VisitContext,
    tracker::VisitorTracker,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = Config::load(&cli).unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {}", err);
        // Exit if configuration fails, as it's a critical step.
        std::process::exit(1);
    });

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("Visitwatch starting up...");

    // Log the loaded configuration settings for visibility
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Tracking Delay: {}ms", config.tracker.delay_ms);
    info!("Primary Lookup: {}", config.lookup.primary_url);
    info!("Fallback Lookup: {}", config.lookup.fallback_url);
    info!("Notification Endpoint: {}", config.notification.endpoint);
    info!(
        "Notification Credentials: {}",
        if config.notification.credentials().is_some() {
            "Complete"
        } else {
            "Incomplete (dispatch will be skipped)"
        }
    );
    info!("-------------------------------------------------------");

    let ctx = VisitContext {
        user_agent: cli.user_agent.clone(),
        referrer: cli.referrer.clone(),
    };

    let tracker = VisitorTracker::builder(config).build();
    let handle = tracker.schedule(ctx);
    handle.completed().await;

    info!("Visitor tracking run finished.");
    Ok(())
}
