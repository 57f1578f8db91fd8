//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the one-shot
//! binary using the `clap` crate. These arguments are parsed at startup
//! and then merged with the configuration from the `visitwatch.toml`
//! file and environment variables.

use clap::Parser;
use figment::{
    value::{Dict, Map, Tag, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Tracks a single portfolio visit and reports it to the site owner.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Delay before the tracking pipeline fires, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// User agent string reported for this visit.
    #[arg(long, value_name = "STRING")]
    pub user_agent: Option<String>,

    /// Referrer URL reported for this visit.
    #[arg(long, value_name = "URL")]
    pub referrer: Option<String>,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(delay) = self.delay_ms {
            let mut tracker = Dict::new();
            tracker.insert("delay_ms".into(), Value::from(delay));
            dict.insert("tracker".into(), Value::Dict(Tag::Default, tracker));
        }

        // `user_agent` and `referrer` describe the visit, not the
        // pipeline; they feed the VisitContext directly in main.

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
