//! Configuration management for Visitwatch
//!
//! This module defines the main `Config` struct and its sub-structs,
//! responsible for holding all pipeline settings. It uses the `figment`
//! crate to load configuration from a `visitwatch.toml` file and merge
//! it with environment variables and command-line arguments.

use crate::cli::Cli;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The main configuration struct for the pipeline.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// Configuration for the tracking task itself.
    pub tracker: TrackerConfig,
    /// Configuration for the lookup collaborators.
    pub lookup: LookupConfig,
    /// Configuration for the notification collaborator.
    pub notification: NotificationConfig,
}

/// Configuration for the tracking task itself.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TrackerConfig {
    /// Delay between scheduling and the pipeline firing, in milliseconds.
    pub delay_ms: u64,
}

/// Configuration for the lookup collaborators.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LookupConfig {
    /// The primary geolocation endpoint (address + geography in one call).
    pub primary_url: String,
    /// The fallback IP-only endpoint.
    pub fallback_url: String,
}

/// Configuration for the notification collaborator.
///
/// The credentials are all optional: an incomplete set is not a load
/// error, it makes the dispatcher skip sending entirely.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NotificationConfig {
    /// The transactional send endpoint.
    #[serde(default = "default_notification_endpoint")]
    pub endpoint: String,
    /// The notification service identifier.
    pub service_id: Option<String>,
    /// The general-purpose template identifier.
    pub template_id: Option<String>,
    /// Template override used specifically for visitor reports.
    pub visitor_template_id: Option<String>,
    /// The account public key.
    pub public_key: Option<String>,
}

/// A complete credential set, as required for one send.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
}

impl NotificationConfig {
    /// Returns the credential set with the visitor template override
    /// applied, or `None` if any piece is missing or blank.
    pub fn credentials(&self) -> Option<Credentials> {
        let service_id = non_blank(self.service_id.as_deref())?;
        let template_id = non_blank(self.visitor_template_id.as_deref())
            .or_else(|| non_blank(self.template_id.as_deref()))?;
        let public_key = non_blank(self.public_key.as_deref())?;
        Some(Credentials {
            service_id,
            template_id,
            public_key,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn default_notification_endpoint() -> String {
    "https://api.emailjs.com/api/v1.0/email/send".to_string()
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_notification_endpoint(),
            service_id: None,
            template_id: None,
            visitor_template_id: None,
            public_key: None,
        }
    }
}

impl Config {
    /// Loads the configuration by layering sources: defaults, TOML file,
    /// environment variables, and CLI arguments.
    ///
    /// Environment variables use the `VISITWATCH_` prefix with `__` as
    /// the section separator, e.g. `VISITWATCH_NOTIFICATION__SERVICE_ID`.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from("visitwatch.toml"));
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("VISITWATCH_").split("__"))
            .merge(cli.clone())
            .extract()?;
        Ok(config)
    }
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            tracker: TrackerConfig { delay_ms: 2000 },
            lookup: LookupConfig {
                primary_url: "https://ipapi.co/json/".to_string(),
                fallback_url: "https://api.ipify.org?format=json".to_string(),
            },
            notification: NotificationConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(
        service_id: Option<&str>,
        template_id: Option<&str>,
        visitor_template_id: Option<&str>,
        public_key: Option<&str>,
    ) -> NotificationConfig {
        NotificationConfig {
            service_id: service_id.map(str::to_string),
            template_id: template_id.map(str::to_string),
            visitor_template_id: visitor_template_id.map(str::to_string),
            public_key: public_key.map(str::to_string),
            ..NotificationConfig::default()
        }
    }

    #[test]
    fn test_credentials_complete_set() {
        let config = config_with(Some("svc"), Some("tpl"), None, Some("key"));
        let credentials = config.credentials().unwrap();
        assert_eq!(credentials.service_id, "svc");
        assert_eq!(credentials.template_id, "tpl");
        assert_eq!(credentials.public_key, "key");
    }

    #[test]
    fn test_credentials_visitor_template_takes_precedence() {
        let config = config_with(Some("svc"), Some("tpl"), Some("tpl_visitor"), Some("key"));
        assert_eq!(config.credentials().unwrap().template_id, "tpl_visitor");
    }

    #[test]
    fn test_credentials_blank_override_falls_back_to_general_template() {
        let config = config_with(Some("svc"), Some("tpl"), Some("  "), Some("key"));
        assert_eq!(config.credentials().unwrap().template_id, "tpl");
    }

    #[test]
    fn test_credentials_any_missing_piece_yields_none() {
        assert!(config_with(None, Some("tpl"), None, Some("key"))
            .credentials()
            .is_none());
        assert!(config_with(Some("svc"), None, None, Some("key"))
            .credentials()
            .is_none());
        assert!(config_with(Some("svc"), Some("tpl"), None, None)
            .credentials()
            .is_none());
        assert!(config_with(Some(""), Some("tpl"), None, Some("key"))
            .credentials()
            .is_none());
    }

    #[test]
    fn test_credentials_visitor_override_alone_is_enough() {
        let config = config_with(Some("svc"), None, Some("tpl_visitor"), Some("key"));
        assert_eq!(config.credentials().unwrap().template_id, "tpl_visitor");
    }
}
