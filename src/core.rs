//! Core domain types and service traits for Visitwatch
//!
//! This module defines the fundamental data structures and trait contracts
//! that govern component interactions throughout the pipeline.

use crate::lookup::LookupError;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Placeholder for any visitor fact that could not be determined.
pub const UNKNOWN: &str = "Unknown";

/// Placeholder referrer for visits that did not arrive via a link.
pub const DIRECT: &str = "Direct";

/// Everything the pipeline could learn about a single visit.
///
/// Every field holds either a real value or its documented placeholder
/// (`UNKNOWN`, or `DIRECT` for the referrer) -- consumers never see an
/// empty field. The record lives for exactly one pipeline run and is
/// discarded after dispatch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisitorRecord {
    /// The visitor's network address.
    pub ip_address: String,
    /// City reported by the geolocation lookup.
    pub city: String,
    /// Region or state reported by the geolocation lookup.
    pub region: String,
    /// Country reported by the geolocation lookup.
    pub country: String,
    /// IANA timezone name reported by the geolocation lookup.
    pub timezone: String,
    /// `"{city}, {region}, {country}"`, fixed at the moment the location
    /// fields are set.
    pub location_summary: String,
    /// The visit instant, formatted in the owner's reporting timezone.
    pub visit_timestamp: String,
    /// The visitor's browsing environment identifier.
    pub user_agent: String,
    /// The page the visitor arrived from.
    pub referrer: String,
}

impl VisitorRecord {
    /// Builds the location summary from its three sub-fields.
    pub fn summarize_location(city: &str, region: &str, country: &str) -> String {
        format!("{}, {}, {}", city, region, country)
    }
}

impl Default for VisitorRecord {
    fn default() -> Self {
        Self {
            ip_address: UNKNOWN.to_string(),
            city: UNKNOWN.to_string(),
            region: UNKNOWN.to_string(),
            country: UNKNOWN.to_string(),
            timezone: UNKNOWN.to_string(),
            location_summary: Self::summarize_location(UNKNOWN, UNKNOWN, UNKNOWN),
            visit_timestamp: UNKNOWN.to_string(),
            user_agent: UNKNOWN.to_string(),
            referrer: DIRECT.to_string(),
        }
    }
}

/// Ambient facts the hosting page knows about the visit.
///
/// `None` models execution contexts where the fact is simply unavailable
/// (e.g. non-browser rendering); the resolver substitutes placeholders.
#[derive(Debug, Clone, Default)]
pub struct VisitContext {
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

/// Geolocation data returned by the primary lookup collaborator.
///
/// All fields are optional on the wire; the resolver substitutes
/// `UNKNOWN` for anything missing.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct GeoInfo {
    pub ip: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country_name: Option<String>,
    pub timezone: Option<String>,
}

/// The field map handed to the notification template, plus the fully
/// rendered report body.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TemplateParams {
    pub from_name: String,
    pub from_email: String,
    pub to_email: String,
    pub subject: String,
    pub message: String,
    pub visitor_ip: String,
    pub visitor_location: String,
    pub visiting_time: String,
}

/// A fully-credentialed notification send, shaped like the transactional
/// send API's request body.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SendRequest {
    pub service_id: String,
    pub template_id: String,
    pub user_id: String,
    pub template_params: TemplateParams,
}

// =============================================================================
// Service Traits
// =============================================================================

/// Resolves the visitor's address and approximate geography in one call.
#[async_trait]
pub trait GeoLookup: Send + Sync {
    /// Looks up the caller's geolocation data.
    ///
    /// # Returns
    /// * `Ok(GeoInfo)` with at least the address present
    /// * `Err` for transport errors, non-2xx responses, malformed bodies,
    ///   or responses carrying no address
    async fn lookup(&self) -> Result<GeoInfo, LookupError>;
}

/// Resolves only the visitor's network address; the degraded substitute
/// for a failed [`GeoLookup`].
#[async_trait]
pub trait IpLookup: Send + Sync {
    /// Looks up the caller's IP address.
    async fn lookup_ip(&self) -> Result<String, LookupError>;
}

/// Delivers one notification send to the transactional collaborator.
#[async_trait]
pub trait NotificationClient: Send + Sync {
    /// Performs the send.
    ///
    /// # Returns
    /// * `Ok(())` if the collaborator accepted the message
    /// * `Err` if sending failed (network error, auth, quota, etc.)
    async fn send(&self, request: &SendRequest) -> Result<()>;
}
