//! Resolves ambient visit facts into a complete [`VisitorRecord`].
//!
//! The resolver never fails: every lookup failure is logged and degraded
//! to placeholder values, so the caller always receives a fully
//! populated record.

use crate::core::{GeoLookup, IpLookup, VisitContext, VisitorRecord, DIRECT, UNKNOWN};
use chrono::{DateTime, FixedOffset, Utc};
use std::sync::Arc;
use tracing::debug;

/// The owner's reporting timezone, Asia/Kolkata (UTC+05:30, no DST).
const REPORT_UTC_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Gathers visitor facts from the environment and the lookup chain.
pub struct VisitorResolver {
    primary: Arc<dyn GeoLookup>,
    fallback: Arc<dyn IpLookup>,
}

impl VisitorResolver {
    /// Creates a new `VisitorResolver` over the two lookup collaborators.
    pub fn new(primary: Arc<dyn GeoLookup>, fallback: Arc<dyn IpLookup>) -> Self {
        Self { primary, fallback }
    }

    /// Produces one fully populated record for the current visit.
    ///
    /// The fallback lookup runs only after the primary's outcome is
    /// known, and only supplies the address; the two are never raced.
    pub async fn resolve(&self, ctx: &VisitContext) -> VisitorRecord {
        let mut record = VisitorRecord {
            visit_timestamp: format_visit_timestamp(Utc::now()),
            user_agent: ctx
                .user_agent
                .clone()
                .filter(|ua| !ua.is_empty())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            referrer: ctx
                .referrer
                .clone()
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| DIRECT.to_string()),
            ..VisitorRecord::default()
        };

        match self.primary.lookup().await {
            Ok(info) => {
                record.ip_address = info.ip.unwrap_or_else(|| UNKNOWN.to_string());
                record.city = info.city.unwrap_or_else(|| UNKNOWN.to_string());
                record.region = info.region.unwrap_or_else(|| UNKNOWN.to_string());
                record.country = info.country_name.unwrap_or_else(|| UNKNOWN.to_string());
                record.timezone = info.timezone.unwrap_or_else(|| UNKNOWN.to_string());
                record.location_summary = VisitorRecord::summarize_location(
                    &record.city,
                    &record.region,
                    &record.country,
                );
            }
            Err(err) => {
                metrics::counter!("lookup_failures").increment(1);
                debug!(error = %err, "primary geolocation lookup failed, trying fallback");
                match self.fallback.lookup_ip().await {
                    Ok(ip) => record.ip_address = ip,
                    Err(err) => {
                        metrics::counter!("lookup_failures").increment(1);
                        debug!(error = %err, "fallback IP lookup failed, leaving address unknown");
                    }
                }
            }
        }

        record
    }
}

/// Formats an instant in the owner's reporting timezone, en-US style:
/// long month name, numeric day and year, 12-hour clock with seconds.
fn format_visit_timestamp(instant: DateTime<Utc>) -> String {
    let offset =
        FixedOffset::east_opt(REPORT_UTC_OFFSET_SECS).expect("offset is a valid constant");
    instant
        .with_timezone(&offset)
        .format("%B %-d, %Y, %I:%M:%S %p")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GeoInfo;
    use crate::lookup::fake::{FakeGeoLookup, FakeIpLookup};
    use chrono::TimeZone;

    fn full_geo_info() -> GeoInfo {
        GeoInfo {
            ip: Some("1.2.3.4".to_string()),
            city: Some("Chennai".to_string()),
            region: Some("Tamil Nadu".to_string()),
            country_name: Some("India".to_string()),
            timezone: Some("Asia/Kolkata".to_string()),
        }
    }

    #[tokio::test]
    async fn test_primary_success_populates_all_location_fields() {
        let resolver = VisitorResolver::new(
            Arc::new(FakeGeoLookup::succeeding(full_geo_info())),
            Arc::new(FakeIpLookup::failing()),
        );

        let record = resolver.resolve(&VisitContext::default()).await;

        assert_eq!(record.ip_address, "1.2.3.4");
        assert_eq!(record.city, "Chennai");
        assert_eq!(record.region, "Tamil Nadu");
        assert_eq!(record.country, "India");
        assert_eq!(record.timezone, "Asia/Kolkata");
        assert_eq!(record.location_summary, "Chennai, Tamil Nadu, India");
    }

    #[tokio::test]
    async fn test_fallback_not_attempted_when_primary_succeeds() {
        let fallback = Arc::new(FakeIpLookup::succeeding("9.9.9.9"));
        let fallback_calls = fallback.call_counter();
        let resolver = VisitorResolver::new(
            Arc::new(FakeGeoLookup::succeeding(full_geo_info())),
            fallback,
        );

        let record = resolver.resolve(&VisitContext::default()).await;

        assert_eq!(record.ip_address, "1.2.3.4");
        assert_eq!(fallback_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fallback_supplies_only_the_address() {
        let resolver = VisitorResolver::new(
            Arc::new(FakeGeoLookup::failing()),
            Arc::new(FakeIpLookup::succeeding("5.6.7.8")),
        );

        let record = resolver.resolve(&VisitContext::default()).await;

        assert_eq!(record.ip_address, "5.6.7.8");
        assert_eq!(record.city, UNKNOWN);
        assert_eq!(record.region, UNKNOWN);
        assert_eq!(record.country, UNKNOWN);
        assert_eq!(record.timezone, UNKNOWN);
        assert_eq!(record.location_summary, "Unknown, Unknown, Unknown");
    }

    #[tokio::test]
    async fn test_both_lookups_failing_leaves_every_field_at_placeholder() {
        let resolver = VisitorResolver::new(
            Arc::new(FakeGeoLookup::failing()),
            Arc::new(FakeIpLookup::failing()),
        );

        let record = resolver.resolve(&VisitContext::default()).await;

        assert_eq!(record.ip_address, UNKNOWN);
        assert_eq!(record.city, UNKNOWN);
        assert_eq!(record.region, UNKNOWN);
        assert_eq!(record.country, UNKNOWN);
        assert_eq!(record.timezone, UNKNOWN);
        assert_eq!(record.location_summary, "Unknown, Unknown, Unknown");
        assert!(!record.visit_timestamp.is_empty());
    }

    #[tokio::test]
    async fn test_partial_primary_response_defaults_missing_fields() {
        let info = GeoInfo {
            ip: Some("1.2.3.4".to_string()),
            city: Some("Chennai".to_string()),
            ..GeoInfo::default()
        };
        let resolver = VisitorResolver::new(
            Arc::new(FakeGeoLookup::succeeding(info)),
            Arc::new(FakeIpLookup::failing()),
        );

        let record = resolver.resolve(&VisitContext::default()).await;

        assert_eq!(record.city, "Chennai");
        assert_eq!(record.region, UNKNOWN);
        assert_eq!(record.location_summary, "Chennai, Unknown, Unknown");
    }

    #[tokio::test]
    async fn test_context_facts_are_carried_through() {
        let resolver = VisitorResolver::new(
            Arc::new(FakeGeoLookup::failing()),
            Arc::new(FakeIpLookup::failing()),
        );
        let ctx = VisitContext {
            user_agent: Some("Mozilla/5.0 (X11; Linux x86_64)".to_string()),
            referrer: Some("https://news.ycombinator.com/".to_string()),
        };

        let record = resolver.resolve(&ctx).await;

        assert_eq!(record.user_agent, "Mozilla/5.0 (X11; Linux x86_64)");
        assert_eq!(record.referrer, "https://news.ycombinator.com/");
    }

    #[tokio::test]
    async fn test_absent_context_facts_become_placeholders() {
        let resolver = VisitorResolver::new(
            Arc::new(FakeGeoLookup::failing()),
            Arc::new(FakeIpLookup::failing()),
        );
        let ctx = VisitContext {
            user_agent: None,
            // An empty referrer means the visitor typed the URL directly.
            referrer: Some(String::new()),
        };

        let record = resolver.resolve(&ctx).await;

        assert_eq!(record.user_agent, UNKNOWN);
        assert_eq!(record.referrer, DIRECT);
    }

    #[test]
    fn test_visit_timestamp_formatting() {
        // 10:00:00 UTC is 15:30:00 in Asia/Kolkata.
        let instant = Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap();
        assert_eq!(
            format_visit_timestamp(instant),
            "January 15, 2025, 03:30:00 PM"
        );

        // Single-digit day, morning hour.
        let instant = Utc.with_ymd_and_hms(2025, 7, 3, 20, 31, 5).unwrap();
        assert_eq!(format_visit_timestamp(instant), "July 4, 2025, 02:01:05 AM");
    }
}
