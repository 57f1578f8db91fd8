// src/formatting.rs

use crate::core::VisitorRecord;

/// A trait for rendering a visitor record into a notification body.
pub trait ReportFormatter: Send + Sync {
    fn format_report(&self, record: &VisitorRecord) -> String;
}

/// Renders the owner's email report: a header, one labelled line per
/// visitor fact in fixed order, and a fixed trailer.
pub struct EmailReportFormatter;

impl ReportFormatter for EmailReportFormatter {
    fn format_report(&self, record: &VisitorRecord) -> String {
        format!(
            "New Visitor to Portfolio!\n\
             \n\
             📍 Location: {location}\n\
             🌐 IP Address: {ip}\n\
             🕐 Visiting Time: {time}\n\
             🌍 Country: {country}\n\
             🏙️ City: {city}\n\
             ⏰ Timezone: {timezone}\n\
             💻 User Agent: {user_agent}\n\
             🔗 Referrer: {referrer}\n\
             \n\
             ---\n\
             This is an automated visitor tracking notification.",
            location = record.location_summary,
            ip = record.ip_address,
            time = record.visit_timestamp,
            country = record.country,
            city = record.city,
            timezone = record.timezone,
            user_agent = record.user_agent,
            referrer = record.referrer,
        )
    }
}
