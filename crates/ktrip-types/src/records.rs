use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Channel, CounterField, CtaType, EventType};

/// Generic table row: column name to text value.
///
/// Used for registry-driven upserts, date-scoped reads and legacy CSV rows.
/// Unset columns read back as empty strings.
pub type Row = BTreeMap<String, String>;

/// Timestamp used for historical rows that never recorded one.
pub const EPOCH_TIMESTAMP: &str = "1970-01-01T00:00:00";

/// One landing-page fact (visit, CTA click or lead submission).
///
/// `lead_email` may be given in plaintext; the store hashes it before it is
/// written anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandingEvent {
    pub timestamp: String,
    pub date: NaiveDate,
    pub session_id: String,
    pub language: String,
    pub channel: Channel,
    pub source_id: String,
    pub post_id: String,
    pub event_type: EventType,
    pub cta_type: Option<CtaType>,
    pub lead_email: String,
    pub consent: bool,
}

impl LandingEvent {
    pub fn new(
        timestamp: impl Into<String>,
        date: NaiveDate,
        session_id: impl Into<String>,
        channel: Channel,
        event_type: EventType,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            date,
            session_id: session_id.into(),
            language: String::new(),
            channel,
            source_id: String::new(),
            post_id: String::new(),
            event_type,
            cta_type: None,
            lead_email: String::new(),
            consent: false,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_source(mut self, source_id: impl Into<String>, post_id: impl Into<String>) -> Self {
        self.source_id = source_id.into();
        self.post_id = post_id.into();
        self
    }

    pub fn with_cta(mut self, cta_type: CtaType) -> Self {
        self.cta_type = Some(cta_type);
        self
    }

    pub fn with_lead(mut self, lead_email: impl Into<String>, consent: bool) -> Self {
        self.lead_email = lead_email.into();
        self.consent = consent;
        self
    }

    /// CTA subtype in stored form (empty when absent)
    pub fn cta_str(&self) -> &'static str {
        self.cta_type.map(|c| c.as_str()).unwrap_or("")
    }
}

/// Audit row for an outward telemetry call, including failed deliveries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub timestamp: String,
    pub date: NaiveDate,
    pub event_name: String,
    pub client_id: String,
    pub channel: String,
    pub language: String,
    pub status: String,
    /// Opaque to the store (usually the JSON body that was sent)
    pub payload: String,
}

/// Daily per-channel aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCounter {
    pub date: NaiveDate,
    pub channel: String,
    pub visitors: i64,
    pub pilot_cta: i64,
    pub first_scan_cta: i64,
    pub total_cta: i64,
}

impl DailyCounter {
    pub fn value(&self, field: CounterField) -> i64 {
        match field {
            CounterField::Visitors => self.visitors,
            CounterField::PilotCta => self.pilot_cta,
            CounterField::FirstScanCta => self.first_scan_cta,
            CounterField::TotalCta => self.total_cta,
        }
    }
}

/// Normalized app-store review as produced by the review fetchers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppReview {
    pub timestamp: String,
    pub date: String,
    pub service_name: String,
    pub store: String,
    pub app_id: String,
    pub country: String,
    pub language: String,
    pub review_id: String,
    pub review_created_at: String,
    pub review_updated_at: String,
    pub rating: String,
    pub title: String,
    pub content: String,
    pub reviewer_name: String,
    pub source_url: String,
}

impl AppReview {
    pub const IDENTITY_FIELDS: [&'static str; 4] = ["store", "app_id", "country", "review_id"];

    /// Identity fields that are blank after trimming.
    pub fn missing_identity(&self) -> Vec<String> {
        [
            ("store", &self.store),
            ("app_id", &self.app_id),
            ("country", &self.country),
            ("review_id", &self.review_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name.to_string())
        .collect()
    }

    /// Build a review from a generic row, ignoring unknown columns.
    pub fn from_row(row: &Row) -> Self {
        let get = |key: &str| row.get(key).cloned().unwrap_or_default();
        Self {
            timestamp: get("timestamp"),
            date: get("date"),
            service_name: get("service_name"),
            store: get("store"),
            app_id: get("app_id"),
            country: get("country"),
            language: get("language"),
            review_id: get("review_id"),
            review_created_at: get("review_created_at"),
            review_updated_at: get("review_updated_at"),
            rating: get("rating"),
            title: get("title"),
            content: get("content"),
            reviewer_name: get("reviewer_name"),
            source_url: get("source_url"),
        }
    }
}

/// Outcome of a review batch upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewUpsertCounts {
    pub inserted: usize,
    pub updated: usize,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_identity_reports_blank_fields() {
        let review = AppReview {
            store: "google_play".to_string(),
            app_id: "  ".to_string(),
            country: "US".to_string(),
            ..Default::default()
        };

        assert_eq!(review.missing_identity(), vec!["app_id", "review_id"]);
    }

    #[test]
    fn test_landing_event_builder() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 16).unwrap();
        let event = LandingEvent::new(
            "2026-02-16T10:00:00",
            date,
            "s1",
            Channel::Community,
            EventType::CtaClick,
        )
        .with_source("reddit", "r1")
        .with_cta(CtaType::Pilot);

        assert_eq!(event.cta_str(), "pilot");
        assert_eq!(event.source_id, "reddit");
        assert!(!event.consent);
    }

    #[test]
    fn test_review_counts_serialize() {
        let counts = ReviewUpsertCounts {
            inserted: 1,
            updated: 2,
            total: 3,
        };
        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(json, r#"{"inserted":1,"updated":2,"total":3}"#);
    }
}
