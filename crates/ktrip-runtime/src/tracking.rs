use chrono::Local;
use ktrip_index::RecordStore;
use ktrip_types::{
    Channel, CounterField, CtaType, EventType, LandingEvent, ValidationError, parse_date_token,
};
use regex::Regex;
use std::sync::LazyLock;

use crate::Result;

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Where a landing hit came from, as sent by the front end.
#[derive(Debug, Clone, Default)]
pub struct VisitContext {
    /// `YYYYMMDD`
    pub date_token: String,
    pub session_id: String,
    pub channel: String,
    pub source_id: String,
    pub post_id: String,
    pub language: String,
}

impl VisitContext {
    pub fn new(
        date_token: impl Into<String>,
        session_id: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            date_token: date_token.into(),
            session_id: session_id.into(),
            channel: channel.into(),
            ..Default::default()
        }
    }

    pub fn with_source(mut self, source_id: impl Into<String>, post_id: impl Into<String>) -> Self {
        self.source_id = source_id.into();
        self.post_id = post_id.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

/// Result of a tracking call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackOutcome {
    Recorded,
    /// Identical event already stored
    Duplicate,
    /// Lead without consent; nothing stored
    SkippedNoConsent,
}

/// Landing-page tracking on top of a record store: one event row plus the
/// matching daily counter update per call.
pub struct LandingTracker<'a, R: RecordStore> {
    store: &'a R,
}

impl<'a, R: RecordStore> LandingTracker<'a, R> {
    pub fn new(store: &'a R) -> Self {
        Self { store }
    }

    /// Record a visit; `visitors` only moves for a first visit.
    pub fn track_visit(&self, ctx: &VisitContext) -> Result<TrackOutcome> {
        // visits carry no language
        let event = self.base_event(ctx, EventType::Visit)?.with_language("");

        if !self.store.append_event_if_new(&event)? {
            tracing::info!(session = %event.session_id, channel = %event.channel, "skip duplicate visit");
            return Ok(TrackOutcome::Duplicate);
        }

        self.store
            .increment_counter(event.date, event.channel, CounterField::Visitors, 1)?;
        tracing::info!(
            session = %event.session_id,
            channel = %event.channel,
            source = %event.source_id,
            post_id = %event.post_id,
            "track visit"
        );
        Ok(TrackOutcome::Recorded)
    }

    /// Record a CTA click. Every click is counted, a repeated click from the
    /// same session only once as an event row.
    pub fn track_cta(&self, ctx: &VisitContext, cta_type: &str) -> Result<TrackOutcome> {
        let cta = cta_type.trim().to_lowercase().parse::<CtaType>()?;
        let event = self.base_event(ctx, EventType::CtaClick)?.with_cta(cta);

        let inserted = self.store.append_event_if_new(&event)?;
        self.store.increment_counters(
            event.date,
            event.channel,
            &[(cta.counter_field(), 1), (CounterField::TotalCta, 1)],
        )?;

        tracing::info!(
            session = %event.session_id,
            channel = %event.channel,
            cta = %cta,
            language = %event.language,
            source = %event.source_id,
            post_id = %event.post_id,
            "track cta"
        );
        Ok(if inserted {
            TrackOutcome::Recorded
        } else {
            TrackOutcome::Duplicate
        })
    }

    /// Store a lead. Without consent nothing is written.
    pub fn save_lead(
        &self,
        ctx: &VisitContext,
        lead_email: &str,
        consent: bool,
    ) -> Result<TrackOutcome> {
        parse_date_token(&ctx.date_token)?;
        let session_id = normalize_session_id(&ctx.session_id)?;
        if !consent {
            tracing::info!(session = %session_id, "skip lead save without consent");
            return Ok(TrackOutcome::SkippedNoConsent);
        }

        let email = validate_lead_email(lead_email)?;
        let event = self
            .base_event(ctx, EventType::LeadSubmit)?
            .with_lead(email, true);

        let inserted = self.store.append_event_if_new(&event)?;
        tracing::info!(
            session = %event.session_id,
            channel = %event.channel,
            source = %event.source_id,
            post_id = %event.post_id,
            "saved lead"
        );
        Ok(if inserted {
            TrackOutcome::Recorded
        } else {
            TrackOutcome::Duplicate
        })
    }

    fn base_event(&self, ctx: &VisitContext, event_type: EventType) -> Result<LandingEvent> {
        let date = parse_date_token(&ctx.date_token)?;
        let session_id = normalize_session_id(&ctx.session_id)?;
        let channel = normalize_channel(&ctx.channel);

        Ok(LandingEvent::new(now_timestamp(), date, session_id, channel, event_type)
            .with_language(ctx.language.trim().to_uppercase())
            .with_source(normalize_id(&ctx.source_id), normalize_id(&ctx.post_id)))
    }
}

/// Lower-case known channels; anything else is attributed to `referral`.
pub fn normalize_channel(value: &str) -> Channel {
    let (channel, fallback) = Channel::normalize(value);
    if fallback {
        tracing::warn!(channel = %value.trim(), "unknown channel; fallback to referral");
    }
    channel
}

fn normalize_session_id(session_id: &str) -> std::result::Result<String, ValidationError> {
    let session_id = session_id.trim();
    if session_id.is_empty() {
        return Err(ValidationError::MissingSessionId);
    }
    Ok(session_id.to_string())
}

fn normalize_id(value: &str) -> String {
    value.trim().to_lowercase()
}

fn validate_lead_email(lead_email: &str) -> std::result::Result<String, ValidationError> {
    let email = lead_email.trim();
    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }
    Ok(email.to_string())
}

fn now_timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Today's date as a `YYYYMMDD` token.
pub fn today_token() -> String {
    Local::now().date_naive().format("%Y%m%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert_eq!(
            validate_lead_email(" user@example.com ").unwrap(),
            "user@example.com"
        );
        assert_eq!(
            validate_lead_email("user@example"),
            Err(ValidationError::InvalidEmail("user@example".to_string()))
        );
        assert!(validate_lead_email("").is_err());
    }

    #[test]
    fn test_session_id_required() {
        assert_eq!(
            normalize_session_id("  "),
            Err(ValidationError::MissingSessionId)
        );
        assert_eq!(normalize_session_id(" s1 ").unwrap(), "s1");
    }

    #[test]
    fn test_channel_fallback() {
        assert_eq!(normalize_channel("COMMUNITY"), Channel::Community);
        assert_eq!(normalize_channel("tiktok"), Channel::Referral);
    }

    #[test]
    fn test_today_token_is_valid() {
        assert!(parse_date_token(&today_token()).is_ok());
    }
}
