use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ValidationError;

/// Acquisition channel a landing visit is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    PreArrivalQr,
    Community,
    SnsShortform,
    Referral,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::PreArrivalQr,
        Channel::Community,
        Channel::SnsShortform,
        Channel::Referral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::PreArrivalQr => "pre_arrival_qr",
            Channel::Community => "community",
            Channel::SnsShortform => "sns_shortform",
            Channel::Referral => "referral",
        }
    }

    /// Lenient parse used at the tracking edge: case-insensitive, anything
    /// unrecognized (including empty) is attributed to `referral`.
    ///
    /// Returns the channel and whether the fallback was taken.
    pub fn normalize(value: &str) -> (Channel, bool) {
        let normalized = value.trim().to_lowercase();
        match normalized.parse() {
            Ok(channel) => (channel, false),
            Err(_) => (Channel::Referral, !normalized.is_empty()),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownChannel(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Visit,
    CtaClick,
    LeadSubmit,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Visit => "visit",
            EventType::CtaClick => "cta_click",
            EventType::LeadSubmit => "lead_submit",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "visit" => Ok(EventType::Visit),
            "cta_click" => Ok(EventType::CtaClick),
            "lead_submit" => Ok(EventType::LeadSubmit),
            other => Err(ValidationError::UnknownEventType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CtaType {
    Pilot,
    FirstScan,
}

impl CtaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CtaType::Pilot => "pilot",
            CtaType::FirstScan => "first_scan",
        }
    }

    /// Counter field credited when this CTA is clicked
    pub fn counter_field(&self) -> CounterField {
        match self {
            CtaType::Pilot => CounterField::PilotCta,
            CtaType::FirstScan => CounterField::FirstScanCta,
        }
    }

    /// Parse the stored form, where an empty string means "no CTA".
    pub fn parse_optional(value: &str) -> Result<Option<CtaType>, ValidationError> {
        let value = value.trim();
        if value.is_empty() {
            Ok(None)
        } else {
            value.to_lowercase().parse().map(Some)
        }
    }
}

impl fmt::Display for CtaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CtaType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pilot" => Ok(CtaType::Pilot),
            "first_scan" => Ok(CtaType::FirstScan),
            other => Err(ValidationError::UnknownCtaType(other.to_string())),
        }
    }
}

/// The only columns of the daily counter table that may be incremented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterField {
    Visitors,
    PilotCta,
    FirstScanCta,
    TotalCta,
}

impl CounterField {
    pub const ALL: [CounterField; 4] = [
        CounterField::Visitors,
        CounterField::PilotCta,
        CounterField::FirstScanCta,
        CounterField::TotalCta,
    ];

    /// Column name in `landing_cvr_daily`.
    pub fn column(&self) -> &'static str {
        match self {
            CounterField::Visitors => "visitors",
            CounterField::PilotCta => "pilot_cta",
            CounterField::FirstScanCta => "first_scan_cta",
            CounterField::TotalCta => "total_cta",
        }
    }
}

impl fmt::Display for CounterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for CounterField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CounterField::ALL
            .into_iter()
            .find(|f| f.column() == s)
            .ok_or_else(|| ValidationError::UnsupportedField(s.to_string()))
    }
}
