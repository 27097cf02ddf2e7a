// Domain types shared by the store, the runtime and the CLI.
// No IO lives here.

mod channel;
mod date;
pub mod error;
mod pseudonym;
mod records;

pub use channel::{Channel, CounterField, CtaType, EventType};
pub use date::{
    date_token_to_iso, format_iso_date, normalize_date_token, normalize_legacy_date,
    parse_date_token, parse_iso_date,
};
pub use error::{Result, ValidationError};
pub use pseudonym::{HASH_PREFIX, is_pseudonymized, pseudonymize_lead_email};
pub use records::{
    AnalyticsEvent, AppReview, DailyCounter, EPOCH_TIMESTAMP, LandingEvent, ReviewUpsertCounts,
    Row,
};
