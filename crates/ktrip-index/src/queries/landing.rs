use ktrip_types::{LandingEvent, format_iso_date, pseudonymize_lead_email};
use rusqlite::{Connection, params};

use crate::Result;
use crate::registry::LANDING_EVENT_KEY;

/// Insert unless the dedup key already exists. Returns whether a row was
/// created.
pub(crate) fn insert_if_new(conn: &Connection, event: &LandingEvent) -> Result<bool> {
    let inserted = conn.execute(
        &format!(
            r#"
            INSERT INTO landing_events (
                timestamp, date, session_id, language, channel, source_id, post_id,
                event_type, cta_type, lead_email, consent
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT({}) DO NOTHING
            "#,
            LANDING_EVENT_KEY.join(", ")
        ),
        params![
            &event.timestamp,
            format_iso_date(event.date),
            &event.session_id,
            &event.language,
            event.channel.as_str(),
            &event.source_id,
            &event.post_id,
            event.event_type.as_str(),
            event.cta_str(),
            pseudonymize_lead_email(&event.lead_email),
            event.consent,
        ],
    )?;

    Ok(inserted == 1)
}
