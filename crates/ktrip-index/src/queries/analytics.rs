use ktrip_types::{AnalyticsEvent, format_iso_date};
use rusqlite::{Connection, params};

use crate::Result;

pub(crate) fn insert(conn: &Connection, event: &AnalyticsEvent) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO analytics_events (
            timestamp, date, event_name, client_id, channel, language, status, payload
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            &event.timestamp,
            format_iso_date(event.date),
            &event.event_name,
            &event.client_id,
            &event.channel,
            &event.language,
            &event.status,
            &event.payload,
        ],
    )?;
    Ok(())
}
