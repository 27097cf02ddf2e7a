use ktrip_types::pseudonymize_lead_email;
use rusqlite::{Connection, TransactionBehavior};

use crate::Result;
use crate::registry::LANDING_EVENT_KEY;

// Schema version (increment when changing table definitions)
pub const SCHEMA_VERSION: i32 = 3;

// NOTE: Schema Evolution
//
// Unlike a rebuildable index, this database is the source of truth, so a
// version bump never drops tables. Evolution is additive:
// - new columns are added in place when missing
// - legacy rows are rewritten to the current rules
//   (empty strings instead of NULL in dedup columns, hashed lead emails)
// - the dedup index is rebuilt on the current key after duplicates are gone
//
// Every step is idempotent. A database already at SCHEMA_VERSION only gets
// missing tables created.

const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS landing_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    date TEXT NOT NULL,
    session_id TEXT NOT NULL,
    language TEXT,
    channel TEXT NOT NULL,
    source_id TEXT,
    post_id TEXT,
    event_type TEXT NOT NULL,
    cta_type TEXT,
    lead_email TEXT,
    consent INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS landing_cvr_daily (
    date TEXT NOT NULL,
    channel TEXT NOT NULL,
    visitors INTEGER NOT NULL DEFAULT 0,
    pilot_cta INTEGER NOT NULL DEFAULT 0,
    first_scan_cta INTEGER NOT NULL DEFAULT 0,
    total_cta INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (date, channel)
);

CREATE TABLE IF NOT EXISTS analytics_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    date TEXT NOT NULL,
    event_name TEXT NOT NULL,
    client_id TEXT NOT NULL,
    channel TEXT NOT NULL,
    language TEXT,
    status TEXT NOT NULL,
    payload TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS ix_analytics_events_date ON analytics_events (date);

CREATE TABLE IF NOT EXISTS app_reviews (
    timestamp TEXT NOT NULL,
    date TEXT NOT NULL,
    service_name TEXT NOT NULL,
    store TEXT NOT NULL,
    app_id TEXT NOT NULL,
    country TEXT NOT NULL,
    language TEXT NOT NULL,
    review_id TEXT NOT NULL,
    review_created_at TEXT,
    review_updated_at TEXT,
    rating TEXT,
    title TEXT,
    content TEXT,
    reviewer_name TEXT,
    source_url TEXT,
    PRIMARY KEY (store, app_id, country, review_id)
);
CREATE INDEX IF NOT EXISTS ix_app_reviews_date_store ON app_reviews (date, store);

CREATE TABLE IF NOT EXISTS trip_safety (
    scenario_id TEXT NOT NULL,
    date TEXT NOT NULL,
    persona TEXT,
    menu TEXT,
    restriction TEXT,
    risk_light TEXT,
    confidence TEXT,
    evidence_count TEXT,
    show_mode_used TEXT,
    quick_help_used TEXT,
    resolved TEXT,
    time_sec TEXT,
    PRIMARY KEY (date, scenario_id)
);

CREATE TABLE IF NOT EXISTS interview_log (
    interview_id TEXT NOT NULL,
    date TEXT NOT NULL,
    segment TEXT,
    language TEXT,
    pain_tags TEXT,
    quote TEXT,
    PRIMARY KEY (date, interview_id)
);

CREATE TABLE IF NOT EXISTS b2b_pipeline (
    meeting_id TEXT NOT NULL,
    date TEXT NOT NULL,
    partner_type TEXT,
    partner_name TEXT,
    status TEXT,
    loi_signed TEXT,
    intent_email TEXT,
    notes TEXT,
    PRIMARY KEY (date, meeting_id)
);

CREATE TABLE IF NOT EXISTS trip_pass_pricing (
    response_id TEXT NOT NULL,
    date TEXT NOT NULL,
    persona TEXT,
    price_card TEXT,
    selected TEXT,
    willing_to_pay TEXT,
    PRIMARY KEY (date, response_id)
);

CREATE TABLE IF NOT EXISTS guardrail_checklist (
    check_id TEXT NOT NULL,
    date TEXT NOT NULL,
    scenario_id TEXT,
    banned_expression_found TEXT,
    evidence_missing TEXT,
    confidence_missing TEXT,
    reviewer TEXT,
    notes TEXT,
    PRIMARY KEY (date, check_id)
);

CREATE TABLE IF NOT EXISTS community_outreach_log (
    date TEXT NOT NULL,
    platform TEXT NOT NULL,
    community_name TEXT,
    post_id TEXT NOT NULL,
    url TEXT,
    language TEXT,
    impressions TEXT,
    clicks TEXT,
    visitors TEXT,
    cta TEXT,
    leads TEXT,
    status TEXT,
    notes TEXT,
    PRIMARY KEY (date, post_id)
);
"#;

pub const DEDUP_INDEX: &str = "ux_landing_events_dedup";

/// Bring the database at `conn` up to the current schema.
///
/// Safe to call on every start: a current database is left as is.
pub fn ensure_schema(conn: &mut Connection) -> Result<()> {
    // journal_mode returns the resulting mode as a row
    let mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
    if !mode.eq_ignore_ascii_case("wal") {
        tracing::warn!(mode = %mode, "WAL journal mode not available");
    }
    conn.execute_batch("PRAGMA synchronous=NORMAL;")?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let from_version: i32 = tx.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    tx.execute_batch(CREATE_TABLES)?;
    if from_version == SCHEMA_VERSION {
        // hygiene ran when this version was recorded; the index enforces it now
        tx.commit()?;
        return Ok(());
    }

    ensure_column(&tx, "landing_events", "source_id", "TEXT")?;
    ensure_column(&tx, "landing_events", "post_id", "TEXT")?;

    tx.execute_batch(&format!("DROP INDEX IF EXISTS {};", DEDUP_INDEX))?;
    let normalized = normalize_dedup_columns(&tx)?;
    let hashed = hash_plaintext_emails(&tx)?;
    let removed = remove_duplicate_events(&tx)?;
    tx.execute_batch(&format!(
        "CREATE UNIQUE INDEX IF NOT EXISTS {} ON landing_events ({});",
        DEDUP_INDEX,
        LANDING_EVENT_KEY.join(", ")
    ))?;

    tx.execute_batch(&format!("PRAGMA user_version = {};", SCHEMA_VERSION))?;
    tx.commit()?;

    tracing::info!(
        from_version,
        to_version = SCHEMA_VERSION,
        normalized,
        hashed,
        removed,
        "schema migrated"
    );
    Ok(())
}

pub fn schema_version(conn: &Connection) -> Result<i32> {
    Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
}

fn ensure_column(conn: &Connection, table: &str, column: &str, column_type: &str) -> Result<()> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let exists = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?
        .iter()
        .any(|name| name == column);

    if !exists {
        conn.execute_batch(&format!(
            "ALTER TABLE {} ADD COLUMN {} {};",
            table, column, column_type
        ))?;
    }
    Ok(())
}

/// NULL never equals NULL in a unique index, so legacy NULLs would slip
/// past dedup.
fn normalize_dedup_columns(conn: &Connection) -> Result<usize> {
    let mut changed = 0;
    for column in LANDING_EVENT_KEY {
        changed += conn.execute(
            &format!(
                "UPDATE landing_events SET {col} = '' WHERE {col} IS NULL",
                col = column
            ),
            [],
        )?;
    }
    changed += conn.execute(
        "UPDATE landing_events SET language = '' WHERE language IS NULL",
        [],
    )?;
    // whitespace-only emails are neither empty nor hashed
    changed += conn.execute(
        "UPDATE landing_events SET lead_email = '' WHERE lead_email != '' AND TRIM(lead_email) = ''",
        [],
    )?;
    Ok(changed)
}

fn hash_plaintext_emails(conn: &Connection) -> Result<usize> {
    let plaintext: Vec<(i64, String)> = {
        let mut stmt = conn.prepare(
            r#"
            SELECT id, lead_email
            FROM landing_events
            WHERE TRIM(lead_email) != '' AND lead_email NOT LIKE 'sha256:%'
            "#,
        )?;
        stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?
    };

    let mut update = conn.prepare("UPDATE landing_events SET lead_email = ?1 WHERE id = ?2")?;
    for (id, email) in &plaintext {
        update.execute(rusqlite::params![pseudonymize_lead_email(email), id])?;
    }
    Ok(plaintext.len())
}

fn remove_duplicate_events(conn: &Connection) -> Result<usize> {
    let removed = conn.execute(
        &format!(
            r#"
            DELETE FROM landing_events
            WHERE id NOT IN (
                SELECT MIN(id) FROM landing_events GROUP BY {}
            )
            "#,
            LANDING_EVENT_KEY.join(", ")
        ),
        [],
    )?;
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'index' ORDER BY name")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_fresh_database_gets_current_schema() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_schema(&mut conn).unwrap();

        assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);
        assert!(index_names(&conn).contains(&DEDUP_INDEX.to_string()));
    }

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_schema(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO landing_cvr_daily (date, channel, visitors) VALUES ('2026-02-16', 'community', 4)",
            [],
        )
        .unwrap();

        ensure_schema(&mut conn).unwrap();

        let visitors: i64 = conn
            .query_row("SELECT visitors FROM landing_cvr_daily", [], |row| row.get(0))
            .unwrap();
        assert_eq!(visitors, 4);
    }

    #[test]
    fn test_ensure_column_adds_missing_column_once() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (a TEXT);").unwrap();

        ensure_column(&conn, "t", "b", "TEXT").unwrap();
        ensure_column(&conn, "t", "b", "TEXT").unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('t') WHERE name = 'b'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }
}
