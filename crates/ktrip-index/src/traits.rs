use chrono::NaiveDate;
use ktrip_types::{
    AnalyticsEvent, AppReview, Channel, CounterField, DailyCounter, LandingEvent,
    ReviewUpsertCounts, Row,
};
use rusqlite::Connection;
use std::path::PathBuf;

use crate::{Result, Table};

/// Owns the schema of one storage location.
pub trait SchemaManager: Send + Sync {
    /// Create or evolve the schema. Cheap after the first successful call.
    fn ensure_ready(&self) -> Result<()>;

    /// A fresh connection to a ready database.
    fn connection(&self) -> Result<Connection>;
}

/// Regenerates the flat-file mirror of a table.
pub trait MirrorExporter: Send + Sync {
    fn mirror_path(&self, table: Table) -> PathBuf;

    /// Replace the mirror of `table` with a snapshot read through `conn`.
    fn export_table(&self, conn: &Connection, table: Table) -> Result<PathBuf>;

    fn export_all(&self, conn: &Connection) -> Result<Vec<PathBuf>> {
        Table::ALL
            .into_iter()
            .map(|table| self.export_table(conn, table))
            .collect()
    }
}

/// Write and read operations over the registered tables.
///
/// Every mutating call runs in one transaction and re-exports the affected
/// mirror after commit.
pub trait RecordStore {
    /// Upsert rows by natural key. With `overwrite_date`, every row of that
    /// date is deleted first. Returns the number of rows written.
    fn upsert_rows(
        &self,
        table: Table,
        rows: &[Row],
        overwrite_date: Option<NaiveDate>,
    ) -> Result<usize>;

    /// Insert a landing event unless an identical one exists.
    fn append_event_if_new(&self, event: &LandingEvent) -> Result<bool>;

    /// Batch form of [`RecordStore::append_event_if_new`]; returns the
    /// number of rows created.
    fn append_events_if_new(&self, events: &[LandingEvent]) -> Result<usize>;

    fn increment_counter(
        &self,
        date: NaiveDate,
        channel: Channel,
        field: CounterField,
        amount: i64,
    ) -> Result<()>;

    /// Apply several increments to one counter row in a single statement.
    fn increment_counters(
        &self,
        date: NaiveDate,
        channel: Channel,
        increments: &[(CounterField, i64)],
    ) -> Result<()>;

    fn ensure_zero_counter(&self, date: NaiveDate, channel: Channel) -> Result<()>;

    fn append_log_row(&self, event: &AnalyticsEvent) -> Result<()>;

    fn append_log_rows(&self, events: &[AnalyticsEvent]) -> Result<usize>;

    fn upsert_reviews(&self, reviews: &[AppReview]) -> Result<ReviewUpsertCounts>;

    fn fetch_rows_for_date(&self, table: Table, date: NaiveDate) -> Result<Vec<Row>>;

    fn fetch_counter(&self, date: NaiveDate, channel: Channel) -> Result<Option<DailyCounter>>;

    fn count_rows(&self, table: Table) -> Result<usize>;

    fn export_table(&self, table: Table) -> Result<PathBuf>;

    fn export_all(&self) -> Result<Vec<PathBuf>>;
}
