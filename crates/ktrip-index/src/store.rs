use chrono::NaiveDate;
use ktrip_types::{
    AnalyticsEvent, AppReview, Channel, CounterField, DailyCounter, LandingEvent,
    ReviewUpsertCounts, Row, ValidationError,
};
use rusqlite::{Connection, TransactionBehavior};
use std::path::PathBuf;

use crate::db::Database;
use crate::location::{StorageLocation, StoreOptions};
use crate::mirror::CsvMirror;
use crate::queries::{analytics, counter, landing, reviews, rows};
use crate::traits::{MirrorExporter, RecordStore, SchemaManager};
use crate::{Result, Table};

// NOTE: Write Path
//
// validate -> BEGIN IMMEDIATE -> statements -> COMMIT -> export mirror
//
// Validation happens before the transaction opens, so a rejected call never
// touches the database. The export runs after commit and reads a fresh
// snapshot; if it fails the write is still durable and the next successful
// export of that table repairs the mirror.

/// Record store over an injected schema manager and mirror exporter.
pub struct Store<S = Database, E = CsvMirror> {
    schema: S,
    exporter: E,
}

impl Store {
    /// Open the default SQLite + CSV stack at `location`.
    pub fn open(location: StorageLocation) -> Result<Self> {
        Self::open_with(location, StoreOptions::default())
    }

    pub fn open_with(location: StorageLocation, options: StoreOptions) -> Result<Self> {
        let exporter = CsvMirror::new(location.mirror_dir.clone());
        let schema = Database::open_with(location, options)?;
        Ok(Self::new(schema, exporter))
    }
}

impl<S: SchemaManager, E: MirrorExporter> Store<S, E> {
    pub fn new(schema: S, exporter: E) -> Self {
        Self { schema, exporter }
    }

    pub fn schema(&self) -> &S {
        &self.schema
    }

    pub fn exporter(&self) -> &E {
        &self.exporter
    }

    pub fn mirror_path(&self, table: Table) -> PathBuf {
        self.exporter.mirror_path(table)
    }

    /// Run `op` in one immediate transaction, then re-export `table`.
    fn write<T>(&self, table: Table, op: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let mut conn = self.schema.connection()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = op(&*tx)?;
        tx.commit()?;

        self.exporter.export_table(&conn, table)?;
        Ok(out)
    }
}

fn check_amount(field: CounterField, amount: i64) -> Result<()> {
    if amount < 0 {
        return Err(ValidationError::InvalidNumber {
            column: field.column().to_string(),
            value: amount.to_string(),
        }
        .into());
    }
    Ok(())
}

impl<S: SchemaManager, E: MirrorExporter> RecordStore for Store<S, E> {
    fn upsert_rows(
        &self,
        table: Table,
        rows: &[Row],
        overwrite_date: Option<NaiveDate>,
    ) -> Result<usize> {
        if rows.is_empty() && overwrite_date.is_none() {
            return Ok(0);
        }

        let spec = table.spec();
        let prepared = rows
            .iter()
            .map(|row| spec.prepare_row(row))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        self.write(table, |conn| {
            if let Some(date) = overwrite_date {
                let deleted = rows::delete_for_date(conn, spec, date)?;
                tracing::debug!(table = %table, %date, deleted, "date overwritten");
            }
            for row in &prepared {
                rows::upsert(conn, spec, row)?;
            }
            tracing::debug!(table = %table, rows = prepared.len(), "rows upserted");
            Ok(prepared.len())
        })
    }

    fn append_event_if_new(&self, event: &LandingEvent) -> Result<bool> {
        self.write(Table::LandingEvents, |conn| {
            let inserted = landing::insert_if_new(conn, event)?;
            tracing::debug!(
                session = %event.session_id,
                event_type = %event.event_type,
                inserted,
                "landing event appended"
            );
            Ok(inserted)
        })
    }

    fn append_events_if_new(&self, events: &[LandingEvent]) -> Result<usize> {
        if events.is_empty() {
            return Ok(0);
        }
        self.write(Table::LandingEvents, |conn| {
            let mut inserted = 0;
            for event in events {
                if landing::insert_if_new(conn, event)? {
                    inserted += 1;
                }
            }
            tracing::debug!(total = events.len(), inserted, "landing events appended");
            Ok(inserted)
        })
    }

    fn increment_counter(
        &self,
        date: NaiveDate,
        channel: Channel,
        field: CounterField,
        amount: i64,
    ) -> Result<()> {
        self.increment_counters(date, channel, &[(field, amount)])
    }

    fn increment_counters(
        &self,
        date: NaiveDate,
        channel: Channel,
        increments: &[(CounterField, i64)],
    ) -> Result<()> {
        for (field, amount) in increments {
            check_amount(*field, *amount)?;
        }

        self.write(Table::LandingCvrDaily, |conn| {
            counter::ensure_zero(conn, date, channel)?;
            counter::increment(conn, date, channel, increments)?;
            tracing::debug!(%date, %channel, ?increments, "counter incremented");
            Ok(())
        })
    }

    fn ensure_zero_counter(&self, date: NaiveDate, channel: Channel) -> Result<()> {
        self.write(Table::LandingCvrDaily, |conn| {
            counter::ensure_zero(conn, date, channel)
        })
    }

    fn append_log_row(&self, event: &AnalyticsEvent) -> Result<()> {
        self.write(Table::AnalyticsEvents, |conn| analytics::insert(conn, event))
    }

    fn append_log_rows(&self, events: &[AnalyticsEvent]) -> Result<usize> {
        if events.is_empty() {
            return Ok(0);
        }
        self.write(Table::AnalyticsEvents, |conn| {
            for event in events {
                analytics::insert(conn, event)?;
            }
            Ok(events.len())
        })
    }

    fn upsert_reviews(&self, input: &[AppReview]) -> Result<ReviewUpsertCounts> {
        if input.is_empty() {
            return Ok(ReviewUpsertCounts::default());
        }

        let normalized: Vec<AppReview> = input.iter().map(reviews::normalize).collect();
        if let Some(missing) = normalized
            .iter()
            .map(AppReview::missing_identity)
            .find(|missing| !missing.is_empty())
        {
            return Err(ValidationError::MissingIdentity {
                table: Table::AppReviews.name().to_string(),
                fields: missing,
            }
            .into());
        }

        self.write(Table::AppReviews, |conn| {
            let mut counts = ReviewUpsertCounts::default();
            for review in &normalized {
                if reviews::exists(conn, review)? {
                    counts.updated += 1;
                } else {
                    counts.inserted += 1;
                }
                reviews::upsert(conn, review)?;
            }
            counts.total = normalized.len();
            tracing::debug!(
                inserted = counts.inserted,
                updated = counts.updated,
                "reviews upserted"
            );
            Ok(counts)
        })
    }

    fn fetch_rows_for_date(&self, table: Table, date: NaiveDate) -> Result<Vec<Row>> {
        let conn = self.schema.connection()?;
        rows::select_for_date(&conn, table.spec(), date)
    }

    fn fetch_counter(&self, date: NaiveDate, channel: Channel) -> Result<Option<DailyCounter>> {
        let conn = self.schema.connection()?;
        counter::get(&conn, date, channel)
    }

    fn count_rows(&self, table: Table) -> Result<usize> {
        let conn = self.schema.connection()?;
        rows::count(&conn, table.spec())
    }

    fn export_table(&self, table: Table) -> Result<PathBuf> {
        let conn = self.schema.connection()?;
        self.exporter.export_table(&conn, table)
    }

    fn export_all(&self) -> Result<Vec<PathBuf>> {
        let conn = self.schema.connection()?;
        self.exporter.export_all(&conn)
    }
}
