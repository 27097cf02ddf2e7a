use chrono::NaiveDate;
use ktrip_index::{RecordStore, Table};
use ktrip_types::{
    AnalyticsEvent, AppReview, Channel, CtaType, EPOCH_TIMESTAMP, EventType, LandingEvent, Row,
    format_iso_date, normalize_legacy_date,
};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

use crate::Result;

/// Dated fragment files: `20260216_landing_events.csv`
static DATE_FILE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{8}_").unwrap());

const COUNTER_METRICS: [&str; 4] = ["visitors", "pilot_cta", "first_scan_cta", "total_cta"];

#[derive(Debug, Clone)]
pub enum MigrationProgress {
    DatasetStarted {
        table: Table,
        sources: usize,
    },
    RowSkipped {
        table: Table,
        path: PathBuf,
        reason: String,
    },
    DatasetCompleted(DatasetReport),
    DatasetFailed {
        table: Table,
        error: String,
    },
    Exported {
        files: usize,
    },
}

/// Outcome for one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetReport {
    pub table: Table,
    pub sources: usize,
    pub rows_read: usize,
    /// Rows written (or, on a dry run, rows that would be written)
    pub applied: usize,
    pub skipped: usize,
    pub error: Option<String>,
}

impl DatasetReport {
    fn new(table: Table, sources: usize) -> Self {
        Self {
            table,
            sources,
            rows_read: 0,
            applied: 0,
            skipped: 0,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub dry_run: bool,
    pub datasets: Vec<DatasetReport>,
}

impl MigrationReport {
    pub fn dataset(&self, table: Table) -> Option<&DatasetReport> {
        self.datasets.iter().find(|d| d.table == table)
    }

    pub fn failed(&self) -> impl Iterator<Item = &DatasetReport> {
        self.datasets.iter().filter(|d| d.error.is_some())
    }

    pub fn total_applied(&self) -> usize {
        self.datasets.iter().map(|d| d.applied).sum()
    }
}

/// Folds historical CSV fragments back into the store.
///
/// Each dataset is migrated on its own: a failing dataset is recorded in the
/// report and the rest still run. A non-dry run ends by re-exporting every
/// mirror.
pub struct LegacyMigration<'a, R: RecordStore> {
    store: &'a R,
    source_dir: PathBuf,
    dry_run: bool,
}

impl<'a, R: RecordStore> LegacyMigration<'a, R> {
    pub fn new(store: &'a R, source_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            source_dir: source_dir.into(),
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn run<F>(&self, mut on_progress: F) -> Result<MigrationReport>
    where
        F: FnMut(MigrationProgress),
    {
        let mut datasets = Vec::new();

        for table in migration_order() {
            let sources = find_sources(&self.source_dir, table.spec().mirror_file);
            on_progress(MigrationProgress::DatasetStarted {
                table,
                sources: sources.len(),
            });

            let mut report = DatasetReport::new(table, sources.len());
            let outcome = match table {
                Table::LandingEvents => self.migrate_landing_events(&sources, &mut report, &mut on_progress),
                Table::LandingCvrDaily => self.migrate_counters(&sources, &mut report, &mut on_progress),
                Table::AnalyticsEvents => self.migrate_analytics(&sources, &mut report, &mut on_progress),
                _ => self.migrate_keyed(table, &sources, &mut report, &mut on_progress),
            };

            match outcome {
                Ok(()) => on_progress(MigrationProgress::DatasetCompleted(report.clone())),
                Err(err) => {
                    tracing::warn!(table = %table, error = %err, "dataset migration failed");
                    report.error = Some(err.to_string());
                    on_progress(MigrationProgress::DatasetFailed {
                        table,
                        error: err.to_string(),
                    });
                }
            }
            datasets.push(report);
        }

        if !self.dry_run {
            let files = self.store.export_all()?;
            on_progress(MigrationProgress::Exported { files: files.len() });
        }

        Ok(MigrationReport {
            dry_run: self.dry_run,
            datasets,
        })
    }

    fn migrate_landing_events<F>(
        &self,
        sources: &[PathBuf],
        report: &mut DatasetReport,
        on_progress: &mut F,
    ) -> Result<()>
    where
        F: FnMut(MigrationProgress),
    {
        let mut events = Vec::new();
        for path in sources {
            for row in read_rows(path)? {
                report.rows_read += 1;
                match landing_event_from_row(&row) {
                    Ok(event) => events.push(event),
                    Err(reason) => {
                        skip(Table::LandingEvents, path, reason, report, on_progress);
                    }
                }
            }
        }

        report.applied = if self.dry_run {
            events.len()
        } else {
            self.store.append_events_if_new(&events)?
        };
        Ok(())
    }

    /// Counter fragments are partial aggregates, so they are summed rather
    /// than overwritten.
    fn migrate_counters<F>(
        &self,
        sources: &[PathBuf],
        report: &mut DatasetReport,
        on_progress: &mut F,
    ) -> Result<()>
    where
        F: FnMut(MigrationProgress),
    {
        let mut grouped: BTreeMap<(NaiveDate, Channel), [i64; 4]> = BTreeMap::new();
        for path in sources {
            for row in read_rows(path)? {
                report.rows_read += 1;
                let Some(date) = legacy_date(&row) else {
                    skip(Table::LandingCvrDaily, path, "missing or invalid date".to_string(), report, on_progress);
                    continue;
                };
                let raw_channel = field(&row, "channel").to_lowercase();
                let Ok(channel) = raw_channel.parse::<Channel>() else {
                    skip(
                        Table::LandingCvrDaily,
                        path,
                        format!("unknown channel '{}'", raw_channel),
                        report,
                        on_progress,
                    );
                    continue;
                };

                let totals = grouped.entry((date, channel)).or_insert([0; 4]);
                for (total, metric) in totals.iter_mut().zip(COUNTER_METRICS) {
                    let value = parse_metric(field(&row, metric), path, metric);
                    *total = total.checked_add(value).unwrap_or_else(|| {
                        tracing::warn!(
                            source = %path.display(),
                            metric,
                            "landing_cvr total overflows; capped"
                        );
                        i64::MAX
                    });
                }
            }
        }

        let rows: Vec<Row> = grouped
            .iter()
            .map(|((date, channel), totals)| {
                let mut row = Row::new();
                row.insert("date".to_string(), format_iso_date(*date));
                row.insert("channel".to_string(), channel.as_str().to_string());
                for (metric, total) in COUNTER_METRICS.iter().zip(totals) {
                    row.insert(metric.to_string(), total.to_string());
                }
                row
            })
            .collect();

        report.applied = if self.dry_run {
            rows.len()
        } else {
            self.store.upsert_rows(Table::LandingCvrDaily, &rows, None)?
        };
        Ok(())
    }

    fn migrate_analytics<F>(
        &self,
        sources: &[PathBuf],
        report: &mut DatasetReport,
        on_progress: &mut F,
    ) -> Result<()>
    where
        F: FnMut(MigrationProgress),
    {
        let mut events = Vec::new();
        for path in sources {
            for row in read_rows(path)? {
                report.rows_read += 1;
                let Some(date) = legacy_date(&row) else {
                    skip(Table::AnalyticsEvents, path, "missing or invalid date".to_string(), report, on_progress);
                    continue;
                };
                events.push(AnalyticsEvent {
                    timestamp: timestamp_or_epoch(&row),
                    date,
                    event_name: field(&row, "event_name").to_string(),
                    client_id: field(&row, "client_id").to_string(),
                    channel: field(&row, "channel").to_string(),
                    language: field(&row, "language").to_string(),
                    status: field(&row, "status").to_string(),
                    payload: field(&row, "payload").to_string(),
                });
            }
        }

        report.applied = if self.dry_run {
            events.len()
        } else {
            self.store.append_log_rows(&events)?
        };
        Ok(())
    }

    /// Last write wins per natural key, in source order.
    fn migrate_keyed<F>(
        &self,
        table: Table,
        sources: &[PathBuf],
        report: &mut DatasetReport,
        on_progress: &mut F,
    ) -> Result<()>
    where
        F: FnMut(MigrationProgress),
    {
        let spec = table.spec();
        let mut by_key: BTreeMap<Vec<String>, Row> = BTreeMap::new();

        for path in sources {
            for row in read_rows(path)? {
                report.rows_read += 1;
                let Some(date) = legacy_date(&row) else {
                    skip(table, path, "missing or invalid date".to_string(), report, on_progress);
                    continue;
                };

                let mut projected: Row = spec
                    .project(&row)
                    .into_iter()
                    .map(|(k, v)| (k, v.trim().to_string()))
                    .collect();
                projected.insert("date".to_string(), format_iso_date(date));
                if table == Table::AppReviews
                    && let Some(country) = projected.get_mut("country")
                {
                    *country = country.to_uppercase();
                }

                let missing: Vec<&str> = spec
                    .required_columns
                    .iter()
                    .copied()
                    .filter(|c| projected.get(*c).is_none_or(|v| v.is_empty()))
                    .collect();
                if !missing.is_empty() {
                    skip(table, path, format!("missing {}", missing.join(", ")), report, on_progress);
                    continue;
                }

                let key = spec
                    .key_columns
                    .iter()
                    .map(|c| projected.get(*c).cloned().unwrap_or_default())
                    .collect();
                by_key.insert(key, projected);
            }
        }

        if self.dry_run {
            report.applied = by_key.len();
            return Ok(());
        }

        let rows: Vec<Row> = by_key.into_values().collect();
        report.applied = if table == Table::AppReviews {
            let reviews: Vec<AppReview> = rows.iter().map(AppReview::from_row).collect();
            self.store.upsert_reviews(&reviews)?.total
        } else {
            self.store.upsert_rows(table, &rows, None)?
        };
        Ok(())
    }
}

/// Datasets in migration order: events first, so counters and audit rows
/// follow the facts they describe.
pub fn migration_order() -> [Table; 10] {
    [
        Table::LandingEvents,
        Table::LandingCvrDaily,
        Table::AnalyticsEvents,
        Table::TripSafety,
        Table::InterviewLog,
        Table::B2bPipeline,
        Table::TripPassPricing,
        Table::GuardrailChecklist,
        Table::CommunityOutreachLog,
        Table::AppReviews,
    ]
}

/// Fragment files for one dataset: `YYYYMMDD_<file>` in `source_dir`, then
/// in `source_dir/archive`, each sorted by name, then the cumulative
/// `<file>` if present.
pub fn find_sources(source_dir: &Path, file_name: &str) -> Vec<PathBuf> {
    let suffix = format!("_{}", file_name);
    let mut matched = Vec::new();

    for dir in [source_dir.to_path_buf(), source_dir.join("archive")] {
        if !dir.is_dir() {
            continue;
        }
        let mut dated: Vec<PathBuf> = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                let name = e.file_name().to_string_lossy();
                name.ends_with(&suffix) && DATE_FILE_REGEX.is_match(&name)
            })
            .map(|e| e.into_path())
            .collect();
        dated.sort();
        matched.extend(dated);
    }

    let cumulative = source_dir.join(file_name);
    if cumulative.is_file() {
        matched.push(cumulative);
    }
    matched
}

/// Read a CSV with a header row into column->value maps.
pub fn read_rows(path: &Path) -> Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Pre-aggregated metric: empty is zero, floats are truncated, anything
/// else (including values past `i64::MAX`) counts as zero with a warning.
pub fn parse_metric(raw: &str, path: &Path, metric: &str) -> i64 {
    let text = raw.trim();
    if text.is_empty() {
        return 0;
    }
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 && value < i64::MAX as f64 => {
            value.trunc() as i64
        }
        _ => {
            tracing::warn!(
                source = %path.display(),
                metric,
                value = text,
                "invalid numeric value in landing_cvr; counted as 0"
            );
            0
        }
    }
}

fn landing_event_from_row(row: &Row) -> std::result::Result<LandingEvent, String> {
    let date = legacy_date(row).ok_or_else(|| "missing or invalid date".to_string())?;
    let session_id = field(row, "session_id");
    if session_id.is_empty() {
        return Err("missing session_id".to_string());
    }
    let channel = field(row, "channel")
        .to_lowercase()
        .parse::<Channel>()
        .map_err(|e| e.to_string())?;
    let event_type = field(row, "event_type")
        .to_lowercase()
        .parse::<EventType>()
        .map_err(|e| e.to_string())?;
    let cta_type = CtaType::parse_optional(field(row, "cta_type")).map_err(|e| e.to_string())?;
    let consent = matches!(field(row, "consent").to_lowercase().as_str(), "1" | "true");

    let mut event = LandingEvent::new(timestamp_or_epoch(row), date, session_id, channel, event_type)
        .with_language(field(row, "language"))
        .with_source(field(row, "source_id"), field(row, "post_id"))
        .with_lead(field(row, "lead_email"), consent);
    event.cta_type = cta_type;
    Ok(event)
}

fn field<'r>(row: &'r Row, column: &str) -> &'r str {
    row.get(column).map(|v| v.trim()).unwrap_or("")
}

fn legacy_date(row: &Row) -> Option<NaiveDate> {
    normalize_legacy_date(field(row, "date"))
}

fn timestamp_or_epoch(row: &Row) -> String {
    match field(row, "timestamp") {
        "" => EPOCH_TIMESTAMP.to_string(),
        ts => ts.to_string(),
    }
}

fn skip<F>(table: Table, path: &Path, reason: String, report: &mut DatasetReport, on_progress: &mut F)
where
    F: FnMut(MigrationProgress),
{
    tracing::warn!(table = %table, source = %path.display(), reason = %reason, "legacy row skipped");
    report.skipped += 1;
    on_progress(MigrationProgress::RowSkipped {
        table,
        path: path.to_path_buf(),
        reason,
    });
}
