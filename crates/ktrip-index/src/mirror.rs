use rusqlite::Connection;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::queries::rows;
use crate::traits::MirrorExporter;
use crate::{Result, Table};

// Held across both the snapshot read and the file swap, so an export that
// started earlier can never replace a newer snapshot within this process.
static EXPORT_LOCK: Mutex<()> = Mutex::new(());

/// CSV mirror files in one directory, one per registered table.
#[derive(Debug, Clone)]
pub struct CsvMirror {
    dir: PathBuf,
}

impl CsvMirror {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl MirrorExporter for CsvMirror {
    fn mirror_path(&self, table: Table) -> PathBuf {
        self.dir.join(table.spec().mirror_file)
    }

    fn export_table(&self, conn: &Connection, table: Table) -> Result<PathBuf> {
        let _guard = EXPORT_LOCK.lock().unwrap_or_else(|p| p.into_inner());

        let spec = table.spec();
        let records = rows::select_all_text(conn, spec, spec.mirror_columns)?;
        let dest = self.mirror_path(table);
        write_atomic(&dest, spec.mirror_columns, &records)?;

        tracing::debug!(table = %table, rows = records.len(), path = %dest.display(), "mirror exported");
        Ok(dest)
    }
}

/// Write header and rows to a sibling temp file, fsync, then rename over
/// `dest`. Readers see either the old file or the new one.
fn write_atomic(dest: &Path, header: &[&str], records: &[Vec<String>]) -> Result<()> {
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let stem = dest
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mirror".to_string());

    let mut tmp = tempfile::Builder::new()
        .prefix(&format!("{}.", stem))
        .suffix(".tmp")
        .tempfile_in(dir)?;

    {
        let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
        writer.write_record(header)?;
        for record in records {
            writer.write_record(record)?;
        }
        writer.flush()?;
    }
    tmp.as_file_mut().flush()?;
    tmp.as_file().sync_all()?;

    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_replaces_and_leaves_no_temp_files() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("trip_safety.csv");
        fs::write(&dest, "stale\n").unwrap();

        write_atomic(
            &dest,
            &["scenario_id", "date"],
            &[vec!["S1".to_string(), "2026-02-16".to_string()]],
        )
        .unwrap();

        assert_eq!(
            fs::read_to_string(&dest).unwrap(),
            "scenario_id,date\nS1,2026-02-16\n"
        );
        let leftovers: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_write_atomic_quotes_fields() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("interview_log.csv");

        write_atomic(
            &dest,
            &["interview_id", "quote"],
            &[vec!["I1".to_string(), "menu, allergens \"unclear\"".to_string()]],
        )
        .unwrap();

        insta::assert_snapshot!(fs::read_to_string(&dest).unwrap(), @r#"
        interview_id,quote
        I1,"menu, allergens ""unclear"""
        "#);
    }
}
