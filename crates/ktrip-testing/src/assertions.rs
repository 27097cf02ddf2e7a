//! Custom assertions for ktrip-specific validation.
//!
//! Provides high-level assertions that make tests more readable:
//! - Mirror row counts and header checks
//! - Lead email pseudonymization
//! - Leftover temp files from interrupted exports
//! - JSON output checks

use anyhow::{Context, Result};
use ktrip_types::is_pseudonymized;
use serde_json::Value;
use std::path::Path;
use walkdir::WalkDir;

/// Assert a mirror (header first) holds `expected` data rows.
pub fn assert_mirror_row_count(records: &[Vec<String>], expected: usize) -> Result<()> {
    if records.is_empty() {
        anyhow::bail!("Mirror has no header");
    }
    let rows = records.len() - 1;
    if rows != expected {
        anyhow::bail!("Expected {} mirror rows, got {}", expected, rows);
    }
    Ok(())
}

/// Assert every `lead_email` value in a landing mirror is empty or hashed.
pub fn assert_lead_emails_pseudonymized(records: &[Vec<String>]) -> Result<()> {
    let header = records.first().context("Mirror has no header")?;
    let column = header
        .iter()
        .position(|h| h == "lead_email")
        .context("Mirror has no lead_email column")?;

    for (i, record) in records.iter().enumerate().skip(1) {
        let value = record.get(column).map(String::as_str).unwrap_or("");
        if !value.is_empty() && !is_pseudonymized(value) {
            anyhow::bail!("Row {} holds a plaintext lead email: {}", i, value);
        }
    }
    Ok(())
}

/// Assert no `*.tmp` file is left anywhere under `dir`.
pub fn assert_no_temp_files(dir: &Path) -> Result<()> {
    let leftovers: Vec<String> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().display().to_string())
        .filter(|p| p.ends_with(".tmp"))
        .collect();

    if !leftovers.is_empty() {
        anyhow::bail!("Temp files left behind: {}", leftovers.join(", "));
    }
    Ok(())
}

/// Assert the `status` JSON reports `expected` rows for `table`.
pub fn assert_table_rows(json: &Value, table: &str, expected: u64) -> Result<()> {
    let tables = json["tables"]
        .as_array()
        .context("Expected 'tables' array in JSON")?;

    let entry = tables
        .iter()
        .find(|t| t["table"] == table)
        .with_context(|| format!("Table {} missing from status", table))?;
    let rows = entry["rows"]
        .as_u64()
        .with_context(|| format!("Table {} has no row count", table))?;

    if rows != expected {
        anyhow::bail!("Expected {} rows in {}, got {}", expected, table, rows);
    }
    Ok(())
}
