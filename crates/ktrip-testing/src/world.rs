//! TestWorld pattern for declarative integration test setup.
//!
//! Provides a fluent interface for:
//! - Creating isolated test environments
//! - Placing legacy CSV fragments and config files
//! - Executing CLI commands with proper context
//! - Reading back mirror files

use anyhow::{Context, Result};
use assert_cmd::Command;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::fixtures;

/// Environment variable the CLI reads for its data directory.
const DATA_DIR_ENV: &str = "KTRIPPEDIA_DATA_DIR";

/// Declarative test environment builder.
///
/// # Example
/// ```no_run
/// use ktrip_testing::TestWorld;
///
/// let world = TestWorld::new().with_legacy_export();
/// assert!(world.legacy_dir().join("landing_cvr.csv").exists());
/// ```
pub struct TestWorld {
    temp_dir: TempDir,
    cwd: PathBuf,
    data_dir: PathBuf,
    legacy_dir: PathBuf,
    env_vars: HashMap<String, String>,
    pass_data_dir: bool,
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorld {
    /// Create a new isolated test environment.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base_path = temp_dir.path().to_path_buf();
        let data_dir = base_path.join("data");
        let legacy_dir = base_path.join("legacy");

        std::fs::create_dir_all(&legacy_dir).expect("Failed to create legacy dir");

        Self {
            cwd: base_path,
            temp_dir,
            data_dir,
            legacy_dir,
            env_vars: HashMap::new(),
            pass_data_dir: true,
        }
    }

    /// Data directory handed to the CLI (database and mirrors).
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Directory holding legacy fragments for `migrate`.
    pub fn legacy_dir(&self) -> &Path {
        &self.legacy_dir
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("ktrippedia.db")
    }

    pub fn mirror_path(&self, file_name: &str) -> PathBuf {
        self.data_dir.join(file_name)
    }

    /// Change the current working directory (relative to temp root).
    pub fn enter_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        let new_cwd = if path.as_ref().is_absolute() {
            path.as_ref().to_path_buf()
        } else {
            self.temp_dir.path().join(path)
        };

        std::fs::create_dir_all(&new_cwd).expect("Failed to create directory");
        self.cwd = new_cwd;
        self
    }

    /// Set an environment variable for CLI execution.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    /// Leave `--data-dir` off so resolution falls through to env, config or
    /// `./data`.
    pub fn without_data_dir_flag(mut self) -> Self {
        self.pass_data_dir = false;
        self
    }

    /// Place one fragment under the legacy directory.
    pub fn with_fragment(self, name: &str, content: &str) -> Self {
        fixtures::write_fragment(&self.legacy_dir, name, content)
            .expect("Failed to write fragment");
        self
    }

    /// Place the full legacy fixture set.
    pub fn with_legacy_export(self) -> Self {
        fixtures::write_legacy_export(&self.legacy_dir).expect("Failed to write legacy export");
        self
    }

    /// Write `ktrip.toml` in the current working directory.
    pub fn with_config(self, toml: &str) -> Self {
        std::fs::write(self.cwd.join("ktrip.toml"), toml).expect("Failed to write config");
        self
    }

    /// Configure a CLI command with this test environment's settings.
    ///
    /// The caller must provide the base command (e.g., from `cargo_bin_cmd!("ktrip")`).
    pub fn configure_command<'a>(&self, cmd: &'a mut Command) -> &'a mut Command {
        if self.pass_data_dir {
            cmd.arg("--data-dir").arg(self.data_dir());
        }

        cmd.current_dir(&self.cwd);
        // never inherit the developer's data dir
        cmd.env_remove(DATA_DIR_ENV);
        cmd.env_remove("RUST_LOG");

        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }

        cmd
    }

    /// Mirror file as records, header first.
    pub fn read_mirror(&self, file_name: &str) -> Result<Vec<Vec<String>>> {
        let path = self.mirror_path(file_name);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(&path)
            .with_context(|| format!("Failed to open mirror {}", path.display()))?;

        let mut records = Vec::new();
        for record in reader.records() {
            records.push(record?.iter().map(str::to_string).collect());
        }
        Ok(records)
    }
}
