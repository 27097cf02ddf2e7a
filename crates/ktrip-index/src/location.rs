use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::Table;

/// Database file name inside the data directory.
pub const DB_FILE_NAME: &str = "ktrippedia.db";

/// Default wait for the SQLite write lock.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Where one store lives: the database file and the mirror directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLocation {
    pub db_path: PathBuf,
    pub mirror_dir: PathBuf,
}

impl StorageLocation {
    /// Database and mirrors side by side in `data_dir`.
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            db_path: data_dir.join(DB_FILE_NAME),
            mirror_dir: data_dir.to_path_buf(),
        }
    }

    pub fn with_mirror_dir(mut self, mirror_dir: impl Into<PathBuf>) -> Self {
        self.mirror_dir = mirror_dir.into();
        self
    }

    pub fn mirror_path(&self, table: Table) -> PathBuf {
        self.mirror_dir.join(table.spec().mirror_file)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    pub busy_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}
