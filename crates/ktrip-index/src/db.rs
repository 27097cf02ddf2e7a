use rusqlite::{Connection, OpenFlags};
use std::fs;
use std::sync::Mutex;

use crate::location::{StorageLocation, StoreOptions};
use crate::schema;
use crate::traits::SchemaManager;
use crate::{Error, Result};

/// Handle on one storage location.
///
/// Readiness is tracked per handle, so two handles on different locations
/// never share state.
#[derive(Debug)]
pub struct Database {
    location: StorageLocation,
    options: StoreOptions,
    ready: Mutex<bool>,
}

impl Database {
    /// Open a location with default options, creating directories and the
    /// schema as needed.
    pub fn open(location: StorageLocation) -> Result<Self> {
        Self::open_with(location, StoreOptions::default())
    }

    pub fn open_with(location: StorageLocation, options: StoreOptions) -> Result<Self> {
        if location.db_path.as_os_str().is_empty() {
            return Err(Error::Init("database path is empty".to_string()));
        }
        if let Some(parent) = location.db_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir_all(&location.mirror_dir)?;

        let db = Self {
            location,
            options,
            ready: Mutex::new(false),
        };
        db.ensure_ready()?;
        Ok(db)
    }

    pub fn location(&self) -> &StorageLocation {
        &self.location
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    fn open_connection(&self) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            &self.location.db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX
                | OpenFlags::SQLITE_OPEN_URI,
        )?;
        conn.busy_timeout(self.options.busy_timeout)?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(conn)
    }
}

impl SchemaManager for Database {
    fn ensure_ready(&self) -> Result<()> {
        let mut ready = self.ready.lock().unwrap_or_else(|p| p.into_inner());
        if *ready {
            return Ok(());
        }

        let mut conn = self.open_connection()?;
        schema::ensure_schema(&mut conn)?;
        *ready = true;

        tracing::debug!(db = %self.location.db_path.display(), "schema ready");
        Ok(())
    }

    fn connection(&self) -> Result<Connection> {
        self.ensure_ready()?;
        self.open_connection()
    }
}
