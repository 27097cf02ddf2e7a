use anyhow::{Context, Result};
use ktrip_index::{StorageLocation, Store};
use ktrip_runtime::{Config, resolve_location_from_env};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

/// Lazily resolved config, location and store for one command.
pub struct ExecutionContext {
    data_dir: Option<String>,
    config_path: Option<PathBuf>,
    cwd: Option<PathBuf>,
    config: OnceCell<Config>,
    location: OnceCell<StorageLocation>,
    store: OnceCell<Store>,
}

impl ExecutionContext {
    pub fn new(data_dir: Option<String>, config_path: Option<PathBuf>) -> Self {
        Self {
            data_dir,
            config_path,
            cwd: std::env::current_dir().ok(),
            config: OnceCell::new(),
            location: OnceCell::new(),
            store: OnceCell::new(),
        }
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    pub fn config(&self) -> Result<&Config> {
        self.config.get_or_try_init(|| {
            Config::discover(self.config_path.as_deref(), self.cwd.as_deref())
                .context("Failed to load configuration")
        })
    }

    pub fn location(&self) -> Result<&StorageLocation> {
        self.location.get_or_try_init(|| {
            let config = self.config()?;
            Ok(resolve_location_from_env(self.data_dir.as_deref(), config)?)
        })
    }

    /// Directory holding the database file.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let location = self.location()?;
        Ok(location
            .db_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default())
    }

    /// Opening the store creates the directories and brings the schema up
    /// to date.
    pub fn store(&self) -> Result<&Store> {
        self.store.get_or_try_init(|| {
            let location = self.location()?.clone();
            let options = self.config()?.store_options();
            let db_path = location.db_path.clone();
            Store::open_with(location, options)
                .with_context(|| format!("Failed to open store at {}", db_path.display()))
        })
    }
}
