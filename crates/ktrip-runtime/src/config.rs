use ktrip_index::{StorageLocation, StoreOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Error, Result};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "KTRIPPEDIA_DATA_DIR";

/// Config file looked up in the working directory when none is given.
pub const CONFIG_FILE_NAME: &str = "ktrip.toml";

/// Data directory used when nothing else is configured, relative to the
/// working directory.
pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,

    /// Mirrors go here instead of the data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror_dir: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub busy_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path(cwd: &Path) -> PathBuf {
        cwd.join(CONFIG_FILE_NAME)
    }

    pub fn store_options(&self) -> StoreOptions {
        match self.storage.busy_timeout_ms {
            Some(ms) => StoreOptions {
                busy_timeout: Duration::from_millis(ms),
            },
            None => StoreOptions::default(),
        }
    }
}

/// Resolve the data directory based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. KTRIPPEDIA_DATA_DIR value, ignored when blank
/// 3. `storage.data_dir` from the config file
/// 4. `./data` under the working directory
///
/// The environment value is passed in rather than read here so callers and
/// tests control it.
pub fn resolve_data_dir(
    explicit: Option<&str>,
    env_value: Option<&str>,
    config: &Config,
    cwd: Option<&Path>,
) -> Result<PathBuf> {
    // Priority 1: Explicit path
    if let Some(path) = explicit.filter(|p| !p.trim().is_empty()) {
        return Ok(expand_tilde(path.trim()));
    }

    // Priority 2: environment variable
    if let Some(path) = env_value.filter(|p| !p.trim().is_empty()) {
        return Ok(expand_tilde(path.trim()));
    }

    // Priority 3: config file
    if let Some(path) = config
        .storage
        .data_dir
        .as_deref()
        .filter(|p| !p.trim().is_empty())
    {
        return Ok(expand_tilde(path.trim()));
    }

    // Priority 4: ./data
    match cwd {
        Some(cwd) => Ok(cwd.join(DEFAULT_DATA_DIR)),
        None => Err(ktrip_index::Error::Init(
            "could not determine data directory: no explicit path, no KTRIPPEDIA_DATA_DIR, \
             no storage.data_dir and no working directory"
                .to_string(),
        )
        .into()),
    }
}

/// Full storage location: the resolved data directory plus the optional
/// mirror override from the config.
pub fn resolve_location(
    explicit: Option<&str>,
    env_value: Option<&str>,
    config: &Config,
    cwd: Option<&Path>,
) -> Result<StorageLocation> {
    let data_dir = resolve_data_dir(explicit, env_value, config, cwd)?;
    let location = StorageLocation::in_dir(data_dir);

    Ok(match config.storage.mirror_dir.as_deref() {
        Some(dir) if !dir.trim().is_empty() => location.with_mirror_dir(expand_tilde(dir.trim())),
        _ => location,
    })
}

/// Resolve against the real process environment.
pub fn resolve_location_from_env(
    explicit: Option<&str>,
    config: &Config,
) -> Result<StorageLocation> {
    let env_value = std::env::var(DATA_DIR_ENV).ok();
    let cwd = std::env::current_dir().ok();
    resolve_location(explicit, env_value.as_deref(), config, cwd.as_deref())
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}

impl Config {
    /// Load `explicit` if given (it must exist), else `ktrip.toml` in `cwd`
    /// when present, else defaults.
    pub fn discover(explicit: Option<&Path>, cwd: Option<&Path>) -> Result<Self> {
        match (explicit, cwd) {
            (Some(path), _) if !path.exists() => Err(Error::Config(format!(
                "config file not found: {}",
                path.display()
            ))),
            (Some(path), _) => Self::load_from(path),
            (None, Some(cwd)) => Self::load_from(&Self::default_path(cwd)),
            (None, None) => Ok(Self::default()),
        }
    }
}
