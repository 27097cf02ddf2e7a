// Services on top of the store: where it lives, how historical exports are
// folded back in, and how landing hits become events and counters.

pub mod config;
pub mod error;
pub mod migration;
pub mod tracking;

pub use config::{
    CONFIG_FILE_NAME, Config, DATA_DIR_ENV, StorageConfig, resolve_data_dir, resolve_location,
    resolve_location_from_env,
};
pub use error::{Error, Result};
pub use migration::{DatasetReport, LegacyMigration, MigrationProgress, MigrationReport};
pub use tracking::{LandingTracker, TrackOutcome, VisitContext, today_token};
