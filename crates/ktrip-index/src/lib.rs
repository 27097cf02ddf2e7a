// SQLite source of truth with CSV mirrors
// One file-backed database per storage location; every write re-exports
// the affected table.

mod db;
pub mod error;
mod location;
mod mirror;
mod queries;
mod registry;
mod schema;
mod store;
mod traits;

// Public API
pub use db::Database;
pub use error::{Error, Result};
pub use location::{DB_FILE_NAME, DEFAULT_BUSY_TIMEOUT, StorageLocation, StoreOptions};
pub use mirror::CsvMirror;
pub use registry::{ColumnKind, LANDING_EVENT_KEY, Table, TableSpec, parse_count};
pub use schema::{DEDUP_INDEX, SCHEMA_VERSION, schema_version};
pub use store::Store;
pub use traits::{MirrorExporter, RecordStore, SchemaManager};
