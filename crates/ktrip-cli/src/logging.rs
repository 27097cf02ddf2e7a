//! Structured logging for the `ktrip` binary.
//!
//! - `RUST_LOG` filter, default `info` for the ktrip crates
//! - JSON lines when `RUST_LOG_FORMAT=json`
//! - always on stderr, stdout stays clean for JSON output

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "ktrip_index=info,ktrip_runtime=info,ktrip_cli=info";

/// Install the global subscriber. Later calls are no-ops.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let is_json = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    if is_json {
        let _ = subscriber.json().try_init();
    } else {
        let _ = subscriber.try_init();
    }
}
