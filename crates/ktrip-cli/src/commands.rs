use super::args::{Cli, Commands, TrackCommand};
use super::context::ExecutionContext;
use super::handlers;
use anyhow::Result;

/// Exit status for errors worth retrying (sysexits.h `EX_TEMPFAIL`).
pub const EX_TEMPFAIL: i32 = 75;

pub fn run(cli: Cli) -> Result<()> {
    let ctx = ExecutionContext::new(cli.data_dir, cli.config);

    match cli.command {
        Commands::Init { write_config } => handlers::init::handle(&ctx, write_config),

        Commands::Migrate {
            source_dir,
            dry_run,
        } => handlers::migrate::handle(&ctx, source_dir, dry_run),

        Commands::Export { table } => handlers::export::handle(&ctx, table.as_deref()),

        Commands::Fetch { table, date } => handlers::fetch::handle(&ctx, &table, &date),

        Commands::Track { command } => match command {
            TrackCommand::Visit { visit } => handlers::track::visit(&ctx, &visit),
            TrackCommand::Cta { visit, cta } => handlers::track::cta(&ctx, &visit, &cta),
            TrackCommand::Lead {
                visit,
                email,
                consent,
            } => handlers::track::lead(&ctx, &visit, &email, consent),
        },

        Commands::Status => handlers::status::handle(&ctx),
    }
}

/// `EX_TEMPFAIL` when a lock timeout sits anywhere in the error chain, 1
/// otherwise.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    let retryable = err.chain().any(|cause| {
        cause
            .downcast_ref::<ktrip_runtime::Error>()
            .is_some_and(|e| e.is_retryable())
            || cause
                .downcast_ref::<ktrip_index::Error>()
                .is_some_and(|e| e.is_retryable())
    });

    if retryable { EX_TEMPFAIL } else { 1 }
}

/// One line for the error chain. Wrapper errors repeat their cause's text, so
/// causes already shown are left out.
pub fn render_error(err: &anyhow::Error) -> String {
    let mut out = String::new();
    for cause in err.chain() {
        let message = cause.to_string();
        if out.contains(&message) {
            continue;
        }
        if !out.is_empty() {
            out.push_str(": ");
        }
        out.push_str(&message);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use ktrip_types::ValidationError;

    fn busy() -> ktrip_index::Error {
        ktrip_index::Error::from(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            Some("database is locked".to_string()),
        ))
    }

    #[test]
    fn test_busy_is_tempfail() {
        let err = anyhow::Error::from(busy()).context("Failed to record visit");
        assert_eq!(exit_code(&err), EX_TEMPFAIL);
    }

    #[test]
    fn test_busy_through_runtime_error() {
        let result: std::result::Result<(), _> = Err(ktrip_runtime::Error::Index(busy()));
        let err = result.context("Migration failed").unwrap_err();
        assert_eq!(exit_code(&err), EX_TEMPFAIL);
    }

    #[test]
    fn test_validation_is_plain_failure() {
        let err = anyhow::Error::from(ValidationError::MissingSessionId);
        assert_eq!(exit_code(&err), 1);
    }

    #[test]
    fn test_render_error_skips_repeated_causes() {
        let err = anyhow::Error::from(ktrip_runtime::Error::from(
            ValidationError::MissingSessionId,
        ));
        assert_eq!(
            render_error(&err),
            "Validation error: session id is required"
        );

        let err = anyhow::Error::from(ktrip_runtime::Error::Config(
            "config file not found: /x.toml".to_string(),
        ))
        .context("Failed to load configuration");
        assert_eq!(
            render_error(&err),
            "Failed to load configuration: Configuration error: config file not found: /x.toml"
        );
    }
}
