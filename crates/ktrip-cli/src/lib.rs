// NOTE: ktrip command layout
//
// Every command resolves the storage location the same way (flag, env,
// config file, ./data) through `ExecutionContext`, then talks to the store
// only through `RecordStore`. Output meant for scripts (`fetch`, `status`)
// is JSON on stdout; progress and logs go to stderr.

mod args;
mod commands;
mod context;
mod handlers;
pub mod logging;

pub use args::{Cli, Commands, TrackCommand, VisitArgs};
pub use commands::{EX_TEMPFAIL, exit_code, render_error, run};
pub use context::ExecutionContext;
