use ktrip_types::ValidationError;
use rusqlite::ErrorCode;
use std::fmt;

/// Result type for ktrip-index operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the store layer
#[derive(Debug)]
pub enum Error {
    /// Input rejected before any write
    Validation(ValidationError),

    /// Write lock not acquired within the busy timeout; retry the whole call
    Busy(rusqlite::Error),

    /// Constraint failed despite upsert semantics: registry and schema disagree
    Constraint(rusqlite::Error),

    /// Any other database failure
    Database(rusqlite::Error),

    /// Mirror file or directory operation failed
    Io(std::io::Error),

    /// Mirror serialization failed
    Csv(csv::Error),

    /// Storage location could not be resolved or prepared
    Init(String),
}

impl Error {
    /// True for failures a caller may fix by retrying the same call later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Busy(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Validation(err) => write!(f, "Validation error: {}", err),
            Error::Busy(err) => write!(
                f,
                "Database busy: {}. Another process holds the write lock; retry the operation.",
                err
            ),
            Error::Constraint(err) => {
                write!(f, "Constraint violation (schema/registry mismatch): {}", err)
            }
            Error::Database(err) => {
                let msg = err.to_string();
                // Detect schema mismatch errors and provide actionable hint
                if msg.contains("no such column") || msg.contains("no such table") {
                    write!(
                        f,
                        "Database schema mismatch: {}. Run `ktrip init` to migrate the schema.",
                        msg
                    )
                } else {
                    write!(f, "Database error: {}", err)
                }
            }
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Csv(err) => write!(f, "CSV error: {}", err),
            Error::Init(msg) => write!(f, "Initialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Validation(err) => Some(err),
            Error::Busy(err) | Error::Constraint(err) | Error::Database(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Csv(err) => Some(err),
            Error::Init(_) => None,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => Error::Busy(err),
            Some(ErrorCode::ConstraintViolation) => Error::Constraint(err),
            _ => Error::Database(err),
        }
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::Validation(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Csv(err)
    }
}
