use std::fmt;

/// Result type for ktrip-types operations
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Input rejected before anything touches the store.
///
/// Every variant aborts the whole call it was raised from; callers fix the
/// input and retry, there is nothing transient about these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Date is not a valid `YYYY-MM-DD` calendar date
    InvalidDate(String),

    /// Date token is not a valid `YYYYMMDD` calendar date
    InvalidDateToken(String),

    /// Table name is not part of the registry
    UnknownTable(String),

    /// Column is not registered for the table
    UnknownColumn { table: String, column: String },

    /// Counter field outside the fixed counter set
    UnsupportedField(String),

    UnknownChannel(String),

    UnknownEventType(String),

    UnknownCtaType(String),

    /// Identity columns absent or blank
    MissingIdentity { table: String, fields: Vec<String> },

    /// Numeric column holds something other than a non-negative integer
    InvalidNumber { column: String, value: String },

    InvalidEmail(String),

    MissingSessionId,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidDate(value) => {
                write!(f, "invalid date '{}': expected YYYY-MM-DD", value)
            }
            ValidationError::InvalidDateToken(value) => {
                write!(f, "invalid date token '{}': expected YYYYMMDD", value)
            }
            ValidationError::UnknownTable(name) => write!(f, "unknown table: {}", name),
            ValidationError::UnknownColumn { table, column } => {
                write!(f, "unknown column '{}' for table {}", column, table)
            }
            ValidationError::UnsupportedField(name) => {
                write!(f, "unsupported counter field: {}", name)
            }
            ValidationError::UnknownChannel(name) => write!(f, "unknown channel: {}", name),
            ValidationError::UnknownEventType(name) => write!(f, "unknown event type: {}", name),
            ValidationError::UnknownCtaType(name) => write!(f, "unsupported cta type: {}", name),
            ValidationError::MissingIdentity { table, fields } => write!(
                f,
                "missing identity for {}: {} required",
                table,
                fields.join(", ")
            ),
            ValidationError::InvalidNumber { column, value } => write!(
                f,
                "invalid value '{}' for {}: expected a non-negative integer",
                value, column
            ),
            ValidationError::InvalidEmail(value) => {
                write!(f, "lead email must be a valid email address: '{}'", value)
            }
            ValidationError::MissingSessionId => write!(f, "session id is required"),
        }
    }
}

impl std::error::Error for ValidationError {}
