use std::fmt;

/// Result type for cylestio-types operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while constructing or validating the data model.
#[derive(Debug)]
pub enum Error {
    /// A trace/span identifier failed its shape check.
    InvalidId(String),
    /// A row failed a write-time validation rule (§3 of the data model).
    Validation(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidId(msg) => write!(f, "invalid id: {}", msg),
            Error::Validation(msg) => write!(f, "validation error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
