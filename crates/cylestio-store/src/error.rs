use std::fmt;

/// Result type for cylestio-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the relational store.
#[derive(Debug)]
pub enum Error {
    /// A SQLite operation failed.
    Database(rusqlite::Error),
    /// Acquiring a pooled connection failed (pool exhausted or timed out).
    Pool(r2d2::Error),
    /// An IO operation failed (path creation, backup copy).
    Io(std::io::Error),
    /// A row failed write-time validation (§3 of the data model).
    Validation(cylestio_types::Error),
    /// `reset_database` was called without `force=true`.
    ResetRefused,
    /// Anything else specific to a query (not found, invalid input).
    Query(String),
    /// A `Value` column failed to (de)serialize to/from its JSON column.
    Serde(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Database(err) => write!(f, "database error: {err}"),
            Error::Pool(err) => write!(f, "connection pool error: {err}"),
            Error::Io(err) => write!(f, "io error: {err}"),
            Error::Validation(err) => write!(f, "validation error: {err}"),
            Error::ResetRefused => write!(f, "reset_database refused: force was not set"),
            Error::Query(msg) => write!(f, "query error: {msg}"),
            Error::Serde(err) => write!(f, "serialization error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Database(err) => Some(err),
            Error::Pool(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Validation(err) => Some(err),
            Error::Serde(err) => Some(err),
            Error::ResetRefused | Error::Query(_) => None,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(err)
    }
}

impl From<r2d2::Error> for Error {
    fn from(err: r2d2::Error) -> Self {
        Error::Pool(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<cylestio_types::Error> for Error {
    fn from(err: cylestio_types::Error) -> Self {
        Error::Validation(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err)
    }
}
