use std::fmt;

/// Result type alias for facade operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from initializing or tearing down a [`crate::Monitor`] (§7:
/// "Configuration/initialization errors: returned as a structured result").
#[derive(Debug)]
pub enum Error {
    /// Path resolution (log file, database) failed.
    Config(cylestio_core::Error),
    /// The relational store could not be opened or migrated.
    Store(cylestio_store::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(err) => write!(f, "{err}"),
            Error::Store(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(err) => Some(err),
            Error::Store(err) => Some(err),
        }
    }
}
