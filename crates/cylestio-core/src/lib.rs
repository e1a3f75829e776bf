//! Platform path resolution shared by `cylestio-store` and `cylestio-events`.
//!
//! Kept as its own crate -- like the rest of the workspace -- so that the
//! "where do files live" policy isn't duplicated between the database
//! initializer and the file sink.

mod error;
mod paths;

pub use error::{Error, Result};
pub use paths::{expand_tilde, fallback_log_path, resolve_db_path, resolve_log_file_path};
