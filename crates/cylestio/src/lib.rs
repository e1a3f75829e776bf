//! In-process observability and security agent for AI applications (§1).
//!
//! This crate is the public control surface (§6): it wires the Trace
//! Context, Event Pipeline, Security Detection Engine, Interception
//! Framework, and Relational Store crates together behind
//! [`start_monitoring`]/[`Monitor::stop`]/[`Monitor::get_api_endpoint`].
//! Reading configuration from a file, CLI entry points, and the collector
//! backend itself are out of scope (§1); this crate only consumes an
//! already-built [`MonitoringConfig`].

mod config;
mod error;
mod monitor;
mod store_sink;

pub use config::{DebugLevel, MonitoringConfig};
pub use error::{Error, Result};
pub use monitor::{rce_correlator, Monitor};

/// Initializes monitoring for the agent named in `config` (§6
/// `start_monitoring`). Returns a [`Monitor`] handle; dropping it (or
/// calling [`Monitor::stop`] explicitly) emits `monitoring.stop`.
pub fn start_monitoring(config: MonitoringConfig) -> Result<Monitor> {
    Monitor::start(config)
}
