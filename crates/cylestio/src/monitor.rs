//! The public control surface (§6): `start_monitoring` / `stop_monitoring` /
//! `get_api_endpoint`. Wires the Trace Context (C1), Event Builder and
//! sinks (C4/C5), the Relational Store (C6), the Security Scanner (C3), and
//! the wrapped-instance set (§5) into one handle the host application holds
//! for the lifetime of its process.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use cylestio_events::{CollectorSink, EventBuilder, FileSink};
use cylestio_intercept::WrappedInstances;
use cylestio_patterns::PatternRegistry;
use cylestio_security::{RceCorrelator, Scanner};
use cylestio_store::Store;
use cylestio_trace::TraceContext;
use cylestio_types::{Channel, EventBuilderInput};

use crate::config::MonitoringConfig;
use crate::error::{Error, Result};
use crate::store_sink::StoreSink;

/// A running monitoring session (§6 "public control surface"). Call
/// [`Monitor::stop`] to emit `monitoring.stop` deterministically; dropping
/// the handle without calling it runs the same logic via `Drop`.
pub struct Monitor {
    config: MonitoringConfig,
    events: Arc<EventBuilder>,
    store: Arc<Store>,
    wrapped: Arc<WrappedInstances>,
    stopped: bool,
}

impl Monitor {
    /// Initializes the trace context, configures the file/collector/store
    /// sinks, and emits `monitoring.start` (§6 `start_monitoring`).
    pub fn start(config: MonitoringConfig) -> Result<Self> {
        TraceContext::initialize_trace(config.agent_id.clone());
        Scanner::get_instance(Some(config.security_keywords.clone()));

        let log_path = cylestio_core::resolve_log_file_path(
            config.log_file.as_deref(),
            &config.agent_id,
            Utc::now(),
        )
        .map_err(Error::Config)?;

        let store = Arc::new(Store::initialize_database(None).map_err(Error::Store)?);

        let endpoint = config.resolved_api_endpoint();
        let mut sinks: Vec<Box<dyn cylestio_events::Sink>> = vec![
            Box::new(FileSink::new(log_path)),
            Box::new(StoreSink::new(store.clone())),
        ];
        match CollectorSink::new(
            endpoint.clone(),
            config.api_http_method,
            Duration::from_secs(config.api_timeout_secs),
        ) {
            Ok(collector) => sinks.push(Box::new(collector)),
            Err(err) => {
                tracing::warn!(error = %err, "could not construct the collector sink, continuing without it");
            }
        }

        let events = Arc::new(EventBuilder::new(sinks));
        events.log_event(
            EventBuilderInput::new("monitoring.start")
                .with_channel(Channel::System)
                .with_attributes(cylestio_types::Value::string(config.agent_id.clone())),
        );

        Ok(Self {
            config,
            events,
            store,
            wrapped: Arc::new(WrappedInstances::new()),
            stopped: false,
        })
    }

    /// Emits `monitoring.stop`, resets the trace context, and marks this
    /// handle as stopped. Safe to call more than once; later calls are a
    /// no-op (§6: the core never double-emits `monitoring.stop`).
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.events.log_event(
            EventBuilderInput::new("monitoring.stop")
                .with_channel(Channel::System)
                .with_attributes(cylestio_types::Value::string(self.config.agent_id.clone())),
        );
        TraceContext::reset();
        self.stopped = true;
    }

    pub fn get_api_endpoint(&self) -> String {
        self.config.resolved_api_endpoint()
    }

    pub fn events(&self) -> &Arc<EventBuilder> {
        &self.events
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn wrapped_instances(&self) -> &Arc<WrappedInstances> {
        &self.wrapped
    }

    pub fn scanner(&self) -> &'static Scanner {
        Scanner::get_instance(None)
    }

    pub fn pattern_registry(&self) -> &'static PatternRegistry {
        self.scanner().registry()
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Process-wide RCE correlator shared by every `Monitor` (§4.8: the
/// correlator's shell/HTTP registries are global state, not per-session).
pub fn rce_correlator() -> &'static RceCorrelator {
    static CORRELATOR: std::sync::OnceLock<RceCorrelator> = std::sync::OnceLock::new();
    CORRELATOR.get_or_init(RceCorrelator::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_emits_monitoring_start_and_stop_emits_monitoring_stop() {
        std::env::set_var(crate::config::ENV_TEST_DB_DIR, std::env::temp_dir());
        let mut monitor = Monitor::start(MonitoringConfig::new("agent-1")).unwrap();
        assert_eq!(monitor.get_api_endpoint(), "http://127.0.0.1:8000/api/v1/telemetry/");
        monitor.stop();
        std::env::remove_var(crate::config::ENV_TEST_DB_DIR);
    }
}
