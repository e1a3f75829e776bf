//! Configuration (§6): the recognized options and their effects. Loading
//! these from a file or environment is a caller concern (out of scope, §1);
//! this module only models the struct `start_monitoring` receives and the
//! few environment variables §6 calls out by name.

use cylestio_patterns::PatternConfig;
use cylestio_events::HttpMethod;

pub const ENV_TELEMETRY_ENDPOINT: &str = "CYLESTIO_TELEMETRY_ENDPOINT";
pub const ENV_API_ENDPOINT: &str = "CYLESTIO_API_ENDPOINT";
pub const ENV_TEST_DB_DIR: &str = "CYLESTIO_TEST_DB_DIR";
pub const ENV_DEVELOPMENT_MODE: &str = "CYLESTIO_DEVELOPMENT_MODE";

const DEFAULT_API_ENDPOINT: &str = "http://127.0.0.1:8000/api/v1/telemetry/";
const DEFAULT_API_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Default for DebugLevel {
    fn default() -> Self {
        DebugLevel::Info
    }
}

impl DebugLevel {
    /// The `tracing`/`tracing-subscriber` filter directive for this level
    /// (ambient logging stack, shared with the rest of the workspace).
    pub fn as_filter_directive(&self) -> &'static str {
        match self {
            DebugLevel::Debug => "debug",
            DebugLevel::Info => "info",
            DebugLevel::Warning => "warn",
            DebugLevel::Error => "error",
            DebugLevel::Critical => "error",
        }
    }
}

/// `monitoring.*` and `api.*` configuration (§6).
#[derive(Debug, Clone)]
pub struct MonitoringConfig {
    pub agent_id: String,
    pub log_file: Option<String>,
    pub api_endpoint: Option<String>,
    pub api_http_method: HttpMethod,
    pub api_timeout_secs: u64,
    pub security_keywords: PatternConfig,
    pub debug_level: DebugLevel,
    pub development_mode: bool,
    pub enable_framework_patching: bool,
    pub safe_tool_patching: bool,
}

impl MonitoringConfig {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            log_file: None,
            api_endpoint: None,
            api_http_method: HttpMethod::Post,
            api_timeout_secs: DEFAULT_API_TIMEOUT_SECS,
            security_keywords: PatternConfig::default(),
            debug_level: DebugLevel::default(),
            development_mode: std::env::var(ENV_DEVELOPMENT_MODE)
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            enable_framework_patching: true,
            safe_tool_patching: false,
        }
    }

    /// Resolves the collector endpoint: explicit config, then
    /// `CYLESTIO_TELEMETRY_ENDPOINT`, then `CYLESTIO_API_ENDPOINT`, then the
    /// built-in default (§6).
    pub fn resolved_api_endpoint(&self) -> String {
        self.api_endpoint
            .clone()
            .or_else(|| std::env::var(ENV_TELEMETRY_ENDPOINT).ok())
            .or_else(|| std::env::var(ENV_API_ENDPOINT).ok())
            .unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoint_is_used_when_nothing_is_configured() {
        std::env::remove_var(ENV_TELEMETRY_ENDPOINT);
        std::env::remove_var(ENV_API_ENDPOINT);
        let config = MonitoringConfig::new("agent-1");
        assert_eq!(config.resolved_api_endpoint(), DEFAULT_API_ENDPOINT);
    }

    #[test]
    fn explicit_config_endpoint_wins_over_env() {
        std::env::set_var(ENV_API_ENDPOINT, "http://example.test/");
        let mut config = MonitoringConfig::new("agent-1");
        config.api_endpoint = Some("http://configured.test/".to_string());
        assert_eq!(config.resolved_api_endpoint(), "http://configured.test/");
        std::env::remove_var(ENV_API_ENDPOINT);
    }
}
