use serde::{Deserialize, Serialize};

use crate::value::Value;

/// The scanner's classification of a piece of text or event (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    None,
    Suspicious,
    Dangerous,
}

impl Default for AlertLevel {
    fn default() -> Self {
        AlertLevel::None
    }
}

/// Editorial priority attached to a security event, independent of
/// `AlertLevel` (the scanner's verdict) and `Level` (the event's log level).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// One-to-one child of an `Event` describing an LLM call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMCall {
    pub event_id: i64,
    pub model: String,
    pub prompt: Value,
    pub response: Value,
    pub tokens_in: Option<i64>,
    pub tokens_out: Option<i64>,
    pub duration_ms: Option<i64>,
    pub is_stream: bool,
    pub temperature: Option<f64>,
    pub cost: Option<f64>,
}

/// One-to-one child of an `Event` describing a tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub event_id: i64,
    pub tool_name: String,
    pub input_params: Value,
    pub output_result: Option<Value>,
    pub success: bool,
    pub error_message: Option<String>,
    pub duration_ms: Option<i64>,
    pub blocking: bool,
}

/// One-to-one child of an `Event` raised by the security scanner or a
/// vendor-specific detector (RCE correlator, socket/HTTP interceptors).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityAlert {
    pub event_id: i64,
    pub alert_type: String,
    pub severity: Severity,
    pub description: String,
    pub matched_terms: Vec<String>,
    pub action_taken: Option<String>,
}

/// Attached to any event the scanner flagged, regardless of event kind --
/// distinct from `SecurityAlert`, which is itself a dedicated `security.*`
/// event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSecurity {
    pub event_id: i64,
    pub alert_level: AlertLevel,
    pub matched_terms: Option<Vec<String>>,
    pub reason: Option<String>,
    pub source_field: Option<String>,
}

/// One-to-one child of an `Event` carrying resource-usage measurements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetric {
    pub event_id: i64,
    pub memory_usage: Option<i64>,
    pub cpu_usage: Option<f64>,
    pub duration_ms: Option<i64>,
    pub tokens_processed: Option<i64>,
    pub cost: Option<f64>,
}
