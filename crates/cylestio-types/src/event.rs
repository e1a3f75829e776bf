use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{SpanId, TraceId};
use crate::value::Value;
use crate::Channel;

/// Severity of an event record, independent of security `Severity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Default for Level {
    fn default() -> Self {
        Level::Info
    }
}

/// Direction of the data the event describes, when applicable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
    Internal,
}

/// The base record for all telemetry (§3, Event).
///
/// Every event carries a non-null `trace_id` and `span_id`; `parent_span_id`
/// is `None` iff the span is a trace root. Specialized rows (`LLMCall`,
/// `ToolCall`, ...) are one-to-one children keyed by `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Assigned by the store on insert; `None` until then.
    pub id: Option<i64>,
    pub agent_id: String,
    pub session_id: Option<i64>,
    pub conversation_id: Option<i64>,
    /// Dotted event name, e.g. `llm.call.start`.
    pub event_type: String,
    pub channel: Channel,
    pub level: Level,
    pub direction: Option<Direction>,
    pub timestamp: DateTime<Utc>,
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub parent_span_id: Option<SpanId>,
    pub data: Value,
}

/// Inputs accepted by the event builder (`cylestio_events::log_event`)
/// before trace context and timestamp are filled in.
#[derive(Debug, Clone, Default)]
pub struct EventBuilderInput {
    pub name: String,
    pub channel: Option<Channel>,
    pub level: Option<Level>,
    pub direction: Option<Direction>,
    pub span_id: Option<SpanId>,
    pub trace_id: Option<TraceId>,
    pub parent_span_id: Option<SpanId>,
    pub attributes: Option<Value>,
}

impl Default for Channel {
    fn default() -> Self {
        Channel::System
    }
}

impl EventBuilderInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_attributes(mut self, attributes: Value) -> Self {
        self.attributes = Some(attributes);
        self
    }
}
