//! Core data model shared by every layer of the cylestio observability agent.
//!
//! This crate owns the shapes that flow through the pipeline end to end: the
//! trace/span identifiers attached to every event, the dynamically-typed
//! [`Value`] used for safe serialization of arbitrary host payloads, the
//! `Event` envelope, and the specialized rows (`LLMCall`, `ToolCall`,
//! `SecurityAlert`, `EventSecurity`, `PerformanceMetric`) that attach to it
//! one-to-one. Nothing here touches I/O; that is left to `cylestio-store` and
//! `cylestio-events`.

mod agent;
mod conversation;
mod error;
mod event;
mod ids;
mod rows;
mod session;
mod validation;
mod value;

pub use agent::Agent;
pub use conversation::Conversation;
pub use error::{Error, Result};
pub use event::{Direction, Event, EventBuilderInput, Level};
pub use ids::{SpanId, TraceId};
pub use rows::{
    AlertLevel, EventSecurity, LLMCall, PerformanceMetric, Severity, SecurityAlert, ToolCall,
};
pub use session::Session;
pub use validation::{validate_event, validate_llm_call, validate_performance_metric};
pub use value::Value;

/// Channel an event was observed on.
///
/// Maps to the `channel` column on `events`. `Other` is the escape hatch for
/// adapters that haven't been given a dedicated variant yet; it still
/// round-trips through serde rather than failing closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Channel {
    Llm,
    Tool,
    System,
    Security,
    Network,
    Other,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Llm => "LLM",
            Channel::Tool => "TOOL",
            Channel::System => "SYSTEM",
            Channel::Security => "SECURITY",
            Channel::Network => "NETWORK",
            Channel::Other => "OTHER",
        }
    }
}
