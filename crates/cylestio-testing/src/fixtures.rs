//! Builders for sample rows (§3 data model), used across the workspace's
//! test suites instead of repeating struct literals.

use std::collections::BTreeMap;

use chrono::Utc;
use cylestio_types::{
    AlertLevel, Channel, Event, EventSecurity, LLMCall, Level, SecurityAlert, Severity, SpanId,
    ToolCall, TraceId, Value,
};

/// A trace/span id pair built from `seed`, so callers can construct several
/// related-but-distinct ids without colliding.
pub fn trace_id(seed: u8) -> TraceId {
    TraceId::new(hex_of(seed, 32)).expect("32 lowercase hex chars")
}

pub fn span_id(seed: u8) -> SpanId {
    SpanId::new(hex_of(seed, 16)).expect("16 lowercase hex chars")
}

fn hex_of(seed: u8, len: usize) -> String {
    format!("{seed:02x}").repeat(len / 2)
}

/// A minimal, otherwise-empty `Event` row for `agent_id` (§3).
pub fn sample_event(agent_id: &str, event_type: &str, channel: Channel) -> Event {
    Event {
        id: None,
        agent_id: agent_id.to_string(),
        session_id: None,
        conversation_id: None,
        event_type: event_type.to_string(),
        channel,
        level: Level::Info,
        direction: None,
        timestamp: Utc::now(),
        trace_id: trace_id(0xaa),
        span_id: span_id(0xbb),
        parent_span_id: None,
        data: Value::Object(BTreeMap::new()),
    }
}

/// An `llm.call.finish`-shaped event plus its `LLMCall` child row.
pub fn sample_llm_call(agent_id: &str) -> (Event, LLMCall) {
    let event = sample_event(agent_id, "llm.call.finish", Channel::Llm);
    let call = LLMCall {
        event_id: 0,
        model: "claude-3-haiku".to_string(),
        prompt: Value::string("hello"),
        response: Value::string("hi there"),
        tokens_in: Some(5),
        tokens_out: Some(3),
        duration_ms: Some(120),
        is_stream: false,
        temperature: Some(0.2),
        cost: None,
    };
    (event, call)
}

/// A `tool.call.finish`-shaped event plus its `ToolCall` child row.
pub fn sample_tool_call(agent_id: &str, tool_name: &str, success: bool) -> (Event, ToolCall) {
    let event = sample_event(agent_id, "tool.call.finish", Channel::Tool);
    let call = ToolCall {
        event_id: 0,
        tool_name: tool_name.to_string(),
        input_params: Value::Object(BTreeMap::new()),
        output_result: Some(Value::string("ok")),
        success,
        error_message: if success { None } else { Some("failed".to_string()) },
        duration_ms: Some(10),
        blocking: true,
    };
    (event, call)
}

/// A `security.alert`-shaped event plus its `SecurityAlert` child row.
pub fn sample_security_alert(agent_id: &str, alert_type: &str, severity: Severity) -> (Event, SecurityAlert) {
    let mut event = sample_event(agent_id, "security.alert", Channel::Security);
    event.level = Level::Warning;
    let alert = SecurityAlert {
        event_id: 0,
        alert_type: alert_type.to_string(),
        severity,
        description: format!("{alert_type} detected"),
        matched_terms: vec!["rm -rf".to_string()],
        action_taken: None,
    };
    (event, alert)
}

/// An `EventSecurity` flag for an already-persisted event (§3).
pub fn sample_event_security(alert_level: AlertLevel) -> EventSecurity {
    EventSecurity {
        event_id: 0,
        alert_level,
        matched_terms: Some(vec!["ignore previous".to_string()]),
        reason: Some("prompt_manipulation".to_string()),
        source_field: Some("content".to_string()),
    }
}
