//! The wire/file shape of an event (§6: "Wire protocol (collector)"), kept
//! distinct from [`cylestio_types::Event`]: the relational row carries
//! foreign keys and a typed channel/direction the wire format has no use
//! for, while the wire format needs the ids and level as their string forms.

use chrono::SecondsFormat;
use cylestio_types::{Event, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireEvent {
    pub timestamp: String,
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub name: String,
    pub level: String,
    pub attributes: Value,
    pub agent_id: String,
}

impl From<&Event> for WireEvent {
    fn from(event: &Event) -> Self {
        WireEvent {
            timestamp: event.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            trace_id: event.trace_id.as_str().to_string(),
            span_id: event.span_id.as_str().to_string(),
            parent_span_id: event.parent_span_id.as_ref().map(|id| id.as_str().to_string()),
            name: event.event_type.clone(),
            level: format!("{:?}", event.level).to_uppercase(),
            attributes: event.data.clone(),
            agent_id: event.agent_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use cylestio_types::{Channel, Level, SpanId, TraceId};
    use std::collections::BTreeMap;

    #[test]
    fn wire_event_flattens_ids_to_strings() {
        let event = Event {
            id: Some(1),
            agent_id: "agent-1".to_string(),
            session_id: None,
            conversation_id: None,
            event_type: "llm.call.start".to_string(),
            channel: Channel::Llm,
            level: Level::Info,
            direction: None,
            timestamp: Utc::now(),
            trace_id: TraceId::new("a".repeat(32)).unwrap(),
            span_id: SpanId::new("b".repeat(16)).unwrap(),
            parent_span_id: None,
            data: Value::Object(BTreeMap::new()),
        };
        let wire = WireEvent::from(&event);
        assert_eq!(wire.name, "llm.call.start");
        assert_eq!(wire.level, "INFO");
        assert_eq!(wire.trace_id, "a".repeat(32));
        assert!(wire.parent_span_id.is_none());
    }
}
