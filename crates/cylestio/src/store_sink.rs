//! Bridges the event pipeline (C4/C5) to the relational store (C6): every
//! event handed to the builder is also persisted as a generic row (§2 data
//! flow: "event is handed to C5 (file + collector) and C6"). Specialized
//! child rows (`LLMCall`, `ToolCall`, `SecurityAlert`, `PerformanceMetric`)
//! are written directly by callers that have the richer, typed payload --
//! this sink only ever produces the generic `events` row.

use std::sync::Arc;

use cylestio_events::Sink;
use cylestio_store::Store;
use cylestio_types::Event;

pub struct StoreSink {
    store: Arc<Store>,
}

impl StoreSink {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

impl Sink for StoreSink {
    fn send(&self, event: &Event) -> cylestio_events::Result<()> {
        let mut owned = event.clone();
        cylestio_store::log_event_generic(&self.store, &mut owned, None)
            .map(|_| ())
            .map_err(|err| std::io::Error::other(err.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cylestio_types::{Channel, Level, SpanId, TraceId, Value};
    use std::collections::BTreeMap;

    #[test]
    fn persists_a_generic_event_row() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let sink = StoreSink::new(store.clone());

        let event = Event {
            id: None,
            agent_id: "agent-1".to_string(),
            session_id: None,
            conversation_id: None,
            event_type: "tool.call.start".to_string(),
            channel: Channel::Tool,
            level: Level::Info,
            direction: None,
            timestamp: chrono::Utc::now(),
            trace_id: TraceId::new("a".repeat(32)).unwrap(),
            span_id: SpanId::new("b".repeat(16)).unwrap(),
            parent_span_id: None,
            data: Value::Object(BTreeMap::new()),
        };

        sink.send(&event).unwrap();
        let events = cylestio_store::list_events(&store, &Default::default(), &Default::default()).unwrap();
        assert_eq!(events.len(), 1);
    }
}
