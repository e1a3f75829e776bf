use chrono::Utc;
use cylestio_trace::TraceContext;
use cylestio_types::{Event, EventBuilderInput, Level, Value};

use crate::sink::Sink;
use crate::serialize::cap_depth;

/// The Event Builder (§4.4): fills in whatever an [`EventBuilderInput`]
/// leaves unset from the current trace context, then ships the result to
/// every configured sink.
pub struct EventBuilder {
    sinks: Vec<Box<dyn Sink>>,
}

impl EventBuilder {
    pub fn new(sinks: Vec<Box<dyn Sink>>) -> Self {
        Self { sinks }
    }

    /// `log_event(name, attributes?, level?, span_id?, trace_id?,
    /// parent_span_id?) -> event` (§4.4).
    pub fn log_event(&self, input: EventBuilderInput) -> Event {
        let context = TraceContext::current_context();

        let (trace_id, span_id) = match (input.trace_id, input.span_id) {
            (Some(trace_id), Some(span_id)) => (trace_id, span_id),
            (trace_id, span_id) => {
                let (detached_trace, detached_span) = TraceContext::detached_span();
                (
                    trace_id.or(context.trace_id.clone()).unwrap_or(detached_trace),
                    span_id.or(context.span_id.clone()).unwrap_or(detached_span),
                )
            }
        };
        let parent_span_id = input.parent_span_id.or_else(|| {
            if context.span_id.as_ref() == Some(&span_id) {
                None
            } else {
                context.span_id.clone()
            }
        });

        let event = Event {
            id: None,
            agent_id: context.agent_id.unwrap_or_default(),
            session_id: None,
            conversation_id: None,
            event_type: input.name,
            channel: input.channel.unwrap_or_default(),
            level: input.level.unwrap_or_default(),
            direction: input.direction,
            timestamp: Utc::now(),
            trace_id,
            span_id,
            parent_span_id,
            data: input
                .attributes
                .map(|attrs| cap_depth(&attrs, 0))
                .unwrap_or(Value::Object(Default::default())),
        };

        self.dispatch(&event);
        event
    }

    /// `log_error(name, exception, attributes?)` (§4.4): adds `error.type`/
    /// `error.message` and forces `level = ERROR`.
    pub fn log_error<E: std::error::Error>(
        &self,
        name: impl Into<String>,
        error: &E,
        attributes: Option<Value>,
    ) -> Event {
        let mut map = match attributes {
            Some(Value::Object(map)) => map,
            Some(other) => {
                let mut map = std::collections::BTreeMap::new();
                map.insert("value".to_string(), other);
                map
            }
            None => std::collections::BTreeMap::new(),
        };
        map.insert("error.type".to_string(), Value::string(std::any::type_name::<E>()));
        map.insert("error.message".to_string(), Value::string(error.to_string()));

        self.log_event(
            EventBuilderInput::new(name)
                .with_level(Level::Error)
                .with_attributes(Value::Object(map)),
        )
    }

    fn dispatch(&self, event: &Event) {
        for sink in &self.sinks {
            if let Err(err) = sink.send(event) {
                tracing::error!(error = %err, event_type = %event.event_type, "sink dispatch failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Result;
    use std::sync::{Arc, Mutex};

    struct RecordingSink(Arc<Mutex<Vec<Event>>>);

    impl Sink for RecordingSink {
        fn send(&self, event: &Event) -> Result<()> {
            self.0.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    #[test]
    fn log_event_fills_ids_from_trace_context_and_dispatches() {
        TraceContext::reset();
        TraceContext::initialize_trace("agent-1");
        TraceContext::start_span("outer");

        let recorded = Arc::new(Mutex::new(Vec::new()));
        let builder = EventBuilder::new(vec![Box::new(RecordingSink(recorded.clone()))]);

        let event = builder.log_event(EventBuilderInput::new("llm.call.start"));
        assert_eq!(event.agent_id, "agent-1");
        assert!(event.parent_span_id.is_none());
        assert_eq!(recorded.lock().unwrap().len(), 1);
    }

    #[test]
    fn log_error_sets_level_and_error_attributes() {
        TraceContext::reset();
        TraceContext::initialize_trace("agent-1");

        let builder = EventBuilder::new(vec![]);
        let error = std::io::Error::other("boom");
        let event = builder.log_error("tool.call.error", &error, None);

        assert_eq!(event.level, Level::Error);
        assert_eq!(event.data.get("error.message"), Some(&Value::string("boom")));
    }

    #[test]
    fn attributes_deeper_than_the_cap_are_truncated() {
        TraceContext::reset();
        TraceContext::initialize_trace("agent-1");

        let mut nested = Value::string("leaf");
        for _ in 0..20 {
            nested = Value::Array(vec![nested]);
        }
        let builder = EventBuilder::new(vec![]);
        let event = builder.log_event(EventBuilderInput::new("x").with_attributes(nested));

        fn innermost(value: &Value) -> &Value {
            match value {
                Value::Array(items) if items.len() == 1 => innermost(&items[0]),
                other => other,
            }
        }
        assert_eq!(
            innermost(&event.data),
            &Value::Opaque("[MAX_DEPTH_EXCEEDED]".to_string())
        );
    }
}
