//! The uniform instrument-around pattern (§4.7): every adapter in this crate
//! funnels its wrapped call through [`instrument`], which owns the span
//! lifecycle and the start/finish/error event triple. Adapters only supply
//! the category/operation name, the request-side attributes, and a closure
//! that turns a successful response into its own attributes.

use std::collections::BTreeMap;
use std::time::Instant;

use cylestio_events::EventBuilder;
use cylestio_trace::{SpanInfo, TraceContext};
use cylestio_types::{Channel, EventBuilderInput, Level, Value};

fn event_input(span: &SpanInfo, name: String, channel: Channel, attributes: Value) -> EventBuilderInput {
    let mut input = EventBuilderInput::new(name).with_channel(channel).with_attributes(attributes);
    input.trace_id = Some(span.trace_id.clone());
    input.span_id = Some(span.span_id.clone());
    input.parent_span_id = span.parent_span_id.clone();
    input
}

fn with_duration(mut attrs: Value, duration_ms: i64) -> Value {
    if let Value::Object(ref mut map) = attrs {
        map.insert("duration_ms".to_string(), Value::Number(duration_ms.into()));
        attrs
    } else {
        let mut map = BTreeMap::new();
        map.insert("value".to_string(), attrs);
        map.insert("duration_ms".to_string(), Value::Number(duration_ms.into()));
        Value::Object(map)
    }
}

/// Runs `call` wrapped in a `category.operation` span (§4.7 steps 1-7).
/// `on_success` builds the finish event's attributes from the call's
/// result; errors get a generic `error.type`/`error.message` pair and the
/// original error is always returned unchanged (the invariant in §4.7: "the
/// wrapper must not alter return values, raised errors, ...").
pub fn instrument<R, E>(
    events: &EventBuilder,
    channel: Channel,
    category: &str,
    operation: &str,
    request_attributes: Value,
    call: impl FnOnce() -> Result<R, E>,
    on_success: impl FnOnce(&R) -> Value,
) -> Result<R, E>
where
    E: std::error::Error,
{
    let span = TraceContext::start_span(format!("{category}.{operation}"));
    events.log_event(event_input(
        &span,
        format!("{category}.{operation}.start"),
        channel,
        request_attributes,
    ));

    let started = Instant::now();
    let outcome = call();
    let duration_ms = started.elapsed().as_millis() as i64;

    let result = match outcome {
        Ok(value) => {
            let attrs = with_duration(on_success(&value), duration_ms);
            events.log_event(event_input(
                &span,
                format!("{category}.{operation}.finish"),
                channel,
                attrs,
            ));
            Ok(value)
        }
        Err(err) => {
            let mut attrs = BTreeMap::new();
            attrs.insert("error.type".to_string(), Value::string(std::any::type_name::<E>()));
            attrs.insert("error.message".to_string(), Value::string(err.to_string()));
            let mut input = event_input(
                &span,
                format!("{category}.{operation}.error"),
                channel,
                with_duration(Value::Object(attrs), duration_ms),
            );
            input.level = Some(Level::Error);
            events.log_event(input);
            Err(err)
        }
    };

    TraceContext::end_span();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use cylestio_types::Value;

    #[derive(Debug)]
    struct BoomError;
    impl std::fmt::Display for BoomError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "boom")
        }
    }
    impl std::error::Error for BoomError {}

    #[test]
    fn success_path_does_not_alter_the_return_value() {
        TraceContext::reset();
        TraceContext::initialize_trace("agent-1");
        let events = EventBuilder::new(vec![]);

        let result: Result<i32, BoomError> = instrument(
            &events,
            Channel::Tool,
            "tool",
            "call",
            Value::Null,
            || Ok(42),
            |value| Value::Number((*value).into()),
        );
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn error_path_propagates_the_original_error_unchanged() {
        TraceContext::reset();
        TraceContext::initialize_trace("agent-1");
        let events = EventBuilder::new(vec![]);

        let result: Result<i32, BoomError> = instrument(
            &events,
            Channel::Tool,
            "tool",
            "call",
            Value::Null,
            || Err(BoomError),
            |_| Value::Null,
        );
        assert!(matches!(result, Err(BoomError)));
    }
}
