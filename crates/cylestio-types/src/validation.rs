use crate::{Error, Event, LLMCall, PerformanceMetric, Result};

/// Validate a non-negative, optional numeric column. Negative tokens,
/// durations, and costs are rejected at write time rather than silently
/// clamped (§3, §8 boundary behaviors).
fn check_non_negative(field: &str, value: Option<i64>) -> Result<()> {
    if let Some(v) = value {
        if v < 0 {
            return Err(Error::Validation(format!("{field} must be >= 0, got {v}")));
        }
    }
    Ok(())
}

fn check_non_negative_f64(field: &str, value: Option<f64>) -> Result<()> {
    if let Some(v) = value {
        if v < 0.0 {
            return Err(Error::Validation(format!("{field} must be >= 0, got {v}")));
        }
    }
    Ok(())
}

/// Validate the base `Event` record: non-null trace/span ids are enforced by
/// `TraceId`/`SpanId` construction already, so this only checks the
/// remaining invariant -- `parent_span_id` must differ from `span_id`.
pub fn validate_event(event: &Event) -> Result<()> {
    if let Some(parent) = &event.parent_span_id {
        if parent.as_str() == event.span_id.as_str() {
            return Err(Error::Validation(
                "parent_span_id must not equal span_id".to_string(),
            ));
        }
    }
    Ok(())
}

/// Validate an `LLMCall` row: tokens, duration, and cost must be
/// non-negative.
pub fn validate_llm_call(call: &LLMCall) -> Result<()> {
    check_non_negative("tokens_in", call.tokens_in)?;
    check_non_negative("tokens_out", call.tokens_out)?;
    check_non_negative("duration_ms", call.duration_ms)?;
    check_non_negative_f64("cost", call.cost)?;
    Ok(())
}

/// Validate a `PerformanceMetric` row: numeric columns must be
/// non-negative, and `cpu_usage` must not exceed 100 (§3, §8).
pub fn validate_performance_metric(metric: &PerformanceMetric) -> Result<()> {
    check_non_negative("memory_usage", metric.memory_usage)?;
    check_non_negative("duration_ms", metric.duration_ms)?;
    check_non_negative("tokens_processed", metric.tokens_processed)?;
    check_non_negative_f64("cost", metric.cost)?;
    if let Some(cpu) = metric.cpu_usage {
        if cpu < 0.0 {
            return Err(Error::Validation(format!("cpu_usage must be >= 0, got {cpu}")));
        }
        if cpu > 100.0 {
            return Err(Error::Validation(format!(
                "cpu_usage must be <= 100, got {cpu}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Channel, Level, SpanId, TraceId, Value};
    use std::collections::BTreeMap;

    fn sample_event() -> Event {
        Event {
            id: None,
            agent_id: "agent-1".to_string(),
            session_id: None,
            conversation_id: None,
            event_type: "llm.call.start".to_string(),
            channel: Channel::Llm,
            level: Level::Info,
            direction: None,
            timestamp: chrono::Utc::now(),
            trace_id: TraceId::new("a".repeat(32)).unwrap(),
            span_id: SpanId::new("b".repeat(16)).unwrap(),
            parent_span_id: None,
            data: Value::Object(BTreeMap::new()),
        }
    }

    #[test]
    fn rejects_negative_tokens() {
        let call = LLMCall {
            event_id: 1,
            model: "claude-3-haiku".to_string(),
            prompt: Value::Null,
            response: Value::Null,
            tokens_in: Some(-1),
            tokens_out: None,
            duration_ms: None,
            is_stream: false,
            temperature: None,
            cost: None,
        };
        assert!(validate_llm_call(&call).is_err());
    }

    #[test]
    fn rejects_cpu_usage_over_100() {
        let metric = PerformanceMetric {
            event_id: 1,
            memory_usage: None,
            cpu_usage: Some(101.0),
            duration_ms: None,
            tokens_processed: None,
            cost: None,
        };
        assert!(validate_performance_metric(&metric).is_err());
    }

    #[test]
    fn accepts_cpu_usage_at_boundary() {
        let metric = PerformanceMetric {
            event_id: 1,
            memory_usage: None,
            cpu_usage: Some(100.0),
            duration_ms: None,
            tokens_processed: None,
            cost: None,
        };
        assert!(validate_performance_metric(&metric).is_ok());
    }

    #[test]
    fn rejects_self_referential_parent_span() {
        let mut event = sample_event();
        event.parent_span_id = Some(event.span_id.clone());
        assert!(validate_event(&event).is_err());
    }
}
