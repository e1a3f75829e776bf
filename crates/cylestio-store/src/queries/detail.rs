use rusqlite::OptionalExtension;

use cylestio_types::{LLMCall, PerformanceMetric, SecurityAlert, Severity, ToolCall};

use crate::json;
use crate::store::Store;
use crate::Result;

fn parse_severity(raw: &str) -> Severity {
    match raw {
        "low" => Severity::Low,
        "medium" => Severity::Medium,
        "high" => Severity::High,
        _ => Severity::Critical,
    }
}

/// Fetch the `LLMCall` row attached to `event_id`, if the event was of that
/// kind (§3, §4.6).
pub fn get_llm_call(store: &Store, event_id: i64) -> Result<Option<LLMCall>> {
    let conn = store.pool().get()?;
    conn.query_row(
        "SELECT model, prompt, response, tokens_in, tokens_out, duration_ms,
                is_stream, temperature, cost
         FROM llm_calls WHERE event_id = ?1",
        [event_id],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<i64>>(3)?,
                row.get::<_, Option<i64>>(4)?,
                row.get::<_, Option<i64>>(5)?,
                row.get::<_, bool>(6)?,
                row.get::<_, Option<f64>>(7)?,
                row.get::<_, Option<f64>>(8)?,
            ))
        },
    )
    .optional()?
    .map(|(model, prompt, response, tokens_in, tokens_out, duration_ms, is_stream, temperature, cost)| {
        Ok(LLMCall {
            event_id,
            model,
            prompt: json::decode(&prompt)?,
            response: json::decode(&response)?,
            tokens_in,
            tokens_out,
            duration_ms,
            is_stream,
            temperature,
            cost,
        })
    })
    .transpose()
}

/// Fetch the `ToolCall` row attached to `event_id`.
pub fn get_tool_call(store: &Store, event_id: i64) -> Result<Option<ToolCall>> {
    let conn = store.pool().get()?;
    conn.query_row(
        "SELECT tool_name, input_params, output_result, success, error_message,
                duration_ms, blocking
         FROM tool_calls WHERE event_id = ?1",
        [event_id],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, bool>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<i64>>(5)?,
                row.get::<_, bool>(6)?,
            ))
        },
    )
    .optional()?
    .map(|(tool_name, input_params, output_result, success, error_message, duration_ms, blocking)| {
        Ok(ToolCall {
            event_id,
            tool_name,
            input_params: json::decode(&input_params)?,
            output_result: json::decode_opt(output_result)?,
            success,
            error_message,
            duration_ms,
            blocking,
        })
    })
    .transpose()
}

/// Fetch the `SecurityAlert` row attached to `event_id`.
pub fn get_security_alert(store: &Store, event_id: i64) -> Result<Option<SecurityAlert>> {
    let conn = store.pool().get()?;
    conn.query_row(
        "SELECT alert_type, severity, description, matched_terms, action_taken
         FROM security_alerts WHERE event_id = ?1",
        [event_id],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        },
    )
    .optional()?
    .map(|(alert_type, severity, description, matched_terms, action_taken)| {
        Ok(SecurityAlert {
            event_id,
            alert_type,
            severity: parse_severity(&severity),
            description,
            matched_terms: json::decode_strings(&matched_terms)?,
            action_taken,
        })
    })
    .transpose()
}

/// Fetch the `PerformanceMetric` row attached to `event_id`.
pub fn get_performance_metric(store: &Store, event_id: i64) -> Result<Option<PerformanceMetric>> {
    let conn = store.pool().get()?;
    let metric = conn
        .query_row(
            "SELECT memory_usage, cpu_usage, duration_ms, tokens_processed, cost
             FROM performance_metrics WHERE event_id = ?1",
            [event_id],
            |row| {
                Ok(PerformanceMetric {
                    event_id,
                    memory_usage: row.get(0)?,
                    cpu_usage: row.get(1)?,
                    duration_ms: row.get(2)?,
                    tokens_processed: row.get(3)?,
                    cost: row.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(metric)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writes::{log_llm_call, log_tool_call};
    use chrono::Utc;
    use cylestio_types::{Channel, Event, Level, SpanId, TraceId, Value};
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
            timestamp: Utc::now(),
            trace_id: TraceId::new("a".repeat(32)).unwrap(),
            span_id: SpanId::new("b".repeat(16)).unwrap(),
            parent_span_id: None,
            data: Value::Object(BTreeMap::new()),
        }
    }

    #[test]
    fn round_trips_an_llm_call() {
        let store = Store::open_in_memory().unwrap();
        let mut event = sample_event();
        let call = LLMCall {
            event_id: 0,
            model: "claude-3-haiku".to_string(),
            prompt: Value::string("hi"),
            response: Value::string("hello"),
            tokens_in: Some(3),
            tokens_out: Some(5),
            duration_ms: Some(10),
            is_stream: false,
            temperature: None,
            cost: None,
        };
        let id = log_llm_call(&store, &mut event, &call, None).unwrap();
        let fetched = get_llm_call(&store, id).unwrap().unwrap();
        assert_eq!(fetched.model, "claude-3-haiku");
        assert_eq!(fetched.tokens_in, Some(3));
    }

    #[test]
    fn round_trips_a_tool_call() {
        let store = Store::open_in_memory().unwrap();
        let mut event = sample_event();
        let call = ToolCall {
            event_id: 0,
            tool_name: "search".to_string(),
            input_params: Value::string("query"),
            output_result: Some(Value::string("results")),
            success: true,
            error_message: None,
            duration_ms: Some(42),
            blocking: true,
        };
        let id = log_tool_call(&store, &mut event, &call, None).unwrap();
        let fetched = get_tool_call(&store, id).unwrap().unwrap();
        assert_eq!(fetched.tool_name, "search");
        assert!(fetched.success);
    }
}
