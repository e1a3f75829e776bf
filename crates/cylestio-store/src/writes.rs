use chrono::Utc;
use rusqlite::{params, Transaction};

use cylestio_types::{
    validate_event, validate_llm_call, validate_performance_metric, Event, EventSecurity, LLMCall,
    PerformanceMetric, SecurityAlert, ToolCall,
};

use crate::json;
use crate::store::Store;
use crate::txn::with_scoped_session;
use crate::Result;

fn touch_agent(tx: &Transaction<'_>, agent_id: &str) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    tx.execute(
        "INSERT INTO agents (agent_id, name, created_at, last_seen)
         VALUES (?1, ?1, ?2, ?2)
         ON CONFLICT(agent_id) DO UPDATE SET last_seen = ?2",
        params![agent_id, now],
    )?;
    Ok(())
}

fn insert_event(tx: &Transaction<'_>, event: &Event) -> Result<i64> {
    tx.execute(
        "INSERT INTO events (
            agent_id, session_id, conversation_id, event_type, channel, level,
            direction, timestamp, trace_id, span_id, parent_span_id, data
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            event.agent_id,
            event.session_id,
            event.conversation_id,
            event.event_type,
            event.channel.as_str(),
            level_str(event.level),
            event.direction.map(direction_str),
            event.timestamp.to_rfc3339(),
            event.trace_id.as_str(),
            event.span_id.as_str(),
            event.parent_span_id.as_ref().map(|s| s.as_str().to_string()),
            json::encode(&event.data)?,
        ],
    )?;
    Ok(tx.last_insert_rowid())
}

fn level_str(level: cylestio_types::Level) -> &'static str {
    use cylestio_types::Level::*;
    match level {
        Debug => "DEBUG",
        Info => "INFO",
        Warning => "WARNING",
        Error => "ERROR",
        Critical => "CRITICAL",
    }
}

fn direction_str(direction: cylestio_types::Direction) -> &'static str {
    use cylestio_types::Direction::*;
    match direction {
        Incoming => "incoming",
        Outgoing => "outgoing",
        Internal => "internal",
    }
}

fn insert_event_security(tx: &Transaction<'_>, event_id: i64, security: &EventSecurity) -> Result<()> {
    tx.execute(
        "INSERT INTO event_security (event_id, alert_level, matched_terms, reason, source_field)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            event_id,
            alert_level_str(security.alert_level),
            json::encode_strings_opt(&security.matched_terms)?,
            security.reason,
            security.source_field,
        ],
    )?;
    Ok(())
}

fn alert_level_str(level: cylestio_types::AlertLevel) -> &'static str {
    use cylestio_types::AlertLevel::*;
    match level {
        None => "none",
        Suspicious => "suspicious",
        Dangerous => "dangerous",
    }
}

fn severity_str(severity: cylestio_types::Severity) -> &'static str {
    use cylestio_types::Severity::*;
    match severity {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

/// Write an `Event` with no specialized child row, optionally attaching an
/// `EventSecurity` flag (§4.6 `log_event_generic`).
pub fn log_event_generic(
    store: &Store,
    event: &mut Event,
    security: Option<&EventSecurity>,
) -> Result<i64> {
    validate_event(event)?;
    let id = with_scoped_session(store, |tx| {
        touch_agent(tx, &event.agent_id)?;
        store.lifecycle().resolve(tx, event)?;
        let id = insert_event(tx, event)?;
        if let Some(security) = security {
            insert_event_security(tx, id, security)?;
        }
        Ok(id)
    })?;
    event.id = Some(id);
    Ok(id)
}

/// Write an `Event` plus its one-to-one `LLMCall` row (§4.6).
pub fn log_llm_call(
    store: &Store,
    event: &mut Event,
    call: &LLMCall,
    security: Option<&EventSecurity>,
) -> Result<i64> {
    validate_event(event)?;
    validate_llm_call(call)?;
    let id = with_scoped_session(store, |tx| {
        touch_agent(tx, &event.agent_id)?;
        store.lifecycle().resolve(tx, event)?;
        let id = insert_event(tx, event)?;
        tx.execute(
            "INSERT INTO llm_calls (
                event_id, model, prompt, response, tokens_in, tokens_out,
                duration_ms, is_stream, temperature, cost
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                id,
                call.model,
                json::encode(&call.prompt)?,
                json::encode(&call.response)?,
                call.tokens_in,
                call.tokens_out,
                call.duration_ms,
                call.is_stream,
                call.temperature,
                call.cost,
            ],
        )?;
        if let Some(security) = security {
            insert_event_security(tx, id, security)?;
        }
        Ok(id)
    })?;
    event.id = Some(id);
    Ok(id)
}

/// Write an `Event` plus its one-to-one `ToolCall` row (§4.6).
pub fn log_tool_call(
    store: &Store,
    event: &mut Event,
    call: &ToolCall,
    security: Option<&EventSecurity>,
) -> Result<i64> {
    validate_event(event)?;
    let id = with_scoped_session(store, |tx| {
        touch_agent(tx, &event.agent_id)?;
        store.lifecycle().resolve(tx, event)?;
        let id = insert_event(tx, event)?;
        tx.execute(
            "INSERT INTO tool_calls (
                event_id, tool_name, input_params, output_result, success,
                error_message, duration_ms, blocking
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                call.tool_name,
                json::encode(&call.input_params)?,
                json::encode_opt(&call.output_result)?,
                call.success,
                call.error_message,
                call.duration_ms,
                call.blocking,
            ],
        )?;
        if let Some(security) = security {
            insert_event_security(tx, id, security)?;
        }
        Ok(id)
    })?;
    event.id = Some(id);
    Ok(id)
}

/// Write a dedicated `security.*` `Event` plus its `SecurityAlert` row
/// (§4.6 `log_security_event`).
pub fn log_security_event(store: &Store, event: &mut Event, alert: &SecurityAlert) -> Result<i64> {
    validate_event(event)?;
    let id = with_scoped_session(store, |tx| {
        touch_agent(tx, &event.agent_id)?;
        store.lifecycle().resolve(tx, event)?;
        let id = insert_event(tx, event)?;
        tx.execute(
            "INSERT INTO security_alerts (
                event_id, alert_type, severity, description, matched_terms,
                action_taken, timestamp
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id,
                alert.alert_type,
                severity_str(alert.severity),
                alert.description,
                json::encode_strings(&alert.matched_terms)?,
                alert.action_taken,
                event.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(id)
    })?;
    event.id = Some(id);
    Ok(id)
}

/// Write an `Event` plus its one-to-one `PerformanceMetric` row. Not named
/// in §4.6's write-path list but needed to populate the table at all;
/// grounded the same way as the other specialized writers.
pub fn log_performance_metric(
    store: &Store,
    event: &mut Event,
    metric: &PerformanceMetric,
) -> Result<i64> {
    validate_event(event)?;
    validate_performance_metric(metric)?;
    let id = with_scoped_session(store, |tx| {
        touch_agent(tx, &event.agent_id)?;
        store.lifecycle().resolve(tx, event)?;
        let id = insert_event(tx, event)?;
        tx.execute(
            "INSERT INTO performance_metrics (
                event_id, memory_usage, cpu_usage, duration_ms, tokens_processed, cost
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                metric.memory_usage,
                metric.cpu_usage,
                metric.duration_ms,
                metric.tokens_processed,
                metric.cost,
            ],
        )?;
        Ok(id)
    })?;
    event.id = Some(id);
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cylestio_types::{Channel, Level, SpanId, TraceId, Value};
    use std::collections::BTreeMap;

    fn sample_event(agent_id: &str) -> Event {
        Event {
            id: None,
            agent_id: agent_id.to_string(),
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
    fn log_event_generic_assigns_an_id_and_touches_the_agent() {
        let store = Store::open_in_memory().unwrap();
        let mut event = sample_event("agent-1");
        let id = log_event_generic(&store, &mut event, None).unwrap();
        assert_eq!(event.id, Some(id));
        assert!(id > 0);
    }

    #[test]
    fn log_llm_call_writes_both_rows_in_one_transaction() {
        let store = Store::open_in_memory().unwrap();
        let mut event = sample_event("agent-1");
        let call = LLMCall {
            event_id: 0,
            model: "claude-3-haiku".to_string(),
            prompt: Value::string("hi"),
            response: Value::string("hello"),
            tokens_in: Some(3),
            tokens_out: Some(5),
            duration_ms: Some(120),
            is_stream: false,
            temperature: Some(0.7),
            cost: Some(0.0001),
        };
        let id = log_llm_call(&store, &mut event, &call, None).unwrap();
        assert_eq!(event.id, Some(id));
    }

    #[test]
    fn log_llm_call_rejects_negative_tokens() {
        let store = Store::open_in_memory().unwrap();
        let mut event = sample_event("agent-1");
        let call = LLMCall {
            event_id: 0,
            model: "m".to_string(),
            prompt: Value::Null,
            response: Value::Null,
            tokens_in: Some(-1),
            tokens_out: None,
            duration_ms: None,
            is_stream: false,
            temperature: None,
            cost: None,
        };
        assert!(log_llm_call(&store, &mut event, &call, None).is_err());
    }

    #[test]
    fn repeated_writes_for_the_same_agent_touch_not_duplicate() {
        let store = Store::open_in_memory().unwrap();
        let mut first = sample_event("agent-1");
        let mut second = sample_event("agent-1");
        log_event_generic(&store, &mut first, None).unwrap();
        log_event_generic(&store, &mut second, None).unwrap();

        let conn = store.pool().get().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM agents", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
