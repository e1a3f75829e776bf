use cylestio_types::Severity;

use crate::store::Store;
use crate::Result;

/// Event counts grouped by `event_type` (§4.6 aggregates).
pub fn events_by_type(store: &Store) -> Result<Vec<(String, i64)>> {
    count_group_by(store, "event_type", "events")
}

/// Event counts grouped by `channel`.
pub fn events_by_channel(store: &Store) -> Result<Vec<(String, i64)>> {
    count_group_by(store, "channel", "events")
}

/// Event counts grouped by `level`.
pub fn events_by_level(store: &Store) -> Result<Vec<(String, i64)>> {
    count_group_by(store, "level", "events")
}

fn count_group_by(store: &Store, column: &str, table: &str) -> Result<Vec<(String, i64)>> {
    let conn = store.pool().get()?;
    let sql = format!("SELECT {column}, COUNT(*) FROM {table} GROUP BY {column} ORDER BY {column}");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Time granularity for [`average_response_time_by_bucket`] (§4.6:
/// "average response time grouped by model/hour/day/week/month").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBucket {
    Hour,
    Day,
    Week,
    Month,
}

impl TimeBucket {
    fn strftime_format(self) -> &'static str {
        match self {
            TimeBucket::Hour => "%Y-%m-%dT%H",
            TimeBucket::Day => "%Y-%m-%d",
            TimeBucket::Week => "%Y-W%W",
            TimeBucket::Month => "%Y-%m",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AverageResponseTime {
    pub bucket: String,
    pub average_duration_ms: f64,
    pub sample_count: i64,
}

/// Average `llm_calls.duration_ms`, grouped by model.
pub fn average_response_time_by_model(store: &Store) -> Result<Vec<AverageResponseTime>> {
    let conn = store.pool().get()?;
    let mut stmt = conn.prepare(
        "SELECT model, AVG(duration_ms), COUNT(*)
         FROM llm_calls
         WHERE duration_ms IS NOT NULL
         GROUP BY model
         ORDER BY model",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(AverageResponseTime {
                bucket: row.get(0)?,
                average_duration_ms: row.get(1)?,
                sample_count: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Average `llm_calls.duration_ms`, grouped by the event's timestamp
/// bucketed to `granularity`.
pub fn average_response_time_by_bucket(
    store: &Store,
    granularity: TimeBucket,
) -> Result<Vec<AverageResponseTime>> {
    let conn = store.pool().get()?;
    let sql = format!(
        "SELECT strftime('{}', events.timestamp) AS bucket, AVG(llm_calls.duration_ms), COUNT(*)
         FROM llm_calls
         JOIN events ON events.id = llm_calls.event_id
         WHERE llm_calls.duration_ms IS NOT NULL
         GROUP BY bucket
         ORDER BY bucket",
        granularity.strftime_format()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(AverageResponseTime {
                bucket: row.get(0)?,
                average_duration_ms: row.get(1)?,
                sample_count: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlowestOperation {
    pub event_type: String,
    pub duration_ms: i64,
}

/// Top-`limit` slowest operations across LLM calls and tool calls (§4.6).
pub fn slowest_operations(store: &Store, limit: i64) -> Result<Vec<SlowestOperation>> {
    let conn = store.pool().get()?;
    let mut stmt = conn.prepare(
        "SELECT events.event_type, d.duration_ms FROM (
            SELECT event_id, duration_ms FROM llm_calls WHERE duration_ms IS NOT NULL
            UNION ALL
            SELECT event_id, duration_ms FROM tool_calls WHERE duration_ms IS NOT NULL
         ) AS d
         JOIN events ON events.id = d.event_id
         ORDER BY d.duration_ms DESC
         LIMIT ?1",
    )?;
    let rows = stmt
        .query_map([limit], |row| {
            Ok(SlowestOperation {
                event_type: row.get(0)?,
                duration_ms: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenUsage {
    pub model: String,
    pub tokens_in: i64,
    pub tokens_out: i64,
}

/// Total token usage grouped by model (§4.6).
pub fn token_usage_by_model(store: &Store) -> Result<Vec<TokenUsage>> {
    let conn = store.pool().get()?;
    let mut stmt = conn.prepare(
        "SELECT model, COALESCE(SUM(tokens_in), 0), COALESCE(SUM(tokens_out), 0)
         FROM llm_calls
         GROUP BY model
         ORDER BY model",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(TokenUsage {
                model: row.get(0)?,
                tokens_in: row.get(1)?,
                tokens_out: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Alert counts grouped by severity (§4.6).
pub fn alerts_by_severity(store: &Store) -> Result<Vec<(Severity, i64)>> {
    let conn = store.pool().get()?;
    let mut stmt =
        conn.prepare("SELECT severity, COUNT(*) FROM security_alerts GROUP BY severity")?;
    let rows = stmt
        .query_map([], |row| {
            let raw: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((raw, count))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows
        .into_iter()
        .map(|(raw, count)| (parse_severity(&raw), count))
        .collect())
}

fn parse_severity(raw: &str) -> Severity {
    match raw {
        "low" => Severity::Low,
        "medium" => Severity::Medium,
        "high" => Severity::High,
        _ => Severity::Critical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writes::{log_event_generic, log_llm_call, log_security_event};
    use chrono::Utc;
    use cylestio_types::{
        Channel, Event, Level, LLMCall, SecurityAlert, Severity as Sev, SpanId, TraceId, Value,
    };
    use std::collections::BTreeMap;

    fn sample_event(event_type: &str) -> Event {
        Event {
            id: None,
            agent_id: "agent-1".to_string(),
            session_id: None,
            conversation_id: None,
            event_type: event_type.to_string(),
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
    fn token_usage_sums_across_calls_for_the_same_model() {
        let store = Store::open_in_memory().unwrap();
        for _ in 0..2 {
            let mut event = sample_event("llm.call.finish");
            let call = LLMCall {
                event_id: 0,
                model: "claude-3-haiku".to_string(),
                prompt: Value::Null,
                response: Value::Null,
                tokens_in: Some(10),
                tokens_out: Some(20),
                duration_ms: Some(50),
                is_stream: false,
                temperature: None,
                cost: None,
            };
            log_llm_call(&store, &mut event, &call, None).unwrap();
        }
        let usage = token_usage_by_model(&store).unwrap();
        assert_eq!(usage.len(), 1);
        assert_eq!(usage[0].tokens_in, 20);
        assert_eq!(usage[0].tokens_out, 40);
    }

    #[test]
    fn alerts_by_severity_counts_each_bucket() {
        let store = Store::open_in_memory().unwrap();
        let mut event = sample_event("security.alert");
        let alert = SecurityAlert {
            event_id: 0,
            alert_type: "dangerous_commands".to_string(),
            severity: Sev::Critical,
            description: "DROP TABLE users".to_string(),
            matched_terms: vec!["DROP".to_string()],
            action_taken: None,
        };
        log_security_event(&store, &mut event, &alert).unwrap();

        let counts = alerts_by_severity(&store).unwrap();
        assert_eq!(counts, vec![(Sev::Critical, 1)]);
    }

    #[test]
    fn events_by_type_counts_distinct_types() {
        let store = Store::open_in_memory().unwrap();
        let mut a = sample_event("llm.call.start");
        let mut b = sample_event("llm.call.start");
        let mut c = sample_event("tool.call.start");
        log_event_generic(&store, &mut a, None).unwrap();
        log_event_generic(&store, &mut b, None).unwrap();
        log_event_generic(&store, &mut c, None).unwrap();

        let counts = events_by_type(&store).unwrap();
        assert!(counts.contains(&("llm.call.start".to_string(), 2)));
        assert!(counts.contains(&("tool.call.start".to_string(), 1)));
    }
}
