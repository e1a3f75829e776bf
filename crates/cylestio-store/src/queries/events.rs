use rusqlite::Row;

use cylestio_types::{Channel, Direction, Event, Level, SpanId, TraceId};

use crate::json;
use crate::store::Store;
use crate::Result;

fn to_sql_err(err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(err))
}

fn parse_channel(raw: &str) -> rusqlite::Result<Channel> {
    Ok(match raw {
        "LLM" => Channel::Llm,
        "TOOL" => Channel::Tool,
        "SYSTEM" => Channel::System,
        "SECURITY" => Channel::Security,
        "NETWORK" => Channel::Network,
        _ => Channel::Other,
    })
}

fn parse_level(raw: &str) -> rusqlite::Result<Level> {
    Ok(match raw {
        "DEBUG" => Level::Debug,
        "INFO" => Level::Info,
        "WARNING" => Level::Warning,
        "ERROR" => Level::Error,
        "CRITICAL" => Level::Critical,
        other => return Err(to_sql_err(std::io::Error::other(format!("unknown level {other}")))),
    })
}

fn parse_direction(raw: &str) -> rusqlite::Result<Direction> {
    Ok(match raw {
        "incoming" => Direction::Incoming,
        "outgoing" => Direction::Outgoing,
        "internal" => Direction::Internal,
        other => return Err(to_sql_err(std::io::Error::other(format!("unknown direction {other}")))),
    })
}

pub(crate) fn event_from_row(row: &Row<'_>) -> rusqlite::Result<Event> {
    let timestamp: String = row.get("timestamp")?;
    let trace_id: String = row.get("trace_id")?;
    let span_id: String = row.get("span_id")?;
    let parent_span_id: Option<String> = row.get("parent_span_id")?;
    let channel: String = row.get("channel")?;
    let level: String = row.get("level")?;
    let direction: Option<String> = row.get("direction")?;
    let data: String = row.get("data")?;

    Ok(Event {
        id: row.get("id")?,
        agent_id: row.get("agent_id")?,
        session_id: row.get("session_id")?,
        conversation_id: row.get("conversation_id")?,
        event_type: row.get("event_type")?,
        channel: parse_channel(&channel)?,
        level: parse_level(&level)?,
        direction: direction.map(|d| parse_direction(&d)).transpose()?,
        timestamp: chrono::DateTime::parse_from_rfc3339(&timestamp)
            .map_err(to_sql_err)?
            .into(),
        trace_id: TraceId::new(trace_id).map_err(to_sql_err)?,
        span_id: SpanId::new(span_id).map_err(to_sql_err)?,
        parent_span_id: parent_span_id.map(SpanId::new).transpose().map_err(to_sql_err)?,
        data: json::decode(&data).map_err(|e| to_sql_err(std::io::Error::other(e.to_string())))?,
    })
}

/// Filters accepted by [`list_events`] (§4.6 read paths). All fields are
/// conjunctive (AND'd together) when present.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub agent_id: Option<String>,
    pub session_id: Option<i64>,
    pub conversation_id: Option<i64>,
    pub event_type: Option<String>,
    pub channel: Option<Channel>,
    pub level: Option<Level>,
    pub since: Option<chrono::DateTime<chrono::Utc>>,
    pub until: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOrder {
    TimestampAsc,
    TimestampDesc,
}

/// Pagination for [`list_events`].
#[derive(Debug, Clone, Copy)]
pub struct EventPage {
    pub limit: i64,
    pub offset: i64,
    pub order: EventOrder,
}

impl Default for EventPage {
    fn default() -> Self {
        Self {
            limit: 100,
            offset: 0,
            order: EventOrder::TimestampDesc,
        }
    }
}

/// Paginated, filtered, orderable query over `events` (§4.6).
pub fn list_events(store: &Store, filter: &EventFilter, page: &EventPage) -> Result<Vec<Event>> {
    let mut clauses = Vec::new();
    let mut args: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(agent_id) = &filter.agent_id {
        clauses.push("agent_id = ?".to_string());
        args.push(Box::new(agent_id.clone()));
    }
    if let Some(session_id) = filter.session_id {
        clauses.push("session_id = ?".to_string());
        args.push(Box::new(session_id));
    }
    if let Some(conversation_id) = filter.conversation_id {
        clauses.push("conversation_id = ?".to_string());
        args.push(Box::new(conversation_id));
    }
    if let Some(event_type) = &filter.event_type {
        clauses.push("event_type = ?".to_string());
        args.push(Box::new(event_type.clone()));
    }
    if let Some(channel) = filter.channel {
        clauses.push("channel = ?".to_string());
        args.push(Box::new(channel.as_str().to_string()));
    }
    if let Some(level) = filter.level {
        clauses.push("level = ?".to_string());
        args.push(Box::new(level_str(level).to_string()));
    }
    if let Some(since) = filter.since {
        clauses.push("timestamp >= ?".to_string());
        args.push(Box::new(since.to_rfc3339()));
    }
    if let Some(until) = filter.until {
        clauses.push("timestamp <= ?".to_string());
        args.push(Box::new(until.to_rfc3339()));
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    let order_sql = match page.order {
        EventOrder::TimestampAsc => "ORDER BY timestamp ASC",
        EventOrder::TimestampDesc => "ORDER BY timestamp DESC",
    };
    let sql = format!(
        "SELECT * FROM events {where_sql} {order_sql} LIMIT ? OFFSET ?"
    );
    args.push(Box::new(page.limit));
    args.push(Box::new(page.offset));

    let conn = store.pool().get()?;
    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        args.iter().map(|b| b.as_ref()).collect();
    let events = stmt
        .query_map(param_refs.as_slice(), event_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(events)
}

fn level_str(level: Level) -> &'static str {
    use Level::*;
    match level {
        Debug => "DEBUG",
        Info => "INFO",
        Warning => "WARNING",
        Error => "ERROR",
        Critical => "CRITICAL",
    }
}

/// Fetch a single event by its row id.
pub fn get_event(store: &Store, event_id: i64) -> Result<Option<Event>> {
    let conn = store.pool().get()?;
    let mut stmt = conn.prepare("SELECT * FROM events WHERE id = ?1")?;
    let mut rows = stmt.query([event_id])?;
    if let Some(row) = rows.next()? {
        Ok(Some(event_from_row(row)?))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writes::log_event_generic;
    use chrono::Utc;
    use cylestio_types::{SpanId as Sid, TraceId as Tid, Value};
    use std::collections::BTreeMap;

    fn sample_event(agent_id: &str, event_type: &str) -> Event {
        Event {
            id: None,
            agent_id: agent_id.to_string(),
            session_id: None,
            conversation_id: None,
            event_type: event_type.to_string(),
            channel: Channel::Llm,
            level: Level::Info,
            direction: None,
            timestamp: Utc::now(),
            trace_id: Tid::new("a".repeat(32)).unwrap(),
            span_id: Sid::new("b".repeat(16)).unwrap(),
            parent_span_id: None,
            data: Value::Object(BTreeMap::new()),
        }
    }

    #[test]
    fn round_trips_an_event_through_get_event() {
        let store = Store::open_in_memory().unwrap();
        let mut event = sample_event("agent-1", "llm.call.start");
        let id = log_event_generic(&store, &mut event, None).unwrap();

        let fetched = get_event(&store, id).unwrap().unwrap();
        assert_eq!(fetched.agent_id, "agent-1");
        assert_eq!(fetched.event_type, "llm.call.start");
        assert_eq!(fetched.trace_id.as_str(), "a".repeat(32));
    }

    #[test]
    fn list_events_filters_by_event_type() {
        let store = Store::open_in_memory().unwrap();
        let mut a = sample_event("agent-1", "llm.call.start");
        let mut b = sample_event("agent-1", "tool.call.start");
        log_event_generic(&store, &mut a, None).unwrap();
        log_event_generic(&store, &mut b, None).unwrap();

        let filter = EventFilter {
            event_type: Some("tool.call.start".to_string()),
            ..Default::default()
        };
        let results = list_events(&store, &filter, &EventPage::default()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].event_type, "tool.call.start");
    }

    #[test]
    fn list_events_respects_pagination() {
        let store = Store::open_in_memory().unwrap();
        for i in 0..5 {
            let mut event = sample_event("agent-1", &format!("evt.{i}"));
            log_event_generic(&store, &mut event, None).unwrap();
        }
        let page = EventPage {
            limit: 2,
            offset: 0,
            order: EventOrder::TimestampAsc,
        };
        let filter = EventFilter::default();
        let results = list_events(&store, &filter, &page).unwrap();
        assert_eq!(results.len(), 2);
    }
}
