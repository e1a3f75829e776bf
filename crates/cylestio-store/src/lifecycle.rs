use std::collections::HashMap;
use std::sync::Mutex;

use rusqlite::{params, OptionalExtension, Transaction};

use cylestio_types::{Conversation, Direction, Event, Session, Value};

use crate::json;
use crate::Result;

/// Per-agent session/conversation cursor (§3 Session/Conversation
/// lifecycle), mirroring the original's module-level `_current_sessions`/
/// `_current_conversations` dicts (`event_logger.py`). Lives on `Store`
/// rather than as a true process global so independent `Store` instances
/// (as in tests) don't leak state into each other.
#[derive(Default)]
pub struct Lifecycle {
    agents: Mutex<HashMap<String, AgentCursor>>,
}

#[derive(Default, Clone, Copy)]
struct AgentCursor {
    session_id: Option<i64>,
    conversation_id: Option<i64>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every cached session/conversation cursor. Called after
    /// `reset_database` since the rows those ids pointed at no longer
    /// exist.
    pub fn clear(&self) {
        self.agents.lock().unwrap().clear();
    }

    /// Resolve (creating rows as needed) the session and conversation this
    /// event belongs to, and stamp their ids onto it before the caller
    /// inserts the event row (§3; ported from `event_logger.py::log_to_db`).
    /// A caller that has already stamped `session_id`/`conversation_id`
    /// explicitly is left untouched.
    pub fn resolve(&self, tx: &Transaction<'_>, event: &mut Event) -> Result<()> {
        if event.session_id.is_none() {
            event.session_id = Some(self.resolve_session(tx, event)?);
        }
        let session_id = event.session_id.expect("just resolved above");

        if event.conversation_id.is_none() {
            if should_start_new_conversation(event) {
                self.agents
                    .lock()
                    .unwrap()
                    .entry(event.agent_id.clone())
                    .or_default()
                    .conversation_id = None;
            }

            let conversation_id = self.resolve_conversation(tx, event, session_id)?;

            if should_end_conversation(event) {
                tx.execute(
                    "UPDATE conversations SET end_time = ?1 WHERE id = ?2",
                    params![event.timestamp.to_rfc3339(), conversation_id],
                )?;
            }

            event.conversation_id = Some(conversation_id);
        }

        Ok(())
    }

    /// Get-or-create the current session for the event's agent: reuse the
    /// cached id, else reuse any still-active (`end_time IS NULL`) row
    /// already in the database, else build one via `Session::start` and
    /// insert it (§3 Session: "created on first observation").
    fn resolve_session(&self, tx: &Transaction<'_>, event: &Event) -> Result<i64> {
        let agent_id = &event.agent_id;
        if let Some(id) = self.agents.lock().unwrap().get(agent_id).and_then(|c| c.session_id) {
            return Ok(id);
        }

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM sessions WHERE agent_id = ?1 AND end_time IS NULL
                 ORDER BY start_time DESC LIMIT 1",
                params![agent_id],
                |row| row.get(0),
            )
            .optional()?;

        let id = match existing {
            Some(id) => id,
            None => {
                let mut session = Session::start(agent_id.clone());
                session.start_time = event.timestamp;
                tx.execute(
                    "INSERT INTO sessions (agent_id, start_time, end_time, metadata)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![
                        session.agent_id,
                        session.start_time.to_rfc3339(),
                        session.end_time.map(|t| t.to_rfc3339()),
                        json::encode_opt(&session.metadata)?,
                    ],
                )?;
                tx.last_insert_rowid()
            }
        };

        self.agents.lock().unwrap().entry(agent_id.clone()).or_default().session_id = Some(id);
        Ok(id)
    }

    /// Get-or-create the current conversation for the event's agent under
    /// `session_id`. The cache entry is only absent when never created or
    /// just reset by a start-trigger, so an absent cache always means "open
    /// a fresh conversation row via `Conversation::start`" (§3 Conversation
    /// lifecycle).
    fn resolve_conversation(&self, tx: &Transaction<'_>, event: &Event, session_id: i64) -> Result<i64> {
        let agent_id = &event.agent_id;
        if let Some(id) = self.agents.lock().unwrap().get(agent_id).and_then(|c| c.conversation_id) {
            return Ok(id);
        }

        let mut conversation = Conversation::start(session_id);
        conversation.start_time = event.timestamp;
        tx.execute(
            "INSERT INTO conversations (session_id, start_time, end_time, metadata)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                conversation.session_id,
                conversation.start_time.to_rfc3339(),
                conversation.end_time.map(|t| t.to_rfc3339()),
                json::encode_opt(&conversation.metadata)?,
            ],
        )?;
        let id = tx.last_insert_rowid();

        self.agents.lock().unwrap().entry(agent_id.clone()).or_default().conversation_id = Some(id);
        Ok(id)
    }
}

/// Ported from `event_logger.py::_should_start_new_conversation`.
fn should_start_new_conversation(event: &Event) -> bool {
    if event.event_type == "user_message" && event.direction == Some(Direction::Incoming) {
        return true;
    }
    matches!(
        event.event_type.as_str(),
        "client_init" | "restart" | "session_start" | "conversation_start"
    )
}

/// Ported from `event_logger.py::_should_end_conversation`. Note the
/// original never clears `_current_conversations` on this path -- events
/// that follow an ended conversation without their own start-trigger keep
/// landing in the now-closed conversation, and this mirrors that exactly.
fn should_end_conversation(event: &Event) -> bool {
    if matches!(
        event.event_type.as_str(),
        "conversation_end" | "session_end" | "client_shutdown"
    ) {
        return true;
    }
    if event.event_type == "user_message" {
        if let Some(content) = event.data.get("content").map(Value::as_text) {
            return matches!(content.to_lowercase().trim(), "quit" | "exit" | "bye" | "goodbye");
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use crate::txn::with_scoped_session;
    use cylestio_types::{Channel, Level, SpanId, TraceId};
    use std::collections::BTreeMap;

    fn event(agent_id: &str, event_type: &str, direction: Option<Direction>) -> Event {
        Event {
            id: None,
            agent_id: agent_id.to_string(),
            session_id: None,
            conversation_id: None,
            event_type: event_type.to_string(),
            channel: Channel::System,
            level: Level::Info,
            direction,
            timestamp: Utc::now(),
            trace_id: TraceId::new("a".repeat(32)).unwrap(),
            span_id: SpanId::new("b".repeat(16)).unwrap(),
            parent_span_id: None,
            data: Value::Object(BTreeMap::new()),
        }
    }

    fn with_content(mut e: Event, content: &str) -> Event {
        let mut map = BTreeMap::new();
        map.insert("content".to_string(), Value::string(content));
        e.data = Value::Object(map);
        e
    }

    #[test]
    fn consecutive_events_for_the_same_agent_share_session_and_conversation() {
        let store = Store::open_in_memory().unwrap();
        let lifecycle = Lifecycle::new();

        let mut first = event("agent-1", "tool.call.start", None);
        let mut second = event("agent-1", "tool.call.finish", None);

        with_scoped_session(&store, |tx| {
            tx.execute(
                "INSERT INTO agents (agent_id, name, created_at, last_seen) VALUES (?1, ?1, ?2, ?2)",
                params!["agent-1", Utc::now().to_rfc3339()],
            )?;
            lifecycle.resolve(tx, &mut first)?;
            lifecycle.resolve(tx, &mut second)?;
            Ok(())
        })
        .unwrap();

        assert_eq!(first.session_id, second.session_id);
        assert_eq!(first.conversation_id, second.conversation_id);
    }

    #[test]
    fn incoming_user_message_starts_a_new_conversation() {
        let store = Store::open_in_memory().unwrap();
        let lifecycle = Lifecycle::new();

        let mut first = event("agent-1", "tool.call.start", None);
        let mut second = event("agent-1", "user_message", Some(Direction::Incoming));

        with_scoped_session(&store, |tx| {
            tx.execute(
                "INSERT INTO agents (agent_id, name, created_at, last_seen) VALUES (?1, ?1, ?2, ?2)",
                params!["agent-1", Utc::now().to_rfc3339()],
            )?;
            lifecycle.resolve(tx, &mut first)?;
            lifecycle.resolve(tx, &mut second)?;
            Ok(())
        })
        .unwrap();

        assert_eq!(first.session_id, second.session_id);
        assert_ne!(first.conversation_id, second.conversation_id);
    }

    #[test]
    fn goodbye_ends_the_conversation_row() {
        let store = Store::open_in_memory().unwrap();
        let lifecycle = Lifecycle::new();

        let mut msg = with_content(event("agent-1", "user_message", Some(Direction::Incoming)), "goodbye");

        with_scoped_session(&store, |tx| {
            tx.execute(
                "INSERT INTO agents (agent_id, name, created_at, last_seen) VALUES (?1, ?1, ?2, ?2)",
                params!["agent-1", Utc::now().to_rfc3339()],
            )?;
            lifecycle.resolve(tx, &mut msg)?;
            Ok(())
        })
        .unwrap();

        let conn = store.pool().get().unwrap();
        let end_time: Option<String> = conn
            .query_row(
                "SELECT end_time FROM conversations WHERE id = ?1",
                params![msg.conversation_id.unwrap()],
                |row| row.get(0),
            )
            .unwrap();
        assert!(end_time.is_some());
    }
}
