use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// A dialogue unit within a session (§3, Conversation).
///
/// Opened by a user-initiated or session-start event; closed by an explicit
/// end event, a user termination phrase, or the next session-start (see
/// `cylestio_store::Lifecycle`, which applies these trigger rules and
/// stamps the resulting id onto each event before it is persisted).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Option<i64>,
    pub session_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub metadata: Option<Value>,
}

impl Conversation {
    pub fn start(session_id: i64) -> Self {
        Self {
            id: None,
            session_id,
            start_time: Utc::now(),
            end_time: None,
            metadata: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }
}
