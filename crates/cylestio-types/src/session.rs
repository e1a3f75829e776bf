use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// One monitored run of an agent (§3, Session).
///
/// `end_time` is `None` iff the session is active. Only one active session
/// per agent is typical but the store does not enforce it -- a crashed
/// process that never called `stop_monitoring` simply leaves a dangling
/// active session behind, which is diagnostic information in its own right.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Option<i64>,
    pub agent_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub metadata: Option<Value>,
}

impl Session {
    pub fn start(agent_id: impl Into<String>) -> Self {
        Self {
            id: None,
            agent_id: agent_id.into(),
            start_time: Utc::now(),
            end_time: None,
            metadata: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }
}
