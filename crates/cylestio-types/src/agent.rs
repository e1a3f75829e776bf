use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of a monitored process (§3, Agent).
///
/// `agent_id` is caller-provided and globally unique; the store does a
/// get-or-create on it rather than assigning its own identifier, so that
/// repeated `start_monitoring` calls for the same logical agent converge on
/// one row instead of accumulating duplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub agent_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl Agent {
    pub fn new(agent_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            agent_id: agent_id.into(),
            name: name.into(),
            created_at: now,
            last_seen: now,
        }
    }
}
