use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use cylestio_types::Event;

use crate::sink::Sink;
use crate::wire::WireEvent;
use crate::Result;

/// Append-only JSON-lines file sink (§4.5). On write failure it retries once
/// to a dated fallback path under the user's home directory; a second
/// failure is logged and the event is dropped.
pub struct FileSink {
    primary: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { primary: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.primary
    }
}

impl Sink for FileSink {
    fn send(&self, event: &Event) -> Result<()> {
        match append_line(&self.primary, event) {
            Ok(()) => Ok(()),
            Err(primary_err) => {
                let fallback = cylestio_core::fallback_log_path(chrono::Utc::now());
                tracing::warn!(
                    path = %self.primary.display(),
                    error = %primary_err,
                    fallback = %fallback.display(),
                    "file sink write failed, retrying to fallback path"
                );
                match append_line(&fallback, event) {
                    Ok(()) => Ok(()),
                    Err(fallback_err) => {
                        tracing::error!(
                            path = %fallback.display(),
                            error = %fallback_err,
                            "file sink fallback write failed, dropping event"
                        );
                        Err(fallback_err)
                    }
                }
            }
        }
    }
}

fn append_line(path: &Path, event: &Event) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let line = serde_json::to_string(&WireEvent::from(event))?;
    writeln!(file, "{line}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use cylestio_types::{Channel, Level, SpanId, TraceId, Value};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

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
    fn appends_one_json_line_per_event_and_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("events.jsonl");
        let sink = FileSink::new(&path);

        sink.send(&sample_event()).unwrap();
        sink.send(&sample_event()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: WireEvent = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.name, "llm.call.start");
    }
}
