//! Telemetry-specific assertions: small, composable, `anyhow::Result<()>`-
//! returning functions that make test bodies read as a list of checks.

use anyhow::{Context, Result};
use cylestio_types::{AlertLevel, Event, Level};

/// Assert that exactly `expected` events of `event_type` are present.
pub fn assert_event_type_count(events: &[Event], event_type: &str, expected: usize) -> Result<()> {
    let count = events.iter().filter(|e| e.event_type == event_type).count();
    if count != expected {
        anyhow::bail!("expected {expected} events of type {event_type}, got {count}");
    }
    Ok(())
}

/// Assert that at least one event reached `level` or higher.
pub fn assert_any_event_at_level(events: &[Event], level: Level) -> Result<()> {
    if events.iter().any(|e| e.level >= level) {
        Ok(())
    } else {
        anyhow::bail!("expected at least one event at level >= {level:?}, found none")
    }
}

/// Assert the `security.alert_level` attribute attached to an event's
/// attributes (§4.3 `ScanResult`).
pub fn assert_alert_level(event: &Event, expected: AlertLevel) -> Result<()> {
    let found = event
        .data
        .get("security.alert_level")
        .map(|v| v.as_text())
        .context("event has no security.alert_level attribute")?;

    let expected_str = match expected {
        AlertLevel::None => "none",
        AlertLevel::Suspicious => "suspicious",
        AlertLevel::Dangerous => "dangerous",
    };
    if found != expected_str {
        anyhow::bail!("expected alert level {expected_str}, got {found}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_event;
    use cylestio_types::Channel;

    #[test]
    fn counts_events_by_type() {
        let events = vec![
            sample_event("agent-1", "llm.call.start", Channel::Llm),
            sample_event("agent-1", "llm.call.finish", Channel::Llm),
        ];
        assert!(assert_event_type_count(&events, "llm.call.start", 1).is_ok());
        assert!(assert_event_type_count(&events, "llm.call.start", 2).is_err());
    }

    #[test]
    fn detects_an_elevated_level() {
        let mut events = vec![sample_event("agent-1", "tool.call.start", Channel::Tool)];
        events[0].level = Level::Error;
        assert!(assert_any_event_at_level(&events, Level::Warning).is_ok());
    }
}
