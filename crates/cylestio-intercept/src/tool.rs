//! Tool interception (§4.7.2): wraps a framework tool's invoke method with
//! span/attribute capture, plus a scan of SQL-shaped inputs for command
//! injection (§4.8).

use std::collections::BTreeMap;

use cylestio_events::EventBuilder;
use cylestio_patterns::PatternRegistry;
use cylestio_security::RceCorrelator;
use cylestio_types::Channel;
use cylestio_types::Value;

use crate::framework::instrument;

pub struct ToolCallRequest {
    pub tool_name: String,
    pub inputs: Value,
    pub description: Option<String>,
}

pub struct ToolCallResponse {
    pub output: Value,
}

/// Wraps a tool invocation (§4.7.2). If `inputs` looks SQL-shaped, also runs
/// it through the RCE correlator's SQL-to-shell analysis (§4.8); any finding
/// is folded into the finish event's attributes rather than emitted
/// separately, since the tool call itself is the originating event here.
pub fn call_tool<F, E>(
    events: &EventBuilder,
    registry: &PatternRegistry,
    correlator: &RceCorrelator,
    now: f64,
    request: ToolCallRequest,
    call: F,
) -> Result<ToolCallResponse, E>
where
    F: FnOnce() -> Result<ToolCallResponse, E>,
    E: std::error::Error,
{
    let mut attrs = BTreeMap::new();
    attrs.insert("tool.name".to_string(), Value::string(request.tool_name.clone()));
    attrs.insert("tool.inputs".to_string(), request.inputs.clone());
    if let Some(description) = &request.description {
        attrs.insert("tool.description".to_string(), Value::string(description.clone()));
    }

    let sql_text = request.inputs.as_text();
    if looks_like_sql(&sql_text) {
        let alerts = correlator.analyze_sql_for_rce(registry, &sql_text, "tool://local", "CALL", now);
        if !alerts.is_empty() {
            attrs.insert(
                "security.sql_rce_alerts".to_string(),
                Value::Array(
                    alerts
                        .iter()
                        .map(|a| Value::string(a.alert_type))
                        .collect(),
                ),
            );
        }
    }

    instrument(
        events,
        Channel::Tool,
        "tool",
        &request.tool_name,
        Value::Object(attrs),
        call,
        |response| {
            let mut resp_attrs = BTreeMap::new();
            resp_attrs.insert("tool.success".to_string(), Value::Bool(true));
            resp_attrs.insert("tool.output".to_string(), response.output.clone());
            Value::Object(resp_attrs)
        },
    )
}

fn looks_like_sql(text: &str) -> bool {
    let upper = text.to_uppercase();
    ["SELECT ", "INSERT ", "UPDATE ", "DELETE ", "WHERE "]
        .iter()
        .any(|kw| upper.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cylestio_patterns::PatternConfig;
    use cylestio_trace::TraceContext;

    #[test]
    fn non_sql_tool_calls_skip_rce_analysis() {
        TraceContext::reset();
        TraceContext::initialize_trace("agent-1");
        let events = EventBuilder::new(vec![]);
        let registry = PatternRegistry::load(&PatternConfig::default());
        let correlator = RceCorrelator::new();

        let request = ToolCallRequest {
            tool_name: "read_file".to_string(),
            inputs: Value::string("/tmp/a.txt"),
            description: None,
        };
        let result: Result<ToolCallResponse, std::io::Error> =
            call_tool(&events, &registry, &correlator, 1000.0, request, || {
                Ok(ToolCallResponse { output: Value::string("contents") })
            });
        assert!(result.is_ok());
    }

    #[test]
    fn sql_to_shell_pivot_is_surfaced_on_the_finish_event() {
        TraceContext::reset();
        TraceContext::initialize_trace("agent-1");
        let events = EventBuilder::new(vec![]);
        let registry = PatternRegistry::load(&PatternConfig::default());
        let correlator = RceCorrelator::new();

        let request = ToolCallRequest {
            tool_name: "run_query".to_string(),
            inputs: Value::string("SELECT * FROM users WHERE name = '/bin/sh -c whoami'"),
            description: None,
        };
        let result: Result<ToolCallResponse, std::io::Error> =
            call_tool(&events, &registry, &correlator, 1000.0, request, || {
                Ok(ToolCallResponse { output: Value::Null })
            });
        assert!(result.is_ok());
    }
}
