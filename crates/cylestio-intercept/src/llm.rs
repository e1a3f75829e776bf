//! LLM interception (§4.7.1): wraps a vendor's "create message / create
//! completion" entry point with request/response attribute capture and a
//! pre- and post-call security scan.

use std::collections::BTreeMap;

use cylestio_events::EventBuilder;
use cylestio_security::Scanner;
use cylestio_types::{AlertLevel, Channel, Value};

use crate::framework::instrument;

/// Request-side shape an adapter builds before calling [`call_llm`]. `vendor`
/// is e.g. `"anthropic"`/`"openai"`.
pub struct LlmRequest {
    pub vendor: String,
    pub model: String,
    pub request_type: String,
    pub messages: Value,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i64>,
    pub top_p: Option<f64>,
    pub frequency_penalty: Option<f64>,
    pub presence_penalty: Option<f64>,
    pub stop: Option<Value>,
}

/// Response-side shape an adapter extracts from the vendor's return value.
pub struct LlmResponse {
    pub id: Option<String>,
    pub response_type: Option<String>,
    pub content: Value,
    pub stop_reason: Option<String>,
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
}

fn alert_level_str(level: AlertLevel) -> &'static str {
    match level {
        AlertLevel::None => "none",
        AlertLevel::Suspicious => "suspicious",
        AlertLevel::Dangerous => "dangerous",
    }
}

fn push_optional(map: &mut BTreeMap<String, Value>, key: &str, value: Option<f64>) {
    if let Some(v) = value {
        if let Some(n) = serde_json::Number::from_f64(v) {
            map.insert(key.to_string(), Value::Number(n));
        }
    }
}

/// Runs `call` (the vendor SDK invocation) through the instrument-around
/// pattern, scanning the user-facing request content before the call and the
/// response content after it (§4.7.1).
pub fn call_llm<F, E>(
    events: &EventBuilder,
    scanner: &Scanner,
    request: LlmRequest,
    call: F,
) -> Result<LlmResponse, E>
where
    F: FnOnce() -> Result<LlmResponse, E>,
    E: std::error::Error,
{
    let mut attrs = BTreeMap::new();
    attrs.insert("llm.vendor".to_string(), Value::string(request.vendor.clone()));
    attrs.insert("llm.model".to_string(), Value::string(request.model.clone()));
    attrs.insert(
        "llm.request.type".to_string(),
        Value::string(request.request_type.clone()),
    );
    attrs.insert("llm.request.data".to_string(), request.messages.clone());
    push_optional(&mut attrs, "llm.request.temperature", request.temperature);
    if let Some(tokens) = request.max_tokens {
        attrs.insert("llm.request.max_tokens".to_string(), Value::Number(tokens.into()));
    }
    push_optional(&mut attrs, "llm.request.top_p", request.top_p);
    push_optional(&mut attrs, "llm.request.frequency_penalty", request.frequency_penalty);
    push_optional(&mut attrs, "llm.request.presence_penalty", request.presence_penalty);
    if let Some(stop) = request.stop.clone() {
        attrs.insert("llm.request.stop".to_string(), stop);
    }

    let pre_scan = scanner.scan_text(&request.messages.as_text());
    if pre_scan.alert_level != AlertLevel::None {
        attrs.insert(
            "security.alert_level".to_string(),
            Value::string(alert_level_str(pre_scan.alert_level)),
        );
        attrs.insert(
            "security.keywords".to_string(),
            Value::Array(pre_scan.keywords.iter().cloned().map(Value::string).collect()),
        );
        if let Some(category) = pre_scan.category {
            attrs.insert("security.category".to_string(), Value::string(category));
        }
        events.log_event(cylestio_types::EventBuilderInput::new(format!(
            "security.content.{}",
            alert_level_str(pre_scan.alert_level)
        ))
        .with_channel(Channel::Security)
        .with_attributes(Value::Object(attrs.clone())));
    }

    instrument(events, Channel::Llm, "llm", "call", Value::Object(attrs), call, |response| {
        let mut resp_attrs = BTreeMap::new();
        if let Some(id) = &response.id {
            resp_attrs.insert("llm.response.id".to_string(), Value::string(id.clone()));
        }
        if let Some(kind) = &response.response_type {
            resp_attrs.insert("llm.response.type".to_string(), Value::string(kind.clone()));
        }
        resp_attrs.insert("llm.response.content".to_string(), response.content.clone());
        if let Some(reason) = &response.stop_reason {
            resp_attrs.insert("llm.response.stop_reason".to_string(), Value::string(reason.clone()));
        }
        if let Some(tokens) = response.input_tokens {
            resp_attrs.insert("llm.usage.input_tokens".to_string(), Value::Number(tokens.into()));
        }
        if let Some(tokens) = response.output_tokens {
            resp_attrs.insert("llm.usage.output_tokens".to_string(), Value::Number(tokens.into()));
        }
        if let (Some(input), Some(output)) = (response.input_tokens, response.output_tokens) {
            resp_attrs.insert("llm.usage.total_tokens".to_string(), Value::Number((input + output).into()));
        }

        let post_scan = scanner.scan_text(&response.content.as_text());
        if post_scan.alert_level != AlertLevel::None {
            resp_attrs.insert(
                "security.alert_level".to_string(),
                Value::string(alert_level_str(post_scan.alert_level)),
            );
            resp_attrs.insert(
                "security.keywords".to_string(),
                Value::Array(post_scan.keywords.iter().cloned().map(Value::string).collect()),
            );
            if let Some(category) = post_scan.category {
                resp_attrs.insert("security.category".to_string(), Value::string(category));
            }
            events.log_event(cylestio_types::EventBuilderInput::new(format!(
                "security.content.{}",
                alert_level_str(post_scan.alert_level)
            ))
            .with_channel(Channel::Security)
            .with_attributes(Value::Object(resp_attrs.clone())));
        }

        Value::Object(resp_attrs)
    })
}
