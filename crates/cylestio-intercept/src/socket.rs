//! Socket interception (§4.7.4): wraps raw connect/send/recv calls,
//! classifying the destination and scanning payloads for shell-access
//! signatures (§4.8).

use std::collections::BTreeMap;

use cylestio_events::EventBuilder;
use cylestio_patterns::{PatternRegistry, RegexFamily};
use cylestio_types::{Channel, EventBuilderInput, Level, Value};

const DEFAULT_SELF_TRAFFIC: &str = "127.0.0.1:8000";
const C2_PORTS: &[u16] = &[4444, 4445, 1337, 6667, 6668, 6669, 31337];
const EXFIL_PORTS: &[u16] = &[21, 22, 2222, 23];
const LOW_SEVERITY_PORTS: &[u16] = &[80, 443, 8080, 8443];

/// The set of `host:port` endpoints considered the monitor's own outbound
/// telemetry traffic, excluded from interception (§4.7.4). Seeded from an
/// env var, falling back to config, falling back to the built-in default
/// expanded with the usual web ports.
pub struct SelfTrafficExclusions {
    endpoints: Vec<String>,
}

impl SelfTrafficExclusions {
    pub fn new(env_value: Option<&str>, configured: Option<&str>) -> Self {
        let base = env_value
            .or(configured)
            .unwrap_or(DEFAULT_SELF_TRAFFIC)
            .to_string();
        let host = base.split(':').next().unwrap_or("127.0.0.1").to_string();
        let endpoints = vec![base.clone(), format!("{host}:80"), format!("{host}:443")];
        Self { endpoints }
    }

    pub fn excludes(&self, host: &str, port: u16) -> bool {
        self.endpoints.iter().any(|e| e == &format!("{host}:{port}"))
    }
}

fn is_dotted_quad(host: &str) -> bool {
    host.split('.').count() == 4 && host.split('.').all(|part| part.parse::<u8>().is_ok())
}

fn classify_category(host: &str, port: u16) -> &'static str {
    if C2_PORTS.contains(&port) {
        "potential_c2"
    } else if EXFIL_PORTS.contains(&port) {
        "potential_exfiltration"
    } else if is_dotted_quad(host) {
        "direct_ip"
    } else {
        "outbound_connection"
    }
}

fn classify_severity(host: &str, port: u16) -> Level {
    if (host == "127.0.0.1" || host == "localhost") || LOW_SEVERITY_PORTS.contains(&port) {
        Level::Info
    } else if C2_PORTS.contains(&port) {
        Level::Critical
    } else if EXFIL_PORTS.contains(&port) {
        Level::Error
    } else {
        Level::Warning
    }
}

pub struct SocketConnection {
    pub host: String,
    pub port: u16,
}

/// Records a single `connect()` call as `net.conn_open`, with a conditional
/// `security.alert` when the destination classifies above the lowest
/// severity tier. Returns without emitting anything for self-traffic.
pub fn record_connection(
    events: &EventBuilder,
    exclusions: &SelfTrafficExclusions,
    conn: &SocketConnection,
) {
    if exclusions.excludes(&conn.host, conn.port) {
        return;
    }

    let category = classify_category(&conn.host, conn.port);
    let severity = classify_severity(&conn.host, conn.port);

    let mut attrs = BTreeMap::new();
    attrs.insert("net.host".to_string(), Value::string(conn.host.clone()));
    attrs.insert("net.port".to_string(), Value::Number(conn.port.into()));
    attrs.insert("net.category".to_string(), Value::string(category));

    events.log_event(
        EventBuilderInput::new("net.conn_open")
            .with_channel(Channel::Network)
            .with_level(severity)
            .with_attributes(Value::Object(attrs.clone())),
    );

    if severity >= Level::Warning {
        events.log_event(
            EventBuilderInput::new("security.alert")
                .with_channel(Channel::Security)
                .with_level(severity)
                .with_attributes(Value::Object(attrs)),
        );
    }
}

/// Scans outbound/inbound socket payload bytes for shell-access signatures
/// (§4.8). On a match, emits a CRITICAL `security.alert` tagged
/// `remote_code_execution`.
pub fn scan_payload(
    events: &EventBuilder,
    registry: &PatternRegistry,
    exclusions: &SelfTrafficExclusions,
    conn: &SocketConnection,
    payload: &str,
) {
    if exclusions.excludes(&conn.host, conn.port) {
        return;
    }

    let matches = registry.scan_family(RegexFamily::ShellAccessNetwork, payload);
    if matches.is_empty() {
        return;
    }

    let mut attrs = BTreeMap::new();
    attrs.insert("net.host".to_string(), Value::string(conn.host.clone()));
    attrs.insert("net.port".to_string(), Value::Number(conn.port.into()));
    attrs.insert("security.category".to_string(), Value::string("remote_code_execution"));
    attrs.insert(
        "security.matches".to_string(),
        Value::Array(matches.iter().map(|m| Value::string(m.pattern_name.clone())).collect()),
    );

    events.log_event(
        EventBuilderInput::new("security.alert")
            .with_channel(Channel::Security)
            .with_level(Level::Critical)
            .with_attributes(Value::Object(attrs)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use cylestio_patterns::PatternConfig;
    use cylestio_trace::TraceContext;

    #[test]
    fn self_traffic_is_never_reported() {
        let exclusions = SelfTrafficExclusions::new(None, None);
        assert!(exclusions.excludes("127.0.0.1", 8000));
        assert!(exclusions.excludes("127.0.0.1", 443));
        assert!(!exclusions.excludes("10.0.0.5", 4444));
    }

    #[test]
    fn c2_port_classifies_as_potential_c2_with_critical_severity() {
        assert_eq!(classify_category("10.0.0.5", 4444), "potential_c2");
        assert_eq!(classify_severity("10.0.0.5", 4444), Level::Critical);
    }

    #[test]
    fn shell_banner_payload_raises_a_critical_rce_alert() {
        TraceContext::reset();
        TraceContext::initialize_trace("agent-1");
        let events = EventBuilder::new(vec![]);
        let registry = PatternRegistry::load(&PatternConfig::default());
        let exclusions = SelfTrafficExclusions::new(None, None);
        let conn = SocketConnection { host: "10.0.0.5".to_string(), port: 4444 };

        scan_payload(&events, &registry, &exclusions, &conn, "uid=0(root) gid=0(root)\n$ ");
    }
}
