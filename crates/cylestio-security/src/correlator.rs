use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use cylestio_patterns::{PatternRegistry, RegexFamily};

/// Default correlation window (§4.8): a shell seen within this many seconds
/// of an HTTP request's timestamp is treated as plausibly triggered by it.
pub const DEFAULT_CORRELATION_WINDOW_SECS: f64 = 15.0;

/// Severity attached to a correlated or inferred RCE finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RceSeverity {
    Medium,
    Critical,
}

impl RceSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            RceSeverity::Medium => "medium",
            RceSeverity::Critical => "critical",
        }
    }
}

/// A shell process sighting, real or virtual (§4.8). Virtual shells
/// (inferred from a SQL-to-shell pivot rather than a directly observed
/// spawn) get a negative, timestamp-derived pseudo-PID.
#[derive(Debug, Clone)]
pub struct ShellProcess {
    pub pid: i64,
    pub parent_pid: i64,
    pub executable: String,
    pub timestamp: f64,
    pub http_correlated: bool,
    pub http_requests: Vec<HttpContext>,
}

#[derive(Debug, Clone)]
pub struct HttpContext {
    pub url: String,
    pub method: String,
    pub timestamp: f64,
}

/// A finding the correlator wants turned into a `security.alert` event. The
/// caller (the interception layer, §4.7) is responsible for actually
/// emitting it through the event pipeline; the correlator only classifies.
#[derive(Debug, Clone)]
pub struct CorrelationAlert {
    pub alert_type: &'static str,
    pub severity: RceSeverity,
    pub evidence: String,
    pub shell_pid: Option<i64>,
    pub http_url: Option<String>,
    pub http_method: Option<String>,
    pub command: Option<String>,
}

/// Common short identifiers that SQL extraction must not mistake for shell
/// commands (§4.8).
const COMMON_LEGITIMATE_VALUES: &[&str] = &[
    "id", "name", "type", "path", "value", "data", "key", "state", "file", "user", "status",
    "mode", "size", "date",
];

const HIGH_RISK_INDICATORS: &[&str] = &[
    "enable-shell", "bash", "/bin/", "cmd.exe", "powershell", "wget", "curl", "nc ", "netcat",
    "|", ";", "`", "unsafe", "&", "system(", "exec(",
];

/// Joins shell-process sightings to HTTP request timings to catch
/// SQL-parameter-to-shell-command pivots (§4.8). All state lives behind one
/// lock; sections are O(1) inserts and O(k) window scans for small k (§5).
pub struct RceCorrelator {
    state: Mutex<State>,
}

struct State {
    shell_processes: HashMap<i64, ShellProcess>,
    http_requests: Vec<HttpContext>,
}

impl Default for RceCorrelator {
    fn default() -> Self {
        RceCorrelator {
            state: Mutex::new(State {
                shell_processes: HashMap::new(),
                http_requests: Vec::new(),
            }),
        }
    }
}

impl RceCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_shell_process(&self, pid: i64, parent_pid: i64, executable: &str, ts: f64) {
        let mut state = self.state.lock().unwrap();
        state.shell_processes.insert(
            pid,
            ShellProcess {
                pid,
                parent_pid,
                executable: executable.to_string(),
                timestamp: ts,
                http_correlated: false,
                http_requests: Vec::new(),
            },
        );
    }

    /// Shell sightings within `window_s` seconds of now (§4.8).
    pub fn recent_shell_processes(&self, window_s: f64, now: f64) -> Vec<ShellProcess> {
        let state = self.state.lock().unwrap();
        state
            .shell_processes
            .values()
            .filter(|p| now - p.timestamp <= window_s)
            .cloned()
            .collect()
    }

    /// Register an HTTP request, bounding the per-process history to the
    /// last 20 entries (§4.8).
    pub fn register_http_request(&self, url: &str, method: &str, now: f64) -> HttpContext {
        let context = HttpContext {
            url: url.to_string(),
            method: method.to_string(),
            timestamp: now,
        };
        let mut state = self.state.lock().unwrap();
        state.http_requests.push(context.clone());
        let len = state.http_requests.len();
        if len > 20 {
            state.http_requests.drain(0..len - 20);
        }
        context
    }

    /// After registering a request, check whether any shell spawned within
    /// `[request.timestamp, request.timestamp + window)` might be its
    /// effect, and mark it correlated if so (§4.8).
    pub fn check_for_shell_correlation(
        &self,
        http_context: &HttpContext,
        window_s: f64,
    ) -> Vec<CorrelationAlert> {
        let mut alerts = Vec::new();
        let mut state = self.state.lock().unwrap();
        for shell in state.shell_processes.values_mut() {
            if shell.timestamp >= http_context.timestamp
                && shell.timestamp <= http_context.timestamp + window_s
            {
                shell.http_correlated = true;
                shell.http_requests.push(http_context.clone());
                alerts.push(CorrelationAlert {
                    alert_type: "Shell Process Execution via HTTP",
                    severity: RceSeverity::Critical,
                    evidence: format!(
                        "Shell process {} (PID: {}) executed after HTTP request to {}",
                        shell.executable, shell.pid, http_context.url
                    ),
                    shell_pid: Some(shell.pid),
                    http_url: Some(http_context.url.clone()),
                    http_method: Some(http_context.method.clone()),
                    command: None,
                });
            }
        }
        alerts
    }

    /// Gate-then-extract SQL-to-shell analysis (§4.7.5, §4.8): skip unless a
    /// high-risk indicator is present, then pull candidate commands out of
    /// `mcp_command_extraction` matches and register each surviving one as a
    /// virtual shell execution.
    pub fn analyze_sql_for_rce(
        &self,
        registry: &PatternRegistry,
        sql: &str,
        url: &str,
        method: &str,
        now: f64,
    ) -> Vec<CorrelationAlert> {
        let commands = extract_commands_from_sql(registry, sql);
        commands
            .into_iter()
            .filter_map(|cmd| self.register_virtual_shell_execution(&cmd, url, method, now))
            .collect()
    }

    fn register_virtual_shell_execution(
        &self,
        command: &str,
        url: &str,
        method: &str,
        now: f64,
    ) -> Option<CorrelationAlert> {
        let lower = command.to_lowercase();
        if COMMON_LEGITIMATE_VALUES.contains(&lower.as_str()) && command.len() < 15 {
            return None;
        }

        let severity = if HIGH_RISK_INDICATORS.iter().any(|ind| lower.contains(ind)) {
            RceSeverity::Critical
        } else {
            RceSeverity::Medium
        };

        let pseudo_pid = -((now * 1000.0) as i64 % 100_000);
        let shell_path = if cfg!(target_os = "windows") { "cmd.exe" } else { "/bin/sh" };
        self.register_shell_process(pseudo_pid, std::process::id() as i64, shell_path, now);

        Some(CorrelationAlert {
            alert_type: "MCP Shell Command Execution in SQL Query",
            severity,
            evidence: format!(
                "SQL query containing shell command '{command}' was executed via HTTP {method} to {url}"
            ),
            shell_pid: Some(pseudo_pid),
            http_url: Some(url.to_string()),
            http_method: Some(method.to_string()),
            command: Some(command.to_string()),
        })
    }
}

/// Wall-clock seconds as an `f64`, matching the original's `time.time()`
/// semantics and the `±15s` correlation window.
pub fn now_secs(timestamp: DateTime<Utc>) -> f64 {
    timestamp.timestamp() as f64 + timestamp.timestamp_subsec_nanos() as f64 / 1e9
}

/// Convenience for call sites that just want "now" without threading a
/// timestamp through; kept separate from `now_secs` so callers driving
/// deterministic tests can pass an explicit `DateTime<Utc>` instead.
pub fn system_now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Ported from `http_patcher.py::_extract_commands_from_sql`: gated on
/// high-risk indicators first (to skip ordinary application SQL), then
/// matched against `mcp_command_extraction`, then filtered down to
/// shell-command-shaped tokens.
fn extract_commands_from_sql(registry: &PatternRegistry, sql: &str) -> Vec<String> {
    let lower = sql.to_lowercase();
    if !HIGH_RISK_INDICATORS.iter().any(|ind| lower.contains(ind)) {
        return Vec::new();
    }

    const SHELL_COMMANDS: &[&str] = &[
        "ls", "cd", "pwd", "cat", "echo", "whoami", "id", "ps", "netstat", "curl", "wget",
        "chmod", "mkdir", "rm", "cp", "mv",
    ];

    let mut commands = Vec::new();
    for pattern in RegexFamily::McpCommandExtraction.patterns() {
        for captures in pattern.regex.captures_iter(sql) {
            let Some(group) = captures.get(1) else { continue };
            let command = group.as_str().trim();
            if command.is_empty() {
                continue;
            }

            let command_lower = command.to_lowercase();
            if COMMON_LEGITIMATE_VALUES.contains(&command_lower.as_str()) && command.len() < 10 {
                continue;
            }

            let first_word = command.split_whitespace().next().unwrap_or(command);
            let has_args_or_path = command.contains(" -")
                || command.contains('/')
                || command.contains('\\')
                || command.split_whitespace().count() > 1;

            let is_shell_command = (SHELL_COMMANDS.contains(&first_word) && has_args_or_path)
                || ((command.contains('/') || command.contains('\\'))
                    && ["bin", "usr", "etc", "sbin", "cmd.exe", "powershell"]
                        .iter()
                        .any(|s| command.contains(s)));

            if is_shell_command {
                commands.push(command.to_string());
            }
        }
    }
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use cylestio_patterns::PatternConfig;

    #[test]
    fn recent_shell_processes_respects_window() {
        let correlator = RceCorrelator::new();
        correlator.register_shell_process(123, 1, "/bin/sh", 1000.0);
        assert_eq!(correlator.recent_shell_processes(15.0, 1010.0).len(), 1);
        assert_eq!(correlator.recent_shell_processes(15.0, 1100.0).len(), 0);
    }

    #[test]
    fn http_request_history_is_bounded_to_twenty() {
        let correlator = RceCorrelator::new();
        for i in 0..25 {
            correlator.register_http_request("http://x", "GET", i as f64);
        }
        let state = correlator.state.lock().unwrap();
        assert_eq!(state.http_requests.len(), 20);
    }

    #[test]
    fn shell_within_window_after_request_correlates() {
        let correlator = RceCorrelator::new();
        let ctx = correlator.register_http_request("http://x/mcp/query", "POST", 1000.0);
        correlator.register_shell_process(42, 1, "/bin/sh", 1005.0);
        let alerts = correlator.check_for_shell_correlation(&ctx, 15.0);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, RceSeverity::Critical);
    }

    #[test]
    fn benign_sql_without_high_risk_indicators_extracts_nothing() {
        let registry = PatternRegistry::load(&PatternConfig::default());
        let commands = extract_commands_from_sql(&registry, "SELECT * FROM users WHERE id = 'abc'");
        assert!(commands.is_empty());
    }

    #[test]
    fn sql_to_shell_pivot_registers_virtual_shell_and_alerts() {
        let registry = PatternRegistry::load(&PatternConfig::default());
        let correlator = RceCorrelator::new();
        let sql = "SELECT * FROM users WHERE name = '/bin/sh -c whoami'";
        let alerts = correlator.analyze_sql_for_rce(&registry, sql, "http://x/mcp/query", "POST", 1000.0);
        assert!(!alerts.is_empty());
        assert_eq!(alerts[0].severity, RceSeverity::Critical);
    }
}
