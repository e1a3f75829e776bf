//! Process interception (§4.7.3): wraps subprocess spawning, classifying
//! each exec for suspicious shell usage, dangerous substrings, execution
//! from a suspicious directory, and privilege escalation, then hands every
//! detected shell to the RCE correlator (§4.8).

use std::collections::BTreeMap;

use cylestio_events::EventBuilder;
use cylestio_patterns::{PatternRegistry, RegexFamily};
use cylestio_security::RceCorrelator;
use cylestio_types::{Channel, EventBuilderInput, Level, Value};

/// Selected env-var names whose *presence* (never value) is recorded
/// (§4.7.3).
const TRACKED_ENV_VARS: &[&str] = &["PATH", "HOME", "TEMP", "TMP"];
const TRACKED_ENV_PREFIXES: &[&str] = &["PYTHON", "LD_", "DYLD_"];

/// A process spawn observed by the host's subprocess adapter.
pub struct ProcessSpawn {
    pub executable: String,
    pub argv: Vec<String>,
    pub shell: bool,
    pub parent_pid: i64,
    pub user: String,
    pub uid: i64,
    pub euid: i64,
    pub gid: i64,
    pub egid: i64,
    pub cwd: String,
    pub calling_context: Vec<String>,
    pub present_env_vars: Vec<String>,
}

impl ProcessSpawn {
    fn command_line(&self) -> String {
        self.argv.join(" ")
    }

    fn privileged(&self) -> bool {
        self.euid == 0
    }
}

/// Filters `ProcessSpawn::present_env_vars` down to the names §4.7.3 tracks;
/// callers build `present_env_vars` from whatever variables are actually set
/// in the host process, this just narrows the reported set.
pub fn tracked_env_vars(all_set: &[String]) -> Vec<String> {
    all_set
        .iter()
        .filter(|name| {
            TRACKED_ENV_VARS.contains(&name.as_str())
                || TRACKED_ENV_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
        })
        .cloned()
        .collect()
}

/// Known system-utility subprocesses spawned by common language-runtime
/// callers, down-graded to `info` (§4.7.3).
fn is_known_runtime_utility(spawn: &ProcessSpawn) -> bool {
    const RUNTIME_CALLERS: &[&str] = &["node", "python", "ruby", "java", "cargo", "npm"];
    const BENIGN_UTILITIES: &[&str] = &["git", "uname", "which", "env", "true", "false"];

    BENIGN_UTILITIES.iter().any(|u| spawn.executable.ends_with(u))
        && spawn
            .calling_context
            .iter()
            .any(|frame| RUNTIME_CALLERS.iter().any(|c| frame.contains(c)))
}

/// Records `pid -> last calling context kind` to detect a context transition
/// (§4.7.3: "same executable previously seen from database-related calling
/// contexts now invoked from elsewhere").
#[derive(Default)]
pub struct ContextTracker {
    last_context: std::sync::Mutex<BTreeMap<String, bool>>,
}

impl ContextTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if this spawn's calling context (database-related or
    /// not) differs from the last one recorded for the same executable.
    fn observe_transition(&self, spawn: &ProcessSpawn) -> bool {
        let is_db_context = spawn
            .calling_context
            .iter()
            .any(|frame| frame.contains("db") || frame.contains("sql") || frame.contains("query"));
        let mut last = self.last_context.lock().unwrap();
        let transitioned = last
            .get(&spawn.executable)
            .is_some_and(|&was_db| was_db != is_db_context);
        last.insert(spawn.executable.clone(), is_db_context);
        transitioned
    }
}

/// Emits `process.exec` (and, on success, `process.started`) for one
/// subprocess spawn (§4.7.3). Always runs the detection rules and, for every
/// shell process found, registers it with `correlator`.
pub fn record_process_exec(
    events: &EventBuilder,
    registry: &PatternRegistry,
    correlator: &RceCorrelator,
    tracker: &ContextTracker,
    now: f64,
    spawn: &ProcessSpawn,
    child_pid: Option<i64>,
) {
    let command_line = spawn.command_line();

    let mut alerts: Vec<&'static str> = Vec::new();
    if !registry.scan_family(RegexFamily::SuspiciousShell, &command_line).is_empty() {
        alerts.push("suspicious_shell_usage");
    }
    if !registry
        .scan_family(RegexFamily::ProcessDangerousCommands, &command_line)
        .is_empty()
    {
        alerts.push("dangerous_command");
    }
    if registry
        .scan_family(RegexFamily::SuspiciousDirectories, &spawn.cwd)
        .len()
        > 0
    {
        alerts.push("suspicious_directory");
    }
    if registry
        .scan_family(RegexFamily::PrivilegeEscalationCommands, &command_line)
        .len()
        > 0
        || spawn.privileged()
    {
        alerts.push("privilege_escalation");
    }
    if tracker.observe_transition(spawn) {
        alerts.push("mcp_shell_transition");
    }

    let level = if is_known_runtime_utility(spawn) {
        Level::Info
    } else {
        Level::Warning
    };

    let mut attrs = BTreeMap::new();
    attrs.insert("process.executable".to_string(), Value::string(spawn.executable.clone()));
    attrs.insert("process.argv".to_string(), Value::string(command_line.clone()));
    attrs.insert("process.shell".to_string(), Value::Bool(spawn.shell));
    attrs.insert("process.parent_pid".to_string(), Value::Number(spawn.parent_pid.into()));
    attrs.insert("process.user".to_string(), Value::string(spawn.user.clone()));
    attrs.insert("process.uid".to_string(), Value::Number(spawn.uid.into()));
    attrs.insert("process.euid".to_string(), Value::Number(spawn.euid.into()));
    attrs.insert("process.gid".to_string(), Value::Number(spawn.gid.into()));
    attrs.insert("process.egid".to_string(), Value::Number(spawn.egid.into()));
    attrs.insert("process.privileged".to_string(), Value::Bool(spawn.privileged()));
    attrs.insert("process.cwd".to_string(), Value::string(spawn.cwd.clone()));
    attrs.insert(
        "process.calling_context".to_string(),
        Value::Array(spawn.calling_context.iter().cloned().map(Value::string).collect()),
    );
    attrs.insert(
        "process.env_vars_present".to_string(),
        Value::Array(spawn.present_env_vars.iter().cloned().map(Value::string).collect()),
    );
    if !alerts.is_empty() {
        attrs.insert(
            "security.alerts".to_string(),
            Value::Array(alerts.iter().map(|a| Value::string(*a)).collect()),
        );
    }

    let input = EventBuilderInput::new("process.exec")
        .with_channel(Channel::System)
        .with_level(level)
        .with_attributes(Value::Object(attrs));
    events.log_event(input);

    if spawn.shell || command_line.to_lowercase().contains("sh ") || command_line.contains("/bin/sh") {
        let pid = child_pid.unwrap_or_else(|| -((now * 1000.0) as i64 % 100_000));
        correlator.register_shell_process(pid, spawn.parent_pid, &spawn.executable, now);
    }

    if let Some(pid) = child_pid {
        let mut started_attrs = BTreeMap::new();
        started_attrs.insert("process.pid".to_string(), Value::Number(pid.into()));
        events.log_event(
            EventBuilderInput::new("process.started")
                .with_channel(Channel::System)
                .with_attributes(Value::Object(started_attrs)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cylestio_patterns::PatternConfig;
    use cylestio_trace::TraceContext;

    fn sample() -> ProcessSpawn {
        ProcessSpawn {
            executable: "/bin/sh".to_string(),
            argv: vec!["/bin/sh".to_string(), "-c".to_string(), "id".to_string()],
            shell: true,
            parent_pid: 1,
            user: "root".to_string(),
            uid: 0,
            euid: 0,
            gid: 0,
            egid: 0,
            cwd: "/tmp".to_string(),
            calling_context: vec!["handler.py:10:run".to_string()],
            present_env_vars: vec!["PATH".to_string(), "PYTHONPATH".to_string(), "SECRET".to_string()],
        }
    }

    #[test]
    fn tracked_env_vars_excludes_untracked_names() {
        let tracked = tracked_env_vars(&sample().present_env_vars);
        assert!(tracked.contains(&"PATH".to_string()));
        assert!(tracked.contains(&"PYTHONPATH".to_string()));
        assert!(!tracked.contains(&"SECRET".to_string()));
    }

    #[test]
    fn reconnaissance_tool_not_in_scanner_keywords_is_still_flagged() {
        let registry = PatternRegistry::load(&PatternConfig::default());
        assert!(!registry.scan_family(RegexFamily::ProcessDangerousCommands, "nmap -sV 10.0.0.1").is_empty());
        assert!(!registry.scan_family(RegexFamily::ProcessDangerousCommands, "ssh-keygen -t rsa").is_empty());
        assert!(!registry.scan_family(RegexFamily::ProcessDangerousCommands, "msfvenom -p linux/x86/shell").is_empty());
    }

    #[test]
    fn shell_spawn_is_registered_with_the_correlator() {
        TraceContext::reset();
        TraceContext::initialize_trace("agent-1");
        let events = EventBuilder::new(vec![]);
        let registry = PatternRegistry::load(&PatternConfig::default());
        let correlator = RceCorrelator::new();
        let tracker = ContextTracker::new();

        record_process_exec(&events, &registry, &correlator, &tracker, 1000.0, &sample(), Some(555));
        assert_eq!(correlator.recent_shell_processes(15.0, 1000.0).len(), 1);
    }
}
