use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable consulted by `resolve_db_path` before falling back
/// to the platform data directory (§6, Environment variables).
pub const TEST_DB_DIR_VAR: &str = "CYLESTIO_TEST_DB_DIR";

/// Expand a leading `~/` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Resolve the SQLite database path (§4.6, Initialize):
/// 1. Explicit path argument.
/// 2. `CYLESTIO_TEST_DB_DIR` (so test suites never touch the real data dir).
/// 3. The platform user-data directory, `<data_dir>/cylestio/cylestio_monitor.db`.
pub fn resolve_db_path(explicit_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    if let Ok(test_dir) = std::env::var(TEST_DB_DIR_VAR) {
        return Ok(PathBuf::from(test_dir).join("cylestio_monitor.db"));
    }

    if let Some(data_dir) = dirs::data_dir() {
        return Ok(data_dir.join("cylestio").join("cylestio_monitor.db"));
    }

    Err(Error::Config(
        "could not determine a database path: no explicit path, CYLESTIO_TEST_DB_DIR, or platform data directory"
            .to_string(),
    ))
}

/// Resolve the JSON-lines log file path for the file sink (§6,
/// `monitoring.log_file`):
/// - If `configured` names an existing directory (or ends in `/`), the file
///   is named `{agent_id}_monitoring_{YYYYMMDD_HHMMSS}.json` inside it.
/// - Otherwise `configured` is treated as a file path; a missing extension
///   gets `.json` appended.
/// - With no `configured` value, falls back to the platform data directory.
pub fn resolve_log_file_path(
    configured: Option<&str>,
    agent_id: &str,
    now: DateTime<Utc>,
) -> Result<PathBuf> {
    let stamp = now.format("%Y%m%d_%H%M%S");

    let base = match configured {
        Some(raw) => expand_tilde(raw),
        None => dirs::data_dir()
            .map(|d| d.join("cylestio"))
            .ok_or_else(|| {
                Error::Config("no log_file configured and no platform data directory".to_string())
            })?,
    };

    let looks_like_dir = configured.map(|s| s.ends_with('/')).unwrap_or(false) || base.is_dir();

    if looks_like_dir {
        return Ok(base.join(format!("{agent_id}_monitoring_{stamp}.json")));
    }

    Ok(ensure_json_extension(&base))
}

fn ensure_json_extension(path: &Path) -> PathBuf {
    match path.extension() {
        Some(_) => path.to_path_buf(),
        None => path.with_extension("json"),
    }
}

/// Fallback path used by the file sink when the primary log write fails
/// (§4.5): `~/cylestio_monitor_fallback_YYYYMMDD.json`.
pub fn fallback_log_path(now: DateTime<Utc>) -> PathBuf {
    let stamp = now.format("%Y%m%d");
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(format!("cylestio_monitor_fallback_{stamp}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 30, 12, 0, 0).unwrap()
    }

    #[test]
    fn resolves_explicit_db_path() {
        let path = resolve_db_path(Some("/tmp/explicit.db")).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/explicit.db"));
    }

    #[test]
    fn appends_json_extension_when_missing() {
        let path = resolve_log_file_path(Some("/tmp/mylog"), "agent-1", ts()).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/mylog.json"));
    }

    #[test]
    fn keeps_existing_extension() {
        let path = resolve_log_file_path(Some("/tmp/mylog.jsonl"), "agent-1", ts()).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/mylog.jsonl"));
    }

    #[test]
    fn builds_directory_file_name_from_agent_and_timestamp() {
        let path = resolve_log_file_path(Some("/tmp/logs/"), "agent-7", ts()).unwrap();
        assert_eq!(
            path,
            PathBuf::from("/tmp/logs/agent-7_monitoring_20260730_120000.json")
        );
    }

    #[test]
    fn fallback_path_is_dated_and_in_home() {
        let path = fallback_log_path(ts());
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .contains("cylestio_monitor_fallback_20260730"));
    }
}
