use rusqlite::Connection;

use crate::Result;

/// `(table, [(column, sqlite type)])` for every table the store owns, in
/// creation order (children after the tables they reference). Both
/// `init_schema` and `verify_schema`/`update_schema` are driven off this one
/// list so the three never drift apart.
const EXPECTED_SCHEMA: &[(&str, &[(&str, &str)])] = &[
    (
        "agents",
        &[
            ("agent_id", "TEXT"),
            ("name", "TEXT"),
            ("created_at", "TEXT"),
            ("last_seen", "TEXT"),
        ],
    ),
    (
        "sessions",
        &[
            ("id", "INTEGER"),
            ("agent_id", "TEXT"),
            ("start_time", "TEXT"),
            ("end_time", "TEXT"),
            ("metadata", "TEXT"),
        ],
    ),
    (
        "conversations",
        &[
            ("id", "INTEGER"),
            ("session_id", "INTEGER"),
            ("start_time", "TEXT"),
            ("end_time", "TEXT"),
            ("metadata", "TEXT"),
        ],
    ),
    (
        "events",
        &[
            ("id", "INTEGER"),
            ("agent_id", "TEXT"),
            ("session_id", "INTEGER"),
            ("conversation_id", "INTEGER"),
            ("event_type", "TEXT"),
            ("channel", "TEXT"),
            ("level", "TEXT"),
            ("direction", "TEXT"),
            ("timestamp", "TEXT"),
            ("trace_id", "TEXT"),
            ("span_id", "TEXT"),
            ("parent_span_id", "TEXT"),
            ("data", "TEXT"),
        ],
    ),
    (
        "llm_calls",
        &[
            ("event_id", "INTEGER"),
            ("model", "TEXT"),
            ("prompt", "TEXT"),
            ("response", "TEXT"),
            ("tokens_in", "INTEGER"),
            ("tokens_out", "INTEGER"),
            ("duration_ms", "INTEGER"),
            ("is_stream", "INTEGER"),
            ("temperature", "REAL"),
            ("cost", "REAL"),
        ],
    ),
    (
        "tool_calls",
        &[
            ("event_id", "INTEGER"),
            ("tool_name", "TEXT"),
            ("input_params", "TEXT"),
            ("output_result", "TEXT"),
            ("success", "INTEGER"),
            ("error_message", "TEXT"),
            ("duration_ms", "INTEGER"),
            ("blocking", "INTEGER"),
        ],
    ),
    (
        "security_alerts",
        &[
            ("event_id", "INTEGER"),
            ("alert_type", "TEXT"),
            ("severity", "TEXT"),
            ("description", "TEXT"),
            ("matched_terms", "TEXT"),
            ("action_taken", "TEXT"),
            ("timestamp", "TEXT"),
        ],
    ),
    (
        "event_security",
        &[
            ("event_id", "INTEGER"),
            ("alert_level", "TEXT"),
            ("matched_terms", "TEXT"),
            ("reason", "TEXT"),
            ("source_field", "TEXT"),
        ],
    ),
    (
        "performance_metrics",
        &[
            ("event_id", "INTEGER"),
            ("memory_usage", "INTEGER"),
            ("cpu_usage", "REAL"),
            ("duration_ms", "INTEGER"),
            ("tokens_processed", "INTEGER"),
            ("cost", "REAL"),
        ],
    ),
];

/// Tables considered system-owned by SQLite itself; never reported as
/// "extra" by `verify_schema` (§6: "`sqlite_sequence` is ignored in
/// verification").
const IGNORED_TABLES: &[&str] = &["sqlite_sequence"];

fn create_table_sql(table: &str) -> &'static str {
    match table {
        "agents" => {
            "CREATE TABLE IF NOT EXISTS agents (
                agent_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL,
                last_seen TEXT NOT NULL
            );"
        }
        "sessions" => {
            "CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                agent_id TEXT NOT NULL REFERENCES agents(agent_id),
                start_time TEXT NOT NULL,
                end_time TEXT,
                metadata TEXT
            );"
        }
        "conversations" => {
            "CREATE TABLE IF NOT EXISTS conversations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id INTEGER NOT NULL REFERENCES sessions(id),
                start_time TEXT NOT NULL,
                end_time TEXT,
                metadata TEXT
            );"
        }
        "events" => {
            "CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                agent_id TEXT NOT NULL REFERENCES agents(agent_id),
                session_id INTEGER REFERENCES sessions(id),
                conversation_id INTEGER REFERENCES conversations(id),
                event_type TEXT NOT NULL,
                channel TEXT NOT NULL,
                level TEXT NOT NULL,
                direction TEXT,
                timestamp TEXT NOT NULL,
                trace_id TEXT NOT NULL,
                span_id TEXT NOT NULL,
                parent_span_id TEXT,
                data TEXT NOT NULL
            );"
        }
        "llm_calls" => {
            "CREATE TABLE IF NOT EXISTS llm_calls (
                event_id INTEGER PRIMARY KEY REFERENCES events(id) ON DELETE CASCADE,
                model TEXT NOT NULL,
                prompt TEXT NOT NULL,
                response TEXT NOT NULL,
                tokens_in INTEGER,
                tokens_out INTEGER,
                duration_ms INTEGER,
                is_stream INTEGER NOT NULL,
                temperature REAL,
                cost REAL
            );"
        }
        "tool_calls" => {
            "CREATE TABLE IF NOT EXISTS tool_calls (
                event_id INTEGER PRIMARY KEY REFERENCES events(id) ON DELETE CASCADE,
                tool_name TEXT NOT NULL,
                input_params TEXT NOT NULL,
                output_result TEXT,
                success INTEGER NOT NULL,
                error_message TEXT,
                duration_ms INTEGER,
                blocking INTEGER NOT NULL
            );"
        }
        "security_alerts" => {
            "CREATE TABLE IF NOT EXISTS security_alerts (
                event_id INTEGER PRIMARY KEY REFERENCES events(id) ON DELETE CASCADE,
                alert_type TEXT NOT NULL,
                severity TEXT NOT NULL,
                description TEXT NOT NULL,
                matched_terms TEXT NOT NULL,
                action_taken TEXT,
                timestamp TEXT NOT NULL
            );"
        }
        "event_security" => {
            "CREATE TABLE IF NOT EXISTS event_security (
                event_id INTEGER PRIMARY KEY REFERENCES events(id) ON DELETE CASCADE,
                alert_level TEXT NOT NULL,
                matched_terms TEXT,
                reason TEXT,
                source_field TEXT
            );"
        }
        "performance_metrics" => {
            "CREATE TABLE IF NOT EXISTS performance_metrics (
                event_id INTEGER PRIMARY KEY REFERENCES events(id) ON DELETE CASCADE,
                memory_usage INTEGER,
                cpu_usage REAL,
                duration_ms INTEGER,
                tokens_processed INTEGER,
                cost REAL
            );"
        }
        other => unreachable!("no DDL registered for table {other}"),
    }
}

const INDEX_SQL: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_events_agent ON events(agent_id);",
    "CREATE INDEX IF NOT EXISTS idx_events_session ON events(session_id);",
    "CREATE INDEX IF NOT EXISTS idx_events_conversation ON events(conversation_id);",
    "CREATE INDEX IF NOT EXISTS idx_events_type ON events(event_type);",
    "CREATE INDEX IF NOT EXISTS idx_events_level ON events(level);",
    "CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp);",
    "CREATE INDEX IF NOT EXISTS idx_llm_calls_model ON llm_calls(model);",
    "CREATE INDEX IF NOT EXISTS idx_tool_calls_name ON tool_calls(tool_name);",
    "CREATE INDEX IF NOT EXISTS idx_tool_calls_success ON tool_calls(success);",
    "CREATE INDEX IF NOT EXISTS idx_security_alerts_lookup ON security_alerts(event_id, alert_type, severity, timestamp);",
    "CREATE INDEX IF NOT EXISTS idx_event_security_lookup ON event_security(event_id, alert_level);",
];

/// Create every table and index that doesn't already exist. Idempotent.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    for (table, _) in EXPECTED_SCHEMA {
        conn.execute_batch(create_table_sql(table))?;
    }
    for index in INDEX_SQL {
        conn.execute_batch(index)?;
    }
    Ok(())
}

/// Result of comparing the live database against [`EXPECTED_SCHEMA`] (§4.6).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaReport {
    pub matches: bool,
    pub missing_tables: Vec<String>,
    pub missing_columns: Vec<(String, String)>,
    pub extra_tables: Vec<String>,
    pub extra_columns: Vec<(String, String)>,
}

fn live_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names
        .into_iter()
        .filter(|n| !IGNORED_TABLES.contains(&n.as_str()))
        .collect())
}

fn live_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names)
}

/// Compare the live schema against the model. Never errors on mismatch --
/// the caller decides whether to call `update_schema` (§4.6, §7).
pub fn verify_schema(conn: &Connection) -> Result<SchemaReport> {
    let mut report = SchemaReport {
        matches: true,
        ..Default::default()
    };

    let live = live_tables(conn)?;
    let expected_names: Vec<&str> = EXPECTED_SCHEMA.iter().map(|(t, _)| *t).collect();

    for (table, columns) in EXPECTED_SCHEMA {
        if !live.contains(&table.to_string()) {
            report.missing_tables.push(table.to_string());
            report.matches = false;
            continue;
        }
        let live_cols = live_columns(conn, table)?;
        for (col, _) in *columns {
            if !live_cols.contains(&col.to_string()) {
                report.missing_columns.push((table.to_string(), col.to_string()));
                report.matches = false;
            }
        }
        for live_col in &live_cols {
            if !columns.iter().any(|(c, _)| c == live_col) {
                report
                    .extra_columns
                    .push((table.to_string(), live_col.clone()));
                report.matches = false;
            }
        }
    }

    for table in &live {
        if !expected_names.contains(&table.as_str()) {
            report.extra_tables.push(table.clone());
            report.matches = false;
        }
    }

    Ok(report)
}

/// Add missing tables and columns in a single transaction. Never drops or
/// renames anything (§4.6).
pub fn update_schema(conn: &mut Connection) -> Result<SchemaReport> {
    let before = verify_schema(conn)?;
    let tx = conn.transaction()?;

    for table in &before.missing_tables {
        tx.execute_batch(create_table_sql(table))?;
    }
    for index in INDEX_SQL {
        tx.execute_batch(index)?;
    }
    for (table, column) in &before.missing_columns {
        let sql_type = EXPECTED_SCHEMA
            .iter()
            .find(|(t, _)| t == table)
            .and_then(|(_, cols)| cols.iter().find(|(c, _)| c == column))
            .map(|(_, ty)| *ty)
            .unwrap_or("TEXT");
        tx.execute_batch(&format!(
            "ALTER TABLE {table} ADD COLUMN {column} {sql_type};"
        ))?;
    }
    tx.commit()?;

    verify_schema(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn fresh_database_matches_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let report = verify_schema(&conn).unwrap();
        assert!(report.matches, "{report:?}");
        assert!(report.missing_tables.is_empty());
        assert!(report.missing_columns.is_empty());
    }

    #[test]
    fn missing_table_is_detected_and_fixed() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(create_table_sql("agents")).unwrap();
        let report = verify_schema(&conn).unwrap();
        assert!(!report.matches);
        assert!(report.missing_tables.contains(&"events".to_string()));
    }

    #[test]
    fn update_schema_adds_missing_table() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(create_table_sql("agents")).unwrap();
        let report = update_schema(&mut conn).unwrap();
        assert!(report.matches, "{report:?}");
    }

    #[test]
    fn update_schema_adds_missing_column() {
        let mut conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn.execute_batch(
            "ALTER TABLE performance_metrics RENAME TO performance_metrics_old;
             CREATE TABLE performance_metrics (event_id INTEGER PRIMARY KEY);",
        )
        .unwrap();
        let report = update_schema(&mut conn).unwrap();
        assert!(report.matches, "{report:?}");
    }
}
