use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::Duration;

use chrono::Utc;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::lifecycle::Lifecycle;
use crate::schema::{self, SchemaReport};
use crate::{Error, Result};

/// Pool sizing from §4.6: "bounded connection pool (size 5, overflow 10,
/// timeout 30 s)". r2d2 has no separate overflow concept; the SQLAlchemy
/// `pool_size + max_overflow` figure becomes a single `max_size`.
const POOL_SIZE: u32 = 5;
const POOL_OVERFLOW: u32 = 10;
const POOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Pooled SQLite relational store implementing the schema of §3 (C6).
///
/// Every mutation happens through a scoped transaction obtained from the
/// pool (see `crate::txn::with_scoped_session`); this struct only owns the
/// pool and the resolved path. The pool sits behind a `RwLock` so
/// `reset_database` can swap it out for a fresh one under `&self` — `Store`
/// is normally shared as `Arc<Store>` (see `cylestio::Monitor`), so rebuilding
/// the pool cannot require `&mut self`.
pub struct Store {
    pool: RwLock<Pool<SqliteConnectionManager>>,
    path: Option<PathBuf>,
    lifecycle: Lifecycle,
}

/// Resolve the database path: explicit argument, then the
/// `CYLESTIO_TEST_DB_DIR` env var (joined with the default file name), then
/// the platform user-data directory (§4.6, §6). Delegates to
/// `cylestio-core`, the crate shared with the file sink's own path policy;
/// falls back to the process temp dir on the (practically unreachable) case
/// where the platform has no data directory at all.
pub fn resolve_db_path(explicit: Option<&Path>) -> PathBuf {
    let explicit = explicit.map(|p| p.to_string_lossy().into_owned());
    cylestio_core::resolve_db_path(explicit.as_deref())
        .unwrap_or_else(|_| std::env::temp_dir().join("cylestio").join("cylestio_monitor.db"))
}

impl Store {
    /// Open (creating if absent) the database at the resolved path, ensure
    /// the directory exists, and bring the schema up to date.
    pub fn initialize_database(explicit_path: Option<&Path>) -> Result<Self> {
        let path = resolve_db_path(explicit_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let store = Self::open_pooled(SqliteConnectionManager::file(&path), Some(path))?;
        store.bring_schema_up_to_date()?;
        Ok(store)
    }

    /// An in-memory store for tests. Capped at a single pooled connection:
    /// SQLite's `:memory:` databases are private per-connection, so a larger
    /// pool would silently hand back empty databases to some callers.
    pub fn open_in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|c| c.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::builder().max_size(1).build(manager)?;
        let store = Self { pool: RwLock::new(pool), path: None, lifecycle: Lifecycle::new() };
        store.bring_schema_up_to_date()?;
        Ok(store)
    }

    fn open_pooled(manager: SqliteConnectionManager, path: Option<PathBuf>) -> Result<Self> {
        let pool = Self::build_pool(manager)?;
        Ok(Self { pool: RwLock::new(pool), path, lifecycle: Lifecycle::new() })
    }

    fn build_pool(manager: SqliteConnectionManager) -> Result<Pool<SqliteConnectionManager>> {
        let manager = manager.with_init(|c| c.execute_batch("PRAGMA foreign_keys = ON;"));
        Ok(Pool::builder()
            .max_size(POOL_SIZE + POOL_OVERFLOW)
            .min_idle(Some(POOL_SIZE))
            .connection_timeout(POOL_TIMEOUT)
            .build(manager)?)
    }

    fn bring_schema_up_to_date(&self) -> Result<()> {
        let conn = self.pool().get()?;
        let report = schema::verify_schema(&conn)?;
        if report.missing_tables.is_empty() && !report.missing_columns.is_empty() {
            for (table, column) in &report.missing_columns {
                tracing::warn!(table, column, "schema drift: missing column not yet applied");
            }
        }
        schema::init_schema(&conn)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn pool(&self) -> Pool<SqliteConnectionManager> {
        self.pool.read().unwrap().clone()
    }

    pub(crate) fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Compare the live schema against the model (§4.6). Never errors on
    /// mismatch.
    pub fn verify_schema(&self) -> Result<SchemaReport> {
        let conn = self.pool().get()?;
        schema::verify_schema(&conn)
    }

    /// Add missing tables/columns in a single transaction. Never drops or
    /// renames (§4.6).
    pub fn update_schema(&self) -> Result<SchemaReport> {
        let mut conn = self.pool().get()?;
        schema::update_schema(&mut conn)
    }

    /// Refuse unless `force`; back up the file, drop it, and reinitialize.
    /// Returns the backup path. Only meaningful for file-backed stores.
    ///
    /// The Python original this is grounded on
    /// (`database_manager.py::reset_database`) calls `self._engine.dispose()`
    /// to close its entire connection pool before deleting the file — the
    /// one correctness guarantee this function exists to provide. r2d2
    /// exposes no pool-wide "dispose" reachable through this API, so the
    /// equivalent here is to swap the live pool for a throwaway in-memory
    /// one (dropping every connection this `Store` held against the file)
    /// before copying and removing it, then build a fresh pool on the
    /// recreated file. This closes every connection owned by this `Store`;
    /// it is not an exclusive lock, so a connection checked out by another
    /// thread at the exact instant of the swap is only closed once that
    /// thread returns it to the (now-discarded) old pool.
    pub fn reset_database(&self, force: bool) -> Result<PathBuf> {
        if !force {
            return Err(Error::ResetRefused);
        }
        let path = self.path.clone().ok_or_else(|| {
            Error::Query("reset_database requires a file-backed store".to_string())
        })?;

        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let backup_path = path.with_file_name(format!(
            "{}_backup_{stamp}.db",
            path.file_stem().and_then(|s| s.to_str()).unwrap_or("cylestio_monitor")
        ));

        let mut guard = self.pool.write().unwrap();
        *guard = Pool::builder().max_size(1).build(SqliteConnectionManager::memory())?;

        std::fs::copy(&path, &backup_path)?;
        std::fs::remove_file(&path)?;

        let fresh = Self::build_pool(SqliteConnectionManager::file(&path))?;
        let conn = fresh.get()?;
        schema::init_schema(&conn)?;
        drop(conn);
        *guard = fresh;
        self.lifecycle.clear();

        Ok(backup_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_explicit_path_first() {
        let explicit = PathBuf::from("/tmp/explicit.db");
        assert_eq!(resolve_db_path(Some(&explicit)), explicit);
    }

    #[test]
    fn resolves_test_env_var_when_no_explicit_path() {
        std::env::set_var("CYLESTIO_TEST_DB_DIR", "/tmp/cylestio-test-dir");
        let resolved = resolve_db_path(None);
        std::env::remove_var("CYLESTIO_TEST_DB_DIR");
        assert_eq!(resolved, PathBuf::from("/tmp/cylestio-test-dir/cylestio_monitor.db"));
    }

    #[test]
    fn in_memory_store_initializes_a_matching_schema() {
        let store = Store::open_in_memory().unwrap();
        let report = store.verify_schema().unwrap();
        assert!(report.matches, "{report:?}");
    }

    #[test]
    fn reset_without_force_is_refused() {
        let store = Store::open_in_memory().unwrap();
        assert!(matches!(store.reset_database(false), Err(Error::ResetRefused)));
    }
}
