//! Integration tests for the initialize/verify/update/reset lifecycle (§4.6).

use std::path::Path;

use cylestio_store::Store;
use tempfile::TempDir;

#[test]
fn initialize_then_verify_is_a_no_op() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("cylestio.db");

    let store = Store::initialize_database(Some(&db_path)).expect("initialize_database");
    let report = store.verify_schema().expect("verify_schema");
    assert!(report.matches, "{report:?}");

    // Re-initializing an already-current database is idempotent.
    drop(store);
    let store = Store::initialize_database(Some(&db_path)).unwrap();
    let report = store.verify_schema().unwrap();
    assert!(report.matches, "{report:?}");
}

#[test]
fn reset_database_backs_up_and_recreates_the_file() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("cylestio.db");

    let store = Store::initialize_database(Some(&db_path)).unwrap();
    let backup_path = store.reset_database(true).expect("reset_database(force=true)");

    assert!(Path::new(&backup_path).exists(), "backup file must exist");
    assert!(db_path.exists(), "database file must be recreated");

    let report = store.verify_schema().unwrap();
    assert!(report.matches, "{report:?}");
}

#[test]
fn reset_database_without_force_leaves_the_file_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("cylestio.db");

    let store = Store::initialize_database(Some(&db_path)).unwrap();
    assert!(store.reset_database(false).is_err());
    assert!(db_path.exists());
}
