use rusqlite::Transaction;

use crate::store::Store;
use crate::Result;

/// Run `f` inside a scoped transaction obtained from the pool: commit on
/// success, rollback on any error, and always return the connection to the
/// pool (§4.6: "a scoped session is the only way writers obtain a
/// connection"). `rusqlite::Transaction::drop` already rolls back an
/// uncommitted transaction, so the error path needs no extra code.
pub fn with_scoped_session<T>(
    store: &Store,
    f: impl FnOnce(&Transaction<'_>) -> Result<T>,
) -> Result<T> {
    let mut conn = store.pool().get()?;
    let tx = conn.transaction()?;
    let result = f(&tx)?;
    tx.commit()?;
    Ok(result)
}
