use rusqlite::Connection;

use mathsolver_core::SolverError;

/// Key/value table standing in for the client's local storage: each key holds
/// one serialized value.
pub fn init_db(conn: &Connection) -> Result<(), SolverError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        ",
    )
    .map_err(|e| SolverError::Database(format!("schema init failed: {e}")))?;
    Ok(())
}
