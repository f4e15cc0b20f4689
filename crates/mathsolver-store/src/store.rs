use std::path::Path;

use chrono::Utc;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use mathsolver_core::{
    HistoryEntry, HistoryStore, Operation, PreferenceStore, SolverError, SolverResult, Theme,
    HISTORY_CAPACITY,
};

use crate::schema::init_db;

/// Key holding the serialized history log (newest-first JSON array).
pub const HISTORY_KEY: &str = "mathsolver_history";
/// Key holding the selected theme name.
pub const THEME_KEY: &str = "theme";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new(path: &Path) -> SolverResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SolverError::Database(format!("cannot create db directory: {e}")))?;
        }
        let conn = Connection::open(path)
            .map_err(|e| SolverError::Database(format!("cannot open database: {e}")))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| SolverError::Database(e.to_string()))?;
        init_db(&conn)?;
        Ok(Self { conn })
    }

    pub fn in_memory() -> SolverResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| SolverError::Database(format!("cannot open in-memory db: {e}")))?;
        init_db(&conn)?;
        Ok(Self { conn })
    }

    // -----------------------------------------------------------------------
    // Raw key/value access
    // -----------------------------------------------------------------------

    pub fn get_value(&self, key: &str) -> SolverResult<Option<String>> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| SolverError::Database(e.to_string()))
    }

    /// Stored bytes for `key` whatever the column type, so callers can decide
    /// what to do with values that are not valid text.
    fn get_bytes(&self, key: &str) -> SolverResult<Option<Vec<u8>>> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                Ok(match row.get_ref(0)? {
                    ValueRef::Text(b) | ValueRef::Blob(b) => b.to_vec(),
                    ValueRef::Integer(i) => i.to_string().into_bytes(),
                    ValueRef::Real(f) => f.to_string().into_bytes(),
                    ValueRef::Null => Vec::new(),
                })
            })
            .optional()
            .map_err(|e| SolverError::Database(e.to_string()))
    }

    pub fn put_value(&self, key: &str, value: &str) -> SolverResult<()> {
        self.conn
            .execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                                updated_at = excluded.updated_at",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .map_err(|e| SolverError::Database(e.to_string()))?;
        Ok(())
    }

    pub fn remove_value(&self, key: &str) -> SolverResult<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(|e| SolverError::Database(e.to_string()))?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // History log helpers
    // -----------------------------------------------------------------------

    /// Read the persisted log. Corrupt data yields an empty log.
    fn load_log(&self) -> SolverResult<Vec<HistoryEntry>> {
        let Some(raw) = self.get_bytes(HISTORY_KEY)? else {
            return Ok(Vec::new());
        };
        match decode_log(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!("stored history is unreadable, starting empty: {e}");
                Ok(Vec::new())
            }
        }
    }

    fn save_log(&self, entries: &[HistoryEntry]) -> SolverResult<()> {
        let json = serde_json::to_string(entries)?;
        self.put_value(HISTORY_KEY, &json)
    }
}

fn decode_log(raw: &[u8]) -> Result<Vec<HistoryEntry>, SolverError> {
    let text = std::str::from_utf8(raw).map_err(|e| SolverError::Persistence(e.to_string()))?;
    serde_json::from_str::<Vec<HistoryEntry>>(text)
        .map_err(|e| SolverError::Persistence(e.to_string()))
}

// ---------------------------------------------------------------------------
// HistoryStore impl
// ---------------------------------------------------------------------------

impl HistoryStore for SqliteStore {
    fn append(&self, kind: Operation, expression: &str, result: &str) -> SolverResult<HistoryEntry> {
        let mut log = self.load_log()?;
        let entry = HistoryEntry::new(
            kind,
            expression.to_string(),
            result.to_string(),
            Utc::now(),
            log.iter().map(|e| e.id).max(),
        );
        log.insert(0, entry.clone());
        log.truncate(HISTORY_CAPACITY);
        self.save_log(&log)?;
        debug!("history append {} ({} entries)", entry.id, log.len());
        Ok(entry)
    }

    fn all(&self) -> SolverResult<Vec<HistoryEntry>> {
        self.load_log()
    }

    fn clear(&self) -> SolverResult<()> {
        self.save_log(&[])
    }
}

// ---------------------------------------------------------------------------
// PreferenceStore impl
// ---------------------------------------------------------------------------

impl PreferenceStore for SqliteStore {
    fn theme(&self) -> SolverResult<Theme> {
        Ok(self
            .get_bytes(THEME_KEY)?
            .and_then(|raw| String::from_utf8(raw).ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or_default())
    }

    fn set_theme(&self, theme: Theme) -> SolverResult<()> {
        self.put_value(THEME_KEY, &theme.to_string())
    }
}
