use crate::error::SolverResult;
use crate::history::{HistoryEntry, Theme};
use crate::model::Operation;

/// Maximum number of entries kept in the history log.
pub const HISTORY_CAPACITY: usize = 100;

/// Durable, newest-first, size-capped calculation log.
///
/// Implementations recover from corrupt persisted data by starting from an
/// empty log; that condition is never returned as an error.
pub trait HistoryStore {
    fn append(&self, kind: Operation, expression: &str, result: &str) -> SolverResult<HistoryEntry>;
    fn all(&self) -> SolverResult<Vec<HistoryEntry>>;
    fn clear(&self) -> SolverResult<()>;

    fn filter(&self, query: &str) -> SolverResult<Vec<HistoryEntry>> {
        let mut entries = self.all()?;
        entries.retain(|e| e.matches(query));
        Ok(entries)
    }

    fn get(&self, id: i64) -> SolverResult<Option<HistoryEntry>> {
        Ok(self.all()?.into_iter().find(|e| e.id == id))
    }
}

pub trait PreferenceStore {
    fn theme(&self) -> SolverResult<Theme>;
    fn set_theme(&self, theme: Theme) -> SolverResult<()>;
}
