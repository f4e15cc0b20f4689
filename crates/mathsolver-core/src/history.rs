use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::Operation;

/// One past calculation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Creation time in milliseconds, bumped if needed so ids stay strictly increasing.
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: Operation,
    pub expression: String,
    pub result: String,
    /// ISO-8601 creation timestamp.
    pub timestamp: String,
}

impl HistoryEntry {
    /// Build an entry stamped at `now`. `last_id` is the newest id already in the log.
    pub fn new(
        kind: Operation,
        expression: String,
        result: String,
        now: DateTime<Utc>,
        last_id: Option<i64>,
    ) -> Self {
        let millis = now.timestamp_millis();
        let id = match last_id {
            Some(prev) if prev >= millis => prev + 1,
            _ => millis,
        };
        Self {
            id,
            kind,
            expression,
            result,
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Text the history search runs against.
    pub fn search_text(&self) -> String {
        format!("{} {}", self.kind, self.expression)
    }

    pub fn matches(&self, query: &str) -> bool {
        self.search_text()
            .to_lowercase()
            .contains(&query.to_lowercase())
    }
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Dark => write!(f, "dark"),
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(format!("invalid theme: {s}")),
        }
    }
}
