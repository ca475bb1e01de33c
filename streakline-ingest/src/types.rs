use serde::{Deserialize, Serialize};
use streakline_core::ProgressRecord;
use thiserror::Error;

/// Loosely typed boolean as it shows up in exports: `true`, `1`, `"yes"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawFlag {
    Bool(bool),
    Int(i64),
    Text(String),
}

/// A progress row as the backend hands it over, before validation.
///
/// Every field is optional; `user_id`/`goal_id` fall back to the import target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProgressRow {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub goal_id: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub completed: Option<RawFlag>,
    #[serde(default)]
    pub marked_method: Option<String>,
    #[serde(default)]
    pub edited_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("invalid date '{0}' (expected YYYY-MM-DD or RFC 3339)")]
    InvalidDate(String),

    #[error("invalid completed flag '{0}'")]
    InvalidFlag(String),

    #[error("unknown marked method '{0}'")]
    InvalidMethod(String),

    #[error("invalid edited_at timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("row belongs to {found}, expected {expected}")]
    WrongOwner { expected: String, found: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    /// Zero-based data row index (header excluded).
    pub index: usize,
    pub error: IngestError,
}

/// Result of one import: typed records plus the rows that failed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub records: Vec<ProgressRecord>,
    pub rejected: Vec<RejectedRow>,
}

impl IngestReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}
