//! Progress records and streak snapshots.
//!
//! One `ProgressRecord` exists per (user, goal, calendar date); the store upserts,
//! it never appends. A `StreakSnapshot` is the fully recomputed summary for one
//! (user, goal) pair and is overwritten on every recomputation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// How a day got marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkedMethod {
    /// Marked from the daily check-in flow.
    #[serde(rename = "ai_auto")]
    Automatic,
    /// Edited by the user after the fact.
    #[serde(rename = "manual_edit")]
    ManualEdit,
}

impl MarkedMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkedMethod::Automatic => "ai_auto",
            MarkedMethod::ManualEdit => "manual_edit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub user_id: String,
    pub goal_id: String,

    /// Calendar day in the canonical timezone.
    pub date: NaiveDate,
    pub completed: bool,
    pub marked_method: MarkedMethod,

    /// Only ever set when `marked_method` is `ManualEdit`.
    pub edited_at: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    /// A completed, automatically marked day.
    pub fn new(user_id: impl Into<String>, goal_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            user_id: user_id.into(),
            goal_id: goal_id.into(),
            date,
            completed: true,
            marked_method: MarkedMethod::Automatic,
            edited_at: None,
        }
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    pub fn missed(self) -> Self {
        self.with_completed(false)
    }

    pub fn edited_manually(mut self, at: DateTime<Utc>) -> Self {
        self.marked_method = MarkedMethod::ManualEdit;
        self.edited_at = Some(at);
        self
    }

    /// True if this record should win over `other` for the same date.
    ///
    /// Latest edit wins; an unedited record loses to any edited one. Equal edit
    /// times fall back to `completed`, so the choice never depends on input order.
    pub fn supersedes(&self, other: &ProgressRecord) -> bool {
        (self.edited_at, self.completed) > (other.edited_at, other.completed)
    }

    /// The mark that re-creates this record through a store upsert.
    /// `fallback_at` stands in for a missing edit time.
    pub fn to_mark(&self, fallback_at: DateTime<Utc>) -> ProgressMark {
        ProgressMark {
            date: self.date,
            completed: self.completed,
            method: self.marked_method,
            at: self.edited_at.unwrap_or(fallback_at),
        }
    }
}

/// A requested change to one day's progress, handed to the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressMark {
    pub date: NaiveDate,
    pub completed: bool,
    pub method: MarkedMethod,
    /// Wall-clock time of the change, recorded as `edited_at` for manual edits.
    pub at: DateTime<Utc>,
}

impl ProgressMark {
    pub fn completed(date: NaiveDate, at: DateTime<Utc>) -> Self {
        Self {
            date,
            completed: true,
            method: MarkedMethod::Automatic,
            at,
        }
    }

    pub fn missed(date: NaiveDate, at: DateTime<Utc>) -> Self {
        Self {
            completed: false,
            ..Self::completed(date, at)
        }
    }

    pub fn manual(mut self) -> Self {
        self.method = MarkedMethod::ManualEdit;
        self
    }

    /// Materialize the record this mark upserts.
    pub fn into_record(self, user_id: &str, goal_id: &str) -> ProgressRecord {
        let record = ProgressRecord::new(user_id, goal_id, self.date).with_completed(self.completed);
        match self.method {
            MarkedMethod::ManualEdit => record.edited_manually(self.at),
            MarkedMethod::Automatic => record,
        }
    }
}

/// Materialized streak summary for one (user, goal) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakSnapshot {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_days_completed: u32,
    pub last_completion_date: Option<NaiveDate>,
}

impl StreakSnapshot {
    pub fn is_empty(&self) -> bool {
        self.total_days_completed == 0
    }
}
