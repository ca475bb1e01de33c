//! Record store collaborator.
//!
//! The engine never persists anything itself; callers hand it a `RecordStore`.
//! `MemoryStore` is the reference implementation (tests, and the CLI's JSON file).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tracing::warn;

use crate::account::{Goal, GoalStatus};
use crate::progress::{ProgressMark, ProgressRecord, StreakSnapshot};
use crate::streak::resolve_duplicates;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    #[error("stored data is invalid: {0}")]
    Invalid(String),

    #[error("no goal '{goal_id}' for user '{user_id}'")]
    UnknownGoal { user_id: String, goal_id: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub trait RecordStore {
    /// Insert or replace the record for (user, goal, mark.date).
    fn upsert_progress(
        &mut self,
        user_id: &str,
        goal_id: &str,
        mark: ProgressMark,
    ) -> Result<ProgressRecord, StoreError>;

    /// Every record for the pair, completed or not, newest first.
    fn list_progress(&self, user_id: &str, goal_id: &str) -> Result<Vec<ProgressRecord>, StoreError>;

    fn list_completed_progress(
        &self,
        user_id: &str,
        goal_id: &str,
    ) -> Result<Vec<ProgressRecord>, StoreError> {
        let mut records = self.list_progress(user_id, goal_id)?;
        records.retain(|r| r.completed);
        Ok(records)
    }

    fn write_streak_snapshot(
        &mut self,
        user_id: &str,
        goal_id: &str,
        snapshot: &StreakSnapshot,
    ) -> Result<(), StoreError>;

    fn read_streak_snapshot(
        &self,
        user_id: &str,
        goal_id: &str,
    ) -> Result<Option<StreakSnapshot>, StoreError>;

    /// (goal id, snapshot) for every goal of the user that has one.
    fn list_streak_snapshots(&self, user_id: &str) -> Result<Vec<(String, StreakSnapshot)>, StoreError>;

    fn upsert_goal(&mut self, user_id: &str, goal: Goal) -> Result<(), StoreError>;

    fn list_goals(&self, user_id: &str) -> Result<Vec<Goal>, StoreError>;

    /// Onboarding is complete once the user has any goal, whatever its status.
    fn has_any_goal(&self, user_id: &str) -> Result<bool, StoreError> {
        Ok(!self.list_goals(user_id)?.is_empty())
    }

    /// The goal the user is working on: the primary active goal, otherwise the
    /// most recently added active one.
    fn active_goal(&self, user_id: &str) -> Result<Option<Goal>, StoreError> {
        let mut active: Vec<Goal> = self
            .list_goals(user_id)?
            .into_iter()
            .filter(|g| g.status == GoalStatus::Active)
            .collect();
        Ok(match active.iter().rposition(|g| g.is_primary) {
            Some(i) => Some(active.swap_remove(i)),
            None => active.pop(),
        })
    }

    fn set_goal_status(
        &mut self,
        user_id: &str,
        goal_id: &str,
        status: GoalStatus,
    ) -> Result<Goal, StoreError> {
        let goal = self
            .list_goals(user_id)?
            .into_iter()
            .find(|g| g.id == goal_id)
            .ok_or_else(|| StoreError::UnknownGoal {
                user_id: user_id.to_string(),
                goal_id: goal_id.to_string(),
            })?
            .with_status(status);
        self.upsert_goal(user_id, goal.clone())?;
        Ok(goal)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct UserLedger {
    #[serde(default)]
    goals: Vec<Goal>,
    /// goal id -> records, kept sorted by date ascending
    #[serde(default)]
    progress: BTreeMap<String, Vec<ProgressRecord>>,
    #[serde(default)]
    streaks: BTreeMap<String, StreakSnapshot>,
}

/// In-memory store keyed by user, serializable as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStore {
    #[serde(default)]
    users: BTreeMap<String, UserLedger>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ledger(&self, user_id: &str) -> Option<&UserLedger> {
        self.users.get(user_id)
    }

    fn ledger_mut(&mut self, user_id: &str) -> &mut UserLedger {
        self.users.entry(user_id.to_string()).or_default()
    }

    /// Restore the per-goal ordering `upsert_progress` relies on after loading
    /// from outside: records sorted by date, one per date. Returns how many
    /// duplicate records were dropped.
    pub fn normalize(&mut self) -> usize {
        let mut dropped = 0;
        for (user_id, ledger) in &mut self.users {
            for (goal_id, days) in &mut ledger.progress {
                let before = days.len();
                *days = resolve_duplicates(days);
                if days.len() < before {
                    warn!(%user_id, %goal_id, dropped = before - days.len(), "collapsed duplicate progress dates");
                    dropped += before - days.len();
                }
            }
        }
        dropped
    }
}

impl RecordStore for MemoryStore {
    fn upsert_progress(
        &mut self,
        user_id: &str,
        goal_id: &str,
        mark: ProgressMark,
    ) -> Result<ProgressRecord, StoreError> {
        let record = mark.into_record(user_id, goal_id);
        let days = self
            .ledger_mut(user_id)
            .progress
            .entry(goal_id.to_string())
            .or_default();

        match days.binary_search_by_key(&record.date, |r| r.date) {
            Ok(i) => days[i] = record.clone(),
            Err(i) => days.insert(i, record.clone()),
        }

        Ok(record)
    }

    fn list_progress(&self, user_id: &str, goal_id: &str) -> Result<Vec<ProgressRecord>, StoreError> {
        Ok(self
            .ledger(user_id)
            .and_then(|l| l.progress.get(goal_id))
            .map(|days| days.iter().rev().cloned().collect())
            .unwrap_or_default())
    }

    fn write_streak_snapshot(
        &mut self,
        user_id: &str,
        goal_id: &str,
        snapshot: &StreakSnapshot,
    ) -> Result<(), StoreError> {
        self.ledger_mut(user_id)
            .streaks
            .insert(goal_id.to_string(), *snapshot);
        Ok(())
    }

    fn read_streak_snapshot(
        &self,
        user_id: &str,
        goal_id: &str,
    ) -> Result<Option<StreakSnapshot>, StoreError> {
        Ok(self
            .ledger(user_id)
            .and_then(|l| l.streaks.get(goal_id))
            .copied())
    }

    fn list_streak_snapshots(&self, user_id: &str) -> Result<Vec<(String, StreakSnapshot)>, StoreError> {
        Ok(self
            .ledger(user_id)
            .map(|l| l.streaks.iter().map(|(g, s)| (g.clone(), *s)).collect())
            .unwrap_or_default())
    }

    fn upsert_goal(&mut self, user_id: &str, goal: Goal) -> Result<(), StoreError> {
        let goals = &mut self.ledger_mut(user_id).goals;
        match goals.iter_mut().find(|g| g.id == goal.id) {
            Some(existing) => *existing = goal,
            None => goals.push(goal),
        }
        Ok(())
    }

    fn list_goals(&self, user_id: &str) -> Result<Vec<Goal>, StoreError> {
        Ok(self.ledger(user_id).map(|l| l.goals.clone()).unwrap_or_default())
    }
}
