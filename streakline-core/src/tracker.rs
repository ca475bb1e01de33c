//! Mark-progress flow: upsert one day, recompute from full history, persist.
//!
//! Taking the store by `&mut` means one read-modify-write per (user, goal) runs
//! at a time for any given store handle. Stores shared across processes must
//! serialize this flow themselves.

use chrono::NaiveDate;
use tracing::info;

use crate::progress::{ProgressMark, ProgressRecord, StreakSnapshot};
use crate::store::{RecordStore, StoreError};
use crate::streak::compute_streak;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkOutcome {
    pub record: ProgressRecord,
    pub snapshot: StreakSnapshot,
}

/// Record one day and return the stored record plus the fresh snapshot.
pub fn mark_progress<S: RecordStore + ?Sized>(
    store: &mut S,
    user_id: &str,
    goal_id: &str,
    mark: ProgressMark,
    today: NaiveDate,
) -> Result<MarkOutcome, StoreError> {
    let record = store.upsert_progress(user_id, goal_id, mark)?;
    info!(
        user_id,
        goal_id,
        date = %record.date,
        completed = record.completed,
        method = record.marked_method.as_str(),
        "progress marked"
    );

    let snapshot = recalculate_streak(store, user_id, goal_id, today)?;
    Ok(MarkOutcome { record, snapshot })
}

/// Recompute and persist the snapshot without touching any record.
pub fn recalculate_streak<S: RecordStore + ?Sized>(
    store: &mut S,
    user_id: &str,
    goal_id: &str,
    today: NaiveDate,
) -> Result<StreakSnapshot, StoreError> {
    let completed = store.list_completed_progress(user_id, goal_id)?;
    let snapshot = compute_streak(&completed, today);
    store.write_streak_snapshot(user_id, goal_id, &snapshot)?;
    Ok(snapshot)
}
