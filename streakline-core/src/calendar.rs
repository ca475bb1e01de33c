//! Day-by-day views over a goal's progress history.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::progress::{MarkedMethod, ProgressRecord};
use crate::streak::latest_per_date;

/// Which past days a user may still change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditPolicy {
    /// Unlocks days older than yesterday.
    pub streak_editing_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayProgress {
    pub date: NaiveDate,
    pub completed: bool,
    pub marked_method: Option<MarkedMethod>,
    pub is_editable: bool,
    /// Future days are locked.
    pub is_locked: bool,
}

/// Records in `[start, end]`, newest first.
pub fn progress_in_range(records: &[ProgressRecord], start: NaiveDate, end: NaiveDate) -> Vec<ProgressRecord> {
    let mut out: Vec<ProgressRecord> = records
        .iter()
        .filter(|r| r.date >= start && r.date <= end)
        .cloned()
        .collect();
    out.sort_by(|a, b| b.date.cmp(&a.date));
    out
}

/// One entry per day in `[start, end]`, oldest first. Days without a record
/// show as not completed.
///
/// Editability:
/// - future: locked
/// - today, yesterday: always editable (grace window)
/// - older: editable only when the policy enables streak editing
pub fn day_grid(
    records: &[ProgressRecord],
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
    policy: EditPolicy,
) -> Vec<DayProgress> {
    let by_date = latest_per_date(records.iter().filter(|r| r.date >= start && r.date <= end));
    let yesterday = today.pred_opt();

    start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|date| {
            let record = by_date.get(&date);
            let is_locked = date > today;
            let in_grace = date == today || Some(date) == yesterday;
            DayProgress {
                date,
                completed: record.is_some_and(|r| r.completed),
                marked_method: record.map(|r| r.marked_method),
                is_editable: !is_locked && (in_grace || policy.streak_editing_enabled),
                is_locked,
            }
        })
        .collect()
}
