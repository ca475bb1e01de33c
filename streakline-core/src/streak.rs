//! Streak computation.
//!
//! Pure and deterministic: the caller injects `today` in the canonical timezone and
//! passes every record it has for one (user, goal) pair. Input order never matters.
//!
//! Rules:
//! - current streak: consecutive completed days ending today, or ending yesterday
//!   when today is not completed yet (grace period)
//! - longest streak: the longest run of consecutive completed days in all history
//! - duplicate dates: resolved per date with `ProgressRecord::supersedes`, so a
//!   day is never counted twice

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::progress::{ProgressRecord, StreakSnapshot};

/// Collapse records to one per date, keeping the one that supersedes the rest.
pub(crate) fn latest_per_date<'a, I>(records: I) -> BTreeMap<NaiveDate, &'a ProgressRecord>
where
    I: IntoIterator<Item = &'a ProgressRecord>,
{
    let mut by_date: BTreeMap<NaiveDate, &ProgressRecord> = BTreeMap::new();
    let mut duplicates = 0usize;

    for r in records {
        match by_date.get(&r.date) {
            None => {
                by_date.insert(r.date, r);
            }
            Some(existing) => {
                duplicates += 1;
                if r.supersedes(existing) {
                    by_date.insert(r.date, r);
                }
            }
        }
    }

    if duplicates > 0 {
        warn!(duplicates, "progress history has duplicate dates; kept latest edit per day");
    }

    by_date
}

/// One record per date, oldest first, using the same tie-breaking as the engine.
pub fn resolve_duplicates(records: &[ProgressRecord]) -> Vec<ProgressRecord> {
    latest_per_date(records).into_values().cloned().collect()
}

/// Ascending set of completed days.
fn completed_days(records: &[ProgressRecord]) -> BTreeSet<NaiveDate> {
    latest_per_date(records)
        .into_iter()
        .filter(|(_, r)| r.completed)
        .map(|(date, _)| date)
        .collect()
}

fn current_run(completed: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let start = if completed.contains(&today) {
        Some(today)
    } else {
        today.pred_opt().filter(|yesterday| completed.contains(yesterday))
    };

    let mut run = 0;
    let mut cursor = start;
    while let Some(day) = cursor.filter(|d| completed.contains(d)) {
        run += 1;
        cursor = day.pred_opt();
    }
    run
}

fn longest_run(completed: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;

    for &day in completed {
        run = match prev {
            Some(p) if p.succ_opt() == Some(day) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(day);
    }

    longest
}

/// Recompute the full streak snapshot for one goal's history.
pub fn compute_streak(records: &[ProgressRecord], today: NaiveDate) -> StreakSnapshot {
    let completed = completed_days(records);
    let Some(&last) = completed.last() else {
        return StreakSnapshot::default();
    };

    let snapshot = StreakSnapshot {
        current_streak: current_run(&completed, today),
        longest_streak: longest_run(&completed),
        total_days_completed: completed.len() as u32,
        last_completion_date: Some(last),
    };

    debug!(
        %today,
        current = snapshot.current_streak,
        longest = snapshot.longest_streak,
        total = snapshot.total_days_completed,
        "streak recomputed"
    );

    snapshot
}
