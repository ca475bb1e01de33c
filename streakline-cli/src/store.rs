//! JSON-file record store: a `MemoryStore` loaded from disk and written back
//! after every mutation.

use std::fs;
use std::path::PathBuf;

use streakline_core::{
    Goal, MemoryStore, ProgressMark, ProgressRecord, RecordStore, StoreError, StreakSnapshot,
};

pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let inner = if path.exists() {
            let s = fs::read_to_string(&path)?;
            let mut inner: MemoryStore = serde_json::from_str(&s)
                .map_err(|e| StoreError::Invalid(format!("{}: {e}", path.display())))?;
            inner.normalize();
            inner
        } else {
            MemoryStore::new()
        };
        Ok(Self { path, inner })
    }

    fn save(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.inner)
            .map_err(|e| StoreError::Invalid(e.to_string()))?;
        // write-then-rename so a crash never leaves a truncated store
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl RecordStore for FileStore {
    fn upsert_progress(
        &mut self,
        user_id: &str,
        goal_id: &str,
        mark: ProgressMark,
    ) -> Result<ProgressRecord, StoreError> {
        let record = self.inner.upsert_progress(user_id, goal_id, mark)?;
        self.save()?;
        Ok(record)
    }

    fn list_progress(&self, user_id: &str, goal_id: &str) -> Result<Vec<ProgressRecord>, StoreError> {
        self.inner.list_progress(user_id, goal_id)
    }

    fn write_streak_snapshot(
        &mut self,
        user_id: &str,
        goal_id: &str,
        snapshot: &StreakSnapshot,
    ) -> Result<(), StoreError> {
        self.inner.write_streak_snapshot(user_id, goal_id, snapshot)?;
        self.save()
    }

    fn read_streak_snapshot(
        &self,
        user_id: &str,
        goal_id: &str,
    ) -> Result<Option<StreakSnapshot>, StoreError> {
        self.inner.read_streak_snapshot(user_id, goal_id)
    }

    fn list_streak_snapshots(&self, user_id: &str) -> Result<Vec<(String, StreakSnapshot)>, StoreError> {
        self.inner.list_streak_snapshots(user_id)
    }

    fn upsert_goal(&mut self, user_id: &str, goal: Goal) -> Result<(), StoreError> {
        self.inner.upsert_goal(user_id, goal)?;
        self.save()
    }

    fn list_goals(&self, user_id: &str) -> Result<Vec<Goal>, StoreError> {
        self.inner.list_goals(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use streakline_core::mark_progress;

    #[test]
    fn test_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();

        {
            let mut store = FileStore::open(&path).unwrap();
            store.upsert_goal("u1", Goal::new("g1", "Stretch")).unwrap();
            mark_progress(&mut store, "u1", "g1", ProgressMark::completed(d1, at), d2).unwrap();
            mark_progress(&mut store, "u1", "g1", ProgressMark::completed(d2, at).manual(), d2).unwrap();
        }

        let store = FileStore::open(&path).unwrap();
        assert!(store.has_any_goal("u1").unwrap());
        assert_eq!(store.list_progress("u1", "g1").unwrap().len(), 2);
        let snap = store.read_streak_snapshot("u1", "g1").unwrap().unwrap();
        assert_eq!(snap.current_streak, 2);
        assert_eq!(snap.last_completion_date, Some(d2));
    }

    #[test]
    fn test_corrupt_file_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(FileStore::open(&path), Err(StoreError::Invalid(_))));
    }

    #[test]
    fn test_hand_edited_file_keeps_one_record_per_date() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let d3 = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 1, 3, 20, 0, 0).unwrap();

        let ledger = serde_json::json!({
            "users": {"u1": {
                "goals": [Goal::new("g1", "Stretch")],
                "progress": {"g1": [
                    ProgressRecord::new("u1", "g1", d3),
                    ProgressRecord::new("u1", "g1", d1),
                ]}
            }}
        });
        fs::write(&path, ledger.to_string()).unwrap();

        let mut store = FileStore::open(&path).unwrap();
        let out = mark_progress(&mut store, "u1", "g1", ProgressMark::missed(d3, at).manual(), d3).unwrap();

        let records = store.list_progress("u1", "g1").unwrap();
        let days: Vec<_> = records.iter().map(|r| (r.date, r.completed)).collect();
        assert_eq!(days, vec![(d3, false), (d1, true)]);
        assert_eq!(out.snapshot.total_days_completed, 1);
        assert_eq!(out.snapshot.current_streak, 0);
    }
}
