//! Backend JSON export: an array of progress rows.
//!
//! Example:
//!   [{"date": "2024-01-05", "completed": true, "marked_method": "ai_auto", "edited_at": null}]

use anyhow::{Context, Result};
use chrono_tz::Tz;

use crate::types::{IngestReport, RawProgressRow};
use crate::validate::validate_rows;

pub fn parse_progress_json(text: &str, user_id: &str, goal_id: &str, tz: Tz) -> Result<IngestReport> {
    let rows: Vec<RawProgressRow> =
        serde_json::from_str(text).context("progress export must be a JSON array of rows")?;
    Ok(validate_rows(&rows, user_id, goal_id, tz))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::UTC;
    use streakline_core::MarkedMethod;

    #[test]
    fn test_parses_backend_rows() {
        let text = r#"[
            {"user_id": "u1", "goal_id": "g1", "date": "2024-01-05", "completed": true,
             "marked_method": "ai_auto", "edited_at": null},
            {"date": "2024-01-04", "completed": "false", "marked_method": "manual_edit",
             "edited_at": "2024-01-05T10:00:00Z", "created_at": "2024-01-04T09:00:00Z"},
            {"date": "2024-01-03"}
        ]"#;

        let report = parse_progress_json(text, "u1", "g1", UTC).unwrap();
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[1].marked_method, MarkedMethod::ManualEdit);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].index, 2);
    }

    #[test]
    fn test_not_an_array_is_fatal() {
        assert!(parse_progress_json(r#"{"date": "2024-01-05"}"#, "u1", "g1", UTC).is_err());
    }
}
