//! CSV history export.
//!
//! Header names are matched case-insensitively; only `date` and `completed` are required:
//!   date,completed,marked_method,edited_at
//!   2024-01-05,true,ai_auto,
//!   2024-01-04,no,manual_edit,2024-01-05T10:00:00Z

use anyhow::{bail, Context, Result};
use chrono_tz::Tz;
use std::io::Read;

use crate::types::{IngestReport, RawFlag, RawProgressRow};
use crate::validate::validate_rows;

fn column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name))
}

pub fn parse_progress_csv<R: Read>(reader: R, user_id: &str, goal_id: &str, tz: Tz) -> Result<IngestReport> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().context("reading CSV header")?.clone();
    let (Some(date_col), Some(completed_col)) = (column(&headers, "date"), column(&headers, "completed")) else {
        bail!("CSV header must include `date` and `completed` columns");
    };
    let method_col = column(&headers, "marked_method");
    let edited_col = column(&headers, "edited_at");
    let user_col = column(&headers, "user_id");
    let goal_col = column(&headers, "goal_id");

    let field = |record: &csv::StringRecord, col: Option<usize>| {
        col.and_then(|i| record.get(i))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("reading CSV row {}", i + 1))?;
        rows.push(RawProgressRow {
            user_id: field(&record, user_col),
            goal_id: field(&record, goal_col),
            date: field(&record, Some(date_col)),
            completed: field(&record, Some(completed_col)).map(RawFlag::Text),
            marked_method: field(&record, method_col),
            edited_at: field(&record, edited_col),
        });
    }

    Ok(validate_rows(&rows, user_id, goal_id, tz))
}
