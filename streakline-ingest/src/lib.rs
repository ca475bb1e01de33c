//! streakline-ingest: boundary parsing of backend progress exports (JSON rows, CSV) into typed records.

pub mod parsers;
pub mod types;
pub mod validate;

pub use parsers::{parse_progress_csv, parse_progress_json};
pub use types::{IngestError, IngestReport, RawFlag, RawProgressRow, RejectedRow};
pub use validate::{validate_row, validate_rows};

use anyhow::{bail, Context, Result};
use chrono_tz::Tz;
use std::fs;
use std::path::Path;

/// Parse an export file, picking the format from its extension (`.json` or `.csv`).
/// Timestamps are assigned to calendar days in `tz`.
pub fn parse_progress_file(path: impl AsRef<Path>, user_id: &str, goal_id: &str, tz: Tz) -> Result<IngestReport> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "json" => {
            let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
            parse_progress_json(&text, user_id, goal_id, tz).with_context(|| format!("parsing {}", path.display()))
        }
        "csv" => {
            let file = fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
            parse_progress_csv(file, user_id, goal_id, tz).with_context(|| format!("parsing {}", path.display()))
        }
        _ => bail!("unsupported export format: {} (expected .json or .csv)", path.display()),
    }
}
