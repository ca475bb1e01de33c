//! Row validation: untyped backend rows -> `ProgressRecord`.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use streakline_core::{MarkedMethod, ProgressRecord};
use tracing::{debug, warn};

use crate::types::{IngestError, IngestReport, RawFlag, RawProgressRow, RejectedRow};

/// Plain days are taken as-is; timestamps land on their calendar day in `tz`.
fn parse_date(s: &str, tz: Tz) -> Result<NaiveDate, IngestError> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d);
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&tz).date_naive())
        .map_err(|_| IngestError::InvalidDate(s.to_string()))
}

fn parse_flag(flag: &RawFlag) -> Result<bool, IngestError> {
    match flag {
        RawFlag::Bool(b) => Ok(*b),
        RawFlag::Int(1) => Ok(true),
        RawFlag::Int(0) => Ok(false),
        RawFlag::Int(n) => Err(IngestError::InvalidFlag(n.to_string())),
        RawFlag::Text(s) => match s.trim().to_lowercase().as_str() {
            "true" | "t" | "1" | "yes" | "y" => Ok(true),
            "false" | "f" | "0" | "no" | "n" => Ok(false),
            _ => Err(IngestError::InvalidFlag(s.clone())),
        },
    }
}

fn parse_method(s: Option<&str>) -> Result<MarkedMethod, IngestError> {
    match s.map(str::trim).filter(|s| !s.is_empty()) {
        None | Some("ai_auto") | Some("automatic") => Ok(MarkedMethod::Automatic),
        Some("manual_edit") | Some("manual") => Ok(MarkedMethod::ManualEdit),
        Some(other) => Err(IngestError::InvalidMethod(other.to_string())),
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, IngestError> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| IngestError::InvalidTimestamp(s.to_string()))
}

fn check_owner(found: Option<&str>, expected: &str) -> Result<(), IngestError> {
    match found.map(str::trim).filter(|s| !s.is_empty()) {
        Some(found) if found != expected => Err(IngestError::WrongOwner {
            expected: expected.to_string(),
            found: found.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Validate one row for the (user, goal) being imported. `tz` is the user's
/// canonical timezone.
pub fn validate_row(
    row: &RawProgressRow,
    user_id: &str,
    goal_id: &str,
    tz: Tz,
) -> Result<ProgressRecord, IngestError> {
    check_owner(row.user_id.as_deref(), user_id)?;
    check_owner(row.goal_id.as_deref(), goal_id)?;

    let date = row
        .date
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or(IngestError::MissingField("date"))
        .and_then(|s| parse_date(s, tz))?;
    let completed = row
        .completed
        .as_ref()
        .ok_or(IngestError::MissingField("completed"))
        .and_then(parse_flag)?;
    let method = parse_method(row.marked_method.as_deref())?;
    let edited_at = row
        .edited_at
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(parse_timestamp)
        .transpose()?;

    let record = ProgressRecord::new(user_id, goal_id, date).with_completed(completed);
    Ok(match (method, edited_at) {
        (MarkedMethod::ManualEdit, Some(at)) => record.edited_manually(at),
        (MarkedMethod::ManualEdit, None) => ProgressRecord {
            marked_method: MarkedMethod::ManualEdit,
            ..record
        },
        (MarkedMethod::Automatic, Some(_)) => {
            debug!(%date, "dropping edited_at on automatically marked row");
            record
        }
        (MarkedMethod::Automatic, None) => record,
    })
}

/// Validate every row, collecting failures instead of stopping at the first.
pub fn validate_rows<'a, I>(rows: I, user_id: &str, goal_id: &str, tz: Tz) -> IngestReport
where
    I: IntoIterator<Item = &'a RawProgressRow>,
{
    let mut report = IngestReport::default();
    for (index, row) in rows.into_iter().enumerate() {
        match validate_row(row, user_id, goal_id, tz) {
            Ok(record) => report.records.push(record),
            Err(error) => {
                warn!(index, %error, "rejected progress row");
                report.rejected.push(RejectedRow { index, error });
            }
        }
    }
    report
}
