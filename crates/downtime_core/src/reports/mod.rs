pub mod rollup;

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::{format_description, OffsetDateTime, UtcOffset};
use tracing::info;

use crate::error::AppError;
use crate::metrics::Summary;
use crate::validate::{validate_report_input, WeeklyReportInput};

/// A saved week: caller labelling plus the deduplicated summary of that week's data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReport {
    pub id: String,
    pub week_label: String,
    pub week_start: String,
    pub week_end: String,
    pub created_at: String,
    pub summary: Summary,
}

// Fixed millisecond precision keeps stored timestamps lexically ordered.
const CREATED_AT_FORMAT: &str =
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z";

fn format_created_at(created: OffsetDateTime) -> Result<String, AppError> {
    let items = format_description::parse(CREATED_AT_FORMAT).map_err(|e| {
        AppError::new("REPORT_TIME_FORMAT_FAILED", "created_at format config error")
            .with_details(e.to_string())
    })?;
    created
        .to_offset(UtcOffset::UTC)
        .format(&items)
        .map_err(|e| {
            AppError::new("REPORT_TIME_FORMAT_FAILED", "Failed to format created_at")
                .with_details(e.to_string())
        })
}

fn parse_created_at(created_at: &str) -> Result<OffsetDateTime, AppError> {
    OffsetDateTime::parse(created_at, &Rfc3339).map_err(|e| {
        AppError::invalid_input("INPUT_CREATED_AT_INVALID", "created_at must be RFC3339")
            .with_details(format!("value={created_at}; err={e}"))
    })
}

fn id_exists(conn: &Connection, id: &str) -> Result<bool, AppError> {
    conn.query_row("SELECT 1 FROM weekly_reports WHERE id = ?1", [id], |_| Ok(()))
        .optional()
        .map(|found| found.is_some())
        .map_err(|e| AppError::db("DB_QUERY_FAILED", "Failed to check report id", e))
}

/// `report_<unix millis>`, suffixed `_<n>` when several reports share a millisecond.
fn allocate_id(conn: &Connection, created: OffsetDateTime) -> Result<String, AppError> {
    let millis = created.unix_timestamp_nanos() / 1_000_000;
    let base = format!("report_{millis}");
    if !id_exists(conn, &base)? {
        return Ok(base);
    }
    let mut n = 2u32;
    loop {
        let candidate = format!("{base}_{n}");
        if !id_exists(conn, &candidate)? {
            return Ok(candidate);
        }
        n += 1;
    }
}

fn decode_summary(id: &str, raw: &str) -> Result<Summary, AppError> {
    serde_json::from_str(raw).map_err(|e| {
        AppError::new("REPORT_SUMMARY_DECODE_FAILED", "Stored report summary is corrupt")
            .with_details(format!("id={id}; err={e}"))
    })
}

/// Validate the labelling, then store a snapshot of `summary`.
///
/// `created_at` is an RFC3339 timestamp supplied by the caller so saves stay reproducible; it is
/// stored in UTC with millisecond precision.
pub fn save_weekly_report(
    conn: &Connection,
    input: &WeeklyReportInput,
    summary: &Summary,
    created_at: &str,
) -> Result<WeeklyReport, AppError> {
    let input = validate_report_input(input)?;
    let created = parse_created_at(created_at)?;
    let created_at = format_created_at(created)?;
    let id = allocate_id(conn, created)?;

    let summary_json = serde_json::to_string(summary).map_err(|e| {
        AppError::new("REPORT_SUMMARY_ENCODE_FAILED", "Failed to encode report summary")
            .with_details(e.to_string())
    })?;

    conn.execute(
        r#"
      INSERT INTO weekly_reports(id, week_label, week_start, week_end, created_at, summary_json)
      VALUES (?1, ?2, ?3, ?4, ?5, ?6)
      "#,
        params![
            id,
            input.week_label,
            input.week_start,
            input.week_end,
            created_at,
            summary_json
        ],
    )
    .map_err(|e| AppError::db("DB_INSERT_FAILED", "Failed to save weekly report", e))?;

    info!(id = %id, label = %input.week_label, "saved weekly report");

    Ok(WeeklyReport {
        id,
        week_label: input.week_label,
        week_start: input.week_start,
        week_end: input.week_end,
        created_at,
        summary: *summary,
    })
}

fn row_to_report(row: &rusqlite::Row<'_>) -> rusqlite::Result<(WeeklyReport, String)> {
    Ok((
        WeeklyReport {
            id: row.get(0)?,
            week_label: row.get(1)?,
            week_start: row.get(2)?,
            week_end: row.get(3)?,
            created_at: row.get(4)?,
            summary: Summary::default(),
        },
        row.get(5)?,
    ))
}

fn finish(pair: (WeeklyReport, String)) -> Result<WeeklyReport, AppError> {
    let (mut report, summary_json) = pair;
    report.summary = decode_summary(&report.id, &summary_json)?;
    Ok(report)
}

/// All saved reports, most recently created first.
pub fn list_weekly_reports(conn: &Connection) -> Result<Vec<WeeklyReport>, AppError> {
    let mut stmt = conn
        .prepare(
            r#"
      SELECT id, week_label, week_start, week_end, created_at, summary_json
      FROM weekly_reports
      ORDER BY created_at DESC, id DESC
      "#,
        )
        .map_err(|e| AppError::db("DB_QUERY_FAILED", "Failed to prepare reports query", e))?;

    let rows = stmt
        .query_map([], row_to_report)
        .map_err(|e| AppError::db("DB_QUERY_FAILED", "Failed to query reports", e))?;

    let mut out = Vec::new();
    for r in rows {
        let pair =
            r.map_err(|e| AppError::db("DB_QUERY_FAILED", "Failed to decode report row", e))?;
        out.push(finish(pair)?);
    }
    Ok(out)
}

pub fn get_weekly_report(conn: &Connection, id: &str) -> Result<Option<WeeklyReport>, AppError> {
    conn.query_row(
        r#"
      SELECT id, week_label, week_start, week_end, created_at, summary_json
      FROM weekly_reports WHERE id = ?1
      "#,
        [id],
        row_to_report,
    )
    .optional()
    .map_err(|e| AppError::db("DB_QUERY_FAILED", "Failed to load report", e))?
    .map(finish)
    .transpose()
}

/// Remove a report. Unknown ids are not an error; returns whether a row was deleted.
pub fn delete_weekly_report(conn: &Connection, id: &str) -> Result<bool, AppError> {
    let n = conn
        .execute("DELETE FROM weekly_reports WHERE id = ?1", [id])
        .map_err(|e| AppError::db("DB_DELETE_FAILED", "Failed to delete weekly report", e))?;
    if n > 0 {
        info!(id = %id, "deleted weekly report");
    }
    Ok(n > 0)
}
