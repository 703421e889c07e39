use serde::{Deserialize, Serialize};
use time::{format_description, Date};

use crate::error::AppError;

const DATE_FORMAT: &str = "[year]-[month]-[day]";

/// Caller-supplied labelling for a saved weekly report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReportInput {
    pub week_label: String,
    pub week_start: String,
    pub week_end: String,
}

/// Parse a calendar date in `YYYY-MM-DD` form.
pub fn parse_iso_date(field: &str, raw: &str) -> Result<Date, AppError> {
    let items = format_description::parse(DATE_FORMAT).map_err(|e| {
        AppError::new("INPUT_DATE_FORMAT_CONFIG_FAILED", "Date format config error")
            .with_details(e.to_string())
    })?;
    Date::parse(raw.trim(), &items).map_err(|e| {
        AppError::invalid_input(
            "INPUT_DATE_INVALID",
            format!("{field} must be a YYYY-MM-DD date"),
        )
        .with_details(format!("value={raw}; err={e}"))
    })
}

/// Request validation for saving a report; runs before any aggregation.
///
/// Label must be non-blank; start and end must be dates with start <= end. Returns the input
/// with the label trimmed and dates in canonical form.
pub fn validate_report_input(input: &WeeklyReportInput) -> Result<WeeklyReportInput, AppError> {
    let week_label = input.week_label.trim();
    if week_label.is_empty() {
        return Err(AppError::invalid_input(
            "INPUT_WEEK_LABEL_REQUIRED",
            "Week label is required",
        ));
    }

    let start = parse_iso_date("week_start", &input.week_start)?;
    let end = parse_iso_date("week_end", &input.week_end)?;
    if start > end {
        return Err(AppError::invalid_input(
            "INPUT_WEEK_RANGE_INVERTED",
            "Week start must not be after week end",
        )
        .with_details(format!("week_start={start}; week_end={end}")));
    }

    Ok(WeeklyReportInput {
        week_label: week_label.to_string(),
        week_start: start.to_string(),
        week_end: end.to_string(),
    })
}
