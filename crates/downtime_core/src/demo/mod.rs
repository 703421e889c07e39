use rusqlite::Connection;

use crate::engine::aggregate_week;
use crate::error::AppError;
use crate::reports::{save_weekly_report, WeeklyReport};
use crate::validate::WeeklyReportInput;

/// A sanitized sample week: a three-channel planned maintenance, unplanned full and partial
/// outages, a two-channel unplanned outage and one truncated export row.
pub const DEMO_DOWNTIME_TSV: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../fixtures/demo/downtime_week.tsv"
));

/// Save the demo week as a report so list/rollup/trend views have something to show.
pub fn seed_demo_report(conn: &Connection, created_at: &str) -> Result<WeeklyReport, AppError> {
    let result = aggregate_week(DEMO_DOWNTIME_TSV);
    let input = WeeklyReportInput {
        week_label: "Demo week 32".to_string(),
        week_start: "2025-08-03".to_string(),
        week_end: "2025-08-09".to_string(),
    };
    save_weekly_report(conn, &input, &result.summary, created_at)
}
