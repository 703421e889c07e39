use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::debug;

use downtime_core::demo::DEMO_DOWNTIME_TSV;
use downtime_core::reports::rollup::{
    compare_reports, latest_trends, month_to_date, weekly_trend, LatestTrends, TrendPoint,
};
use downtime_core::reports::{delete_weekly_report, list_weekly_reports, save_weekly_report};
use downtime_core::validate::{parse_iso_date, validate_report_input, WeeklyReportInput};
use downtime_core::{aggregate, db, AggregateOptions};

use crate::config::{Command, GlobalOptions, InputArgs, ReportCommand};

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub ok: bool,
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendsResponse {
    pub points: Vec<TrendPoint>,
    pub latest: Option<LatestTrends>,
}

/// Read the sheet from a file, stdin (`-` or no path) or the bundled demo.
pub fn read_input(args: &InputArgs) -> Result<String> {
    if args.demo {
        return Ok(DEMO_DOWNTIME_TSV.to_string());
    }
    match args.input.as_deref() {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {}", path.display())),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read input from stdin")?;
            Ok(buf)
        }
    }
}

fn now_rfc3339_utc() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("failed to format current time")
}

fn open_store(global: &GlobalOptions) -> Result<Connection> {
    debug!(db = %global.db.display(), "opening report store");
    Ok(db::open_report_store(&global.db)?)
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let out = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    out.context("failed to encode JSON output")
}

/// Execute one command and return the JSON it prints on stdout.
///
/// `read` supplies the sheet text so tests can bypass stdin.
pub fn execute(
    command: &Command,
    global: &GlobalOptions,
    read: &dyn Fn(&InputArgs) -> Result<String>,
) -> Result<String> {
    let options = AggregateOptions::with_period_minutes(global.period_minutes)?;

    match command {
        Command::Analyze { input } => {
            let raw = read(input)?;
            to_json(&aggregate(&raw, &options), global.pretty)
        }
        Command::Report { command } => match command {
            ReportCommand::Save {
                label,
                start,
                end,
                created_at,
                input,
            } => {
                // Validate before reading or aggregating anything.
                let week = validate_report_input(&WeeklyReportInput {
                    week_label: label.clone(),
                    week_start: start.clone(),
                    week_end: end.clone(),
                })?;
                let raw = read(input)?;
                let result = aggregate(&raw, &options);
                let created_at = match created_at {
                    Some(ts) => ts.clone(),
                    None => now_rfc3339_utc()?,
                };
                let conn = open_store(global)?;
                let report = save_weekly_report(&conn, &week, &result.summary, &created_at)?;
                to_json(&report, global.pretty)
            }
            ReportCommand::List => {
                let conn = open_store(global)?;
                to_json(&list_weekly_reports(&conn)?, global.pretty)
            }
            ReportCommand::Delete { id } => {
                let conn = open_store(global)?;
                let deleted = delete_weekly_report(&conn, id)?;
                to_json(&DeleteResponse { ok: true, deleted }, global.pretty)
            }
            ReportCommand::Mtd { as_of } => {
                let as_of = match as_of {
                    Some(raw) => parse_iso_date("as_of", raw)?,
                    None => OffsetDateTime::now_utc().date(),
                };
                let conn = open_store(global)?;
                let reports = list_weekly_reports(&conn)?;
                to_json(&month_to_date(&reports, as_of), global.pretty)
            }
            ReportCommand::Trends => {
                let conn = open_store(global)?;
                let reports = list_weekly_reports(&conn)?;
                let response = TrendsResponse {
                    points: weekly_trend(&reports),
                    latest: latest_trends(&reports),
                };
                to_json(&response, global.pretty)
            }
            ReportCommand::Compare { ids } => {
                let conn = open_store(global)?;
                let reports = list_weekly_reports(&conn)?;
                to_json(&compare_reports(&reports, ids.as_slice())?, global.pretty)
            }
        },
    }
}
