use anyhow::Result;
use clap::Parser;
use pretty_assertions::assert_eq;
use serde_json::Value;
use tempfile::tempdir;

use downtime_lib::commands::execute;
use downtime_lib::config::{Cli, InputArgs};
use downtime_lib::render_error;

const SHEET: &str = "4-Aug-25\tTransfer timeouts\tTRANSFER MONEY\tBank transfer\tFULL\t\
                     UNPLANNED\tYES\t2:15 PM\t3:14 PM\t0:59:00\tCore banking outage\n";

fn fixed_sheet(_: &InputArgs) -> Result<String> {
    Ok(SHEET.to_string())
}

fn run(args: &[&str]) -> Result<Value> {
    let cli = Cli::try_parse_from(args).expect("args parse");
    let out = execute(&cli.command, &cli.global, &fixed_sheet)?;
    Ok(serde_json::from_str(&out).expect("stdout is JSON"))
}

#[test]
fn analyze_prints_the_aggregate_result() {
    let v = run(&["downtime", "analyze", "-"]).unwrap();
    assert_eq!(v["summary"]["totalIncidents"], 1);
    assert_eq!(v["reliabilityData"][0]["uptimePercentage"], 99.41);
    assert_eq!(v["keyMetrics"]["periodMinutes"], 10080);
}

#[test]
fn period_flag_changes_the_denominator() {
    let v = run(&["downtime", "--period-minutes", "1440", "analyze"]).unwrap();
    assert_eq!(v["reliabilityData"][0]["totalMinutesInPeriod"], 1440);
    assert_eq!(v["reliabilityData"][0]["uptimePercentage"], 95.9);
}

#[test]
fn non_positive_period_is_a_structured_error() {
    let err = run(&["downtime", "--period-minutes", "0", "analyze"]).unwrap_err();
    let rendered: Value = serde_json::from_str(&render_error(&err, true)).unwrap();
    assert_eq!(rendered["code"], "INPUT_PERIOD_NOT_POSITIVE");
    assert!(render_error(&err, false).starts_with("error: [INPUT_PERIOD_NOT_POSITIVE]"));
}

#[test]
fn demo_flag_conflicts_with_a_path() {
    assert!(Cli::try_parse_from(["downtime", "analyze", "--demo", "sheet.tsv"]).is_err());
}

#[test]
fn report_lifecycle_against_a_file_store() {
    let tmp = tempdir().unwrap();
    let db = tmp.path().join("reports.sqlite");
    let db = db.to_str().unwrap();

    let saved = run(&[
        "downtime", "--db", db, "report", "save", "--label", "Week 32", "--start", "2025-08-03",
        "--end", "2025-08-09", "--created-at", "2025-08-10T09:00:00Z",
    ])
    .unwrap();
    assert_eq!(saved["id"], "report_1754816400000");
    assert_eq!(saved["summary"]["unplannedFullDuration"], 59);

    let listed = run(&["downtime", "--db", db, "report", "list"]).unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let mtd = run(&["downtime", "--db", db, "report", "mtd", "--as-of", "2025-08-12"]).unwrap();
    assert_eq!(mtd["month"], "2025-08");
    assert_eq!(mtd["weeksIncluded"], 1);

    let trends = run(&["downtime", "--db", db, "report", "trends"]).unwrap();
    assert_eq!(trends["points"].as_array().unwrap().len(), 1);
    assert_eq!(trends["latest"], Value::Null);

    let deleted = run(&[
        "downtime", "--db", db, "report", "delete", "report_1754816400000",
    ])
    .unwrap();
    assert_eq!(deleted["deleted"], true);
    let listed = run(&["downtime", "--db", db, "report", "list"]).unwrap();
    assert!(listed.as_array().unwrap().is_empty());
}

#[test]
fn invalid_report_labelling_fails_before_saving() {
    let err = run(&[
        "downtime", "--db", ":memory:", "report", "save", "--label", " ", "--start", "2025-08-03",
        "--end", "2025-08-09",
    ])
    .unwrap_err();
    let app = err.downcast_ref::<downtime_core::error::AppError>().unwrap();
    assert_eq!(app.code, "INPUT_WEEK_LABEL_REQUIRED");
}

#[test]
fn compare_reads_two_saved_reports() {
    let tmp = tempdir().unwrap();
    let db = tmp.path().join("reports.sqlite");
    let db = db.to_str().unwrap();

    for (label, start, end, created_at) in [
        ("Week 31", "2025-07-27", "2025-08-02", "2025-08-03T09:00:00Z"),
        ("Week 32", "2025-08-03", "2025-08-09", "2025-08-10T09:00:00Z"),
    ] {
        run(&[
            "downtime", "--db", db, "report", "save", "--label", label, "--start", start,
            "--end", end, "--created-at", created_at,
        ])
        .unwrap();
    }

    let cmp = run(&[
        "downtime", "--db", db, "report", "compare", "report_1754211600000",
        "report_1754816400000",
    ])
    .unwrap();
    assert_eq!(cmp["reports"][0]["id"], "report_1754816400000");
    assert_eq!(cmp["reports"][0]["plannedRatio"], 0.0);
    assert_eq!(cmp["downtimeChange"]["delta"], 0);
    assert_eq!(cmp["downtimeChange"]["direction"], "NEUTRAL");

    let err = run(&[
        "downtime", "--db", db, "report", "compare", "report_1754816400000", "report_0",
    ])
    .unwrap_err();
    let app = err.downcast_ref::<downtime_core::error::AppError>().unwrap();
    assert_eq!(app.code, "REPORT_NOT_FOUND");
}

#[test]
fn compare_takes_at_most_three_ids() {
    assert!(Cli::try_parse_from(["downtime", "report", "compare", "a"]).is_err());
    assert!(Cli::try_parse_from(["downtime", "report", "compare", "a", "b", "c", "d"]).is_err());
    assert!(Cli::try_parse_from(["downtime", "report", "compare", "a", "b", "c"]).is_ok());
}

#[test]
fn log_format_accepts_text_and_json() {
    use downtime_lib::config::LogFormat;

    let parse = |fmt: &str| {
        Cli::try_parse_from(["downtime", "--log-format", fmt, "report", "list"])
            .map(|cli| cli.global.log_format)
    };
    assert_eq!(parse("text").unwrap(), LogFormat::Text);
    assert_eq!(parse("json").unwrap(), LogFormat::Json);
    assert!(parse("pretty").is_err());
}
