use serde::{Deserialize, Serialize};
use time::Date;

use crate::error::AppError;
use crate::metrics::{round_to, share_percentage, Summary};
use crate::reports::WeeklyReport;
use crate::validate::parse_iso_date;

/// Relative change (in percent) beyond which a trend is reported as moving.
pub const TREND_THRESHOLD_PERCENT: f64 = 5.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MonthToDate {
    /// `YYYY-MM`.
    pub month: String,
    pub weeks_included: usize,
    pub summary: Summary,
    pub report_ids: Vec<String>,
}

fn week_start(report: &WeeklyReport) -> Option<Date> {
    parse_iso_date("week_start", &report.week_start).ok()
}

/// Sum every report whose week starts between the first of `as_of`'s month and `as_of`.
///
/// Reports with an unparseable `week_start` are ignored. Returns `None` when nothing qualifies.
pub fn month_to_date(reports: &[WeeklyReport], as_of: Date) -> Option<MonthToDate> {
    let month_start = as_of.replace_day(1).ok()?;

    let included = reports
        .iter()
        .filter(|r| week_start(r).is_some_and(|d| d >= month_start && d <= as_of))
        .collect::<Vec<_>>();
    if included.is_empty() {
        return None;
    }

    let summary = included
        .iter()
        .fold(Summary::default(), |acc, r| acc.combine(r.summary));

    Some(MonthToDate {
        month: format!("{:04}-{:02}", as_of.year(), u8::from(as_of.month())),
        weeks_included: included.len(),
        summary,
        report_ids: included.iter().map(|r| r.id.clone()).collect(),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub report_id: String,
    pub week_label: String,
    pub week_start: String,
    pub total_incidents: i64,
    pub total_duration: i64,
    pub planned_duration: i64,
    pub unplanned_duration: i64,
    pub planned_share_percentage: f64,
    pub unplanned_share_percentage: f64,
}

/// One point per report in chronological (`week_start`) order.
pub fn weekly_trend(reports: &[WeeklyReport]) -> Vec<TrendPoint> {
    let mut sorted = reports.iter().collect::<Vec<_>>();
    sorted.sort_by(|a, b| {
        (week_start(a), &a.week_start, &a.id).cmp(&(week_start(b), &b.week_start, &b.id))
    });

    sorted
        .into_iter()
        .map(|r| {
            let s = &r.summary;
            let (planned_share, unplanned_share) = if s.total_duration > 0 {
                (
                    share_percentage(s.planned_duration, s.total_duration),
                    share_percentage(s.unplanned_duration, s.total_duration),
                )
            } else {
                (0.0, 0.0)
            };
            TrendPoint {
                report_id: r.id.clone(),
                week_label: r.week_label.clone(),
                week_start: r.week_start.clone(),
                total_incidents: s.total_incidents,
                total_duration: s.total_duration,
                planned_duration: s.planned_duration,
                unplanned_duration: s.unplanned_duration,
                planned_share_percentage: planned_share,
                unplanned_share_percentage: unplanned_share,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendDirection {
    Up,
    Down,
    Neutral,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrendIndicator {
    pub direction: TrendDirection,
    /// Absolute relative change, one decimal.
    pub change_percentage: f64,
}

pub fn trend_indicator(current: i64, previous: i64) -> TrendIndicator {
    if previous == 0 {
        return TrendIndicator {
            direction: TrendDirection::Neutral,
            change_percentage: 0.0,
        };
    }
    let change = (current - previous) as f64 / previous as f64 * 100.0;
    let direction = if change > TREND_THRESHOLD_PERCENT {
        TrendDirection::Up
    } else if change < -TREND_THRESHOLD_PERCENT {
        TrendDirection::Down
    } else {
        TrendDirection::Neutral
    };
    TrendIndicator {
        direction,
        change_percentage: round_to(change.abs(), 1),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LatestTrends {
    pub latest_id: String,
    pub previous_id: String,
    pub total_duration: TrendIndicator,
    pub total_incidents: TrendIndicator,
}

/// Compare the two most recently created reports. `reports` must be newest first, as returned
/// by [`crate::reports::list_weekly_reports`].
pub fn latest_trends(reports: &[WeeklyReport]) -> Option<LatestTrends> {
    let [latest, previous, ..] = reports else {
        return None;
    };
    Some(LatestTrends {
        latest_id: latest.id.clone(),
        previous_id: previous.id.clone(),
        total_duration: trend_indicator(
            latest.summary.total_duration,
            previous.summary.total_duration,
        ),
        total_incidents: trend_indicator(
            latest.summary.total_incidents,
            previous.summary.total_incidents,
        ),
    })
}

/// Most reports a single comparison may hold.
pub const MAX_COMPARED_REPORTS: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComparedReport {
    pub id: String,
    pub week_label: String,
    pub week_start: String,
    pub week_end: String,
    pub total_incidents: i64,
    pub total_duration: i64,
    pub planned_duration: i64,
    pub unplanned_duration: i64,
    /// `planned / max(total, 1)` as a percentage, one decimal.
    pub planned_ratio: f64,
}

/// Signed change from the second compared report to the first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChangeInsight {
    pub delta: i64,
    /// `|delta / max(previous, 1)|` as a percentage, one decimal.
    pub change_percentage: f64,
    pub direction: TrendDirection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportComparison {
    /// Selected reports in the order of the input listing.
    pub reports: Vec<ComparedReport>,
    pub downtime_change: ChangeInsight,
    pub incident_change: ChangeInsight,
}

fn change_insight(current: i64, previous: i64) -> ChangeInsight {
    let delta = current.saturating_sub(previous);
    let direction = match delta.signum() {
        1 => TrendDirection::Up,
        -1 => TrendDirection::Down,
        _ => TrendDirection::Neutral,
    };
    ChangeInsight {
        delta,
        change_percentage: round_to((delta as f64 / previous.max(1) as f64 * 100.0).abs(), 1),
        direction,
    }
}

/// Side-by-side view of two or three saved reports.
///
/// `reports` is the newest-first listing; the selection keeps that order regardless of the order
/// of `ids`, and the change insights compare the first selected report against the second.
pub fn compare_reports<S: AsRef<str>>(
    reports: &[WeeklyReport],
    ids: &[S],
) -> Result<ReportComparison, AppError> {
    if ids.len() < 2 || ids.len() > MAX_COMPARED_REPORTS {
        return Err(AppError::invalid_input(
            "INPUT_COMPARE_COUNT",
            format!("Select between 2 and {MAX_COMPARED_REPORTS} reports to compare"),
        )
        .with_details(format!("selected={}", ids.len())));
    }
    for (i, id) in ids.iter().enumerate() {
        let id = id.as_ref();
        if ids[..i].iter().any(|other| other.as_ref() == id) {
            return Err(AppError::invalid_input(
                "INPUT_COMPARE_DUPLICATE",
                "A report can only be selected once",
            )
            .with_details(format!("id={id}")));
        }
        if !reports.iter().any(|r| r.id == id) {
            return Err(AppError::new("REPORT_NOT_FOUND", "Weekly report not found")
                .with_details(format!("id={id}")));
        }
    }

    let selected = reports
        .iter()
        .filter(|r| ids.iter().any(|id| id.as_ref() == r.id))
        .collect::<Vec<_>>();
    let (latest, previous) = (&selected[0].summary, &selected[1].summary);

    Ok(ReportComparison {
        downtime_change: change_insight(latest.total_duration, previous.total_duration),
        incident_change: change_insight(latest.total_incidents, previous.total_incidents),
        reports: selected
            .iter()
            .map(|r| ComparedReport {
                id: r.id.clone(),
                week_label: r.week_label.clone(),
                week_start: r.week_start.clone(),
                week_end: r.week_end.clone(),
                total_incidents: r.summary.total_incidents,
                total_duration: r.summary.total_duration,
                planned_duration: r.summary.planned_duration,
                unplanned_duration: r.summary.unplanned_duration,
                planned_ratio: share_percentage(
                    r.summary.planned_duration,
                    r.summary.total_duration,
                ),
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn report(id: &str, start: &str, total: i64, planned: i64, incidents: i64) -> WeeklyReport {
        WeeklyReport {
            id: id.to_string(),
            week_label: format!("Week of {start}"),
            week_start: start.to_string(),
            week_end: start.to_string(),
            created_at: "2025-08-31T00:00:00.000Z".to_string(),
            summary: Summary {
                total_incidents: incidents,
                total_duration: total,
                planned_duration: planned,
                unplanned_duration: total - planned,
                planned_full_duration: planned,
                unplanned_full_duration: total - planned,
                ..Summary::default()
            },
        }
    }

    fn date(raw: &str) -> Date {
        parse_iso_date("test", raw).unwrap()
    }

    #[test]
    fn month_to_date_sums_reports_inside_the_window() {
        let reports = vec![
            report("a", "2025-07-27", 100, 50, 1),
            report("b", "2025-08-03", 300, 230, 4),
            report("c", "2025-08-10", 60, 0, 2),
            report("d", "2025-08-24", 999, 0, 9),
        ];
        let mtd = month_to_date(&reports, date("2025-08-15")).unwrap();
        assert_eq!(mtd.month, "2025-08");
        assert_eq!(mtd.weeks_included, 2);
        assert_eq!(mtd.report_ids, vec!["b".to_string(), "c".to_string()]);
        assert_eq!(mtd.summary.total_duration, 360);
        assert_eq!(mtd.summary.total_incidents, 6);
        assert_eq!(mtd.summary.planned_full_duration, 230);

        assert_eq!(month_to_date(&reports, date("2025-09-02")), None);
    }

    #[test]
    fn trend_points_are_chronological_with_shares() {
        let reports = vec![
            report("new", "2025-08-10", 0, 0, 0),
            report("old", "2025-08-03", 300, 230, 4),
        ];
        let points = weekly_trend(&reports);
        assert_eq!(points[0].report_id, "old");
        assert_eq!(points[0].planned_share_percentage, 76.7);
        assert_eq!(points[0].unplanned_share_percentage, 23.3);
        assert_eq!(points[1].planned_share_percentage, 0.0);
    }

    #[test]
    fn indicator_applies_five_percent_band() {
        assert_eq!(
            trend_indicator(110, 100),
            TrendIndicator {
                direction: TrendDirection::Up,
                change_percentage: 10.0
            }
        );
        assert_eq!(trend_indicator(96, 100).direction, TrendDirection::Neutral);
        assert_eq!(trend_indicator(50, 150).direction, TrendDirection::Down);
        assert_eq!(trend_indicator(50, 150).change_percentage, 66.7);
        assert_eq!(trend_indicator(50, 0).direction, TrendDirection::Neutral);
    }

    #[test]
    fn latest_trends_needs_two_reports() {
        let one = vec![report("a", "2025-08-03", 10, 0, 1)];
        assert_eq!(latest_trends(&one), None);

        let two = vec![
            report("b", "2025-08-10", 20, 0, 1),
            report("a", "2025-08-03", 10, 0, 1),
        ];
        let t = latest_trends(&two).unwrap();
        assert_eq!(t.latest_id, "b");
        assert_eq!(t.total_duration.direction, TrendDirection::Up);
        assert_eq!(t.total_duration.change_percentage, 100.0);
        assert_eq!(t.total_incidents.direction, TrendDirection::Neutral);
    }

    #[test]
    fn comparison_follows_listing_order_and_reports_signed_deltas() {
        let listing = vec![
            report("c", "2025-08-17", 0, 0, 0),
            report("b", "2025-08-10", 150, 60, 3),
            report("a", "2025-08-03", 200, 50, 4),
        ];
        let cmp = compare_reports(&listing, &["a", "b"]).unwrap();
        let ids = cmp.reports.iter().map(|r| r.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(cmp.reports[0].planned_ratio, 40.0);
        assert_eq!(cmp.reports[1].planned_ratio, 25.0);
        assert_eq!(
            cmp.downtime_change,
            ChangeInsight {
                delta: -50,
                change_percentage: 25.0,
                direction: TrendDirection::Down,
            }
        );
        assert_eq!(cmp.incident_change.delta, -1);
        assert_eq!(cmp.incident_change.change_percentage, 25.0);

        let three = compare_reports(&listing, &["a", "b", "c"]).unwrap();
        assert_eq!(three.reports.len(), 3);
        assert_eq!(three.reports[0].planned_ratio, 0.0);
        // Previous total of 150 against an empty latest week.
        assert_eq!(three.downtime_change.delta, -150);
        assert_eq!(three.downtime_change.change_percentage, 100.0);
    }

    #[test]
    fn comparison_against_an_empty_week_divides_by_one() {
        let listing = vec![
            report("b", "2025-08-10", 30, 0, 2),
            report("a", "2025-08-03", 0, 0, 0),
        ];
        let cmp = compare_reports(&listing, &["b", "a"]).unwrap();
        assert_eq!(cmp.downtime_change.delta, 30);
        assert_eq!(cmp.downtime_change.change_percentage, 3000.0);
        assert_eq!(cmp.incident_change.direction, TrendDirection::Up);
        assert_eq!(cmp.incident_change.change_percentage, 200.0);
    }

    #[test]
    fn comparison_rejects_bad_selections() {
        let listing = vec![
            report("b", "2025-08-10", 30, 0, 2),
            report("a", "2025-08-03", 10, 0, 1),
        ];
        fn code(listing: &[WeeklyReport], ids: &[&str]) -> String {
            compare_reports(listing, ids).unwrap_err().code
        }
        assert_eq!(code(&listing, &["a"]), "INPUT_COMPARE_COUNT");
        assert_eq!(code(&listing, &["a", "b", "a", "b"]), "INPUT_COMPARE_COUNT");
        assert_eq!(code(&listing, &["a", "a"]), "INPUT_COMPARE_DUPLICATE");
        assert_eq!(code(&listing, &["a", "missing"]), "REPORT_NOT_FOUND");
    }
}
