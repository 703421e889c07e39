use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analytics::{categorize, ChartData};
use crate::domain::Incident;
use crate::error::AppError;
use crate::grouping::{group_incidents, GroupOverview};
use crate::ingest::tsv::{parse_incidents_with_diagnostics, ParseDiagnostics};
use crate::metrics::{key_metrics, summarize, KeyMetrics, Summary};
use crate::reliability::{compute_reliability, ReliabilityData, DEFAULT_PERIOD_MINUTES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateOptions {
    /// Length of the analysis window uptime is measured against.
    pub period_minutes: i64,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            period_minutes: DEFAULT_PERIOD_MINUTES,
        }
    }
}

impl AggregateOptions {
    pub fn with_period_minutes(period_minutes: i64) -> Result<Self, AppError> {
        if period_minutes <= 0 {
            return Err(AppError::invalid_input(
                "INPUT_PERIOD_NOT_POSITIVE",
                "Analysis period must be a positive number of minutes",
            )
            .with_details(format!("period_minutes={period_minutes}")));
        }
        Ok(Self { period_minutes })
    }
}

/// Everything presentation and export need; no further derivation happens downstream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    pub summary: Summary,
    pub chart_data: ChartData,
    pub incidents: Vec<Incident>,
    pub reliability_data: Vec<ReliabilityData>,
    pub key_metrics: KeyMetrics,
    pub groups: Vec<GroupOverview>,
    pub diagnostics: ParseDiagnostics,
}

/// Run one full aggregation pass over tab-separated downtime text.
///
/// Total and deterministic: malformed rows are dropped and reported in `diagnostics`, never
/// raised. Categorizer, summarizer and reliability calculator all read the same parsed rows;
/// the first two share one global grouping pass.
pub fn aggregate(raw_text: &str, options: &AggregateOptions) -> AggregateResult {
    let parsed = parse_incidents_with_diagnostics(raw_text);
    let mut diagnostics = parsed.diagnostics;
    let incidents = parsed.incidents;

    let (groups, group_warnings) = group_incidents(&incidents);
    diagnostics.warnings.extend(group_warnings);

    let chart_data = categorize(&groups);
    let summary = summarize(&groups);
    let reliability_data = compute_reliability(&incidents, options.period_minutes);
    let key_metrics = key_metrics(&summary, options.period_minutes);

    info!(
        rows = diagnostics.rows_read,
        dropped = diagnostics.dropped_rows,
        incidents = incidents.len(),
        groups = groups.len(),
        channels = reliability_data.len(),
        warnings = diagnostics.warnings.len(),
        "aggregated downtime records"
    );

    AggregateResult {
        summary,
        chart_data,
        groups: groups.iter().map(GroupOverview::from).collect(),
        incidents,
        reliability_data,
        key_metrics,
        diagnostics,
    }
}

/// [`aggregate`] over the default one-week period.
pub fn aggregate_week(raw_text: &str) -> AggregateResult {
    aggregate(raw_text, &AggregateOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_period_is_rejected_at_the_boundary() {
        let err = AggregateOptions::with_period_minutes(0).unwrap_err();
        assert_eq!(err.code, "INPUT_PERIOD_NOT_POSITIVE");
        assert_eq!(
            AggregateOptions::with_period_minutes(60).unwrap().period_minutes,
            60
        );
    }

    #[test]
    fn empty_input_yields_zeroed_result() {
        let r = aggregate_week("");
        assert_eq!(r.summary, Summary::default());
        assert!(r.chart_data.is_empty());
        assert!(r.incidents.is_empty());
        assert!(r.reliability_data.is_empty());
        assert!(r.groups.is_empty());
        assert_eq!(r.key_metrics.service_uptime, DEFAULT_PERIOD_MINUTES);
    }
}
