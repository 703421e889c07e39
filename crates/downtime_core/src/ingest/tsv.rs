use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{ImpactType, Incident, Modality, ValidationWarning};
use crate::normalize::duration::parse_duration_checked;

/// Rows with fewer fields than this are dropped.
pub const MIN_FIELDS: usize = 10;

pub const DEFAULT_REASON: &str = "Unspecified";

// Column layout of the downtime sheet. Column 6 is not used by the engine.
const COL_DATE: usize = 0;
const COL_ISSUE: usize = 1;
const COL_CHANNEL: usize = 2;
const COL_SERVICE: usize = 3;
const COL_IMPACT: usize = 4;
const COL_MODALITY: usize = 5;
const COL_START: usize = 7;
const COL_END: usize = 8;
const COL_DURATION: usize = 9;
const COL_REASON: usize = 10;

/// Visibility into what the lenient parser skipped or degraded.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ParseDiagnostics {
    /// Non-blank lines seen.
    pub rows_read: usize,
    /// Lines dropped for having fewer than [`MIN_FIELDS`] fields.
    pub dropped_rows: usize,
    pub warnings: Vec<ValidationWarning>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParsedIncidents {
    pub incidents: Vec<Incident>,
    pub diagnostics: ParseDiagnostics,
}

fn field(row: &csv::StringRecord, idx: usize) -> String {
    row.get(idx).unwrap_or("").to_string()
}

fn is_blank(row: &csv::StringRecord) -> bool {
    row.iter().all(|f| f.trim().is_empty()) && row.len() <= 1
}

/// Rows end at `\n`; a single `\r` left on the final field by CRLF input is removed.
fn strip_trailing_cr(row: csv::StringRecord) -> csv::StringRecord {
    let needs_trim = row.iter().last().is_some_and(|f| f.ends_with('\r'));
    if !needs_trim {
        return row;
    }
    let last = row.len() - 1;
    row.iter()
        .enumerate()
        .map(|(i, f)| if i == last { &f[..f.len() - 1] } else { f })
        .collect()
}

fn incident_from_row(
    row: &csv::StringRecord,
    line: u64,
    warnings: &mut Vec<ValidationWarning>,
) -> Incident {
    let impact_type = ImpactType::from(row.get(COL_IMPACT).unwrap_or(""));
    let modality = Modality::from(row.get(COL_MODALITY).unwrap_or(""));

    debug!(
        line,
        impact = %impact_type,
        modality = %modality,
        channel = row.get(COL_CHANNEL).unwrap_or(""),
        duration = row.get(COL_DURATION).unwrap_or(""),
        "parsed downtime row"
    );

    if !impact_type.is_known() {
        warnings.push(
            ValidationWarning::new(
                "INGEST_UNKNOWN_IMPACT_TYPE",
                "Impact type is neither FULL nor PARTIAL; row is excluded from chart buckets",
            )
            .with_details(format!("line={line}; value={impact_type}")),
        );
    }
    if !modality.is_known() {
        warnings.push(
            ValidationWarning::new(
                "INGEST_UNKNOWN_MODALITY",
                "Modality is neither PLANNED nor UNPLANNED; row is excluded from chart buckets",
            )
            .with_details(format!("line={line}; value={modality}")),
        );
    }

    let duration = field(row, COL_DURATION);
    parse_duration_checked(&duration, line, warnings);

    let reason = match row.get(COL_REASON) {
        Some(r) if !r.is_empty() => r.to_string(),
        _ => DEFAULT_REASON.to_string(),
    };

    Incident {
        date: field(row, COL_DATE),
        issue: field(row, COL_ISSUE),
        channel: field(row, COL_CHANNEL),
        service: field(row, COL_SERVICE),
        impact_type,
        modality,
        start_time: field(row, COL_START),
        end_time: field(row, COL_END),
        duration,
        reason,
    }
}

/// Split tab-separated downtime text into incidents, keeping input order.
///
/// Lenient by policy: rows with fewer than [`MIN_FIELDS`] fields are dropped and counted in the
/// diagnostics rather than failing the batch. Quotes are literal; tabs are the only delimiter.
pub fn parse_incidents_with_diagnostics(raw: &str) -> ParsedIncidents {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_reader(raw.as_bytes());

    let mut incidents = Vec::new();
    let mut diagnostics = ParseDiagnostics::default();

    for (idx, result) in rdr.records().enumerate() {
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(idx as u64 + 1);
                diagnostics.rows_read += 1;
                diagnostics.dropped_rows += 1;
                diagnostics.warnings.push(
                    ValidationWarning::new("INGEST_ROW_UNREADABLE", "Failed to read downtime row")
                        .with_details(format!("line={line}; err={e}")),
                );
                continue;
            }
        };

        let line = row.position().map(|p| p.line()).unwrap_or(idx as u64 + 1);
        let row = strip_trailing_cr(row);
        if is_blank(&row) {
            continue;
        }
        diagnostics.rows_read += 1;

        if row.len() < MIN_FIELDS {
            debug!(line, fields = row.len(), "dropped downtime row");
            diagnostics.dropped_rows += 1;
            diagnostics.warnings.push(
                ValidationWarning::new(
                    "INGEST_ROW_TOO_FEW_FIELDS",
                    format!("Row has fewer than {MIN_FIELDS} tab-separated fields; dropped"),
                )
                .with_details(format!("line={line}; fields={}", row.len())),
            );
            continue;
        }

        incidents.push(incident_from_row(&row, line, &mut diagnostics.warnings));
    }

    ParsedIncidents {
        incidents,
        diagnostics,
    }
}

/// [`parse_incidents_with_diagnostics`] without the diagnostics.
pub fn parse_incidents(raw: &str) -> Vec<Incident> {
    parse_incidents_with_diagnostics(raw).incidents
}
