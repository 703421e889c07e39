use serde::{Deserialize, Serialize};

use crate::domain::{ImpactType, Modality};
use crate::grouping::IncidentGroups;

/// Deduplicated totals over logical incidents. All durations are minutes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_incidents: i64,
    pub total_duration: i64,
    pub planned_duration: i64,
    pub unplanned_duration: i64,
    pub planned_full_duration: i64,
    pub planned_partial_duration: i64,
    pub unplanned_full_duration: i64,
    pub unplanned_partial_duration: i64,
}

impl Summary {
    /// Field-wise sum, used for month-to-date rollups.
    pub fn combine(self, other: Summary) -> Summary {
        Summary {
            total_incidents: self.total_incidents.saturating_add(other.total_incidents),
            total_duration: self.total_duration.saturating_add(other.total_duration),
            planned_duration: self.planned_duration.saturating_add(other.planned_duration),
            unplanned_duration: self
                .unplanned_duration
                .saturating_add(other.unplanned_duration),
            planned_full_duration: self
                .planned_full_duration
                .saturating_add(other.planned_full_duration),
            planned_partial_duration: self
                .planned_partial_duration
                .saturating_add(other.planned_partial_duration),
            unplanned_full_duration: self
                .unplanned_full_duration
                .saturating_add(other.unplanned_full_duration),
            unplanned_partial_duration: self
                .unplanned_partial_duration
                .saturating_add(other.unplanned_partial_duration),
        }
    }
}

/// One pass over distinct groups, so a multi-channel outage window is counted once.
///
/// Anything not PLANNED is booked as unplanned and anything not FULL as partial, which keeps
/// `total == planned + unplanned == sum of the four sub-totals` for every input.
pub fn summarize(groups: &IncidentGroups) -> Summary {
    let mut s = Summary {
        total_incidents: groups.len() as i64,
        ..Summary::default()
    };

    for g in groups {
        let d = g.duration_minutes;
        s.total_duration = s.total_duration.saturating_add(d);
        let full = g.impact_type == ImpactType::Full;
        if g.modality == Modality::Planned {
            s.planned_duration = s.planned_duration.saturating_add(d);
            if full {
                s.planned_full_duration = s.planned_full_duration.saturating_add(d);
            } else {
                s.planned_partial_duration = s.planned_partial_duration.saturating_add(d);
            }
        } else {
            s.unplanned_duration = s.unplanned_duration.saturating_add(d);
            if full {
                s.unplanned_full_duration = s.unplanned_full_duration.saturating_add(d);
            } else {
                s.unplanned_partial_duration = s.unplanned_partial_duration.saturating_add(d);
            }
        }
    }

    s
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// `part / max(total, 1) * 100`, one decimal.
pub fn share_percentage(part: i64, total: i64) -> f64 {
    round_to(part as f64 / total.max(1) as f64 * 100.0, 1)
}

/// Whole-period view over the deduplicated summary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KeyMetrics {
    pub period_minutes: i64,
    pub total_downtime: i64,
    /// `period - total downtime`; negative when downtime exceeds the period.
    pub service_uptime: i64,
    /// Clamped to `0..=100`, two decimals.
    pub availability_percentage: f64,
    pub planned_share_percentage: f64,
    pub unplanned_share_percentage: f64,
}

pub fn key_metrics(summary: &Summary, period_minutes: i64) -> KeyMetrics {
    let service_uptime = period_minutes - summary.total_duration;
    let availability_percentage = if period_minutes > 0 {
        round_to(service_uptime as f64 / period_minutes as f64 * 100.0, 2).clamp(0.0, 100.0)
    } else {
        0.0
    };

    KeyMetrics {
        period_minutes,
        total_downtime: summary.total_duration,
        service_uptime,
        availability_percentage,
        planned_share_percentage: share_percentage(
            summary.planned_duration,
            summary.total_duration,
        ),
        unplanned_share_percentage: share_percentage(
            summary.unplanned_duration,
            summary.total_duration,
        ),
    }
}
