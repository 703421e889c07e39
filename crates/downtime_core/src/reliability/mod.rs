use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::{ImpactType, Incident, Modality};
use crate::grouping::group_incidents;
use crate::metrics::round_to;

/// One calendar week: 7 * 24 * 60.
pub const DEFAULT_PERIOD_MINUTES: i64 = 10_080;

pub const HEALTHY_THRESHOLD: f64 = 99.9;
pub const DEGRADED_THRESHOLD: f64 = 99.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReliabilityTier {
    Healthy,
    Degraded,
    Critical,
}

impl ReliabilityTier {
    pub fn for_uptime(uptime_percentage: f64) -> Self {
        if uptime_percentage >= HEALTHY_THRESHOLD {
            ReliabilityTier::Healthy
        } else if uptime_percentage >= DEGRADED_THRESHOLD {
            ReliabilityTier::Degraded
        } else {
            ReliabilityTier::Critical
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReliabilityData {
    pub channel: String,
    pub planned_downtime: i64,
    pub unplanned_full_downtime: i64,
    pub total_minutes_in_period: i64,
    pub uptime_percentage: f64,
    pub tier: ReliabilityTier,
}

/// `(period - unplanned_full) / period * 100`, two decimals, clamped to `0..=100`.
///
/// Planned and partial downtime never count against uptime.
pub fn uptime_percentage(unplanned_full_downtime: i64, period_minutes: i64) -> f64 {
    if period_minutes <= 0 {
        return 0.0;
    }
    let up = period_minutes.saturating_sub(unplanned_full_downtime) as f64;
    round_to(up / period_minutes as f64 * 100.0, 2).clamp(0.0, 100.0)
}

fn channel_reliability(
    channel: &str,
    incidents: &[Incident],
    period_minutes: i64,
) -> ReliabilityData {
    let scoped = incidents
        .iter()
        .filter(|inc| inc.channel == channel)
        .cloned()
        .collect::<Vec<_>>();
    // Channel-scoped regrouping: a window repeated for this channel is counted once.
    let (groups, _) = group_incidents(&scoped);

    let mut planned_downtime = 0i64;
    let mut unplanned_full_downtime = 0i64;
    for g in &groups {
        match (&g.modality, &g.impact_type) {
            (Modality::Planned, _) => {
                planned_downtime = planned_downtime.saturating_add(g.duration_minutes);
            }
            (Modality::Unplanned, ImpactType::Full) => {
                unplanned_full_downtime =
                    unplanned_full_downtime.saturating_add(g.duration_minutes);
            }
            _ => {}
        }
    }

    let uptime = uptime_percentage(unplanned_full_downtime, period_minutes);
    ReliabilityData {
        channel: channel.to_string(),
        planned_downtime,
        unplanned_full_downtime,
        total_minutes_in_period: period_minutes,
        uptime_percentage: uptime,
        tier: ReliabilityTier::for_uptime(uptime),
    }
}

/// Per-channel reliability over the raw incident rows, ordered by channel name (byte-wise).
pub fn compute_reliability(incidents: &[Incident], period_minutes: i64) -> Vec<ReliabilityData> {
    let channels = incidents
        .iter()
        .map(|inc| inc.channel.as_str())
        .collect::<BTreeSet<_>>();

    channels
        .into_iter()
        .map(|channel| channel_reliability(channel, incidents, period_minutes))
        .collect()
}
