use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::DowntimeCategory;
use crate::grouping::IncidentGroups;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelDuration {
    pub channel: String,
    pub duration: i64,
}

/// Per-channel downtime minutes for each modality x impact bucket.
///
/// Every bucket is ordered by channel name (byte-wise ascending).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub planned_full: Vec<ChannelDuration>,
    pub unplanned_full: Vec<ChannelDuration>,
    pub planned_partial: Vec<ChannelDuration>,
    pub unplanned_partial: Vec<ChannelDuration>,
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        self.planned_full.is_empty()
            && self.unplanned_full.is_empty()
            && self.planned_partial.is_empty()
            && self.unplanned_partial.is_empty()
    }
}

fn into_bucket(map: BTreeMap<String, i64>) -> Vec<ChannelDuration> {
    map.into_iter()
        .map(|(channel, duration)| ChannelDuration { channel, duration })
        .collect()
}

/// Spread each logical incident's full duration onto every channel it touched.
///
/// A group spanning N channels contributes its duration N times: each channel was down for the
/// whole window. These totals therefore do not add up to the deduplicated summary. Groups with
/// an unrecognised modality or impact type land in no bucket.
pub fn categorize(groups: &IncidentGroups) -> ChartData {
    let mut buckets: BTreeMap<DowntimeCategory, BTreeMap<String, i64>> = BTreeMap::new();

    for group in groups {
        let Some(category) = DowntimeCategory::classify(&group.modality, &group.impact_type)
        else {
            continue;
        };
        let bucket = buckets.entry(category).or_default();
        for channel in &group.channels {
            let total = bucket.entry(channel.clone()).or_insert(0);
            *total = total.saturating_add(group.duration_minutes);
        }
    }

    let mut take = |category: DowntimeCategory| {
        into_bucket(buckets.remove(&category).unwrap_or_default())
    };
    ChartData {
        planned_full: take(DowntimeCategory::PlannedFull),
        unplanned_full: take(DowntimeCategory::UnplannedFull),
        planned_partial: take(DowntimeCategory::PlannedPartial),
        unplanned_partial: take(DowntimeCategory::UnplannedPartial),
    }
}
