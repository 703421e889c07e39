use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::domain::{ImpactType, Incident, Modality, ValidationWarning};
use crate::normalize::duration::parse_duration_minutes;

/// Identity of one real-world outage window: rows sharing all four fields describe the same
/// event reported once per affected channel.
///
/// Kept as a struct rather than a joined string so no separator can collide with field text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub issue: String,
}

impl GroupKey {
    pub fn of(incident: &Incident) -> Self {
        Self {
            date: incident.date.clone(),
            start_time: incident.start_time.clone(),
            end_time: incident.end_time.clone(),
            issue: incident.issue.clone(),
        }
    }

    /// Stable hex SHA-256 of the key fields, length-prefixed so field boundaries are unambiguous.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for part in [&self.date, &self.start_time, &self.end_time, &self.issue] {
            hasher.update((part.len() as u64).to_be_bytes());
            hasher.update(part.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

/// A logical incident: duration, modality and impact come from the first row seen for the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidentGroup {
    pub key: GroupKey,
    pub duration_minutes: i64,
    pub modality: Modality,
    pub impact_type: ImpactType,
    pub channels: BTreeSet<String>,
}

/// Groups in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncidentGroups {
    groups: Vec<IncidentGroup>,
}

impl IncidentGroups {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IncidentGroup> {
        self.groups.iter()
    }
}

impl<'a> IntoIterator for &'a IncidentGroups {
    type Item = &'a IncidentGroup;
    type IntoIter = std::slice::Iter<'a, IncidentGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

/// Read-only listing of a logical incident for presentation collaborators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupOverview {
    pub fingerprint: String,
    pub date: String,
    pub issue: String,
    pub start_time: String,
    pub end_time: String,
    pub duration_minutes: i64,
    pub modality: Modality,
    pub impact_type: ImpactType,
    pub channels: Vec<String>,
}

impl From<&IncidentGroup> for GroupOverview {
    fn from(g: &IncidentGroup) -> Self {
        Self {
            fingerprint: g.key.fingerprint(),
            date: g.key.date.clone(),
            issue: g.key.issue.clone(),
            start_time: g.key.start_time.clone(),
            end_time: g.key.end_time.clone(),
            duration_minutes: g.duration_minutes,
            modality: g.modality.clone(),
            impact_type: g.impact_type.clone(),
            channels: g.channels.iter().cloned().collect(),
        }
    }
}

/// Collapse rows sharing `(date, start_time, end_time, issue)` into logical incidents.
///
/// First-seen wins for duration, modality and impact type. Later rows only add their channel;
/// if they disagree on those attributes a `GROUP_INCONSISTENT_ATTRIBUTES` warning is returned
/// and the first row's values are kept.
pub fn group_incidents(incidents: &[Incident]) -> (IncidentGroups, Vec<ValidationWarning>) {
    let mut groups: Vec<IncidentGroup> = Vec::new();
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut warnings = Vec::new();

    for inc in incidents {
        let key = GroupKey::of(inc);
        match index.get(&key).copied() {
            Some(pos) => {
                let group = &mut groups[pos];
                let duration = parse_duration_minutes(&inc.duration);
                if duration != group.duration_minutes
                    || inc.modality != group.modality
                    || inc.impact_type != group.impact_type
                {
                    warn!(
                        issue = %key.issue,
                        date = %key.date,
                        channel = %inc.channel,
                        "grouped rows disagree; keeping first-seen attributes"
                    );
                    warnings.push(
                        ValidationWarning::new(
                            "GROUP_INCONSISTENT_ATTRIBUTES",
                            "Rows for the same outage window disagree on duration, modality \
                             or impact type; first row wins",
                        )
                        .with_details(format!(
                            "fingerprint={}; channel={}; kept={}/{}/{}m; seen={}/{}/{}m",
                            key.fingerprint(),
                            inc.channel,
                            group.modality,
                            group.impact_type,
                            group.duration_minutes,
                            inc.modality,
                            inc.impact_type,
                            duration
                        )),
                    );
                }
                group.channels.insert(inc.channel.clone());
            }
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(IncidentGroup {
                    key,
                    duration_minutes: parse_duration_minutes(&inc.duration),
                    modality: inc.modality.clone(),
                    impact_type: inc.impact_type.clone(),
                    channels: BTreeSet::from([inc.channel.clone()]),
                });
            }
        }
    }

    (IncidentGroups { groups }, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(channel: &str, issue: &str, start: &str, modality: &str, duration: &str) -> Incident {
        Incident {
            date: "3-Aug-25".to_string(),
            issue: issue.to_string(),
            channel: channel.to_string(),
            service: "All Service".to_string(),
            impact_type: ImpactType::Full,
            modality: Modality::from(modality),
            start_time: start.to_string(),
            end_time: "4:00 AM".to_string(),
            duration: duration.to_string(),
            reason: "Maintenance".to_string(),
        }
    }

    #[test]
    fn rows_sharing_a_window_collapse_into_one_group() {
        let rows = vec![
            row("APP", "DFS Down", "12:10 AM", "PLANNED", "3:50:00"),
            row("ADD MONEY", "DFS Down", "12:10 AM", "PLANNED", "3:50:00"),
            row("APP", "DFS Down", "12:10 AM", "PLANNED", "3:50:00"),
            row("APP", "Other issue", "12:10 AM", "PLANNED", "1:00:00"),
        ];
        let (groups, warnings) = group_incidents(&rows);
        assert!(warnings.is_empty());
        assert_eq!(groups.len(), 2);

        let first = groups.iter().next().unwrap();
        assert_eq!(first.key.issue, "DFS Down");
        assert_eq!(first.duration_minutes, 230);
        assert_eq!(
            first.channels.iter().cloned().collect::<Vec<_>>(),
            vec!["ADD MONEY".to_string(), "APP".to_string()]
        );
    }

    #[test]
    fn first_seen_attributes_win_and_disagreement_is_flagged() {
        let rows = vec![
            row("APP", "DFS Down", "1:00 AM", "PLANNED", "1:00:00"),
            row("WEB", "DFS Down", "1:00 AM", "UNPLANNED", "2:00:00"),
        ];
        let (groups, warnings) = group_incidents(&rows);
        assert_eq!(groups.len(), 1);
        let g = groups.iter().next().unwrap();
        assert_eq!(g.modality, Modality::Planned);
        assert_eq!(g.duration_minutes, 60);
        assert_eq!(g.channels.len(), 2);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, "GROUP_INCONSISTENT_ATTRIBUTES");
    }

    #[test]
    fn fingerprint_is_stable_and_boundary_safe() {
        let a = GroupKey {
            date: "a".into(),
            start_time: "bc".into(),
            end_time: "d".into(),
            issue: "e".into(),
        };
        let b = GroupKey {
            date: "ab".into(),
            start_time: "c".into(),
            end_time: "d".into(),
            issue: "e".into(),
        };
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }
}
