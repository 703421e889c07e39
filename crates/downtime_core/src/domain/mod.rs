use std::fmt;

use serde::{Deserialize, Serialize};

/// One raw downtime row as it appeared in the pasted sheet.
///
/// Notes:
/// - `impact_type` and `modality` are trimmed and uppercased at parse time. Values outside the
///   known sets are kept verbatim in the `Other` variants and surface as parse warnings.
/// - `start_time`, `end_time` and `duration` stay as source text; minutes are derived on demand
///   through [`crate::normalize::duration::parse_duration_minutes`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub date: String,
    pub issue: String,
    pub channel: String,
    pub service: String,
    pub impact_type: ImpactType,
    pub modality: Modality,
    pub start_time: String,
    pub end_time: String,
    pub duration: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ImpactType {
    Full,
    Partial,
    Other(String),
}

impl ImpactType {
    pub fn as_str(&self) -> &str {
        match self {
            ImpactType::Full => "FULL",
            ImpactType::Partial => "PARTIAL",
            ImpactType::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ImpactType::Other(_))
    }
}

impl From<&str> for ImpactType {
    fn from(raw: &str) -> Self {
        let norm = raw.trim().to_uppercase();
        match norm.as_str() {
            "FULL" => ImpactType::Full,
            "PARTIAL" => ImpactType::Partial,
            _ => ImpactType::Other(norm),
        }
    }
}

impl From<String> for ImpactType {
    fn from(raw: String) -> Self {
        ImpactType::from(raw.as_str())
    }
}

impl From<ImpactType> for String {
    fn from(v: ImpactType) -> Self {
        v.as_str().to_string()
    }
}

impl fmt::Display for ImpactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Modality {
    Planned,
    Unplanned,
    Other(String),
}

impl Modality {
    pub fn as_str(&self) -> &str {
        match self {
            Modality::Planned => "PLANNED",
            Modality::Unplanned => "UNPLANNED",
            Modality::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Modality::Other(_))
    }
}

impl From<&str> for Modality {
    fn from(raw: &str) -> Self {
        let norm = raw.trim().to_uppercase();
        match norm.as_str() {
            "PLANNED" => Modality::Planned,
            "UNPLANNED" => Modality::Unplanned,
            _ => Modality::Other(norm),
        }
    }
}

impl From<String> for Modality {
    fn from(raw: String) -> Self {
        Modality::from(raw.as_str())
    }
}

impl From<Modality> for String {
    fn from(v: Modality) -> Self {
        v.as_str().to_string()
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four modality x impact buckets used by chart data and summary sub-totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DowntimeCategory {
    PlannedFull,
    UnplannedFull,
    PlannedPartial,
    UnplannedPartial,
}

impl DowntimeCategory {
    /// Exact classification; rows with an unrecognised modality or impact type have no bucket.
    pub fn classify(modality: &Modality, impact_type: &ImpactType) -> Option<Self> {
        match (modality, impact_type) {
            (Modality::Planned, ImpactType::Full) => Some(DowntimeCategory::PlannedFull),
            (Modality::Unplanned, ImpactType::Full) => Some(DowntimeCategory::UnplannedFull),
            (Modality::Planned, ImpactType::Partial) => Some(DowntimeCategory::PlannedPartial),
            (Modality::Unplanned, ImpactType::Partial) => Some(DowntimeCategory::UnplannedPartial),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationWarning {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl ValidationWarning {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}
