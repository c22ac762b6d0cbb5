//! Pain entry domain model.
//!
//! # Responsibility
//! - Define the canonical, fully-populated record stored in the journal.
//! - Provide the all-empty/all-zero defaults used by the entry builder.
//!
//! # Invariants
//! - `id` and `timestamp` are assigned once by the builder and never change.
//! - Score fields (`pain`, `sleep_quality`, `mood_impact`) stay within 0..=10.
//! - Entries are read-only once appended to the record.
//!
//! # See also
//! - `model::builder` for the only construction path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Time-derived integer identity of a pain entry.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type EntryId = i64;

/// Lowest admissible value for every 0-10 score.
pub const SCORE_MIN: u8 = 0;
/// Highest admissible value for every 0-10 score.
pub const SCORE_MAX: u8 = 10;

/// Core pain level plus where and how it is felt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BaselineData {
    /// Pain level on the 0-10 scale.
    pub pain: u8,
    pub locations: Vec<String>,
    pub symptoms: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FunctionalImpact {
    pub limited_activities: Vec<String>,
    pub assistance_needed: Vec<String>,
    pub mobility_aids: Vec<String>,
}

/// One medication currently taken.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Medication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub effectiveness: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Medications {
    pub current: Vec<Medication>,
    pub changes: String,
    pub effectiveness: String,
}

/// One treatment received recently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Treatment {
    /// Serialized as `type` to match external schema naming.
    #[serde(rename = "type")]
    pub kind: String,
    pub provider: String,
    pub date: String,
    pub effectiveness: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Treatments {
    pub recent: Vec<Treatment>,
    pub effectiveness: String,
    pub planned: Vec<String>,
}

/// Sleep, mood and social effects of pain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QualityOfLife {
    /// Sleep quality on the 0-10 scale.
    pub sleep_quality: u8,
    /// Mood impact on the 0-10 scale.
    pub mood_impact: u8,
    pub social_impact: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkImpact {
    /// Number of missed work days.
    pub missed_work: u32,
    pub modified_duties: Vec<String>,
    pub work_limitations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Comparison {
    pub worsening_since: String,
    pub new_limitations: Vec<String>,
}

/// Canonical journal record.
///
/// Sub-records deserialize leniently (missing fields fall back to their
/// defaults) so entries written by older builds still load. `id` and
/// `timestamp` are required on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PainEntry {
    pub id: EntryId,
    /// Creation instant, serialized as RFC 3339.
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub baseline_data: BaselineData,
    #[serde(default)]
    pub functional_impact: FunctionalImpact,
    #[serde(default)]
    pub medications: Medications,
    #[serde(default)]
    pub treatments: Treatments,
    #[serde(default)]
    pub quality_of_life: QualityOfLife,
    #[serde(default)]
    pub work_impact: WorkImpact,
    #[serde(default)]
    pub comparison: Comparison,
    #[serde(default)]
    pub notes: String,
}

impl PainEntry {
    /// Returns the pain level of this entry.
    pub fn pain(&self) -> u8 {
        self.baseline_data.pain
    }

    /// Returns the UTC calendar day this entry was recorded on.
    pub fn recorded_on(&self) -> chrono::NaiveDate {
        self.timestamp.date_naive()
    }
}
