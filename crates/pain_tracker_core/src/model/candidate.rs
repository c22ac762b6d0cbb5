//! Candidate (unvalidated) entry shapes.
//!
//! # Responsibility
//! - Describe the sparse input a host submits for admission.
//! - Keep non-numeric score input representable so the validator, not the
//!   JSON decoder, decides admissibility.
//!
//! # Invariants
//! - Every field is optional; omission never fails decoding.
//! - A non-score field of the wrong JSON type decodes as absent; only
//!   malformed JSON text fails `from_json`.
//! - Candidates carry no `id`/`timestamp`; unknown wire fields are ignored.

use crate::model::entry::{
    BaselineData, Comparison, FunctionalImpact, Medication, Medications, PainEntry, QualityOfLife,
    Treatment, Treatments, WorkImpact,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Raw score as submitted by a host.
///
/// JSON numbers decode to `Number`; anything else (strings, booleans,
/// objects) is kept verbatim in `Other` and rejected by the validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreInput {
    Number(f64),
    Other(Value),
}

impl ScoreInput {
    /// Returns the numeric value when it is a finite number.
    pub fn as_finite(&self) -> Option<f64> {
        match self {
            Self::Number(value) if value.is_finite() => Some(*value),
            _ => None,
        }
    }
}

impl From<u8> for ScoreInput {
    fn from(value: u8) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i32> for ScoreInput {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<f64> for ScoreInput {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Decodes an optional field, treating a value of the wrong shape as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BaselineDataInput {
    pub pain: Option<ScoreInput>,
    #[serde(deserialize_with = "lenient")]
    pub locations: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient")]
    pub symptoms: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FunctionalImpactInput {
    #[serde(deserialize_with = "lenient")]
    pub limited_activities: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient")]
    pub assistance_needed: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient")]
    pub mobility_aids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MedicationsInput {
    #[serde(deserialize_with = "lenient")]
    pub current: Option<Vec<Medication>>,
    #[serde(deserialize_with = "lenient")]
    pub changes: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub effectiveness: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TreatmentsInput {
    #[serde(deserialize_with = "lenient")]
    pub recent: Option<Vec<Treatment>>,
    #[serde(deserialize_with = "lenient")]
    pub effectiveness: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub planned: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QualityOfLifeInput {
    pub sleep_quality: Option<ScoreInput>,
    pub mood_impact: Option<ScoreInput>,
    #[serde(deserialize_with = "lenient")]
    pub social_impact: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkImpactInput {
    #[serde(deserialize_with = "lenient")]
    pub missed_work: Option<u32>,
    #[serde(deserialize_with = "lenient")]
    pub modified_duties: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient")]
    pub work_limitations: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComparisonInput {
    #[serde(deserialize_with = "lenient")]
    pub worsening_since: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub new_limitations: Option<Vec<String>>,
}

/// Partial entry submitted for admission.
///
/// Only `baseline_data` is required for the validator to accept it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CandidateEntry {
    #[serde(deserialize_with = "lenient")]
    pub baseline_data: Option<BaselineDataInput>,
    #[serde(deserialize_with = "lenient")]
    pub functional_impact: Option<FunctionalImpactInput>,
    #[serde(deserialize_with = "lenient")]
    pub medications: Option<MedicationsInput>,
    #[serde(deserialize_with = "lenient")]
    pub treatments: Option<TreatmentsInput>,
    #[serde(deserialize_with = "lenient")]
    pub quality_of_life: Option<QualityOfLifeInput>,
    #[serde(deserialize_with = "lenient")]
    pub work_impact: Option<WorkImpactInput>,
    #[serde(deserialize_with = "lenient")]
    pub comparison: Option<ComparisonInput>,
    #[serde(deserialize_with = "lenient")]
    pub notes: Option<String>,
}

impl CandidateEntry {
    /// Creates a candidate carrying only a pain level.
    pub fn with_pain(pain: impl Into<ScoreInput>) -> Self {
        Self {
            baseline_data: Some(BaselineDataInput {
                pain: Some(pain.into()),
                ..BaselineDataInput::default()
            }),
            ..Self::default()
        }
    }

    /// Decodes a candidate from host-provided JSON.
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    /// Sets pain locations, creating the baseline block when absent.
    pub fn locations<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let baseline = self.baseline_data.get_or_insert_with(Default::default);
        baseline.locations = Some(locations.into_iter().map(Into::into).collect());
        self
    }

    /// Sets symptoms, creating the baseline block when absent.
    pub fn symptoms<I, S>(mut self, symptoms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let baseline = self.baseline_data.get_or_insert_with(Default::default);
        baseline.symptoms = Some(symptoms.into_iter().map(Into::into).collect());
        self
    }

    /// Sets both quality-of-life scores.
    pub fn quality_of_life(
        mut self,
        sleep_quality: impl Into<ScoreInput>,
        mood_impact: impl Into<ScoreInput>,
    ) -> Self {
        let qol = self.quality_of_life.get_or_insert_with(Default::default);
        qol.sleep_quality = Some(sleep_quality.into());
        qol.mood_impact = Some(mood_impact.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Fully-specified candidate mirroring an existing entry.
///
/// Building from it reproduces every field; only `id` and `timestamp` are
/// reassigned. Used for "log the same as last time" flows.
impl From<&PainEntry> for CandidateEntry {
    fn from(entry: &PainEntry) -> Self {
        let BaselineData {
            pain,
            locations,
            symptoms,
        } = entry.baseline_data.clone();
        let FunctionalImpact {
            limited_activities,
            assistance_needed,
            mobility_aids,
        } = entry.functional_impact.clone();
        let Medications {
            current,
            changes,
            effectiveness: medication_effectiveness,
        } = entry.medications.clone();
        let Treatments {
            recent,
            effectiveness: treatment_effectiveness,
            planned,
        } = entry.treatments.clone();
        let QualityOfLife {
            sleep_quality,
            mood_impact,
            social_impact,
        } = entry.quality_of_life.clone();
        let WorkImpact {
            missed_work,
            modified_duties,
            work_limitations,
        } = entry.work_impact.clone();
        let Comparison {
            worsening_since,
            new_limitations,
        } = entry.comparison.clone();

        Self {
            baseline_data: Some(BaselineDataInput {
                pain: Some(pain.into()),
                locations: Some(locations),
                symptoms: Some(symptoms),
            }),
            functional_impact: Some(FunctionalImpactInput {
                limited_activities: Some(limited_activities),
                assistance_needed: Some(assistance_needed),
                mobility_aids: Some(mobility_aids),
            }),
            medications: Some(MedicationsInput {
                current: Some(current),
                changes: Some(changes),
                effectiveness: Some(medication_effectiveness),
            }),
            treatments: Some(TreatmentsInput {
                recent: Some(recent),
                effectiveness: Some(treatment_effectiveness),
                planned: Some(planned),
            }),
            quality_of_life: Some(QualityOfLifeInput {
                sleep_quality: Some(sleep_quality.into()),
                mood_impact: Some(mood_impact.into()),
                social_impact: Some(social_impact),
            }),
            work_impact: Some(WorkImpactInput {
                missed_work: Some(missed_work),
                modified_duties: Some(modified_duties),
                work_limitations: Some(work_limitations),
            }),
            comparison: Some(ComparisonInput {
                worsening_since: Some(worsening_since),
                new_limitations: Some(new_limitations),
            }),
            notes: Some(entry.notes.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CandidateEntry, ScoreInput};
    use crate::model::validation::{validate_candidate, EntryValidationError};
    use serde_json::json;

    #[test]
    fn numeric_scores_decode_as_numbers() {
        let candidate: CandidateEntry =
            serde_json::from_value(json!({ "baselineData": { "pain": 7 } })).unwrap();
        let pain = candidate.baseline_data.unwrap().pain.unwrap();
        assert_eq!(pain, ScoreInput::Number(7.0));
        assert_eq!(pain.as_finite(), Some(7.0));
    }

    #[test]
    fn non_numeric_scores_are_kept_for_the_validator() {
        let candidate: CandidateEntry =
            serde_json::from_value(json!({ "baselineData": { "pain": "seven" } })).unwrap();
        let pain = candidate.baseline_data.unwrap().pain.unwrap();
        assert_eq!(pain, ScoreInput::Other(json!("seven")));
        assert_eq!(pain.as_finite(), None);
    }

    #[test]
    fn caller_supplied_identity_is_ignored() {
        let candidate: CandidateEntry = serde_json::from_value(json!({
            "id": 42,
            "timestamp": "2020-01-01T00:00:00Z",
            "baselineData": { "pain": 1 }
        }))
        .unwrap();
        assert_eq!(candidate, CandidateEntry::with_pain(1));
    }

    #[test]
    fn wrong_typed_detail_fields_decode_as_absent() {
        let candidate = CandidateEntry::from_json(
            r#"{
                "baselineData": { "pain": 4, "locations": "back", "symptoms": ["ache"] },
                "workImpact": { "missedWork": 1.5, "modifiedDuties": ["desk only"] },
                "notes": 12
            }"#,
        )
        .unwrap();

        let baseline = candidate.baseline_data.unwrap();
        assert_eq!(baseline.pain, Some(ScoreInput::Number(4.0)));
        assert_eq!(baseline.locations, None);
        assert_eq!(baseline.symptoms, Some(vec!["ache".to_string()]));

        let work = candidate.work_impact.unwrap();
        assert_eq!(work.missed_work, None);
        assert_eq!(work.modified_duties, Some(vec!["desk only".to_string()]));
        assert_eq!(candidate.notes, None);
    }

    #[test]
    fn wrong_typed_baseline_block_leaves_it_missing() {
        let candidate =
            CandidateEntry::from_json(r#"{ "baselineData": [5], "notes": "kept" }"#).unwrap();
        assert_eq!(candidate.baseline_data, None);
        assert_eq!(candidate.notes.as_deref(), Some("kept"));
        assert_eq!(
            validate_candidate(&candidate),
            Err(EntryValidationError::MissingBaselineData)
        );
    }

    #[test]
    fn malformed_json_text_still_fails() {
        assert!(CandidateEntry::from_json(r#"{ "baselineData": "#).is_err());
    }

    #[test]
    fn nan_is_not_finite() {
        assert_eq!(ScoreInput::from(f64::NAN).as_finite(), None);
    }
}
