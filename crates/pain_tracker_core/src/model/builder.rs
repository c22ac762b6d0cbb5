//! Entry construction from admitted candidates.
//!
//! # Responsibility
//! - Overlay sparse candidate blocks onto all-empty defaults, field by field.
//! - Assign `id` and `timestamp` exactly once.
//!
//! # Invariants
//! - Caller-supplied values win; absent fields fall back to defaults.
//! - Issued ids are strictly increasing for one builder.
//! - The builder does not validate; callers run `validate_candidate` first.

use crate::model::candidate::{
    BaselineDataInput, CandidateEntry, ComparisonInput, FunctionalImpactInput, MedicationsInput,
    QualityOfLifeInput, ScoreInput, TreatmentsInput, WorkImpactInput,
};
use crate::model::entry::{
    BaselineData, Comparison, EntryId, FunctionalImpact, Medications, PainEntry, QualityOfLife,
    Treatments, WorkImpact, SCORE_MAX, SCORE_MIN,
};
use crate::model::validation::ScoreField;
use chrono::{DateTime, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for deterministic hosts and tests.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Failure while constructing an entry.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryBuildError {
    /// Score cannot be stored as a 0-10 integer (builder ran on an
    /// inadmissible candidate).
    UnrepresentableScore { field: ScoreField, value: Option<f64> },
    /// Clock returned an instant outside the representable millisecond range.
    ClockOutOfRange,
}

impl Display for EntryBuildError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnrepresentableScore { field, value } => match value {
                Some(value) => write!(f, "{} `{value}` cannot be stored", field.label()),
                None => write!(f, "{} is not a number", field.label()),
            },
            Self::ClockOutOfRange => write!(f, "clock returned an out-of-range instant"),
        }
    }
}

impl Error for EntryBuildError {}

/// Issues time-derived, strictly increasing entry ids.
///
/// An id is `max(now_millis, last_issued + 1)`, so two entries created in
/// the same millisecond still get distinct ids.
#[derive(Debug, Clone, Default)]
pub struct EntryIdGenerator {
    last_issued: Option<EntryId>,
}

impl EntryIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next id for an entry created at `now_millis`.
    pub fn next_id(&mut self, now_millis: i64) -> EntryId {
        let id = match self.last_issued {
            Some(last) if last >= now_millis => last.saturating_add(1),
            _ => now_millis,
        };
        self.last_issued = Some(id);
        id
    }

    /// Records an id issued elsewhere (e.g. loaded from storage).
    pub fn observe(&mut self, id: EntryId) {
        if self.last_issued.map_or(true, |last| id > last) {
            self.last_issued = Some(id);
        }
    }

    pub fn last_issued(&self) -> Option<EntryId> {
        self.last_issued
    }
}

/// Builds complete entries from admitted candidates.
pub struct EntryBuilder {
    clock: Arc<dyn Clock>,
    ids: EntryIdGenerator,
}

impl EntryBuilder {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            ids: EntryIdGenerator::new(),
        }
    }

    /// Marks ids already present in the record as issued.
    pub fn observe_existing<'a>(&mut self, entries: impl IntoIterator<Item = &'a PainEntry>) {
        for entry in entries {
            self.ids.observe(entry.id);
        }
    }

    /// Builds one entry, assigning identity and creation time.
    ///
    /// # Errors
    /// - `UnrepresentableScore` when a supplied score is not a number in
    ///   `0..=10` after rounding.
    /// - `ClockOutOfRange` when the clock cannot be expressed in milliseconds.
    pub fn build(&mut self, candidate: CandidateEntry) -> Result<PainEntry, EntryBuildError> {
        let now = self.clock.now();
        let now_millis = now.timestamp_millis();
        let timestamp =
            DateTime::from_timestamp_millis(now_millis).ok_or(EntryBuildError::ClockOutOfRange)?;

        let CandidateEntry {
            baseline_data,
            functional_impact,
            medications,
            treatments,
            quality_of_life,
            work_impact,
            comparison,
            notes,
        } = candidate;

        let baseline_data = baseline_data
            .unwrap_or_default()
            .overlay(BaselineData::default())?;
        let quality_of_life = quality_of_life
            .unwrap_or_default()
            .overlay(QualityOfLife::default())?;

        Ok(PainEntry {
            id: self.ids.next_id(now_millis),
            timestamp,
            baseline_data,
            functional_impact: functional_impact
                .unwrap_or_default()
                .overlay(FunctionalImpact::default()),
            medications: medications
                .unwrap_or_default()
                .overlay(Medications::default()),
            treatments: treatments.unwrap_or_default().overlay(Treatments::default()),
            quality_of_life,
            work_impact: work_impact.unwrap_or_default().overlay(WorkImpact::default()),
            comparison: comparison.unwrap_or_default().overlay(Comparison::default()),
            notes: notes.unwrap_or_default(),
        })
    }
}

/// Converts an optional score input, keeping `base` when absent.
fn overlay_score(
    field: ScoreField,
    input: Option<ScoreInput>,
    base: u8,
) -> Result<u8, EntryBuildError> {
    let Some(input) = input else {
        return Ok(base);
    };
    let value = input
        .as_finite()
        .ok_or(EntryBuildError::UnrepresentableScore { field, value: None })?;
    let rounded = value.round();
    if rounded < f64::from(SCORE_MIN) || rounded > f64::from(SCORE_MAX) {
        return Err(EntryBuildError::UnrepresentableScore {
            field,
            value: Some(value),
        });
    }
    // In range 0..=10 after the check above.
    Ok(rounded as u8)
}

impl BaselineDataInput {
    pub fn overlay(self, base: BaselineData) -> Result<BaselineData, EntryBuildError> {
        Ok(BaselineData {
            pain: overlay_score(ScoreField::Pain, self.pain, base.pain)?,
            locations: self.locations.unwrap_or(base.locations),
            symptoms: self.symptoms.unwrap_or(base.symptoms),
        })
    }
}

impl QualityOfLifeInput {
    pub fn overlay(self, base: QualityOfLife) -> Result<QualityOfLife, EntryBuildError> {
        Ok(QualityOfLife {
            sleep_quality: overlay_score(
                ScoreField::SleepQuality,
                self.sleep_quality,
                base.sleep_quality,
            )?,
            mood_impact: overlay_score(ScoreField::MoodImpact, self.mood_impact, base.mood_impact)?,
            social_impact: self.social_impact.unwrap_or(base.social_impact),
        })
    }
}

impl FunctionalImpactInput {
    pub fn overlay(self, base: FunctionalImpact) -> FunctionalImpact {
        FunctionalImpact {
            limited_activities: self.limited_activities.unwrap_or(base.limited_activities),
            assistance_needed: self.assistance_needed.unwrap_or(base.assistance_needed),
            mobility_aids: self.mobility_aids.unwrap_or(base.mobility_aids),
        }
    }
}

impl MedicationsInput {
    pub fn overlay(self, base: Medications) -> Medications {
        Medications {
            current: self.current.unwrap_or(base.current),
            changes: self.changes.unwrap_or(base.changes),
            effectiveness: self.effectiveness.unwrap_or(base.effectiveness),
        }
    }
}

impl TreatmentsInput {
    pub fn overlay(self, base: Treatments) -> Treatments {
        Treatments {
            recent: self.recent.unwrap_or(base.recent),
            effectiveness: self.effectiveness.unwrap_or(base.effectiveness),
            planned: self.planned.unwrap_or(base.planned),
        }
    }
}

impl WorkImpactInput {
    pub fn overlay(self, base: WorkImpact) -> WorkImpact {
        WorkImpact {
            missed_work: self.missed_work.unwrap_or(base.missed_work),
            modified_duties: self.modified_duties.unwrap_or(base.modified_duties),
            work_limitations: self.work_limitations.unwrap_or(base.work_limitations),
        }
    }
}

impl ComparisonInput {
    pub fn overlay(self, base: Comparison) -> Comparison {
        Comparison {
            worsening_since: self.worsening_since.unwrap_or(base.worsening_since),
            new_limitations: self.new_limitations.unwrap_or(base.new_limitations),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EntryBuildError, EntryBuilder, EntryIdGenerator, FixedClock};
    use crate::model::candidate::{
        BaselineDataInput, CandidateEntry, ComparisonInput, QualityOfLifeInput, ScoreInput,
        WorkImpactInput,
    };
    use crate::model::entry::{BaselineData, Comparison, QualityOfLife, WorkImpact};
    use crate::model::validation::ScoreField;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use serde_json::json;
    use std::sync::Arc;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap()
    }

    #[test]
    fn id_generator_is_strictly_increasing_within_one_millisecond() {
        let mut ids = EntryIdGenerator::new();
        assert_eq!(ids.next_id(1_000), 1_000);
        assert_eq!(ids.next_id(1_000), 1_001);
        assert_eq!(ids.next_id(999), 1_002);
        assert_eq!(ids.next_id(5_000), 5_000);
    }

    #[test]
    fn id_generator_observes_loaded_ids() {
        let mut ids = EntryIdGenerator::new();
        ids.observe(9_000);
        ids.observe(4_000);
        assert_eq!(ids.last_issued(), Some(9_000));
        assert_eq!(ids.next_id(8_000), 9_001);
    }

    #[test]
    fn baseline_overlay_keeps_defaults_for_absent_fields() {
        let input = BaselineDataInput {
            pain: Some(ScoreInput::from(6)),
            locations: None,
            symptoms: Some(vec!["burning".to_string()]),
        };
        let base = BaselineData {
            pain: 0,
            locations: vec!["default".to_string()],
            symptoms: Vec::new(),
        };
        let merged = input.overlay(base).unwrap();
        assert_eq!(merged.pain, 6);
        assert_eq!(merged.locations, vec!["default".to_string()]);
        assert_eq!(merged.symptoms, vec!["burning".to_string()]);
    }

    #[test]
    fn quality_of_life_overlay_rounds_fractional_scores() {
        let input = QualityOfLifeInput {
            sleep_quality: Some(ScoreInput::from(2.5)),
            mood_impact: Some(ScoreInput::from(7.4)),
            social_impact: None,
        };
        let merged = input.overlay(QualityOfLife::default()).unwrap();
        assert_eq!(merged.sleep_quality, 3);
        assert_eq!(merged.mood_impact, 7);
        assert!(merged.social_impact.is_empty());
    }

    #[test]
    fn work_and_comparison_overlays_are_field_wise() {
        let work = WorkImpactInput {
            missed_work: Some(2),
            ..WorkImpactInput::default()
        }
        .overlay(WorkImpact::default());
        assert_eq!(work.missed_work, 2);
        assert!(work.modified_duties.is_empty());

        let comparison = ComparisonInput {
            worsening_since: Some("last week".to_string()),
            new_limitations: None,
        }
        .overlay(Comparison::default());
        assert_eq!(comparison.worsening_since, "last week");
        assert!(comparison.new_limitations.is_empty());
    }

    #[test]
    fn build_assigns_identity_and_fills_defaults() {
        let mut builder = EntryBuilder::new(Arc::new(FixedClock::new(fixed_now())));

        let entry = builder.build(CandidateEntry::with_pain(4)).unwrap();
        assert_eq!(entry.id, fixed_now().timestamp_millis());
        assert_eq!(entry.timestamp, fixed_now());
        assert_eq!(entry.baseline_data.pain, 4);
        assert!(entry.baseline_data.locations.is_empty());
        assert_eq!(entry.quality_of_life, QualityOfLife::default());
        assert_eq!(entry.notes, "");

        let second = builder.build(CandidateEntry::with_pain(4)).unwrap();
        assert_eq!(second.id, entry.id + 1);
    }

    #[test]
    fn build_truncates_timestamp_to_milliseconds() {
        let with_nanos = fixed_now() + Duration::nanoseconds(1_234_567);
        let mut builder = EntryBuilder::new(Arc::new(FixedClock::new(with_nanos)));
        let entry = builder.build(CandidateEntry::with_pain(1)).unwrap();
        assert_eq!(entry.timestamp, fixed_now() + Duration::milliseconds(1));
    }

    #[test]
    fn build_reports_unrepresentable_scores() {
        let mut builder = EntryBuilder::new(Arc::new(FixedClock::new(fixed_now())));

        let err = builder.build(CandidateEntry::with_pain(42)).unwrap_err();
        assert_eq!(
            err,
            EntryBuildError::UnrepresentableScore {
                field: ScoreField::Pain,
                value: Some(42.0)
            }
        );

        let err = builder
            .build(CandidateEntry::with_pain(ScoreInput::Other(json!(null))))
            .unwrap_err();
        assert_eq!(
            err,
            EntryBuildError::UnrepresentableScore {
                field: ScoreField::Pain,
                value: None
            }
        );
    }
}
