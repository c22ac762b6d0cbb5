//! Candidate admissibility rules.
//!
//! # Responsibility
//! - Decide whether a candidate may become a `PainEntry`.
//!
//! # Invariants
//! - Pure and deterministic: no side effects, same input gives same answer.
//! - Only `pain`, `sleepQuality` and `moodImpact` can make a candidate
//!   inadmissible; omitted optional blocks never do.
//! - Bounds are inclusive on both ends (0 and 10 are valid).

use crate::model::candidate::{CandidateEntry, ScoreInput};
use crate::model::entry::{SCORE_MAX, SCORE_MIN};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Score field named in validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreField {
    Pain,
    SleepQuality,
    MoodImpact,
}

impl ScoreField {
    pub fn label(self) -> &'static str {
        match self {
            Self::Pain => "pain level",
            Self::SleepQuality => "sleep quality",
            Self::MoodImpact => "mood impact",
        }
    }
}

/// Reason a candidate was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryValidationError {
    /// `baselineData` block is absent.
    MissingBaselineData,
    /// Score is absent, non-numeric or not finite.
    NotANumber { field: ScoreField },
    /// Score is numeric but outside 0..=10.
    OutOfRange { field: ScoreField, value: f64 },
}

impl Display for EntryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingBaselineData => write!(f, "baseline data is required"),
            Self::NotANumber { field } => write!(f, "{} must be a number", field.label()),
            Self::OutOfRange { field, value } => write!(
                f,
                "{} must be between {SCORE_MIN} and {SCORE_MAX}, got {value}",
                field.label()
            ),
        }
    }
}

impl Error for EntryValidationError {}

/// Validates a candidate, returning the first violated rule.
///
/// # Rules
/// 1. `baseline_data` must be present.
/// 2. `baseline_data.pain` must be a finite number in `0..=10`.
/// 3. When `quality_of_life` is present, `sleep_quality` and `mood_impact`
///    must both be finite numbers in `0..=10`.
pub fn validate_candidate(candidate: &CandidateEntry) -> Result<(), EntryValidationError> {
    let baseline = candidate
        .baseline_data
        .as_ref()
        .ok_or(EntryValidationError::MissingBaselineData)?;
    check_score(ScoreField::Pain, baseline.pain.as_ref())?;

    if let Some(qol) = candidate.quality_of_life.as_ref() {
        check_score(ScoreField::SleepQuality, qol.sleep_quality.as_ref())?;
        check_score(ScoreField::MoodImpact, qol.mood_impact.as_ref())?;
    }

    Ok(())
}

/// Boolean form of [`validate_candidate`].
pub fn is_admissible(candidate: &CandidateEntry) -> bool {
    validate_candidate(candidate).is_ok()
}

fn check_score(field: ScoreField, score: Option<&ScoreInput>) -> Result<(), EntryValidationError> {
    let value = score
        .and_then(ScoreInput::as_finite)
        .ok_or(EntryValidationError::NotANumber { field })?;

    if value < f64::from(SCORE_MIN) || value > f64::from(SCORE_MAX) {
        return Err(EntryValidationError::OutOfRange { field, value });
    }

    Ok(())
}
