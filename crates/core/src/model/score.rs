use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Passing mark in tenths of a percent (70.0%).
pub const DEFAULT_PASS_THRESHOLD_TENTHS: u32 = 700;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoreError {
    #[error("cannot score an empty question set")]
    EmptyQuestionSet,

    #[error("correct count ({correct}) exceeds total ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },

    #[error("too many questions to score: {len}")]
    TooManyQuestions { len: usize },

    #[error("stored percentage {stored} does not match {correct}/{total}")]
    PercentageMismatch { stored: u32, correct: u32, total: u32 },
}

/// `100 * correct / total` rounded half-up to one decimal, expressed in tenths.
///
/// Integer-only so ties (x.x5) always round away from zero.
#[must_use]
pub fn percentage_tenths(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let correct = u64::from(correct);
    let total = u64::from(total);
    let tenths = (2000 * correct + total) / (2 * total);
    u32::try_from(tenths).unwrap_or(u32::MAX)
}

/// Aggregate pass/fail result of a submitted session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSummary {
    correct_count: u32,
    total_count: u32,
    percentage_tenths: u32,
    passed: bool,
}

impl ScoreSummary {
    /// Derive a summary from raw counts.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::EmptyQuestionSet` when `total` is zero and
    /// `ScoreError::CorrectExceedsTotal` when the counts are inconsistent.
    pub fn from_counts(correct: u32, total: u32, threshold_tenths: u32) -> Result<Self, ScoreError> {
        if total == 0 {
            return Err(ScoreError::EmptyQuestionSet);
        }
        if correct > total {
            return Err(ScoreError::CorrectExceedsTotal { correct, total });
        }
        let tenths = percentage_tenths(correct, total);
        Ok(Self {
            correct_count: correct,
            total_count: total,
            percentage_tenths: tenths,
            passed: tenths >= threshold_tenths,
        })
    }

    /// Rehydrate a summary from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::PercentageMismatch` if the stored percentage does not
    /// follow from the stored counts.
    pub fn from_persisted(
        correct: u32,
        total: u32,
        stored_tenths: u32,
        passed: bool,
    ) -> Result<Self, ScoreError> {
        if total == 0 {
            return Err(ScoreError::EmptyQuestionSet);
        }
        if correct > total {
            return Err(ScoreError::CorrectExceedsTotal { correct, total });
        }
        if percentage_tenths(correct, total) != stored_tenths {
            return Err(ScoreError::PercentageMismatch {
                stored: stored_tenths,
                correct,
                total,
            });
        }
        Ok(Self {
            correct_count: correct,
            total_count: total,
            percentage_tenths: stored_tenths,
            passed,
        })
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    #[must_use]
    pub fn incorrect_count(&self) -> u32 {
        self.total_count - self.correct_count
    }

    #[must_use]
    pub fn percentage_tenths(&self) -> u32 {
        self.percentage_tenths
    }

    #[must_use]
    pub fn percentage(&self) -> f64 {
        f64::from(self.percentage_tenths) / 10.0
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.passed
    }

    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.correct_count == self.total_count
    }
}

impl fmt::Display for ScoreSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} out of {} ({}.{}%) {}",
            self.correct_count,
            self.total_count,
            self.percentage_tenths / 10,
            self.percentage_tenths % 10,
            if self.passed { "PASSED" } else { "NOT PASSED" }
        )
    }
}
