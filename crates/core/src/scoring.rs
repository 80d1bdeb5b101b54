//! Pure scoring of a recorded answer set against a question sequence.

use crate::model::{
    AnswerSet, DEFAULT_PASS_THRESHOLD_TENTHS, Question, ScoreError, ScoreSummary,
};

/// Score `answers` against `questions` with the default 70.0% pass mark.
///
/// An index with no entry in `answers` counts as incorrect.
///
/// # Errors
///
/// Returns `ScoreError::EmptyQuestionSet` if `questions` is empty.
pub fn score(questions: &[Question], answers: &AnswerSet) -> Result<ScoreSummary, ScoreError> {
    score_with_threshold(questions, answers, DEFAULT_PASS_THRESHOLD_TENTHS)
}

/// Like [`score`], with the pass mark given in tenths of a percent.
///
/// # Errors
///
/// Returns `ScoreError::EmptyQuestionSet` if `questions` is empty, or
/// `ScoreError::TooManyQuestions` if the count does not fit in `u32`.
pub fn score_with_threshold(
    questions: &[Question],
    answers: &AnswerSet,
    threshold_tenths: u32,
) -> Result<ScoreSummary, ScoreError> {
    if questions.is_empty() {
        return Err(ScoreError::EmptyQuestionSet);
    }
    let total = u32::try_from(questions.len()).map_err(|_| ScoreError::TooManyQuestions {
        len: questions.len(),
    })?;

    let mut correct = 0_u32;
    for (index, question) in questions.iter().enumerate() {
        if question.is_correct(answers.get(index)) {
            correct = correct.saturating_add(1);
        }
    }

    ScoreSummary::from_counts(correct, total, threshold_tenths)
}
