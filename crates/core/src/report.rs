//! Per-question discrepancy report for a scored session.

use serde::{Deserialize, Serialize};

use crate::explanations::ExplanationLookup;
use crate::model::{AnswerSet, Question, QuestionNumber};

/// Label used when a question was left unanswered.
pub const NO_ANSWER_LABEL: &str = "No answer";

/// One missed or unanswered question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub question_number: QuestionNumber,
    pub question_text: String,
    pub user_answer_label: String,
    pub correct_answer_label: String,
    pub explanation_text: String,
}

impl ReportEntry {
    #[must_use]
    pub fn is_unanswered(&self) -> bool {
        self.user_answer_label == NO_ANSWER_LABEL
    }
}

/// Build entries for every question whose recorded answer is absent or wrong,
/// in ascending index order. Empty when every answer is correct.
#[must_use]
pub fn build_report(
    questions: &[Question],
    answers: &AnswerSet,
    explanations: &dyn ExplanationLookup,
) -> Vec<ReportEntry> {
    questions
        .iter()
        .enumerate()
        .filter_map(|(index, question)| {
            let given = answers.get(index);
            if question.is_correct(given) {
                return None;
            }
            let user_answer_label = given.map_or_else(
                || NO_ANSWER_LABEL.to_owned(),
                |letter| question.option(letter).label(),
            );
            Some(ReportEntry {
                question_number: question.number(),
                question_text: question.text().to_owned(),
                user_answer_label,
                correct_answer_label: question.correct_option().label(),
                explanation_text: explanations.explanation(question.number()).to_owned(),
            })
        })
        .collect()
}
