use std::collections::HashSet;
use thiserror::Error;

use crate::model::{OptionLetter, Question, QuestionNumber};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BankError {
    #[error("question bank is empty")]
    Empty,

    #[error("duplicate question number: {0}")]
    DuplicateNumber(QuestionNumber),
}

/// Count of correct answers per letter across a bank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnswerDistribution {
    pub a: usize,
    pub b: usize,
    pub c: usize,
    pub d: usize,
}

impl AnswerDistribution {
    #[must_use]
    pub fn get(&self, letter: OptionLetter) -> usize {
        match letter {
            OptionLetter::A => self.a,
            OptionLetter::B => self.b,
            OptionLetter::C => self.c,
            OptionLetter::D => self.d,
        }
    }

    fn bump(&mut self, letter: OptionLetter) {
        let slot = match letter {
            OptionLetter::A => &mut self.a,
            OptionLetter::B => &mut self.b,
            OptionLetter::C => &mut self.c,
            OptionLetter::D => &mut self.d,
        };
        *slot += 1;
    }
}

/// The ordered, immutable set of questions a session is run against.
///
/// Questions are sorted by their number; a question's position in this
/// sequence is the index answers are keyed by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// # Errors
    ///
    /// Returns `BankError::Empty` for an empty list and `BankError::DuplicateNumber`
    /// when two questions share a number.
    pub fn new(mut questions: Vec<Question>) -> Result<Self, BankError> {
        if questions.is_empty() {
            return Err(BankError::Empty);
        }
        let mut seen = HashSet::with_capacity(questions.len());
        for q in &questions {
            if !seen.insert(q.number()) {
                return Err(BankError::DuplicateNumber(q.number()));
            }
        }
        questions.sort_by_key(Question::number);
        Ok(Self { questions })
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false for a constructed bank; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn answer_distribution(&self) -> AnswerDistribution {
        let mut dist = AnswerDistribution::default();
        for q in &self.questions {
            dist.bump(q.correct_letter());
        }
        dist
    }
}
