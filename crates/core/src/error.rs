use thiserror::Error;

use crate::model::{BankError, CandidateError, QuestionError, ScoreError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Candidate(#[from] CandidateError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    Score(#[from] ScoreError),
}
