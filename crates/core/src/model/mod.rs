mod answers;
mod bank;
mod candidate;
mod ids;
mod question;
mod score;

pub use ids::{ParseIdError, QuestionNumber, SessionId};

pub use answers::AnswerSet;
pub use bank::{AnswerDistribution, BankError, QuestionBank};
pub use candidate::{CandidateError, CandidateField, CandidateInfo};
pub use question::{AnswerOption, OptionLetter, Question, QuestionError};
pub use score::{DEFAULT_PASS_THRESHOLD_TENTHS, ScoreError, ScoreSummary, percentage_tenths};
