#![forbid(unsafe_code)]

pub mod json;
pub mod repository;
pub mod sqlite;

pub use json::{JsonQuestionFile, load_explanations, parse_explanations, parse_question_bank};
pub use repository::{
    InMemoryRepository, LoadError, QuestionSource, ResultRepository, Storage, StorageError,
    TestResultRecord, TestResultRow,
};
