//! JSON-file question bank and explanation table.
//!
//! Question files are an array of
//! `{ "number", "category"?, "question", "options": [4 strings], "correct_answer_letter" }`.
//! Explanation files are an object keyed by question number.

use assess_core::ExplanationTable;
use assess_core::model::{OptionLetter, Question, QuestionBank, QuestionNumber};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::repository::{LoadError, QuestionSource};

#[derive(Debug, Deserialize)]
struct RawQuestion {
    number: Option<u32>,
    category: Option<String>,
    question: String,
    options: Vec<String>,
    correct_answer_letter: String,
}

fn invalid<E: Into<assess_core::Error>>(e: E) -> LoadError {
    LoadError::Invalid(e.into())
}

/// Parse and validate a question bank from JSON text.
///
/// A missing `number` falls back to the 1-based array position.
///
/// # Errors
///
/// Returns `LoadError::Parse` on malformed JSON and `LoadError::Invalid` if any
/// question or the bank as a whole fails validation.
pub fn parse_question_bank(json: &str) -> Result<QuestionBank, LoadError> {
    let raw: Vec<RawQuestion> = serde_json::from_str(json)?;
    let mut questions = Vec::with_capacity(raw.len());
    for (position, item) in raw.into_iter().enumerate() {
        let fallback = u32::try_from(position + 1).unwrap_or(u32::MAX);
        let correct: OptionLetter = item.correct_answer_letter.parse().map_err(invalid)?;
        let question = Question::from_raw_options(
            item.number.unwrap_or(fallback),
            item.category,
            item.question,
            &item.options,
            correct,
        )
        .map_err(invalid)?;
        questions.push(question);
    }
    QuestionBank::new(questions).map_err(invalid)
}

/// Parse an explanation table from a JSON object of `"number": "text"` pairs.
///
/// # Errors
///
/// Returns `LoadError::Parse` on malformed JSON and `LoadError::InvalidKey` for
/// keys that are not question numbers.
pub fn parse_explanations(json: &str) -> Result<ExplanationTable, LoadError> {
    let raw: BTreeMap<String, String> = serde_json::from_str(json)?;
    raw.into_iter()
        .map(|(key, text)| {
            match key.parse::<QuestionNumber>() {
                Ok(number) => Ok((number, text)),
                Err(_) => Err(LoadError::InvalidKey(key)),
            }
        })
        .collect()
}

async fn read(path: &Path) -> Result<String, LoadError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Read an explanation table from disk.
///
/// # Errors
///
/// Returns `LoadError` if the file cannot be read or parsed.
pub async fn load_explanations(path: impl AsRef<Path>) -> Result<ExplanationTable, LoadError> {
    parse_explanations(&read(path.as_ref()).await?)
}

/// Question source backed by a JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonQuestionFile {
    path: PathBuf,
}

impl JsonQuestionFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl QuestionSource for JsonQuestionFile {
    async fn load_bank(&self) -> Result<QuestionBank, LoadError> {
        parse_question_bank(&read(&self.path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assess_core::ExplanationLookup;
    use assess_core::model::BankError;

    const TWO_QUESTIONS: &str = r#"[
        {
            "number": 2,
            "category": "SAFETY",
            "question": "When checking voltage, assume the circuit is?",
            "options": ["A- Dead", "B- Live", "C- Grounded", "D- Open"],
            "correct_answer_letter": "B"
        },
        {
            "number": 1,
            "question": "Which current is bi-directional?",
            "options": ["A-AC", "B-DC", "C-Both", "D-Neither"],
            "correct_answer_letter": "a"
        }
    ]"#;

    #[test]
    fn parses_and_orders_questions() {
        let bank = parse_question_bank(TWO_QUESTIONS).unwrap();
        assert_eq!(bank.len(), 2);
        let first = bank.get(0).unwrap();
        assert_eq!(first.number(), QuestionNumber::new(1));
        assert_eq!(first.correct_letter(), OptionLetter::A);
        assert_eq!(first.option(OptionLetter::A).text, "AC");
        assert_eq!(bank.get(1).unwrap().category(), Some("SAFETY"));
    }

    #[test]
    fn missing_number_uses_position() {
        let json = r#"[{"question": "Q", "options": ["A- 1", "B- 2", "C- 3", "D- 4"], "correct_answer_letter": "D"}]"#;
        let bank = parse_question_bank(json).unwrap();
        assert_eq!(bank.get(0).unwrap().number(), QuestionNumber::new(1));
    }

    #[test]
    fn empty_array_is_invalid_not_empty_bank() {
        let err = parse_question_bank("[]").unwrap_err();
        assert!(matches!(
            err,
            LoadError::Invalid(assess_core::Error::Bank(BankError::Empty))
        ));
    }

    #[test]
    fn bad_letter_is_invalid() {
        let json = r#"[{"number": 1, "question": "Q", "options": ["A- 1", "B- 2", "C- 3", "D- 4"], "correct_answer_letter": "E"}]"#;
        assert!(matches!(
            parse_question_bank(json),
            Err(LoadError::Invalid(assess_core::Error::Question(_)))
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            parse_question_bank("{not json"),
            Err(LoadError::Parse(_))
        ));
    }

    #[test]
    fn explanations_parse_numeric_keys() {
        let table = parse_explanations(r#"{"1": "AC reverses direction.", "14": "One revolution."}"#)
            .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.explanation(QuestionNumber::new(14)),
            "One revolution."
        );
        assert!(matches!(
            parse_explanations(r#"{"x": "bad"}"#),
            Err(LoadError::InvalidKey(key)) if key == "x"
        ));
    }

    #[test]
    fn bundled_data_explains_every_question() {
        let table = parse_explanations(include_str!("../../../data/explanations.json")).unwrap();
        assert_eq!(table.len(), 100);
        assert!((1..=100).all(|n| table.contains(QuestionNumber::new(n))));

        let bank = parse_question_bank(include_str!("../../../data/questions.json")).unwrap();
        assert!(bank.questions().iter().all(|q| table.contains(q.number())));
        assert!(table.explanation(QuestionNumber::new(8)).contains("phase rotation meter"));
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let source = JsonQuestionFile::new("/definitely/not/here.json");
        assert!(matches!(
            source.load_bank().await,
            Err(LoadError::Io { .. })
        ));
    }
}
