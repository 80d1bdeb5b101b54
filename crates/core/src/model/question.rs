use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::QuestionNumber;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question number must be positive")]
    ZeroNumber,

    #[error("question {number}: text cannot be empty")]
    EmptyText { number: u32 },

    #[error("question {number}: expected 4 options, got {count}")]
    OptionCount { number: u32, count: usize },

    #[error("question {number}: options must be labeled A, B, C, D in order")]
    OptionOrder { number: u32 },

    #[error("invalid option letter: {raw:?}")]
    InvalidLetter { raw: String },

    #[error("option is missing a letter prefix: {raw:?}")]
    MissingPrefix { raw: String },
}

/// One of the four answer labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionLetter {
    A,
    B,
    C,
    D,
}

impl OptionLetter {
    pub const ALL: [OptionLetter; 4] = [Self::A, Self::B, Self::C, Self::D];

    /// Zero-based slot of this letter within a question's options.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
            Self::D => 3,
        }
    }

    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            'C' => Some(Self::C),
            'D' => Some(Self::D),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
        }
    }
}

impl fmt::Display for OptionLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for OptionLetter {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c),
            _ => None,
        }
        .ok_or_else(|| QuestionError::InvalidLetter { raw: s.to_owned() })
    }
}

/// A labeled choice, e.g. `B` / `Volts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub letter: OptionLetter,
    pub text: String,
}

impl AnswerOption {
    #[must_use]
    pub fn new(letter: OptionLetter, text: impl Into<String>) -> Self {
        Self {
            letter,
            text: text.into(),
        }
    }

    /// Parse a raw option such as `"A- Volts"`, `"A-Volts"`, `"A) Volts"` or `"A. Volts"`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::MissingPrefix` if the string does not start with a
    /// letter followed by a separator, or `InvalidLetter` if the letter is not A-D.
    pub fn parse(raw: &str) -> Result<Self, QuestionError> {
        let trimmed = raw.trim_start();
        let mut chars = trimmed.char_indices();
        let Some((_, first)) = chars.next() else {
            return Err(QuestionError::MissingPrefix { raw: raw.to_owned() });
        };
        let Some((sep_at, sep)) = chars.next() else {
            return Err(QuestionError::MissingPrefix { raw: raw.to_owned() });
        };
        if !matches!(sep, '-' | ')' | '.' | ':') {
            return Err(QuestionError::MissingPrefix { raw: raw.to_owned() });
        }
        let letter = OptionLetter::from_char(first).ok_or_else(|| QuestionError::InvalidLetter {
            raw: first.to_string(),
        })?;
        let text = trimmed[sep_at + sep.len_utf8()..].trim();
        Ok(Self::new(letter, text))
    }

    /// Human-readable label, `"B - Volts"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} - {}", self.letter, self.text)
    }
}

/// An immutable multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    number: QuestionNumber,
    category: Option<String>,
    text: String,
    options: [AnswerOption; 4],
    correct: OptionLetter,
}

impl Question {
    /// Build a question from already-split options.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the number is zero, the text is blank, or the
    /// options are not exactly A, B, C, D in order.
    pub fn new(
        number: u32,
        category: Option<String>,
        text: impl Into<String>,
        options: Vec<AnswerOption>,
        correct: OptionLetter,
    ) -> Result<Self, QuestionError> {
        if number == 0 {
            return Err(QuestionError::ZeroNumber);
        }
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText { number });
        }
        let count = options.len();
        let options: [AnswerOption; 4] = options
            .try_into()
            .map_err(|_| QuestionError::OptionCount { number, count })?;
        let in_order = options
            .iter()
            .zip(OptionLetter::ALL)
            .all(|(opt, expected)| opt.letter == expected);
        if !in_order {
            return Err(QuestionError::OptionOrder { number });
        }

        let category = category
            .map(|c| c.trim().to_owned())
            .filter(|c| !c.is_empty());

        Ok(Self {
            number: QuestionNumber::new(number),
            category,
            text: text.trim().to_owned(),
            options,
            correct,
        })
    }

    /// Build a question from raw `"A- text"` style option strings.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if any option fails to parse or the question is invalid.
    pub fn from_raw_options<S: AsRef<str>>(
        number: u32,
        category: Option<String>,
        text: impl Into<String>,
        raw_options: &[S],
        correct: OptionLetter,
    ) -> Result<Self, QuestionError> {
        let options = raw_options
            .iter()
            .map(|raw| AnswerOption::parse(raw.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(number, category, text, options, correct)
    }

    #[must_use]
    pub fn number(&self) -> QuestionNumber {
        self.number
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[AnswerOption; 4] {
        &self.options
    }

    #[must_use]
    pub fn option(&self, letter: OptionLetter) -> &AnswerOption {
        &self.options[letter.index()]
    }

    #[must_use]
    pub fn correct_letter(&self) -> OptionLetter {
        self.correct
    }

    #[must_use]
    pub fn correct_option(&self) -> &AnswerOption {
        self.option(self.correct)
    }

    #[must_use]
    pub fn is_correct(&self, answer: Option<OptionLetter>) -> bool {
        answer == Some(self.correct)
    }
}
