use std::collections::HashMap;

use crate::model::QuestionNumber;

/// Text used for any question without a specific explanation.
pub const DEFAULT_EXPLANATION: &str = "This answer is correct based on industry standards and \
best practices for generator operation and maintenance. Understanding this concept is essential \
for safe and effective generator service work.";

/// Total mapping from question number to explanation text.
///
/// Implementations must always return something; missing entries fall back
/// to a default rather than failing.
pub trait ExplanationLookup: Send + Sync {
    fn explanation(&self, number: QuestionNumber) -> &str;
}

/// Keyed explanation table with a fallback string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplanationTable {
    entries: HashMap<QuestionNumber, String>,
    fallback: String,
}

impl Default for ExplanationTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ExplanationTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            fallback: DEFAULT_EXPLANATION.to_owned(),
        }
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    /// Adds or replaces the explanation for `number`.
    pub fn insert(&mut self, number: QuestionNumber, text: impl Into<String>) {
        self.entries.insert(number, text.into());
    }

    #[must_use]
    pub fn contains(&self, number: QuestionNumber) -> bool {
        self.entries.contains_key(&number)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn fallback(&self) -> &str {
        &self.fallback
    }
}

impl FromIterator<(QuestionNumber, String)> for ExplanationTable {
    fn from_iter<T: IntoIterator<Item = (QuestionNumber, String)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
            fallback: DEFAULT_EXPLANATION.to_owned(),
        }
    }
}

impl ExplanationLookup for ExplanationTable {
    fn explanation(&self, number: QuestionNumber) -> &str {
        self.entries
            .get(&number)
            .map_or(self.fallback.as_str(), String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_number_returns_entry() {
        let mut table = ExplanationTable::new();
        table.insert(QuestionNumber::new(5), "Volts measure pressure.");
        assert_eq!(
            table.explanation(QuestionNumber::new(5)),
            "Volts measure pressure."
        );
    }

    #[test]
    fn unknown_number_falls_back() {
        let table = ExplanationTable::new();
        assert_eq!(table.explanation(QuestionNumber::new(99)), DEFAULT_EXPLANATION);
    }

    #[test]
    fn custom_fallback_is_used() {
        let table: ExplanationTable = [(QuestionNumber::new(1), "one".to_owned())]
            .into_iter()
            .collect();
        let table = table.with_fallback("n/a");
        assert_eq!(table.explanation(QuestionNumber::new(1)), "one");
        assert_eq!(table.explanation(QuestionNumber::new(2)), "n/a");
    }
}
