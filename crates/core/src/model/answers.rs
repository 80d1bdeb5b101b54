use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::OptionLetter;

/// Selected letters keyed by 0-based question index.
///
/// Absent keys are unanswered questions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSet {
    selected: BTreeMap<usize, OptionLetter>,
}

impl AnswerSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record or overwrite the answer for `index`.
    ///
    /// Returns the previously selected letter, if any.
    pub fn select(&mut self, index: usize, letter: OptionLetter) -> Option<OptionLetter> {
        self.selected.insert(index, letter)
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<OptionLetter> {
        self.selected.get(&index).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, OptionLetter)> + '_ {
        self.selected.iter().map(|(i, l)| (*i, *l))
    }
}

impl FromIterator<(usize, OptionLetter)> for AnswerSet {
    fn from_iter<T: IntoIterator<Item = (usize, OptionLetter)>>(iter: T) -> Self {
        Self {
            selected: iter.into_iter().collect(),
        }
    }
}
