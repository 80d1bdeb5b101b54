use assess_core::model::{OptionLetter, Question};

/// Lifecycle stage of a test session. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Landing,
    InProgress,
    Submitted,
}

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub phase: Phase,
    pub total: usize,
    pub answered: usize,
    pub current_index: usize,
    /// Position of the current question as a rounded percentage.
    pub percent_complete: u8,
    pub remaining_seconds: u32,
    pub paused: bool,
    pub pause_count: u32,
}

/// The question the candidate is looking at, with their current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentQuestion {
    pub index: usize,
    pub total: usize,
    pub question: Question,
    pub selected: Option<OptionLetter>,
}

impl CurrentQuestion {
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.index + 1 == self.total
    }
}

pub(crate) fn percent_complete(current_index: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = ((current_index + 1) * 200 + total) / (2 * total);
    u8::try_from(pct.min(100)).unwrap_or(100)
}
