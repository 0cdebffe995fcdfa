use serde::{Deserialize, Serialize};

/// What a participant did with one question.
///
/// A selected index is recorded verbatim even when it does not point at a
/// valid option; scoring and display decide what to make of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Answer {
    /// The question was passed over without a selection.
    #[default]
    Unanswered,
    /// The participant picked the option at this index.
    Selected(usize),
}

impl Answer {
    /// Returns the selected option index, if any.
    #[must_use]
    pub fn selected(&self) -> Option<usize> {
        match self {
            Answer::Unanswered => None,
            Answer::Selected(index) => Some(*index),
        }
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        matches!(self, Answer::Selected(_))
    }
}
