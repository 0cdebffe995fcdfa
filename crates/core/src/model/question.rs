use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::QuestionId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt is empty")]
    EmptyPrompt,

    #[error("question needs at least 2 options, got {len}")]
    TooFewOptions { len: usize },

    #[error("correct option index {correct} is out of range for {len} options")]
    CorrectOutOfRange { correct: usize, len: usize },
}

/// One multiple-choice question: an immutable prompt, an ordered list of
/// options, and the index of the correct option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<String>,
    correct: usize,
}

impl Question {
    /// Build a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyPrompt` for a blank prompt,
    /// `QuestionError::TooFewOptions` for fewer than two options, and
    /// `QuestionError::CorrectOutOfRange` when `correct` does not index
    /// into `options`.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct: usize,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions { len: options.len() });
        }
        if correct >= options.len() {
            return Err(QuestionError::CorrectOutOfRange {
                correct,
                len: options.len(),
            });
        }

        Ok(Self {
            id,
            prompt,
            options,
            correct,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Index of the correct option. Always in range by construction.
    #[must_use]
    pub fn correct(&self) -> usize {
        self.correct
    }

    /// Text of the correct option.
    #[must_use]
    pub fn correct_text(&self) -> &str {
        &self.options[self.correct]
    }

    /// Returns the option text at `index`, if it exists.
    #[must_use]
    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_options() -> Vec<String> {
        vec!["A".to_string(), "B".to_string()]
    }

    #[test]
    fn builds_valid_question() {
        let q = Question::new(QuestionId::new(1), "2 + 2 = ?", two_options(), 1).unwrap();
        assert_eq!(q.id(), QuestionId::new(1));
        assert_eq!(q.prompt(), "2 + 2 = ?");
        assert_eq!(q.correct(), 1);
        assert_eq!(q.correct_text(), "B");
        assert_eq!(q.option(0), Some("A"));
        assert_eq!(q.option(5), None);
    }

    #[test]
    fn rejects_empty_prompt() {
        let err = Question::new(QuestionId::new(1), "   ", two_options(), 0).unwrap_err();
        assert!(matches!(err, QuestionError::EmptyPrompt));
    }

    #[test]
    fn rejects_single_option() {
        let err =
            Question::new(QuestionId::new(1), "Q", vec!["only".to_string()], 0).unwrap_err();
        assert!(matches!(err, QuestionError::TooFewOptions { len: 1 }));
    }

    #[test]
    fn rejects_correct_index_out_of_range() {
        let err = Question::new(QuestionId::new(1), "Q", two_options(), 2).unwrap_err();
        assert!(matches!(
            err,
            QuestionError::CorrectOutOfRange { correct: 2, len: 2 }
        ));
    }
}
