use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Answer, Question, QuestionId};

/// Sentinel text shown when a question has no usable answer.
pub const NOT_ANSWERED: &str = "Not answered";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionResultError {
    #[error("a result needs at least one answer record")]
    Empty,

    #[error("answer count ({answers}) does not match question count ({questions})")]
    LengthMismatch { questions: usize, answers: usize },

    #[error("score ({score}) does not match correct record count ({correct})")]
    ScoreMismatch { score: u32, correct: u32 },
}

/// Per-question outcome, one per question in original order.
///
/// `user_answer` carries the selected option text, or the "Not answered"
/// sentinel when nothing was selected or the recorded index does not point
/// at an option. Wrong answers and missing answers score identically but
/// keep distinct display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    pub question: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub options: Vec<String>,
}

impl AnswerRecord {
    /// Derive the record for one question from its recorded answer.
    #[must_use]
    pub fn derive(question: &Question, answer: Answer) -> Self {
        let is_correct = answer.selected() == Some(question.correct());
        let user_answer = answer
            .selected()
            .and_then(|index| question.option(index))
            .unwrap_or(NOT_ANSWERED)
            .to_string();

        Self {
            question_id: question.id(),
            question: question.prompt().to_string(),
            user_answer,
            correct_answer: question.correct_text().to_string(),
            is_correct,
            options: question.options().to_vec(),
        }
    }
}

/// Immutable summary of a completed quiz attempt.
///
/// Built once at completion; holds no reference back to the live session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResult {
    score: u32,
    total: u32,
    percentage: u8,
    records: Vec<AnswerRecord>,
    completed_at: DateTime<Utc>,
}

impl SessionResult {
    /// Derive a result from questions and their recorded answers.
    ///
    /// # Errors
    ///
    /// Returns `SessionResultError::Empty` for an empty question list and
    /// `SessionResultError::LengthMismatch` when the answer list does not
    /// line up with the questions.
    pub fn from_answers(
        questions: &[Question],
        answers: &[Answer],
        completed_at: DateTime<Utc>,
    ) -> Result<Self, SessionResultError> {
        if questions.is_empty() {
            return Err(SessionResultError::Empty);
        }
        if questions.len() != answers.len() {
            return Err(SessionResultError::LengthMismatch {
                questions: questions.len(),
                answers: answers.len(),
            });
        }

        let records: Vec<AnswerRecord> = questions
            .iter()
            .zip(answers.iter())
            .map(|(question, answer)| AnswerRecord::derive(question, *answer))
            .collect();

        Self::from_records(records, completed_at)
    }

    /// Rehydrate a result from already-derived records, e.g. out of the
    /// session-scoped store or a backend history payload.
    ///
    /// # Errors
    ///
    /// Returns `SessionResultError::Empty` when `records` is empty.
    pub fn from_records(
        records: Vec<AnswerRecord>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, SessionResultError> {
        if records.is_empty() {
            return Err(SessionResultError::Empty);
        }

        let score = records.iter().filter(|record| record.is_correct).count();
        let score = u32::try_from(score).unwrap_or(u32::MAX);
        let total = u32::try_from(records.len()).unwrap_or(u32::MAX);

        Ok(Self {
            score,
            total,
            percentage: percentage_of(score, total),
            records,
            completed_at,
        })
    }

    /// Rehydrate a result whose score and total were persisted alongside
    /// the records, validating that they still agree.
    ///
    /// # Errors
    ///
    /// Returns `SessionResultError::ScoreMismatch` if `score` does not
    /// match the correct record count, and `SessionResultError::LengthMismatch`
    /// if `total` does not match the record count.
    pub fn from_persisted(
        score: u32,
        total: u32,
        records: Vec<AnswerRecord>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, SessionResultError> {
        if usize::try_from(total).map_or(true, |t| t != records.len()) {
            return Err(SessionResultError::LengthMismatch {
                questions: usize::try_from(total).unwrap_or(usize::MAX),
                answers: records.len(),
            });
        }

        let result = Self::from_records(records, completed_at)?;
        if result.score != score {
            return Err(SessionResultError::ScoreMismatch {
                score,
                correct: result.score,
            });
        }
        Ok(result)
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Rounded share of correct answers, 0..=100.
    #[must_use]
    pub fn percentage(&self) -> u8 {
        self.percentage
    }

    /// Number of questions answered wrongly or not at all.
    #[must_use]
    pub fn incorrect(&self) -> u32 {
        self.total - self.score
    }

    #[must_use]
    pub fn records(&self) -> &[AnswerRecord] {
        &self.records
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}

/// `round(100 * score / total)`, rounding halves up.
fn percentage_of(score: u32, total: u32) -> u8 {
    debug_assert!(total > 0);
    let ratio = (100.0 * f64::from(score)) / f64::from(total);
    // f64::round is round-half-away-from-zero, which is half-up for a
    // non-negative ratio.
    let rounded = ratio.round();
    u8::try_from(rounded as i64).unwrap_or(100)
}
