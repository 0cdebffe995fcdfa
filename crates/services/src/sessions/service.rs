use chrono::{DateTime, Utc};
use std::fmt;

use quiz_core::model::{Answer, Question, QuestionId, SessionId, SessionResult};

use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── ANSWER OUTCOME ────────────────────────────────────────────────────────────
//

/// Immediate feedback for one submitted answer, before the session moves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub question_id: QuestionId,
    pub selected: usize,
    pub is_correct: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory state of one quiz attempt.
///
/// Steps through the question list one position at a time: each submitted
/// (or skipped) answer advances the cursor by exactly one, and the session
/// is complete once the cursor has passed the last question. All
/// operations are synchronous and either fully apply or fully reject.
pub struct QuizSession {
    id: SessionId,
    questions: Vec<Question>,
    current: usize,
    answers: Vec<Answer>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// Start a session over the given questions.
    ///
    /// `started_at` should come from the services layer clock to keep time
    /// deterministic.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no questions are provided.
    pub fn start(
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }

        let answers = vec![Answer::Unanswered; questions.len()];
        Ok(Self {
            id: SessionId::generate(),
            questions,
            current: 0,
            answers,
            started_at,
            completed_at: None,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Zero-based cursor; equals the question count once complete.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.current == self.questions.len()
    }

    /// Returns a summary of the current session progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.questions.len(),
            answered: self.current,
            remaining: self.questions.len() - self.current,
            is_complete: self.is_complete(),
        }
    }

    /// Record `selected` for the current question and advance by one.
    ///
    /// The index is stored verbatim even when it does not point at an
    /// option; scoring treats it as incorrect and display falls back to
    /// the "Not answered" sentinel.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session is already finished.
    pub fn submit_answer(
        &mut self,
        selected: usize,
        answered_at: DateTime<Utc>,
    ) -> Result<AnswerOutcome, SessionError> {
        let Some(question) = self.questions.get(self.current) else {
            return Err(SessionError::Completed);
        };

        let outcome = AnswerOutcome {
            question_id: question.id(),
            selected,
            is_correct: selected == question.correct(),
        };

        self.answers[self.current] = Answer::Selected(selected);
        self.advance(answered_at);
        Ok(outcome)
    }

    /// Advance past the current question without recording an answer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session is already finished.
    pub fn skip_current(&mut self, answered_at: DateTime<Utc>) -> Result<(), SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        self.advance(answered_at);
        Ok(())
    }

    fn advance(&mut self, at: DateTime<Utc>) {
        self.current += 1;
        if self.current == self.questions.len() {
            self.completed_at = Some(at);
        }
    }

    /// Derive the final result. Pure: repeated calls yield structurally
    /// identical results.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotComplete` while questions remain.
    pub fn compute_result(&self) -> Result<SessionResult, SessionError> {
        let completed_at = self.completed_at.ok_or(SessionError::NotComplete)?;
        Ok(SessionResult::from_answers(
            &self.questions,
            &self.answers,
            completed_at,
        )?)
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("id", &self.id)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
