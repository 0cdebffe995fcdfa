use std::sync::Arc;

use quiz_core::model::SessionResult;
use quiz_core::Clock;
use storage::repository::{QuestionSource, ResultSink, SessionResultStore};

use super::service::{AnswerOutcome, QuizSession};
use crate::error::SessionError;

/// Result of answering (or skipping) a single question in a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionAnswerOutcome {
    pub outcome: Option<AnswerOutcome>,
    pub is_complete: bool,
    /// Present once the session just completed; the same value is stored
    /// in the session-scoped slot under the session's id.
    pub result: Option<SessionResult>,
}

/// Orchestrates session start and the completion side effects.
///
/// Questions come from a primary source with an optional fallback; on
/// completion the derived result is stored in the session-scoped slot and
/// submitted to the result sink. A sink failure is logged and never blocks
/// the participant from seeing their own result.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    questions: Arc<dyn QuestionSource>,
    fallback: Option<Arc<dyn QuestionSource>>,
    store: Arc<dyn SessionResultStore>,
    sink: Option<(Arc<dyn ResultSink>, String)>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionSource>,
        store: Arc<dyn SessionResultStore>,
    ) -> Self {
        Self {
            clock,
            questions,
            fallback: None,
            store,
            sink: None,
        }
    }

    /// Use `fallback` when the primary question source is unavailable.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Arc<dyn QuestionSource>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Submit completed results to `sink` on behalf of `username`.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>, username: impl Into<String>) -> Self {
        self.sink = Some((sink, username.into()));
        self
    }

    /// Start a new session from the configured sources.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when every source fails and
    /// `SessionError::Empty` when the sources hold no questions.
    pub async fn start_session(&self) -> Result<QuizSession, SessionError> {
        let questions = match self.questions.fetch_questions().await {
            Ok(questions) => questions,
            Err(primary_err) => match &self.fallback {
                Some(fallback) => {
                    tracing::warn!(error = %primary_err, "primary question source failed, using fallback");
                    fallback.fetch_questions().await?
                }
                None => return Err(primary_err.into()),
            },
        };

        QuizSession::start(questions, self.clock.now())
    }

    /// Answer the current question; on completion, store and submit the
    /// derived result.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` when the session is already done
    /// and `SessionError::Storage` when the local result slot fails.
    pub async fn answer_current(
        &self,
        session: &mut QuizSession,
        selected: usize,
    ) -> Result<SessionAnswerOutcome, SessionError> {
        let outcome = session.submit_answer(selected, self.clock.now())?;
        let result = self.finalize_if_complete(session).await?;

        Ok(SessionAnswerOutcome {
            outcome: Some(outcome),
            is_complete: session.is_complete(),
            result,
        })
    }

    /// Skip the current question without recording an answer.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::answer_current`].
    pub async fn skip_current(
        &self,
        session: &mut QuizSession,
    ) -> Result<SessionAnswerOutcome, SessionError> {
        session.skip_current(self.clock.now())?;
        let result = self.finalize_if_complete(session).await?;

        Ok(SessionAnswerOutcome {
            outcome: None,
            is_complete: session.is_complete(),
            result,
        })
    }

    async fn finalize_if_complete(
        &self,
        session: &QuizSession,
    ) -> Result<Option<SessionResult>, SessionError> {
        if !session.is_complete() {
            return Ok(None);
        }

        let result = session.compute_result()?;
        self.store.put(session.id(), &result).await?;

        if let Some((sink, username)) = &self.sink {
            if let Err(e) = sink.submit_result(username, &result).await {
                tracing::warn!(error = %e, "result submission failed, keeping local result");
            }
        }

        Ok(Some(result))
    }
}
