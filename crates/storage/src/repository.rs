use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{
    AnswerRecord, Question, QuestionError, QuestionId, SessionId, SessionResult,
    SessionResultError,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by collaborator adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("source unavailable: {0}")]
    Unavailable(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Wire shape for a question as the backend serves it.
///
/// This mirrors the domain `Question` so adapters can deserialize the
/// backend payload (`{id, question, options, correct}`) without leaking
/// transport concerns into the domain layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: u64,
    pub question: String,
    pub options: Vec<String>,
    pub correct: usize,
}

impl QuestionRecord {
    #[must_use]
    pub fn from_question(question: &Question) -> Self {
        Self {
            id: question.id().value(),
            question: question.prompt().to_owned(),
            options: question.options().to_vec(),
            correct: question.correct(),
        }
    }

    /// Convert the record back into a domain `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the record violates question invariants.
    pub fn into_question(self) -> Result<Question, QuestionError> {
        Question::new(
            QuestionId::new(self.id),
            self.question,
            self.options,
            self.correct,
        )
    }
}

/// Wire shape for one finished attempt as submitted to and returned by the
/// result backend.
///
/// `percentage` travels as a float because the backend stores it that way;
/// rehydration recomputes it from the records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub username: String,
    pub score: u32,
    pub total: u32,
    pub percentage: f64,
    pub answers: Vec<AnswerRecord>,
    pub timestamp: DateTime<Utc>,
}

impl ResultRecord {
    #[must_use]
    pub fn from_result(username: &str, result: &SessionResult) -> Self {
        Self {
            username: username.to_owned(),
            score: result.score(),
            total: result.total(),
            percentage: f64::from(result.percentage()),
            answers: result.records().to_vec(),
            timestamp: result.completed_at(),
        }
    }

    /// Convert the record back into a domain `SessionResult`.
    ///
    /// # Errors
    ///
    /// Returns `SessionResultError` if the persisted counts no longer match
    /// the answer records.
    pub fn into_result(self) -> Result<SessionResult, SessionResultError> {
        SessionResult::from_persisted(self.score, self.total, self.answers, self.timestamp)
    }
}

/// Supplies the ordered question list for a new session.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch all questions in presentation order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` when the source cannot be
    /// reached, or `StorageError::Serialization` for malformed payloads.
    async fn fetch_questions(&self) -> Result<Vec<Question>, StorageError>;
}

/// Accepts a finished attempt for persistence on the backend.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Submit a finished result on behalf of `username`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the sink rejects or cannot be reached.
    /// Callers log the failure; it never blocks local access to the result.
    async fn submit_result(
        &self,
        username: &str,
        result: &SessionResult,
    ) -> Result<(), StorageError>;
}

/// Reads back previously submitted results, oldest first.
#[async_trait]
pub trait ResultHistory: Send + Sync {
    /// Fetch the stored results for `username`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on transport or decoding failures.
    async fn recent_results(&self, username: &str) -> Result<Vec<SessionResult>, StorageError>;
}

/// Session-scoped slot holding the result of a completed attempt for the
/// analysis view. Not durable.
#[async_trait]
pub trait SessionResultStore: Send + Sync {
    /// Store `result` under `id`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the slot cannot be written.
    async fn put(&self, id: SessionId, result: &SessionResult) -> Result<(), StorageError>;

    /// Fetch the result stored under `id`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the slot cannot be read.
    async fn get(&self, id: SessionId) -> Result<Option<SessionResult>, StorageError>;

    /// Drop the slot, e.g. when the user retakes the quiz.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the slot cannot be cleared.
    async fn remove(&self, id: SessionId) -> Result<(), StorageError>;
}

/// Fixed in-memory question list for testing and offline runs.
#[derive(Clone, Default)]
pub struct InMemoryQuestionBank {
    questions: Arc<Mutex<Vec<Question>>>,
}

impl InMemoryQuestionBank {
    #[must_use]
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions: Arc::new(Mutex::new(questions)),
        }
    }
}

#[async_trait]
impl QuestionSource for InMemoryQuestionBank {
    async fn fetch_questions(&self) -> Result<Vec<Question>, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(guard.clone())
    }
}

/// In-memory session-scoped result store.
#[derive(Clone, Default)]
pub struct InMemoryResultStore {
    slots: Arc<Mutex<HashMap<SessionId, SessionResult>>>,
}

impl InMemoryResultStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionResultStore for InMemoryResultStore {
    async fn put(&self, id: SessionId, result: &SessionResult) -> Result<(), StorageError> {
        let mut guard = self
            .slots
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        guard.insert(id, result.clone());
        Ok(())
    }

    async fn get(&self, id: SessionId) -> Result<Option<SessionResult>, StorageError> {
        let guard = self
            .slots
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    async fn remove(&self, id: SessionId) -> Result<(), StorageError> {
        let mut guard = self
            .slots
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        guard.remove(&id);
        Ok(())
    }
}

/// In-memory result backend implementing both sink and history, for tests
/// and offline runs.
#[derive(Clone, Default)]
pub struct InMemoryResultBackend {
    rows: Arc<Mutex<Vec<(String, SessionResult)>>>,
}

impl InMemoryResultBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of results accepted so far.
    ///
    /// # Panics
    ///
    /// Panics if the backing lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.lock().expect("result backend lock").len()
    }

    /// # Panics
    ///
    /// Panics if the backing lock is poisoned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ResultSink for InMemoryResultBackend {
    async fn submit_result(
        &self,
        username: &str,
        result: &SessionResult,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .rows
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        guard.push((username.to_owned(), result.clone()));
        Ok(())
    }
}

#[async_trait]
impl ResultHistory for InMemoryResultBackend {
    async fn recent_results(&self, username: &str) -> Result<Vec<SessionResult>, StorageError> {
        let guard = self
            .rows
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(guard
            .iter()
            .filter(|(user, _)| user == username)
            .map(|(_, result)| result.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::Answer;
    use quiz_core::time::fixed_now;

    fn build_question(id: u64) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Q{id}"),
            vec!["A".to_string(), "B".to_string()],
            0,
        )
        .unwrap()
    }

    fn build_result() -> SessionResult {
        let questions = vec![build_question(1), build_question(2)];
        let answers = vec![Answer::Selected(0), Answer::Selected(1)];
        SessionResult::from_answers(&questions, &answers, fixed_now()).unwrap()
    }

    #[test]
    fn question_record_round_trips() {
        let question = build_question(7);
        let record = QuestionRecord::from_question(&question);
        assert_eq!(record.id, 7);
        assert_eq!(record.into_question().unwrap(), question);
    }

    #[test]
    fn question_record_rejects_broken_invariants() {
        let record = QuestionRecord {
            id: 1,
            question: "Q".to_string(),
            options: vec!["A".to_string(), "B".to_string()],
            correct: 9,
        };
        assert!(record.into_question().is_err());
    }

    #[test]
    fn result_record_round_trips() {
        let result = build_result();
        let record = ResultRecord::from_result("student", &result);
        assert_eq!(record.username, "student");
        assert_eq!(record.score, 1);
        assert_eq!(record.into_result().unwrap(), result);
    }

    #[tokio::test]
    async fn result_store_put_get_remove() {
        let store = InMemoryResultStore::new();
        let id = SessionId::generate();
        let result = build_result();

        assert!(store.get(id).await.unwrap().is_none());

        store.put(id, &result).await.unwrap();
        assert_eq!(store.get(id).await.unwrap(), Some(result.clone()));

        store.remove(id).await.unwrap();
        assert!(store.get(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn result_backend_filters_history_by_user() {
        let backend = InMemoryResultBackend::new();
        let result = build_result();

        backend.submit_result("alice", &result).await.unwrap();
        backend.submit_result("bob", &result).await.unwrap();
        backend.submit_result("alice", &result).await.unwrap();

        let history = backend.recent_results("alice").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(backend.len(), 3);
    }

    #[tokio::test]
    async fn question_bank_returns_questions_in_order() {
        let bank = InMemoryQuestionBank::new(vec![build_question(1), build_question(2)]);
        let questions = bank.fetch_questions().await.unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].id(), QuestionId::new(1));
        assert_eq!(questions[1].id(), QuestionId::new(2));
    }
}
