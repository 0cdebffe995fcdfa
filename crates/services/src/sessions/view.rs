use std::sync::Arc;

use quiz_core::model::{SessionId, SessionResult};
use storage::repository::{ResultHistory, SessionResultStore};

use crate::error::SessionError;

/// Presentation-agnostic line item for the per-question breakdown.
///
/// This is intentionally **not** a UI view-model: no pre-formatted
/// strings, no status icons. The UI decides how to render correctness and
/// whether to show the correct answer for wrong records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisBreakdownItem {
    /// One-based position in the quiz.
    pub number: usize,
    pub question: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
}

impl AnalysisBreakdownItem {
    #[must_use]
    pub fn from_result(result: &SessionResult) -> Vec<Self> {
        result
            .records()
            .iter()
            .enumerate()
            .map(|(index, record)| Self {
                number: index + 1,
                question: record.question.clone(),
                user_answer: record.user_answer.clone(),
                correct_answer: record.correct_answer.clone(),
                is_correct: record.is_correct,
            })
            .collect()
    }
}

/// Results/analysis facade: loads the completed result for display.
///
/// The session-scoped slot is authoritative; when it is empty (e.g. the
/// analysis view is opened in a fresh session) the service falls back to
/// the backend history and shows the most recent entry.
#[derive(Clone)]
pub struct AnalysisService {
    store: Arc<dyn SessionResultStore>,
    history: Option<Arc<dyn ResultHistory>>,
}

impl AnalysisService {
    #[must_use]
    pub fn new(store: Arc<dyn SessionResultStore>) -> Self {
        Self {
            store,
            history: None,
        }
    }

    /// Fall back to this history when the local slot is empty.
    #[must_use]
    pub fn with_history(mut self, history: Arc<dyn ResultHistory>) -> Self {
        self.history = Some(history);
        self
    }

    /// Load the result to analyze, or `None` when nothing is available.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on slot or history failures.
    pub async fn load_result(
        &self,
        id: SessionId,
        username: &str,
    ) -> Result<Option<SessionResult>, SessionError> {
        if let Some(result) = self.store.get(id).await? {
            return Ok(Some(result));
        }

        let Some(history) = &self.history else {
            return Ok(None);
        };

        let mut results = history.recent_results(username).await?;
        Ok(results.pop())
    }

    /// Clear the local slot so the participant can retake the quiz.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the slot cannot be cleared.
    pub async fn retake(&self, id: SessionId) -> Result<(), SessionError> {
        self.store.remove(id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::{Answer, Question, QuestionId};
    use quiz_core::time::fixed_now;
    use storage::repository::{InMemoryResultBackend, InMemoryResultStore, ResultSink};

    fn build_result(selected: usize, offset_days: i64) -> SessionResult {
        let questions = vec![
            Question::new(
                QuestionId::new(1),
                "Q1",
                vec!["A".to_string(), "B".to_string()],
                0,
            )
            .unwrap(),
        ];
        SessionResult::from_answers(
            &questions,
            &[Answer::Selected(selected)],
            fixed_now() + Duration::days(offset_days),
        )
        .unwrap()
    }

    #[test]
    fn breakdown_numbers_records_from_one() {
        let result = build_result(1, 0);
        let items = AnalysisBreakdownItem::from_result(&result);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].number, 1);
        assert_eq!(items[0].user_answer, "B");
        assert_eq!(items[0].correct_answer, "A");
        assert!(!items[0].is_correct);
    }

    #[tokio::test]
    async fn prefers_the_session_scoped_slot() {
        let store = InMemoryResultStore::new();
        let id = SessionId::generate();
        let local = build_result(0, 0);
        store.put(id, &local).await.unwrap();

        let backend = InMemoryResultBackend::new();
        backend
            .submit_result("student", &build_result(1, 1))
            .await
            .unwrap();

        let svc = AnalysisService::new(Arc::new(store)).with_history(Arc::new(backend));
        let loaded = svc.load_result(id, "student").await.unwrap().unwrap();
        assert_eq!(loaded, local);
    }

    #[tokio::test]
    async fn falls_back_to_most_recent_history_entry() {
        let store = InMemoryResultStore::new();
        let backend = InMemoryResultBackend::new();
        let older = build_result(1, 0);
        let newer = build_result(0, 1);
        backend.submit_result("student", &older).await.unwrap();
        backend.submit_result("student", &newer).await.unwrap();

        let svc = AnalysisService::new(Arc::new(store)).with_history(Arc::new(backend));
        let loaded = svc
            .load_result(SessionId::generate(), "student")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded, newer);
    }

    #[tokio::test]
    async fn empty_slot_without_history_yields_none() {
        let svc = AnalysisService::new(Arc::new(InMemoryResultStore::new()));
        let loaded = svc
            .load_result(SessionId::generate(), "student")
            .await
            .unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn retake_clears_the_slot() {
        let store = Arc::new(InMemoryResultStore::new());
        let id = SessionId::generate();
        store.put(id, &build_result(0, 0)).await.unwrap();

        let svc = AnalysisService::new(Arc::clone(&store) as Arc<dyn SessionResultStore>);
        svc.retake(id).await.unwrap();
        assert!(store.get(id).await.unwrap().is_none());
    }
}
