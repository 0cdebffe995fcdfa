use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::model::{Question, QuestionId};
use quiz_core::time::fixed_now;
use services::{AnalysisService, Clock, QuizLoopService};
use storage::repository::{
    InMemoryQuestionBank, InMemoryResultBackend, InMemoryResultStore, QuestionSource,
    ResultHistory, SessionResultStore, StorageError,
};

fn build_questions() -> Vec<Question> {
    vec![
        Question::new(
            QuestionId::new(1),
            "2 + 2 = ?",
            vec!["3".to_string(), "4".to_string()],
            1,
        )
        .unwrap(),
        Question::new(
            QuestionId::new(2),
            "Capital of France?",
            vec!["Paris".to_string(), "Rome".to_string()],
            0,
        )
        .unwrap(),
        Question::new(
            QuestionId::new(3),
            "Largest planet?",
            vec!["Mars".to_string(), "Jupiter".to_string()],
            1,
        )
        .unwrap(),
    ]
}

struct FailingSource;

#[async_trait]
impl QuestionSource for FailingSource {
    async fn fetch_questions(&self) -> Result<Vec<Question>, StorageError> {
        Err(StorageError::Unavailable("backend is down".to_string()))
    }
}

#[tokio::test]
async fn quiz_loop_stores_and_submits_result() {
    let bank = InMemoryQuestionBank::new(build_questions());
    let store = Arc::new(InMemoryResultStore::new());
    let backend = Arc::new(InMemoryResultBackend::new());

    let loop_svc = QuizLoopService::new(
        Clock::fixed(fixed_now()),
        Arc::new(bank),
        Arc::clone(&store) as Arc<dyn SessionResultStore>,
    )
    .with_sink(Arc::clone(&backend) as _, "student");

    let mut session = loop_svc.start_session().await.unwrap();
    let correct: Vec<usize> = session.questions().iter().map(|q| q.correct()).collect();

    let mut last = None;
    for index in correct {
        last = Some(loop_svc.answer_current(&mut session, index).await.unwrap());
    }

    let last = last.expect("at least one answer");
    assert!(last.is_complete);
    let result = last.result.expect("result on completion");
    assert_eq!(result.score(), 3);
    assert_eq!(result.percentage(), 100);

    // Stored in the session-scoped slot under the session id.
    let stored = store.get(session.id()).await.unwrap().expect("slot filled");
    assert_eq!(stored, result);

    // Submitted once to the sink.
    assert_eq!(backend.len(), 1);
    let history = backend.recent_results("student").await.unwrap();
    assert_eq!(history[0], result);
}

#[tokio::test]
async fn quiz_loop_falls_back_when_primary_source_fails() {
    let store = Arc::new(InMemoryResultStore::new());
    let loop_svc = QuizLoopService::new(
        Clock::fixed(fixed_now()),
        Arc::new(FailingSource),
        Arc::clone(&store) as Arc<dyn SessionResultStore>,
    )
    .with_fallback(Arc::new(InMemoryQuestionBank::new(build_questions())));

    let session = loop_svc.start_session().await.unwrap();
    assert_eq!(session.questions().len(), 3);
}

#[tokio::test]
async fn quiz_loop_without_fallback_propagates_source_failure() {
    let loop_svc = QuizLoopService::new(
        Clock::fixed(fixed_now()),
        Arc::new(FailingSource),
        Arc::new(InMemoryResultStore::new()),
    );

    let err = loop_svc.start_session().await.unwrap_err();
    assert!(matches!(
        err,
        services::SessionError::Storage(StorageError::Unavailable(_))
    ));
}

#[tokio::test]
async fn sink_failure_does_not_block_the_local_result() {
    struct RejectingSink;

    #[async_trait]
    impl storage::repository::ResultSink for RejectingSink {
        async fn submit_result(
            &self,
            _username: &str,
            _result: &quiz_core::model::SessionResult,
        ) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("submit endpoint down".to_string()))
        }
    }

    let store = Arc::new(InMemoryResultStore::new());
    let loop_svc = QuizLoopService::new(
        Clock::fixed(fixed_now()),
        Arc::new(InMemoryQuestionBank::new(build_questions())),
        Arc::clone(&store) as Arc<dyn SessionResultStore>,
    )
    .with_sink(Arc::new(RejectingSink), "student");

    let mut session = loop_svc.start_session().await.unwrap();
    while !session.is_complete() {
        loop_svc.answer_current(&mut session, 0).await.unwrap();
    }

    assert!(store.get(session.id()).await.unwrap().is_some());
}

#[tokio::test]
async fn completed_session_feeds_the_analysis_view() {
    let store = Arc::new(InMemoryResultStore::new());
    let loop_svc = QuizLoopService::new(
        Clock::fixed(fixed_now()),
        Arc::new(InMemoryQuestionBank::new(build_questions())),
        Arc::clone(&store) as Arc<dyn SessionResultStore>,
    );

    let mut session = loop_svc.start_session().await.unwrap();
    loop_svc.answer_current(&mut session, 1).await.unwrap();
    loop_svc.skip_current(&mut session).await.unwrap();
    loop_svc.answer_current(&mut session, 0).await.unwrap();

    let analysis = AnalysisService::new(Arc::clone(&store) as Arc<dyn SessionResultStore>);
    let result = analysis
        .load_result(session.id(), "student")
        .await
        .unwrap()
        .expect("result available");

    // Q1 correct, Q2 skipped, Q3 wrong.
    assert_eq!(result.score(), 1);
    assert_eq!(result.total(), 3);
    assert_eq!(result.percentage(), 33);
    assert_eq!(result.records()[1].user_answer, "Not answered");

    analysis.retake(session.id()).await.unwrap();
    assert!(store.get(session.id()).await.unwrap().is_none());
}
