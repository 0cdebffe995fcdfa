//! HTTP-backed implementations of the collaborator contracts.

use async_trait::async_trait;
use quiz_core::model::{Question, SessionResult};
use storage::repository::{
    QuestionRecord, QuestionSource, ResultHistory, ResultRecord, ResultSink, StorageError,
};

use crate::http::ApiClient;

fn transport_error(e: &reqwest::Error) -> StorageError {
    StorageError::Unavailable(e.to_string())
}

/// Question source served by the backend's question endpoint.
#[derive(Clone)]
pub struct HttpQuestionSource {
    api: ApiClient,
}

impl HttpQuestionSource {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl QuestionSource for HttpQuestionSource {
    async fn fetch_questions(&self) -> Result<Vec<Question>, StorageError> {
        let response = self
            .api
            .get("/api/quiz/questions/")
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        // Failures come back as `{"error": ...}` with a non-2xx status.
        if !response.status().is_success() {
            return Err(StorageError::Unavailable(format!(
                "question endpoint answered {}",
                response.status()
            )));
        }

        let records: Vec<QuestionRecord> = response
            .json()
            .await
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        records
            .into_iter()
            .map(|record| {
                record
                    .into_question()
                    .map_err(|e| StorageError::Serialization(e.to_string()))
            })
            .collect()
    }
}

/// Result backend: submits finished attempts and reads back history.
#[derive(Clone)]
pub struct HttpResultBackend {
    api: ApiClient,
}

impl HttpResultBackend {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ResultSink for HttpResultBackend {
    async fn submit_result(
        &self,
        username: &str,
        result: &SessionResult,
    ) -> Result<(), StorageError> {
        let payload = ResultRecord::from_result(username, result);
        let response = self
            .api
            .post("/api/quiz/submit/")
            .json(&payload)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        if !response.status().is_success() {
            return Err(StorageError::Unavailable(format!(
                "submit endpoint answered {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ResultHistory for HttpResultBackend {
    async fn recent_results(&self, username: &str) -> Result<Vec<SessionResult>, StorageError> {
        let response = self
            .api
            .get("/api/quiz/results/")
            .query(&[("username", username)])
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        if !response.status().is_success() {
            return Err(StorageError::Unavailable(format!(
                "results endpoint answered {}",
                response.status()
            )));
        }

        let records: Vec<ResultRecord> = response
            .json()
            .await
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        records
            .into_iter()
            .map(|record| {
                record
                    .into_result()
                    .map_err(|e| StorageError::Serialization(e.to_string()))
            })
            .collect()
    }
}
