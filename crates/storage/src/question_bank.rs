use async_trait::async_trait;
use quiz_core::model::Question;
use std::io;
use std::path::{Path, PathBuf};

use crate::repository::{QuestionRecord, QuestionSource, StorageError};

/// Question source backed by a `questions.json` file on disk.
///
/// This is the fallback source: when the backend cannot serve questions,
/// the caller falls back to the bundled file.
#[derive(Debug, Clone)]
pub struct FileQuestionBank {
    path: PathBuf,
}

impl FileQuestionBank {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<Question>, StorageError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound,
            _ => StorageError::Unavailable(e.to_string()),
        })?;

        let records: Vec<QuestionRecord> = serde_json::from_str(&raw)
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

#[async_trait]
impl QuestionSource for FileQuestionBank {
    async fn fetch_questions(&self) -> Result<Vec<Question>, StorageError> {
        self.load()
    }
}
