use assess_core::model::{AnswerSet, CandidateInfo, QuestionBank, ScoreSummary, SessionId};
use assess_core::ReportEntry;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Errors raised while obtaining the question bank or explanation table.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("question source unavailable: {0}")]
    Unavailable(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("explanation key is not a question number: {0:?}")]
    InvalidKey(String),

    #[error("malformed question data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] assess_core::Error),
}

/// Persisted shape of a completed test.
///
/// Mirrors the submission payload so repositories can store it without the
/// services layer leaking into storage.
#[derive(Debug, Clone, PartialEq)]
pub struct TestResultRecord {
    pub session_id: SessionId,
    pub candidate: CandidateInfo,
    pub summary: ScoreSummary,
    pub time_taken_seconds: u32,
    pub pause_count: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub answers: AnswerSet,
    pub incorrect: Vec<ReportEntry>,
}

/// A stored result together with its storage identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct TestResultRow {
    pub id: i64,
    pub record: TestResultRecord,
}

impl TestResultRow {
    #[must_use]
    pub fn new(id: i64, record: TestResultRecord) -> Self {
        Self { id, record }
    }
}

/// Supplies the question bank a session runs against.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Load the full, validated bank.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` if the source cannot be read or its content is invalid.
    /// An empty source is an error, never an empty bank.
    async fn load_bank(&self) -> Result<QuestionBank, LoadError>;
}

/// Repository contract for completed test results.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Store a result and return its identifier.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn append_result(&self, record: &TestResultRecord) -> Result<i64, StorageError>;

    /// Fetch a result by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_result(&self, id: i64) -> Result<TestResultRecord, StorageError>;

    /// Most recent results first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_recent_results(&self, limit: u32) -> Result<Vec<TestResultRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    bank: Option<QuestionBank>,
    results: Arc<Mutex<Vec<TestResultRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_bank(bank: QuestionBank) -> Self {
        Self {
            bank: Some(bank),
            results: Arc::default(),
        }
    }
}

#[async_trait]
impl QuestionSource for InMemoryRepository {
    async fn load_bank(&self) -> Result<QuestionBank, LoadError> {
        self.bank
            .clone()
            .ok_or_else(|| LoadError::Unavailable("no question bank configured".into()))
    }
}

#[async_trait]
impl ResultRepository for InMemoryRepository {
    async fn append_result(&self, record: &TestResultRecord) -> Result<i64, StorageError> {
        let mut guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push(record.clone());
        i64::try_from(guard.len()).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    async fn get_result(&self, id: i64) -> Result<TestResultRecord, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        usize::try_from(id)
            .ok()
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| guard.get(i))
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_recent_results(&self, limit: u32) -> Result<Vec<TestResultRow>, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let mut rows = Vec::with_capacity(guard.len().min(limit));
        for (i, record) in guard.iter().enumerate().rev().take(limit) {
            let id = i64::try_from(i + 1).map_err(|e| StorageError::Serialization(e.to_string()))?;
            rows.push(TestResultRow::new(id, record.clone()));
        }
        Ok(rows)
    }
}

/// Aggregates the question source and result repository behind trait objects
/// for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionSource>,
    pub results: Arc<dyn ResultRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory(bank: QuestionBank) -> Self {
        let repo = InMemoryRepository::with_bank(bank);
        let questions: Arc<dyn QuestionSource> = Arc::new(repo.clone());
        let results: Arc<dyn ResultRepository> = Arc::new(repo);
        Self { questions, results }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assess_core::model::{AnswerOption, OptionLetter, Question};
    use assess_core::time::fixed_now;

    fn bank() -> QuestionBank {
        let options = OptionLetter::ALL
            .iter()
            .map(|l| AnswerOption::new(*l, format!("opt {l}")))
            .collect();
        let q = Question::new(1, None, "Q1", options, OptionLetter::A).unwrap();
        QuestionBank::new(vec![q]).unwrap()
    }

    fn record(name: &str) -> TestResultRecord {
        TestResultRecord {
            session_id: SessionId::generate(),
            candidate: CandidateInfo::new(name, "e@x", "1", "Austin, TX", "Level 1"),
            summary: ScoreSummary::from_counts(1, 1, 700).unwrap(),
            time_taken_seconds: 30,
            pause_count: 0,
            started_at: fixed_now(),
            completed_at: fixed_now(),
            answers: AnswerSet::new(),
            incorrect: Vec::new(),
        }
    }

    #[tokio::test]
    async fn missing_bank_is_a_load_error() {
        let repo = InMemoryRepository::new();
        assert!(matches!(
            repo.load_bank().await,
            Err(LoadError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn in_memory_storage_serves_bank() {
        let storage = Storage::in_memory(bank());
        let loaded = storage.questions.load_bank().await.unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[tokio::test]
    async fn results_are_listed_newest_first() {
        let repo = InMemoryRepository::new();
        let first = repo.append_result(&record("first")).await.unwrap();
        let second = repo.append_result(&record("second")).await.unwrap();

        let rows = repo.list_recent_results(10).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, second);
        assert_eq!(rows[0].record.candidate.name, "second");
        assert_eq!(rows[1].id, first);

        let fetched = repo.get_result(first).await.unwrap();
        assert_eq!(fetched.candidate.name, "first");
        assert!(matches!(
            repo.get_result(99).await,
            Err(StorageError::NotFound)
        ));
    }
}
