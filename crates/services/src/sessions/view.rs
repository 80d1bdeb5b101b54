use chrono::{DateTime, Utc};
use std::sync::Arc;

use assess_core::model::SessionId;
use storage::repository::{ResultRepository, StorageError, TestResultRecord, TestResultRow};

/// Storage identifier for a persisted test result.
///
/// NOTE: This is currently `i64` to match `SQLite` row IDs.
pub type ResultId = i64;

/// Presentation-agnostic list item for a stored result.
///
/// No pre-formatted strings; the caller formats percentages and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultListItem {
    pub id: ResultId,
    pub session_id: SessionId,
    pub name: String,
    pub email: String,
    pub completed_at: DateTime<Utc>,

    pub correct: u32,
    pub total: u32,
    pub percentage_tenths: u32,
    pub passed: bool,
    pub time_taken_seconds: u32,
    pub pause_count: u32,
}

impl ResultListItem {
    #[must_use]
    pub fn from_row(row: &TestResultRow) -> Self {
        let record = &row.record;
        let summary = &record.summary;
        Self {
            id: row.id,
            session_id: record.session_id,
            name: record.candidate.name.clone(),
            email: record.candidate.email.clone(),
            completed_at: record.completed_at,
            correct: summary.correct_count(),
            total: summary.total_count(),
            percentage_tenths: summary.percentage_tenths(),
            passed: summary.passed(),
            time_taken_seconds: record.time_taken_seconds,
            pause_count: record.pause_count,
        }
    }
}

/// Read-side facade over persisted results.
#[derive(Clone)]
pub struct ResultHistoryService {
    results: Arc<dyn ResultRepository>,
}

impl ResultHistoryService {
    #[must_use]
    pub fn new(results: Arc<dyn ResultRepository>) -> Self {
        Self { results }
    }

    /// Most recent results first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    pub async fn list_recent(&self, limit: u32) -> Result<Vec<ResultListItem>, StorageError> {
        let rows = self.results.list_recent_results(limit).await?;
        Ok(rows.iter().map(ResultListItem::from_row).collect())
    }

    /// Full record for one result, including the missed-question report.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no result has this id.
    pub async fn get(&self, id: ResultId) -> Result<TestResultRecord, StorageError> {
        self.results.get_result(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assess_core::model::{AnswerSet, CandidateInfo, ScoreSummary};
    use assess_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn record(name: &str, correct: u32) -> TestResultRecord {
        TestResultRecord {
            session_id: SessionId::generate(),
            candidate: CandidateInfo::new(name, "t@example.com", "555", "Austin", "Level 1"),
            summary: ScoreSummary::from_counts(correct, 10, 700).unwrap(),
            time_taken_seconds: 600,
            pause_count: 1,
            started_at: fixed_now(),
            completed_at: fixed_now(),
            answers: AnswerSet::new(),
            incorrect: Vec::new(),
        }
    }

    #[tokio::test]
    async fn lists_newest_first_as_items() {
        let repo = InMemoryRepository::new();
        repo.append_result(&record("first", 5)).await.unwrap();
        repo.append_result(&record("second", 7)).await.unwrap();
        let history = ResultHistoryService::new(Arc::new(repo));

        let items = history.list_recent(10).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "second");
        assert_eq!(items[0].id, 2);
        assert!(items[0].passed);
        assert_eq!(items[0].percentage_tenths, 700);
        assert!(!items[1].passed);
    }

    #[tokio::test]
    async fn get_missing_result_is_not_found() {
        let history = ResultHistoryService::new(Arc::new(InMemoryRepository::new()));
        assert!(matches!(history.get(1).await, Err(StorageError::NotFound)));
    }
}
