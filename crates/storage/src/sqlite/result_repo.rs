use assess_core::model::SessionId;

use super::SqliteRepository;
use super::mapping::{
    answers_to_json, incorrect_to_json, map_result_row, map_result_row_with_id,
};
use crate::repository::{ResultRepository, StorageError, TestResultRecord, TestResultRow};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

impl SqliteRepository {
    /// Look up a stored result by the session that produced it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no result exists for the session.
    pub async fn get_result_by_session(
        &self,
        session_id: SessionId,
    ) -> Result<TestResultRow, StorageError> {
        let row = sqlx::query(
            r"
                SELECT *
                FROM test_results
                WHERE session_id = ?1
            ",
        )
        .bind(session_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_result_row_with_id(&row)
    }
}

#[async_trait::async_trait]
impl ResultRepository for SqliteRepository {
    async fn append_result(&self, record: &TestResultRecord) -> Result<i64, StorageError> {
        let summary = &record.summary;
        let candidate = &record.candidate;

        let res = sqlx::query(
            r"
                INSERT INTO test_results (
                    session_id, name, email, phone, branch, skill_level,
                    correct_answers, total_questions, percentage_tenths, passed,
                    time_taken_seconds, pause_count, started_at, completed_at,
                    answers, incorrect_answers
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            ",
        )
        .bind(record.session_id.to_string())
        .bind(&candidate.name)
        .bind(&candidate.email)
        .bind(&candidate.phone)
        .bind(&candidate.branch)
        .bind(&candidate.skill_level)
        .bind(i64::from(summary.correct_count()))
        .bind(i64::from(summary.total_count()))
        .bind(i64::from(summary.percentage_tenths()))
        .bind(summary.passed())
        .bind(i64::from(record.time_taken_seconds))
        .bind(i64::from(record.pause_count))
        .bind(record.started_at)
        .bind(record.completed_at)
        .bind(answers_to_json(&record.answers)?)
        .bind(incorrect_to_json(&record.incorrect)?)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.last_insert_rowid())
    }

    async fn get_result(&self, id: i64) -> Result<TestResultRecord, StorageError> {
        let row = sqlx::query(
            r"
                SELECT *
                FROM test_results
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_result_row(&row)
    }

    async fn list_recent_results(&self, limit: u32) -> Result<Vec<TestResultRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT *
                FROM test_results
                ORDER BY completed_at DESC, id DESC
                LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_result_row_with_id(&row)?);
        }
        Ok(out)
    }
}
