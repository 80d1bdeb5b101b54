use assess_core::model::{AnswerSet, CandidateInfo, ScoreSummary, SessionId};
use assess_core::ReportEntry;
use sqlx::Row;

use crate::repository::{StorageError, TestResultRecord, TestResultRow};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn session_id_from_str(raw: &str) -> Result<SessionId, StorageError> {
    raw.parse::<SessionId>().map_err(ser)
}

pub(crate) fn answers_to_json(answers: &AnswerSet) -> Result<String, StorageError> {
    serde_json::to_string(answers).map_err(ser)
}

pub(crate) fn incorrect_to_json(entries: &[ReportEntry]) -> Result<String, StorageError> {
    serde_json::to_string(entries).map_err(ser)
}

fn map_summary(row: &sqlx::sqlite::SqliteRow) -> Result<ScoreSummary, StorageError> {
    let correct = u32_from_i64(
        "correct_answers",
        row.try_get::<i64, _>("correct_answers").map_err(ser)?,
    )?;
    let total = u32_from_i64(
        "total_questions",
        row.try_get::<i64, _>("total_questions").map_err(ser)?,
    )?;
    let tenths = u32_from_i64(
        "percentage_tenths",
        row.try_get::<i64, _>("percentage_tenths").map_err(ser)?,
    )?;
    let passed: bool = row.try_get("passed").map_err(ser)?;
    ScoreSummary::from_persisted(correct, total, tenths, passed).map_err(ser)
}

pub(crate) fn map_result_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<TestResultRecord, StorageError> {
    let session_id = session_id_from_str(&row.try_get::<String, _>("session_id").map_err(ser)?)?;
    let candidate = CandidateInfo::new(
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get::<String, _>("email").map_err(ser)?,
        row.try_get::<String, _>("phone").map_err(ser)?,
        row.try_get::<String, _>("branch").map_err(ser)?,
        row.try_get::<String, _>("skill_level").map_err(ser)?,
    );
    let answers: AnswerSet =
        serde_json::from_str(&row.try_get::<String, _>("answers").map_err(ser)?).map_err(ser)?;
    let incorrect: Vec<ReportEntry> =
        serde_json::from_str(&row.try_get::<String, _>("incorrect_answers").map_err(ser)?)
            .map_err(ser)?;

    Ok(TestResultRecord {
        session_id,
        candidate,
        summary: map_summary(row)?,
        time_taken_seconds: u32_from_i64(
            "time_taken_seconds",
            row.try_get::<i64, _>("time_taken_seconds").map_err(ser)?,
        )?,
        pause_count: u32_from_i64(
            "pause_count",
            row.try_get::<i64, _>("pause_count").map_err(ser)?,
        )?,
        started_at: row.try_get("started_at").map_err(ser)?,
        completed_at: row.try_get("completed_at").map_err(ser)?,
        answers,
        incorrect,
    })
}

pub(crate) fn map_result_row_with_id(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<TestResultRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    Ok(TestResultRow::new(id, map_result_row(row)?))
}
