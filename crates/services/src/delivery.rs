//! Hand-off of completed sessions to downstream consumers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use assess_core::ReportEntry;
use assess_core::model::{AnswerSet, CandidateInfo, ScoreSummary, SessionId};
use storage::repository::{ResultRepository, TestResultRecord};

use crate::error::SinkError;

/// Everything a renderer or persistence layer needs about a finished session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionPayload {
    pub session_id: SessionId,
    pub candidate: CandidateInfo,
    pub summary: ScoreSummary,
    pub report: Vec<ReportEntry>,
    pub time_taken_seconds: u32,
    pub pause_count: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub timed_out: bool,
    pub answers: AnswerSet,
}

impl SubmissionPayload {
    /// Storage shape of this payload.
    #[must_use]
    pub fn to_record(&self) -> TestResultRecord {
        TestResultRecord {
            session_id: self.session_id,
            candidate: self.candidate.clone(),
            summary: self.summary,
            time_taken_seconds: self.time_taken_seconds,
            pause_count: self.pause_count,
            started_at: self.started_at,
            completed_at: self.completed_at,
            answers: self.answers.clone(),
            incorrect: self.report.clone(),
        }
    }
}

/// Receives submission payloads. Implementations must tolerate being called
/// once per session and should not assume any ordering between sinks.
#[async_trait]
pub trait ResultSink: Send + Sync {
    fn name(&self) -> &'static str;

    /// Deliver a payload.
    ///
    /// # Errors
    ///
    /// Returns `SinkError` if the payload could not be delivered.
    async fn deliver(&self, payload: &SubmissionPayload) -> Result<(), SinkError>;
}

/// Writes payloads to a result repository.
#[derive(Clone)]
pub struct PersistenceSink {
    results: Arc<dyn ResultRepository>,
}

impl PersistenceSink {
    #[must_use]
    pub fn new(results: Arc<dyn ResultRepository>) -> Self {
        Self { results }
    }
}

#[async_trait]
impl ResultSink for PersistenceSink {
    fn name(&self) -> &'static str {
        "persistence"
    }

    async fn deliver(&self, payload: &SubmissionPayload) -> Result<(), SinkError> {
        let id = self.results.append_result(&payload.to_record()).await?;
        tracing::debug!(session = %payload.session_id, id, "result persisted");
        Ok(())
    }
}

/// Emits a structured log line per payload. The full JSON is logged at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl ResultSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn deliver(&self, payload: &SubmissionPayload) -> Result<(), SinkError> {
        tracing::info!(
            session = %payload.session_id,
            candidate = %payload.candidate.name,
            email = %payload.candidate.email,
            score = %payload.summary,
            time_taken_seconds = payload.time_taken_seconds,
            pause_count = payload.pause_count,
            "test submitted"
        );
        if tracing::enabled!(tracing::Level::DEBUG) {
            let json = serde_json::to_string(payload)
                .map_err(|err| SinkError::Rejected(err.to_string()))?;
            tracing::debug!(payload = %json, "submission payload");
        }
        Ok(())
    }
}

/// Per-sink result of a dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub delivered: Vec<&'static str>,
    pub failed: Vec<(&'static str, String)>,
}

impl DispatchOutcome {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Deliver `payload` to every sink in order. Failures are logged and collected.
pub async fn dispatch(sinks: &[Arc<dyn ResultSink>], payload: &SubmissionPayload) -> DispatchOutcome {
    let mut outcome = DispatchOutcome::default();
    for sink in sinks {
        match sink.deliver(payload).await {
            Ok(()) => outcome.delivered.push(sink.name()),
            Err(err) => {
                tracing::warn!(
                    sink = sink.name(),
                    session = %payload.session_id,
                    error = %err,
                    "result sink failed"
                );
                outcome.failed.push((sink.name(), err.to_string()));
            }
        }
    }
    outcome
}
