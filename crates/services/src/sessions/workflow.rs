use std::sync::Arc;

use assess_core::model::{CandidateInfo, QuestionBank};
use assess_core::{ExplanationLookup, ExplanationTable, SessionConfig};
use storage::repository::QuestionSource;

use super::service::TestSession;
use crate::Clock;
use crate::delivery::{self, DispatchOutcome, ResultSink, SubmissionPayload};
use crate::error::AssessmentError;

/// Result of finalizing a submitted session.
#[derive(Debug, Clone, PartialEq)]
pub struct Finalized {
    pub payload: SubmissionPayload,
    /// `None` when the payload had already been dispatched for this session.
    pub dispatch: Option<DispatchOutcome>,
}

/// Orchestrates session creation from a question source and the hand-off of
/// results to sinks.
#[derive(Clone)]
pub struct AssessmentService {
    clock: Clock,
    questions: Arc<dyn QuestionSource>,
    explanations: Arc<dyn ExplanationLookup>,
    sinks: Vec<Arc<dyn ResultSink>>,
    config: SessionConfig,
}

impl AssessmentService {
    #[must_use]
    pub fn new(clock: Clock, questions: Arc<dyn QuestionSource>) -> Self {
        Self {
            clock,
            questions,
            explanations: Arc::new(ExplanationTable::new()),
            sinks: Vec::new(),
            config: SessionConfig::default(),
        }
    }

    #[must_use]
    pub fn with_explanations(mut self, explanations: Arc<dyn ExplanationLookup>) -> Self {
        self.explanations = explanations;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    #[must_use]
    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// Load and validate the question bank.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::Load` if the source is unavailable or malformed.
    pub async fn load_bank(&self) -> Result<Arc<QuestionBank>, AssessmentError> {
        let bank = self.questions.load_bank().await?;
        tracing::debug!(questions = bank.len(), "question bank loaded");
        Ok(Arc::new(bank))
    }

    /// Create a session in the landing phase, ready for candidate details.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::Load` if the question bank cannot be loaded.
    pub async fn prepare_session(&self) -> Result<TestSession, AssessmentError> {
        let bank = self.load_bank().await?;
        Ok(TestSession::new(bank, Arc::clone(&self.explanations), self.config).with_clock(self.clock))
    }

    /// Create a session and start it for `candidate`.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::Load` for question source failures and
    /// `AssessmentError::Session` if the candidate details are incomplete.
    pub async fn start_session(
        &self,
        candidate: CandidateInfo,
    ) -> Result<TestSession, AssessmentError> {
        let mut session = self.prepare_session().await?;
        session.start(candidate)?;
        Ok(session)
    }

    /// Submit `session` if needed and deliver its payload to every sink once.
    ///
    /// Sink failures are reported in the outcome and never fail the call.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::Session` if the session never started.
    pub async fn finalize(&self, session: &mut TestSession) -> Result<Finalized, AssessmentError> {
        session.submit()?;
        let payload = session.submission_payload()?;
        if session.is_dispatched() {
            return Ok(Finalized {
                payload,
                dispatch: None,
            });
        }

        let outcome = self.dispatch(&payload).await;
        session.mark_dispatched();
        Ok(Finalized {
            payload,
            dispatch: Some(outcome),
        })
    }

    /// Deliver `payload` to every configured sink. Useful for retrying failed sinks.
    pub async fn dispatch(&self, payload: &SubmissionPayload) -> DispatchOutcome {
        let outcome = delivery::dispatch(&self.sinks, payload).await;
        tracing::debug!(
            session = %payload.session_id,
            delivered = outcome.delivered.len(),
            failed = outcome.failed.len(),
            "submission dispatched"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::PersistenceSink;
    use crate::error::SessionError;
    use assess_core::model::{AnswerOption, OptionLetter, Question};
    use assess_core::time::fixed_clock;
    use storage::repository::{InMemoryRepository, LoadError, ResultRepository};

    fn bank() -> QuestionBank {
        let questions = (1..=3)
            .map(|n| {
                let options = OptionLetter::ALL
                    .iter()
                    .map(|l| AnswerOption::new(*l, format!("opt {l}")))
                    .collect();
                Question::new(n, None, format!("Q{n}"), options, OptionLetter::A).unwrap()
            })
            .collect();
        QuestionBank::new(questions).unwrap()
    }

    fn candidate() -> CandidateInfo {
        CandidateInfo::new("Ada", "ada@example.com", "555-0100", "Austin, TX", "Level 2")
    }

    #[tokio::test]
    async fn missing_bank_surfaces_load_error() {
        let service = AssessmentService::new(fixed_clock(), Arc::new(InMemoryRepository::new()));
        let err = service.prepare_session().await.unwrap_err();
        assert!(matches!(err, AssessmentError::Load(LoadError::Unavailable(_))));
    }

    #[tokio::test]
    async fn invalid_candidate_is_rejected() {
        let service =
            AssessmentService::new(fixed_clock(), Arc::new(InMemoryRepository::with_bank(bank())));
        let err = service
            .start_session(CandidateInfo::new(" ", "a@b.c", "1", "x", "y"))
            .await
            .unwrap_err();
        assert!(matches!(err, AssessmentError::Session(SessionError::Validation(_))));
    }

    #[tokio::test]
    async fn finalize_dispatches_once() {
        let repo = InMemoryRepository::with_bank(bank());
        let service = AssessmentService::new(fixed_clock(), Arc::new(repo.clone()))
            .with_config(SessionConfig::default().with_total_seconds(600))
            .with_sink(Arc::new(PersistenceSink::new(Arc::new(repo.clone()))));

        let mut session = service.start_session(candidate()).await.unwrap();
        assert_eq!(session.clock().total_seconds(), 600);
        session.select_answer(OptionLetter::A).unwrap();

        let first = service.finalize(&mut session).await.unwrap();
        assert_eq!(first.dispatch.as_ref().unwrap().delivered, ["persistence"]);
        assert_eq!(first.payload.summary.correct_count(), 1);

        let second = service.finalize(&mut session).await.unwrap();
        assert!(second.dispatch.is_none());
        assert_eq!(second.payload, first.payload);
        assert_eq!(repo.list_recent_results(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn finalize_before_start_fails() {
        let service =
            AssessmentService::new(fixed_clock(), Arc::new(InMemoryRepository::with_bank(bank())));
        let mut session = service.prepare_session().await.unwrap();
        let err = service.finalize(&mut session).await.unwrap_err();
        assert!(matches!(err, AssessmentError::Session(SessionError::NotStarted)));
    }
}
