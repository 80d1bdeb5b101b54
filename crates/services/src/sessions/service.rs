use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

use assess_core::model::{AnswerSet, CandidateInfo, OptionLetter, Question, QuestionBank, ScoreSummary, SessionId};
use assess_core::{
    Clock, ExplanationLookup, ReportEntry, SessionClock, SessionConfig, build_report,
    score_with_threshold,
};

use super::progress::{CurrentQuestion, Phase, SessionProgress, percent_complete};
use crate::delivery::SubmissionPayload;
use crate::error::SessionError;

//
// ─── RESULTS ───────────────────────────────────────────────────────────────────
//

/// Read-only outcome of a submitted session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResults {
    pub summary: ScoreSummary,
    pub report: Vec<ReportEntry>,
    pub time_taken_seconds: u32,
    pub pause_count: u32,
    pub completed_at: DateTime<Utc>,
    pub timed_out: bool,
}

/// What a `tick` did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Session is not running; nothing changed.
    Ignored,
    /// Clock is paused; time did not move.
    Paused,
    Running { remaining_seconds: u32 },
    /// Time ran out and the session was submitted.
    Expired,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// A single candidate's timed test.
///
/// Owns the answer set and countdown. Every command either applies fully or
/// returns an error without touching state. Once `Submitted`, the answers and
/// results are frozen.
pub struct TestSession {
    id: SessionId,
    bank: Arc<QuestionBank>,
    explanations: Arc<dyn ExplanationLookup>,
    config: SessionConfig,
    wall: Clock,
    phase: Phase,
    candidate: Option<CandidateInfo>,
    answers: AnswerSet,
    clock: SessionClock,
    current: usize,
    started_at: Option<DateTime<Utc>>,
    results: Option<SessionResults>,
    dispatched: bool,
}

impl TestSession {
    /// Create a session in the `Landing` phase.
    #[must_use]
    pub fn new(
        bank: Arc<QuestionBank>,
        explanations: Arc<dyn ExplanationLookup>,
        config: SessionConfig,
    ) -> Self {
        Self {
            id: SessionId::generate(),
            bank,
            explanations,
            config,
            wall: Clock::default(),
            phase: Phase::Landing,
            candidate: None,
            answers: AnswerSet::new(),
            clock: SessionClock::new(config.total_seconds),
            current: 0,
            started_at: None,
            results: None,
            dispatched: false,
        }
    }

    /// Use `clock` for start/completion timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.wall = clock;
        self
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn config(&self) -> SessionConfig {
        self.config
    }

    #[must_use]
    pub fn candidate(&self) -> Option<&CandidateInfo> {
        self.candidate.as_ref()
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    #[must_use]
    pub fn clock(&self) -> SessionClock {
        self.clock
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn results(&self) -> Option<&SessionResults> {
        self.results.as_ref()
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.phase == Phase::Submitted
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.bank.get(self.current)
    }

    /// Current question with the candidate's selection, while the test is running.
    #[must_use]
    pub fn current_view(&self) -> Option<CurrentQuestion> {
        if self.phase != Phase::InProgress {
            return None;
        }
        self.current_question().map(|q| CurrentQuestion {
            index: self.current,
            total: self.bank.len(),
            question: q.clone(),
            selected: self.answers.get(self.current),
        })
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            phase: self.phase,
            total: self.bank.len(),
            answered: self.answers.len(),
            current_index: self.current,
            percent_complete: percent_complete(self.current, self.bank.len()),
            remaining_seconds: self.clock.remaining_seconds(),
            paused: self.clock.is_paused(),
            pause_count: self.clock.pause_count(),
        }
    }

    /// Begin the test for `candidate`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyStarted` outside `Landing` and
    /// `SessionError::Validation` if any identity field is blank.
    pub fn start(&mut self, candidate: CandidateInfo) -> Result<(), SessionError> {
        if self.phase != Phase::Landing {
            return Err(SessionError::AlreadyStarted);
        }
        candidate.validate()?;

        self.candidate = Some(candidate.trimmed());
        self.clock = SessionClock::new(self.config.total_seconds);
        self.answers = AnswerSet::new();
        self.current = 0;
        self.started_at = Some(self.wall.now());
        self.phase = Phase::InProgress;
        tracing::debug!(session = %self.id, total_seconds = self.config.total_seconds, "session started");
        Ok(())
    }

    /// Record `letter` for the current question, replacing any earlier choice.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` outside `InProgress` and
    /// `SessionError::Paused` while paused; the answer set is untouched.
    pub fn select_answer(&mut self, letter: OptionLetter) -> Result<(), SessionError> {
        self.ensure_running()?;
        self.answers.select(self.current, letter);
        Ok(())
    }

    /// Move to the next question. No-op on the last question or when not running.
    pub fn next(&mut self) -> usize {
        if self.phase == Phase::InProgress && self.current + 1 < self.bank.len() {
            self.current += 1;
        }
        self.current
    }

    /// Move to the previous question. No-op on the first question or when not running.
    pub fn previous(&mut self) -> usize {
        if self.phase == Phase::InProgress && self.current > 0 {
            self.current -= 1;
        }
        self.current
    }

    /// Pause or resume the countdown. Returns the new paused state.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` outside `InProgress`.
    pub fn toggle_pause(&mut self) -> Result<bool, SessionError> {
        if self.phase != Phase::InProgress {
            return Err(SessionError::NotInProgress);
        }
        let paused = self.clock.toggle_pause();
        tracing::debug!(session = %self.id, paused, pause_count = self.clock.pause_count(), "pause toggled");
        Ok(paused)
    }

    /// Advance the countdown by `elapsed_seconds`.
    ///
    /// Reaching zero submits the session with whatever answers are recorded.
    ///
    /// # Errors
    ///
    /// Propagates scoring failures from the automatic submission.
    pub fn tick(&mut self, elapsed_seconds: u32) -> Result<TickOutcome, SessionError> {
        if self.phase != Phase::InProgress {
            return Ok(TickOutcome::Ignored);
        }
        if self.clock.is_paused() {
            return Ok(TickOutcome::Paused);
        }
        self.clock.advance(elapsed_seconds);
        if self.clock.is_expired() {
            self.finish(true)?;
            return Ok(TickOutcome::Expired);
        }
        Ok(TickOutcome::Running {
            remaining_seconds: self.clock.remaining_seconds(),
        })
    }

    /// Submit the test and compute results.
    ///
    /// Calling this again after submission returns the same results.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` from `Landing`, or a scoring error
    /// (in which case the session stays `InProgress`).
    pub fn submit(&mut self) -> Result<&SessionResults, SessionError> {
        match self.phase {
            Phase::Landing => return Err(SessionError::NotStarted),
            Phase::InProgress => self.finish(false)?,
            Phase::Submitted => {}
        }
        self.results.as_ref().ok_or(SessionError::NotSubmitted)
    }

    /// Assemble the payload handed to renderers and sinks.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotSubmitted` before submission.
    pub fn submission_payload(&self) -> Result<SubmissionPayload, SessionError> {
        let (Some(results), Some(candidate), Some(started_at)) =
            (&self.results, &self.candidate, self.started_at)
        else {
            return Err(SessionError::NotSubmitted);
        };
        Ok(SubmissionPayload {
            session_id: self.id,
            candidate: candidate.clone(),
            summary: results.summary,
            report: results.report.clone(),
            time_taken_seconds: results.time_taken_seconds,
            pause_count: results.pause_count,
            started_at,
            completed_at: results.completed_at,
            timed_out: results.timed_out,
            answers: self.answers.clone(),
        })
    }

    pub(crate) fn is_dispatched(&self) -> bool {
        self.dispatched
    }

    pub(crate) fn mark_dispatched(&mut self) {
        self.dispatched = true;
    }

    fn ensure_running(&self) -> Result<(), SessionError> {
        match self.phase {
            Phase::InProgress if self.clock.is_paused() => Err(SessionError::Paused),
            Phase::InProgress => Ok(()),
            Phase::Landing | Phase::Submitted => Err(SessionError::NotInProgress),
        }
    }

    fn finish(&mut self, timed_out: bool) -> Result<(), SessionError> {
        let questions = self.bank.questions();
        let summary = score_with_threshold(
            questions,
            &self.answers,
            self.config.pass_threshold_tenths,
        )?;
        let report = build_report(questions, &self.answers, self.explanations.as_ref());

        self.results = Some(SessionResults {
            summary,
            report,
            time_taken_seconds: self.clock.elapsed_seconds(),
            pause_count: self.clock.pause_count(),
            completed_at: self.wall.now(),
            timed_out,
        });
        self.phase = Phase::Submitted;
        tracing::info!(
            session = %self.id,
            correct = summary.correct_count(),
            total = summary.total_count(),
            passed = summary.passed(),
            timed_out,
            "session submitted"
        );
        Ok(())
    }
}

impl fmt::Debug for TestSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestSession")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("questions", &self.bank.len())
            .field("answered", &self.answers.len())
            .field("current", &self.current)
            .field("clock", &self.clock)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
