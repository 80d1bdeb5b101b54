use std::sync::Arc;
use std::time::Duration;

use assess_core::model::{AnswerOption, CandidateInfo, OptionLetter, Question, QuestionBank};
use assess_core::time::fixed_clock;
use assess_core::{DEFAULT_EXPLANATION, ExplanationTable, NO_ANSWER_LABEL, SessionConfig};
use async_trait::async_trait;
use services::{
    AssessmentService, LogSink, PersistenceSink, Phase, ResultHistoryService, ResultSink,
    RunnerError, SessionError, SessionRunner, SinkError, SubmissionPayload,
};
use storage::repository::{InMemoryRepository, ResultRepository};

fn bank(count: u32) -> QuestionBank {
    let questions = (1..=count)
        .map(|n| {
            let options = vec![
                AnswerOption::new(OptionLetter::A, "Stator"),
                AnswerOption::new(OptionLetter::B, "Rotor"),
                AnswerOption::new(OptionLetter::C, "Exciter"),
                AnswerOption::new(OptionLetter::D, "Governor"),
            ];
            Question::new(n, None, format!("Question {n}"), options, OptionLetter::B).unwrap()
        })
        .collect();
    QuestionBank::new(questions).unwrap()
}

fn candidate() -> CandidateInfo {
    CandidateInfo::new(
        "Grace Hopper",
        "grace@example.com",
        "555-0142",
        "Houston, TX",
        "Level 2",
    )
}

fn service(repo: &InMemoryRepository, total_seconds: u32) -> AssessmentService {
    let mut explanations = ExplanationTable::new();
    explanations.insert(assess_core::model::QuestionNumber::new(1), "Rotor turns.");
    AssessmentService::new(fixed_clock(), Arc::new(repo.clone()))
        .with_explanations(Arc::new(explanations))
        .with_config(SessionConfig::default().with_total_seconds(total_seconds))
        .with_sink(Arc::new(LogSink))
        .with_sink(Arc::new(PersistenceSink::new(Arc::new(repo.clone()))))
}

struct OfflineMailer;

#[async_trait]
impl ResultSink for OfflineMailer {
    fn name(&self) -> &'static str {
        "mailer"
    }

    async fn deliver(&self, _payload: &SubmissionPayload) -> Result<(), SinkError> {
        Err(SinkError::Rejected("smtp unreachable".into()))
    }
}

#[tokio::test]
async fn seventy_of_hundred_passes_with_thirty_reported() {
    let repo = InMemoryRepository::with_bank(bank(100));
    let service = service(&repo, 5400);
    let mut session = service.start_session(candidate()).await.unwrap();

    for i in 0..100 {
        let letter = if i < 70 { OptionLetter::B } else { OptionLetter::D };
        session.select_answer(letter).unwrap();
        session.next();
    }

    let finalized = service.finalize(&mut session).await.unwrap();
    let summary = finalized.payload.summary;
    assert_eq!(summary.correct_count(), 70);
    assert_eq!(summary.percentage_tenths(), 700);
    assert!(summary.passed());
    assert_eq!(finalized.payload.report.len(), 30);
    assert_eq!(
        summary.correct_count() as usize + finalized.payload.report.len(),
        summary.total_count() as usize
    );
}

#[tokio::test]
async fn unanswered_test_fails_with_every_question_reported() {
    let repo = InMemoryRepository::with_bank(bank(4));
    let service = service(&repo, 5400);
    let mut session = service.start_session(candidate()).await.unwrap();

    let finalized = service.finalize(&mut session).await.unwrap();
    let payload = finalized.payload;
    assert_eq!(payload.summary.correct_count(), 0);
    assert_eq!(payload.summary.percentage_tenths(), 0);
    assert!(!payload.summary.passed());
    assert_eq!(payload.report.len(), 4);
    assert!(payload.report.iter().all(|e| e.user_answer_label == NO_ANSWER_LABEL));
    assert_eq!(payload.report[0].explanation_text, "Rotor turns.");
    assert_eq!(payload.report[1].explanation_text, DEFAULT_EXPLANATION);
    assert_eq!(payload.report[0].correct_answer_label, "B - Rotor");
}

#[tokio::test]
async fn pause_cycles_only_count_running_ticks() {
    let repo = InMemoryRepository::with_bank(bank(3));
    let mut session = service(&repo, 5400).start_session(candidate()).await.unwrap();

    for _ in 0..3 {
        for _ in 0..10 {
            session.tick(1).unwrap();
        }
        session.toggle_pause().unwrap();
        assert_eq!(session.select_answer(OptionLetter::B), Err(SessionError::Paused));
        session.tick(1).unwrap();
        session.toggle_pause().unwrap();
    }

    assert_eq!(session.clock().remaining_seconds(), 5370);
    assert_eq!(session.clock().pause_count(), 3);
    assert!(session.answers().is_empty());
}

#[tokio::test]
async fn timeout_submits_and_reports_unanswered() {
    let repo = InMemoryRepository::with_bank(bank(8));
    let service = service(&repo, 30);
    let mut session = service.start_session(candidate()).await.unwrap();

    for _ in 0..3 {
        session.select_answer(OptionLetter::B).unwrap();
        session.next();
    }
    for _ in 0..30 {
        session.tick(1).unwrap();
    }

    assert_eq!(session.phase(), Phase::Submitted);
    let finalized = service.finalize(&mut session).await.unwrap();
    assert!(finalized.payload.timed_out);
    assert_eq!(finalized.payload.time_taken_seconds, 30);
    assert_eq!(finalized.payload.report.len(), 5);
    assert!(finalized.payload.report.iter().all(|e| e.is_unanswered()));
}

#[tokio::test]
async fn failing_sink_does_not_lose_results() {
    let repo = InMemoryRepository::with_bank(bank(2));
    let service = service(&repo, 600).with_sink(Arc::new(OfflineMailer));
    let mut session = service.start_session(candidate()).await.unwrap();
    session.select_answer(OptionLetter::B).unwrap();

    let finalized = service.finalize(&mut session).await.unwrap();
    let outcome = finalized.dispatch.unwrap();
    assert_eq!(outcome.delivered, ["log", "persistence"]);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].0, "mailer");

    assert!(session.results().is_some());
    assert_eq!(finalized.payload.summary.correct_count(), 1);

    let history = ResultHistoryService::new(Arc::new(repo.clone()));
    let items = history.list_recent(5).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "Grace Hopper");
    assert_eq!(items[0].session_id, finalized.payload.session_id);

    let stored = repo.get_result(items[0].id).await.unwrap();
    assert_eq!(stored.incorrect, finalized.payload.report);
}

#[tokio::test(start_paused = true)]
async fn runner_auto_submits_when_time_runs_out() {
    let repo = InMemoryRepository::with_bank(bank(5));
    let session = service(&repo, 10).start_session(candidate()).await.unwrap();
    let handle = SessionRunner::spawn(session);

    handle.select(OptionLetter::B).await.unwrap();
    let results = handle.wait_submitted().await.unwrap();

    assert!(results.timed_out);
    assert_eq!(results.time_taken_seconds, 10);
    assert_eq!(results.summary.correct_count(), 1);
    assert_eq!(handle.progress().phase, Phase::Submitted);
    assert!(matches!(
        handle.select(OptionLetter::A).await,
        Err(RunnerError::Session(SessionError::NotInProgress))
    ));

    let session = handle.close().await.unwrap();
    assert_eq!(session.clock().remaining_seconds(), 0);
}

#[tokio::test(start_paused = true)]
async fn runner_pause_stops_the_clock() {
    let repo = InMemoryRepository::with_bank(bank(3));
    let session = service(&repo, 100).start_session(candidate()).await.unwrap();
    let handle = SessionRunner::spawn(session);

    assert!(handle.toggle_pause().await.unwrap());
    assert!(matches!(
        handle.select(OptionLetter::B).await,
        Err(RunnerError::Session(SessionError::Paused))
    ));
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(!handle.toggle_pause().await.unwrap());
    tokio::time::sleep(Duration::from_secs(2)).await;

    let session = handle.close().await.unwrap();
    assert_eq!(session.clock().remaining_seconds(), 98);
    assert_eq!(session.clock().pause_count(), 1);
    assert!(session.answers().is_empty());
}

#[tokio::test(start_paused = true)]
async fn runner_charges_running_time_between_rapid_pauses() {
    let repo = InMemoryRepository::with_bank(bank(3));
    let session = service(&repo, 1000).start_session(candidate()).await.unwrap();
    let handle = SessionRunner::spawn(session);

    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(900)).await;
        assert!(handle.toggle_pause().await.unwrap());
        assert!(!handle.toggle_pause().await.unwrap());
    }

    let session = handle.close().await.unwrap();
    assert_eq!(session.clock().remaining_seconds(), 910);
    assert_eq!(session.clock().pause_count(), 100);
}

#[tokio::test(start_paused = true)]
async fn runner_navigation_and_manual_submit() {
    let repo = InMemoryRepository::with_bank(bank(3));
    let service = service(&repo, 600);
    let session = service.start_session(candidate()).await.unwrap();
    let handle = SessionRunner::spawn(session);

    assert_eq!(handle.previous().await.unwrap(), 0);
    handle.select(OptionLetter::B).await.unwrap();
    assert_eq!(handle.next().await.unwrap(), 1);
    handle.select(OptionLetter::C).await.unwrap();
    let current = handle.current().await.unwrap().unwrap();
    assert_eq!(current.index, 1);
    assert_eq!(current.selected, Some(OptionLetter::C));

    let submitted = handle.submit().await.unwrap();
    let again = handle.submit().await.unwrap();
    assert_eq!(submitted, again);
    assert!(!submitted.timed_out);
    assert_eq!(submitted.summary.correct_count(), 1);
    assert!(handle.current().await.unwrap().is_none());

    let mut session = handle.close().await.unwrap();
    let finalized = service.finalize(&mut session).await.unwrap();
    assert_eq!(finalized.payload.answers.len(), 2);
    assert_eq!(repo.list_recent_results(10).await.unwrap().len(), 1);
}
