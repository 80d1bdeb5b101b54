//! Line-oriented terminal front end for a test session.

use std::io::Write as _;

use assess_core::ReportEntry;
use assess_core::format_countdown;
use assess_core::model::{CandidateInfo, OptionLetter};
use services::{
    AssessmentService, Certificate, CurrentQuestion, RunnerError, SessionHandle,
    SessionProgress, SessionRunner, SubmissionPayload,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

type Input = Lines<BufReader<Stdin>>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Select(OptionLetter),
    Next,
    Previous,
    TogglePause,
    Submit,
    Status,
    Help,
    Show,
    Unknown(String),
}

fn parse_action(line: &str) -> Action {
    let trimmed = line.trim();
    let mut chars = trimmed.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if let Some(letter) = OptionLetter::from_char(c) {
            return Action::Select(letter);
        }
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "" => Action::Show,
        "n" | "next" => Action::Next,
        "p" | "prev" | "previous" => Action::Previous,
        "pause" | "resume" => Action::TogglePause,
        "submit" => Action::Submit,
        "status" => Action::Status,
        "h" | "help" | "?" => Action::Help,
        _ => Action::Unknown(trimmed.to_owned()),
    }
}

fn print_help() {
    println!("Commands: a/b/c/d select, n next, p previous, pause (toggle), status, submit, help");
}

fn prompt(progress: &SessionProgress) {
    let state = if progress.paused { " PAUSED" } else { "" };
    print!(
        "[{} left{state} | {}/{} answered] > ",
        format_countdown(progress.remaining_seconds),
        progress.answered,
        progress.total
    );
    let _ = std::io::stdout().flush();
}

fn print_question(current: &CurrentQuestion) {
    let question = &current.question;
    println!();
    match question.category() {
        Some(category) => println!("Question {} of {} ({category})", current.index + 1, current.total),
        None => println!("Question {} of {}", current.index + 1, current.total),
    }
    println!("{}. {}", question.number(), question.text());
    for option in question.options() {
        let mark = if current.selected == Some(option.letter) { "x" } else { " " };
        println!("  [{mark}] {}", option.label());
    }
}

async fn read_line(lines: &mut Input) -> Result<Option<String>, Box<dyn std::error::Error>> {
    Ok(lines.next_line().await?)
}

async fn collect_candidate(
    lines: &mut Input,
    mut candidate: CandidateInfo,
) -> Result<CandidateInfo, Box<dyn std::error::Error>> {
    let fields = [
        ("Full name", &mut candidate.name),
        ("Email", &mut candidate.email),
        ("Phone", &mut candidate.phone),
        ("Branch", &mut candidate.branch),
        ("Skill level", &mut candidate.skill_level),
    ];
    for (label, value) in fields {
        while value.trim().is_empty() {
            print!("{label}: ");
            let _ = std::io::stdout().flush();
            let Some(line) = read_line(lines).await? else {
                return Err("input closed before candidate details were complete".into());
            };
            *value = line.trim().to_owned();
        }
    }
    Ok(candidate)
}

async fn show_current(handle: &SessionHandle) -> Result<(), RunnerError> {
    if let Some(current) = handle.current().await? {
        print_question(&current);
    }
    Ok(())
}

/// Report a rejected command without ending the session.
fn soft<T>(result: Result<T, RunnerError>) -> Result<Option<T>, RunnerError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(RunnerError::Session(err)) => {
            println!("{err}");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Run one session on stdin/stdout from candidate entry to the results screen.
pub async fn drive(
    service: &AssessmentService,
    candidate: CandidateInfo,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let mut session = service.prepare_session().await?;
    println!(
        "Knowledge assessment: {} questions, time limit {}.",
        session.bank().len(),
        format_countdown(session.clock().total_seconds())
    );
    let candidate = collect_candidate(&mut lines, candidate).await?;
    session.start(candidate)?;

    let handle = SessionRunner::spawn(session);
    print_help();
    show_current(&handle).await?;

    loop {
        prompt(&handle.progress());
        tokio::select! {
            line = read_line(&mut lines) => {
                let Some(line) = line? else {
                    println!();
                    println!("Input closed; submitting.");
                    handle.submit().await?;
                    break;
                };
                match parse_action(&line) {
                    Action::Select(letter) => {
                        if soft(handle.select(letter).await)?.is_some() {
                            let current = handle.current().await?;
                            if let Some(current) = current {
                                print_question(&current);
                                if current.is_last() {
                                    println!("That was the last question. Type 'submit' to finish.");
                                }
                            }
                        }
                    }
                    Action::Next => {
                        handle.next().await?;
                        show_current(&handle).await?;
                    }
                    Action::Previous => {
                        handle.previous().await?;
                        show_current(&handle).await?;
                    }
                    Action::TogglePause => {
                        if let Some(paused) = soft(handle.toggle_pause().await)? {
                            if paused {
                                println!("Paused. The clock is stopped; type 'resume' to continue.");
                            } else {
                                println!("Resumed.");
                                show_current(&handle).await?;
                            }
                        }
                    }
                    Action::Submit => {
                        handle.submit().await?;
                        break;
                    }
                    Action::Status => {
                        let p = handle.progress();
                        println!(
                            "{}% through, {} of {} answered, {} pauses, {} left",
                            p.percent_complete,
                            p.answered,
                            p.total,
                            p.pause_count,
                            format_countdown(p.remaining_seconds)
                        );
                    }
                    Action::Help => print_help(),
                    Action::Show => show_current(&handle).await?,
                    Action::Unknown(raw) => println!("unknown command: {raw} (type 'help')"),
                }
            }
            results = handle.wait_submitted() => {
                results?;
                println!();
                println!("Time is up. Your test has been submitted.");
                break;
            }
        }
    }

    let mut session = handle.close().await?;
    let finalized = service.finalize(&mut session).await?;
    print_results(&finalized.payload);
    if let Some(outcome) = &finalized.dispatch {
        for (sink, err) in &outcome.failed {
            eprintln!("warning: {sink} could not record this result: {err}");
        }
    }
    Ok(())
}

fn print_results(payload: &SubmissionPayload) {
    let summary = &payload.summary;
    println!();
    println!("==================== RESULTS ====================");
    println!("Candidate:  {} <{}>", payload.candidate.name, payload.candidate.email);
    println!("Branch:     {}", payload.candidate.branch);
    println!("Level:      {}", payload.candidate.skill_level);
    println!("Score:      {summary}");
    println!(
        "Time taken: {}   Pauses: {}",
        format_countdown(payload.time_taken_seconds),
        payload.pause_count
    );
    if summary.passed() {
        println!("Congratulations, you passed.");
    } else {
        println!("A score of 70% is required to pass.");
    }
    println!();
    println!("{}", Certificate::from_payload(payload));
    print_report(&payload.report);
}

pub fn print_report(entries: &[ReportEntry]) {
    if entries.is_empty() {
        println!("Perfect score: no missed questions.");
        return;
    }
    println!();
    println!("Missed questions ({}):", entries.len());
    for entry in entries {
        println!();
        println!("Q{}: {}", entry.question_number, entry.question_text);
        println!("  Your answer:    {}", entry.user_answer_label);
        println!("  Correct answer: {}", entry.correct_answer_label);
        println!("  Explanation:    {}", entry.explanation_text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_letters_case_insensitively() {
        assert_eq!(parse_action("b"), Action::Select(OptionLetter::B));
        assert_eq!(parse_action(" D \n"), Action::Select(OptionLetter::D));
    }

    #[test]
    fn parses_navigation_and_control() {
        assert_eq!(parse_action("n"), Action::Next);
        assert_eq!(parse_action("Previous"), Action::Previous);
        assert_eq!(parse_action("resume"), Action::TogglePause);
        assert_eq!(parse_action("submit"), Action::Submit);
        assert_eq!(parse_action(""), Action::Show);
        assert_eq!(parse_action("e"), Action::Unknown("e".into()));
    }
}
