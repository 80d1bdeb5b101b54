use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use assess_core::model::{CandidateInfo, OptionLetter};
use assess_core::{ExplanationLookup, ExplanationTable, SessionConfig, format_countdown};
use services::{
    AssessmentService, CertificateSink, Clock, LogSink, PersistenceSink, ResultHistoryService,
};
use storage::repository::{QuestionSource, Storage};
use storage::{JsonQuestionFile, load_explanations};
use tracing_subscriber::EnvFilter;

mod terminal;

const DEFAULT_QUESTIONS: &str = "data/questions.json";
const DEFAULT_DB_URL: &str = "sqlite://assess.sqlite3";
const DEFAULT_RESULT_LIMIT: u32 = 20;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidTimeLimit { raw: String },
    InvalidNumber { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidTimeLimit { raw } => {
                write!(f, "invalid --time-limit value: {raw} (expected seconds > 0)")
            }
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  assess run     [--questions <path>] [--explanations <path>] [--db <sqlite_url>]");
    eprintln!("                 [--time-limit <secs>] [--name <s>] [--email <s>] [--phone <s>]");
    eprintln!("                 [--branch <s>] [--skill-level <s>] [--certificates <dir>]");
    eprintln!("  assess check   [--questions <path>] [--explanations <path>]");
    eprintln!("  assess results [--db <sqlite_url>] [--limit <n>] [--id <n>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --questions {DEFAULT_QUESTIONS}");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!("  --time-limit 4500 (75 minutes)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  ASSESS_QUESTIONS, ASSESS_EXPLANATIONS, ASSESS_DB_URL, ASSESS_TIME_LIMIT_SECS,");
    eprintln!("  ASSESS_CERTIFICATE_DIR, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run,
    Check,
    Results,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "run" => Some(Self::Run),
            "check" => Some(Self::Check),
            "results" => Some(Self::Results),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    questions: PathBuf,
    explanations: Option<PathBuf>,
    db_url: String,
    certificate_dir: Option<PathBuf>,
    config: SessionConfig,
    candidate: CandidateInfo,
    limit: u32,
    result_id: Option<i64>,
}

fn parse_time_limit(raw: String) -> Result<u32, ArgsError> {
    match raw.trim().parse::<u32>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ArgsError::InvalidTimeLimit { raw }),
    }
}

impl Args {
    fn from_env() -> Result<Self, ArgsError> {
        let mut config = SessionConfig::default();
        if let Ok(raw) = std::env::var("ASSESS_TIME_LIMIT_SECS") {
            config = config.with_total_seconds(parse_time_limit(raw)?);
        }
        Ok(Self {
            questions: std::env::var("ASSESS_QUESTIONS")
                .map_or_else(|_| PathBuf::from(DEFAULT_QUESTIONS), PathBuf::from),
            explanations: std::env::var("ASSESS_EXPLANATIONS").ok().map(PathBuf::from),
            db_url: std::env::var("ASSESS_DB_URL")
                .ok()
                .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url),
            certificate_dir: std::env::var("ASSESS_CERTIFICATE_DIR").ok().map(PathBuf::from),
            config,
            candidate: CandidateInfo::default(),
            limit: DEFAULT_RESULT_LIMIT,
            result_id: None,
        })
    }

    fn parse(cmd: Command, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::from_env()?;

        while let Some(arg) = args.next() {
            match (cmd, arg.as_str()) {
                (Command::Run | Command::Check, "--questions") => {
                    parsed.questions = require_value(args, "--questions")?.into();
                }
                (Command::Run | Command::Check, "--explanations") => {
                    parsed.explanations = Some(require_value(args, "--explanations")?.into());
                }
                (Command::Run | Command::Results, "--db") => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                (Command::Run, "--time-limit") => {
                    let secs = parse_time_limit(require_value(args, "--time-limit")?)?;
                    parsed.config = parsed.config.with_total_seconds(secs);
                }
                (Command::Run, "--certificates") => {
                    parsed.certificate_dir = Some(require_value(args, "--certificates")?.into());
                }
                (Command::Run, "--name") => parsed.candidate.name = require_value(args, "--name")?,
                (Command::Run, "--email") => {
                    parsed.candidate.email = require_value(args, "--email")?;
                }
                (Command::Run, "--phone") => {
                    parsed.candidate.phone = require_value(args, "--phone")?;
                }
                (Command::Run, "--branch") => {
                    parsed.candidate.branch = require_value(args, "--branch")?;
                }
                (Command::Run, "--skill-level") => {
                    parsed.candidate.skill_level = require_value(args, "--skill-level")?;
                }
                (Command::Results, "--limit") => {
                    let value = require_value(args, "--limit")?;
                    parsed.limit = value.parse().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--limit",
                        raw: value.clone(),
                    })?;
                }
                (Command::Results, "--id") => {
                    let value = require_value(args, "--id")?;
                    parsed.result_id = Some(value.parse().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--id",
                        raw: value.clone(),
                    })?);
                }
                (_, "--help" | "-h") => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    async fn explanation_table(&self) -> Result<ExplanationTable, Box<dyn std::error::Error>> {
        match &self.explanations {
            Some(path) => Ok(load_explanations(path).await?),
            None => Ok(ExplanationTable::new()),
        }
    }
}

/// Turn a bare path or `sqlite:` path into an absolute `sqlite://` URL.
fn normalize_sqlite_url(raw: String) -> String {
    let raw = raw.trim();
    if ["sqlite://", "sqlite::memory:", "sqlite:file:"]
        .iter()
        .any(|prefix| raw.starts_with(prefix))
    {
        return raw.to_owned();
    }
    let path = PathBuf::from(raw.strip_prefix("sqlite:").unwrap_or(raw));
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Filesystem path of a file-backed database URL, without query parameters.
fn db_file_path(db_url: &str) -> Option<&str> {
    if db_url.starts_with("sqlite::memory:") || db_url.contains("mode=memory") {
        return None;
    }
    db_url
        .strip_prefix("sqlite://")
        .or_else(|| db_url.strip_prefix("sqlite:file:"))
        .and_then(|rest| rest.split('?').next())
        .filter(|path| !path.is_empty())
}

/// Make sure the directory holding a file-backed database exists.
fn ensure_db_dir(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url.starts_with("sqlite::memory:") || db_url.contains("mode=memory") {
        return Ok(());
    }
    let path = db_file_path(db_url).ok_or_else(|| ArgsError::InvalidDbUrl {
        raw: db_url.to_string(),
    })?;
    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

async fn open_storage(
    db_url: &str,
    questions: Arc<dyn QuestionSource>,
) -> Result<Storage, Box<dyn std::error::Error>> {
    ensure_db_dir(db_url)?;
    Ok(Storage::sqlite(db_url, questions).await?)
}

// ─── COMMANDS ────────────────────────────────────────────────────────────────

async fn run_session(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let questions: Arc<dyn QuestionSource> = Arc::new(JsonQuestionFile::new(&args.questions));
    let explanations: Arc<dyn ExplanationLookup> = Arc::new(args.explanation_table().await?);
    let storage = open_storage(&args.db_url, Arc::clone(&questions)).await?;

    let mut service = AssessmentService::new(Clock::default(), questions)
        .with_explanations(explanations)
        .with_config(args.config)
        .with_sink(Arc::new(PersistenceSink::new(Arc::clone(&storage.results))))
        .with_sink(Arc::new(LogSink));
    if let Some(dir) = &args.certificate_dir {
        service = service.with_sink(Arc::new(CertificateSink::new(dir)));
    }

    terminal::drive(&service, args.candidate).await
}

async fn check_bank(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let source = JsonQuestionFile::new(&args.questions);
    let bank = source.load_bank().await?;
    let explanations = args.explanation_table().await?;

    println!("{}: {} questions", source.path().display(), bank.len());
    let dist = bank.answer_distribution();
    for letter in OptionLetter::ALL {
        println!("  correct = {letter}: {}", dist.get(letter));
    }

    if args.explanations.is_some() {
        let missing: Vec<String> = bank
            .questions()
            .iter()
            .filter(|q| !explanations.contains(q.number()))
            .map(|q| q.number().to_string())
            .collect();
        if missing.is_empty() {
            println!("explanations: all {} questions covered", bank.len());
        } else {
            println!(
                "explanations: {} questions use the default text ({})",
                missing.len(),
                missing.join(", ")
            );
        }
    }
    Ok(())
}

async fn list_results(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let questions: Arc<dyn QuestionSource> = Arc::new(JsonQuestionFile::new(&args.questions));
    let storage = open_storage(&args.db_url, questions).await?;
    let history = ResultHistoryService::new(Arc::clone(&storage.results));

    if let Some(id) = args.result_id {
        let record = history.get(id).await?;
        println!(
            "#{id} {} <{}> {} / {}",
            record.candidate.name,
            record.candidate.email,
            record.candidate.branch,
            record.candidate.skill_level
        );
        println!("  score: {}", record.summary);
        println!(
            "  time: {}  pauses: {}  completed: {}",
            format_countdown(record.time_taken_seconds),
            record.pause_count,
            record.completed_at.to_rfc3339()
        );
        terminal::print_report(&record.incorrect);
        return Ok(());
    }

    let items = history.list_recent(args.limit).await?;
    if items.is_empty() {
        println!("no results recorded yet");
        return Ok(());
    }
    for item in items {
        println!(
            "#{:<4} {:<24} {:>3}/{:<3} {:>5.1}% {:<10} {:>6}  {}",
            item.id,
            item.name,
            item.correct,
            item.total,
            f64::from(item.percentage_tenths) / 10.0,
            if item.passed { "PASSED" } else { "NOT PASSED" },
            format_countdown(item.time_taken_seconds),
            item.completed_at.format("%Y-%m-%d %H:%M"),
        );
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: start a session when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Run,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Run,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(cmd, &mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    match cmd {
        Command::Run => run_session(parsed).await,
        Command::Check => check_bank(parsed).await,
        Command::Results => list_results(parsed).await,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
