#![forbid(unsafe_code)]

pub mod config;
pub mod countdown;
pub mod error;
pub mod explanations;
pub mod model;
pub mod report;
pub mod scoring;
pub mod time;

pub use config::SessionConfig;
pub use countdown::{SessionClock, format_countdown};
pub use error::Error;
pub use explanations::{DEFAULT_EXPLANATION, ExplanationLookup, ExplanationTable};
pub use report::{NO_ANSWER_LABEL, ReportEntry, build_report};
pub use scoring::{score, score_with_threshold};
pub use time::Clock;
