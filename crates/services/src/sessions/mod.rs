mod progress;
mod runner;
mod service;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use progress::{CurrentQuestion, Phase, SessionProgress};
pub use runner::{RunnerSnapshot, SessionHandle, SessionRunner};
pub use service::{SessionResults, TestSession, TickOutcome};
pub use view::{ResultHistoryService, ResultId, ResultListItem};
pub use workflow::{AssessmentService, Finalized};
