#![forbid(unsafe_code)]

pub mod certificate;
pub mod delivery;
pub mod error;
pub mod sessions;

pub use assess_core::Clock;
pub use sessions as session;

pub use certificate::{Certificate, CertificateSink};
pub use delivery::{DispatchOutcome, LogSink, PersistenceSink, ResultSink, SubmissionPayload};
pub use error::{AssessmentError, RunnerError, SessionError, SinkError};

pub use sessions::{
    AssessmentService, CurrentQuestion, Finalized, Phase, ResultHistoryService, ResultId,
    ResultListItem, RunnerSnapshot, SessionHandle, SessionProgress, SessionResults,
    SessionRunner, TestSession, TickOutcome,
};
