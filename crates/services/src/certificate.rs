//! Completion certificates.
//!
//! A certificate is issued for every submitted session, passed or not. The
//! plain-text rendering is what the terminal prints and what
//! `CertificateSink` writes to disk.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::fmt;
use std::path::{Path, PathBuf};

use assess_core::model::SessionId;

use crate::delivery::{ResultSink, SubmissionPayload};
use crate::error::SinkError;

pub const CERTIFICATE_TITLE: &str = "CERTIFICATE OF COMPLETION";
pub const CERTIFICATE_SUBTITLE: &str = "Generator Technician Knowledge Test";
pub const CERTIFICATE_ISSUER: &str = "Generator Source";

/// Content of a completion certificate, derived from a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub session_id: SessionId,
    pub name: String,
    pub branch: String,
    pub skill_level: String,
    pub correct: u32,
    pub total: u32,
    pub percentage_tenths: u32,
    /// Completion date in UTC.
    pub date: NaiveDate,
    pub passed: bool,
}

impl Certificate {
    #[must_use]
    pub fn from_payload(payload: &SubmissionPayload) -> Self {
        let summary = &payload.summary;
        Self {
            session_id: payload.session_id,
            name: payload.candidate.name.clone(),
            branch: payload.candidate.branch.clone(),
            skill_level: payload.candidate.skill_level.clone(),
            correct: summary.correct_count(),
            total: summary.total_count(),
            percentage_tenths: summary.percentage_tenths(),
            date: payload.completed_at.date_naive(),
            passed: summary.passed(),
        }
    }

    #[must_use]
    pub fn status(&self) -> &'static str {
        if self.passed { "PASSED" } else { "NOT PASSED" }
    }

    /// File name used when the certificate is written to a directory.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("certificate-{}.txt", self.session_id)
    }

    /// The certificate as centred plain-text lines.
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let score = format!(
            "Score: {} out of {} ({}.{}%)",
            self.correct,
            self.total,
            self.percentage_tenths / 10,
            self.percentage_tenths % 10
        );
        let branch = format!("Branch: {}", self.branch);
        let level = format!("Skill Level: {}", self.skill_level);
        let date = format!("Date: {}", self.date.format("%Y-%m-%d"));

        let lines = [
            CERTIFICATE_TITLE,
            CERTIFICATE_SUBTITLE,
            "",
            "This certificate is presented to",
            self.name.as_str(),
            "",
            score.as_str(),
            branch.as_str(),
            level.as_str(),
            date.as_str(),
            "",
            self.status(),
            "",
            CERTIFICATE_ISSUER,
        ];
        let width = lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        let rule = "=".repeat(width);

        writeln!(f, "{rule}")?;
        for line in lines {
            writeln!(f, "{}", format!("{line:^width$}").trim_end())?;
        }
        write!(f, "{rule}")
    }
}

/// Writes one plain-text certificate per submission into a directory.
#[derive(Debug, Clone)]
pub struct CertificateSink {
    dir: PathBuf,
}

impl CertificateSink {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ResultSink for CertificateSink {
    fn name(&self) -> &'static str {
        "certificate"
    }

    async fn deliver(&self, payload: &SubmissionPayload) -> Result<(), SinkError> {
        let certificate = Certificate::from_payload(payload);
        let path = self.dir.join(certificate.file_name());
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, format!("{certificate}\n")).await?;
        tracing::debug!(
            session = %payload.session_id,
            path = %path.display(),
            passed = certificate.passed,
            "certificate written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assess_core::model::{AnswerSet, CandidateInfo, ScoreSummary};
    use assess_core::time::fixed_now;

    fn payload(correct: u32, total: u32) -> SubmissionPayload {
        SubmissionPayload {
            session_id: SessionId::generate(),
            candidate: CandidateInfo::new(
                "Ada Lovelace",
                "ada@example.com",
                "555",
                "Austin, TX",
                "Level 3",
            ),
            summary: ScoreSummary::from_counts(correct, total, 700).unwrap(),
            report: Vec::new(),
            time_taken_seconds: 1200,
            pause_count: 0,
            started_at: fixed_now(),
            completed_at: fixed_now(),
            timed_out: false,
            answers: AnswerSet::new(),
        }
    }

    fn trimmed_lines(text: &str) -> Vec<&str> {
        text.lines().map(str::trim).collect()
    }

    #[test]
    fn passing_certificate_renders_every_line() {
        let certificate = Certificate::from_payload(&payload(85, 100));
        let text = certificate.render();
        let lines = trimmed_lines(&text);
        let date = format!("Date: {}", fixed_now().format("%Y-%m-%d"));

        assert!(lines[0].chars().all(|c| c == '='));
        assert_eq!(lines[1], CERTIFICATE_TITLE);
        assert_eq!(lines[2], CERTIFICATE_SUBTITLE);
        assert!(lines.contains(&"This certificate is presented to"));
        assert!(lines.contains(&"Ada Lovelace"));
        assert!(lines.contains(&"Score: 85 out of 100 (85.0%)"));
        assert!(lines.contains(&"Branch: Austin, TX"));
        assert!(lines.contains(&"Skill Level: Level 3"));
        assert!(lines.contains(&date.as_str()));
        assert!(lines.contains(&"PASSED"));
        assert!(!lines.contains(&"NOT PASSED"));
        assert_eq!(lines[lines.len() - 2], CERTIFICATE_ISSUER);
    }

    #[test]
    fn failing_certificate_is_still_issued() {
        let certificate = Certificate::from_payload(&payload(2, 3));
        assert!(!certificate.passed);
        assert_eq!(certificate.percentage_tenths, 667);

        let text = certificate.render();
        let lines = trimmed_lines(&text);
        assert!(lines.contains(&"Score: 2 out of 3 (66.7%)"));
        assert!(lines.contains(&"NOT PASSED"));
        assert!(!lines.contains(&"PASSED"));
    }

    #[test]
    fn lines_are_centred_within_the_rule() {
        let text = Certificate::from_payload(&payload(7, 10)).render();
        let width = text.lines().next().unwrap().chars().count();
        for line in text.lines() {
            assert!(line.chars().count() <= width);
        }
        let title = text.lines().nth(1).unwrap();
        let indent = title.len() - title.trim_start().len();
        assert_eq!(indent, (width - CERTIFICATE_TITLE.len()) / 2);
    }

    #[tokio::test]
    async fn sink_writes_one_file_per_session() {
        let payload = payload(70, 100);
        let dir = std::env::temp_dir().join(format!("assess-certs-{}", payload.session_id));
        let sink = CertificateSink::new(&dir);

        sink.deliver(&payload).await.unwrap();

        let certificate = Certificate::from_payload(&payload);
        let written = tokio::fs::read_to_string(dir.join(certificate.file_name()))
            .await
            .unwrap();
        assert_eq!(written, format!("{certificate}\n"));
        assert!(written.contains("Score: 70 out of 100 (70.0%)"));
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
