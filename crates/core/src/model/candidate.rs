use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identity field on the candidate form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateField {
    Name,
    Email,
    Phone,
    Branch,
    SkillLevel,
}

impl fmt::Display for CandidateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Branch => "branch",
            Self::SkillLevel => "skill level",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CandidateError {
    #[error("missing required fields: {}", join_fields(.0))]
    MissingFields(Vec<CandidateField>),
}

fn join_fields(fields: &[CandidateField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Who is taking the test. The values are opaque to scoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub branch: String,
    pub skill_level: String,
}

impl CandidateInfo {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        branch: impl Into<String>,
        skill_level: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            branch: branch.into(),
            skill_level: skill_level.into(),
        }
    }

    /// Check that every field has non-whitespace content.
    ///
    /// # Errors
    ///
    /// Returns `CandidateError::MissingFields` listing every blank field.
    pub fn validate(&self) -> Result<(), CandidateError> {
        let missing: Vec<CandidateField> = [
            (CandidateField::Name, &self.name),
            (CandidateField::Email, &self.email),
            (CandidateField::Phone, &self.phone),
            (CandidateField::Branch, &self.branch),
            (CandidateField::SkillLevel, &self.skill_level),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CandidateError::MissingFields(missing))
        }
    }

    /// Copy with surrounding whitespace removed from every field.
    #[must_use]
    pub fn trimmed(&self) -> Self {
        Self::new(
            self.name.trim(),
            self.email.trim(),
            self.phone.trim(),
            self.branch.trim(),
            self.skill_level.trim(),
        )
    }
}
