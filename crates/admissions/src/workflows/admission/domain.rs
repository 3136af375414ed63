use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::workflows::scheduling::domain::UserId;

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EvaluationId(pub String);

impl fmt::Display for EvaluationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of an admission application, persisted as its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Pending,
    UnderReview,
    InterviewScheduled,
    ExamScheduled,
    DocumentsRequested,
    Approved,
    Rejected,
    Waitlist,
    Archived,
}

impl ApplicationStatus {
    pub const fn ordered() -> [Self; 9] {
        [
            Self::Pending,
            Self::UnderReview,
            Self::InterviewScheduled,
            Self::ExamScheduled,
            Self::DocumentsRequested,
            Self::Approved,
            Self::Rejected,
            Self::Waitlist,
            Self::Archived,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::UnderReview => "UNDER_REVIEW",
            Self::InterviewScheduled => "INTERVIEW_SCHEDULED",
            Self::ExamScheduled => "EXAM_SCHEDULED",
            Self::DocumentsRequested => "DOCUMENTS_REQUESTED",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Waitlist => "WAITLIST",
            Self::Archived => "ARCHIVED",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Approved | Self::Rejected | Self::Waitlist | Self::Archived
        )
    }

    /// Committee outcomes reached from `EXAM_SCHEDULED`.
    pub const fn is_decision(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Waitlist)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raised when a persisted or submitted status label is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown application status '{0}'")]
pub struct InvalidStatus(pub String);

impl FromStr for ApplicationStatus {
    type Err = InvalidStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        Self::ordered()
            .into_iter()
            .find(|status| status.label() == normalized)
            .ok_or_else(|| InvalidStatus(raw.to_string()))
    }
}

/// Applicant summary; full student records live in the enrollment system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentSummary {
    pub full_name: String,
    pub grade_applied: String,
    pub birth_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianContact {
    pub full_name: String,
    pub relationship: String,
    pub email: String,
}

/// Repository record for an admission application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub status: ApplicationStatus,
    pub student: StudentSummary,
    pub guardians: Vec<GuardianContact>,
    /// Maintained by the document service; drives `DOCUMENTS_REQUESTED`.
    pub documents_complete: bool,
    pub submitted_on: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationType {
    LanguageExam,
    MathematicsExam,
    EnglishExam,
    PsychologicalInterview,
    CycleDirectorReport,
    CycleDirectorInterview,
}

impl EvaluationType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::LanguageExam => "language exam",
            Self::MathematicsExam => "mathematics exam",
            Self::EnglishExam => "english exam",
            Self::PsychologicalInterview => "psychological interview",
            Self::CycleDirectorReport => "cycle director report",
            Self::CycleDirectorInterview => "cycle director interview",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationStatus {
    Pending,
    InProgress,
    Completed,
    Reviewed,
}

impl EvaluationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Reviewed => "REVIEWED",
        }
    }

    pub const fn is_complete(self) -> bool {
        matches!(self, Self::Completed | Self::Reviewed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: EvaluationId,
    pub application_id: ApplicationId,
    pub evaluation_type: EvaluationType,
    pub status: EvaluationStatus,
    pub evaluator_id: UserId,
}

impl Evaluation {
    pub fn describe(&self) -> String {
        format!(
            "{} {} ({}, evaluator {})",
            self.evaluation_type.label(),
            self.id,
            self.status.label(),
            self.evaluator_id
        )
    }
}
