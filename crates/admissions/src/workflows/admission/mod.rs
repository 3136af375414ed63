//! Admission application workflow: status table, guards, and the advancing orchestrator.

pub mod domain;
pub mod orchestrator;
pub mod repository;
pub mod router;
pub mod transitions;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, Evaluation, EvaluationId,
    EvaluationStatus, EvaluationType, GuardianContact, InvalidStatus, StudentSummary,
};
pub use orchestrator::{
    AdvanceOutcome, ApplicationFailure, WorkflowError, WorkflowOrchestrator, WorkflowReport,
};
pub use repository::{ApplicationRepository, ApplicationStatusView, EvaluationRepository};
pub use router::admission_router;
pub use transitions::{
    is_allowed, valid_transitions, CompletionSignals, GuardContext, IssueKind,
    StatusTransitionValidator, ValidationIssue, ValidationResult,
};
