//! Application status state machine.
//!
//! Legality lives in a static table ([`valid_transitions`]); business preconditions live in a
//! separate guard table keyed by destination. Refusals are returned as a negative
//! [`ValidationResult`] so callers can tell "refused" apart from "failed".

mod guards;
mod table;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use super::domain::{ApplicationId, ApplicationRecord, ApplicationStatus};
use super::orchestrator::WorkflowError;
use super::repository::{ApplicationRepository, EvaluationRepository};
use crate::workflows::repository::RepositoryError;
use crate::workflows::scheduling::repository::InterviewRepository;

pub use guards::{CompletionSignals, GuardContext};
pub use table::{is_allowed, valid_transitions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    IllegalTransition,
    GuardFailed,
    StaleStatus,
    /// Guard data could not be loaded.
    GuardUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub message: String,
}

/// Outcome of validating a proposed status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub application_id: ApplicationId,
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
    pub valid: bool,
    pub message: String,
    pub errors: Vec<ValidationIssue>,
    pub metadata: BTreeMap<String, String>,
}

impl ValidationResult {
    fn from_issues(
        application_id: ApplicationId,
        from: ApplicationStatus,
        to: ApplicationStatus,
        errors: Vec<ValidationIssue>,
        mut metadata: BTreeMap<String, String>,
    ) -> Self {
        metadata.insert("from".to_string(), from.label().to_string());
        metadata.insert("to".to_string(), to.label().to_string());

        let valid = errors.is_empty();
        let message = if valid {
            format!("transition {from} -> {to} is allowed")
        } else {
            errors
                .iter()
                .map(|issue| issue.message.as_str())
                .collect::<Vec<_>>()
                .join("; ")
        };

        Self {
            application_id,
            from,
            to,
            valid,
            message,
            errors,
            metadata,
        }
    }

    fn guard_data_unavailable(
        application_id: &ApplicationId,
        from: ApplicationStatus,
        to: ApplicationStatus,
        error: RepositoryError,
    ) -> Self {
        let issue = ValidationIssue {
            kind: IssueKind::GuardUnavailable,
            message: format!("could not load guard data for {application_id}: {error}"),
        };
        Self::from_issues(
            application_id.clone(),
            from,
            to,
            vec![issue],
            BTreeMap::new(),
        )
    }

    pub fn has_issue(&self, kind: IssueKind) -> bool {
        self.errors.iter().any(|issue| issue.kind == kind)
    }

    /// Convert a refusal into the error surfaced by explicit transitions.
    pub fn into_error(self) -> WorkflowError {
        if self.has_issue(IssueKind::IllegalTransition) {
            return WorkflowError::IllegalTransition {
                from: self.from,
                to: self.to,
            };
        }
        if self.has_issue(IssueKind::StaleStatus) {
            return WorkflowError::StatusChanged {
                id: self.application_id,
                expected: self.from,
            };
        }
        WorkflowError::GuardFailed {
            from: self.from,
            to: self.to,
            unmet: self.errors.into_iter().map(|issue| issue.message).collect(),
        }
    }
}

/// Validates proposed status changes against the table and the guards.
pub struct StatusTransitionValidator<A, E, I> {
    applications: Arc<A>,
    evaluations: Arc<E>,
    interviews: Arc<I>,
}

impl<A, E, I> StatusTransitionValidator<A, E, I>
where
    A: ApplicationRepository,
    E: EvaluationRepository,
    I: InterviewRepository,
{
    pub fn new(applications: Arc<A>, evaluations: Arc<E>, interviews: Arc<I>) -> Self {
        Self {
            applications,
            evaluations,
            interviews,
        }
    }

    /// Static target set, independent of any application's guards.
    pub fn valid_transitions(from: ApplicationStatus) -> &'static [ApplicationStatus] {
        valid_transitions(from)
    }

    pub(crate) fn applications(&self) -> &Arc<A> {
        &self.applications
    }

    pub(crate) fn evaluations(&self) -> &Arc<E> {
        &self.evaluations
    }

    /// Read the application with its evaluations and interviews; nothing is cached.
    pub fn load_context(&self, id: &ApplicationId) -> Result<GuardContext, WorkflowError> {
        let application = self
            .applications
            .fetch(id)?
            .ok_or_else(|| WorkflowError::NotFound(id.clone()))?;
        Ok(self.context_for(application)?)
    }

    fn context_for(&self, application: ApplicationRecord) -> Result<GuardContext, RepositoryError> {
        let evaluations = self.evaluations.for_application(&application.id)?;
        let interviews = self.interviews.for_application(&application.id)?;
        Ok(GuardContext {
            application,
            evaluations,
            interviews,
        })
    }

    /// Validate `from -> to` for a stored application.
    ///
    /// Only an unknown application id is an error; storage failures while loading guard
    /// data come back as an invalid result.
    pub fn validate_transition(
        &self,
        id: &ApplicationId,
        from: ApplicationStatus,
        to: ApplicationStatus,
    ) -> Result<ValidationResult, WorkflowError> {
        let application = match self.applications.fetch(id) {
            Ok(Some(application)) => application,
            Ok(None) => return Err(WorkflowError::NotFound(id.clone())),
            Err(error) => {
                return Ok(ValidationResult::guard_data_unavailable(id, from, to, error))
            }
        };

        match self.context_for(application) {
            Ok(context) => Ok(Self::validate_against(&context, from, to)),
            Err(error) => Ok(ValidationResult::guard_data_unavailable(id, from, to, error)),
        }
    }

    /// Pure validation over an already loaded context.
    pub fn validate_against(
        context: &GuardContext,
        from: ApplicationStatus,
        to: ApplicationStatus,
    ) -> ValidationResult {
        let application_id = context.application.id.clone();
        let mut errors = Vec::new();

        if context.application.status != from {
            errors.push(ValidationIssue {
                kind: IssueKind::StaleStatus,
                message: format!(
                    "application {application_id} is currently {}, not {from}",
                    context.application.status
                ),
            });
        }

        if !is_allowed(from, to) {
            errors.push(ValidationIssue {
                kind: IssueKind::IllegalTransition,
                message: illegal_message(from, to),
            });
            return ValidationResult::from_issues(
                application_id,
                from,
                to,
                errors,
                BTreeMap::new(),
            );
        }

        let report = guards::run_guards(context, from, to);
        errors.extend(report.unmet.into_iter().map(|message| ValidationIssue {
            kind: IssueKind::GuardFailed,
            message,
        }));

        ValidationResult::from_issues(application_id, from, to, errors, report.metadata)
    }
}

fn illegal_message(from: ApplicationStatus, to: ApplicationStatus) -> String {
    if from.is_terminal() {
        return format!("{from} is a terminal status; it cannot move to {to}");
    }

    let allowed = valid_transitions(from)
        .iter()
        .map(|status| status.label())
        .collect::<Vec<_>>()
        .join(", ");
    format!("transition {from} -> {to} is not allowed (allowed: {allowed})")
}
