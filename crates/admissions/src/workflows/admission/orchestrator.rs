use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, Evaluation, EvaluationId,
    EvaluationStatus, EvaluationType, InvalidStatus,
};
use super::repository::{ApplicationRepository, EvaluationRepository};
use super::transitions::{
    valid_transitions, CompletionSignals, StatusTransitionValidator, ValidationResult,
};
use crate::workflows::repository::RepositoryError;
use crate::workflows::scheduling::domain::UserId;
use crate::workflows::scheduling::repository::InterviewRepository;

/// Error raised by workflow operations.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    InvalidStatus(#[from] InvalidStatus),
    #[error("application {0} not found")]
    NotFound(ApplicationId),
    #[error("transition {from} -> {to} is not allowed")]
    IllegalTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
    #[error("transition {from} -> {to} blocked: {}", unmet.join("; "))]
    GuardFailed {
        from: ApplicationStatus,
        to: ApplicationStatus,
        unmet: Vec<String>,
    },
    #[error("application {id} is no longer {expected}; it was updated concurrently")]
    StatusChanged {
        id: ApplicationId,
        expected: ApplicationStatus,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result of one `evaluate_and_advance` call.
#[derive(Debug, Clone, Serialize)]
pub struct AdvanceOutcome {
    pub application_id: ApplicationId,
    pub transitioned: bool,
    pub previous_status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_status: Option<ApplicationStatus>,
    /// Every status persisted during the call, in order.
    pub path: Vec<ApplicationStatus>,
    pub reason: String,
    pub signals: CompletionSignals,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationFailure {
    pub application_id: ApplicationId,
    pub error: String,
}

/// Aggregate report of a full workflow scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkflowReport {
    /// Applications evaluated without error; failures land in `errors` instead.
    pub evaluated: usize,
    pub advanced_count: usize,
    pub unchanged_count: usize,
    pub advanced: Vec<AdvanceOutcome>,
    pub errors: Vec<ApplicationFailure>,
}

enum Candidate {
    Advance(ApplicationStatus),
    Hold(String),
}

/// Next automatic status for the given completion level.
///
/// Depends only on its inputs so concurrent or repeated evaluation converges.
fn next_candidate(status: ApplicationStatus, signals: &CompletionSignals) -> Candidate {
    use ApplicationStatus::*;

    if status.is_terminal() {
        return Candidate::Hold(format!("{status} is terminal"));
    }
    if !signals.documents_complete && status != DocumentsRequested {
        return Candidate::Advance(DocumentsRequested);
    }

    match status {
        Pending if signals.evaluations_assigned > 0 => Candidate::Advance(UnderReview),
        Pending => Candidate::Hold("no evaluators assigned yet".to_string()),
        UnderReview if signals.interviews_active > 0 => Candidate::Advance(InterviewScheduled),
        UnderReview => Candidate::Hold("no interview booked yet".to_string()),
        InterviewScheduled if signals.interviews_pending > 0 => Candidate::Hold(format!(
            "{} interview(s) not yet concluded",
            signals.interviews_pending
        )),
        InterviewScheduled if signals.interviews_completed > 0 => {
            Candidate::Advance(ExamScheduled)
        }
        InterviewScheduled => Candidate::Hold("no interview has been completed".to_string()),
        ExamScheduled => Candidate::Hold("awaiting admission committee decision".to_string()),
        DocumentsRequested if signals.documents_complete => Candidate::Advance(UnderReview),
        DocumentsRequested => Candidate::Hold("requested documents still outstanding".to_string()),
        Approved | Rejected | Waitlist | Archived => {
            Candidate::Hold(format!("{status} is terminal"))
        }
    }
}

static EVALUATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_evaluation_id() -> EvaluationId {
    let id = EVALUATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    EvaluationId(format!("eval-{id:06}"))
}

/// Drives applications forward automatically, with the validator as the only authority on
/// legality.
pub struct WorkflowOrchestrator<A, E, I> {
    validator: StatusTransitionValidator<A, E, I>,
}

impl<A, E, I> WorkflowOrchestrator<A, E, I>
where
    A: ApplicationRepository + 'static,
    E: EvaluationRepository + 'static,
    I: InterviewRepository + 'static,
{
    pub fn new(applications: Arc<A>, evaluations: Arc<E>, interviews: Arc<I>) -> Self {
        Self {
            validator: StatusTransitionValidator::new(applications, evaluations, interviews),
        }
    }

    pub fn validator(&self) -> &StatusTransitionValidator<A, E, I> {
        &self.validator
    }

    pub fn get(&self, id: &ApplicationId) -> Result<ApplicationRecord, WorkflowError> {
        self.validator
            .applications()
            .fetch(id)?
            .ok_or_else(|| WorkflowError::NotFound(id.clone()))
    }

    pub fn valid_transitions(&self, from: ApplicationStatus) -> &'static [ApplicationStatus] {
        valid_transitions(from)
    }

    pub fn validate_transition(
        &self,
        id: &ApplicationId,
        from: ApplicationStatus,
        to: ApplicationStatus,
    ) -> Result<ValidationResult, WorkflowError> {
        self.validator.validate_transition(id, from, to)
    }

    /// Assign an evaluator; the evaluation starts out pending.
    pub fn assign_evaluator(
        &self,
        id: &ApplicationId,
        evaluation_type: EvaluationType,
        evaluator_id: UserId,
    ) -> Result<Evaluation, WorkflowError> {
        let application = self.get(id)?;
        let evaluation = Evaluation {
            id: next_evaluation_id(),
            application_id: application.id,
            evaluation_type,
            status: EvaluationStatus::Pending,
            evaluator_id,
        };

        let stored = self.validator.evaluations().insert(evaluation)?;
        info!(
            application = %stored.application_id,
            evaluation = %stored.id,
            evaluator = %stored.evaluator_id,
            "evaluator assigned"
        );
        Ok(stored)
    }

    pub fn update_evaluation_status(
        &self,
        id: &EvaluationId,
        status: EvaluationStatus,
    ) -> Result<Evaluation, WorkflowError> {
        let updated = self.validator.evaluations().update_status(id, status)?;
        info!(
            application = %updated.application_id,
            evaluation = %updated.id,
            status = status.label(),
            "evaluation status recorded"
        );
        Ok(updated)
    }

    /// Explicit status change requested by an operator or the admission committee.
    pub fn transition(
        &self,
        id: &ApplicationId,
        to: ApplicationStatus,
    ) -> Result<ApplicationRecord, WorkflowError> {
        let context = self.validator.load_context(id)?;
        let from = context.application.status;

        let result = StatusTransitionValidator::<A, E, I>::validate_against(&context, from, to);
        if !result.valid {
            info!(application = %id, %from, %to, reason = %result.message, "transition refused");
            return Err(result.into_error());
        }

        if !self
            .validator
            .applications()
            .compare_and_set_status(id, from, to)?
        {
            return Err(WorkflowError::StatusChanged {
                id: id.clone(),
                expected: from,
            });
        }

        info!(application = %id, %from, %to, "application status changed");
        let mut record = context.application;
        record.status = to;
        Ok(record)
    }

    /// Advance one application as far as its current completion signals allow.
    ///
    /// Each step takes the single candidate for the current status, validates it, and
    /// persists it with compare-and-set. Calling again without new signals is a no-op.
    pub fn evaluate_and_advance(&self, id: &ApplicationId) -> Result<AdvanceOutcome, WorkflowError> {
        let mut context = self.validator.load_context(id)?;
        let signals = context.signals();
        let previous_status = context.application.status;
        let mut current = previous_status;
        let mut path = Vec::new();
        let step_limit = ApplicationStatus::ordered().len();

        let reason = loop {
            if path.len() >= step_limit {
                break format!("stopped after {step_limit} transitions");
            }

            let candidate = match next_candidate(current, &signals) {
                Candidate::Advance(status) => status,
                Candidate::Hold(reason) => break reason,
            };

            let result =
                StatusTransitionValidator::<A, E, I>::validate_against(&context, current, candidate);
            if !result.valid {
                debug!(application = %id, from = %current, to = %candidate, reason = %result.message, "automatic transition refused");
                break result.message;
            }

            if !self
                .validator
                .applications()
                .compare_and_set_status(id, current, candidate)?
            {
                debug!(application = %id, expected = %current, "status changed by another writer");
                break format!("application was updated concurrently while {current}");
            }

            info!(application = %id, from = %current, to = %candidate, "application advanced");
            path.push(candidate);
            current = candidate;
            context.application.status = candidate;
        };

        let transitioned = !path.is_empty();
        Ok(AdvanceOutcome {
            application_id: id.clone(),
            transitioned,
            previous_status,
            new_status: transitioned.then_some(current),
            path,
            reason,
            signals,
        })
    }

    /// Evaluate every non-terminal application; one failure never aborts the scan.
    pub fn evaluate_all(&self) -> Result<WorkflowReport, WorkflowError> {
        let applications = self.validator.applications().active()?;
        let mut report = WorkflowReport::default();

        for application in applications
            .into_iter()
            .filter(|application| !application.status.is_terminal())
        {
            match self.evaluate_and_advance(&application.id) {
                Ok(outcome) if outcome.transitioned => {
                    report.evaluated += 1;
                    report.advanced_count += 1;
                    report.advanced.push(outcome);
                }
                Ok(_) => {
                    report.evaluated += 1;
                    report.unchanged_count += 1;
                }
                Err(error) => {
                    warn!(application = %application.id, %error, "workflow evaluation failed");
                    report.errors.push(ApplicationFailure {
                        application_id: application.id,
                        error: error.to_string(),
                    });
                }
            }
        }

        info!(
            evaluated = report.evaluated,
            advanced = report.advanced_count,
            unchanged = report.unchanged_count,
            failed = report.errors.len(),
            "workflow scan complete"
        );
        Ok(report)
    }
}
