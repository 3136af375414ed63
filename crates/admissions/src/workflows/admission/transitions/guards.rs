use std::collections::BTreeMap;

use serde::Serialize;

use super::super::domain::{ApplicationRecord, ApplicationStatus, Evaluation};
use crate::workflows::scheduling::domain::{Interview, InterviewStatus};

/// Freshly loaded state the guards and the orchestrator decide on.
#[derive(Debug, Clone)]
pub struct GuardContext {
    pub application: ApplicationRecord,
    pub evaluations: Vec<Evaluation>,
    pub interviews: Vec<Interview>,
}

/// Completion counters derived from a [`GuardContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompletionSignals {
    pub documents_complete: bool,
    pub evaluations_assigned: usize,
    pub evaluations_complete: usize,
    pub interviews_active: usize,
    pub interviews_pending: usize,
    pub interviews_completed: usize,
}

impl CompletionSignals {
    pub fn all_evaluations_complete(&self) -> bool {
        self.evaluations_assigned > 0 && self.evaluations_complete == self.evaluations_assigned
    }
}

impl GuardContext {
    pub fn signals(&self) -> CompletionSignals {
        let interviews_active = self
            .interviews
            .iter()
            .filter(|interview| interview.status.occupies_slot())
            .count();
        let interviews_pending = self
            .interviews
            .iter()
            .filter(|interview| interview.status.is_pending())
            .count();
        let interviews_completed = self
            .interviews
            .iter()
            .filter(|interview| interview.status == InterviewStatus::Completed)
            .count();

        CompletionSignals {
            documents_complete: self.application.documents_complete,
            evaluations_assigned: self.evaluations.len(),
            evaluations_complete: self
                .evaluations
                .iter()
                .filter(|evaluation| evaluation.status.is_complete())
                .count(),
            interviews_active,
            interviews_pending,
            interviews_completed,
        }
    }
}

/// Unmet preconditions plus facts worth surfacing in the validation metadata.
#[derive(Debug, Default)]
pub(crate) struct GuardReport {
    pub unmet: Vec<String>,
    pub metadata: BTreeMap<String, String>,
}

type Guard = fn(&GuardContext, &mut GuardReport);

const REVIEW_GUARDS: &[Guard] = &[documents_complete, evaluations_assigned];
const INTERVIEW_GUARDS: &[Guard] = &[active_interview];
const EVALUATION_GUARDS: &[Guard] = &[evaluations_assigned, evaluations_complete];
const NO_GUARDS: &[Guard] = &[];

/// Business preconditions keyed by destination.
///
/// Rejection is only guarded when it is the committee decision out of
/// `EXAM_SCHEDULED`; from anywhere else it is unilateral.
pub(crate) fn guards_for(from: ApplicationStatus, to: ApplicationStatus) -> &'static [Guard] {
    use ApplicationStatus::*;

    match to {
        UnderReview => REVIEW_GUARDS,
        InterviewScheduled => INTERVIEW_GUARDS,
        ExamScheduled | Approved | Waitlist => EVALUATION_GUARDS,
        Rejected if from == ExamScheduled => EVALUATION_GUARDS,
        Pending | Rejected | DocumentsRequested | Archived => NO_GUARDS,
    }
}

pub(crate) fn run_guards(
    context: &GuardContext,
    from: ApplicationStatus,
    to: ApplicationStatus,
) -> GuardReport {
    let mut report = GuardReport::default();
    for guard in guards_for(from, to) {
        guard(context, &mut report);
    }
    report
}

fn documents_complete(context: &GuardContext, report: &mut GuardReport) {
    let complete = context.application.documents_complete;
    report
        .metadata
        .insert("documents_complete".to_string(), complete.to_string());
    if !complete {
        report
            .unmet
            .push("required admission documents are still missing".to_string());
    }
}

fn evaluations_assigned(context: &GuardContext, report: &mut GuardReport) {
    report.metadata.insert(
        "evaluations_assigned".to_string(),
        context.evaluations.len().to_string(),
    );
    if context.evaluations.is_empty() {
        report
            .unmet
            .push("no evaluations have been assigned to the application".to_string());
    }
}

fn evaluations_complete(context: &GuardContext, report: &mut GuardReport) {
    let signals = context.signals();
    report.metadata.insert(
        "evaluations_completed".to_string(),
        format!(
            "{}/{}",
            signals.evaluations_complete, signals.evaluations_assigned
        ),
    );

    for evaluation in context
        .evaluations
        .iter()
        .filter(|evaluation| !evaluation.status.is_complete())
    {
        report
            .unmet
            .push(format!("evaluation incomplete: {}", evaluation.describe()));
    }
}

fn active_interview(context: &GuardContext, report: &mut GuardReport) {
    let active = context.signals().interviews_active;
    report
        .metadata
        .insert("active_interviews".to_string(), active.to_string());
    if active == 0 {
        report
            .unmet
            .push("no non-cancelled interview is booked for the application".to_string());
    }
}
