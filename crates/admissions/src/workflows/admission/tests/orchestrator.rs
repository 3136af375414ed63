use std::sync::Arc;

use super::common::*;
use crate::store::InMemoryStore;
use crate::workflows::admission::domain::{
    ApplicationStatus, EvaluationId, EvaluationStatus, EvaluationType,
};
use crate::workflows::admission::{WorkflowError, WorkflowOrchestrator};
use crate::workflows::repository::RepositoryError;
use crate::workflows::scheduling::domain::{InterviewStatus, UserId};
use crate::workflows::scheduling::repository::InterviewRepository;

#[test]
fn pending_without_evaluations_stays_pending() {
    let (orchestrator, store) = build_orchestrator();
    seed(&store, application("app-1", ApplicationStatus::Pending));

    let outcome = orchestrator
        .evaluate_and_advance(&app_id("app-1"))
        .expect("evaluated");

    assert!(!outcome.transitioned);
    assert_eq!(outcome.previous_status, ApplicationStatus::Pending);
    assert_eq!(outcome.new_status, None);
    assert!(outcome.path.is_empty());
    assert!(outcome.reason.contains("no evaluators"), "{}", outcome.reason);
    assert_eq!(
        store.application_status(&app_id("app-1")).expect("status"),
        ApplicationStatus::Pending
    );
}

#[test]
fn advance_walks_every_satisfied_stage_and_is_idempotent() {
    let (orchestrator, store) = build_orchestrator();
    seed(&store, application("app-1", ApplicationStatus::Pending));
    seed_evaluation(&store, evaluation("app-1", "lang", EvaluationStatus::Completed));
    seed_interview(&store, interview("app-1", 10, InterviewStatus::Completed));

    let first = orchestrator
        .evaluate_and_advance(&app_id("app-1"))
        .expect("evaluated");
    assert!(first.transitioned);
    assert_eq!(
        first.path,
        vec![
            ApplicationStatus::UnderReview,
            ApplicationStatus::InterviewScheduled,
            ApplicationStatus::ExamScheduled,
        ]
    );
    assert_eq!(first.new_status, Some(ApplicationStatus::ExamScheduled));
    assert!(first.reason.contains("committee"));

    let second = orchestrator
        .evaluate_and_advance(&app_id("app-1"))
        .expect("evaluated");
    assert!(!second.transitioned);
    assert_eq!(second.previous_status, ApplicationStatus::ExamScheduled);
    assert_eq!(second.reason, first.reason);
}

#[test]
fn exam_stage_waits_for_incomplete_evaluations() {
    let (orchestrator, store) = build_orchestrator();
    seed(&store, application("app-1", ApplicationStatus::InterviewScheduled));
    seed_evaluation(&store, evaluation("app-1", "lang", EvaluationStatus::InProgress));
    seed_interview(&store, interview("app-1", 10, InterviewStatus::Completed));

    let outcome = orchestrator
        .evaluate_and_advance(&app_id("app-1"))
        .expect("evaluated");

    assert!(!outcome.transitioned);
    assert!(outcome.reason.contains("eval-app-1-lang"), "{}", outcome.reason);

    let recorded = orchestrator
        .update_evaluation_status(&EvaluationId("eval-app-1-lang".to_string()), EvaluationStatus::Reviewed)
        .expect("evaluation updated");
    assert_eq!(recorded.status, EvaluationStatus::Reviewed);
    let outcome = orchestrator
        .evaluate_and_advance(&app_id("app-1"))
        .expect("evaluated");
    assert_eq!(outcome.new_status, Some(ApplicationStatus::ExamScheduled));
}

#[test]
fn missing_documents_divert_and_return_through_review() {
    let (orchestrator, store) = build_orchestrator();
    let mut record = application("app-1", ApplicationStatus::InterviewScheduled);
    record.documents_complete = false;
    seed(&store, record);
    seed_evaluation(&store, evaluation("app-1", "lang", EvaluationStatus::Completed));
    seed_interview(&store, interview("app-1", 10, InterviewStatus::Scheduled));

    let diverted = orchestrator
        .evaluate_and_advance(&app_id("app-1"))
        .expect("evaluated");
    assert_eq!(diverted.path, vec![ApplicationStatus::DocumentsRequested]);
    assert!(diverted.reason.contains("outstanding"));

    store
        .set_documents_complete(&app_id("app-1"), true)
        .expect("documents received");
    let resumed = orchestrator
        .evaluate_and_advance(&app_id("app-1"))
        .expect("evaluated");

    // The interview is still pending, so the walk stops after re-entering the interview stage.
    assert_eq!(
        resumed.path,
        vec![
            ApplicationStatus::UnderReview,
            ApplicationStatus::InterviewScheduled
        ]
    );
    assert!(resumed.reason.contains("not yet concluded"));
}

#[test]
fn terminal_applications_are_left_alone() {
    let (orchestrator, store) = build_orchestrator();
    seed_ready_for_exam(&store, "app-1", ApplicationStatus::Waitlist);

    let outcome = orchestrator
        .evaluate_and_advance(&app_id("app-1"))
        .expect("evaluated");
    assert!(!outcome.transitioned);
    assert!(outcome.reason.contains("terminal"));
}

#[test]
fn manual_decision_from_exam_stage_is_guarded() {
    let (orchestrator, store) = build_orchestrator();
    seed(&store, application("app-1", ApplicationStatus::ExamScheduled));
    seed_evaluation(&store, evaluation("app-1", "lang", EvaluationStatus::Pending));

    let refused = orchestrator
        .transition(&app_id("app-1"), ApplicationStatus::Approved)
        .expect_err("guarded");
    match refused {
        WorkflowError::GuardFailed { unmet, .. } => {
            assert_eq!(unmet.len(), 1);
            assert!(unmet[0].contains("eval-app-1-lang"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let recorded = orchestrator
        .update_evaluation_status(&EvaluationId("eval-app-1-lang".to_string()), EvaluationStatus::Completed)
        .expect("evaluation updated");
    assert_eq!(recorded.status, EvaluationStatus::Completed);
    let approved = orchestrator
        .transition(&app_id("app-1"), ApplicationStatus::Approved)
        .expect("approved");
    assert_eq!(approved.status, ApplicationStatus::Approved);

    let after = orchestrator
        .transition(&app_id("app-1"), ApplicationStatus::Archived)
        .expect_err("terminal");
    assert!(matches!(after, WorkflowError::IllegalTransition { .. }));
}

#[test]
fn assign_evaluator_creates_pending_evaluation() {
    let (orchestrator, store) = build_orchestrator();
    seed(&store, application("app-1", ApplicationStatus::Pending));

    let evaluation = orchestrator
        .assign_evaluator(
            &app_id("app-1"),
            EvaluationType::PsychologicalInterview,
            UserId("psy-9".to_string()),
        )
        .expect("assigned");
    assert_eq!(evaluation.status, EvaluationStatus::Pending);
    assert!(evaluation.id.0.starts_with("eval-"));

    let outcome = orchestrator
        .evaluate_and_advance(&app_id("app-1"))
        .expect("evaluated");
    assert_eq!(outcome.new_status, Some(ApplicationStatus::UnderReview));

    let missing = orchestrator
        .assign_evaluator(
            &app_id("ghost"),
            EvaluationType::LanguageExam,
            UserId("t-1".to_string()),
        )
        .expect_err("unknown application");
    assert!(matches!(missing, WorkflowError::NotFound(_)));
}

#[test]
fn evaluate_all_isolates_a_corrupted_application() {
    let store = InMemoryStore::new();
    for index in 0..100 {
        let id = format!("app-{index:03}");
        seed(&store, application(&id, ApplicationStatus::Pending));
        seed_evaluation(&store, evaluation(&id, "lang", EvaluationStatus::Pending));
    }
    let corrupt = Arc::new(CorruptEvaluations {
        inner: store.clone(),
        corrupted: app_id("app-042"),
    });
    let shared = Arc::new(store.clone());
    let orchestrator = WorkflowOrchestrator::new(shared.clone(), corrupt, shared);

    let report = orchestrator.evaluate_all().expect("scan completes");

    assert_eq!(report.evaluated, 99);
    assert_eq!(report.advanced_count, 99);
    assert_eq!(report.unchanged_count, 0);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].application_id, app_id("app-042"));
    assert!(report.errors[0].error.contains("deleted user"));
    assert_eq!(
        store.application_status(&app_id("app-042")).expect("status"),
        ApplicationStatus::Pending
    );

    let rerun = orchestrator.evaluate_all().expect("scan completes");
    assert_eq!(rerun.advanced_count, 0);
    assert_eq!(rerun.unchanged_count, 99);
}

#[test]
fn evaluate_all_skips_terminal_applications() {
    let (orchestrator, store) = build_orchestrator();
    seed(&store, application("app-1", ApplicationStatus::Archived));
    seed(&store, application("app-2", ApplicationStatus::Pending));

    let report = orchestrator.evaluate_all().expect("scan completes");
    assert_eq!(report.evaluated, 1);
    assert_eq!(report.unchanged_count, 1);
}

#[test]
fn evaluate_all_surfaces_an_unreachable_store() {
    let store = Arc::new(InMemoryStore::new());
    let orchestrator =
        WorkflowOrchestrator::new(Arc::new(UnavailableApplications), store.clone(), store);

    let error = orchestrator.evaluate_all().expect_err("store offline");
    assert!(matches!(
        error,
        WorkflowError::Repository(RepositoryError::Unavailable(_))
    ));
}

#[test]
fn cancelled_interview_reopens_review_stage() {
    let (orchestrator, store) = build_orchestrator();
    seed(&store, application("app-1", ApplicationStatus::UnderReview));
    seed_evaluation(&store, evaluation("app-1", "lang", EvaluationStatus::Pending));
    let mut booked = interview("app-1", 10, InterviewStatus::Scheduled);
    seed_interview(&store, booked.clone());

    booked.status = InterviewStatus::Cancelled;
    InterviewRepository::update(&store, booked).expect("cancelled");

    let outcome = orchestrator
        .evaluate_and_advance(&app_id("app-1"))
        .expect("evaluated");
    assert!(!outcome.transitioned);
    assert!(outcome.reason.contains("no interview booked"));
}

#[test]
fn advance_that_loses_the_status_race_is_a_no_op() {
    let store = InMemoryStore::new();
    seed(&store, application("app-1", ApplicationStatus::Pending));
    seed_evaluation(&store, evaluation("app-1", "lang", EvaluationStatus::Completed));
    let contended = Arc::new(ContendedApplications::new(
        store.clone(),
        ApplicationStatus::Rejected,
    ));
    let shared = Arc::new(store.clone());
    let orchestrator = WorkflowOrchestrator::new(contended, shared.clone(), shared);

    let outcome = orchestrator
        .evaluate_and_advance(&app_id("app-1"))
        .expect("lost race is not an error");

    assert!(!outcome.transitioned);
    assert_eq!(outcome.previous_status, ApplicationStatus::Pending);
    assert_eq!(outcome.new_status, None);
    assert!(outcome.path.is_empty());
    assert!(
        outcome.reason.contains("updated concurrently"),
        "{}",
        outcome.reason
    );
    assert_eq!(
        store.application_status(&app_id("app-1")).expect("status"),
        ApplicationStatus::Rejected
    );
}

#[test]
fn evaluate_all_counts_a_lost_race_as_unchanged() {
    let store = InMemoryStore::new();
    seed(&store, application("app-1", ApplicationStatus::Pending));
    seed_evaluation(&store, evaluation("app-1", "lang", EvaluationStatus::Pending));
    let contended = Arc::new(ContendedApplications::new(
        store.clone(),
        ApplicationStatus::Archived,
    ));
    let shared = Arc::new(store.clone());
    let orchestrator = WorkflowOrchestrator::new(contended, shared.clone(), shared);

    let report = orchestrator.evaluate_all().expect("scan completes");

    assert_eq!(report.evaluated, 1);
    assert_eq!(report.advanced_count, 0);
    assert_eq!(report.unchanged_count, 1);
    assert!(report.errors.is_empty());
    assert_eq!(
        store.application_status(&app_id("app-1")).expect("status"),
        ApplicationStatus::Archived
    );
}

#[test]
fn updating_an_unknown_evaluation_is_not_found() {
    let (orchestrator, _) = build_orchestrator();

    let error = orchestrator
        .update_evaluation_status(
            &EvaluationId("eval-missing".to_string()),
            EvaluationStatus::Completed,
        )
        .expect_err("unknown evaluation");
    assert!(matches!(error, WorkflowError::Repository(RepositoryError::NotFound)));
}
