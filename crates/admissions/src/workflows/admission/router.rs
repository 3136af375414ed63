use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    ApplicationId, ApplicationStatus, EvaluationId, EvaluationStatus, EvaluationType,
};
use super::orchestrator::{WorkflowError, WorkflowOrchestrator};
use super::repository::{ApplicationRepository, EvaluationRepository};
use crate::workflows::repository::RepositoryError;
use crate::workflows::scheduling::domain::UserId;
use crate::workflows::scheduling::repository::InterviewRepository;

/// Router exposing status lookups, validation, manual transitions and automatic advancement.
pub fn admission_router<A, E, I>(orchestrator: Arc<WorkflowOrchestrator<A, E, I>>) -> Router
where
    A: ApplicationRepository + 'static,
    E: EvaluationRepository + 'static,
    I: InterviewRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/admissions/applications/:application_id",
            get(status_handler::<A, E, I>),
        )
        .route(
            "/api/v1/admissions/statuses/:status/transitions",
            get(valid_transitions_handler::<A, E, I>),
        )
        .route(
            "/api/v1/admissions/applications/:application_id/transitions/validate",
            post(validate_handler::<A, E, I>),
        )
        .route(
            "/api/v1/admissions/applications/:application_id/transitions",
            post(transition_handler::<A, E, I>),
        )
        .route(
            "/api/v1/admissions/applications/:application_id/advance",
            post(advance_handler::<A, E, I>),
        )
        .route(
            "/api/v1/admissions/workflow/evaluate-all",
            post(evaluate_all_handler::<A, E, I>),
        )
        .route(
            "/api/v1/admissions/applications/:application_id/evaluations",
            post(assign_evaluator_handler::<A, E, I>),
        )
        .route(
            "/api/v1/admissions/evaluations/:evaluation_id/status",
            post(evaluation_status_handler::<A, E, I>),
        )
        .with_state(orchestrator)
}

/// Statuses arrive as raw labels so unknown values map to 400 rather than a rejection body.
#[derive(Debug, Deserialize)]
pub struct ValidateTransitionRequest {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub to: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignEvaluatorRequest {
    pub evaluation_type: EvaluationType,
    pub evaluator_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct EvaluationStatusRequest {
    pub status: EvaluationStatus,
}

pub(crate) async fn status_handler<A, E, I>(
    State(orchestrator): State<Arc<WorkflowOrchestrator<A, E, I>>>,
    Path(application_id): Path<String>,
) -> Response
where
    A: ApplicationRepository + 'static,
    E: EvaluationRepository + 'static,
    I: InterviewRepository + 'static,
{
    match orchestrator.get(&ApplicationId(application_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn valid_transitions_handler<A, E, I>(
    State(orchestrator): State<Arc<WorkflowOrchestrator<A, E, I>>>,
    Path(status): Path<String>,
) -> Response
where
    A: ApplicationRepository + 'static,
    E: EvaluationRepository + 'static,
    I: InterviewRepository + 'static,
{
    let from = match status.parse::<ApplicationStatus>() {
        Ok(from) => from,
        Err(error) => return error_response(error.into()),
    };

    let targets: Vec<&'static str> = orchestrator
        .valid_transitions(from)
        .iter()
        .map(|status| status.label())
        .collect();
    let payload = json!({
        "status": from.label(),
        "terminal": from.is_terminal(),
        "valid_transitions": targets,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn validate_handler<A, E, I>(
    State(orchestrator): State<Arc<WorkflowOrchestrator<A, E, I>>>,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<ValidateTransitionRequest>,
) -> Response
where
    A: ApplicationRepository + 'static,
    E: EvaluationRepository + 'static,
    I: InterviewRepository + 'static,
{
    let parsed = request
        .from
        .parse::<ApplicationStatus>()
        .and_then(|from| Ok((from, request.to.parse::<ApplicationStatus>()?)));
    let (from, to) = match parsed {
        Ok(pair) => pair,
        Err(error) => return error_response(error.into()),
    };

    match orchestrator.validate_transition(&ApplicationId(application_id), from, to) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn transition_handler<A, E, I>(
    State(orchestrator): State<Arc<WorkflowOrchestrator<A, E, I>>>,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<TransitionRequest>,
) -> Response
where
    A: ApplicationRepository + 'static,
    E: EvaluationRepository + 'static,
    I: InterviewRepository + 'static,
{
    let to = match request.to.parse::<ApplicationStatus>() {
        Ok(to) => to,
        Err(error) => return error_response(error.into()),
    };

    match orchestrator.transition(&ApplicationId(application_id), to) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn advance_handler<A, E, I>(
    State(orchestrator): State<Arc<WorkflowOrchestrator<A, E, I>>>,
    Path(application_id): Path<String>,
) -> Response
where
    A: ApplicationRepository + 'static,
    E: EvaluationRepository + 'static,
    I: InterviewRepository + 'static,
{
    match orchestrator.evaluate_and_advance(&ApplicationId(application_id)) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn evaluate_all_handler<A, E, I>(
    State(orchestrator): State<Arc<WorkflowOrchestrator<A, E, I>>>,
) -> Response
where
    A: ApplicationRepository + 'static,
    E: EvaluationRepository + 'static,
    I: InterviewRepository + 'static,
{
    match orchestrator.evaluate_all() {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn assign_evaluator_handler<A, E, I>(
    State(orchestrator): State<Arc<WorkflowOrchestrator<A, E, I>>>,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<AssignEvaluatorRequest>,
) -> Response
where
    A: ApplicationRepository + 'static,
    E: EvaluationRepository + 'static,
    I: InterviewRepository + 'static,
{
    match orchestrator.assign_evaluator(
        &ApplicationId(application_id),
        request.evaluation_type,
        request.evaluator_id,
    ) {
        Ok(evaluation) => (StatusCode::CREATED, axum::Json(evaluation)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn evaluation_status_handler<A, E, I>(
    State(orchestrator): State<Arc<WorkflowOrchestrator<A, E, I>>>,
    Path(evaluation_id): Path<String>,
    axum::Json(request): axum::Json<EvaluationStatusRequest>,
) -> Response
where
    A: ApplicationRepository + 'static,
    E: EvaluationRepository + 'static,
    I: InterviewRepository + 'static,
{
    match orchestrator.update_evaluation_status(&EvaluationId(evaluation_id), request.status) {
        Ok(evaluation) => (StatusCode::OK, axum::Json(evaluation)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: WorkflowError) -> Response {
    let status = match &error {
        WorkflowError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
        WorkflowError::NotFound(_) | WorkflowError::Repository(RepositoryError::NotFound) => {
            StatusCode::NOT_FOUND
        }
        WorkflowError::IllegalTransition { .. } | WorkflowError::StatusChanged { .. } => {
            StatusCode::CONFLICT
        }
        WorkflowError::GuardFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        WorkflowError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let mut payload = json!({ "error": error.to_string() });
    if let WorkflowError::GuardFailed { unmet, .. } = &error {
        payload["unmet"] = json!(unmet);
    }
    (status, axum::Json(payload)).into_response()
}
