use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::json;

use super::booking::{BookingRequest, SchedulingError};
use super::domain::{
    InterviewId, InterviewStatus, InterviewType, ScheduleId, ScheduleKind, UserId, WeeklyPattern,
};
use super::repository::{InterviewRepository, InterviewerDirectory, ScheduleRepository};
use super::service::SchedulingService;
use crate::workflows::admission::repository::ApplicationRepository;
use crate::workflows::repository::RepositoryError;

/// Router exposing availability queries, schedule administration and interview bookings.
pub fn scheduling_router<S, I, D, A>(service: Arc<SchedulingService<S, I, D, A>>) -> Router
where
    S: ScheduleRepository + 'static,
    I: InterviewRepository + 'static,
    D: InterviewerDirectory + 'static,
    A: ApplicationRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/scheduling/available-interviewers",
            get(available_interviewers_handler::<S, I, D, A>),
        )
        .route(
            "/api/v1/scheduling/workload/:year",
            get(workload_handler::<S, I, D, A>),
        )
        .route(
            "/api/v1/interviewers/:interviewer_id/availability",
            get(availability_handler::<S, I, D, A>),
        )
        .route(
            "/api/v1/interviewers/:interviewer_id/free-slots",
            get(free_slots_handler::<S, I, D, A>),
        )
        .route(
            "/api/v1/interviewers/:interviewer_id/calendar/:year",
            get(calendar_handler::<S, I, D, A>),
        )
        .route(
            "/api/v1/interviewers/:interviewer_id/schedules",
            get(list_schedules_handler::<S, I, D, A>),
        )
        .route(
            "/api/v1/interviewers/:interviewer_id/schedules/recurring",
            post(create_recurring_handler::<S, I, D, A>),
        )
        .route(
            "/api/v1/interviewers/:interviewer_id/schedules/specific",
            post(create_specific_handler::<S, I, D, A>),
        )
        .route(
            "/api/v1/interviewers/:interviewer_id/schedules/exceptions",
            post(create_exception_handler::<S, I, D, A>),
        )
        .route(
            "/api/v1/interviewers/:interviewer_id/schedules/copy",
            post(copy_schedules_handler::<S, I, D, A>),
        )
        .route(
            "/api/v1/schedules/:schedule_id",
            delete(delete_schedule_handler::<S, I, D, A>)
                .put(update_schedule_handler::<S, I, D, A>),
        )
        .route(
            "/api/v1/schedules/:schedule_id/deactivate",
            post(deactivate_schedule_handler::<S, I, D, A>),
        )
        .route("/api/v1/interviews", post(book_handler::<S, I, D, A>))
        .route(
            "/api/v1/interviews/:interview_id/status",
            post(interview_status_handler::<S, I, D, A>),
        )
        .route(
            "/api/v1/interviews/:interview_id/reschedule",
            post(reschedule_handler::<S, I, D, A>),
        )
        .with_state(service)
}

/// Times are accepted as `HH:MM` or `HH:MM:SS`.
#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub date: NaiveDate,
    pub time: String,
    pub duration_minutes: Option<u32>,
    pub interview_type: Option<InterviewType>,
}

#[derive(Debug, Deserialize)]
pub struct FreeSlotsQuery {
    pub date: NaiveDate,
    pub duration_minutes: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleListQuery {
    pub year: Option<i32>,
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Deserialize)]
pub struct RecurringSchedulesRequest {
    pub year: i32,
    pub patterns: Vec<WeeklyPattern>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SpecificDateRequest {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExceptionRequest {
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CopySchedulesRequest {
    pub from_year: i32,
    pub to_year: i32,
}

/// Replacement declaration for an existing entry, tagged by `schedule_type`.
#[derive(Debug, Deserialize)]
pub struct UpdateScheduleRequest {
    #[serde(flatten)]
    pub kind: ScheduleKind,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InterviewStatusRequest {
    pub status: InterviewStatus,
}

#[derive(Debug, Deserialize)]
pub struct RescheduleRequest {
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
}

pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

pub(crate) async fn available_interviewers_handler<S, I, D, A>(
    State(service): State<Arc<SchedulingService<S, I, D, A>>>,
    Query(query): Query<SlotQuery>,
) -> Response
where
    S: ScheduleRepository + 'static,
    I: InterviewRepository + 'static,
    D: InterviewerDirectory + 'static,
    A: ApplicationRepository + 'static,
{
    let Some(time) = parse_time(&query.time) else {
        return bad_time(&query.time);
    };

    match service.find_available_interviewers(
        query.date,
        time,
        query.duration_minutes,
        query.interview_type,
    ) {
        Ok(interviewers) => {
            let payload = json!({
                "date": query.date,
                "time": time,
                "interviewers": interviewers,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn availability_handler<S, I, D, A>(
    State(service): State<Arc<SchedulingService<S, I, D, A>>>,
    Path(interviewer_id): Path<String>,
    Query(query): Query<SlotQuery>,
) -> Response
where
    S: ScheduleRepository + 'static,
    I: InterviewRepository + 'static,
    D: InterviewerDirectory + 'static,
    A: ApplicationRepository + 'static,
{
    let Some(time) = parse_time(&query.time) else {
        return bad_time(&query.time);
    };

    let interviewer = UserId(interviewer_id);
    match service.check_interviewer(&interviewer, query.date, time, query.duration_minutes) {
        Ok(check) => {
            let payload = json!({
                "interviewer_id": interviewer,
                "date": query.date,
                "available": check.available,
                "requested": check.requested,
                "reason": check.reason,
                "message": check.explanation(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn free_slots_handler<S, I, D, A>(
    State(service): State<Arc<SchedulingService<S, I, D, A>>>,
    Path(interviewer_id): Path<String>,
    Query(query): Query<FreeSlotsQuery>,
) -> Response
where
    S: ScheduleRepository + 'static,
    I: InterviewRepository + 'static,
    D: InterviewerDirectory + 'static,
    A: ApplicationRepository + 'static,
{
    let interviewer = UserId(interviewer_id);
    let duration = query
        .duration_minutes
        .unwrap_or(service.config().default_interview_minutes);
    match service.free_slots(&interviewer, query.date, Some(duration)) {
        Ok(slots) => {
            let payload = json!({
                "interviewer_id": interviewer,
                "date": query.date,
                "duration_minutes": duration,
                "slots": slots,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn calendar_handler<S, I, D, A>(
    State(service): State<Arc<SchedulingService<S, I, D, A>>>,
    Path((interviewer_id, year)): Path<(String, i32)>,
) -> Response
where
    S: ScheduleRepository + 'static,
    I: InterviewRepository + 'static,
    D: InterviewerDirectory + 'static,
    A: ApplicationRepository + 'static,
{
    match service.availability_calendar(&UserId(interviewer_id), year) {
        Ok(calendar) => (StatusCode::OK, axum::Json(calendar)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_schedules_handler<S, I, D, A>(
    State(service): State<Arc<SchedulingService<S, I, D, A>>>,
    Path(interviewer_id): Path<String>,
    Query(query): Query<ScheduleListQuery>,
) -> Response
where
    S: ScheduleRepository + 'static,
    I: InterviewRepository + 'static,
    D: InterviewerDirectory + 'static,
    A: ApplicationRepository + 'static,
{
    match service.schedules().schedules_for(
        &UserId(interviewer_id),
        query.year,
        query.include_inactive,
    ) {
        Ok(schedules) => (StatusCode::OK, axum::Json(schedules)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_recurring_handler<S, I, D, A>(
    State(service): State<Arc<SchedulingService<S, I, D, A>>>,
    Path(interviewer_id): Path<String>,
    axum::Json(request): axum::Json<RecurringSchedulesRequest>,
) -> Response
where
    S: ScheduleRepository + 'static,
    I: InterviewRepository + 'static,
    D: InterviewerDirectory + 'static,
    A: ApplicationRepository + 'static,
{
    match service.create_recurring_schedules(
        &UserId(interviewer_id),
        request.year,
        &request.patterns,
        request.notes,
    ) {
        Ok(created) => (StatusCode::CREATED, axum::Json(created)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_specific_handler<S, I, D, A>(
    State(service): State<Arc<SchedulingService<S, I, D, A>>>,
    Path(interviewer_id): Path<String>,
    axum::Json(request): axum::Json<SpecificDateRequest>,
) -> Response
where
    S: ScheduleRepository + 'static,
    I: InterviewRepository + 'static,
    D: InterviewerDirectory + 'static,
    A: ApplicationRepository + 'static,
{
    match service.schedules().create_specific_date(
        &UserId(interviewer_id),
        request.date,
        request.start,
        request.end,
        request.notes,
    ) {
        Ok(created) => (StatusCode::CREATED, axum::Json(created)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_exception_handler<S, I, D, A>(
    State(service): State<Arc<SchedulingService<S, I, D, A>>>,
    Path(interviewer_id): Path<String>,
    axum::Json(request): axum::Json<ExceptionRequest>,
) -> Response
where
    S: ScheduleRepository + 'static,
    I: InterviewRepository + 'static,
    D: InterviewerDirectory + 'static,
    A: ApplicationRepository + 'static,
{
    match service.create_exception(&UserId(interviewer_id), request.date, request.notes) {
        Ok(created) => (StatusCode::CREATED, axum::Json(created)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn copy_schedules_handler<S, I, D, A>(
    State(service): State<Arc<SchedulingService<S, I, D, A>>>,
    Path(interviewer_id): Path<String>,
    axum::Json(request): axum::Json<CopySchedulesRequest>,
) -> Response
where
    S: ScheduleRepository + 'static,
    I: InterviewRepository + 'static,
    D: InterviewerDirectory + 'static,
    A: ApplicationRepository + 'static,
{
    match service.schedules().copy_schedules_to_year(
        &UserId(interviewer_id),
        request.from_year,
        request.to_year,
    ) {
        Ok(copied) => (StatusCode::CREATED, axum::Json(copied)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn deactivate_schedule_handler<S, I, D, A>(
    State(service): State<Arc<SchedulingService<S, I, D, A>>>,
    Path(schedule_id): Path<String>,
) -> Response
where
    S: ScheduleRepository + 'static,
    I: InterviewRepository + 'static,
    D: InterviewerDirectory + 'static,
    A: ApplicationRepository + 'static,
{
    match service
        .schedules()
        .deactivate_schedule(&ScheduleId(schedule_id))
    {
        Ok(schedule) => (StatusCode::OK, axum::Json(schedule)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_schedule_handler<S, I, D, A>(
    State(service): State<Arc<SchedulingService<S, I, D, A>>>,
    Path(schedule_id): Path<String>,
    axum::Json(request): axum::Json<UpdateScheduleRequest>,
) -> Response
where
    S: ScheduleRepository + 'static,
    I: InterviewRepository + 'static,
    D: InterviewerDirectory + 'static,
    A: ApplicationRepository + 'static,
{
    match service
        .schedules()
        .update_schedule(&ScheduleId(schedule_id), request.kind, request.notes)
    {
        Ok(schedule) => (StatusCode::OK, axum::Json(schedule)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_schedule_handler<S, I, D, A>(
    State(service): State<Arc<SchedulingService<S, I, D, A>>>,
    Path(schedule_id): Path<String>,
) -> Response
where
    S: ScheduleRepository + 'static,
    I: InterviewRepository + 'static,
    D: InterviewerDirectory + 'static,
    A: ApplicationRepository + 'static,
{
    match service
        .schedules()
        .delete_schedule_permanently(&ScheduleId(schedule_id))
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn workload_handler<S, I, D, A>(
    State(service): State<Arc<SchedulingService<S, I, D, A>>>,
    Path(year): Path<i32>,
) -> Response
where
    S: ScheduleRepository + 'static,
    I: InterviewRepository + 'static,
    D: InterviewerDirectory + 'static,
    A: ApplicationRepository + 'static,
{
    match service.schedules().workload_statistics(year) {
        Ok(workloads) => (StatusCode::OK, axum::Json(workloads)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn book_handler<S, I, D, A>(
    State(service): State<Arc<SchedulingService<S, I, D, A>>>,
    axum::Json(request): axum::Json<BookingRequest>,
) -> Response
where
    S: ScheduleRepository + 'static,
    I: InterviewRepository + 'static,
    D: InterviewerDirectory + 'static,
    A: ApplicationRepository + 'static,
{
    match service.book_interview(request) {
        Ok(interview) => (StatusCode::CREATED, axum::Json(interview)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn interview_status_handler<S, I, D, A>(
    State(service): State<Arc<SchedulingService<S, I, D, A>>>,
    Path(interview_id): Path<String>,
    axum::Json(request): axum::Json<InterviewStatusRequest>,
) -> Response
where
    S: ScheduleRepository + 'static,
    I: InterviewRepository + 'static,
    D: InterviewerDirectory + 'static,
    A: ApplicationRepository + 'static,
{
    match service
        .booking()
        .update_status(&InterviewId(interview_id), request.status)
    {
        Ok(interview) => (StatusCode::OK, axum::Json(interview)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reschedule_handler<S, I, D, A>(
    State(service): State<Arc<SchedulingService<S, I, D, A>>>,
    Path(interview_id): Path<String>,
    axum::Json(request): axum::Json<RescheduleRequest>,
) -> Response
where
    S: ScheduleRepository + 'static,
    I: InterviewRepository + 'static,
    D: InterviewerDirectory + 'static,
    A: ApplicationRepository + 'static,
{
    match service.booking().reschedule(
        &InterviewId(interview_id),
        request.date,
        request.time,
        request.duration_minutes,
    ) {
        Ok(interview) => (StatusCode::OK, axum::Json(interview)).into_response(),
        Err(error) => error_response(error),
    }
}

fn bad_time(raw: &str) -> Response {
    let payload = json!({
        "error": format!("invalid time '{raw}', expected HH:MM or HH:MM:SS"),
    });
    (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
}

fn error_response(error: SchedulingError) -> Response {
    let status = match &error {
        SchedulingError::SchedulingConflict { .. }
        | SchedulingError::Unavailable { .. }
        | SchedulingError::Repository(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
        SchedulingError::IneligibleInterviewer { .. }
        | SchedulingError::InactiveInterviewer(_)
        | SchedulingError::InvalidSchedule(_)
        | SchedulingError::InvalidInterviewTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        SchedulingError::NotFound { .. } | SchedulingError::Repository(RepositoryError::NotFound) => {
            StatusCode::NOT_FOUND
        }
        SchedulingError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let mut payload = json!({ "error": error.to_string() });
    if let SchedulingError::Unavailable { reason, .. } = &error {
        payload["reason"] = json!(reason);
    }
    (status, axum::Json(payload)).into_response()
}
