use std::sync::Arc;

use axum::response::Response;
use chrono::{NaiveDate, NaiveTime, Weekday};
use serde_json::Value;

use crate::config::SchedulingConfig;
use crate::store::InMemoryStore;
use crate::workflows::admission::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, StudentSummary,
};
use crate::workflows::repository::RepositoryError;
use crate::workflows::scheduling::domain::{
    Interview, InterviewId, InterviewMode, InterviewStatus, InterviewType, Interviewer,
    StaffRole, UserId, WeeklyPattern,
};
use crate::workflows::scheduling::repository::{InterviewRepository, InterviewerDirectory};
use crate::workflows::scheduling::{BookingRequest, SchedulingService};

pub(super) type MemoryScheduling = SchedulingService<InMemoryStore, InMemoryStore, InMemoryStore, InMemoryStore>;

pub(super) const PSYCHOLOGIST: &str = "psy-1";
pub(super) const TEACHER: &str = "teacher-1";
pub(super) const DIRECTOR: &str = "director-1";
/// Applications seeded by `build_service`; bookings must reference one of them.
pub(super) const APPLICATIONS: [&str; 2] = ["app-1", "app-7"];

pub(super) fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
}

/// A Tuesday in 2025.
pub(super) fn tuesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 4).expect("valid date")
}

pub(super) fn user(raw: &str) -> UserId {
    UserId(raw.to_string())
}

pub(super) fn interviewer(id: &str, name: &str, role: StaffRole) -> Interviewer {
    Interviewer {
        id: user(id),
        name: name.to_string(),
        role,
        active: true,
    }
}

pub(super) fn application(id: &str) -> ApplicationRecord {
    ApplicationRecord {
        id: ApplicationId(id.to_string()),
        status: ApplicationStatus::UnderReview,
        student: StudentSummary {
            full_name: format!("Student {id}"),
            grade_applied: "2 Basico".to_string(),
            birth_date: None,
        },
        guardians: Vec::new(),
        documents_complete: true,
        submitted_on: NaiveDate::from_ymd_opt(2025, 1, 13).expect("valid date"),
    }
}

pub(super) fn tuesday_mornings() -> Vec<WeeklyPattern> {
    vec![WeeklyPattern {
        day_of_week: Weekday::Tue,
        start: at(9, 0),
        end: at(12, 0),
    }]
}

/// Staff of three, all declaring Tuesday 09:00-12:00 for 2025.
pub(super) fn build_service() -> (Arc<MemoryScheduling>, InMemoryStore) {
    let store = InMemoryStore::new();
    for staff in [
        interviewer(PSYCHOLOGIST, "Paula Soto", StaffRole::Psychologist),
        interviewer(TEACHER, "Tomas Vidal", StaffRole::Teacher),
        interviewer(DIRECTOR, "Diana Mella", StaffRole::CycleDirector),
    ] {
        store.seed_interviewer(staff).expect("interviewer seeded");
    }
    for id in APPLICATIONS {
        store.seed_application(application(id)).expect("application seeded");
    }

    let shared = Arc::new(store.clone());
    let service = SchedulingService::new(
        shared.clone(),
        shared.clone(),
        shared.clone(),
        shared,
        SchedulingConfig::default(),
    );
    for id in [PSYCHOLOGIST, TEACHER, DIRECTOR] {
        service
            .create_recurring_schedules(&user(id), 2025, &tuesday_mornings(), None)
            .expect("schedule declared");
    }
    (Arc::new(service), store)
}

pub(super) fn booking(interviewer: &str, time: NaiveTime, minutes: u32) -> BookingRequest {
    BookingRequest {
        application_id: ApplicationId("app-1".to_string()),
        interviewer_id: user(interviewer),
        interview_type: InterviewType::Family,
        mode: InterviewMode::InPerson,
        date: tuesday(),
        time,
        duration_minutes: Some(minutes),
    }
}

/// Interview written straight to the store, bypassing the availability check.
pub(super) fn seed_interview(store: &InMemoryStore, id: &str, interviewer: &str, time: NaiveTime) {
    let interview = Interview {
        id: InterviewId(id.to_string()),
        application_id: ApplicationId(format!("app-{id}")),
        interviewer_id: user(interviewer),
        interview_type: InterviewType::Family,
        mode: InterviewMode::InPerson,
        status: InterviewStatus::Scheduled,
        scheduled_date: tuesday(),
        scheduled_time: time,
        duration_minutes: 45,
    };
    InterviewRepository::insert(store, interview).expect("interview seeded");
}

pub(super) struct UnavailableDirectory;

impl InterviewerDirectory for UnavailableDirectory {
    fn interviewer(&self, _id: &UserId) -> Result<Option<Interviewer>, RepositoryError> {
        Err(RepositoryError::Unavailable("directory offline".to_string()))
    }

    fn interviewers(&self) -> Result<Vec<Interviewer>, RepositoryError> {
        Err(RepositoryError::Unavailable("directory offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
