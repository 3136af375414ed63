use admissions::config::SchedulingConfig;
use admissions::error::AppError;
use admissions::store::InMemoryStore;
use admissions::workflows::admission::{
    ApplicationId, ApplicationRecord, ApplicationStatus, EvaluationType, GuardianContact,
    StudentSummary, WorkflowError, WorkflowOrchestrator,
};
use admissions::workflows::scheduling::{
    BookingRequest, InterviewMode, InterviewType, Interviewer, SchedulingService, StaffRole,
    UserId, WeeklyPattern,
};
use chrono::{Datelike, Days, NaiveDate, NaiveTime, Weekday};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type Orchestrator = WorkflowOrchestrator<InMemoryStore, InMemoryStore, InMemoryStore>;
pub(crate) type Scheduling = SchedulingService<InMemoryStore, InMemoryStore, InMemoryStore, InMemoryStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Orchestrator and scheduling service sharing one store.
pub(crate) struct Services {
    pub(crate) store: InMemoryStore,
    pub(crate) orchestrator: Arc<Orchestrator>,
    pub(crate) scheduling: Arc<Scheduling>,
}

impl Services {
    pub(crate) fn in_memory(config: SchedulingConfig) -> Self {
        let store = InMemoryStore::new();
        let shared = Arc::new(store.clone());
        let orchestrator = WorkflowOrchestrator::new(shared.clone(), shared.clone(), shared.clone());
        let scheduling = SchedulingService::new(
            shared.clone(),
            shared.clone(),
            shared.clone(),
            shared,
            config,
        );
        Self {
            store,
            orchestrator: Arc::new(orchestrator),
            scheduling: Arc::new(scheduling),
        }
    }
}

pub(crate) const PSYCHOLOGIST: &str = "psy-soto";
pub(crate) const DIRECTOR: &str = "dir-mella";
pub(crate) const TEACHER: &str = "teacher-vidal";

fn staff() -> [Interviewer; 3] {
    let member = |id: &str, name: &str, role| Interviewer {
        id: UserId(id.to_string()),
        name: name.to_string(),
        role,
        active: true,
    };
    [
        member(PSYCHOLOGIST, "Paula Soto", StaffRole::Psychologist),
        member(DIRECTOR, "Diana Mella", StaffRole::CycleDirector),
        member(TEACHER, "Tomas Vidal", StaffRole::Teacher),
    ]
}

pub(crate) fn applicant(
    id: &str,
    student: &str,
    grade: &str,
    guardian: &str,
    submitted_on: NaiveDate,
) -> ApplicationRecord {
    ApplicationRecord {
        id: ApplicationId(id.to_string()),
        status: ApplicationStatus::Pending,
        student: StudentSummary {
            full_name: student.to_string(),
            grade_applied: grade.to_string(),
            birth_date: None,
        },
        guardians: vec![GuardianContact {
            full_name: guardian.to_string(),
            relationship: "guardian".to_string(),
            email: format!(
                "{}@example.com",
                guardian.to_ascii_lowercase().replace(' ', ".")
            ),
        }],
        documents_complete: true,
        submitted_on,
    }
}

/// First Tuesday on or after `from`.
pub(crate) fn next_tuesday(from: NaiveDate) -> NaiveDate {
    let offset = (7 + Weekday::Tue.num_days_from_monday() - from.weekday().num_days_from_monday()) % 7;
    from.checked_add_days(Days::new(u64::from(offset)))
        .unwrap_or(from)
}

pub(crate) fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// Staff with weekday availability, plus applications at different stages of completion.
pub(crate) fn seed_demo_data(services: &Services, interview_day: NaiveDate) -> Result<(), AppError> {
    let year = interview_day.year();
    let submitted_on = interview_day
        .checked_sub_days(Days::new(14))
        .unwrap_or(interview_day);
    for member in staff() {
        services
            .store
            .seed_interviewer(member.clone())
            .map_err(WorkflowError::from)?;
        let patterns: Vec<_> = [Weekday::Mon, Weekday::Tue, Weekday::Thu]
            .into_iter()
            .map(|day_of_week| WeeklyPattern {
                day_of_week,
                start: time(9, 0),
                end: time(13, 0),
            })
            .collect();
        services
            .scheduling
            .create_recurring_schedules(&member.id, year, &patterns, None)?;
    }

    let fresh = applicant("app-001", "Martina Rojas", "Kinder", "Andres Rojas", submitted_on);
    let assigned = applicant("app-002", "Lucas Fuentes", "1 Basico", "Carla Fuentes", submitted_on);
    let interviewed = applicant("app-003", "Sofia Herrera", "3 Basico", "Paz Herrera", submitted_on);
    let mut missing_documents =
        applicant("app-004", "Benjamin Araya", "2 Medio", "Luis Araya", submitted_on);
    missing_documents.documents_complete = false;

    for record in [&fresh, &assigned, &interviewed, &missing_documents] {
        services
            .store
            .seed_application(record.clone())
            .map_err(WorkflowError::from)?;
    }

    for record in [&assigned, &interviewed, &missing_documents] {
        services.orchestrator.assign_evaluator(
            &record.id,
            EvaluationType::LanguageExam,
            UserId(TEACHER.to_string()),
        )?;
    }

    services.scheduling.book_interview(BookingRequest {
        application_id: interviewed.id.clone(),
        interviewer_id: UserId(PSYCHOLOGIST.to_string()),
        interview_type: InterviewType::Family,
        mode: InterviewMode::InPerson,
        date: interview_day,
        time: time(9, 0),
        duration_minutes: None,
    })?;

    Ok(())
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
