use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::response::Response;
use chrono::{NaiveDate, NaiveTime};
use serde_json::Value;

use crate::store::InMemoryStore;
use crate::workflows::admission::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, Evaluation, EvaluationId,
    EvaluationStatus, EvaluationType, GuardianContact, StudentSummary,
};
use crate::workflows::admission::repository::{ApplicationRepository, EvaluationRepository};
use crate::workflows::admission::WorkflowOrchestrator;
use crate::workflows::repository::RepositoryError;
use crate::workflows::scheduling::domain::{
    Interview, InterviewId, InterviewMode, InterviewStatus, InterviewType, UserId,
};
use crate::workflows::scheduling::repository::InterviewRepository;

pub(super) type MemoryOrchestrator = WorkflowOrchestrator<InMemoryStore, InMemoryStore, InMemoryStore>;

pub(super) fn app_id(raw: &str) -> ApplicationId {
    ApplicationId(raw.to_string())
}

pub(super) fn application(id: &str, status: ApplicationStatus) -> ApplicationRecord {
    ApplicationRecord {
        id: app_id(id),
        status,
        student: StudentSummary {
            full_name: format!("Student {id}"),
            grade_applied: "1 Basico".to_string(),
            birth_date: NaiveDate::from_ymd_opt(2018, 5, 14),
        },
        guardians: vec![GuardianContact {
            full_name: "Carla Fuentes".to_string(),
            relationship: "mother".to_string(),
            email: "carla@example.com".to_string(),
        }],
        documents_complete: true,
        submitted_on: NaiveDate::from_ymd_opt(2025, 1, 6).expect("valid date"),
    }
}

pub(super) fn evaluation(application: &str, suffix: &str, status: EvaluationStatus) -> Evaluation {
    Evaluation {
        id: EvaluationId(format!("eval-{application}-{suffix}")),
        application_id: app_id(application),
        evaluation_type: EvaluationType::LanguageExam,
        status,
        evaluator_id: UserId("teacher-1".to_string()),
    }
}

/// Interview at `hour`:00 with a dedicated interviewer so fixtures never collide.
pub(super) fn interview(application: &str, hour: u32, status: InterviewStatus) -> Interview {
    Interview {
        id: InterviewId(format!("int-{application}-{hour}")),
        application_id: app_id(application),
        interviewer_id: UserId(format!("psy-{application}")),
        interview_type: InterviewType::Family,
        mode: InterviewMode::InPerson,
        status,
        scheduled_date: NaiveDate::from_ymd_opt(2025, 3, 4).expect("valid date"),
        scheduled_time: NaiveTime::from_hms_opt(hour, 0, 0).expect("valid time"),
        duration_minutes: 45,
    }
}

pub(super) fn build_orchestrator() -> (Arc<MemoryOrchestrator>, InMemoryStore) {
    let store = InMemoryStore::new();
    let shared = Arc::new(store.clone());
    let orchestrator = WorkflowOrchestrator::new(shared.clone(), shared.clone(), shared);
    (Arc::new(orchestrator), store)
}

pub(super) fn seed(store: &InMemoryStore, record: ApplicationRecord) {
    store.seed_application(record).expect("application seeded");
}

pub(super) fn seed_evaluation(store: &InMemoryStore, evaluation: Evaluation) {
    store.seed_evaluation(evaluation).expect("evaluation seeded");
}

pub(super) fn seed_interview(store: &InMemoryStore, interview: Interview) {
    InterviewRepository::insert(store, interview).expect("interview seeded");
}

/// Application with complete documents, finished evaluations and a completed interview.
pub(super) fn seed_ready_for_exam(store: &InMemoryStore, id: &str, status: ApplicationStatus) {
    seed(store, application(id, status));
    seed_evaluation(store, evaluation(id, "lang", EvaluationStatus::Completed));
    seed_evaluation(store, evaluation(id, "psy", EvaluationStatus::Reviewed));
    seed_interview(store, interview(id, 9, InterviewStatus::Completed));
}

/// Store whose evaluation lookups fail for one application.
#[derive(Clone)]
pub(super) struct CorruptEvaluations {
    pub(super) inner: InMemoryStore,
    pub(super) corrupted: ApplicationId,
}

impl EvaluationRepository for CorruptEvaluations {
    fn insert(&self, evaluation: Evaluation) -> Result<Evaluation, RepositoryError> {
        EvaluationRepository::insert(&self.inner, evaluation)
    }

    fn for_application(&self, id: &ApplicationId) -> Result<Vec<Evaluation>, RepositoryError> {
        if id == &self.corrupted {
            return Err(RepositoryError::Integrity(format!(
                "evaluator reference of {id} points to a deleted user"
            )));
        }
        EvaluationRepository::for_application(&self.inner, id)
    }

    fn update_status(
        &self,
        id: &EvaluationId,
        status: EvaluationStatus,
    ) -> Result<Evaluation, RepositoryError> {
        self.inner.update_status(id, status)
    }
}

/// Store where another writer moves the application to `rival` just before the first
/// compare-and-set lands.
pub(super) struct ContendedApplications {
    pub(super) inner: InMemoryStore,
    pub(super) rival: ApplicationStatus,
    pub(super) interfered: AtomicBool,
}

impl ContendedApplications {
    pub(super) fn new(inner: InMemoryStore, rival: ApplicationStatus) -> Self {
        Self {
            inner,
            rival,
            interfered: AtomicBool::new(false),
        }
    }
}

impl ApplicationRepository for ContendedApplications {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        ApplicationRepository::insert(&self.inner, record)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        ApplicationRepository::fetch(&self.inner, id)
    }

    fn active(&self) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        self.inner.active()
    }

    fn compare_and_set_status(
        &self,
        id: &ApplicationId,
        expected: ApplicationStatus,
        next: ApplicationStatus,
    ) -> Result<bool, RepositoryError> {
        if !self.interfered.swap(true, Ordering::SeqCst) {
            self.inner.compare_and_set_status(id, expected, self.rival)?;
        }
        self.inner.compare_and_set_status(id, expected, next)
    }
}

pub(super) struct UnavailableApplications;

impl ApplicationRepository for UnavailableApplications {
    fn insert(&self, _record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn active(&self) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn compare_and_set_status(
        &self,
        _id: &ApplicationId,
        _expected: ApplicationStatus,
        _next: ApplicationStatus,
    ) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
