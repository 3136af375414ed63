use serde::Serialize;

use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, Evaluation, EvaluationId,
    EvaluationStatus,
};
use super::transitions::valid_transitions;
use crate::workflows::repository::RepositoryError;

/// Storage abstraction for applications so the workflow can be exercised in isolation.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError>;
    /// Every application whose status is not terminal.
    fn active(&self) -> Result<Vec<ApplicationRecord>, RepositoryError>;
    /// Atomically replace the status only if it still equals `expected`.
    ///
    /// Returns `Ok(false)` when another writer changed the status first.
    fn compare_and_set_status(
        &self,
        id: &ApplicationId,
        expected: ApplicationStatus,
        next: ApplicationStatus,
    ) -> Result<bool, RepositoryError>;
}

pub trait EvaluationRepository: Send + Sync {
    fn insert(&self, evaluation: Evaluation) -> Result<Evaluation, RepositoryError>;
    fn for_application(&self, id: &ApplicationId) -> Result<Vec<Evaluation>, RepositoryError>;
    /// Record an evaluator's progress; unknown ids are `NotFound`.
    fn update_status(
        &self,
        id: &EvaluationId,
        status: EvaluationStatus,
    ) -> Result<Evaluation, RepositoryError>;
}

/// Public projection of an application's workflow position.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStatusView {
    pub application_id: ApplicationId,
    pub status: &'static str,
    pub student: String,
    pub documents_complete: bool,
    pub next_statuses: Vec<&'static str>,
}

impl ApplicationRecord {
    pub fn status_view(&self) -> ApplicationStatusView {
        ApplicationStatusView {
            application_id: self.id.clone(),
            status: self.status.label(),
            student: self.student.full_name.clone(),
            documents_complete: self.documents_complete,
            next_statuses: valid_transitions(self.status)
                .iter()
                .map(|status| status.label())
                .collect(),
        }
    }
}
