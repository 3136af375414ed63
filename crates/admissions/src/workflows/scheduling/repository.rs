use chrono::NaiveDate;

use super::domain::{Interview, InterviewId, Interviewer, InterviewerSchedule, ScheduleId, UserId};
use crate::workflows::admission::domain::ApplicationId;
use crate::workflows::repository::RepositoryError;

/// Persisted interviewer availability declarations.
pub trait ScheduleRepository: Send + Sync {
    fn insert(&self, schedule: InterviewerSchedule)
        -> Result<InterviewerSchedule, RepositoryError>;
    fn update(&self, schedule: InterviewerSchedule) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ScheduleId) -> Result<Option<InterviewerSchedule>, RepositoryError>;
    /// All entries of the interviewer, inactive ones included.
    fn for_interviewer(
        &self,
        interviewer: &UserId,
    ) -> Result<Vec<InterviewerSchedule>, RepositoryError>;
    fn delete(&self, id: &ScheduleId) -> Result<(), RepositoryError>;
}

/// Booked interviews.
///
/// `insert` and `update` must refuse, with [`RepositoryError::Conflict`], any write that
/// would leave two slot-occupying interviews of one interviewer overlapping on a date.
pub trait InterviewRepository: Send + Sync {
    fn insert(&self, interview: Interview) -> Result<Interview, RepositoryError>;
    fn update(&self, interview: Interview) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &InterviewId) -> Result<Option<Interview>, RepositoryError>;
    fn for_application(&self, id: &ApplicationId) -> Result<Vec<Interview>, RepositoryError>;
    fn for_interviewer_on(
        &self,
        interviewer: &UserId,
        date: NaiveDate,
    ) -> Result<Vec<Interview>, RepositoryError>;
    fn in_year(&self, year: i32) -> Result<Vec<Interview>, RepositoryError>;
}

/// Read access to staff who can be booked.
pub trait InterviewerDirectory: Send + Sync {
    fn interviewer(&self, id: &UserId) -> Result<Option<Interviewer>, RepositoryError>;
    fn interviewers(&self) -> Result<Vec<Interviewer>, RepositoryError>;
}
