//! Process-local store implementing every repository trait.
//!
//! One mutex guards all collections so compare-and-set and overlap-checked inserts are
//! atomic with respect to each other.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Datelike, NaiveDate};

use crate::workflows::admission::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, Evaluation, EvaluationId,
    EvaluationStatus,
};
use crate::workflows::admission::repository::{ApplicationRepository, EvaluationRepository};
use crate::workflows::repository::RepositoryError;
use crate::workflows::scheduling::domain::{
    Interview, InterviewId, Interviewer, InterviewerSchedule, ScheduleId, UserId,
};
use crate::workflows::scheduling::repository::{
    InterviewRepository, InterviewerDirectory, ScheduleRepository,
};

#[derive(Debug, Default)]
struct StoreState {
    applications: BTreeMap<ApplicationId, ApplicationRecord>,
    evaluations: BTreeMap<EvaluationId, Evaluation>,
    interviewers: BTreeMap<UserId, Interviewer>,
    schedules: BTreeMap<ScheduleId, InterviewerSchedule>,
    interviews: BTreeMap<InterviewId, Interview>,
}

impl StoreState {
    /// First slot-occupying interview of the same interviewer and date that overlaps.
    fn overlapping(&self, candidate: &Interview) -> Result<Option<&Interview>, RepositoryError> {
        if !candidate.status.occupies_slot() {
            return Ok(None);
        }
        let window = candidate
            .window()
            .map_err(|error| RepositoryError::Integrity(format!("{}: {error}", candidate.id)))?;

        for existing in self.interviews.values().filter(|existing| {
            existing.id != candidate.id
                && existing.interviewer_id == candidate.interviewer_id
                && existing.scheduled_date == candidate.scheduled_date
                && existing.status.occupies_slot()
        }) {
            let booked = existing
                .window()
                .map_err(|error| RepositoryError::Integrity(format!("{}: {error}", existing.id)))?;
            if booked.overlaps(&window) {
                return Ok(Some(existing));
            }
        }
        Ok(None)
    }

    fn ensure_free(&self, candidate: &Interview) -> Result<(), RepositoryError> {
        match self.overlapping(candidate)? {
            Some(existing) => Err(RepositoryError::Conflict(format!(
                "interviewer {} already booked for interview {} on {}",
                candidate.interviewer_id, existing.id, candidate.scheduled_date
            ))),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))
    }

    pub fn seed_application(&self, record: ApplicationRecord) -> Result<(), RepositoryError> {
        ApplicationRepository::insert(self, record).map(|_| ())
    }

    pub fn seed_interviewer(&self, interviewer: Interviewer) -> Result<(), RepositoryError> {
        self.lock()?
            .interviewers
            .insert(interviewer.id.clone(), interviewer);
        Ok(())
    }

    pub fn seed_evaluation(&self, evaluation: Evaluation) -> Result<(), RepositoryError> {
        EvaluationRepository::insert(self, evaluation).map(|_| ())
    }

    /// Document service hook: flips the completeness flag read by the guards.
    pub fn set_documents_complete(
        &self,
        id: &ApplicationId,
        complete: bool,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        let record = state
            .applications
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        record.documents_complete = complete;
        Ok(())
    }

    pub fn application_status(
        &self,
        id: &ApplicationId,
    ) -> Result<ApplicationStatus, RepositoryError> {
        self.lock()?
            .applications
            .get(id)
            .map(|record| record.status)
            .ok_or(RepositoryError::NotFound)
    }
}

impl ApplicationRepository for InMemoryStore {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut state = self.lock()?;
        if state.applications.contains_key(&record.id) {
            return Err(RepositoryError::Conflict(format!(
                "application {} already exists",
                record.id
            )));
        }
        state.applications.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(self.lock()?.applications.get(id).cloned())
    }

    fn active(&self) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Ok(self
            .lock()?
            .applications
            .values()
            .filter(|record| !record.status.is_terminal())
            .cloned()
            .collect())
    }

    fn compare_and_set_status(
        &self,
        id: &ApplicationId,
        expected: ApplicationStatus,
        next: ApplicationStatus,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.lock()?;
        let record = state
            .applications
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        if record.status != expected {
            return Ok(false);
        }
        record.status = next;
        Ok(true)
    }
}

impl EvaluationRepository for InMemoryStore {
    fn insert(&self, evaluation: Evaluation) -> Result<Evaluation, RepositoryError> {
        let mut state = self.lock()?;
        if !state.applications.contains_key(&evaluation.application_id) {
            return Err(RepositoryError::NotFound);
        }
        if state.evaluations.contains_key(&evaluation.id) {
            return Err(RepositoryError::Conflict(format!(
                "evaluation {} already exists",
                evaluation.id
            )));
        }
        state
            .evaluations
            .insert(evaluation.id.clone(), evaluation.clone());
        Ok(evaluation)
    }

    fn for_application(&self, id: &ApplicationId) -> Result<Vec<Evaluation>, RepositoryError> {
        Ok(self
            .lock()?
            .evaluations
            .values()
            .filter(|evaluation| &evaluation.application_id == id)
            .cloned()
            .collect())
    }

    fn update_status(
        &self,
        id: &EvaluationId,
        status: EvaluationStatus,
    ) -> Result<Evaluation, RepositoryError> {
        let mut state = self.lock()?;
        let evaluation = state
            .evaluations
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        evaluation.status = status;
        Ok(evaluation.clone())
    }
}

impl ScheduleRepository for InMemoryStore {
    fn insert(
        &self,
        schedule: InterviewerSchedule,
    ) -> Result<InterviewerSchedule, RepositoryError> {
        let mut state = self.lock()?;
        if state.schedules.contains_key(&schedule.id) {
            return Err(RepositoryError::Conflict(format!(
                "schedule {} already exists",
                schedule.id
            )));
        }
        state.schedules.insert(schedule.id.clone(), schedule.clone());
        Ok(schedule)
    }

    fn update(&self, schedule: InterviewerSchedule) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        let slot = state
            .schedules
            .get_mut(&schedule.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = schedule;
        Ok(())
    }

    fn fetch(&self, id: &ScheduleId) -> Result<Option<InterviewerSchedule>, RepositoryError> {
        Ok(self.lock()?.schedules.get(id).cloned())
    }

    fn for_interviewer(
        &self,
        interviewer: &UserId,
    ) -> Result<Vec<InterviewerSchedule>, RepositoryError> {
        Ok(self
            .lock()?
            .schedules
            .values()
            .filter(|schedule| &schedule.interviewer_id == interviewer)
            .cloned()
            .collect())
    }

    fn delete(&self, id: &ScheduleId) -> Result<(), RepositoryError> {
        self.lock()?
            .schedules
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

impl InterviewRepository for InMemoryStore {
    fn insert(&self, interview: Interview) -> Result<Interview, RepositoryError> {
        let mut state = self.lock()?;
        if state.interviews.contains_key(&interview.id) {
            return Err(RepositoryError::Conflict(format!(
                "interview {} already exists",
                interview.id
            )));
        }
        state.ensure_free(&interview)?;
        state
            .interviews
            .insert(interview.id.clone(), interview.clone());
        Ok(interview)
    }

    fn update(&self, interview: Interview) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        if !state.interviews.contains_key(&interview.id) {
            return Err(RepositoryError::NotFound);
        }
        state.ensure_free(&interview)?;
        state.interviews.insert(interview.id.clone(), interview);
        Ok(())
    }

    fn fetch(&self, id: &InterviewId) -> Result<Option<Interview>, RepositoryError> {
        Ok(self.lock()?.interviews.get(id).cloned())
    }

    fn for_application(&self, id: &ApplicationId) -> Result<Vec<Interview>, RepositoryError> {
        Ok(self
            .lock()?
            .interviews
            .values()
            .filter(|interview| &interview.application_id == id)
            .cloned()
            .collect())
    }

    fn for_interviewer_on(
        &self,
        interviewer: &UserId,
        date: NaiveDate,
    ) -> Result<Vec<Interview>, RepositoryError> {
        Ok(self
            .lock()?
            .interviews
            .values()
            .filter(|interview| {
                &interview.interviewer_id == interviewer && interview.scheduled_date == date
            })
            .cloned()
            .collect())
    }

    fn in_year(&self, year: i32) -> Result<Vec<Interview>, RepositoryError> {
        Ok(self
            .lock()?
            .interviews
            .values()
            .filter(|interview| interview.scheduled_date.year() == year)
            .cloned()
            .collect())
    }
}

impl InterviewerDirectory for InMemoryStore {
    fn interviewer(&self, id: &UserId) -> Result<Option<Interviewer>, RepositoryError> {
        Ok(self.lock()?.interviewers.get(id).cloned())
    }

    fn interviewers(&self) -> Result<Vec<Interviewer>, RepositoryError> {
        Ok(self.lock()?.interviewers.values().cloned().collect())
    }
}
