use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use tracing::debug;

use super::conflict::{AvailabilityCheck, ConflictDetector};
use super::domain::{InterviewType, Interviewer, UserId};
use super::repository::{InterviewRepository, InterviewerDirectory, ScheduleRepository};
use crate::workflows::repository::RepositoryError;

#[derive(Debug, Clone, Serialize)]
pub struct CandidateAvailability {
    pub interviewer: Interviewer,
    pub check: AvailabilityCheck,
}

/// Finds interviewers who can take a requested slot.
pub struct AvailabilityResolver<S, I, D> {
    detector: ConflictDetector<S, I>,
    directory: Arc<D>,
}

impl<S, I, D> AvailabilityResolver<S, I, D>
where
    S: ScheduleRepository,
    I: InterviewRepository,
    D: InterviewerDirectory,
{
    pub fn new(schedules: Arc<S>, interviews: Arc<I>, directory: Arc<D>) -> Self {
        Self {
            detector: ConflictDetector::new(schedules, interviews),
            directory,
        }
    }

    pub fn detector(&self) -> &ConflictDetector<S, I> {
        &self.detector
    }

    pub fn interviewer(&self, id: &UserId) -> Result<Option<Interviewer>, RepositoryError> {
        self.directory.interviewer(id)
    }

    /// Active interviewers, restricted to eligible roles when a type is given.
    pub fn candidates(
        &self,
        interview_type: Option<InterviewType>,
    ) -> Result<Vec<Interviewer>, RepositoryError> {
        Ok(self
            .directory
            .interviewers()?
            .into_iter()
            .filter(|interviewer| interviewer.active)
            .filter(|interviewer| {
                interview_type.map_or(true, |kind| kind.accepts(interviewer.role))
            })
            .collect())
    }

    /// Every candidate with its verdict, available or not.
    pub fn assess(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        duration_minutes: u32,
        interview_type: Option<InterviewType>,
    ) -> Result<Vec<CandidateAvailability>, RepositoryError> {
        self.candidates(interview_type)?
            .into_iter()
            .map(|interviewer| {
                let check = self
                    .detector
                    .check(&interviewer.id, date, time, duration_minutes)?;
                Ok(CandidateAvailability { interviewer, check })
            })
            .collect()
    }

    pub fn find_available(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        duration_minutes: u32,
        interview_type: Option<InterviewType>,
    ) -> Result<Vec<Interviewer>, RepositoryError> {
        let assessed = self.assess(date, time, duration_minutes, interview_type)?;
        let total = assessed.len();
        let available: Vec<Interviewer> = assessed
            .into_iter()
            .filter(|candidate| candidate.check.available)
            .map(|candidate| candidate.interviewer)
            .collect();

        debug!(
            %date,
            %time,
            duration_minutes,
            candidates = total,
            available = available.len(),
            "resolved interviewer availability"
        );
        Ok(available)
    }

    /// Unknown interviewers are simply unavailable.
    pub fn is_interviewer_available(
        &self,
        interviewer: &UserId,
        date: NaiveDate,
        time: NaiveTime,
        duration_minutes: u32,
    ) -> Result<bool, RepositoryError> {
        match self.interviewer(interviewer)? {
            Some(found) if found.active => {
                self.detector
                    .is_available(interviewer, date, time, duration_minutes)
            }
            _ => Ok(false),
        }
    }
}
