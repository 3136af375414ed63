use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::conflict::{ConflictDetector, Unavailability};
use super::domain::{
    Interview, InterviewId, InterviewMode, InterviewStatus, InterviewType, Interviewer,
    StaffRole, UserId,
};
use super::repository::{InterviewRepository, InterviewerDirectory, ScheduleRepository};
use crate::config::SchedulingConfig;
use crate::workflows::admission::domain::ApplicationId;
use crate::workflows::admission::repository::ApplicationRepository;
use crate::workflows::repository::RepositoryError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub application_id: ApplicationId,
    pub interviewer_id: UserId,
    pub interview_type: InterviewType,
    pub mode: InterviewMode,
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// Falls back to the configured default interview length.
    #[serde(default)]
    pub duration_minutes: Option<u32>,
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("scheduling conflict for interviewer {interviewer_id} on {date}: {detail}")]
    SchedulingConflict {
        interviewer_id: UserId,
        date: NaiveDate,
        detail: String,
    },
    #[error("interviewer {interviewer_id} is not available on {date}: {reason}")]
    Unavailable {
        interviewer_id: UserId,
        date: NaiveDate,
        reason: Unavailability,
    },
    #[error("interviewer {interviewer_id} ({}) cannot conduct {interview_type:?} interviews", role.label())]
    IneligibleInterviewer {
        interviewer_id: UserId,
        role: StaffRole,
        interview_type: InterviewType,
    },
    #[error("interviewer {0} is inactive")]
    InactiveInterviewer(UserId),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),
    #[error("interview {id} cannot move from {from} to {to}")]
    InvalidInterviewTransition {
        id: InterviewId,
        from: InterviewStatus,
        to: InterviewStatus,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// One mutex per interviewer so availability checks and writes do not interleave.
#[derive(Debug, Default)]
struct InterviewerLocks {
    locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl InterviewerLocks {
    fn for_interviewer(&self, id: &UserId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(id.clone()).or_default().clone()
    }
}

static INTERVIEW_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_interview_id() -> InterviewId {
    let id = INTERVIEW_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    InterviewId(format!("int-{id:06}"))
}

/// Books, reschedules and moves interviews through their status machine.
pub struct InterviewBooking<S, I, D, A> {
    detector: ConflictDetector<S, I>,
    interviews: Arc<I>,
    directory: Arc<D>,
    applications: Arc<A>,
    config: SchedulingConfig,
    locks: InterviewerLocks,
}

impl<S, I, D, A> InterviewBooking<S, I, D, A>
where
    S: ScheduleRepository,
    I: InterviewRepository,
    D: InterviewerDirectory,
    A: ApplicationRepository,
{
    pub fn new(
        schedules: Arc<S>,
        interviews: Arc<I>,
        directory: Arc<D>,
        applications: Arc<A>,
        config: SchedulingConfig,
    ) -> Self {
        Self {
            detector: ConflictDetector::new(schedules, interviews.clone()),
            interviews,
            directory,
            applications,
            config,
            locks: InterviewerLocks::default(),
        }
    }

    /// Book an interview; availability is re-checked under the interviewer's lock.
    pub fn book(&self, request: BookingRequest) -> Result<Interview, SchedulingError> {
        if self.applications.fetch(&request.application_id)?.is_none() {
            return Err(SchedulingError::NotFound {
                entity: "application",
                id: request.application_id.to_string(),
            });
        }
        let interviewer = self.bookable_interviewer(&request.interviewer_id)?;
        if !request.interview_type.accepts(interviewer.role) {
            return Err(SchedulingError::IneligibleInterviewer {
                interviewer_id: interviewer.id,
                role: interviewer.role,
                interview_type: request.interview_type,
            });
        }
        let duration_minutes = self.duration(request.duration_minutes)?;

        let lock = self.locks.for_interviewer(&interviewer.id);
        let _serialized = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let check = self.detector.check(
            &interviewer.id,
            request.date,
            request.time,
            duration_minutes,
        )?;
        if let Some(reason) = check.reason {
            return Err(refusal(interviewer.id, request.date, reason));
        }

        let interview = Interview {
            id: next_interview_id(),
            application_id: request.application_id,
            interviewer_id: interviewer.id,
            interview_type: request.interview_type,
            mode: request.mode,
            status: InterviewStatus::Scheduled,
            scheduled_date: request.date,
            scheduled_time: request.time,
            duration_minutes,
        };
        let stored = self
            .interviews
            .insert(interview)
            .map_err(|error| write_conflict(&request.interviewer_id, request.date, error))?;

        info!(
            interview = %stored.id,
            application = %stored.application_id,
            interviewer = %stored.interviewer_id,
            date = %stored.scheduled_date,
            time = %stored.scheduled_time,
            duration_minutes,
            "interview booked"
        );
        Ok(stored)
    }

    pub fn update_status(
        &self,
        id: &InterviewId,
        next: InterviewStatus,
    ) -> Result<Interview, SchedulingError> {
        let interviewer = self.interview(id)?.interviewer_id;
        let lock = self.locks.for_interviewer(&interviewer);
        let _serialized = lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Re-read under the lock so the status machine sees the latest write.
        let mut interview = self.interview(id)?;
        if !interview.status.can_transition_to(next) {
            return Err(SchedulingError::InvalidInterviewTransition {
                id: interview.id,
                from: interview.status,
                to: next,
            });
        }

        let from = interview.status;
        interview.status = next;
        self.interviews.update(interview.clone())?;
        info!(interview = %interview.id, %from, to = %next, "interview status changed");
        Ok(interview)
    }

    pub fn cancel(&self, id: &InterviewId) -> Result<Interview, SchedulingError> {
        self.update_status(id, InterviewStatus::Cancelled)
    }

    /// Move a scheduled or confirmed interview; it returns to `SCHEDULED`.
    pub fn reschedule(
        &self,
        id: &InterviewId,
        date: NaiveDate,
        time: NaiveTime,
        duration_minutes: Option<u32>,
    ) -> Result<Interview, SchedulingError> {
        let interviewer = self.interview(id)?.interviewer_id;
        let lock = self.locks.for_interviewer(&interviewer);
        let _serialized = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut interview = self.interview(id)?;
        if !matches!(
            interview.status,
            InterviewStatus::Scheduled | InterviewStatus::Confirmed
        ) {
            return Err(SchedulingError::InvalidInterviewTransition {
                id: interview.id,
                from: interview.status,
                to: InterviewStatus::Scheduled,
            });
        }
        let duration_minutes =
            self.duration(duration_minutes.or(Some(interview.duration_minutes)))?;

        let check = self.detector.check_excluding(
            &interview.interviewer_id,
            date,
            time,
            duration_minutes,
            Some(&interview.id),
        )?;
        if let Some(reason) = check.reason {
            return Err(refusal(interview.interviewer_id, date, reason));
        }

        interview.scheduled_date = date;
        interview.scheduled_time = time;
        interview.duration_minutes = duration_minutes;
        interview.status = InterviewStatus::Scheduled;
        self.interviews
            .update(interview.clone())
            .map_err(|error| write_conflict(&interview.interviewer_id, date, error))?;

        info!(
            interview = %interview.id,
            date = %date,
            time = %time,
            "interview rescheduled"
        );
        Ok(interview)
    }

    fn interview(&self, id: &InterviewId) -> Result<Interview, SchedulingError> {
        self.interviews
            .fetch(id)?
            .ok_or_else(|| SchedulingError::NotFound {
                entity: "interview",
                id: id.to_string(),
            })
    }

    fn bookable_interviewer(&self, id: &UserId) -> Result<Interviewer, SchedulingError> {
        let interviewer = self
            .directory
            .interviewer(id)?
            .ok_or_else(|| SchedulingError::NotFound {
                entity: "interviewer",
                id: id.to_string(),
            })?;
        if !interviewer.active {
            return Err(SchedulingError::InactiveInterviewer(interviewer.id));
        }
        Ok(interviewer)
    }

    fn duration(&self, requested: Option<u32>) -> Result<u32, SchedulingError> {
        let minutes = requested.unwrap_or(self.config.default_interview_minutes);
        if minutes == 0 || minutes > self.config.max_interview_minutes {
            return Err(SchedulingError::InvalidSchedule(format!(
                "interview duration must be between 1 and {} minutes, got {minutes}",
                self.config.max_interview_minutes
            )));
        }
        Ok(minutes)
    }
}

fn refusal(interviewer_id: UserId, date: NaiveDate, reason: Unavailability) -> SchedulingError {
    match reason {
        Unavailability::Conflict { .. } => SchedulingError::SchedulingConflict {
            interviewer_id,
            date,
            detail: reason.to_string(),
        },
        Unavailability::InvalidRequest { detail } => SchedulingError::InvalidSchedule(detail),
        reason => SchedulingError::Unavailable {
            interviewer_id,
            date,
            reason,
        },
    }
}

fn write_conflict(interviewer: &UserId, date: NaiveDate, error: RepositoryError) -> SchedulingError {
    match error {
        RepositoryError::Conflict(detail) => {
            warn!(%interviewer, %date, %detail, "booking rejected at write time");
            SchedulingError::SchedulingConflict {
                interviewer_id: interviewer.clone(),
                date,
                detail,
            }
        }
        other => SchedulingError::Repository(other),
    }
}
