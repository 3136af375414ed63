use std::fmt;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime};
use serde::Serialize;

use super::domain::{InterviewId, TimeWindow, UserId};
use super::expander::{DayAvailability, RecurringScheduleExpander};
use super::repository::{InterviewRepository, ScheduleRepository};
use crate::workflows::admission::domain::ApplicationId;
use crate::workflows::repository::RepositoryError;

/// Why a requested slot cannot be booked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Unavailability {
    InvalidRequest {
        detail: String,
    },
    Blackout {
        date: NaiveDate,
        notes: Option<String>,
    },
    NoAvailabilityDeclared {
        date: NaiveDate,
    },
    OutsideAvailability {
        requested: TimeWindow,
        available: Vec<TimeWindow>,
    },
    Conflict {
        interview_id: InterviewId,
        application_id: ApplicationId,
        window: TimeWindow,
    },
}

impl fmt::Display for Unavailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRequest { detail } => write!(f, "invalid request: {detail}"),
            Self::Blackout { date, notes } => {
                write!(f, "{date} is blocked out")?;
                if let Some(notes) = notes {
                    write!(f, " ({notes})")?;
                }
                Ok(())
            }
            Self::NoAvailabilityDeclared { date } => {
                write!(f, "no availability declared for {date}")
            }
            Self::OutsideAvailability {
                requested,
                available,
            } => {
                let windows = available
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(
                    f,
                    "{requested} is outside the declared availability ({windows})"
                )
            }
            Self::Conflict {
                interview_id,
                application_id,
                window,
            } => write!(
                f,
                "overlaps interview {interview_id} for application {application_id} at {window}"
            ),
        }
    }
}

/// Verdict for one requested slot; `reason` is set whenever `available` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityCheck {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested: Option<TimeWindow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<Unavailability>,
}

impl AvailabilityCheck {
    fn available(requested: TimeWindow) -> Self {
        Self {
            available: true,
            requested: Some(requested),
            reason: None,
        }
    }

    fn refused(requested: Option<TimeWindow>, reason: Unavailability) -> Self {
        Self {
            available: false,
            requested,
            reason: Some(reason),
        }
    }

    pub fn explanation(&self) -> String {
        match &self.reason {
            Some(reason) => reason.to_string(),
            None => "slot is available".to_string(),
        }
    }
}

/// Checks requested windows against declared availability and existing bookings.
pub struct ConflictDetector<S, I> {
    expander: RecurringScheduleExpander<S>,
    interviews: Arc<I>,
}

impl<S, I> ConflictDetector<S, I>
where
    S: ScheduleRepository,
    I: InterviewRepository,
{
    pub fn new(schedules: Arc<S>, interviews: Arc<I>) -> Self {
        Self {
            expander: RecurringScheduleExpander::new(schedules),
            interviews,
        }
    }

    pub fn expander(&self) -> &RecurringScheduleExpander<S> {
        &self.expander
    }

    pub fn check(
        &self,
        interviewer: &UserId,
        date: NaiveDate,
        time: NaiveTime,
        duration_minutes: u32,
    ) -> Result<AvailabilityCheck, RepositoryError> {
        self.check_excluding(interviewer, date, time, duration_minutes, None)
    }

    /// Like [`check`](Self::check), ignoring one existing interview (used when rescheduling).
    pub fn check_excluding(
        &self,
        interviewer: &UserId,
        date: NaiveDate,
        time: NaiveTime,
        duration_minutes: u32,
        ignore: Option<&InterviewId>,
    ) -> Result<AvailabilityCheck, RepositoryError> {
        let requested = match TimeWindow::starting_at(time, duration_minutes) {
            Ok(window) => window,
            Err(error) => {
                return Ok(AvailabilityCheck::refused(
                    None,
                    Unavailability::InvalidRequest {
                        detail: error.to_string(),
                    },
                ))
            }
        };

        let windows = match self.expander.day_availability(interviewer, date)? {
            DayAvailability::Blackout { notes } => {
                return Ok(AvailabilityCheck::refused(
                    Some(requested),
                    Unavailability::Blackout { date, notes },
                ))
            }
            DayAvailability::Windows { windows } => windows,
        };

        if windows.is_empty() {
            return Ok(AvailabilityCheck::refused(
                Some(requested),
                Unavailability::NoAvailabilityDeclared { date },
            ));
        }
        if !windows.iter().any(|window| window.contains(&requested)) {
            return Ok(AvailabilityCheck::refused(
                Some(requested),
                Unavailability::OutsideAvailability {
                    requested,
                    available: windows,
                },
            ));
        }

        let booked = self.booked_windows(interviewer, date, ignore)?;
        if let Some((interview_id, application_id, window)) = booked
            .into_iter()
            .find(|(_, _, window)| window.overlaps(&requested))
        {
            return Ok(AvailabilityCheck::refused(
                Some(requested),
                Unavailability::Conflict {
                    interview_id,
                    application_id,
                    window,
                },
            ));
        }

        Ok(AvailabilityCheck::available(requested))
    }

    pub fn is_available(
        &self,
        interviewer: &UserId,
        date: NaiveDate,
        time: NaiveTime,
        duration_minutes: u32,
    ) -> Result<bool, RepositoryError> {
        Ok(self
            .check(interviewer, date, time, duration_minutes)?
            .available)
    }

    /// Start times, stepping by `step_minutes` from each window start, that pass the check.
    pub fn free_slots(
        &self,
        interviewer: &UserId,
        date: NaiveDate,
        duration_minutes: u32,
        step_minutes: u32,
    ) -> Result<Vec<NaiveTime>, RepositoryError> {
        if duration_minutes == 0 || step_minutes == 0 {
            return Ok(Vec::new());
        }

        let windows = self.expander.windows_on(interviewer, date)?;
        let booked = self.booked_windows(interviewer, date, None)?;
        let step = Duration::minutes(i64::from(step_minutes));
        let mut slots = Vec::new();

        for window in windows {
            let mut start = window.start();
            while let Ok(candidate) = TimeWindow::starting_at(start, duration_minutes) {
                if !window.contains(&candidate) {
                    break;
                }
                if !booked.iter().any(|(_, _, taken)| taken.overlaps(&candidate)) {
                    slots.push(start);
                }
                let (next, wrapped) = start.overflowing_add_signed(step);
                if wrapped != 0 {
                    break;
                }
                start = next;
            }
        }
        Ok(slots)
    }

    fn booked_windows(
        &self,
        interviewer: &UserId,
        date: NaiveDate,
        ignore: Option<&InterviewId>,
    ) -> Result<Vec<(InterviewId, ApplicationId, TimeWindow)>, RepositoryError> {
        self.interviews
            .for_interviewer_on(interviewer, date)?
            .into_iter()
            .filter(|interview| interview.status.occupies_slot())
            .filter(|interview| Some(&interview.id) != ignore)
            .map(|interview| {
                let window = interview.window().map_err(|error| {
                    RepositoryError::Integrity(format!("interview {}: {error}", interview.id))
                })?;
                Ok((interview.id, interview.application_id, window))
            })
            .collect()
    }
}
