use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};

use super::availability::AvailabilityResolver;
use super::booking::{BookingRequest, InterviewBooking, SchedulingError};
use super::conflict::AvailabilityCheck;
use super::domain::{
    Interview, InterviewType, Interviewer, InterviewerSchedule, UserId, WeeklyPattern,
};
use super::expander::AvailabilityCalendar;
use super::management::ScheduleManager;
use super::repository::{InterviewRepository, InterviewerDirectory, ScheduleRepository};
use crate::config::SchedulingConfig;
use crate::workflows::admission::repository::ApplicationRepository;

/// Entry point for interviewer availability, bookings and schedule administration.
pub struct SchedulingService<S, I, D, A> {
    resolver: AvailabilityResolver<S, I, D>,
    booking: InterviewBooking<S, I, D, A>,
    schedules: ScheduleManager<S, I, D>,
    config: SchedulingConfig,
}

impl<S, I, D, A> SchedulingService<S, I, D, A>
where
    S: ScheduleRepository + 'static,
    I: InterviewRepository + 'static,
    D: InterviewerDirectory + 'static,
    A: ApplicationRepository + 'static,
{
    pub fn new(
        schedules: Arc<S>,
        interviews: Arc<I>,
        directory: Arc<D>,
        applications: Arc<A>,
        config: SchedulingConfig,
    ) -> Self {
        Self {
            resolver: AvailabilityResolver::new(
                schedules.clone(),
                interviews.clone(),
                directory.clone(),
            ),
            booking: InterviewBooking::new(
                schedules.clone(),
                interviews.clone(),
                directory.clone(),
                applications,
                config,
            ),
            schedules: ScheduleManager::new(schedules, interviews, directory),
            config,
        }
    }

    pub fn resolver(&self) -> &AvailabilityResolver<S, I, D> {
        &self.resolver
    }

    pub fn booking(&self) -> &InterviewBooking<S, I, D, A> {
        &self.booking
    }

    pub fn schedules(&self) -> &ScheduleManager<S, I, D> {
        &self.schedules
    }

    pub fn config(&self) -> &SchedulingConfig {
        &self.config
    }

    pub fn find_available_interviewers(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        duration_minutes: Option<u32>,
        interview_type: Option<InterviewType>,
    ) -> Result<Vec<Interviewer>, SchedulingError> {
        let duration_minutes = duration_minutes.unwrap_or(self.config.default_interview_minutes);
        Ok(self
            .resolver
            .find_available(date, time, duration_minutes, interview_type)?)
    }

    pub fn is_interviewer_available(
        &self,
        interviewer: &UserId,
        date: NaiveDate,
        time: NaiveTime,
        duration_minutes: u32,
    ) -> Result<bool, SchedulingError> {
        Ok(self
            .resolver
            .is_interviewer_available(interviewer, date, time, duration_minutes)?)
    }

    /// Verdict with reason for one interviewer; unknown or inactive interviewers are errors.
    pub fn check_interviewer(
        &self,
        interviewer: &UserId,
        date: NaiveDate,
        time: NaiveTime,
        duration_minutes: Option<u32>,
    ) -> Result<AvailabilityCheck, SchedulingError> {
        let found = self
            .resolver
            .interviewer(interviewer)?
            .ok_or_else(|| SchedulingError::NotFound {
                entity: "interviewer",
                id: interviewer.to_string(),
            })?;
        if !found.active {
            return Err(SchedulingError::InactiveInterviewer(found.id));
        }
        let duration_minutes = duration_minutes.unwrap_or(self.config.default_interview_minutes);
        Ok(self
            .resolver
            .detector()
            .check(interviewer, date, time, duration_minutes)?)
    }

    /// Bookable start times on `date`, stepping by the configured granularity.
    pub fn free_slots(
        &self,
        interviewer: &UserId,
        date: NaiveDate,
        duration_minutes: Option<u32>,
    ) -> Result<Vec<NaiveTime>, SchedulingError> {
        let duration_minutes = duration_minutes.unwrap_or(self.config.default_interview_minutes);
        Ok(self.resolver.detector().free_slots(
            interviewer,
            date,
            duration_minutes,
            self.config.slot_granularity_minutes,
        )?)
    }

    pub fn availability_calendar(
        &self,
        interviewer: &UserId,
        year: i32,
    ) -> Result<AvailabilityCalendar, SchedulingError> {
        Ok(self
            .resolver
            .detector()
            .expander()
            .instances_for(interviewer, year)?)
    }

    pub fn book_interview(&self, request: BookingRequest) -> Result<Interview, SchedulingError> {
        self.booking.book(request)
    }

    pub fn create_recurring_schedules(
        &self,
        interviewer: &UserId,
        year: i32,
        patterns: &[WeeklyPattern],
        notes: Option<String>,
    ) -> Result<Vec<InterviewerSchedule>, SchedulingError> {
        self.schedules
            .create_recurring_schedules(interviewer, year, patterns, notes)
    }

    pub fn create_exception(
        &self,
        interviewer: &UserId,
        date: NaiveDate,
        notes: Option<String>,
    ) -> Result<InterviewerSchedule, SchedulingError> {
        self.schedules.create_exception(interviewer, date, notes)
    }
}
