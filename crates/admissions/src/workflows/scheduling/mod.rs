//! Interviewer availability, conflict detection and interview booking.
//!
//! Declared availability comes from schedule entries expanded per date; bookings are
//! checked against it and against existing interviews, serialized per interviewer.

pub mod availability;
pub mod booking;
pub mod conflict;
pub mod domain;
pub mod expander;
pub mod management;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use availability::{AvailabilityResolver, CandidateAvailability};
pub use booking::{BookingRequest, InterviewBooking, SchedulingError};
pub use conflict::{AvailabilityCheck, ConflictDetector, Unavailability};
pub use domain::{
    Interview, InterviewId, InterviewMode, InterviewStatus, InterviewType, Interviewer,
    InterviewerSchedule, InvalidWindow, ScheduleId, ScheduleKind, ScheduleType, StaffRole,
    TimeWindow, UserId, WeeklyPattern,
};
pub use expander::{AvailabilityCalendar, DayAvailability, RecurringScheduleExpander};
pub use management::{InterviewerWorkload, ScheduleManager};
pub use repository::{InterviewRepository, InterviewerDirectory, ScheduleRepository};
pub use router::scheduling_router;
pub use service::SchedulingService;
