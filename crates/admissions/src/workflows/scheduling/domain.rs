use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::workflows::admission::domain::ApplicationId;

/// Identifier wrapper for staff users (interviewers and evaluators).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InterviewId(pub String);

impl fmt::Display for InterviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScheduleId(pub String);

impl fmt::Display for ScheduleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Staff roles that can be booked for interviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaffRole {
    Teacher,
    Psychologist,
    CycleDirector,
    Coordinator,
    Admin,
}

impl StaffRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Teacher => "Teacher",
            Self::Psychologist => "Psychologist",
            Self::CycleDirector => "Cycle Director",
            Self::Coordinator => "Coordinator",
            Self::Admin => "Administrator",
        }
    }
}

/// Directory entry for a staff member who can conduct interviews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interviewer {
    pub id: UserId,
    pub name: String,
    pub role: StaffRole,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterviewType {
    Family,
    Individual,
    Psychological,
    Academic,
}

impl InterviewType {
    /// Roles allowed to conduct this kind of interview.
    pub const fn eligible_roles(self) -> &'static [StaffRole] {
        match self {
            Self::Psychological => &[StaffRole::Psychologist],
            Self::Academic => &[
                StaffRole::Teacher,
                StaffRole::CycleDirector,
                StaffRole::Coordinator,
            ],
            Self::Family | Self::Individual => &[
                StaffRole::CycleDirector,
                StaffRole::Psychologist,
                StaffRole::Coordinator,
                StaffRole::Admin,
            ],
        }
    }

    pub fn accepts(self, role: StaffRole) -> bool {
        self.eligible_roles().contains(&role)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterviewMode {
    InPerson,
    Virtual,
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterviewStatus {
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl InterviewStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Scheduled => "SCHEDULED",
            Self::Confirmed => "CONFIRMED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::NoShow => "NO_SHOW",
        }
    }

    /// scheduled -> confirmed -> in progress -> completed, with cancellation and
    /// no-show reachable from every non-terminal state.
    pub const fn next_statuses(self) -> &'static [InterviewStatus] {
        match self {
            Self::Scheduled => &[Self::Confirmed, Self::Cancelled, Self::NoShow],
            Self::Confirmed => &[Self::InProgress, Self::Cancelled, Self::NoShow],
            Self::InProgress => &[Self::Completed, Self::Cancelled, Self::NoShow],
            Self::Completed | Self::Cancelled | Self::NoShow => &[],
        }
    }

    pub fn can_transition_to(self, next: InterviewStatus) -> bool {
        self.next_statuses().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.next_statuses().is_empty()
    }

    /// Whether an interview in this status still holds its calendar slot.
    pub fn occupies_slot(self) -> bool {
        self != Self::Cancelled
    }

    /// Booked but not yet concluded.
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Scheduled | Self::Confirmed | Self::InProgress)
    }
}

impl fmt::Display for InterviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Booked interview slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interview {
    pub id: InterviewId,
    pub application_id: ApplicationId,
    pub interviewer_id: UserId,
    pub interview_type: InterviewType,
    pub mode: InterviewMode,
    pub status: InterviewStatus,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub duration_minutes: u32,
}

impl Interview {
    pub fn window(&self) -> Result<TimeWindow, InvalidWindow> {
        TimeWindow::starting_at(self.scheduled_time, self.duration_minutes)
    }
}

/// Rejected time window bounds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidWindow {
    #[error("window must end after it starts ({start} - {end})")]
    Inverted { start: NaiveTime, end: NaiveTime },
    #[error("a {minutes}-minute window starting at {start} runs past midnight")]
    CrossesMidnight { start: NaiveTime, minutes: u32 },
    #[error("window duration must be at least one minute")]
    Empty,
}

/// Half-open time-of-day interval `[start, end)`.
///
/// Both bounds are times of one calendar day, so `end` can be at most 23:59:59.999;
/// an end of exactly 24:00 is not representable and such windows are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "WindowBounds", into = "WindowBounds")]
pub struct TimeWindow {
    start: NaiveTime,
    end: NaiveTime,
}

#[derive(Serialize, Deserialize)]
struct WindowBounds {
    start: NaiveTime,
    end: NaiveTime,
}

impl TryFrom<WindowBounds> for TimeWindow {
    type Error = InvalidWindow;

    fn try_from(bounds: WindowBounds) -> Result<Self, Self::Error> {
        TimeWindow::new(bounds.start, bounds.end)
    }
}

impl From<TimeWindow> for WindowBounds {
    fn from(window: TimeWindow) -> Self {
        WindowBounds {
            start: window.start,
            end: window.end,
        }
    }
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, InvalidWindow> {
        if start >= end {
            return Err(InvalidWindow::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// Window of `minutes` beginning at `start`; must not wrap past midnight.
    ///
    /// Reaching midnight exactly also counts as wrapping, so 23:00 + 60 minutes is refused
    /// while 23:00 + 59 minutes is accepted.
    pub fn starting_at(start: NaiveTime, minutes: u32) -> Result<Self, InvalidWindow> {
        if minutes == 0 {
            return Err(InvalidWindow::Empty);
        }

        let (end, wrapped) = start.overflowing_add_signed(Duration::minutes(i64::from(minutes)));
        if wrapped != 0 {
            return Err(InvalidWindow::CrossesMidnight { start, minutes });
        }

        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Touching endpoints do not overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    fn touches_or_overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Sort and merge overlapping or touching windows.
    pub fn coalesce(mut windows: Vec<TimeWindow>) -> Vec<TimeWindow> {
        windows.sort();
        let mut merged: Vec<TimeWindow> = Vec::with_capacity(windows.len());
        for window in windows {
            match merged.last_mut() {
                Some(last) if last.touches_or_overlaps(&window) => {
                    last.end = last.end.max(window.end);
                }
                _ => merged.push(window),
            }
        }
        merged
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleType {
    RecurringWeekly,
    SpecificDate,
    Exception,
}

/// Availability declaration carried by a schedule entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "schedule_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleKind {
    RecurringWeekly {
        day_of_week: Weekday,
        window: TimeWindow,
        year: i32,
    },
    SpecificDate {
        date: NaiveDate,
        window: TimeWindow,
    },
    /// Whole-day blackout.
    Exception { date: NaiveDate },
}

impl ScheduleKind {
    pub fn schedule_type(&self) -> ScheduleType {
        match self {
            Self::RecurringWeekly { .. } => ScheduleType::RecurringWeekly,
            Self::SpecificDate { .. } => ScheduleType::SpecificDate,
            Self::Exception { .. } => ScheduleType::Exception,
        }
    }

    pub fn year(&self) -> i32 {
        match self {
            Self::RecurringWeekly { year, .. } => *year,
            Self::SpecificDate { date, .. } | Self::Exception { date } => date.year(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewerSchedule {
    pub id: ScheduleId,
    pub interviewer_id: UserId,
    #[serde(flatten)]
    pub kind: ScheduleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub active: bool,
}

impl InterviewerSchedule {
    pub fn schedule_type(&self) -> ScheduleType {
        self.kind.schedule_type()
    }
}

/// Weekly availability pattern submitted for bulk recurring creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyPattern {
    pub day_of_week: Weekday,
    pub start: NaiveTime,
    pub end: NaiveTime,
}
