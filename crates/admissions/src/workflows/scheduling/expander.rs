//! Expansion of interviewer schedule entries into concrete dated availability.
//!
//! Precedence for one date, strongest first: an active `EXCEPTION` blacks the date out,
//! active `SPECIFIC_DATE` windows replace the weekly pattern, otherwise the active
//! `RECURRING_WEEKLY` entries for that weekday and year apply. Inactive entries are ignored.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::Serialize;

use super::domain::{InterviewerSchedule, ScheduleKind, TimeWindow, UserId};
use super::repository::ScheduleRepository;
use crate::workflows::repository::RepositoryError;

/// Resolved availability of one interviewer on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DayAvailability {
    Blackout { notes: Option<String> },
    /// Sorted, coalesced windows; empty when nothing is declared for the date.
    Windows { windows: Vec<TimeWindow> },
}

impl DayAvailability {
    pub fn windows(&self) -> &[TimeWindow] {
        match self {
            Self::Blackout { .. } => &[],
            Self::Windows { windows } => windows,
        }
    }
}

/// Every available date of an interviewer within one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityCalendar {
    pub interviewer_id: UserId,
    pub year: i32,
    pub days: BTreeMap<NaiveDate, Vec<TimeWindow>>,
}

impl AvailabilityCalendar {
    pub fn windows_on(&self, date: NaiveDate) -> &[TimeWindow] {
        self.days.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total_minutes(&self) -> i64 {
        self.days
            .values()
            .flatten()
            .map(TimeWindow::duration_minutes)
            .sum()
    }
}

/// All dates of `year` falling on `weekday`, in order.
pub fn weekday_dates(year: i32, weekday: Weekday) -> impl Iterator<Item = NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1).and_then(|january_first| {
        let offset = (7 + weekday.num_days_from_monday()
            - january_first.weekday().num_days_from_monday())
            % 7;
        january_first.checked_add_days(Days::new(u64::from(offset)))
    });

    std::iter::successors(first, |date| date.checked_add_days(Days::new(7)))
        .take_while(move |date| date.year() == year)
}

/// Expand active entries into date -> windows for `year`.
pub fn expand_year(
    entries: &[InterviewerSchedule],
    year: i32,
) -> BTreeMap<NaiveDate, Vec<TimeWindow>> {
    let active = || entries.iter().filter(|entry| entry.active);
    let mut days: BTreeMap<NaiveDate, Vec<TimeWindow>> = BTreeMap::new();

    for entry in active() {
        if let ScheduleKind::RecurringWeekly {
            day_of_week,
            window,
            year: entry_year,
        } = &entry.kind
        {
            if *entry_year != year {
                continue;
            }
            for date in weekday_dates(year, *day_of_week) {
                days.entry(date).or_default().push(*window);
            }
        }
    }

    let mut specific: BTreeMap<NaiveDate, Vec<TimeWindow>> = BTreeMap::new();
    for entry in active() {
        if let ScheduleKind::SpecificDate { date, window } = &entry.kind {
            if date.year() == year {
                specific.entry(*date).or_default().push(*window);
            }
        }
    }
    days.extend(specific);

    for entry in active() {
        if let ScheduleKind::Exception { date } = &entry.kind {
            days.remove(date);
        }
    }

    days.into_iter()
        .map(|(date, windows)| (date, TimeWindow::coalesce(windows)))
        .collect()
}

/// Resolve a single date without expanding the whole year.
pub fn resolve_day(entries: &[InterviewerSchedule], date: NaiveDate) -> DayAvailability {
    let active = || entries.iter().filter(|entry| entry.active);

    if let Some(exception) = active()
        .find(|entry| matches!(&entry.kind, ScheduleKind::Exception { date: blocked } if *blocked == date))
    {
        return DayAvailability::Blackout {
            notes: exception.notes.clone(),
        };
    }

    let specific: Vec<TimeWindow> = active()
        .filter_map(|entry| match &entry.kind {
            ScheduleKind::SpecificDate { date: on, window } if *on == date => Some(*window),
            _ => None,
        })
        .collect();
    if !specific.is_empty() {
        return DayAvailability::Windows {
            windows: TimeWindow::coalesce(specific),
        };
    }

    let recurring = active()
        .filter_map(|entry| match &entry.kind {
            ScheduleKind::RecurringWeekly {
                day_of_week,
                window,
                year,
            } if *year == date.year() && *day_of_week == date.weekday() => Some(*window),
            _ => None,
        })
        .collect();
    DayAvailability::Windows {
        windows: TimeWindow::coalesce(recurring),
    }
}

/// Repository-backed expander; entries are read fresh on every call.
pub struct RecurringScheduleExpander<S> {
    schedules: Arc<S>,
}

impl<S> RecurringScheduleExpander<S>
where
    S: ScheduleRepository,
{
    pub fn new(schedules: Arc<S>) -> Self {
        Self { schedules }
    }

    pub fn instances_for(
        &self,
        interviewer: &UserId,
        year: i32,
    ) -> Result<AvailabilityCalendar, RepositoryError> {
        let entries = self.schedules.for_interviewer(interviewer)?;
        Ok(AvailabilityCalendar {
            interviewer_id: interviewer.clone(),
            year,
            days: expand_year(&entries, year),
        })
    }

    pub fn day_availability(
        &self,
        interviewer: &UserId,
        date: NaiveDate,
    ) -> Result<DayAvailability, RepositoryError> {
        let entries = self.schedules.for_interviewer(interviewer)?;
        Ok(resolve_day(&entries, date))
    }

    pub fn windows_on(
        &self,
        interviewer: &UserId,
        date: NaiveDate,
    ) -> Result<Vec<TimeWindow>, RepositoryError> {
        Ok(self
            .day_availability(interviewer, date)?
            .windows()
            .to_vec())
    }
}
