use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use tracing::info;

use super::booking::SchedulingError;
use super::domain::{
    InterviewStatus, InterviewerSchedule, ScheduleId, ScheduleKind, StaffRole, TimeWindow, UserId,
    WeeklyPattern,
};
use super::repository::{InterviewRepository, InterviewerDirectory, ScheduleRepository};
use crate::workflows::repository::RepositoryError;

static SCHEDULE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_schedule_id() -> ScheduleId {
    let id = SCHEDULE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ScheduleId(format!("sch-{id:06}"))
}

/// Booked interviews and declared capacity of one interviewer within a year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterviewerWorkload {
    pub interviewer_id: UserId,
    pub name: String,
    pub role: StaffRole,
    pub scheduled: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub no_show: usize,
    /// Every interview still holding a slot.
    pub booked: usize,
    pub booked_minutes: u64,
    pub weekly_capacity_minutes: i64,
}

/// Administrative operations over interviewer schedule entries.
pub struct ScheduleManager<S, I, D> {
    schedules: Arc<S>,
    interviews: Arc<I>,
    directory: Arc<D>,
}

impl<S, I, D> ScheduleManager<S, I, D>
where
    S: ScheduleRepository,
    I: InterviewRepository,
    D: InterviewerDirectory,
{
    pub fn new(schedules: Arc<S>, interviews: Arc<I>, directory: Arc<D>) -> Self {
        Self {
            schedules,
            interviews,
            directory,
        }
    }

    /// One entry per pattern; nothing is written unless every pattern is valid.
    pub fn create_recurring_schedules(
        &self,
        interviewer: &UserId,
        year: i32,
        patterns: &[WeeklyPattern],
        notes: Option<String>,
    ) -> Result<Vec<InterviewerSchedule>, SchedulingError> {
        self.ensure_interviewer(interviewer)?;
        if patterns.is_empty() {
            return Err(SchedulingError::InvalidSchedule(
                "at least one weekly pattern is required".to_string(),
            ));
        }
        if NaiveDate::from_ymd_opt(year, 1, 1).is_none() {
            return Err(SchedulingError::InvalidSchedule(format!(
                "year {year} is out of range"
            )));
        }

        let kinds = patterns
            .iter()
            .map(|pattern| {
                let window = TimeWindow::new(pattern.start, pattern.end).map_err(|error| {
                    SchedulingError::InvalidSchedule(format!("{}: {error}", pattern.day_of_week))
                })?;
                Ok(ScheduleKind::RecurringWeekly {
                    day_of_week: pattern.day_of_week,
                    window,
                    year,
                })
            })
            .collect::<Result<Vec<_>, SchedulingError>>()?;

        let created = kinds
            .into_iter()
            .map(|kind| self.insert(interviewer, kind, notes.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        info!(
            %interviewer,
            year,
            entries = created.len(),
            "recurring availability declared"
        );
        Ok(created)
    }

    pub fn create_specific_date(
        &self,
        interviewer: &UserId,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        notes: Option<String>,
    ) -> Result<InterviewerSchedule, SchedulingError> {
        self.ensure_interviewer(interviewer)?;
        let window = TimeWindow::new(start, end)
            .map_err(|error| SchedulingError::InvalidSchedule(error.to_string()))?;
        let created = self.insert(interviewer, ScheduleKind::SpecificDate { date, window }, notes)?;
        info!(%interviewer, %date, %window, "specific-date availability declared");
        Ok(created)
    }

    /// Whole-day blackout; overrides every other entry for the date.
    pub fn create_exception(
        &self,
        interviewer: &UserId,
        date: NaiveDate,
        notes: Option<String>,
    ) -> Result<InterviewerSchedule, SchedulingError> {
        self.ensure_interviewer(interviewer)?;
        let created = self.insert(interviewer, ScheduleKind::Exception { date }, notes)?;
        info!(%interviewer, %date, "availability exception declared");
        Ok(created)
    }

    pub fn update_schedule(
        &self,
        id: &ScheduleId,
        kind: ScheduleKind,
        notes: Option<String>,
    ) -> Result<InterviewerSchedule, SchedulingError> {
        let mut schedule = self.schedule(id)?;
        schedule.kind = kind;
        schedule.notes = notes;
        self.schedules.update(schedule.clone())?;
        info!(schedule = %id, "schedule entry updated");
        Ok(schedule)
    }

    /// Soft delete: the entry stays on record but no longer affects availability.
    pub fn deactivate_schedule(&self, id: &ScheduleId) -> Result<InterviewerSchedule, SchedulingError> {
        let mut schedule = self.schedule(id)?;
        schedule.active = false;
        self.schedules.update(schedule.clone())?;
        info!(schedule = %id, "schedule entry deactivated");
        Ok(schedule)
    }

    pub fn delete_schedule_permanently(&self, id: &ScheduleId) -> Result<(), SchedulingError> {
        match self.schedules.delete(id) {
            Ok(()) => {
                info!(schedule = %id, "schedule entry deleted permanently");
                Ok(())
            }
            Err(RepositoryError::NotFound) => Err(SchedulingError::NotFound {
                entity: "schedule",
                id: id.to_string(),
            }),
            Err(other) => Err(other.into()),
        }
    }

    pub fn schedules_for(
        &self,
        interviewer: &UserId,
        year: Option<i32>,
        include_inactive: bool,
    ) -> Result<Vec<InterviewerSchedule>, SchedulingError> {
        self.ensure_interviewer(interviewer)?;
        let mut schedules: Vec<_> = self
            .schedules
            .for_interviewer(interviewer)?
            .into_iter()
            .filter(|schedule| include_inactive || schedule.active)
            .filter(|schedule| year.map_or(true, |year| schedule.kind.year() == year))
            .collect();
        schedules.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(schedules)
    }

    /// Clone active weekly entries into another year, skipping ones already declared there.
    pub fn copy_schedules_to_year(
        &self,
        interviewer: &UserId,
        from_year: i32,
        to_year: i32,
    ) -> Result<Vec<InterviewerSchedule>, SchedulingError> {
        if from_year == to_year {
            return Err(SchedulingError::InvalidSchedule(
                "source and target year must differ".to_string(),
            ));
        }
        let existing = self.schedules_for(interviewer, None, false)?;
        let mut present: Vec<_> = existing
            .iter()
            .filter_map(|schedule| weekly_slot(&schedule.kind, to_year))
            .collect();

        let mut copied = Vec::new();
        for schedule in &existing {
            let Some(slot) = weekly_slot(&schedule.kind, from_year) else {
                continue;
            };
            if present.contains(&slot) {
                continue;
            }
            let (day_of_week, window) = slot;
            let kind = ScheduleKind::RecurringWeekly {
                day_of_week,
                window,
                year: to_year,
            };
            copied.push(self.insert(interviewer, kind, schedule.notes.clone())?);
            present.push(slot);
        }

        info!(
            %interviewer,
            from_year,
            to_year,
            copied = copied.len(),
            "weekly availability copied"
        );
        Ok(copied)
    }

    pub fn workload_statistics(&self, year: i32) -> Result<Vec<InterviewerWorkload>, SchedulingError> {
        let mut by_interviewer: HashMap<UserId, Vec<_>> = HashMap::new();
        for interview in self.interviews.in_year(year)? {
            by_interviewer
                .entry(interview.interviewer_id.clone())
                .or_default()
                .push(interview);
        }

        let mut workloads = Vec::new();
        for interviewer in self.directory.interviewers()? {
            let interviews = by_interviewer.remove(&interviewer.id).unwrap_or_default();
            let count = |status: InterviewStatus| {
                interviews
                    .iter()
                    .filter(|interview| interview.status == status)
                    .count()
            };
            let holding: Vec<_> = interviews
                .iter()
                .filter(|interview| interview.status.occupies_slot())
                .collect();

            let weekly_capacity_minutes: i64 = self
                .schedules
                .for_interviewer(&interviewer.id)?
                .iter()
                .filter(|schedule| schedule.active)
                .filter_map(|schedule| weekly_slot(&schedule.kind, year))
                .map(|(_, window)| window.duration_minutes())
                .sum();

            workloads.push(InterviewerWorkload {
                scheduled: interviews
                    .iter()
                    .filter(|interview| interview.status.is_pending())
                    .count(),
                completed: count(InterviewStatus::Completed),
                cancelled: count(InterviewStatus::Cancelled),
                no_show: count(InterviewStatus::NoShow),
                booked: holding.len(),
                booked_minutes: holding
                    .iter()
                    .map(|interview| u64::from(interview.duration_minutes))
                    .sum(),
                weekly_capacity_minutes,
                interviewer_id: interviewer.id,
                name: interviewer.name,
                role: interviewer.role,
            });
        }

        workloads.sort_by(|left, right| {
            (Reverse(left.booked), &left.name).cmp(&(Reverse(right.booked), &right.name))
        });
        Ok(workloads)
    }

    fn insert(
        &self,
        interviewer: &UserId,
        kind: ScheduleKind,
        notes: Option<String>,
    ) -> Result<InterviewerSchedule, SchedulingError> {
        let schedule = InterviewerSchedule {
            id: next_schedule_id(),
            interviewer_id: interviewer.clone(),
            kind,
            notes,
            active: true,
        };
        Ok(self.schedules.insert(schedule)?)
    }

    fn schedule(&self, id: &ScheduleId) -> Result<InterviewerSchedule, SchedulingError> {
        self.schedules
            .fetch(id)?
            .ok_or_else(|| SchedulingError::NotFound {
                entity: "schedule",
                id: id.to_string(),
            })
    }

    fn ensure_interviewer(&self, interviewer: &UserId) -> Result<(), SchedulingError> {
        match self.directory.interviewer(interviewer)? {
            Some(_) => Ok(()),
            None => Err(SchedulingError::NotFound {
                entity: "interviewer",
                id: interviewer.to_string(),
            }),
        }
    }
}

fn weekly_slot(kind: &ScheduleKind, year: i32) -> Option<(chrono::Weekday, TimeWindow)> {
    match kind {
        ScheduleKind::RecurringWeekly {
            day_of_week,
            window,
            year: entry_year,
        } if *entry_year == year => Some((*day_of_week, *window)),
        _ => None,
    }
}
