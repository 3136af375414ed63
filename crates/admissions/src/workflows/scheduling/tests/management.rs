use chrono::{NaiveDate, Weekday};

use super::common::*;
use crate::workflows::scheduling::domain::{
    InterviewStatus, ScheduleId, ScheduleKind, ScheduleType, StaffRole, TimeWindow, WeeklyPattern,
};
use crate::workflows::scheduling::SchedulingError;

#[test]
fn recurring_creation_writes_nothing_when_one_pattern_is_invalid() {
    let (service, _) = build_service();
    let patterns = [
        WeeklyPattern {
            day_of_week: Weekday::Wed,
            start: at(9, 0),
            end: at(11, 0),
        },
        WeeklyPattern {
            day_of_week: Weekday::Thu,
            start: at(15, 0),
            end: at(14, 0),
        },
    ];

    let error = service
        .create_recurring_schedules(&user(TEACHER), 2025, &patterns, None)
        .expect_err("inverted window");
    assert!(matches!(error, SchedulingError::InvalidSchedule(detail) if detail.starts_with("Thu")));

    let declared = service
        .schedules()
        .schedules_for(&user(TEACHER), Some(2025), true)
        .expect("listed");
    assert_eq!(declared.len(), 1);

    assert!(matches!(
        service.create_recurring_schedules(&user(TEACHER), 2025, &[], None),
        Err(SchedulingError::InvalidSchedule(_))
    ));
}

#[test]
fn recurring_creation_requires_a_known_interviewer() {
    let (service, _) = build_service();

    assert!(matches!(
        service.create_recurring_schedules(&user("ghost"), 2025, &tuesday_mornings(), None),
        Err(SchedulingError::NotFound {
            entity: "interviewer",
            ..
        })
    ));
}

#[test]
fn deactivated_entry_stays_on_record_but_stops_counting() {
    let (service, _) = build_service();
    let manager = service.schedules();
    let entry = manager
        .schedules_for(&user(PSYCHOLOGIST), Some(2025), false)
        .expect("listed")
        .remove(0);

    let deactivated = manager.deactivate_schedule(&entry.id).expect("deactivated");
    assert!(!deactivated.active);

    assert!(manager
        .schedules_for(&user(PSYCHOLOGIST), Some(2025), false)
        .expect("listed")
        .is_empty());
    assert_eq!(
        manager
            .schedules_for(&user(PSYCHOLOGIST), Some(2025), true)
            .expect("listed"),
        vec![deactivated]
    );
    assert!(!service
        .is_interviewer_available(&user(PSYCHOLOGIST), tuesday(), at(9, 0), 30)
        .expect("checked"));
}

#[test]
fn permanent_delete_removes_the_entry() {
    let (service, _) = build_service();
    let manager = service.schedules();
    let exception = manager
        .create_exception(&user(DIRECTOR), tuesday(), None)
        .expect("declared");

    manager
        .delete_schedule_permanently(&exception.id)
        .expect("deleted");
    assert!(matches!(
        manager.delete_schedule_permanently(&exception.id),
        Err(SchedulingError::NotFound {
            entity: "schedule",
            ..
        })
    ));
    assert!(service
        .is_interviewer_available(&user(DIRECTOR), tuesday(), at(9, 0), 30)
        .expect("checked"));
}

#[test]
fn update_replaces_kind_and_notes() {
    let (service, _) = build_service();
    let manager = service.schedules();
    let entry = manager
        .schedules_for(&user(TEACHER), Some(2025), false)
        .expect("listed")
        .remove(0);

    let afternoon = TimeWindow::new(at(14, 0), at(16, 0)).expect("valid window");
    let updated = manager
        .update_schedule(
            &entry.id,
            ScheduleKind::RecurringWeekly {
                day_of_week: Weekday::Tue,
                window: afternoon,
                year: 2025,
            },
            Some("moved to afternoons".to_string()),
        )
        .expect("updated");
    assert_eq!(updated.notes.as_deref(), Some("moved to afternoons"));
    assert!(service
        .is_interviewer_available(&user(TEACHER), tuesday(), at(14, 30), 60)
        .expect("checked"));

    assert!(matches!(
        manager.update_schedule(
            &ScheduleId("sch-missing".to_string()),
            ScheduleKind::Exception { date: tuesday() },
            None,
        ),
        Err(SchedulingError::NotFound { .. })
    ));
}

#[test]
fn schedules_for_filters_by_year() {
    let (service, _) = build_service();
    let manager = service.schedules();
    let next_year = NaiveDate::from_ymd_opt(2026, 1, 13).expect("valid date");
    manager
        .create_exception(&user(PSYCHOLOGIST), next_year, None)
        .expect("declared");

    let this_year = manager
        .schedules_for(&user(PSYCHOLOGIST), Some(2025), false)
        .expect("listed");
    assert_eq!(this_year.len(), 1);
    assert_eq!(this_year[0].schedule_type(), ScheduleType::RecurringWeekly);

    let all = manager
        .schedules_for(&user(PSYCHOLOGIST), None, false)
        .expect("listed");
    assert_eq!(all.len(), 2);
}

#[test]
fn copy_to_year_skips_entries_already_declared() {
    let (service, _) = build_service();
    let manager = service.schedules();
    service
        .create_recurring_schedules(
            &user(PSYCHOLOGIST),
            2025,
            &[WeeklyPattern {
                day_of_week: Weekday::Fri,
                start: at(13, 0),
                end: at(15, 0),
            }],
            None,
        )
        .expect("declared");
    service
        .create_recurring_schedules(&user(PSYCHOLOGIST), 2026, &tuesday_mornings(), None)
        .expect("declared");

    let copied = manager
        .copy_schedules_to_year(&user(PSYCHOLOGIST), 2025, 2026)
        .expect("copied");
    assert_eq!(copied.len(), 1);
    assert!(matches!(
        copied[0].kind,
        ScheduleKind::RecurringWeekly {
            day_of_week: Weekday::Fri,
            year: 2026,
            ..
        }
    ));

    assert!(manager
        .copy_schedules_to_year(&user(PSYCHOLOGIST), 2025, 2026)
        .expect("copied")
        .is_empty());
    assert!(matches!(
        manager.copy_schedules_to_year(&user(PSYCHOLOGIST), 2025, 2025),
        Err(SchedulingError::InvalidSchedule(_))
    ));
}

#[test]
fn workload_counts_statuses_and_sorts_busiest_first() {
    let (service, _) = build_service();
    let first = service
        .book_interview(booking(DIRECTOR, at(9, 0), 45))
        .expect("booked");
    service
        .book_interview(booking(DIRECTOR, at(10, 0), 30))
        .expect("booked");
    let cancelled = service
        .book_interview(booking(DIRECTOR, at(11, 0), 45))
        .expect("booked");
    service.booking().cancel(&cancelled.id).expect("cancelled");
    service
        .booking()
        .update_status(&first.id, InterviewStatus::NoShow)
        .expect("no show");
    service
        .book_interview(booking(PSYCHOLOGIST, at(9, 0), 60))
        .expect("booked");

    let workloads = service
        .schedules()
        .workload_statistics(2025)
        .expect("computed");

    let order: Vec<_> = workloads
        .iter()
        .map(|workload| workload.interviewer_id.0.as_str())
        .collect();
    assert_eq!(order, vec![DIRECTOR, PSYCHOLOGIST, TEACHER]);

    let director = &workloads[0];
    assert_eq!(director.role, StaffRole::CycleDirector);
    assert_eq!(director.booked, 2);
    assert_eq!(director.booked_minutes, 75);
    assert_eq!(director.scheduled, 1);
    assert_eq!(director.no_show, 1);
    assert_eq!(director.cancelled, 1);
    assert_eq!(director.completed, 0);
    assert_eq!(director.weekly_capacity_minutes, 180);

    let teacher = &workloads[2];
    assert_eq!(teacher.booked, 0);
    assert_eq!(teacher.booked_minutes, 0);

    assert!(service
        .schedules()
        .workload_statistics(2024)
        .expect("computed")
        .iter()
        .all(|workload| workload.booked == 0 && workload.weekly_capacity_minutes == 0));
}
