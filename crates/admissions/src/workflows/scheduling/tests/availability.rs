use std::sync::Arc;

use chrono::NaiveDate;

use super::common::*;
use crate::store::InMemoryStore;
use crate::workflows::scheduling::domain::{InterviewId, InterviewType, StaffRole};
use crate::workflows::scheduling::{AvailabilityResolver, Unavailability};

#[test]
fn request_inside_declared_window_is_available() {
    let (service, _) = build_service();

    assert!(service
        .is_interviewer_available(&user(PSYCHOLOGIST), tuesday(), at(9, 30), 60)
        .expect("checked"));
}

#[test]
fn request_running_past_the_window_is_unavailable() {
    let (service, _) = build_service();

    let check = service
        .check_interviewer(&user(PSYCHOLOGIST), tuesday(), at(11, 30), Some(60))
        .expect("checked");
    assert!(!check.available);
    assert!(matches!(
        check.reason,
        Some(Unavailability::OutsideAvailability { .. })
    ));
    assert!(check.explanation().contains("09:00-12:00"), "{}", check.explanation());
}

#[test]
fn overlapping_booking_blocks_but_touching_one_does_not() {
    let (service, store) = build_service();
    seed_interview(&store, "int-booked", PSYCHOLOGIST, at(10, 0));

    let overlap = service
        .check_interviewer(&user(PSYCHOLOGIST), tuesday(), at(10, 30), Some(30))
        .expect("checked");
    assert!(!overlap.available);
    match overlap.reason {
        Some(Unavailability::Conflict { interview_id, window, .. }) => {
            assert_eq!(interview_id, InterviewId("int-booked".to_string()));
            assert_eq!(window.to_string(), "10:00-10:45");
        }
        other => panic!("expected conflict, got {other:?}"),
    }

    assert!(service
        .is_interviewer_available(&user(PSYCHOLOGIST), tuesday(), at(10, 45), 30)
        .expect("checked"));
}

#[test]
fn exception_blacks_out_recurring_and_specific_availability() {
    let (service, _) = build_service();
    service
        .schedules()
        .create_specific_date(&user(PSYCHOLOGIST), tuesday(), at(14, 0), at(17, 0), None)
        .expect("specific date declared");
    service
        .create_exception(&user(PSYCHOLOGIST), tuesday(), Some("training day".to_string()))
        .expect("exception declared");

    for (hour, minutes) in [(9, 30), (10, 45), (14, 60), (15, 30)] {
        assert!(!service
            .is_interviewer_available(&user(PSYCHOLOGIST), tuesday(), at(hour, 0), minutes)
            .expect("checked"));
    }

    let check = service
        .check_interviewer(&user(PSYCHOLOGIST), tuesday(), at(9, 30), Some(30))
        .expect("checked");
    assert!(check.explanation().contains("training day"));
}

#[test]
fn specific_date_replaces_the_weekly_pattern() {
    let (service, _) = build_service();
    service
        .schedules()
        .create_specific_date(&user(TEACHER), tuesday(), at(14, 0), at(17, 0), None)
        .expect("specific date declared");

    assert!(!service
        .is_interviewer_available(&user(TEACHER), tuesday(), at(9, 30), 30)
        .expect("checked"));
    assert!(service
        .is_interviewer_available(&user(TEACHER), tuesday(), at(14, 0), 60)
        .expect("checked"));
}

#[test]
fn undeclared_date_is_unavailable_without_bookings() {
    let (service, _) = build_service();
    let wednesday = NaiveDate::from_ymd_opt(2025, 3, 5).expect("valid date");

    let check = service
        .check_interviewer(&user(PSYCHOLOGIST), wednesday, at(9, 30), Some(30))
        .expect("checked");
    assert_eq!(
        check.reason,
        Some(Unavailability::NoAvailabilityDeclared { date: wednesday })
    );
}

#[test]
fn midnight_crossing_request_is_refused_with_reason() {
    let (service, _) = build_service();

    let check = service
        .check_interviewer(&user(PSYCHOLOGIST), tuesday(), at(23, 30), Some(45))
        .expect("checked");
    assert!(!check.available);
    assert!(matches!(
        check.reason,
        Some(Unavailability::InvalidRequest { .. })
    ));
}

#[test]
fn find_available_filters_by_eligible_role() {
    let (service, _) = build_service();

    let psychological = service
        .find_available_interviewers(tuesday(), at(9, 0), Some(45), Some(InterviewType::Psychological))
        .expect("resolved");
    assert_eq!(psychological.len(), 1);
    assert_eq!(psychological[0].role, StaffRole::Psychologist);

    let mut family: Vec<_> = service
        .find_available_interviewers(tuesday(), at(9, 0), Some(45), Some(InterviewType::Family))
        .expect("resolved")
        .into_iter()
        .map(|interviewer| interviewer.id.0)
        .collect();
    family.sort();
    assert_eq!(family, vec![DIRECTOR.to_string(), PSYCHOLOGIST.to_string()]);

    let anyone = service
        .find_available_interviewers(tuesday(), at(9, 0), Some(45), None)
        .expect("resolved");
    assert_eq!(anyone.len(), 3);
}

#[test]
fn find_available_skips_booked_and_inactive_interviewers() {
    let (service, store) = build_service();
    seed_interview(&store, "int-booked", PSYCHOLOGIST, at(10, 0));
    let mut retired = interviewer(DIRECTOR, "Diana Mella", StaffRole::CycleDirector);
    retired.active = false;
    store.seed_interviewer(retired).expect("directory updated");

    let available = service
        .find_available_interviewers(tuesday(), at(10, 15), Some(30), None)
        .expect("resolved");
    let ids: Vec<_> = available.iter().map(|interviewer| interviewer.id.0.as_str()).collect();
    assert_eq!(ids, vec![TEACHER]);

    assert!(!service
        .is_interviewer_available(&user(DIRECTOR), tuesday(), at(9, 0), 30)
        .expect("checked"));
    assert!(!service
        .is_interviewer_available(&user("ghost"), tuesday(), at(9, 0), 30)
        .expect("checked"));
}

#[test]
fn assess_reports_a_reason_for_every_refused_candidate() {
    let (service, store) = build_service();
    seed_interview(&store, "int-booked", TEACHER, at(11, 0));

    let assessed = service
        .resolver()
        .assess(tuesday(), at(11, 30), 30, None)
        .expect("assessed");
    assert_eq!(assessed.len(), 3);
    for candidate in assessed {
        if candidate.interviewer.id == user(TEACHER) {
            assert!(!candidate.check.available);
            assert!(candidate.check.reason.is_some());
        } else {
            assert!(candidate.check.available);
        }
    }
}

#[test]
fn free_slots_step_around_existing_bookings() {
    let (service, store) = build_service();
    seed_interview(&store, "int-booked", PSYCHOLOGIST, at(10, 0));

    let slots = service
        .free_slots(&user(PSYCHOLOGIST), tuesday(), Some(45))
        .expect("slots");
    assert_eq!(
        slots,
        vec![at(9, 0), at(9, 15), at(10, 45), at(11, 0), at(11, 15)]
    );
}

#[test]
fn directory_outage_propagates_as_error() {
    let store = Arc::new(InMemoryStore::new());
    let resolver = AvailabilityResolver::new(store.clone(), store, Arc::new(UnavailableDirectory));

    assert!(resolver
        .find_available(tuesday(), at(9, 0), 30, None)
        .is_err());
}
