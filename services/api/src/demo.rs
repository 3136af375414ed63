use crate::infra::{next_tuesday, parse_date, seed_demo_data, time, Services, PSYCHOLOGIST};
use admissions::config::{AppConfig, SchedulingConfig};
use admissions::error::AppError;
use admissions::telemetry;
use admissions::workflows::admission::{
    ApplicationId, ApplicationStatus, EvaluationRepository, EvaluationStatus, WorkflowError,
    WorkflowReport,
};
use admissions::workflows::scheduling::{
    BookingRequest, InterviewMode, InterviewRepository, InterviewStatus, InterviewType,
    SchedulingError, UserId,
};
use chrono::{Datelike, Local, NaiveDate};
use clap::Args;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Interview day (YYYY-MM-DD). Defaults to the next Tuesday.
    #[arg(long, value_parser = parse_date)]
    pub(crate) date: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct EvaluateAllArgs {
    /// Interview day used when seeding (YYYY-MM-DD). Defaults to the next Tuesday.
    #[arg(long, value_parser = parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Print the report as JSON instead of a summary.
    #[arg(long)]
    pub(crate) json: bool,
}

fn interview_day(requested: Option<NaiveDate>) -> NaiveDate {
    requested.unwrap_or_else(|| next_tuesday(Local::now().date_naive()))
}

fn seeded_services(config: SchedulingConfig, day: NaiveDate) -> Result<Services, AppError> {
    let services = Services::in_memory(config);
    seed_demo_data(&services, day)?;
    Ok(services)
}

pub(crate) fn run_evaluate_all(args: EvaluateAllArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let services = seeded_services(config.scheduling, interview_day(args.date))?;
    let report = services.orchestrator.evaluate_all()?;

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Report payload unavailable: {err}"),
        }
    } else {
        render_report(&report);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let day = interview_day(args.date);
    let services = seeded_services(config.scheduling, day)?;
    let scheduling = &services.scheduling;
    let orchestrator = &services.orchestrator;

    println!("Admissions workflow demo for {day}");

    println!("\nFamily interview candidates at 09:00 (45 min)");
    for candidate in scheduling
        .resolver()
        .assess(day, time(9, 0), 45, Some(InterviewType::Family))
        .map_err(SchedulingError::from)?
    {
        println!(
            "- {} ({}): {}",
            candidate.interviewer.name,
            candidate.interviewer.role.label(),
            candidate.check.explanation()
        );
    }

    let psychologist = UserId(PSYCHOLOGIST.to_string());
    let slots = scheduling.free_slots(&psychologist, day, None)?;
    println!(
        "\nFree {}-minute starts for {PSYCHOLOGIST}: {}",
        config.scheduling.default_interview_minutes,
        slots
            .iter()
            .map(|slot| slot.format("%H:%M").to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let overlapping = BookingRequest {
        application_id: ApplicationId("app-002".to_string()),
        interviewer_id: psychologist.clone(),
        interview_type: InterviewType::Family,
        mode: InterviewMode::Virtual,
        date: day,
        time: time(9, 15),
        duration_minutes: Some(30),
    };
    match scheduling.book_interview(overlapping.clone()) {
        Ok(interview) => println!("\nUnexpectedly booked {}", interview.id),
        Err(err) => println!("\nDouble booking refused: {err}"),
    }
    let booked = scheduling.book_interview(BookingRequest {
        time: time(10, 0),
        ..overlapping
    })?;
    println!(
        "Booked {} for app-002 at {}",
        booked.id,
        booked.scheduled_time.format("%H:%M")
    );

    println!("\nFirst workflow pass");
    render_report(&orchestrator.evaluate_all()?);

    let interviewed = ApplicationId("app-003".to_string());
    conclude_interviews(&services, &interviewed)?;
    for evaluation in EvaluationRepository::for_application(&services.store, &interviewed)
        .map_err(WorkflowError::from)?
    {
        orchestrator.update_evaluation_status(&evaluation.id, EvaluationStatus::Completed)?;
    }
    services
        .store
        .set_documents_complete(&ApplicationId("app-004".to_string()), true)
        .map_err(WorkflowError::from)?;

    println!("\nSecond workflow pass (interview held, exam graded, documents received)");
    render_report(&orchestrator.evaluate_all()?);

    match orchestrator.transition(&interviewed, ApplicationStatus::Approved) {
        Ok(record) => println!("\nCommittee decision for {}: {}", record.id, record.status),
        Err(err) => println!("\nCommittee decision refused: {err}"),
    }

    println!("\nInterviewer workload {}", day.format("%Y"));
    for workload in scheduling.schedules().workload_statistics(day.year())? {
        println!(
            "- {}: {} booked ({} min) | {} min weekly capacity",
            workload.name,
            workload.booked,
            workload.booked_minutes,
            workload.weekly_capacity_minutes
        );
    }

    Ok(())
}

fn conclude_interviews(services: &Services, application: &ApplicationId) -> Result<(), AppError> {
    let interviews = InterviewRepository::for_application(&services.store, application)
        .map_err(WorkflowError::from)?;
    for interview in interviews {
        for next in [
            InterviewStatus::Confirmed,
            InterviewStatus::InProgress,
            InterviewStatus::Completed,
        ] {
            services.scheduling.booking().update_status(&interview.id, next)?;
        }
    }
    Ok(())
}

fn render_report(report: &WorkflowReport) {
    println!(
        "- evaluated {} | advanced {} | unchanged {} | errors {}",
        report.evaluated,
        report.advanced_count,
        report.unchanged_count,
        report.errors.len()
    );
    for outcome in &report.advanced {
        let path = outcome
            .path
            .iter()
            .map(|status| status.label())
            .collect::<Vec<_>>()
            .join(" -> ");
        println!(
            "  {}: {} -> {} ({})",
            outcome.application_id, outcome.previous_status, path, outcome.reason
        );
    }
    for failure in &report.errors {
        println!("  {} failed: {}", failure.application_id, failure.error);
    }
}
