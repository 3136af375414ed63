use super::super::domain::ApplicationStatus::{self, *};

const FROM_PENDING: &[ApplicationStatus] = &[UnderReview, DocumentsRequested, Rejected, Archived];
const FROM_UNDER_REVIEW: &[ApplicationStatus] =
    &[InterviewScheduled, DocumentsRequested, Rejected, Archived];
const FROM_INTERVIEW_SCHEDULED: &[ApplicationStatus] =
    &[ExamScheduled, DocumentsRequested, Rejected, Archived];
const FROM_EXAM_SCHEDULED: &[ApplicationStatus] =
    &[Approved, Rejected, Waitlist, DocumentsRequested, Archived];
const FROM_DOCUMENTS_REQUESTED: &[ApplicationStatus] = &[UnderReview, Rejected, Archived];
const TERMINAL: &[ApplicationStatus] = &[];

/// Static legality table: every status a given status may move to.
pub const fn valid_transitions(from: ApplicationStatus) -> &'static [ApplicationStatus] {
    match from {
        Pending => FROM_PENDING,
        UnderReview => FROM_UNDER_REVIEW,
        InterviewScheduled => FROM_INTERVIEW_SCHEDULED,
        ExamScheduled => FROM_EXAM_SCHEDULED,
        DocumentsRequested => FROM_DOCUMENTS_REQUESTED,
        Approved | Rejected | Waitlist | Archived => TERMINAL,
    }
}

pub fn is_allowed(from: ApplicationStatus, to: ApplicationStatus) -> bool {
    valid_transitions(from).contains(&to)
}
