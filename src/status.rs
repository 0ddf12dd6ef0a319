//! Canonical status lookups shared by the markup and payload ingestion paths.

use tracing::debug;

use crate::models::{AssignmentStatus, AttendanceStatus, CourseStatus, Mood, StudentStatus};

/// Known status labels, longest phrase first so a shorter alias never masks
/// a more specific one during substring matching.
static STUDENT_STATUS_ALIASES: &[(&str, StudentStatus)] = &[
    ("need special attention", StudentStatus::SpecialAttention),
    ("special attention", StudentStatus::SpecialAttention),
    ("ahead of schedule", StudentStatus::Ahead),
    ("on ideal schedule", StudentStatus::Ideal),
    ("lagging behind", StudentStatus::Lagging),
    ("on track", StudentStatus::Ideal),
    ("lagging", StudentStatus::Lagging),
    ("ideal", StudentStatus::Ideal),
    ("ahead", StudentStatus::Ahead),
];

static ATTENDANCE_ALIASES: &[(&str, AttendanceStatus)] = &[
    ("attending", AttendanceStatus::Attending),
    ("attended", AttendanceStatus::Attending),
    ("present", AttendanceStatus::Attending),
    ("hadir", AttendanceStatus::Attending),
    ("late", AttendanceStatus::Late),
    ("terlambat", AttendanceStatus::Late),
    ("off cam", AttendanceStatus::OffCam),
    ("off-cam", AttendanceStatus::OffCam),
    ("offcam", AttendanceStatus::OffCam),
    ("camera off", AttendanceStatus::OffCam),
    ("replaced", AttendanceStatus::Replaced),
    ("replacement", AttendanceStatus::Replaced),
    ("absent", AttendanceStatus::Absent),
    ("tidak hadir", AttendanceStatus::Absent),
];

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Exact alias lookup. Unknown or missing labels stay unknown.
pub fn canonical_status(label: Option<&str>) -> Option<StudentStatus> {
    let key = collapse_whitespace(label?).to_lowercase();
    STUDENT_STATUS_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, status)| *status)
}

/// Substring match for status banners, which carry extra words around the label.
pub fn status_from_banner(text: &str) -> Option<StudentStatus> {
    let haystack = collapse_whitespace(text).to_lowercase();
    if haystack.is_empty() {
        return None;
    }
    STUDENT_STATUS_ALIASES
        .iter()
        .find(|(alias, _)| haystack.contains(alias))
        .map(|(_, status)| *status)
}

pub fn course_status_from_label(label: &str) -> CourseStatus {
    let text = label.to_lowercase();
    let negated = text.contains("not completed") || text.contains("uncompleted");
    if text.contains("completed") && !negated {
        CourseStatus::Completed
    } else if text.contains("in progress") {
        CourseStatus::InProgress
    } else {
        CourseStatus::NotStarted
    }
}

pub fn assignment_status_from_label(label: &str) -> AssignmentStatus {
    let text = label.to_lowercase();
    let negated = text.contains("uncompleted")
        || text.contains("not completed")
        || text.contains("incomplete");
    if text.contains("completed") && !negated {
        AssignmentStatus::Completed
    } else {
        AssignmentStatus::Uncompleted
    }
}

pub fn attendance_status_from_label(label: &str) -> AttendanceStatus {
    let trimmed = collapse_whitespace(label);
    let key = trimmed.to_lowercase();
    ATTENDANCE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, status)| status.clone())
        .unwrap_or(AttendanceStatus::Unrecognized(trimmed))
}

pub fn mood_from_label(label: &str) -> Mood {
    match label.trim().to_lowercase().as_str() {
        "good" => Mood::Good,
        "bad" => Mood::Bad,
        "neutral" => Mood::Neutral,
        other => {
            debug!(mood = other, "unknown mood label, treating as neutral");
            Mood::Neutral
        }
    }
}
