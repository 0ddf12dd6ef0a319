use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StudentStatus {
    SpecialAttention,
    Lagging,
    Ideal,
    Ahead,
}

impl StudentStatus {
    pub const ALL: [StudentStatus; 4] = [
        StudentStatus::SpecialAttention,
        StudentStatus::Lagging,
        StudentStatus::Ideal,
        StudentStatus::Ahead,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StudentStatus::SpecialAttention => "Special Attention",
            StudentStatus::Lagging => "Lagging",
            StudentStatus::Ideal => "Ideal",
            StudentStatus::Ahead => "Ahead",
        }
    }
}

impl fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CourseStatus {
    Completed,
    InProgress,
    NotStarted,
}

impl fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CourseStatus::Completed => "Completed",
            CourseStatus::InProgress => "In Progress",
            CourseStatus::NotStarted => "Not Started",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredCourse")]
pub struct Course {
    pub name: String,
    pub progress: u8,
    pub status: CourseStatus,
}

// Stored snapshots come back through `Course::new` so they keep its invariants.
#[derive(Deserialize)]
struct StoredCourse {
    name: String,
    progress: u32,
    status: CourseStatus,
}

impl From<StoredCourse> for Course {
    fn from(stored: StoredCourse) -> Self {
        Course::new(stored.name, stored.progress, stored.status)
    }
}

impl Course {
    /// Builds a course, clamping progress to 0..=100.
    ///
    /// The source platform reports a small non-zero default for enrolled but
    /// unstarted courses, so `NotStarted` always yields a progress of 0.
    pub fn new(name: impl Into<String>, progress: u32, status: CourseStatus) -> Self {
        let progress = match status {
            CourseStatus::NotStarted => 0,
            _ => progress.min(100) as u8,
        };
        Self {
            name: name.into(),
            progress,
            status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignmentStatus {
    Completed,
    Uncompleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub name: String,
    pub status: AssignmentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Attending,
    Late,
    OffCam,
    Replaced,
    Absent,
    /// Label the source emitted that matches none of the known statuses, kept verbatim.
    Unrecognized(String),
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttendanceStatus::Attending => f.write_str("Attending"),
            AttendanceStatus::Late => f.write_str("Late"),
            AttendanceStatus::OffCam => f.write_str("Off Cam"),
            AttendanceStatus::Replaced => f.write_str("Replaced"),
            AttendanceStatus::Absent => f.write_str("Absent"),
            AttendanceStatus::Unrecognized(label) => f.write_str(label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub event: String,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Good,
    Neutral,
    Bad,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub title: String,
    #[serde(default)]
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCheckin {
    pub date: String,
    pub mood: Mood,
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub reflection: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointEntry {
    pub date: String,
    pub description: String,
    pub points: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub university: Option<String>,
    pub major: Option<String>,
    pub photo_url: Option<String>,
    pub profile_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub name: String,
    pub status: Option<StudentStatus>,
    pub courses: Vec<Course>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub attendance: Vec<AttendanceRecord>,
    #[serde(default)]
    pub checkins: Vec<DailyCheckin>,
    #[serde(default)]
    pub points: Vec<PointEntry>,
    pub profile: Option<Profile>,
    pub image: Option<String>,
    pub last_updated: Option<String>,
}

impl Student {
    pub fn new(name: impl Into<String>, status: Option<StudentStatus>) -> Self {
        Self {
            name: name.into(),
            status,
            courses: Vec::new(),
            assignments: Vec::new(),
            attendance: Vec::new(),
            checkins: Vec::new(),
            points: Vec::new(),
            profile: None,
            image: None,
            last_updated: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_started_course_forces_zero_progress() {
        let course = Course::new("Belajar Dasar Git", 3, CourseStatus::NotStarted);
        assert_eq!(course.progress, 0);
        assert_eq!(course.status, CourseStatus::NotStarted);
    }

    #[test]
    fn progress_is_clamped() {
        let course = Course::new("Belajar Python", 140, CourseStatus::Completed);
        assert_eq!(course.progress, 100);
    }

    #[test]
    fn stored_courses_are_rebuilt_through_the_constructor() {
        let course: Course = serde_json::from_str(
            r#"{"name": "Belajar Dasar Git", "progress": 40, "status": "NotStarted"}"#,
        )
        .unwrap();
        assert_eq!(course.progress, 0);

        let course: Course =
            serde_json::from_str(r#"{"name": "Belajar Python", "progress": 250, "status": "Completed"}"#)
                .unwrap();
        assert_eq!(course.progress, 100);

        let original = Course::new("Belajar Dasar AI", 39, CourseStatus::InProgress);
        let json = serde_json::to_string(&original).unwrap();
        assert_eq!(serde_json::from_str::<Course>(&json).unwrap(), original);
    }

    #[test]
    fn mood_serializes_lowercase() {
        let json = serde_json::to_string(&Mood::Neutral).unwrap();
        assert_eq!(json, "\"neutral\"");
    }
}
