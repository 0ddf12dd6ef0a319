//! Normalization of previously scraped JSON exports into the same student shape
//! the markup parser produces.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ParseError, Result};
use crate::models::{
    Assignment, AttendanceRecord, Course, DailyCheckin, Goal, PointEntry, Profile, Student,
};
use crate::status::{
    assignment_status_from_label, attendance_status_from_label, canonical_status,
    course_status_from_label, mood_from_label,
};

fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawStudent {
    #[serde(deserialize_with = "nullable")]
    profile: RawProfile,
    #[serde(deserialize_with = "nullable")]
    progress: RawProgress,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawProfile {
    name: Option<String>,
    status_badge: Option<String>,
    university: Option<String>,
    major: Option<String>,
    photo_url: Option<String>,
    profile_link: Option<String>,
    last_updated: Option<String>,
}

// Sections stay untyped so a bad entry only costs that entry; see `entries`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawProgress {
    course_progress: Value,
    assignment_progress: Value,
    attendance: Value,
    daily_checkins: Value,
    point_histories: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCourse {
    #[serde(deserialize_with = "nullable")]
    course: String,
    progress_percent: Value,
    #[serde(deserialize_with = "nullable")]
    status: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAssignment {
    #[serde(alias = "name", deserialize_with = "nullable")]
    assignment: String,
    #[serde(deserialize_with = "nullable")]
    status: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAttendance {
    #[serde(alias = "name", deserialize_with = "nullable")]
    event: String,
    #[serde(deserialize_with = "nullable")]
    status: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCheckin {
    #[serde(deserialize_with = "nullable")]
    date: String,
    #[serde(deserialize_with = "nullable")]
    mood: String,
    #[serde(deserialize_with = "nullable")]
    goals: Vec<RawGoal>,
    #[serde(deserialize_with = "nullable")]
    reflection: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawGoal {
    #[serde(deserialize_with = "nullable")]
    title: String,
    #[serde(deserialize_with = "nullable")]
    topics: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPoint {
    #[serde(deserialize_with = "nullable")]
    date: String,
    #[serde(deserialize_with = "nullable")]
    description: String,
    point: Value,
}

/// Export-level details that travel alongside the students.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayloadMetadata {
    pub generated_at: Option<String>,
    pub source_url: Option<String>,
    pub mentor_name: Option<String>,
    pub mentor_group: Option<String>,
    pub student_total: usize,
}

pub fn parse_payload(input: &str) -> Result<Vec<Student>> {
    if input.trim().is_empty() {
        return Err(ParseError::EmptyInput);
    }
    let value: Value = serde_json::from_str(input)
        .map_err(|err| ParseError::MalformedDocument(err.to_string()))?;
    normalize_payload(&value)
}

pub fn normalize_payload(payload: &Value) -> Result<Vec<Student>> {
    let root = payload.as_object().ok_or_else(|| {
        ParseError::MalformedDocument("expected an object with a students list".to_string())
    })?;
    let entries = root
        .get("students")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut students = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let raw = match RawStudent::deserialize(entry) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(index, error = %err, "unreadable student entry, skipping");
                continue;
            }
        };
        match normalize_student(raw) {
            Some(student) => students.push(student),
            None => warn!(index, "student entry without a name, skipping"),
        }
    }

    if students.is_empty() {
        return Err(ParseError::NoStudentsFound);
    }
    debug!(count = students.len(), "normalized students from payload");
    Ok(students)
}

pub fn payload_metadata(payload: &Value) -> PayloadMetadata {
    let text = |value: &Value| {
        value
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    PayloadMetadata {
        generated_at: text(&payload["metadata"]["generated_at_utc"]),
        source_url: text(&payload["metadata"]["source_url"]),
        mentor_name: text(&payload["mentor"]["name"]),
        mentor_group: text(&payload["mentor"]["group"]),
        student_total: payload["students"].as_array().map_or(0, Vec::len),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Typed entries of a `{ "items": [...] }` section. Entries that do not fit the
/// expected shape are logged and skipped; the rest of the section survives.
fn entries<T: DeserializeOwned>(section: &Value, list: &str, student: &str) -> Vec<T> {
    section
        .get("items")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match T::deserialize(item) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(student, list, index, error = %err, "unreadable entry, skipping");
                None
            }
        })
        .collect()
}

fn normalize_student(raw: RawStudent) -> Option<Student> {
    let RawStudent { profile, progress } = raw;
    let name = non_empty(profile.name)?;

    let owner = name.clone();
    let mut student = Student::new(name, canonical_status(profile.status_badge.as_deref()));
    student.last_updated = non_empty(profile.last_updated);

    let details = Profile {
        university: non_empty(profile.university),
        major: non_empty(profile.major),
        photo_url: non_empty(profile.photo_url),
        profile_link: non_empty(profile.profile_link),
    };
    student.image = details.photo_url.clone();
    if details != Profile::default() {
        student.profile = Some(details);
    }

    let courses: Vec<RawCourse> = entries(&progress.course_progress, "course_progress", &owner);
    for item in courses {
        let name = item.course.trim();
        if name.is_empty() || student.courses.iter().any(|c| c.name == name) {
            continue;
        }
        student.courses.push(Course::new(
            name,
            percent(&item.progress_percent),
            course_status_from_label(&item.status),
        ));
    }

    let assignments: Vec<RawAssignment> =
        entries(&progress.assignment_progress, "assignment_progress", &owner);
    student.assignments = assignments
        .into_iter()
        .filter(|item| !item.assignment.trim().is_empty())
        .map(|item| Assignment {
            name: item.assignment.trim().to_string(),
            status: assignment_status_from_label(&item.status),
        })
        .collect();

    let attendance: Vec<RawAttendance> = entries(&progress.attendance, "attendance", &owner);
    student.attendance = attendance
        .into_iter()
        .filter(|item| !item.event.trim().is_empty())
        .map(|item| AttendanceRecord {
            event: item.event.trim().to_string(),
            status: attendance_status_from_label(&item.status),
        })
        .collect();

    let checkins: Vec<RawCheckin> = entries(&progress.daily_checkins, "daily_checkins", &owner);
    student.checkins = checkins
        .into_iter()
        .map(|item| DailyCheckin {
            date: item.date.trim().to_string(),
            mood: mood_from_label(&item.mood),
            goals: item
                .goals
                .into_iter()
                .filter(|goal| !goal.title.trim().is_empty())
                .map(|goal| Goal {
                    title: goal.title.trim().to_string(),
                    topics: goal.topics,
                })
                .collect(),
            reflection: item.reflection,
        })
        .collect();

    let points_log: Vec<RawPoint> = entries(&progress.point_histories, "point_histories", &owner);
    student.points = points_log
        .into_iter()
        .map(|item| PointEntry {
            date: item.date.trim().to_string(),
            description: item.description.trim().to_string(),
            points: points(&item.point),
        })
        .collect();

    Some(student)
}

/// Accepts `39`, `39.4`, `"39%"` and `"39"`; anything else counts as 0.
fn percent(value: &Value) -> u32 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|p| p.is_finite())
        .map(|p| p.round().max(0.0) as u32)
        .unwrap_or(0)
}

fn points(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .unwrap_or(0),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '-')
                .collect();
            cleaned.parse().unwrap_or(0)
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceStatus, CourseStatus, Mood, StudentStatus};
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "metadata": {
                "generated_at_utc": "2026-02-14T08:00:00+00:00",
                "source_url": "https://codingcamp.example.com/mentor"
            },
            "mentor": { "name": "Jules Moreno", "group": "CDC-12" },
            "students": [
                {
                    "profile": {
                        "name": "Avery Lee",
                        "status_badge": "On Track",
                        "university": "Universitas Gadjah Mada",
                        "photo_url": "https://cdn.example.com/a.png"
                    },
                    "progress": {
                        "course_progress": { "items": [
                            { "course": "Belajar Dasar AI", "progress_percent": "39%", "status": "In Progress" },
                            { "course": "Belajar Git", "progress_percent": 4, "status": "Not Started" },
                            { "course": "Belajar Python", "progress_percent": "100", "status": "Completed" }
                        ]},
                        "attendance": { "items": [
                            { "event": "Weekly Sync 1", "status": "Off Cam" }
                        ]},
                        "daily_checkins": { "items": [
                            { "date": "Sat, Feb 14, 2026", "mood": "good",
                              "goals": [{ "title": "Finish module 3", "topics": ["loops"] }],
                              "reflection": "steady" }
                        ]},
                        "point_histories": { "items": [
                            { "date": "14 Feb 2026", "description": "Daily check-in", "point": "+10" }
                        ], "total_point": "10" }
                    }
                },
                {
                    "profile": { "name": "Kiara Patel", "status_badge": "Unheard Of" },
                    "progress": { "course_progress": null }
                }
            ]
        })
    }

    #[test]
    fn normalizes_nested_lists() {
        let students = normalize_payload(&sample()).unwrap();
        assert_eq!(students.len(), 2);

        let avery = &students[0];
        assert_eq!(avery.status, Some(StudentStatus::Ideal));
        assert_eq!(avery.courses.len(), 3);
        assert_eq!(avery.courses[0].progress, 39);
        assert_eq!(avery.courses[0].status, CourseStatus::InProgress);
        assert_eq!(avery.courses[1].progress, 0);
        assert_eq!(avery.courses[2].progress, 100);
        assert_eq!(avery.attendance[0].status, AttendanceStatus::OffCam);
        assert_eq!(avery.checkins[0].mood, Mood::Good);
        assert_eq!(avery.checkins[0].goals[0].topics, vec!["loops".to_string()]);
        assert_eq!(avery.points[0].points, 10);
        assert_eq!(avery.image.as_deref(), Some("https://cdn.example.com/a.png"));
    }

    #[test]
    fn missing_lists_default_to_empty_and_unknown_status_stays_unknown() {
        let students = normalize_payload(&sample()).unwrap();
        let kiara = &students[1];
        assert_eq!(kiara.status, None);
        assert!(kiara.courses.is_empty());
        assert!(kiara.checkins.is_empty());
        assert!(kiara.profile.is_none());
    }

    #[test]
    fn nameless_and_empty_payloads() {
        let payload = json!({ "students": [{ "profile": { "name": "  " } }] });
        assert_eq!(normalize_payload(&payload), Err(ParseError::NoStudentsFound));
        assert_eq!(normalize_payload(&json!({})), Err(ParseError::NoStudentsFound));
        assert!(matches!(
            normalize_payload(&json!([1, 2])),
            Err(ParseError::MalformedDocument(_))
        ));
    }

    #[test]
    fn text_entry_points() {
        assert_eq!(parse_payload("   "), Err(ParseError::EmptyInput));
        assert!(matches!(
            parse_payload("{\"students\": ["),
            Err(ParseError::MalformedDocument(_))
        ));
    }

    #[test]
    fn metadata_is_extracted() {
        let meta = payload_metadata(&sample());
        assert_eq!(meta.mentor_group.as_deref(), Some("CDC-12"));
        assert_eq!(meta.student_total, 2);
        assert_eq!(
            meta.source_url.as_deref(),
            Some("https://codingcamp.example.com/mentor")
        );
    }

    #[test]
    fn bad_entries_are_skipped_without_losing_the_student() {
        let payload = json!({
            "students": [{
                "profile": { "name": "Avery Lee" },
                "progress": {
                    "course_progress": { "items": [
                        { "course": "Belajar Git", "progress_percent": 80, "status": "In Progress" },
                        { "course": 42, "progress_percent": 10, "status": "In Progress" },
                        "not an entry"
                    ]},
                    "daily_checkins": { "items": [
                        { "date": "2026-02-13", "mood": 3 },
                        { "date": "2026-02-14", "mood": "bad" }
                    ]},
                    "attendance": { "items": [
                        { "event": ["Weekly Sync 1"], "status": "Attending" },
                        { "event": "Weekly Sync 2", "status": "Late" }
                    ]}
                }
            }]
        });
        let students = normalize_payload(&payload).unwrap();
        assert_eq!(students.len(), 1);

        let avery = &students[0];
        assert_eq!(avery.name, "Avery Lee");
        assert_eq!(avery.courses.len(), 1);
        assert_eq!(avery.courses[0].name, "Belajar Git");
        assert_eq!(avery.courses[0].progress, 80);
        assert_eq!(avery.checkins.len(), 1);
        assert_eq!(avery.checkins[0].date, "2026-02-14");
        assert_eq!(avery.checkins[0].mood, Mood::Bad);
        assert_eq!(avery.attendance.len(), 1);
        assert_eq!(avery.attendance[0].status, AttendanceStatus::Late);
    }

    #[test]
    fn duplicate_course_names_keep_the_first_entry() {
        let payload = json!({
            "students": [{
                "profile": { "name": "Avery Lee" },
                "progress": { "course_progress": { "items": [
                    { "course": "Belajar Git", "progress_percent": 80, "status": "In Progress" },
                    { "course": " Belajar Git ", "progress_percent": 100, "status": "Completed" }
                ]}}
            }]
        });
        let courses = &normalize_payload(&payload).unwrap()[0].courses;
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].progress, 80);
        assert_eq!(courses[0].status, CourseStatus::InProgress);
    }

    #[test]
    fn percent_forms() {
        assert_eq!(percent(&json!("39%")), 39);
        assert_eq!(percent(&json!(72.6)), 73);
        assert_eq!(percent(&json!(null)), 0);
        assert_eq!(percent(&json!("n/a")), 0);
    }
}
