use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::checkins::{checkin_stats, CheckinStats};
use crate::models::{
    AssignmentStatus, AttendanceStatus, Course, CourseStatus, Student, StudentStatus,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseStat {
    pub name: String,
    pub enrolled: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub not_started: usize,
    pub average_progress: u32,
    pub completion_rate: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub special_attention: usize,
    pub lagging: usize,
    pub ideal: usize,
    pub ahead: usize,
    /// Students whose status could not be determined. Not one of the buckets.
    pub unknown: usize,
}

impl StatusCounts {
    pub fn get(&self, status: StudentStatus) -> usize {
        match status {
            StudentStatus::SpecialAttention => self.special_attention,
            StudentStatus::Lagging => self.lagging,
            StudentStatus::Ideal => self.ideal,
            StudentStatus::Ahead => self.ahead,
        }
    }

    pub fn known(&self) -> usize {
        self.special_attention + self.lagging + self.ideal + self.ahead
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentStat {
    pub name: String,
    pub total: usize,
    pub completed: usize,
    pub uncompleted: usize,
    pub completion_rate: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceStat {
    pub event: String,
    pub total: usize,
    pub attending: usize,
    pub late: usize,
    pub off_cam: usize,
    pub replaced: usize,
    pub absent: usize,
    pub unrecognized: usize,
    pub attendance_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentProgress {
    pub name: String,
    pub status: Option<StudentStatus>,
    pub average_progress: u32,
    pub completed_courses: usize,
    pub total_courses: usize,
}

/// Every cohort-wide aggregate in one value.
#[derive(Debug, Clone, Serialize)]
pub struct CohortStats {
    pub students: usize,
    pub status_counts: StatusCounts,
    pub courses: Vec<CourseStat>,
    pub assignments: Vec<AssignmentStat>,
    pub attendance: Vec<AttendanceStat>,
    pub checkins: CheckinStats,
}

pub fn rate(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        0
    } else {
        (part as f64 / whole as f64 * 100.0).round() as u32
    }
}

fn rounded_mean(total: u64, count: usize) -> u32 {
    if count == 0 {
        0
    } else {
        (total as f64 / count as f64).round() as u32
    }
}

pub fn average_progress(courses: &[Course]) -> u32 {
    let total: u64 = courses.iter().map(|c| u64::from(c.progress)).sum();
    rounded_mean(total, courses.len())
}

pub fn course_stats(students: &[Student]) -> Vec<CourseStat> {
    // (enrolled, completed, in_progress, not_started, total_progress)
    let mut map: BTreeMap<&str, (usize, usize, usize, usize, u64)> = BTreeMap::new();

    for course in students.iter().flat_map(|s| s.courses.iter()) {
        let entry = map.entry(course.name.as_str()).or_insert((0, 0, 0, 0, 0));
        entry.0 += 1;
        entry.4 += u64::from(course.progress);
        match course.status {
            CourseStatus::Completed => entry.1 += 1,
            CourseStatus::InProgress => entry.2 += 1,
            CourseStatus::NotStarted => entry.3 += 1,
        }
    }

    map.into_iter()
        .map(
            |(name, (enrolled, completed, in_progress, not_started, total))| CourseStat {
                name: name.to_string(),
                enrolled,
                completed,
                in_progress,
                not_started,
                average_progress: rounded_mean(total, enrolled),
                completion_rate: rate(completed, enrolled),
            },
        )
        .collect()
}

pub fn status_counts(students: &[Student]) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for student in students {
        match student.status {
            Some(StudentStatus::SpecialAttention) => counts.special_attention += 1,
            Some(StudentStatus::Lagging) => counts.lagging += 1,
            Some(StudentStatus::Ideal) => counts.ideal += 1,
            Some(StudentStatus::Ahead) => counts.ahead += 1,
            None => counts.unknown += 1,
        }
    }
    counts
}

pub fn assignment_stats(students: &[Student]) -> Vec<AssignmentStat> {
    let mut map: BTreeMap<&str, (usize, usize)> = BTreeMap::new();

    for assignment in students.iter().flat_map(|s| s.assignments.iter()) {
        let entry = map.entry(assignment.name.as_str()).or_insert((0, 0));
        match assignment.status {
            AssignmentStatus::Completed => entry.0 += 1,
            AssignmentStatus::Uncompleted => entry.1 += 1,
        }
    }

    map.into_iter()
        .map(|(name, (completed, uncompleted))| {
            let total = completed + uncompleted;
            AssignmentStat {
                name: name.to_string(),
                total,
                completed,
                uncompleted,
                completion_rate: rate(completed, total),
            }
        })
        .collect()
}

pub fn attendance_stats(students: &[Student]) -> Vec<AttendanceStat> {
    let mut map: BTreeMap<&str, AttendanceStat> = BTreeMap::new();

    for record in students.iter().flat_map(|s| s.attendance.iter()) {
        let entry = map.entry(record.event.as_str()).or_default();
        entry.total += 1;
        match record.status {
            AttendanceStatus::Attending => entry.attending += 1,
            AttendanceStatus::Late => entry.late += 1,
            AttendanceStatus::OffCam => entry.off_cam += 1,
            AttendanceStatus::Replaced => entry.replaced += 1,
            AttendanceStatus::Absent => entry.absent += 1,
            AttendanceStatus::Unrecognized(_) => entry.unrecognized += 1,
        }
    }

    map.into_iter()
        .map(|(event, mut stat)| {
            stat.event = event.to_string();
            stat.attendance_rate = rate(stat.attending + stat.late + stat.off_cam, stat.total);
            stat
        })
        .collect()
}

/// Per-student course progress, lowest average first so lagging students lead.
pub fn student_progress(students: &[Student]) -> Vec<StudentProgress> {
    let mut values: Vec<StudentProgress> = students
        .iter()
        .map(|student| StudentProgress {
            name: student.name.clone(),
            status: student.status,
            average_progress: average_progress(&student.courses),
            completed_courses: student
                .courses
                .iter()
                .filter(|c| c.status == CourseStatus::Completed)
                .count(),
            total_courses: student.courses.len(),
        })
        .collect();
    values.sort_by(|a, b| {
        a.average_progress
            .cmp(&b.average_progress)
            .then_with(|| a.name.cmp(&b.name))
    });
    values
}

pub fn cohort_stats(students: &[Student], today: NaiveDate) -> CohortStats {
    CohortStats {
        students: students.len(),
        status_counts: status_counts(students),
        courses: course_stats(students),
        assignments: assignment_stats(students),
        attendance: attendance_stats(students),
        checkins: checkin_stats(students, today),
    }
}
