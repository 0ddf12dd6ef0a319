use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{Student, StudentStatus};
use crate::payload::PayloadMetadata;
use crate::stats;

pub fn build_report(
    students: &[Student],
    metadata: Option<&PayloadMetadata>,
    today: NaiveDate,
    limit: usize,
) -> String {
    let cohort = stats::cohort_stats(students, today);
    let ranked = stats::student_progress(students);

    let mut output = String::new();
    let group_label = metadata
        .and_then(|meta| meta.mentor_group.as_deref())
        .unwrap_or("all groups");

    let _ = writeln!(output, "# Cohort Progress Report");
    let _ = writeln!(
        output,
        "Generated for {} on {} ({} students)",
        group_label, today, cohort.students
    );
    if let Some(meta) = metadata {
        if let Some(mentor) = meta.mentor_name.as_deref() {
            let _ = writeln!(output, "Mentor: {mentor}");
        }
        if let Some(generated_at) = meta.generated_at.as_deref() {
            let _ = writeln!(output, "Source scraped at {generated_at}");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Status Mix");
    for status in StudentStatus::ALL {
        let _ = writeln!(
            output,
            "- {}: {}",
            status,
            cohort.status_counts.get(status)
        );
    }
    if cohort.status_counts.unknown > 0 {
        let _ = writeln!(
            output,
            "- Unknown status (not counted above): {}",
            cohort.status_counts.unknown
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Course Completion");
    if cohort.courses.is_empty() {
        let _ = writeln!(output, "No courses recorded.");
    } else {
        let _ = writeln!(
            output,
            "| Course | Enrolled | Completed | In Progress | Not Started | Avg % | Completion % |"
        );
        let _ = writeln!(output, "|---|---|---|---|---|---|---|");
        for course in &cohort.courses {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} | {} | {} |",
                course.name,
                course.enrolled,
                course.completed,
                course.in_progress,
                course.not_started,
                course.average_progress,
                course.completion_rate
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Lowest Course Progress");
    if ranked.is_empty() {
        let _ = writeln!(output, "No students in this snapshot.");
    } else {
        for student in ranked.iter().take(limit) {
            let status = student
                .status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            let _ = writeln!(
                output,
                "- {} ({}) avg {}% with {}/{} courses completed",
                student.name,
                status,
                student.average_progress,
                student.completed_courses,
                student.total_courses
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Assignments");
    if cohort.assignments.is_empty() {
        let _ = writeln!(output, "No assignments recorded.");
    } else {
        for assignment in &cohort.assignments {
            let _ = writeln!(
                output,
                "- {}: {}/{} completed ({}%)",
                assignment.name, assignment.completed, assignment.total, assignment.completion_rate
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Attendance");
    if cohort.attendance.is_empty() {
        let _ = writeln!(output, "No attendance recorded.");
    } else {
        for event in &cohort.attendance {
            let _ = writeln!(
                output,
                "- {}: {}% present (attending {}, late {}, off cam {}, replaced {}, absent {}, other {})",
                event.event,
                event.attendance_rate,
                event.attending,
                event.late,
                event.off_cam,
                event.replaced,
                event.absent,
                event.unrecognized
            );
        }
    }

    let checkins = &cohort.checkins;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Daily Check-ins");
    let _ = writeln!(
        output,
        "{} check-ins (good {}, neutral {}, bad {})",
        checkins.total_checkins, checkins.moods.good, checkins.moods.neutral, checkins.moods.bad
    );
    for summary in checkins.students.iter().filter(|s| !s.missing).take(limit) {
        let last = summary
            .last_checkin
            .map(|day| day.to_string())
            .unwrap_or_else(|| "undated".to_string());
        let _ = writeln!(
            output,
            "- {}: streak {} across {} check-ins (last {})",
            summary.name, summary.streak, summary.total, last
        );
    }
    if !checkins.missing.is_empty() {
        let _ = writeln!(output, "Missing check-ins: {}", checkins.missing.join(", "));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Course, CourseStatus};

    #[test]
    fn report_lists_sections_and_unknown_status() {
        let mut avery = Student::new("Avery Lee", Some(StudentStatus::Ideal));
        avery.courses = vec![Course::new("Belajar Git", 100, CourseStatus::Completed)];
        let jules = Student::new("Jules Moreno", None);
        let meta = PayloadMetadata {
            mentor_group: Some("CDC-12".to_string()),
            ..PayloadMetadata::default()
        };
        let today = NaiveDate::from_ymd_opt(2026, 2, 14).unwrap();

        let report = build_report(&[avery, jules], Some(&meta), today, 10);
        assert!(report.starts_with("# Cohort Progress Report"));
        assert!(report.contains("Generated for CDC-12 on 2026-02-14 (2 students)"));
        assert!(report.contains("- Ideal: 1"));
        assert!(report.contains("- Unknown status (not counted above): 1"));
        assert!(report.contains("| Belajar Git | 1 | 1 | 0 | 0 | 100 | 100 |"));
        assert!(report.contains("- Jules Moreno (unknown) avg 0% with 0/0 courses completed"));
        assert!(report.contains("Missing check-ins: Avery Lee, Jules Moreno"));
    }

    #[test]
    fn empty_snapshot_still_renders() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 14).unwrap();
        let report = build_report(&[], None, today, 5);
        assert!(report.contains("No courses recorded."));
        assert!(report.contains("No students in this snapshot."));
    }
}
