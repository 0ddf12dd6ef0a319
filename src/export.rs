use std::io;
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use clap::ValueEnum;
use serde::Serialize;

use crate::checkins::{checkin_heatmap, checkin_stats};
use crate::models::{Mood, Student};
use crate::stats::{assignment_stats, attendance_stats, course_stats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportKind {
    Courses,
    Assignments,
    Attendance,
    Checkins,
    Heatmap,
}

#[derive(Serialize)]
struct CheckinRow<'a> {
    name: &'a str,
    total: usize,
    good: usize,
    neutral: usize,
    bad: usize,
    streak: u32,
    last_checkin: String,
    missing: bool,
}

fn mood_code(mood: Option<Mood>) -> &'static str {
    match mood {
        Some(Mood::Good) => "good",
        Some(Mood::Neutral) => "neutral",
        Some(Mood::Bad) => "bad",
        None => "",
    }
}

/// Writes one aggregate as CSV and returns the number of data rows.
pub fn write_csv<W: io::Write>(
    writer: W,
    kind: ExportKind,
    students: &[Student],
    today: NaiveDate,
) -> anyhow::Result<usize> {
    let mut csv = csv::Writer::from_writer(writer);
    let rows = match kind {
        ExportKind::Courses => serialize_all(&mut csv, course_stats(students))?,
        ExportKind::Assignments => serialize_all(&mut csv, assignment_stats(students))?,
        ExportKind::Attendance => serialize_all(&mut csv, attendance_stats(students))?,
        ExportKind::Checkins => {
            let stats = checkin_stats(students, today);
            let rows = stats.students.iter().map(|s| CheckinRow {
                name: &s.name,
                total: s.total,
                good: s.moods.good,
                neutral: s.moods.neutral,
                bad: s.moods.bad,
                streak: s.streak,
                last_checkin: s.last_checkin.map(|d| d.to_string()).unwrap_or_default(),
                missing: s.missing,
            });
            serialize_all(&mut csv, rows)?
        }
        ExportKind::Heatmap => {
            let heatmap = checkin_heatmap(students, today);
            let mut header = vec!["student".to_string()];
            header.extend(heatmap.days.iter().cloned());
            csv.write_record(&header)?;
            for row in &heatmap.rows {
                let mut record = vec![row.student.as_str()];
                record.extend(row.cells.iter().map(|cell| mood_code(cell.mood)));
                csv.write_record(&record)?;
            }
            heatmap.rows.len()
        }
    };
    csv.flush()?;
    Ok(rows)
}

fn serialize_all<W, I, T>(csv: &mut csv::Writer<W>, rows: I) -> anyhow::Result<usize>
where
    W: io::Write,
    I: IntoIterator<Item = T>,
    T: Serialize,
{
    let mut count = 0usize;
    for row in rows {
        csv.serialize(row)?;
        count += 1;
    }
    Ok(count)
}

pub fn export_to_path(
    path: &Path,
    kind: ExportKind,
    students: &[Student],
    today: NaiveDate,
) -> anyhow::Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_csv(file, kind, students, today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Course, CourseStatus, DailyCheckin};

    fn cohort() -> Vec<Student> {
        let mut avery = Student::new("Avery Lee", None);
        avery.courses = vec![Course::new("Belajar Git", 80, CourseStatus::InProgress)];
        avery.checkins = vec![DailyCheckin {
            date: "2026-02-13".to_string(),
            mood: Mood::Good,
            goals: vec![],
            reflection: String::new(),
        }];
        vec![avery, Student::new("Jules Moreno", None)]
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 14).unwrap()
    }

    #[test]
    fn course_csv_has_header_and_rows() {
        let mut buffer = Vec::new();
        let rows = write_csv(&mut buffer, ExportKind::Courses, &cohort(), today()).unwrap();
        assert_eq!(rows, 1);
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("name,enrolled,completed,in_progress,not_started,average_progress,completion_rate")
        );
        assert_eq!(lines.next(), Some("Belajar Git,1,0,1,0,80,0"));
    }

    #[test]
    fn heatmap_csv_is_dense() {
        let mut buffer = Vec::new();
        write_csv(&mut buffer, ExportKind::Heatmap, &cohort(), today()).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "student,2026-02-13,2026-02-14");
        assert_eq!(lines[1], "Avery Lee,good,");
        assert_eq!(lines[2], "Jules Moreno,,");
    }

    #[test]
    fn exports_to_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkins.csv");
        let rows = export_to_path(&path, ExportKind::Checkins, &cohort(), today()).unwrap();
        assert_eq!(rows, 2);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Avery Lee,1,1,0,0,1,2026-02-13,false"));
        assert!(text.contains("Jules Moreno,0,0,0,0,0,,true"));
    }
}
