//! Daily check-in analytics: mood tallies, streaks and the calendar heatmap.
//!
//! Check-ins are grouped by local calendar day. Entries whose date cannot be
//! parsed still count toward totals and moods but never toward a day.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::config::{EMPTY_HEATMAP_DAYS, STREAK_GAP_HOURS};
use crate::dates::{calendar_day, format_day_key};
use crate::models::{DailyCheckin, Goal, Mood, Student};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MoodTally {
    pub good: usize,
    pub neutral: usize,
    pub bad: usize,
}

impl MoodTally {
    pub fn add(&mut self, mood: Mood) {
        match mood {
            Mood::Good => self.good += 1,
            Mood::Neutral => self.neutral += 1,
            Mood::Bad => self.bad += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.good + self.neutral + self.bad
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentCheckinSummary {
    pub name: String,
    pub total: usize,
    pub moods: MoodTally,
    pub streak: u32,
    pub last_checkin: Option<NaiveDate>,
    pub missing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckinStats {
    /// Sorted by streak, longest first.
    pub students: Vec<StudentCheckinSummary>,
    pub moods: MoodTally,
    pub total_checkins: usize,
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeatmapCell {
    pub date: String,
    pub present: bool,
    pub mood: Option<Mood>,
    pub goals: Vec<Goal>,
    pub reflection: Option<String>,
}

impl HeatmapCell {
    fn absent(day: NaiveDate) -> Self {
        Self {
            date: format_day_key(day),
            present: false,
            mood: None,
            goals: Vec::new(),
            reflection: None,
        }
    }

    fn from_checkin(day: NaiveDate, checkin: &DailyCheckin) -> Self {
        let reflection = checkin.reflection.trim();
        Self {
            date: format_day_key(day),
            present: true,
            mood: Some(checkin.mood),
            goals: checkin.goals.clone(),
            reflection: (!reflection.is_empty()).then(|| reflection.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeatmapRow {
    pub student: String,
    pub present_days: usize,
    pub cells: Vec<HeatmapCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckinHeatmap {
    pub days: Vec<String>,
    pub rows: Vec<HeatmapRow>,
}

/// Distinct local days with a check-in, most recent first.
fn checkin_days(checkins: &[DailyCheckin], today: NaiveDate) -> Vec<NaiveDate> {
    let mut days: Vec<NaiveDate> = checkins
        .iter()
        .filter_map(|checkin| calendar_day(&checkin.date, today))
        .collect();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();
    days
}

/// Length of the run of days ending at the first (most recent) entry.
/// `days` must be distinct and sorted most recent first.
pub fn streak(days: &[NaiveDate]) -> u32 {
    let Some(first) = days.first() else {
        return 0;
    };
    let mut count = 1;
    let mut previous = first.and_time(chrono::NaiveTime::MIN);
    for day in &days[1..] {
        let current = day.and_time(chrono::NaiveTime::MIN);
        if (previous - current).num_hours() > STREAK_GAP_HOURS {
            break;
        }
        count += 1;
        previous = current;
    }
    count
}

pub fn checkin_stats(students: &[Student], today: NaiveDate) -> CheckinStats {
    let mut moods = MoodTally::default();
    let mut total_checkins = 0;
    let mut missing = Vec::new();

    let mut summaries: Vec<StudentCheckinSummary> = students
        .iter()
        .map(|student| {
            let mut tally = MoodTally::default();
            for checkin in &student.checkins {
                tally.add(checkin.mood);
                moods.add(checkin.mood);
            }
            total_checkins += student.checkins.len();

            let days = checkin_days(&student.checkins, today);
            let is_missing = student.checkins.is_empty();
            if is_missing {
                missing.push(student.name.clone());
            }
            StudentCheckinSummary {
                name: student.name.clone(),
                total: student.checkins.len(),
                moods: tally,
                streak: streak(&days),
                last_checkin: days.first().copied(),
                missing: is_missing,
            }
        })
        .collect();

    summaries.sort_by(|a, b| b.streak.cmp(&a.streak).then_with(|| a.name.cmp(&b.name)));

    CheckinStats {
        students: summaries,
        moods,
        total_checkins,
        missing,
    }
}

/// Dense student x day grid from the earliest check-in through `today`.
pub fn checkin_heatmap(students: &[Student], today: NaiveDate) -> CheckinHeatmap {
    let per_student: Vec<HashMap<NaiveDate, &DailyCheckin>> = students
        .iter()
        .map(|student| {
            let mut by_day = HashMap::new();
            for checkin in &student.checkins {
                if let Some(day) = calendar_day(&checkin.date, today) {
                    by_day.entry(day).or_insert(checkin);
                }
            }
            by_day
        })
        .collect();

    let start = per_student
        .iter()
        .flat_map(|by_day| by_day.keys().copied())
        .min()
        .map(|earliest| earliest.min(today))
        .unwrap_or_else(|| today - Duration::days(EMPTY_HEATMAP_DAYS - 1));

    let window: Vec<NaiveDate> = start.iter_days().take_while(|day| *day <= today).collect();

    let rows = students
        .iter()
        .zip(&per_student)
        .map(|(student, by_day)| {
            let cells: Vec<HeatmapCell> = window
                .iter()
                .map(|day| match by_day.get(day) {
                    Some(checkin) => HeatmapCell::from_checkin(*day, checkin),
                    None => HeatmapCell::absent(*day),
                })
                .collect();
            HeatmapRow {
                student: student.name.clone(),
                present_days: cells.iter().filter(|cell| cell.present).count(),
                cells,
            }
        })
        .collect();

    CheckinHeatmap {
        days: window.into_iter().map(format_day_key).collect(),
        rows,
    }
}
