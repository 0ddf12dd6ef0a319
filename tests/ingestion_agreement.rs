use chrono::NaiveDate;
use serde_json::json;

use cohort_progress::checkins::{checkin_heatmap, checkin_stats};
use cohort_progress::markup::parse_markup;
use cohort_progress::payload::normalize_payload;
use cohort_progress::stats::{course_stats, status_counts};
use cohort_progress::ExtractionConfig;

const FIXTURE: &str = include_str!("fixtures/two_students.html");

fn payload() -> serde_json::Value {
    json!({
        "students": [
            {
                "profile": { "name": "Avery Lee", "status_badge": "Ahead of Schedule" },
                "progress": {
                    "course_progress": { "items": [
                        { "course": "Belajar Dasar Pemrograman Web", "progress_percent": "100%", "status": "Completed" }
                    ]},
                    "daily_checkins": { "items": [
                        { "date": "Sat, Feb 14, 2026", "mood": "good" },
                        { "date": "Feb 13, 2026", "mood": "neutral" },
                        { "date": "12 Februari 2026", "mood": "good" },
                        { "date": "2026-02-10", "mood": "bad" }
                    ]}
                }
            },
            {
                "profile": { "name": "Kiara Patel", "status_badge": "Need Special Attention" },
                "progress": {
                    "course_progress": { "items": [
                        { "course": "Belajar Dasar AI", "progress_percent": 39, "status": "In Progress" }
                    ]}
                }
            }
        ]
    })
}

#[test]
fn markup_and_payload_agree_on_courses_and_statuses() {
    let from_markup = parse_markup(FIXTURE, &ExtractionConfig::default()).unwrap();
    let from_payload = normalize_payload(&payload()).unwrap();

    assert_eq!(status_counts(&from_markup), status_counts(&from_payload));
    assert_eq!(course_stats(&from_markup), course_stats(&from_payload));
    for (a, b) in from_markup.iter().zip(&from_payload) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.status, b.status);
        assert_eq!(a.courses, b.courses);
    }
}

#[test]
fn checkin_analytics_over_a_normalized_payload() {
    let students = normalize_payload(&payload()).unwrap();
    let today = NaiveDate::from_ymd_opt(2026, 2, 14).unwrap();

    let stats = checkin_stats(&students, today);
    assert_eq!(stats.students[0].name, "Avery Lee");
    assert_eq!(stats.students[0].streak, 3);
    assert_eq!(stats.missing, vec!["Kiara Patel".to_string()]);

    let heatmap = checkin_heatmap(&students, today);
    assert_eq!(heatmap.days.len(), 5);
    assert_eq!(heatmap.days[0], "2026-02-10");
    assert_eq!(heatmap.rows[0].present_days, 4);
    assert_eq!(heatmap.rows[1].present_days, 0);
}
