use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::Student;

#[derive(Debug, Clone)]
pub struct SnapshotSummary {
    pub id: Uuid,
    pub captured_at: DateTime<Utc>,
    pub source_kind: String,
    pub label: Option<String>,
    pub student_count: i32,
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Stores a normalized snapshot as-is; earlier snapshots are never touched.
pub async fn save_snapshot(
    pool: &PgPool,
    source_kind: &str,
    label: Option<&str>,
    students: &[Student],
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let student_count = i32::try_from(students.len())?;

    sqlx::query(
        r#"
        INSERT INTO cohort_progress.snapshots
        (id, source_kind, label, student_count, students)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(source_kind)
    .bind(label)
    .bind(student_count)
    .bind(Json(students))
    .execute(pool)
    .await?;

    Ok(id)
}

fn summary_from_row(row: &sqlx::postgres::PgRow) -> anyhow::Result<SnapshotSummary> {
    Ok(SnapshotSummary {
        id: row.try_get("id")?,
        captured_at: row.try_get("captured_at")?,
        source_kind: row.try_get("source_kind")?,
        label: row.try_get("label")?,
        student_count: row.try_get("student_count")?,
    })
}

pub async fn latest_snapshot(
    pool: &PgPool,
    label: Option<&str>,
) -> anyhow::Result<Option<(SnapshotSummary, Vec<Student>)>> {
    let mut query = String::from(
        "SELECT id, captured_at, source_kind, label, student_count, students \
         FROM cohort_progress.snapshots",
    );
    if label.is_some() {
        query.push_str(" WHERE label = $1");
    }
    query.push_str(" ORDER BY captured_at DESC LIMIT 1");

    let mut rows = sqlx::query(&query);
    if let Some(value) = label {
        rows = rows.bind(value);
    }

    let Some(row) = rows.fetch_optional(pool).await? else {
        return Ok(None);
    };
    let summary = summary_from_row(&row)?;
    let Json(students): Json<Vec<Student>> = row.try_get("students")?;
    Ok(Some((summary, students)))
}

pub async fn list_snapshots(pool: &PgPool, limit: i64) -> anyhow::Result<Vec<SnapshotSummary>> {
    let records = sqlx::query(
        "SELECT id, captured_at, source_kind, label, student_count \
         FROM cohort_progress.snapshots \
         ORDER BY captured_at DESC \
         LIMIT $1",
    )
    .bind(limit.max(1))
    .fetch_all(pool)
    .await?;

    records.iter().map(summary_from_row).collect()
}
