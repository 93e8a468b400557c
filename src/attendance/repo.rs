use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::attendance::matcher::Candidate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "attendance_status", rename_all = "lowercase")]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
}

/// One attendance record; at most one exists per (student, date), enforced by
/// the unique constraint in the store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub student_user_id: String,
    pub date: Date,
    pub status: AttendanceStatus,
    pub marked_by: String,
    pub marked_at: OffsetDateTime,
    /// Match distance; only set on auto-marked records.
    pub score: Option<f64>,
}

pub async fn find_one(
    db: &PgPool,
    student_user_id: &str,
    date: Date,
) -> Result<Option<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(
        r#"
        SELECT id, student_user_id, date, status, marked_by, marked_at, score
        FROM attendance
        WHERE student_user_id = $1 AND date = $2
        "#,
    )
    .bind(student_user_id)
    .bind(date)
    .fetch_optional(db)
    .await
}

/// Conditional insert: one atomic statement, the unique constraint decides.
/// Returns `None` when a record for (student, date) already exists, so a race
/// between two markers leaves exactly one record and the loser knows it lost.
pub async fn insert_if_absent(
    db: &PgPool,
    student_user_id: &str,
    date: Date,
    status: AttendanceStatus,
    marked_by: &str,
    score: Option<f64>,
) -> Result<Option<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(
        r#"
        INSERT INTO attendance (student_user_id, date, status, marked_by, score)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (student_user_id, date) DO NOTHING
        RETURNING id, student_user_id, date, status, marked_by, marked_at, score
        "#,
    )
    .bind(student_user_id)
    .bind(date)
    .bind(status)
    .bind(marked_by)
    .bind(score)
    .fetch_optional(db)
    .await
}

/// Manual marking is an override: create the record or overwrite status,
/// marker and timestamp. Any auto-match score is cleared since the stored
/// status no longer comes from a match.
pub async fn upsert_manual(
    db: &PgPool,
    student_user_id: &str,
    date: Date,
    status: AttendanceStatus,
    marked_by: &str,
) -> Result<AttendanceRecord, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(
        r#"
        INSERT INTO attendance (student_user_id, date, status, marked_by)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (student_user_id, date) DO UPDATE
        SET status = EXCLUDED.status,
            marked_by = EXCLUDED.marked_by,
            marked_at = now(),
            score = NULL
        RETURNING id, student_user_id, date, status, marked_by, marked_at, score
        "#,
    )
    .bind(student_user_id)
    .bind(date)
    .bind(status)
    .bind(marked_by)
    .fetch_one(db)
    .await
}

pub async fn list_for_student(
    db: &PgPool,
    student_user_id: &str,
) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(
        r#"
        SELECT id, student_user_id, date, status, marked_by, marked_at, score
        FROM attendance
        WHERE student_user_id = $1
        ORDER BY date DESC
        "#,
    )
    .bind(student_user_id)
    .fetch_all(db)
    .await
}

pub async fn list_for_date(db: &PgPool, date: Date) -> Result<Vec<AttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceRecord>(
        r#"
        SELECT id, student_user_id, date, status, marked_by, marked_at, score
        FROM attendance
        WHERE date = $1
        "#,
    )
    .bind(date)
    .fetch_all(db)
    .await
}

/// Snapshot of every student's stored encodings, in user_id order so the
/// matcher's first-wins tie-break is deterministic. Entries that do not
/// decode as float vectors are dropped, not fatal.
pub async fn student_encoding_snapshot(db: &PgPool) -> Result<Vec<Candidate>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (String, serde_json::Value)>(
        r#"
        SELECT user_id, face_encodings
        FROM users
        WHERE role = 'student' AND jsonb_array_length(face_encodings) > 0
        ORDER BY user_id
        "#,
    )
    .fetch_all(db)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(user_id, value)| {
            let encodings = match value {
                serde_json::Value::Array(items) => items
                    .into_iter()
                    .filter_map(|v| serde_json::from_value::<Vec<f64>>(v).ok())
                    .collect(),
                _ => Vec::new(),
            };
            Candidate { user_id, encodings }
        })
        .collect())
}
