//! Interview persistence
//!
//! Interviews follow the same orphan policy as recommendations.

use crate::error::Result;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

/// New interview row
#[derive(Debug, Clone)]
pub struct NewInterview {
    pub guid: Uuid,
    pub patient_guid: Option<Uuid>,
    /// Raw answer payload, stored as JSON text
    pub answers: String,
    pub submitted_at: DateTime<Utc>,
    pub legacy_ref: String,
}

pub async fn insert_interview(conn: &mut SqliteConnection, interview: &NewInterview) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO interviews (guid, patient_guid, answers, submitted_at, legacy_ref)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(interview.guid.to_string())
    .bind(interview.patient_guid.map(|g| g.to_string()))
    .bind(&interview.answers)
    .bind(interview.submitted_at.to_rfc3339())
    .bind(&interview.legacy_ref)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn count_interviews(conn: &mut SqliteConnection) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM interviews")
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}
