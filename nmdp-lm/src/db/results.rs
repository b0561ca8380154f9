//! Diagnostic result persistence
//!
//! A result may reference an uploaded file by path. The path is stored
//! verbatim; the object store that owns the file is never touched here.

use crate::error::Result;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

/// New result row
#[derive(Debug, Clone)]
pub struct NewLabResult {
    pub guid: Uuid,
    pub patient_guid: Uuid,
    pub kind: String,
    pub value: Option<String>,
    pub file_path: Option<String>,
    pub measured_at: DateTime<Utc>,
    pub legacy_ref: String,
}

pub async fn insert_result(conn: &mut SqliteConnection, result: &NewLabResult) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO results (guid, patient_guid, kind, value, file_path, measured_at, legacy_ref)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(result.guid.to_string())
    .bind(result.patient_guid.to_string())
    .bind(&result.kind)
    .bind(&result.value)
    .bind(&result.file_path)
    .bind(result.measured_at.to_rfc3339())
    .bind(&result.legacy_ref)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn count_results(conn: &mut SqliteConnection) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM results")
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}
