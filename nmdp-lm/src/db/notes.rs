//! Clinical note persistence

use crate::error::Result;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

/// New note row
#[derive(Debug, Clone)]
pub struct NewNote {
    pub guid: Uuid,
    pub patient_guid: Uuid,
    pub author_guid: Uuid,
    pub body: String,
    pub noted_at: DateTime<Utc>,
    pub legacy_ref: String,
}

pub async fn insert_note(conn: &mut SqliteConnection, note: &NewNote) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO notes (guid, patient_guid, author_guid, body, noted_at, legacy_ref)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(note.guid.to_string())
    .bind(note.patient_guid.to_string())
    .bind(note.author_guid.to_string())
    .bind(&note.body)
    .bind(note.noted_at.to_rfc3339())
    .bind(&note.legacy_ref)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn count_notes(conn: &mut SqliteConnection) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notes")
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}
