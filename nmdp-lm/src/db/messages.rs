//! Chat message persistence

use crate::error::Result;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

/// New message row
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub guid: Uuid,
    pub patient_guid: Uuid,
    pub sender_guid: Uuid,
    pub body: String,
    pub chat_ref: Option<String>,
    pub sent_at: DateTime<Utc>,
    pub legacy_ref: String,
}

pub async fn insert_message(conn: &mut SqliteConnection, message: &NewMessage) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO messages (guid, patient_guid, sender_guid, body, chat_ref, sent_at, legacy_ref)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(message.guid.to_string())
    .bind(message.patient_guid.to_string())
    .bind(message.sender_guid.to_string())
    .bind(&message.body)
    .bind(&message.chat_ref)
    .bind(message.sent_at.to_rfc3339())
    .bind(&message.legacy_ref)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn count_messages(conn: &mut SqliteConnection) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}
