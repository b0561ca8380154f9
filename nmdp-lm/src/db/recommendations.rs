//! Recommendation persistence
//!
//! Recommendations may be written without an owning patient: the legacy
//! exports for this entity did not reliably carry an owner reference, and
//! the rows are still worth keeping.

use crate::error::Result;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

/// New recommendation row
#[derive(Debug, Clone)]
pub struct NewRecommendation {
    pub guid: Uuid,
    pub patient_guid: Option<Uuid>,
    pub title: Option<String>,
    pub body: String,
    /// Normalized tag list, stored as JSON text
    pub tags: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub legacy_ref: String,
}

pub async fn insert_recommendation(
    conn: &mut SqliteConnection,
    recommendation: &NewRecommendation,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO recommendations (guid, patient_guid, title, body, tags, issued_at, legacy_ref)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(recommendation.guid.to_string())
    .bind(recommendation.patient_guid.map(|g| g.to_string()))
    .bind(&recommendation.title)
    .bind(&recommendation.body)
    .bind(&recommendation.tags)
    .bind(recommendation.issued_at.to_rfc3339())
    .bind(&recommendation.legacy_ref)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn count_recommendations(conn: &mut SqliteConnection) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recommendations")
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

/// Recommendations with no owning patient
pub async fn count_orphaned(conn: &mut SqliteConnection) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM recommendations WHERE patient_guid IS NULL")
            .fetch_one(&mut *conn)
            .await?;
    Ok(count)
}
