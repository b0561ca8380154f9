//! Referral persistence

use crate::error::Result;
use sqlx::SqliteConnection;
use uuid::Uuid;

/// New referral row
#[derive(Debug, Clone)]
pub struct NewReferral {
    pub guid: Uuid,
    pub referrer_guid: Uuid,
    pub referred_guid: Uuid,
    pub referrer_name: String,
    pub referred_name: String,
    pub status: String,
    pub legacy_ref: String,
}

pub async fn insert_referral(conn: &mut SqliteConnection, referral: &NewReferral) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO referrals (
            guid, referrer_guid, referred_guid,
            referrer_name, referred_name, status, legacy_ref
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(referral.guid.to_string())
    .bind(referral.referrer_guid.to_string())
    .bind(referral.referred_guid.to_string())
    .bind(&referral.referrer_name)
    .bind(&referral.referred_name)
    .bind(&referral.status)
    .bind(&referral.legacy_ref)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn count_referrals(conn: &mut SqliteConnection) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM referrals")
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}
