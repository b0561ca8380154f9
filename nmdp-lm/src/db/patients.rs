//! Patient persistence
//!
//! Patients are 1:1 satellites of accounts. The registry keys them two
//! ways: by the account email and by the owning account guid, so message
//! routing can reach a patient through a resolved chat session.

use crate::error::Result;
use sqlx::SqliteConnection;
use uuid::Uuid;

pub async fn insert_patient(
    conn: &mut SqliteConnection,
    guid: Uuid,
    account_guid: Uuid,
    diet_status: &str,
    contract_status: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO patients (guid, account_guid, diet_status, contract_status)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(guid.to_string())
    .bind(account_guid.to_string())
    .bind(diet_status)
    .bind(contract_status)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// `(account email, patient guid)` pairs for registry preload
pub async fn email_pairs(conn: &mut SqliteConnection) -> Result<Vec<(String, Uuid)>> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        r#"
        SELECT a.email, p.guid
        FROM patients p
        JOIN accounts a ON a.guid = p.account_guid
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    let mut pairs = Vec::with_capacity(rows.len());
    for (email, guid) in rows {
        pairs.push((email, Uuid::parse_str(&guid)?));
    }
    Ok(pairs)
}

/// `(account guid, patient guid)` pairs for registry preload
pub async fn account_pairs(conn: &mut SqliteConnection) -> Result<Vec<(String, Uuid)>> {
    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT account_guid, guid FROM patients")
            .fetch_all(&mut *conn)
            .await?;

    let mut pairs = Vec::with_capacity(rows.len());
    for (account_guid, guid) in rows {
        pairs.push((account_guid, Uuid::parse_str(&guid)?));
    }
    Ok(pairs)
}

pub async fn count_patients(conn: &mut SqliteConnection) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM patients")
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}
