//! Account, profile and person-profile persistence

use crate::error::Result;
use sqlx::SqliteConnection;
use uuid::Uuid;

/// New account row
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub guid: Uuid,
    pub email: String,
    pub password_hash: String,
    pub must_reset_password: bool,
    pub legacy_chat_ref: Option<String>,
}

pub async fn insert_account(conn: &mut SqliteConnection, account: &NewAccount) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO accounts (guid, email, password_hash, must_reset_password, legacy_chat_ref)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(account.guid.to_string())
    .bind(&account.email)
    .bind(&account.password_hash)
    .bind(account.must_reset_password as i64)
    .bind(&account.legacy_chat_ref)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn insert_profile(
    conn: &mut SqliteConnection,
    guid: Uuid,
    account_guid: Uuid,
    first_name: Option<&str>,
    last_name: Option<&str>,
    referral_code: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO profiles (guid, account_guid, first_name, last_name, referral_code)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(guid.to_string())
    .bind(account_guid.to_string())
    .bind(first_name)
    .bind(last_name)
    .bind(referral_code)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn insert_person_profile(
    conn: &mut SqliteConnection,
    guid: Uuid,
    account_guid: Uuid,
    display_name: Option<&str>,
    is_primary: bool,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO person_profiles (guid, account_guid, display_name, is_primary)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(guid.to_string())
    .bind(account_guid.to_string())
    .bind(display_name)
    .bind(is_primary as i64)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// `(email, guid)` pairs for registry preload
pub async fn email_pairs(conn: &mut SqliteConnection) -> Result<Vec<(String, Uuid)>> {
    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT email, guid FROM accounts")
            .fetch_all(&mut *conn)
            .await?;

    let mut pairs = Vec::with_capacity(rows.len());
    for (email, guid) in rows {
        pairs.push((email, Uuid::parse_str(&guid)?));
    }
    Ok(pairs)
}

/// `(legacy_chat_ref, guid)` pairs for registry preload
pub async fn chat_ref_pairs(conn: &mut SqliteConnection) -> Result<Vec<(String, Uuid)>> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT legacy_chat_ref, guid FROM accounts WHERE legacy_chat_ref IS NOT NULL",
    )
    .fetch_all(&mut *conn)
    .await?;

    let mut pairs = Vec::with_capacity(rows.len());
    for (chat_ref, guid) in rows {
        pairs.push((chat_ref, Uuid::parse_str(&guid)?));
    }
    Ok(pairs)
}

pub async fn referral_code_exists(conn: &mut SqliteConnection, code: &str) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM profiles WHERE referral_code = ?")
            .bind(code)
            .fetch_one(&mut *conn)
            .await?;
    Ok(count > 0)
}

/// Profile display names for one account, if a profile exists
pub async fn profile_names(
    conn: &mut SqliteConnection,
    account_guid: Uuid,
) -> Result<Option<(Option<String>, Option<String>)>> {
    let row: Option<(Option<String>, Option<String>)> = sqlx::query_as(
        "SELECT first_name, last_name FROM profiles WHERE account_guid = ?",
    )
    .bind(account_guid.to_string())
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row)
}

pub async fn count_accounts(conn: &mut SqliteConnection) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}
