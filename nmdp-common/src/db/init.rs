//! Database initialization
//!
//! The target schema is owned by the platform, not by individual services:
//! services connect with [`connect_database`] and assume the tables exist,
//! while platform bootstrap (and tests) create them with [`init_database`].
//! All creation statements are idempotent.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{SqliteConnection, SqlitePool};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Open a connection pool to an existing platform database.
///
/// Foreign keys and WAL mode are set as connect options so every pooled
/// connection gets them, not just the first one.
pub async fn connect_database(db_path: &Path) -> Result<SqlitePool> {
    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();
    let pool = connect_database(db_path).await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    let mut conn = pool.acquire().await?;
    create_all_tables(&mut conn).await?;

    Ok(pool)
}

/// Create every platform table (idempotent)
pub async fn create_all_tables(conn: &mut SqliteConnection) -> Result<()> {
    create_accounts_table(conn).await?;
    create_profiles_table(conn).await?;
    create_patients_table(conn).await?;
    create_person_profiles_table(conn).await?;
    create_referrals_table(conn).await?;
    create_notes_table(conn).await?;
    create_messages_table(conn).await?;
    create_shop_links_table(conn).await?;
    create_recommendations_table(conn).await?;
    create_results_table(conn).await?;
    create_interviews_table(conn).await?;
    create_migration_runs_table(conn).await?;
    Ok(())
}

pub async fn create_accounts_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            guid TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            must_reset_password INTEGER NOT NULL DEFAULT 0,
            legacy_chat_ref TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn create_profiles_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            guid TEXT PRIMARY KEY,
            account_guid TEXT NOT NULL UNIQUE REFERENCES accounts(guid),
            first_name TEXT,
            last_name TEXT,
            referral_code TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn create_patients_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS patients (
            guid TEXT PRIMARY KEY,
            account_guid TEXT NOT NULL UNIQUE REFERENCES accounts(guid),
            diet_status TEXT NOT NULL DEFAULT 'none',
            contract_status TEXT NOT NULL DEFAULT 'none',
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn create_person_profiles_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS person_profiles (
            guid TEXT PRIMARY KEY,
            account_guid TEXT NOT NULL REFERENCES accounts(guid),
            display_name TEXT,
            is_primary INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn create_referrals_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS referrals (
            guid TEXT PRIMARY KEY,
            referrer_guid TEXT NOT NULL REFERENCES accounts(guid),
            referred_guid TEXT NOT NULL REFERENCES accounts(guid),
            referrer_name TEXT NOT NULL,
            referred_name TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            legacy_ref TEXT UNIQUE,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn create_notes_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS notes (
            guid TEXT PRIMARY KEY,
            patient_guid TEXT NOT NULL REFERENCES patients(guid),
            author_guid TEXT NOT NULL REFERENCES accounts(guid),
            body TEXT NOT NULL,
            noted_at TEXT NOT NULL,
            legacy_ref TEXT UNIQUE,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn create_messages_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS messages (
            guid TEXT PRIMARY KEY,
            patient_guid TEXT NOT NULL REFERENCES patients(guid),
            sender_guid TEXT NOT NULL REFERENCES accounts(guid),
            body TEXT NOT NULL,
            chat_ref TEXT,
            sent_at TEXT NOT NULL,
            legacy_ref TEXT UNIQUE,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn create_shop_links_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS shop_links (
            guid TEXT PRIMARY KEY,
            patient_guid TEXT NOT NULL REFERENCES patients(guid),
            url TEXT NOT NULL,
            label TEXT,
            legacy_ref TEXT UNIQUE,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Recommendations may exist without an owning patient (orphan policy)
pub async fn create_recommendations_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS recommendations (
            guid TEXT PRIMARY KEY,
            patient_guid TEXT REFERENCES patients(guid),
            title TEXT,
            body TEXT NOT NULL,
            tags TEXT,
            issued_at TEXT NOT NULL,
            legacy_ref TEXT UNIQUE,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn create_results_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS results (
            guid TEXT PRIMARY KEY,
            patient_guid TEXT NOT NULL REFERENCES patients(guid),
            kind TEXT NOT NULL,
            value TEXT,
            file_path TEXT,
            measured_at TEXT NOT NULL,
            legacy_ref TEXT UNIQUE,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Interviews may exist without an owning patient (orphan policy)
pub async fn create_interviews_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS interviews (
            guid TEXT PRIMARY KEY,
            patient_guid TEXT REFERENCES patients(guid),
            answers TEXT NOT NULL,
            submitted_at TEXT NOT NULL,
            legacy_ref TEXT UNIQUE,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn create_migration_runs_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS migration_runs (
            run_id TEXT PRIMARY KEY,
            state TEXT NOT NULL,
            statistics TEXT NOT NULL,
            error TEXT,
            started_at TEXT NOT NULL,
            ended_at TEXT
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;
    Ok(())
}
