//! Account importer
//!
//! Accounts are the identity anchor, keyed by normalized email. Profile,
//! Patient and PersonProfile rows are 1:1 satellites with no independent
//! source record, so they are created here in the same step. Credentials
//! are never migrated: every account gets the fixed placeholder hash and a
//! mandatory-reset flag, and the authentication service owns the rest.

use crate::db;
use crate::error::{MigrationError, Result};
use crate::importers::{placeholder_credential_hash, ImportContext};
use crate::models::{Outcome, SkipReason, SourceRecord};
use crate::normalize::normalize_identity_key;
use crate::registry::EntityKind;
use rand::distributions::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

const EMAIL_FIELDS: &[&str] = &["email", "mail", "user_email"];
const FIRST_NAME_FIELDS: &[&str] = &["first_name", "firstname", "name"];
const LAST_NAME_FIELDS: &[&str] = &["last_name", "lastname", "surname"];
const CHAT_FIELDS: &[&str] = &["chat_id", "session_id", "chat"];

const REFERRAL_CODE_LEN: usize = 8;
const REFERRAL_CODE_ATTEMPTS: usize = 16;

/// Default patient status pair at creation
const DEFAULT_STATUS: &str = "none";

pub async fn import_record(ctx: &mut ImportContext<'_>, record: &SourceRecord) -> Result<Outcome> {
    let Some(email_raw) = record.first_str(EMAIL_FIELDS) else {
        return Ok(Outcome::Skipped(SkipReason::MissingData));
    };
    let email = normalize_identity_key(&email_raw);

    if ctx.registry.lookup(EntityKind::Account, &email).is_some() {
        return Ok(Outcome::Skipped(SkipReason::AlreadyExists));
    }

    let account_guid = Uuid::new_v4();
    let patient_guid = Uuid::new_v4();

    // A chat id already claimed by another account is a natural-key
    // collision; fail this record before anything is written.
    let chat_ref = record.first_str(CHAT_FIELDS);
    if let Some(chat) = &chat_ref {
        if let Some(existing) = ctx.registry.lookup(EntityKind::ChatSession, chat) {
            return Err(MigrationError::IdentityCollision {
                kind: EntityKind::ChatSession.as_str(),
                key: normalize_identity_key(chat),
                existing,
                candidate: account_guid,
            });
        }
    }

    let first_name = record.first_str(FIRST_NAME_FIELDS);
    let last_name = record.first_str(LAST_NAME_FIELDS);

    db::accounts::insert_account(
        ctx.conn,
        &db::accounts::NewAccount {
            guid: account_guid,
            email: email.clone(),
            password_hash: placeholder_credential_hash(),
            must_reset_password: true,
            legacy_chat_ref: chat_ref.clone(),
        },
    )
    .await?;

    let referral_code = unique_referral_code(ctx).await?;
    db::accounts::insert_profile(
        ctx.conn,
        Uuid::new_v4(),
        account_guid,
        first_name.as_deref(),
        last_name.as_deref(),
        &referral_code,
    )
    .await?;

    db::patients::insert_patient(ctx.conn, patient_guid, account_guid, DEFAULT_STATUS, DEFAULT_STATUS)
        .await?;

    // First person profile per account is the primary one
    let display_name = display_name(first_name.as_deref(), last_name.as_deref());
    db::accounts::insert_person_profile(
        ctx.conn,
        Uuid::new_v4(),
        account_guid,
        display_name.as_deref(),
        true,
    )
    .await?;

    ctx.registry.register(EntityKind::Account, &email, account_guid)?;
    ctx.registry.register(EntityKind::Patient, &email, patient_guid)?;
    ctx.registry
        .register(EntityKind::Patient, &account_guid.to_string(), patient_guid)?;
    if let Some(chat) = &chat_ref {
        ctx.registry
            .register(EntityKind::ChatSession, chat, account_guid)?;
    }

    Ok(Outcome::Created)
}

fn display_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    let joined = [first, last]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    if joined.trim().is_empty() {
        None
    } else {
        Some(joined)
    }
}

fn random_referral_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REFERRAL_CODE_LEN)
        .map(char::from)
        .collect()
}

/// Generate a referral code not yet present in the store.
///
/// Collisions are vanishingly rare at this length; running out of
/// attempts means something is deeply wrong with the store.
async fn unique_referral_code(ctx: &mut ImportContext<'_>) -> Result<String> {
    for _ in 0..REFERRAL_CODE_ATTEMPTS {
        let code = random_referral_code();
        if !db::accounts::referral_code_exists(ctx.conn, &code).await? {
            return Ok(code);
        }
    }
    Err(nmdp_common::Error::Internal(
        "Unable to generate a unique referral code".to_string(),
    )
    .into())
}
