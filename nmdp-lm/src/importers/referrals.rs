//! Referral importer
//!
//! A referral joins two already-registered accounts. Either side missing
//! means the record is skipped outright, never deferred: the accounts step
//! has already run, so an unresolved side will not appear later in the run.

use crate::db;
use crate::error::Result;
use crate::importers::ImportContext;
use crate::models::{Outcome, SkipReason, SourceRecord};
use crate::normalize::normalize_identity_key;
use crate::registry::EntityKind;
use uuid::Uuid;

const ID_FIELDS: &[&str] = &["id", "referral_id"];
const REFERRER_FIELDS: &[&str] = &["referrer_email", "referrer", "from_email"];
const REFERRED_FIELDS: &[&str] = &["referred_email", "referred", "to_email", "friend_email"];
const STATUS_FIELDS: &[&str] = &["status", "state"];
const REWARDED_FIELDS: &[&str] = &["rewarded", "used"];

/// Placeholder display names used until the profiles carry real ones
const FALLBACK_REFERRER_NAME: &str = "Anonymous member";
const FALLBACK_REFERRED_NAME: &str = "New member";

pub async fn import_record(ctx: &mut ImportContext<'_>, record: &SourceRecord) -> Result<Outcome> {
    let Some(referrer_email) = record.first_str(REFERRER_FIELDS) else {
        return Ok(Outcome::Skipped(SkipReason::MissingData));
    };
    let Some(referred_email) = record.first_str(REFERRED_FIELDS) else {
        return Ok(Outcome::Skipped(SkipReason::MissingData));
    };

    let Some(referrer_guid) = ctx.registry.lookup(EntityKind::Account, &referrer_email) else {
        return Ok(Outcome::Skipped(SkipReason::MissingReference));
    };
    let Some(referred_guid) = ctx.registry.lookup(EntityKind::Account, &referred_email) else {
        return Ok(Outcome::Skipped(SkipReason::MissingReference));
    };

    // Legacy referral exports sometimes lack a row id; the account pair
    // identifies the referral just as well.
    let key = record.qualified_id(ID_FIELDS).unwrap_or_else(|| {
        format!(
            "{}:{}|{}",
            record.origin().key_prefix(),
            normalize_identity_key(&referrer_email),
            normalize_identity_key(&referred_email)
        )
    });
    if ctx.registry.lookup(EntityKind::Referral, &key).is_some() {
        return Ok(Outcome::Skipped(SkipReason::AlreadyExists));
    }

    let referrer_name = display_name_or(ctx, referrer_guid, FALLBACK_REFERRER_NAME).await?;
    let referred_name = display_name_or(ctx, referred_guid, FALLBACK_REFERRED_NAME).await?;

    // Older exports carried only a localized yes/no "rewarded" flag
    let rewarded =
        crate::normalize::normalize_boolean(record.first_str(REWARDED_FIELDS).as_deref());
    let status = record
        .first_str(STATUS_FIELDS)
        .unwrap_or_else(|| if rewarded { "rewarded" } else { "pending" }.to_string());

    let guid = Uuid::new_v4();
    db::referrals::insert_referral(
        ctx.conn,
        &db::referrals::NewReferral {
            guid,
            referrer_guid,
            referred_guid,
            referrer_name,
            referred_name,
            status,
            legacy_ref: key.clone(),
        },
    )
    .await?;
    ctx.registry.register(EntityKind::Referral, &key, guid)?;

    Ok(Outcome::Created)
}

/// Profile display name for an account, or the fixed placeholder
async fn display_name_or(
    ctx: &mut ImportContext<'_>,
    account_guid: Uuid,
    fallback: &str,
) -> Result<String> {
    let names = db::accounts::profile_names(ctx.conn, account_guid).await?;
    let joined = match names {
        Some((first, last)) => [first, last]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" "),
        None => String::new(),
    };

    if joined.trim().is_empty() {
        Ok(fallback.to_string())
    } else {
        Ok(joined)
    }
}
