//! Note importer
//!
//! Notes belong to a patient and carry an author. An unresolvable author
//! is not a reason to drop a note: the record falls back to the
//! synthesized system account, created lazily on first use.

use crate::db;
use crate::error::Result;
use crate::importers::{ensure_system_account, ImportContext};
use crate::models::{Outcome, SkipReason, SourceRecord};
use crate::registry::EntityKind;
use chrono::Utc;
use uuid::Uuid;

const ID_FIELDS: &[&str] = &["id", "note_id"];
const PATIENT_FIELDS: &[&str] = &["patient_email", "patient", "email"];
const AUTHOR_FIELDS: &[&str] = &["author_email", "author", "created_by"];
const BODY_FIELDS: &[&str] = &["body", "content", "text"];
const DATE_FIELDS: &[&str] = &["noted_at", "created_at", "date"];

pub async fn import_record(ctx: &mut ImportContext<'_>, record: &SourceRecord) -> Result<Outcome> {
    let Some(key) = record.qualified_id(ID_FIELDS) else {
        return Ok(Outcome::Skipped(SkipReason::MissingData));
    };

    let Some(patient_email) = record.first_str(PATIENT_FIELDS) else {
        return Ok(Outcome::Skipped(SkipReason::MissingData));
    };
    let Some(patient_guid) = ctx.registry.lookup(EntityKind::Patient, &patient_email) else {
        return Ok(Outcome::Skipped(SkipReason::MissingReference));
    };

    if ctx.registry.lookup(EntityKind::Note, &key).is_some() {
        return Ok(Outcome::Skipped(SkipReason::AlreadyExists));
    }

    let Some(body) = record.first_str(BODY_FIELDS) else {
        return Ok(Outcome::Skipped(SkipReason::EmptyBody));
    };

    let author_guid = match record
        .first_str(AUTHOR_FIELDS)
        .and_then(|email| ctx.registry.lookup(EntityKind::Account, &email))
    {
        Some(guid) => guid,
        None => ensure_system_account(ctx).await?,
    };

    let noted_at = crate::normalize::normalize_date(
        record.first_str(DATE_FIELDS).as_deref(),
    )
    .unwrap_or_else(Utc::now);

    let guid = Uuid::new_v4();
    db::notes::insert_note(
        ctx.conn,
        &db::notes::NewNote {
            guid,
            patient_guid,
            author_guid,
            body,
            noted_at,
            legacy_ref: key.clone(),
        },
    )
    .await?;
    ctx.registry.register(EntityKind::Note, &key, guid)?;

    Ok(Outcome::Created)
}
