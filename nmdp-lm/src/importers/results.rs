//! Diagnostic result importer
//!
//! Results require an owning patient. Uploaded result files are carried
//! as path strings only; the object store is a separate collaborator.

use crate::db;
use crate::error::Result;
use crate::importers::ImportContext;
use crate::models::{Outcome, SkipReason, SourceRecord};
use crate::registry::EntityKind;
use chrono::Utc;
use uuid::Uuid;

const ID_FIELDS: &[&str] = &["id", "result_id"];
const PATIENT_FIELDS: &[&str] = &["patient_email", "patient", "email"];
const KIND_FIELDS: &[&str] = &["kind", "type", "category"];
const VALUE_FIELDS: &[&str] = &["value", "result"];
const FILE_FIELDS: &[&str] = &["file_path", "file", "attachment"];
const DATE_FIELDS: &[&str] = &["measured_at", "created_at", "date"];

const DEFAULT_KIND: &str = "general";

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

    if ctx.registry.lookup(EntityKind::LabResult, &key).is_some() {
        return Ok(Outcome::Skipped(SkipReason::AlreadyExists));
    }

    let measured_at = crate::normalize::normalize_date(
        record.first_str(DATE_FIELDS).as_deref(),
    )
    .unwrap_or_else(Utc::now);

    let guid = Uuid::new_v4();
    db::results::insert_result(
        ctx.conn,
        &db::results::NewLabResult {
            guid,
            patient_guid,
            kind: record
                .first_str(KIND_FIELDS)
                .unwrap_or_else(|| DEFAULT_KIND.to_string()),
            value: record.first_str(VALUE_FIELDS),
            file_path: record.first_str(FILE_FIELDS),
            measured_at,
            legacy_ref: key.clone(),
        },
    )
    .await?;
    ctx.registry.register(EntityKind::LabResult, &key, guid)?;

    Ok(Outcome::Created)
}
