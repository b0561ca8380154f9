//! Interview importer
//!
//! Interviews follow the recommendation orphan policy: an unresolvable
//! owner leaves the row with a NULL patient reference. Answer payloads
//! are stored as JSON text whichever shape the source delivered them in.

use crate::db;
use crate::error::Result;
use crate::importers::ImportContext;
use crate::models::{Outcome, SkipReason, SourceRecord};
use crate::registry::EntityKind;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

const ID_FIELDS: &[&str] = &["id", "interview_id"];
const PATIENT_FIELDS: &[&str] = &["patient_email", "patient", "email"];
const ANSWER_FIELDS: &[&str] = &["answers", "responses", "payload"];
const DATE_FIELDS: &[&str] = &["submitted_at", "created_at", "date"];

pub async fn import_record(ctx: &mut ImportContext<'_>, record: &SourceRecord) -> Result<Outcome> {
    let Some(key) = record.qualified_id(ID_FIELDS) else {
        return Ok(Outcome::Skipped(SkipReason::MissingData));
    };

    if ctx.registry.lookup(EntityKind::Interview, &key).is_some() {
        return Ok(Outcome::Skipped(SkipReason::AlreadyExists));
    }

    let Some(answers) = answers_json(record) else {
        return Ok(Outcome::Skipped(SkipReason::MissingData));
    };

    // Owner is optional by policy
    let patient_guid = record
        .first_str(PATIENT_FIELDS)
        .and_then(|email| ctx.registry.lookup(EntityKind::Patient, &email));

    let submitted_at = crate::normalize::normalize_date(
        record.first_str(DATE_FIELDS).as_deref(),
    )
    .unwrap_or_else(Utc::now);

    let guid = Uuid::new_v4();
    db::interviews::insert_interview(
        ctx.conn,
        &db::interviews::NewInterview {
            guid,
            patient_guid,
            answers,
            submitted_at,
            legacy_ref: key.clone(),
        },
    )
    .await?;
    ctx.registry.register(EntityKind::Interview, &key, guid)?;

    Ok(Outcome::Created)
}

/// Answer payload as JSON text.
///
/// The API delivers structured JSON, the CSV export a plain string; both
/// are preserved verbatim.
fn answers_json(record: &SourceRecord) -> Option<String> {
    for field in ANSWER_FIELDS {
        match record.get(field) {
            Some(Value::Object(_)) | Some(Value::Array(_)) => {
                return record.get(field).map(|v| v.to_string());
            }
            Some(Value::String(s)) if !s.trim().is_empty() => {
                return Some(s.trim().to_string());
            }
            _ => {}
        }
    }
    None
}
