//! Recommendation importer
//!
//! The legacy export for recommendations did not reliably carry an owner
//! reference, so an unresolvable owner leaves the row orphaned rather
//! than skipped. That is policy, not a defect.

use crate::db;
use crate::error::Result;
use crate::importers::ImportContext;
use crate::models::{Outcome, SkipReason, SourceRecord};
use crate::registry::EntityKind;
use chrono::Utc;
use uuid::Uuid;

const ID_FIELDS: &[&str] = &["id", "recommendation_id"];
const PATIENT_FIELDS: &[&str] = &["patient_email", "patient", "email"];
const TITLE_FIELDS: &[&str] = &["title", "name"];
const BODY_FIELDS: &[&str] = &["body", "content", "text"];
const TAG_FIELDS: &[&str] = &["tags", "categories"];
const DATE_FIELDS: &[&str] = &["issued_at", "created_at", "date"];

pub async fn import_record(ctx: &mut ImportContext<'_>, record: &SourceRecord) -> Result<Outcome> {
    let Some(key) = record.qualified_id(ID_FIELDS) else {
        return Ok(Outcome::Skipped(SkipReason::MissingData));
    };

    if ctx
        .registry
        .lookup(EntityKind::Recommendation, &key)
        .is_some()
    {
        return Ok(Outcome::Skipped(SkipReason::AlreadyExists));
    }

    let Some(body) = record.first_str(BODY_FIELDS) else {
        return Ok(Outcome::Skipped(SkipReason::MissingData));
    };

    // Owner is optional by policy
    let patient_guid = record
        .first_str(PATIENT_FIELDS)
        .and_then(|email| ctx.registry.lookup(EntityKind::Patient, &email));

    // Legacy exports pack tags into one comma-delimited field
    let tags = record
        .first_str(TAG_FIELDS)
        .map(|raw| crate::normalize::normalize_multi_value(&raw, ','))
        .filter(|tags| !tags.is_empty())
        .map(|tags| serde_json::json!(tags).to_string());

    let issued_at = crate::normalize::normalize_date(
        record.first_str(DATE_FIELDS).as_deref(),
    )
    .unwrap_or_else(Utc::now);

    let guid = Uuid::new_v4();
    db::recommendations::insert_recommendation(
        ctx.conn,
        &db::recommendations::NewRecommendation {
            guid,
            patient_guid,
            title: record.first_str(TITLE_FIELDS),
            body,
            tags,
            issued_at,
            legacy_ref: key.clone(),
        },
    )
    .await?;
    ctx.registry
        .register(EntityKind::Recommendation, &key, guid)?;

    Ok(Outcome::Created)
}
