//! Shop link importer
//!
//! Shop links always belong to a patient; a link without a resolvable
//! owner or without a URL is useless and skipped.

use crate::db;
use crate::error::Result;
use crate::importers::ImportContext;
use crate::models::{Outcome, SkipReason, SourceRecord};
use crate::registry::EntityKind;
use uuid::Uuid;

const ID_FIELDS: &[&str] = &["id", "link_id"];
const PATIENT_FIELDS: &[&str] = &["patient_email", "patient", "email"];
const URL_FIELDS: &[&str] = &["url", "link", "href"];
const LABEL_FIELDS: &[&str] = &["label", "title", "name"];

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

    if ctx.registry.lookup(EntityKind::ShopLink, &key).is_some() {
        return Ok(Outcome::Skipped(SkipReason::AlreadyExists));
    }

    let Some(url) = record.first_str(URL_FIELDS) else {
        return Ok(Outcome::Skipped(SkipReason::MissingData));
    };

    let guid = Uuid::new_v4();
    db::shop_links::insert_shop_link(
        ctx.conn,
        &db::shop_links::NewShopLink {
            guid,
            patient_guid,
            url,
            label: record.first_str(LABEL_FIELDS),
            legacy_ref: key.clone(),
        },
    )
    .await?;
    ctx.registry.register(EntityKind::ShopLink, &key, guid)?;

    Ok(Outcome::Created)
}
