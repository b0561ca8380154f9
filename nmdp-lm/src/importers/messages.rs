//! Message importer
//!
//! Legacy chat messages identify their patient and sender loosely: by
//! email when the export carried one, otherwise only by the opaque chat
//! id the chat platform used. Resolution tries email first, then the chat
//! session, then gives up on the sender by falling back to the system
//! account. A message whose patient cannot be resolved either way is
//! skipped.

use crate::db;
use crate::error::Result;
use crate::importers::{ensure_system_account, ImportContext};
use crate::models::{Outcome, SkipReason, SourceRecord};
use crate::registry::EntityKind;
use chrono::Utc;
use uuid::Uuid;

const ID_FIELDS: &[&str] = &["id", "message_id"];
const CHAT_FIELDS: &[&str] = &["chat_id", "chat", "conversation_id", "session_id"];
const PATIENT_FIELDS: &[&str] = &["patient_email", "patient"];
const SENDER_FIELDS: &[&str] = &["sender_email", "sender", "from"];
const BODY_FIELDS: &[&str] = &["body", "content", "text", "message"];
const DATE_FIELDS: &[&str] = &["sent_at", "created_at", "date"];

pub async fn import_record(ctx: &mut ImportContext<'_>, record: &SourceRecord) -> Result<Outcome> {
    let Some(key) = record.qualified_id(ID_FIELDS) else {
        return Ok(Outcome::Skipped(SkipReason::MissingData));
    };

    let chat_ref = record.first_str(CHAT_FIELDS);

    // Patient: direct email, else through the chat session's account
    let patient_guid = match record
        .first_str(PATIENT_FIELDS)
        .and_then(|email| ctx.registry.lookup(EntityKind::Patient, &email))
    {
        Some(guid) => Some(guid),
        None => chat_ref
            .as_deref()
            .and_then(|chat| ctx.registry.lookup(EntityKind::ChatSession, chat))
            .and_then(|account| {
                ctx.registry
                    .lookup(EntityKind::Patient, &account.to_string())
            }),
    };
    let Some(patient_guid) = patient_guid else {
        return Ok(Outcome::Skipped(SkipReason::MissingReference));
    };

    if ctx.registry.lookup(EntityKind::Message, &key).is_some() {
        return Ok(Outcome::Skipped(SkipReason::AlreadyExists));
    }

    let Some(body) = record.first_str(BODY_FIELDS) else {
        return Ok(Outcome::Skipped(SkipReason::EmptyBody));
    };

    // Sender: email, then the chat session (the patient speaking in
    // their own chat), then the system account
    let sender_guid = record
        .first_str(SENDER_FIELDS)
        .and_then(|email| ctx.registry.lookup(EntityKind::Account, &email));
    let sender_guid = match sender_guid {
        Some(guid) => guid,
        None => match chat_ref
            .as_deref()
            .and_then(|chat| ctx.registry.lookup(EntityKind::ChatSession, chat))
        {
            Some(guid) => guid,
            None => ensure_system_account(ctx).await?,
        },
    };

    let sent_at = crate::normalize::normalize_date(
        record.first_str(DATE_FIELDS).as_deref(),
    )
    .unwrap_or_else(Utc::now);

    let guid = Uuid::new_v4();
    db::messages::insert_message(
        ctx.conn,
        &db::messages::NewMessage {
            guid,
            patient_guid,
            sender_guid,
            body,
            chat_ref,
            sent_at,
            legacy_ref: key.clone(),
        },
    )
    .await?;
    ctx.registry.register(EntityKind::Message, &key, guid)?;

    Ok(Outcome::Created)
}
