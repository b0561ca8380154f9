//! Entity importers
//!
//! One module per target entity, all following the same per-record
//! contract: extract and normalize natural keys, resolve required
//! references through the registry, skip what already exists, otherwise
//! write the row and register the new identity. The driver in this module
//! owns the loop, the per-record savepoint, the fault boundary and the
//! statistics fold, so the entity modules only encode their own rules.

pub mod accounts;
pub mod interviews;
pub mod messages;
pub mod notes;
pub mod recommendations;
pub mod referrals;
pub mod results;
pub mod shop_links;

use crate::db;
use crate::error::Result;
use crate::models::{EntityCounts, EntityStep, Outcome, SkipReason, SourceRecord};
use crate::registry::{EntityKind, IdentityRegistry};
use sha2::{Digest, Sha256};
use sqlx::{Connection, SqliteConnection};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Email under which the synthesized system account is registered.
/// The reserved `.invalid` TLD keeps it out of any real mailbox.
pub const SYSTEM_ACCOUNT_EMAIL: &str = "system@nmdp.invalid";

/// Fixed placeholder credential written for every migrated account.
/// Never a usable password: the reset flag forces a new one on first login.
pub const PLACEHOLDER_CREDENTIAL: &str = "nmdp-legacy-import-reset-required";

/// Shared state handed to every importer call. Owned by the orchestrator,
/// mutated only by the currently running importer.
pub struct ImportContext<'a> {
    pub conn: &'a mut SqliteConnection,
    pub registry: &'a mut IdentityRegistry,
}

/// Run one entity step over its source records.
///
/// Each record executes inside its own savepoint; a fault rolls back both
/// the savepoint and any registry entries the record added, so a failed
/// record leaves no trace. Errors returned from this function itself
/// (savepoint machinery, broken connection) are run-level.
pub async fn run_step(
    step: EntityStep,
    records: &[SourceRecord],
    conn: &mut SqliteConnection,
    registry: &mut IdentityRegistry,
    counts: &mut EntityCounts,
) -> Result<()> {
    for (idx, record) in records.iter().enumerate() {
        let checkpoint = registry.checkpoint();
        let mut savepoint = Connection::begin(&mut *conn).await?;

        let result = {
            let mut ctx = ImportContext {
                conn: &mut *savepoint,
                registry: &mut *registry,
            };
            import_one(step, &mut ctx, record).await
        };

        let outcome = match result {
            Ok(Outcome::Created) => {
                savepoint.commit().await?;
                Outcome::Created
            }
            Ok(outcome) => {
                savepoint.rollback().await?;
                registry.revert_to(checkpoint);
                outcome
            }
            Err(e) if e.is_unique_violation() => {
                // The store already holds this natural key: idempotency path
                savepoint.rollback().await?;
                registry.revert_to(checkpoint);
                Outcome::Skipped(SkipReason::AlreadyExists)
            }
            Err(e) => {
                savepoint.rollback().await?;
                registry.revert_to(checkpoint);
                warn!(
                    entity = step.source_name(),
                    record = idx,
                    error = %e,
                    "Record import failed"
                );
                Outcome::Failed(e.to_string())
            }
        };

        debug!(entity = step.source_name(), record = idx, outcome = %outcome, "Record processed");
        counts.record(&outcome);
    }

    Ok(())
}

/// Dispatch one record to its entity importer, in the declared step order
async fn import_one(
    step: EntityStep,
    ctx: &mut ImportContext<'_>,
    record: &SourceRecord,
) -> Result<Outcome> {
    match step {
        EntityStep::Accounts => accounts::import_record(ctx, record).await,
        EntityStep::Referrals => referrals::import_record(ctx, record).await,
        EntityStep::Notes => notes::import_record(ctx, record).await,
        EntityStep::Messages => messages::import_record(ctx, record).await,
        EntityStep::ShopLinks => shop_links::import_record(ctx, record).await,
        EntityStep::Recommendations => recommendations::import_record(ctx, record).await,
        EntityStep::Results => results::import_record(ctx, record).await,
        EntityStep::Interviews => interviews::import_record(ctx, record).await,
    }
}

/// Hash of the fixed placeholder credential
pub fn placeholder_credential_hash() -> String {
    format!("{:x}", Sha256::digest(PLACEHOLDER_CREDENTIAL.as_bytes()))
}

/// Resolve the synthesized system account, creating it on first use.
///
/// Created at most once per target store: the account row carries the
/// reserved system email, so registry preload finds it again on re-runs.
pub async fn ensure_system_account(ctx: &mut ImportContext<'_>) -> Result<Uuid> {
    if let Some(guid) = ctx.registry.lookup(EntityKind::Account, SYSTEM_ACCOUNT_EMAIL) {
        return Ok(guid);
    }

    let guid = Uuid::new_v4();
    db::accounts::insert_account(
        ctx.conn,
        &db::accounts::NewAccount {
            guid,
            email: SYSTEM_ACCOUNT_EMAIL.to_string(),
            password_hash: placeholder_credential_hash(),
            must_reset_password: true,
            legacy_chat_ref: None,
        },
    )
    .await?;
    ctx.registry
        .register(EntityKind::Account, SYSTEM_ACCOUNT_EMAIL, guid)?;

    info!(account = %guid, "Synthesized system account for unattributed records");
    Ok(guid)
}
