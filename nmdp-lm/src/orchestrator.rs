//! Migration orchestrator
//!
//! Drives one migration run: preload the identity registry from the
//! target store, execute the entity importers in the declared dependency
//! order, fold their outcomes into statistics, and persist the audit
//! snapshot. The entire run executes inside a single transaction; only a
//! run-level fault (connectivity, preload failure, commit failure) rolls
//! it back. Per-record faults are contained by the import driver and
//! surface only in the statistics.

use crate::audit;
use crate::db;
use crate::error::Result;
use crate::extract::{FlatExportExtractor, RemoteApiExtractor};
use crate::importers;
use crate::models::{EntityStep, MigrationRun, RunState};
use crate::registry::{EntityKind, IdentityRegistry};
use sqlx::{SqliteConnection, SqlitePool};
use std::path::PathBuf;
use tracing::{error, info, warn};

pub struct MigrationOrchestrator {
    pool: SqlitePool,
    flat: FlatExportExtractor,
    remote: Option<RemoteApiExtractor>,
    audit_dir: PathBuf,
}

impl MigrationOrchestrator {
    pub fn new(
        pool: SqlitePool,
        flat: FlatExportExtractor,
        remote: Option<RemoteApiExtractor>,
        audit_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            pool,
            flat,
            remote,
            audit_dir: audit_dir.into(),
        }
    }

    /// Execute one migration run.
    ///
    /// Always returns the run record; the caller reads its state for the
    /// process exit code and its statistics for the operator report.
    pub async fn run(&self) -> MigrationRun {
        let mut run = MigrationRun::new();
        info!(run_id = %run.run_id, "Starting legacy migration run");

        match self.run_inner(&mut run).await {
            Ok(()) => {
                run.transition_to(RunState::Completed);
            }
            Err(e) => {
                error!(run_id = %run.run_id, error = %e, "Migration run aborted");
                run.abort(e.to_string());
            }
        }

        // Persisted through the pool, outside the run transaction, so an
        // aborted run still leaves a trace.
        if let Err(e) = db::runs::save_run(&self.pool, &run).await {
            warn!(run_id = %run.run_id, error = %e, "Failed to persist run record");
        }

        for line in run.statistics.summary_lines() {
            info!(run_id = %run.run_id, "{line}");
        }
        info!(
            run_id = %run.run_id,
            state = ?run.state,
            created = run.statistics.total_created(),
            failed = run.statistics.total_failed(),
            "Migration run finished"
        );

        run
    }

    async fn run_inner(&self, run: &mut MigrationRun) -> Result<()> {
        let mut registry = IdentityRegistry::new();
        let mut tx = self.pool.begin().await?;

        preload_registry(&mut *tx, &mut registry).await?;
        info!(entries = registry.len(), "Identity registry preloaded");

        for step in EntityStep::ORDER {
            run.transition_to(RunState::Running(step));

            let mut records = self.flat.extract(step);
            if let Some(remote) = &self.remote {
                records.extend(remote.extract(step).await);
            }

            if records.is_empty() {
                warn!(entity = step.source_name(), "No source records");
            } else {
                info!(
                    entity = step.source_name(),
                    count = records.len(),
                    "Importing records"
                );
            }

            importers::run_step(
                step,
                &records,
                &mut *tx,
                &mut registry,
                run.statistics.counts_mut(step),
            )
            .await?;
        }

        tx.commit().await?;

        // The rows are durable at this point; a snapshot write failure is
        // an operator inconvenience, not a run failure.
        if let Err(e) = audit::write_snapshot(&self.audit_dir, run.run_id, registry.new_entries()) {
            warn!(error = %e, "Audit snapshot failed (run committed)");
        }

        Ok(())
    }
}

/// Seed the registry with every natural key the target store already
/// knows, so re-runs recognize previously migrated rows.
async fn preload_registry(
    conn: &mut SqliteConnection,
    registry: &mut IdentityRegistry,
) -> Result<()> {
    registry.preload(
        EntityKind::Account,
        db::accounts::email_pairs(conn).await?,
    );
    registry.preload(
        EntityKind::ChatSession,
        db::accounts::chat_ref_pairs(conn).await?,
    );
    registry.preload(EntityKind::Patient, db::patients::email_pairs(conn).await?);
    registry.preload(
        EntityKind::Patient,
        db::patients::account_pairs(conn).await?,
    );

    for (table, kind) in db::LEGACY_REF_TABLES {
        registry.preload(kind, db::legacy_ref_pairs(conn, table).await?);
    }

    Ok(())
}
