//! Migration run persistence
//!
//! Run rows are written through the pool after the run transaction
//! resolves, so an aborted (rolled-back) run still leaves a trace.

use crate::error::Result;
use crate::models::{MigrationRun, MigrationStatistics, RunState};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

pub async fn save_run(pool: &SqlitePool, run: &MigrationRun) -> Result<()> {
    let state = serde_json::to_string(&run.state)
        .map_err(|e| nmdp_common::Error::Internal(format!("Failed to serialize state: {e}")))?;
    let statistics = serde_json::to_string(&run.statistics).map_err(|e| {
        nmdp_common::Error::Internal(format!("Failed to serialize statistics: {e}"))
    })?;

    sqlx::query(
        r#"
        INSERT INTO migration_runs (run_id, state, statistics, error, started_at, ended_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(run_id) DO UPDATE SET
            state = excluded.state,
            statistics = excluded.statistics,
            error = excluded.error,
            ended_at = excluded.ended_at
        "#,
    )
    .bind(run.run_id.to_string())
    .bind(&state)
    .bind(&statistics)
    .bind(&run.error)
    .bind(run.started_at.to_rfc3339())
    .bind(run.ended_at.map(|dt| dt.to_rfc3339()))
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_run(pool: &SqlitePool, run_id: Uuid) -> Result<Option<MigrationRun>> {
    let row = sqlx::query(
        r#"
        SELECT run_id, state, statistics, error, started_at, ended_at
        FROM migration_runs
        WHERE run_id = ?
        "#,
    )
    .bind(run_id.to_string())
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let state: String = row.get("state");
    let state: RunState = serde_json::from_str(&state)
        .map_err(|e| nmdp_common::Error::Internal(format!("Failed to deserialize state: {e}")))?;

    let statistics: String = row.get("statistics");
    let statistics: MigrationStatistics = serde_json::from_str(&statistics).map_err(|e| {
        nmdp_common::Error::Internal(format!("Failed to deserialize statistics: {e}"))
    })?;

    let started_at: String = row.get("started_at");
    let started_at = chrono::DateTime::parse_from_rfc3339(&started_at)
        .map_err(|e| nmdp_common::Error::Internal(format!("Failed to parse started_at: {e}")))?
        .with_timezone(&chrono::Utc);

    let ended_at: Option<String> = row.get("ended_at");
    let ended_at = ended_at
        .map(|s| chrono::DateTime::parse_from_rfc3339(&s))
        .transpose()
        .map_err(|e| nmdp_common::Error::Internal(format!("Failed to parse ended_at: {e}")))?
        .map(|dt| dt.with_timezone(&chrono::Utc));

    Ok(Some(MigrationRun {
        run_id,
        state,
        statistics,
        error: row.get("error"),
        started_at,
        ended_at,
    }))
}
