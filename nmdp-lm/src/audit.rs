//! Run audit artifacts
//!
//! At the end of a successful run the orchestrator persists the natural
//! key to target id pairs that were newly registered, for operator review.
//! The engine never reads these back: the registry is always rebuilt from
//! the target store on the next run.

use crate::error::Result;
use crate::registry::NewEntry;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Serialize)]
struct AuditEntry<'a> {
    entity: &'static str,
    natural_key: &'a str,
    target_id: Uuid,
}

#[derive(Debug, Serialize)]
struct AuditSnapshot<'a> {
    run_id: Uuid,
    generated_at: DateTime<Utc>,
    entries: Vec<AuditEntry<'a>>,
}

/// Write the snapshot as `migration-audit-<run_id>.json` in `dir`
pub fn write_snapshot(dir: &Path, run_id: Uuid, entries: &[NewEntry]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let snapshot = AuditSnapshot {
        run_id,
        generated_at: Utc::now(),
        entries: entries
            .iter()
            .map(|entry| AuditEntry {
                entity: entry.kind.as_str(),
                natural_key: &entry.natural_key,
                target_id: entry.target_id,
            })
            .collect(),
    };

    let path = dir.join(format!("migration-audit-{run_id}.json"));
    let json = serde_json::to_string_pretty(&snapshot)
        .map_err(|e| nmdp_common::Error::Internal(format!("Failed to serialize snapshot: {e}")))?;
    std::fs::write(&path, json)?;

    info!(
        path = %path.display(),
        entries = entries.len(),
        "Audit snapshot written"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::EntityKind;

    #[test]
    fn snapshot_round_trips_as_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let run_id = Uuid::new_v4();
        let entries = vec![
            NewEntry {
                kind: EntityKind::Account,
                natural_key: "a@b.com".to_string(),
                target_id: Uuid::new_v4(),
            },
            NewEntry {
                kind: EntityKind::Note,
                natural_key: "csv:12".to_string(),
                target_id: Uuid::new_v4(),
            },
        ];

        let path = write_snapshot(dir.path(), run_id, &entries).expect("write snapshot");
        assert!(path.file_name().unwrap().to_string_lossy().contains(&run_id.to_string()));

        let raw = std::fs::read_to_string(&path).expect("read back");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("parse");
        assert_eq!(value["entries"].as_array().unwrap().len(), 2);
        assert_eq!(value["entries"][0]["entity"], "account");
        assert_eq!(value["entries"][1]["natural_key"], "csv:12");
    }

    #[test]
    fn empty_run_still_writes_a_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_snapshot(dir.path(), Uuid::new_v4(), &[]).expect("write snapshot");
        let raw = std::fs::read_to_string(&path).expect("read back");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("parse");
        assert!(value["entries"].as_array().unwrap().is_empty());
    }
}
