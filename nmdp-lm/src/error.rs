//! Error types for nmdp-lm
//!
//! Record-level faults are caught at the record boundary by the import
//! driver; only faults raised outside a record savepoint abort the run.

use thiserror::Error;

/// Migration engine error type
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A natural key is already registered with a different target id
    #[error("Identity collision for {kind}:{key}: {existing} vs {candidate}")]
    IdentityCollision {
        kind: &'static str,
        key: String,
        existing: uuid::Uuid,
        candidate: uuid::Uuid,
    },

    /// Legacy source could not be read
    #[error("Source error: {0}")]
    Source(String),

    /// Database operation error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored value failed to parse back (corrupt target row)
    #[error("Stored UUID parse error: {0}")]
    Uuid(#[from] uuid::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// nmdp-common error
    #[error("Common error: {0}")]
    Common(#[from] nmdp_common::Error),
}

impl MigrationError {
    /// True when the underlying fault is a store-side unique constraint
    /// violation, which the engine tolerates as "already exists".
    pub fn is_unique_violation(&self) -> bool {
        match self {
            MigrationError::Database(e) => e
                .as_database_error()
                .map(|d| d.is_unique_violation())
                .unwrap_or(false),
            _ => false,
        }
    }
}

/// Result type for migration operations
pub type Result<T> = std::result::Result<T, MigrationError>;
