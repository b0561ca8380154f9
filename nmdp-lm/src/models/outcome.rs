//! Per-record import outcomes
//!
//! Every importer call returns an explicit outcome value; the orchestrator
//! folds these into statistics instead of relying on logging side effects.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a record was skipped rather than created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// Identity key already registered (the idempotency path)
    AlreadyExists,
    /// A required foreign natural key did not resolve
    MissingReference,
    /// Required source data absent (own id, owner email, url, ...)
    MissingData,
    /// Message or note with nothing to say
    EmptyBody,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::AlreadyExists => "already-exists",
            SkipReason::MissingReference => "missing-reference",
            SkipReason::MissingData => "missing-data",
            SkipReason::EmptyBody => "empty-body",
        }
    }
}

/// Result of importing one source record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Target row written and identity registered
    Created,
    /// Nothing written, for an expected reason
    Skipped(SkipReason),
    /// Unexpected fault, captured at the record boundary
    Failed(String),
}

impl Outcome {
    pub fn is_created(&self) -> bool {
        matches!(self, Outcome::Created)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Created => write!(f, "created"),
            Outcome::Skipped(reason) => write!(f, "skipped ({})", reason.as_str()),
            Outcome::Failed(msg) => write!(f, "failed ({msg})"),
        }
    }
}
