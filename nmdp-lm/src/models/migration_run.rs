//! Migration run state machine
//!
//! A run progresses `NotStarted → Running(step) → Completed | Aborted`.
//! The entity order is a declared constant: every entity is processed only
//! after all entities it can reference. Profile, Patient and PersonProfile
//! rows are satellites written during the Accounts step.

use crate::models::MigrationStatistics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One entity importer step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStep {
    Accounts,
    Referrals,
    Notes,
    Messages,
    ShopLinks,
    Recommendations,
    Results,
    Interviews,
}

impl EntityStep {
    /// Fixed dependency order for a run
    pub const ORDER: [EntityStep; 8] = [
        EntityStep::Accounts,
        EntityStep::Referrals,
        EntityStep::Notes,
        EntityStep::Messages,
        EntityStep::ShopLinks,
        EntityStep::Recommendations,
        EntityStep::Results,
        EntityStep::Interviews,
    ];

    /// Source name: the flat-export file stem and the log label
    pub fn source_name(&self) -> &'static str {
        match self {
            EntityStep::Accounts => "accounts",
            EntityStep::Referrals => "referrals",
            EntityStep::Notes => "notes",
            EntityStep::Messages => "messages",
            EntityStep::ShopLinks => "shop_links",
            EntityStep::Recommendations => "recommendations",
            EntityStep::Results => "results",
            EntityStep::Interviews => "interviews",
        }
    }
}

/// Run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "step", rename_all = "UPPERCASE")]
pub enum RunState {
    NotStarted,
    Running(EntityStep),
    Completed,
    Aborted,
}

/// One migration run (in-memory state, persisted at the end)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationRun {
    /// Unique run identifier
    pub run_id: Uuid,

    /// Current state
    pub state: RunState,

    /// Accumulated per-entity counts
    pub statistics: MigrationStatistics,

    /// Top-level error, set only when the run aborts
    pub error: Option<String>,

    /// Run start time
    pub started_at: DateTime<Utc>,

    /// Run end time (terminal states only)
    pub ended_at: Option<DateTime<Utc>>,
}

impl MigrationRun {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            state: RunState::NotStarted,
            statistics: MigrationStatistics::default(),
            error: None,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Transition to a new state, stamping the end time on terminal states
    pub fn transition_to(&mut self, new_state: RunState) {
        self.state = new_state;
        if self.is_terminal() {
            self.ended_at = Some(Utc::now());
        }
    }

    /// Abort the run with a top-level error
    pub fn abort(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.transition_to(RunState::Aborted);
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, RunState::Completed | RunState::Aborted)
    }
}

impl Default for MigrationRun {
    fn default() -> Self {
        Self::new()
    }
}
