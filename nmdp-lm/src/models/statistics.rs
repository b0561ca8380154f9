//! Migration run statistics
//!
//! Per-entity Created/Skipped/Failed counts, aggregated across the run for
//! the final operator report. The run is strictly sequential, so plain
//! counters are enough.

use crate::models::{EntityStep, Outcome, SkipReason};
use serde::{Deserialize, Serialize};

/// Outcome counts for one entity step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCounts {
    /// Target rows written
    pub created: usize,
    /// Skipped because the identity key was already registered
    pub skipped_existing: usize,
    /// Skipped because a required reference did not resolve
    pub skipped_missing_reference: usize,
    /// Skipped for other expected reasons (missing data, empty body)
    pub skipped_invalid: usize,
    /// Unexpected per-record faults
    pub failed: usize,
}

impl EntityCounts {
    /// Fold one record outcome into the counters
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Created => self.created += 1,
            Outcome::Skipped(SkipReason::AlreadyExists) => self.skipped_existing += 1,
            Outcome::Skipped(SkipReason::MissingReference) => {
                self.skipped_missing_reference += 1
            }
            Outcome::Skipped(_) => self.skipped_invalid += 1,
            Outcome::Failed(_) => self.failed += 1,
        }
    }

    /// All skipped records regardless of reason
    pub fn skipped(&self) -> usize {
        self.skipped_existing + self.skipped_missing_reference + self.skipped_invalid
    }

    pub fn total(&self) -> usize {
        self.created + self.skipped() + self.failed
    }

    pub fn display_string(&self) -> String {
        format!(
            "{} created, {} skipped ({} existing, {} missing reference), {} failed",
            self.created,
            self.skipped(),
            self.skipped_existing,
            self.skipped_missing_reference,
            self.failed
        )
    }
}

/// Aggregate statistics for a whole migration run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationStatistics {
    pub accounts: EntityCounts,
    pub referrals: EntityCounts,
    pub notes: EntityCounts,
    pub messages: EntityCounts,
    pub shop_links: EntityCounts,
    pub recommendations: EntityCounts,
    pub results: EntityCounts,
    pub interviews: EntityCounts,
}

impl MigrationStatistics {
    pub fn counts(&self, step: EntityStep) -> &EntityCounts {
        match step {
            EntityStep::Accounts => &self.accounts,
            EntityStep::Referrals => &self.referrals,
            EntityStep::Notes => &self.notes,
            EntityStep::Messages => &self.messages,
            EntityStep::ShopLinks => &self.shop_links,
            EntityStep::Recommendations => &self.recommendations,
            EntityStep::Results => &self.results,
            EntityStep::Interviews => &self.interviews,
        }
    }

    pub fn counts_mut(&mut self, step: EntityStep) -> &mut EntityCounts {
        match step {
            EntityStep::Accounts => &mut self.accounts,
            EntityStep::Referrals => &mut self.referrals,
            EntityStep::Notes => &mut self.notes,
            EntityStep::Messages => &mut self.messages,
            EntityStep::ShopLinks => &mut self.shop_links,
            EntityStep::Recommendations => &mut self.recommendations,
            EntityStep::Results => &mut self.results,
            EntityStep::Interviews => &mut self.interviews,
        }
    }

    pub fn total_created(&self) -> usize {
        EntityStep::ORDER
            .iter()
            .map(|s| self.counts(*s).created)
            .sum()
    }

    pub fn total_failed(&self) -> usize {
        EntityStep::ORDER
            .iter()
            .map(|s| self.counts(*s).failed)
            .sum()
    }

    /// One report line per entity, in processing order
    pub fn summary_lines(&self) -> Vec<String> {
        EntityStep::ORDER
            .iter()
            .map(|step| format!("{}: {}", step.source_name(), self.counts(*step).display_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_folds_each_outcome_kind() {
        let mut counts = EntityCounts::default();
        counts.record(&Outcome::Created);
        counts.record(&Outcome::Skipped(SkipReason::AlreadyExists));
        counts.record(&Outcome::Skipped(SkipReason::MissingReference));
        counts.record(&Outcome::Skipped(SkipReason::EmptyBody));
        counts.record(&Outcome::Failed("boom".to_string()));

        assert_eq!(counts.created, 1);
        assert_eq!(counts.skipped_existing, 1);
        assert_eq!(counts.skipped_missing_reference, 1);
        assert_eq!(counts.skipped_invalid, 1);
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.total(), 5);
    }

    #[test]
    fn display_string_reports_breakdown() {
        let counts = EntityCounts {
            created: 3,
            skipped_existing: 2,
            skipped_missing_reference: 1,
            skipped_invalid: 0,
            failed: 1,
        };
        assert_eq!(
            counts.display_string(),
            "3 created, 3 skipped (2 existing, 1 missing reference), 1 failed"
        );
    }

    #[test]
    fn summary_covers_every_step() {
        let stats = MigrationStatistics::default();
        assert_eq!(stats.summary_lines().len(), EntityStep::ORDER.len());
    }
}
