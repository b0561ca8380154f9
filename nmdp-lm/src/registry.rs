//! Identity registry
//!
//! The legacy sources have no durable foreign keys: a message references
//! "the user with this email" or "the chat with this opaque id", never a
//! target-store primary key. The registry centralizes that resolution for
//! a run: natural keys are normalized, scoped per entity kind, and mapped
//! to target identifiers. It is pre-seeded from the target store so a
//! re-run recognizes previously migrated rows, then extended by each
//! importer as it creates rows.
//!
//! Invariant: at most one target identifier per identity key for the
//! lifetime of the registry. Lookups never overwrite; only absence
//! triggers creation.

use crate::error::{MigrationError, Result};
use crate::normalize::normalize_identity_key;
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

/// Entity scope of a natural key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Accounts, keyed by normalized email
    Account,
    /// Patients, keyed by normalized email and by owning account guid
    Patient,
    /// Legacy chat/session ids, mapped to the owning account
    ChatSession,
    Referral,
    Note,
    Message,
    ShopLink,
    Recommendation,
    LabResult,
    Interview,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Account => "account",
            EntityKind::Patient => "patient",
            EntityKind::ChatSession => "chat_session",
            EntityKind::Referral => "referral",
            EntityKind::Note => "note",
            EntityKind::Message => "message",
            EntityKind::ShopLink => "shop_link",
            EntityKind::Recommendation => "recommendation",
            EntityKind::LabResult => "result",
            EntityKind::Interview => "interview",
        }
    }
}

/// An entry registered during this run (not preloaded), kept for the
/// end-of-run audit snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub kind: EntityKind,
    pub natural_key: String,
    pub target_id: Uuid,
}

/// Run-scoped natural key to target identifier map
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    entries: HashMap<(EntityKind, String), Uuid>,
    new_entries: Vec<NewEntry>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a natural key to a target identifier, if registered
    pub fn lookup(&self, kind: EntityKind, natural_key: &str) -> Option<Uuid> {
        let key = normalize_identity_key(natural_key);
        self.entries.get(&(kind, key)).copied()
    }

    /// Register a newly created target row under its natural key.
    ///
    /// Re-registering the same pair is a no-op; registering a different
    /// target id for an existing key is a logic error (natural-key
    /// collision) that must fail the offending record, not the run.
    pub fn register(
        &mut self,
        kind: EntityKind,
        natural_key: &str,
        target_id: Uuid,
    ) -> Result<()> {
        let key = normalize_identity_key(natural_key);
        if let Some(existing) = self.entries.get(&(kind, key.clone())) {
            if *existing == target_id {
                return Ok(());
            }
            return Err(MigrationError::IdentityCollision {
                kind: kind.as_str(),
                key,
                existing: *existing,
                candidate: target_id,
            });
        }

        self.entries.insert((kind, key.clone()), target_id);
        self.new_entries.push(NewEntry {
            kind,
            natural_key: key,
            target_id,
        });
        Ok(())
    }

    /// Bulk-seed the registry from the target store at run start.
    ///
    /// Preloaded pairs do not appear in the audit snapshot. A pair whose
    /// key is already present is ignored with a warning; the store itself
    /// enforces uniqueness, so this only happens on duplicate seed queries.
    pub fn preload(
        &mut self,
        kind: EntityKind,
        pairs: impl IntoIterator<Item = (String, Uuid)>,
    ) -> usize {
        let mut loaded = 0;
        for (natural_key, target_id) in pairs {
            let key = normalize_identity_key(&natural_key);
            if key.is_empty() {
                continue;
            }
            match self.entries.get(&(kind, key.clone())) {
                Some(existing) if *existing != target_id => {
                    warn!(
                        kind = kind.as_str(),
                        key = %key,
                        "Conflicting preload pair ignored"
                    );
                }
                Some(_) => {}
                None => {
                    self.entries.insert((kind, key), target_id);
                    loaded += 1;
                }
            }
        }
        loaded
    }

    /// Entries registered (not preloaded) during this run
    pub fn new_entries(&self) -> &[NewEntry] {
        &self.new_entries
    }

    /// Mark the current registration high-water line.
    ///
    /// Paired with [`revert_to`](Self::revert_to) so a failed record can
    /// drop its registrations together with its rolled-back rows.
    pub fn checkpoint(&self) -> usize {
        self.new_entries.len()
    }

    /// Remove every entry registered after the given checkpoint
    pub fn revert_to(&mut self, checkpoint: usize) {
        let reverted: Vec<NewEntry> = self.new_entries.drain(checkpoint..).collect();
        for entry in reverted {
            self.entries.remove(&(entry.kind, entry.natural_key));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_normalizes_case_and_whitespace() {
        let mut registry = IdentityRegistry::new();
        let id = Uuid::new_v4();
        registry
            .register(EntityKind::Account, "Test@Example.com ", id)
            .expect("register");

        for key in ["test@example.com", " TEST@EXAMPLE.COM ", "Test@Example.com"] {
            assert_eq!(registry.lookup(EntityKind::Account, key), Some(id));
        }
    }

    #[test]
    fn kinds_are_scoped_independently() {
        let mut registry = IdentityRegistry::new();
        let account = Uuid::new_v4();
        let patient = Uuid::new_v4();
        registry
            .register(EntityKind::Account, "a@b.com", account)
            .expect("register account");
        registry
            .register(EntityKind::Patient, "a@b.com", patient)
            .expect("register patient");

        assert_eq!(registry.lookup(EntityKind::Account, "a@b.com"), Some(account));
        assert_eq!(registry.lookup(EntityKind::Patient, "a@b.com"), Some(patient));
    }

    #[test]
    fn reregistering_same_pair_is_noop() {
        let mut registry = IdentityRegistry::new();
        let id = Uuid::new_v4();
        registry.register(EntityKind::Note, "csv:1", id).expect("first");
        registry.register(EntityKind::Note, "csv:1", id).expect("same again");
        assert_eq!(registry.new_entries().len(), 1);
    }

    #[test]
    fn conflicting_registration_is_a_collision() {
        let mut registry = IdentityRegistry::new();
        registry
            .register(EntityKind::Note, "csv:1", Uuid::new_v4())
            .expect("first");
        let err = registry
            .register(EntityKind::Note, "csv:1", Uuid::new_v4())
            .expect_err("collision");
        assert!(matches!(err, MigrationError::IdentityCollision { .. }));
    }

    #[test]
    fn preloaded_pairs_do_not_appear_in_audit() {
        let mut registry = IdentityRegistry::new();
        let preloaded = Uuid::new_v4();
        let loaded =
            registry.preload(EntityKind::Account, vec![("Old@User.com".to_string(), preloaded)]);
        assert_eq!(loaded, 1);
        assert_eq!(registry.lookup(EntityKind::Account, "old@user.com"), Some(preloaded));
        assert!(registry.new_entries().is_empty());
    }

    #[test]
    fn revert_drops_entries_after_checkpoint() {
        let mut registry = IdentityRegistry::new();
        let kept = Uuid::new_v4();
        registry.register(EntityKind::Account, "kept@x.com", kept).expect("register");

        let checkpoint = registry.checkpoint();
        registry
            .register(EntityKind::Account, "dropped@x.com", Uuid::new_v4())
            .expect("register");
        registry
            .register(EntityKind::Patient, "dropped@x.com", Uuid::new_v4())
            .expect("register");
        registry.revert_to(checkpoint);

        assert_eq!(registry.lookup(EntityKind::Account, "kept@x.com"), Some(kept));
        assert_eq!(registry.lookup(EntityKind::Account, "dropped@x.com"), None);
        assert_eq!(registry.lookup(EntityKind::Patient, "dropped@x.com"), None);
        assert_eq!(registry.new_entries().len(), 1);
    }

    #[test]
    fn preload_keeps_first_on_conflict() {
        let mut registry = IdentityRegistry::new();
        let first = Uuid::new_v4();
        registry.preload(EntityKind::Account, vec![("a@b.com".to_string(), first)]);
        registry.preload(EntityKind::Account, vec![("A@B.COM ".to_string(), Uuid::new_v4())]);
        assert_eq!(registry.lookup(EntityKind::Account, "a@b.com"), Some(first));
    }
}
