//! # Checkpoint Ledger
//!
//! Append-only custody history, one sequence per batch, indexed by
//! `(batch_id, position)`. Positions are stable: nothing is ever removed or
//! edited, so position `i` names the same record forever.
//!
//! Each batch's history sits behind its own `Arc`. Cloning the ledger (what
//! copy-on-write does while a snapshot is alive) copies one pointer per
//! batch, and an append then copies only the history it extends.

use super::access::{AccessGate, RoleLookup};
use super::batches::BatchStore;
use super::errors::RegistryError;
use super::value_objects::{NewCheckpoint, RegistryLimits};
use serde::{Deserialize, Serialize};
use shared_types::{BatchId, Checkpoint, Identity, LogicalTime};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointLedger {
    sequences: HashMap<BatchId, Arc<Vec<Checkpoint>>>,
    total: u64,
}

impl CheckpointLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a checkpoint to an existing batch.
    ///
    /// Checks run in this order: batch exists, caller holds a role, input is
    /// valid. The recorded role is the caller's assignment at the moment of
    /// the call, never a caller-supplied label.
    ///
    /// Returns the new checkpoint's position.
    pub fn add_checkpoint(
        &mut self,
        roles: &impl RoleLookup,
        batches: &BatchStore,
        caller: &Identity,
        draft: NewCheckpoint,
        now: LogicalTime,
        limits: &RegistryLimits,
    ) -> Result<u64, RegistryError> {
        batches.get_batch(draft.batch_id)?;
        let role = AccessGate::require_any_role(roles, caller)?;
        draft.validate(limits)?;

        let sequence = Arc::make_mut(self.sequences.entry(draft.batch_id).or_default());
        let index = sequence.len() as u64;
        sequence.push(Checkpoint {
            batch_id: draft.batch_id,
            role,
            status: draft.status,
            evidence_ref: draft.evidence_ref,
            note: draft.note,
            actor: *caller,
            timestamp: now,
        });
        self.total += 1;
        Ok(index)
    }

    /// Number of checkpoints recorded for a batch. `NotFound` if the batch
    /// does not exist.
    pub fn count(&self, batches: &BatchStore, batch_id: BatchId) -> Result<u64, RegistryError> {
        batches.get_batch(batch_id)?;
        Ok(self.recorded(batch_id).len() as u64)
    }

    /// Checkpoint at `index`. `NotFound` if the batch does not exist or the
    /// index is outside `[0, count)`.
    pub fn get_checkpoint(
        &self,
        batches: &BatchStore,
        batch_id: BatchId,
        index: u64,
    ) -> Result<&Checkpoint, RegistryError> {
        batches.get_batch(batch_id)?;
        let recorded = self.recorded(batch_id);
        usize::try_from(index)
            .ok()
            .and_then(|slot| recorded.get(slot))
            .ok_or(RegistryError::CheckpointNotFound {
                batch_id,
                index,
                count: recorded.len() as u64,
            })
    }

    /// Recorded checkpoints of a batch in insertion order. Empty for batches
    /// with no history (or that do not exist).
    #[must_use]
    pub fn recorded(&self, batch_id: BatchId) -> &[Checkpoint] {
        self.sequences
            .get(&batch_id)
            .map(|sequence| sequence.as_slice())
            .unwrap_or_default()
    }

    /// Checkpoints recorded across all batches.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ErrorKind;
    use crate::domain::value_objects::NewBatch;
    use shared_types::Role;

    fn transporter() -> Identity {
        Identity::from_bytes([0xB0; 20])
    }

    fn producer() -> Identity {
        Identity::from_bytes([0xA0; 20])
    }

    fn roles(identity: &Identity) -> Role {
        match identity.as_bytes()[0] {
            0xA0 => Role::Producer,
            0xB0 => Role::Transporter,
            _ => Role::None,
        }
    }

    fn store_with_batch() -> BatchStore {
        let mut store = BatchStore::new();
        store
            .create_batch(
                &roles,
                &producer(),
                NewBatch::new("COOP-1", "Coffee", 500, "ev1"),
                10,
                &RegistryLimits::default(),
            )
            .unwrap();
        store
    }

    fn add(
        ledger: &mut CheckpointLedger,
        batches: &BatchStore,
        caller: Identity,
        draft: NewCheckpoint,
    ) -> Result<u64, RegistryError> {
        ledger.add_checkpoint(&roles, batches, &caller, draft, 20, &RegistryLimits::default())
    }

    #[test]
    fn test_append_records_actor_role_and_time() {
        let batches = store_with_batch();
        let mut ledger = CheckpointLedger::new();

        let index = add(&mut ledger, &batches, transporter(), NewCheckpoint::new(1, "collected", "ev2", "note")).unwrap();
        assert_eq!(index, 0);

        let cp = ledger.get_checkpoint(&batches, 1, 0).unwrap();
        assert_eq!(cp.role, Role::Transporter);
        assert_eq!(cp.actor, transporter());
        assert_eq!(cp.timestamp, 20);
        assert_eq!(cp.status, "collected");
        assert_eq!(ledger.count(&batches, 1).unwrap(), 1);
    }

    #[test]
    fn test_positions_follow_insertion_order() {
        let batches = store_with_batch();
        let mut ledger = CheckpointLedger::new();

        for (expected, status) in ["collected", "tested", "delivered"].into_iter().enumerate() {
            let index = add(&mut ledger, &batches, producer(), NewCheckpoint::new(1, status, "", "")).unwrap();
            assert_eq!(index, expected as u64);
        }
        let statuses: Vec<_> = ledger.recorded(1).iter().map(|c| c.status.as_str()).collect();
        assert_eq!(statuses, ["collected", "tested", "delivered"]);
        assert_eq!(ledger.total(), 3);
    }

    #[test]
    fn test_missing_batch_is_not_found() {
        let batches = store_with_batch();
        let mut ledger = CheckpointLedger::new();

        let err = add(&mut ledger, &batches, transporter(), NewCheckpoint::new(2, "collected", "", "")).unwrap_err();
        assert_eq!(err, RegistryError::BatchNotFound { batch_id: 2 });
        assert_eq!(ledger.count(&batches, 2).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_role_none_is_unauthorized() {
        let batches = store_with_batch();
        let mut ledger = CheckpointLedger::new();

        let err = add(&mut ledger, &batches, Identity::default(), NewCheckpoint::new(1, "collected", "", "")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(ledger.count(&batches, 1).unwrap(), 0);
    }

    #[test]
    fn test_empty_status_is_invalid() {
        let batches = store_with_batch();
        let mut ledger = CheckpointLedger::new();

        let err = add(&mut ledger, &batches, transporter(), NewCheckpoint::new(1, "", "", "")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(ledger.total(), 0);
    }

    #[test]
    fn test_count_zero_for_existing_batch_without_history() {
        let batches = store_with_batch();
        let ledger = CheckpointLedger::new();
        assert_eq!(ledger.count(&batches, 1).unwrap(), 0);
    }

    #[test]
    fn test_clone_shares_untouched_histories() {
        let mut batches = store_with_batch();
        batches
            .create_batch(
                &roles,
                &producer(),
                NewBatch::new("COOP-1", "Cocoa", 5, ""),
                11,
                &RegistryLimits::default(),
            )
            .unwrap();
        let mut ledger = CheckpointLedger::new();
        add(&mut ledger, &batches, transporter(), NewCheckpoint::new(1, "collected", "", "")).unwrap();
        add(&mut ledger, &batches, transporter(), NewCheckpoint::new(2, "collected", "", "")).unwrap();

        let pinned = ledger.clone();
        add(&mut ledger, &batches, transporter(), NewCheckpoint::new(2, "delivered", "", "")).unwrap();

        assert!(Arc::ptr_eq(&ledger.sequences[&1], &pinned.sequences[&1]));
        assert!(!Arc::ptr_eq(&ledger.sequences[&2], &pinned.sequences[&2]));
        assert_eq!(pinned.recorded(2).len(), 1);
        assert_eq!(ledger.recorded(2).len(), 2);
    }

    #[test]
    fn test_index_out_of_range() {
        let batches = store_with_batch();
        let mut ledger = CheckpointLedger::new();
        add(&mut ledger, &batches, transporter(), NewCheckpoint::new(1, "collected", "", "")).unwrap();

        assert_eq!(
            ledger.get_checkpoint(&batches, 1, 1),
            Err(RegistryError::CheckpointNotFound { batch_id: 1, index: 1, count: 1 })
        );
        assert!(ledger.get_checkpoint(&batches, 1, u64::MAX).is_err());
        assert_eq!(
            ledger.get_checkpoint(&batches, 7, 0),
            Err(RegistryError::BatchNotFound { batch_id: 7 })
        );
    }
}
