//! # Batch Store
//!
//! Owns batch records and hands out sequential identifiers.
//!
//! Records live in a dense vector: batch `n` sits at position `n - 1`, so ids
//! start at 1, have no gaps, and are never reused. A failed creation pushes
//! nothing and therefore consumes no id.

use super::access::{AccessGate, RoleLookup};
use super::errors::RegistryError;
use super::value_objects::{NewBatch, RegistryLimits};
use serde::{Deserialize, Serialize};
use shared_types::{Batch, BatchId, Identity, LogicalTime, Role};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStore {
    batches: Vec<Batch>,
}

impl BatchStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a batch on behalf of a `Producer`.
    ///
    /// Checks the caller's role before the arguments, so an unauthorized
    /// caller learns nothing about input validity.
    pub fn create_batch(
        &mut self,
        roles: &impl RoleLookup,
        caller: &Identity,
        draft: NewBatch,
        now: LogicalTime,
        limits: &RegistryLimits,
    ) -> Result<&Batch, RegistryError> {
        AccessGate::require_role(roles, caller, Role::Producer)?;
        draft.validate(limits)?;

        let batch = Batch {
            id: self.next_id(),
            producer: *caller,
            cooperative_id: draft.cooperative_id,
            product_type: draft.product_type,
            quantity: draft.quantity,
            created_at: now,
            evidence_ref: draft.evidence_ref,
        };
        self.batches.push(batch);
        Ok(&self.batches[self.batches.len() - 1])
    }

    /// Look up a batch. Fails with `NotFound` if it was never created.
    pub fn get_batch(&self, id: BatchId) -> Result<&Batch, RegistryError> {
        id.checked_sub(1)
            .and_then(|slot| usize::try_from(slot).ok())
            .and_then(|slot| self.batches.get(slot))
            .ok_or(RegistryError::BatchNotFound { batch_id: id })
    }

    #[must_use]
    pub fn contains(&self, id: BatchId) -> bool {
        self.get_batch(id).is_ok()
    }

    /// Id the next successful creation will receive.
    #[must_use]
    pub fn next_id(&self) -> BatchId {
        self.batches.len() as BatchId + 1
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// All batches in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Batch> + '_ {
        self.batches.iter()
    }
}
