//! # Query Facade
//!
//! Read-only access over a snapshot of the registry. A facade pins the
//! state it was created from: commits that land afterwards are invisible to
//! it, and readers never hold the registry lock while they iterate.

use crate::domain::{RegistryError, RegistryState, RoleManager};
use serde::{Deserialize, Serialize};
use shared_types::{Batch, BatchId, Checkpoint, Identity, Role};
use std::sync::Arc;

/// Read-only view pinned to one committed state.
#[derive(Debug, Clone)]
pub struct QueryFacade {
    state: Arc<RegistryState>,
}

impl QueryFacade {
    pub(crate) fn new(state: Arc<RegistryState>) -> Self {
        Self { state }
    }

    #[must_use]
    pub fn role_of(&self, identity: &Identity) -> Role {
        self.state.role_of(identity)
    }

    pub fn get_batch(&self, batch_id: BatchId) -> Result<&Batch, RegistryError> {
        self.state.get_batch(batch_id)
    }

    pub fn checkpoint_count(&self, batch_id: BatchId) -> Result<u64, RegistryError> {
        self.state.checkpoint_count(batch_id)
    }

    pub fn get_checkpoint(&self, batch_id: BatchId, index: u64) -> Result<&Checkpoint, RegistryError> {
        self.state.get_checkpoint(batch_id, index)
    }

    /// Number of batches created so far.
    #[must_use]
    pub fn batch_count(&self) -> u64 {
        self.state.batches().len() as u64
    }

    /// Checkpoints recorded across all batches.
    #[must_use]
    pub fn total_checkpoints(&self) -> u64 {
        self.state.total_checkpoints()
    }

    /// Current role assignments.
    #[must_use]
    pub fn roles(&self) -> &RoleManager {
        self.state.roles()
    }

    /// Commit sequence this view was taken at.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.state.sequence()
    }

    /// Lazy iterator over a batch's checkpoints in insertion order.
    ///
    /// Equivalent to calling `get_checkpoint(batch_id, i)` for
    /// `i in 0..count`, with the count fixed when the iterator is built.
    pub fn checkpoints(&self, batch_id: BatchId) -> Result<CheckpointIter, RegistryError> {
        let end = self.state.checkpoint_count(batch_id)?;
        Ok(CheckpointIter {
            state: Arc::clone(&self.state),
            batch_id,
            next: 0,
            end,
        })
    }

    /// A batch together with its full custody history.
    pub fn history(&self, batch_id: BatchId) -> Result<BatchHistory, RegistryError> {
        let batch = self.state.get_batch(batch_id)?.clone();
        let checkpoints = self.state.checkpoints_of(batch_id)?.to_vec();
        Ok(BatchHistory { batch, checkpoints })
    }
}

/// Iterator over one batch's checkpoints. Cloning yields an independent
/// cursor at the same position.
#[derive(Debug, Clone)]
pub struct CheckpointIter {
    state: Arc<RegistryState>,
    batch_id: BatchId,
    next: u64,
    end: u64,
}

impl CheckpointIter {
    /// Batch this iterator walks.
    #[must_use]
    pub fn batch_id(&self) -> BatchId {
        self.batch_id
    }

    fn at(&self, index: u64) -> Option<Checkpoint> {
        self.state.get_checkpoint(self.batch_id, index).ok().cloned()
    }
}

impl Iterator for CheckpointIter {
    type Item = Checkpoint;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let item = self.at(self.next);
        self.next += 1;
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.end - self.next).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl DoubleEndedIterator for CheckpointIter {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        self.end -= 1;
        self.at(self.end)
    }
}

impl ExactSizeIterator for CheckpointIter {}

/// A batch and every checkpoint recorded for it, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchHistory {
    pub batch: Batch,
    pub checkpoints: Vec<Checkpoint>,
}
