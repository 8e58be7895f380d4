//! # Registry State
//!
//! The three stores plus the commit counter, mutated only through
//! [`RegistryState::apply`]. Every mutation validates fully before it
//! touches anything, so a rejected call leaves the state exactly as it was.

use super::access::AccessGate;
use super::batches::BatchStore;
use super::checkpoints::CheckpointLedger;
use super::errors::RegistryError;
use super::roles::RoleManager;
use super::value_objects::{Mutation, Operation, Outcome, RegistryConfig, RegistryLimits};
use shared_bus::RegistryEvent;
use shared_types::{Batch, BatchId, Checkpoint, Identity, LogicalTime, Role};

/// Result of a committed mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Position of this mutation in the total commit order, starting at 1.
    pub sequence: u64,
    pub outcome: Outcome,
    /// Notification to publish once the commit is visible.
    pub event: RegistryEvent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryState {
    roles: RoleManager,
    batches: BatchStore,
    checkpoints: CheckpointLedger,
    sequence: u64,
    limits: RegistryLimits,
}

impl RegistryState {
    /// Fresh registry. The genesis admin is seeded directly: no event, no
    /// sequence number.
    #[must_use]
    pub fn new(config: &RegistryConfig) -> Self {
        Self {
            roles: RoleManager::with_admin(config.genesis_admin),
            batches: BatchStore::new(),
            checkpoints: CheckpointLedger::new(),
            sequence: 0,
            limits: config.limits.clone(),
        }
    }

    /// Apply one mutation on behalf of `caller` at logical time `now`.
    pub fn apply(
        &mut self,
        caller: &Identity,
        mutation: Mutation,
        now: LogicalTime,
    ) -> Result<Commit, RegistryError> {
        let sequence = self.sequence + 1;
        let (outcome, event) = match mutation {
            Mutation::AssignRole { target, role } => {
                let previous = self.roles.assign_role(caller, target, role)?;
                (
                    Outcome::RoleAssigned {
                        target,
                        previous,
                        role,
                    },
                    RegistryEvent::RoleChanged {
                        sequence,
                        admin: *caller,
                        target,
                        previous,
                        role,
                        at: now,
                    },
                )
            }
            Mutation::CreateBatch(draft) => {
                let batch =
                    self.batches
                        .create_batch(&self.roles, caller, draft, now, &self.limits)?;
                (
                    Outcome::BatchCreated { batch_id: batch.id },
                    RegistryEvent::BatchCreated {
                        sequence,
                        batch: batch.clone(),
                    },
                )
            }
            Mutation::AddCheckpoint(draft) => {
                let batch_id = draft.batch_id;
                let index = self.checkpoints.add_checkpoint(
                    &self.roles,
                    &self.batches,
                    caller,
                    draft,
                    now,
                    &self.limits,
                )?;
                let checkpoint = self
                    .checkpoints
                    .get_checkpoint(&self.batches, batch_id, index)?
                    .clone();
                (
                    Outcome::CheckpointAdded { batch_id, index },
                    RegistryEvent::CheckpointAdded {
                        sequence,
                        index,
                        checkpoint,
                    },
                )
            }
        };
        self.sequence = sequence;
        Ok(Commit {
            sequence,
            outcome,
            event,
        })
    }

    /// Run the existence and role checks `apply` would run for `op`, in the
    /// same order, without looking at any argument.
    pub fn authorize(&self, caller: &Identity, op: Operation) -> Result<(), RegistryError> {
        match op {
            Operation::AssignRole => AccessGate::require_role(&self.roles, caller, Role::Admin),
            Operation::CreateBatch => AccessGate::require_role(&self.roles, caller, Role::Producer),
            Operation::AddCheckpoint { batch_id } => {
                self.batches.get_batch(batch_id)?;
                AccessGate::require_any_role(&self.roles, caller).map(|_| ())
            }
        }
    }

    #[must_use]
    pub fn role_of(&self, identity: &Identity) -> Role {
        self.roles.role_of(identity)
    }

    pub fn get_batch(&self, id: BatchId) -> Result<&Batch, RegistryError> {
        self.batches.get_batch(id)
    }

    pub fn checkpoint_count(&self, batch_id: BatchId) -> Result<u64, RegistryError> {
        self.checkpoints.count(&self.batches, batch_id)
    }

    pub fn get_checkpoint(&self, batch_id: BatchId, index: u64) -> Result<&Checkpoint, RegistryError> {
        self.checkpoints.get_checkpoint(&self.batches, batch_id, index)
    }

    /// Checkpoints of an existing batch, in insertion order.
    pub fn checkpoints_of(&self, batch_id: BatchId) -> Result<&[Checkpoint], RegistryError> {
        self.batches.get_batch(batch_id)?;
        Ok(self.checkpoints.recorded(batch_id))
    }

    #[must_use]
    pub fn roles(&self) -> &RoleManager {
        &self.roles
    }

    #[must_use]
    pub fn batches(&self) -> &BatchStore {
        &self.batches
    }

    #[must_use]
    pub fn total_checkpoints(&self) -> u64 {
        self.checkpoints.total()
    }

    /// Number of committed mutations.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    #[must_use]
    pub fn limits(&self) -> &RegistryLimits {
        &self.limits
    }
}
