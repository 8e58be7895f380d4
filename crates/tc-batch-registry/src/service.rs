//! # Registry Service
//!
//! Serializes mutations into a single commit order and publishes one event
//! per commit.
//!
//! ## Concurrency
//!
//! - The committed state sits behind an `Arc` inside a `tokio::sync::RwLock`.
//! - A writer holds the write lock across validate, mutate and publish, so
//!   events leave in commit order and a subscriber that reacts to an event
//!   always reads a state that already contains it.
//! - Readers clone the `Arc` and release the lock at once; a [`QueryFacade`]
//!   never blocks writers while it iterates.
//! - A commit made while a snapshot is alive clones the state first
//!   (`Arc::make_mut`). That clone copies the role map and batch records
//!   but only one pointer per checkpoint history, so its cost grows with
//!   identities and batches, not with recorded checkpoints.

use crate::domain::{
    ConfigError, ErrorKind, Mutation, NewBatch, NewCheckpoint, Operation, Outcome, RegistryConfig,
    RegistryError, RegistryState,
};
use crate::ports::inbound::ProvenanceRegistryApi;
use crate::ports::outbound::TimeSource;
use crate::query::QueryFacade;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_bus::EventPublisher;
use shared_types::{Batch, BatchId, Checkpoint, Identity, LogicalTime, Role};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// Statistics for the registry service.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStats {
    /// Mutations committed (equals the current commit sequence).
    pub mutations_committed: u64,
    /// Committed role assignments.
    pub roles_assigned: u64,
    /// Committed batch creations.
    pub batches_created: u64,
    /// Committed checkpoint appends.
    pub checkpoints_added: u64,
    /// Rejections because of the caller's role.
    pub rejected_unauthorized: u64,
    /// Rejections because a batch or checkpoint does not exist.
    pub rejected_not_found: u64,
    /// Rejections because of malformed arguments.
    pub rejected_invalid_input: u64,
    /// Checkpoint submissions whose claimed role label differed from the
    /// caller's assigned role.
    pub role_label_mismatches: u64,
    /// Sum over all events of the subscribers that received them.
    pub event_deliveries: u64,
}

impl ServiceStats {
    /// Total rejected mutations.
    #[must_use]
    pub fn rejected(&self) -> u64 {
        self.rejected_unauthorized + self.rejected_not_found + self.rejected_invalid_input
    }

    fn record_commit(&mut self, outcome: &Outcome, delivered: usize) {
        self.mutations_committed += 1;
        self.event_deliveries += delivered as u64;
        match outcome {
            Outcome::RoleAssigned { .. } => self.roles_assigned += 1,
            Outcome::BatchCreated { .. } => self.batches_created += 1,
            Outcome::CheckpointAdded { .. } => self.checkpoints_added += 1,
        }
    }

    fn record_rejection(&mut self, kind: ErrorKind) {
        match kind {
            ErrorKind::Unauthorized => self.rejected_unauthorized += 1,
            ErrorKind::NotFound => self.rejected_not_found += 1,
            ErrorKind::InvalidInput => self.rejected_invalid_input += 1,
        }
    }
}

/// A committed mutation as seen by its submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Applied {
    /// Position in the commit order, starting at 1.
    pub sequence: u64,
    pub outcome: Outcome,
}

/// The provenance registry service.
pub struct RegistryService {
    /// Latest committed state.
    state: RwLock<Arc<RegistryState>>,
    /// Notification sink, fed after each commit.
    publisher: Arc<dyn EventPublisher>,
    /// Default stamp for mutations that carry no timestamp.
    clock: Arc<dyn TimeSource>,
    /// Service statistics.
    stats: RwLock<ServiceStats>,
}

impl RegistryService {
    /// Create a registry with `config.genesis_admin` as the sole admin.
    pub fn new(
        config: RegistryConfig,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(genesis_admin = %config.genesis_admin, "Provenance registry initialized");
        Ok(Self {
            state: RwLock::new(Arc::new(RegistryState::new(&config))),
            publisher,
            clock,
            stats: RwLock::new(ServiceStats::default()),
        })
    }

    /// Apply one mutation atomically.
    ///
    /// `at` overrides the clock, which lets a replayed log reproduce its
    /// original timestamps.
    #[instrument(skip(self, mutation), fields(op = mutation.name(), caller = %caller))]
    pub async fn submit(
        &self,
        caller: Identity,
        at: Option<LogicalTime>,
        mutation: Mutation,
    ) -> Result<Applied, RegistryError> {
        let mut state = self.state.write().await;
        let now = at.unwrap_or_else(|| self.clock.now());

        let commit = match Arc::make_mut(&mut *state).apply(&caller, mutation, now) {
            Ok(commit) => commit,
            Err(err) => {
                drop(state);
                return Err(self.reject(err).await);
            }
        };

        let delivered = self.publisher.publish(commit.event).await;
        drop(state);

        info!(
            sequence = commit.sequence,
            outcome = ?commit.outcome,
            subscribers = delivered,
            "Mutation committed"
        );
        self.stats
            .write()
            .await
            .record_commit(&commit.outcome, delivered);

        Ok(Applied {
            sequence: commit.sequence,
            outcome: commit.outcome,
        })
    }

    /// Settle a call whose arguments could not be turned into a mutation.
    ///
    /// The caller still goes through the existence and role checks of `op`
    /// first, so a caller that could not have made the call learns that
    /// rather than what was wrong with its arguments.
    #[instrument(skip(self, err), fields(caller = %caller))]
    pub async fn reject_malformed(
        &self,
        caller: &Identity,
        op: Operation,
        err: RegistryError,
    ) -> RegistryError {
        let err = match self.state.read().await.authorize(caller, op) {
            Ok(()) => err,
            Err(denied) => denied,
        };
        self.reject(err).await
    }

    /// Log and count a rejected call, handing the error back.
    pub async fn reject(&self, err: RegistryError) -> RegistryError {
        if err.kind() == ErrorKind::Unauthorized {
            warn!(error = %err, "Mutation rejected");
        } else {
            debug!(error = %err, "Mutation rejected");
        }
        self.stats.write().await.record_rejection(err.kind());
        err
    }

    /// Pinned read-only view of the latest committed state.
    pub async fn snapshot(&self) -> QueryFacade {
        QueryFacade::new(Arc::clone(&*self.state.read().await))
    }

    /// Get current service statistics.
    pub async fn stats(&self) -> ServiceStats {
        self.stats.read().await.clone()
    }

    /// Count a checkpoint submission whose claimed role did not match.
    pub async fn record_role_label_mismatch(&self) {
        self.stats.write().await.role_label_mismatches += 1;
    }

    /// Total events handed to the publisher.
    #[must_use]
    pub fn events_published(&self) -> u64 {
        self.publisher.events_published()
    }
}

#[async_trait]
impl ProvenanceRegistryApi for RegistryService {
    async fn assign_role(
        &self,
        caller: &Identity,
        target: Identity,
        role: Role,
    ) -> Result<Role, RegistryError> {
        match self
            .submit(*caller, None, Mutation::AssignRole { target, role })
            .await?
            .outcome
        {
            Outcome::RoleAssigned { previous, .. } => Ok(previous),
            other => unreachable!("assign_role produced {other:?}"),
        }
    }

    async fn create_batch(
        &self,
        caller: &Identity,
        batch: NewBatch,
    ) -> Result<BatchId, RegistryError> {
        match self
            .submit(*caller, None, Mutation::CreateBatch(batch))
            .await?
            .outcome
        {
            Outcome::BatchCreated { batch_id } => Ok(batch_id),
            other => unreachable!("create_batch produced {other:?}"),
        }
    }

    async fn add_checkpoint(
        &self,
        caller: &Identity,
        checkpoint: NewCheckpoint,
    ) -> Result<u64, RegistryError> {
        match self
            .submit(*caller, None, Mutation::AddCheckpoint(checkpoint))
            .await?
            .outcome
        {
            Outcome::CheckpointAdded { index, .. } => Ok(index),
            other => unreachable!("add_checkpoint produced {other:?}"),
        }
    }

    async fn role_of(&self, identity: &Identity) -> Role {
        self.snapshot().await.role_of(identity)
    }

    async fn get_batch(&self, batch_id: BatchId) -> Result<Batch, RegistryError> {
        self.snapshot().await.get_batch(batch_id).cloned()
    }

    async fn checkpoint_count(&self, batch_id: BatchId) -> Result<u64, RegistryError> {
        self.snapshot().await.checkpoint_count(batch_id)
    }

    async fn get_checkpoint(
        &self,
        batch_id: BatchId,
        index: u64,
    ) -> Result<Checkpoint, RegistryError> {
        self.snapshot()
            .await
            .get_checkpoint(batch_id, index)
            .cloned()
    }

    async fn query(&self) -> QueryFacade {
        self.snapshot().await
    }
}
