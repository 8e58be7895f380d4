//! # Driving Ports (API - Inbound)
//!
//! The operations the registry exposes. Every mutating call names its
//! caller explicitly; authorization is decided inside the registry from
//! that identity alone.

use crate::domain::{NewBatch, NewCheckpoint, RegistryError};
use crate::query::QueryFacade;
use async_trait::async_trait;
use shared_types::{Batch, BatchId, Checkpoint, Identity, Role};

/// Primary API of the provenance registry.
///
/// ## Usage
///
/// ```ignore
/// let id = registry.create_batch(&producer, NewBatch::new("COOP-1", "Coffee", 500, "")).await?;
/// let count = registry.checkpoint_count(id).await?;
/// ```
#[async_trait]
pub trait ProvenanceRegistryApi: Send + Sync {
    /// Overwrite `target`'s role. `caller` must hold `Admin`.
    ///
    /// Returns the role `target` held before.
    async fn assign_role(
        &self,
        caller: &Identity,
        target: Identity,
        role: Role,
    ) -> Result<Role, RegistryError>;

    /// Register a batch. `caller` must hold `Producer`.
    async fn create_batch(&self, caller: &Identity, batch: NewBatch)
        -> Result<BatchId, RegistryError>;

    /// Append a checkpoint. `caller` must hold any role; that role is what
    /// gets recorded. Returns the checkpoint's position.
    async fn add_checkpoint(
        &self,
        caller: &Identity,
        checkpoint: NewCheckpoint,
    ) -> Result<u64, RegistryError>;

    /// Current role of `identity`.
    async fn role_of(&self, identity: &Identity) -> Role;

    /// Batch record by id.
    async fn get_batch(&self, batch_id: BatchId) -> Result<Batch, RegistryError>;

    /// Number of checkpoints recorded for a batch.
    async fn checkpoint_count(&self, batch_id: BatchId) -> Result<u64, RegistryError>;

    /// Checkpoint by `(batch_id, index)`.
    async fn get_checkpoint(
        &self,
        batch_id: BatchId,
        index: u64,
    ) -> Result<Checkpoint, RegistryError>;

    /// Consistent read-only view of the registry at this instant.
    async fn query(&self) -> QueryFacade;
}
