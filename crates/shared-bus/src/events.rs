//! # Registry Events
//!
//! Every event that flows through the shared bus. One event is emitted per
//! committed mutation and carries the operation's arguments together with
//! the identifiers it produced.

use serde::{Deserialize, Serialize};
use shared_types::{Batch, BatchId, Checkpoint, Identity, LogicalTime, Role};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RegistryEvent {
    /// An admin overwrote an identity's role.
    RoleChanged {
        /// Commit sequence of the mutation.
        sequence: u64,
        /// Admin that made the assignment.
        admin: Identity,
        /// Identity whose role changed.
        target: Identity,
        /// Role held before the assignment.
        previous: Role,
        /// Role held after the assignment.
        role: Role,
        /// Logical time of the commit.
        at: LogicalTime,
    },

    /// A producer registered a new batch.
    BatchCreated {
        /// Commit sequence of the mutation.
        sequence: u64,
        /// The record as stored, including its assigned id.
        batch: Batch,
    },

    /// A checkpoint was appended to a batch's custody history.
    CheckpointAdded {
        /// Commit sequence of the mutation.
        sequence: u64,
        /// Position of the checkpoint in the batch's sequence.
        index: u64,
        /// The record as stored.
        checkpoint: Checkpoint,
    },
}

impl RegistryEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::RoleChanged { .. } => EventTopic::Roles,
            Self::BatchCreated { .. } => EventTopic::Batches,
            Self::CheckpointAdded { .. } => EventTopic::Checkpoints,
        }
    }

    /// Commit sequence of the mutation that produced this event.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        match self {
            Self::RoleChanged { sequence, .. }
            | Self::BatchCreated { sequence, .. }
            | Self::CheckpointAdded { sequence, .. } => *sequence,
        }
    }

    /// Batch the event concerns, if any.
    #[must_use]
    pub fn batch_id(&self) -> Option<BatchId> {
        match self {
            Self::RoleChanged { .. } => None,
            Self::BatchCreated { batch, .. } => Some(batch.id),
            Self::CheckpointAdded { checkpoint, .. } => Some(checkpoint.batch_id),
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Role assignments.
    Roles,
    /// Batch registrations.
    Batches,
    /// Checkpoint appends.
    Checkpoints,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Batches to include. Empty means all batches. Events that concern no
    /// batch (role changes) are excluded by a non-empty batch list.
    pub batch_ids: Vec<BatchId>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            batch_ids: Vec::new(),
        }
    }

    /// Create a filter following a single batch's history.
    #[must_use]
    pub fn for_batch(batch_id: BatchId) -> Self {
        Self {
            topics: Vec::new(),
            batch_ids: vec![batch_id],
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &RegistryEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let batch_match = self.batch_ids.is_empty()
            || event
                .batch_id()
                .is_some_and(|id| self.batch_ids.contains(&id));

        topic_match && batch_match
    }
}
