//! # Command Payloads
//!
//! What callers put inside a `Transaction<RegistryCommand>` envelope, and
//! the receipt they get back.
//!
//! Payloads carry no caller identity. Roles travel as strings (label or
//! keccak-256 hash) and are parsed at the boundary.

use crate::domain::{Operation, Outcome, RegistryErrorPayload};
use serde::{Deserialize, Serialize};
use serde_json::Number;
use shared_types::{BatchId, Identity};
use uuid::Uuid;

/// A mutating call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RegistryCommand {
    /// Overwrite `target`'s role. Requires `Admin`.
    AssignRole {
        target: Identity,
        /// Label (`"PRODUCER"`) or hash (`"0xa262…"`).
        role: String,
    },

    /// Register a batch. Requires `Producer`.
    #[serde(rename_all = "camelCase")]
    CreateBatch {
        cooperative_id: String,
        product_type: String,
        /// Any JSON number, so that non-positive values reach the registry
        /// and are rejected there rather than failing to decode.
        quantity: Number,
        #[serde(default)]
        evidence_ref: String,
    },

    /// Append a checkpoint. Requires any role.
    #[serde(rename_all = "camelCase")]
    AddCheckpoint {
        batch_id: BatchId,
        /// Role the caller claims to act as. Accepted for compatibility with
        /// older clients; the recorded role always comes from the registry.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        role: Option<String>,
        status: String,
        #[serde(default)]
        evidence_ref: String,
        #[serde(default)]
        note: String,
    },
}

impl RegistryCommand {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::AssignRole { .. } => "assign_role",
            Self::CreateBatch { .. } => "create_batch",
            Self::AddCheckpoint { .. } => "add_checkpoint",
        }
    }

    #[must_use]
    pub fn operation(&self) -> Operation {
        match self {
            Self::AssignRole { .. } => Operation::AssignRole,
            Self::CreateBatch { .. } => Operation::CreateBatch,
            Self::AddCheckpoint { batch_id, .. } => Operation::AddCheckpoint {
                batch_id: *batch_id,
            },
        }
    }
}

/// Result of one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    /// Echo of the envelope's correlation id.
    pub correlation_id: Uuid,
    pub sender: Identity,
    #[serde(flatten)]
    pub status: ReceiptStatus,
}

impl TransactionReceipt {
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self.status, ReceiptStatus::Committed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ReceiptStatus {
    Committed { sequence: u64, outcome: Outcome },
    Rejected { error: RegistryErrorPayload },
}
