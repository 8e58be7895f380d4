//! # Domain Errors
//!
//! Every failure ends the attempted operation with no side effects. There is
//! no fatal path inside the registry: each variant is an expected outcome
//! the caller must handle, and each attempt is independently safe to retry.

use serde::{Deserialize, Serialize};
use shared_types::{BatchId, Identity, Role};
use std::fmt;
use thiserror::Error;

/// What an operation demands of its caller's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleRequirement {
    /// The caller must hold exactly this role.
    Exactly(Role),
    /// The caller must hold any role other than `None`.
    AnyAssigned,
}

impl fmt::Display for RoleRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(role) => write!(f, "{role}"),
            Self::AnyAssigned => f.write_str("any assigned role"),
        }
    }
}

/// Errors returned by registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Caller's role does not satisfy the operation's requirement.
    #[error("unauthorized: {identity} holds {actual}, requires {required}")]
    Unauthorized {
        identity: Identity,
        actual: Role,
        required: RoleRequirement,
    },

    /// Referenced batch was never created.
    #[error("batch {batch_id} not found")]
    BatchNotFound { batch_id: BatchId },

    /// Checkpoint index outside `[0, count)`.
    #[error("checkpoint {index} not found for batch {batch_id} (count: {count})")]
    CheckpointNotFound {
        batch_id: BatchId,
        index: u64,
        count: u64,
    },

    /// Arguments violate a stated precondition.
    #[error("invalid input for {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },
}

impl RegistryError {
    /// Shorthand for an `InvalidInput` error.
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// The coarse error kind surfaced to callers.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::BatchNotFound { .. } | Self::CheckpointNotFound { .. } => ErrorKind::NotFound,
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
        }
    }
}

/// The three failure kinds of the registry contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    InvalidInput,
}

/// Serializable registry error for IPC receipts and API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryErrorPayload {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<BatchId>,
}

impl From<&RegistryError> for RegistryErrorPayload {
    fn from(err: &RegistryError) -> Self {
        let batch_id = match err {
            RegistryError::BatchNotFound { batch_id }
            | RegistryError::CheckpointNotFound { batch_id, .. } => Some(*batch_id),
            _ => None,
        };
        Self {
            kind: err.kind(),
            message: err.to_string(),
            batch_id,
        }
    }
}

impl From<RegistryError> for RegistryErrorPayload {
    fn from(err: RegistryError) -> Self {
        Self::from(&err)
    }
}
