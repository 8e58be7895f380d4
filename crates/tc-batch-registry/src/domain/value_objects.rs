//! # Value Objects
//!
//! Configuration, input drafts and the typed mutation set.

use super::errors::RegistryError;
use serde::{Deserialize, Serialize};
use shared_types::{BatchId, Identity, Role};
use thiserror::Error;

/// Upper bounds on caller-supplied strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryLimits {
    /// Bound for `cooperative_id`, `product_type` and `status` (default: 128).
    pub max_label_len: usize,
    /// Bound for evidence content addresses (default: 256).
    pub max_evidence_ref_len: usize,
    /// Bound for checkpoint notes (default: 4096).
    pub max_note_len: usize,
}

impl Default for RegistryLimits {
    fn default() -> Self {
        Self {
            max_label_len: 128,
            max_evidence_ref_len: 256,
            max_note_len: 4096,
        }
    }
}

/// Configuration for one registry instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// The only identity that starts out holding `Admin`.
    pub genesis_admin: Identity,
    /// Input bounds.
    #[serde(default)]
    pub limits: RegistryLimits,
}

impl RegistryConfig {
    /// Configuration with default limits.
    #[must_use]
    pub fn new(genesis_admin: Identity) -> Self {
        Self {
            genesis_admin,
            limits: RegistryLimits::default(),
        }
    }

    /// Reject configurations that would produce an unusable registry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.genesis_admin == Identity::default() {
            return Err(ConfigError::ZeroGenesisAdmin);
        }
        let limits = &self.limits;
        if limits.max_label_len == 0 {
            return Err(ConfigError::ZeroLimit("max_label_len"));
        }
        if limits.max_evidence_ref_len == 0 {
            return Err(ConfigError::ZeroLimit("max_evidence_ref_len"));
        }
        if limits.max_note_len == 0 {
            return Err(ConfigError::ZeroLimit("max_note_len"));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The zero address can never sign a transaction.
    #[error("genesis admin must not be the zero identity")]
    ZeroGenesisAdmin,

    /// A limit of zero would reject every non-empty value.
    #[error("{0} must be greater than zero")]
    ZeroLimit(&'static str),
}

/// Arguments of `create_batch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBatch {
    pub cooperative_id: String,
    pub product_type: String,
    pub quantity: u64,
    #[serde(default)]
    pub evidence_ref: String,
}

impl NewBatch {
    pub fn new(
        cooperative_id: impl Into<String>,
        product_type: impl Into<String>,
        quantity: u64,
        evidence_ref: impl Into<String>,
    ) -> Self {
        Self {
            cooperative_id: cooperative_id.into(),
            product_type: product_type.into(),
            quantity,
            evidence_ref: evidence_ref.into(),
        }
    }

    pub(crate) fn validate(&self, limits: &RegistryLimits) -> Result<(), RegistryError> {
        if self.quantity == 0 {
            return Err(RegistryError::invalid("quantity", "must be positive"));
        }
        require_label("cooperative_id", &self.cooperative_id, limits)?;
        require_label("product_type", &self.product_type, limits)?;
        require_max_len("evidence_ref", &self.evidence_ref, limits.max_evidence_ref_len)
    }
}

/// Arguments of `add_checkpoint`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCheckpoint {
    pub batch_id: BatchId,
    pub status: String,
    #[serde(default)]
    pub evidence_ref: String,
    #[serde(default)]
    pub note: String,
}

impl NewCheckpoint {
    pub fn new(
        batch_id: BatchId,
        status: impl Into<String>,
        evidence_ref: impl Into<String>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            batch_id,
            status: status.into(),
            evidence_ref: evidence_ref.into(),
            note: note.into(),
        }
    }

    pub(crate) fn validate(&self, limits: &RegistryLimits) -> Result<(), RegistryError> {
        require_label("status", &self.status, limits)?;
        require_max_len("evidence_ref", &self.evidence_ref, limits.max_evidence_ref_len)?;
        require_max_len("note", &self.note, limits.max_note_len)
    }
}

/// The closed set of state-mutating operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutation {
    AssignRole { target: Identity, role: Role },
    CreateBatch(NewBatch),
    AddCheckpoint(NewCheckpoint),
}

impl Mutation {
    /// Operation name used in logs and metrics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::AssignRole { .. } => "assign_role",
            Self::CreateBatch(_) => "create_batch",
            Self::AddCheckpoint(_) => "add_checkpoint",
        }
    }

    #[must_use]
    pub fn operation(&self) -> Operation {
        match self {
            Self::AssignRole { .. } => Operation::AssignRole,
            Self::CreateBatch(_) => Operation::CreateBatch,
            Self::AddCheckpoint(draft) => Operation::AddCheckpoint {
                batch_id: draft.batch_id,
            },
        }
    }
}

/// A mutation stripped to what authorization looks at. Lets a call whose
/// arguments failed to decode be checked like a well-formed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    AssignRole,
    CreateBatch,
    AddCheckpoint { batch_id: BatchId },
}

/// What a committed mutation produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Outcome {
    RoleAssigned {
        target: Identity,
        previous: Role,
        role: Role,
    },
    #[serde(rename_all = "camelCase")]
    BatchCreated {
        batch_id: BatchId,
    },
    #[serde(rename_all = "camelCase")]
    CheckpointAdded {
        batch_id: BatchId,
        index: u64,
    },
}

fn require_label(
    field: &'static str,
    value: &str,
    limits: &RegistryLimits,
) -> Result<(), RegistryError> {
    if value.trim().is_empty() {
        return Err(RegistryError::invalid(field, "must not be empty"));
    }
    require_max_len(field, value, limits.max_label_len)
}

fn require_max_len(field: &'static str, value: &str, max: usize) -> Result<(), RegistryError> {
    if value.len() > max {
        return Err(RegistryError::invalid(
            field,
            format!("length {} exceeds {}", value.len(), max),
        ));
    }
    Ok(())
}
