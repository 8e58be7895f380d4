//! # Core Domain Entities
//!
//! Records and identifiers that flow between the registry, the event bus
//! and external indexers.
//!
//! ## Clusters
//!
//! - **Identity**: `Identity`, a 20-byte account reference supplied by the host
//! - **Provenance**: `Batch`, `Checkpoint`, `BatchId`
//! - **Time**: `LogicalTime`, the host's notion of "now" at commit

use crate::errors::ParseIdentityError;
use crate::roles::Role;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 32-byte hash.
pub type Hash = [u8; 32];

/// Sequential batch identifier. The first batch ever created is 1.
pub type BatchId = u64;

/// Logical time at commit, in seconds. Supplied by the execution host.
pub type LogicalTime = u64;

/// Opaque account reference (public-key-derived address).
///
/// Serialized as a `0x`-prefixed lowercase hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity([u8; 20]);

impl Identity {
    /// Length of an identity in bytes.
    pub const LEN: usize = 20;

    /// Wrap raw address bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Raw address bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form keeps logs readable.
        write!(f, "Identity(0x{}..)", hex::encode(&self.0[..4]))
    }
}

impl FromStr for Identity {
    type Err = ParseIdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let bytes =
            hex::decode(digits).map_err(|_| ParseIdentityError::InvalidHex(s.to_string()))?;
        let array: [u8; 20] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| ParseIdentityError::InvalidLength {
                    expected: Self::LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self(array))
    }
}

impl TryFrom<String> for Identity {
    type Error = ParseIdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.to_string()
    }
}

/// One traceable lot of goods.
///
/// Immutable once created. Its custody history lives in the checkpoint
/// ledger, not on the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    /// Sequential identifier, starting at 1.
    pub id: BatchId,
    /// Identity that registered the batch.
    pub producer: Identity,
    /// Cooperative the lot belongs to.
    pub cooperative_id: String,
    /// Kind of goods.
    pub product_type: String,
    /// Always positive.
    pub quantity: u64,
    /// Logical time of creation.
    pub created_at: LogicalTime,
    /// Content address of off-system evidence. May be empty.
    pub evidence_ref: String,
}

/// One custody or inspection event recorded against a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    /// Batch this event belongs to.
    pub batch_id: BatchId,
    /// Role the actor held when the checkpoint was recorded.
    pub role: Role,
    /// Short free-form status, e.g. "collected" or "tested".
    pub status: String,
    /// Content address of off-system evidence. May be empty.
    pub evidence_ref: String,
    /// Free-form note.
    pub note: String,
    /// Identity that recorded the checkpoint.
    pub actor: Identity,
    /// Logical time of the append.
    pub timestamp: LogicalTime,
}
