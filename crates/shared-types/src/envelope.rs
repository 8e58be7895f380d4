//! # `Transaction` Envelope
//!
//! The universal wrapper for every mutating call into the registry.
//!
//! ## Properties
//!
//! - **Versioning**: All envelopes carry a `version` for forward compatibility.
//! - **Correlation**: Receipts echo the `correlation_id` of their transaction.
//! - **Envelope Authority**: `sender` is the sole source of truth for the
//!   caller's identity. Payloads MUST NOT duplicate it.
//! - **Logical Time**: `timestamp` is the host's commit time. When absent the
//!   executor's own clock is used.

use crate::entities::{Identity, LogicalTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A mutating call, as delivered by the execution host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction<T> {
    /// Envelope format version.
    #[serde(default = "current_version")]
    pub version: u16,

    /// Unique identifier echoed in the receipt.
    #[serde(default = "Uuid::new_v4")]
    pub correlation_id: Uuid,

    /// Caller identity, authenticated by the host.
    pub sender: Identity,

    /// Logical commit time supplied by the host, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<LogicalTime>,

    /// The call itself.
    pub payload: T,
}

fn current_version() -> u16 {
    1
}

impl<T> Transaction<T> {
    /// Current envelope version.
    pub const CURRENT_VERSION: u16 = 1;

    /// Wrap a payload with a fresh correlation id and no host timestamp.
    pub fn new(sender: Identity, payload: T) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            correlation_id: Uuid::new_v4(),
            sender,
            timestamp: None,
            payload,
        }
    }

    /// Pin the logical commit time.
    #[must_use]
    pub fn at(mut self, timestamp: LogicalTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Whether this executor understands the envelope format.
    #[must_use]
    pub fn is_supported_version(&self) -> bool {
        self.version == Self::CURRENT_VERSION
    }
}
