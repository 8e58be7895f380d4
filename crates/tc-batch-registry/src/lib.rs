//! # Batch Provenance Registry (tc-batch-registry)
//!
//! A role-gated registry recording the provenance of agricultural batches
//! produced by cooperatives. Producers register batches; any participant
//! holding a role appends custody checkpoints; anyone reads.
//!
//! ## Responsibilities
//!
//! - Map identities to roles and let admins change that mapping
//! - Register batches with sequential, never-reused identifiers
//! - Keep an append-only, per-batch checkpoint history
//! - Publish one event per committed mutation, in commit order
//! - Serve consistent read-only views without blocking writers
//!
//! ## Flow
//!
//! ```text
//! Transaction<RegistryCommand> ──→ CommandHandler ──→ RegistryService::submit
//!                                                           │
//!                                     RegistryState::apply ←┘ (write lock held)
//!                                            │
//!                                            ↓
//!                                 EventPublisher::publish ──→ [Event Bus] ──→ indexers
//!
//! RegistryService::snapshot ──→ QueryFacade ──→ get_batch / get_checkpoint / history
//! ```
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement | Location |
//! |-----------|-------------|----------|
//! | Batch ids are 1, 2, 3, … with no gaps | Dense vector, push on success only | `domain/batches.rs` |
//! | Checkpoint histories only grow | No removal or update path exists | `domain/checkpoints.rs` |
//! | Recorded role is the caller's assigned role | Taken from `AccessGate::require_any_role` | `domain/checkpoints.rs` |
//! | Rejected calls change nothing | Validate fully, then mutate | `domain/state.rs` |
//! | Events follow commits, in order | Publish under the write lock | `service.rs` |
//! | Genesis admin is seeded silently | No event, no sequence number | `domain/state.rs` |
//!
//! ## Hexagonal Architecture
//!
//! - **Domain Layer** (`domain/`): Roles, batches, checkpoints; no I/O, no async
//! - **Ports Layer** (`ports/`): `ProvenanceRegistryApi`, `TimeSource`
//! - **IPC Layer** (`ipc/`): Command envelopes and receipts
//! - **Adapters Layer** (`adapters/`): Clocks and the JSON query handler
//!
//! ## Security
//!
//! - **Envelope-Only Identity**: Payloads carry no caller identity
//! - **No Caller-Asserted Roles**: A claimed checkpoint role is logged if it
//!   disagrees with the assignment, and never recorded

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod domain;
pub mod ipc;
pub mod ports;
pub mod query;
pub mod service;

// Re-export main types for convenience
pub use adapters::{
    handle_api_query, ApiGatewayHandler, ApiQueryError, ManualTimeSource, RegistryMetrics,
    SystemTimeSource,
};
pub use domain::{
    AccessGate, BatchStore, CheckpointLedger, ConfigError, ErrorKind, Mutation, NewBatch,
    NewCheckpoint, Operation, Outcome, RegistryConfig, RegistryError, RegistryErrorPayload,
    RegistryLimits, RegistryState, RoleLookup, RoleManager, RoleRequirement,
};
pub use ipc::{CommandHandler, ReceiptStatus, RegistryCommand, TransactionReceipt};
pub use ports::{ProvenanceRegistryApi, TimeSource};
pub use query::{BatchHistory, CheckpointIter, QueryFacade};
pub use service::{Applied, RegistryService, ServiceStats};
