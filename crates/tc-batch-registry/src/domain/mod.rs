//! # Domain Layer (Inner Hexagon)
//!
//! Roles, batches and the checkpoint ledger.
//! NO I/O, NO async, NO locking.
//!
//! - Dependencies point inward only: the service and adapters depend on this
//!   module, never the reverse.
//! - Each store validates before it mutates, so errors leave no trace.

pub mod access;
pub mod batches;
pub mod checkpoints;
pub mod errors;
pub mod roles;
pub mod state;
pub mod value_objects;

pub use access::{AccessGate, RoleLookup};
pub use batches::BatchStore;
pub use checkpoints::CheckpointLedger;
pub use errors::{ErrorKind, RegistryError, RegistryErrorPayload, RoleRequirement};
pub use roles::RoleManager;
pub use state::{Commit, RegistryState};
pub use value_objects::*;
