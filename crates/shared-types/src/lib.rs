//! # Shared Types Crate
//!
//! Domain vocabulary shared by every crate in the TraceCommunity workspace.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Records that cross crate boundaries
//!   (`Batch`, `Checkpoint`) and the identity/role vocabulary live here.
//! - **Envelope Integrity**: `Transaction<T>` is the sole wrapper for
//!   mutating calls. Its `sender` is the only identity the registry trusts.
//! - **Closed Role Set**: External role strings and hashes are converted to
//!   [`Role`] at the edge; nothing downstream handles untyped role values.

pub mod entities;
pub mod envelope;
pub mod errors;
pub mod roles;

pub use entities::*;
pub use envelope::Transaction;
pub use errors::*;
pub use roles::{Role, RoleId};
