//! # IPC Layer
//!
//! Wire format for mutating calls and the handler that turns them into
//! domain mutations. Identity comes from the envelope `sender` only.

pub mod handler;
pub mod payloads;

pub use handler::CommandHandler;
pub use payloads::{ReceiptStatus, RegistryCommand, TransactionReceipt};
