//! # TraceCommunity Node
//!
//! Hosts a single provenance registry. Transactions arrive as JSON lines
//! (one `Transaction<RegistryCommand>` per line), are executed strictly in
//! log order, and produce one receipt line each on stdout. An indexer task
//! follows the event bus and logs every committed change.
//!
//! ## Modules
//!
//! - `config` - CLI flags and environment, resolved into [`NodeConfig`]
//! - `logging` - tracing subscriber setup
//! - `runtime` - [`NodeRuntime`]: replay, indexer, history dumps

pub mod config;
pub mod logging;
pub mod runtime;

pub use config::{NodeArgs, NodeConfig, NodeConfigError};
pub use runtime::{IndexerSummary, NodeRuntime, ReplaySummary};
