//! # Node Configuration
//!
//! Command-line flags with environment fallbacks, resolved into a validated
//! [`NodeConfig`].
//!
//! | Flag | Environment | Default |
//! |------|-------------|---------|
//! | `--genesis-admin` | `TC_GENESIS_ADMIN` | required |
//! | `--tx-log` | `TC_TX_LOG` | stdin |
//! | `--event-capacity` | `TC_EVENT_CAPACITY` | 1000 |
//! | `--query-batch` | `TC_QUERY_BATCH` | none |
//! | `--log-level` | `TC_LOG_LEVEL` | `info` |
//! | `--json-logs` | `TC_JSON_LOGS` | off |

use clap::Parser;
use shared_types::{BatchId, Identity};
use std::path::PathBuf;
use tc_batch_registry::{ConfigError, RegistryConfig, RegistryLimits};
use thiserror::Error;

/// TraceCommunity node: replays registry transactions and indexes events.
#[derive(Parser, Debug, Clone)]
#[command(name = "tc-node")]
#[command(about = "Replay provenance registry transactions and print receipts")]
pub struct NodeArgs {
    /// Identity that starts out as the only Admin (0x-prefixed hex)
    #[arg(long, env = "TC_GENESIS_ADMIN")]
    pub genesis_admin: Identity,

    /// JSON-lines transaction log; reads stdin when omitted
    #[arg(long, env = "TC_TX_LOG")]
    pub tx_log: Option<PathBuf>,

    /// Events buffered per subscriber before it lags
    #[arg(long, env = "TC_EVENT_CAPACITY", default_value_t = shared_bus::DEFAULT_CHANNEL_CAPACITY)]
    pub event_capacity: usize,

    /// Batch whose full history is printed after replay (repeatable)
    #[arg(long = "query-batch", env = "TC_QUERY_BATCH", value_delimiter = ',')]
    pub query_batches: Vec<BatchId>,

    /// Maximum length of cooperative id, product type and status
    #[arg(long, default_value_t = RegistryLimits::default().max_label_len)]
    pub max_label_len: usize,

    /// Maximum length of evidence references
    #[arg(long, default_value_t = RegistryLimits::default().max_evidence_ref_len)]
    pub max_evidence_ref_len: usize,

    /// Maximum length of checkpoint notes
    #[arg(long, default_value_t = RegistryLimits::default().max_note_len)]
    pub max_note_len: usize,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "TC_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, env = "TC_JSON_LOGS")]
    pub json_logs: bool,
}

/// Resolved node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub registry: RegistryConfig,
    /// Transaction source; `None` means stdin.
    pub tx_log: Option<PathBuf>,
    pub event_capacity: usize,
    /// Batches to print after replay.
    pub query_batches: Vec<BatchId>,
}

impl NodeConfig {
    /// Configuration with defaults for everything but the admin.
    #[must_use]
    pub fn new(genesis_admin: Identity) -> Self {
        Self {
            registry: RegistryConfig::new(genesis_admin),
            tx_log: None,
            event_capacity: shared_bus::DEFAULT_CHANNEL_CAPACITY,
            query_batches: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), NodeConfigError> {
        if self.event_capacity == 0 {
            return Err(NodeConfigError::ZeroEventCapacity);
        }
        self.registry.validate()?;
        Ok(())
    }
}

impl TryFrom<NodeArgs> for NodeConfig {
    type Error = NodeConfigError;

    fn try_from(args: NodeArgs) -> Result<Self, Self::Error> {
        let config = Self {
            registry: RegistryConfig {
                genesis_admin: args.genesis_admin,
                limits: RegistryLimits {
                    max_label_len: args.max_label_len,
                    max_evidence_ref_len: args.max_evidence_ref_len,
                    max_note_len: args.max_note_len,
                },
            },
            tx_log: args.tx_log,
            event_capacity: args.event_capacity,
            query_batches: args.query_batches,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum NodeConfigError {
    #[error("event capacity must be greater than zero")]
    ZeroEventCapacity,

    #[error(transparent)]
    Registry(#[from] ConfigError),
}
