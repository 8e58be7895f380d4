//! # TraceCommunity Node
//!
//! Replays a transaction log against a fresh registry.
//!
//! ```text
//! tc-node --genesis-admin 0x…ad --tx-log txs.jsonl --query-batch 1
//! ```
//!
//! Receipts and histories go to stdout, logs to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use tc_node::{logging, NodeArgs, NodeConfig, NodeRuntime};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let args = NodeArgs::parse();
    logging::init(&args.log_level, args.json_logs).context("Failed to initialize logging")?;

    let config = NodeConfig::try_from(args).context("Invalid configuration")?;
    info!(
        genesis_admin = %config.registry.genesis_admin,
        event_capacity = config.event_capacity,
        "Starting TraceCommunity node"
    );

    let runtime = NodeRuntime::new(config)?;
    let indexer = runtime.spawn_indexer();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let replay = runtime.replay_configured(&mut out).await?;
    runtime.dump_histories(&mut out).await?;
    out.flush().context("Failed to flush stdout")?;

    runtime.shutdown();
    match indexer.await {
        Ok(summary) => info!(
            events = summary.events,
            last_sequence = summary.last_sequence,
            gaps = summary.gaps,
            "Indexer stopped"
        ),
        Err(e) => warn!(error = %e, "Indexer task failed"),
    }

    let stats = runtime.service().stats().await;
    info!(
        committed = replay.committed,
        rejected = replay.rejected,
        malformed = replay.malformed,
        role_label_mismatches = stats.role_label_mismatches,
        "Node shutdown complete"
    );
    Ok(())
}
