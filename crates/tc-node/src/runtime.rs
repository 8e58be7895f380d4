//! # Node Runtime
//!
//! Wires the registry to its event bus, replays transactions in log order,
//! and runs an indexer that follows the event stream.
//!
//! ## Startup Sequence
//!
//! 1. Validate configuration
//! 2. Create the event bus and the registry (genesis admin seeded)
//! 3. Spawn the indexer (subscribes before the first transaction)
//! 4. Replay the transaction log, one receipt per line
//! 5. Print requested batch histories
//! 6. Signal shutdown; the indexer drains what is buffered and exits

use crate::config::NodeConfig;
use anyhow::{Context, Result};
use serde::Serialize;
use shared_bus::{EventFilter, InMemoryEventBus, RegistryEvent};
use shared_types::{BatchId, Transaction};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tc_batch_registry::{
    CommandHandler, RegistryCommand, RegistryErrorPayload, RegistryService, SystemTimeSource,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

/// Totals of one replay run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    /// Non-blank, non-comment lines read.
    pub transactions: u64,
    pub committed: u64,
    pub rejected: u64,
    /// Lines that did not decode as a transaction.
    pub malformed: u64,
}

/// What the indexer saw.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct IndexerSummary {
    pub events: u64,
    pub last_sequence: u64,
    /// Times the next sequence was not `last_sequence + 1`.
    pub gaps: u64,
}

/// A line that could not be decoded.
#[derive(Debug, Serialize)]
struct MalformedLine<'a> {
    line: u64,
    error: &'a str,
}

/// History output for one requested batch.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum HistoryLine {
    Found(tc_batch_registry::BatchHistory),
    Missing {
        #[serde(rename = "batchId")]
        batch_id: BatchId,
        error: RegistryErrorPayload,
    },
}

pub struct NodeRuntime {
    config: NodeConfig,
    bus: Arc<InMemoryEventBus>,
    service: Arc<RegistryService>,
    handler: CommandHandler,
    shutdown_tx: watch::Sender<bool>,
}

impl NodeRuntime {
    pub fn new(config: NodeConfig) -> Result<Self> {
        config.validate().context("Invalid node configuration")?;

        let bus = Arc::new(InMemoryEventBus::with_capacity(config.event_capacity));
        let service = Arc::new(
            RegistryService::new(config.registry.clone(), bus.clone(), Arc::new(SystemTimeSource))
                .context("Failed to create registry")?,
        );
        let handler = CommandHandler::new(Arc::clone(&service));
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            config,
            bus,
            service,
            handler,
            shutdown_tx,
        })
    }

    #[must_use]
    pub fn service(&self) -> Arc<RegistryService> {
        Arc::clone(&self.service)
    }

    #[must_use]
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Follow the event stream until shutdown, logging every event.
    pub fn spawn_indexer(&self) -> JoinHandle<IndexerSummary> {
        let mut stream = self.bus.event_stream(EventFilter::all());
        let mut shutdown = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let mut summary = IndexerSummary::default();
            loop {
                tokio::select! {
                    biased;
                    event = stream.next() => match event {
                        Some(event) => index_event(&mut summary, &event),
                        None => break,
                    },
                    _ = shutdown.changed() => {
                        info!("[indexer] Shutdown signal received");
                        break;
                    }
                }
            }
            if stream.missed() > 0 {
                warn!(missed = stream.missed(), "[indexer] Lagged behind the event bus");
            }
            summary
        })
    }

    /// Replay the configured log, or stdin when none is configured.
    pub async fn replay_configured<W: Write>(&self, out: &mut W) -> Result<ReplaySummary> {
        match self.config.tx_log.clone() {
            Some(path) => self.replay_file(&path, out).await,
            None => {
                info!("Reading transactions from stdin");
                self.replay(tokio::io::BufReader::new(tokio::io::stdin()), out)
                    .await
            }
        }
    }

    pub async fn replay_file<W: Write>(&self, path: &Path, out: &mut W) -> Result<ReplaySummary> {
        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("Failed to open transaction log {}", path.display()))?;
        info!(path = %path.display(), "Replaying transaction log");
        self.replay(tokio::io::BufReader::new(file), out).await
    }

    /// Apply every JSON line of `reader` in order and write one JSON line
    /// per transaction to `out`. Blank lines and `#` comments are skipped.
    pub async fn replay<R, W>(&self, reader: R, out: &mut W) -> Result<ReplaySummary>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut summary = ReplaySummary::default();
        let mut lines = reader.lines();
        let mut line_no = 0u64;

        while let Some(line) = lines.next_line().await.context("Failed to read transaction log")? {
            line_no += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            summary.transactions += 1;

            let tx: Transaction<RegistryCommand> = match serde_json::from_str(trimmed) {
                Ok(tx) => tx,
                Err(e) => {
                    warn!(line = line_no, error = %e, "Malformed transaction");
                    summary.malformed += 1;
                    let error = e.to_string();
                    write_json_line(out, &MalformedLine { line: line_no, error: &error })?;
                    continue;
                }
            };

            let receipt = self.handler.handle(tx).await;
            if receipt.is_committed() {
                summary.committed += 1;
            } else {
                summary.rejected += 1;
            }
            write_json_line(out, &receipt)?;
        }

        info!(
            transactions = summary.transactions,
            committed = summary.committed,
            rejected = summary.rejected,
            malformed = summary.malformed,
            "Replay finished"
        );
        Ok(summary)
    }

    /// Print the history of every batch named in `query_batches`.
    pub async fn dump_histories<W: Write>(&self, out: &mut W) -> Result<()> {
        if self.config.query_batches.is_empty() {
            return Ok(());
        }
        let view = self.service.snapshot().await;
        for &batch_id in &self.config.query_batches {
            let line = match view.history(batch_id) {
                Ok(history) => HistoryLine::Found(history),
                Err(e) => HistoryLine::Missing {
                    batch_id,
                    error: e.into(),
                },
            };
            write_json_line(out, &line)?;
        }
        Ok(())
    }

    /// Signal the indexer to stop once it has drained buffered events.
    pub fn shutdown(&self) {
        info!("Initiating shutdown");
        // No receivers simply means the indexer was never started.
        let _ = self.shutdown_tx.send(true);
    }
}

fn index_event(summary: &mut IndexerSummary, event: &RegistryEvent) {
    let sequence = event.sequence();
    if summary.events > 0 && sequence != summary.last_sequence + 1 {
        warn!(
            expected = summary.last_sequence + 1,
            got = sequence,
            "[indexer] Sequence gap"
        );
        summary.gaps += 1;
    }
    summary.events += 1;
    summary.last_sequence = sequence;

    match event {
        RegistryEvent::RoleChanged {
            admin,
            target,
            previous,
            role,
            ..
        } => info!(sequence, %admin, %target, %previous, %role, "[indexer] Role changed"),
        RegistryEvent::BatchCreated { batch, .. } => info!(
            sequence,
            batch_id = batch.id,
            producer = %batch.producer,
            product = %batch.product_type,
            quantity = batch.quantity,
            "[indexer] Batch created"
        ),
        RegistryEvent::CheckpointAdded {
            index, checkpoint, ..
        } => info!(
            sequence,
            batch_id = checkpoint.batch_id,
            index,
            role = %checkpoint.role,
            status = %checkpoint.status,
            "[indexer] Checkpoint added"
        ),
    }
    debug!(?event, "[indexer] Event payload");
}

fn write_json_line<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, value).context("Failed to encode output")?;
    writeln!(out).context("Failed to write output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::Identity;

    const ADMIN: &str = "0x00000000000000000000000000000000000000ad";
    const PRODUCER: &str = "0x000000000000000000000000000000000000000a";
    const TRANSPORTER: &str = "0x000000000000000000000000000000000000000b";

    fn runtime(query_batches: Vec<BatchId>) -> NodeRuntime {
        let admin: Identity = ADMIN.parse().unwrap();
        let mut config = NodeConfig::new(admin);
        config.query_batches = query_batches;
        NodeRuntime::new(config).unwrap()
    }

    fn log() -> String {
        [
            format!(r#"{{"sender":"{ADMIN}","payload":{{"type":"assignRole","target":"{PRODUCER}","role":"PRODUCER"}}}}"#),
            "# comment lines are skipped".to_string(),
            String::new(),
            format!(r#"{{"sender":"{PRODUCER}","timestamp":1700000000,"payload":{{"type":"createBatch","cooperativeId":"COOP-1","productType":"Coffee","quantity":500,"evidenceRef":"ev1"}}}}"#),
            format!(r#"{{"sender":"{ADMIN}","payload":{{"type":"assignRole","target":"{TRANSPORTER}","role":"0x{}"}}}}"#, "cafe".repeat(16)),
            format!(r#"{{"sender":"{TRANSPORTER}","payload":{{"type":"addCheckpoint","batchId":1,"status":"collected"}}}}"#),
            "not json".to_string(),
        ]
        .join("\n")
    }

    fn output_lines(out: &[u8]) -> Vec<serde_json::Value> {
        String::from_utf8_lossy(out)
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_replay_writes_one_line_per_transaction() {
        let runtime = runtime(vec![]);
        let mut out = Vec::new();
        let summary = runtime
            .replay(tokio::io::BufReader::new(log().as_bytes()), &mut out)
            .await
            .unwrap();

        assert_eq!(
            summary,
            ReplaySummary {
                transactions: 5,
                committed: 2,
                rejected: 2,
                malformed: 1,
            }
        );

        let lines = output_lines(&out);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0]["status"], "committed");
        assert_eq!(lines[1]["outcome"]["batchId"], 1);
        // Unknown role hash is rejected at the boundary.
        assert_eq!(lines[2]["error"]["kind"], "InvalidInput");
        // So the transporter still holds no role.
        assert_eq!(lines[3]["error"]["kind"], "Unauthorized");
        assert_eq!(lines[4]["line"], 7);
    }

    #[tokio::test]
    async fn test_dump_histories() {
        let runtime = runtime(vec![1, 9]);
        let mut out = Vec::new();
        runtime
            .replay(tokio::io::BufReader::new(log().as_bytes()), &mut out)
            .await
            .unwrap();

        let mut dump = Vec::new();
        runtime.dump_histories(&mut dump).await.unwrap();
        let lines = output_lines(&dump);
        assert_eq!(lines[0]["batch"]["createdAt"], 1_700_000_000u64);
        assert_eq!(lines[0]["checkpoints"].as_array().map(Vec::len), Some(0));
        assert_eq!(lines[1]["batchId"], 9);
        assert_eq!(lines[1]["error"]["kind"], "NotFound");
    }

    #[tokio::test]
    async fn test_indexer_drains_before_exit() {
        let runtime = runtime(vec![]);
        let indexer = runtime.spawn_indexer();

        let mut out = Vec::new();
        runtime
            .replay(tokio::io::BufReader::new(log().as_bytes()), &mut out)
            .await
            .unwrap();
        runtime.shutdown();

        let summary = indexer.await.unwrap();
        assert_eq!(summary.events, 2);
        assert_eq!(summary.last_sequence, 2);
        assert_eq!(summary.gaps, 0);
    }

    #[test]
    fn test_index_event_detects_gaps() {
        let mut summary = IndexerSummary::default();
        let event = |sequence| RegistryEvent::RoleChanged {
            sequence,
            admin: Identity::default(),
            target: Identity::default(),
            previous: shared_types::Role::None,
            role: shared_types::Role::Buyer,
            at: 0,
        };
        index_event(&mut summary, &event(1));
        index_event(&mut summary, &event(2));
        index_event(&mut summary, &event(5));
        assert_eq!(summary.gaps, 1);
        assert_eq!(summary.last_sequence, 5);
    }
}
