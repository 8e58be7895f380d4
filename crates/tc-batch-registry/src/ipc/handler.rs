//! # Command Handler
//!
//! Decodes `Transaction<RegistryCommand>` envelopes into domain mutations
//! and submits them in arrival order.
//!
//! An unsupported envelope version is `InvalidInput` outright. Argument
//! problems found while decoding (role strings, quantity range) are also
//! `InvalidInput`, but only once the caller has passed the same existence
//! and role checks the registry would apply. Every rejection, wherever it
//! happens, is counted in the service stats.

use crate::domain::{
    Mutation, NewBatch, NewCheckpoint, Outcome, RegistryError, RegistryErrorPayload,
};
use crate::ipc::payloads::{ReceiptStatus, RegistryCommand, TransactionReceipt};
use crate::service::{Applied, RegistryService};
use serde_json::Number;
use shared_types::{Identity, Role, Transaction};
use std::sync::Arc;
use tracing::{instrument, warn};

pub struct CommandHandler {
    service: Arc<RegistryService>,
}

impl CommandHandler {
    pub fn new(service: Arc<RegistryService>) -> Self {
        Self { service }
    }

    #[must_use]
    pub fn service(&self) -> &Arc<RegistryService> {
        &self.service
    }

    /// Execute a transaction and wrap the result in a receipt.
    pub async fn handle(&self, tx: Transaction<RegistryCommand>) -> TransactionReceipt {
        let correlation_id = tx.correlation_id;
        let sender = tx.sender;
        let status = match self.execute(tx).await {
            Ok(applied) => ReceiptStatus::Committed {
                sequence: applied.sequence,
                outcome: applied.outcome,
            },
            Err(err) => ReceiptStatus::Rejected {
                error: RegistryErrorPayload::from(err),
            },
        };
        TransactionReceipt {
            correlation_id,
            sender,
            status,
        }
    }

    /// Execute a transaction.
    #[instrument(
        skip(self, tx),
        fields(correlation_id = %tx.correlation_id, op = tx.payload.name())
    )]
    pub async fn execute(&self, tx: Transaction<RegistryCommand>) -> Result<Applied, RegistryError> {
        if !tx.is_supported_version() {
            warn!(version = tx.version, "Unsupported envelope version");
            let err = RegistryError::invalid(
                "version",
                format!("unsupported envelope version {}", tx.version),
            );
            return Err(self.service.reject(err).await);
        }

        let sender = tx.sender;
        let op = tx.payload.operation();
        let (mutation, claimed_role) = match into_mutation(tx.payload) {
            Ok(decoded) => decoded,
            Err(err) => return Err(self.service.reject_malformed(&sender, op, err).await),
        };
        let applied = self.service.submit(sender, tx.timestamp, mutation).await?;

        if let (Some(claimed), Outcome::CheckpointAdded { batch_id, index }) =
            (claimed_role, &applied.outcome)
        {
            self.check_claimed_role(&sender, claimed, *batch_id, *index)
                .await;
        }
        Ok(applied)
    }

    /// Compare a claimed role with the role actually recorded. Mismatches
    /// are logged and counted, never rejected.
    async fn check_claimed_role(&self, sender: &Identity, claimed: Role, batch_id: u64, index: u64) {
        let view = self.service.snapshot().await;
        let Ok(checkpoint) = view.get_checkpoint(batch_id, index) else {
            return;
        };
        let recorded = checkpoint.role;
        if claimed != recorded {
            warn!(
                sender = %sender,
                claimed = %claimed,
                recorded = %recorded,
                batch_id,
                index,
                "Checkpoint role label does not match the caller's role; recorded assigned role"
            );
            self.service.record_role_label_mismatch().await;
        }
    }
}

/// Turn a wire command into a mutation, plus the claimed checkpoint role if
/// one was supplied.
fn into_mutation(command: RegistryCommand) -> Result<(Mutation, Option<Role>), RegistryError> {
    match command {
        RegistryCommand::AssignRole { target, role } => {
            Ok((Mutation::AssignRole { target, role: parse_role(&role)? }, None))
        }
        RegistryCommand::CreateBatch {
            cooperative_id,
            product_type,
            quantity,
            evidence_ref,
        } => {
            let quantity = wire_quantity(&quantity)?;
            Ok((
                Mutation::CreateBatch(NewBatch::new(
                    cooperative_id,
                    product_type,
                    quantity,
                    evidence_ref,
                )),
                None,
            ))
        }
        RegistryCommand::AddCheckpoint {
            batch_id,
            role,
            status,
            evidence_ref,
            note,
        } => {
            let claimed = role.as_deref().map(parse_role).transpose()?;
            Ok((
                Mutation::AddCheckpoint(NewCheckpoint::new(batch_id, status, evidence_ref, note)),
                claimed,
            ))
        }
    }
}

/// Non-positive values become 0, which the registry rejects after its role
/// check. Positive values must be whole and fit in 64 bits.
fn wire_quantity(raw: &Number) -> Result<u64, RegistryError> {
    if let Some(quantity) = raw.as_u64() {
        return Ok(quantity);
    }
    if raw.as_i64().is_some() {
        return Ok(0);
    }
    match raw.as_f64() {
        Some(value) if value <= 0.0 => Ok(0),
        _ => Err(RegistryError::invalid(
            "quantity",
            format!("{raw} is not a whole number below 2^64"),
        )),
    }
}

fn parse_role(raw: &str) -> Result<Role, RegistryError> {
    Role::parse(raw).map_err(|e| RegistryError::invalid("role", e.to_string()))
}
