//! # API Gateway Handler
//!
//! JSON query surface for dashboards and admin tooling. Read-only: every
//! method answers from a single snapshot and never mutates the registry.
//!
//! ```text
//! Dashboard → gateway → ApiGatewayHandler → RegistryService::snapshot()
//! ```

use crate::domain::{ErrorKind, RegistryError};
use crate::service::RegistryService;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared_types::{BatchId, Identity, Role};
use std::sync::Arc;

/// Error from API query handling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiQueryError {
    pub code: i32,
    pub message: String,
}

impl ApiQueryError {
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const UNAUTHORIZED: i32 = -32001;
    pub const NOT_FOUND: i32 = -32004;

    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: Self::METHOD_NOT_FOUND,
            message: format!("Method not found: {}", method),
        }
    }

    pub fn invalid_params(msg: &str) -> Self {
        Self {
            code: Self::INVALID_PARAMS,
            message: msg.to_string(),
        }
    }
}

impl From<RegistryError> for ApiQueryError {
    fn from(err: RegistryError) -> Self {
        let code = match err.kind() {
            ErrorKind::Unauthorized => Self::UNAUTHORIZED,
            ErrorKind::NotFound => Self::NOT_FOUND,
            ErrorKind::InvalidInput => Self::INVALID_PARAMS,
        };
        Self {
            code,
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for ApiQueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiQueryError {}

/// Metrics for the admin panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryMetrics {
    /// Commit sequence of the latest state.
    pub sequence: u64,
    /// Batches created so far.
    pub batch_count: u64,
    /// Checkpoints across all batches.
    pub checkpoint_count: u64,
    /// Identities holding any role.
    pub assigned_identities: usize,
    /// Identities holding `Admin`.
    pub admin_count: usize,
    pub mutations_committed: u64,
    pub mutations_rejected: u64,
    pub rejected_unauthorized: u64,
    pub role_label_mismatches: u64,
    pub events_published: u64,
}

/// API Gateway handler for the registry.
pub struct ApiGatewayHandler {
    service: Arc<RegistryService>,
}

impl ApiGatewayHandler {
    pub fn new(service: Arc<RegistryService>) -> Self {
        Self { service }
    }

    /// Handle ping request (health check).
    pub fn handle_ping(&self) -> Value {
        json!({
            "status": "ok",
            "subsystem": "tc-batch-registry"
        })
    }

    /// Handle get_metrics request.
    pub async fn handle_get_metrics(&self) -> Value {
        let view = self.service.snapshot().await;
        let stats = self.service.stats().await;
        let roles = view.roles();

        let metrics = RegistryMetrics {
            sequence: view.sequence(),
            batch_count: view.batch_count(),
            checkpoint_count: view.total_checkpoints(),
            assigned_identities: roles.assigned_count(),
            admin_count: roles.holders(Role::Admin).count(),
            mutations_committed: stats.mutations_committed,
            mutations_rejected: stats.rejected(),
            rejected_unauthorized: stats.rejected_unauthorized,
            role_label_mismatches: stats.role_label_mismatches,
            events_published: self.service.events_published(),
        };

        serde_json::to_value(metrics).unwrap_or_default()
    }

    /// Handle role_of. The response carries both encodings of the role.
    pub async fn handle_role_of(&self, identity: Identity) -> Value {
        let role = self.service.snapshot().await.role_of(&identity);
        json!({
            "identity": identity,
            "role": role,
            "roleId": format!("0x{}", hex::encode(role.id())),
        })
    }

    pub async fn handle_get_batch(&self, batch_id: BatchId) -> Result<Value, ApiQueryError> {
        let view = self.service.snapshot().await;
        let batch = view.get_batch(batch_id)?;
        Ok(serde_json::to_value(batch).unwrap_or_default())
    }

    pub async fn handle_get_checkpoints_count(
        &self,
        batch_id: BatchId,
    ) -> Result<Value, ApiQueryError> {
        let count = self.service.snapshot().await.checkpoint_count(batch_id)?;
        Ok(json!({ "batchId": batch_id, "count": count }))
    }

    pub async fn handle_get_checkpoint(
        &self,
        batch_id: BatchId,
        index: u64,
    ) -> Result<Value, ApiQueryError> {
        let view = self.service.snapshot().await;
        let checkpoint = view.get_checkpoint(batch_id, index)?;
        Ok(serde_json::to_value(checkpoint).unwrap_or_default())
    }

    /// Batch plus every checkpoint, in one consistent read.
    pub async fn handle_get_batch_history(&self, batch_id: BatchId) -> Result<Value, ApiQueryError> {
        let history = self.service.snapshot().await.history(batch_id)?;
        Ok(serde_json::to_value(history).unwrap_or_default())
    }
}

/// Handle an API query.
///
/// ## Supported Methods
///
/// - `ping`: Health check
/// - `get_metrics`: Registry metrics for the admin panel
/// - `role_of`: Role of `identity`
/// - `get_batch`: Batch record by `batch_id`
/// - `get_checkpoints_count`: Checkpoint count for `batch_id`
/// - `get_checkpoint`: Checkpoint by `batch_id` and `index`
/// - `get_batch_history`: Batch record with all its checkpoints
pub async fn handle_api_query(
    handler: &ApiGatewayHandler,
    method: &str,
    params: &Value,
) -> Result<Value, ApiQueryError> {
    match method {
        "ping" => Ok(handler.handle_ping()),
        "get_metrics" => Ok(handler.handle_get_metrics().await),
        "role_of" => {
            let identity = parse_identity_param(params, "identity")?;
            Ok(handler.handle_role_of(identity).await)
        }
        "get_batch" => {
            let batch_id = parse_u64_param(params, "batch_id")?;
            handler.handle_get_batch(batch_id).await
        }
        "get_checkpoints_count" => {
            let batch_id = parse_u64_param(params, "batch_id")?;
            handler.handle_get_checkpoints_count(batch_id).await
        }
        "get_checkpoint" => {
            let batch_id = parse_u64_param(params, "batch_id")?;
            let index = parse_u64_param(params, "index")?;
            handler.handle_get_checkpoint(batch_id, index).await
        }
        "get_batch_history" => {
            let batch_id = parse_u64_param(params, "batch_id")?;
            handler.handle_get_batch_history(batch_id).await
        }
        _ => Err(ApiQueryError::method_not_found(method)),
    }
}

fn parse_u64_param(params: &Value, name: &str) -> Result<u64, ApiQueryError> {
    params
        .get(name)
        .and_then(Value::as_u64)
        .ok_or_else(|| {
            ApiQueryError::invalid_params(&format!("Missing or non-integer {} parameter", name))
        })
}

fn parse_identity_param(params: &Value, name: &str) -> Result<Identity, ApiQueryError> {
    let raw = params
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| ApiQueryError::invalid_params(&format!("Missing {} parameter", name)))?;

    raw.parse()
        .map_err(|e| ApiQueryError::invalid_params(&format!("Invalid {}: {}", name, e)))
}
