//! Read and write contracts of the remote record store.
//!
//! The aggregator and submitter depend only on these traits. The JSON-RPC
//! implementation lives in [`crate::rpc`]; tests substitute in-memory
//! fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use evms_core::{EvidenceRecord, ObjectId, RecordIndex, SystemState};

use crate::error::StoreError;

/// Read-only access to the store.
///
/// No caching and no retries happen at this layer.
#[async_trait]
pub trait RecordReader: Send + Sync {
    /// Fetch the root descriptor. Fails with [`StoreError::NotFound`] if the
    /// object or its expected fields are absent, and with a transport-class
    /// error if the call itself fails.
    async fn get_system_state(&self, id: &ObjectId) -> Result<SystemState, StoreError>;

    /// Fetch the record at `index` of `table`. `Ok(None)` means the table
    /// has no entry at that index, which is an expected outcome.
    async fn get_record_at(
        &self,
        table: &ObjectId,
        index: RecordIndex,
    ) -> Result<Option<EvidenceRecord>, StoreError>;
}

/// Description of one Move call, handed to a signer to serialize and sign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveCall {
    pub package: ObjectId,
    pub module: String,
    pub function: String,
    /// Call arguments in store JSON form, in parameter order.
    pub arguments: Vec<serde_json::Value>,
    /// Fee ceiling in MIST.
    pub gas_budget: u64,
}

impl MoveCall {
    /// Fully qualified target, `package::module::function`.
    pub fn target(&self) -> String {
        format!("{}::{}::{}", self.package, self.module, self.function)
    }
}

/// Serialized transaction plus the signature over it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// Base64 transaction bytes.
    pub tx_bytes: String,
    /// Base64 serialized signature.
    pub signature: String,
}

/// Whether an executed transaction took effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionStatus {
    Success,
    Failure { error: String },
}

/// Result of executing a signed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub digest: String,
    pub status: ExecutionStatus,
    /// Number of events the transaction emitted.
    pub event_count: usize,
}

/// Write access to the store.
#[async_trait]
pub trait TransactionExecutor: Send + Sync {
    /// Submit a signed transaction and wait for its effects.
    async fn execute(&self, tx: &SignedTransaction) -> Result<TransactionReceipt, StoreError>;
}
