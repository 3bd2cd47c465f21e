//! Record submission: validate a draft, describe the append call, have it
//! signed, execute it.
//!
//! Validation runs before anything else, so a draft that fails it never
//! reaches the signer or the network. A submission is attempted exactly
//! once; failures are reported verbatim and never retried.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use evms_core::{DraftField, EvidenceDraft, ObjectId, ValidatedEvidence, ValidationError};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::store::{
    ExecutionStatus, MoveCall, SignedTransaction, TransactionExecutor, TransactionReceipt,
};

/// Errors from a signing identity.
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    /// The identity declined to sign.
    #[error("signature rejected: {0}")]
    Rejected(String),

    /// No identity is connected, or it could not be reached.
    #[error("signer unavailable: {0}")]
    Unavailable(String),

    /// The call could not be serialized into a transaction.
    #[error("could not build transaction: {0}")]
    Build(#[from] StoreError),
}

/// A connected identity that can serialize and sign a call description.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    async fn sign_transaction(&self, call: &MoveCall) -> Result<SignedTransaction, SignerError>;
}

/// Errors from [`Submitter::submit`].
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// A draft field failed local validation. Nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Signing, transport or on-chain execution failed.
    #[error("{reason}")]
    Write { reason: String },
}

impl SubmitError {
    /// The offending field, for validation failures.
    pub fn field(&self) -> Option<DraftField> {
        match self {
            Self::Validation(e) => Some(e.field),
            Self::Write { .. } => None,
        }
    }
}

/// Appends validated drafts to the store.
#[derive(Clone)]
pub struct Submitter {
    executor: Arc<dyn TransactionExecutor>,
    signer: Arc<dyn TransactionSigner>,
    package_id: ObjectId,
    system_state_id: ObjectId,
    module: String,
    function: String,
    gas_budget: u64,
}

impl std::fmt::Debug for Submitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Submitter")
            .field("package_id", &self.package_id)
            .field("system_state_id", &self.system_state_id)
            .field("module", &self.module)
            .field("function", &self.function)
            .field("gas_budget", &self.gas_budget)
            .finish_non_exhaustive()
    }
}

impl Submitter {
    pub fn new(
        executor: Arc<dyn TransactionExecutor>,
        signer: Arc<dyn TransactionSigner>,
        store: &StoreConfig,
    ) -> Self {
        Self {
            executor,
            signer,
            package_id: store.package_id.clone(),
            system_state_id: store.system_state_id.clone(),
            module: store.module.clone(),
            function: store.function.clone(),
            gas_budget: store.gas_budget,
        }
    }

    /// Describe the append call for validated values.
    ///
    /// Argument order: system state, case number, FIR number, content hash
    /// bytes, content bytes, access flag, custodian, latitude, longitude.
    pub fn build_call(&self, evidence: &ValidatedEvidence) -> MoveCall {
        MoveCall {
            package: self.package_id.clone(),
            module: self.module.clone(),
            function: self.function.clone(),
            arguments: vec![
                json!(self.system_state_id.as_str()),
                json!(evidence.case_number.to_string()),
                json!(evidence.fir_number.to_string()),
                json!(evidence.content_hash),
                json!(evidence.content),
                json!(evidence.access_enabled),
                json!(evidence.custodian.as_str()),
                json!(evidence.latitude.canonical()),
                json!(evidence.longitude.canonical()),
            ],
            gas_budget: self.gas_budget,
        }
    }

    /// Validate `draft`, sign and execute the append, and reset the draft
    /// once the store reports success. On any failure the draft is left
    /// untouched.
    pub async fn submit(&self, draft: &mut EvidenceDraft) -> Result<TransactionReceipt, SubmitError> {
        let evidence = draft.validate()?;
        let call = self.build_call(&evidence);
        tracing::debug!(target_fn = %call.target(), case = evidence.case_number, "submitting evidence");

        let signed = self
            .signer
            .sign_transaction(&call)
            .await
            .map_err(|e| write_error(e.to_string()))?;

        let receipt = self
            .executor
            .execute(&signed)
            .await
            .map_err(|e| write_error(e.to_string()))?;

        if let ExecutionStatus::Failure { error } = &receipt.status {
            return Err(write_error(format!(
                "transaction {} failed: {error}",
                receipt.digest
            )));
        }

        tracing::info!(digest = %receipt.digest, events = receipt.event_count, "evidence submitted");
        draft.reset();
        Ok(receipt)
    }
}

fn write_error(reason: String) -> SubmitError {
    tracing::error!("evidence submission failed: {reason}");
    SubmitError::Write { reason }
}
