//! # evms-client -- Typed async client for the evidence ledger
//!
//! Provides access to an evidence store held on a Sui full node:
//! - **Reads** of the system state and individual evidence entries
//!   ([`RecordReader`], implemented over JSON-RPC by [`SuiRpcStore`])
//! - **Aggregation** of every visible record into one ordered view
//!   ([`Aggregator`])
//! - **Submission** of a validated draft as one signed append
//!   ([`Submitter`])
//! - **Pinning** of evidence files to IPFS with provider fallback
//!   ([`ContentUploader`])
//!
//! ## Architecture
//!
//! The aggregator and submitter depend only on the [`RecordReader`],
//! [`TransactionExecutor`] and [`TransactionSigner`] traits. Signing is
//! always delegated: this crate never holds key material.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod pinning;
pub mod retry;
pub mod rpc;
pub mod store;
pub mod submitter;

pub use aggregator::{AggregationError, Aggregator, AggregatorOptions, PageRequest};
pub use config::{ConfigError, EvidenceConfig, Network, PinningConfig, StoreConfig};
pub use error::StoreError;
pub use pinning::{ContentUploader, PinError, PinnedContent, UploadError, UploadFile};
pub use retry::RetryPolicy;
pub use rpc::SuiRpcStore;
pub use store::{
    ExecutionStatus, MoveCall, RecordReader, SignedTransaction, TransactionExecutor,
    TransactionReceipt,
};
pub use submitter::{SignerError, SubmitError, Submitter, TransactionSigner};

use std::sync::Arc;
use std::time::Duration;

/// Top-level client. Holds the store binding, the aggregator over it and
/// the content uploader.
#[derive(Debug, Clone)]
pub struct EvidenceClient {
    config: EvidenceConfig,
    store: Arc<SuiRpcStore>,
    aggregator: Aggregator,
    uploader: ContentUploader,
}

impl EvidenceClient {
    /// Create a client from configuration.
    pub fn new(config: EvidenceConfig) -> Result<Self, StoreError> {
        let timeout = Duration::from_secs(config.store.timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Http {
                method: "client_init".into(),
                source: e,
            })?;

        let store = Arc::new(SuiRpcStore::new(http.clone(), config.store.rpc_url.clone()));
        let aggregator = Aggregator::new(store.clone(), config.store.system_state_id.clone())
            .with_options(AggregatorOptions::for_request_timeout(timeout));
        let uploader = ContentUploader::from_config(http, &config.pinning);

        Ok(Self {
            config,
            store,
            aggregator,
            uploader,
        })
    }

    pub fn config(&self) -> &EvidenceConfig {
        &self.config
    }

    /// Access the JSON-RPC store binding.
    pub fn store(&self) -> &SuiRpcStore {
        &self.store
    }

    /// Access the aggregator.
    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Access the content uploader.
    pub fn uploader(&self) -> &ContentUploader {
        &self.uploader
    }

    /// A submitter that executes through this client's store and signs with
    /// `signer`.
    pub fn submitter(&self, signer: Arc<dyn TransactionSigner>) -> Submitter {
        Submitter::new(self.store.clone(), signer, &self.config.store)
    }
}
