//! # Evidence Aggregator
//!
//! Produces an [`AggregatedView`] of every record currently visible in the
//! store.
//!
//! 1. One read of the system state yields both `M` (highest assigned index)
//!    and the table handle. If that read fails the aggregation fails as a
//!    whole; an empty store is a valid, empty view.
//! 2. Every index in the requested range is read concurrently, at most
//!    `max_records` at a time; larger ranges are walked window by window
//!    against the same state snapshot. Each read is independent: a missing
//!    entry, a failure or a timeout is captured as that entry's outcome and
//!    never aborts its siblings.
//! 3. Outcomes are merged in ascending index order. Excluded indices are
//!    kept in [`AggregatedView::skipped`] with their reason.
//!
//! Reads are plain futures joined with [`futures::future::join_all`], so
//! dropping an aggregation drops every pending read with it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use evms_core::{
    AggregatedView, CoreError, EntryOutcome, IndexRange, ObjectId, RecordIndex, SystemState,
};

use crate::error::StoreError;
use crate::retry::{retry_transient, RetryPolicy};
use crate::store::RecordReader;

/// Default deadline for one entry read, retries included.
pub const DEFAULT_ENTRY_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of entry reads in flight at once.
pub const DEFAULT_MAX_RECORDS: u64 = 10_000;

/// Tuning knobs for entry reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorOptions {
    pub entry_timeout: Duration,
    pub retry: RetryPolicy,
    /// Largest window read concurrently. Ranges spanning more entries are
    /// read in consecutive windows of this size.
    pub max_records: u64,
}

impl AggregatorOptions {
    /// Options whose entry deadline leaves room for every attempt of the
    /// retry policy to run into `request_timeout`, plus the backoff between
    /// them.
    pub fn for_request_timeout(request_timeout: Duration) -> Self {
        let retry = RetryPolicy::default();
        Self {
            entry_timeout: request_timeout
                .saturating_mul(retry.attempts())
                .saturating_add(retry.total_delay()),
            retry,
            max_records: DEFAULT_MAX_RECORDS,
        }
    }
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self {
            entry_timeout: DEFAULT_ENTRY_TIMEOUT,
            retry: RetryPolicy::default(),
            max_records: DEFAULT_MAX_RECORDS,
        }
    }
}

/// A window of indices: at most `limit` entries starting at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub start: u64,
    pub limit: u64,
}

/// Errors that fail an aggregation as a whole.
#[derive(Debug, thiserror::Error)]
pub enum AggregationError {
    /// The system state could not be read.
    #[error("aggregation failed: {source}")]
    Failed { source: StoreError },

    #[error("invalid page: {0}")]
    InvalidPage(#[from] CoreError),

    #[error("aggregation cancelled")]
    Cancelled,
}

impl AggregationError {
    /// Whether the store itself was reachable but the system-state object
    /// (or one of its fields) does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Failed { source } if source.is_not_found())
    }
}

/// Reads the store and assembles aggregated views.
#[derive(Clone)]
pub struct Aggregator {
    reader: Arc<dyn RecordReader>,
    system_state_id: ObjectId,
    options: AggregatorOptions,
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("system_state_id", &self.system_state_id)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Aggregator {
    pub fn new(reader: Arc<dyn RecordReader>, system_state_id: ObjectId) -> Self {
        Self {
            reader,
            system_state_id,
            options: AggregatorOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AggregatorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &AggregatorOptions {
        &self.options
    }

    /// Read the root descriptor once. Not retried.
    pub async fn system_state(&self) -> Result<SystemState, AggregationError> {
        self.reader
            .get_system_state(&self.system_state_id)
            .await
            .map_err(|source| {
                tracing::error!(object = %self.system_state_id, "system state read failed: {source}");
                AggregationError::Failed { source }
            })
    }

    /// Aggregate every index in `[0, M]`.
    pub async fn aggregate(&self) -> Result<AggregatedView, AggregationError> {
        let state = self.system_state().await?;
        let range = state.full_range();
        self.collect(&state, range).await
    }

    /// Aggregate one page of indices. A page starting beyond `M` is empty.
    pub async fn aggregate_page(&self, page: PageRequest) -> Result<AggregatedView, AggregationError> {
        let state = self.system_state().await?;
        let range = state.page_range(page.start, page.limit)?;
        self.collect(&state, range).await
    }

    /// Aggregate the whole store (`page` = `None`) or one page, abandoning
    /// the work as soon as `cancel` resolves.
    pub async fn aggregate_until<C>(
        &self,
        page: Option<PageRequest>,
        cancel: C,
    ) -> Result<AggregatedView, AggregationError>
    where
        C: Future<Output = ()>,
    {
        let work = async {
            match page {
                Some(page) => self.aggregate_page(page).await,
                None => self.aggregate().await,
            }
        };
        tokio::select! {
            biased;
            _ = cancel => {
                tracing::info!("aggregation cancelled; pending reads dropped");
                Err(AggregationError::Cancelled)
            }
            result = work => result,
        }
    }

    async fn collect(
        &self,
        state: &SystemState,
        range: Option<IndexRange>,
    ) -> Result<AggregatedView, AggregationError> {
        let Some(range) = range else {
            tracing::info!(max_index = ?state.max_index, "no indices to read");
            return Ok(AggregatedView::empty(state.max_index));
        };

        let requested = range.len();
        let mut outcomes = Vec::new();
        for window in range.windows(self.options.max_records) {
            tracing::debug!(first = window.first, last = window.last, "reading evidence entries");
            let reads = window
                .indices()
                .map(|index| async move { (index, self.read_entry(&state.table, index).await) });
            outcomes.extend(join_all(reads).await);
        }

        let view = AggregatedView::assemble(state.max_index, Some(range), outcomes);
        for skipped in &view.skipped {
            tracing::warn!(index = %skipped.index, reason = %skipped.reason, "evidence entry excluded");
        }
        tracing::info!(
            requested = %requested,
            records = view.len(),
            skipped = view.skipped_count(),
            "aggregation complete"
        );
        Ok(view)
    }

    async fn read_entry(&self, table: &ObjectId, index: RecordIndex) -> EntryOutcome {
        let what = format!("read of entry {index}");
        let read = retry_transient(&self.options.retry, &what, || {
            self.reader.get_record_at(table, index)
        });

        match tokio::time::timeout(self.options.entry_timeout, read).await {
            Err(_) => EntryOutcome::TimedOut,
            Ok(Ok(Some(record))) => EntryOutcome::Found(record),
            Ok(Ok(None)) => EntryOutcome::Missing,
            Ok(Err(e)) => EntryOutcome::Failed(e.to_string()),
        }
    }
}
