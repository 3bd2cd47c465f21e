//! # Evidence Records and the Store Root
//!
//! [`EvidenceRecord`] is the unit of domain data, created only by a
//! successful write to the store and never mutated by this system.
//! [`SystemState`] is the root descriptor: the highest assigned index and
//! the handle of the table holding one record per index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::identity::{ObjectId, RecordIndex};

/// One evidence record as stored on the ledger.
///
/// `evidence_id` is the store-assigned field carried inside the record. It is
/// kept distinct from the table index the record was read from; callers must
/// not assume the two are equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub evidence_id: String,
    pub case_number: u64,
    pub fir_number: u64,
    /// Content-address digest of the off-chain payload (IPFS CID bytes).
    pub content_hash: Vec<u8>,
    /// Textual payload encoded as bytes.
    pub content: Vec<u8>,
    pub access_enabled: bool,
    /// Custodian ("head") address as returned by the store.
    pub custodian: String,
    pub latitude: String,
    pub longitude: String,
    /// Submission stamp assigned by the store (epoch milliseconds).
    pub submitted_at: String,
}

impl EvidenceRecord {
    /// Content hash decoded as text, replacing invalid UTF-8.
    pub fn content_hash_text(&self) -> String {
        String::from_utf8_lossy(&self.content_hash).into_owned()
    }

    /// Content payload decoded as text, replacing invalid UTF-8.
    pub fn content_text(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }

    /// The submission stamp as a UTC datetime, if it is a valid epoch
    /// millisecond value.
    pub fn submitted_at_utc(&self) -> Option<DateTime<Utc>> {
        let millis: i64 = self.submitted_at.trim().parse().ok()?;
        DateTime::from_timestamp_millis(millis)
    }
}

/// Root descriptor of the store.
///
/// Both fields come from the same read of the root object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemState {
    /// Highest assigned index, or `None` for a store that has never
    /// assigned one.
    pub max_index: Option<RecordIndex>,
    /// Handle of the per-index record table.
    pub table: ObjectId,
}

impl SystemState {
    /// The full index range `[0, M]`, or `None` for an empty store.
    pub fn full_range(&self) -> Option<IndexRange> {
        self.max_index.map(|max| IndexRange {
            first: 0,
            last: max.value(),
        })
    }

    /// The range covered by a page of at most `limit` records starting at
    /// `start`, clipped to `M`. Returns `None` when the page starts beyond
    /// the last assigned index.
    pub fn page_range(&self, start: u64, limit: u64) -> Result<Option<IndexRange>, CoreError> {
        if limit == 0 {
            return Err(CoreError::EmptyPage);
        }
        let Some(max) = self.max_index else {
            return Ok(None);
        };
        if start > max.value() {
            return Ok(None);
        }
        let last = start.saturating_add(limit - 1).min(max.value());
        Ok(Some(IndexRange { first: start, last }))
    }
}

/// Inclusive range of table indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRange {
    pub first: u64,
    pub last: u64,
}

impl IndexRange {
    /// Number of indices in the range. `u128` because `[0, u64::MAX]` holds
    /// one more entry than `u64` can count.
    pub fn len(&self) -> u128 {
        if self.last < self.first {
            return 0;
        }
        u128::from(self.last - self.first) + 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = RecordIndex> {
        (self.first..=self.last).map(RecordIndex)
    }

    /// Split into consecutive sub-ranges of at most `size` indices (a zero
    /// size is treated as one).
    pub fn windows(&self, size: u64) -> impl Iterator<Item = IndexRange> {
        let size = size.max(1);
        let last = self.last;
        let mut next = (self.first <= last).then_some(self.first);
        std::iter::from_fn(move || {
            let first = next?;
            let end = first.saturating_add(size - 1).min(last);
            next = (end < last).then(|| end + 1);
            Some(IndexRange { first, last: end })
        })
    }
}
