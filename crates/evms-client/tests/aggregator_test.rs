//! Aggregation properties against an in-memory store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use evms_client::{
    AggregationError, Aggregator, AggregatorOptions, PageRequest, RecordReader, RetryPolicy,
    StoreError,
};
use evms_core::{EvidenceRecord, ObjectId, RecordIndex, SkipReason, SystemState};

#[derive(Clone)]
enum Entry {
    Record { case: u64 },
    Missing,
    Fail { transient: bool },
    /// Fails transiently `failures` times, then returns a record.
    Flaky { failures: u32, case: u64 },
    Slow { delay: Duration },
}

enum StateBehavior {
    Max(Option<u64>),
    Unavailable,
    NotFound,
}

struct FakeStore {
    state: StateBehavior,
    /// Indices not listed here hold a record whose case number is the index.
    entries: HashMap<u64, Entry>,
    state_calls: AtomicU32,
    entry_calls: Mutex<HashMap<u64, u32>>,
    in_flight: AtomicU32,
    peak_in_flight: AtomicU32,
}

impl FakeStore {
    fn dense(max: Option<u64>) -> Self {
        Self {
            state: StateBehavior::Max(max),
            entries: HashMap::new(),
            state_calls: AtomicU32::new(0),
            entry_calls: Mutex::new(HashMap::new()),
            in_flight: AtomicU32::new(0),
            peak_in_flight: AtomicU32::new(0),
        }
    }

    /// Every index in `[0, max]` answers after `delay`.
    fn all_slow(max: u64, delay: Duration) -> Self {
        (0..=max).fold(Self::dense(Some(max)), |store, i| {
            store.entry(i, Entry::Slow { delay })
        })
    }

    fn with_state(state: StateBehavior) -> Self {
        Self {
            state,
            ..Self::dense(None)
        }
    }

    fn entry(mut self, index: u64, entry: Entry) -> Self {
        self.entries.insert(index, entry);
        self
    }

    fn calls_for(&self, index: u64) -> u32 {
        self.entry_calls
            .lock()
            .unwrap()
            .get(&index)
            .copied()
            .unwrap_or(0)
    }

    fn total_entry_calls(&self) -> u32 {
        self.entry_calls.lock().unwrap().values().sum()
    }

    fn peak(&self) -> u32 {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn answer(&self, i: u64, call: u32) -> Result<Option<EvidenceRecord>, StoreError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let result = self.answer(i, call).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

fn record(index: u64, case: u64) -> EvidenceRecord {
    EvidenceRecord {
        evidence_id: index.to_string(),
        case_number: case,
        fir_number: 7,
        content_hash: b"QmX".to_vec(),
        content: b"note".to_vec(),
        access_enabled: true,
        custodian: "0xabc".into(),
        latitude: "1".into(),
        longitude: "2".into(),
        submitted_at: "1700000000000".into(),
    }
}

fn unavailable() -> StoreError {
    StoreError::Status {
        method: "suix_getDynamicFieldObject".into(),
        status: 503,
        body: "overloaded".into(),
    }
}

#[async_trait]
impl RecordReader for FakeStore {
    async fn get_system_state(&self, id: &ObjectId) -> Result<SystemState, StoreError> {
        self.state_calls.fetch_add(1, Ordering::SeqCst);
        match &self.state {
            StateBehavior::Max(max) => Ok(SystemState {
                max_index: max.map(RecordIndex),
                table: ObjectId::parse("0xaa").unwrap(),
            }),
            StateBehavior::Unavailable => Err(StoreError::Status {
                method: "sui_getObject".into(),
                status: 502,
                body: String::new(),
            }),
            StateBehavior::NotFound => Err(StoreError::NotFound {
                object: id.to_string(),
                detail: "notExists".into(),
            }),
        }
    }

    async fn get_record_at(
        &self,
        table: &ObjectId,
        index: RecordIndex,
    ) -> Result<Option<EvidenceRecord>, StoreError> {
        assert_eq!(table.as_str(), "0xaa", "table handle comes from the state read");
        let i = index.value();
        let call = {
            let mut calls = self.entry_calls.lock().unwrap();
            let n = calls.entry(i).or_insert(0);
            *n += 1;
            *n
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let result = self.answer(i, call).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

fn fast_options() -> AggregatorOptions {
    AggregatorOptions {
        entry_timeout: Duration::from_secs(5),
        retry: RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
        },
        max_records: 10_000,
    }
}

fn aggregator(store: &Arc<FakeStore>) -> Aggregator {
    Aggregator::new(store.clone(), ObjectId::parse("0xf448").unwrap()).with_options(fast_options())
}

fn ids(values: &[u64]) -> Vec<RecordIndex> {
    values.iter().copied().map(RecordIndex).collect()
}

// ── Dense and sparse stores ──────────────────────────────────────────

#[tokio::test]
async fn dense_store_yields_every_index_in_order() {
    for max in [0u64, 1, 5, 31] {
        let store = Arc::new(FakeStore::dense(Some(max)));
        let view = aggregator(&store).aggregate().await.unwrap();

        let expected: Vec<u64> = (0..=max).collect();
        assert_eq!(view.ids(), ids(&expected), "M = {max}");
        assert!(view.skipped.is_empty());
        assert_eq!(view.max_index, Some(RecordIndex(max)));
        assert_eq!(store.state_calls.load(Ordering::SeqCst), 1);
    }
}

#[tokio::test]
async fn ids_are_table_indices_not_store_fields() {
    let store = Arc::new(FakeStore::dense(Some(2)));
    let view = aggregator(&store).aggregate().await.unwrap();
    for item in &view.records {
        assert_eq!(item.id.key(), item.record.evidence_id);
    }
}

#[tokio::test]
async fn missing_entry_is_omitted_and_reported() {
    let store = Arc::new(FakeStore::dense(Some(4)).entry(2, Entry::Missing));
    let view = aggregator(&store).aggregate().await.unwrap();

    assert_eq!(view.len(), 4);
    assert_eq!(view.ids(), ids(&[0, 1, 3, 4]));
    assert_eq!(view.skipped.len(), 1);
    assert_eq!(view.skipped[0].index, RecordIndex(2));
    assert_eq!(view.skipped[0].reason, SkipReason::Missing);
    assert_eq!(store.calls_for(2), 1, "missing entries are not retried");
}

#[tokio::test]
async fn failed_entry_is_omitted_without_affecting_siblings() {
    let store = Arc::new(FakeStore::dense(Some(3)).entry(0, Entry::Fail { transient: false }));
    let view = aggregator(&store).aggregate().await.unwrap();

    assert_eq!(view.ids(), ids(&[1, 2, 3]));
    match &view.skipped[0].reason {
        SkipReason::Failed { message } => assert!(message.contains("case_no"), "{message}"),
        other => panic!("expected Failed, got {other:?}"),
    }
    assert_eq!(store.calls_for(0), 1);
}

// ── Whole-call failure vs empty store ────────────────────────────────

#[tokio::test]
async fn state_failure_is_fatal_and_distinct_from_empty_store() {
    let store = Arc::new(FakeStore::with_state(StateBehavior::Unavailable));
    let err = aggregator(&store).aggregate().await.unwrap_err();
    assert!(matches!(err, AggregationError::Failed { .. }));
    assert!(!err.is_not_found());
    assert_eq!(store.total_entry_calls(), 0);
    assert_eq!(store.state_calls.load(Ordering::SeqCst), 1, "state read is not retried");

    let store = Arc::new(FakeStore::with_state(StateBehavior::NotFound));
    let err = aggregator(&store).aggregate().await.unwrap_err();
    assert!(err.is_not_found());

    let store = Arc::new(FakeStore::dense(None));
    let view = aggregator(&store).aggregate().await.unwrap();
    assert!(view.is_empty());
    assert_eq!(view.max_index, None);
    assert_eq!(store.total_entry_calls(), 0);
}

#[tokio::test]
async fn aggregation_is_idempotent_on_unchanged_store() {
    let store = Arc::new(
        FakeStore::dense(Some(6))
            .entry(1, Entry::Missing)
            .entry(4, Entry::Record { case: 1 }),
    );
    let agg = aggregator(&store);
    let first = agg.aggregate().await.unwrap();
    let second = agg.aggregate().await.unwrap();
    assert_eq!(first, second);
}

// ── Grouping ─────────────────────────────────────────────────────────

#[tokio::test]
async fn grouping_keeps_first_seen_case_order() {
    let store = Arc::new(
        FakeStore::dense(Some(2))
            .entry(0, Entry::Record { case: 20 })
            .entry(1, Entry::Record { case: 10 })
            .entry(2, Entry::Record { case: 20 }),
    );
    let groups = aggregator(&store).aggregate().await.unwrap().group_by_case();

    assert_eq!(groups.case_numbers(), vec![20, 10]);
    let ids_of = |case| -> Vec<RecordIndex> {
        groups
            .get(case)
            .unwrap()
            .records
            .iter()
            .map(|r| r.id)
            .collect()
    };
    assert_eq!(ids_of(20), ids(&[0, 2]));
    assert_eq!(ids_of(10), ids(&[1]));
}

// ── Retry, timeout, cancellation ─────────────────────────────────────

#[tokio::test]
async fn transient_entry_failure_is_retried() {
    let store = Arc::new(FakeStore::dense(Some(1)).entry(1, Entry::Flaky { failures: 1, case: 9 }));
    let view = aggregator(&store).aggregate().await.unwrap();

    assert_eq!(view.ids(), ids(&[0, 1]));
    assert_eq!(store.calls_for(1), 2);
}

#[tokio::test]
async fn retries_are_bounded_by_policy() {
    let store = Arc::new(FakeStore::dense(Some(1)).entry(1, Entry::Fail { transient: true }));
    let view = aggregator(&store).aggregate().await.unwrap();
    assert_eq!(view.ids(), ids(&[0]));
    assert_eq!(store.calls_for(1), 3, "initial read plus two retries");

    let store = Arc::new(FakeStore::dense(Some(1)).entry(1, Entry::Flaky { failures: 1, case: 9 }));
    let agg = aggregator(&store).with_options(AggregatorOptions {
        retry: RetryPolicy::none(),
        ..fast_options()
    });
    let view = agg.aggregate().await.unwrap();
    assert_eq!(view.ids(), ids(&[0]));
    assert_eq!(store.calls_for(1), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_entry_times_out_without_delaying_siblings() {
    let store = Arc::new(FakeStore::dense(Some(2)).entry(1, Entry::Slow {
        delay: Duration::from_secs(600),
    }));
    let view = aggregator(&store).aggregate().await.unwrap();

    assert_eq!(view.ids(), ids(&[0, 2]));
    assert_eq!(view.skipped[0].index, RecordIndex(1));
    assert_eq!(view.skipped[0].reason, SkipReason::TimedOut);
}

#[tokio::test(start_paused = true)]
async fn cancellation_abandons_pending_reads() {
    let store = Arc::new(FakeStore::dense(Some(3)).entry(2, Entry::Slow {
        delay: Duration::from_secs(600),
    }));
    let agg = aggregator(&store).with_options(AggregatorOptions {
        entry_timeout: Duration::from_secs(3600),
        ..fast_options()
    });

    let err = agg
        .aggregate_until(None, tokio::time::sleep(Duration::from_secs(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, AggregationError::Cancelled));
}

#[tokio::test]
async fn aggregate_until_completes_when_not_cancelled() {
    let store = Arc::new(FakeStore::dense(Some(2)));
    let view = aggregator(&store)
        .aggregate_until(
            Some(PageRequest { start: 1, limit: 5 }),
            std::future::pending::<()>(),
        )
        .await
        .unwrap();
    assert_eq!(view.ids(), ids(&[1, 2]));
}

// ── Paging and windowing ───────────────────────────────────────

#[tokio::test]
async fn page_reads_only_its_window() {
    let store = Arc::new(FakeStore::dense(Some(9)));
    let view = aggregator(&store)
        .aggregate_page(PageRequest { start: 3, limit: 4 })
        .await
        .unwrap();

    assert_eq!(view.ids(), ids(&[3, 4, 5, 6]));
    assert_eq!(store.total_entry_calls(), 4);
    assert_eq!(view.max_index, Some(RecordIndex(9)));
}

#[tokio::test]
async fn page_beyond_max_is_empty() {
    let store = Arc::new(FakeStore::dense(Some(9)));
    let view = aggregator(&store)
        .aggregate_page(PageRequest { start: 10, limit: 4 })
        .await
        .unwrap();

    assert!(view.is_empty());
    assert_eq!(view.max_index, Some(RecordIndex(9)));
    assert_eq!(store.total_entry_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn all_entries_are_in_flight_together() {
    let store = Arc::new(FakeStore::all_slow(7, Duration::from_secs(1)));
    let started = tokio::time::Instant::now();
    let view = aggregator(&store).aggregate().await.unwrap();

    assert_eq!(view.len(), 8);
    assert_eq!(store.peak(), 8);
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "reads ran one after another: {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn store_at_default_window_size_is_read_in_full() {
    let store = Arc::new(FakeStore::dense(Some(10_000)));
    let view = aggregator(&store).aggregate().await.unwrap();

    assert_eq!(view.len(), 10_001);
    assert!(view.skipped.is_empty());
    let expected: Vec<u64> = (0..=10_000).collect();
    assert_eq!(view.ids(), ids(&expected));
    assert_eq!(store.total_entry_calls(), 10_001);
    assert_eq!(store.state_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn range_wider_than_window_is_read_window_by_window() {
    let store = Arc::new(FakeStore::all_slow(24, Duration::from_secs(1)));
    let agg = aggregator(&store).with_options(AggregatorOptions {
        max_records: 10,
        ..fast_options()
    });
    let started = tokio::time::Instant::now();
    let view = agg.aggregate().await.unwrap();

    let expected: Vec<u64> = (0..=24).collect();
    assert_eq!(view.ids(), ids(&expected));
    assert_eq!(store.peak(), 10);
    assert!(started.elapsed() >= Duration::from_secs(3));
    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(store.state_calls.load(Ordering::SeqCst), 1);
}
