//! # Aggregated View
//!
//! The UI-facing result of an aggregation: records in ascending index order,
//! each tagged with the index it was read from, plus a diagnostic list of the
//! indices that were excluded and why.
//!
//! The grouped view ([`CaseGroups`]) partitions the ordered list by case
//! number. Case order is first-seen order in the list; within a case,
//! records keep ascending index order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::evidence::{EvidenceRecord, IndexRange};
use crate::identity::RecordIndex;

/// A record tagged with the table index it was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedEvidence {
    pub id: RecordIndex,
    pub record: EvidenceRecord,
}

/// Settled outcome of one per-index read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Found(EvidenceRecord),
    /// The table has no entry at this index.
    Missing,
    /// The read did not settle before its deadline.
    TimedOut,
    /// The read failed; the message is the transport or decode error.
    Failed(String),
}

/// Why an index is absent from the aggregated list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    Missing,
    TimedOut,
    Failed { message: String },
}

/// An index excluded from the aggregated list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub index: RecordIndex,
    pub reason: SkipReason,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::TimedOut => write!(f, "timed out"),
            Self::Failed { message } => write!(f, "failed: {message}"),
        }
    }
}

/// All evidence visible in one aggregation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedView {
    /// Highest assigned index at the time of the state read.
    pub max_index: Option<RecordIndex>,
    /// Indices that were queried, or `None` if nothing was queried.
    pub range: Option<IndexRange>,
    /// Records in ascending index order.
    pub records: Vec<IndexedEvidence>,
    /// Excluded indices in ascending order.
    pub skipped: Vec<SkippedEntry>,
}

impl AggregatedView {
    /// A view with no records. `max_index` is `None` for an empty store, or
    /// the store's index when the requested page lies beyond it.
    pub fn empty(max_index: Option<RecordIndex>) -> Self {
        Self {
            max_index,
            range: None,
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Merge settled per-index outcomes into a view.
    ///
    /// Outcomes may arrive in any order; the result is sorted by index.
    /// Every `Found` outcome becomes a record, everything else a
    /// [`SkippedEntry`].
    pub fn assemble<I>(max_index: Option<RecordIndex>, range: Option<IndexRange>, outcomes: I) -> Self
    where
        I: IntoIterator<Item = (RecordIndex, EntryOutcome)>,
    {
        let mut outcomes: Vec<(RecordIndex, EntryOutcome)> = outcomes.into_iter().collect();
        outcomes.sort_by_key(|(index, _)| *index);

        let mut records = Vec::with_capacity(outcomes.len());
        let mut skipped = Vec::new();
        for (index, outcome) in outcomes {
            match outcome {
                EntryOutcome::Found(record) => records.push(IndexedEvidence { id: index, record }),
                EntryOutcome::Missing => skipped.push(SkippedEntry {
                    index,
                    reason: SkipReason::Missing,
                }),
                EntryOutcome::TimedOut => skipped.push(SkippedEntry {
                    index,
                    reason: SkipReason::TimedOut,
                }),
                EntryOutcome::Failed(message) => skipped.push(SkippedEntry {
                    index,
                    reason: SkipReason::Failed { message },
                }),
            }
        }

        Self {
            max_index,
            range,
            records,
            skipped,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of indices excluded from the list.
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Source indices of the listed records, in order.
    pub fn ids(&self) -> Vec<RecordIndex> {
        self.records.iter().map(|r| r.id).collect()
    }

    /// Group the ordered list by case number.
    pub fn group_by_case(&self) -> CaseGroups {
        CaseGroups::from_records(&self.records)
    }
}

/// Records sharing one case number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseGroup {
    pub case_number: u64,
    pub records: Vec<IndexedEvidence>,
}

/// Records grouped by case number, in first-seen case order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseGroups(Vec<CaseGroup>);

impl CaseGroups {
    /// Group an ordered record list. Input order is preserved within each
    /// group.
    pub fn from_records(records: &[IndexedEvidence]) -> Self {
        let mut groups: Vec<CaseGroup> = Vec::new();
        let mut position: HashMap<u64, usize> = HashMap::new();

        for entry in records {
            let case = entry.record.case_number;
            let slot = *position.entry(case).or_insert_with(|| {
                groups.push(CaseGroup {
                    case_number: case,
                    records: Vec::new(),
                });
                groups.len() - 1
            });
            groups[slot].records.push(entry.clone());
        }

        Self(groups)
    }

    /// Records for one case, if any.
    pub fn get(&self, case_number: u64) -> Option<&CaseGroup> {
        self.0.iter().find(|g| g.case_number == case_number)
    }

    /// Case numbers in first-seen order.
    pub fn case_numbers(&self) -> Vec<u64> {
        self.0.iter().map(|g| g.case_number).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CaseGroup> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a CaseGroups {
    type Item = &'a CaseGroup;
    type IntoIter = std::slice::Iter<'a, CaseGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(case: u64) -> EvidenceRecord {
        EvidenceRecord {
            evidence_id: format!("ev-{case}"),
            case_number: case,
            fir_number: 7,
            content_hash: b"Qm".to_vec(),
            content: b"note".to_vec(),
            access_enabled: true,
            custodian: "0xabc".into(),
            latitude: "1".into(),
            longitude: "2".into(),
            submitted_at: "0".into(),
        }
    }

    fn found(i: u64, case: u64) -> (RecordIndex, EntryOutcome) {
        (RecordIndex(i), EntryOutcome::Found(record(case)))
    }

    #[test]
    fn assemble_sorts_by_index_and_splits_skips() {
        let view = AggregatedView::assemble(
            Some(RecordIndex(3)),
            Some(IndexRange { first: 0, last: 3 }),
            vec![
                found(2, 10),
                (RecordIndex(1), EntryOutcome::Missing),
                found(0, 10),
                (RecordIndex(3), EntryOutcome::Failed("connection reset".into())),
            ],
        );

        assert_eq!(view.ids(), vec![RecordIndex(0), RecordIndex(2)]);
        assert_eq!(view.skipped_count(), 2);
        assert_eq!(view.skipped[0].index, RecordIndex(1));
        assert_eq!(view.skipped[0].reason, SkipReason::Missing);
        assert_eq!(
            view.skipped[1].reason.to_string(),
            "failed: connection reset"
        );
    }

    #[test]
    fn empty_view_is_distinct_from_failed_reads() {
        let empty = AggregatedView::empty(None);
        assert!(empty.is_empty());
        assert_eq!(empty.skipped_count(), 0);
        assert!(empty.range.is_none());
    }

    #[test]
    fn grouping_preserves_first_seen_case_order() {
        // indices 0 (case A), 1 (case B), 2 (case A) group as {A: [0, 2], B: [1]}
        let view = AggregatedView::assemble(
            Some(RecordIndex(2)),
            None,
            vec![found(0, 100), found(1, 200), found(2, 100)],
        );
        let groups = view.group_by_case();

        assert_eq!(groups.case_numbers(), vec![100, 200]);
        let a: Vec<u64> = groups.get(100).unwrap().records.iter().map(|r| r.id.0).collect();
        let b: Vec<u64> = groups.get(200).unwrap().records.iter().map(|r| r.id.0).collect();
        assert_eq!(a, vec![0, 2]);
        assert_eq!(b, vec![1]);
        assert!(groups.get(300).is_none());
    }

    #[test]
    fn skip_reason_serializes_with_kind_tag() {
        let json = serde_json::to_value(SkipReason::Failed {
            message: "boom".into(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"kind": "failed", "message": "boom"}));
    }

    proptest! {
        #[test]
        fn grouping_keeps_every_record_once_in_index_order(cases in proptest::collection::vec(0u64..5, 0..40)) {
            let outcomes: Vec<_> = cases.iter().enumerate().map(|(i, c)| found(i as u64, *c)).collect();
            let view = AggregatedView::assemble(None, None, outcomes);
            let groups = view.group_by_case();

            let total: usize = groups.iter().map(|g| g.records.len()).sum();
            prop_assert_eq!(total, cases.len());

            for group in &groups {
                let ids: Vec<u64> = group.records.iter().map(|r| r.id.0).collect();
                let mut sorted = ids.clone();
                sorted.sort_unstable();
                prop_assert_eq!(&ids, &sorted);
                prop_assert!(group.records.iter().all(|r| r.record.case_number == group.case_number));
            }

            let mut first_seen = Vec::new();
            for c in &cases {
                if !first_seen.contains(c) {
                    first_seen.push(*c);
                }
            }
            prop_assert_eq!(groups.case_numbers(), first_seen);
        }
    }
}
