//! # evms-core: Foundational Types for the Evidence Ledger
//!
//! This crate is the leaf of the workspace. It defines the domain types that
//! every other crate speaks: store identifiers, evidence records, the root
//! system-state descriptor, the aggregated view handed to presentation code,
//! and the typed submission form with its local validation rules.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for store identifiers.** `ObjectId`, `SuiAddress`
//!    and `RecordIndex` have validated constructors. An index is never a bare
//!    integer once it leaves the aggregator: its table key form is always the
//!    unsigned decimal string produced by [`RecordIndex::key()`].
//!
//! 2. **Explicit empty store.** `SystemState::max_index` is `None` for a store
//!    that has never assigned an index, which is distinct from any failure to
//!    read the state at all.
//!
//! 3. **Closed form fields.** The submission form is an explicit record with a
//!    closed [`DraftField`] tag set; there is no dynamic field-name dispatch.
//!
//! ## Crate Policy
//!
//! - No I/O and no async code.
//! - No dependencies on other `evms-*` crates.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod draft;
pub mod error;
pub mod evidence;
pub mod identity;
pub mod view;

pub use draft::{Coordinate, DraftField, EvidenceDraft, ValidatedEvidence, ValidationError};
pub use error::CoreError;
pub use evidence::{EvidenceRecord, IndexRange, SystemState};
pub use identity::{ObjectId, RecordIndex, SuiAddress};
pub use view::{
    AggregatedView, CaseGroup, CaseGroups, EntryOutcome, IndexedEvidence, SkipReason,
    SkippedEntry,
};
