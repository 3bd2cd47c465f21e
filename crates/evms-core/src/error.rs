//! # Error Types
//!
//! Errors raised while constructing core domain values. Form validation has
//! its own error type in [`crate::draft`] because it always names a field.

use thiserror::Error;

/// Error constructing a core domain value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// An identifier did not match the store's `0x`-prefixed hex format.
    #[error("invalid {kind} {value:?}: {reason}")]
    InvalidIdentifier {
        /// Identifier namespace ("object id", "address").
        kind: &'static str,
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// An index range was requested with a zero-length page.
    #[error("page limit must be at least 1")]
    EmptyPage,
}
