//! # Store Identifier Newtypes
//!
//! Object ids and addresses on the store share one textual format: `0x`
//! followed by up to 64 hex digits. Both are normalized to lowercase on
//! construction so that two spellings of the same id compare equal.
//!
//! [`RecordIndex`] is the position of a record in the evidence table. The
//! store assigns indices densely from zero; the table is keyed by the
//! index's unsigned decimal string form.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum number of hex digits after the `0x` prefix (32 bytes).
const MAX_HEX_DIGITS: usize = 64;

/// Identifier of an object held by the store (system state, table handle,
/// contract package).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

/// Account address on the store. Used for the custodian field of a record
/// and for the sender of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SuiAddress(String);

/// Position of a record in the evidence table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordIndex(pub u64);

fn normalize_hex_id(kind: &'static str, value: &str) -> Result<String, CoreError> {
    let invalid = |reason| CoreError::InvalidIdentifier {
        kind,
        value: value.to_string(),
        reason,
    };

    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| invalid("must start with 0x"))?;

    if digits.is_empty() {
        return Err(invalid("no hex digits after 0x"));
    }
    if digits.len() > MAX_HEX_DIGITS {
        return Err(invalid("longer than 32 bytes"));
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid("contains non-hex characters"));
    }

    Ok(format!("0x{}", digits.to_ascii_lowercase()))
}

impl ObjectId {
    /// Parse and normalize an object id.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        normalize_hex_id("object id", value.trim()).map(Self)
    }

    /// The normalized `0x`-prefixed form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl SuiAddress {
    /// Parse and normalize an address.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        normalize_hex_id("address", value.trim()).map(Self)
    }

    /// The normalized `0x`-prefixed form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl RecordIndex {
    /// Table key for this index: the unsigned decimal string form.
    pub fn key(&self) -> String {
        self.0.to_string()
    }

    /// The raw index value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl TryFrom<String> for ObjectId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl TryFrom<String> for SuiAddress {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SuiAddress> for String {
    fn from(addr: SuiAddress) -> Self {
        addr.0
    }
}

impl From<u64> for RecordIndex {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl std::str::FromStr for ObjectId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::str::FromStr for SuiAddress {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for SuiAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for RecordIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
