//! # Submission Form
//!
//! [`EvidenceDraft`] holds the raw text a user has entered for a new record.
//! Fields are addressed through the closed [`DraftField`] tag set. Validation
//! runs entirely locally and produces a [`ValidatedEvidence`] with typed
//! values ready to be encoded as call arguments; the first failing rule
//! aborts with a field-specific [`ValidationError`].

use serde::{Deserialize, Serialize};

use crate::identity::SuiAddress;

/// Text fields of the submission form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftField {
    CaseNumber,
    FirNumber,
    ContentHash,
    Content,
    Custodian,
    Latitude,
    Longitude,
}

impl DraftField {
    /// All text fields, in validation order.
    pub const ALL: [DraftField; 7] = [
        DraftField::CaseNumber,
        DraftField::FirNumber,
        DraftField::ContentHash,
        DraftField::Content,
        DraftField::Custodian,
        DraftField::Latitude,
        DraftField::Longitude,
    ];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::CaseNumber => "Case Number",
            Self::FirNumber => "FIR Number",
            Self::ContentHash => "IPFS Hash",
            Self::Content => "Content",
            Self::Custodian => "Head Address",
            Self::Latitude => "Latitude",
            Self::Longitude => "Longitude",
        }
    }
}

impl std::fmt::Display for DraftField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A local validation failure. No network call is made once one is raised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: DraftField,
    pub message: String,
}

impl ValidationError {
    fn new(field: DraftField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Raw form state for a new evidence record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceDraft {
    case_number: String,
    fir_number: String,
    content_hash: String,
    content: String,
    custodian: String,
    latitude: String,
    longitude: String,
    access_enabled: bool,
}

impl Default for EvidenceDraft {
    fn default() -> Self {
        Self {
            case_number: String::new(),
            fir_number: String::new(),
            content_hash: String::new(),
            content: String::new(),
            custodian: String::new(),
            latitude: String::new(),
            longitude: String::new(),
            access_enabled: true,
        }
    }
}

impl EvidenceDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the text of one field.
    pub fn set(&mut self, field: DraftField, value: impl Into<String>) {
        *self.slot_mut(field) = value.into();
    }

    /// Builder form of [`EvidenceDraft::set`].
    pub fn with(mut self, field: DraftField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set_access(&mut self, enabled: bool) {
        self.access_enabled = enabled;
    }

    pub fn get(&self, field: DraftField) -> &str {
        match field {
            DraftField::CaseNumber => &self.case_number,
            DraftField::FirNumber => &self.fir_number,
            DraftField::ContentHash => &self.content_hash,
            DraftField::Content => &self.content,
            DraftField::Custodian => &self.custodian,
            DraftField::Latitude => &self.latitude,
            DraftField::Longitude => &self.longitude,
        }
    }

    pub fn access_enabled(&self) -> bool {
        self.access_enabled
    }

    /// Reset every field to its initial value.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn slot_mut(&mut self, field: DraftField) -> &mut String {
        match field {
            DraftField::CaseNumber => &mut self.case_number,
            DraftField::FirNumber => &mut self.fir_number,
            DraftField::ContentHash => &mut self.content_hash,
            DraftField::Content => &mut self.content,
            DraftField::Custodian => &mut self.custodian,
            DraftField::Latitude => &mut self.latitude,
            DraftField::Longitude => &mut self.longitude,
        }
    }

    /// Check every rule in field order and return typed values.
    pub fn validate(&self) -> Result<ValidatedEvidence, ValidationError> {
        let case_number = parse_counter(DraftField::CaseNumber, &self.case_number)?;
        let fir_number = parse_counter(DraftField::FirNumber, &self.fir_number)?;

        if self.content_hash.trim().is_empty() {
            return Err(ValidationError::new(
                DraftField::ContentHash,
                "IPFS Hash is required",
            ));
        }
        if self.content.is_empty() {
            return Err(ValidationError::new(DraftField::Content, "Content is required"));
        }

        let custodian = self.custodian.trim();
        SuiAddress::parse(custodian).map_err(|_| {
            ValidationError::new(
                DraftField::Custodian,
                "Valid Head Address is required (must start with 0x)",
            )
        })?;

        let latitude = Coordinate::parse(DraftField::Latitude, &self.latitude)?;
        let longitude = Coordinate::parse(DraftField::Longitude, &self.longitude)?;

        Ok(ValidatedEvidence {
            case_number,
            fir_number,
            content_hash: self.content_hash.trim().as_bytes().to_vec(),
            content: self.content.as_bytes().to_vec(),
            access_enabled: self.access_enabled,
            custodian: custodian.to_string(),
            latitude,
            longitude,
        })
    }
}

fn parse_counter(field: DraftField, raw: &str) -> Result<u64, ValidationError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ValidationError::new(field, format!("Valid {} is required", field.label())))
}

/// A validated decimal coordinate. Keeps the entered text for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    text: String,
    value: f64,
}

impl Coordinate {
    fn parse(field: DraftField, raw: &str) -> Result<Self, ValidationError> {
        let text = raw.trim();
        let value = text
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                ValidationError::new(field, format!("Valid {} is required", field.label()))
            })?;
        Ok(Self {
            text: text.to_string(),
            value,
        })
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Shortest decimal rendering of the parsed value ("1.0" becomes "1").
    pub fn canonical(&self) -> String {
        self.value.to_string()
    }
}

/// Typed, validated submission values.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedEvidence {
    pub case_number: u64,
    pub fir_number: u64,
    /// Content hash text encoded as raw bytes.
    pub content_hash: Vec<u8>,
    /// Content text encoded as raw bytes.
    pub content: Vec<u8>,
    pub access_enabled: bool,
    /// Custodian address as entered, surrounding whitespace removed.
    pub custodian: String,
    pub latitude: Coordinate,
    pub longitude: Coordinate,
}
