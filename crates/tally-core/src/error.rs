//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - General domain errors                          │
//! │  ├── ValidationError  - One failed rule on one input                   │
//! │  └── FormErrors       - ValidationErrors grouped by form field         │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  dashboard errors (in app)                                             │
//! │  ├── RecordError      - Sale recorder outcome (validation/auth/db)     │
//! │  └── ApiError         - What the HTTP caller sees                      │
//! │                                                                         │
//! │  Flow: ValidationError → FormErrors → RecordError → SalesFormState     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::types::FormField;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A decimal computation left the representable range.
    #[error("Arithmetic overflow while computing {0}")]
    Overflow(String),

    /// Stored value could not be decoded back into a domain type.
    #[error("Invalid stored value for {field}: {value}")]
    InvalidStoredValue { field: String, value: String },

    /// A draft could not be encoded into form fields.
    #[error("Failed to encode form field: {0}")]
    Encoding(#[from] serde_json::Error),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// The `field` carried by each variant is the human label used in the
/// message ("quantity", "sub total"). The form key the error is reported
/// under is chosen by the caller when pushing into [`FormErrors`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("Please enter a {field}.")]
    Required { field: String },

    /// Value must be strictly greater than zero.
    #[error("Please enter a {field} greater than 0.")]
    MustBePositive { field: String },

    /// Value may be zero but not negative.
    #[error("The {field} cannot be negative.")]
    Negative { field: String },

    /// Value is larger than another value it is bounded by.
    #[error("The {field} cannot exceed the {limit}.")]
    Exceeds { field: String, limit: String },

    /// Invalid format (e.g., non-numeric amount, malformed date).
    #[error("The {field} is invalid: {reason}.")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("Please select a {field} ({}).", .allowed.join(" or "))]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value within one submission.
    #[error("The {field} '{value}' appears more than once.")]
    Duplicate { field: String, value: String },

    /// Referenced record does not exist.
    #[error("The {field} '{value}' does not exist.")]
    Unknown { field: String, value: String },

    /// Numeric value is too large to compute with.
    #[error("The {field} is too large.")]
    TooLarge { field: String },

    /// Exact result needs more decimal places than can be stored.
    #[error("The {field} has too many decimal places.")]
    TooPrecise { field: String },

    /// Error on one row of a multi-row field (1-based row).
    #[error("Item {row}: {source}")]
    Row {
        row: usize,
        source: Box<ValidationError>,
    },
}

impl ValidationError {
    /// Wraps this error as belonging to a numbered row.
    pub fn at_row(self, row: usize) -> Self {
        ValidationError::Row {
            row,
            source: Box::new(self),
        }
    }
}

// =============================================================================
// Form Errors
// =============================================================================

/// Validation failures grouped by the form field they belong to.
///
/// Serializes to `{ "salesDate": ["..."], "items": ["...", "..."] }`, the
/// shape the form renderer shows next to each input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<FormField, Vec<String>>);

impl FormErrors {
    /// Creates an empty error set.
    pub fn new() -> Self {
        FormErrors::default()
    }

    /// Records one error against a field.
    pub fn push(&mut self, field: FormField, err: ValidationError) {
        self.0.entry(field).or_default().push(err.to_string());
    }

    /// True when no field has failed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for one field.
    pub fn get(&self, field: FormField) -> &[String] {
        self.0.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Fields that have at least one error.
    pub fn fields(&self) -> impl Iterator<Item = FormField> + '_ {
        self.0.keys().copied()
    }

    /// Returns `Ok(value)` when empty, otherwise `Err(self)`.
    pub fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
