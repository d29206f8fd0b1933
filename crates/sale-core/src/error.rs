//! # Error Types
//!
//! Domain-specific error types for sale-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  sale-core errors (this file)                                          │
//! │  ├── CoreError        - Local conversion failures                      │
//! │  │   ├── InvalidReference    (mapper, id coercion)                     │
//! │  │   ├── InvalidTimestamp    (temporal codec)                          │
//! │  │   └── UnresolvedReference (device lookup)                           │
//! │  └── ValidationError  - Form field failures                            │
//! │                                                                         │
//! │  sale-store errors (separate crate)                                    │
//! │  └── StoreError       - Transport failures                             │
//! │                                                                         │
//! │  sale-screen errors                                                    │
//! │  └── ScreenError      - What the presentation sees (serialized)        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                  │
//! │                         StoreError ─┴→ ScreenError → Presentation      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `CoreError` is recoverable by re-prompting the user. None of them
//! is ever sent to the remote store.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Local conversion errors.
///
/// These are raised before a submit is dispatched and block the transition
/// to `Submitting`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A selected identifier is not a finite integer.
    ///
    /// ## When This Occurs
    /// - A multi-select sends a value such as `"abc"` or `"1.5"`
    /// - The read-only `id` field was tampered with
    #[error("Invalid reference '{value}': {reason}")]
    InvalidReference { value: String, reason: String },

    /// A form date-time string could not be converted to an instant.
    ///
    /// ## When This Occurs
    /// - The string does not have the `YYYY-MM-DDTHH:mm` shape
    /// - The local time falls in a daylight-saving gap
    #[error("Invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    /// A selected identity does not match any loaded entity.
    ///
    /// ## User Workflow
    /// ```text
    /// Device select: "9"
    ///      │
    ///      ▼
    /// Loaded devices: [3, 4]
    ///      │
    ///      ▼
    /// UnresolvedReference { field: "device", id: "9" }
    ///      │
    ///      ▼
    /// UI asks for a new selection
    /// ```
    #[error("{field} '{id}' does not match any loaded entry")]
    UnresolvedReference { field: String, id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidReference error.
    pub fn invalid_reference(value: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidReference {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Creates an InvalidTimestamp error.
    pub fn invalid_timestamp(value: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidTimestamp {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Name of the form field this error belongs to, when known.
    pub fn field(&self) -> Option<&str> {
        match self {
            CoreError::UnresolvedReference { field, .. } => Some(field),
            CoreError::Validation(e) => Some(e.field()),
            CoreError::InvalidReference { .. } | CoreError::InvalidTimestamp { .. } => None,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Form field validation errors.
///
/// Used for early validation before any conversion runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field is not a number.
    #[error("{field} must be a number, got '{value}'")]
    NotANumber { field: String, value: String },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., malformed date, unparseable id).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates a Required error.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// The form field this error belongs to.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::NotANumber { field, .. }
            | ValidationError::Negative { field }
            | ValidationError::InvalidFormat { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Convenience type alias for Results with ValidationError.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::UnresolvedReference {
            field: "device".to_string(),
            id: "9".to_string(),
        };
        assert_eq!(err.to_string(), "device '9' does not match any loaded entry");

        let err = CoreError::invalid_reference("abc", "not an integer");
        assert_eq!(err.to_string(), "Invalid reference 'abc': not an integer");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("saleDate");
        assert_eq!(err.to_string(), "saleDate is required");

        let err = ValidationError::NotANumber {
            field: "finalPrice".to_string(),
            value: "ten".to_string(),
        };
        assert_eq!(err.to_string(), "finalPrice must be a number, got 'ten'");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("device").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.field(), Some("device"));
    }
}
