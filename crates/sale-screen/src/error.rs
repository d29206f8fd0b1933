//! # Screen Error Type
//!
//! The one error type the presentation layer sees.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Sale Screens                       │
//! │                                                                         │
//! │  Submit pressed                                                         │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Local conversion? ─── CoreError::InvalidTimestamp ──┐                  │
//! │         │                                            │                  │
//! │         ▼                                            ▼                  │
//! │  Store request? ────── StoreError::Network ──────► ScreenError ───► UI   │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Success ───────────────────────────────────────────────────────► UI    │
//! │                                                                         │
//! │  Local errors keep the form as is (re-prompt).                          │
//! │  Store errors become the screen-level banner; the user may retry.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serialization
//! ```json
//! {
//!   "code": "UNRESOLVED_REFERENCE",
//!   "message": "device '9' does not match any loaded entry",
//!   "field": "device"
//! }
//! ```

use sale_core::{CoreError, ValidationError};
use sale_store::StoreError;
use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

/// Error surfaced to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct ScreenError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Form field the error belongs to, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Error codes for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A form field failed validation
    ValidationError,

    /// A selected identifier is not an integer
    InvalidReference,

    /// The date field could not be converted
    InvalidTimestamp,

    /// The selected device is not in the loaded collection
    UnresolvedReference,

    /// The remote store failed (network, status, body)
    Transport,

    /// The requested record does not exist
    NotFound,

    /// The operation is not available in the current screen state
    InvalidState,

    /// Internal error
    Internal,
}

impl ScreenError {
    /// Creates a new screen error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ScreenError {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Creates an invalid-state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        ScreenError::new(ErrorCode::InvalidState, message)
    }

    /// Whether the error came from local conversion (re-prompt the user).
    pub fn is_local(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::ValidationError
                | ErrorCode::InvalidReference
                | ErrorCode::InvalidTimestamp
                | ErrorCode::UnresolvedReference
        )
    }
}

/// Converts core errors to screen errors.
impl From<CoreError> for ScreenError {
    fn from(err: CoreError) -> Self {
        let field = err.field().map(str::to_string);
        let code = match &err {
            CoreError::InvalidReference { .. } => ErrorCode::InvalidReference,
            CoreError::InvalidTimestamp { .. } => ErrorCode::InvalidTimestamp,
            CoreError::UnresolvedReference { .. } => ErrorCode::UnresolvedReference,
            CoreError::Validation(_) => ErrorCode::ValidationError,
        };
        let message = match err {
            CoreError::Validation(inner) => inner.to_string(),
            other => other.to_string(),
        };
        ScreenError {
            code,
            message,
            field,
        }
    }
}

impl From<ValidationError> for ScreenError {
    fn from(err: ValidationError) -> Self {
        CoreError::from(err).into()
    }
}

/// Converts store errors to screen errors.
///
/// Transport messages are kept verbatim.
impl From<StoreError> for ScreenError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => ScreenError::new(ErrorCode::NotFound, err.to_string()),
            StoreError::Internal(ref e) => {
                tracing::error!("Internal store error: {}", e);
                ScreenError::new(ErrorCode::Internal, err.to_string())
            }
            StoreError::Network(_)
            | StoreError::Status { .. }
            | StoreError::Decode(_)
            | StoreError::Config(_) => ScreenError::new(ErrorCode::Transport, err.to_string()),
        }
    }
}

/// Result type for screen operations.
pub type ScreenResult<T> = Result<T, ScreenError>;
