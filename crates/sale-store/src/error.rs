//! # Store Error Types
//!
//! The transport error of the remote store.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  reqwest::Error / HTTP status / JSON decode                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← Adds categorization                        │
//! │       │                                                                 │
//! │       ├──► Loadable::Failed  (loader keeps the last error)             │
//! │       ▼                                                                 │
//! │  ScreenError (sale-screen) ← Serialized for the presentation           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `StoreError` is `Clone` so a failed load can be kept in its status slot
//! and also reported.

use sale_core::{EntityId, EntityKind};
use thiserror::Error;

/// Remote store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The request never produced a response.
    ///
    /// ## When This Occurs
    /// - Connection refused or reset
    /// - DNS failure
    /// - Transport timeout
    #[error("Network error: {0}")]
    Network(String),

    /// The store answered with a non-success status.
    #[error("Remote store returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The requested record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: EntityId },

    /// A response body could not be read as the expected type.
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// The store could not be set up (bad base URL, TLS backend).
    #[error("Store configuration error: {0}")]
    Config(String),

    /// Internal store error.
    #[error("Internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Creates a NotFound error.
    pub fn not_found(kind: EntityKind, id: EntityId) -> Self {
        StoreError::NotFound { kind, id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Convert reqwest errors to StoreError.
///
/// ## Error Mapping
/// ```text
/// is_decode()   → StoreError::Decode
/// is_builder()  → StoreError::Config
/// other         → StoreError::Network
/// ```
impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else if err.is_builder() {
            StoreError::Config(err.to_string())
        } else {
            StoreError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
