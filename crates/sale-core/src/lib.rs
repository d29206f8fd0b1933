//! # sale-core: Pure Conversion Logic for the Sale Admin Screens
//!
//! This crate holds every piece of the Sale screens that can be expressed
//! as a pure function: the wire types, the form-native types and the
//! conversions between them.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sale Admin Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Presentation (console / web)                 │   │
//! │  │         Detail screen ──► Edit screen ──► Submit button         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ ScreenView / SaleFormValues            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    sale-screen (state machine)                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ sale-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ reference │  │ temporal  │  │   form    │  │ validation│  │   │
//! │  │   │  mapper   │  │   codec   │  │  payload  │  │   rules   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Wire types (Sale, Device, Customization, Addon, Reference)
//! - [`money`] - Money type with integer cents
//! - [`reference`] - Reference mapper (form ids <-> `{id}` objects)
//! - [`temporal`] - Temporal codec (UTC timestamps <-> local form strings)
//! - [`form`] - Form values, default derivation, payload construction
//! - [`validation`] - Field validation rules
//! - [`pricing`] - Suggested final price
//! - [`display`] - Read-only detail formatting
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use sale_core::reference::{to_form_ids, to_reference_list};
//! use sale_core::types::Reference;
//!
//! let refs = to_reference_list(Some(["1", "2"])).unwrap();
//! assert_eq!(refs, vec![Reference::new(1), Reference::new(2)]);
//! assert_eq!(to_form_ids(Some(&refs)), vec!["1", "2"]);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod display;
pub mod error;
pub mod form;
pub mod money;
pub mod pricing;
pub mod reference;
pub mod temporal;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError, ValidationResult};
pub use form::{FieldValue, SaleFormValues};
pub use money::Money;
pub use types::*;
