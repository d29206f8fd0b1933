//! # Wire Types
//!
//! The shapes exchanged with the remote store.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Wire Types                                      │
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │      Sale       │──── device ─────────► Reference { id } ──► Device  │
//! │  │  ─────────────  │                                                   │
//! │  │  id?            │──── customizations ─► [Reference] ──► Customization│
//! │  │  saleDate       │                                                   │
//! │  │  finalPrice     │──── addons ─────────► [Reference] ──► Addon        │
//! │  └─────────────────┘                                                   │
//! │                                                                         │
//! │  Customization.sales / Addon.sales point back to Sales. The screen     │
//! │  never writes them; the store maintains the inverse side.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `Sale` is what the store returns and may be partially filled; every
//! field is optional. `SalePayload` is what the screen sends and has every
//! required field present by construction.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::money::Money;

/// Numeric identity assigned by the remote store.
pub type EntityId = i64;

// =============================================================================
// Entity Kind
// =============================================================================

/// The four entity kinds the Sale screens touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Sale,
    Device,
    Customization,
    Addon,
}

impl EntityKind {
    /// REST resource segment for this kind (`/api/{resource}`).
    pub const fn resource(&self) -> &'static str {
        match self {
            EntityKind::Sale => "sales",
            EntityKind::Device => "devices",
            EntityKind::Customization => "customizations",
            EntityKind::Addon => "addons",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Sale => write!(f, "Sale"),
            EntityKind::Device => write!(f, "Device"),
            EntityKind::Customization => write!(f, "Customization"),
            EntityKind::Addon => write!(f, "Addon"),
        }
    }
}

// =============================================================================
// Reference
// =============================================================================

/// A pointer-by-identity to another entity.
///
/// Deserializing a full entity object into a `Reference` keeps only its
/// `id`; the other fields are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Reference {
    #[ts(type = "number")]
    pub id: EntityId,
}

impl Reference {
    #[inline]
    pub const fn new(id: EntityId) -> Self {
        Reference { id }
    }
}

// =============================================================================
// Referenced Entities
// =============================================================================

/// A device that can be sold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    #[ts(type = "number")]
    pub id: EntityId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Price before customizations and addons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub base_price: Option<Money>,

    /// ISO 4217 currency code of `base_price`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl Device {
    /// A device carrying only its identity.
    pub fn new(id: EntityId) -> Self {
        Device {
            id,
            code: None,
            name: None,
            description: None,
            base_price: None,
            currency: None,
        }
    }

    pub fn reference(&self) -> Reference {
        Reference::new(self.id)
    }
}

/// A customization that can be applied to a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customization {
    #[ts(type = "number")]
    pub id: EntityId,

    /// Identity in the upstream catalogue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub external_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<Reference>,

    /// Back-reference maintained by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sales: Option<Vec<Reference>>,
}

impl Customization {
    pub fn new(id: EntityId) -> Self {
        Customization {
            id,
            external_id: None,
            name: None,
            description: None,
            device: None,
            sales: None,
        }
    }
}

/// An addon sold together with a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Addon {
    #[ts(type = "number")]
    pub id: EntityId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub external_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub price: Option<Money>,

    /// Running price from which this addon is free. Negative means never.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub free_from_price: Option<Money>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<Reference>,

    /// Back-reference maintained by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sales: Option<Vec<Reference>>,
}

impl Addon {
    pub fn new(id: EntityId) -> Self {
        Addon {
            id,
            external_id: None,
            name: None,
            description: None,
            price: None,
            free_from_price: None,
            device: None,
            sales: None,
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A Sale as returned by the remote store.
///
/// Fields the screen does not know about are kept in `extra` so that an
/// update sends them back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub id: Option<EntityId>,

    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub sale_date: Option<DateTime<Utc>>,

    #[serde(default)]
    #[ts(type = "number | null")]
    pub final_price: Option<Money>,

    #[serde(default)]
    pub device: Option<Reference>,

    #[serde(default)]
    pub customizations: Option<Vec<Reference>>,

    #[serde(default)]
    pub addons: Option<Vec<Reference>>,

    #[serde(flatten)]
    #[ts(skip)]
    pub extra: BTreeMap<String, Value>,
}

impl Sale {
    /// Whether the store has assigned an identity.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// The create/update body for a Sale.
///
/// ```json
/// {
///   "id": 7,
///   "saleDate": "2024-01-01T10:00:00Z",
///   "finalPrice": 199.99,
///   "device": { "id": 3 },
///   "customizations": [{ "id": 1 }],
///   "addons": []
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub id: Option<EntityId>,

    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,

    #[ts(type = "number")]
    pub final_price: Money,

    pub device: Reference,

    pub customizations: Vec<Reference>,

    pub addons: Vec<Reference>,

    #[serde(flatten)]
    #[ts(skip)]
    pub extra: BTreeMap<String, Value>,
}

// =============================================================================
// Unit Tests
// =============================================================================
