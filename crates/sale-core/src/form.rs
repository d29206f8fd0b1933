//! # Form Values
//!
//! The form-native side of a Sale and the two conversions the state machine
//! needs: deriving default values from a loaded entity, and building the
//! outgoing payload from what the user submitted.
//!
//! ## Conversion Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Sale (wire)  ── existing_sale_defaults ──►  SaleFormValues            │
//! │     saleDate       temporal::from_wire          saleDate "…T11:00"      │
//! │     finalPrice     as number                    finalPrice 199.99       │
//! │     device {id}    bare identity                device "3"              │
//! │     [{id}]         reference::to_form_ids       ["1", "2"]              │
//! │                                                                         │
//! │   SaleFormValues  ── build_payload ──►  SalePayload (wire)              │
//! │     id             coerced to integer       id?                         │
//! │     finalPrice     validation::parse_final_price                        │
//! │     saleDate       temporal::to_wire                                    │
//! │     device         resolved in loaded Devices                           │
//! │     lists          reference::to_reference_list                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::reference::{parse_id, to_form_ids, to_reference_list};
use crate::temporal::{from_wire_in, to_wire_in};
use crate::types::{Device, Reference, Sale, SalePayload};
use crate::validation::{parse_final_price, require_sale_date, require_selection};

/// Wire names of the form fields, used as keys in field-level error reports.
pub mod fields {
    pub const ID: &str = "id";
    pub const SALE_DATE: &str = "saleDate";
    pub const FINAL_PRICE: &str = "finalPrice";
    pub const DEVICE: &str = "device";
    pub const CUSTOMIZATIONS: &str = "customizations";
    pub const ADDONS: &str = "addons";
}

// =============================================================================
// Field Value
// =============================================================================

/// What a single form control holds.
///
/// Inputs and selects hand back strings, but a programmatic caller may pass
/// numbers; both are accepted wherever an identity or a price is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Decimal(f64),
    Text(String),
}

impl FieldValue {
    /// Empty or whitespace-only text. Numbers are never blank.
    pub fn is_blank(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Decimal(d) => write!(f, "{}", d),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<&String> for FieldValue {
    fn from(s: &String) -> Self {
        FieldValue::Text(s.clone())
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Integer(n)
    }
}

impl From<&FieldValue> for FieldValue {
    fn from(v: &FieldValue) -> Self {
        v.clone()
    }
}

/// Whole amounts become integers, others decimals, as on the wire.
impl From<Money> for FieldValue {
    fn from(m: Money) -> Self {
        if m.cents() % 100 == 0 {
            FieldValue::Integer(m.units())
        } else {
            FieldValue::Decimal(m.to_decimal())
        }
    }
}

// =============================================================================
// Form Values
// =============================================================================

/// The editable shape of a Sale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleFormValues {
    /// Read-only in the form; present only when editing an existing Sale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | number | null")]
    pub id: Option<FieldValue>,

    /// `YYYY-MM-DDTHH:mm` in local time.
    #[serde(default)]
    pub sale_date: Option<String>,

    #[serde(default)]
    #[ts(type = "string | number | null")]
    pub final_price: Option<FieldValue>,

    /// Selected device identity.
    #[serde(default)]
    #[ts(type = "string | number | null")]
    pub device: Option<FieldValue>,

    #[serde(default)]
    #[ts(type = "Array<string | number>")]
    pub customizations: Vec<FieldValue>,

    #[serde(default)]
    #[ts(type = "Array<string | number>")]
    pub addons: Vec<FieldValue>,
}

// =============================================================================
// Default Derivation
// =============================================================================

/// Defaults for a new Sale: the date and nothing else.
///
/// `now` is a form string, normally `temporal::default_now()` taken once
/// when the screen mounts.
pub fn new_sale_defaults(now: String) -> SaleFormValues {
    SaleFormValues {
        sale_date: Some(now),
        ..Default::default()
    }
}

/// Defaults for editing `sale`, dates rendered in the local zone.
pub fn existing_sale_defaults(sale: &Sale) -> SaleFormValues {
    existing_sale_defaults_in(sale, &Local)
}

/// Defaults for editing `sale`, dates rendered in `tz`.
///
/// Pure: the same entity always yields the same values.
pub fn existing_sale_defaults_in<Tz>(sale: &Sale, tz: &Tz) -> SaleFormValues
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let as_values = |refs: Option<&Vec<Reference>>| -> Vec<FieldValue> {
        to_form_ids(refs).into_iter().map(FieldValue::Text).collect()
    };

    SaleFormValues {
        id: sale.id.map(FieldValue::Integer),
        sale_date: from_wire_in(sale.sale_date.as_ref(), tz),
        final_price: sale.final_price.map(FieldValue::from),
        device: sale.device.map(|d| FieldValue::Text(d.id.to_string())),
        customizations: as_values(sale.customizations.as_ref()),
        addons: as_values(sale.addons.as_ref()),
    }
}

// =============================================================================
// Payload Construction
// =============================================================================

/// Builds the create/update body, interpreting the date in the local zone.
pub fn build_payload(
    previous: Option<&Sale>,
    values: &SaleFormValues,
    devices: &[Device],
) -> CoreResult<SalePayload> {
    build_payload_in(previous, values, devices, &Local)
}

/// Builds the create/update body from submitted form values.
///
/// ## Rules
/// - `id` is coerced to an integer when present, otherwise taken from
///   `previous`
/// - `finalPrice` must be numeric and non-negative
/// - `saleDate` goes through the temporal codec in `tz`
/// - `device` must match a loaded Device by stringified identity
/// - `customizations`/`addons` go through the reference mapper
/// - Unknown fields of `previous` are carried over
///
/// The first failing rule is returned; nothing is sent on error.
pub fn build_payload_in<Tz: TimeZone>(
    previous: Option<&Sale>,
    values: &SaleFormValues,
    devices: &[Device],
    tz: &Tz,
) -> CoreResult<SalePayload> {
    let id = match values.id.as_ref().filter(|v| !v.is_blank()) {
        Some(value) => Some(parse_id(value)?),
        None => previous.and_then(|s| s.id),
    };

    let sale_date = to_wire_in(require_sale_date(values.sale_date.as_deref())?, tz)?;
    let final_price = parse_final_price(values.final_price.as_ref())?;
    let device = resolve_device(
        require_selection(fields::DEVICE, values.device.as_ref())?,
        devices,
    )?;
    let customizations = to_reference_list(Some(&values.customizations))?;
    let addons = to_reference_list(Some(&values.addons))?;

    Ok(SalePayload {
        id,
        sale_date,
        final_price,
        device,
        customizations,
        addons,
        extra: previous.map(|s| s.extra.clone()).unwrap_or_default(),
    })
}

/// Finds the selected device in the loaded collection by its string form.
pub fn resolve_device(selected: &FieldValue, devices: &[Device]) -> CoreResult<Reference> {
    let key = selected.to_string();
    let key = key.trim();
    devices
        .iter()
        .find(|d| d.id.to_string() == key)
        .map(Device::reference)
        .ok_or_else(|| CoreError::UnresolvedReference {
            field: fields::DEVICE.to_string(),
            id: key.to_string(),
        })
}

// =============================================================================
// Unit Tests
// =============================================================================
