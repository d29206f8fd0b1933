//! # Validation Rules
//!
//! Field-level checks run on `SaleFormValues` before any payload is built.
//!
//! Two entry points:
//! - The single-field validators (`require_sale_date`, `parse_final_price`,
//!   `require_selection`) are what payload construction calls; the first
//!   failure stops it.
//! - [`validate_form`] runs every check and reports all failing fields at
//!   once, keyed by wire field name, for the presentation to mark.

use std::collections::BTreeMap;
use std::fmt::Display;

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::form::{fields, FieldValue, SaleFormValues};
use crate::money::Money;
use crate::reference::{parse_id, to_reference_list};
use crate::temporal::to_wire_in;

// =============================================================================
// Single-field Validators
// =============================================================================

/// The sale date must be present and non-blank.
pub fn require_sale_date(value: Option<&str>) -> ValidationResult<&str> {
    match value {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(ValidationError::required(fields::SALE_DATE)),
    }
}

/// Reads the final price from what the form holds.
///
/// ## Rules
/// - Absent or blank → `Required`
/// - Non-numeric text, NaN or infinity → `NotANumber`
/// - Below zero → `Negative`
pub fn parse_final_price(value: Option<&FieldValue>) -> ValidationResult<Money> {
    let value = match value {
        Some(v) if !v.is_blank() => v,
        _ => return Err(ValidationError::required(fields::FINAL_PRICE)),
    };

    let not_a_number = || ValidationError::NotANumber {
        field: fields::FINAL_PRICE.to_string(),
        value: value.to_string(),
    };

    let money = match value {
        FieldValue::Integer(n) => n.checked_mul(100).map(Money::from_cents),
        FieldValue::Decimal(f) => Money::from_decimal(*f),
        FieldValue::Text(s) => s.parse::<Money>().ok(),
    }
    .ok_or_else(not_a_number)?;

    if money.is_negative() {
        return Err(ValidationError::Negative {
            field: fields::FINAL_PRICE.to_string(),
        });
    }
    Ok(money)
}

/// A single-select must hold a non-blank value.
pub fn require_selection<'a>(
    field: &str,
    value: Option<&'a FieldValue>,
) -> ValidationResult<&'a FieldValue> {
    match value {
        Some(v) if !v.is_blank() => Ok(v),
        _ => Err(ValidationError::required(field)),
    }
}

// =============================================================================
// Whole-form Report
// =============================================================================

/// Every failing field of a form, keyed by wire field name.
///
/// Serializes as a plain object: `{"finalPrice": "finalPrice is required"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error; the first one recorded for a field is kept.
    pub fn insert(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (_, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            f.write_str(message)?;
            first = false;
        }
        Ok(())
    }
}

/// Runs every field check in the process's local zone.
pub fn validate_form(values: &SaleFormValues) -> Result<(), FieldErrors> {
    validate_form_in(values, &Local)
}

/// Runs every field check, interpreting the date in `tz`.
///
/// Device resolution against the loaded collection is not checked here; it
/// needs the collection and happens when the payload is built.
pub fn validate_form_in<Tz: TimeZone>(
    values: &SaleFormValues,
    tz: &Tz,
) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    if let Some(id) = values.id.as_ref().filter(|v| !v.is_blank()) {
        if let Err(e) = parse_id(id) {
            errors.insert(fields::ID, e.to_string());
        }
    }

    match require_sale_date(values.sale_date.as_deref()) {
        Ok(date) => {
            if let Err(e) = to_wire_in(date, tz) {
                errors.insert(fields::SALE_DATE, e.to_string());
            }
        }
        Err(e) => errors.insert(fields::SALE_DATE, e.to_string()),
    }

    if let Err(e) = parse_final_price(values.final_price.as_ref()) {
        errors.insert(fields::FINAL_PRICE, e.to_string());
    }

    match require_selection(fields::DEVICE, values.device.as_ref()) {
        Ok(device) => {
            if let Err(e) = parse_id(device) {
                errors.insert(fields::DEVICE, e.to_string());
            }
        }
        Err(e) => errors.insert(fields::DEVICE, e.to_string()),
    }

    if let Err(e) = to_reference_list(Some(&values.customizations)) {
        errors.insert(fields::CUSTOMIZATIONS, e.to_string());
    }
    if let Err(e) = to_reference_list(Some(&values.addons)) {
        errors.insert(fields::ADDONS, e.to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
