//! # Suggested Price
//!
//! A non-binding final price for the current selection: the device's base
//! price plus each selected addon, where an addon is free once the running
//! price has reached its `free_from_price` threshold.
//!
//! ```text
//! base 500.00 ──► + case (free from 400.00)   → 500.00   (threshold reached)
//!             ──► + charger (never free, 25)  → 525.00
//! ```
//!
//! The user always has the last word; the suggestion is only shown.

use crate::form::{fields, SaleFormValues};
use crate::money::Money;
use crate::reference::to_reference_list;
use crate::types::{Addon, Device};
use crate::validation::require_selection;

/// Whether `addon` costs nothing at the given running price.
///
/// A negative or absent threshold means the addon is never free.
pub fn is_free_at(addon: &Addon, running: Money) -> bool {
    match addon.free_from_price {
        Some(threshold) => !threshold.is_negative() && running >= threshold,
        None => false,
    }
}

/// Base price of `device` plus `addons`, applied in order.
///
/// Returns `None` when the device has no base price or the total does not
/// fit in `Money`.
pub fn suggest_final_price<'a, I>(device: &Device, addons: I) -> Option<Money>
where
    I: IntoIterator<Item = &'a Addon>,
{
    let mut running = device.base_price?;
    for addon in addons {
        if !is_free_at(addon, running) {
            running = running.checked_add(addon.price.unwrap_or_default())?;
        }
    }
    Some(running)
}

/// Suggestion for what the form currently holds.
///
/// `None` when no device is selected, the selection is not in `devices`, the
/// device has no base price, or the addon selection does not parse. Selected
/// addons missing from `addons` are ignored.
pub fn suggest_for_form(
    values: &SaleFormValues,
    devices: &[Device],
    addons: &[Addon],
) -> Option<Money> {
    let selected = require_selection(fields::DEVICE, values.device.as_ref()).ok()?;
    let key = selected.to_string();
    let device = devices.iter().find(|d| d.id.to_string() == key.trim())?;

    let chosen = to_reference_list(Some(&values.addons)).ok()?;
    let chosen_addons = chosen
        .iter()
        .filter_map(|r| addons.iter().find(|a| a.id == r.id));

    suggest_final_price(device, chosen_addons)
}

// =============================================================================
// Unit Tests
// =============================================================================
