//! # Demo Data
//!
//! Populates an in-memory store for `--memory` runs, so the screens can be
//! exercised without a remote store.
//!
//! ## Seeded Records
//! - Devices 1-3, each with a base price
//! - Customizations 1-4 bound to devices
//! - Addons 1-3, one of them free from 500.00
//! - Sale 1 on device 2

use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use sale_core::{Addon, Customization, Device, Money, Reference, Sale};
use sale_store::{MemoryStore, StoreResult};

/// Devices for the demo store: (id, code, name, base price in cents)
const DEVICES: &[(i64, &str, &str, i64)] = &[
    (1, "DISP001", "Compact Display", 19_900),
    (2, "DISP002", "Wide Display", 34_900),
    (3, "TERM001", "Handheld Terminal", 45_000),
];

/// Customizations: (id, name, device id)
const CUSTOMIZATIONS: &[(i64, &str, i64)] = &[
    (1, "Engraving", 1),
    (2, "Matte Finish", 2),
    (3, "Custom Colour", 2),
    (4, "Rugged Case", 3),
];

/// Addons: (id, name, price in cents, free-from price in cents)
const ADDONS: &[(i64, &str, i64, i64)] = &[
    (1, "Wall Mount", 2_500, -1),
    (2, "Extended Warranty", 4_900, 50_000),
    (3, "Charging Dock", 3_900, -1),
];

/// Builds the seeded store.
pub fn demo_store() -> StoreResult<MemoryStore> {
    let devices = DEVICES.iter().map(|&(id, code, name, price)| Device {
        code: Some(code.to_string()),
        name: Some(name.to_string()),
        base_price: Some(Money::from_cents(price)),
        currency: Some("EUR".to_string()),
        ..Device::new(id)
    });

    let customizations = CUSTOMIZATIONS.iter().map(|&(id, name, device)| Customization {
        name: Some(name.to_string()),
        device: Some(Reference::new(device)),
        ..Customization::new(id)
    });

    let addons = ADDONS.iter().map(|&(id, name, price, free_from)| Addon {
        name: Some(name.to_string()),
        price: Some(Money::from_cents(price)),
        free_from_price: Some(Money::from_cents(free_from)),
        ..Addon::new(id)
    });

    let sale = Sale {
        id: Some(1),
        sale_date: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).single(),
        final_price: Some(Money::from_cents(37_400)),
        device: Some(Reference::new(2)),
        customizations: Some(vec![Reference::new(2)]),
        addons: Some(vec![Reference::new(1)]),
        extra: BTreeMap::new(),
    };

    MemoryStore::new()
        .with(devices)?
        .with(customizations)?
        .with(addons)?
        .with([sale])
}
