//! Read-only detail formatting.

use std::fmt::Display;

use chrono::{Local, TimeZone};
use serde::Serialize;
use ts_rs::TS;

use crate::types::{Reference, Sale};

/// Date format of the detail screen (`DD/MM/YY HH:mm`).
pub const DETAIL_DATE_FORMAT: &str = "%d/%m/%y %H:%M";

/// A Sale rendered as display strings. Absent values are empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetail {
    #[ts(type = "number | null")]
    pub id: Option<i64>,
    pub sale_date: String,
    pub final_price: String,
    pub device: String,
    pub customizations: String,
    pub addons: String,
}

pub fn sale_detail(sale: &Sale) -> SaleDetail {
    sale_detail_in(sale, &Local)
}

pub fn sale_detail_in<Tz>(sale: &Sale, tz: &Tz) -> SaleDetail
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    SaleDetail {
        id: sale.id,
        sale_date: sale
            .sale_date
            .map(|d| d.with_timezone(tz).format(DETAIL_DATE_FORMAT).to_string())
            .unwrap_or_default(),
        final_price: sale.final_price.map(|p| p.to_string()).unwrap_or_default(),
        device: sale.device.map(|d| d.id.to_string()).unwrap_or_default(),
        customizations: join_ids(sale.customizations.as_deref()),
        addons: join_ids(sale.addons.as_deref()),
    }
}

fn join_ids(refs: Option<&[Reference]>) -> String {
    refs.unwrap_or_default()
        .iter()
        .map(|r| r.id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};
    use serde_json::json;

    #[test]
    fn test_detail_formatting() {
        let sale: Sale = serde_json::from_value(json!({
            "id": 7,
            "saleDate": "2024-01-31T23:30:00Z",
            "finalPrice": 199.99,
            "device": {"id": 3},
            "customizations": [{"id": 1}, {"id": 2}],
            "addons": []
        }))
        .unwrap();

        let detail = sale_detail_in(&sale, &Utc);
        assert_eq!(detail.id, Some(7));
        assert_eq!(detail.sale_date, "31/01/24 23:30");
        assert_eq!(detail.final_price, "199.99");
        assert_eq!(detail.device, "3");
        assert_eq!(detail.customizations, "1, 2");
        assert_eq!(detail.addons, "");

        let shifted = sale_detail_in(&sale, &FixedOffset::east_opt(3600).unwrap());
        assert_eq!(shifted.sale_date, "01/02/24 00:30");
    }

    #[test]
    fn test_detail_of_empty_sale() {
        let detail = sale_detail_in(&Sale::default(), &Utc);
        assert_eq!(detail.id, None);
        assert!(detail.sale_date.is_empty());
        assert!(detail.device.is_empty());
        assert!(detail.customizations.is_empty());
    }
}
