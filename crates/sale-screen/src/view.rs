//! # Screen View
//!
//! The snapshot a presentation layer renders from. It is rebuilt from the
//! screen on every call to [`SaleScreen::view`](crate::SaleScreen::view)
//! and holds no reference back to it.
//!
//! ## Shape
//! ```json
//! {
//!   "state": "edit_existing",
//!   "isNew": false,
//!   "saleId": 7,
//!   "loading": false,
//!   "updating": false,
//!   "device": { "status": "loaded", "disabled": false,
//!               "options": [{ "value": "3", "label": "3" }] },
//!   "addons": { "status": "failed", "disabled": true, "options": [] },
//!   "defaultValues": { "saleDate": "2024-01-01T10:00", "device": "3", ... },
//!   "warnings": ["Addon list could not be loaded: Network error: down"],
//!   "error": null,
//!   "fieldErrors": {}
//! }
//! ```

use sale_core::display::{sale_detail, SaleDetail};
use sale_core::validation::FieldErrors;
use sale_core::{EntityId, Money, SaleFormValues};
use sale_store::RemoteStore;
use serde::Serialize;
use ts_rs::TS;

use crate::error::ScreenError;
use crate::loader::{LoadStatus, Loadable};
use crate::machine::{SaleScreen, ScreenState};
use crate::navigation::{edit_path, list_path};

/// One option of a select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// A select bound to one collection.
///
/// Disabled and empty unless its collection is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct SelectField {
    pub status: LoadStatus,
    pub disabled: bool,
    pub options: Vec<SelectOption>,
}

impl SelectField {
    fn from_slot<T>(slot: &Loadable<Vec<T>>, id: impl Fn(&T) -> EntityId) -> Self {
        let options = slot
            .value()
            .map(|items| {
                items
                    .iter()
                    .map(|item| {
                        let value = id(item).to_string();
                        SelectOption {
                            label: value.clone(),
                            value,
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        SelectField {
            status: slot.status(),
            disabled: !slot.is_loaded(),
            options,
        }
    }

    fn idle() -> Self {
        SelectField {
            status: LoadStatus::Idle,
            disabled: true,
            options: Vec::new(),
        }
    }
}

/// Read-only rendering of a Sale with its links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DetailView {
    #[serde(flatten)]
    #[ts(flatten)]
    pub sale: SaleDetail,
    pub back_path: String,
    pub edit_path: Option<String>,
}

/// Everything a render needs.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ScreenView {
    pub instance: String,
    pub state: ScreenState,
    pub is_new: bool,
    #[ts(type = "number | null")]
    pub sale_id: Option<EntityId>,
    /// A fetch the current mode depends on is in flight.
    pub loading: bool,
    /// A submit is in flight.
    pub updating: bool,
    pub sale_status: LoadStatus,
    pub device: SelectField,
    pub customizations: SelectField,
    pub addons: SelectField,
    pub default_values: Option<SaleFormValues>,
    /// Values the form shows: the last submitted ones if any, else defaults.
    pub values: Option<SaleFormValues>,
    pub detail: Option<DetailView>,
    #[ts(type = "number | null")]
    pub suggested_price: Option<Money>,
    /// Non-fatal problems, one per failed collection.
    pub warnings: Vec<String>,
    pub error: Option<ScreenError>,
    #[ts(type = "Record<string, string>")]
    pub field_errors: FieldErrors,
}

impl ScreenView {
    pub(crate) fn build<S: RemoteStore>(screen: &SaleScreen<S>) -> Self {
        let state = screen.state();
        let instance = screen.instance_id().to_string();

        let Some(ctx) = screen.context() else {
            return ScreenView {
                instance,
                state,
                is_new: false,
                sale_id: None,
                loading: false,
                updating: false,
                sale_status: LoadStatus::Idle,
                device: SelectField::idle(),
                customizations: SelectField::idle(),
                addons: SelectField::idle(),
                default_values: None,
                values: None,
                detail: None,
                suggested_price: None,
                warnings: Vec::new(),
                error: None,
                field_errors: FieldErrors::new(),
            };
        };

        let detail = match (state, ctx.sale.value()) {
            (ScreenState::Detail, Some(sale)) => Some(DetailView {
                sale: sale_detail(sale),
                back_path: list_path(),
                edit_path: sale.id.or(ctx.sale_id).map(edit_path),
            }),
            _ => None,
        };

        let warnings = ctx
            .collections
            .failures()
            .into_iter()
            .map(|(kind, err)| format!("{} list could not be loaded: {}", kind, err))
            .collect();

        let values = screen.form_values();
        let suggested_price = values.as_ref().and_then(|v| screen.suggested_price(v));

        ScreenView {
            instance,
            state,
            is_new: ctx.is_new(),
            sale_id: ctx.sale_id,
            loading: ctx.sale.is_loading() || ctx.collections.any_loading(),
            updating: state == ScreenState::Submitting,
            sale_status: ctx.sale.status(),
            device: SelectField::from_slot(&ctx.collections.devices, |d| d.id),
            customizations: SelectField::from_slot(&ctx.collections.customizations, |c| c.id),
            addons: SelectField::from_slot(&ctx.collections.addons, |a| a.id),
            default_values: screen.default_values(),
            values,
            detail,
            suggested_price,
            warnings,
            error: ctx.last_error.clone(),
            field_errors: ctx.field_errors.clone(),
        }
    }
}
