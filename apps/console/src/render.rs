//! # Text Rendering
//!
//! Plain-text rendering of a [`ScreenView`] for the terminal. `--json`
//! bypasses this and prints the view through serde instead.

use std::fmt::{self, Display, Formatter};

use sale_core::{FieldValue, SaleFormValues};
use sale_screen::{LoadStatus, ScreenState, ScreenView, SelectField};

/// Displays a view as aligned `label: value` lines.
pub struct TextView<'a>(pub &'a ScreenView);

impl Display for TextView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let view = self.0;

        writeln!(f, "{}", heading(view))?;

        if view.loading {
            writeln!(f, "  (loading)")?;
        }

        if let Some(detail) = &view.detail {
            line(f, "Date", &detail.sale.sale_date)?;
            line(f, "Final price", &detail.sale.final_price)?;
            line(f, "Device", &detail.sale.device)?;
            line(f, "Customizations", &detail.sale.customizations)?;
            line(f, "Addons", &detail.sale.addons)?;
            line(f, "Back", &detail.back_path)?;
            if let Some(edit) = &detail.edit_path {
                line(f, "Edit", edit)?;
            }
        } else if view.state == ScreenState::Detail && view.sale_status == LoadStatus::Failed {
            writeln!(f, "  Sale could not be loaded")?;
        }

        if let Some(values) = &view.values {
            if view.state != ScreenState::Detail {
                form(f, values)?;
                if let Some(price) = view.suggested_price {
                    line(f, "Suggested price", &price.to_string())?;
                }
                select(f, "Device options", &view.device)?;
                select(f, "Customization options", &view.customizations)?;
                select(f, "Addon options", &view.addons)?;
            }
        }

        for warning in &view.warnings {
            writeln!(f, "warning: {}", warning)?;
        }

        if let Some(error) = &view.error {
            writeln!(f, "error: {}", error)?;
        }

        for (field, message) in view.field_errors.iter() {
            writeln!(f, "  {}: {}", field, message)?;
        }

        Ok(())
    }
}

fn heading(view: &ScreenView) -> String {
    match (view.state, view.sale_id) {
        (ScreenState::Detail, Some(id)) => format!("Sale {}", id),
        (ScreenState::SubmitSucceeded, _) => "Sale saved".to_string(),
        (ScreenState::Unmounted, _) => "Screen closed".to_string(),
        (_, Some(id)) => format!("Edit sale {}", id),
        (_, None) => "New sale".to_string(),
    }
}

fn line(f: &mut Formatter<'_>, label: &str, value: &str) -> fmt::Result {
    writeln!(f, "  {:<22} {}", format!("{}:", label), value)
}

fn form(f: &mut Formatter<'_>, values: &SaleFormValues) -> fmt::Result {
    line(f, "Date", values.sale_date.as_deref().unwrap_or(""))?;
    line(f, "Final price", &optional(values.final_price.as_ref()))?;
    line(f, "Device", &optional(values.device.as_ref()))?;
    line(f, "Customizations", &joined(&values.customizations))?;
    line(f, "Addons", &joined(&values.addons))
}

fn select(f: &mut Formatter<'_>, label: &str, field: &SelectField) -> fmt::Result {
    let value = match field.status {
        LoadStatus::Loaded if field.options.is_empty() => "(none)".to_string(),
        LoadStatus::Loaded => field
            .options
            .iter()
            .map(|o| o.label.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        LoadStatus::Loading => "(loading)".to_string(),
        LoadStatus::Failed => "(unavailable)".to_string(),
        LoadStatus::Idle => "(not requested)".to_string(),
    };
    line(f, label, &value)
}

fn optional(value: Option<&FieldValue>) -> String {
    value.map(ToString::to_string).unwrap_or_default()
}

fn joined(values: &[FieldValue]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
