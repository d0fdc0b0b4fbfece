//! Construction-time widget validation
//!
//! Applied at every external-data entry point (creation, update, import) so
//! malformed widgets never enter the live collection.

use crate::error::{AppError, Result};
use crate::model::widget::{allowed_fields, Widget, WidgetLayout, WidgetSpec, WidgetType};
use std::collections::HashSet;

/// Check a layout's resize bounds: `w` within `[min_w, max_w]` and `h`
/// within `[min_h, max_h]` for whichever bounds are present.
pub fn validate_layout(layout: &WidgetLayout) -> Result<()> {
    if let Some(min_w) = layout.min_w {
        if layout.w < min_w {
            return Err(AppError::Validation(format!(
                "layout width {} below minimum {}",
                layout.w, min_w
            )));
        }
    }
    if let Some(max_w) = layout.max_w {
        if layout.w > max_w {
            return Err(AppError::Validation(format!(
                "layout width {} above maximum {}",
                layout.w, max_w
            )));
        }
    }
    if let Some(min_h) = layout.min_h {
        if layout.h < min_h {
            return Err(AppError::Validation(format!(
                "layout height {} below minimum {}",
                layout.h, min_h
            )));
        }
    }
    if let Some(max_h) = layout.max_h {
        if layout.h > max_h {
            return Err(AppError::Validation(format!(
                "layout height {} above maximum {}",
                layout.h, max_h
            )));
        }
    }
    Ok(())
}

/// Check the selected fields are a duplicate-free subset of the type's
/// whitelist. Order is preserved for display; membership is what validates.
pub fn validate_fields(widget_type: WidgetType, fields: &[String]) -> Result<()> {
    let allowed: HashSet<&str> = allowed_fields(widget_type).iter().copied().collect();
    let mut seen = HashSet::new();

    for field in fields {
        if !allowed.contains(field.as_str()) {
            return Err(AppError::Validation(format!(
                "field '{}' is not available for {} widgets",
                field,
                widget_type.as_str()
            )));
        }
        if !seen.insert(field.as_str()) {
            return Err(AppError::Validation(format!("duplicate field '{}'", field)));
        }
    }
    Ok(())
}

/// Validate a creation payload before the store mints identity for it
pub fn validate_spec(spec: &WidgetSpec) -> Result<()> {
    validate_fields(spec.widget_type, &spec.selected_fields)?;
    if let Some(layout) = &spec.layout {
        validate_layout(layout)?;
    }
    Ok(())
}

/// Validate a fully-formed widget (used on update and import)
pub fn validate_widget(widget: &Widget) -> Result<()> {
    if widget.id.is_empty() {
        return Err(AppError::Validation("widget id must not be empty".to_string()));
    }
    validate_fields(widget.widget_type, &widget.selected_fields)?;
    validate_layout(&widget.layout)
}
