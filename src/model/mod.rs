//! Widget data model

pub mod validate;
pub mod widget;

pub use validate::{validate_spec, validate_widget};
pub use widget::{
    allowed_fields, default_fields, default_layout, default_title, derive_api_url, generate_id,
    Widget, WidgetLayout, WidgetSpec, WidgetType, POPULAR_SYMBOLS,
};
