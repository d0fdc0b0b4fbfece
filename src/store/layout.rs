//! Layout reconciliation
//!
//! Two algorithms: placement for newly added widgets (append below the
//! lowest occupied row, no horizontal packing) and the bulk positional
//! merge applied when the grid surface reports widget positions back.

use crate::model::Widget;
use serde::{Deserialize, Serialize};

/// Position and size reported by the grid surface for one widget.
/// Resize bounds are owned by the store and never echoed back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPosition {
    pub id: String,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Grid slot for the next added widget: column 0, directly below the
/// bottom edge of the lowest existing widget. Trades density for a
/// guaranteed absence of overlap.
pub fn next_position(widgets: &[Widget]) -> (u32, u32) {
    let max_y = widgets
        .iter()
        .map(|w| w.layout.y + w.layout.h)
        .max()
        .unwrap_or(0);
    (0, max_y)
}

/// Overwrite `x, y, w, h` of every widget with a matching reported id.
/// Unmatched widgets keep their layout; resize bounds are untouched; the
/// collection is never reordered or resized. Idempotent.
pub fn merge_positions(widgets: &mut [Widget], reported: &[GridPosition]) {
    for widget in widgets.iter_mut() {
        if let Some(pos) = reported.iter().find(|p| p.id == widget.id) {
            widget.layout.x = pos.x;
            widget.layout.y = pos.y;
            widget.layout.w = pos.w;
            widget.layout.h = pos.h;
        }
    }
}
