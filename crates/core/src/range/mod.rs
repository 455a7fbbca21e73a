//! Drag policies layered on [`DraggableManager`](crate::drag::DraggableManager):
//! a single resizable boundary and the reframe/shift interactions of a
//! minimap-like strip.

mod reframer;
mod resizer;

pub use reframer::{RangeChange, RangeReframer, ReframeOverlay, ReframeTarget, StripSpace};
pub use resizer::{DragIndicator, RangeResizer};

use crate::drag::{DragBounds, DragError};

/// Client-space placement of an interactive strip, reported by the host
/// after layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StripRect {
    pub client_x_left: f64,
    pub width: f64,
}

impl StripRect {
    pub fn new(client_x_left: f64, width: f64) -> Self {
        Self {
            client_x_left,
            width,
        }
    }

    pub fn bounds(&self) -> DragBounds {
        DragBounds::new(self.client_x_left, self.width)
    }

    /// Client x of a strip-local `[0, 1]` value.
    pub fn client_x(&self, value: f64) -> f64 {
        self.client_x_left + value * self.width
    }
}

fn strip_bounds(strip: Option<StripRect>, what: &str) -> Result<DragBounds, DragError> {
    strip
        .map(|s| s.bounds())
        .ok_or_else(|| DragError::BoundsUnavailable(format!("{what} strip has no layout")))
}
