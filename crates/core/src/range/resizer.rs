use crate::config::TimelineConfig;
use crate::drag::{DragBounds, DragError, DragHandler, DraggableManager, DraggingUpdate};
use waterfall_protocol::MouseEvent;

use super::{StripRect, strip_bounds};

/// The region swept by an in-progress resize, in strip-local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragIndicator {
    pub left: f64,
    pub width: f64,
}

#[derive(Debug, Clone)]
struct ResizerPolicy {
    position: f64,
    min: f64,
    max: f64,
    right_side: bool,
    strip: Option<StripRect>,
    drag_position: Option<f64>,
    committed: Option<f64>,
}

impl ResizerPolicy {
    /// Strip-local value to boundary position (mirrored for right-anchored
    /// boundaries).
    fn to_position(&self, value: f64) -> f64 {
        if self.right_side { 1.0 - value } else { value }
    }
}

impl DragHandler for ResizerPolicy {
    fn get_bounds(&mut self, _tag: Option<&str>) -> Result<DragBounds, DragError> {
        let bounds = strip_bounds(self.strip, "resizer")?;
        let (min_value, max_value) = if self.right_side {
            (1.0 - self.max, 1.0 - self.min)
        } else {
            (self.min, self.max)
        };
        Ok(bounds.with_min(min_value).with_max(max_value))
    }

    fn on_drag_start(&mut self, update: DraggingUpdate<'_>) {
        self.drag_position = Some(self.to_position(update.value));
    }

    fn on_drag_move(&mut self, update: DraggingUpdate<'_>) {
        self.drag_position = Some(self.to_position(update.value));
    }

    fn on_drag_end(&mut self, mut update: DraggingUpdate<'_>) {
        update.manager.reset_bounds();
        self.drag_position = None;
        self.committed = Some(self.to_position(update.value));
    }
}

/// A single draggable boundary (e.g. the name column divider) constrained to
/// `[min, max]`.
///
/// Intermediate drag positions are only exposed through
/// [`drag_position`](Self::drag_position); the new boundary is reported once,
/// when the drag ends.
#[derive(Debug, Clone)]
pub struct RangeResizer {
    manager: DraggableManager,
    policy: ResizerPolicy,
}

impl RangeResizer {
    pub fn new(position: f64, min: f64, max: f64) -> Self {
        Self {
            manager: DraggableManager::default(),
            policy: ResizerPolicy {
                position,
                min,
                max,
                right_side: false,
                strip: None,
                drag_position: None,
                committed: None,
            },
        }
    }

    /// Divider between the span-name column and the timeline.
    pub fn name_column(config: &TimelineConfig, position: f64) -> Self {
        Self::new(position, config.name_column_min, config.name_column_max)
    }

    /// Measure the boundary from the right edge of the strip.
    pub fn right_side(mut self) -> Self {
        self.policy.right_side = true;
        self
    }

    pub fn position(&self) -> f64 {
        self.policy.position
    }

    pub fn set_position(&mut self, position: f64) {
        self.policy.position = position;
    }

    /// Current layout of the strip; a change invalidates cached bounds.
    pub fn set_strip(&mut self, strip: StripRect) {
        if self.policy.strip != Some(strip) {
            self.policy.strip = Some(strip);
            self.manager.reset_bounds();
        }
    }

    pub fn sync_bounds_invalidator(&mut self, token: f64) {
        self.manager.sync_bounds_invalidator(token);
    }

    pub fn handle_window_resize(&mut self) {
        self.manager.handle_window_resize();
    }

    /// Feed an event that hit the resizer. Returns the new boundary when a
    /// drag ends.
    pub fn handle_event(&mut self, event: MouseEvent) -> Result<Option<f64>, DragError> {
        self.manager.handle_event(event, &mut self.policy)?;
        Ok(self.policy.committed.take())
    }

    /// Feed a global event while the resizer holds the pointer capture.
    pub fn handle_global_event(&mut self, event: MouseEvent) -> Result<Option<f64>, DragError> {
        self.manager.handle_global_event(event, &mut self.policy)?;
        Ok(self.policy.committed.take())
    }

    pub fn is_dragging(&self) -> bool {
        self.manager.is_dragging()
    }

    pub fn drag_position(&self) -> Option<f64> {
        self.policy.drag_position
    }

    /// Where the grip sits in strip-local space.
    pub fn grip_position(&self) -> f64 {
        self.policy.to_position(self.policy.position)
    }

    pub fn drag_indicator(&self) -> Option<DragIndicator> {
        let drag = self.policy.to_position(self.policy.drag_position?);
        let grip = self.grip_position();
        let (left, right) = if drag < grip { (drag, grip) } else { (grip, drag) };
        Some(DragIndicator {
            left,
            width: right - left,
        })
    }

    /// Whether a client x lands on the grip, given its hit width in pixels.
    pub fn hits_grip(&self, client_x: f64, grip_width: f64) -> bool {
        self.policy
            .strip
            .is_some_and(|strip| (client_x - strip.client_x(self.grip_position())).abs() <= grip_width)
    }

    pub fn dispose(&mut self) {
        self.manager.dispose();
        self.policy.drag_position = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn resizer() -> RangeResizer {
        let mut resizer = RangeResizer::new(0.5, 0.1, 0.9);
        resizer.set_strip(StripRect::new(0.0, 100.0));
        resizer
    }

    #[test]
    fn reports_exactly_one_change_at_drag_end() {
        let mut resizer = resizer();
        let mut changes = Vec::new();
        let events = [
            MouseEvent::down(50.0),
            MouseEvent::moved(40.0),
            MouseEvent::moved(30.0),
            MouseEvent::moved(20.0),
            MouseEvent::up(20.0),
        ];
        for event in events {
            if let Some(value) = resizer.handle_event(event).expect("bounds available") {
                changes.push(value);
            }
        }
        assert_eq!(changes, vec![0.2]);
        assert_eq!(resizer.drag_position(), None);
        assert!(!resizer.is_dragging());
    }

    #[test]
    fn drag_position_tracks_and_clamps() {
        let mut resizer = resizer();
        resizer.handle_event(MouseEvent::down(50.0)).expect("start");
        resizer.handle_global_event(MouseEvent::moved(2.0)).expect("move");
        assert_eq!(resizer.drag_position(), Some(0.1));
        let indicator = resizer.drag_indicator().expect("dragging");
        assert!(approx(indicator.left, 0.1));
        assert!(approx(indicator.width, 0.4));
        let committed = resizer.handle_global_event(MouseEvent::up(99.0)).expect("end");
        assert_eq!(committed, Some(0.9));
    }

    #[test]
    fn right_side_boundary_is_mirrored() {
        let mut resizer = RangeResizer::new(0.3, 0.1, 0.5).right_side();
        resizer.set_strip(StripRect::new(0.0, 100.0));
        assert!(approx(resizer.grip_position(), 0.7));
        assert!(resizer.hits_grip(70.5, 1.0));

        resizer.handle_event(MouseEvent::down(70.0)).expect("start");
        resizer.handle_global_event(MouseEvent::moved(30.0)).expect("move");
        // Clamped at 1 - max.
        assert!(approx(resizer.drag_position().expect("dragging"), 0.5));
        let committed = resizer.handle_global_event(MouseEvent::up(60.0)).expect("end");
        assert!(approx(committed.expect("committed"), 0.4));
    }

    #[test]
    fn unlaid_out_strip_is_an_error() {
        let mut resizer = RangeResizer::new(0.5, 0.1, 0.9);
        assert!(matches!(
            resizer.handle_event(MouseEvent::down(10.0)),
            Err(DragError::BoundsUnavailable(_))
        ));
    }

    #[test]
    fn name_column_uses_configured_limits() {
        let config = TimelineConfig::default();
        let mut resizer = RangeResizer::name_column(&config, config.name_column_width);
        resizer.set_strip(StripRect::new(10.0, 200.0));
        resizer.handle_event(MouseEvent::down(60.0)).expect("start");
        let committed = resizer.handle_global_event(MouseEvent::up(400.0)).expect("end");
        assert_eq!(committed, Some(config.name_column_max));
    }
}
