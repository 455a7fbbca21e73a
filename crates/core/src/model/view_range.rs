//! The normalized `[0, 1]` zoom window applied to a trace's total duration,
//! plus whatever drag interaction is currently reshaping it.

/// An in-progress reframe: `anchor` is where the drag started, `shift` is
/// where the pointer is now. Either may be the larger value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reframe {
    pub anchor: f64,
    pub shift: f64,
}

impl Reframe {
    /// The committed range this reframe would produce, ordered.
    pub fn sorted(&self) -> (f64, f64) {
        if self.shift < self.anchor {
            (self.shift, self.anchor)
        } else {
            (self.anchor, self.shift)
        }
    }
}

/// Partial update of the not-yet-committed interaction state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewRangeUpdate {
    Cursor(Option<f64>),
    Reframe(Reframe),
    ShiftStart(f64),
    ShiftEnd(f64),
}

/// Committed zoom window plus in-progress interaction state.
///
/// Values are snapshots: every update returns a new `ViewRange`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewRange {
    pub current: (f64, f64),
    pub cursor: Option<f64>,
    pub reframe: Option<Reframe>,
    pub shift_start: Option<f64>,
    pub shift_end: Option<f64>,
}

impl Default for ViewRange {
    fn default() -> Self {
        Self::new(0.0, 1.0)
    }
}

impl ViewRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            current: (start, end),
            cursor: None,
            reframe: None,
            shift_start: None,
            shift_end: None,
        }
    }

    pub fn start(&self) -> f64 {
        self.current.0
    }

    pub fn end(&self) -> f64 {
        self.current.1
    }

    /// Whether anything narrower than the whole trace is showing.
    pub fn is_zoomed(&self) -> bool {
        self.current != (0.0, 1.0)
    }

    /// Whether a reframe or shift drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.reframe.is_some() || self.shift_start.is_some() || self.shift_end.is_some()
    }

    /// Merge an in-progress update, leaving the other fields untouched.
    pub fn update_next(&self, update: ViewRangeUpdate) -> Self {
        let mut next = *self;
        match update {
            ViewRangeUpdate::Cursor(cursor) => next.cursor = cursor,
            ViewRangeUpdate::Reframe(reframe) => next.reframe = Some(reframe),
            ViewRangeUpdate::ShiftStart(value) => next.shift_start = Some(value),
            ViewRangeUpdate::ShiftEnd(value) => next.shift_end = Some(value),
        }
        next
    }

    /// Commit a new zoom window. All in-progress state is dropped.
    pub fn commit(&self, start: f64, end: f64) -> Self {
        Self::new(start, end)
    }

    /// Pan or zoom the committed window by the given deltas.
    ///
    /// Start is clamped to `[0, 0.99]` and end to `[0.01, 1]`. When the
    /// result is narrower than `min_range`, a pan keeps the minimum width
    /// from the new start and a zoom re-centers on the old window; either
    /// way the widened window is slid back inside `[0, 1]`.
    pub fn adjust(&self, start_change: f64, end_change: f64, min_range: f64) -> Self {
        let (view_start, view_end) = self.current;
        let start = (view_start + start_change).clamp(0.0, 0.99);
        let end = (view_end + end_change).clamp(0.01, 1.0);
        if end - start >= min_range {
            return self.commit(start, end);
        }
        let is_pan =
            (start_change < 0.0 && end_change < 0.0) || (start_change > 0.0 && end_change > 0.0);
        let (start, end) = if is_pan {
            widen_within_unit(start, start + min_range)
        } else {
            let center = view_start + (view_end - view_start) / 2.0;
            widen_within_unit(center - min_range / 2.0, center + min_range / 2.0)
        };
        self.commit(start, end)
    }
}

/// Slide `[start, end]` so it lies inside `[0, 1]`, keeping its width when
/// it fits.
pub fn widen_within_unit(start: f64, end: f64) -> (f64, f64) {
    let width = (end - start).clamp(0.0, 1.0);
    if start < 0.0 {
        (0.0, width)
    } else if end > 1.0 {
        (1.0 - width, 1.0)
    } else {
        (start, end)
    }
}

/// Map a strip-local `[0, 1]` value into the global range `[view_start, view_end]`.
pub fn map_from_view_sub_range(view_start: f64, view_end: f64, value: f64) -> f64 {
    view_start + value * (view_end - view_start)
}

/// Map a global value into strip-local space for the strip spanning
/// `[view_start, view_end]`.
pub fn map_to_view_sub_range(view_start: f64, view_end: f64, value: f64) -> f64 {
    (value - view_start) / (view_end - view_start)
}

/// Maps absolute span times to fractions of the visible window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewedBounds {
    view_min: f64,
    view_window: f64,
}

impl ViewedBounds {
    pub fn new(trace_start: f64, trace_end: f64, view: &ViewRange) -> Self {
        let duration = trace_end - trace_start;
        let (view_start, view_end) = view.current;
        let view_min = trace_start + view_start * duration;
        let view_max = trace_end - (1.0 - view_end) * duration;
        Self {
            view_min,
            view_window: view_max - view_min,
        }
    }

    /// Fractions of the view window covered by `[start, end]`; values fall
    /// outside `[0, 1]` when the span extends past the window.
    pub fn map(&self, start: f64, end: f64) -> (f64, f64) {
        if self.view_window <= 0.0 {
            return (0.0, 0.0);
        }
        (
            (start - self.view_min) / self.view_window,
            (end - self.view_min) / self.view_window,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn commit_clears_interaction_state() {
        let range = ViewRange::default()
            .update_next(ViewRangeUpdate::Cursor(Some(0.3)))
            .update_next(ViewRangeUpdate::Reframe(Reframe {
                anchor: 0.6,
                shift: 0.2,
            }));
        assert!(range.is_dragging());
        assert_eq!(range.cursor, Some(0.3));

        let committed = range.commit(0.2, 0.6);
        assert_eq!(committed.current, (0.2, 0.6));
        assert!(!committed.is_dragging());
        assert_eq!(committed.cursor, None);
    }

    #[test]
    fn reframe_sorts_either_direction() {
        let r = Reframe {
            anchor: 0.6,
            shift: 0.2,
        };
        assert_eq!(r.sorted(), (0.2, 0.6));
        let r = Reframe {
            anchor: 0.2,
            shift: 0.6,
        };
        assert_eq!(r.sorted(), (0.2, 0.6));
    }

    #[test]
    fn pan_clamps_at_edges() {
        let range = ViewRange::new(0.0, 0.5).adjust(-0.05, -0.05, 0.01);
        assert!(approx(range.start(), 0.0));
        assert!(approx(range.end(), 0.45));

        let range = ViewRange::new(0.98, 1.0).adjust(0.05, 0.05, 0.01);
        assert!(approx(range.start(), 0.99));
        assert!(approx(range.end(), 1.0));
    }

    #[test]
    fn zoom_in_recenters_at_minimum_width() {
        let range = ViewRange::new(0.4, 0.42).adjust(0.05, -0.05, 0.01);
        assert!(approx(range.start(), 0.405));
        assert!(approx(range.end(), 0.415));
    }

    #[test]
    fn zoom_at_either_edge_stays_inside_the_trace() {
        let range = ViewRange::new(0.0, 0.004).adjust(0.005, -0.005, 0.01);
        assert!(approx(range.start(), 0.0));
        assert!(approx(range.end(), 0.01));

        let range = ViewRange::new(0.997, 1.0).adjust(0.005, -0.005, 0.01);
        assert!(approx(range.start(), 0.99));
        assert!(approx(range.end(), 1.0));
    }

    #[test]
    fn pan_into_the_end_keeps_a_wide_minimum() {
        let range = ViewRange::new(0.9, 1.0).adjust(0.1, 0.1, 0.05);
        assert!(approx(range.start(), 0.95));
        assert!(approx(range.end(), 1.0));
    }

    #[test]
    fn sub_range_mapping_is_affine() {
        assert!(approx(map_from_view_sub_range(0.2, 0.6, 0.5), 0.4));
        assert!(approx(map_to_view_sub_range(0.2, 0.6, 0.4), 0.5));
        assert!(approx(map_from_view_sub_range(0.0, 1.0, 0.3), 0.3));
    }

    #[test]
    fn viewed_bounds_follow_zoom() {
        let view = ViewRange::new(0.5, 1.0);
        let bounds = ViewedBounds::new(100.0, 200.0, &view);
        let (start, end) = bounds.map(150.0, 175.0);
        assert!(approx(start, 0.0));
        assert!(approx(end, 0.5));
        let (start, _) = bounds.map(100.0, 110.0);
        assert!(start < 0.0);
    }
}
