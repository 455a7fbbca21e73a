use tracing::debug;
use waterfall_protocol::{MouseEvent, MouseEventKind};

use crate::drag::{DragBounds, DragError, DragHandler, DraggableManager, DraggingUpdate};
use crate::model::{
    Reframe, ViewRange, ViewRangeUpdate, map_from_view_sub_range, map_to_view_sub_range,
    widen_within_unit,
};

const DEFAULT_MIN_RANGE: f64 = 0.01;

use super::{StripRect, strip_bounds};

/// What the strip's local `[0, 1]` space spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripSpace {
    /// The whole trace (the minimap).
    Global,
    /// The committed view window (the timeline header).
    ViewSubRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReframeTarget {
    Reframe,
    ShiftStart,
    ShiftEnd,
}

impl ReframeTarget {
    pub fn tag(self) -> &'static str {
        match self {
            ReframeTarget::Reframe => "reframe",
            ReframeTarget::ShiftStart => "shift-start",
            ReframeTarget::ShiftEnd => "shift-end",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "reframe" => Some(ReframeTarget::Reframe),
            "shift-start" => Some(ReframeTarget::ShiftStart),
            "shift-end" => Some(ReframeTarget::ShiftEnd),
            _ => None,
        }
    }
}

/// A range update for the owner of the [`ViewRange`], in global space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeChange {
    /// In-progress state to merge with [`ViewRange::update_next`].
    Next(ViewRangeUpdate),
    /// A new committed window.
    Commit { start: f64, end: f64 },
}

/// Strip-local geometry of the interaction overlays.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReframeOverlay {
    /// Hover guide; hidden while a drag is in progress.
    pub cursor: Option<f64>,
    /// Region being drawn by a reframe drag, ordered.
    pub reframe: Option<(f64, f64)>,
    /// Region between a boundary and where it is being shifted to, ordered.
    pub shift: Option<(f64, f64)>,
    /// Current view boundaries, drawn as shift handles on a global strip.
    pub handles: Option<(f64, f64)>,
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if b < a { (b, a) } else { (a, b) }
}

#[derive(Debug, Clone)]
struct ReframePolicy {
    space: StripSpace,
    strip: Option<StripRect>,
    view: ViewRange,
    min_range: f64,
    anchor: Option<f64>,
    change: Option<RangeChange>,
}

impl ReframePolicy {
    fn to_global(&self, local: f64) -> f64 {
        match self.space {
            StripSpace::Global => local,
            StripSpace::ViewSubRange => {
                map_from_view_sub_range(self.view.start(), self.view.end(), local)
            }
        }
    }

    fn to_local(&self, global: f64) -> f64 {
        match self.space {
            StripSpace::Global => global,
            StripSpace::ViewSubRange => {
                map_to_view_sub_range(self.view.start(), self.view.end(), global)
            }
        }
    }

    fn publish_cursor(&mut self, value: f64) {
        let cursor = self.to_global(value);
        self.change = Some(RangeChange::Next(ViewRangeUpdate::Cursor(Some(cursor))));
    }

    fn publish_drag(&mut self, target: ReframeTarget, value: f64) {
        let update = match target {
            ReframeTarget::Reframe => {
                let anchor = *self.anchor.get_or_insert(value);
                ViewRangeUpdate::Reframe(Reframe {
                    anchor,
                    shift: value,
                })
            }
            ReframeTarget::ShiftStart => ViewRangeUpdate::ShiftStart(value),
            ReframeTarget::ShiftEnd => ViewRangeUpdate::ShiftEnd(value),
        };
        self.change = Some(RangeChange::Next(update));
    }
}

fn target_of(update: &DraggingUpdate<'_>) -> ReframeTarget {
    update
        .tag
        .and_then(ReframeTarget::from_tag)
        .unwrap_or(ReframeTarget::Reframe)
}

impl DragHandler for ReframePolicy {
    fn get_bounds(&mut self, tag: Option<&str>) -> Result<DragBounds, DragError> {
        let bounds = strip_bounds(self.strip, "reframe")?;
        Ok(match tag.and_then(ReframeTarget::from_tag) {
            Some(ReframeTarget::ShiftStart) => bounds.with_max(self.to_local(self.view.end())),
            Some(ReframeTarget::ShiftEnd) => bounds.with_min(self.to_local(self.view.start())),
            _ => bounds,
        })
    }

    fn on_mouse_enter(&mut self, update: DraggingUpdate<'_>) {
        self.publish_cursor(update.value);
    }

    fn on_mouse_move(&mut self, update: DraggingUpdate<'_>) {
        self.publish_cursor(update.value);
    }

    fn on_mouse_leave(&mut self, _update: DraggingUpdate<'_>) {
        self.change = Some(RangeChange::Next(ViewRangeUpdate::Cursor(None)));
    }

    fn on_drag_start(&mut self, update: DraggingUpdate<'_>) {
        let target = target_of(&update);
        let value = self.to_global(update.value);
        if target == ReframeTarget::Reframe {
            self.anchor = Some(value);
        }
        self.publish_drag(target, value);
    }

    fn on_drag_move(&mut self, update: DraggingUpdate<'_>) {
        let value = self.to_global(update.value);
        self.publish_drag(target_of(&update), value);
    }

    fn on_drag_end(&mut self, mut update: DraggingUpdate<'_>) {
        update.manager.reset_bounds();
        let value = self.to_global(update.value);
        let (start, end) = match target_of(&update) {
            ReframeTarget::Reframe => {
                let anchor = self.anchor.take().unwrap_or(value);
                Reframe {
                    anchor,
                    shift: value,
                }
                .sorted()
            }
            ReframeTarget::ShiftStart => (value, self.view.end()),
            ReframeTarget::ShiftEnd => (self.view.start(), value),
        };
        // A click without movement leaves the window as it was.
        let (start, end) = if end <= start {
            self.view.current
        } else if end - start < self.min_range {
            match target_of(&update) {
                ReframeTarget::Reframe => {
                    let center = start + (end - start) / 2.0;
                    widen_within_unit(center - self.min_range / 2.0, center + self.min_range / 2.0)
                }
                ReframeTarget::ShiftStart => widen_within_unit(end - self.min_range, end),
                ReframeTarget::ShiftEnd => widen_within_unit(start, start + self.min_range),
            }
        } else {
            (start, end)
        };
        debug!(start, end, tag = ?update.tag, "view range committed");
        self.change = Some(RangeChange::Commit { start, end });
    }
}

/// Reframe and shift interactions over one strip.
///
/// Three drag managers share the strip: `reframe` draws a brand new window,
/// `shift-start` and `shift-end` move one boundary of the committed window.
/// The owner pushes its current [`ViewRange`] with
/// [`set_view_range`](Self::set_view_range) every render and applies the
/// returned [`RangeChange`]s.
#[derive(Debug, Clone)]
pub struct RangeReframer {
    reframe: DraggableManager,
    shift_start: DraggableManager,
    shift_end: DraggableManager,
    policy: ReframePolicy,
    handle_width: f64,
}

impl RangeReframer {
    pub fn new(space: StripSpace) -> Self {
        Self {
            reframe: DraggableManager::with_tag(ReframeTarget::Reframe.tag()),
            shift_start: DraggableManager::with_tag(ReframeTarget::ShiftStart.tag()),
            shift_end: DraggableManager::with_tag(ReframeTarget::ShiftEnd.tag()),
            policy: ReframePolicy {
                space,
                strip: None,
                view: ViewRange::default(),
                min_range: DEFAULT_MIN_RANGE,
                anchor: None,
                change: None,
            },
            handle_width: 1.0,
        }
    }

    pub fn minimap() -> Self {
        Self::new(StripSpace::Global)
    }

    pub fn timeline_header() -> Self {
        Self::new(StripSpace::ViewSubRange)
    }

    /// Pixel distance from a boundary within which a press grabs its shift
    /// handle.
    pub fn with_handle_width(mut self, handle_width: f64) -> Self {
        self.handle_width = handle_width;
        self
    }

    /// Narrowest window a drag may commit; narrower drags widen to it.
    pub fn with_min_range(mut self, min_range: f64) -> Self {
        self.policy.min_range = min_range;
        self
    }

    pub fn space(&self) -> StripSpace {
        self.policy.space
    }

    pub fn view_range(&self) -> &ViewRange {
        &self.policy.view
    }

    pub fn set_view_range(&mut self, view: ViewRange) {
        self.policy.view = view;
    }

    pub fn set_strip(&mut self, strip: StripRect) {
        if self.policy.strip != Some(strip) {
            self.policy.strip = Some(strip);
            self.reset_bounds();
        }
    }

    pub fn strip(&self) -> Option<StripRect> {
        self.policy.strip
    }

    pub fn reset_bounds(&mut self) {
        for manager in self.managers_mut() {
            manager.reset_bounds();
        }
    }

    pub fn sync_bounds_invalidator(&mut self, token: f64) {
        for manager in self.managers_mut() {
            manager.sync_bounds_invalidator(token);
        }
    }

    pub fn handle_window_resize(&mut self) {
        for manager in self.managers_mut() {
            manager.handle_window_resize();
        }
    }

    fn managers_mut(&mut self) -> [&mut DraggableManager; 3] {
        [
            &mut self.reframe,
            &mut self.shift_start,
            &mut self.shift_end,
        ]
    }

    fn split(&mut self, target: ReframeTarget) -> (&mut DraggableManager, &mut ReframePolicy) {
        let manager = match target {
            ReframeTarget::Reframe => &mut self.reframe,
            ReframeTarget::ShiftStart => &mut self.shift_start,
            ReframeTarget::ShiftEnd => &mut self.shift_end,
        };
        (manager, &mut self.policy)
    }

    /// The interaction currently holding the pointer capture.
    pub fn dragging(&self) -> Option<ReframeTarget> {
        if self.reframe.is_dragging() {
            Some(ReframeTarget::Reframe)
        } else if self.shift_start.is_dragging() {
            Some(ReframeTarget::ShiftStart)
        } else if self.shift_end.is_dragging() {
            Some(ReframeTarget::ShiftEnd)
        } else {
            None
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging().is_some()
    }

    /// Which interaction a press at `client_x` starts. Only a global strip
    /// shows shift handles.
    pub fn hit_test(&self, client_x: f64) -> ReframeTarget {
        let Some(strip) = self.policy.strip else {
            return ReframeTarget::Reframe;
        };
        if self.policy.space != StripSpace::Global {
            return ReframeTarget::Reframe;
        }
        let to_start = (client_x - strip.client_x(self.policy.view.start())).abs();
        let to_end = (client_x - strip.client_x(self.policy.view.end())).abs();
        if to_start <= self.handle_width && to_start <= to_end {
            ReframeTarget::ShiftStart
        } else if to_end <= self.handle_width {
            ReframeTarget::ShiftEnd
        } else {
            ReframeTarget::Reframe
        }
    }

    /// Feed an event that hit the strip, or any global event while a drag
    /// holds the pointer capture.
    pub fn handle_event(&mut self, event: MouseEvent) -> Result<Option<RangeChange>, DragError> {
        let result = if let Some(target) = self.dragging() {
            let (manager, policy) = self.split(target);
            manager.handle_global_event(event, policy)
        } else if event.kind == MouseEventKind::Down {
            let target = self.hit_test(event.client_x);
            let (manager, policy) = self.split(target);
            manager.handle_mouse_down(event, policy)
        } else {
            let (manager, policy) = self.split(ReframeTarget::Reframe);
            manager.handle_event(event, policy)
        };
        let change = self.policy.change.take();
        result.map(|()| change)
    }

    /// Commit the whole trace.
    pub fn reset_zoom(&self) -> RangeChange {
        RangeChange::Commit {
            start: 0.0,
            end: 1.0,
        }
    }

    pub fn overlay(&self) -> ReframeOverlay {
        let view = &self.policy.view;
        let local = |global: f64| self.policy.to_local(global);
        let cursor = if view.is_dragging() {
            None
        } else {
            view.cursor
                .map(local)
                .filter(|value| (0.0..=1.0).contains(value))
        };
        let reframe = view.reframe.map(|r| {
            let (start, end) = r.sorted();
            (local(start), local(end))
        });
        let shift = view
            .shift_start
            .map(|value| ordered(local(value), local(view.start())))
            .or_else(|| {
                view.shift_end
                    .map(|value| ordered(local(view.end()), local(value)))
            });
        let handles =
            (self.policy.space == StripSpace::Global).then(|| (view.start(), view.end()));
        ReframeOverlay {
            cursor,
            reframe,
            shift,
            handles,
        }
    }

    pub fn dispose(&mut self) {
        for manager in self.managers_mut() {
            manager.dispose();
        }
        self.policy.anchor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn commit(change: Option<RangeChange>) -> (f64, f64) {
        match change {
            Some(RangeChange::Commit { start, end }) => (start, end),
            other => panic!("expected commit, got {other:?}"),
        }
    }

    fn minimap(view: ViewRange) -> RangeReframer {
        let mut reframer = RangeReframer::minimap();
        reframer.set_strip(StripRect::new(0.0, 100.0));
        reframer.set_view_range(view);
        reframer
    }

    #[test]
    fn reframe_commits_sorted_range_in_either_direction() {
        let mut reframer = minimap(ViewRange::default());
        let start = reframer.handle_event(MouseEvent::down(60.0)).expect("start");
        assert_eq!(
            start,
            Some(RangeChange::Next(ViewRangeUpdate::Reframe(Reframe {
                anchor: 0.6,
                shift: 0.6
            })))
        );
        let moved = reframer.handle_event(MouseEvent::moved(40.0)).expect("move");
        assert_eq!(
            moved,
            Some(RangeChange::Next(ViewRangeUpdate::Reframe(Reframe {
                anchor: 0.6,
                shift: 0.4
            })))
        );
        let end = reframer.handle_event(MouseEvent::up(20.0)).expect("end");
        assert_eq!(commit(end), (0.2, 0.6));
        assert!(!reframer.is_dragging());
    }

    #[test]
    fn sliver_reframe_widens_to_the_minimum_inside_the_strip() {
        let close = |(a, b): (f64, f64), (c, d): (f64, f64)| (a - c).abs() < 1e-9 && (b - d).abs() < 1e-9;

        let mut reframer = minimap(ViewRange::new(0.3, 0.6));
        reframer.handle_event(MouseEvent::down(40.0)).expect("start");
        let end = reframer.handle_event(MouseEvent::up(40.5)).expect("end");
        assert!(close(commit(end), (0.3975, 0.4075)));

        let mut reframer = minimap(ViewRange::new(0.3, 0.6));
        reframer.handle_event(MouseEvent::down(0.2)).expect("start");
        let end = reframer.handle_event(MouseEvent::up(0.6)).expect("end");
        assert!(close(commit(end), (0.0, 0.01)));
    }

    #[test]
    fn click_without_movement_keeps_current_window() {
        let mut reframer = minimap(ViewRange::new(0.1, 0.3));
        reframer.handle_event(MouseEvent::down(60.0)).expect("start");
        let end = reframer.handle_event(MouseEvent::up(60.0)).expect("end");
        assert_eq!(commit(end), (0.1, 0.3));
    }

    #[test]
    fn shift_start_is_capped_at_view_end() {
        let mut reframer = minimap(ViewRange::new(0.2, 0.6));
        assert_eq!(reframer.hit_test(20.5), ReframeTarget::ShiftStart);
        reframer.handle_event(MouseEvent::down(20.0)).expect("start");
        assert_eq!(reframer.dragging(), Some(ReframeTarget::ShiftStart));
        let moved = reframer.handle_event(MouseEvent::moved(90.0)).expect("move");
        assert_eq!(
            moved,
            Some(RangeChange::Next(ViewRangeUpdate::ShiftStart(0.6)))
        );
        let end = reframer.handle_event(MouseEvent::up(30.0)).expect("end");
        assert_eq!(commit(end), (0.3, 0.6));
    }

    #[test]
    fn shift_end_is_floored_at_view_start() {
        let mut reframer = minimap(ViewRange::new(0.2, 0.6));
        assert_eq!(reframer.hit_test(60.0), ReframeTarget::ShiftEnd);
        reframer.handle_event(MouseEvent::down(60.0)).expect("start");
        let moved = reframer.handle_event(MouseEvent::moved(5.0)).expect("move");
        assert_eq!(moved, Some(RangeChange::Next(ViewRangeUpdate::ShiftEnd(0.2))));
        let end = reframer.handle_event(MouseEvent::up(80.0)).expect("end");
        assert_eq!(commit(end), (0.2, 0.8));
    }

    #[test]
    fn header_maps_through_view_sub_range() {
        let mut reframer = RangeReframer::timeline_header();
        reframer.set_strip(StripRect::new(0.0, 100.0));
        reframer.set_view_range(ViewRange::new(0.2, 0.6));

        match reframer.handle_event(MouseEvent::moved(50.0)).expect("hover") {
            Some(RangeChange::Next(ViewRangeUpdate::Cursor(Some(cursor)))) => {
                assert!(approx(cursor, 0.4));
            }
            other => panic!("expected cursor, got {other:?}"),
        }
        // No shift handles on the header.
        assert_eq!(reframer.hit_test(0.0), ReframeTarget::Reframe);

        reframer.handle_event(MouseEvent::down(75.0)).expect("start");
        let (start, end) = commit(reframer.handle_event(MouseEvent::up(25.0)).expect("end"));
        assert!(approx(start, 0.3));
        assert!(approx(end, 0.5));
    }

    #[test]
    fn leaving_the_strip_clears_the_cursor() {
        let mut reframer = minimap(ViewRange::default());
        reframer.handle_event(MouseEvent::enter(10.0)).expect("enter");
        let left = reframer.handle_event(MouseEvent::leave(120.0)).expect("leave");
        assert_eq!(left, Some(RangeChange::Next(ViewRangeUpdate::Cursor(None))));
    }

    #[test]
    fn overlay_hides_cursor_while_dragging() {
        let mut reframer = RangeReframer::timeline_header();
        let view = ViewRange::new(0.5, 1.0)
            .update_next(ViewRangeUpdate::Cursor(Some(0.75)));
        reframer.set_view_range(view);
        let overlay = reframer.overlay();
        assert_eq!(overlay.cursor, Some(0.5));
        assert_eq!(overlay.handles, None);

        reframer.set_view_range(view.update_next(ViewRangeUpdate::Reframe(Reframe {
            anchor: 1.0,
            shift: 0.75,
        })));
        let overlay = reframer.overlay();
        assert_eq!(overlay.cursor, None);
        assert_eq!(overlay.reframe, Some((0.5, 1.0)));

        let minimap = minimap(ViewRange::new(0.2, 0.6).update_next(ViewRangeUpdate::ShiftEnd(0.9)));
        let overlay = minimap.overlay();
        assert_eq!(overlay.shift, Some((0.6, 0.9)));
        assert_eq!(overlay.handles, Some((0.2, 0.6)));
    }

    #[test]
    fn reset_zoom_commits_whole_trace() {
        let reframer = minimap(ViewRange::new(0.2, 0.6));
        assert_eq!(
            reframer.reset_zoom(),
            RangeChange::Commit {
                start: 0.0,
                end: 1.0
            }
        );
    }

    #[test]
    fn missing_layout_is_an_error() {
        let mut reframer = RangeReframer::minimap();
        assert!(reframer.handle_event(MouseEvent::down(10.0)).is_err());
        assert!(!reframer.is_dragging());
    }
}
