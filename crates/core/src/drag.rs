//! Mouse-drag state machine shared by every draggable affordance of the
//! timeline (column resizers, minimap reframing and shift handles).
//!
//! The manager turns raw pointer events into normalized `[0, 1]` values
//! within bounds that the owner supplies lazily, and reports them to a
//! [`DragHandler`]. While a drag is in progress the manager holds the pointer
//! capture: the host must route every global move/up event to
//! [`DraggableManager::handle_global_event`] so the drag keeps tracking when
//! the pointer leaves the originating element.
//!
//! A drag whose mouse-up is lost (focus leaves the window) stays in the
//! dragging phase until the next pointer event reaches the manager; there is
//! no cancel event to listen for.

use thiserror::Error;
use tracing::debug;
use waterfall_protocol::{MouseButton, MouseEvent, MouseEventKind};

#[derive(Debug, Error, PartialEq)]
pub enum DragError {
    #[error("drag bounds unavailable: {0}")]
    BoundsUnavailable(String),
    #[error("drag bounds have non-positive width {0}")]
    EmptyBounds(f64),
}

/// Geometry of the draggable strip, in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragBounds {
    pub client_x_left: f64,
    pub width: f64,
    /// Lower clamp for values; `0` when unset.
    pub min_value: Option<f64>,
    /// Upper clamp for values; `1` when unset.
    pub max_value: Option<f64>,
}

impl DragBounds {
    pub fn new(client_x_left: f64, width: f64) -> Self {
        Self {
            client_x_left,
            width,
            min_value: None,
            max_value: None,
        }
    }

    pub fn with_min(mut self, min_value: f64) -> Self {
        self.min_value = Some(min_value);
        self
    }

    pub fn with_max(mut self, max_value: f64) -> Self {
        self.max_value = Some(max_value);
        self
    }

    /// `(value, x)` for a client x: `value = clamp((client_x - left) / width,
    /// min, max)`, `x` is the clamped offset in pixels.
    pub fn normalize(&self, client_x: f64) -> (f64, f64) {
        let min = self.min_value.unwrap_or(0.0);
        let max = self.max_value.unwrap_or(1.0);
        let x = client_x - self.client_x_left;
        let value = x / self.width;
        if value < min {
            (min, min * self.width)
        } else if value > max {
            (max, max * self.width)
        } else {
            (value, x)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    MouseEnter,
    MouseMove,
    MouseLeave,
    DragStart,
    DragMove,
    DragEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Hovering,
    Dragging,
}

/// Handle given to callbacks so they can invalidate the cached bounds,
/// typically at the end of a drag.
#[derive(Debug)]
pub struct DragHandle<'a> {
    bounds: &'a mut Option<DragBounds>,
}

impl DragHandle<'_> {
    pub fn reset_bounds(&mut self) {
        *self.bounds = None;
    }
}

#[derive(Debug)]
pub struct DraggingUpdate<'a> {
    pub kind: UpdateKind,
    pub tag: Option<&'a str>,
    pub value: f64,
    pub x: f64,
    pub event: MouseEvent,
    pub manager: DragHandle<'a>,
}

/// Policy side of a drag: supplies bounds on demand and reacts to updates.
///
/// Bounds are pulled, never pushed: layout can change between drags (a
/// sibling column resize moves this strip), so the manager asks for them when
/// a drag needs them and keeps them only until they are reset.
pub trait DragHandler {
    fn get_bounds(&mut self, tag: Option<&str>) -> Result<DragBounds, DragError>;

    fn on_mouse_enter(&mut self, _update: DraggingUpdate<'_>) {}
    fn on_mouse_move(&mut self, _update: DraggingUpdate<'_>) {}
    fn on_mouse_leave(&mut self, _update: DraggingUpdate<'_>) {}
    fn on_drag_start(&mut self, _update: DraggingUpdate<'_>) {}
    fn on_drag_move(&mut self, _update: DraggingUpdate<'_>) {}
    fn on_drag_end(&mut self, _update: DraggingUpdate<'_>) {}
}

#[derive(Debug, Clone)]
pub struct DraggableManager {
    tag: Option<String>,
    bounds: Option<DragBounds>,
    phase: DragPhase,
    reset_bounds_on_resize: bool,
    bounds_invalidator: Option<f64>,
    disposed: bool,
}

impl Default for DraggableManager {
    fn default() -> Self {
        Self::new(None)
    }
}

impl DraggableManager {
    pub fn new(tag: Option<&str>) -> Self {
        Self {
            tag: tag.map(str::to_owned),
            bounds: None,
            phase: DragPhase::Idle,
            reset_bounds_on_resize: true,
            bounds_invalidator: None,
            disposed: false,
        }
    }

    pub fn with_tag(tag: &str) -> Self {
        Self::new(Some(tag))
    }

    /// Keep cached bounds across window resizes.
    pub fn keep_bounds_on_resize(mut self) -> Self {
        self.reset_bounds_on_resize = false;
        self
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    pub fn is_dragging(&self) -> bool {
        self.phase == DragPhase::Dragging
    }

    /// Whether the host must forward global pointer events.
    pub fn has_pointer_capture(&self) -> bool {
        self.is_dragging()
    }

    pub fn reset_bounds(&mut self) {
        if self.bounds.take().is_some() {
            debug!(tag = ?self.tag, "drag bounds reset");
        }
    }

    pub fn handle_window_resize(&mut self) {
        if self.reset_bounds_on_resize {
            self.reset_bounds();
        }
    }

    /// Compare the owner's invalidation token with the one seen last render
    /// and drop cached bounds when it changed (e.g. a column width that moves
    /// this strip).
    pub fn sync_bounds_invalidator(&mut self, token: f64) {
        if self.bounds_invalidator.is_some_and(|prev| prev != token) {
            self.reset_bounds();
        }
        self.bounds_invalidator = Some(token);
    }

    /// Release pointer capture and cached bounds. Idempotent; the manager
    /// ignores every event afterwards.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        if self.is_dragging() {
            debug!(tag = ?self.tag, "drag released by dispose");
        }
        self.phase = DragPhase::Idle;
        self.bounds = None;
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Route an event that hit the owning element.
    pub fn handle_event(
        &mut self,
        event: MouseEvent,
        handler: &mut impl DragHandler,
    ) -> Result<(), DragError> {
        match event.kind {
            MouseEventKind::Down => self.handle_mouse_down(event, handler),
            MouseEventKind::Move | MouseEventKind::Up if self.is_dragging() => {
                self.handle_global_event(event, handler)
            }
            MouseEventKind::Move => self.handle_mouse_move(event, handler),
            MouseEventKind::Enter => self.handle_mouse_enter(event, handler),
            MouseEventKind::Leave => self.handle_mouse_leave(event, handler),
            MouseEventKind::Up => Ok(()),
        }
    }

    pub fn handle_mouse_enter(
        &mut self,
        event: MouseEvent,
        handler: &mut impl DragHandler,
    ) -> Result<(), DragError> {
        self.handle_minor_event(event, UpdateKind::MouseEnter, handler)
    }

    pub fn handle_mouse_move(
        &mut self,
        event: MouseEvent,
        handler: &mut impl DragHandler,
    ) -> Result<(), DragError> {
        self.handle_minor_event(event, UpdateKind::MouseMove, handler)
    }

    pub fn handle_mouse_leave(
        &mut self,
        event: MouseEvent,
        handler: &mut impl DragHandler,
    ) -> Result<(), DragError> {
        self.handle_minor_event(event, UpdateKind::MouseLeave, handler)
    }

    fn handle_minor_event(
        &mut self,
        event: MouseEvent,
        kind: UpdateKind,
        handler: &mut impl DragHandler,
    ) -> Result<(), DragError> {
        if self.disposed || self.is_dragging() || event.button != MouseButton::Left {
            return Ok(());
        }
        self.phase = if kind == UpdateKind::MouseLeave {
            DragPhase::Idle
        } else {
            DragPhase::Hovering
        };
        self.dispatch(event, kind, handler)
    }

    /// Start a drag. Ignored while a drag is already in progress, so no
    /// second `DragStart` can occur before the first drag's `DragEnd`.
    pub fn handle_mouse_down(
        &mut self,
        event: MouseEvent,
        handler: &mut impl DragHandler,
    ) -> Result<(), DragError> {
        if self.disposed || self.is_dragging() || event.button != MouseButton::Left {
            return Ok(());
        }
        self.phase = DragPhase::Dragging;
        debug!(tag = ?self.tag, client_x = event.client_x, "drag start");
        if let Err(e) = self.dispatch(event, UpdateKind::DragStart, handler) {
            self.phase = DragPhase::Idle;
            return Err(e);
        }
        Ok(())
    }

    /// Global move/up while the pointer is captured.
    pub fn handle_global_event(
        &mut self,
        event: MouseEvent,
        handler: &mut impl DragHandler,
    ) -> Result<(), DragError> {
        if self.disposed || !self.is_dragging() {
            return Ok(());
        }
        match event.kind {
            MouseEventKind::Move => self.dispatch(event, UpdateKind::DragMove, handler),
            MouseEventKind::Up => {
                self.phase = DragPhase::Idle;
                debug!(tag = ?self.tag, client_x = event.client_x, "drag end");
                self.dispatch(event, UpdateKind::DragEnd, handler)
            }
            _ => Ok(()),
        }
    }

    fn position(
        &mut self,
        client_x: f64,
        handler: &mut impl DragHandler,
    ) -> Result<(f64, f64), DragError> {
        let bounds = match self.bounds {
            Some(bounds) => bounds,
            None => {
                let bounds = handler.get_bounds(self.tag.as_deref())?;
                if bounds.width <= 0.0 || !bounds.width.is_finite() {
                    return Err(DragError::EmptyBounds(bounds.width));
                }
                self.bounds = Some(bounds);
                bounds
            }
        };
        Ok(bounds.normalize(client_x))
    }

    fn dispatch(
        &mut self,
        event: MouseEvent,
        kind: UpdateKind,
        handler: &mut impl DragHandler,
    ) -> Result<(), DragError> {
        let (value, x) = self.position(event.client_x, handler)?;
        let update = DraggingUpdate {
            kind,
            tag: self.tag.as_deref(),
            value,
            x,
            event,
            manager: DragHandle {
                bounds: &mut self.bounds,
            },
        };
        match kind {
            UpdateKind::MouseEnter => handler.on_mouse_enter(update),
            UpdateKind::MouseMove => handler.on_mouse_move(update),
            UpdateKind::MouseLeave => handler.on_mouse_leave(update),
            UpdateKind::DragStart => handler.on_drag_start(update),
            UpdateKind::DragMove => handler.on_drag_move(update),
            UpdateKind::DragEnd => handler.on_drag_end(update),
        }
        Ok(())
    }
}
