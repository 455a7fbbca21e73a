//! Keyboard navigation between visible spans.
//!
//! [`ScrollManager`] never looks at the list or the row projection directly:
//! the owning view registers [`Accessors`] that answer geometry and state
//! questions on demand, and a [`Scroller`] that moves the viewport.

pub mod tween;

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;
use waterfall_protocol::{Span, SpanId};

use crate::config::TimelineConfig;
use crate::model::TraceModel;
use crate::rows::RowError;
use crate::virtual_list::{ListError, RowPosition};

pub use tween::{ScrollTweener, Tween, ease_out_quint};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScrollError {
    #[error("scroll accessors are not set")]
    AccessorsNotSet,
    #[error(transparent)]
    Row(#[from] RowError),
    #[error(transparent)]
    List(#[from] ListError),
}

/// Read-only view of the timeline, queried when a navigation runs.
pub trait Accessors {
    /// Committed `[start, end]` zoom window.
    fn view_range(&self) -> (f64, f64);
    /// Ids matching the active search, `None` without a search.
    fn searched_span_ids(&self) -> Option<HashSet<SpanId>>;
    fn collapsed_children(&self) -> HashSet<SpanId>;
    fn view_height(&self) -> f64;
    fn top_row_index_visible(&self) -> usize;
    fn bottom_row_index_visible(&self) -> usize;
    fn row_position(&self, row_index: usize) -> Result<RowPosition, ListError>;
    fn map_row_index_to_span_index(&self, row_index: usize) -> Result<usize, RowError>;
    fn map_span_index_to_row_index(&self, span_index: usize) -> Result<usize, RowError>;
}

pub trait Scroller {
    fn scroll_to(&mut self, y: f64);
    fn scroll_by(&mut self, delta: f64, append_to_last: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    fn step(self) -> isize {
        match self {
            Direction::Up => -1,
            Direction::Down => 1,
        }
    }
}

/// Whether `span` sits beneath a collapsed ancestor.
///
/// Walks parent references upward. On a hit, every ancestor visited on the
/// way is added to `hidden` so later queries stop at the first of them.
pub fn is_span_hidden(span: &Span, hidden: &mut HashSet<SpanId>, trace: &TraceModel) -> bool {
    let mut visited: Vec<SpanId> = Vec::new();
    let mut references = span.references.as_slice();
    // Bounded by the trace size in case references form a cycle.
    for _ in 0..=trace.len() {
        let mut parent = None;
        for reference in references {
            visited.push(reference.span_id.clone());
            if hidden.contains(&reference.span_id) {
                hidden.extend(visited);
                return true;
            }
            parent = Some(&reference.span_id);
        }
        let Some(parent) = parent.and_then(|id| trace.span_by_id(id.as_str())) else {
            return false;
        };
        references = parent.references.as_slice();
    }
    false
}

pub struct ScrollManager {
    trace: Option<Arc<TraceModel>>,
    accessors: Option<Box<dyn Accessors>>,
    scroller: Option<Box<dyn Scroller>>,
    page_scroll_factor: f64,
    center_factor: f64,
}

impl std::fmt::Debug for ScrollManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollManager")
            .field("spans", &self.trace.as_ref().map(|t| t.len()))
            .field("has_accessors", &self.accessors.is_some())
            .field("has_scroller", &self.scroller.is_some())
            .finish()
    }
}

impl ScrollManager {
    pub fn new(config: &TimelineConfig) -> Self {
        Self {
            trace: None,
            accessors: None,
            scroller: None,
            page_scroll_factor: config.page_scroll_factor,
            center_factor: config.center_factor,
        }
    }

    pub fn set_trace(&mut self, trace: Option<Arc<TraceModel>>) {
        self.trace = trace;
    }

    pub fn set_accessors(&mut self, accessors: Box<dyn Accessors>) {
        self.accessors = Some(accessors);
    }

    pub fn set_scroller(&mut self, scroller: Box<dyn Scroller>) {
        self.scroller = Some(scroller);
    }

    /// Drop the trace, accessors and scroller.
    pub fn destroy(&mut self) {
        self.trace = None;
        self.accessors = None;
        self.scroller = None;
    }

    /// Scroll so the edge of `row_index` in `direction` sits mid-viewport:
    /// the top edge when going up, the bottom edge when going down.
    pub fn scroll_past(&mut self, row_index: usize, direction: Direction) -> Result<(), ScrollError> {
        let accessors = self.accessors.as_deref().ok_or(ScrollError::AccessorsNotSet)?;
        let position = accessors.row_position(row_index)?;
        let view_height = accessors.view_height();
        let offset = self.center_factor * view_height;
        let y = match direction {
            Direction::Up => position.y - offset,
            Direction::Down => position.y + position.height - view_height + offset,
        };
        match self.scroller.as_deref_mut() {
            Some(scroller) => {
                debug!(row_index, ?direction, y, "scroll past row");
                scroller.scroll_to(y);
            }
            None => debug!(row_index, "scroll past skipped: no scroller"),
        }
        Ok(())
    }

    pub fn scroll_page_down(&mut self) {
        self.scroll_page(1.0);
    }

    pub fn scroll_page_up(&mut self) {
        self.scroll_page(-1.0);
    }

    fn scroll_page(&mut self, sign: f64) {
        let (Some(accessors), Some(scroller)) =
            (self.accessors.as_deref(), self.scroller.as_deref_mut())
        else {
            debug!("page scroll before accessors and scroller are set");
            return;
        };
        scroller.scroll_by(sign * self.page_scroll_factor * accessors.view_height(), true);
    }

    /// Move to the next visible span below the viewport. Returns the span
    /// scrolled to, `None` when already at the last span.
    pub fn scroll_to_next_visible_span(&mut self) -> Result<Option<usize>, ScrollError> {
        self.scroll_to_visible_span(Direction::Down, None)
    }

    pub fn scroll_to_prev_visible_span(&mut self) -> Result<Option<usize>, ScrollError> {
        self.scroll_to_visible_span(Direction::Up, None)
    }

    /// Scroll to the first span that passes the filters, scanning from the
    /// top of the trace (used when search results change).
    pub fn scroll_to_first_visible_span(&mut self) -> Result<Option<usize>, ScrollError> {
        self.scroll_to_visible_span(Direction::Down, Some(0))
    }

    fn scroll_to_visible_span(
        &mut self,
        direction: Direction,
        start_row: Option<usize>,
    ) -> Result<Option<usize>, ScrollError> {
        let Some(target) = self.find_visible_span(direction, start_row)? else {
            return Ok(None);
        };
        let row = self
            .accessors
            .as_deref()
            .ok_or(ScrollError::AccessorsNotSet)?
            .map_span_index_to_row_index(target)?;
        self.scroll_past(row, direction)?;
        Ok(Some(target))
    }

    fn find_visible_span(
        &self,
        direction: Direction,
        start_row: Option<usize>,
    ) -> Result<Option<usize>, ScrollError> {
        let accessors = self.accessors.as_deref().ok_or(ScrollError::AccessorsNotSet)?;
        let Some(trace) = self.trace.as_deref() else {
            debug!("navigation before a trace is set");
            return Ok(None);
        };
        let spans = trace.spans();
        let Some(last) = spans.len().checked_sub(1) else {
            return Ok(None);
        };
        let boundary_row = match (start_row, direction) {
            (Some(row), _) => row,
            (None, Direction::Up) => accessors.top_row_index_visible(),
            (None, Direction::Down) => accessors.bottom_row_index_visible(),
        };
        let span_index = accessors.map_row_index_to_span_index(boundary_row)?;
        let step = direction.step();

        // First candidate: the boundary row itself may be only partially in
        // view, so the scan starts one span back inside the viewport unless
        // the boundary is the first or last span.
        let first = if start_row.is_some() {
            span_index as isize
        } else {
            if (span_index == 0 && direction == Direction::Up)
                || (span_index == last && direction == Direction::Down)
            {
                return Ok(None);
            }
            let full_view = if span_index != 0 && span_index != last {
                span_index as isize - step
            } else {
                span_index as isize
            };
            full_view + step
        };

        let (view_start, view_end) = accessors.view_range();
        let check_window = view_start != 0.0 || view_end != 1.0;
        let duration = trace.duration();
        let matches = accessors.searched_span_ids();
        let mut hidden = accessors.collapsed_children();

        let mut candidate = first;
        let found = loop {
            let Some(index) = usize::try_from(candidate).ok().filter(|&i| i < spans.len()) else {
                break None;
            };
            let span = &spans[index];
            candidate += step;
            if check_window && duration > 0.0 {
                let start = (span.start_time - trace.start_time()) / duration;
                let end = (span.end_time() - trace.start_time()) / duration;
                if start > view_end || end < view_start {
                    continue;
                }
            }
            if matches.as_ref().is_some_and(|ids| !ids.contains(&span.span_id)) {
                continue;
            }
            if is_span_hidden(span, &mut hidden, trace) {
                continue;
            }
            break Some(index);
        };

        let target = match found {
            Some(index) => index,
            // Nothing qualifies: go to the end of the trace in this
            // direction, backing off over trailing hidden spans.
            None => match direction {
                Direction::Up => 0,
                Direction::Down => {
                    let mut index = last;
                    while index > 0 && is_span_hidden(&spans[index], &mut hidden, trace) {
                        index -= 1;
                    }
                    index
                }
            },
        };
        debug!(from = span_index, to = target, ?direction, "visible span target");
        Ok(Some(target))
    }
}
