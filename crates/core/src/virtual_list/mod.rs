//! Windowed rendering of a long list of variable-height rows.
//!
//! The list never touches a UI toolkit. The host reports scroll offsets and
//! viewport sizes, schedules a frame when asked to, and draws whatever rows
//! [`VirtualList::render`] hands to its row renderer.

pub mod positions;

use thiserror::Error;
use tracing::trace;

use crate::config::TimelineConfig;

pub use positions::Positions;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ListError {
    #[error("row index {index} out of range ({len} rows)")]
    RowOutOfRange { index: usize, len: usize },
}

/// What the list needs to know about its rows.
pub trait RowSource {
    fn row_count(&self) -> usize;
    fn row_height(&self, index: usize) -> f64;
    /// Stable identity of a row across regenerations of the row list.
    fn row_key(&self, index: usize) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListViewOptions {
    /// Rows drawn on each side of the visible range when redrawing.
    pub view_buffer: usize,
    /// Rows that must remain drawn on each side; fewer forces a redraw.
    pub view_buffer_min: usize,
    /// Rows drawn before the viewport has been measured.
    pub initial_draw: usize,
}

impl Default for ListViewOptions {
    fn default() -> Self {
        Self::from(&TimelineConfig::default())
    }
}

impl From<&TimelineConfig> for ListViewOptions {
    fn from(config: &TimelineConfig) -> Self {
        Self {
            view_buffer: config.view_buffer,
            view_buffer_min: config.view_buffer_min.min(config.view_buffer),
            initial_draw: config.initial_draw,
        }
    }
}

/// Answer to a scroll or resize notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRequest {
    /// First change since the last frame: the host must schedule a frame
    /// and call [`VirtualList::on_animation_frame`] in it.
    Schedule,
    /// A frame is already scheduled; it will pick this change up.
    AlreadyPending,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowPosition {
    pub y: f64,
    pub height: f64,
}

/// Placement of one drawn row, absolutely positioned at its offset.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSlot {
    pub key: String,
    pub index: usize,
    pub top: f64,
    pub height: f64,
}

/// Headless virtualized list.
#[derive(Debug, Clone)]
pub struct VirtualList {
    options: ListViewOptions,
    positions: Positions,
    row_count: usize,
    scroll_top: f64,
    view_height: f64,
    measured: bool,
    /// Visible rows as of the last frame (inclusive).
    start_index: usize,
    end_index: usize,
    /// Rows handed to the renderer by the last `render` (inclusive).
    drawn: Option<(usize, usize)>,
    frame_pending: bool,
    view_changed: bool,
}

impl VirtualList {
    pub fn new(options: ListViewOptions) -> Self {
        Self {
            options,
            positions: Positions::new(options.view_buffer),
            row_count: 0,
            scroll_top: 0.0,
            view_height: 0.0,
            measured: false,
            start_index: 0,
            end_index: 0,
            drawn: None,
            frame_pending: false,
            view_changed: false,
        }
    }

    pub fn options(&self) -> ListViewOptions {
        self.options
    }

    /// Drop every cached offset, e.g. after the row list was regenerated.
    pub fn reset_positions(&mut self) {
        self.positions.reset();
        self.drawn = None;
    }

    pub fn on_scroll(&mut self, scroll_top: f64) -> FrameRequest {
        self.scroll_top = scroll_top.max(0.0);
        self.request_frame()
    }

    pub fn on_resize(&mut self, view_height: f64) -> FrameRequest {
        self.view_height = view_height.max(0.0);
        self.measured = true;
        self.request_frame()
    }

    fn request_frame(&mut self) -> FrameRequest {
        self.view_changed = true;
        if self.frame_pending {
            FrameRequest::AlreadyPending
        } else {
            self.frame_pending = true;
            FrameRequest::Schedule
        }
    }

    /// The one recompute per frame. Returns whether the drawn rows no longer
    /// cover the visible rows plus `view_buffer_min`, i.e. whether the host
    /// must call [`render`](Self::render) again.
    pub fn on_animation_frame(&mut self, source: &impl RowSource) -> bool {
        self.frame_pending = false;
        if !self.view_changed {
            return false;
        }
        self.view_changed = false;
        self.sync_row_count(source);
        self.calc_view_indexes(source);

        let Some((drawn_start, drawn_end)) = self.drawn else {
            return true;
        };
        if self.row_count == 0 {
            return false;
        }
        let min = self.options.view_buffer_min;
        let max_start = self.start_index.saturating_sub(min);
        let min_end = (self.end_index + min).min(self.row_count - 1);
        let redraw = max_start < drawn_start || min_end > drawn_end;
        trace!(
            start = self.start_index,
            end = self.end_index,
            drawn_start,
            drawn_end,
            redraw,
            "list frame"
        );
        redraw
    }

    fn sync_row_count(&mut self, source: &impl RowSource) {
        let count = source.row_count();
        if count != self.row_count {
            self.row_count = count;
            self.positions.profile_data(count);
            if let Some((start, end)) = self.drawn
                && end >= count
            {
                self.drawn = (count > 0 && start < count).then(|| (start, count - 1));
            }
        }
    }

    fn calc_view_indexes(&mut self, source: &impl RowSource) {
        if self.row_count == 0 {
            self.start_index = 0;
            self.end_index = 0;
            return;
        }
        let y_start = self.scroll_top;
        let y_end = self.scroll_top + self.view_height;
        self.start_index = self.positions.find_floor_index(y_start, source);
        self.end_index = self
            .positions
            .find_ceil_index(y_end, source)
            .max(self.start_index);
    }

    /// The rows currently drawn, as an inclusive range.
    pub fn drawn_range(&self) -> Option<(usize, usize)> {
        self.drawn
    }

    /// Draw the visible rows plus `view_buffer` on each side (or the first
    /// `initial_draw` rows before the viewport is measured).
    pub fn render<R>(
        &mut self,
        source: &impl RowSource,
        mut row_renderer: impl FnMut(RowSlot) -> R,
    ) -> Vec<R> {
        self.sync_row_count(source);
        if self.row_count == 0 {
            self.drawn = None;
            return Vec::new();
        }

        let last = self.row_count - 1;
        let (start, end) = if self.measured {
            self.calc_view_indexes(source);
            let buffer = self.options.view_buffer;
            (
                self.start_index.saturating_sub(buffer),
                (self.end_index + buffer).min(last),
            )
        } else {
            (0, self.options.initial_draw.saturating_sub(1).min(last))
        };

        let mut out = Vec::with_capacity(end - start + 1);
        for index in start..=end {
            let (top, height) = self.positions.row_position(index, source);
            out.push(row_renderer(RowSlot {
                key: source.row_key(index),
                index,
                top,
                height,
            }));
        }
        self.drawn = Some((start, end));
        out
    }

    /// Height of the spacer that keeps scrollbar proportions right.
    pub fn total_height(&self) -> f64 {
        self.positions.estimated_height()
    }

    pub fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    pub fn view_height(&self) -> f64 {
        self.view_height
    }

    /// Row at the top edge of the viewport, computed from the current
    /// scroll offset.
    pub fn top_visible_index(&mut self, source: &impl RowSource) -> usize {
        self.sync_row_count(source);
        if self.row_count == 0 {
            return 0;
        }
        self.positions.find_floor_index(self.scroll_top, source)
    }

    /// Row containing the last visible pixel.
    pub fn bottom_visible_index(&mut self, source: &impl RowSource) -> usize {
        self.sync_row_count(source);
        if self.row_count == 0 {
            return 0;
        }
        let bottom = self.scroll_top + self.view_height;
        self.positions
            .find_ceil_index(bottom, source)
            .max(self.positions.find_floor_index(self.scroll_top, source))
    }

    pub fn row_position(
        &mut self,
        index: usize,
        source: &impl RowSource,
    ) -> Result<RowPosition, ListError> {
        self.sync_row_count(source);
        if index >= self.row_count {
            return Err(ListError::RowOutOfRange {
                index,
                len: self.row_count,
            });
        }
        let (y, height) = self.positions.row_position(index, source);
        Ok(RowPosition { y, height })
    }

    /// Largest scroll offset that still fills the viewport.
    pub fn max_scroll_top(&self) -> f64 {
        (self.total_height() - self.view_height).max(0.0)
    }
}
