//! Terminal host of the timeline: owns the core controllers and wires them to
//! one shared view state.
//!
//! Logical units: one column is one unit across, one bar row is
//! `row_heights.bar` units down, so detail rows come out a handful of
//! terminal rows tall.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use ratatui::layout::Rect;
use tracing::{debug, trace, warn};
use waterfall_core::model::{TraceModel, ViewRange};
use waterfall_core::range::{RangeChange, RangeReframer, RangeResizer, StripRect};
use waterfall_core::rows::{RowError, RowProjection, TimelineRows};
use waterfall_core::scroll::{Accessors, ScrollError, ScrollManager, ScrollTweener, Scroller};
use waterfall_core::shortcuts::{ShortcutAction, ShortcutBinder};
use waterfall_core::timeline::TimelineState;
use waterfall_core::views::{
    WaterfallFrame, detail_lines, format_duration, hits_toggle, render_minimap, render_overlay,
    render_ticks, render_waterfall,
};
use waterfall_core::virtual_list::{ListError, RowPosition, VirtualList};
use waterfall_core::TimelineConfig;
use waterfall_protocol::{
    KeyChord, KeyCode, MouseEvent, MouseEventKind, Point, Rect as UnitRect, RenderCommand,
    SpanId, TextAlign, ThemeToken, Viewport,
};

const MINIMAP_ROWS: u16 = 4;
/// Columns on either side of the name-column divider that grab it.
const GRIP_WIDTH: f64 = 1.0;
/// Bar rows moved per mouse wheel notch.
const WHEEL_ROWS: f64 = 3.0;

/// View state the scroll manager's accessors and scroller read and move.
struct Timeline {
    config: TimelineConfig,
    model: Arc<TraceModel>,
    state: TimelineState,
    projection: RowProjection,
    list: VirtualList,
    view_range: ViewRange,
    searched: Option<HashSet<SpanId>>,
}

impl Timeline {
    fn with_rows<R>(&mut self, f: impl FnOnce(&mut VirtualList, &TimelineRows<'_>) -> R) -> R {
        let rows = TimelineRows::new(&self.projection, self.model.spans(), &self.config.row_heights);
        f(&mut self.list, &rows)
    }

    fn set_state(&mut self, state: TimelineState) {
        self.projection = state.project(self.model.spans());
        self.state = state;
        self.list.reset_positions();
        let view_height = self.list.view_height();
        self.list.on_resize(view_height);
    }

    fn scroll_to(&mut self, y: f64) {
        let max = self.list.max_scroll_top();
        self.list.on_scroll(y.clamp(0.0, max));
    }

    /// Row under a content y offset, with its position.
    fn row_at(&mut self, y: f64) -> Option<(usize, RowPosition)> {
        self.with_rows(|list, rows| {
            let mut index = list.top_visible_index(rows);
            loop {
                let position = list.row_position(index, rows).ok()?;
                if y < position.y {
                    return None;
                }
                if y < position.y + position.height {
                    return Some((index, position));
                }
                index += 1;
            }
        })
    }
}

struct TimelineAccessors(Rc<RefCell<Timeline>>);

impl Accessors for TimelineAccessors {
    fn view_range(&self) -> (f64, f64) {
        self.0.borrow().view_range.current
    }

    fn searched_span_ids(&self) -> Option<HashSet<SpanId>> {
        self.0.borrow().searched.clone()
    }

    fn collapsed_children(&self) -> HashSet<SpanId> {
        self.0.borrow().state.collapsed().clone()
    }

    fn view_height(&self) -> f64 {
        self.0.borrow().list.view_height()
    }

    fn top_row_index_visible(&self) -> usize {
        self.0.borrow_mut().with_rows(|list, rows| list.top_visible_index(rows))
    }

    fn bottom_row_index_visible(&self) -> usize {
        self.0.borrow_mut().with_rows(|list, rows| list.bottom_visible_index(rows))
    }

    fn row_position(&self, row_index: usize) -> Result<RowPosition, ListError> {
        self.0.borrow_mut().with_rows(|list, rows| list.row_position(row_index, rows))
    }

    fn map_row_index_to_span_index(&self, row_index: usize) -> Result<usize, RowError> {
        self.0.borrow().projection.row_index_to_span_index(row_index)
    }

    fn map_span_index_to_row_index(&self, span_index: usize) -> Result<usize, RowError> {
        self.0.borrow().projection.span_index_to_row_index(span_index)
    }
}

/// Starts eased scrolls; [`App::tick`] plays them back.
struct TweenScroller {
    timeline: Rc<RefCell<Timeline>>,
    tweener: Rc<RefCell<ScrollTweener>>,
}

impl Scroller for TweenScroller {
    fn scroll_to(&mut self, y: f64) {
        let (current, max) = {
            let timeline = self.timeline.borrow();
            (timeline.list.scroll_top(), timeline.list.max_scroll_top())
        };
        self.tweener
            .borrow_mut()
            .scroll_to(current, y.clamp(0.0, max), Instant::now());
    }

    fn scroll_by(&mut self, delta: f64, append_to_last: bool) {
        let current = self.timeline.borrow().list.scroll_top();
        self.tweener
            .borrow_mut()
            .scroll_by(current, delta, append_to_last, Instant::now());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Minimap,
    Header,
    Rows,
    Outside,
}

/// Screen regions, in cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Layout {
    pub title: Rect,
    pub minimap: Rect,
    pub header: Rect,
    pub rows: Rect,
    pub status: Rect,
    /// Width of the span-name column.
    pub name_width: u16,
}

impl Layout {
    fn new(area: Rect, name_column_width: f64) -> Self {
        let minimap_rows = MINIMAP_ROWS.min(area.height.saturating_sub(4));
        let rows_top = area.y + 2 + minimap_rows;
        let rows_height = area.height.saturating_sub(3 + minimap_rows);
        Self {
            title: Rect::new(area.x, area.y, area.width, 1),
            minimap: Rect::new(area.x, area.y + 1, area.width, minimap_rows),
            header: Rect::new(area.x, area.y + 1 + minimap_rows, area.width, 1),
            rows: Rect::new(area.x, rows_top, area.width, rows_height),
            status: Rect::new(area.x, area.y + area.height.saturating_sub(1), area.width, 1),
            name_width: (f64::from(area.width) * name_column_width).floor() as u16,
        }
    }

    fn region_at(&self, column: u16, row: u16) -> Region {
        let at = ratatui::layout::Position::new(column, row);
        if self.minimap.contains(at) {
            Region::Minimap
        } else if self.header.contains(at) {
            Region::Header
        } else if self.rows.contains(at) {
            Region::Rows
        } else {
            Region::Outside
        }
    }

    /// The timeline column of the header and row regions together.
    pub fn timeline_column(&self) -> Rect {
        Rect::new(
            self.header.x + self.name_width,
            self.header.y,
            self.header.width.saturating_sub(self.name_width),
            self.header.height + self.rows.height,
        )
    }
}

/// Everything one draw needs, as command lists per region.
#[derive(Debug, Default)]
pub struct Frame {
    pub title: String,
    pub minimap: Vec<RenderCommand>,
    pub header: Vec<RenderCommand>,
    pub rows: Vec<RenderCommand>,
    /// Header reframe/shift overlays, over the timeline column.
    pub timeline_overlay: Vec<RenderCommand>,
    /// Name-column grip and its drag indicator, over header and rows.
    pub resizer: Vec<RenderCommand>,
    pub status: String,
}

pub struct App {
    timeline: Rc<RefCell<Timeline>>,
    tweener: Rc<RefCell<ScrollTweener>>,
    scroll: ScrollManager,
    shortcuts: ShortcutBinder,
    resizer: RangeResizer,
    minimap: RangeReframer,
    header: RangeReframer,
    area: Rect,
    layout: Layout,
    hover_strip: Option<Region>,
    search_input: Option<String>,
    status: String,
}

impl App {
    pub fn new(model: TraceModel, config: TimelineConfig) -> Self {
        let model = Arc::new(model);
        let state = TimelineState::new(&config);
        let projection = state.project(model.spans());
        let resizer = RangeResizer::name_column(&config, state.name_column_width());
        let timeline = Rc::new(RefCell::new(Timeline {
            list: VirtualList::new((&config).into()),
            config: config.clone(),
            model: Arc::clone(&model),
            state,
            projection,
            view_range: ViewRange::default(),
            searched: None,
        }));
        let tweener = Rc::new(RefCell::new(ScrollTweener::from_config(&config)));

        let mut scroll = ScrollManager::new(&config);
        scroll.set_trace(Some(model));
        scroll.set_accessors(Box::new(TimelineAccessors(Rc::clone(&timeline))));
        scroll.set_scroller(Box::new(TweenScroller {
            timeline: Rc::clone(&timeline),
            tweener: Rc::clone(&tweener),
        }));

        let mut shortcuts = ShortcutBinder::default();
        shortcuts.bind(KeyChord::plain(KeyCode::PageDown), ShortcutAction::ScrollPageDown);
        shortcuts.bind(KeyChord::plain(KeyCode::PageUp), ShortcutAction::ScrollPageUp);
        shortcuts.attach();

        Self {
            timeline,
            tweener,
            scroll,
            shortcuts,
            resizer,
            minimap: RangeReframer::minimap().with_min_range(config.min_view_range),
            header: RangeReframer::timeline_header().with_min_range(config.min_view_range),
            area: Rect::default(),
            layout: Layout::default(),
            hover_strip: None,
            search_input: None,
            status: String::new(),
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Logical units per terminal row in the row region.
    pub fn row_unit(&self) -> f64 {
        self.timeline.borrow().config.row_heights.bar
    }

    /// Lay the regions out for the terminal area and push the geometry into
    /// the list and the drag strips.
    pub fn resize(&mut self, area: Rect) {
        if area == self.area {
            return;
        }
        let resized = area.width != self.area.width;
        self.area = area;
        debug!(width = area.width, height = area.height, "terminal resized");
        self.relayout();
        if resized {
            self.minimap.handle_window_resize();
            self.header.handle_window_resize();
            self.resizer.handle_window_resize();
        }
    }

    fn relayout(&mut self) {
        let name_column_width = self.timeline.borrow().state.name_column_width();
        let layout = Layout::new(self.area, name_column_width);
        self.layout = layout;

        let view_height = f64::from(layout.rows.height) * self.row_unit();
        self.timeline.borrow_mut().list.on_resize(view_height);

        let width = f64::from(layout.minimap.width);
        let name_width = f64::from(layout.name_width);
        self.minimap
            .set_strip(StripRect::new(f64::from(layout.minimap.x), width));
        self.header.set_strip(StripRect::new(
            f64::from(layout.rows.x) + name_width,
            (width - name_width).max(0.0),
        ));
        self.resizer
            .set_strip(StripRect::new(f64::from(layout.rows.x), width));
    }

    /// Advance the scroll tween and run the list's per-frame recompute.
    pub fn tick(&mut self, now: Instant) {
        let next = self.tweener.borrow_mut().tick(now);
        let mut timeline = self.timeline.borrow_mut();
        if let Some(y) = next {
            timeline.scroll_to(y);
        }
        if timeline.with_rows(|list, rows| list.on_animation_frame(rows)) {
            trace!("rows redrawn");
        }
    }

    pub fn is_animating(&self) -> bool {
        self.tweener.borrow().is_active()
    }

    pub fn is_editing_search(&self) -> bool {
        self.search_input.is_some()
    }

    pub fn push_search_char(&mut self, c: char) {
        if let Some(input) = &mut self.search_input {
            input.push(c);
        }
    }

    pub fn pop_search_char(&mut self) {
        if let Some(input) = &mut self.search_input {
            input.pop();
        }
    }

    pub fn cancel_search_input(&mut self) {
        self.search_input = None;
    }

    /// Mark the spans whose service, operation or tag values contain the
    /// query, and jump to the first one.
    pub fn commit_search(&mut self) {
        let Some(query) = self.search_input.take() else {
            return;
        };
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            self.clear_search();
            return;
        }
        let ids: HashSet<SpanId> = {
            let timeline = self.timeline.borrow();
            timeline
                .model
                .spans()
                .iter()
                .filter(|span| {
                    span.service_name.to_lowercase().contains(&query)
                        || span.operation_name.to_lowercase().contains(&query)
                        || span
                            .tags
                            .iter()
                            .any(|kv| kv.value.to_string().to_lowercase().contains(&query))
                })
                .map(|span| span.span_id.clone())
                .collect()
        };
        debug!(query, matches = ids.len(), "search");
        self.status = format!("{} matches for \"{query}\"", ids.len());
        let found = !ids.is_empty();
        self.timeline.borrow_mut().searched = Some(ids);
        if found {
            let result = self.scroll.scroll_to_first_visible_span();
            self.report_navigation(result);
        }
    }

    fn clear_search(&mut self) {
        self.timeline.borrow_mut().searched = None;
        self.status.clear();
    }

    /// Dispatch a key through the shortcut binder. Returns whether it was
    /// bound.
    pub fn handle_key(&mut self, chord: KeyChord) -> bool {
        let Some(action) = self.shortcuts.dispatch(chord) else {
            return false;
        };
        debug!(action = action.describe(), "shortcut");
        self.apply(action);
        true
    }

    fn apply(&mut self, action: ShortcutAction) {
        use ShortcutAction as A;
        match action {
            A::ScrollPageDown => self.scroll.scroll_page_down(),
            A::ScrollPageUp => self.scroll.scroll_page_up(),
            A::ScrollToNextVisibleSpan => {
                let result = self.scroll.scroll_to_next_visible_span();
                self.report_navigation(result);
            }
            A::ScrollToPrevVisibleSpan => {
                let result = self.scroll.scroll_to_prev_visible_span();
                self.report_navigation(result);
            }
            A::PanLeft
            | A::PanLeftFast
            | A::PanRight
            | A::PanRightFast
            | A::ZoomIn
            | A::ZoomInFast
            | A::ZoomOut
            | A::ZoomOutFast => {
                let adjusted = {
                    let timeline = self.timeline.borrow();
                    action.adjust_view(&timeline.view_range, &timeline.config)
                };
                if let Some(view) = adjusted {
                    self.set_view_range(view);
                }
            }
            A::CollapseAll | A::ExpandAll | A::CollapseOne | A::ExpandOne => {
                let mut timeline = self.timeline.borrow_mut();
                let spans = timeline.model.spans();
                let next = match action {
                    A::CollapseAll => timeline.state.collapse_all(spans),
                    A::ExpandAll => timeline.state.expand_all(),
                    A::CollapseOne => timeline.state.collapse_one(spans),
                    _ => timeline.state.expand_one(spans),
                };
                timeline.set_state(next);
            }
            A::FocusSearch => self.search_input = Some(String::new()),
            A::ClearSearch => self.clear_search(),
        }
    }

    fn report_navigation(&mut self, result: Result<Option<usize>, ScrollError>) {
        match result {
            Ok(Some(span_index)) => {
                let timeline = self.timeline.borrow();
                if let Some(span) = timeline.model.span(span_index) {
                    self.status = format!("{} {}", span.service_name, span.operation_name);
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "navigation failed"),
        }
    }

    pub fn reset_zoom(&mut self) {
        let change = self.minimap.reset_zoom();
        self.apply_range_change(change);
    }

    fn set_view_range(&mut self, view: ViewRange) {
        self.timeline.borrow_mut().view_range = view;
        self.minimap.set_view_range(view);
        self.header.set_view_range(view);
    }

    fn apply_range_change(&mut self, change: RangeChange) {
        let current = self.timeline.borrow().view_range;
        let next = match change {
            RangeChange::Next(update) => current.update_next(update),
            RangeChange::Commit { start, end } => {
                debug!(start, end, "view range committed");
                current.commit(start, end)
            }
        };
        self.set_view_range(next);
    }

    fn route_reframer(&mut self, region: Region, event: MouseEvent) {
        let reframer = match region {
            Region::Minimap => &mut self.minimap,
            _ => &mut self.header,
        };
        match reframer.handle_event(event) {
            Ok(Some(change)) => self.apply_range_change(change),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "reframe event dropped"),
        }
    }

    fn route_resizer(&mut self, event: MouseEvent) {
        match self.resizer.handle_event(event) {
            Ok(Some(position)) => {
                {
                    let mut timeline = self.timeline.borrow_mut();
                    let next = timeline.state.set_name_column_width(position);
                    debug!(width = next.name_column_width(), "name column resized");
                    self.resizer.set_position(next.name_column_width());
                    timeline.set_state(next);
                }
                self.relayout();
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "resize event dropped"),
        }
    }

    /// Route a pointer event. Drags keep the pointer until release, wherever
    /// it goes; otherwise the region under the pointer gets the event.
    pub fn handle_mouse(&mut self, event: MouseEvent) {
        if self.resizer.is_dragging() {
            self.route_resizer(event);
            return;
        }
        if self.minimap.is_dragging() {
            self.route_reframer(Region::Minimap, event);
            return;
        }
        if self.header.is_dragging() {
            self.route_reframer(Region::Header, event);
            return;
        }

        let region = self
            .layout
            .region_at(event.client_x as u16, event.client_y as u16);
        // The header strip only covers the timeline column.
        let strip = match region {
            Region::Minimap => Some(Region::Minimap),
            Region::Header if event.client_x >= f64::from(self.layout.name_width) => {
                Some(Region::Header)
            }
            _ => None,
        };
        if strip != self.hover_strip {
            if let Some(previous) = self.hover_strip {
                self.route_reframer(previous, MouseEvent::leave(event.client_x));
            }
            if let Some(next) = strip {
                self.route_reframer(next, MouseEvent::enter(event.client_x));
            }
            self.hover_strip = strip;
        }

        let on_grip = event.kind == MouseEventKind::Down
            && self.resizer.hits_grip(event.client_x, GRIP_WIDTH);
        match region {
            Region::Header | Region::Rows if on_grip => self.route_resizer(event),
            Region::Minimap | Region::Header => {
                if let Some(strip) = strip {
                    self.route_reframer(strip, event);
                }
            }
            Region::Rows if event.kind == MouseEventKind::Down => {
                self.click_row(event.client_x, event.client_y);
            }
            Region::Rows | Region::Outside => {}
        }
    }

    /// Mouse wheel over the rows: scroll immediately, dropping any tween.
    pub fn wheel(&mut self, notches: f64) {
        self.tweener.borrow_mut().cancel();
        let mut timeline = self.timeline.borrow_mut();
        let y = timeline.list.scroll_top() + notches * WHEEL_ROWS * timeline.config.row_heights.bar;
        timeline.scroll_to(y);
    }

    fn click_row(&mut self, column: f64, row: f64) {
        let mut timeline = self.timeline.borrow_mut();
        let bar = timeline.config.row_heights.bar;
        let y = (row - f64::from(self.layout.rows.y)) * bar + timeline.list.scroll_top();
        let Some((row_index, position)) = timeline.row_at(y) else {
            return;
        };
        let Some(row) = timeline.projection.row(row_index).cloned() else {
            return;
        };
        let Some(span) = timeline.model.span(row.span_index) else {
            return;
        };

        let next = if row.is_detail {
            let Some(detail) = timeline.state.detail(row.span_id.as_str()) else {
                return;
            };
            let line = ((y - position.y) / bar).floor() as usize;
            let lines = detail_lines(span, detail, timeline.model.start_time());
            let Some(section) = lines.get(line).and_then(|l| l.toggles) else {
                return;
            };
            timeline.state.detail_section_toggle(&row.span_id, section)
        } else if hits_toggle(span, column) {
            timeline.state.children_toggle(&row.span_id)
        } else {
            timeline.state.detail_toggle(&row.span_id)
        };
        timeline.set_state(next);
    }

    /// Build the command lists for the current state.
    pub fn frame(&mut self) -> Frame {
        let layout = self.layout;
        let mut guard = self.timeline.borrow_mut();
        let timeline = &mut *guard;
        let width = f64::from(layout.rows.width);
        let name_width = f64::from(layout.name_width);
        let bar = timeline.config.row_heights.bar;

        let rows = {
            let frame = WaterfallFrame {
                model: &timeline.model,
                projection: &timeline.projection,
                state: &timeline.state,
                view_range: &timeline.view_range,
                searched: timeline.searched.as_ref(),
                heights: &timeline.config.row_heights,
            };
            let viewport = Viewport::new(width, f64::from(layout.rows.height) * bar);
            render_waterfall(&frame, &mut timeline.list, &viewport)
        };

        let minimap = render_minimap(
            &timeline.model,
            &Viewport::new(width, f64::from(layout.minimap.height)),
            &self.minimap.overlay(),
        );

        let duration = timeline.model.duration();
        let view = timeline.view_range;
        let mut header = vec![
            RenderCommand::DrawRect {
                rect: UnitRect::new(0.0, 0.0, name_width, 1.0),
                color: ThemeToken::HeaderBackground,
                border_color: None,
                label: None,
                span_index: None,
            },
            RenderCommand::DrawText {
                position: Point::new(1.0, 0.0),
                text: "Service & Operation".into(),
                color: ThemeToken::TextPrimary,
                font_size: 11.0,
                align: TextAlign::Left,
            },
        ];
        header.extend(render_ticks(
            &Viewport::new(width, 1.0),
            name_width,
            view.start() * duration,
            view.end() * duration,
            timeline.config.tick_count,
            0.0,
        ));

        let column = layout.timeline_column();
        let timeline_overlay = render_overlay(
            &Viewport::new(f64::from(column.width), f64::from(column.height)),
            &self.header.overlay(),
        );

        let resizer_height = f64::from(layout.header.height + layout.rows.height);
        let grip_x = self.resizer.grip_position() * width;
        let mut resizer = Vec::new();
        if let Some(indicator) = self.resizer.drag_indicator() {
            resizer.push(RenderCommand::DrawRect {
                rect: UnitRect::new(
                    indicator.left * width,
                    0.0,
                    (indicator.width * width).max(1.0),
                    resizer_height,
                ),
                color: ThemeToken::ResizerDragRegion,
                border_color: None,
                label: None,
                span_index: None,
            });
        }
        resizer.push(RenderCommand::DrawLine {
            from: Point::new(grip_x, 0.0),
            to: Point::new(grip_x, resizer_height),
            color: ThemeToken::ResizerGrip,
            width: 1.0,
        });

        let title = format!(
            " waterfall | {} spans | {} | view {:.0}%..{:.0}% | q quit ",
            timeline.model.len(),
            format_duration(duration),
            view.start() * 100.0,
            view.end() * 100.0,
        );
        let status = match &self.search_input {
            Some(input) => format!(" search: {input}_"),
            None if self.status.is_empty() => {
                " s/w page  f/b next/prev  a/d pan  up/down zoom  [ ] o p expand/collapse  ctrl+b search  z reset".into()
            }
            None => format!(" {}", self.status),
        };

        Frame {
            title,
            minimap,
            header,
            rows,
            timeline_overlay,
            resizer,
            status,
        }
    }

    /// Tear the controllers down before the terminal is restored.
    pub fn shutdown(&mut self) {
        self.shortcuts.detach();
        self.minimap.dispose();
        self.header.dispose();
        self.resizer.dispose();
        self.scroll.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waterfall_protocol::{RefType, Span, SpanReference, Trace};

    fn span(id: &str, depth: u32, parent: Option<&str>, start: f64, has_children: bool) -> Span {
        Span {
            span_id: id.into(),
            operation_name: format!("op-{id}"),
            service_name: format!("svc-{id}"),
            depth,
            start_time: start,
            duration: 10.0,
            has_children,
            references: parent
                .map(|p| SpanReference {
                    ref_type: RefType::ChildOf,
                    span_id: p.into(),
                    trace_id: "t".into(),
                })
                .into_iter()
                .collect(),
            logs: Vec::new(),
            tags: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn app() -> App {
        let trace = Trace {
            trace_id: "t".into(),
            start_time: 0.0,
            end_time: 40.0,
            spans: vec![
                span("a", 0, None, 0.0, true),
                span("b", 1, Some("a"), 10.0, true),
                span("c", 2, Some("b"), 20.0, false),
                span("d", 1, Some("a"), 30.0, false),
            ],
        };
        let model = TraceModel::new(trace).expect("pre-order");
        let mut app = App::new(model, TimelineConfig::default());
        app.resize(Rect::new(0, 0, 100, 20));
        app
    }

    fn row_keys(app: &App) -> Vec<String> {
        let timeline = app.timeline.borrow();
        timeline.projection.rows().iter().map(|r| r.key()).collect()
    }

    #[test]
    fn layout_stacks_regions() {
        let app = app();
        let layout = app.layout();
        assert_eq!(layout.minimap, Rect::new(0, 1, 100, 4));
        assert_eq!(layout.header, Rect::new(0, 5, 100, 1));
        assert_eq!(layout.rows, Rect::new(0, 6, 100, 13));
        assert_eq!(layout.status.y, 19);
        assert_eq!(layout.name_width, 25);
    }

    #[test]
    fn clicks_toggle_children_and_details() {
        let mut app = app();
        // Row of span b, on its glyph (depth 1, indent 2).
        app.handle_mouse(MouseEvent::down(2.0).with_y(7.0));
        assert_eq!(row_keys(&app), vec!["a--bar", "b--bar", "d--bar"]);

        app.handle_mouse(MouseEvent::down(60.0).with_y(8.0));
        assert_eq!(row_keys(&app), vec!["a--bar", "b--bar", "d--bar", "d--detail"]);
    }

    #[test]
    fn keys_dispatch_through_the_binder() {
        let mut app = app();
        assert!(app.handle_key(KeyChord::plain(KeyCode::Char(']'))));
        assert_eq!(row_keys(&app), vec!["a--bar"]);
        assert!(app.handle_key(KeyChord::plain(KeyCode::Up)));
        let view = app.timeline.borrow().view_range;
        assert!((view.start() - 0.005).abs() < 1e-9);
        assert!(!app.handle_key(KeyChord::plain(KeyCode::Char('x'))));

        assert!(app.handle_key(KeyChord::ctrl(KeyCode::Char('b'))));
        assert!(app.is_editing_search());
        for c in "svc-d".chars() {
            app.push_search_char(c);
        }
        app.commit_search();
        assert!(!app.is_editing_search());
        let searched = app.timeline.borrow().searched.clone();
        assert_eq!(searched.map(|ids| ids.len()), Some(1));
    }

    #[test]
    fn minimap_drag_commits_a_view_range() {
        let mut app = app();
        app.handle_mouse(MouseEvent::down(20.0).with_y(2.0));
        app.handle_mouse(MouseEvent::moved(50.0).with_y(9.0));
        let dragging = app.timeline.borrow().view_range;
        assert!(dragging.is_dragging());
        app.handle_mouse(MouseEvent::up(60.0).with_y(9.0));
        let view = app.timeline.borrow().view_range;
        assert_eq!(view.current, (0.2, 0.6));

        app.reset_zoom();
        assert_eq!(app.timeline.borrow().view_range.current, (0.0, 1.0));
    }

    #[test]
    fn header_hover_ignores_the_name_column() {
        let mut app = app();
        app.handle_mouse(MouseEvent::moved(10.0).with_y(5.0));
        assert_eq!(app.timeline.borrow().view_range.cursor, None);

        app.handle_mouse(MouseEvent::moved(60.0).with_y(5.0));
        assert!(app.timeline.borrow().view_range.cursor.is_some());

        app.handle_mouse(MouseEvent::moved(10.0).with_y(5.0));
        assert_eq!(app.timeline.borrow().view_range.cursor, None);
    }

    #[test]
    fn dragging_the_grip_resizes_the_name_column() {
        let mut app = app();
        app.handle_mouse(MouseEvent::down(25.0).with_y(10.0));
        app.handle_mouse(MouseEvent::moved(40.0).with_y(10.0));
        assert_eq!(app.frame().resizer.len(), 2);
        app.handle_mouse(MouseEvent::up(40.0).with_y(10.0));
        let width = app.timeline.borrow().state.name_column_width();
        assert!((width - 0.4).abs() < 1e-9);
        assert_eq!(app.layout().name_width, 40);
    }

    #[test]
    fn frame_renders_every_region() {
        let mut app = app();
        let frame = app.frame();
        assert!(!frame.minimap.is_empty());
        assert!(!frame.rows.is_empty());
        assert!(frame.title.contains("4 spans"));
        assert!(frame.status.contains("ctrl+b"));
    }
}
