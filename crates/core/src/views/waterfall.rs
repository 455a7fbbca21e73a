use std::collections::HashSet;

use waterfall_protocol::{Point, Rect, RenderCommand, Span, SpanId, TextAlign, ThemeToken, Viewport};

use crate::config::RowHeights;
use crate::model::{DetailSection, DetailState, TraceModel, ViewRange, ViewedBounds};
use crate::rows::{Row, RowProjection, TimelineRows};
use crate::timeline::TimelineState;
use crate::virtual_list::{RowSlot, VirtualList};

use super::ticks::format_duration;

const INDENT: f64 = 2.0;
const MIN_BAR_WIDTH: f64 = 1.0;
const FONT_SIZE: f64 = 11.0;

/// Everything one frame of the span rows depends on.
#[derive(Debug, Clone, Copy)]
pub struct WaterfallFrame<'a> {
    pub model: &'a TraceModel,
    pub projection: &'a RowProjection,
    pub state: &'a TimelineState,
    pub view_range: &'a ViewRange,
    pub searched: Option<&'a HashSet<SpanId>>,
    pub heights: &'a RowHeights,
}

impl WaterfallFrame<'_> {
    fn is_match(&self, span: &Span) -> bool {
        self.searched.is_some_and(|ids| ids.contains(&span.span_id))
    }
}

/// Horizontal layout: the span-name column, then the timeline column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnLayout {
    pub width: f64,
    pub name_width: f64,
}

impl ColumnLayout {
    pub fn new(width: f64, name_column_width: f64) -> Self {
        Self {
            width,
            name_width: (width * name_column_width).floor(),
        }
    }

    pub fn timeline_x(&self) -> f64 {
        self.name_width
    }

    pub fn timeline_width(&self) -> f64 {
        (self.width - self.name_width).max(0.0)
    }
}

/// Whether `x` falls on the expand/collapse glyph of the span's name cell.
pub fn hits_toggle(span: &Span, x: f64) -> bool {
    let left = f64::from(span.depth) * INDENT;
    span.has_children && x >= left && x < left + INDENT
}

/// Render the rows the virtual list currently draws.
///
/// Row `y` coordinates are relative to the top of `viewport`; each row is
/// wrapped in a group keyed by its stable row key.
pub fn render_waterfall(
    frame: &WaterfallFrame<'_>,
    list: &mut VirtualList,
    viewport: &Viewport,
) -> Vec<RenderCommand> {
    let source = TimelineRows::new(frame.projection, frame.model.spans(), frame.heights);
    let slots = list.render(&source, |slot| slot);
    let layout = ColumnLayout::new(viewport.width, frame.state.name_column_width());
    let bounds = ViewedBounds::new(
        frame.model.start_time(),
        frame.model.end_time(),
        frame.view_range,
    );
    let scroll_top = list.scroll_top();

    let mut commands = Vec::with_capacity(slots.len() * 6 + 2);
    commands.push(RenderCommand::SetClip {
        rect: Rect::new(0.0, 0.0, viewport.width, viewport.height),
    });
    for slot in slots {
        let Some(row) = frame.projection.row(slot.index) else {
            continue;
        };
        let Some(span) = frame.model.span(row.span_index) else {
            continue;
        };
        let y = slot.top - scroll_top;
        if y >= viewport.height || y + slot.height <= 0.0 {
            continue;
        }
        commands.push(RenderCommand::BeginGroup {
            id: slot.key.clone(),
            label: Some(span.operation_name.clone()),
        });
        if row.is_detail {
            let detail = frame.state.detail(span.span_id.as_str()).cloned().unwrap_or_default();
            render_detail_row(&mut commands, frame, span, &detail, &slot, y, &layout);
        } else {
            render_bar_row(&mut commands, frame, row, span, &slot, y, &layout, &bounds);
        }
        commands.push(RenderCommand::EndGroup);
    }
    commands.push(RenderCommand::ClearClip);
    commands
}

#[allow(clippy::too_many_arguments)]
fn render_bar_row(
    commands: &mut Vec<RenderCommand>,
    frame: &WaterfallFrame<'_>,
    row: &Row,
    span: &Span,
    slot: &RowSlot,
    y: f64,
    layout: &ColumnLayout,
    bounds: &ViewedBounds,
) {
    let background = if frame.is_match(span) {
        ThemeToken::SearchMatch
    } else if slot.index % 2 == 1 {
        ThemeToken::RowBackgroundAlt
    } else {
        ThemeToken::RowBackground
    };
    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(0.0, y, layout.width, slot.height),
        color: background,
        border_color: None,
        label: None,
        span_index: Some(row.span_index),
    });

    let glyph = match (span.has_children, frame.state.is_collapsed(span.span_id.as_str())) {
        (false, _) => "  ",
        (true, true) => "▸ ",
        (true, false) => "▾ ",
    };
    commands.push(RenderCommand::SetClip {
        rect: Rect::new(0.0, y, layout.name_width, slot.height),
    });
    commands.push(RenderCommand::DrawText {
        position: Point::new(f64::from(span.depth) * INDENT, y),
        text: format!("{glyph}{} {}", span.service_name, span.operation_name),
        color: if span.is_error() {
            ThemeToken::SpanBarError
        } else {
            ThemeToken::TextPrimary
        },
        font_size: FONT_SIZE,
        align: TextAlign::Left,
    });
    commands.push(RenderCommand::ClearClip);

    commands.push(RenderCommand::DrawLine {
        from: Point::new(layout.timeline_x(), y),
        to: Point::new(layout.timeline_x(), y + slot.height),
        color: ThemeToken::Border,
        width: 1.0,
    });

    let (start, end) = bounds.map(span.start_time, span.end_time());
    if end < 0.0 || start > 1.0 {
        return;
    }
    let timeline_width = layout.timeline_width();
    let x = layout.timeline_x() + start.max(0.0) * timeline_width;
    let w = ((end.min(1.0) - start.max(0.0)) * timeline_width).max(MIN_BAR_WIDTH);
    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(x, y, w, slot.height),
        color: if span.is_error() {
            ThemeToken::SpanBarError
        } else {
            ThemeToken::for_service(&span.service_name)
        },
        border_color: None,
        label: Some(format_duration(span.duration)),
        span_index: Some(row.span_index),
    });
}

/// One text line of an expanded detail panel, and the section it toggles
/// when clicked.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailLine {
    pub text: String,
    pub toggles: Option<DetailSection>,
}

impl DetailLine {
    fn plain(text: String) -> Self {
        Self { text, toggles: None }
    }

    fn header(text: String, section: DetailSection) -> Self {
        Self {
            text,
            toggles: Some(section),
        }
    }
}

fn marker(open: bool) -> &'static str {
    if open { "▾" } else { "▸" }
}

/// Lines of an expanded detail panel, honoring which sections are open.
pub fn detail_lines(span: &Span, detail: &DetailState, trace_start: f64) -> Vec<DetailLine> {
    let mut lines = vec![DetailLine::plain(format!(
        "{}  service: {}  start: {}  duration: {}",
        span.operation_name,
        span.service_name,
        format_duration(span.start_time - trace_start),
        format_duration(span.duration),
    ))];

    lines.push(DetailLine::header(
        format!("{} Tags ({})", marker(detail.is_tags_open), span.tags.len()),
        DetailSection::Tags,
    ));
    if detail.is_tags_open {
        lines.extend(
            span.tags
                .iter()
                .map(|kv| DetailLine::plain(format!("    {} = {}", kv.key, kv.value))),
        );
    }
    lines.push(DetailLine::header(
        format!("{} Process: {}", marker(detail.is_process_open), span.service_name),
        DetailSection::Process,
    ));
    lines.push(DetailLine::header(
        format!("{} Logs ({})", marker(detail.logs.is_open), span.logs.len()),
        DetailSection::Logs,
    ));
    if detail.logs.is_open {
        for (i, log) in span.logs.iter().enumerate() {
            let open = detail.logs.opened_items.contains(&i);
            lines.push(DetailLine::header(
                format!("  {} {}", marker(open), format_duration(log.timestamp - trace_start)),
                DetailSection::LogItem(i),
            ));
            if open {
                lines.extend(
                    log.fields
                        .iter()
                        .map(|kv| DetailLine::plain(format!("      {} = {}", kv.key, kv.value))),
                );
            }
        }
    }
    if !span.warnings.is_empty() {
        lines.push(DetailLine::header(
            format!("{} Warnings ({})", marker(detail.is_warnings_open), span.warnings.len()),
            DetailSection::Warnings,
        ));
        if detail.is_warnings_open {
            lines.extend(span.warnings.iter().map(|w| DetailLine::plain(format!("    {w}"))));
        }
    }
    // A single parent is already implied by the tree.
    if span.references.len() > 1 {
        lines.push(DetailLine::header(
            format!("{} References ({})", marker(detail.is_references_open), span.references.len()),
            DetailSection::References,
        ));
        if detail.is_references_open {
            lines.extend(
                span.references
                    .iter()
                    .map(|r| DetailLine::plain(format!("    {:?} {}", r.ref_type, r.span_id))),
            );
        }
    }
    lines
}

fn render_detail_row(
    commands: &mut Vec<RenderCommand>,
    frame: &WaterfallFrame<'_>,
    span: &Span,
    detail: &DetailState,
    slot: &RowSlot,
    y: f64,
    layout: &ColumnLayout,
) {
    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(0.0, y, layout.width, slot.height),
        color: ThemeToken::DetailBackground,
        border_color: Some(ThemeToken::Border),
        label: None,
        span_index: None,
    });
    let line_height = frame.heights.bar;
    let x = f64::from(span.depth) * INDENT + INDENT;
    let lines = detail_lines(span, detail, frame.model.start_time());
    commands.push(RenderCommand::SetClip {
        rect: Rect::new(0.0, y, layout.width, slot.height),
    });
    for (i, line) in lines.into_iter().enumerate() {
        let line_y = y + i as f64 * line_height;
        if line_y + line_height > y + slot.height {
            break;
        }
        commands.push(RenderCommand::DrawText {
            position: Point::new(x, line_y),
            text: line.text,
            color: if line.toggles.is_some() {
                ThemeToken::TextSecondary
            } else {
                ThemeToken::DetailText
            },
            font_size: FONT_SIZE,
            align: TextAlign::Left,
        });
    }
    commands.push(RenderCommand::ClearClip);
}
