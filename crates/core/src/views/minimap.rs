use waterfall_protocol::{Point, Rect, RenderCommand, ThemeToken, Viewport};

use crate::model::TraceModel;
use crate::range::ReframeOverlay;

const CELL_WIDTH: f64 = 1.0;
const HANDLE_WIDTH: f64 = 1.0;

/// Render the minimap: every span of the trace squeezed into the strip,
/// then the reframe/shift overlays on top.
///
/// Spans are bucketed into a grid (rows by span index, columns by time) and
/// adjacent filled cells of a row are merged into one rect, so the command
/// count stays bounded by the strip size rather than the span count.
pub fn render_minimap(
    model: &TraceModel,
    viewport: &Viewport,
    overlay: &ReframeOverlay,
) -> Vec<RenderCommand> {
    let duration = model.duration();
    if duration <= 0.0 || viewport.width <= 0.0 || viewport.height <= 0.0 {
        return Vec::new();
    }

    let cols = (viewport.width / CELL_WIDTH).ceil() as usize;
    let rows = (viewport.height.floor() as usize).clamp(1, model.len().max(1));
    let row_height = viewport.height / rows as f64;

    let mut commands = Vec::with_capacity(rows * 4 + 12);
    commands.push(RenderCommand::BeginGroup {
        id: "minimap".into(),
        label: Some("Minimap".into()),
    });
    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(0.0, 0.0, viewport.width, viewport.height),
        color: ThemeToken::MinimapBackground,
        border_color: None,
        label: None,
        span_index: None,
    });

    // Each cell keeps the color of the last span drawn into it.
    let mut grid: Vec<Option<(ThemeToken, usize)>> = vec![None; cols * rows];
    let col_duration = duration / cols as f64;
    let span_count = model.len().max(1);
    for (index, span) in model.spans().iter().enumerate() {
        let row = index * rows / span_count;
        let offset = span.start_time - model.start_time();
        let col_start = ((offset / col_duration) as usize).min(cols - 1);
        let col_end = (((offset + span.duration) / col_duration).ceil() as usize).clamp(col_start + 1, cols);
        let color = ThemeToken::for_service(&span.service_name);
        for cell in &mut grid[row * cols + col_start..row * cols + col_end] {
            *cell = Some((color, index));
        }
    }

    for row in 0..rows {
        let y = row as f64 * row_height;
        let cells = &grid[row * cols..(row + 1) * cols];
        let mut c = 0;
        while c < cols {
            let Some((color, span_index)) = cells[c] else {
                c += 1;
                continue;
            };
            let run_start = c;
            while c < cols && cells[c].is_some_and(|(other, _)| other == color) {
                c += 1;
            }
            commands.push(RenderCommand::DrawRect {
                rect: Rect::new(
                    run_start as f64 * CELL_WIDTH,
                    y,
                    (c - run_start) as f64 * CELL_WIDTH,
                    row_height,
                ),
                color,
                border_color: None,
                label: None,
                span_index: Some(span_index),
            });
        }
    }

    push_overlay(&mut commands, viewport, overlay);
    commands.push(RenderCommand::EndGroup);
    commands
}

fn region(commands: &mut Vec<RenderCommand>, viewport: &Viewport, (start, end): (f64, f64), color: ThemeToken) {
    let x = start.clamp(0.0, 1.0) * viewport.width;
    let w = end.clamp(0.0, 1.0) * viewport.width - x;
    if w <= 0.0 {
        return;
    }
    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(x, 0.0, w, viewport.height),
        color,
        border_color: None,
        label: None,
        span_index: None,
    });
}

fn guide(commands: &mut Vec<RenderCommand>, viewport: &Viewport, at: f64, color: ThemeToken, width: f64) {
    let x = at * viewport.width;
    commands.push(RenderCommand::DrawLine {
        from: Point::new(x, 0.0),
        to: Point::new(x, viewport.height),
        color,
        width,
    });
}

fn push_overlay(commands: &mut Vec<RenderCommand>, viewport: &Viewport, overlay: &ReframeOverlay) {
    if let Some((start, end)) = overlay.handles {
        // Dim what lies outside the committed view.
        region(commands, viewport, (0.0, start), ThemeToken::MinimapInactive);
        region(commands, viewport, (end, 1.0), ThemeToken::MinimapInactive);
        guide(commands, viewport, start, ThemeToken::MinimapHandle, HANDLE_WIDTH);
        guide(commands, viewport, end, ThemeToken::MinimapHandle, HANDLE_WIDTH);
    }
    if let Some(reframe) = overlay.reframe {
        region(commands, viewport, reframe, ThemeToken::ReframeRegion);
    }
    if let Some(shift) = overlay.shift {
        region(commands, viewport, shift, ThemeToken::ShiftRegion);
    }
    if let Some(cursor) = overlay.cursor {
        guide(commands, viewport, cursor, ThemeToken::CursorGuide, 1.0);
    }
}

/// Overlays alone, for strips that draw their own content (the timeline
/// header).
pub fn render_overlay(viewport: &Viewport, overlay: &ReframeOverlay) -> Vec<RenderCommand> {
    let mut commands = Vec::new();
    push_overlay(&mut commands, viewport, overlay);
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::trace::fixtures::trace_from_depths;

    fn model() -> TraceModel {
        TraceModel::new(trace_from_depths(&[("a", 0), ("b", 1), ("c", 1), ("d", 2)])).expect("pre-order")
    }

    #[test]
    fn renders_spans_and_committed_view() {
        let vp = Viewport::new(40.0, 4.0);
        let overlay = ReframeOverlay {
            handles: Some((0.25, 0.5)),
            ..ReframeOverlay::default()
        };
        let cmds = render_minimap(&model(), &vp, &overlay);
        assert!(matches!(cmds.first(), Some(RenderCommand::BeginGroup { .. })));
        assert!(matches!(cmds.last(), Some(RenderCommand::EndGroup)));

        let span_rects = cmds
            .iter()
            .filter(|c| matches!(c, RenderCommand::DrawRect { span_index: Some(_), .. }))
            .count();
        assert_eq!(span_rects, 4);

        let inactive: Vec<Rect> = cmds
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawRect {
                    rect,
                    color: ThemeToken::MinimapInactive,
                    ..
                } => Some(*rect),
                _ => None,
            })
            .collect();
        assert_eq!(inactive, vec![Rect::new(0.0, 0.0, 10.0, 4.0), Rect::new(20.0, 0.0, 20.0, 4.0)]);
    }

    #[test]
    fn draws_in_progress_overlays() {
        let vp = Viewport::new(100.0, 3.0);
        let overlay = ReframeOverlay {
            cursor: None,
            reframe: Some((0.2, 0.6)),
            shift: None,
            handles: None,
        };
        let cmds = render_overlay(&vp, &overlay);
        assert_eq!(
            cmds,
            vec![RenderCommand::DrawRect {
                rect: Rect::new(20.0, 0.0, 40.0, 3.0),
                color: ThemeToken::ReframeRegion,
                border_color: None,
                label: None,
                span_index: None,
            }]
        );
    }

    #[test]
    fn zero_duration_trace_renders_nothing() {
        let mut trace = trace_from_depths(&[("a", 0)]);
        trace.end_time = trace.start_time;
        let model = TraceModel::new(trace).expect("pre-order");
        assert!(render_minimap(&model, &Viewport::new(10.0, 2.0), &ReframeOverlay::default()).is_empty());
    }
}
