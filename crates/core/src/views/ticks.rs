use waterfall_protocol::{Point, Rect, RenderCommand, TextAlign, ThemeToken, Viewport};

const FONT_SIZE: f64 = 10.0;
const LABEL_PAD: f64 = 1.0;

/// One evenly spaced header tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Position across the timeline column, `[0, 1]`.
    pub fraction: f64,
    /// Time since trace start at this tick, in microseconds.
    pub time: f64,
}

/// `count` ticks spread evenly over the visible window, both ends included.
///
/// `view_start` and `view_end` are offsets from the trace start (µs).
pub fn tick_positions(view_start: f64, view_end: f64, count: usize) -> Vec<Tick> {
    match count {
        0 => Vec::new(),
        1 => vec![Tick {
            fraction: 0.0,
            time: view_start,
        }],
        _ => {
            let last = (count - 1) as f64;
            (0..count)
                .map(|i| {
                    let fraction = i as f64 / last;
                    Tick {
                        fraction,
                        time: view_start + fraction * (view_end - view_start),
                    }
                })
                .collect()
        }
    }
}

/// Render the header row: background, tick lines extending `grid_height`
/// below the header, and duration labels.
///
/// The header spans the timeline column, which starts at `column_x`.
pub fn render_ticks(
    viewport: &Viewport,
    column_x: f64,
    view_start: f64,
    view_end: f64,
    count: usize,
    grid_height: f64,
) -> Vec<RenderCommand> {
    let width = viewport.width - column_x;
    if width <= 0.0 || view_end <= view_start {
        return Vec::new();
    }
    let header_height = viewport.height;
    let ticks = tick_positions(view_start, view_end, count);
    let mut commands = Vec::with_capacity(ticks.len() * 2 + 1);

    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(column_x, 0.0, width, header_height),
        color: ThemeToken::HeaderBackground,
        border_color: Some(ThemeToken::Border),
        label: None,
        span_index: None,
    });

    let last = ticks.len().saturating_sub(1);
    for (i, tick) in ticks.iter().enumerate() {
        let x = column_x + tick.fraction * width;
        commands.push(RenderCommand::DrawLine {
            from: Point::new(x, 0.0),
            to: Point::new(x, header_height + grid_height),
            color: ThemeToken::TickLine,
            width: 1.0,
        });
        // The last label hangs left of its tick so it stays on screen.
        let (label_x, align) = if i == last && last > 0 {
            (x - LABEL_PAD, TextAlign::Right)
        } else {
            (x + LABEL_PAD, TextAlign::Left)
        };
        commands.push(RenderCommand::DrawText {
            position: Point::new(label_x, 0.0),
            text: format_duration(tick.time),
            color: ThemeToken::TickText,
            font_size: FONT_SIZE,
            align,
        });
    }
    commands
}

/// Format a duration in microseconds as a short label.
pub fn format_duration(us: f64) -> String {
    let abs = us.abs();
    if abs >= 60_000_000.0 {
        let mins = (us / 60_000_000.0).floor();
        let secs = (us - mins * 60_000_000.0) / 1_000_000.0;
        format!("{mins:.0}m{secs:.1}s")
    } else if abs >= 1_000_000.0 {
        format!("{:.2}s", us / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{:.2}ms", us / 1_000.0)
    } else if abs == 0.0 {
        "0µs".to_string()
    } else {
        format!("{us:.0}µs")
    }
}
