use std::io::{Stdout, stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
};
use tracing::debug;
use waterfall_protocol::{KeyChord, MouseEvent, RenderCommand, TextAlign, ThemeToken};

use crate::app::App;

const FRAME_INTERVAL: Duration = Duration::from_millis(16);
const IDLE_POLL: Duration = Duration::from_millis(100);

const SPAN_PALETTE: [Color; 8] = [
    Color::Rgb(23, 190, 207),
    Color::Rgb(255, 127, 14),
    Color::Rgb(44, 160, 44),
    Color::Rgb(148, 103, 189),
    Color::Rgb(227, 119, 194),
    Color::Rgb(188, 189, 34),
    Color::Rgb(31, 119, 180),
    Color::Rgb(140, 86, 75),
];

fn theme_to_color(token: &ThemeToken) -> Color {
    match token {
        ThemeToken::SpanBar(slot) => SPAN_PALETTE[usize::from(*slot) % SPAN_PALETTE.len()],
        ThemeToken::SpanBarError => Color::Red,
        ThemeToken::RowBackground => Color::Black,
        ThemeToken::RowBackgroundAlt => Color::Rgb(20, 20, 20),
        ThemeToken::RowHover => Color::Rgb(40, 40, 40),
        ThemeToken::DetailBackground => Color::Rgb(28, 28, 36),
        ThemeToken::DetailText => Color::Gray,
        ThemeToken::TextPrimary => Color::White,
        ThemeToken::TextSecondary => Color::LightCyan,
        ThemeToken::TextMuted => Color::DarkGray,
        ThemeToken::SearchMatch => Color::Rgb(70, 60, 10),
        ThemeToken::Background => Color::Black,
        ThemeToken::Border => Color::DarkGray,
        ThemeToken::HeaderBackground => Color::Rgb(30, 30, 30),
        ThemeToken::TickLine => Color::DarkGray,
        ThemeToken::TickText => Color::Gray,
        ThemeToken::ResizerGrip => Color::Gray,
        ThemeToken::ResizerDragRegion => Color::Rgb(30, 60, 90),
        ThemeToken::MinimapBackground => Color::Black,
        ThemeToken::MinimapInactive => Color::Rgb(35, 35, 35),
        ThemeToken::MinimapHandle => Color::LightBlue,
        ThemeToken::CursorGuide => Color::Yellow,
        ThemeToken::ReframeRegion => Color::Rgb(40, 80, 120),
        ThemeToken::ShiftRegion => Color::Rgb(110, 80, 20),
    }
}

/// Where a command list lands: `area` in cells, and the logical units per
/// terminal row. Columns are always one unit wide.
#[derive(Debug, Clone, Copy)]
struct Target {
    area: Rect,
    y_unit: f64,
}

impl Target {
    fn new(area: Rect, y_unit: f64) -> Self {
        Self { area, y_unit }
    }

    /// Cells covered by a logical rect, clipped to the area.
    fn cells(&self, rect: &waterfall_protocol::Rect) -> Rect {
        let left = i64::from(self.area.x) + rect.x.floor() as i64;
        let top = i64::from(self.area.y) + (rect.y / self.y_unit).floor() as i64;
        let right = i64::from(self.area.x) + rect.right().ceil() as i64;
        let bottom = i64::from(self.area.y) + (rect.bottom() / self.y_unit).ceil() as i64;
        let clamp_x = |v: i64| v.clamp(i64::from(self.area.left()), i64::from(self.area.right())) as u16;
        let clamp_y = |v: i64| v.clamp(i64::from(self.area.top()), i64::from(self.area.bottom())) as u16;
        let (x0, x1) = (clamp_x(left), clamp_x(right.max(left + 1)));
        let (y0, y1) = (clamp_y(top), clamp_y(bottom.max(top + 1)));
        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }

    fn cell(&self, x: f64, y: f64) -> Option<(u16, u16)> {
        let col = i64::from(self.area.x) + x.floor() as i64;
        let row = i64::from(self.area.y) + (y / self.y_unit).floor() as i64;
        let inside = col >= i64::from(self.area.left())
            && col < i64::from(self.area.right())
            && row >= i64::from(self.area.top())
            && row < i64::from(self.area.bottom());
        inside.then_some((col as u16, row as u16))
    }
}

fn put_str(buf: &mut Buffer, clip: Rect, x: u16, y: u16, text: &str, fg: Color) {
    if y < clip.top() || y >= clip.bottom() {
        return;
    }
    for (i, ch) in text.chars().enumerate() {
        let Some(col) = x.checked_add(i as u16) else {
            break;
        };
        if col >= clip.right() {
            break;
        }
        if col < clip.left() {
            continue;
        }
        if let Some(cell) = buf.cell_mut((col, y)) {
            cell.set_char(ch).set_fg(fg);
        }
    }
}

/// Paint a command list. Rects fill cell backgrounds, text and lines set
/// glyphs on top of whatever background is there.
fn paint(buf: &mut Buffer, target: Target, commands: &[RenderCommand]) {
    let mut clip = target.area;
    for cmd in commands {
        match cmd {
            RenderCommand::DrawRect {
                rect, color, label, ..
            } => {
                let cells = target.cells(rect).intersection(clip);
                if cells.is_empty() {
                    continue;
                }
                let bg = theme_to_color(color);
                for y in cells.top()..cells.bottom() {
                    for x in cells.left()..cells.right() {
                        if let Some(cell) = buf.cell_mut((x, y)) {
                            cell.set_char(' ').set_bg(bg);
                        }
                    }
                }
                let label = label.as_deref().unwrap_or("");
                if !label.is_empty() && usize::from(cells.width) >= label.chars().count() + 2 {
                    put_str(buf, cells, cells.x + 1, cells.y, label, Color::Black);
                }
            }
            RenderCommand::DrawText {
                position,
                text,
                color,
                align,
                ..
            } => {
                let width = text.chars().count() as f64;
                let x = match align {
                    TextAlign::Left => position.x,
                    TextAlign::Center => position.x - width / 2.0,
                    TextAlign::Right => position.x - width,
                };
                let col = i64::from(target.area.x) + x.floor() as i64;
                let row = i64::from(target.area.y) + (position.y / target.y_unit).floor() as i64;
                let (Ok(col), Ok(row)) = (u16::try_from(col), u16::try_from(row)) else {
                    continue;
                };
                put_str(buf, clip, col, row, text, theme_to_color(color));
            }
            RenderCommand::DrawLine {
                from, to, color, ..
            } => {
                let fg = theme_to_color(color);
                let vertical = (from.x - to.x).abs() < f64::EPSILON;
                let (glyph, steps) = if vertical {
                    ('│', ((to.y - from.y).abs() / target.y_unit).ceil().max(1.0))
                } else {
                    ('─', (to.x - from.x).abs().ceil().max(1.0))
                };
                for i in 0..steps as usize {
                    let (x, y) = if vertical {
                        (from.x, from.y.min(to.y) + i as f64 * target.y_unit)
                    } else {
                        (from.x.min(to.x) + i as f64, from.y)
                    };
                    let Some((col, row)) = target.cell(x, y) else {
                        continue;
                    };
                    if clip.contains((col, row).into())
                        && let Some(cell) = buf.cell_mut((col, row))
                    {
                        cell.set_char(glyph).set_fg(fg);
                    }
                }
            }
            RenderCommand::SetClip { rect } => clip = target.cells(rect).intersection(target.area),
            RenderCommand::ClearClip => clip = target.area,
            RenderCommand::BeginGroup { .. } | RenderCommand::EndGroup => {}
        }
    }
}

fn to_chord(key: &KeyEvent) -> Option<KeyChord> {
    let code = match key.code {
        KeyCode::Char(c) => waterfall_protocol::KeyCode::Char(c),
        KeyCode::Left => waterfall_protocol::KeyCode::Left,
        KeyCode::Right => waterfall_protocol::KeyCode::Right,
        KeyCode::Up => waterfall_protocol::KeyCode::Up,
        KeyCode::Down => waterfall_protocol::KeyCode::Down,
        KeyCode::PageUp => waterfall_protocol::KeyCode::PageUp,
        KeyCode::PageDown => waterfall_protocol::KeyCode::PageDown,
        KeyCode::Esc => waterfall_protocol::KeyCode::Esc,
        _ => return None,
    };
    Some(KeyChord {
        code,
        shift: key.modifiers.contains(KeyModifiers::SHIFT),
        ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
    })
}

/// Returns false when the key asks to quit.
fn handle_key(app: &mut App, key: &KeyEvent) -> bool {
    if app.is_editing_search() {
        match key.code {
            KeyCode::Enter => app.commit_search(),
            KeyCode::Esc => app.cancel_search_input(),
            KeyCode::Backspace => app.pop_search_char(),
            KeyCode::Char(c) => app.push_search_char(c),
            _ => {}
        }
        return true;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('q') => return false,
        KeyCode::Char('c') if ctrl => return false,
        _ => {}
    }
    if let Some(chord) = to_chord(key)
        && app.handle_key(chord)
    {
        return true;
    }
    if key.code == KeyCode::Char('z') {
        app.reset_zoom();
    }
    true
}

fn handle_mouse(app: &mut App, mouse: &event::MouseEvent) {
    let x = f64::from(mouse.column);
    let y = f64::from(mouse.row);
    let event = match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => MouseEvent::down(x),
        MouseEventKind::Up(MouseButton::Left) => MouseEvent::up(x),
        MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => MouseEvent::moved(x),
        MouseEventKind::ScrollDown => {
            app.wheel(1.0);
            return;
        }
        MouseEventKind::ScrollUp => {
            app.wheel(-1.0);
            return;
        }
        _ => return,
    };
    app.handle_mouse(event.with_y(y));
}

fn draw(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    let size = terminal.size()?;
    app.resize(Rect::new(0, 0, size.width, size.height));
    let layout = app.layout();
    let bar = app.row_unit();
    let frame_cmds = app.frame();

    terminal.draw(|frame| {
        let title = Paragraph::new(frame_cmds.title.as_str())
            .style(Style::default().fg(Color::White).bg(Color::DarkGray));
        frame.render_widget(title, layout.title);

        let buf = frame.buffer_mut();
        paint(buf, Target::new(layout.minimap, 1.0), &frame_cmds.minimap);
        paint(buf, Target::new(layout.rows, bar), &frame_cmds.rows);
        paint(buf, Target::new(layout.header, 1.0), &frame_cmds.header);
        paint(buf, Target::new(layout.timeline_column(), 1.0), &frame_cmds.timeline_overlay);
        let below_minimap = Rect::new(
            layout.header.x,
            layout.header.y,
            layout.header.width,
            layout.header.height + layout.rows.height,
        );
        paint(buf, Target::new(below_minimap, 1.0), &frame_cmds.resizer);

        let status = Paragraph::new(frame_cmds.status.as_str())
            .style(Style::default().fg(Color::Gray).bg(Color::Rgb(25, 25, 25)));
        frame.render_widget(status, layout.status);
    })?;
    Ok(())
}

fn event_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.tick(Instant::now());
        draw(terminal, app)?;

        let timeout = if app.is_animating() {
            FRAME_INTERVAL
        } else {
            IDLE_POLL
        };
        if !event::poll(timeout)? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if !handle_key(app, &key) {
                    return Ok(());
                }
            }
            Event::Mouse(mouse) => handle_mouse(app, &mouse),
            Event::Resize(width, height) => app.resize(Rect::new(0, 0, width, height)),
            _ => {}
        }
    }
}

/// Take over the terminal until the user quits. The terminal is restored
/// even when the loop fails.
pub fn run(mut app: App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app);
    app.shutdown();
    debug!(ok = result.is_ok(), "event loop finished");

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    result
}
