pub mod commands;
pub mod input;
pub mod span_id;
pub mod theme;
pub mod trace;
pub mod types;

pub use commands::{RenderCommand, TextAlign};
pub use input::{KeyChord, KeyCode, MouseButton, MouseEvent, MouseEventKind};
pub use span_id::SpanId;
pub use theme::ThemeToken;
pub use trace::{KeyValue, Log, RefType, Span, SpanReference, Trace};
pub use types::{Point, Rect, Viewport};
