pub mod minimap;
pub mod ticks;
pub mod waterfall;

pub use minimap::{render_minimap, render_overlay};
pub use ticks::{Tick, format_duration, render_ticks, tick_positions};
pub use waterfall::{ColumnLayout, DetailLine, WaterfallFrame, detail_lines, hits_toggle, render_waterfall};
