//! Core of the trace waterfall viewer: the span tree projected into rows, a
//! virtualized list over those rows, and the controllers that scroll, zoom
//! and resize it. Nothing here draws; views emit [`RenderCommand`] lists for
//! a host renderer.
//!
//! [`RenderCommand`]: waterfall_protocol::RenderCommand

pub mod config;
pub mod drag;
pub mod model;
pub mod range;
pub mod rows;
pub mod scroll;
pub mod shortcuts;
pub mod timeline;
pub mod views;
pub mod virtual_list;

pub use config::{ConfigError, RowHeights, TimelineConfig};
pub use model::{TraceError, TraceModel, ViewRange};
pub use rows::{Row, RowError, RowProjection, TimelineRows};
pub use timeline::TimelineState;
pub use virtual_list::{ListError, VirtualList};
