pub mod detail_state;
pub mod trace;
pub mod view_range;

pub use detail_state::{DetailSection, DetailState, LogsState};
pub use trace::{TraceError, TraceModel};
pub use view_range::{
    Reframe, ViewRange, ViewRangeUpdate, ViewedBounds, map_from_view_sub_range,
    map_to_view_sub_range, widen_within_unit,
};
