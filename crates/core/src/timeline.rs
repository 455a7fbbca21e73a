//! View state of the timeline: which subtrees are collapsed, which spans have
//! their detail row open, and how wide the span-name column is.
//!
//! Every operation takes `&self` and returns the next state, leaving the
//! snapshot the renderer holds untouched.

use std::collections::{HashMap, HashSet};

use tracing::debug;
use waterfall_protocol::{Span, SpanId};

use crate::config::TimelineConfig;
use crate::model::{DetailSection, DetailState};
use crate::rows::RowProjection;

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineState {
    collapsed: HashSet<SpanId>,
    details: HashMap<SpanId, DetailState>,
    name_column_width: f64,
    name_column_min: f64,
    name_column_max: f64,
}

impl Default for TimelineState {
    fn default() -> Self {
        Self::new(&TimelineConfig::default())
    }
}

/// Whether every span with children is already collapsed.
pub fn should_disable_collapse(spans: &[Span], collapsed: &HashSet<SpanId>) -> bool {
    spans.iter().filter(|s| s.has_children).count() == collapsed.len()
}

impl TimelineState {
    pub fn new(config: &TimelineConfig) -> Self {
        Self {
            collapsed: HashSet::new(),
            details: HashMap::new(),
            name_column_width: config.name_column_width,
            name_column_min: config.name_column_min,
            name_column_max: config.name_column_max,
        }
    }

    pub fn collapsed(&self) -> &HashSet<SpanId> {
        &self.collapsed
    }

    pub fn details(&self) -> &HashMap<SpanId, DetailState> {
        &self.details
    }

    pub fn detail(&self, span_id: &str) -> Option<&DetailState> {
        self.details.get(span_id)
    }

    pub fn name_column_width(&self) -> f64 {
        self.name_column_width
    }

    pub fn is_collapsed(&self, span_id: &str) -> bool {
        self.collapsed.contains(span_id)
    }

    /// Rows for the current collapse and detail state.
    pub fn project(&self, spans: &[Span]) -> RowProjection {
        RowProjection::new(spans, &self.collapsed, &self.details)
    }

    fn with_collapsed(&self, collapsed: HashSet<SpanId>) -> Self {
        Self {
            collapsed,
            ..self.clone()
        }
    }

    fn with_details(&self, details: HashMap<SpanId, DetailState>) -> Self {
        Self {
            details,
            ..self.clone()
        }
    }

    pub fn children_toggle(&self, span_id: &SpanId) -> Self {
        let mut collapsed = self.collapsed.clone();
        if !collapsed.remove(span_id) {
            collapsed.insert(span_id.clone());
        }
        self.with_collapsed(collapsed)
    }

    pub fn expand_all(&self) -> Self {
        self.with_collapsed(HashSet::new())
    }

    pub fn collapse_all(&self, spans: &[Span]) -> Self {
        let collapsed = spans
            .iter()
            .filter(|s| s.has_children)
            .map(|s| s.span_id.clone())
            .collect();
        self.with_collapsed(collapsed)
    }

    /// Collapse one more level: in each branch, the deepest span with
    /// children that is not yet collapsed.
    pub fn collapse_one(&self, spans: &[Span]) -> Self {
        if should_disable_collapse(spans, &self.collapsed) {
            debug!("collapse one: every parent already collapsed");
            return self.clone();
        }
        let mut collapsed = self.collapsed.clone();
        let mut nearest: Option<&Span> = None;
        for span in spans {
            match nearest {
                Some(ancestor) if span.depth <= ancestor.depth => {
                    collapsed.insert(ancestor.span_id.clone());
                    if span.has_children {
                        nearest = Some(span);
                    }
                }
                _ if span.has_children && !collapsed.contains(&span.span_id) => {
                    nearest = Some(span);
                }
                _ => {}
            }
        }
        if let Some(ancestor) = nearest {
            collapsed.insert(ancestor.span_id.clone());
        }
        self.with_collapsed(collapsed)
    }

    /// Expand one level: in each branch, the shallowest collapsed span.
    pub fn expand_one(&self, spans: &[Span]) -> Self {
        if self.collapsed.is_empty() {
            return self.clone();
        }
        let mut collapsed = self.collapsed.clone();
        let mut expanded_depth: Option<u32> = None;
        let mut expand_next = true;
        for span in spans {
            if expanded_depth.is_some_and(|depth| span.depth <= depth) {
                expand_next = true;
            }
            if expand_next && collapsed.remove(&span.span_id) {
                expand_next = false;
                expanded_depth = Some(span.depth);
            }
        }
        self.with_collapsed(collapsed)
    }

    pub fn detail_toggle(&self, span_id: &SpanId) -> Self {
        let mut details = self.details.clone();
        if details.remove(span_id).is_none() {
            details.insert(span_id.clone(), DetailState::default());
        }
        self.with_details(details)
    }

    /// Replace the detail state of an open detail row; a closed one is left
    /// closed.
    fn update_detail(&self, span_id: &SpanId, update: impl FnOnce(&DetailState) -> DetailState) -> Self {
        let Some(old) = self.details.get(span_id) else {
            return self.clone();
        };
        let mut details = self.details.clone();
        details.insert(span_id.clone(), update(old));
        self.with_details(details)
    }

    pub fn detail_tags_toggle(&self, span_id: &SpanId) -> Self {
        self.update_detail(span_id, DetailState::toggle_tags)
    }

    pub fn detail_process_toggle(&self, span_id: &SpanId) -> Self {
        self.update_detail(span_id, DetailState::toggle_process)
    }

    pub fn detail_logs_toggle(&self, span_id: &SpanId) -> Self {
        self.update_detail(span_id, DetailState::toggle_logs)
    }

    pub fn detail_log_item_toggle(&self, span_id: &SpanId, log_index: usize) -> Self {
        self.update_detail(span_id, |d| d.toggle_log_item(log_index))
    }

    pub fn detail_warnings_toggle(&self, span_id: &SpanId) -> Self {
        self.update_detail(span_id, DetailState::toggle_warnings)
    }

    pub fn detail_references_toggle(&self, span_id: &SpanId) -> Self {
        self.update_detail(span_id, DetailState::toggle_references)
    }

    /// Toggle whichever section a click on the detail panel landed on.
    pub fn detail_section_toggle(&self, span_id: &SpanId, section: DetailSection) -> Self {
        self.update_detail(span_id, |d| d.toggle_section(section))
    }

    pub fn set_name_column_width(&self, width: f64) -> Self {
        Self {
            name_column_width: width.clamp(self.name_column_min, self.name_column_max),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::trace::fixtures::trace_from_depths;

    fn ids(ids: &[&str]) -> HashSet<SpanId> {
        ids.iter().map(|&id| SpanId::from(id)).collect()
    }

    fn spans() -> Vec<Span> {
        trace_from_depths(&[("a", 0), ("b", 1), ("c", 2), ("d", 3), ("e", 1), ("f", 2)]).spans
    }

    #[test]
    fn children_toggle_round_trips() {
        let state = TimelineState::default();
        let b = SpanId::from("b");
        let collapsed = state.children_toggle(&b);
        assert!(collapsed.is_collapsed("b"));
        assert!(!state.is_collapsed("b"));
        assert_eq!(collapsed.children_toggle(&b), state);
    }

    #[test]
    fn collapse_all_takes_every_parent() {
        let spans = spans();
        let state = TimelineState::default().collapse_all(&spans);
        assert_eq!(state.collapsed(), &ids(&["a", "b", "c", "e"]));
        assert!(should_disable_collapse(&spans, state.collapsed()));
        assert_eq!(state.collapse_one(&spans), state);
        assert!(state.expand_all().collapsed().is_empty());
    }

    #[test]
    fn collapse_one_works_up_from_the_leaves() {
        let spans = spans();
        let once = TimelineState::default().collapse_one(&spans);
        assert_eq!(once.collapsed(), &ids(&["c", "e"]));
        let twice = once.collapse_one(&spans);
        assert_eq!(twice.collapsed(), &ids(&["b", "c", "e"]));
    }

    #[test]
    fn expand_one_works_down_from_the_root() {
        let spans = spans();
        let all = TimelineState::default().collapse_all(&spans);
        let once = all.expand_one(&spans);
        assert_eq!(once.collapsed(), &ids(&["b", "c", "e"]));
        let twice = once.expand_one(&spans);
        assert_eq!(twice.collapsed(), &ids(&["c"]));
        let empty = TimelineState::default();
        assert_eq!(empty.expand_one(&spans), empty);
    }

    #[test]
    fn detail_toggles_only_touch_open_details() {
        let b = SpanId::from("b");
        let state = TimelineState::default().detail_tags_toggle(&b);
        assert!(state.detail("b").is_none());

        let open = state.detail_toggle(&b).detail_tags_toggle(&b).detail_log_item_toggle(&b, 3);
        let detail = open.detail("b").expect("open");
        assert!(detail.is_tags_open);
        assert!(detail.logs.opened_items.contains(&3));

        let toggled = open.detail_warnings_toggle(&b).detail_references_toggle(&b);
        assert!(toggled.detail("b").is_some_and(|d| d.is_warnings_open && d.is_references_open));
        assert!(!open.detail("b").is_some_and(|d| d.is_warnings_open));
        assert!(open.detail_toggle(&b).detail("b").is_none());

        let via_section = open.detail_section_toggle(&b, DetailSection::Tags);
        assert!(via_section.detail("b").is_some_and(|d| !d.is_tags_open));
    }

    #[test]
    fn projection_follows_state() {
        let spans = spans();
        let c = SpanId::from("c");
        let state = TimelineState::default().children_toggle(&c).detail_toggle(&c);
        let rows = state.project(&spans);
        let keys: Vec<String> = rows.rows().iter().map(|r| r.key()).collect();
        assert_eq!(
            keys,
            vec!["a--bar", "b--bar", "c--bar", "c--detail", "e--bar", "f--bar"]
        );
    }

    #[test]
    fn name_column_width_is_clamped() {
        let state = TimelineState::default();
        assert_eq!(state.name_column_width(), 0.25);
        assert_eq!(state.set_name_column_width(0.95).name_column_width(), 0.85);
        assert_eq!(state.set_name_column_width(0.01).name_column_width(), 0.15);
        assert_eq!(state.set_name_column_width(0.4).name_column_width(), 0.4);
    }
}
