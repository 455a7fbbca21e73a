use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;
use waterfall_protocol::{Span, SpanId, Trace};

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("span {index} has depth {depth}, expected at most {max_depth} (spans must be pre-order)")]
    NotPreOrder {
        index: usize,
        depth: u32,
        max_depth: u32,
    },
    #[error("span {child} references parent {parent} which appears after it")]
    ParentAfterChild { child: SpanId, parent: SpanId },
    #[error("span {child} references {parent}, which is not one of its ancestors")]
    ReferenceNotAncestor { child: SpanId, parent: SpanId },
    #[error("span {child} at depth {depth} does not hang off the span one level above it")]
    ParentDepthMismatch { child: SpanId, depth: u32 },
    #[error("duplicate span id {0}")]
    DuplicateSpanId(SpanId),
}

/// A trace whose span list has been checked to be a pre-order walk.
///
/// Everything downstream (row projection, visible-span navigation) relies on
/// the pre-order layout, so it is checked once here instead of on every use.
#[derive(Debug, Clone)]
pub struct TraceModel {
    trace: Trace,
    index_by_id: HashMap<SpanId, usize>,
}

impl TraceModel {
    pub fn new(trace: Trace) -> Result<Self, TraceError> {
        let mut index_by_id = HashMap::with_capacity(trace.spans.len());
        for (i, span) in trace.spans.iter().enumerate() {
            if index_by_id.insert(span.span_id.clone(), i).is_some() {
                return Err(TraceError::DuplicateSpanId(span.span_id.clone()));
            }
        }

        let mut prev_depth: Option<u32> = None;
        // ancestors[d] is the index of the enclosing span at depth d.
        let mut ancestors: Vec<usize> = Vec::new();
        for (i, span) in trace.spans.iter().enumerate() {
            let max_depth = prev_depth.map_or(0, |d| d + 1);
            if span.depth > max_depth {
                return Err(TraceError::NotPreOrder {
                    index: i,
                    depth: span.depth,
                    max_depth,
                });
            }
            prev_depth = Some(span.depth);
            ancestors.truncate(span.depth as usize);

            // References to spans outside this trace are allowed.
            for parent in span.parent_ids() {
                let Some(&p) = index_by_id.get(parent) else {
                    continue;
                };
                if p >= i {
                    return Err(TraceError::ParentAfterChild {
                        child: span.span_id.clone(),
                        parent: parent.clone(),
                    });
                }
                if !ancestors.contains(&p) {
                    return Err(TraceError::ReferenceNotAncestor {
                        child: span.span_id.clone(),
                        parent: parent.clone(),
                    });
                }
            }

            // Hidden-span lookups walk the last reference, so it must be the
            // direct parent the depth implies.
            if span.depth > 0 {
                let walked = span
                    .references
                    .last()
                    .and_then(|r| index_by_id.get(&r.span_id));
                if walked != ancestors.last() {
                    return Err(TraceError::ParentDepthMismatch {
                        child: span.span_id.clone(),
                        depth: span.depth,
                    });
                }
            }
            ancestors.push(i);
        }

        debug!(
            trace_id = %trace.trace_id,
            spans = trace.spans.len(),
            "trace accepted"
        );
        Ok(Self { trace, index_by_id })
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn spans(&self) -> &[Span] {
        &self.trace.spans
    }

    pub fn span(&self, index: usize) -> Option<&Span> {
        self.trace.spans.get(index)
    }

    pub fn index_of(&self, span_id: &str) -> Option<usize> {
        self.index_by_id.get(span_id).copied()
    }

    pub fn span_by_id(&self, span_id: &str) -> Option<&Span> {
        self.index_of(span_id).and_then(|i| self.span(i))
    }

    pub fn len(&self) -> usize {
        self.trace.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trace.spans.is_empty()
    }

    pub fn start_time(&self) -> f64 {
        self.trace.start_time
    }

    pub fn end_time(&self) -> f64 {
        self.trace.end_time
    }

    pub fn duration(&self) -> f64 {
        self.trace.duration()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn accepts_pre_order_trace() {
        let trace = trace_from_depths(&[("a", 0), ("b", 1), ("c", 2), ("d", 1)]);
        let model = TraceModel::new(trace).expect("pre-order trace");
        assert_eq!(model.len(), 4);
        assert_eq!(model.index_of("c"), Some(2));
        assert!(model.spans()[0].has_children);
        assert!(!model.spans()[3].has_children);
    }

    #[test]
    fn rejects_depth_jump() {
        let mut trace = trace_from_depths(&[("a", 0), ("b", 1)]);
        trace.spans[1].depth = 2;
        assert!(matches!(
            TraceModel::new(trace),
            Err(TraceError::NotPreOrder { index: 1, depth: 2, max_depth: 1 })
        ));
    }

    #[test]
    fn rejects_parent_after_child() {
        let mut trace = trace_from_depths(&[("a", 0), ("b", 0)]);
        trace.spans[0].references = vec![waterfall_protocol::SpanReference {
            ref_type: waterfall_protocol::RefType::ChildOf,
            span_id: "b".into(),
            trace_id: "t".into(),
        }];
        assert!(matches!(
            TraceModel::new(trace),
            Err(TraceError::ParentAfterChild { .. })
        ));
    }

    #[test]
    fn rejects_span_deeper_than_its_parent() {
        // c claims depth 2 but hangs off the root.
        let mut trace = trace_from_depths(&[("a", 0), ("b", 1), ("c", 2), ("d", 1)]);
        trace.spans[2].references[0].span_id = "a".into();
        assert!(matches!(
            TraceModel::new(trace),
            Err(TraceError::ParentDepthMismatch { child, depth: 2 }) if child == "c"
        ));
    }

    #[test]
    fn rejects_reference_to_a_finished_subtree() {
        let mut trace = trace_from_depths(&[("a", 0), ("b", 1), ("c", 1)]);
        trace.spans[2].references.insert(
            0,
            waterfall_protocol::SpanReference {
                ref_type: waterfall_protocol::RefType::FollowsFrom,
                span_id: "b".into(),
                trace_id: "t".into(),
            },
        );
        assert!(matches!(
            TraceModel::new(trace),
            Err(TraceError::ReferenceNotAncestor { child, parent }) if child == "c" && parent == "b"
        ));
    }

    #[test]
    fn accepts_root_without_references_and_follows_from_ancestor() {
        let mut trace = trace_from_depths(&[("a", 0), ("b", 1), ("c", 2)]);
        trace.spans[2].references.insert(
            0,
            waterfall_protocol::SpanReference {
                ref_type: waterfall_protocol::RefType::FollowsFrom,
                span_id: "a".into(),
                trace_id: "t".into(),
            },
        );
        assert!(TraceModel::new(trace).is_ok());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let trace = trace_from_depths(&[("a", 0), ("a", 1)]);
        assert!(matches!(
            TraceModel::new(trace),
            Err(TraceError::DuplicateSpanId(id)) if id == "a"
        ));
    }
}
