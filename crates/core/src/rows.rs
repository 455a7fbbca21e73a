//! Projection of the span tree into the flat list of rows the virtualized
//! list renders.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::debug;
use waterfall_protocol::{Span, SpanId};

use crate::config::RowHeights;
use crate::model::DetailState;
use crate::virtual_list::RowSource;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowError {
    #[error("row index {index} out of range ({len} rows)")]
    RowOutOfRange { index: usize, len: usize },
    #[error("span index {span_index} has no row: it is hidden by a collapsed ancestor")]
    SpanHidden { span_index: usize },
}

/// One renderable line: a span's summary bar, or its expanded detail panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub span_index: usize,
    pub span_id: SpanId,
    pub is_detail: bool,
}

impl Row {
    /// Stable key (`{span_id}--bar` / `{span_id}--detail`). Survives row list
    /// regeneration as long as span ids are stable.
    pub fn key(&self) -> String {
        format!(
            "{}--{}",
            self.span_id,
            if self.is_detail { "detail" } else { "bar" }
        )
    }
}

/// Project pre-order `spans` into rows, skipping descendants of collapsed
/// spans and inserting a detail row after each span with detail state.
///
/// Single linear pass: `collapse_depth` remembers the depth below which spans
/// are hidden until a span at a shallower depth closes the collapsed subtree.
pub fn project(
    spans: &[Span],
    collapsed_ids: &HashSet<SpanId>,
    detail_ids: &HashMap<SpanId, DetailState>,
) -> Vec<Row> {
    let mut rows = Vec::with_capacity(spans.len() + detail_ids.len());
    let mut collapse_depth: Option<u32> = None;

    for (span_index, span) in spans.iter().enumerate() {
        if let Some(hidden_from) = collapse_depth {
            if span.depth >= hidden_from {
                continue;
            }
            collapse_depth = None;
        }

        if collapsed_ids.contains(&span.span_id) {
            collapse_depth = Some(span.depth + 1);
        }
        rows.push(Row {
            span_index,
            span_id: span.span_id.clone(),
            is_detail: false,
        });
        if detail_ids.contains_key(&span.span_id) {
            rows.push(Row {
                span_index,
                span_id: span.span_id.clone(),
                is_detail: true,
            });
        }
    }
    rows
}

/// An immutable row list plus the index/key mappings the list and scroll
/// controllers query.
#[derive(Debug, Clone, Default)]
pub struct RowProjection {
    rows: Vec<Row>,
}

impl RowProjection {
    pub fn new(
        spans: &[Span],
        collapsed_ids: &HashSet<SpanId>,
        detail_ids: &HashMap<SpanId, DetailState>,
    ) -> Self {
        let rows = project(spans, collapsed_ids, detail_ids);
        debug!(
            spans = spans.len(),
            rows = rows.len(),
            collapsed = collapsed_ids.len(),
            details = detail_ids.len(),
            "projected rows"
        );
        Self { rows }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_index_to_span_index(&self, row_index: usize) -> Result<usize, RowError> {
        self.rows
            .get(row_index)
            .map(|row| row.span_index)
            .ok_or(RowError::RowOutOfRange {
                index: row_index,
                len: self.rows.len(),
            })
    }

    /// Row of the span's bar.
    ///
    /// Callers only ask for spans they know are visible; a hidden span is a
    /// contract violation and always an error.
    pub fn span_index_to_row_index(&self, span_index: usize) -> Result<usize, RowError> {
        self.rows
            .iter()
            .position(|row| row.span_index == span_index)
            .ok_or(RowError::SpanHidden { span_index })
    }

    pub fn key_from_index(&self, row_index: usize) -> Result<String, RowError> {
        self.rows
            .get(row_index)
            .map(Row::key)
            .ok_or(RowError::RowOutOfRange {
                index: row_index,
                len: self.rows.len(),
            })
    }

    /// Inverse of [`key_from_index`](Self::key_from_index). `None` when no row
    /// with that key exists in this projection.
    pub fn index_from_key(&self, key: &str) -> Option<usize> {
        let (span_id, kind) = key.rsplit_once("--")?;
        let is_detail = match kind {
            "detail" => true,
            "bar" => false,
            _ => return None,
        };
        self.rows
            .iter()
            .position(|row| row.is_detail == is_detail && row.span_id == span_id)
    }

    /// Static height lookup: bar rows are fixed, detail rows are taller when
    /// the span has logs to show.
    pub fn row_height(&self, row_index: usize, spans: &[Span], heights: &RowHeights) -> f64 {
        let Some(row) = self.rows.get(row_index) else {
            return heights.bar;
        };
        if !row.is_detail {
            return heights.bar;
        }
        match spans.get(row.span_index) {
            Some(span) if !span.logs.is_empty() => heights.detail_with_logs,
            _ => heights.detail,
        }
    }
}

/// A projection paired with the spans and heights it needs to act as the
/// virtual list's [`RowSource`].
#[derive(Debug, Clone, Copy)]
pub struct TimelineRows<'a> {
    pub projection: &'a RowProjection,
    pub spans: &'a [Span],
    pub heights: &'a RowHeights,
}

impl<'a> TimelineRows<'a> {
    pub fn new(projection: &'a RowProjection, spans: &'a [Span], heights: &'a RowHeights) -> Self {
        Self {
            projection,
            spans,
            heights,
        }
    }
}

impl RowSource for TimelineRows<'_> {
    fn row_count(&self) -> usize {
        self.projection.len()
    }

    fn row_height(&self, index: usize) -> f64 {
        self.projection.row_height(index, self.spans, self.heights)
    }

    fn row_key(&self, index: usize) -> String {
        self.projection
            .row(index)
            .map(Row::key)
            .unwrap_or_default()
    }
}
