use serde::{Deserialize, Serialize};

use crate::span_id::SpanId;

/// A pre-processed trace as handed to the timeline viewer.
///
/// The span list is flat and sorted in pre-order: every span's descendants
/// are contiguous and immediately follow it, siblings by ascending start
/// time. Times are microseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trace {
    #[serde(rename = "traceID")]
    pub trace_id: String,
    pub spans: Vec<Span>,
    pub start_time: f64,
    pub end_time: f64,
}

impl Trace {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// One timed operation within a trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    #[serde(rename = "spanID")]
    pub span_id: SpanId,
    #[serde(default)]
    pub operation_name: String,
    #[serde(default)]
    pub service_name: String,
    /// Distance from the synthetic root (0 = root span).
    pub depth: u32,
    /// Absolute start time (µs).
    pub start_time: f64,
    /// Duration (µs).
    pub duration: f64,
    #[serde(default)]
    pub has_children: bool,
    #[serde(default)]
    pub references: Vec<SpanReference>,
    #[serde(default)]
    pub logs: Vec<Log>,
    #[serde(default)]
    pub tags: Vec<KeyValue>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl Span {
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Ids of the spans this span hangs off (`ChildOf` or `FollowsFrom`).
    pub fn parent_ids(&self) -> impl Iterator<Item = &SpanId> {
        self.references.iter().map(|r| &r.span_id)
    }

    /// Whether the span carries an `error` tag set to true.
    pub fn is_error(&self) -> bool {
        self.tags.iter().any(|kv| {
            kv.key == "error"
                && match &kv.value {
                    serde_json::Value::Bool(b) => *b,
                    serde_json::Value::String(s) => s == "true",
                    _ => false,
                }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefType {
    ChildOf,
    FollowsFrom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanReference {
    pub ref_type: RefType,
    #[serde(rename = "spanID")]
    pub span_id: SpanId,
    #[serde(rename = "traceID", default)]
    pub trace_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Log {
    pub timestamp: f64,
    #[serde(default)]
    pub fields: Vec<KeyValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_span() {
        let json = r#"{
            "spanID": "b",
            "operationName": "GET /api",
            "depth": 1,
            "startTime": 10.0,
            "duration": 5.0,
            "hasChildren": false,
            "references": [{ "refType": "CHILD_OF", "spanID": "a" }]
        }"#;
        let span: Span = match serde_json::from_str(json) {
            Ok(span) => span,
            Err(e) => unreachable!("span should parse: {e}"),
        };
        assert_eq!(span.span_id, "b");
        assert_eq!(span.depth, 1);
        assert!((span.end_time() - 15.0).abs() < f64::EPSILON);
        assert_eq!(span.references[0].ref_type, RefType::ChildOf);
        assert!(span.logs.is_empty());
        assert_eq!(span.parent_ids().count(), 1);
        assert!(!span.is_error());
    }
}
