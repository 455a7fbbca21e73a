use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Identifier of a span within a trace.
///
/// Ids are cloned into every projected row, collapsed-id set and detail map
/// snapshot, so they share one allocation. Derefs to `str`; sets and maps
/// keyed by `SpanId` can be probed with a `&str`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpanId(Arc<str>);

impl SpanId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for SpanId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

// `Arc<str>` hashes like `str`, which keeps this consistent with `Hash`.
impl Borrow<str> for SpanId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for SpanId {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl From<&str> for SpanId {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl From<String> for SpanId {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    #[test]
    fn collapsed_set_is_probed_by_str() {
        let collapsed: HashSet<SpanId> = ["cart", "charge"].into_iter().map(SpanId::from).collect();
        assert!(collapsed.contains("cart"));
        assert!(!collapsed.contains("car"));
    }

    #[test]
    fn derefs_where_a_str_is_expected() {
        let index: HashMap<SpanId, usize> = HashMap::from([(SpanId::from("mysql"), 5)]);
        let id = SpanId::from("mysql");
        let lookup = |key: &str| index.get(key).copied();
        assert_eq!(lookup(&id), Some(5));
        assert!(id.starts_with("my"));
    }

    #[test]
    fn reads_a_span_id_field_from_json() {
        let ids: Vec<SpanId> = serde_json::from_str(r#"["a1", "b2"]"#).unwrap_or_default();
        assert_eq!(ids, vec![SpanId::from("a1"), SpanId::from("b2")]);
        assert_eq!(ids[1].to_string(), "b2");
    }
}
