use crate::ValueCell;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Raw attribute map as reported by one node: `attribute -> raw value`.
///
/// Servers report nearly everything as strings; captured snapshots may carry
/// native numbers and booleans too. Readers go through [`crate::Attr`].
pub type Stats = BTreeMap<String, Value>;

/// The failure a node returned instead of data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceError {
    pub error: String,
}

impl SourceError {
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            error: cause.into(),
        }
    }
}

/// Either the data a node returned or the error it returned instead.
///
/// In JSON a failed fetch is written as `{"error": "<cause>"}`; any other
/// shape is data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Fetched<T> {
    Failed(SourceError),
    Data(T),
}

impl<T> Fetched<T> {
    pub fn failed(cause: impl Into<String>) -> Self {
        Fetched::Failed(SourceError::new(cause))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Fetched::Data(d) => Some(d),
            Fetched::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Fetched::Failed(_))
    }

    pub fn as_result(&self) -> crate::Result<&T> {
        match self {
            Fetched::Data(d) => Ok(d),
            Fetched::Failed(err) => Err(err.clone().into()),
        }
    }
}

impl<T> From<Fetched<T>> for ValueCell<T> {
    fn from(fetched: Fetched<T>) -> Self {
        match fetched {
            Fetched::Data(d) => ValueCell::Value(d),
            Fetched::Failed(err) => ValueCell::Error(err.error),
        }
    }
}

/// Per-key fetch results, e.g. `node -> stats` or `namespace -> stats`.
pub type Keyed<T> = BTreeMap<String, Fetched<T>>;

/// `node -> stats` (service statistics and configs).
pub type NodeStats = Keyed<Stats>;

/// `node -> namespace -> stats`. XDR datacenter stats share this shape.
pub type NodeNamespaceStats = Keyed<Keyed<Stats>>;

/// `node -> namespace -> set -> stats`.
pub type NodeSetStats = Keyed<Keyed<Keyed<Stats>>>;

/// Recursive merge where `other` wins on conflicting leaves.
pub trait DeepMerge {
    fn deep_merge(&mut self, other: &Self);
}

impl DeepMerge for Value {
    fn deep_merge(&mut self, other: &Self) {
        match (self, other) {
            (Value::Object(mine), Value::Object(theirs)) => {
                for (key, value) in theirs {
                    match mine.get_mut(key) {
                        Some(existing) => existing.deep_merge(value),
                        None => {
                            mine.insert(key.clone(), value.clone());
                        }
                    }
                }
            }
            (mine, theirs) => *mine = theirs.clone(),
        }
    }
}

impl DeepMerge for Stats {
    fn deep_merge(&mut self, other: &Self) {
        for (key, value) in other {
            match self.get_mut(key) {
                Some(existing) => existing.deep_merge(value),
                None => {
                    self.insert(key.clone(), value.clone());
                }
            }
        }
    }
}

impl<T: DeepMerge + Clone> DeepMerge for Fetched<T> {
    fn deep_merge(&mut self, other: &Self) {
        match (self, other) {
            (Fetched::Data(mine), Fetched::Data(theirs)) => mine.deep_merge(theirs),
            (mine, theirs) => *mine = theirs.clone(),
        }
    }
}

impl<T: DeepMerge + Clone> DeepMerge for Keyed<T> {
    fn deep_merge(&mut self, other: &Self) {
        for (key, value) in other {
            match self.get_mut(key) {
                Some(existing) => existing.deep_merge(value),
                None => {
                    self.insert(key.clone(), value.clone());
                }
            }
        }
    }
}

pub fn deep_merged<T: DeepMerge + Clone>(base: &T, overlay: &T) -> T {
    let mut merged = base.clone();
    merged.deep_merge(overlay);
    merged
}

/// Swap the two outer levels: `node -> namespace -> T` becomes
/// `namespace -> node -> T`. Nodes whose whole response failed are dropped;
/// per-namespace failures are kept in place.
pub fn flip_keys<T: Clone>(data: &Keyed<Keyed<T>>) -> BTreeMap<String, Keyed<T>> {
    let mut flipped: BTreeMap<String, Keyed<T>> = BTreeMap::new();

    for (outer, fetched) in data {
        let Some(inner) = fetched.data() else {
            continue;
        };

        for (key, value) in inner {
            flipped
                .entry(key.clone())
                .or_default()
                .insert(outer.clone(), value.clone());
        }
    }

    flipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stats(value: Value) -> Stats {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_failed_fetch_deserializes_from_error_object() {
        let parsed: NodeStats = serde_json::from_value(json!({
            "10.0.0.1": {"cluster_size": "3"},
            "10.0.0.2": {"error": "timeout"},
        }))
        .unwrap();

        assert!(parsed["10.0.0.1"].data().is_some());
        assert_eq!(parsed["10.0.0.2"], Fetched::failed("timeout"));
    }

    #[test]
    fn test_deep_merge_overlay_wins() {
        let mut base: NodeStats = BTreeMap::new();
        base.insert(
            "n1".to_string(),
            Fetched::Data(stats(json!({"a": "1", "nested": {"x": 1, "y": 2}}))),
        );
        let mut overlay: NodeStats = BTreeMap::new();
        overlay.insert(
            "n1".to_string(),
            Fetched::Data(stats(json!({"b": "2", "nested": {"y": 3}}))),
        );
        overlay.insert("n2".to_string(), Fetched::failed("down"));

        let merged = deep_merged(&base, &overlay);
        let n1 = merged["n1"].data().unwrap();

        assert_eq!(n1["a"], json!("1"));
        assert_eq!(n1["b"], json!("2"));
        assert_eq!(n1["nested"], json!({"x": 1, "y": 3}));
        assert!(merged["n2"].is_failed());
    }

    #[test]
    fn test_flip_keys_skips_failed_nodes() {
        let data: NodeNamespaceStats = serde_json::from_value(json!({
            "n1": {"test": {"objects": "1"}, "bar": {"objects": "2"}},
            "n2": {"test": {"objects": "3"}},
            "n3": {"error": "unreachable"},
        }))
        .unwrap();

        let flipped = flip_keys(&data);

        assert_eq!(flipped.len(), 2);
        assert_eq!(flipped["test"].len(), 2);
        assert_eq!(flipped["bar"].len(), 1);
        assert!(!flipped["test"].contains_key("n3"));
    }
}
