//! Captured cluster snapshot: everything the info client would have fetched,
//! stored as one JSON document.
//!
//! ```json
//! {
//!   "stats": { "service_stats": {"<node>": {...}}, "namespace_stats": ... },
//!   "metadata": { "server_build": {"<node>": "6.2.0.3"}, ... },
//!   "histograms": { "objsz": {"<node>": {"<namespace>": "<raw text>"}} },
//!   "agent_response": { "license_usage": {...} }
//! }
//! ```

use anyhow::{Context, Result};
use asadm_engine::gates::is_new_histogram_version;
use asadm_engine::histogram::NodeHistograms;
use asadm_engine::{ClusterMetadata, ClusterStats, RawHistogram, parse_raw_histogram};
use asadm_types::{Fetched, Keyed, ValueCell};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub stats: ClusterStats,
    #[serde(default)]
    pub metadata: ClusterMetadata,
    /// `histogram -> node -> namespace -> raw text`
    #[serde(default)]
    pub histograms: BTreeMap<String, Keyed<Keyed<String>>>,
    #[serde(default)]
    pub agent_response: Option<Value>,
}

impl Snapshot {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?;
        let snapshot: Snapshot = serde_json::from_str(&content)
            .with_context(|| format!("invalid snapshot {}", path.display()))?;

        debug!(
            nodes = snapshot.stats.service_stats.len(),
            histograms = snapshot.histograms.len(),
            "loaded snapshot"
        );
        Ok(snapshot)
    }

    /// Parse one named histogram for every node. The wire format per node
    /// follows that node's build. Text that fails to parse becomes a failed
    /// entry for that node and namespace.
    pub fn histogram(&self, name: &str, logarithmic: bool) -> Option<NodeHistograms> {
        let raw = self.histograms.get(name)?;

        let parsed: NodeHistograms = raw
            .iter()
            .map(|(node, namespaces)| {
                let new_version =
                    is_new_histogram_version(self.metadata.server_build.get(node).map(String::as_str));

                let parsed = match namespaces {
                    Fetched::Failed(err) => Fetched::Failed(err.clone()),
                    Fetched::Data(namespaces) => Fetched::Data(
                        namespaces
                            .iter()
                            .filter_map(|(ns, text)| {
                                let hist = match text {
                                    Fetched::Failed(err) => Fetched::Failed(err.clone()),
                                    Fetched::Data(text) => {
                                        match parse_raw_histogram(name, text, logarithmic, new_version) {
                                            Ok(Some(hist)) => Fetched::Data(hist),
                                            Ok(None) => return None,
                                            Err(e) => {
                                                warn!(node = %node, namespace = %ns, "{}", e);
                                                Fetched::failed(e.to_string())
                                            }
                                        }
                                    }
                                };
                                Some((ns.clone(), hist))
                            })
                            .collect::<Keyed<RawHistogram>>(),
                    ),
                };
                (node.clone(), parsed)
            })
            .collect();

        Some(parsed)
    }
}

/// One sheet source from per-node fetch results: data becomes a value
/// cell, a failed fetch an error cell.
pub fn node_cells<T: Serialize>(data: &Keyed<T>) -> Result<BTreeMap<String, ValueCell<Value>>> {
    data.iter()
        .map(|(node, fetched)| {
            let cell = match fetched {
                Fetched::Data(d) => ValueCell::Value(serde_json::to_value(d)?),
                Fetched::Failed(err) => ValueCell::Error(err.error.clone()),
            };
            Ok::<_, anyhow::Error>((node.clone(), cell))
        })
        .collect()
}

/// A source whose every node value is plain data.
pub fn plain_cells<T: Serialize>(data: &BTreeMap<String, T>) -> Result<BTreeMap<String, ValueCell<Value>>> {
    data.iter()
        .map(|(node, d)| Ok::<_, anyhow::Error>((node.clone(), ValueCell::Value(serde_json::to_value(d)?))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(value: Value) -> Snapshot {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_empty_snapshot_defaults() {
        let snap = snapshot(json!({}));
        assert!(snap.stats.service_stats.is_empty());
        assert!(snap.histograms.is_empty());
        assert!(snap.agent_response.is_none());
    }

    #[test]
    fn test_histogram_parses_per_node_version() {
        let snap = snapshot(json!({
            "metadata": {"server_build": {"old": "4.1.0.1", "new": "6.2.0.3"}},
            "histograms": {"objsz": {
                "old": {"test": "3,1,2,0,1;"},
                "new": {"test": "units=bytes:hist-width=8:bucket-width=1:buckets=2,0,1"},
                "down": {"error": "timeout"},
            }},
        }));

        let hist = snap.histogram("objsz", false).unwrap();
        assert_eq!(hist.len(), 3);
        assert!(hist["down"].is_failed());

        for node in ["old", "new"] {
            let ns = hist[node].data().unwrap();
            match ns["test"].data() {
                Some(RawHistogram::Linear(linear)) => assert_eq!(linear.data, vec![2, 0, 1]),
                other => panic!("unexpected histogram for {}: {:?}", node, other),
            }
        }

        assert!(snap.histogram("ttl", false).is_none());
    }

    #[test]
    fn test_node_cells_keeps_failures() {
        let data: Keyed<Value> = BTreeMap::from([
            ("n1".to_string(), Fetched::Data(json!({"a": 1}))),
            ("n2".to_string(), Fetched::failed("timeout")),
        ]);

        let cells = node_cells(&data).unwrap();
        assert_eq!(cells["n1"], ValueCell::Value(json!({"a": 1})));
        assert_eq!(cells["n2"], ValueCell::Error("timeout".to_string()));
    }
}
