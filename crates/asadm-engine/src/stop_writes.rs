//! Stop-writes cause diagnosis.
//!
//! For every node, namespace and set, each known trigger metric that the
//! node reports is compared with its threshold. An entry is produced for
//! every evaluated metric, not only the ones that are currently tripping.

use crate::inputs::ClusterStats;
use asadm_types::{FromRaw, Keyed, Stats};
use serde::ser::Serializer;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Clock skew threshold for AP namespaces with NSUP enabled.
const AP_NSUP_CLOCK_SKEW_MS: i64 = 40_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Threshold {
    Int(i64),
    Float(f64),
}

impl Threshold {
    fn as_f64(self) -> f64 {
        match self {
            Threshold::Int(i) => i as f64,
            Threshold::Float(f) => f,
        }
    }

    fn is_zero(self) -> bool {
        self.as_f64() == 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopWritesEntry {
    pub metric: String,
    pub metric_usage: i64,
    pub stop_writes: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_threshold: Option<Threshold>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct StopWritesKey {
    pub namespace: Option<String>,
    pub set: Option<String>,
    pub metric: String,
}

/// Entries for one node, one per `(namespace, set, metric)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeStopWrites {
    pub entries: BTreeMap<StopWritesKey, StopWritesEntry>,
}

impl NodeStopWrites {
    pub fn get(&self, namespace: Option<&str>, set: Option<&str>, metric: &str) -> Option<&StopWritesEntry> {
        self.entries.get(&StopWritesKey {
            namespace: namespace.map(str::to_string),
            set: set.map(str::to_string),
            metric: metric.to_string(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, entry: StopWritesEntry) {
        let key = StopWritesKey {
            namespace: entry.namespace.clone(),
            set: entry.set.clone(),
            metric: entry.metric.clone(),
        };
        self.entries.insert(key, entry);
    }
}

impl Serialize for NodeStopWrites {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.values())
    }
}

/// `node -> entries`
pub type StopWritesSummary = BTreeMap<String, NodeStopWrites>;

/// A metric is a cause when a non-zero threshold is reached and the node's
/// own stop-writes flag, when it reports one, agrees.
pub fn is_stop_writes_cause(usage: f64, threshold: f64, stop_writes: Option<&str>) -> bool {
    if threshold == 0.0 {
        return false;
    }

    usage >= threshold && stop_writes.is_none_or(|sw| sw.eq_ignore_ascii_case("true"))
}

struct Evaluation<'a> {
    metric: &'a str,
    usage: i64,
    threshold: Threshold,
    stop_writes: Option<&'a str>,
    config: Option<&'a str>,
    namespace: &'a str,
    set: Option<&'a str>,
}

impl Evaluation<'_> {
    fn into_entry(self) -> StopWritesEntry {
        StopWritesEntry {
            metric: self.metric.to_string(),
            metric_usage: self.usage,
            stop_writes: is_stop_writes_cause(
                self.usage as f64,
                self.threshold.as_f64(),
                self.stop_writes,
            ),
            metric_threshold: (!self.threshold.is_zero()).then_some(self.threshold),
            config: self.config.map(str::to_string),
            namespace: Some(self.namespace.to_string()),
            set: self.set.map(str::to_string),
        }
    }
}

fn raw<V: FromRaw>(stats: &Stats, key: &str) -> Option<V> {
    stats.get(key).filter(|v| !v.is_null()).and_then(V::from_raw)
}

fn present(stats: &Stats, key: &str) -> bool {
    stats.get(key).is_some_and(|v| !v.is_null())
}

fn fraction_of(total: i64, pct: i64) -> Threshold {
    Threshold::Float(total as f64 * (pct as f64 / 100.0))
}

/// Clock skew and system memory, which are service-level metrics evaluated
/// against each namespace's configuration.
fn service_metrics(node: &mut NodeStopWrites, service: &Stats, namespaces: &Keyed<Stats>) {
    let clock_skew_ms: Option<i64> = raw(service, "cluster_clock_skew_ms");
    let clock_skew_stop_writes_sec: Option<i64> = raw(service, "cluster_clock_skew_stop_writes_sec");
    let system_free_mem_pct: Option<i64> = raw(service, "system_free_mem_pct");

    for (ns, fetched) in namespaces {
        let Some(stats) = fetched.data() else {
            continue;
        };

        let strong_consistency: Option<String> = raw(stats, "strong-consistency");
        let nsup_period: Option<String> = raw(stats, "nsup-period");
        let clock_skew_stop_writes: Option<String> = raw(stats, "clock_skew_stop_writes");

        if let (Some(usage), Some(threshold_sec), Some(sw)) =
            (clock_skew_ms, clock_skew_stop_writes_sec, clock_skew_stop_writes.as_deref())
        {
            let nsup_active = nsup_period.as_deref().is_some_and(|p| p != "0");
            let threshold = if strong_consistency.as_deref() == Some("false") && nsup_active {
                AP_NSUP_CLOCK_SKEW_MS
            } else {
                threshold_sec * 1000
            };

            node.push(
                Evaluation {
                    metric: "cluster_clock_skew_ms",
                    usage,
                    threshold: Threshold::Int(threshold),
                    stop_writes: Some(sw),
                    config: None,
                    namespace: ns,
                    set: None,
                }
                .into_entry(),
            );
        }

        let stop_writes: Option<String> = raw(stats, "stop_writes");
        let config = "stop-writes-sys-memory-pct";
        if let (Some(threshold), Some(free_pct), Some(sw)) =
            (raw::<i64>(stats, config), system_free_mem_pct, stop_writes.as_deref())
        {
            node.push(
                Evaluation {
                    metric: "system_free_mem_pct",
                    usage: 100 - free_pct,
                    threshold: Threshold::Int(threshold),
                    stop_writes: Some(sw),
                    config: Some(config),
                    namespace: ns,
                    set: None,
                }
                .into_entry(),
            );
        }
    }
}

/// Storage and memory metrics that are reported per namespace.
fn namespace_metrics(node: &mut NodeStopWrites, namespaces: &Keyed<Stats>) {
    for (ns, fetched) in namespaces {
        let Some(stats) = fetched.data() else {
            continue;
        };
        let Some(sw) = raw::<String>(stats, "stop_writes") else {
            continue;
        };
        let sw = Some(sw.as_str());

        let config = "min-avail-pct";
        let metric = if present(stats, "device_avail_pct") {
            "device_avail_pct"
        } else {
            "pmem_avail_pct"
        };
        if let (Some(usage), Some(threshold)) = (raw::<i64>(stats, metric), raw::<i64>(stats, config)) {
            node.push(
                Evaluation {
                    metric,
                    usage,
                    threshold: Threshold::Int(threshold),
                    stop_writes: sw,
                    config: Some(config),
                    namespace: ns,
                    set: None,
                }
                .into_entry(),
            );
        }

        let config = "max-used-pct";
        let (metric, total_key) = if present(stats, "device_used_bytes") {
            ("device_used_bytes", "device_total_bytes")
        } else {
            ("pmem_used_bytes", "pmem_total_bytes")
        };
        if let (Some(usage), Some(pct), Some(total)) = (
            raw::<i64>(stats, metric),
            raw::<i64>(stats, config),
            raw::<i64>(stats, total_key),
        ) {
            node.push(
                Evaluation {
                    metric,
                    usage,
                    threshold: fraction_of(total, pct),
                    stop_writes: sw,
                    config: Some(config),
                    namespace: ns,
                    set: None,
                }
                .into_entry(),
            );
        }

        let config = "stop-writes-pct";
        if let (Some(usage), Some(pct), Some(total)) = (
            raw::<i64>(stats, "memory_used_bytes"),
            raw::<i64>(stats, config),
            raw::<i64>(stats, "memory-size"),
        ) {
            node.push(
                Evaluation {
                    metric: "memory_used_bytes",
                    usage,
                    threshold: fraction_of(total, pct),
                    stop_writes: sw,
                    config: Some(config),
                    namespace: ns,
                    set: None,
                }
                .into_entry(),
            );
        }
    }
}

/// Per-set size and object count limits. Sets report no stop-writes flag.
fn set_metrics(node: &mut NodeStopWrites, namespaces: &Keyed<Keyed<Stats>>) {
    for (ns, fetched) in namespaces {
        let Some(sets) = fetched.data() else {
            continue;
        };

        for (set, fetched) in sets {
            let Some(stats) = fetched.data() else {
                continue;
            };

            let memory_bytes: Option<i64> = raw(stats, "memory_data_bytes");
            let (metric, usage) = match memory_bytes {
                Some(bytes) if bytes != 0 => ("memory_data_bytes", Some(bytes)),
                _ => ("device_data_bytes", raw::<i64>(stats, "device_data_bytes")),
            };
            let config = "stop-writes-size";
            if let (Some(usage), Some(threshold)) = (usage, raw::<i64>(stats, config)) {
                node.push(
                    Evaluation {
                        metric,
                        usage,
                        threshold: Threshold::Int(threshold),
                        stop_writes: None,
                        config: Some(config),
                        namespace: ns,
                        set: Some(set.as_str()),
                    }
                    .into_entry(),
                );
            }

            let config = if present(stats, "stop-writes-count") {
                "stop-writes-count"
            } else {
                "set-stop-writes-count"
            };
            if let (Some(usage), Some(threshold)) = (raw::<i64>(stats, "objects"), raw::<i64>(stats, config)) {
                node.push(
                    Evaluation {
                        metric: "objects",
                        usage,
                        threshold: Threshold::Int(threshold),
                        stop_writes: None,
                        config: Some(config),
                        namespace: ns,
                        set: Some(set.as_str()),
                    }
                    .into_entry(),
                );
            }
        }
    }
}

/// Evaluate every stop-writes trigger on every node. Nodes that appear in
/// any input map get an entry, possibly empty.
pub fn create_stop_writes_summary(stats: &ClusterStats) -> StopWritesSummary {
    let namespaces = stats.namespaces();
    let sets = stats.sets();

    let nodes: BTreeSet<&String> = stats
        .service_stats
        .keys()
        .chain(stats.namespace_stats.keys())
        .chain(stats.namespace_configs.keys())
        .chain(stats.set_stats.keys())
        .chain(stats.set_configs.keys())
        .collect();

    let mut summary = StopWritesSummary::new();

    for node in nodes {
        let mut entries = NodeStopWrites::default();
        let node_namespaces = namespaces.get(node).and_then(|f| f.data());

        if let (Some(service), Some(ns)) = (
            stats.service_stats.get(node).and_then(|f| f.data()),
            node_namespaces,
        ) {
            service_metrics(&mut entries, service, ns);
        }
        if let Some(ns) = node_namespaces {
            namespace_metrics(&mut entries, ns);
        }
        if let Some(node_sets) = sets.get(node).and_then(|f| f.data()) {
            set_metrics(&mut entries, node_sets);
        }

        debug!(node = %node, entries = entries.entries.len(), "evaluated stop-writes triggers");
        summary.insert(node.clone(), entries);
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cluster(value: serde_json::Value) -> ClusterStats {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_cause_requires_threshold_and_flag() {
        assert!(is_stop_writes_cause(90.0, 80.0, Some("true")));
        assert!(is_stop_writes_cause(90.0, 80.0, None));
        assert!(!is_stop_writes_cause(90.0, 80.0, Some("false")));
        assert!(!is_stop_writes_cause(70.0, 80.0, Some("true")));
        assert!(!is_stop_writes_cause(90.0, 0.0, Some("true")));
    }

    #[test]
    fn test_clock_skew_uses_ap_nsup_override() {
        let stats = cluster(json!({
            "service_stats": {"n1": {
                "cluster_clock_skew_ms": "45000",
                "cluster_clock_skew_stop_writes_sec": "60",
                "system_free_mem_pct": "20",
            }},
            "namespace_stats": {"n1": {
                "ap": {"clock_skew_stop_writes": "true", "stop_writes": "false"},
                "sc": {"clock_skew_stop_writes": "false", "stop_writes": "false"},
            }},
            "namespace_configs": {"n1": {
                "ap": {"strong-consistency": "false", "nsup-period": "120", "stop-writes-sys-memory-pct": "90"},
                "sc": {"strong-consistency": "true", "nsup-period": "120"},
            }},
        }));

        let summary = create_stop_writes_summary(&stats);
        let node = &summary["n1"];

        let ap = node.get(Some("ap"), None, "cluster_clock_skew_ms").unwrap();
        assert!(ap.stop_writes);
        assert_eq!(ap.metric_threshold, Some(Threshold::Int(40_000)));
        assert_eq!(ap.metric_usage, 45_000);

        let sc = node.get(Some("sc"), None, "cluster_clock_skew_ms").unwrap();
        assert!(!sc.stop_writes);
        assert_eq!(sc.metric_threshold, Some(Threshold::Int(60_000)));

        let mem = node.get(Some("ap"), None, "system_free_mem_pct").unwrap();
        assert_eq!(mem.metric_usage, 80);
        assert!(!mem.stop_writes);
        assert_eq!(mem.config.as_deref(), Some("stop-writes-sys-memory-pct"));
        assert!(node.get(Some("sc"), None, "system_free_mem_pct").is_none());
    }

    #[test]
    fn test_storage_and_memory_thresholds() {
        let stats = cluster(json!({
            "namespace_stats": {"n1": {"test": {
                "stop_writes": "true",
                "pmem_avail_pct": "4",
                "device_used_bytes": "700",
                "device_total_bytes": "1000",
                "memory_used_bytes": "95",
            }}},
            "namespace_configs": {"n1": {"test": {
                "min-avail-pct": "5",
                "max-used-pct": "70",
                "memory-size": "100",
                "stop-writes-pct": "90",
            }}},
        }));

        let summary = create_stop_writes_summary(&stats);
        let node = &summary["n1"];

        let avail = node.get(Some("test"), None, "pmem_avail_pct").unwrap();
        assert_eq!(avail.metric_usage, 4);
        assert!(!avail.stop_writes);

        let used = node.get(Some("test"), None, "device_used_bytes").unwrap();
        assert_eq!(used.metric_threshold, Some(Threshold::Float(700.0)));
        assert!(used.stop_writes);

        let memory = node.get(Some("test"), None, "memory_used_bytes").unwrap();
        assert_eq!(memory.metric_threshold, Some(Threshold::Float(90.0)));
        assert!(memory.stop_writes);
    }

    #[test]
    fn test_namespace_without_stop_writes_flag_is_skipped() {
        let stats = cluster(json!({
            "namespace_stats": {"n1": {"test": {"device_avail_pct": "1", "min-avail-pct": "5"}}},
        }));

        let summary = create_stop_writes_summary(&stats);
        assert!(summary["n1"].is_empty());
    }

    #[test]
    fn test_set_limits() {
        let stats = cluster(json!({
            "set_stats": {"n1": {"test": {
                "demo": {"memory_data_bytes": "0", "device_data_bytes": "2048", "objects": "10"},
                "users": {"memory_data_bytes": "512", "objects": "3"},
            }}},
            "set_configs": {"n1": {"test": {
                "demo": {"stop-writes-size": "1024", "set-stop-writes-count": "0"},
                "users": {"stop-writes-size": "0", "stop-writes-count": "3"},
            }}},
        }));

        let summary = create_stop_writes_summary(&stats);
        let node = &summary["n1"];

        let demo_size = node.get(Some("test"), Some("demo"), "device_data_bytes").unwrap();
        assert!(demo_size.stop_writes);
        assert_eq!(demo_size.metric_usage, 2048);

        let demo_count = node.get(Some("test"), Some("demo"), "objects").unwrap();
        assert!(!demo_count.stop_writes);
        assert_eq!(demo_count.metric_threshold, None);
        assert_eq!(demo_count.config.as_deref(), Some("set-stop-writes-count"));

        let users_size = node.get(Some("test"), Some("users"), "memory_data_bytes").unwrap();
        assert!(!users_size.stop_writes);

        let users_count = node.get(Some("test"), Some("users"), "objects").unwrap();
        assert!(users_count.stop_writes);
    }

    #[test]
    fn test_entries_serialize_as_list() {
        let stats = cluster(json!({
            "set_stats": {"n1": {"test": {"demo": {"objects": "5", "stop-writes-count": "4"}}}},
            "service_stats": {"n2": {"error": "timeout"}},
        }));

        let summary = create_stop_writes_summary(&stats);
        let value = serde_json::to_value(&summary).unwrap();

        assert_eq!(value["n2"], json!([]));
        assert_eq!(
            value["n1"],
            json!([{
                "metric": "objects",
                "metric_usage": 5,
                "stop_writes": true,
                "metric_threshold": 4,
                "config": "stop-writes-count",
                "namespace": "test",
                "set": "demo",
            }])
        );
    }
}
