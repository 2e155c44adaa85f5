//! Cluster and namespace summary rollups.

pub mod license;

use crate::features::find_features_for_cluster;
use crate::inputs::{ClusterMetadata, ClusterStats};
use asadm_types::{Keyed, Stats, add_maps, attrs, flip_keys, pct_to_value, usable};
use chrono::{DateTime, FixedOffset};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

pub use license::{AgentResponse, compute_license_data_size};

/// Configured keys that name a namespace's storage devices or files.
static DEVICE_NAME_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(storage-engine\.device|device|storage-engine\.file|file|dev|storage-engine\.device\[[0-9]+\]|storage-engine\.file\[[0-9]+\])$",
    )
    .expect("valid device key pattern")
});

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StorageUsage {
    pub total: i64,
    pub used: i64,
    pub used_pct: f64,
    pub avail: i64,
    pub avail_pct: f64,
}

impl StorageUsage {
    /// Usage where availability is derived from what is used.
    fn from_used(total: i64, used: i64) -> Self {
        let avail = total - used;
        let avail_pct = pct(avail as f64, total);
        Self {
            total,
            used,
            used_pct: 100.0 - avail_pct,
            avail,
            avail_pct,
        }
    }

    /// Usage where the node reports availability independently of use.
    /// Reserved space makes `used + avail` less than `total`.
    fn from_reported(total: i64, used: i64, avail: f64) -> Self {
        Self {
            total,
            used,
            used_pct: pct(used as f64, total),
            avail: avail.round_ties_even() as i64,
            avail_pct: pct(avail, total),
        }
    }
}

fn pct(part: f64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part / total as f64 * 100.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LicenseUsage {
    pub latest: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_time: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg: Option<i64>,
}

impl LicenseUsage {
    pub fn latest_only(latest: i64) -> Self {
        Self {
            latest,
            ..Self::default()
        }
    }
}

/// Where a namespace keeps its primary index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexType {
    #[default]
    Shmem,
    Pmem,
    Flash,
}

impl IndexType {
    fn from_config(value: &str) -> Self {
        match value {
            "pmem" => IndexType::Pmem,
            "flash" => IndexType::Flash,
            _ => IndexType::Shmem,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    pub server_version: Vec<String>,
    pub os_version: Vec<String>,
    pub cluster_size: Vec<i64>,
    pub cluster_name: Vec<String>,
    pub device_count: i64,
    pub device_count_per_node: i64,
    pub device_count_same_across_nodes: bool,
    pub active_features: Vec<String>,
    pub migrations_in_progress: bool,
    pub active_ns: usize,
    pub ns_count: usize,
    pub license_data: LicenseUsage,
    pub memory: StorageUsage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<StorageUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pmem: Option<StorageUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pmem_index: Option<StorageUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flash_index: Option<StorageUsage>,
}

impl Default for ClusterSummary {
    fn default() -> Self {
        Self {
            server_version: Vec::new(),
            os_version: Vec::new(),
            cluster_size: Vec::new(),
            cluster_name: Vec::new(),
            device_count: 0,
            device_count_per_node: 0,
            device_count_same_across_nodes: true,
            active_features: Vec::new(),
            migrations_in_progress: false,
            active_ns: 0,
            ns_count: 0,
            license_data: LicenseUsage::default(),
            memory: StorageUsage::default(),
            device: None,
            pmem: None,
            pmem_index: None,
            flash_index: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamespaceSummary {
    pub devices_total: i64,
    pub devices_per_node: i64,
    pub device_count_same_across_nodes: bool,
    pub repl_factor: Vec<i64>,
    pub master_objects: i64,
    pub migrations_in_progress: bool,
    pub index_type: IndexType,
    pub memory: StorageUsage,
    pub rack_aware: bool,
    pub license_data: LicenseUsage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_read_pct: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<StorageUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pmem: Option<StorageUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pmem_index: Option<StorageUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flash_index: Option<StorageUsage>,
}

impl Default for NamespaceSummary {
    fn default() -> Self {
        Self {
            devices_total: 0,
            devices_per_node: 0,
            device_count_same_across_nodes: true,
            repl_factor: Vec::new(),
            master_objects: 0,
            migrations_in_progress: false,
            index_type: IndexType::Shmem,
            memory: StorageUsage::default(),
            rack_aware: false,
            license_data: LicenseUsage::default(),
            compression_ratio: None,
            cache_read_pct: None,
            device: None,
            pmem: None,
            pmem_index: None,
            flash_index: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    #[serde(rename = "CLUSTER")]
    pub cluster: ClusterSummary,
    #[serde(rename = "NAMESPACES")]
    pub namespaces: BTreeMap<String, NamespaceSummary>,
}

impl Summary {
    pub fn new(namespaces: impl IntoIterator<Item = String>) -> Self {
        Self {
            cluster: ClusterSummary::default(),
            namespaces: namespaces
                .into_iter()
                .map(|ns| (ns, NamespaceSummary::default()))
                .collect(),
        }
    }
}

fn distinct<T: Ord>(values: impl IntoIterator<Item = T>) -> Vec<T> {
    values.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

/// `round()` on a ratio of counts, ties to even.
fn ratio_rounded(numerator: i64, denominator: usize) -> i64 {
    if denominator == 0 {
        return 0;
    }
    (numerator as f64 / denominator as f64).round_ties_even() as i64
}

/// First node's value, in node order.
fn first_value<V: asadm_types::FromRaw>(attr: attrs::Attr, nodes: &Keyed<Stats>, default: V) -> V
where
    V: Clone,
{
    attr.collect(nodes, default.clone())
        .into_values()
        .next()
        .unwrap_or(default)
}

fn device_count(stats: &Stats) -> i64 {
    stats
        .iter()
        .filter(|(key, _)| DEVICE_NAME_KEY.is_match(key))
        .filter_map(|(_, value)| match value {
            Value::String(s) if !s.is_empty() => Some(s.split(',').count() as i64),
            Value::String(_) | Value::Null => None,
            other => Some(other.to_string().split(',').count() as i64),
        })
        .sum()
}

fn set_migration_status(ns_stats: &BTreeMap<String, Keyed<Stats>>, summary: &mut Summary) {
    for (ns, nodes) in ns_stats {
        let in_progress = attrs::MIGRATE_TX_REMAINING
            .collect::<i64>(nodes, 0)
            .values()
            .any(|remaining| *remaining != 0);

        if in_progress {
            if let Some(ns_summary) = summary.namespaces.get_mut(ns) {
                ns_summary.migrations_in_progress = true;
            }
            summary.cluster.migrations_in_progress = true;
        }
    }
}

fn set_metadata(stats: &ClusterStats, metadata: &ClusterMetadata, cluster: &mut ClusterSummary) {
    cluster.cluster_size = distinct(
        attrs::CLUSTER_SIZE
            .collect::<i64>(&stats.service_stats, 0)
            .into_values(),
    );
    cluster.cluster_name = distinct(
        metadata
            .cluster_name
            .values()
            .filter(|name| name.as_str() != "null")
            .cloned(),
    );
    cluster.server_version = distinct(metadata.server_version.values().cloned());
    cluster.os_version = distinct(
        attrs::OS_DESCRIPTION
            .collect::<String>(&metadata.os_version, String::new())
            .into_values(),
    );
}

/// Per-node storage figures of one engine kind, kept for cluster totals.
#[derive(Debug, Default)]
struct NodewiseStorage {
    size: BTreeMap<String, i64>,
    used: BTreeMap<String, i64>,
    avail: BTreeMap<String, f64>,
}

impl NodewiseStorage {
    fn read(nodes: &Keyed<Stats>, total: attrs::Attr, used: attrs::Attr, avail_pct: attrs::Attr) -> Self {
        let size = total.collect::<i64>(nodes, 0);
        let used = used.collect::<i64>(nodes, 0);
        let avail = pct_to_value(&size, &avail_pct.collect::<i64>(nodes, 0));
        Self { size, used, avail }
    }

    fn add(&mut self, other: &NodewiseStorage) {
        add_maps(&mut self.size, &other.size);
        add_maps(&mut self.used, &other.used);
        add_maps(&mut self.avail, &other.avail);
    }

    fn usage(&self) -> Option<StorageUsage> {
        let total: i64 = self.size.values().sum();
        if total <= 0 {
            return None;
        }

        Some(StorageUsage::from_reported(
            total,
            self.used.values().sum(),
            self.avail.values().sum(),
        ))
    }
}

/// Index-on-mount usage: the size limit is configured, usage is a stat.
fn index_usage(
    ns_configs: Option<&Keyed<Stats>>,
    nodes: &Keyed<Stats>,
    used: attrs::Attr,
) -> Option<StorageUsage> {
    let size: i64 = ns_configs
        .map(|configs| attrs::INDEX_MOUNTS_SIZE_LIMIT.collect::<i64>(configs, 0).values().sum())
        .unwrap_or(0);
    if size <= 0 {
        return None;
    }

    let used: i64 = used.collect::<i64>(nodes, 0).values().sum();
    Some(StorageUsage::from_used(size, used))
}

/// Build the cluster summary.
///
/// `agent_response` is the raw unique-data agent reply, if one was fetched.
/// License figures that cannot be computed at all are left at zero and
/// logged; every other part of the summary is still produced.
pub fn create_summary(
    stats: &ClusterStats,
    metadata: &ClusterMetadata,
    agent_response: Option<&Value>,
    allow_unstable: bool,
) -> Summary {
    let features = find_features_for_cluster(stats);

    let ns_stats = flip_keys(&stats.namespaces());
    let ns_configs = flip_keys(&stats.namespace_configs);

    let mut summary = Summary::new(ns_stats.keys().cloned());
    let total_nodes = stats.service_stats.len();

    if let Err(e) = compute_license_data_size(
        &ns_stats,
        agent_response,
        &metadata.server_build,
        allow_unstable,
        &mut summary,
    ) {
        warn!("unable to compute license data size: {}", e);
    }

    set_migration_status(&ns_stats, &mut summary);
    summary.cluster.active_features = features;
    set_metadata(stats, metadata, &mut summary.cluster);

    let mut cl_memory_total = 0i64;
    let mut cl_memory_avail = 0i64;
    let mut cl_pmem_index = (0i64, 0i64);
    let mut cl_flash_index = (0i64, 0i64);
    let mut cl_device_counts: BTreeMap<String, i64> = BTreeMap::new();
    let mut cl_device = NodewiseStorage::default();
    let mut cl_pmem = NodewiseStorage::default();

    for (ns, nodes) in &ns_stats {
        if nodes.is_empty() {
            continue;
        }
        let Some(ns_summary) = summary.namespaces.get_mut(ns) else {
            continue;
        };

        // Devices
        let device_counts: BTreeMap<String, i64> = usable(nodes)
            .map(|(node, s)| (node.clone(), device_count(s)))
            .collect();
        add_maps(&mut cl_device_counts, &device_counts);
        let ns_total_devices: i64 = device_counts.values().sum();

        if ns_total_devices > 0 {
            ns_summary.devices_total = ns_total_devices;
            ns_summary.devices_per_node = ratio_rounded(ns_total_devices, nodes.len());
            if distinct(device_counts.values()).len() > 1 {
                ns_summary.device_count_same_across_nodes = false;
            }
        }

        // Memory
        let mem_size: i64 = attrs::MEMORY_SIZE.collect::<i64>(nodes, 0).values().sum();
        let mem_used: i64 = attrs::MEMORY_USED_BYTES.collect::<i64>(nodes, 0).values().sum();
        ns_summary.memory = StorageUsage::from_used(mem_size, mem_used);
        cl_memory_total += mem_size;
        cl_memory_avail += mem_size - mem_used;

        // Primary index
        let index_type = IndexType::from_config(&first_value(attrs::INDEX_TYPE, nodes, "shmem".to_string()));
        ns_summary.index_type = index_type;

        match index_type {
            IndexType::Pmem => {
                ns_summary.pmem_index = index_usage(ns_configs.get(ns), nodes, attrs::INDEX_PMEM_USED_BYTES);
                if let Some(u) = &ns_summary.pmem_index {
                    cl_pmem_index.0 += u.total;
                    cl_pmem_index.1 += u.avail;
                }
            }
            IndexType::Flash => {
                ns_summary.flash_index = index_usage(ns_configs.get(ns), nodes, attrs::INDEX_FLASH_USED_BYTES);
                if let Some(u) = &ns_summary.flash_index {
                    cl_flash_index.0 += u.total;
                    cl_flash_index.1 += u.avail;
                }
            }
            IndexType::Shmem => {}
        }

        // Storage engine
        match first_value(attrs::STORAGE_ENGINE, nodes, String::new()).as_str() {
            "device" => {
                let device = NodewiseStorage::read(
                    nodes,
                    attrs::DEVICE_TOTAL_BYTES,
                    attrs::DEVICE_USED_BYTES,
                    attrs::DEVICE_AVAIL_PCT,
                );
                cl_device.add(&device);
                ns_summary.device = device.usage();
            }
            "pmem" => {
                let pmem = NodewiseStorage::read(
                    nodes,
                    attrs::PMEM_TOTAL_BYTES,
                    attrs::PMEM_USED_BYTES,
                    attrs::PMEM_AVAIL_PCT,
                );
                cl_pmem.add(&pmem);
                ns_summary.pmem = pmem.usage();
            }
            _ => {}
        }

        let compression_ratio = attrs::COMPRESSION_RATIO
            .collect::<f64>(nodes, 0.0)
            .into_values()
            .fold(0.0, f64::max);
        if compression_ratio > 0.0 {
            ns_summary.compression_ratio = Some(compression_ratio);
        }

        ns_summary.repl_factor = distinct(
            attrs::CONFIGURED_REPL_FACTOR
                .collect::<i64>(nodes, 0)
                .into_values(),
        );

        if first_value(attrs::DATA_IN_MEMORY, nodes, false) {
            let pcts: Option<Vec<i64>> = attrs::CACHE_READ_PCT
                .collect_opt::<i64>(nodes)
                .into_values()
                .collect();
            if let Some(pcts) = pcts.filter(|p| !p.is_empty()) {
                ns_summary.cache_read_pct = Some(pcts.iter().sum::<i64>().div_euclid(pcts.len() as i64));
            }
        }

        let master_objects: i64 = attrs::MASTER_OBJECTS.collect::<i64>(nodes, 0).values().sum();
        summary.cluster.ns_count += 1;
        if master_objects > 0 {
            ns_summary.master_objects = master_objects;
            summary.cluster.active_ns += 1;
        }

        ns_summary.rack_aware = attrs::RACK_ID
            .collect_opt::<i64>(nodes)
            .values()
            .any(|id| id.is_some_and(|id| id > 0));
    }

    let cluster = &mut summary.cluster;

    let cl_devices: i64 = cl_device_counts.values().sum();
    if cl_devices > 0 {
        cluster.device_count = cl_devices;
        cluster.device_count_per_node = ratio_rounded(cl_devices, total_nodes);
        if distinct(cl_device_counts.values()).len() > 1 {
            cluster.device_count_same_across_nodes = false;
        }
    }

    if cl_memory_total > 0 {
        cluster.memory = StorageUsage::from_used(cl_memory_total, cl_memory_total - cl_memory_avail);
    }
    if cl_pmem_index.0 > 0 {
        cluster.pmem_index = Some(StorageUsage::from_used(cl_pmem_index.0, cl_pmem_index.0 - cl_pmem_index.1));
    }
    if cl_flash_index.0 > 0 {
        cluster.flash_index = Some(StorageUsage::from_used(cl_flash_index.0, cl_flash_index.0 - cl_flash_index.1));
    }
    cluster.device = cl_device.usage();
    cluster.pmem = cl_pmem.usage();

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn inputs(stats: Value, metadata: Value) -> (ClusterStats, ClusterMetadata) {
        (
            serde_json::from_value(stats).unwrap(),
            serde_json::from_value(metadata).unwrap(),
        )
    }

    fn two_node_cluster() -> (ClusterStats, ClusterMetadata) {
        inputs(
            json!({
                "service_stats": {
                    "n1": {"cluster_size": "2", "stat_read_reqs": "10"},
                    "n2": {"cluster_size": "2"},
                },
                "namespace_stats": {
                    "n1": {"test": {
                        "memory_used_bytes": "250",
                        "master_objects": "4",
                        "device_total_bytes": "1000",
                        "device_used_bytes": "200",
                        "device_available_pct": "70",
                        "device_compression_ratio": "0.5",
                        "migrate_tx_partitions_remaining": "3",
                        "memory_used_data_bytes": "0",
                        "effective_replication_factor": "2",
                    }},
                    "n2": {"test": {
                        "memory_used_bytes": "250",
                        "master_objects": "6",
                        "device_total_bytes": "1000",
                        "device_used_bytes": "300",
                        "device_available_pct": "60",
                        "effective_replication_factor": "2",
                    }},
                },
                "namespace_configs": {
                    "n1": {"test": {
                        "memory-size": "1000",
                        "storage-engine": "device",
                        "storage-engine.device[0]": "/dev/sda",
                        "storage-engine.device[1]": "/dev/sdb",
                        "repl-factor": "2",
                        "rack-id": "1",
                    }},
                    "n2": {"test": {
                        "memory-size": "1000",
                        "storage-engine": "device",
                        "storage-engine.device[0]": "/dev/sda",
                        "repl-factor": "2",
                        "rack-id": "0",
                    }},
                },
            }),
            json!({
                "server_build": {"n1": "6.4.0.1", "n2": "6.4.0.1"},
                "server_version": {"n1": "E-6.4.0.1", "n2": "E-6.4.0.1"},
                "cluster_name": {"n1": "prod", "n2": "null"},
                "os_version": {"n1": {"description": "Ubuntu 22.04"}, "n2": {"error": "timeout"}},
            }),
        )
    }

    #[test]
    fn test_cluster_rollup() {
        let (stats, metadata) = two_node_cluster();
        let summary = create_summary(&stats, &metadata, None, false);
        let cluster = &summary.cluster;

        assert_eq!(cluster.cluster_size, vec![2]);
        assert_eq!(cluster.cluster_name, vec!["prod".to_string()]);
        assert_eq!(cluster.server_version, vec!["E-6.4.0.1".to_string()]);
        assert_eq!(cluster.os_version, vec!["Ubuntu 22.04".to_string()]);
        assert_eq!(cluster.active_features, vec!["KVS".to_string(), "Rack-aware".to_string()]);
        assert!(cluster.migrations_in_progress);
        assert_eq!(cluster.ns_count, 1);
        assert_eq!(cluster.active_ns, 1);

        assert_eq!(cluster.device_count, 3);
        assert_eq!(cluster.device_count_per_node, 2);
        assert!(!cluster.device_count_same_across_nodes);

        assert_eq!(cluster.memory.total, 2000);
        assert_eq!(cluster.memory.used, 500);
        assert_eq!(cluster.memory.avail_pct, 75.0);

        let device = cluster.device.as_ref().unwrap();
        assert_eq!(device.total, 2000);
        assert_eq!(device.used, 500);
        assert_eq!(device.avail, 1300);
        assert_eq!(device.avail_pct, 65.0);
    }

    #[test]
    fn test_namespace_rollup() {
        let (stats, metadata) = two_node_cluster();
        let summary = create_summary(&stats, &metadata, None, false);
        let ns = &summary.namespaces["test"];

        assert_eq!(ns.devices_total, 3);
        assert_eq!(ns.devices_per_node, 2);
        assert_eq!(ns.repl_factor, vec![2]);
        assert_eq!(ns.master_objects, 10);
        assert!(ns.migrations_in_progress);
        assert!(ns.rack_aware);
        assert_eq!(ns.index_type, IndexType::Shmem);
        assert_eq!(ns.compression_ratio, Some(0.5));
        assert_eq!(ns.memory.used_pct, 25.0);

        // (200 / 0.5 + 300) / 2 - 10 * 35
        assert_eq!(ns.license_data.latest, 0);
        assert_eq!(summary.cluster.license_data.latest, 0);
    }

    #[test]
    fn test_data_in_memory_cache_read_pct_average() {
        let (stats, metadata) = inputs(
            json!({
                "service_stats": {"n1": {}, "n2": {}},
                "namespace_stats": {
                    "n1": {"test": {"data-in-memory": "true", "cache_read_pct": "50"}},
                    "n2": {"test": {"data-in-memory": "true", "cache_read_pct": "25"}},
                },
            }),
            json!({}),
        );

        let summary = create_summary(&stats, &metadata, None, false);
        assert_eq!(summary.namespaces["test"].cache_read_pct, Some(37));
    }

    #[test]
    fn test_cache_read_pct_skipped_when_a_node_lacks_it() {
        let (stats, metadata) = inputs(
            json!({
                "service_stats": {"n1": {}, "n2": {}},
                "namespace_stats": {
                    "n1": {"test": {"data-in-memory": "true", "cache_read_pct": "50"}},
                    "n2": {"test": {"data-in-memory": "true"}},
                },
            }),
            json!({}),
        );

        let summary = create_summary(&stats, &metadata, None, false);
        assert_eq!(summary.namespaces["test"].cache_read_pct, None);
    }

    #[test]
    fn test_pmem_index_uses_configured_mount_limit() {
        let (stats, metadata) = inputs(
            json!({
                "service_stats": {"n1": {}},
                "namespace_stats": {"n1": {"test": {"index_pmem_used_bytes": "25"}}},
                "namespace_configs": {"n1": {"test": {
                    "index-type": "pmem",
                    "index-type.mounts-size-limit": "100",
                }}},
            }),
            json!({}),
        );

        let summary = create_summary(&stats, &metadata, None, false);
        let index = summary.namespaces["test"].pmem_index.as_ref().unwrap();
        assert_eq!(index.total, 100);
        assert_eq!(index.used, 25);
        assert_eq!(index.avail_pct, 75.0);
        assert_eq!(summary.cluster.pmem_index.as_ref().unwrap().used, 25);
    }

    #[test]
    fn test_failed_nodes_do_not_break_summary() {
        let (stats, metadata) = inputs(
            json!({
                "service_stats": {"n1": {"error": "timeout"}},
                "namespace_stats": {"n1": {"error": "timeout"}},
            }),
            json!({}),
        );

        let summary = create_summary(&stats, &metadata, None, false);
        assert!(summary.namespaces.is_empty());
        assert_eq!(summary.cluster.ns_count, 0);
        assert_eq!(summary.cluster.memory, StorageUsage::default());
    }

    #[test]
    fn test_summary_serializes_with_section_names() {
        let summary = Summary::new(vec!["test".to_string()]);
        let value = serde_json::to_value(&summary).unwrap();

        assert!(value.get("CLUSTER").is_some());
        assert_eq!(value["NAMESPACES"]["test"]["index_type"], json!("shmem"));
        assert!(value["CLUSTER"].get("device").is_none());
    }
}
