//! License data size: the unique data a cluster stores, excluding replicas
//! and per-record overhead.
//!
//! The preferred figure comes from the unique-data agent, which samples the
//! cluster over time. Without a usable agent response the latest figure is
//! estimated from the current namespace statistics.

use super::{LicenseUsage, Summary};
use crate::error::{Error, Result};
use crate::gates::record_overhead_bytes;
use asadm_types::{Fetched, Keyed, Stats, Version, attrs};
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, error, warn};

/// The agent's `license_usage` response.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentResponse {
    pub license_usage: AgentEntries,
    #[serde(default)]
    pub health: Value,
    #[serde(default)]
    pub raw_store: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentEntries {
    #[serde(default)]
    pub count: u64,
    pub entries: Vec<AgentEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentEntry {
    pub time: String,
    pub level: String,
    #[serde(default)]
    pub unique_data_bytes: Option<i64>,
    #[serde(default)]
    pub cluster_stable: Option<bool>,
    #[serde(default)]
    pub namespaces: BTreeMap<String, AgentNamespaceEntry>,
    #[serde(default)]
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentNamespaceEntry {
    pub unique_data_bytes: i64,
    #[serde(default)]
    pub master_objects: Option<i64>,
}

/// Running min, max, mean and most recent sample.
#[derive(Debug, Clone, Default)]
struct UsageAggregate {
    min: Option<i64>,
    max: i64,
    avg: f64,
    count: u64,
    latest: i64,
    latest_time: Option<DateTime<FixedOffset>>,
}

impl UsageAggregate {
    fn update(&mut self, value: i64, time: &str) -> Result<()> {
        let parsed = DateTime::parse_from_rfc3339(time)
            .map_err(|e| Error::AgentResponse(format!("bad entry time {:?}: {}", time, e)))?;

        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = self.max.max(value);
        self.count += 1;
        self.avg = (self.avg * (self.count - 1) as f64 + value as f64) / self.count as f64;
        self.latest = value;
        self.latest_time = Some(parsed);
        Ok(())
    }

    fn into_usage(self) -> LicenseUsage {
        LicenseUsage {
            latest: self.latest,
            latest_time: self.latest_time,
            min: self.min,
            max: Some(self.max),
            avg: Some(self.avg.round_ties_even() as i64),
        }
    }
}

/// Fold the agent's info-level samples into `summary`. Returns `Ok(false)`
/// when no sample qualified, leaving `summary` untouched.
pub fn apply_agent_response(
    response: &AgentResponse,
    summary: &mut Summary,
    allow_unstable: bool,
) -> Result<bool> {
    let mut cluster = UsageAggregate::default();
    let mut namespaces: BTreeMap<String, UsageAggregate> = BTreeMap::new();

    for entry in &response.license_usage.entries {
        if entry.level != "info" {
            continue;
        }

        if !allow_unstable {
            let stable = entry.cluster_stable.ok_or_else(|| {
                Error::AgentResponse("entry without cluster_stable".to_string())
            })?;
            if !stable {
                continue;
            }
        }

        let total = entry.unique_data_bytes.ok_or_else(|| {
            Error::AgentResponse("info entry without unique_data_bytes".to_string())
        })?;
        cluster.update(total, &entry.time)?;

        for (ns, usage) in &entry.namespaces {
            namespaces
                .entry(ns.clone())
                .or_default()
                .update(usage.unique_data_bytes, &entry.time)?;
        }
    }

    if cluster.count == 0 {
        return Ok(false);
    }

    summary.cluster.license_data = cluster.into_usage();

    for (ns, aggregate) in namespaces {
        match summary.namespaces.get_mut(&ns) {
            Some(ns_summary) => ns_summary.license_data = aggregate.into_usage(),
            None => warn!(
                namespace = %ns,
                "namespace found in agent response but not in current cluster"
            ),
        }
    }

    Ok(true)
}

/// Estimate the latest license data size from namespace statistics
/// (`namespace -> node -> stats`).
///
/// Per node, unique data is storage used (device and pmem, each divided by
/// its compression ratio) or, when neither is used, in-memory index plus
/// data. Per namespace the node sum is divided by the replication factor and
/// the per-record overhead of each node's build is subtracted.
pub fn estimate_license_data(
    ns_stats: &BTreeMap<String, Keyed<Stats>>,
    builds: &BTreeMap<String, String>,
    summary: &mut Summary,
) -> Result<()> {
    let mut estimates: Vec<(String, f64)> = Vec::new();

    for (ns, nodes) in ns_stats {
        if nodes.is_empty() {
            continue;
        }

        let mut unique_data = 0.0;
        let mut record_overhead = 0.0;
        let mut repl_factor: Option<i64> = None;

        for (node, fetched) in nodes {
            let Fetched::Data(stats) = fetched else {
                continue;
            };
            if stats.is_empty() {
                continue;
            }

            let node_rf = attrs::EFFECTIVE_REPL_FACTOR.get::<i64>(stats).ok_or_else(|| {
                Error::ReplicationFactorUnknown {
                    namespace: ns.clone(),
                    node: node.clone(),
                }
            })?;

            if node_rf == 0 {
                debug!(namespace = %ns, node = %node, "skipping node with replication factor 0");
                continue;
            }

            match repl_factor {
                Some(expected) if expected != node_rf => {
                    return Err(Error::ReplicationFactorMismatch {
                        namespace: ns.clone(),
                        expected,
                        found: node_rf,
                    });
                }
                _ => repl_factor = Some(node_rf),
            }

            let master_objects = attrs::MASTER_OBJECTS.get_or::<i64>(stats, 0);
            let device_ratio = attrs::DEVICE_COMPRESSION_RATIO.get_or::<f64>(stats, 1.0);
            let pmem_ratio = attrs::PMEM_COMPRESSION_RATIO.get_or::<f64>(stats, 1.0);
            let device_bytes = attrs::DEVICE_USED_BYTES_CURRENT.get_or::<f64>(stats, 0.0) / device_ratio;
            let pmem_bytes = attrs::PMEM_USED_BYTES.get_or::<f64>(stats, 0.0) / pmem_ratio;

            let memory_bytes = if device_bytes == 0.0 && pmem_bytes == 0.0 {
                attrs::MEMORY_USED_INDEX_BYTES.get_or::<f64>(stats, 0.0)
                    + attrs::MEMORY_USED_DATA_BYTES.get_or::<f64>(stats, 0.0)
            } else {
                0.0
            };

            let build = builds
                .get(node)
                .ok_or_else(|| Error::MissingBuild { node: node.clone() })?;
            let overhead = record_overhead_bytes(&Version::parse(build));

            unique_data += memory_bytes + pmem_bytes + device_bytes;
            record_overhead += (master_objects * overhead) as f64;
        }

        let rf = repl_factor.unwrap_or(1) as f64;
        let ns_unique = ((unique_data / rf) - record_overhead).round_ties_even();
        estimates.push((ns.clone(), ns_unique));
    }

    let mut cluster_total = 0.0;
    for (ns, estimate) in estimates {
        if let Some(ns_summary) = summary.namespaces.get_mut(&ns) {
            ns_summary.license_data = LicenseUsage::latest_only(estimate as i64);
        }
        cluster_total += estimate;
    }
    summary.cluster.license_data = LicenseUsage::latest_only(cluster_total.round_ties_even() as i64);

    Ok(())
}

/// Fill in license data from the agent response when it is usable,
/// otherwise from namespace statistics.
pub fn compute_license_data_size(
    ns_stats: &BTreeMap<String, Keyed<Stats>>,
    agent_response: Option<&Value>,
    builds: &BTreeMap<String, String>,
    allow_unstable: bool,
    summary: &mut Summary,
) -> Result<()> {
    let usable = agent_response.filter(|v| match v {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        _ => true,
    });

    let Some(raw) = usable else {
        return estimate_license_data(ns_stats, builds, summary);
    };

    let applied = serde_json::from_value::<AgentResponse>(raw.clone())
        .map_err(|e| Error::AgentResponse(e.to_string()))
        .and_then(|response| apply_agent_response(&response, summary, allow_unstable));

    match applied {
        Ok(true) => Ok(()),
        Ok(false) => {
            warn!("zero entries found in agent response");
            estimate_license_data(ns_stats, builds, summary)
        }
        Err(e) => {
            error!("{}", e);
            estimate_license_data(ns_stats, builds, summary)
        }
    }
}
