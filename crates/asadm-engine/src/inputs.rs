use asadm_types::{Keyed, NodeNamespaceStats, NodeSetStats, NodeStats, Stats, deep_merged};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything the info client collected from one cluster, per node.
///
/// Any node may be missing from any map, and any entry may be a failed fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterStats {
    #[serde(default)]
    pub service_stats: NodeStats,
    #[serde(default)]
    pub service_configs: NodeStats,
    #[serde(default)]
    pub security_configs: NodeStats,
    #[serde(default)]
    pub namespace_stats: NodeNamespaceStats,
    #[serde(default)]
    pub namespace_configs: NodeNamespaceStats,
    #[serde(default)]
    pub set_stats: NodeSetStats,
    #[serde(default)]
    pub set_configs: NodeSetStats,
    #[serde(default)]
    pub xdr_dc_stats: NodeNamespaceStats,
}

impl ClusterStats {
    /// Service statistics overlaid with service configs.
    pub fn service(&self) -> NodeStats {
        deep_merged(&self.service_stats, &self.service_configs)
    }

    /// Namespace statistics overlaid with namespace configs.
    pub fn namespaces(&self) -> NodeNamespaceStats {
        deep_merged(&self.namespace_stats, &self.namespace_configs)
    }

    /// Set statistics overlaid with set configs.
    pub fn sets(&self) -> NodeSetStats {
        deep_merged(&self.set_stats, &self.set_configs)
    }
}

/// Per-node identity facts gathered alongside the stats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterMetadata {
    /// `node -> build version`, e.g. `6.2.0.3`
    #[serde(default)]
    pub server_build: BTreeMap<String, String>,
    /// `node -> edition and version` as shown to users
    #[serde(default)]
    pub server_version: BTreeMap<String, String>,
    #[serde(default)]
    pub cluster_name: BTreeMap<String, String>,
    /// `node -> os facts`; only `description` is read
    #[serde(default)]
    pub os_version: Keyed<Stats>,
}
