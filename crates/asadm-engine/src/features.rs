//! Feature usage detection.
//!
//! A feature is in use on a node when any of its checks passes. A check
//! passes when any of its attributes, read from the named source, compares
//! true against the threshold. Nested sources (namespaces, XDR datacenters)
//! pass when any one entry passes.

use crate::inputs::ClusterStats;
use asadm_types::{FromRaw, Keyed, Stats};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Which per-node map a check reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Service,
    Security,
    Namespaces,
    XdrDcs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
}

impl CompareOp {
    fn apply<T: PartialOrd>(self, lhs: &T, rhs: &T) -> bool {
        match self {
            CompareOp::Gt => lhs > rhs,
            CompareOp::Lt => lhs < rhs,
            CompareOp::Ge => lhs >= rhs,
            CompareOp::Le => lhs <= rhs,
            CompareOp::Eq => lhs == rhs,
            CompareOp::Ne => lhs != rhs,
        }
    }
}

/// The value an attribute is compared against. Its kind also decides how
/// the raw attribute is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threshold {
    Int(i64),
    Str(&'static str),
    Bool(bool),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldCheck {
    pub source: Source,
    pub fields: &'static [&'static str],
    pub op: CompareOp,
    pub threshold: Threshold,
}

#[derive(Debug, Clone, Copy)]
pub struct FeatureCheck {
    pub name: &'static str,
    pub checks: &'static [FieldCheck],
}

/// One node's maps, as seen by the checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeSources<'a> {
    pub service: Option<&'a Stats>,
    pub security: Option<&'a Stats>,
    pub namespaces: Option<&'a Keyed<Stats>>,
    pub xdr_dcs: Option<&'a Keyed<Stats>>,
}

impl FieldCheck {
    pub fn check(&self, sources: &NodeSources<'_>) -> bool {
        if self.fields.is_empty() {
            return false;
        }

        match self.source {
            Source::Service => sources.service.is_some_and(|s| self.check_stats(s)),
            Source::Security => sources.security.is_some_and(|s| self.check_stats(s)),
            Source::Namespaces => sources.namespaces.is_some_and(|n| self.check_nested(n)),
            Source::XdrDcs => sources.xdr_dcs.is_some_and(|n| self.check_nested(n)),
        }
    }

    fn check_nested(&self, entries: &Keyed<Stats>) -> bool {
        entries
            .values()
            .filter_map(|fetched| fetched.data())
            .any(|stats| self.check_stats(stats))
    }

    fn check_stats(&self, stats: &Stats) -> bool {
        if stats.is_empty() {
            return false;
        }

        self.fields.iter().any(|field| {
            let Some(raw) = stats.get(*field).filter(|v| !v.is_null()) else {
                return false;
            };

            match self.threshold {
                Threshold::Int(t) => i64::from_raw(raw).is_some_and(|v| self.op.apply(&v, &t)),
                Threshold::Str(t) => {
                    String::from_raw(raw).is_some_and(|v| self.op.apply(&v.as_str(), &t))
                }
                Threshold::Bool(t) => bool::from_raw(raw).is_some_and(|v| self.op.apply(&v, &t)),
            }
        })
    }
}

impl FeatureCheck {
    pub fn check(&self, sources: &NodeSources<'_>) -> bool {
        self.checks.iter().any(|c| c.check(sources))
    }
}

impl fmt::Display for FeatureCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

macro_rules! check {
    ($source:ident, [$($field:literal),+ $(,)?]) => {
        check!($source, [$($field),+], Gt, Int(0))
    };
    ($source:ident, [$($field:literal),+ $(,)?], $op:ident, $kind:ident($value:expr)) => {
        FieldCheck {
            source: Source::$source,
            fields: &[$($field),+],
            op: CompareOp::$op,
            threshold: Threshold::$kind($value),
        }
    };
}

/// Known features in display order.
pub static FEATURE_CHECKS: &[FeatureCheck] = &[
    FeatureCheck {
        name: "KVS",
        checks: &[
            check!(Service, ["stat_read_reqs", "stat_write_reqs"]),
            check!(
                Namespaces,
                [
                    "client_read_error",
                    "client_read_success",
                    "client_write_error",
                    "client_write_success",
                ]
            ),
        ],
    },
    FeatureCheck {
        name: "UDF",
        checks: &[
            check!(Service, ["udf_read_reqs", "udf_write_reqs"]),
            check!(Namespaces, ["client_udf_complete", "client_udf_error"]),
        ],
    },
    FeatureCheck {
        name: "Batch",
        checks: &[check!(Service, ["batch_initiate", "batch_index_initiate"])],
    },
    FeatureCheck {
        name: "Scan",
        checks: &[
            check!(
                Service,
                [
                    "tscan_initiate",
                    "basic_scans_succeeded",
                    "basic_scans_failed",
                    "aggr_scans_succeeded",
                    "aggr_scans_failed",
                    "udf_bg_scans_succeeded",
                    "udf_bg_scans_failed",
                ]
            ),
            check!(
                Namespaces,
                [
                    "scan_basic_complete",
                    "scan_basic_error",
                    "scan_aggr_complete",
                    "scan_aggr_error",
                    "scan_udf_bg_complete",
                    "scan_udf_bg_error",
                ]
            ),
        ],
    },
    FeatureCheck {
        name: "SIndex",
        checks: &[
            check!(Service, ["sindex-used-bytes-memory"]),
            check!(Namespaces, ["memory_used_sindex_bytes"]),
        ],
    },
    FeatureCheck {
        name: "Query",
        checks: &[
            check!(Service, ["query_reqs", "query_success"]),
            check!(Namespaces, ["query_reqs", "query_success"]),
        ],
    },
    FeatureCheck {
        name: "PIndex Query",
        checks: &[check!(
            Namespaces,
            [
                "pi_query_long_basic_complete",
                "pi_query_long_basic_error",
                "pi_query_short_basic_complete",
                "pi_query_short_basic_error",
                "pi_query_aggr_complete",
                "pi_query_aggr_error",
                "pi_query_udf_bg_complete",
                "pi_query_udf_bg_error",
                "pi_query_ops_bg_complete",
                "pi_query_ops_bg_error",
            ]
        )],
    },
    FeatureCheck {
        name: "SIndex Query",
        checks: &[check!(
            Namespaces,
            [
                "si_query_long_basic_complete",
                "si_query_long_basic_error",
                "si_query_short_basic_complete",
                "si_query_short_basic_error",
                "si_query_aggr_complete",
                "si_query_aggr_error",
                "si_query_udf_bg_complete",
                "si_query_udf_bg_error",
                "si_query_ops_bg_complete",
                "si_query_ops_bg_error",
            ]
        )],
    },
    FeatureCheck {
        name: "Aggregation",
        checks: &[
            check!(
                Service,
                ["query_aggr_success", "query_aggr_error", "query_aggr_abort", "query_agg"]
            ),
            check!(
                Namespaces,
                ["query_aggr_success", "query_aggr_error", "query_aggr_abort", "query_agg"]
            ),
        ],
    },
    FeatureCheck {
        name: "LDT",
        checks: &[
            check!(
                Service,
                [
                    "sub-records",
                    "ldt-writes",
                    "ldt-reads",
                    "ldt-deletes",
                    "ldt_writes",
                    "ldt_reads",
                    "ldt_deletes",
                    "sub_objects",
                ]
            ),
            check!(
                Namespaces,
                [
                    "ldt-writes",
                    "ldt-reads",
                    "ldt-deletes",
                    "ldt_writes",
                    "ldt_reads",
                    "ldt_deletes",
                ]
            ),
        ],
    },
    FeatureCheck {
        name: "XDR Source",
        checks: &[
            check!(
                Service,
                ["stat_read_reqs_xdr", "xdr_read_success", "xdr_read_error"]
            ),
            check!(XdrDcs, ["success"]),
        ],
    },
    FeatureCheck {
        name: "XDR Destination",
        checks: &[
            check!(Service, ["stat_write_reqs_xdr"]),
            check!(Namespaces, ["xdr_write_success", "xdr_client_write_success"]),
        ],
    },
    FeatureCheck {
        name: "Rack-aware",
        checks: &[
            check!(Service, ["self-group-id"]),
            check!(Namespaces, ["rack-id"]),
        ],
    },
    FeatureCheck {
        name: "Security",
        // Older captures carry security configs inside the service configs.
        checks: &[
            check!(Service, ["enable-security"], Eq, Str("true")),
            check!(Security, ["enable-security"], Eq, Str("true")),
        ],
    },
    FeatureCheck {
        name: "TLS (Heartbeat)",
        checks: &[check!(Service, ["heartbeat.mesh-seed-address-port"])],
    },
    FeatureCheck {
        name: "TLS (Fabric)",
        checks: &[check!(Service, ["fabric.tls-port"])],
    },
    FeatureCheck {
        name: "TLS (Service)",
        checks: &[check!(Service, ["service.tls-port"])],
    },
    FeatureCheck {
        name: "SC",
        checks: &[check!(Namespaces, ["strong-consistency"], Eq, Str("true"))],
    },
    FeatureCheck {
        name: "Index-on-device",
        checks: &[check!(Namespaces, ["index_flash_used_bytes"])],
    },
    FeatureCheck {
        name: "Index-on-pmem",
        checks: &[check!(Namespaces, ["index-type"], Eq, Str("pmem"))],
    },
];

/// The per-node maps feature checks read, with configs merged in.
struct MergedSources {
    service: asadm_types::NodeStats,
    namespaces: asadm_types::NodeNamespaceStats,
}

impl MergedSources {
    fn new(stats: &ClusterStats) -> Self {
        Self {
            service: stats.service(),
            namespaces: stats.namespaces(),
        }
    }

    fn nodes(&self) -> impl Iterator<Item = &String> {
        self.service.keys()
    }

    fn for_node<'a>(&'a self, stats: &'a ClusterStats, node: &str) -> NodeSources<'a> {
        NodeSources {
            service: self.service.get(node).and_then(|f| f.data()),
            security: stats.security_configs.get(node).and_then(|f| f.data()),
            namespaces: self.namespaces.get(node).and_then(|f| f.data()),
            xdr_dcs: stats.xdr_dc_stats.get(node).and_then(|f| f.data()),
        }
    }
}

/// Features in use on at least one node, in registry order.
pub fn find_features_for_cluster(stats: &ClusterStats) -> Vec<String> {
    let merged = MergedSources::new(stats);
    let sources: Vec<NodeSources<'_>> = merged
        .nodes()
        .map(|node| merged.for_node(stats, node))
        .collect();

    FEATURE_CHECKS
        .iter()
        .filter(|fc| sources.iter().any(|s| fc.check(s)))
        .map(|fc| fc.name.to_string())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureUsage {
    pub feature: String,
    pub in_use: bool,
}

/// Every registered feature for one node, in registry order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeFeatures {
    pub node: String,
    pub features: Vec<FeatureUsage>,
}

impl NodeFeatures {
    pub fn in_use(&self, feature: &str) -> Option<bool> {
        self.features
            .iter()
            .find(|f| f.feature == feature)
            .map(|f| f.in_use)
    }
}

/// Feature usage for every node that reported service data, keyed by node.
pub fn find_nodewise_features(stats: &ClusterStats) -> BTreeMap<String, NodeFeatures> {
    let merged = MergedSources::new(stats);

    merged
        .nodes()
        .map(|node| {
            let sources = merged.for_node(stats, node);
            let features = FEATURE_CHECKS
                .iter()
                .map(|fc| FeatureUsage {
                    feature: fc.name.to_string(),
                    in_use: fc.check(&sources),
                })
                .collect();

            (
                node.clone(),
                NodeFeatures {
                    node: node.clone(),
                    features,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cluster(value: serde_json::Value) -> ClusterStats {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_kvs_from_service_read_requests() {
        let stats = cluster(json!({
            "service_stats": {"node1": {"stat_read_reqs": "5"}},
        }));

        let features = find_features_for_cluster(&stats);
        assert_eq!(features, vec!["KVS".to_string()]);

        let nodewise = find_nodewise_features(&stats);
        assert_eq!(nodewise["node1"].in_use("KVS"), Some(true));
        assert_eq!(nodewise["node1"].in_use("UDF"), Some(false));
        assert_eq!(nodewise["node1"].features.len(), FEATURE_CHECKS.len());
    }

    #[test]
    fn test_namespace_checks_iterate_all_namespaces() {
        let stats = cluster(json!({
            "service_stats": {"n1": {"stat_read_reqs": "0"}, "n2": {}},
            "namespace_stats": {
                "n1": {"bar": {"client_udf_complete": "0"}, "test": {"client_udf_complete": "12"}},
                "n2": {"error": "timeout"},
            },
        }));

        let features = find_features_for_cluster(&stats);
        assert_eq!(features, vec!["UDF".to_string()]);
    }

    #[test]
    fn test_configs_are_merged_before_checking() {
        let stats = cluster(json!({
            "service_stats": {"n1": {}},
            "namespace_stats": {"n1": {"test": {"objects": "10"}}},
            "namespace_configs": {"n1": {"test": {"strong-consistency": "true", "index-type": "pmem"}}},
        }));

        let features = find_features_for_cluster(&stats);
        assert_eq!(features, vec!["SC".to_string(), "Index-on-pmem".to_string()]);
    }

    #[test]
    fn test_security_from_either_source() {
        let legacy = cluster(json!({
            "service_configs": {"n1": {"enable-security": "true"}},
        }));
        assert_eq!(find_features_for_cluster(&legacy), vec!["Security".to_string()]);

        let current = cluster(json!({
            "service_stats": {"n1": {}},
            "security_configs": {"n1": {"enable-security": "false"}},
        }));
        assert!(find_features_for_cluster(&current).is_empty());
    }

    #[test]
    fn test_missing_or_unparseable_attributes_satisfy_nothing() {
        let stats = cluster(json!({
            "service_stats": {"n1": {"stat_read_reqs": "n/a", "batch_initiate": null}},
            "xdr_dc_stats": {"n1": {"dc1": {"success": "3"}}},
        }));

        assert_eq!(
            find_features_for_cluster(&stats),
            vec!["XDR Source".to_string()]
        );
    }

    #[test]
    fn test_failed_service_node_reports_nothing() {
        let stats = cluster(json!({
            "service_stats": {"n1": {"error": "unreachable"}},
        }));

        let nodewise = find_nodewise_features(&stats);
        assert!(nodewise["n1"].features.iter().all(|f| !f.in_use));
    }
}
