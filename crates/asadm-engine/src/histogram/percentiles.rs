use super::{NodeHistograms, RawHistogram};
use asadm_types::{Fetched, flip_keys};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Histogram whose size units get an off-by-one correction: its buckets
/// count up to, not from, the boundary.
const OBJECT_SIZE_HISTOGRAM: &str = "objsz";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentileHistogram {
    pub histogram: String,
    pub width: i64,
    pub data: Vec<u64>,
    pub percentiles: Vec<i64>,
}

/// One-based bucket index at which the cumulative count first reaches each
/// tenth of the total. All zeros when the histogram is empty.
pub fn decile_buckets(data: &[u64]) -> Vec<i64> {
    let total: u64 = data.iter().sum();
    let mut cumulative = 0.0;
    let mut percentile = 0.1;
    let mut result = Vec::new();

    for (i, count) in data.iter().enumerate() {
        cumulative += *count as f64;
        let portion = if total > 0 { cumulative / total as f64 } else { 0.0 };

        while portion >= percentile {
            percentile += 0.1;
            result.push(i as i64 + 1);
        }

        if percentile > 1.0 {
            break;
        }
    }

    if result.is_empty() {
        result = vec![0; 10];
    }
    result
}

pub(super) fn percentiles_output(
    name: &str,
    data: &NodeHistograms,
) -> BTreeMap<String, BTreeMap<String, PercentileHistogram>> {
    let mut output = BTreeMap::new();

    for (ns, nodes) in flip_keys(data) {
        let mut per_node = BTreeMap::new();

        for (node, fetched) in nodes {
            let hist = match fetched {
                Fetched::Data(RawHistogram::Linear(hist)) => hist,
                Fetched::Data(RawHistogram::Log(_)) => {
                    debug!(namespace = %ns, node = %node, "no percentiles for logarithmic histogram");
                    continue;
                }
                Fetched::Failed(_) => continue,
            };

            let percentiles = decile_buckets(&hist.data)
                .into_iter()
                .map(|bucket| {
                    if name == OBJECT_SIZE_HISTOGRAM && bucket > 0 {
                        bucket * hist.width - 1
                    } else {
                        bucket * hist.width
                    }
                })
                .collect();

            per_node.insert(
                node,
                PercentileHistogram {
                    histogram: hist.histogram,
                    width: hist.width,
                    data: hist.data,
                    percentiles,
                },
            );
        }

        output.insert(ns, per_node);
    }

    output
}
